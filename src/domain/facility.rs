// Facility context and dashboard filters
use serde::{Deserialize, Serialize};

/// Facility id sent when the client has none stored.
pub const DEFAULT_FACILITY_ID: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacilityContext {
    pub facility_id: String,
    pub auth_token: Option<String>,
}

impl FacilityContext {
    pub fn new(facility_id: Option<String>, auth_token: Option<String>) -> Self {
        let facility_id = facility_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FACILITY_ID.to_string());
        Self {
            facility_id,
            auth_token: auth_token.filter(|t| !t.is_empty()),
        }
    }

    pub fn bearer(&self) -> Option<String> {
        self.auth_token.as_ref().map(|token| format!("Bearer {}", token))
    }
}

/// Organizational unit a dashboard view is filtered to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Hospital,
    County,
    National,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Hospital => "hospital",
            Scope::County => "county",
            Scope::National => "national",
        }
    }
}

/// Filters a dashboard view passes to its data hook.
///
/// Every set field maps onto a query parameter; see [`DashboardFilters::facility_param`]
/// and friends for which endpoints receive which parameter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardFilters {
    pub scope: Option<Scope>,
    pub facility: Option<String>,
    pub timeframe: Option<String>,
    pub period: Option<String>,
    #[serde(default)]
    pub patient_ids: Vec<String>,
}

pub type QueryParams = Vec<(String, String)>;

impl DashboardFilters {
    pub fn for_facility(facility: impl Into<String>) -> Self {
        Self {
            facility: Some(facility.into()),
            ..Self::default()
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_timeframe(mut self, timeframe: impl Into<String>) -> Self {
        self.timeframe = Some(timeframe.into());
        self
    }

    pub fn with_period(mut self, period: impl Into<String>) -> Self {
        self.period = Some(period.into());
        self
    }

    pub fn with_patient_ids(mut self, ids: Vec<String>) -> Self {
        self.patient_ids = ids;
        self
    }

    /// Parameters every endpoint receives.
    pub fn facility_param(&self) -> QueryParams {
        let mut params = Vec::new();
        push_param(&mut params, "facility", self.facility.as_deref());
        push_param(&mut params, "scope", self.scope.as_ref().map(Scope::as_str));
        params
    }

    /// Parameters for trend and statistics endpoints.
    pub fn timeframe_params(&self) -> QueryParams {
        let mut params = self.facility_param();
        push_param(&mut params, "timeframe", self.timeframe.as_deref());
        params
    }

    /// Parameters for period-scoped endpoints.
    pub fn period_params(&self) -> QueryParams {
        let mut params = self.facility_param();
        push_param(&mut params, "period", self.period.as_deref());
        params
    }

    /// Parameters for the live vitals endpoint.
    pub fn patient_params(&self) -> QueryParams {
        let mut params = self.facility_param();
        if !self.patient_ids.is_empty() {
            params.push(("patient_ids".to_string(), self.patient_ids.join(",")));
        }
        params
    }
}

fn push_param(params: &mut QueryParams, key: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        params.push((key.to_string(), value.to_string()));
    }
}
