// Dashboard domain model
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dashboard {
    Overview,
    PatientMonitoring,
    IcuCommandCenter,
    ClinicalKpis,
    ResourceManagement,
}

impl Dashboard {
    pub const ALL: [Dashboard; 5] = [
        Dashboard::Overview,
        Dashboard::PatientMonitoring,
        Dashboard::IcuCommandCenter,
        Dashboard::ClinicalKpis,
        Dashboard::ResourceManagement,
    ];

    /// View name the UI mounts this dashboard under
    pub fn name(&self) -> &'static str {
        match self {
            Dashboard::Overview => "overview",
            Dashboard::PatientMonitoring => "patient-monitoring",
            Dashboard::IcuCommandCenter => "icu-command-center",
            Dashboard::ClinicalKpis => "clinical-kpis",
            Dashboard::ResourceManagement => "resource-management",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.name() == name)
    }

    /// First path segment of this dashboard's API endpoints
    pub fn api_prefix(&self) -> &'static str {
        match self {
            Dashboard::Overview => "overview",
            Dashboard::PatientMonitoring => "patient-monitoring",
            Dashboard::IcuCommandCenter => "icu",
            Dashboard::ClinicalKpis => "clinical-kpis",
            Dashboard::ResourceManagement => "resources",
        }
    }

    /// Dashboard whose API group owns `endpoint`.
    pub fn for_endpoint(endpoint: &str) -> Option<Self> {
        let first = endpoint.trim_start_matches('/').split('/').next()?;
        Self::ALL.into_iter().find(|d| d.api_prefix() == first)
    }

    pub fn poll_interval(&self) -> Duration {
        match self {
            Dashboard::Overview => Duration::from_secs(30),
            Dashboard::PatientMonitoring => Duration::from_secs(10),
            Dashboard::IcuCommandCenter => Duration::from_secs(15),
            Dashboard::ClinicalKpis => Duration::from_secs(300),
            Dashboard::ResourceManagement => Duration::from_secs(120),
        }
    }

    /// The only error text a failed batch surfaces to the UI
    pub fn error_message(&self) -> &'static str {
        match self {
            Dashboard::Overview => "Failed to load overview data",
            Dashboard::PatientMonitoring => "Failed to load patient monitoring data",
            Dashboard::IcuCommandCenter => "Failed to load ICU data",
            Dashboard::ClinicalKpis => "Failed to load clinical KPI data",
            Dashboard::ResourceManagement => "Failed to load resource management data",
        }
    }
}

/// Endpoints whose payload names individual patients.
pub const PATIENT_LIST_ENDPOINTS: &[&str] = &[
    "/patient-monitoring/patients",
    "/patient-monitoring/vitals/live",
    "/icu/patients",
];

pub fn lists_patients(endpoint: &str) -> bool {
    PATIENT_LIST_ENDPOINTS.contains(&endpoint)
}

/// Per-view state: the last complete batch plus loading/error flags.
///
/// `data` is only ever replaced by a whole batch, never merged field by field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bundle<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for Bundle<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> Bundle<T> {
    pub fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn succeed(&mut self, data: T) {
        self.data = Some(data);
        self.loading = false;
        self.error = None;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
    }

    pub fn is_settled(&self) -> bool {
        !self.loading
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewData {
    pub admission_stats: Value,
    pub bed_occupancy: Value,
    pub ed_metrics: Value,
    pub lab_metrics: Value,
    pub critical_alerts: Value,
    pub patient_distribution: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientMonitoringData {
    pub live_vitals: Value,
    pub monitored_patients: Value,
    pub clinical_alerts: Value,
    pub vitals_trends: Value,
    pub alert_diagnoses: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IcuData {
    pub capacity: Value,
    pub patients: Value,
    pub device_utilization: Value,
    pub alerts: Value,
    pub stay_analytics: Value,
    pub diagnoses: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalKpiData {
    pub kpi_metrics: Value,
    pub department_performance: Value,
    pub case_findings_trends: Value,
    pub quality_metrics: Value,
    pub admission_trends: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceData {
    pub bed_resources: Value,
    pub staff_ratios: Value,
    pub supply_inventory: Value,
    pub device_resources: Value,
    pub downtime_logs: Value,
    pub resource_diagnoses: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for dashboard in Dashboard::ALL {
            assert_eq!(Dashboard::from_name(dashboard.name()), Some(dashboard));
        }
        assert_eq!(Dashboard::from_name("settings"), None);
    }

    #[test]
    fn test_endpoints_map_to_their_dashboard() {
        assert_eq!(Dashboard::for_endpoint("/icu/patients"), Some(Dashboard::IcuCommandCenter));
        assert_eq!(
            Dashboard::for_endpoint("resources/beds"),
            Some(Dashboard::ResourceManagement)
        );
        assert_eq!(Dashboard::for_endpoint("/admin/users"), None);
        assert!(lists_patients("/patient-monitoring/patients"));
        assert!(!lists_patients("/icu/capacity"));
    }

    #[test]
    fn test_poll_intervals() {
        assert_eq!(Dashboard::Overview.poll_interval(), Duration::from_secs(30));
        assert_eq!(Dashboard::PatientMonitoring.poll_interval(), Duration::from_secs(10));
        assert_eq!(Dashboard::IcuCommandCenter.poll_interval(), Duration::from_secs(15));
        assert_eq!(Dashboard::ClinicalKpis.poll_interval(), Duration::from_secs(300));
        assert_eq!(Dashboard::ResourceManagement.poll_interval(), Duration::from_secs(120));
    }

    #[test]
    fn test_failed_bundle_keeps_previous_data() {
        let mut bundle = Bundle::default();
        bundle.begin();
        bundle.succeed(1);
        bundle.begin();
        assert!(bundle.loading);
        assert_eq!(bundle.data, Some(1));

        bundle.fail("boom");
        assert!(bundle.is_settled());
        assert_eq!(bundle.data, Some(1));
        assert_eq!(bundle.error.as_deref(), Some("boom"));

        bundle.begin();
        assert_eq!(bundle.error, None);
    }
}
