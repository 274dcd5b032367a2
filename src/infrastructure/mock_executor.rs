// Mock executor - inline fictional data for every dashboard endpoint
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::application::request_executor::{NetworkError, RequestExecutor, RequestOptions};
use crate::domain::facility::QueryParams;

/// Canned payload for a known endpoint.
pub fn mock_payload(endpoint: &str) -> Option<Value> {
    let payload = match endpoint {
        // ── Overview ────────────────────────────────────────────────────────
        "/overview/admissions" => json!({
            "admissions24h": 127, "trend24h": 8, "discharges24h": 113, "averageLengthOfStay": 4.2
        }),
        "/overview/bed-occupancy" => json!({
            "totalBeds": 450, "occupiedBeds": 382, "occupancyRate": 84.9,
            "byUnit": [
                {"unit": "Medical", "occupied": 140, "total": 160},
                {"unit": "Surgical", "occupied": 96, "total": 110},
                {"unit": "ICU", "occupied": 38, "total": 42},
                {"unit": "Pediatrics", "occupied": 30, "total": 48}
            ]
        }),
        "/overview/ed-metrics" => json!({
            "currentPatients": 34, "averageWaitMinutes": 47, "leftWithoutBeingSeen": 3, "boarding": 6
        }),
        "/overview/lab-metrics" => json!({
            "pendingOrders": 212, "averageTurnaroundMinutes": 58, "criticalResults": 4
        }),
        "/overview/critical-alerts" => json!([
            {"id": "ALT-1042", "severity": "critical", "message": "ICU at 90% capacity", "unit": "ICU"},
            {"id": "ALT-1043", "severity": "high", "message": "ED wait exceeds 45 minutes", "unit": "ED"}
        ]),
        "/overview/patient-distribution" => json!([
            {"department": "Cardiology", "patients": 64},
            {"department": "Oncology", "patients": 41},
            {"department": "Orthopedics", "patients": 37},
            {"department": "Neurology", "patients": 29}
        ]),

        // ── Patient monitoring ──────────────────────────────────────────────
        "/patient-monitoring/vitals/live" => json!([
            {"patientId": "P-1001", "heartRate": 82, "spo2": 97, "systolic": 124, "diastolic": 78, "temperature": 37.1},
            {"patientId": "P-1002", "heartRate": 112, "spo2": 91, "systolic": 98, "diastolic": 60, "temperature": 38.4}
        ]),
        "/patient-monitoring/patients" => json!([
            {"patientId": "P-1001", "bed": "4W-12", "status": "stable"},
            {"patientId": "P-1002", "bed": "4W-15", "status": "deteriorating"}
        ]),
        "/patient-monitoring/alerts" => json!([
            {"patientId": "P-1002", "type": "spo2_low", "severity": "high", "value": 91}
        ]),
        "/patient-monitoring/vitals/trends" => json!({
            "heartRate": [80, 84, 88, 95, 112], "spo2": [97, 96, 94, 92, 91]
        }),
        "/patient-monitoring/alert-diagnoses" => json!([
            {"code": "A41.9", "description": "Sepsis, unspecified organism", "alerts": 3}
        ]),

        // ── ICU command center ──────────────────────────────────────────────
        "/icu/capacity" => json!({"totalBeds": 42, "occupied": 38, "ventilated": 17, "pendingAdmissions": 3}),
        "/icu/patients" => json!([
            {"patientId": "P-2001", "bed": "ICU-03", "apache": 21, "ventilated": true},
            {"patientId": "P-2002", "bed": "ICU-07", "apache": 14, "ventilated": false}
        ]),
        "/icu/devices" => json!({"ventilators": {"inUse": 17, "total": 24}, "infusionPumps": {"inUse": 61, "total": 80}}),
        "/icu/alerts" => json!([{"bed": "ICU-03", "type": "pressure_drop", "severity": "critical"}]),
        "/icu/stay-analytics" => json!({"averageStayDays": 5.6, "readmissionRate48h": 2.1}),
        "/icu/diagnoses" => json!([
            {"code": "J96.0", "description": "Acute respiratory failure", "patients": 11},
            {"code": "I21.9", "description": "Acute myocardial infarction", "patients": 6}
        ]),

        // ── Clinical KPIs ───────────────────────────────────────────────────
        "/clinical-kpis/metrics" => json!({
            "mortalityRate": 1.8, "readmissionRate30d": 11.2, "infectionRate": 0.9, "patientSatisfaction": 87
        }),
        "/clinical-kpis/departments" => json!([
            {"department": "Cardiology", "score": 92},
            {"department": "Emergency", "score": 78}
        ]),
        "/clinical-kpis/case-findings" => json!({"sepsis": [4, 6, 5, 7], "falls": [2, 1, 3, 1]}),
        "/clinical-kpis/quality" => json!({"handHygieneCompliance": 94.5, "medicationErrors": 3}),
        "/clinical-kpis/admission-trends" => json!({"daily": [118, 124, 131, 127, 122, 119, 127]}),

        // ── Resource management ─────────────────────────────────────────────
        "/resources/beds" => json!({"available": 68, "cleaning": 9, "blocked": 4}),
        "/resources/staff-ratios" => json!([
            {"unit": "ICU", "nurseToPatient": "1:2"},
            {"unit": "Medical", "nurseToPatient": "1:5"}
        ]),
        "/resources/supplies" => json!([
            {"item": "N95 respirators", "onHand": 1800, "reorderLevel": 2000},
            {"item": "IV sets", "onHand": 5400, "reorderLevel": 3000}
        ]),
        "/resources/devices" => json!({"mri": {"inUse": 2, "total": 3}, "ct": {"inUse": 3, "total": 4}}),
        "/resources/downtime" => json!([
            {"device": "CT-2", "minutes": 95, "reason": "scheduled maintenance"}
        ]),
        "/resources/diagnoses" => json!([
            {"code": "U07.1", "description": "COVID-19", "bedDays": 212}
        ]),
        _ => return None,
    };
    Some(payload)
}

/// Most recent calls kept for inspection; older ones only count.
pub const CALL_LOG_CAPACITY: usize = 256;

#[derive(Debug, Default)]
struct MockState {
    responses: HashMap<String, Value>,
    failures: HashMap<String, NetworkError>,
    calls: VecDeque<(String, QueryParams)>,
    total_calls: usize,
}

/// Request executor that answers from [`mock_payload`] with optional overrides.
#[derive(Debug, Default)]
pub struct MockExecutor {
    state: Mutex<MockState>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, endpoint: &str, payload: Value) -> Self {
        self.set_response(endpoint, payload);
        self
    }

    pub fn with_failure(self, endpoint: &str, error: NetworkError) -> Self {
        self.set_failure(endpoint, error);
        self
    }

    pub fn set_response(&self, endpoint: &str, payload: Value) {
        if let Ok(mut state) = self.state.lock() {
            state.failures.remove(endpoint);
            state.responses.insert(endpoint.to_string(), payload);
        }
    }

    pub fn set_failure(&self, endpoint: &str, error: NetworkError) {
        if let Ok(mut state) = self.state.lock() {
            state.failures.insert(endpoint.to_string(), error);
        }
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().map(|s| s.total_calls).unwrap_or(0)
    }

    /// Query parameters of the most recent call to `endpoint`.
    pub fn last_query(&self, endpoint: &str) -> Option<QueryParams> {
        let state = self.state.lock().ok()?;
        state
            .calls
            .iter()
            .rev()
            .find(|(e, _)| e == endpoint)
            .map(|(_, query)| query.clone())
    }

    /// What a call to `endpoint` would currently return.
    pub fn payload_for(&self, endpoint: &str) -> Value {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.responses.get(endpoint).cloned())
            .or_else(|| mock_payload(endpoint))
            .unwrap_or(Value::Null)
    }
}

#[async_trait]
impl RequestExecutor for MockExecutor {
    async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<Value, NetworkError> {
        let (failure, response) = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| NetworkError::Transport("mock executor poisoned".to_string()))?;
            if state.calls.len() == CALL_LOG_CAPACITY {
                state.calls.pop_front();
            }
            state.calls.push_back((endpoint.to_string(), options.query));
            state.total_calls += 1;
            (
                state.failures.get(endpoint).cloned(),
                state.responses.get(endpoint).cloned(),
            )
        };

        if let Some(error) = failure {
            return Err(error);
        }

        response.or_else(|| mock_payload(endpoint)).ok_or(NetworkError::Status {
            status: 404,
            status_text: "Not Found".to_string(),
        })
    }
}
