// HTTP request handlers
use crate::domain::dashboard::{lists_patients, Dashboard};
use crate::domain::facility::QueryParams;
use crate::domain::permissions::Capability;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Role and capabilities of this session
pub async fn permissions(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "role": state.role,
        "capabilities": state.capabilities.all().collect::<Vec<_>>(),
    }))
}

/// Names of the mounted dashboard views
pub async fn list_dashboards(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.views.keys().cloned().collect::<Vec<_>>())
}

/// Current bundle of one dashboard view
pub async fn get_dashboard(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.views.get(&name) {
        Some(view) => Json(view.snapshot_json()).into_response(),
        None => missing_view(&state, &name),
    }
}

/// Trigger an immediate refresh of one dashboard view
pub async fn refresh_dashboard(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.views.get(&name) {
        Some(view) => {
            view.refresh();
            StatusCode::ACCEPTED.into_response()
        }
        None => missing_view(&state, &name),
    }
}

/// Connection flag and latest push update of the realtime feed
pub async fn realtime_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = match &state.realtime {
        Some(feed) => json!({
            "connected": feed.connected(),
            "lastMessage": feed.last_message(),
            "lastError": feed.last_error(),
        }),
        None => json!({ "connected": false, "lastMessage": null, "lastError": null }),
    };
    Json(body)
}

/// Raw payload of a single API endpoint, read through the local cache
pub async fn export_endpoint(
    Path(endpoint): Path<String>,
    Query(query): Query<QueryParams>,
    State(state): State<Arc<AppState>>,
) -> Response {
    if !state.capabilities.has(Capability::ExportReports) {
        return error_response(StatusCode::FORBIDDEN);
    }

    let Some(endpoint) = normalize_export_path(&endpoint) else {
        return error_response(StatusCode::BAD_REQUEST);
    };
    let Some(dashboard) = Dashboard::for_endpoint(&endpoint) else {
        return error_response(StatusCode::NOT_FOUND);
    };
    if !state.capabilities.can_view(dashboard)
        || (lists_patients(&endpoint) && !state.capabilities.has(Capability::ViewPatientIdentifiers))
    {
        tracing::debug!(endpoint = %endpoint, "Export not permitted");
        return error_response(StatusCode::FORBIDDEN);
    }

    let key = export_cache_key(&endpoint, &query);
    if let Some(cached) = state.cache.get_cached_data::<Value>(&key) {
        tracing::debug!(endpoint = %endpoint, "Export served from cache");
        return Json(cached).into_response();
    }

    match state.executor.get(&endpoint, query).await {
        Ok(body) => {
            state.cache.cache_data(&key, &body);
            Json(body).into_response()
        }
        Err(e) => {
            tracing::warn!(endpoint = %endpoint, "Export failed: {}", e);
            let status = match e.status() {
                Some(404) => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_GATEWAY,
            };
            (status, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

/// `/`-joined path with no empty, `.` or `..` segments.
fn normalize_export_path(raw: &str) -> Option<String> {
    let segments: Vec<&str> = raw.strip_prefix('/').unwrap_or(raw).split('/').collect();
    if segments
        .iter()
        .any(|s| s.is_empty() || *s == "." || *s == ".." || s.contains('\\'))
    {
        return None;
    }
    Some(format!("/{}", segments.join("/")))
}

fn export_cache_key(endpoint: &str, query: &QueryParams) -> String {
    let params: Vec<String> = query.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!("export:{}?{}", endpoint, params.join("&"))
}

fn missing_view(state: &AppState, name: &str) -> Response {
    let status = match Dashboard::from_name(name) {
        Some(dashboard) if !state.capabilities.can_view(dashboard) => StatusCode::FORBIDDEN,
        _ => StatusCode::NOT_FOUND,
    };
    tracing::debug!(view = name, status = status.as_u16(), "Dashboard view unavailable");
    error_response(status)
}

fn error_response(status: StatusCode) -> Response {
    (status, Json(json!({ "error": status.canonical_reason() }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::local_cache::LocalCache;
    use crate::domain::facility::DashboardFilters;
    use crate::domain::permissions::{derive_permissions, CapabilitySet, Role};
    use crate::infrastructure::memory_store::MemoryStore;
    use crate::infrastructure::mock_executor::MockExecutor;
    use crate::presentation::registry::{ViewContext, ViewRegistry};

    fn state_for(role: Role) -> Arc<AppState> {
        let mock = Arc::new(MockExecutor::new());
        let capabilities = derive_permissions(role);
        let ctx = ViewContext {
            executor: mock.clone(),
            filters: DashboardFilters::default(),
        };
        let views = ViewRegistry::standard().mount_permitted(&ctx, &capabilities);
        Arc::new(AppState {
            role,
            capabilities,
            views,
            executor: mock,
            cache: LocalCache::new(Arc::new(MemoryStore::new())),
            realtime: None,
        })
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_get_dashboard_returns_bundle() {
        let state = state_for(Role::Administrator);
        let response = get_dashboard(Path("overview".to_string()), State(state)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body.get("loading").is_some());
    }

    #[tokio::test]
    async fn test_forbidden_and_unknown_views() {
        let state = state_for(Role::Viewer);

        let response = get_dashboard(Path("icu-command-center".to_string()), State(state.clone())).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = refresh_dashboard(Path("billing".to_string()), State(state)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_refresh_is_accepted() {
        let state = state_for(Role::OperationsManager);
        let response = refresh_dashboard(Path("resource-management".to_string()), State(state)).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_permissions_lists_capabilities() {
        let state = state_for(Role::Analyst);
        let response = permissions(State(state)).await.into_response();
        let body = body_json(response).await;

        assert_eq!(body["role"], "analyst");
        assert!(body["capabilities"]
            .as_array()
            .unwrap()
            .contains(&Value::from("view_clinical_kpis")));
    }

    #[tokio::test]
    async fn test_export_reads_through_cache() {
        let mock = Arc::new(MockExecutor::new());
        let state = Arc::new(AppState {
            role: Role::Analyst,
            capabilities: derive_permissions(Role::Analyst),
            views: Default::default(),
            executor: mock.clone(),
            cache: LocalCache::new(Arc::new(MemoryStore::new())),
            realtime: None,
        });
        let query = vec![("timeframe".to_string(), "7d".to_string())];

        for _ in 0..2 {
            let response = export_endpoint(
                Path("overview/admissions".to_string()),
                Query(query.clone()),
                State(state.clone()),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_json(response).await, mock.payload_for("/overview/admissions"));
        }

        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.last_query("/overview/admissions"), Some(query));
    }

    #[tokio::test]
    async fn test_export_of_unknown_endpoint_is_not_found() {
        let state = state_for(Role::Administrator);
        let response = export_endpoint(
            Path("billing/invoices".to_string()),
            Query(Vec::new()),
            State(state),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_export_requires_capability() {
        let state = state_for(Role::Nurse);
        let response = export_endpoint(
            Path("icu/capacity".to_string()),
            Query(Vec::new()),
            State(state),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    fn export_state(capabilities: CapabilitySet) -> Arc<AppState> {
        Arc::new(AppState {
            role: Role::Analyst,
            capabilities,
            views: Default::default(),
            executor: Arc::new(MockExecutor::new()),
            cache: LocalCache::new(Arc::new(MemoryStore::new())),
            realtime: None,
        })
    }

    async fn export(state: &Arc<AppState>, endpoint: &str) -> StatusCode {
        export_endpoint(Path(endpoint.to_string()), Query(Vec::new()), State(state.clone()))
            .await
            .status()
    }

    #[tokio::test]
    async fn test_export_respects_dashboard_visibility() {
        let state = export_state(derive_permissions(Role::Analyst));

        assert_eq!(export(&state, "clinical-kpis/metrics").await, StatusCode::OK);
        assert_eq!(export(&state, "patient-monitoring/patients").await, StatusCode::FORBIDDEN);
        assert_eq!(export(&state, "icu/capacity").await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_export_of_patient_lists_needs_identifiers() {
        let without: CapabilitySet =
            [Capability::ExportReports, Capability::ViewIcuCommandCenter].into_iter().collect();
        let state = export_state(without);
        assert_eq!(export(&state, "icu/capacity").await, StatusCode::OK);
        assert_eq!(export(&state, "icu/patients").await, StatusCode::FORBIDDEN);

        let with: CapabilitySet = [
            Capability::ExportReports,
            Capability::ViewIcuCommandCenter,
            Capability::ViewPatientIdentifiers,
        ]
        .into_iter()
        .collect();
        let state = export_state(with);
        assert_eq!(export(&state, "icu/patients").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_export_rejects_dot_and_empty_segments() {
        let state = export_state(derive_permissions(Role::Administrator));

        assert_eq!(export(&state, "../../admin/users").await, StatusCode::BAD_REQUEST);
        assert_eq!(export(&state, "overview/../../admin").await, StatusCode::BAD_REQUEST);
        assert_eq!(export(&state, "overview//admissions").await, StatusCode::BAD_REQUEST);
        assert_eq!(export(&state, "overview/./admissions").await, StatusCode::BAD_REQUEST);
    }
}
