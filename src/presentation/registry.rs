// View registry - explicit view name to factory map owned by the composition root
use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::application::dashboard_service::{DashboardHandle, DashboardSource};
use crate::application::domain_api::{
    ClinicalKpiApi, IcuApi, OverviewApi, PatientMonitoringApi, ResourceApi,
};
use crate::application::request_executor::RequestExecutor;
use crate::domain::dashboard::Dashboard;
use crate::domain::facility::DashboardFilters;
use crate::domain::permissions::CapabilitySet;

/// A mounted view as the HTTP layer sees it.
pub trait DashboardView: Send + Sync {
    fn dashboard(&self) -> Dashboard;

    /// Current bundle as `{data, loading, error}`
    fn snapshot_json(&self) -> Value;

    fn refresh(&self);
}

impl<S> DashboardView for DashboardHandle<S>
where
    S: DashboardSource,
    S::Data: Serialize,
{
    fn dashboard(&self) -> Dashboard {
        DashboardHandle::dashboard(self)
    }

    fn snapshot_json(&self) -> Value {
        serde_json::to_value(self.snapshot()).unwrap_or_else(|e| {
            tracing::error!("Cannot serialize dashboard bundle: {}", e);
            Value::Null
        })
    }

    fn refresh(&self) {
        DashboardHandle::refresh(self);
    }
}

/// What a factory gets to build its view from.
#[derive(Clone)]
pub struct ViewContext {
    pub executor: Arc<dyn RequestExecutor>,
    pub filters: DashboardFilters,
}

pub type ViewFactory = Box<dyn Fn(&ViewContext) -> Box<dyn DashboardView> + Send + Sync>;

pub type MountedViews = BTreeMap<String, Box<dyn DashboardView>>;

#[derive(Default)]
pub struct ViewRegistry {
    factories: BTreeMap<String, ViewFactory>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the five standard dashboards.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(
            Dashboard::Overview.name(),
            Box::new(|ctx: &ViewContext| mount(OverviewApi::new(ctx.executor.clone()), ctx)),
        );
        registry.register(
            Dashboard::PatientMonitoring.name(),
            Box::new(|ctx: &ViewContext| mount(PatientMonitoringApi::new(ctx.executor.clone()), ctx)),
        );
        registry.register(
            Dashboard::IcuCommandCenter.name(),
            Box::new(|ctx: &ViewContext| mount(IcuApi::new(ctx.executor.clone()), ctx)),
        );
        registry.register(
            Dashboard::ClinicalKpis.name(),
            Box::new(|ctx: &ViewContext| mount(ClinicalKpiApi::new(ctx.executor.clone()), ctx)),
        );
        registry.register(
            Dashboard::ResourceManagement.name(),
            Box::new(|ctx: &ViewContext| mount(ResourceApi::new(ctx.executor.clone()), ctx)),
        );
        registry
    }

    /// Register a factory, returning the one it replaced.
    pub fn register(&mut self, name: impl Into<String>, factory: ViewFactory) -> Option<ViewFactory> {
        self.factories.insert(name.into(), factory)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Mount the named view. Must run inside a tokio runtime.
    pub fn instantiate(&self, name: &str, ctx: &ViewContext) -> Option<Box<dyn DashboardView>> {
        self.factories.get(name).map(|factory| factory(ctx))
    }

    /// Mount every registered view the session may see.
    pub fn mount_permitted(&self, ctx: &ViewContext, capabilities: &CapabilitySet) -> MountedViews {
        self.names()
            .filter(|name| match Dashboard::from_name(name) {
                Some(dashboard) => capabilities.can_view(dashboard),
                None => false,
            })
            .filter_map(|name| Some((name.to_string(), self.instantiate(name, ctx)?)))
            .collect()
    }
}

fn mount<S>(source: S, ctx: &ViewContext) -> Box<dyn DashboardView>
where
    S: DashboardSource,
    S::Data: Serialize,
{
    Box::new(DashboardHandle::mount(source, ctx.filters.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::permissions::{derive_permissions, Role};
    use crate::infrastructure::mock_executor::MockExecutor;

    fn context() -> ViewContext {
        ViewContext {
            executor: Arc::new(MockExecutor::new()),
            filters: DashboardFilters::default(),
        }
    }

    #[test]
    fn test_standard_registry_names() {
        let registry = ViewRegistry::standard();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(
            names,
            vec![
                "clinical-kpis",
                "icu-command-center",
                "overview",
                "patient-monitoring",
                "resource-management",
            ]
        );
    }

    #[tokio::test]
    async fn test_mounts_only_permitted_views() {
        let registry = ViewRegistry::standard();
        let views = registry.mount_permitted(&context(), &derive_permissions(Role::Nurse));

        let names: Vec<&str> = views.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["icu-command-center", "overview", "patient-monitoring"]);
    }

    #[tokio::test]
    async fn test_instantiated_view_serves_bundle() {
        let registry = ViewRegistry::standard();
        let view = registry.instantiate("overview", &context()).unwrap();
        assert_eq!(view.dashboard(), Dashboard::Overview);

        let snapshot = view.snapshot_json();
        assert!(snapshot.get("loading").is_some());
        assert!(snapshot.get("error").is_some());
        assert!(registry.instantiate("settings", &context()).is_none());
    }
}
