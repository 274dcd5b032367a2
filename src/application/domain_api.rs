// Domain API groups - one fixed set of endpoint calls per dashboard
use crate::application::dashboard_service::DashboardSource;
use crate::application::request_executor::{NetworkError, RequestExecutor};
use crate::domain::dashboard::{
    ClinicalKpiData, Dashboard, IcuData, OverviewData, PatientMonitoringData, ResourceData,
};
use crate::domain::facility::DashboardFilters;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

type ApiResult = Result<Value, NetworkError>;

#[derive(Clone)]
pub struct OverviewApi {
    executor: Arc<dyn RequestExecutor>,
}

impl OverviewApi {
    pub fn new(executor: Arc<dyn RequestExecutor>) -> Self {
        Self { executor }
    }

    pub async fn admission_stats(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor
            .get("/overview/admissions", filters.timeframe_params())
            .await
    }

    pub async fn bed_occupancy(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor
            .get("/overview/bed-occupancy", filters.facility_param())
            .await
    }

    pub async fn ed_metrics(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor
            .get("/overview/ed-metrics", filters.facility_param())
            .await
    }

    pub async fn lab_metrics(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor
            .get("/overview/lab-metrics", filters.facility_param())
            .await
    }

    pub async fn critical_alerts(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor
            .get("/overview/critical-alerts", filters.facility_param())
            .await
    }

    pub async fn patient_distribution(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor
            .get("/overview/patient-distribution", filters.facility_param())
            .await
    }
}

#[async_trait]
impl DashboardSource for OverviewApi {
    type Data = OverviewData;

    fn dashboard(&self) -> Dashboard {
        Dashboard::Overview
    }

    async fn fetch(&self, filters: &DashboardFilters) -> Result<OverviewData, NetworkError> {
        let (
            admission_stats,
            bed_occupancy,
            ed_metrics,
            lab_metrics,
            critical_alerts,
            patient_distribution,
        ) = tokio::try_join!(
            self.admission_stats(filters),
            self.bed_occupancy(filters),
            self.ed_metrics(filters),
            self.lab_metrics(filters),
            self.critical_alerts(filters),
            self.patient_distribution(filters),
        )?;

        Ok(OverviewData {
            admission_stats,
            bed_occupancy,
            ed_metrics,
            lab_metrics,
            critical_alerts,
            patient_distribution,
        })
    }
}

#[derive(Clone)]
pub struct PatientMonitoringApi {
    executor: Arc<dyn RequestExecutor>,
}

impl PatientMonitoringApi {
    pub fn new(executor: Arc<dyn RequestExecutor>) -> Self {
        Self { executor }
    }

    pub async fn live_vitals(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor
            .get("/patient-monitoring/vitals/live", filters.patient_params())
            .await
    }

    pub async fn monitored_patients(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor
            .get("/patient-monitoring/patients", filters.facility_param())
            .await
    }

    pub async fn clinical_alerts(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor
            .get("/patient-monitoring/alerts", filters.facility_param())
            .await
    }

    pub async fn vitals_trends(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor
            .get("/patient-monitoring/vitals/trends", filters.timeframe_params())
            .await
    }

    pub async fn alert_diagnoses(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor
            .get("/patient-monitoring/alert-diagnoses", filters.facility_param())
            .await
    }
}

#[async_trait]
impl DashboardSource for PatientMonitoringApi {
    type Data = PatientMonitoringData;

    fn dashboard(&self) -> Dashboard {
        Dashboard::PatientMonitoring
    }

    async fn fetch(&self, filters: &DashboardFilters) -> Result<PatientMonitoringData, NetworkError> {
        let (live_vitals, monitored_patients, clinical_alerts, vitals_trends, alert_diagnoses) =
            tokio::try_join!(
                self.live_vitals(filters),
                self.monitored_patients(filters),
                self.clinical_alerts(filters),
                self.vitals_trends(filters),
                self.alert_diagnoses(filters),
            )?;

        Ok(PatientMonitoringData {
            live_vitals,
            monitored_patients,
            clinical_alerts,
            vitals_trends,
            alert_diagnoses,
        })
    }
}

#[derive(Clone)]
pub struct IcuApi {
    executor: Arc<dyn RequestExecutor>,
}

impl IcuApi {
    pub fn new(executor: Arc<dyn RequestExecutor>) -> Self {
        Self { executor }
    }

    pub async fn capacity(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor.get("/icu/capacity", filters.facility_param()).await
    }

    pub async fn patients(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor.get("/icu/patients", filters.facility_param()).await
    }

    pub async fn device_utilization(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor.get("/icu/devices", filters.facility_param()).await
    }

    pub async fn alerts(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor.get("/icu/alerts", filters.facility_param()).await
    }

    pub async fn stay_analytics(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor
            .get("/icu/stay-analytics", filters.period_params())
            .await
    }

    pub async fn diagnoses(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor.get("/icu/diagnoses", filters.facility_param()).await
    }
}

#[async_trait]
impl DashboardSource for IcuApi {
    type Data = IcuData;

    fn dashboard(&self) -> Dashboard {
        Dashboard::IcuCommandCenter
    }

    async fn fetch(&self, filters: &DashboardFilters) -> Result<IcuData, NetworkError> {
        let (capacity, patients, device_utilization, alerts, stay_analytics, diagnoses) = tokio::try_join!(
            self.capacity(filters),
            self.patients(filters),
            self.device_utilization(filters),
            self.alerts(filters),
            self.stay_analytics(filters),
            self.diagnoses(filters),
        )?;

        Ok(IcuData {
            capacity,
            patients,
            device_utilization,
            alerts,
            stay_analytics,
            diagnoses,
        })
    }
}

#[derive(Clone)]
pub struct ClinicalKpiApi {
    executor: Arc<dyn RequestExecutor>,
}

impl ClinicalKpiApi {
    pub fn new(executor: Arc<dyn RequestExecutor>) -> Self {
        Self { executor }
    }

    pub async fn kpi_metrics(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor
            .get("/clinical-kpis/metrics", filters.period_params())
            .await
    }

    pub async fn department_performance(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor
            .get("/clinical-kpis/departments", filters.period_params())
            .await
    }

    pub async fn case_findings_trends(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor
            .get("/clinical-kpis/case-findings", filters.timeframe_params())
            .await
    }

    pub async fn quality_metrics(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor
            .get("/clinical-kpis/quality", filters.period_params())
            .await
    }

    pub async fn admission_trends(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor
            .get("/clinical-kpis/admission-trends", filters.timeframe_params())
            .await
    }
}

#[async_trait]
impl DashboardSource for ClinicalKpiApi {
    type Data = ClinicalKpiData;

    fn dashboard(&self) -> Dashboard {
        Dashboard::ClinicalKpis
    }

    async fn fetch(&self, filters: &DashboardFilters) -> Result<ClinicalKpiData, NetworkError> {
        let (kpi_metrics, department_performance, case_findings_trends, quality_metrics, admission_trends) =
            tokio::try_join!(
                self.kpi_metrics(filters),
                self.department_performance(filters),
                self.case_findings_trends(filters),
                self.quality_metrics(filters),
                self.admission_trends(filters),
            )?;

        Ok(ClinicalKpiData {
            kpi_metrics,
            department_performance,
            case_findings_trends,
            quality_metrics,
            admission_trends,
        })
    }
}

#[derive(Clone)]
pub struct ResourceApi {
    executor: Arc<dyn RequestExecutor>,
}

impl ResourceApi {
    pub fn new(executor: Arc<dyn RequestExecutor>) -> Self {
        Self { executor }
    }

    pub async fn bed_resources(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor.get("/resources/beds", filters.facility_param()).await
    }

    pub async fn staff_ratios(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor
            .get("/resources/staff-ratios", filters.facility_param())
            .await
    }

    pub async fn supply_inventory(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor
            .get("/resources/supplies", filters.facility_param())
            .await
    }

    pub async fn device_resources(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor
            .get("/resources/devices", filters.facility_param())
            .await
    }

    pub async fn downtime_logs(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor
            .get("/resources/downtime", filters.timeframe_params())
            .await
    }

    pub async fn resource_diagnoses(&self, filters: &DashboardFilters) -> ApiResult {
        self.executor
            .get("/resources/diagnoses", filters.facility_param())
            .await
    }
}

#[async_trait]
impl DashboardSource for ResourceApi {
    type Data = ResourceData;

    fn dashboard(&self) -> Dashboard {
        Dashboard::ResourceManagement
    }

    async fn fetch(&self, filters: &DashboardFilters) -> Result<ResourceData, NetworkError> {
        let (bed_resources, staff_ratios, supply_inventory, device_resources, downtime_logs, resource_diagnoses) =
            tokio::try_join!(
                self.bed_resources(filters),
                self.staff_ratios(filters),
                self.supply_inventory(filters),
                self.device_resources(filters),
                self.downtime_logs(filters),
                self.resource_diagnoses(filters),
            )?;

        Ok(ResourceData {
            bed_resources,
            staff_ratios,
            supply_inventory,
            device_resources,
            downtime_logs,
            resource_diagnoses,
        })
    }
}
