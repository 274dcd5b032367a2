// Permissions - role to capability set, resolved once per session
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::dashboard::Dashboard;

/// Everything a session may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewOverview,
    ViewPatientMonitoring,
    ViewIcuCommandCenter,
    ViewClinicalKpis,
    ViewResourceManagement,
    /// Names, MRNs and other identifiers inside patient lists
    ViewPatientIdentifiers,
    ExportReports,
    ManageSettings,
}

impl Capability {
    /// The capability required to open a dashboard view.
    pub fn for_dashboard(dashboard: Dashboard) -> Self {
        match dashboard {
            Dashboard::Overview => Capability::ViewOverview,
            Dashboard::PatientMonitoring => Capability::ViewPatientMonitoring,
            Dashboard::IcuCommandCenter => Capability::ViewIcuCommandCenter,
            Dashboard::ClinicalKpis => Capability::ViewClinicalKpis,
            Dashboard::ResourceManagement => Capability::ViewResourceManagement,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Administrator,
    Physician,
    Nurse,
    OperationsManager,
    Analyst,
    #[default]
    Viewer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Administrator => "administrator",
            Role::Physician => "physician",
            Role::Nurse => "nurse",
            Role::OperationsManager => "operations_manager",
            Role::Analyst => "analyst",
            Role::Viewer => "viewer",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "administrator" | "admin" => Ok(Role::Administrator),
            "physician" | "doctor" => Ok(Role::Physician),
            "nurse" => Ok(Role::Nurse),
            "operations_manager" => Ok(Role::OperationsManager),
            "analyst" => Ok(Role::Analyst),
            "viewer" => Ok(Role::Viewer),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

use Capability::*;

const ALL_CAPABILITIES: &[Capability] = &[
    ViewOverview,
    ViewPatientMonitoring,
    ViewIcuCommandCenter,
    ViewClinicalKpis,
    ViewResourceManagement,
    ViewPatientIdentifiers,
    ExportReports,
    ManageSettings,
];

const PERMISSION_TABLE: &[(Role, &[Capability])] = &[
    (Role::Administrator, ALL_CAPABILITIES),
    (
        Role::Physician,
        &[
            ViewOverview,
            ViewPatientMonitoring,
            ViewIcuCommandCenter,
            ViewClinicalKpis,
            ViewPatientIdentifiers,
            ExportReports,
        ],
    ),
    (
        Role::Nurse,
        &[
            ViewOverview,
            ViewPatientMonitoring,
            ViewIcuCommandCenter,
            ViewPatientIdentifiers,
        ],
    ),
    (
        Role::OperationsManager,
        &[
            ViewOverview,
            ViewResourceManagement,
            ViewClinicalKpis,
            ExportReports,
        ],
    ),
    (
        Role::Analyst,
        &[ViewOverview, ViewClinicalKpis, ExportReports],
    ),
    (Role::Viewer, &[ViewOverview]),
];

/// Capabilities granted to a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CapabilitySet {
    inner: BTreeSet<Capability>,
}

impl CapabilitySet {
    pub fn has(&self, capability: Capability) -> bool {
        self.inner.contains(&capability)
    }

    pub fn can_view(&self, dashboard: Dashboard) -> bool {
        self.has(Capability::for_dashboard(dashboard))
    }

    pub fn visible_dashboards(&self) -> Vec<Dashboard> {
        Dashboard::ALL
            .into_iter()
            .filter(|d| self.can_view(*d))
            .collect()
    }

    pub fn all(&self) -> impl Iterator<Item = &Capability> {
        self.inner.iter()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

/// Resolve a role into its capability set.
pub fn derive_permissions(role: Role) -> CapabilitySet {
    let inner = PERMISSION_TABLE
        .iter()
        .find(|(r, _)| *r == role)
        .map(|(_, caps)| caps.iter().copied().collect())
        .unwrap_or_default();
    CapabilitySet { inner }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_role_has_a_table_row() {
        for role in [
            Role::Administrator,
            Role::Physician,
            Role::Nurse,
            Role::OperationsManager,
            Role::Analyst,
            Role::Viewer,
        ] {
            assert!(derive_permissions(role).has(ViewOverview), "{role}");
        }
    }

    #[test]
    fn test_administrator_sees_everything() {
        let caps = derive_permissions(Role::Administrator);
        assert_eq!(caps.visible_dashboards(), Dashboard::ALL.to_vec());
        assert!(caps.has(ManageSettings));
    }

    #[test]
    fn test_nurse_cannot_see_resources_or_settings() {
        let caps = derive_permissions(Role::Nurse);
        assert!(caps.can_view(Dashboard::PatientMonitoring));
        assert!(!caps.can_view(Dashboard::ResourceManagement));
        assert!(!caps.has(ManageSettings));
    }

    #[test]
    fn test_analyst_never_sees_identifiers() {
        let caps = derive_permissions(Role::Analyst);
        assert!(!caps.has(ViewPatientIdentifiers));
        assert!(!caps.can_view(Dashboard::PatientMonitoring));
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Operations-Manager".parse::<Role>().unwrap(), Role::OperationsManager);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Administrator);
        assert!("janitor".parse::<Role>().is_err());
    }
}
