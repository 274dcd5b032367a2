// Client storage trait - persistent key/value state shared by the client
use crate::domain::facility::FacilityContext;

pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const FACILITY_ID_KEY: &str = "facility_id";

/// String key/value storage that survives restarts.
///
/// Writes are last-writer-wins. A failed write is reported but callers are
/// free to ignore it.
pub trait ClientStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;

    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()>;

    fn remove_item(&self, key: &str);

    fn facility_context(&self) -> FacilityContext {
        FacilityContext::new(self.get_item(FACILITY_ID_KEY), self.get_item(AUTH_TOKEN_KEY))
    }
}
