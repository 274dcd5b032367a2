// Application state for HTTP handlers
use std::sync::Arc;

use crate::application::local_cache::LocalCache;
use crate::application::realtime::RealtimeFeed;
use crate::application::request_executor::RequestExecutor;
use crate::domain::permissions::{CapabilitySet, Role};
use crate::presentation::registry::MountedViews;

pub struct AppState {
    pub role: Role,
    pub capabilities: CapabilitySet,
    pub views: MountedViews,
    pub executor: Arc<dyn RequestExecutor>,
    pub cache: LocalCache,
    pub realtime: Option<RealtimeFeed>,
}
