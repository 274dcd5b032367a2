// Application layer - Use cases and the ports infrastructure implements
pub mod cached_query;
pub mod client_store;
pub mod dashboard_service;
pub mod domain_api;
pub mod local_cache;
pub mod poller;
pub mod realtime;
pub mod request_executor;
pub mod retry;
