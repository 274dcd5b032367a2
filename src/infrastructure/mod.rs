// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod file_store;
pub mod http_executor;
pub mod memory_store;
pub mod mock_executor;
pub mod websocket;
