// NeoCare360 - healthcare data access layer for the dashboard views
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
