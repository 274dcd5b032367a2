// Domain layer - Dashboard, facility and permission models
pub mod dashboard;
pub mod facility;
pub mod permissions;
