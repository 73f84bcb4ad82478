//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod maintenance;

pub use maintenance::{maintenance_task, MaintenanceRequest};
