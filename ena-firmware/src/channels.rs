//! Inter-task communication channels
//!
//! Defines the static signals used for communication between Embassy tasks.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::tasks::MaintenanceRequest;

/// Maintenance request for the storage task (latest request wins)
pub static MAINTENANCE: Signal<CriticalSectionRawMutex, MaintenanceRequest> = Signal::new();
