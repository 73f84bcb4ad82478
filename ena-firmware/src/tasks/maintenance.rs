//! Storage maintenance task
//!
//! Runs bulk erases and debug dumps on request. Requests come from other
//! tasks through the `MAINTENANCE` signal and are executed under the
//! shared storage lock, so they never interleave with a log update.

use defmt::*;

use crate::channels::MAINTENANCE;
use crate::fault::handle_storage_error;
use crate::log_sink::LogLines;
use crate::Storage;

/// Maintenance operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum MaintenanceRequest {
    /// Log every stored record
    Dump,
    /// Forget all exposure keys
    EraseTeks,
    /// Forget all temporary detections
    EraseTemporary,
    /// Forget all confirmed detections
    EraseDetections,
    /// Erase the whole partition
    EraseAll,
}

/// Maintenance task - owns nothing, borrows the shared storage per request
#[embassy_executor::task]
pub async fn maintenance_task(storage: &'static Storage) {
    info!("Maintenance task started");

    loop {
        let request = MAINTENANCE.wait().await;
        info!("Maintenance request: {}", request);

        let mut storage = storage.lock().await;
        let result = match request {
            MaintenanceRequest::Dump => {
                let mut out = LogLines::new();
                let result = storage.dump_all(&mut out).await;
                out.flush();
                result
            }
            MaintenanceRequest::EraseTeks => storage.erase_teks().await,
            MaintenanceRequest::EraseTemporary => storage.erase_temp_detections().await,
            MaintenanceRequest::EraseDetections => storage.erase_detections().await,
            MaintenanceRequest::EraseAll => storage.erase().await,
        };

        match result {
            Ok(()) => info!("Maintenance request {} done", request),
            Err(e) => handle_storage_error("maintenance request", e),
        }
    }
}
