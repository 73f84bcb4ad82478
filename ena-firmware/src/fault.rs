//! Storage error policy
//!
//! A flash device failure leaves the medium in an unknown state, so the
//! firmware halts on it (panic-probe stops the core). Every other storage
//! error is a caller problem and is only logged.

use defmt::*;

use ena_storage::StorageError;

/// Halt on a device failure, log anything else
pub fn handle_storage_error(operation: &str, e: StorageError) {
    if e.is_fatal() {
        error!("Flash device failure during {}: {}", operation, e);
        panic!("storage device failure");
    }
    error!("{} failed: {}", operation, e);
}
