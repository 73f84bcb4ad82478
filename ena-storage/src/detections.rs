//! Confirmed detection log
//!
//! Append-only. The counter is the exact number of records, and records
//! are only ever removed all at once.

use embedded_storage_async::nor_flash::NorFlash;

use ena_core::{Detection, Region};

use crate::error::StorageError;
use crate::storage::EnaStorage;

impl<F: NorFlash> EnaStorage<F> {
    /// Number of confirmed detections
    pub async fn detections_count(&mut self) -> Result<u32, StorageError> {
        self.count(Region::Detections).await
    }

    /// Confirmed detection number `index`
    ///
    /// `index` is checked against the records that fit the partition, so an
    /// unformatted counter never lets a read run past the partition end.
    pub async fn get_detection(&mut self, index: u32) -> Result<Detection, StorageError> {
        let stored = self.stored(Region::Detections).await?;
        if index >= stored {
            return Err(StorageError::IndexOutOfRange {
                index,
                count: stored,
            });
        }
        self.read_slot(Region::Detections, index).await
    }

    /// Append a confirmed detection
    pub async fn add_detection(&mut self, detection: &Detection) -> Result<(), StorageError> {
        let count = self.detections_count().await?;
        if count >= self.slots(Region::Detections) {
            return Err(StorageError::Full);
        }
        self.write_slot(Region::Detections, count, detection).await?;
        self.set_count(Region::Detections, count + 1).await?;
        debug!(
            "add detection {}: timestamp {}, rssi {}",
            count,
            detection.timestamp,
            detection.rssi
        );
        Ok(())
    }

    /// Zero the counter and every stored record
    pub async fn erase_detections(&mut self) -> Result<(), StorageError> {
        self.erase_region(Region::Detections).await
    }
}
