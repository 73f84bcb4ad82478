//! Temporary detection log
//!
//! A ring of `temp_detections_max` provisional sightings. Records are
//! refreshed in place while an identifier stays in range and removed from
//! the middle once it leaves, which shifts every later record down by one
//! slot.

use embedded_storage_async::nor_flash::NorFlash;

use ena_core::{Record, Region, TempDetection, ENA_KEY_LENGTH};

use crate::error::StorageError;
use crate::storage::EnaStorage;

impl<F: NorFlash> EnaStorage<F> {
    /// Lifetime number of temporary detections added, minus removals
    pub async fn temp_detections_count(&mut self) -> Result<u32, StorageError> {
        self.count(Region::TemporaryDetections).await
    }

    /// Number of slots currently holding a temporary detection
    pub async fn stored_temp_detections(&mut self) -> Result<u32, StorageError> {
        self.stored(Region::TemporaryDetections).await
    }

    /// Temporary detection in slot `index`
    pub async fn get_temp_detection(&mut self, index: u32) -> Result<TempDetection, StorageError> {
        let stored = self.stored_temp_detections().await?;
        if index >= stored {
            return Err(StorageError::IndexOutOfRange {
                index,
                count: stored,
            });
        }
        self.read_slot(Region::TemporaryDetections, index).await
    }

    /// Overwrite slot `index` in place
    ///
    /// `index` must already be reduced modulo the ring capacity.
    pub async fn set_temp_detection(
        &mut self,
        index: u32,
        detection: &TempDetection,
    ) -> Result<(), StorageError> {
        let capacity = self.layout.temp_detections_max();
        if index >= capacity {
            return Err(StorageError::IndexOutOfRange {
                index,
                count: capacity,
            });
        }
        self.write_slot(Region::TemporaryDetections, index, detection)
            .await?;
        debug!(
            "set temp detection {}: first {}, last {}, rssi {}",
            index,
            detection.timestamp_first,
            detection.timestamp_last,
            detection.rssi
        );
        Ok(())
    }

    /// Add a temporary detection and return the slot it was written to
    ///
    /// Once the ring is full the oldest slot is overwritten.
    pub async fn add_temp_detection(&mut self, detection: &TempDetection) -> Result<u32, StorageError> {
        let count = self.temp_detections_count().await?;
        let index = count % self.layout.temp_detections_max();
        self.set_temp_detection(index, detection).await?;
        self.set_count(Region::TemporaryDetections, count.wrapping_add(1))
            .await?;
        Ok(index)
    }

    /// Remove the temporary detection in slot `index`
    ///
    /// Every live record after `index` moves down one slot, so their
    /// indices shrink by one. The shift never reaches past the end of the
    /// ring, even after the counter has wrapped.
    ///
    /// On a wrapped ring the last slot is zero-filled and still counts as
    /// stored while `count` stays at or above the capacity. The next add
    /// goes to `count % capacity` as usual, not to the zeroed slot.
    pub async fn remove_temp_detection(&mut self, index: u32) -> Result<(), StorageError> {
        let count = self.temp_detections_count().await?;
        let live = count.min(self.layout.temp_detections_max());
        if index >= live {
            return Err(StorageError::IndexOutOfRange { index, count: live });
        }

        let from = self.layout.slot_address(Region::TemporaryDetections, index);
        let to = self.layout.slot_address(Region::TemporaryDetections, live);
        self.blocks
            .shift_delete(from, to, TempDetection::SIZE as u32)
            .await?;

        self.set_count(Region::TemporaryDetections, count - 1).await?;
        debug!("remove temp detection {} ({} left)", index, count - 1);
        Ok(())
    }

    /// Find the live temporary detection for identifier `rpi`
    pub async fn find_temp_detection(
        &mut self,
        rpi: &[u8; ENA_KEY_LENGTH],
    ) -> Result<Option<(u32, TempDetection)>, StorageError> {
        let stored = self.stored_temp_detections().await?;
        for index in 0..stored {
            let detection: TempDetection = self.read_slot(Region::TemporaryDetections, index).await?;
            if &detection.rpi == rpi {
                return Ok(Some((index, detection)));
            }
        }
        Ok(None)
    }

    /// Zero the counter and every occupied slot
    pub async fn erase_temp_detections(&mut self) -> Result<(), StorageError> {
        self.erase_region(Region::TemporaryDetections).await
    }
}
