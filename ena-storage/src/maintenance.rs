//! Bulk erase

use embedded_storage_async::nor_flash::NorFlash;

use ena_core::{Region, COUNTER_SIZE};

use crate::error::StorageError;
use crate::storage::EnaStorage;

impl<F: NorFlash> EnaStorage<F> {
    /// Erase the whole partition and reset all three counters to zero
    pub async fn erase(&mut self) -> Result<(), StorageError> {
        self.blocks.erase_all().await?;
        info!("erased partition ({} bytes)", self.blocks.size());

        for region in Region::ALL {
            self.set_count(region, 0).await?;
        }
        Ok(())
    }

    /// Zero a region's counter and its occupied slots
    ///
    /// Slots that were never written are left alone.
    pub(crate) async fn erase_region(&mut self, region: Region) -> Result<(), StorageError> {
        let stored = self.stored(region).await?;
        let address = self.layout.count_address(region);
        let size = COUNTER_SIZE + stored * region.record_size();

        self.blocks.zero(address, size as usize).await?;
        info!(
            "erased {} {} (size {} at {})",
            stored,
            region.name(),
            size,
            address
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{detection, formatted, tek, temp_detection};
    use embassy_futures::block_on;
    use ena_core::StorageConfig;

    #[test]
    fn test_erase_everything_resets_all_regions() {
        let mut storage = formatted(StorageConfig::default());
        block_on(async {
            storage.write_tek(&tek(1)).await.unwrap();
            storage.add_temp_detection(&temp_detection(2)).await.unwrap();
            storage.add_detection(&detection(3)).await.unwrap();

            storage.erase().await.unwrap();

            assert_eq!(storage.tek_count().await.unwrap(), 0);
            assert_eq!(storage.temp_detections_count().await.unwrap(), 0);
            assert_eq!(storage.detections_count().await.unwrap(), 0);
            assert_eq!(storage.read_last_tek().await.unwrap(), None);
        });
    }

    #[test]
    fn test_region_erase_zeroes_only_occupied_slots() {
        let mut storage = formatted(StorageConfig::default());
        block_on(async {
            storage.write_tek(&tek(1)).await.unwrap();
            storage.write_tek(&tek(2)).await.unwrap();
            storage.erase_teks().await.unwrap();

            let layout = *storage.layout();
            let mut occupied = [0xAAu8; 40];
            storage
                .read(layout.start_address(Region::Teks), &mut occupied)
                .await
                .unwrap();
            assert_eq!(occupied, [0u8; 40]);

            // Third slot was never written and still reads erased
            let mut untouched = [0u8; 20];
            storage
                .read(layout.slot_address(Region::Teks, 2), &mut untouched)
                .await
                .unwrap();
            assert_eq!(untouched, [0xFFu8; 20]);
        });
    }

    #[test]
    fn test_erase_wrapped_ring_stops_at_capacity() {
        let mut storage = formatted(StorageConfig::new(14, 4));
        block_on(async {
            for marker in 0..9 {
                storage.add_temp_detection(&temp_detection(marker)).await.unwrap();
            }
            storage.add_detection(&detection(7)).await.unwrap();

            storage.erase_temp_detections().await.unwrap();

            assert_eq!(storage.temp_detections_count().await.unwrap(), 0);
            assert_eq!(storage.detections_count().await.unwrap(), 1);
            assert_eq!(storage.get_detection(0).await.unwrap(), detection(7));
        });
    }
}
