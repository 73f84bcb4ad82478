//! Storage engine handle
//!
//! [`EnaStorage`] owns the partition for its whole lifetime. Region APIs
//! live in their own modules as further `impl` blocks.

use embedded_storage_async::nor_flash::NorFlash;

use ena_core::{Layout, Record, Region, StorageConfig};
use ena_hal::Partition;

use crate::block::BlockStore;
use crate::error::StorageError;

/// Counter value of a region that was erased but never formatted
const ERASED_COUNTER: u32 = u32::MAX;

/// Flash storage for keys and detections
///
/// Every method takes `&mut self` and runs to completion before the next
/// one can start. Share it between tasks through
/// [`SharedStorage`](crate::SharedStorage), never by interleaving calls.
pub struct EnaStorage<F> {
    pub(crate) blocks: BlockStore<F>,
    pub(crate) layout: Layout,
}

impl<F: NorFlash> EnaStorage<F> {
    /// Create a storage engine over `partition`
    ///
    /// Fails if the configured regions do not fit the partition.
    pub fn new(partition: Partition<F>, config: &StorageConfig) -> Result<Self, StorageError> {
        let layout = Layout::new(config);
        layout.check(partition.size())?;
        debug!(
            "storage layout: {} teks, {} temporary detections, {} detections fit",
            layout.tek_store_period(),
            layout.temp_detections_max(),
            layout.detections_capacity(partition.size())
        );
        Ok(Self {
            blocks: BlockStore::new(partition),
            layout,
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Partition size in bytes
    pub fn size(&self) -> u32 {
        self.blocks.size()
    }

    /// Give the partition back
    pub fn release(self) -> Partition<F> {
        self.blocks.into_partition()
    }

    /// Read raw bytes at a partition address
    pub async fn read(&mut self, address: u32, buffer: &mut [u8]) -> Result<(), StorageError> {
        self.check_range(address, buffer.len())?;
        Ok(self.blocks.read(address, buffer).await?)
    }

    /// Write raw bytes at a partition address
    ///
    /// Each erase block the range touches is read, patched, erased and
    /// programmed back.
    pub async fn write(&mut self, address: u32, data: &[u8]) -> Result<(), StorageError> {
        self.check_range(address, data.len())?;
        Ok(self.blocks.write(address, data).await?)
    }

    /// Remove `size` bytes at `address`, shifting `[address + size, end)` down
    ///
    /// The hole must lie inside `[address, end)` and `end` inside the
    /// partition.
    pub async fn shift_delete(&mut self, address: u32, end: u32, size: u32) -> Result<(), StorageError> {
        let invalid = StorageError::InvalidRange {
            address,
            len: end.saturating_sub(address),
        };
        match address.checked_add(size) {
            Some(hole_end) if hole_end <= end && end <= self.size() => {}
            _ => return Err(invalid),
        }
        Ok(self.blocks.shift_delete(address, end, size).await?)
    }

    /// Reject raw ranges that leave the partition
    fn check_range(&self, address: u32, len: usize) -> Result<(), StorageError> {
        let len = u32::try_from(len).unwrap_or(u32::MAX);
        match address.checked_add(len) {
            Some(end) if end <= self.size() => Ok(()),
            _ => Err(StorageError::InvalidRange { address, len }),
        }
    }

    /// Whether every region counter has been initialised
    ///
    /// A freshly erased partition reads all ones; it must be formatted
    /// with [`erase`](Self::erase) before use.
    pub async fn is_formatted(&mut self) -> Result<bool, StorageError> {
        for region in Region::ALL {
            if self.count(region).await? == ERASED_COUNTER {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Raw counter of a region
    ///
    /// For the circular regions this is the lifetime write count, not the
    /// number of valid slots.
    pub async fn count(&mut self, region: Region) -> Result<u32, StorageError> {
        let address = self.layout.count_address(region);
        Ok(self.blocks.read_u32(address).await?)
    }

    /// Number of slots holding live records
    pub async fn stored(&mut self, region: Region) -> Result<u32, StorageError> {
        let count = self.count(region).await?;
        let capacity = self.slots(region);
        Ok(count.min(capacity))
    }

    /// Physical slot count of a region
    pub(crate) fn slots(&self, region: Region) -> u32 {
        self.layout
            .capacity(region)
            .unwrap_or_else(|| self.layout.detections_capacity(self.blocks.size()))
    }

    pub(crate) async fn set_count(&mut self, region: Region, count: u32) -> Result<(), StorageError> {
        let address = self.layout.count_address(region);
        Ok(self.blocks.write_u32(address, count).await?)
    }

    pub(crate) async fn read_slot<R: Record>(&mut self, region: Region, index: u32) -> Result<R, StorageError> {
        let address = self.layout.slot_address(region, index);
        let mut bytes = R::Bytes::default();
        self.blocks.read(address, bytes.as_mut()).await?;
        Ok(R::from_bytes(&bytes))
    }

    pub(crate) async fn write_slot<R: Record>(
        &mut self,
        region: Region,
        index: u32,
        record: &R,
    ) -> Result<(), StorageError> {
        let address = self.layout.slot_address(region, index);
        let bytes = record.to_bytes();
        Ok(self.blocks.write(address, bytes.as_ref()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{formatted, PARTITION_SIZE};
    use embassy_futures::block_on;
    use ena_core::LayoutError;
    use ena_hal::sim::RamFlash;

    #[test]
    fn test_new_rejects_layout_too_large() {
        let partition = Partition::new(RamFlash::<PARTITION_SIZE>::new(), 0, 4096).unwrap();
        let result = EnaStorage::new(partition, &StorageConfig::default());
        assert!(matches!(
            result,
            Err(StorageError::Layout(LayoutError::DoesNotFit { .. }))
        ));
    }

    #[test]
    fn test_blank_partition_is_not_formatted() {
        let partition =
            Partition::new(RamFlash::<PARTITION_SIZE>::new(), 0, PARTITION_SIZE as u32).unwrap();
        let mut storage = EnaStorage::new(partition, &StorageConfig::default()).unwrap();

        block_on(async {
            assert!(!storage.is_formatted().await.unwrap());
            storage.erase().await.unwrap();
            assert!(storage.is_formatted().await.unwrap());
        });
    }

    #[test]
    fn test_raw_range_errors_are_not_fatal() {
        let mut storage = formatted(StorageConfig::default());
        let size = storage.size();
        block_on(async {
            let mut buffer = [0u8; 8];
            let result = storage.read(size - 4, &mut buffer).await;
            assert_eq!(
                result,
                Err(StorageError::InvalidRange {
                    address: size - 4,
                    len: 8
                })
            );
            assert!(!result.unwrap_err().is_fatal());

            assert_eq!(
                storage.write(u32::MAX - 1, &[1, 2, 3, 4]).await,
                Err(StorageError::InvalidRange {
                    address: u32::MAX - 1,
                    len: 4
                })
            );

            // Hole past end, end past the partition
            assert_eq!(
                storage.shift_delete(1000, 1010, 32).await,
                Err(StorageError::InvalidRange {
                    address: 1000,
                    len: 10
                })
            );
            let result = storage.shift_delete(0, size + 64, 32).await;
            assert_eq!(
                result,
                Err(StorageError::InvalidRange {
                    address: 0,
                    len: size + 64
                })
            );
            assert!(!result.unwrap_err().is_fatal());

            // Counters were not touched
            assert!(storage.is_formatted().await.unwrap());
            assert_eq!(storage.tek_count().await.unwrap(), 0);
        });
    }

    #[test]
    fn test_stored_is_bounded_by_capacity() {
        let mut storage = formatted(StorageConfig::new(3, 5));
        block_on(async {
            storage.set_count(Region::Teks, 7).await.unwrap();
            assert_eq!(storage.count(Region::Teks).await.unwrap(), 7);
            assert_eq!(storage.stored(Region::Teks).await.unwrap(), 3);
        });
    }
}
