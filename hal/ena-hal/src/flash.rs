//! Flash partition abstraction
//!
//! A [`Partition`] is the byte window `[start, start + size)` of a NOR flash
//! device. Every offset handed to it is relative to the partition start, so
//! the storage engine addresses its regions from zero no matter where the
//! board places the partition.

use embedded_storage::nor_flash::{NorFlashError, NorFlashErrorKind};
use embedded_storage_async::nor_flash::NorFlash;

/// Erase-block size the storage layout is built around
///
/// Every write pays for a full read-erase-write of one such block.
pub const BLOCK_SIZE: usize = 4096;

/// Errors from flash partition operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// The flash driver reported a failure
    Flash,
    /// Offset or length not aligned to what the device requires
    NotAligned,
    /// Access outside the partition or the device
    OutOfBounds,
}

impl FlashError {
    fn from_driver<E: NorFlashError>(error: E) -> Self {
        match error.kind() {
            NorFlashErrorKind::NotAligned => FlashError::NotAligned,
            NorFlashErrorKind::OutOfBounds => FlashError::OutOfBounds,
            _ => FlashError::Flash,
        }
    }
}

/// Raw flash partition
///
/// Owns the flash driver for its whole lifetime. The handle is resolved
/// once at boot and injected into the storage engine.
pub struct Partition<F> {
    flash: F,
    start: u32,
    size: u32,
}

impl<F: NorFlash> Partition<F> {
    /// Create a partition covering `size` bytes from `start`
    ///
    /// Both `start` and `size` must be multiples of [`BLOCK_SIZE`], and
    /// [`BLOCK_SIZE`] must be a multiple of the device erase size.
    pub fn new(flash: F, start: u32, size: u32) -> Result<Self, FlashError> {
        let block = BLOCK_SIZE as u32;
        if size == 0 || start % block != 0 || size % block != 0 || BLOCK_SIZE % F::ERASE_SIZE != 0
        {
            return Err(FlashError::NotAligned);
        }

        let end = start.checked_add(size).ok_or(FlashError::OutOfBounds)?;
        if end as usize > flash.capacity() {
            return Err(FlashError::OutOfBounds);
        }

        Ok(Self { flash, start, size })
    }

    /// Partition size in bytes
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Absolute device offset of the partition
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Give the flash driver back
    pub fn release(self) -> F {
        self.flash
    }

    /// Borrow the underlying driver
    pub fn flash(&mut self) -> &mut F {
        &mut self.flash
    }

    /// Read `buffer.len()` bytes at `offset`
    pub async fn read(&mut self, offset: u32, buffer: &mut [u8]) -> Result<(), FlashError> {
        let absolute = self.absolute(offset, buffer.len())?;
        self.flash
            .read(absolute, buffer)
            .await
            .map_err(FlashError::from_driver)
    }

    /// Erase the blocks covering `[from, to)`
    pub async fn erase(&mut self, from: u32, to: u32) -> Result<(), FlashError> {
        if to < from {
            return Err(FlashError::OutOfBounds);
        }
        let absolute = self.absolute(from, (to - from) as usize)?;
        self.flash
            .erase(absolute, absolute + (to - from))
            .await
            .map_err(FlashError::from_driver)
    }

    /// Program `data` at `offset`
    ///
    /// The target bytes must have been erased beforehand.
    pub async fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), FlashError> {
        let absolute = self.absolute(offset, data.len())?;
        self.flash
            .write(absolute, data)
            .await
            .map_err(FlashError::from_driver)
    }

    /// Erase the whole partition
    pub async fn erase_all(&mut self) -> Result<(), FlashError> {
        self.erase(0, self.size).await
    }

    /// Translate a partition-relative range to a device offset
    fn absolute(&self, offset: u32, len: usize) -> Result<u32, FlashError> {
        let len = u32::try_from(len).map_err(|_| FlashError::OutOfBounds)?;
        let end = offset.checked_add(len).ok_or(FlashError::OutOfBounds)?;
        if end > self.size {
            return Err(FlashError::OutOfBounds);
        }
        Ok(self.start + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::RamFlash;
    use embassy_futures::block_on;

    const DEVICE: usize = 4 * BLOCK_SIZE;

    #[test]
    fn test_partition_rejects_unaligned_window() {
        let result = Partition::new(RamFlash::<DEVICE>::new(), 100, BLOCK_SIZE as u32);
        assert!(matches!(result, Err(FlashError::NotAligned)));

        let result = Partition::new(RamFlash::<DEVICE>::new(), 0, 1000);
        assert!(matches!(result, Err(FlashError::NotAligned)));
    }

    #[test]
    fn test_partition_rejects_window_past_device() {
        let result = Partition::new(
            RamFlash::<DEVICE>::new(),
            2 * BLOCK_SIZE as u32,
            3 * BLOCK_SIZE as u32,
        );
        assert!(matches!(result, Err(FlashError::OutOfBounds)));
    }

    #[test]
    fn test_offsets_are_partition_relative() {
        let mut partition = Partition::new(
            RamFlash::<DEVICE>::new(),
            BLOCK_SIZE as u32,
            2 * BLOCK_SIZE as u32,
        )
        .unwrap();

        block_on(async {
            partition.erase(0, BLOCK_SIZE as u32).await.unwrap();
            partition.write(8, &[1, 2, 3]).await.unwrap();

            let mut buffer = [0u8; 3];
            partition.read(8, &mut buffer).await.unwrap();
            assert_eq!(buffer, [1, 2, 3]);
        });

        let flash = partition.release();
        assert_eq!(&flash.as_bytes()[BLOCK_SIZE + 8..BLOCK_SIZE + 11], &[1, 2, 3]);
        assert_eq!(flash.as_bytes()[8], 0xFF);
    }

    #[test]
    fn test_access_past_partition_end() {
        let mut partition =
            Partition::new(RamFlash::<DEVICE>::new(), 0, BLOCK_SIZE as u32).unwrap();

        block_on(async {
            let mut buffer = [0u8; 8];
            assert_eq!(
                partition.read(BLOCK_SIZE as u32 - 4, &mut buffer).await,
                Err(FlashError::OutOfBounds)
            );
            assert_eq!(
                partition.write(u32::MAX, &[0]).await,
                Err(FlashError::OutOfBounds)
            );
        });
    }

    #[test]
    fn test_driver_errors_are_classified() {
        let mut partition =
            Partition::new(RamFlash::<DEVICE>::new(), 0, DEVICE as u32).unwrap();

        block_on(async {
            assert_eq!(
                partition.erase(10, 20).await,
                Err(FlashError::NotAligned)
            );

            partition.flash().set_faulty(true);
            let mut buffer = [0u8; 4];
            assert_eq!(partition.read(0, &mut buffer).await, Err(FlashError::Flash));
        });
    }
}
