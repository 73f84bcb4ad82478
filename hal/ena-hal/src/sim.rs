//! RAM-backed NOR flash simulator
//!
//! Behaves like a real NOR part as far as the storage engine can tell:
//! erased bytes read as `0xFF`, erase works on whole blocks only, and a
//! program operation may only clear bits. Programming a byte that was not
//! erased is reported as an error instead of silently AND-ing, so a missing
//! erase in the engine shows up in tests.

use embedded_storage::nor_flash::{ErrorType, NorFlashError, NorFlashErrorKind};
use embedded_storage_async::nor_flash::{NorFlash, ReadNorFlash};

use crate::flash::BLOCK_SIZE;

/// Errors raised by [`RamFlash`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RamFlashError {
    /// Erase range not on block boundaries
    NotAligned,
    /// Access past the end of the device
    OutOfBounds,
    /// Program attempted over bytes that were not erased
    NotErased,
    /// Injected device fault
    Fault,
}

impl NorFlashError for RamFlashError {
    fn kind(&self) -> NorFlashErrorKind {
        match self {
            RamFlashError::NotAligned => NorFlashErrorKind::NotAligned,
            RamFlashError::OutOfBounds => NorFlashErrorKind::OutOfBounds,
            RamFlashError::NotErased | RamFlashError::Fault => NorFlashErrorKind::Other,
        }
    }
}

/// Operation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlashStats {
    pub reads: usize,
    pub erases: usize,
    pub writes: usize,
}

/// Simulated NOR flash of `SIZE` bytes
pub struct RamFlash<const SIZE: usize> {
    data: [u8; SIZE],
    stats: FlashStats,
    faulty: bool,
}

impl<const SIZE: usize> Default for RamFlash<SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const SIZE: usize> RamFlash<SIZE> {
    /// A fully erased device
    pub const fn new() -> Self {
        Self {
            data: [0xFF; SIZE],
            stats: FlashStats {
                reads: 0,
                erases: 0,
                writes: 0,
            },
            faulty: false,
        }
    }

    /// Raw device contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Counters since creation or the last [`reset_stats`](Self::reset_stats)
    pub fn stats(&self) -> FlashStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = FlashStats::default();
    }

    /// Make every following operation fail with [`RamFlashError::Fault`]
    pub fn set_faulty(&mut self, faulty: bool) {
        self.faulty = faulty;
    }

    fn check(&self, offset: u32, len: usize) -> Result<usize, RamFlashError> {
        if self.faulty {
            return Err(RamFlashError::Fault);
        }
        let start = offset as usize;
        match start.checked_add(len) {
            Some(end) if end <= SIZE => Ok(start),
            _ => Err(RamFlashError::OutOfBounds),
        }
    }
}

impl<const SIZE: usize> ErrorType for RamFlash<SIZE> {
    type Error = RamFlashError;
}

impl<const SIZE: usize> ReadNorFlash for RamFlash<SIZE> {
    const READ_SIZE: usize = 1;

    async fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let start = self.check(offset, bytes.len())?;
        bytes.copy_from_slice(&self.data[start..start + bytes.len()]);
        self.stats.reads += 1;
        Ok(())
    }

    fn capacity(&self) -> usize {
        SIZE
    }
}

impl<const SIZE: usize> NorFlash for RamFlash<SIZE> {
    const WRITE_SIZE: usize = 1;
    const ERASE_SIZE: usize = BLOCK_SIZE;

    async fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        if to < from {
            return Err(RamFlashError::OutOfBounds);
        }
        let start = self.check(from, (to - from) as usize)?;
        if from as usize % BLOCK_SIZE != 0 || to as usize % BLOCK_SIZE != 0 {
            return Err(RamFlashError::NotAligned);
        }
        self.data[start..to as usize].fill(0xFF);
        self.stats.erases += 1;
        Ok(())
    }

    async fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let start = self.check(offset, bytes.len())?;
        let target = &mut self.data[start..start + bytes.len()];
        // NOR programming can only clear bits
        if target.iter().zip(bytes).any(|(old, new)| old & new != *new) {
            return Err(RamFlashError::NotErased);
        }
        target.copy_from_slice(bytes);
        self.stats.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    #[test]
    fn test_program_requires_erase() {
        let mut flash = RamFlash::<BLOCK_SIZE>::new();
        block_on(async {
            flash.write(0, &[0x0F]).await.unwrap();
            // Clearing more bits is fine, setting them back is not
            flash.write(0, &[0x0E]).await.unwrap();
            assert_eq!(flash.write(0, &[0xF0]).await, Err(RamFlashError::NotErased));

            flash.erase(0, BLOCK_SIZE as u32).await.unwrap();
            flash.write(0, &[0xF0]).await.unwrap();
        });
        assert_eq!(flash.as_bytes()[0], 0xF0);
        assert_eq!(
            flash.stats(),
            FlashStats {
                reads: 0,
                erases: 1,
                writes: 3
            }
        );
    }

    #[test]
    fn test_erase_alignment() {
        let mut flash = RamFlash::<{ 2 * BLOCK_SIZE }>::new();
        block_on(async {
            assert_eq!(flash.erase(1, BLOCK_SIZE as u32).await, Err(RamFlashError::NotAligned));
            assert_eq!(
                flash.erase(0, 3 * BLOCK_SIZE as u32).await,
                Err(RamFlashError::OutOfBounds)
            );
        });
    }
}
