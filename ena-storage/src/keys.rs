//! Temporary exposure key log
//!
//! A ring of `tek_store_period` slots. The counter is the lifetime number
//! of keys written; key `n` (zero based) lives in slot `n % period`, so
//! once the ring is full each new key overwrites the oldest one.

use embedded_storage_async::nor_flash::NorFlash;

use ena_core::{Region, TekRecord};

use crate::error::StorageError;
use crate::storage::EnaStorage;

/// Most recent key and the lifetime key count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LastTek {
    /// Number of keys ever written
    pub count: u32,
    pub tek: TekRecord,
}

impl<F: NorFlash> EnaStorage<F> {
    /// Lifetime number of keys written
    pub async fn tek_count(&mut self) -> Result<u32, StorageError> {
        self.count(Region::Teks).await
    }

    /// Number of keys currently held in the ring
    pub async fn stored_teks(&mut self) -> Result<u32, StorageError> {
        self.stored(Region::Teks).await
    }

    /// Most recently written key, or `None` if no key was ever written
    pub async fn read_last_tek(&mut self) -> Result<Option<LastTek>, StorageError> {
        let count = self.tek_count().await?;
        if count == 0 {
            return Ok(None);
        }
        let slot = (count - 1) % self.layout.tek_store_period();
        let tek: TekRecord = self.read_slot(Region::Teks, slot).await?;
        debug!("read last tek {} from slot {}", tek.enin, slot);
        Ok(Some(LastTek { count, tek }))
    }

    /// Key stored in ring slot `slot`
    pub async fn get_tek(&mut self, slot: u32) -> Result<TekRecord, StorageError> {
        let stored = self.stored_teks().await?;
        if slot >= stored {
            return Err(StorageError::IndexOutOfRange {
                index: slot,
                count: stored,
            });
        }
        self.read_slot(Region::Teks, slot).await
    }

    /// Append a key, overwriting the oldest once the ring is full
    pub async fn write_tek(&mut self, tek: &TekRecord) -> Result<(), StorageError> {
        let count = self.tek_count().await?;
        let slot = count % self.layout.tek_store_period();
        self.write_slot(Region::Teks, slot, tek).await?;
        self.set_count(Region::Teks, count.wrapping_add(1)).await?;
        debug!("write tek {} to slot {}", tek.enin, slot);
        Ok(())
    }

    /// Zero the counter and every occupied slot
    pub async fn erase_teks(&mut self) -> Result<(), StorageError> {
        self.erase_region(Region::Teks).await
    }
}
