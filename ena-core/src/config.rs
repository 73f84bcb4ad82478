//! Capacity configuration
//!
//! The capacities fix the address of every region, so they are chosen at
//! build time. Changing them over a populated partition without erasing it
//! first makes the stored data unreadable.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of temporary exposure keys kept (one per day for two weeks)
pub const TEK_STORE_PERIOD: u32 = 14;

/// Number of temporary detections kept before the oldest is overwritten
pub const TEMP_DETECTIONS_MAX: u32 = 1000;

/// Region capacities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StorageConfig {
    /// Slots in the key log
    pub tek_store_period: u32,
    /// Slots in the temporary detection ring
    pub temp_detections_max: u32,
}

impl StorageConfig {
    pub const fn new(tek_store_period: u32, temp_detections_max: u32) -> Self {
        Self {
            tek_store_period,
            temp_detections_max,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(TEK_STORE_PERIOD, TEMP_DETECTIONS_MAX)
    }
}
