//! Region layout
//!
//! The partition holds three regions back to back, each a `u32` counter
//! followed by an array of fixed-size records:
//!
//! ```text
//! 0
//! ├── tek count        u32
//! ├── teks             TekRecord     × tek_store_period
//! ├── temp count       u32
//! ├── temp detections  TempDetection × temp_detections_max
//! ├── detection count  u32
//! └── detections       Detection     × (whatever fits)
//! ```
//!
//! Every address here is relative to the partition start.

use crate::config::StorageConfig;
use crate::record::{Detection, Record, TekRecord, TempDetection};

/// Size of a region counter in bytes
pub const COUNTER_SIZE: u32 = 4;

/// One of the three logical regions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Region {
    /// Circular log of temporary exposure keys
    Teks,
    /// Circular log of provisional detections
    TemporaryDetections,
    /// Append-only log of confirmed detections
    Detections,
}

impl Region {
    /// All regions in partition order
    pub const ALL: [Region; 3] = [
        Region::Teks,
        Region::TemporaryDetections,
        Region::Detections,
    ];

    /// Size of one record in this region
    pub const fn record_size(self) -> u32 {
        match self {
            Region::Teks => TekRecord::SIZE as u32,
            Region::TemporaryDetections => TempDetection::SIZE as u32,
            Region::Detections => Detection::SIZE as u32,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Region::Teks => "teks",
            Region::TemporaryDetections => "temporary detections",
            Region::Detections => "detections",
        }
    }
}

/// Layout validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LayoutError {
    /// A bounded region was configured with zero slots
    ZeroCapacity,
    /// The bounded regions and the detection counter exceed the partition
    DoesNotFit {
        /// Bytes needed before the first confirmed detection
        required: u64,
        /// Partition size
        available: u32,
    },
}

/// Byte offsets of every region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Layout {
    tek_store_period: u32,
    temp_detections_max: u32,
}

impl Layout {
    pub const fn new(config: &StorageConfig) -> Self {
        Self {
            tek_store_period: config.tek_store_period,
            temp_detections_max: config.temp_detections_max,
        }
    }

    pub const fn tek_store_period(&self) -> u32 {
        self.tek_store_period
    }

    pub const fn temp_detections_max(&self) -> u32 {
        self.temp_detections_max
    }

    /// Number of slots in a bounded region, `None` for confirmed detections
    pub const fn capacity(&self, region: Region) -> Option<u32> {
        match region {
            Region::Teks => Some(self.tek_store_period),
            Region::TemporaryDetections => Some(self.temp_detections_max),
            Region::Detections => None,
        }
    }

    /// Address of the region counter
    pub const fn count_address(&self, region: Region) -> u32 {
        match region {
            Region::Teks => 0,
            Region::TemporaryDetections => {
                self.start_address(Region::Teks) + TekRecord::SIZE as u32 * self.tek_store_period
            }
            Region::Detections => {
                self.start_address(Region::TemporaryDetections)
                    + TempDetection::SIZE as u32 * self.temp_detections_max
            }
        }
    }

    /// Address of the first record slot
    pub const fn start_address(&self, region: Region) -> u32 {
        self.count_address(region) + COUNTER_SIZE
    }

    /// Address of record slot `index`
    ///
    /// `index` must be a slot of the region; callers bound it first.
    pub const fn slot_address(&self, region: Region, index: u32) -> u32 {
        self.start_address(region) + index * region.record_size()
    }

    /// Exclusive end of a bounded region
    pub const fn end_address(&self, region: Region) -> Option<u32> {
        match self.capacity(region) {
            Some(capacity) => Some(self.slot_address(region, capacity)),
            None => None,
        }
    }

    /// Bytes the layout needs before any confirmed detection is stored
    pub const fn required_size(&self) -> u64 {
        COUNTER_SIZE as u64
            + TekRecord::SIZE as u64 * self.tek_store_period as u64
            + COUNTER_SIZE as u64
            + TempDetection::SIZE as u64 * self.temp_detections_max as u64
            + COUNTER_SIZE as u64
    }

    /// Check that the layout fits a partition of `partition_size` bytes
    pub fn check(&self, partition_size: u32) -> Result<(), LayoutError> {
        if self.tek_store_period == 0 || self.temp_detections_max == 0 {
            return Err(LayoutError::ZeroCapacity);
        }
        let required = self.required_size();
        if required > partition_size as u64 {
            return Err(LayoutError::DoesNotFit {
                required,
                available: partition_size,
            });
        }
        Ok(())
    }

    /// Number of confirmed detections that physically fit
    ///
    /// Only meaningful for a layout that passed [`check`](Self::check).
    pub const fn detections_capacity(&self, partition_size: u32) -> u32 {
        let start = self.start_address(Region::Detections);
        if partition_size <= start {
            return 0;
        }
        (partition_size - start) / Detection::SIZE as u32
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(&StorageConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reference_layout_addresses() {
        let layout = Layout::default();

        assert_eq!(layout.count_address(Region::Teks), 0);
        assert_eq!(layout.start_address(Region::Teks), 4);
        // 4 + 20 * 14
        assert_eq!(layout.count_address(Region::TemporaryDetections), 284);
        assert_eq!(layout.start_address(Region::TemporaryDetections), 288);
        // 288 + 32 * 1000
        assert_eq!(layout.count_address(Region::Detections), 32_288);
        assert_eq!(layout.start_address(Region::Detections), 32_292);
        assert_eq!(layout.required_size(), 32_292);
    }

    #[test]
    fn test_slot_addresses() {
        let layout = Layout::default();
        assert_eq!(layout.slot_address(Region::Teks, 13), 4 + 13 * 20);
        assert_eq!(
            layout.end_address(Region::Teks),
            Some(layout.count_address(Region::TemporaryDetections))
        );
        assert_eq!(layout.end_address(Region::Detections), None);
    }

    #[test]
    fn test_check_rejects_small_partition() {
        let layout = Layout::default();

        assert_eq!(layout.check(64 * 1024), Ok(()));
        assert_eq!(
            layout.check(16 * 1024),
            Err(LayoutError::DoesNotFit {
                required: 32_292,
                available: 16 * 1024
            })
        );
    }

    #[test]
    fn test_check_rejects_zero_capacity() {
        let layout = Layout::new(&StorageConfig::new(0, 10));
        assert_eq!(layout.check(64 * 1024), Err(LayoutError::ZeroCapacity));
    }

    #[test]
    fn test_detections_capacity() {
        let layout = Layout::default();
        assert_eq!(layout.detections_capacity(65_536), (65_536 - 32_292) / 28);
        assert_eq!(layout.detections_capacity(1024), 0);
    }

    proptest! {
        #[test]
        fn test_regions_are_contiguous_and_disjoint(
            period in 1u32..500,
            max in 1u32..20_000,
        ) {
            let layout = Layout::new(&StorageConfig::new(period, max));

            let mut previous_end = 0u32;
            for region in Region::ALL {
                prop_assert_eq!(layout.count_address(region), previous_end);
                prop_assert!(layout.start_address(region) > layout.count_address(region));
                if let Some(end) = layout.end_address(region) {
                    previous_end = end;
                }
            }
            prop_assert_eq!(
                layout.start_address(Region::Detections) as u64,
                layout.required_size()
            );
        }
    }
}
