//! Test fixtures

use embassy_futures::block_on;

use ena_core::{Detection, StorageConfig, TekRecord, TempDetection, ENA_KEY_LENGTH};
use ena_hal::sim::RamFlash;
use ena_hal::{Partition, BLOCK_SIZE};

use crate::storage::EnaStorage;

/// Big enough for the default layout plus about a thousand detections
pub const PARTITION_SIZE: usize = 16 * BLOCK_SIZE;

pub type TestFlash = RamFlash<PARTITION_SIZE>;

/// Storage over a freshly formatted simulated partition
pub fn formatted(config: StorageConfig) -> EnaStorage<TestFlash> {
    let partition = Partition::new(TestFlash::new(), 0, PARTITION_SIZE as u32).unwrap();
    let mut storage = EnaStorage::new(partition, &config).unwrap();
    block_on(storage.erase()).unwrap();
    storage
}

/// Two-block partition with tiny rings, so the detection log fills up fast
pub fn formatted_small() -> EnaStorage<RamFlash<{ 2 * BLOCK_SIZE }>> {
    let partition = Partition::new(RamFlash::new(), 0, 2 * BLOCK_SIZE as u32).unwrap();
    let mut storage = EnaStorage::new(partition, &StorageConfig::new(2, 4)).unwrap();
    block_on(storage.erase()).unwrap();
    storage
}

pub fn tek(enin: u32) -> TekRecord {
    let mut key_data = [0u8; ENA_KEY_LENGTH];
    key_data[..4].copy_from_slice(&enin.to_le_bytes());
    key_data[15] = 0x5A;
    TekRecord::new(enin, key_data)
}

/// Temporary detection whose identifier starts with `marker`
pub fn temp_detection(marker: u8) -> TempDetection {
    TempDetection {
        timestamp_first: 1_600_000_000 + marker as u32,
        timestamp_last: 1_600_000_060 + marker as u32,
        rpi: [marker; ENA_KEY_LENGTH],
        aem: [marker, 0, 0, 1],
        rssi: -40 - marker as i32,
    }
}

/// Confirmed detection whose identifier starts with `marker`
pub fn detection(marker: u8) -> Detection {
    Detection {
        timestamp: 1_600_000_000 + marker as u32,
        rpi: [marker; ENA_KEY_LENGTH],
        aem: [0, 0, 0, marker],
        rssi: -70 + marker as i32,
    }
}
