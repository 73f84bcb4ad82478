//! ENA storage firmware
//!
//! Firmware binary for RP2040-based exposure notification devices.
//! Resolves the storage partition once at boot, formats it when blank and
//! hands the engine to the tasks behind a single lock.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::flash::{Async, Flash};
use embassy_rp::peripherals::FLASH;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use ena_storage::{EnaStorage, Partition, SharedStorage, StorageError};

use crate::channels::MAINTENANCE;
use crate::config::{FLASH_SIZE, PARTITION_OFFSET, PARTITION_SIZE, STORAGE_CONFIG};
use crate::tasks::MaintenanceRequest;

mod channels;
mod config;
mod fault;
mod log_sink;
mod tasks;

/// External flash driven through DMA
pub type BoardFlash = Flash<'static, FLASH, Async, FLASH_SIZE>;

/// Storage engine shared between tasks
pub type Storage = SharedStorage<CriticalSectionRawMutex, BoardFlash>;

static STORAGE: StaticCell<Storage> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("ENA storage firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let flash: BoardFlash = Flash::new(p.FLASH, p.DMA_CH0);
    let mut storage = match open_storage(flash).await {
        Ok(storage) => storage,
        Err(e) => {
            error!("Storage unavailable: {}", e);
            panic!("storage init failed");
        }
    };

    if let Err(e) = log_summary(&mut storage).await {
        fault::handle_storage_error("boot summary", e);
    }

    let storage: &'static Storage = STORAGE.init(Mutex::new(storage));
    spawner.spawn(tasks::maintenance_task(storage)).unwrap();
    info!("All tasks spawned, firmware running");

    // Log what survived the last power cycle
    MAINTENANCE.signal(MaintenanceRequest::Dump);
}

/// Resolve the partition and format it on first boot
async fn open_storage(flash: BoardFlash) -> Result<EnaStorage<BoardFlash>, StorageError> {
    let partition = Partition::new(flash, PARTITION_OFFSET, PARTITION_SIZE)?;
    info!(
        "Storage partition: {} bytes at {:#x}",
        partition.size(),
        partition.start()
    );

    let mut storage = EnaStorage::new(partition, &STORAGE_CONFIG)?;
    if !storage.is_formatted().await? {
        warn!("Storage partition is blank, formatting");
        storage.erase().await?;
    }
    Ok(storage)
}

/// Log region counters and the most recent key
async fn log_summary(storage: &mut EnaStorage<BoardFlash>) -> Result<(), StorageError> {
    let teks = storage.tek_count().await?;
    let temporary = storage.temp_detections_count().await?;
    let detections = storage.detections_count().await?;
    info!(
        "Stored: {} teks, {} temporary detections, {} detections",
        teks, temporary, detections
    );

    match storage.read_last_tek().await? {
        Some(last) => info!("Last tek: enin {} ({} written)", last.tek.enin, last.count),
        None => info!("No tek stored yet"),
    }
    Ok(())
}
