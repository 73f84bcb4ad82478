//! Text dumps of the stored regions
//!
//! One CSV-like table per region: a header row, then one row per stored
//! record with byte fields as lowercase hex pairs separated by spaces.
//! Meant for reading and grepping, not for parsing back.

use core::fmt::{self, Write};

use embedded_storage_async::nor_flash::NorFlash;

use ena_core::{Detection, Region, TekRecord, TempDetection};

use crate::error::StorageError;
use crate::storage::EnaStorage;

/// Space-separated hex bytes
struct Hex<'a>(&'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_char(' ')?;
            }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl<F: NorFlash> EnaStorage<F> {
    /// Write the key ring in slot order
    pub async fn dump_teks<W: Write>(&mut self, out: &mut W) -> Result<(), StorageError> {
        let count = self.tek_count().await?;
        let stored = self.stored_teks().await?;
        debug!("{} teks ({} stored)", count, stored);

        writeln!(out, "#,enin,tek")?;
        for slot in 0..stored {
            let tek: TekRecord = self.read_slot(Region::Teks, slot).await?;
            writeln!(out, "{},{},{}", slot, tek.enin, Hex(&tek.key_data))?;
        }
        Ok(())
    }

    /// Write the temporary detection ring in slot order
    pub async fn dump_temp_detections<W: Write>(&mut self, out: &mut W) -> Result<(), StorageError> {
        let count = self.temp_detections_count().await?;
        let stored = self.stored_temp_detections().await?;
        debug!("{} temporary detections ({} stored)", count, stored);

        writeln!(out, "#,timestamp_first,timestamp_last,rpi,aem,rssi")?;
        for index in 0..stored {
            let detection: TempDetection = self.read_slot(Region::TemporaryDetections, index).await?;
            writeln!(
                out,
                "{},{},{},{},{},{}",
                index,
                detection.timestamp_first,
                detection.timestamp_last,
                Hex(&detection.rpi),
                Hex(&detection.aem),
                detection.rssi
            )?;
        }
        Ok(())
    }

    /// Write the confirmed detection log
    pub async fn dump_detections<W: Write>(&mut self, out: &mut W) -> Result<(), StorageError> {
        let stored = self.stored(Region::Detections).await?;
        debug!("{} detections", stored);

        writeln!(out, "#,timestamp,rpi,aem,rssi")?;
        for index in 0..stored {
            let detection: Detection = self.read_slot(Region::Detections, index).await?;
            writeln!(
                out,
                "{},{},{},{},{}",
                index,
                detection.timestamp,
                Hex(&detection.rpi),
                Hex(&detection.aem),
                detection.rssi
            )?;
        }
        Ok(())
    }

    /// Write all three tables in partition order
    pub async fn dump_all<W: Write>(&mut self, out: &mut W) -> Result<(), StorageError> {
        self.dump_teks(out).await?;
        self.dump_temp_detections(out).await?;
        self.dump_detections(out).await
    }
}
