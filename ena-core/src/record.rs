//! Fixed-size flash records
//!
//! Each record is a flat little-endian byte structure with no padding and
//! no pointers. The layouts match the packed structures already on
//! deployed devices, so existing partitions remain readable.
//!
//! ```text
//! TekRecord      | enin u32 | key_data [16]                                |  20 B
//! TempDetection  | first u32 | last u32 | rpi [16] | aem [4] | rssi i32     |  32 B
//! Detection      | timestamp u32 | rpi [16] | aem [4] | rssi i32            |  28 B
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Length of a temporary exposure key and of a rolling proximity identifier
pub const ENA_KEY_LENGTH: usize = 16;

/// Length of the associated encrypted metadata
pub const ENA_AEM_METADATA_LENGTH: usize = 4;

const TEK_RECORD_SIZE: usize = 4 + ENA_KEY_LENGTH;
const TEMP_DETECTION_SIZE: usize = 4 + 4 + ENA_KEY_LENGTH + ENA_AEM_METADATA_LENGTH + 4;
const DETECTION_SIZE: usize = 4 + ENA_KEY_LENGTH + ENA_AEM_METADATA_LENGTH + 4;

/// A record with a fixed on-flash size
///
/// Decoding cannot fail: every bit pattern is some record. An erased slot
/// decodes to all-ones fields.
pub trait Record: Sized {
    /// Encoded size in bytes
    const SIZE: usize;

    /// Byte array holding exactly [`Self::SIZE`] bytes
    type Bytes: AsRef<[u8]> + AsMut<[u8]> + Default;

    /// Encode to the on-flash representation
    fn to_bytes(&self) -> Self::Bytes;

    /// Decode from the on-flash representation
    fn from_bytes(bytes: &Self::Bytes) -> Self;
}

/// Temporary exposure key tied to an interval number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TekRecord {
    /// ENIntervalNumber the key became valid (10 minute intervals since epoch)
    pub enin: u32,
    /// Key material
    pub key_data: [u8; ENA_KEY_LENGTH],
}

impl TekRecord {
    pub const fn new(enin: u32, key_data: [u8; ENA_KEY_LENGTH]) -> Self {
        Self { enin, key_data }
    }
}

impl Record for TekRecord {
    const SIZE: usize = TEK_RECORD_SIZE;
    type Bytes = [u8; TEK_RECORD_SIZE];

    fn to_bytes(&self) -> Self::Bytes {
        let mut bytes = [0u8; TEK_RECORD_SIZE];
        bytes[0..4].copy_from_slice(&self.enin.to_le_bytes());
        bytes[4..].copy_from_slice(&self.key_data);
        bytes
    }

    fn from_bytes(bytes: &Self::Bytes) -> Self {
        let mut key_data = [0u8; ENA_KEY_LENGTH];
        key_data.copy_from_slice(&bytes[4..]);
        Self {
            enin: read_u32(bytes, 0),
            key_data,
        }
    }
}

/// Provisional sighting of a remote identifier
///
/// Kept while the identifier is still being observed; `timestamp_last` is
/// refreshed in place on every new sighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TempDetection {
    /// First time the identifier was seen (unix seconds)
    pub timestamp_first: u32,
    /// Most recent time the identifier was seen (unix seconds)
    pub timestamp_last: u32,
    /// Rolling proximity identifier
    pub rpi: [u8; ENA_KEY_LENGTH],
    /// Associated encrypted metadata
    pub aem: [u8; ENA_AEM_METADATA_LENGTH],
    /// Received signal strength (dBm)
    pub rssi: i32,
}

impl TempDetection {
    /// Seconds between first and last sighting
    pub fn duration(&self) -> u32 {
        self.timestamp_last.saturating_sub(self.timestamp_first)
    }

    /// Turn this sighting into a confirmed detection
    ///
    /// The confirmed record keeps the time of first contact.
    pub fn confirm(&self) -> Detection {
        Detection {
            timestamp: self.timestamp_first,
            rpi: self.rpi,
            aem: self.aem,
            rssi: self.rssi,
        }
    }
}

impl Record for TempDetection {
    const SIZE: usize = TEMP_DETECTION_SIZE;
    type Bytes = [u8; TEMP_DETECTION_SIZE];

    fn to_bytes(&self) -> Self::Bytes {
        let mut bytes = [0u8; TEMP_DETECTION_SIZE];
        bytes[0..4].copy_from_slice(&self.timestamp_first.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.timestamp_last.to_le_bytes());
        bytes[8..24].copy_from_slice(&self.rpi);
        bytes[24..28].copy_from_slice(&self.aem);
        bytes[28..32].copy_from_slice(&self.rssi.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &Self::Bytes) -> Self {
        let mut rpi = [0u8; ENA_KEY_LENGTH];
        rpi.copy_from_slice(&bytes[8..24]);
        let mut aem = [0u8; ENA_AEM_METADATA_LENGTH];
        aem.copy_from_slice(&bytes[24..28]);
        Self {
            timestamp_first: read_u32(bytes, 0),
            timestamp_last: read_u32(bytes, 4),
            rpi,
            aem,
            rssi: read_u32(bytes, 28) as i32,
        }
    }
}

/// Confirmed contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Detection {
    /// Time of contact (unix seconds)
    pub timestamp: u32,
    /// Rolling proximity identifier
    pub rpi: [u8; ENA_KEY_LENGTH],
    /// Associated encrypted metadata
    pub aem: [u8; ENA_AEM_METADATA_LENGTH],
    /// Received signal strength (dBm)
    pub rssi: i32,
}

impl Record for Detection {
    const SIZE: usize = DETECTION_SIZE;
    type Bytes = [u8; DETECTION_SIZE];

    fn to_bytes(&self) -> Self::Bytes {
        let mut bytes = [0u8; DETECTION_SIZE];
        bytes[0..4].copy_from_slice(&self.timestamp.to_le_bytes());
        bytes[4..20].copy_from_slice(&self.rpi);
        bytes[20..24].copy_from_slice(&self.aem);
        bytes[24..28].copy_from_slice(&self.rssi.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &Self::Bytes) -> Self {
        let mut rpi = [0u8; ENA_KEY_LENGTH];
        rpi.copy_from_slice(&bytes[4..20]);
        let mut aem = [0u8; ENA_AEM_METADATA_LENGTH];
        aem.copy_from_slice(&bytes[20..24]);
        Self {
            timestamp: read_u32(bytes, 0),
            rpi,
            aem,
            rssi: read_u32(bytes, 24) as i32,
        }
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sizes_match_device_format() {
        assert_eq!(TekRecord::SIZE, 20);
        assert_eq!(TempDetection::SIZE, 32);
        assert_eq!(Detection::SIZE, 28);
    }

    #[test]
    fn test_tek_byte_layout() {
        let tek = TekRecord::new(0x0102_0304, [0xAB; ENA_KEY_LENGTH]);
        let bytes = tek.to_bytes();

        assert_eq!(&bytes[0..4], &[0x04, 0x03, 0x02, 0x01]);
        assert!(bytes[4..].iter().all(|&b| b == 0xAB));
        assert_eq!(TekRecord::from_bytes(&bytes), tek);
    }

    #[test]
    fn test_negative_rssi_survives_encoding() {
        let detection = Detection {
            timestamp: 1_600_000_000,
            rpi: [7; ENA_KEY_LENGTH],
            aem: [1, 2, 3, 4],
            rssi: -87,
        };
        let bytes = detection.to_bytes();

        assert_eq!(&bytes[24..28], &(-87i32).to_le_bytes());
        assert_eq!(Detection::from_bytes(&bytes).rssi, -87);
    }

    #[test]
    fn test_erased_slot_decodes_to_all_ones() {
        let erased = [0xFFu8; TEMP_DETECTION_SIZE];
        let detection = TempDetection::from_bytes(&erased);

        assert_eq!(detection.timestamp_first, u32::MAX);
        assert_eq!(detection.rpi, [0xFF; ENA_KEY_LENGTH]);
        assert_eq!(detection.rssi, -1);
    }

    #[test]
    fn test_confirm_keeps_first_contact() {
        let temp = TempDetection {
            timestamp_first: 1000,
            timestamp_last: 1900,
            rpi: [9; ENA_KEY_LENGTH],
            aem: [4, 3, 2, 1],
            rssi: -60,
        };

        assert_eq!(temp.duration(), 900);

        let confirmed = temp.confirm();
        assert_eq!(confirmed.timestamp, 1000);
        assert_eq!(confirmed.rpi, temp.rpi);
        assert_eq!(confirmed.aem, temp.aem);
        assert_eq!(confirmed.rssi, -60);
    }

    #[test]
    fn test_duration_saturates_on_clock_skew() {
        let temp = TempDetection {
            timestamp_first: 2000,
            timestamp_last: 1000,
            ..Default::default()
        };
        assert_eq!(temp.duration(), 0);
    }
}
