//! Storage errors

use ena_core::LayoutError;
use ena_hal::FlashError;

/// Errors from storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// Physical read, erase or write failed
    ///
    /// The medium is in an unknown state. There is no recovery path: the
    /// caller should treat this as a device fault and halt.
    Device(FlashError),
    /// Index outside the valid slots of a region
    IndexOutOfRange {
        /// Requested index
        index: u32,
        /// Number of valid slots at the time of the call
        count: u32,
    },
    /// Raw access range outside the partition or malformed
    ///
    /// Rejected before any flash operation, so nothing was changed.
    InvalidRange {
        /// Partition address of the first byte
        address: u32,
        /// Length of the requested range
        len: u32,
    },
    /// No room left in the partition for another confirmed detection
    Full,
    /// Region layout does not fit the partition
    Layout(LayoutError),
    /// The text sink of a dump rejected output
    Output,
}

impl StorageError {
    /// Whether this error means the flash itself failed
    pub fn is_fatal(&self) -> bool {
        matches!(self, StorageError::Device(_))
    }
}

impl From<FlashError> for StorageError {
    fn from(e: FlashError) -> Self {
        StorageError::Device(e)
    }
}

impl From<LayoutError> for StorageError {
    fn from(e: LayoutError) -> Self {
        StorageError::Layout(e)
    }
}

impl From<core::fmt::Error> for StorageError {
    fn from(_: core::fmt::Error) -> Self {
        StorageError::Output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_device_errors_are_fatal() {
        assert!(StorageError::Device(FlashError::Flash).is_fatal());
        assert!(StorageError::Device(FlashError::OutOfBounds).is_fatal());

        assert!(!StorageError::IndexOutOfRange { index: 1, count: 0 }.is_fatal());
        assert!(!StorageError::InvalidRange { address: 0, len: 8 }.is_fatal());
        assert!(!StorageError::Full.is_fatal());
        assert!(!StorageError::Layout(LayoutError::ZeroCapacity).is_fatal());
        assert!(!StorageError::Output.is_fatal());
    }
}
