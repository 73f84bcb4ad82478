//! Board-agnostic data model for ENA storage
//!
//! This crate contains everything about the on-flash format that does not
//! touch hardware:
//!
//! - Fixed-size record types and their byte layout
//! - Region layout arithmetic (where each log starts and ends)
//! - Capacity configuration

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod layout;
pub mod record;

pub use config::StorageConfig;
pub use layout::{Layout, LayoutError, Region, COUNTER_SIZE};
pub use record::{
    Detection, Record, TekRecord, TempDetection, ENA_AEM_METADATA_LENGTH, ENA_KEY_LENGTH,
};
