//! Flash storage engine for exposure notification data
//!
//! Persists temporary exposure keys and contact detections on raw NOR
//! flash at fixed addresses inside one partition. Three regions are laid
//! out back to back (see [`ena_core::layout`]):
//!
//! - a ring of temporary exposure keys
//! - a ring of temporary detections, updated in place and removable from
//!   the middle
//! - an append-only log of confirmed detections
//!
//! # Flash model
//!
//! Every write reads the enclosing erase block, patches it, erases it and
//! programs it back. Ranges crossing a block boundary are handled block by
//! block. A power loss in the middle of an operation can leave some blocks
//! rewritten and others not; there is no journal.
//!
//! # Concurrency
//!
//! All operations take `&mut self` and must be driven to completion.
//! A short cooperative yield follows every physical read so other tasks
//! keep running during long rewrites. Use [`SharedStorage`] to share one
//! engine between tasks.
//!
//! # Errors
//!
//! [`StorageError::Device`] means the flash itself failed and is fatal.
//! Nothing is retried.

#![no_std]
#![deny(unsafe_code)]

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod block;
mod detections;
mod dump;
mod error;
mod keys;
mod maintenance;
mod shared;
mod storage;
mod temp;

#[cfg(test)]
mod testing;

pub use error::StorageError;
pub use keys::LastTek;
pub use shared::SharedStorage;
pub use storage::EnaStorage;

pub use ena_core::{
    Detection, Layout, Record, Region, StorageConfig, TekRecord, TempDetection,
};
pub use ena_hal::{FlashError, Partition, BLOCK_SIZE};
