//! ENA Hardware Abstraction Layer
//!
//! This crate narrows a chip-specific NOR flash driver down to the single
//! raw partition the storage engine is allowed to touch. Any driver that
//! implements [`embedded_storage_async::nor_flash::NorFlash`] can back a
//! [`flash::Partition`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  ena-storage (engine)                   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ena-hal (this crate - Partition)       │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ embassy-rp    │       │ sim::RamFlash │
//! │ Flash driver  │       │ (host tests)  │
//! └───────────────┘       └───────────────┘
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod flash;
#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use flash::{FlashError, Partition, BLOCK_SIZE};
