//! Sharing one engine between tasks
//!
//! Counters and multi-block rewrites are not atomic, so interleaving two
//! operations corrupts the counter/array correspondence. Tasks that need
//! storage share one [`SharedStorage`] and hold its lock for the whole
//! operation.

use embassy_sync::mutex::Mutex;

use crate::storage::EnaStorage;

/// The single lock guarding the whole storage interface
pub type SharedStorage<M, F> = Mutex<M, EnaStorage<F>>;
