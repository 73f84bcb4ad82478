//! Storage partition configuration
//!
//! Generated by build.rs from storage.toml, which it has already validated.

use ena_core::StorageConfig;

include!(concat!(env!("OUT_DIR"), "/storage_config.rs"));

/// Region capacities for the engine
pub const STORAGE_CONFIG: StorageConfig = StorageConfig::new(TEK_STORE_PERIOD, TEMP_DETECTIONS_MAX);
