//! Build script for ena-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates storage.toml and generates the partition constants

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use ena_core::{Layout, LayoutError, StorageConfig};

/// Erase block size of the RP2040 external flash
const FLASH_BLOCK_SIZE: i64 = 4096;

fn main() {
    setup_linker();
    let storage = validate_config();
    generate_constants(&storage);
}

/// Set up linker search paths and scripts
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validated contents of storage.toml
struct StorageToml {
    flash_size: u32,
    partition_offset: u32,
    partition_size: u32,
    tek_store_period: u32,
    temp_detections_max: u32,
}

/// Validate storage.toml at compile time
fn validate_config() -> StorageToml {
    println!("cargo:rerun-if-changed=storage.toml");

    let config_path = Path::new("storage.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: storage.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a storage.toml partition description.     ║\n\
            ║  Please create one in the ena-firmware directory.                ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read storage.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in storage.toml                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();

    let flash_size = get_u32(&config, "flash", "size", &mut errors);
    let firmware_end = get_u32(&config, "flash", "firmware_end", &mut errors);
    let partition_offset = get_u32(&config, "partition", "offset", &mut errors);
    let partition_size = get_u32(&config, "partition", "size", &mut errors);
    let tek_store_period = get_u32(&config, "storage", "tek_store_period", &mut errors);
    let temp_detections_max = get_u32(&config, "storage", "temp_detections_max", &mut errors);
    report("Missing or invalid values in storage.toml", &errors);

    let storage = StorageToml {
        flash_size: flash_size.unwrap_or_default(),
        partition_offset: partition_offset.unwrap_or_default(),
        partition_size: partition_size.unwrap_or_default(),
        tek_store_period: tek_store_period.unwrap_or_default(),
        temp_detections_max: temp_detections_max.unwrap_or_default(),
    };

    validate_partition(&storage, firmware_end.unwrap_or_default());
    validate_layout(&storage);

    println!("cargo:warning=storage.toml validated successfully");
    storage
}

/// Read `[section] key` as an unsigned 32-bit integer
fn get_u32(
    config: &toml::Value,
    section: &str,
    key: &str,
    errors: &mut Vec<String>,
) -> Option<u32> {
    match config.get(section).and_then(|s| s.get(key)) {
        Some(toml::Value::Integer(value)) => match u32::try_from(*value) {
            Ok(value) => Some(value),
            Err(_) => {
                errors.push(format!("[{}] {} must be 0-{}", section, key, u32::MAX));
                None
            }
        },
        Some(_) => {
            errors.push(format!("[{}] {} must be an integer", section, key));
            None
        }
        None => {
            errors.push(format!("[{}] missing '{}'", section, key));
            None
        }
    }
}

/// Validate partition placement against the flash chip
fn validate_partition(storage: &StorageToml, firmware_end: u32) {
    let mut errors = Vec::new();

    let offset = i64::from(storage.partition_offset);
    let size = i64::from(storage.partition_size);

    if offset % FLASH_BLOCK_SIZE != 0 {
        errors.push(format!("[partition] offset {:#x} is not 4K aligned", offset));
    }
    if size == 0 || size % FLASH_BLOCK_SIZE != 0 {
        errors.push(format!("[partition] size {:#x} must be a non-zero multiple of 4K", size));
    }
    if offset < i64::from(firmware_end) {
        errors.push(format!(
            "[partition] offset {:#x} overlaps firmware (ends at {:#x})",
            offset, firmware_end
        ));
    }
    if offset + size > i64::from(storage.flash_size) {
        errors.push(format!(
            "[partition] ends at {:#x}, past flash size {:#x}",
            offset + size,
            storage.flash_size
        ));
    }

    report("Invalid partition placement", &errors);
}

/// Validate that the regions fit inside the partition
fn validate_layout(storage: &StorageToml) {
    let config = StorageConfig::new(storage.tek_store_period, storage.temp_detections_max);
    let layout = Layout::new(&config);

    let error = match layout.check(storage.partition_size) {
        Ok(()) => return,
        Err(LayoutError::ZeroCapacity) => {
            "tek_store_period and temp_detections_max must be non-zero".to_string()
        }
        Err(LayoutError::DoesNotFit {
            required,
            available,
        }) => format!(
            "regions need {} bytes, partition has {}",
            required, available
        ),
    };

    report("Storage regions do not fit", &[error]);
}

/// Panic with a boxed list of errors, if there are any
fn report(title: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }

    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write the validated values as Rust constants into OUT_DIR
fn generate_constants(storage: &StorageToml) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let mut f = File::create(out_dir.join("storage_config.rs")).unwrap();

    writeln!(f, "// Generated from storage.toml by build.rs").unwrap();
    writeln!(f, "pub const FLASH_SIZE: usize = {:#x};", storage.flash_size).unwrap();
    writeln!(f, "pub const PARTITION_OFFSET: u32 = {:#x};", storage.partition_offset).unwrap();
    writeln!(f, "pub const PARTITION_SIZE: u32 = {:#x};", storage.partition_size).unwrap();
    writeln!(f, "pub const TEK_STORE_PERIOD: u32 = {};", storage.tek_store_period).unwrap();
    writeln!(f, "pub const TEMP_DETECTIONS_MAX: u32 = {};", storage.temp_detections_max).unwrap();
}
