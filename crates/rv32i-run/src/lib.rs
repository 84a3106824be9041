//! Terminal host for `rv32i-core`.
//!
//! Maps RAM, a console, a keyboard queue, a timer, an audio register and a
//! cursor into the guest's address space, loads a raw program image above
//! them and runs the hart in fixed-size batches.

use std::fs;
use std::path::Path;

#[cfg(test)]
use tempfile as _;

use anyhow as _;
use clap as _;
use env_logger as _;

/// Memory-mapped device bus.
pub mod bus;
pub use bus::{DeviceBus, AUDIO_SILENCE, RAM_SIZE, ROM_BASE};

/// TOML host configuration.
pub mod config;
pub use config::{parse_number, HostConfig, DEFAULT_BATCH};

/// Host-side error type.
pub mod error;
pub use error::HostError;

/// Host input to guest key codes.
pub mod keyboard;
pub use keyboard::{key_code, key_codes, KeyDecoder};

/// Batch run loop.
pub mod runner;
pub use runner::{run, run_with, RunOptions, RunReport, StopReason};

/// Reads a raw program image.
///
/// # Errors
///
/// Returns [`HostError::Io`] if the file cannot be read and
/// [`HostError::EmptyImage`] if it has no bytes.
pub fn load_image(path: &Path) -> Result<Vec<u8>, HostError> {
    let image = fs::read(path).map_err(|source| HostError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if image.is_empty() {
        return Err(HostError::EmptyImage(path.to_path_buf()));
    }
    log::info!("loaded {} bytes from {}", image.len(), path.display());
    Ok(image)
}
