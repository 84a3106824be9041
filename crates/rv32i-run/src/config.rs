//! Host configuration file.
//!
//! Every field is optional in the file; missing fields fall back to the
//! defaults below and command-line flags override both.
//!
//! ```toml
//! entry = 0x100010
//! batch = 2000
//! max_steps = 1000000
//! terminal_width = 80
//! terminal_height = 24
//! ```

use std::fs;
use std::path::Path;

use rv32i_core::DEFAULT_RESET_PC;
use serde::Deserialize;

use crate::error::HostError;

/// Steps per batch, one batch per display frame.
pub const DEFAULT_BATCH: u32 = 2000;
/// Terminal columns.
pub const DEFAULT_TERMINAL_WIDTH: u16 = 80;
/// Terminal rows.
pub const DEFAULT_TERMINAL_HEIGHT: u16 = 24;

/// Settings for one host run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Reset program counter.
    pub entry: u32,
    /// Steps per batch.
    pub batch: u32,
    /// Stop after this many steps. `None` runs until the hart jams or faults.
    pub max_steps: Option<u64>,
    /// Console width used to clamp the cursor column.
    pub terminal_width: u16,
    /// Console height used to clamp the cursor row.
    pub terminal_height: u16,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            entry: DEFAULT_RESET_PC,
            batch: DEFAULT_BATCH,
            max_steps: None,
            terminal_width: DEFAULT_TERMINAL_WIDTH,
            terminal_height: DEFAULT_TERMINAL_HEIGHT,
        }
    }
}

impl HostConfig {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns the parser error for malformed TOML or unknown keys.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Reads and parses a config file.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Io`] if the file cannot be read and
    /// [`HostError::Config`] if it does not parse.
    pub fn load(path: &Path) -> Result<Self, HostError> {
        let text = fs::read_to_string(path).map_err(|source| HostError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| HostError::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Parses a decimal or `0x`-prefixed hexadecimal number.
///
/// # Errors
///
/// Returns [`HostError::InvalidNumber`] for anything else.
pub fn parse_number(text: &str) -> Result<u32, HostError> {
    let trimmed = text.trim().replace('_', "");
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => trimmed.parse(),
    };
    parsed.map_err(|_| HostError::InvalidNumber(text.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::{parse_number, HostConfig, DEFAULT_BATCH};
    use rstest::rstest;

    #[test]
    fn empty_file_gives_defaults() {
        let config = HostConfig::from_toml("").expect("empty TOML is valid");
        assert_eq!(config, HostConfig::default());
        assert_eq!(config.entry, 0x0010_0010);
        assert_eq!(config.batch, DEFAULT_BATCH);
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let config = HostConfig::from_toml("entry = 0x200\nmax_steps = 5000\n")
            .expect("valid config");
        assert_eq!(config.entry, 0x200);
        assert_eq!(config.max_steps, Some(5000));
        assert_eq!(config.terminal_width, 80);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(HostConfig::from_toml("speed = 3").is_err());
    }

    #[rstest]
    #[case("0", 0)]
    #[case("1048592", 0x0010_0010)]
    #[case("0x100010", 0x0010_0010)]
    #[case("0X10", 16)]
    #[case("0x0010_0010", 0x0010_0010)]
    fn numbers_parse_in_both_radixes(#[case] text: &str, #[case] expected: u32) {
        assert_eq!(parse_number(text).expect("valid number"), expected);
    }

    #[rstest]
    #[case("")]
    #[case("0x")]
    #[case("twelve")]
    #[case("0x1_0000_0000")]
    fn malformed_numbers_are_rejected(#[case] text: &str) {
        assert!(parse_number(text).is_err());
    }
}
