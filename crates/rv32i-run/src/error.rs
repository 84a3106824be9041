use std::path::PathBuf;

use thiserror::Error;

/// Failures while preparing a run: reading the image or the config file.
#[derive(Debug, Error)]
pub enum HostError {
    /// A file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`crate::HostConfig`].
    #[error("invalid config {path}: {source}")]
    Config {
        /// Config file path.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: toml::de::Error,
    },

    /// The program image has no bytes.
    #[error("program image {0} is empty")]
    EmptyImage(PathBuf),

    /// A numeric argument could not be parsed.
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
}
