//! Error types for glide_scroll
//!
//! Animations themselves never fail. These errors cover loading defaults and
//! parsing option values, which callers may want to report.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while configuring smooth scrolling
#[derive(Error, Debug)]
pub enum ScrollError {
    /// Failed to read a config file
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// An option value could not be parsed
    #[error("invalid value '{value}' for option '{option}'")]
    InvalidOption { option: String, value: String },
}

/// Result type for glide_scroll operations
pub type Result<T> = std::result::Result<T, ScrollError>;
