//! Error types for configuration overlays.
//!
//! Covers every way an overlay can fail: a required file missing, I/O,
//! parse failures in the three supported formats, and configuration keys
//! that match no parameter.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or applying an overlay.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `must_exist` was set and no candidate file exists.
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// File exists but could not be read.
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing failure.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document root is not a table/object.
    #[error("config root is not a table: {}", .0.display())]
    InvalidRoot(PathBuf),

    /// File extension maps to no known format.
    #[error("unsupported config format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// A configuration key matches no parameter of the command.
    #[error("unknown configuration key {key} in {origin}")]
    UnknownKey { key: String, origin: String },
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
