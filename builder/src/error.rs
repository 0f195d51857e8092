//! Error types for loading builder configuration and descriptor files.
//!
//! Schema construction itself fails with
//! [`SchemaError`](interface_schema_core::SchemaError); this type only covers
//! reading and decoding the files that feed it.

use thiserror::Error;

/// Errors that can occur while loading configuration or descriptor files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A setting was rejected while configuring the builder.
    #[error("schema error: {0}")]
    Schema(#[from] interface_schema_core::SchemaError),

    /// The file decoded but holds an unusable setting.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
