//! Error types emitted while configuring attention backends.
//!
//! Kernel invocations never produce these: failures raised by a
//! [`FusedKernel`](super::FusedKernel) reach the caller unchanged as
//! [`candle_core::Error`].

use thiserror::Error;

/// Configuration-time error category.
#[derive(Debug, Error)]
pub enum AttentionError {
    /// A configuration value could not be interpreted.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file extension is not recognised.
    #[error("unsupported configuration extension '{0}'")]
    ConfigFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("serde_json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The requested kernel cannot run in this build or on this device.
    #[error("{backend} backend unavailable: {reason}")]
    BackendUnavailable {
        backend: &'static str,
        reason: String,
    },
}
