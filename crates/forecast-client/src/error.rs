//! Error types for forecast loading.

use thiserror::Error;
use wind_common::WindError;

/// Errors that can occur while fetching or decoding a forecast.
#[derive(Error, Debug)]
pub enum ForecastError {
    /// The server answered with a non-success status.
    #[error("server returned HTTP {status} for {url}")]
    Transport { status: u16, url: String },

    /// The request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A required response field or header is missing or malformed.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The metadata payload carried a domain-level `_Error`.
    #[error("server reported: {0}")]
    Server(String),

    /// Metadata parsed but violates grid/step/component invariants.
    #[error("invalid metadata: {0}")]
    Meta(#[from] WindError),

    /// The decoded buffer does not match the declared dimensions.
    #[error("buffer holds {actual} floats, expected {expected} ({dims})")]
    LengthMismatch {
        expected: usize,
        actual: usize,
        dims: String,
    },

    /// The binary body is not a whole number of f32 values.
    #[error("decode error: {0}")]
    Decode(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ForecastError {
    /// Create a Protocol error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a Decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// HTTP status for transport failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(format!("metadata is not valid JSON: {err}"))
    }
}

/// Result type for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;
