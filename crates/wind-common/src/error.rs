//! Error types shared by the wind playback crates.

use thiserror::Error;

/// Result type alias using WindError.
pub type WindResult<T> = Result<T, WindError>;

/// Errors raised while building or validating shared domain types.
#[derive(Debug, Error)]
pub enum WindError {
    #[error("Invalid forecast metadata: {0}")]
    InvalidMeta(String),

    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WindError {
    pub fn invalid_meta(msg: impl Into<String>) -> Self {
        Self::InvalidMeta(msg.into())
    }

    pub fn invalid_route(msg: impl Into<String>) -> Self {
        Self::InvalidRoute(msg.into())
    }
}
