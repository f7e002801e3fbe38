//! Configuration for the forecast client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Request type code asking for dataset metadata.
pub const DEFAULT_META_REQUEST: u32 = 4;

/// Request type code asking for the binary field dump.
pub const DEFAULT_DUMP_REQUEST: u32 = 5;

/// Response header enumerating the components present in a dump.
pub const DEFAULT_COMPONENTS_HEADER: &str = "x-components";

/// Configuration for talking to the forecast server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Endpoint serving both metadata and dump requests.
    pub base_url: String,

    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,

    /// `type` query value for metadata requests.
    pub meta_request_code: u32,

    /// `type` query value for dump requests.
    pub dump_request_code: u32,

    /// Name of the dump response header listing components.
    pub components_header: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/forecast".to_string(),
            timeout_secs: 60,
            meta_request_code: DEFAULT_META_REQUEST,
            dump_request_code: DEFAULT_DUMP_REQUEST,
            components_header: DEFAULT_COMPONENTS_HEADER.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("FORECAST_BASE_URL") {
            config.base_url = val;
        }

        if let Ok(val) = std::env::var("FORECAST_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.timeout_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("FORECAST_META_CODE") {
            if let Ok(code) = val.parse() {
                config.meta_request_code = code;
            }
        }

        if let Ok(val) = std::env::var("FORECAST_DUMP_CODE") {
            if let Ok(code) = val.parse() {
                config.dump_request_code = code;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!("base_url must be an http(s) URL, got '{}'", self.base_url));
        }

        if self.timeout_secs == 0 {
            return Err("timeout_secs must be > 0".to_string());
        }

        if self.meta_request_code == self.dump_request_code {
            return Err("metadata and dump request codes must differ".to_string());
        }

        if self.components_header.trim().is_empty() {
            return Err("components_header must not be empty".to_string());
        }

        Ok(())
    }

    /// Request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
