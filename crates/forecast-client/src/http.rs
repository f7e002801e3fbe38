//! HTTP implementation of [`ForecastSource`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::{debug, instrument};
use wind_common::{ForecastMeta, Selector};

use crate::config::ClientConfig;
use crate::error::{ForecastError, Result};
use crate::source::{parse_meta, DumpResponse, ForecastSource};

/// Fetches metadata and dumps from the forecast server.
///
/// Both requests go to `base_url` and differ by the `type` query parameter.
/// The dataset is selected with `model=<id>` or `grib=<path>`.
pub struct HttpForecastSource {
    client: Client,
    config: ClientConfig,
}

impl HttpForecastSource {
    /// Create a new source with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate().map_err(ForecastError::Config)?;

        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn selection(selector: &Selector) -> (&'static str, String) {
        match selector {
            Selector::Model(id) => ("model", id.clone()),
            Selector::File(path) => ("grib", path.clone()),
        }
    }

    async fn get(&self, query: &[(&str, String)]) -> Result<Response> {
        let response = self
            .client
            .get(&self.config.base_url)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ForecastError::Transport {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl ForecastSource for HttpForecastSource {
    #[instrument(skip(self), fields(selector = %selector))]
    async fn fetch_meta(&self, selector: &Selector) -> Result<ForecastMeta> {
        let (param, value) = Self::selection(selector);
        let query = [
            ("type", self.config.meta_request_code.to_string()),
            (param, value),
        ];

        let body = self.get(&query).await?.bytes().await?;
        debug!(bytes = body.len(), "Received forecast metadata");

        parse_meta(&body)
    }

    #[instrument(skip(self), fields(selector = %selector))]
    async fn fetch_dump(&self, selector: &Selector, reduced_components: bool) -> Result<DumpResponse> {
        let (param, value) = Self::selection(selector);
        let query = [
            ("type", self.config.dump_request_code.to_string()),
            (param, value),
            ("reduced", if reduced_components { "1" } else { "0" }.to_string()),
        ];

        let response = self.get(&query).await?;
        let components = response
            .headers()
            .get(self.config.components_header.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.bytes().await?;
        debug!(
            bytes = body.len(),
            components = ?components,
            "Received forecast dump"
        );

        Ok(DumpResponse { components, body })
    }
}
