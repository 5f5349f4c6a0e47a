//! Weather adapter for the upstream provider
//!
//! The gateway does not interpret the weather document; successful bodies are
//! relayed verbatim and failures are sorted into three outcomes the HTTP layer
//! maps onto status codes.

use crate::config::WeatherConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Instant;
use thiserror::Error;
use url::Url;

/// Failure outcomes of a weather lookup
#[derive(Error, Debug)]
pub enum WeatherError {
    /// Upstream answered with a non-2xx status
    #[error("HTTP error occurred while fetching weather: {status} {reason}")]
    Upstream {
        status: u16,
        reason: String,
        /// Upstream error body, parsed as JSON when possible
        details: Value,
    },

    /// Upstream could not be reached (connect failure, timeout, broken body)
    #[error("Request error occurred while fetching weather: {0}")]
    Unavailable(String),

    /// Anything else, such as a 2xx body that is not JSON
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// Given coordinates, return the provider's weather document
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Look up current weather at `lat`/`lon`, authenticating with `api_key`
    ///
    /// Coordinates are forwarded as received; the provider validates them.
    async fn fetch(&self, lat: &str, lon: &str, api_key: &str) -> Result<Value, WeatherError>;
}

/// OpenWeatherMap current-weather client
#[derive(Debug, Clone)]
pub struct OpenWeatherMapClient {
    client: Client,
    base_url: Url,
    units: String,
}

impl OpenWeatherMapClient {
    /// Build a client with the configured endpoint and request timeout
    ///
    /// # Errors
    /// - The HTTP client cannot be constructed (TLS backend failure)
    pub fn new(config: &WeatherConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            units: config.units.clone(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherMapClient {
    async fn fetch(&self, lat: &str, lon: &str, api_key: &str) -> Result<Value, WeatherError> {
        let started = Instant::now();

        let response = self
            .client
            .get(self.base_url.clone())
            .query(&[
                ("lat", lat),
                ("lon", lon),
                ("appid", api_key),
                ("units", self.units.as_str()),
            ])
            .send()
            .await
            .map_err(|e| WeatherError::Unavailable(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WeatherError::Unavailable(e.without_url().to_string()))?;

        tracing::debug!(
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Weather provider responded"
        );

        if !status.is_success() {
            let details =
                serde_json::from_str(&body).unwrap_or_else(|_| Value::String(body.clone()));
            return Err(WeatherError::Upstream {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                details,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            WeatherError::Unexpected(format!("weather provider returned invalid JSON: {e}"))
        })
    }
}
