//! Configuration types for the gateway
//!
//! Everything the handlers need is resolved once at startup into a
//! [`GatewayConfig`] and shared through the application state. Nothing below
//! the binary entry point reads the process environment.

use crate::error::{GatewayError, Result};
use crate::utils::PreprocessingConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Default request body limit (16 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Default upstream weather endpoint
pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Weather provider settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherConfig {
    /// API key for the upstream provider; requests fail with 500 while unset
    pub api_key: Option<String>,
    /// Endpoint queried with `lat`, `lon`, `appid` and `units`
    pub base_url: Url,
    /// Unit system requested from the provider
    pub units: String,
    /// Upper bound for a single upstream request
    pub timeout: Duration,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Url::parse(DEFAULT_WEATHER_URL).expect("default weather URL is valid"),
            units: "metric".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Matting model settings
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Path to the ONNX model file
    pub model_path: PathBuf,
    /// Side length of the square model input
    pub input_size: u32,
    /// Per-channel normalization mean (RGB, 0-1 range)
    pub normalization_mean: [f32; 3],
    /// Per-channel normalization standard deviation (RGB, 0-1 range)
    pub normalization_std: [f32; 3],
}

impl Default for ModelConfig {
    fn default() -> Self {
        // ISNet general-use defaults
        Self {
            model_path: PathBuf::from("models/isnet-general-use.onnx"),
            input_size: 1024,
            normalization_mean: [0.5, 0.5, 0.5],
            normalization_std: [1.0, 1.0, 1.0],
        }
    }
}

impl ModelConfig {
    /// Preprocessing parameters derived from the model settings
    #[must_use]
    pub fn preprocessing(&self) -> PreprocessingConfig {
        PreprocessingConfig {
            target_size: [self.input_size, self.input_size],
            normalization_mean: self.normalization_mean,
            normalization_std: self.normalization_std,
        }
    }
}

/// What happens to generated outputs once they have been served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetentionPolicy {
    /// Outputs are never deleted by the gateway
    #[default]
    Keep,
    /// Outputs older than `max_age` are deleted every `sweep_interval`
    MaxAge {
        max_age: Duration,
        sweep_interval: Duration,
    },
}

/// Top-level gateway configuration
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,
    /// Directory for staged uploads
    pub upload_dir: PathBuf,
    /// Directory for generated PNG outputs
    pub output_dir: PathBuf,
    /// Maximum accepted request body in bytes
    pub max_body_bytes: usize,
    /// Base used for returned output URLs; derived from the request when unset
    pub public_url: Option<Url>,
    /// Weather provider settings
    pub weather: WeatherConfig,
    /// Matting model settings
    pub model: ModelConfig,
    /// Output retention policy
    pub retention: RetentionPolicy,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            upload_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("outputs"),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            public_url: None,
            weather: WeatherConfig::default(),
            model: ModelConfig::default(),
            retention: RetentionPolicy::Keep,
        }
    }
}

impl GatewayConfig {
    /// Create a builder for `GatewayConfig`
    #[must_use]
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::default()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.max_body_bytes == 0 {
            return Err(GatewayError::config_value_error(
                "max body size",
                self.max_body_bytes,
                "greater than 0",
            ));
        }

        if self.upload_dir == self.output_dir {
            return Err(GatewayError::invalid_config(format!(
                "Upload and output directories must differ (both are '{}')",
                self.upload_dir.display()
            )));
        }

        if self.model.input_size == 0 || self.model.input_size > 4096 {
            return Err(GatewayError::config_value_error(
                "model input size",
                self.model.input_size,
                "1-4096",
            ));
        }

        if self.model.normalization_std.iter().any(|&s| s <= 0.0) {
            return Err(GatewayError::invalid_config(
                "Normalization standard deviation must be positive",
            ));
        }

        if self.weather.timeout.is_zero() {
            return Err(GatewayError::invalid_config(
                "Weather request timeout must be greater than zero",
            ));
        }

        if let RetentionPolicy::MaxAge {
            max_age,
            sweep_interval,
        } = self.retention
        {
            if max_age.is_zero() || sweep_interval.is_zero() {
                return Err(GatewayError::invalid_config(
                    "Retention max age and sweep interval must be greater than zero",
                ));
            }
        }

        Ok(())
    }
}

/// Builder for `GatewayConfig`
#[derive(Debug, Default)]
pub struct GatewayConfigBuilder {
    config: GatewayConfig,
}

impl GatewayConfigBuilder {
    #[must_use]
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.config.bind_addr = addr;
        self
    }

    #[must_use]
    pub fn upload_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.upload_dir = dir.into();
        self
    }

    #[must_use]
    pub fn output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    #[must_use]
    pub fn max_body_bytes(mut self, bytes: usize) -> Self {
        self.config.max_body_bytes = bytes;
        self
    }

    #[must_use]
    pub fn public_url(mut self, url: Option<Url>) -> Self {
        self.config.public_url = url;
        self
    }

    #[must_use]
    pub fn weather_api_key(mut self, key: Option<String>) -> Self {
        // Blank keys behave like a missing key
        self.config.weather.api_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    #[must_use]
    pub fn weather_url(mut self, url: Url) -> Self {
        self.config.weather.base_url = url;
        self
    }

    #[must_use]
    pub fn weather_units<S: Into<String>>(mut self, units: S) -> Self {
        self.config.weather.units = units.into();
        self
    }

    #[must_use]
    pub fn weather_timeout(mut self, timeout: Duration) -> Self {
        self.config.weather.timeout = timeout;
        self
    }

    #[must_use]
    pub fn model(mut self, model: ModelConfig) -> Self {
        self.config.model = model;
        self
    }

    #[must_use]
    pub fn retention(mut self, retention: RetentionPolicy) -> Self {
        self.config.retention = retention;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    /// - Invalid configuration parameters
    pub fn build(self) -> Result<GatewayConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
