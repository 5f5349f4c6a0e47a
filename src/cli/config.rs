//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::Cli;
use crate::config::{GatewayConfig, ModelConfig, RetentionPolicy};
use anyhow::{Context, Result};
use std::time::Duration;

const MIB: usize = 1024 * 1024;

/// Convert CLI arguments to a [`GatewayConfig`]
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build `GatewayConfig` from CLI arguments
    pub(crate) fn from_cli(cli: &Cli) -> Result<GatewayConfig> {
        let max_body_bytes = cli
            .max_body_mb
            .checked_mul(MIB)
            .context("Maximum body size is too large")?;

        let model = ModelConfig {
            model_path: cli.model.clone(),
            input_size: cli.model_input_size,
            ..ModelConfig::default()
        };

        let retention = match cli.retention_max_age_hours {
            Some(hours) => RetentionPolicy::MaxAge {
                max_age: Duration::from_secs(hours.saturating_mul(3600)),
                sweep_interval: Duration::from_secs(cli.retention_sweep_minutes.saturating_mul(60)),
            },
            None => RetentionPolicy::Keep,
        };

        let config = GatewayConfig::builder()
            .bind_addr(cli.bind)
            .upload_dir(&cli.upload_dir)
            .output_dir(&cli.output_dir)
            .max_body_bytes(max_body_bytes)
            .public_url(cli.public_url.clone())
            .weather_api_key(cli.weather_api_key.clone())
            .weather_url(cli.weather_url.clone())
            .weather_units(&cli.weather_units)
            .weather_timeout(Duration::from_secs(cli.weather_timeout_secs))
            .model(model)
            .retention(retention)
            .build()
            .context("Invalid configuration")?;

        Ok(config)
    }
}
