//! Background Removal Gateway - server entry point
//!
//! Parses arguments (with environment fallbacks and `.env` support), sets up
//! tracing and serves until Ctrl+C or SIGTERM.

use super::config::CliConfigBuilder;
use crate::{
    config::DEFAULT_WEATHER_URL,
    server::Application,
    tracing_config::{TracingConfig, TracingFormat},
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use url::Url;

/// HTTP gateway for background removal and weather lookups
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "bgremove-gateway")]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "BGREMOVE_BIND", default_value = "0.0.0.0:5000")]
    pub bind: SocketAddr,

    /// Directory for staged uploads
    #[arg(long, env = "BGREMOVE_UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: PathBuf,

    /// Directory for generated PNG outputs
    #[arg(long, env = "BGREMOVE_OUTPUT_DIR", default_value = "outputs")]
    pub output_dir: PathBuf,

    /// Maximum request body size in MiB
    #[arg(long, env = "BGREMOVE_MAX_BODY_MB", default_value_t = 16)]
    pub max_body_mb: usize,

    /// Public base URL used in returned output links [default: derived from the request]
    #[arg(long, env = "BGREMOVE_PUBLIC_URL")]
    pub public_url: Option<Url>,

    /// Path to the ONNX matting model
    #[arg(
        short,
        long,
        env = "BGREMOVE_MODEL",
        default_value = "models/isnet-general-use.onnx"
    )]
    pub model: PathBuf,

    /// Side length of the square model input
    #[arg(long, env = "BGREMOVE_MODEL_INPUT_SIZE", default_value_t = 1024)]
    pub model_input_size: u32,

    /// OpenWeatherMap API key
    #[arg(long, env = "OPENWEATHERMAP_API_KEY", hide_env_values = true)]
    pub weather_api_key: Option<String>,

    /// Upstream weather endpoint
    #[arg(long, env = "BGREMOVE_WEATHER_URL", default_value = DEFAULT_WEATHER_URL)]
    pub weather_url: Url,

    /// Unit system requested from the weather provider
    #[arg(long, env = "BGREMOVE_WEATHER_UNITS", default_value = "metric")]
    pub weather_units: String,

    /// Timeout for a single weather request, in seconds
    #[arg(long, env = "BGREMOVE_WEATHER_TIMEOUT_SECS", default_value_t = 10)]
    pub weather_timeout_secs: u64,

    /// Delete outputs older than this many hours [default: keep forever]
    #[arg(long, env = "BGREMOVE_RETENTION_MAX_AGE_HOURS")]
    pub retention_max_age_hours: Option<u64>,

    /// Minutes between retention sweeps
    #[arg(long, env = "BGREMOVE_RETENTION_SWEEP_MINUTES", default_value_t = 60)]
    pub retention_sweep_minutes: u64,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = CliLogFormat::Console)]
    pub log_format: CliLogFormat,

    /// Tracing filter directives; overrides -v
    #[arg(long, env = "RUST_LOG")]
    pub log_filter: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliLogFormat {
    Console,
    Compact,
    #[cfg(feature = "tracing-json")]
    Json,
}

impl From<CliLogFormat> for TracingFormat {
    fn from(format: CliLogFormat) -> Self {
        match format {
            CliLogFormat::Console => TracingFormat::Console,
            CliLogFormat::Compact => TracingFormat::Compact,
            #[cfg(feature = "tracing-json")]
            CliLogFormat::Json => TracingFormat::Json,
        }
    }
}

pub async fn main() -> Result<()> {
    // A missing .env is the common case
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    init_tracing(&cli).context("Failed to initialize tracing")?;

    let config = CliConfigBuilder::from_cli(&cli).context("Failed to build configuration")?;

    tracing::info!(
        bind = %config.bind_addr,
        upload_dir = %config.upload_dir.display(),
        output_dir = %config.output_dir.display(),
        model = %config.model.model_path.display(),
        "Starting background removal gateway"
    );

    let app = Application::from_config(config)
        .await
        .context("Failed to start gateway")?;

    app.serve(shutdown_signal()).await.context("Server error")?;
    Ok(())
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let mut config = TracingConfig::new()
        .with_verbosity(cli.verbose)
        .with_format(cli.log_format.into());

    if let Some(filter) = &cli.log_filter {
        config = config.with_env_filter(filter.clone());
    }

    config.init()
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
