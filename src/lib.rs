#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # Background Removal Gateway
//!
//! HTTP gateway that removes image backgrounds with a salient-object matting
//! model and relays current-weather lookups to OpenWeatherMap.
//!
//! ## Endpoints
//!
//! - `GET /` health page
//! - `POST /api/remove-background` multipart upload (`file` field), answers
//!   `{"output_url": ...}` pointing at a transparent PNG
//! - `GET /outputs/{filename}` serves generated PNGs
//! - `GET /api/get_weather?lat=..&lon=..` relays the provider's JSON
//!
//! ## Features
//!
//! - **Pure Rust inference**: Tract backend for ONNX matting models (`tract` feature)
//! - **Pluggable adapters**: [`BackgroundRemover`] and [`WeatherProvider`] traits
//!   decouple the HTTP layer from inference and the upstream provider
//! - **Collision-free outputs**: every upload gets its own UUID token
//! - **Retention**: optional periodic cleanup of old outputs
//! - **CLI Integration**: server binary with env/`.env` configuration (`cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bgremove_gateway::{Application, GatewayConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = GatewayConfig::builder()
//!     .weather_api_key(std::env::var("OPENWEATHERMAP_API_KEY").ok())
//!     .build()?;
//!
//! let app = Application::from_config(config).await?;
//! app.serve(async {
//!     let _ = tokio::signal::ctrl_c().await;
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod backends;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod inference;
pub mod processor;
pub mod server;
pub mod services;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod utils;

pub use api::{router, ApiError, AppState};
#[cfg(feature = "tract")]
pub use backends::TractBackend;
pub use config::{GatewayConfig, GatewayConfigBuilder, ModelConfig, RetentionPolicy, WeatherConfig};
pub use error::{GatewayError, Result};
pub use inference::InferenceBackend;
pub use processor::MattingProcessor;
pub use server::Application;
pub use services::{
    BackgroundRemover, FileStore, OpenWeatherMapClient, StagedFiles, WeatherError,
    WeatherProvider,
};
pub use utils::{ImagePreprocessor, PreprocessingConfig};

#[cfg(feature = "cli")]
pub use tracing_config::{TracingConfig, TracingFormat};
