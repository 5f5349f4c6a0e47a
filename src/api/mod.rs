//! HTTP surface of the gateway
//!
//! | Route                          | Handler                                |
//! |--------------------------------|----------------------------------------|
//! | `GET /`                        | [`handlers::index::index`]             |
//! | `POST /api/remove-background`  | [`handlers::removal::remove_background`] |
//! | `GET /outputs/{filename}`      | [`handlers::outputs::get_output_file`] |
//! | `GET /api/get_weather`         | [`handlers::weather::get_weather`]     |

pub mod errors;
pub mod handlers;

use crate::config::GatewayConfig;
use crate::services::{BackgroundRemover, FileStore, WeatherProvider};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use errors::ApiError;

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub store: FileStore,
    pub remover: Arc<dyn BackgroundRemover>,
    pub weather: Arc<dyn WeatherProvider>,
}

impl AppState {
    pub fn new(
        config: GatewayConfig,
        store: FileStore,
        remover: Arc<dyn BackgroundRemover>,
        weather: Arc<dyn WeatherProvider>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            remover,
            weather,
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let max_body_bytes = state.config.max_body_bytes;

    Router::new()
        .route("/", get(handlers::index::index))
        .route(
            "/api/remove-background",
            post(handlers::removal::remove_background),
        )
        .route("/outputs/{filename}", get(handlers::outputs::get_output_file))
        .route("/api/get_weather", get(handlers::weather::get_weather))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
