//! Server assembly and lifecycle

use crate::api::{router, AppState};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::services::{spawn_sweeper, BackgroundRemover, FileStore, WeatherProvider};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A bound, ready-to-serve gateway
pub struct Application {
    listener: TcpListener,
    router: Router,
    sweeper: Option<JoinHandle<()>>,
}

impl Application {
    /// Prepare directories, bind the listener and start the retention sweeper
    ///
    /// # Errors
    /// - Invalid configuration
    /// - Upload/output directories cannot be created
    /// - The bind address is unavailable
    pub async fn new(
        config: GatewayConfig,
        remover: Arc<dyn BackgroundRemover>,
        weather: Arc<dyn WeatherProvider>,
    ) -> Result<Self> {
        config.validate()?;

        let store = FileStore::open(&config.upload_dir, &config.output_dir)?;
        if config.weather.api_key.is_none() {
            tracing::warn!("No weather API key configured; /api/get_weather will answer 500");
        }

        let listener = TcpListener::bind(config.bind_addr).await.map_err(|e| {
            GatewayError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to bind {}: {}", config.bind_addr, e),
            ))
        })?;

        let sweeper = spawn_sweeper(config.output_dir.clone(), config.retention);
        let router = router(AppState::new(config, store, remover, weather));

        Ok(Self {
            listener,
            router,
            sweeper,
        })
    }

    /// Build the production adapters (Tract matting model, OpenWeatherMap)
    ///
    /// # Errors
    /// - Model file missing or not loadable
    /// - HTTP client construction failure
    #[cfg(feature = "tract")]
    pub async fn from_config(config: GatewayConfig) -> Result<Self> {
        use crate::backends::TractBackend;
        use crate::processor::MattingProcessor;
        use crate::services::OpenWeatherMapClient;

        config.validate()?;

        let model_config = config.model.clone();
        let backend = tokio::task::spawn_blocking(move || TractBackend::load(&model_config))
            .await
            .map_err(|e| GatewayError::internal(format!("Model loading task failed: {e}")))??;
        let remover = MattingProcessor::new(Arc::new(backend), config.model.preprocessing());

        let weather = OpenWeatherMapClient::new(&config.weather)
            .map_err(|e| GatewayError::internal(format!("Failed to build HTTP client: {e}")))?;

        Self::new(config, Arc::new(remover), Arc::new(weather)).await
    }

    /// Address actually bound (useful when binding port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `shutdown` resolves
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        tracing::info!("Gateway listening on http://{}", addr);

        let result = axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await;

        if let Some(sweeper) = self.sweeper {
            sweeper.abort();
        }

        result.map_err(GatewayError::from)?;
        tracing::info!("Gateway stopped");
        Ok(())
    }
}
