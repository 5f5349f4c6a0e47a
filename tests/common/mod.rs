//! Shared fixtures for the gateway integration tests
//!
//! Builds a router backed by temporary directories, a real matting pipeline
//! over a fake inference backend, and a scripted weather provider.

#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use bgremove_gateway::{
    router, AppState, BackgroundRemover, FileStore, GatewayConfig, GatewayConfigBuilder,
    GatewayError, InferenceBackend, MattingProcessor, PreprocessingConfig, Result, WeatherError,
    WeatherProvider,
};
use image::{DynamicImage, ImageFormat, RgbImage};
use ndarray::Array4;
use serde_json::Value;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Encode a `width`x`height` image with a diagonal color gradient
pub fn create_test_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut image = RgbImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let intensity = ((x + y) % 100) as u8;
        *pixel = image::Rgb([intensity, 128, 255 - intensity]);
    }

    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut buffer), format)
        .unwrap();
    buffer
}

/// Predicts background on the left half and foreground on the right half
pub struct HalfMaskBackend;

impl InferenceBackend for HalfMaskBackend {
    fn infer(&self, input: &Array4<f32>) -> Result<Array4<f32>> {
        let (height, width) = (input.shape()[2], input.shape()[3]);
        Ok(Array4::from_shape_fn((1, 1, height, width), |(_, _, _, x)| {
            if x < width / 2 {
                0.0
            } else {
                1.0
            }
        }))
    }

    fn name(&self) -> &'static str {
        "half-mask"
    }
}

/// Real matting pipeline over [`HalfMaskBackend`] at a small input size
pub fn half_mask_remover() -> Arc<dyn BackgroundRemover> {
    let preprocessing = PreprocessingConfig {
        target_size: [32, 32],
        normalization_mean: [0.5, 0.5, 0.5],
        normalization_std: [1.0, 1.0, 1.0],
    };
    Arc::new(MattingProcessor::new(Arc::new(HalfMaskBackend), preprocessing))
}

/// Remover that always fails, after checking that the upload was staged
pub struct FailingRemover {
    pub upload_dir: PathBuf,
    pub staged_seen: Mutex<Option<bool>>,
}

impl FailingRemover {
    pub fn new(upload_dir: &Path) -> Self {
        Self {
            upload_dir: upload_dir.to_path_buf(),
            staged_seen: Mutex::new(None),
        }
    }
}

#[async_trait]
impl BackgroundRemover for FailingRemover {
    async fn remove(&self, _image_bytes: Vec<u8>) -> Result<Vec<u8>> {
        let staged = std::fs::read_dir(&self.upload_dir)
            .map(|entries| entries.count() > 0)
            .unwrap_or(false);
        *self.staged_seen.lock().unwrap() = Some(staged);
        Err(GatewayError::processing("model exploded"))
    }
}

type WeatherResponder = Box<dyn Fn() -> std::result::Result<Value, WeatherError> + Send + Sync>;

/// Weather provider returning a scripted outcome and recording its calls
pub struct ScriptedWeather {
    respond: WeatherResponder,
    pub calls: Mutex<Vec<(String, String, String)>>,
}

impl ScriptedWeather {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn() -> std::result::Result<Value, WeatherError> + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn returning(value: Value) -> Self {
        Self::new(move || Ok(value.clone()))
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl WeatherProvider for ScriptedWeather {
    async fn fetch(
        &self,
        lat: &str,
        lon: &str,
        api_key: &str,
    ) -> std::result::Result<Value, WeatherError> {
        self.calls
            .lock()
            .unwrap()
            .push((lat.to_string(), lon.to_string(), api_key.to_string()));
        (self.respond)()
    }
}

/// A router over temporary directories
pub struct TestApp {
    pub server: TestServer,
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    _temp_dir: TempDir,
}

impl TestApp {
    /// Names of the files currently in `dir`
    pub fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Temporary upload and output directories (not yet created)
pub struct TestDirs {
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    temp_dir: TempDir,
}

impl TestDirs {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        Self {
            upload_dir: temp_dir.path().join("uploads"),
            output_dir: temp_dir.path().join("outputs"),
            temp_dir,
        }
    }
}

/// Build a test app; `configure` can adjust the config before it is built
pub fn spawn_app<F>(
    remover: Arc<dyn BackgroundRemover>,
    weather: Arc<dyn WeatherProvider>,
    configure: F,
) -> TestApp
where
    F: FnOnce(GatewayConfigBuilder) -> GatewayConfigBuilder,
{
    spawn_app_in(TestDirs::new(), remover, weather, configure)
}

/// Like [`spawn_app`], in directories the caller already knows about
pub fn spawn_app_in<F>(
    dirs: TestDirs,
    remover: Arc<dyn BackgroundRemover>,
    weather: Arc<dyn WeatherProvider>,
    configure: F,
) -> TestApp
where
    F: FnOnce(GatewayConfigBuilder) -> GatewayConfigBuilder,
{
    let builder = GatewayConfig::builder()
        .upload_dir(&dirs.upload_dir)
        .output_dir(&dirs.output_dir)
        .weather_api_key(Some("test-key".to_string()));
    let config = configure(builder).build().unwrap();

    let store = FileStore::open(&config.upload_dir, &config.output_dir).unwrap();
    let state = AppState::new(config, store, remover, weather);
    let server = TestServer::new(router(state)).unwrap();

    TestApp {
        server,
        upload_dir: dirs.upload_dir,
        output_dir: dirs.output_dir,
        _temp_dir: dirs.temp_dir,
    }
}

/// App with the half-mask pipeline and a weather provider answering `{}`
pub fn default_app() -> TestApp {
    spawn_app(
        half_mask_remover(),
        Arc::new(ScriptedWeather::returning(Value::Object(Default::default()))),
        |builder| builder,
    )
}

/// Served file name from an `output_url`
pub fn output_name(output_url: &str) -> &str {
    output_url
        .rsplit_once("/outputs/")
        .map(|(_, name)| name)
        .unwrap()
}
