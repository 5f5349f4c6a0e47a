//! Binding, serving and graceful shutdown of the application

mod common;

use bgremove_gateway::{Application, GatewayConfig, RetentionPolicy};
use common::{half_mask_remover, ScriptedWeather, TestDirs};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

fn local_config(dirs: &TestDirs) -> GatewayConfig {
    GatewayConfig {
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        upload_dir: dirs.upload_dir.clone(),
        output_dir: dirs.output_dir.clone(),
        ..GatewayConfig::default()
    }
}

#[tokio::test]
async fn test_serves_until_shutdown() {
    let dirs = TestDirs::new();
    let app = Application::new(
        local_config(&dirs),
        half_mask_remover(),
        Arc::new(ScriptedWeather::returning(json!({}))),
    )
    .await
    .unwrap();

    // Directories are created at startup
    assert!(dirs.upload_dir.is_dir());
    assert!(dirs.output_dir.is_dir());

    let addr = app.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(app.serve(async move {
        let _ = shutdown_rx.await;
    }));

    let body = reqwest::get(format!("http://{addr}/"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("Backend is running"));

    shutdown_tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not shut down")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_rejects_invalid_config() {
    let dirs = TestDirs::new();
    let mut config = local_config(&dirs);
    config.retention = RetentionPolicy::MaxAge {
        max_age: Duration::ZERO,
        sweep_interval: Duration::from_secs(60),
    };

    let result = Application::new(
        config,
        half_mask_remover(),
        Arc::new(ScriptedWeather::returning(json!({}))),
    )
    .await;

    assert!(result.is_err());
    assert!(!dirs.output_dir.exists());
}

#[tokio::test]
async fn test_port_in_use_is_reported() {
    let dirs = TestDirs::new();
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let config = GatewayConfig {
        bind_addr: taken.local_addr().unwrap(),
        ..local_config(&dirs)
    };

    let result = Application::new(
        config,
        half_mask_remover(),
        Arc::new(ScriptedWeather::returning(json!({}))),
    )
    .await;

    let err = result.err().expect("binding an occupied port should fail");
    assert!(err.to_string().contains("Failed to bind"));
}
