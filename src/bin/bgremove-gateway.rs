//! Background Removal Gateway
//!
//! HTTP server exposing background removal and a weather proxy, backed by
//! the Tract inference backend.

#[cfg(feature = "cli")]
use bgremove_gateway::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
