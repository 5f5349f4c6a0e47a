//! Background-removal capability seen by the HTTP layer

use crate::error::Result;
use async_trait::async_trait;

/// Given encoded image bytes, produce PNG bytes with the background removed
///
/// The HTTP layer only ever talks to this trait, so tests can substitute a
/// deterministic fake for the model-backed [`crate::MattingProcessor`].
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    /// Remove the background from `image_bytes`
    ///
    /// # Errors
    /// - Undecodable input
    /// - Any failure inside the matting capability
    async fn remove(&self, image_bytes: Vec<u8>) -> Result<Vec<u8>>;
}
