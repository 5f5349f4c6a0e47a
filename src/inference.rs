//! Inference backend abstraction

use crate::error::Result;
use ndarray::Array4;

/// Trait for inference backends
///
/// Backends are loaded once at startup and shared across requests, so
/// inference takes `&self` and implementations must be thread safe.
pub trait InferenceBackend: Send + Sync {
    /// Run inference on a normalized NCHW input tensor
    ///
    /// The first output channel of the returned tensor is interpreted as the
    /// foreground probability map.
    ///
    /// # Errors
    /// - Model inference failures
    /// - Tensor conversion or shape errors
    fn infer(&self, input: &Array4<f32>) -> Result<Array4<f32>>;

    /// Short backend name used in logs
    fn name(&self) -> &'static str;
}
