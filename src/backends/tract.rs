//! Tract backend for the matting model
//!
//! Tract is a pure Rust ONNX inference engine, so the gateway ships without
//! any native runtime. The model is loaded and optimized once at startup and
//! shared read-only by every request.

use crate::config::ModelConfig;
use crate::error::{GatewayError, Result};
use crate::inference::InferenceBackend;
use ndarray::Array4;
use std::path::Path;
use std::time::Instant;
use tract_onnx::prelude::*;

/// Type alias for the complex Tract model type to reduce complexity warnings
type TractModel = RunnableModel<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Tract backend running an ONNX matting model on the CPU
#[derive(Debug)]
pub struct TractBackend {
    model: TractModel,
    input_size: usize,
}

impl TractBackend {
    /// Load and optimize the model described by `config`
    ///
    /// # Errors
    /// - Model file missing or unreadable
    /// - ONNX graph that cannot be typed for a `1x3xSxS` f32 input
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let model_path = config.model_path.as_path();
        if !model_path.is_file() {
            return Err(GatewayError::model(format!(
                "Model file '{}' does not exist",
                model_path.display()
            )));
        }

        let load_start = Instant::now();
        let size_mb = std::fs::metadata(model_path)
            .map(|m| m.len() as f64 / (1024.0 * 1024.0))
            .unwrap_or(0.0);
        log::info!("Loading matting model {} ({size_mb:.2} MB)", model_path.display());

        let input_size = config.input_size as usize;
        let model = Self::build_plan(model_path, input_size)?;

        log::info!(
            "Tract backend initialized in {}ms",
            load_start.elapsed().as_millis()
        );

        Ok(Self { model, input_size })
    }

    fn build_plan(model_path: &Path, input_size: usize) -> Result<TractModel> {
        onnx()
            .model_for_path(model_path)
            .map_err(|e| GatewayError::model(format!("Failed to load ONNX model: {e}")))?
            .with_input_fact(0, f32::fact([1, 3, input_size, input_size]).into())
            .map_err(|e| GatewayError::model(format!("Failed to set model input shape: {e}")))?
            .into_optimized()
            .map_err(|e| GatewayError::model(format!("Failed to optimize model: {e}")))?
            .into_runnable()
            .map_err(|e| GatewayError::model(format!("Failed to create runnable model: {e}")))
    }
}

impl InferenceBackend for TractBackend {
    fn infer(&self, input: &Array4<f32>) -> Result<Array4<f32>> {
        let shape = input.shape();
        if shape != [1, 3, self.input_size, self.input_size] {
            return Err(GatewayError::inference(format!(
                "Expected input tensor [1, 3, {size}, {size}], got {shape:?}",
                size = self.input_size
            )));
        }

        log::debug!("Running Tract inference on {:?}", shape);
        let inference_start = Instant::now();

        let standard = input.as_standard_layout();
        let data = standard
            .as_slice()
            .ok_or_else(|| GatewayError::inference("Input tensor is not contiguous"))?;
        let input_tensor = Tensor::from_shape(shape, data)
            .map_err(|e| GatewayError::inference(format!("Failed to build input tensor: {e}")))?;

        let outputs = self
            .model
            .run(tvec![input_tensor.into()])
            .map_err(|e| GatewayError::inference(format!("Tract inference failed: {e}")))?;

        // Multi-output models (U2Net family) put the fused prediction first
        let output = outputs
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::inference("No output tensor found"))?
            .into_tensor();

        let output_shape = output.shape().to_vec();
        let [batch, channels, height, width] = output_shape[..] else {
            return Err(GatewayError::inference(format!(
                "Expected 4D output tensor, got {}D",
                output_shape.len()
            )));
        };

        let values = output
            .as_slice::<f32>()
            .map_err(|e| GatewayError::inference(format!("Failed to read output tensor: {e}")))?
            .to_vec();
        let output_array = Array4::from_shape_vec((batch, channels, height, width), values)
            .map_err(|e| GatewayError::inference(format!("Failed to reshape output tensor: {e}")))?;

        log::debug!(
            "Tract inference completed in {}ms, output {:?}",
            inference_start.elapsed().as_millis(),
            output_array.shape()
        );

        Ok(output_array)
    }

    fn name(&self) -> &'static str {
        "tract"
    }
}
