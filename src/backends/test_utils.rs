//! Mock backends for testing the matting pipeline without model files

use crate::{
    error::{GatewayError, Result},
    inference::InferenceBackend,
};
use ndarray::Array4;
use std::sync::{Arc, Mutex};

/// Mock backend that predicts a constant foreground probability
#[derive(Debug, Clone)]
pub struct MockBackend {
    /// Value written to every output element
    value: f32,
    /// Input shapes seen, for verification in tests
    call_history: Arc<Mutex<Vec<Vec<usize>>>>,
}

impl MockBackend {
    #[must_use]
    pub fn new(value: f32) -> Self {
        Self {
            value,
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get the recorded input shapes
    pub fn get_call_history(&self) -> Vec<Vec<usize>> {
        self.call_history.lock().unwrap().clone()
    }
}

impl InferenceBackend for MockBackend {
    fn infer(&self, input: &Array4<f32>) -> Result<Array4<f32>> {
        self.call_history.lock().unwrap().push(input.shape().to_vec());
        let shape = input.shape();
        Ok(Array4::from_elem((1, 1, shape[2], shape[3]), self.value))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Mock backend whose left half is background and right half foreground
#[derive(Debug, Clone, Copy)]
pub struct SplitBackend;

impl InferenceBackend for SplitBackend {
    fn infer(&self, input: &Array4<f32>) -> Result<Array4<f32>> {
        let shape = input.shape();
        let (height, width) = (shape[2], shape[3]);
        Ok(Array4::from_shape_fn((1, 1, height, width), |(_, _, _, x)| {
            if x >= width / 2 {
                0.9
            } else {
                0.1
            }
        }))
    }

    fn name(&self) -> &'static str {
        "split"
    }
}

/// Mock backend that always fails inference
#[derive(Debug, Clone, Copy)]
pub struct FailingBackend;

impl InferenceBackend for FailingBackend {
    fn infer(&self, _input: &Array4<f32>) -> Result<Array4<f32>> {
        Err(GatewayError::inference("simulated inference failure"))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}
