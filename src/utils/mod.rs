//! Shared utilities for the matting pipeline

pub mod preprocessing;

pub use preprocessing::{ImagePreprocessor, PreprocessingConfig};
