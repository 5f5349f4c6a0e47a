//! Matting pipeline around an inference backend
//!
//! decode → preprocess → infer → mask → alpha compose → PNG encode

use crate::{
    error::{GatewayError, Result},
    inference::InferenceBackend,
    services::BackgroundRemover,
    utils::{ImagePreprocessor, PreprocessingConfig},
};
use async_trait::async_trait;
use image::{imageops::FilterType, DynamicImage, GrayImage, ImageBuffer, ImageFormat, RgbaImage};
use ndarray::Array4;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;

/// Probability spread below which a prediction is treated as already scaled
const MIN_MASK_RANGE: f32 = 1e-6;

/// Runs the full matting pipeline for one image at a time
#[derive(Clone)]
pub struct MattingProcessor {
    backend: Arc<dyn InferenceBackend>,
    preprocessing: PreprocessingConfig,
}

impl MattingProcessor {
    #[must_use]
    pub fn new(backend: Arc<dyn InferenceBackend>, preprocessing: PreprocessingConfig) -> Self {
        Self {
            backend,
            preprocessing,
        }
    }

    /// Remove the background from encoded image bytes, returning PNG bytes
    ///
    /// This is CPU bound; async callers go through [`BackgroundRemover`],
    /// which moves it onto the blocking pool.
    pub fn process_bytes(&self, image_bytes: &[u8]) -> Result<Vec<u8>> {
        let total_start = Instant::now();

        let image = image::load_from_memory(image_bytes).map_err(|e| {
            GatewayError::processing(format!("Failed to decode image from bytes: {}", e))
        })?;
        let original_dimensions = (image.width(), image.height());

        let input_tensor = ImagePreprocessor::preprocess_for_inference(&image, &self.preprocessing)?;
        let output_tensor = self.backend.infer(&input_tensor)?;

        let mask = Self::tensor_to_mask(&output_tensor, original_dimensions)?;
        let result_image = Self::apply_background_removal(&image, &mask);
        let png = Self::encode_png(result_image)?;

        log::debug!(
            "Removed background from {}x{} image with {} backend in {}ms",
            original_dimensions.0,
            original_dimensions.1,
            self.backend.name(),
            total_start.elapsed().as_millis()
        );

        Ok(png)
    }

    /// Convert the model output to an 8-bit mask at the original resolution
    fn tensor_to_mask(tensor: &Array4<f32>, original_dimensions: (u32, u32)) -> Result<GrayImage> {
        let shape = tensor.shape();
        if shape.first().copied().unwrap_or(0) == 0 || shape.get(1).copied().unwrap_or(0) == 0 {
            return Err(GatewayError::processing(format!(
                "Invalid output tensor shape {:?}",
                shape
            )));
        }
        let mask_height = shape.get(2).copied().unwrap_or(0);
        let mask_width = shape.get(3).copied().unwrap_or(0);
        if mask_height == 0 || mask_width == 0 {
            return Err(GatewayError::processing("Empty output tensor"));
        }

        let prediction = tensor.index_axis(ndarray::Axis(0), 0);
        let prediction = prediction.index_axis(ndarray::Axis(0), 0);

        // Stretch the prediction to the full 0-1 range
        let (min, max) = prediction
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let range = max - min;

        let mask = ImageBuffer::from_fn(mask_width as u32, mask_height as u32, |x, y| {
            let value = prediction
                .get([y as usize, x as usize])
                .copied()
                .unwrap_or(0.0);
            let scaled = if range > MIN_MASK_RANGE {
                (value - min) / range
            } else {
                value
            };
            image::Luma([(scaled.clamp(0.0, 1.0) * 255.0).round() as u8])
        });

        let (width, height) = original_dimensions;
        Ok(image::imageops::resize(
            &mask,
            width,
            height,
            FilterType::Triangle,
        ))
    }

    /// Apply background removal using the segmentation mask
    fn apply_background_removal(image: &DynamicImage, mask: &GrayImage) -> RgbaImage {
        let rgba_image = image.to_rgba8();
        let (width, height) = rgba_image.dimensions();
        let mut result = ImageBuffer::new(width, height);

        for (x, y, pixel) in rgba_image.enumerate_pixels() {
            let alpha = mask.get_pixel_checked(x, y).map_or(0, |p| p.0[0]);

            if alpha > 0 {
                result.put_pixel(x, y, image::Rgba([pixel[0], pixel[1], pixel[2], alpha]));
            } else {
                result.put_pixel(x, y, image::Rgba([0, 0, 0, 0]));
            }
        }

        result
    }

    fn encode_png(image: RgbaImage) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| GatewayError::processing(format!("Failed to encode PNG: {}", e)))?;
        Ok(buffer)
    }
}

#[async_trait]
impl BackgroundRemover for MattingProcessor {
    async fn remove(&self, image_bytes: Vec<u8>) -> Result<Vec<u8>> {
        let processor = self.clone();
        tokio::task::spawn_blocking(move || processor.process_bytes(&image_bytes))
            .await
            .map_err(|e| GatewayError::internal(format!("Matting task failed: {}", e)))?
    }
}
