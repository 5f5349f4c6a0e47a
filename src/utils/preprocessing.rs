//! Image preprocessing for matting model inference

use crate::error::{GatewayError, Result};
use image::{imageops::FilterType, DynamicImage, RgbImage};
use ndarray::Array4;

/// Model-specific preprocessing parameters
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessingConfig {
    /// Model input size as `[width, height]`
    pub target_size: [u32; 2],
    /// Per-channel mean subtracted after scaling to 0-1
    pub normalization_mean: [f32; 3],
    /// Per-channel standard deviation divided out after mean subtraction
    pub normalization_std: [f32; 3],
}

/// Converts decoded images into model input tensors
pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// Preprocess image for model inference
    ///
    /// The image is converted to RGB and stretched to the model input size
    /// without preserving aspect ratio; the predicted mask is stretched back
    /// to the original dimensions afterwards, so no padding needs undoing.
    ///
    /// # Returns
    /// * `Ok(tensor)` - Normalized NCHW tensor of shape `[1, 3, H, W]`
    /// * `Err(GatewayError)` - On empty images or invalid target sizes
    pub fn preprocess_for_inference(
        image: &DynamicImage,
        preprocessing_config: &PreprocessingConfig,
    ) -> Result<Array4<f32>> {
        let [target_width, target_height] = preprocessing_config.target_size;
        if target_width == 0 || target_height == 0 {
            return Err(GatewayError::processing("Model input size must be non-zero"));
        }
        if image.width() == 0 || image.height() == 0 {
            return Err(GatewayError::processing("Input image has no pixels"));
        }

        let resized = image::imageops::resize(
            &image.to_rgb8(),
            target_width,
            target_height,
            FilterType::Lanczos3,
        );

        Ok(Self::canvas_to_tensor(&resized, preprocessing_config))
    }

    /// Convert canvas to normalized tensor
    fn canvas_to_tensor(canvas: &RgbImage, preprocessing_config: &PreprocessingConfig) -> Array4<f32> {
        let (width, height) = canvas.dimensions();
        let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));
        let mean = preprocessing_config.normalization_mean;
        let std = preprocessing_config.normalization_std;

        #[allow(clippy::indexing_slicing)]
        // Safe: tensor dimensions pre-allocated to match canvas size
        for (x, y, pixel) in canvas.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            for channel in 0..3 {
                tensor[[0, channel, y, x]] =
                    (f32::from(pixel[channel]) / 255.0 - mean[channel]) / std[channel];
            }
        }

        tensor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn create_test_preprocessing_config() -> PreprocessingConfig {
        PreprocessingConfig {
            target_size: [64, 64],
            normalization_mean: [0.485, 0.456, 0.406],
            normalization_std: [0.229, 0.224, 0.225],
        }
    }

    fn create_test_image() -> DynamicImage {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(100, 40, Rgb([255, 0, 0]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_preprocess_for_inference() {
        let image = create_test_image();
        let config = create_test_preprocessing_config();

        let tensor = ImagePreprocessor::preprocess_for_inference(&image, &config).unwrap();

        assert_eq!(tensor.shape(), &[1, 3, 64, 64]);
    }

    #[test]
    fn test_normalization_values() {
        let image = create_test_image();
        let config = create_test_preprocessing_config();

        let tensor = ImagePreprocessor::preprocess_for_inference(&image, &config).unwrap();

        // Solid red survives the resize, so every pixel normalizes identically
        let expected_r = (1.0 - 0.485) / 0.229;
        let expected_g = (0.0 - 0.456) / 0.224;
        assert!((tensor[[0, 0, 10, 10]] - expected_r).abs() < 1e-3);
        assert!((tensor[[0, 1, 32, 5]] - expected_g).abs() < 1e-3);
    }

    #[test]
    fn test_non_square_target() {
        let image = create_test_image();
        let config = PreprocessingConfig {
            target_size: [32, 16],
            ..create_test_preprocessing_config()
        };

        let tensor = ImagePreprocessor::preprocess_for_inference(&image, &config).unwrap();

        assert_eq!(tensor.shape(), &[1, 3, 16, 32]);
    }

    #[test]
    fn test_zero_target_size_rejected() {
        let image = create_test_image();
        let config = PreprocessingConfig {
            target_size: [0, 0],
            ..create_test_preprocessing_config()
        };

        assert!(ImagePreprocessor::preprocess_for_inference(&image, &config).is_err());
    }
}
