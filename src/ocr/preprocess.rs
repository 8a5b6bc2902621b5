//! Image preprocessing
//!
//! Normalizes decoded uploads to 8-bit RGB and enlarges small images so that
//! small print survives text detection.

use image::{imageops::FilterType, DynamicImage, RgbImage};

use super::types::OcrError;
use crate::config::{DEFAULT_UPSCALE_FACTOR, DEFAULT_UPSCALE_THRESHOLD};

/// Decode raw upload bytes into an image, sniffing the format from its header.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, OcrError> {
    if bytes.is_empty() {
        return Err(OcrError::EmptyImage);
    }

    image::load_from_memory(bytes).map_err(|e| OcrError::Decode(e.to_string()))
}

/// RGB normalization and upscaling of small images
#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    /// Images whose larger side is below this are upscaled
    pub upscale_threshold: u32,
    pub upscale_factor: u32,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self {
            upscale_threshold: DEFAULT_UPSCALE_THRESHOLD,
            upscale_factor: DEFAULT_UPSCALE_FACTOR,
        }
    }
}

impl Preprocessor {
    pub fn new(upscale_threshold: u32, upscale_factor: u32) -> Self {
        Self {
            upscale_threshold,
            upscale_factor,
        }
    }

    /// Produce a new RGB buffer ready for the OCR engine. The input is left untouched.
    pub fn prepare(&self, image: &DynamicImage) -> RgbImage {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        if width.max(height) >= self.upscale_threshold || self.upscale_factor <= 1 {
            return rgb;
        }

        let new_width = width.saturating_mul(self.upscale_factor);
        let new_height = height.saturating_mul(self.upscale_factor);

        tracing::debug!(
            "Upscaling {}x{} image to {}x{}",
            width,
            height,
            new_width,
            new_height
        );

        image::imageops::resize(&rgb, new_width, new_height, FilterType::Lanczos3)
    }

    /// Decode and prepare in one step
    pub fn decode_and_prepare(&self, bytes: &[u8]) -> Result<RgbImage, OcrError> {
        let image = decode(bytes)?;
        Ok(self.prepare(&image))
    }
}
