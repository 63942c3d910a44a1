//! Photo normalization ahead of upload
//!
//! Every photo is decoded, resized to an exact square, flattened to RGB and
//! re-encoded as baseline JPEG. Output depends only on the input bytes and the
//! configured size/quality, so the same photo always produces the same upload.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use thiserror::Error;
use tracing::debug;

use crate::config::NormalizationConfig;
use crate::errors::{AnalysisError, AppError};

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode JPEG: {0}")]
    Encode(String),
}

impl From<NormalizeError> for AnalysisError {
    fn from(err: NormalizeError) -> Self {
        AnalysisError::Normalization {
            message: err.to_string(),
        }
    }
}

impl From<NormalizeError> for AppError {
    fn from(err: NormalizeError) -> Self {
        match err {
            NormalizeError::Decode(_) => AppError::validation("The selected image could not be read"),
            NormalizeError::Encode(message) => AppError::internal(message),
        }
    }
}

/// JPEG produced by [`ImageNormalizer::normalize`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl NormalizedImage {
    /// Standard-alphabet base64 of the JPEG bytes, as the analysis endpoint expects
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.jpeg)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ImageNormalizer {
    config: NormalizationConfig,
}

impl ImageNormalizer {
    pub fn new(config: NormalizationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> NormalizationConfig {
        self.config
    }

    /// JPEG quality on the encoder's 1-100 scale
    fn jpeg_quality(&self) -> u8 {
        (self.config.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }

    pub fn normalize(&self, image_bytes: &[u8]) -> Result<NormalizedImage, NormalizeError> {
        let img =
            image::load_from_memory(image_bytes).map_err(|e| NormalizeError::Decode(e.to_string()))?;

        let size = self.config.target_size;
        let resized = img.resize_exact(size, size, FilterType::Lanczos3).to_rgb8();

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.jpeg_quality())
            .encode_image(&resized)
            .map_err(|e| NormalizeError::Encode(e.to_string()))?;

        debug!(
            "Normalized {}x{} image ({} bytes) to {}x{} JPEG ({} bytes)",
            img.width(),
            img.height(),
            image_bytes.len(),
            size,
            size,
            jpeg.len()
        );

        Ok(NormalizedImage {
            jpeg,
            width: size,
            height: size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgba, RgbaImage};

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let img: RgbaImage = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, if x < 4 { 0 } else { 255 }])
        });
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn normalizer() -> ImageNormalizer {
        ImageNormalizer::new(NormalizationConfig {
            target_size: 512,
            quality: 0.7,
        })
    }

    #[test]
    fn test_normalize_produces_exact_square_jpeg() {
        let normalized = normalizer().normalize(&sample_png(300, 120)).unwrap();
        assert_eq!((normalized.width, normalized.height), (512, 512));
        assert_eq!(&normalized.jpeg[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&normalized.jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (512, 512));
        assert_eq!(
            image::guess_format(&normalized.jpeg).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let png = sample_png(64, 64);
        let first = normalizer().normalize(&png).unwrap();
        let second = normalizer().normalize(&png).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_base64(), second.to_base64());
    }

    #[test]
    fn test_quality_mapping() {
        assert_eq!(normalizer().jpeg_quality(), 70);
        let low = ImageNormalizer::new(NormalizationConfig {
            target_size: 8,
            quality: 0.0,
        });
        assert_eq!(low.jpeg_quality(), 1);
    }

    #[test]
    fn test_undecodable_input() {
        let err = normalizer().normalize(b"not an image").unwrap_err();
        assert!(matches!(err, NormalizeError::Decode(_)));

        let app: AppError = err.into();
        assert!(matches!(app, AppError::Validation { .. }));
    }
}
