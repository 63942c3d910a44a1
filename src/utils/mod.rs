//! Shared helpers: atomic file writes, URL building, photo normalization

pub mod fs;
pub mod image_normalizer;
pub mod url;

pub use image_normalizer::{ImageNormalizer, NormalizedImage};
pub use url::UrlUtils;
