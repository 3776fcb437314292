use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image: {0}")]
    Load(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

/// Image cleanup applied before recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessOptions {
    /// Longest side allowed before downscaling (Tesseract works best around 300 DPI).
    pub max_dimension: u32,
    /// Apply a global Otsu threshold after contrast stretching.
    pub binarize: bool,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self { max_dimension: 2800, binarize: true }
    }
}

/// Decode raw image bytes (JPEG / PNG / WEBP / …) and return cleaned PNG bytes.
pub fn prepare_for_ocr(data: &[u8], options: &PreprocessOptions) -> Result<Vec<u8>, PreprocessError> {
    let img = image::load_from_memory(data)?;
    encode_as_png(normalize(img, options))
}

/// Downscale, grayscale, contrast stretch, then optionally binarize.
fn normalize(img: DynamicImage, options: &PreprocessOptions) -> DynamicImage {
    let max = options.max_dimension;
    let img = if img.width() > max || img.height() > max {
        img.resize(max, max, image::imageops::FilterType::Lanczos3)
    } else {
        img
    };

    let gray = stretch_contrast(img.to_luma8());
    let gray = if options.binarize { binarize(&gray) } else { gray };

    DynamicImage::ImageLuma8(gray)
}

fn stretch_contrast(gray: GrayImage) -> GrayImage {
    let (min_px, max_px) = gray
        .pixels()
        .fold((255u8, 0u8), |(mn, mx), p| (mn.min(p[0]), mx.max(p[0])));

    if max_px == min_px {
        return gray;
    }

    let range = (max_px - min_px) as u32;
    ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        let p = gray.get_pixel(x, y)[0];
        Luma([((p - min_px) as u32 * 255 / range) as u8])
    })
}

/// Global Otsu threshold; pixels at or below the level become ink.
fn binarize(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    tracing::trace!("Binarizing at threshold {level}");
    threshold(gray, level, ThresholdType::Binary)
}

fn encode_as_png(img: DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}
