//! Per-channel mean/std normalization of RGB tiles into CHW float buffers.

use image::RgbImage;

/// ImageNet channel means (RGB).
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet channel standard deviations (RGB).
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Precomputed `value = px * alpha[c] + beta[c]` with `alpha = 1 / (255 * std)`
/// and `beta = -mean / std`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer {
    alpha: [f32; 3],
    beta: [f32; 3],
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(IMAGENET_MEAN, IMAGENET_STD)
    }
}

impl Normalizer {
    pub fn new(mean: [f32; 3], std: [f32; 3]) -> Self {
        let scale = 1.0 / 255.0;
        let alpha = std.map(|s| scale / s);
        let beta = [0usize, 1, 2].map(|c| -mean[c] / std[c]);
        Self { alpha, beta }
    }

    /// Channel-major (CHW) buffer of `3 * width * height` values.
    pub fn normalize(&self, img: &RgbImage) -> Vec<f32> {
        let (w, h) = img.dimensions();
        let plane = (w * h) as usize;
        let mut out = vec![0f32; 3 * plane];
        for (i, px) in img.pixels().enumerate() {
            for c in 0..3 {
                out[c * plane + i] = px[c] as f32 * self.alpha[c] + self.beta[c];
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn black_and_white_extremes() {
        let n = Normalizer::default();
        let black = n.normalize(&RgbImage::from_pixel(1, 1, Rgb([0, 0, 0])));
        let white = n.normalize(&RgbImage::from_pixel(1, 1, Rgb([255, 255, 255])));
        for c in 0..3 {
            let expect_black = -IMAGENET_MEAN[c] / IMAGENET_STD[c];
            let expect_white = (1.0 - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
            assert!((black[c] - expect_black).abs() < 1e-5);
            assert!((white[c] - expect_white).abs() < 1e-5);
        }
    }

    #[test]
    fn layout_is_channel_major() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 0, 255]));
        let n = Normalizer::new([0.0; 3], [1.0; 3]);
        let out = n.normalize(&img);
        assert_eq!(out.len(), 6);
        let expect = [1.0, 0.0, 0.0, 0.0, 0.0, 1.0];
        for (a, b) in out.iter().zip(expect) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
