//! Locally adaptive binarization of the corrected grayscale field.
//!
//! Each pixel is compared against the Gaussian-weighted mean of its
//! neighbourhood minus a fixed offset, with inverted polarity: pixels
//! sufficiently *darker* than their surroundings become foreground
//! (255), everything else background (0). The indentation is darker
//! than the polished surface around it, so it comes out as foreground
//! regardless of uneven illumination across the frame.
//!
//! Implemented locally: `imageproc`'s adaptive threshold is a plain
//! block mean with neither Gaussian weighting nor an offset constant.
//! The weighting kernel is separable; borders are replicated.

use image::GrayImage;

/// Binarize with a Gaussian-weighted adaptive threshold, inverted.
///
/// `window` is the full neighbourhood width (forced odd, minimum 3);
/// `offset` is subtracted from the local weighted mean before
/// comparison, so only pixels at least `offset` levels below their
/// surroundings become foreground.
#[must_use = "returns the binarized image"]
pub fn adaptive_inverted(image: &GrayImage, window: u32, offset: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let window = window.max(3) | 1;
    let kernel = gaussian_kernel(window);
    let radius = i64::from(window / 2);

    // Horizontal pass with replicated borders.
    let mut rows = vec![0.0_f32; (width * height) as usize];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0_f32;
            for (i, k) in kernel.iter().enumerate() {
                let sx = (i64::from(x) + i as i64 - radius).clamp(0, i64::from(width) - 1);
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let v = f32::from(image.get_pixel(sx as u32, y).0[0]);
                acc += k * v;
            }
            rows[(y * width + x) as usize] = acc;
        }
    }

    // Vertical pass, then the comparison.
    GrayImage::from_fn(width, height, |x, y| {
        let mut mean = 0.0_f32;
        for (i, k) in kernel.iter().enumerate() {
            let sy = (i64::from(y) + i as i64 - radius).clamp(0, i64::from(height) - 1);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let v = rows[(sy as u32 * width + x) as usize];
            mean += k * v;
        }
        let src = f32::from(image.get_pixel(x, y).0[0]);
        if src > mean - offset {
            image::Luma([0])
        } else {
            image::Luma([255])
        }
    })
}

/// Normalized 1D Gaussian weights for a window of the given odd width.
///
/// Sigma follows the conventional window-derived default
/// `0.3·((width − 1)/2 − 1) + 0.8`, so a 15-wide window uses σ = 2.6.
#[allow(clippy::cast_precision_loss)]
fn gaussian_kernel(window: u32) -> Vec<f32> {
    let sigma = 0.3 * ((window - 1) as f32 / 2.0 - 1.0) + 0.8;
    let radius = (window / 2) as f32;
    let mut weights: Vec<f32> = (0..window)
        .map(|i| {
            let d = i as f32 - radius;
            (-d * d / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}
