//! Top-hat glare suppression for reflective metallic surfaces.
//!
//! Specular highlights show up as small bright spots that survive
//! smoothing and fool the thresholding stage into carving spurious
//! boundaries. The white top-hat (the image minus its
//! grayscale morphological opening with a structuring element larger
//! than any glare spot) isolates exactly those small bright structures;
//! subtracting the residual flattens each spot down to its local
//! background while leaving the (dark) indentation untouched.
//!
//! The flat disk erosion/dilation is implemented locally over
//! precomputed row spans so the kernel matches a true disk; out-of-image
//! neighbours are ignored rather than padded.

use image::GrayImage;

/// Horizontal half-widths of a disk of the given radius, one per row
/// offset in `-radius..=radius`.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn disk_spans(radius: u32) -> Vec<(i64, i64)> {
    let r = i64::from(radius);
    (-r..=r)
        .map(|dy| {
            let half = f64::sqrt((r * r - dy * dy) as f64).floor() as i64;
            (dy, half)
        })
        .collect()
}

/// Grayscale erosion (disk minimum) or dilation (disk maximum).
fn disk_filter(image: &GrayImage, spans: &[(i64, i64)], take_max: bool) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let mut best = if take_max { u8::MIN } else { u8::MAX };
        for &(dy, half) in spans {
            let ny = i64::from(y) + dy;
            if ny < 0 || ny >= i64::from(height) {
                continue;
            }
            let x0 = (i64::from(x) - half).max(0);
            let x1 = (i64::from(x) + half).min(i64::from(width) - 1);
            for nx in x0..=x1 {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let v = image.get_pixel(nx as u32, ny as u32).0[0];
                best = if take_max { best.max(v) } else { best.min(v) };
            }
        }
        image::Luma([best])
    })
}

/// Morphological opening with a flat disk: erosion followed by dilation.
///
/// Removes bright structures that cannot contain the disk, leaving
/// larger features and all dark features in place.
#[must_use = "returns the opened image"]
pub fn open(image: &GrayImage, radius: u32) -> GrayImage {
    let spans = disk_spans(radius);
    disk_filter(&disk_filter(image, &spans, false), &spans, true)
}

/// White top-hat residual: `image − opening(image)`.
///
/// Non-zero only where a bright structure smaller than the disk sat in
/// the input. The opening never exceeds the input, so the subtraction
/// cannot underflow.
#[must_use = "returns the top-hat residual"]
pub fn top_hat(image: &GrayImage, radius: u32) -> GrayImage {
    let opened = open(image, radius);
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let v = image.get_pixel(x, y).0[0];
        image::Luma([v.saturating_sub(opened.get_pixel(x, y).0[0])])
    })
}

/// Suppress specular glare by subtracting the top-hat residual.
///
/// A zero radius disables the stage and returns the image unchanged.
#[must_use = "returns the glare-suppressed image"]
pub fn suppress_glare(image: &GrayImage, radius: u32) -> GrayImage {
    if radius == 0 {
        return image.clone();
    }
    let residual = top_hat(image, radius);
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let v = image.get_pixel(x, y).0[0];
        image::Luma([v.saturating_sub(residual.get_pixel(x, y).0[0])])
    })
}
