//! Edge-preserving smoothing for sensor noise reduction.
//!
//! Wraps [`imageproc::filter::bilateral_filter`]: a range-and-domain
//! filter that averages only neighbours close in both space and
//! intensity, so the indentation boundary survives while flat regions
//! are smoothed. Plain Gaussian blur would soften the very edge the
//! detector needs.

use image::GrayImage;

/// Apply an edge-preserving bilateral filter.
///
/// `window` is the filter window size in pixels, `sigma_color` the
/// intensity-domain strength and `sigma_spatial` the spatial-domain
/// strength. A zero window or non-positive sigma returns the image
/// unchanged, since the underlying filter degenerates on those inputs.
#[must_use = "returns the smoothed image"]
pub fn bilateral(
    image: &GrayImage,
    window: u32,
    sigma_color: f32,
    sigma_spatial: f32,
) -> GrayImage {
    if window == 0 || sigma_color <= 0.0 || sigma_spatial <= 0.0 {
        return image.clone();
    }

    let radius = u8::try_from(window).unwrap_or(u8::MAX);
    imageproc::filter::bilateral_filter(
        image,
        radius,
        sigma_spatial,
        imageproc::filter::bilateral::GaussianEuclideanColorDistance::new(sigma_color),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 12x12 image, left half dark, right half bright.
    fn step_image() -> GrayImage {
        GrayImage::from_fn(12, 12, |x, _| {
            if x < 6 { image::Luma([40]) } else { image::Luma([200]) }
        })
    }

    #[test]
    fn zero_window_is_identity() {
        let img = step_image();
        assert_eq!(bilateral(&img, 0, 75.0, 75.0), img);
    }

    #[test]
    fn non_positive_sigma_is_identity() {
        let img = step_image();
        assert_eq!(bilateral(&img, 9, 0.0, 75.0), img);
        assert_eq!(bilateral(&img, 9, 75.0, -1.0), img);
    }

    #[test]
    fn dimensions_are_preserved() {
        let img = GrayImage::new(19, 7);
        let out = bilateral(&img, 9, 75.0, 75.0);
        assert_eq!((out.width(), out.height()), (19, 7));
    }

    #[test]
    fn uniform_image_is_unchanged_within_rounding() {
        let img = GrayImage::from_fn(10, 10, |_, _| image::Luma([128]));
        let out = bilateral(&img, 9, 75.0, 75.0);
        for p in out.pixels() {
            let diff = i16::from(p.0[0]) - 128;
            assert!(diff.abs() <= 1, "uniform pixel drifted to {}", p.0[0]);
        }
    }

    #[test]
    fn step_edge_survives_smoothing() {
        // The two plateaus must stay far apart after filtering: that is
        // the whole point of choosing a bilateral over a Gaussian here.
        let out = bilateral(&step_image(), 9, 75.0, 75.0);
        let dark = out.get_pixel(2, 6).0[0];
        let bright = out.get_pixel(9, 6).0[0];
        assert!(
            i16::from(bright) - i16::from(dark) > 100,
            "edge collapsed: dark={dark} bright={bright}",
        );
    }
}
