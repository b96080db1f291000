//! Contour extraction and circularity analysis (detection Phase 1).
//!
//! Binarized indentation candidates are connected foreground regions.
//! Their outer boundaries are extracted with Suzuki-Abe border following
//! ([`imageproc::contours::find_contours`]), then scored by circularity
//! `4πA / P²`: exactly 1.0 for a perfect circle, drifting away for
//! elongated or ragged shapes. The tolerance band absorbs pixelation and
//! antialiasing of real indentation rims.

use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};

use crate::min_circle::{EnclosingCircle, min_enclosing_circle};
use crate::types::PipelineConfig;

/// A contour that passed the noise filters, with its shape metrics.
#[derive(Debug, Clone)]
pub struct ContourCandidate {
    /// Minimal enclosing circle of the contour points.
    pub enclosing: EnclosingCircle,
    /// Enclosed area in px² (shoelace over the boundary chain).
    pub area: f64,
    /// Closed boundary length in pixels.
    pub perimeter: f64,
    /// Shape metric `4π·area / perimeter²`.
    pub circularity: f64,
}

/// Extract circle candidates from a binary foreground image.
///
/// Only outer boundaries of top-level regions are considered (holes and
/// nested regions are ignored). Contours with enclosed area below
/// `config.min_contour_area` or a degenerate zero perimeter are
/// discarded as noise before any shape scoring happens.
#[must_use]
pub fn circle_candidates(binary: &GrayImage, config: &PipelineConfig) -> Vec<ContourCandidate> {
    let contours: Vec<imageproc::contours::Contour<i32>> = find_contours(binary);

    contours
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| {
            let points: Vec<(f64, f64)> = c
                .points
                .iter()
                .map(|p| (f64::from(p.x), f64::from(p.y)))
                .collect();

            let area = polygon_area(&points);
            if area < config.min_contour_area {
                return None;
            }
            let perimeter = closed_perimeter(&points);
            if perimeter == 0.0 {
                return None;
            }

            let circularity = 4.0 * std::f64::consts::PI * area / (perimeter * perimeter);
            let enclosing = min_enclosing_circle(&points)?;
            Some(ContourCandidate {
                enclosing,
                area,
                perimeter,
                circularity,
            })
        })
        .collect()
}

/// Select the accepted candidate: circularity strictly inside the band,
/// enclosing radius strictly inside the radius bounds, and, among all
/// survivors, circularity closest to a perfect 1.0.
///
/// Picking the best-scoring candidate (rather than the first in contour
/// scan order) keeps the choice independent of border-following
/// enumeration order.
#[must_use]
pub fn select_candidate<'a>(
    candidates: &'a [ContourCandidate],
    config: &PipelineConfig,
) -> Option<&'a ContourCandidate> {
    candidates
        .iter()
        .filter(|c| {
            c.circularity > config.circularity_min
                && c.circularity < config.circularity_max
                && c.enclosing.radius > config.radius_min
                && c.enclosing.radius < config.radius_max
        })
        .min_by(|a, b| {
            (a.circularity - 1.0)
                .abs()
                .total_cmp(&(b.circularity - 1.0).abs())
        })
}

/// Shoelace area of a closed boundary chain.
fn polygon_area(points: &[(f64, f64)]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..points.len() {
        let (x1, y1) = points[i];
        let (x2, y2) = points[(i + 1) % points.len()];
        twice_area += x1 * y2 - x2 * y1;
    }
    twice_area.abs() / 2.0
}

/// Length of a boundary chain, closing the last segment back to the
/// first point.
fn closed_perimeter(points: &[(f64, f64)]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut length = 0.0;
    for i in 0..points.len() {
        let (x1, y1) = points[i];
        let (x2, y2) = points[(i + 1) % points.len()];
        length += (x2 - x1).hypot(y2 - y1);
    }
    length
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::PipelineConfig;

    /// Filled white disk of the given radius on black.
    fn disk_image(size: u32, cx: i64, cy: i64, r: i64) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            let dx = i64::from(x) - cx;
            let dy = i64::from(y) - cy;
            if dx * dx + dy * dy <= r * r {
                image::Luma([255])
            } else {
                image::Luma([0])
            }
        })
    }

    #[test]
    fn polygon_area_unit_square() {
        let square = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)];
        assert!((polygon_area(&square) - 16.0).abs() < 1e-9);
    }

    #[test]
    fn closed_perimeter_square() {
        let square = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)];
        assert!((closed_perimeter(&square) - 16.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_chains_have_zero_area() {
        assert!(polygon_area(&[]).abs() < f64::EPSILON);
        assert!(polygon_area(&[(1.0, 1.0), (2.0, 2.0)]).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_image_has_no_candidates() {
        let img = GrayImage::new(50, 50);
        let candidates = circle_candidates(&img, &PipelineConfig::default());
        assert!(candidates.is_empty());
    }

    #[test]
    fn disk_yields_near_unit_circularity() {
        let img = disk_image(120, 60, 60, 30);
        let candidates = circle_candidates(&img, &PipelineConfig::default());
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert!(
            (c.circularity - 1.0).abs() < 0.15,
            "disk circularity was {}",
            c.circularity,
        );
        assert!((c.enclosing.cx - 60.0).abs() <= 2.0);
        assert!((c.enclosing.cy - 60.0).abs() <= 2.0);
        assert!((c.enclosing.radius - 30.0).abs() <= 2.0);
    }

    #[test]
    fn tiny_specks_are_filtered_as_noise() {
        let mut img = GrayImage::new(50, 50);
        // 3x3 blob: area well under the 50 px² floor.
        for y in 10..13 {
            for x in 10..13 {
                img.put_pixel(x, y, image::Luma([255]));
            }
        }
        let candidates = circle_candidates(&img, &PipelineConfig::default());
        assert!(candidates.is_empty());
    }

    #[test]
    fn elongated_blob_fails_the_band() {
        // 80x6 bar: large area but circularity far below 0.75.
        let mut img = GrayImage::new(100, 40);
        for y in 17..23 {
            for x in 10..90 {
                img.put_pixel(x, y, image::Luma([255]));
            }
        }
        let config = PipelineConfig::default();
        let candidates = circle_candidates(&img, &config);
        assert!(!candidates.is_empty());
        assert!(select_candidate(&candidates, &config).is_none());
    }

    #[test]
    fn oversized_disk_fails_the_radius_bound() {
        let img = disk_image(260, 130, 130, 110);
        let config = PipelineConfig::default();
        let candidates = circle_candidates(&img, &config);
        assert!(select_candidate(&candidates, &config).is_none());
    }

    #[test]
    fn best_circularity_wins_among_candidates() {
        // A clean disk and a square of comparable size: both pass the
        // band check is not guaranteed for the square (circularity
        // π/4 ≈ 0.785), but the disk must win the ranking.
        let mut img = disk_image(200, 50, 50, 25);
        for y in 120..170 {
            for x in 120..170 {
                img.put_pixel(x, y, image::Luma([255]));
            }
        }
        let config = PipelineConfig::default();
        let candidates = circle_candidates(&img, &config);
        assert!(candidates.len() >= 2);
        let best = select_candidate(&candidates, &config).unwrap();
        assert!((best.enclosing.cx - 50.0).abs() <= 2.0);
        assert!((best.enclosing.cy - 50.0).abs() <= 2.0);
    }
}
