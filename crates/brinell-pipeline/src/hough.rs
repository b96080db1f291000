//! Gradient Hough circle transform (detection Phase 2).
//!
//! More tolerant of noisy or partial rims than contour analysis, and
//! correspondingly less precise, which is why it only runs when
//! Phase 1 comes up empty. Edge pixels vote along their gradient
//! direction (both ways, so polarity does not matter) into a
//! down-scaled center accumulator; surviving peaks are separated by a
//! minimum distance and each peak's radius is read off the mode of its
//! edge-distance histogram.

use image::{GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::filter::filter_clamped;
use imageproc::kernel;
use tracing::debug;

use crate::types::PipelineConfig;

/// A circle candidate produced by the transform, ranked by vote count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoughCircle {
    /// Center x in pixels.
    pub cx: f64,
    /// Center y in pixels.
    pub cy: f64,
    /// Radius in pixels.
    pub radius: f64,
    /// Accumulator votes supporting the center.
    pub votes: u32,
}

/// Run the transform over a preprocessed grayscale field.
///
/// Returns candidates sorted by decreasing vote support; the first is
/// the transform's best guess. An empty vector means no cell reached
/// `config.hough_vote_threshold`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn detect_circles(gray: &GrayImage, config: &PipelineConfig) -> Vec<HoughCircle> {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let high = config.hough_canny_threshold.max(1.0);
    let low = (high / 2.0).max(1.0);
    let edges = imageproc::edges::canny(gray, low, high);

    let gx: Image<Luma<i16>> = filter_clamped(gray, kernel::SOBEL_HORIZONTAL_3X3);
    let gy: Image<Luma<i16>> = filter_clamped(gray, kernel::SOBEL_VERTICAL_3X3);

    let dp = f64::from(config.hough_dp.max(1.0));
    let acc_w = (f64::from(width) / dp).ceil() as usize;
    let acc_h = (f64::from(height) / dp).ceil() as usize;
    let mut accumulator = vec![0_u32; acc_w * acc_h];

    let r_min = config.radius_min.max(1.0);
    let r_max = config.radius_max.max(r_min);

    // Collect edge positions once: the radius estimation pass needs
    // them again after the centers are known.
    let mut edge_points: Vec<(u32, u32)> = Vec::new();
    for y in 0..height {
        for x in 0..width {
            if edges.get_pixel(x, y).0[0] == 0 {
                continue;
            }
            edge_points.push((x, y));

            let dx = f64::from(gx.get_pixel(x, y).0[0]);
            let dy = f64::from(gy.get_pixel(x, y).0[0]);
            let magnitude = dx.hypot(dy);
            if magnitude < 1e-6 {
                continue;
            }
            let (ux, uy) = (dx / magnitude, dy / magnitude);

            let mut r = r_min.ceil();
            while r <= r_max {
                for sign in [1.0, -1.0] {
                    let cx = f64::from(x) + sign * r * ux;
                    let cy = f64::from(y) + sign * r * uy;
                    if cx < 0.0 || cy < 0.0 || cx >= f64::from(width) || cy >= f64::from(height)
                    {
                        continue;
                    }
                    let cell = (cy / dp) as usize * acc_w + (cx / dp) as usize;
                    accumulator[cell] += 1;
                }
                r += 1.0;
            }
        }
    }

    // Peak cells: above the vote floor and maximal within their
    // 8-neighbourhood.
    let mut peaks: Vec<(u32, usize, usize)> = Vec::new();
    for cy in 0..acc_h {
        for cx in 0..acc_w {
            let votes = accumulator[cy * acc_w + cx];
            if votes < config.hough_vote_threshold {
                continue;
            }
            if is_local_max(&accumulator, acc_w, acc_h, cx, cy) {
                peaks.push((votes, cx, cy));
            }
        }
    }
    peaks.sort_by(|a, b| b.0.cmp(&a.0));

    // Greedy minimum-distance suppression in image coordinates, then
    // radius estimation per surviving center.
    let mut circles: Vec<HoughCircle> = Vec::new();
    for (votes, cell_x, cell_y) in peaks {
        let (cx, cy) = refine_center(&accumulator, acc_w, acc_h, cell_x, cell_y, dp);
        let too_close = circles.iter().any(|c| {
            (c.cx - cx).hypot(c.cy - cy) < config.hough_min_distance
        });
        if too_close {
            continue;
        }
        if let Some(radius) = estimate_radius(&edge_points, (cx, cy), r_min, r_max) {
            circles.push(HoughCircle {
                cx,
                cy,
                radius,
                votes,
            });
        }
    }

    debug!(
        candidates = circles.len(),
        edge_pixels = edge_points.len(),
        "hough transform complete"
    );
    circles
}

/// Whether a cell holds the (weak) maximum of its 8-neighbourhood.
fn is_local_max(acc: &[u32], acc_w: usize, acc_h: usize, cx: usize, cy: usize) -> bool {
    let votes = acc[cy * acc_w + cx];
    for ny in cy.saturating_sub(1)..=(cy + 1).min(acc_h - 1) {
        for nx in cx.saturating_sub(1)..=(cx + 1).min(acc_w - 1) {
            if (nx, ny) != (cx, cy) && acc[ny * acc_w + nx] > votes {
                return false;
            }
        }
    }
    true
}

/// Sub-cell center estimate: vote-weighted centroid of the 3×3
/// neighbourhood around a peak cell, mapped back to pixel coordinates.
#[allow(clippy::cast_precision_loss)]
fn refine_center(
    acc: &[u32],
    acc_w: usize,
    acc_h: usize,
    cell_x: usize,
    cell_y: usize,
    dp: f64,
) -> (f64, f64) {
    let mut total = 0.0;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    for ny in cell_y.saturating_sub(1)..=(cell_y + 1).min(acc_h - 1) {
        for nx in cell_x.saturating_sub(1)..=(cell_x + 1).min(acc_w - 1) {
            let w = f64::from(acc[ny * acc_w + nx]);
            total += w;
            sum_x += w * (nx as f64 + 0.5);
            sum_y += w * (ny as f64 + 0.5);
        }
    }
    if total == 0.0 {
        return ((cell_x as f64 + 0.5) * dp, (cell_y as f64 + 0.5) * dp);
    }
    ((sum_x / total) * dp, (sum_y / total) * dp)
}

/// Mode of the integer-binned distances from edge pixels to the center,
/// averaged within the winning bin for sub-pixel output.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn estimate_radius(
    edge_points: &[(u32, u32)],
    center: (f64, f64),
    r_min: f64,
    r_max: f64,
) -> Option<f64> {
    let bins = r_max.floor() as usize + 2;
    let mut counts = vec![0_u32; bins];
    let mut sums = vec![0.0_f64; bins];
    for &(x, y) in edge_points {
        let d = (f64::from(x) - center.0).hypot(f64::from(y) - center.1);
        if d < r_min || d > r_max {
            continue;
        }
        let bin = d.round() as usize;
        if bin < bins {
            counts[bin] += 1;
            sums[bin] += d;
        }
    }
    let (best_bin, &best_count) = counts
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.cmp(b.1))?;
    if best_count == 0 {
        return None;
    }
    Some(sums[best_bin] / f64::from(best_count))
}
