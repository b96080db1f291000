//! Contrast-limited adaptive histogram equalization (CLAHE).
//!
//! Equalizes illumination over a grid of tiles instead of the whole
//! frame, with the histogram slope clipped so near-uniform regions are
//! not amplified into noise. Per-tile mappings are blended bilinearly so
//! tile seams do not show up as edges in the detector input.
//!
//! Implemented locally: `imageproc` provides only global histogram
//! equalization. Tile layout, clip redistribution and the `255 / area`
//! mapping scale follow the classical formulation.

use image::GrayImage;

/// Number of intensity bins in the per-tile histograms.
const BINS: usize = 256;

/// Apply contrast-limited adaptive histogram equalization.
///
/// The image is divided into `grid × grid` tiles (clamped so every tile
/// is at least one pixel). Each tile's histogram is clipped at
/// `clip_limit × area / 256` counts per bin, the clipped excess is
/// redistributed over all bins, and the resulting cumulative mapping is
/// applied with bilinear blending between neighbouring tile centers.
///
/// A zero grid or non-positive clip limit returns the image unchanged.
#[must_use = "returns the equalized image"]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn clahe(image: &GrayImage, clip_limit: f32, grid: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || grid == 0 || clip_limit <= 0.0 {
        return image.clone();
    }

    let grid_x = grid.min(width) as usize;
    let grid_y = grid.min(height) as usize;

    // Tile boundaries; sizes differ by at most one pixel.
    let bounds_x = tile_bounds(width, grid_x);
    let bounds_y = tile_bounds(height, grid_y);

    let mut luts = vec![[0_u8; BINS]; grid_x * grid_y];
    for ty in 0..grid_y {
        for tx in 0..grid_x {
            luts[ty * grid_x + tx] = tile_lut(
                image,
                (bounds_x[tx], bounds_y[ty]),
                (bounds_x[tx + 1], bounds_y[ty + 1]),
                clip_limit,
            );
        }
    }

    // Blend between the mappings of the four tiles whose centers
    // surround each pixel; clamp outside the outermost centers.
    let centers_x = tile_centers(&bounds_x);
    let centers_y = tile_centers(&bounds_y);

    GrayImage::from_fn(width, height, |x, y| {
        let (tx0, tx1, fx) = locate(x as f32, &centers_x);
        let (ty0, ty1, fy) = locate(y as f32, &centers_y);
        let v = usize::from(image.get_pixel(x, y).0[0]);

        let top = lerp(
            f32::from(luts[ty0 * grid_x + tx0][v]),
            f32::from(luts[ty0 * grid_x + tx1][v]),
            fx,
        );
        let bottom = lerp(
            f32::from(luts[ty1 * grid_x + tx0][v]),
            f32::from(luts[ty1 * grid_x + tx1][v]),
            fx,
        );
        image::Luma([lerp(top, bottom, fy).round().clamp(0.0, 255.0) as u8])
    })
}

/// Tile edge coordinates: `count + 1` monotone values from 0 to `extent`.
fn tile_bounds(extent: u32, count: usize) -> Vec<u32> {
    (0..=count)
        .map(|i| ((u64::from(extent) * i as u64) / count as u64) as u32)
        .collect()
}

/// Midpoint of each tile along one axis.
#[allow(clippy::cast_precision_loss)]
fn tile_centers(bounds: &[u32]) -> Vec<f32> {
    bounds
        .windows(2)
        .map(|w| (w[0] + w[1]) as f32 / 2.0)
        .collect()
}

/// Clipped, redistributed, cumulative intensity mapping for one tile.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn tile_lut(image: &GrayImage, min: (u32, u32), max: (u32, u32), clip_limit: f32) -> [u8; BINS] {
    let area = (max.0 - min.0) * (max.1 - min.1);
    let mut hist = [0_u32; BINS];
    for y in min.1..max.1 {
        for x in min.0..max.0 {
            hist[usize::from(image.get_pixel(x, y).0[0])] += 1;
        }
    }

    // Clip the histogram and pool the excess.
    let limit = ((clip_limit * area as f32 / BINS as f32) as u32).max(1);
    let mut excess = 0_u32;
    for bin in &mut hist {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }

    // Redistribute: an even share to every bin, then the remainder one
    // count at a time over evenly spaced bins.
    let share = excess / BINS as u32;
    let mut residual = (excess % BINS as u32) as usize;
    for bin in &mut hist {
        *bin += share;
    }
    if residual > 0 {
        let step = (BINS / residual).max(1);
        let mut i = 0;
        while i < BINS && residual > 0 {
            hist[i] += 1;
            residual -= 1;
            i += step;
        }
    }

    let scale = 255.0 / area as f32;
    let mut lut = [0_u8; BINS];
    let mut cdf = 0_u32;
    for (v, bin) in hist.iter().enumerate() {
        cdf += bin;
        lut[v] = (cdf as f32 * scale).round().min(255.0) as u8;
    }
    lut
}

/// Bracketing tile indices and blend fraction for one axis position.
///
/// Positions outside the outermost tile centers collapse to the nearest
/// single tile (fraction 0).
fn locate(pos: f32, centers: &[f32]) -> (usize, usize, f32) {
    let last = centers.len() - 1;
    if pos <= centers[0] {
        return (0, 0, 0.0);
    }
    if pos >= centers[last] {
        return (last, last, 0.0);
    }
    let mut i = 0;
    while i < last && centers[i + 1] < pos {
        i += 1;
    }
    let span = centers[i + 1] - centers[i];
    (i, i + 1, (pos - centers[i]) / span)
}

const fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
