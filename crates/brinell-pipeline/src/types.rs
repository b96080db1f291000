//! Shared types for the Brinell measurement pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference intermediate
/// raster data without depending on `image` directly.
pub use image::GrayImage;

/// An integer pixel coordinate in image space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: i32,
    /// Vertical position (pixels from top edge).
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A horizontal chord between two operator-placed points.
///
/// Measurements are horizontal by construction: the second point of a
/// pair is snapped onto the first point's row before the distance is
/// taken, so vertical click jitter never contaminates the result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// First point of the pair, as placed.
    pub p1: Point,
    /// Second point of the pair, after snapping to `p1`'s row.
    pub p2: Point,
    /// Horizontal separation `|p2.x - p1.x|` in pixels.
    pub distance_px: f64,
}

impl Measurement {
    /// Pair two clicks into a horizontal measurement.
    ///
    /// `second` keeps its x-coordinate but its y is forced equal to
    /// `first.y`; the stored distance is the absolute x separation.
    #[must_use]
    pub fn pair(first: Point, second: Point) -> Self {
        let snapped = Point::new(second.x, first.y);
        Self {
            p1: first,
            p2: snapped,
            distance_px: f64::from((snapped.x - first.x).abs()),
        }
    }
}

/// A detected circle: center and radius in whole pixels.
///
/// Never mutated after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circle {
    /// Center pixel.
    pub center: Point,
    /// Radius in pixels.
    pub radius: i32,
}

impl Circle {
    /// Create a new circle.
    #[must_use]
    pub const fn new(center: Point, radius: i32) -> Self {
        Self { center, radius }
    }

    /// Diameter in pixels.
    #[must_use]
    pub const fn diameter_px(self) -> i32 {
        2 * self.radius
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Configuration for the measurement pipeline.
///
/// Defaults reproduce the reference measurement setup. All stages treat
/// their parameters as fixed for the lifetime of a run; there is no
/// per-stage mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Bilateral filter window size (pixels, full width).
    pub denoise_window: u32,
    /// Bilateral filter intensity-domain sigma.
    pub denoise_sigma_color: f32,
    /// Bilateral filter spatial-domain sigma.
    pub denoise_sigma_spatial: f32,

    /// CLAHE clip limit (histogram slope bound before redistribution).
    pub clahe_clip_limit: f32,
    /// CLAHE tile grid size: the image is divided into `grid × grid` tiles.
    pub clahe_grid: u32,

    /// Radius of the disk structuring element used for top-hat glare
    /// suppression.
    pub glare_radius: u32,

    /// Adaptive threshold window size (odd, full width).
    pub threshold_window: u32,
    /// Adaptive threshold offset: a pixel must be at least this far below
    /// its local Gaussian-weighted mean to become foreground.
    pub threshold_offset: f32,

    /// Minimum contour area in px² considered in Phase 1; smaller regions
    /// are treated as noise.
    pub min_contour_area: f64,
    /// Lower bound of the accepted circularity band (open interval).
    pub circularity_min: f64,
    /// Upper bound of the accepted circularity band (open interval).
    pub circularity_max: f64,
    /// Lower bound on circle radius in pixels (open interval, both phases).
    pub radius_min: f64,
    /// Upper bound on circle radius in pixels (open interval, both phases).
    pub radius_max: f64,

    /// Hough accumulator inverse resolution: accumulator cells are
    /// `dp × dp` pixel blocks.
    pub hough_dp: f32,
    /// Minimum distance in pixels between accepted Hough centers.
    pub hough_min_distance: f64,
    /// Upper Canny threshold for the Hough edge map (lower is half of it).
    pub hough_canny_threshold: f32,
    /// Minimum accumulator votes for a Hough center candidate.
    pub hough_vote_threshold: u32,
}

impl PipelineConfig {
    /// Default bilateral filter window size.
    pub const DEFAULT_DENOISE_WINDOW: u32 = 9;
    /// Default bilateral intensity sigma.
    pub const DEFAULT_DENOISE_SIGMA_COLOR: f32 = 75.0;
    /// Default bilateral spatial sigma.
    pub const DEFAULT_DENOISE_SIGMA_SPATIAL: f32 = 75.0;
    /// Default CLAHE clip limit.
    pub const DEFAULT_CLAHE_CLIP_LIMIT: f32 = 2.0;
    /// Default CLAHE grid size (8×8 tiles).
    pub const DEFAULT_CLAHE_GRID: u32 = 8;
    /// Default glare structuring-element radius.
    pub const DEFAULT_GLARE_RADIUS: u32 = 25;
    /// Default adaptive threshold window.
    pub const DEFAULT_THRESHOLD_WINDOW: u32 = 15;
    /// Default adaptive threshold offset.
    pub const DEFAULT_THRESHOLD_OFFSET: f32 = 4.0;
    /// Default minimum contour area.
    pub const DEFAULT_MIN_CONTOUR_AREA: f64 = 50.0;
    /// Default circularity band lower bound.
    pub const DEFAULT_CIRCULARITY_MIN: f64 = 0.75;
    /// Default circularity band upper bound.
    pub const DEFAULT_CIRCULARITY_MAX: f64 = 1.25;
    /// Default radius lower bound.
    pub const DEFAULT_RADIUS_MIN: f64 = 5.0;
    /// Default radius upper bound.
    pub const DEFAULT_RADIUS_MAX: f64 = 100.0;
    /// Default Hough accumulator inverse resolution.
    pub const DEFAULT_HOUGH_DP: f32 = 1.2;
    /// Default Hough center separation.
    pub const DEFAULT_HOUGH_MIN_DISTANCE: f64 = 50.0;
    /// Default Hough Canny upper threshold.
    pub const DEFAULT_HOUGH_CANNY_THRESHOLD: f32 = 80.0;
    /// Default Hough vote threshold.
    pub const DEFAULT_HOUGH_VOTE_THRESHOLD: u32 = 20;
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            denoise_window: Self::DEFAULT_DENOISE_WINDOW,
            denoise_sigma_color: Self::DEFAULT_DENOISE_SIGMA_COLOR,
            denoise_sigma_spatial: Self::DEFAULT_DENOISE_SIGMA_SPATIAL,
            clahe_clip_limit: Self::DEFAULT_CLAHE_CLIP_LIMIT,
            clahe_grid: Self::DEFAULT_CLAHE_GRID,
            glare_radius: Self::DEFAULT_GLARE_RADIUS,
            threshold_window: Self::DEFAULT_THRESHOLD_WINDOW,
            threshold_offset: Self::DEFAULT_THRESHOLD_OFFSET,
            min_contour_area: Self::DEFAULT_MIN_CONTOUR_AREA,
            circularity_min: Self::DEFAULT_CIRCULARITY_MIN,
            circularity_max: Self::DEFAULT_CIRCULARITY_MAX,
            radius_min: Self::DEFAULT_RADIUS_MIN,
            radius_max: Self::DEFAULT_RADIUS_MAX,
            hough_dp: Self::DEFAULT_HOUGH_DP,
            hough_min_distance: Self::DEFAULT_HOUGH_MIN_DISTANCE,
            hough_canny_threshold: Self::DEFAULT_HOUGH_CANNY_THRESHOLD,
            hough_vote_threshold: Self::DEFAULT_HOUGH_VOTE_THRESHOLD,
        }
    }
}

/// Result of running the preprocessor with every intermediate preserved.
///
/// Each field captures one stage's output so a display collaborator can
/// show the operator what each correction did to the frame.
///
/// Does not derive `PartialEq` or serde traits because `GrayImage`
/// implements neither.
#[derive(Debug, Clone)]
pub struct StagedPreprocess {
    /// Stage 1: decoded single-channel intensity image.
    pub grayscale: GrayImage,
    /// Stage 2: after edge-preserving bilateral smoothing.
    pub denoised: GrayImage,
    /// Stage 3: after CLAHE local contrast normalization.
    pub equalized: GrayImage,
    /// Stage 4: after top-hat glare suppression, the corrected field
    /// handed to detection.
    pub corrected: GrayImage,
    /// Source image dimensions in pixels.
    pub dimensions: Dimensions,
}

/// Result of the automatic measurement pipeline: the detected circle
/// and every derived value up to the hardness reading.
///
/// This is what the CLI prints or serializes; the fixed-format reported
/// values (pixel distances at 2 decimals, scale at 2-3, millimetres at
/// 2, HBW as an integer) all derive from these fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementReport {
    /// The detected circle and which phase found it.
    pub detection: crate::detect::Detection,
    /// Indentation diameter in pixels (twice the detected radius).
    pub diameter_px: f64,
    /// The scale the conversion used, in pixels per millimetre.
    pub px_per_mm: f64,
    /// Indentation diameter in millimetres.
    pub diameter_mm: f64,
    /// The hardness reading.
    pub hardness: crate::hardness::HardnessResult,
}

/// Errors that can occur while running the automatic pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Neither detection phase produced a circle.
    ///
    /// Non-fatal by design: the caller is expected to fall back to a
    /// manual [`MeasurementSession`](crate::session::MeasurementSession)
    /// or abort with this condition reported.
    #[error("no circle detected")]
    CircleNotFound,

    /// The supplied pixel-per-millimetre scale is unusable.
    #[error("invalid pixel-per-mm scale {0}: must be positive and finite")]
    InvalidScale(f64),

    /// The hardness step rejected its inputs.
    #[error(transparent)]
    Hardness(#[from] crate::hardness::HardnessError),
}
