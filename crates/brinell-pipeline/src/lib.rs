//! brinell-pipeline: Pure measurement pipeline for Brinell hardness
//! estimation (sans-IO).
//!
//! Turns a photograph of a ball indentation into a hardness reading
//! through: grayscale -> bilateral denoise -> CLAHE contrast ->
//! top-hat glare suppression -> two-phase circle detection (contour
//! circularity, Hough fallback) -> pixel-to-millimetre conversion ->
//! Brinell formula.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and raster buffers and returns structured data. File
//! loading, display and persistence live with the caller.
//!
//! Interactive calibration and manual measurement are available
//! separately through [`MeasurementSession`] and [`CalibrationEngine`];
//! the [`process`] entry point covers the fully automatic path where a
//! scale is already known.

pub mod calibrate;
pub mod contour;
pub mod contrast;
pub mod denoise;
pub mod detect;
pub mod glare;
pub mod grayscale;
pub mod hardness;
pub mod hough;
pub mod min_circle;
pub mod session;
pub mod threshold;
pub mod types;

use tracing::debug;

pub use calibrate::{CalibrationEngine, CalibrationError, CalibrationStatus};
pub use detect::{Detection, DetectionPhase};
pub use hardness::{HardnessError, HardnessResult, TestCondition};
pub use session::{InputEvent, MeasurementSession, SessionOutcome};
pub use types::{
    Circle, Dimensions, GrayImage, Measurement, MeasurementReport, PipelineConfig, PipelineError,
    Point, StagedPreprocess,
};

/// Normalize a grayscale image into the corrected field detection runs
/// on: bilateral denoise, CLAHE contrast normalization, top-hat glare
/// suppression, in that fixed order.
///
/// Output dimensions always match the input.
#[must_use = "returns the corrected image"]
pub fn preprocess(gray: &GrayImage, config: &PipelineConfig) -> GrayImage {
    let denoised = denoise::bilateral(
        gray,
        config.denoise_window,
        config.denoise_sigma_color,
        config.denoise_sigma_spatial,
    );
    let equalized = contrast::clahe(&denoised, config.clahe_clip_limit, config.clahe_grid);
    glare::suppress_glare(&equalized, config.glare_radius)
}

/// Run the preprocessor keeping every intermediate stage, for display
/// collaborators that show the operator each correction.
#[must_use = "returns the staged preprocessing result"]
pub fn preprocess_staged(gray: GrayImage, config: &PipelineConfig) -> StagedPreprocess {
    let dimensions = Dimensions {
        width: gray.width(),
        height: gray.height(),
    };
    let denoised = denoise::bilateral(
        &gray,
        config.denoise_window,
        config.denoise_sigma_color,
        config.denoise_sigma_spatial,
    );
    let equalized = contrast::clahe(&denoised, config.clahe_clip_limit, config.clahe_grid);
    let corrected = glare::suppress_glare(&equalized, config.glare_radius);
    StagedPreprocess {
        grayscale: gray,
        denoised,
        equalized,
        corrected,
        dimensions,
    }
}

/// Run the fully automatic measurement pipeline.
///
/// Decodes `image_bytes`, preprocesses, detects the indentation circle,
/// converts its diameter through the supplied `px_per_mm` scale and
/// computes the hardness reading for `condition`.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] or
/// [`PipelineError::ImageDecode`] for unusable input bytes,
/// [`PipelineError::InvalidScale`] for a non-positive or non-finite
/// scale, [`PipelineError::CircleNotFound`] when neither detection
/// phase succeeds (fall back to a [`MeasurementSession`]), and
/// [`PipelineError::Hardness`] when the converted diameter violates the
/// Brinell domain for the chosen condition.
pub fn process(
    image_bytes: &[u8],
    config: &PipelineConfig,
    px_per_mm: f64,
    condition: TestCondition,
) -> Result<MeasurementReport, PipelineError> {
    if !px_per_mm.is_finite() || px_per_mm <= 0.0 {
        return Err(PipelineError::InvalidScale(px_per_mm));
    }

    let gray = grayscale::decode_and_grayscale(image_bytes)?;
    let corrected = preprocess(&gray, config);

    let detection = detect::detect(&corrected, config).ok_or(PipelineError::CircleNotFound)?;

    let diameter_px = f64::from(detection.circle.diameter_px());
    let diameter_mm = diameter_px / px_per_mm;
    debug!(
        "indentation diameter {diameter_px:.2} px / {px_per_mm:.2} px/mm = {diameter_mm:.2} mm"
    );

    let hardness = hardness::compute(condition, diameter_mm)?;
    Ok(MeasurementReport {
        detection,
        diameter_px,
        px_per_mm,
        diameter_mm,
        hardness,
    })
}
