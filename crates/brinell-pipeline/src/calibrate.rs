//! Pixel-to-millimetre calibration from reference measurements.
//!
//! The operator measures a feature of known physical length (a ruler
//! graduation, a stage micrometer line) one or more times; the engine
//! turns those pixel distances into a scale factor. Two protocols share
//! one code path: single-shot calibration is a sample target of 1, the
//! averaged protocol collects a fixed target count (the reference rig
//! uses 10) and derives the scale from the mean.
//!
//! The scale is write-once. Reference samples arriving after
//! calibration are ignored here; recalibrating means starting a fresh
//! session, because a scale belongs to exactly one image.

use tracing::debug;

/// Calibration failures, from construction through conversion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalibrationError {
    /// The configured reference length cannot produce a scale.
    #[error("invalid reference length {0} mm: must be positive and finite")]
    InvalidReferenceLength(f64),

    /// A zero sample target can never complete.
    #[error("invalid sample target: at least one reference sample is required")]
    InvalidSampleTarget,

    /// Conversion was requested before the scale exists.
    #[error("uncalibrated: {remaining} reference sample(s) still needed")]
    Uncalibrated {
        /// Samples still to be collected before the scale is derived.
        remaining: usize,
    },
}

/// Outcome of feeding one reference sample to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationStatus {
    /// More reference samples are needed before a scale exists.
    Pending {
        /// Samples collected so far.
        collected: usize,
        /// Samples still required.
        remaining: usize,
    },
    /// The scale has been derived (now, or on an earlier sample).
    Calibrated {
        /// Pixels per millimetre.
        px_per_mm: f64,
    },
}

/// Accumulates reference distances and derives the px/mm scale.
#[derive(Debug, Clone)]
pub struct CalibrationEngine {
    reference_length_mm: f64,
    target_samples: usize,
    samples: Vec<f64>,
    px_per_mm: Option<f64>,
}

impl CalibrationEngine {
    /// Create an engine that calibrates after `target_samples` reference
    /// distances against a known `reference_length_mm`.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::InvalidReferenceLength`] unless the
    /// reference length is positive and finite, and
    /// [`CalibrationError::InvalidSampleTarget`] for a zero target.
    /// Both are configuration errors: they are rejected here, before any
    /// measurement happens.
    pub fn new(reference_length_mm: f64, target_samples: usize) -> Result<Self, CalibrationError> {
        if !reference_length_mm.is_finite() || reference_length_mm <= 0.0 {
            return Err(CalibrationError::InvalidReferenceLength(
                reference_length_mm,
            ));
        }
        if target_samples == 0 {
            return Err(CalibrationError::InvalidSampleTarget);
        }
        Ok(Self {
            reference_length_mm,
            target_samples,
            samples: Vec::with_capacity(target_samples),
            px_per_mm: None,
        })
    }

    /// Single-shot protocol: the first reference distance calibrates.
    ///
    /// # Errors
    ///
    /// Same construction errors as [`CalibrationEngine::new`].
    pub fn single_shot(reference_length_mm: f64) -> Result<Self, CalibrationError> {
        Self::new(reference_length_mm, 1)
    }

    /// Feed one reference distance in pixels.
    ///
    /// Once the target count is reached the scale becomes
    /// `mean(samples) / reference_length_mm` and is frozen; any samples
    /// after that are ignored and the existing scale is reported back.
    pub fn add_reference_sample(&mut self, distance_px: f64) -> CalibrationStatus {
        if let Some(px_per_mm) = self.px_per_mm {
            return CalibrationStatus::Calibrated { px_per_mm };
        }

        self.samples.push(distance_px);
        debug!(
            "reference sample {distance_px:.2} px recorded ({}/{})",
            self.samples.len(),
            self.target_samples,
        );

        if self.samples.len() < self.target_samples {
            return CalibrationStatus::Pending {
                collected: self.samples.len(),
                remaining: self.target_samples - self.samples.len(),
            };
        }

        #[allow(clippy::cast_precision_loss)]
        let mean = self.samples.iter().sum::<f64>() / self.samples.len() as f64;
        let px_per_mm = mean / self.reference_length_mm;
        self.px_per_mm = Some(px_per_mm);
        debug!("calibration complete: {px_per_mm:.3} px/mm");
        CalibrationStatus::Calibrated { px_per_mm }
    }

    /// The derived scale, if calibration has completed.
    #[must_use]
    pub const fn scale(&self) -> Option<f64> {
        self.px_per_mm
    }

    /// Whether the scale has been derived.
    #[must_use]
    pub const fn is_calibrated(&self) -> bool {
        self.px_per_mm.is_some()
    }

    /// Reference samples still needed before the scale exists.
    #[must_use]
    pub fn remaining(&self) -> usize {
        if self.is_calibrated() {
            0
        } else {
            self.target_samples - self.samples.len()
        }
    }

    /// The configured reference length in millimetres.
    #[must_use]
    pub const fn reference_length_mm(&self) -> f64 {
        self.reference_length_mm
    }

    /// Convert a pixel distance to millimetres through the scale.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::Uncalibrated`] (with the outstanding
    /// sample count) before calibration has completed.
    pub fn to_millimetres(&self, distance_px: f64) -> Result<f64, CalibrationError> {
        match self.px_per_mm {
            Some(scale) => Ok(distance_px / scale),
            None => Err(CalibrationError::Uncalibrated {
                remaining: self.remaining(),
            }),
        }
    }
}
