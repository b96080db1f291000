//! Two-phase circle detection over the corrected grayscale field.
//!
//! Phase 1 binarizes the field and looks for a contour whose shape
//! sits inside the circularity and radius bands: precise when the
//! indentation rim segments cleanly, brittle under uneven lighting.
//! Phase 2 (the gradient Hough transform) only runs when Phase 1 finds
//! nothing: it tolerates broken rims but costs more and localizes less
//! sharply. First match wins; there is no blending of the two answers.

use image::GrayImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Circle, PipelineConfig, Point};
use crate::{contour, hough, threshold};

/// Which phase produced a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionPhase {
    /// Contour/circularity search on the binarized field.
    Contour,
    /// Gradient Hough transform fallback.
    Hough,
}

/// A detected indentation circle and the phase that found it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    /// The detected circle in whole pixels.
    pub circle: Circle,
    /// Provenance of the detection.
    pub phase: DetectionPhase,
}

/// Detect the indentation circle, or `None` when neither phase finds
/// one (the caller falls back to manual measurement or reports the
/// condition).
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn detect(corrected: &GrayImage, config: &PipelineConfig) -> Option<Detection> {
    // Phase 1: contour circularity search.
    let binary = threshold::adaptive_inverted(
        corrected,
        config.threshold_window,
        config.threshold_offset,
    );
    let candidates = contour::circle_candidates(&binary, config);
    if let Some(best) = contour::select_candidate(&candidates, config) {
        // Whole-pixel truncation, matching the reported coordinate
        // convention of the contour phase.
        let circle = Circle::new(
            Point::new(best.enclosing.cx as i32, best.enclosing.cy as i32),
            best.enclosing.radius as i32,
        );
        debug!(
            "circle found by contour phase: center ({}, {}), radius {} px, circularity {:.3}",
            circle.center.x, circle.center.y, circle.radius, best.circularity,
        );
        return Some(Detection {
            circle,
            phase: DetectionPhase::Contour,
        });
    }

    // Phase 2: Hough fallback on the grayscale field itself, not the
    // binarized image.
    let circles = hough::detect_circles(corrected, config);
    let best = circles.first()?;
    let circle = Circle::new(
        Point::new(best.cx.round() as i32, best.cy.round() as i32),
        best.radius.round() as i32,
    );
    debug!(
        "circle found by hough fallback: center ({}, {}), radius {} px, {} votes",
        circle.center.x, circle.center.y, circle.radius, best.votes,
    );
    Some(Detection {
        circle,
        phase: DetectionPhase::Hough,
    })
}
