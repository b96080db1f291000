//! Brinell hardness computation.
//!
//! `HBW = 2P / (πD(D − √(D² − d²)))` with P the load in kgf, D the ball
//! diameter and d the measured indentation diameter, both in
//! millimetres. The standard reports HBW as a whole number; the
//! unrounded value stays available for precision checks.
//!
//! Test conditions are restricted to the three presets the bench
//! supports; anything else is rejected before the formula runs.

use serde::{Deserialize, Serialize};

/// Hardness-step failures. Fatal to this step only: a rejected preset
/// or diameter does not invalidate the measurement it came from.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HardnessError {
    /// The measured diameter violates `0 < d < D`; `violated` names the
    /// exact inequality that failed.
    #[error(
        "invalid indentation diameter {diameter_mm} mm for {ball_mm} mm ball: \
         requires 0 < d < D, violated {violated}"
    )]
    InvalidIndentation {
        /// Measured indentation diameter in millimetres.
        diameter_mm: f64,
        /// Ball diameter of the selected test condition.
        ball_mm: f64,
        /// The inequality that failed (`"d > 0"` or `"d < D"`).
        violated: &'static str,
    },

    /// The operator's selection does not name a recognized preset.
    #[error("invalid test selection '{0}': expected key 1, 2, or 3")]
    InvalidTestCondition(char),
}

/// The recognized (load, ball diameter) presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestCondition {
    /// 750 kgf load, 5 mm ball.
    Hbw5_750,
    /// 3000 kgf load, 10 mm ball.
    Hbw10_3000,
    /// 1000 kgf load, 10 mm ball.
    Hbw10_1000,
}

impl TestCondition {
    /// Every recognized preset, in keyboard order.
    pub const ALL: [Self; 3] = [Self::Hbw5_750, Self::Hbw10_3000, Self::Hbw10_1000];

    /// Applied load in kilogram-force.
    #[must_use]
    pub const fn load_kgf(self) -> f64 {
        match self {
            Self::Hbw5_750 => 750.0,
            Self::Hbw10_3000 => 3000.0,
            Self::Hbw10_1000 => 1000.0,
        }
    }

    /// Indenter ball diameter in millimetres.
    #[must_use]
    pub const fn ball_diameter_mm(self) -> f64 {
        match self {
            Self::Hbw5_750 => 5.0,
            Self::Hbw10_3000 | Self::Hbw10_1000 => 10.0,
        }
    }

    /// Standard designation, e.g. `HBW 5/750`.
    #[must_use]
    pub const fn designation(self) -> &'static str {
        match self {
            Self::Hbw5_750 => "HBW 5/750",
            Self::Hbw10_3000 => "HBW 10/3000",
            Self::Hbw10_1000 => "HBW 10/1000",
        }
    }

    /// Map an operator key press to a preset.
    ///
    /// # Errors
    ///
    /// Returns [`HardnessError::InvalidTestCondition`] for any key other
    /// than `1`, `2` or `3`.
    pub const fn from_key(key: u8) -> Result<Self, HardnessError> {
        match key {
            b'1' => Ok(Self::Hbw5_750),
            b'2' => Ok(Self::Hbw10_3000),
            b'3' => Ok(Self::Hbw10_1000),
            other => Err(HardnessError::InvalidTestCondition(other as char)),
        }
    }
}

impl std::fmt::Display for TestCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.designation())
    }
}

/// A finalized hardness reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HardnessResult {
    /// Measured indentation diameter in millimetres.
    pub diameter_mm: f64,
    /// The test condition the reading was computed under.
    pub condition: TestCondition,
    /// Reported hardness, rounded to the nearest whole number.
    pub hbw: u32,
    /// Unrounded hardness value.
    pub hbw_exact: f64,
}

/// Raw Brinell formula over explicit load and diameters.
///
/// # Errors
///
/// Returns [`HardnessError::InvalidIndentation`] unless `0 < d < D`
/// strictly. Within that domain `D − √(D² − d²)` is strictly positive,
/// so the result is always finite; the formula never leaks an
/// infinity or NaN.
pub fn hbw(load_kgf: f64, ball_mm: f64, diameter_mm: f64) -> Result<f64, HardnessError> {
    if diameter_mm.is_nan() || diameter_mm <= 0.0 {
        return Err(HardnessError::InvalidIndentation {
            diameter_mm,
            ball_mm,
            violated: "d > 0",
        });
    }
    if diameter_mm >= ball_mm {
        return Err(HardnessError::InvalidIndentation {
            diameter_mm,
            ball_mm,
            violated: "d < D",
        });
    }

    let depth_term = ball_mm - (ball_mm * ball_mm - diameter_mm * diameter_mm).sqrt();
    Ok(2.0 * load_kgf / (std::f64::consts::PI * ball_mm * depth_term))
}

/// Compute a hardness reading for a preset and measured diameter.
///
/// # Errors
///
/// Propagates [`HardnessError::InvalidIndentation`] from the formula's
/// domain checks.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn compute(
    condition: TestCondition,
    diameter_mm: f64,
) -> Result<HardnessResult, HardnessError> {
    let exact = hbw(condition.load_kgf(), condition.ball_diameter_mm(), diameter_mm)?;
    Ok(HardnessResult {
        diameter_mm,
        condition,
        hbw: exact.round() as u32,
        hbw_exact: exact,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn reference_scenario_yields_423() {
        // Calibration at 101 px/mm, measured chord 150 px → d ≈ 1.4851 mm,
        // 750 kgf on a 5 mm ball.
        let d = 150.0 / 101.0;
        let result = compute(TestCondition::Hbw5_750, d).unwrap();
        assert_eq!(result.hbw, 423);
        assert!((result.hbw_exact - 423.174).abs() < 0.01);
    }

    #[test]
    fn heavy_load_preset_known_value() {
        // HBW 10/3000 at d = 4.0 mm is a standard-table neighbourhood
        // of 229.
        let result = compute(TestCondition::Hbw10_3000, 4.0).unwrap();
        assert_eq!(result.hbw, 229);
    }

    #[test]
    fn hardness_is_strictly_increasing_in_load() {
        let mut previous = 0.0;
        for load in [500.0, 750.0, 1000.0, 1500.0, 3000.0] {
            let value = hbw(load, 10.0, 4.0).unwrap();
            assert!(value > previous, "HBW not increasing at load {load}");
            previous = value;
        }
    }

    #[test]
    fn denominator_stays_positive_across_the_domain() {
        // 0 < d < D keeps D − √(D² − d²) > 0, so the result is finite
        // and positive everywhere in the valid range.
        for i in 1..100 {
            let d = f64::from(i) * 0.1;
            if d >= 10.0 {
                break;
            }
            let value = hbw(3000.0, 10.0, d).unwrap();
            assert!(value.is_finite() && value > 0.0, "bad HBW {value} at d={d}");
        }
    }

    #[test]
    fn diameter_equal_to_ball_is_rejected() {
        let err = hbw(750.0, 5.0, 5.0).unwrap_err();
        assert!(matches!(
            err,
            HardnessError::InvalidIndentation { violated: "d < D", .. }
        ));
    }

    #[test]
    fn diameter_above_ball_is_rejected() {
        let err = hbw(750.0, 5.0, 6.5).unwrap_err();
        assert!(matches!(
            err,
            HardnessError::InvalidIndentation { violated: "d < D", .. }
        ));
    }

    #[test]
    fn non_positive_diameter_is_rejected() {
        for d in [0.0, -1.0, f64::NAN] {
            let err = hbw(750.0, 5.0, d).unwrap_err();
            assert!(matches!(
                err,
                HardnessError::InvalidIndentation { violated: "d > 0", .. }
            ));
        }
    }

    #[test]
    fn error_message_names_the_violated_inequality() {
        let err = hbw(750.0, 5.0, 6.0).unwrap_err();
        assert!(err.to_string().contains("violated d < D"), "got: {err}");
    }

    #[test]
    fn presets_carry_the_fixed_parameters() {
        assert!((TestCondition::Hbw5_750.load_kgf() - 750.0).abs() < f64::EPSILON);
        assert!((TestCondition::Hbw5_750.ball_diameter_mm() - 5.0).abs() < f64::EPSILON);
        assert!((TestCondition::Hbw10_3000.load_kgf() - 3000.0).abs() < f64::EPSILON);
        assert!((TestCondition::Hbw10_3000.ball_diameter_mm() - 10.0).abs() < f64::EPSILON);
        assert!((TestCondition::Hbw10_1000.load_kgf() - 1000.0).abs() < f64::EPSILON);
        assert!((TestCondition::Hbw10_1000.ball_diameter_mm() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn keys_map_to_presets_in_keyboard_order() {
        assert_eq!(TestCondition::from_key(b'1'), Ok(TestCondition::Hbw5_750));
        assert_eq!(TestCondition::from_key(b'2'), Ok(TestCondition::Hbw10_3000));
        assert_eq!(TestCondition::from_key(b'3'), Ok(TestCondition::Hbw10_1000));
    }

    #[test]
    fn unknown_key_is_rejected_with_the_key_named() {
        let err = TestCondition::from_key(b'9').unwrap_err();
        assert_eq!(err, HardnessError::InvalidTestCondition('9'));
        assert!(err.to_string().contains('9'));
    }

    #[test]
    fn rejected_preset_does_not_invalidate_the_diameter() {
        // The same measured diameter can be retried against a valid
        // preset after a selection error.
        let d = 1.5;
        assert!(TestCondition::from_key(b'x').is_err());
        assert!(compute(TestCondition::Hbw5_750, d).is_ok());
    }

    #[test]
    fn display_uses_standard_designation() {
        assert_eq!(TestCondition::Hbw5_750.to_string(), "HBW 5/750");
        assert_eq!(TestCondition::Hbw10_3000.to_string(), "HBW 10/3000");
    }

    #[test]
    fn result_serde_round_trip() {
        let result = compute(TestCondition::Hbw10_1000, 3.2).unwrap();
        let json = serde_json::to_string(&result).unwrap();
        let back: HardnessResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, back);
    }
}
