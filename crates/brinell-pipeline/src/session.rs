//! Interactive measurement session: paired clicks into horizontal
//! distances.
//!
//! A session owns everything an event-driven front end would otherwise
//! keep in globals: the pending first point, the optional frozen axis,
//! completed measurements, the selected test condition and the
//! calibration engine. The display collaborator forwards discrete
//! [`InputEvent`]s; the session answers with a [`SessionOutcome`]
//! describing what the event meant. No waiting or polling happens
//! here; suspension lives entirely at the caller's "await next event"
//! boundary.
//!
//! Completed pairs feed the calibration engine until a scale exists,
//! then convert directly to millimetres. Whether the consumer is
//! calibration or indentation measurement makes no difference to the
//! state machine.

use tracing::debug;

use crate::calibrate::{CalibrationEngine, CalibrationStatus};
use crate::hardness::TestCondition;
use crate::types::{Measurement, Point};

/// Keyboard code that clears the session's points and frozen axis.
pub const KEY_RESET: u8 = b'r';
/// Keyboard code (Esc) that deactivates the session.
pub const KEY_ABORT: u8 = 27;

/// A discrete operator input. Pointer-move and scroll events belong to
/// the display layer and never reach the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Pointer press at a pixel position.
    PointerDown {
        /// Horizontal pixel position.
        x: i32,
        /// Vertical pixel position.
        y: i32,
    },
    /// Key press, by key code.
    KeyPress(u8),
}

/// What a handled event meant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionOutcome {
    /// First point of a pair placed; the session awaits the second.
    AwaitingSecondPoint {
        /// The placed point (already snapped to a frozen axis, if any).
        point: Point,
    },
    /// A completed pair fed calibration; more reference samples needed.
    CalibrationProgress {
        /// The completed measurement.
        measurement: Measurement,
        /// Reference samples collected so far.
        collected: usize,
        /// Reference samples still required.
        remaining: usize,
    },
    /// A completed pair finished calibration.
    CalibrationComplete {
        /// The completed measurement.
        measurement: Measurement,
        /// The derived scale in pixels per millimetre.
        px_per_mm: f64,
    },
    /// A completed pair measured a real-world distance.
    Measured {
        /// The completed measurement.
        measurement: Measurement,
        /// The distance converted through the session's scale.
        distance_mm: f64,
    },
    /// A digit key selected a test condition.
    ConditionSelected(TestCondition),
    /// Points and frozen axis cleared; calibration preserved.
    Reset,
    /// Session deactivated; any unpaired point discarded.
    Aborted,
    /// The event had no meaning in the current state.
    Ignored,
}

/// The session state machine.
///
/// States: idle → awaiting second point → idle, looped; `abort`
/// deactivates the machine permanently. Every completed measurement is
/// horizontal by construction (see [`Measurement::pair`]).
#[derive(Debug, Clone)]
pub struct MeasurementSession {
    calibration: CalibrationEngine,
    axis_freeze: bool,
    frozen_y: Option<i32>,
    pending: Option<Point>,
    measurements: Vec<Measurement>,
    condition: Option<TestCondition>,
    active: bool,
}

impl MeasurementSession {
    /// Create a session where each pair defines its own horizontal line.
    #[must_use]
    pub const fn new(calibration: CalibrationEngine) -> Self {
        Self {
            calibration,
            axis_freeze: false,
            frozen_y: None,
            pending: None,
            measurements: Vec::new(),
            condition: None,
            active: true,
        }
    }

    /// Create a session that latches the first click's row as the
    /// horizontal line for every subsequent point.
    #[must_use]
    pub const fn with_axis_freeze(calibration: CalibrationEngine) -> Self {
        let mut session = Self::new(calibration);
        session.axis_freeze = true;
        session
    }

    /// Dispatch one operator event.
    pub fn handle(&mut self, event: InputEvent) -> SessionOutcome {
        match event {
            InputEvent::PointerDown { x, y } => self.pointer_down(x, y),
            InputEvent::KeyPress(key) => self.key_press(key),
        }
    }

    /// Place a point. The first of a pair arms the machine; the second
    /// completes a horizontal measurement.
    pub fn pointer_down(&mut self, x: i32, y: i32) -> SessionOutcome {
        if !self.active {
            return SessionOutcome::Ignored;
        }

        match self.pending.take() {
            None => {
                let y = if self.axis_freeze {
                    *self.frozen_y.get_or_insert(y)
                } else {
                    y
                };
                let point = Point::new(x, y);
                self.pending = Some(point);
                SessionOutcome::AwaitingSecondPoint { point }
            }
            Some(first) => {
                let measurement = Measurement::pair(first, Point::new(x, y));
                debug!("pixel distance: {:.2} px", measurement.distance_px);
                self.measurements.push(measurement);
                self.consume(measurement)
            }
        }
    }

    /// Handle a key press: `r` resets, Esc aborts, digits select the
    /// test condition, anything else is ignored.
    pub fn key_press(&mut self, key: u8) -> SessionOutcome {
        if !self.active {
            return SessionOutcome::Ignored;
        }
        match key {
            KEY_RESET => self.reset(),
            KEY_ABORT => self.abort(),
            _ => match TestCondition::from_key(key) {
                Ok(condition) => {
                    self.condition = Some(condition);
                    SessionOutcome::ConditionSelected(condition)
                }
                Err(_) => SessionOutcome::Ignored,
            },
        }
    }

    /// Clear accumulated points, measurements and the frozen axis.
    ///
    /// An established calibration survives: the scale is a session-level
    /// fact, not tied to individual points. Recalibrating means starting
    /// a fresh session.
    pub fn reset(&mut self) -> SessionOutcome {
        self.pending = None;
        self.measurements.clear();
        self.frozen_y = None;
        SessionOutcome::Reset
    }

    /// Deactivate the session, discarding any unpaired point. All
    /// subsequent events are ignored.
    pub const fn abort(&mut self) -> SessionOutcome {
        self.pending = None;
        self.active = false;
        SessionOutcome::Aborted
    }

    /// Route a completed measurement to calibration or conversion.
    fn consume(&mut self, measurement: Measurement) -> SessionOutcome {
        if let Some(scale) = self.calibration.scale() {
            let distance_mm = measurement.distance_px / scale;
            debug!("measured distance: {distance_mm:.2} mm (scale {scale:.2} px/mm)");
            return SessionOutcome::Measured {
                measurement,
                distance_mm,
            };
        }

        match self.calibration.add_reference_sample(measurement.distance_px) {
            CalibrationStatus::Pending {
                collected,
                remaining,
            } => SessionOutcome::CalibrationProgress {
                measurement,
                collected,
                remaining,
            },
            CalibrationStatus::Calibrated { px_per_mm } => SessionOutcome::CalibrationComplete {
                measurement,
                px_per_mm,
            },
        }
    }

    /// Whether the first point of a pair has been placed.
    #[must_use]
    pub const fn is_awaiting_second_point(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether the session still accepts events.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// The frozen horizontal line, once latched.
    #[must_use]
    pub const fn frozen_y(&self) -> Option<i32> {
        self.frozen_y
    }

    /// The session's calibration engine.
    #[must_use]
    pub const fn calibration(&self) -> &CalibrationEngine {
        &self.calibration
    }

    /// The selected test condition, if the operator picked one.
    #[must_use]
    pub const fn condition(&self) -> Option<TestCondition> {
        self.condition
    }

    /// Completed measurements, in order.
    #[must_use]
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::calibrate::CalibrationEngine;

    fn single_shot_session() -> MeasurementSession {
        MeasurementSession::new(CalibrationEngine::single_shot(1.0).unwrap())
    }

    #[test]
    fn first_point_arms_the_machine() {
        let mut session = single_shot_session();
        let outcome = session.pointer_down(10, 40);
        assert_eq!(
            outcome,
            SessionOutcome::AwaitingSecondPoint {
                point: Point::new(10, 40),
            },
        );
        assert!(session.is_awaiting_second_point());
    }

    #[test]
    fn first_pair_calibrates_single_shot() {
        let mut session = single_shot_session();
        session.pointer_down(10, 40);
        let outcome = session.pointer_down(111, 55);
        match outcome {
            SessionOutcome::CalibrationComplete {
                measurement,
                px_per_mm,
            } => {
                assert!((measurement.distance_px - 101.0).abs() < f64::EPSILON);
                assert!((px_per_mm - 101.0).abs() < f64::EPSILON);
            }
            other => panic!("expected CalibrationComplete, got {other:?}"),
        }
        assert!(!session.is_awaiting_second_point());
    }

    #[test]
    fn measurements_after_calibration_convert_to_millimetres() {
        let mut session = single_shot_session();
        session.pointer_down(10, 40);
        session.pointer_down(111, 40);
        session.pointer_down(20, 60);
        let outcome = session.pointer_down(170, 72);
        match outcome {
            SessionOutcome::Measured {
                measurement,
                distance_mm,
            } => {
                assert!((measurement.distance_px - 150.0).abs() < f64::EPSILON);
                assert!((distance_mm - 150.0 / 101.0).abs() < 1e-12);
            }
            other => panic!("expected Measured, got {other:?}"),
        }
    }

    #[test]
    fn points_share_a_row_when_distance_is_taken() {
        let mut session = single_shot_session();
        session.pointer_down(10, 40);
        session.pointer_down(110, 90);
        let m = session.measurements()[0];
        assert_eq!(m.p1.y, m.p2.y);
        assert_eq!(m.p2, Point::new(110, 40));
    }

    #[test]
    fn axis_freeze_latches_the_first_row_for_the_whole_session() {
        let engine = CalibrationEngine::new(1.0, 2).unwrap();
        let mut session = MeasurementSession::with_axis_freeze(engine);
        session.pointer_down(10, 33);
        assert_eq!(session.frozen_y(), Some(33));
        session.pointer_down(60, 80);

        // The next pair's first point snaps to the frozen row too.
        let outcome = session.pointer_down(5, 99);
        assert_eq!(
            outcome,
            SessionOutcome::AwaitingSecondPoint {
                point: Point::new(5, 33),
            },
        );
        session.pointer_down(45, 12);
        for m in session.measurements() {
            assert_eq!(m.p1.y, 33);
            assert_eq!(m.p2.y, 33);
        }
    }

    #[test]
    fn without_axis_freeze_each_pair_has_its_own_row() {
        let engine = CalibrationEngine::new(1.0, 2).unwrap();
        let mut session = MeasurementSession::new(engine);
        session.pointer_down(10, 20);
        session.pointer_down(60, 25);
        session.pointer_down(10, 70);
        session.pointer_down(60, 75);
        let ms = session.measurements();
        assert_eq!(ms[0].p1.y, 20);
        assert_eq!(ms[1].p1.y, 70);
        assert!(session.frozen_y().is_none());
    }

    #[test]
    fn averaged_calibration_reports_progress_per_pair() {
        let engine = CalibrationEngine::new(1.0, 3).unwrap();
        let mut session = MeasurementSession::new(engine);
        session.pointer_down(0, 10);
        let outcome = session.pointer_down(100, 10);
        assert!(matches!(
            outcome,
            SessionOutcome::CalibrationProgress {
                collected: 1,
                remaining: 2,
                ..
            }
        ));
    }

    #[test]
    fn reset_clears_points_but_keeps_calibration() {
        let mut session = single_shot_session();
        session.pointer_down(10, 40);
        session.pointer_down(111, 40);
        session.pointer_down(30, 50); // unpaired point
        assert_eq!(session.key_press(KEY_RESET), SessionOutcome::Reset);

        assert!(!session.is_awaiting_second_point());
        assert!(session.measurements().is_empty());
        assert!(session.calibration().is_calibrated());

        // The next pair is a measurement, not a new calibration.
        session.pointer_down(0, 10);
        let outcome = session.pointer_down(101, 10);
        assert!(matches!(outcome, SessionOutcome::Measured { .. }));
    }

    #[test]
    fn reset_clears_the_frozen_axis() {
        let engine = CalibrationEngine::new(1.0, 5).unwrap();
        let mut session = MeasurementSession::with_axis_freeze(engine);
        session.pointer_down(10, 33);
        session.reset();
        assert!(session.frozen_y().is_none());

        // A fresh first click latches a new row.
        session.pointer_down(10, 70);
        assert_eq!(session.frozen_y(), Some(70));
    }

    #[test]
    fn abort_discards_the_unpaired_point_and_deactivates() {
        let mut session = single_shot_session();
        session.pointer_down(10, 40);
        assert_eq!(session.key_press(KEY_ABORT), SessionOutcome::Aborted);
        assert!(!session.is_active());
        assert_eq!(session.pointer_down(50, 50), SessionOutcome::Ignored);
        assert_eq!(session.key_press(b'1'), SessionOutcome::Ignored);
        assert!(session.measurements().is_empty());
    }

    #[test]
    fn digit_keys_select_the_test_condition() {
        let mut session = single_shot_session();
        assert_eq!(
            session.key_press(b'2'),
            SessionOutcome::ConditionSelected(TestCondition::Hbw10_3000),
        );
        assert_eq!(session.condition(), Some(TestCondition::Hbw10_3000));
    }

    #[test]
    fn unrecognized_keys_are_ignored() {
        let mut session = single_shot_session();
        assert_eq!(session.key_press(b'z'), SessionOutcome::Ignored);
        assert!(session.condition().is_none());
    }

    #[test]
    fn events_dispatch_through_handle() {
        let mut session = single_shot_session();
        let outcome = session.handle(InputEvent::PointerDown { x: 10, y: 40 });
        assert!(matches!(outcome, SessionOutcome::AwaitingSecondPoint { .. }));
        let outcome = session.handle(InputEvent::KeyPress(b'1'));
        assert_eq!(
            outcome,
            SessionOutcome::ConditionSelected(TestCondition::Hbw5_750),
        );
    }
}
