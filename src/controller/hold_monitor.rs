//! # Hold Monitor
//!
//! Detects a stick deflected in one direction for too long.
//!
//! Each monitored axis runs a small state machine driven once per tick:
//!
//! ```text
//!            outside deadzone           same direction, held > threshold
//!   Idle ───────────────────────► Tracking ─────────────────────────────► warning
//!    ▲                              │  ▲
//!    │        inside deadzone       │  │ direction flipped: restart `since`
//!    └──────────────────────────────┘  └─┘
//! ```
//!
//! The lateral axis (stick X) reports strafing, the longitudinal axis
//! (stick Y) reports forward/backward. Negative Y is forward, so the sign to
//! label mapping of the two axes is inverted relative to each other.
//!
//! Elapsed time is measured on the wall-clock timestamps passed in, so an
//! irregular tick cadence only delays a warning, it never produces a wrong one.

use chrono::{DateTime, Local};
use std::fmt;

/// Side of the deadzone an axis reading falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deflection {
    Negative,
    Positive,
}

impl Deflection {
    /// Classifies a reading; `None` means neutral.
    pub fn classify(value: f32, deadzone: f32) -> Option<Self> {
        if value < -deadzone {
            Some(Deflection::Negative)
        } else if value > deadzone {
            Some(Deflection::Positive)
        } else {
            None
        }
    }
}

/// Hold tracking for one axis. A start time exists exactly when a direction is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisHoldState {
    #[default]
    Idle,
    Tracking {
        direction: Deflection,
        since: DateTime<Local>,
    },
}

impl AxisHoldState {
    pub fn direction(&self) -> Option<Deflection> {
        match self {
            AxisHoldState::Idle => None,
            AxisHoldState::Tracking { direction, .. } => Some(*direction),
        }
    }

    pub fn since(&self) -> Option<DateTime<Local>> {
        match self {
            AxisHoldState::Idle => None,
            AxisHoldState::Tracking { since, .. } => Some(*since),
        }
    }

    /// Advances the state with one reading and returns the direction held past
    /// the threshold, if any.
    fn step(
        &mut self,
        value: f32,
        now: DateTime<Local>,
        deadzone: f32,
        hold_threshold_secs: f64,
    ) -> Option<Deflection> {
        let Some(current) = Deflection::classify(value, deadzone) else {
            *self = AxisHoldState::Idle;
            return None;
        };

        match *self {
            AxisHoldState::Tracking { direction, since } if direction == current => {
                if seconds_between(since, now) > hold_threshold_secs {
                    Some(direction)
                } else {
                    None
                }
            }
            // Fresh deflection or a reversal without passing through neutral.
            _ => {
                *self = AxisHoldState::Tracking {
                    direction: current,
                    since: now,
                };
                None
            }
        }
    }
}

fn seconds_between(since: DateTime<Local>, now: DateTime<Local>) -> f64 {
    let elapsed = now - since;
    match elapsed.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1_000_000_000.0,
        None => elapsed.num_milliseconds() as f64 / 1_000.0,
    }
}

/// The two logical stick axes being watched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeldAxis {
    Lateral,
    Longitudinal,
}

impl HeldAxis {
    pub fn label(self, direction: Deflection) -> &'static str {
        match (self, direction) {
            (HeldAxis::Lateral, Deflection::Negative) => "LEFT STRAFE",
            (HeldAxis::Lateral, Deflection::Positive) => "RIGHT STRAFE",
            (HeldAxis::Longitudinal, Deflection::Negative) => "FORWARD",
            (HeldAxis::Longitudinal, Deflection::Positive) => "BACKWARD",
        }
    }
}

/// A direction held past the configured threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldWarning {
    pub axis: HeldAxis,
    pub direction: Deflection,
}

impl fmt::Display for HoldWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "HOLDING {} TOO LONG", self.axis.label(self.direction))
    }
}

/// Owns the hold state of both stick axes.
#[derive(Debug, Clone, Default)]
pub struct HoldMonitor {
    lateral: AxisHoldState,
    longitudinal: AxisHoldState,
}

impl HoldMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one stick reading and returns the warnings to show, X axis first.
    ///
    /// `deadzone` and `hold_threshold_secs` are taken per call so configuration
    /// edits apply on the next tick without touching running timers.
    pub fn evaluate(
        &mut self,
        stick_x: f32,
        stick_y: f32,
        now: DateTime<Local>,
        deadzone: f32,
        hold_threshold_secs: f64,
    ) -> Vec<String> {
        self.evaluate_warnings(stick_x, stick_y, now, deadzone, hold_threshold_secs)
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Same as [`HoldMonitor::evaluate`] but keeps the structured form.
    pub fn evaluate_warnings(
        &mut self,
        stick_x: f32,
        stick_y: f32,
        now: DateTime<Local>,
        deadzone: f32,
        hold_threshold_secs: f64,
    ) -> Vec<HoldWarning> {
        let lateral = self
            .lateral
            .step(stick_x, now, deadzone, hold_threshold_secs)
            .map(|direction| HoldWarning {
                axis: HeldAxis::Lateral,
                direction,
            });
        let longitudinal = self
            .longitudinal
            .step(stick_y, now, deadzone, hold_threshold_secs)
            .map(|direction| HoldWarning {
                axis: HeldAxis::Longitudinal,
                direction,
            });

        lateral.into_iter().chain(longitudinal).collect()
    }

    pub fn state(&self, axis: HeldAxis) -> &AxisHoldState {
        match axis {
            HeldAxis::Lateral => &self.lateral,
            HeldAxis::Longitudinal => &self.longitudinal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const DEADZONE: f32 = 0.3;
    const THRESHOLD: f64 = 5.0;

    fn at(base: DateTime<Local>, secs: i64) -> DateTime<Local> {
        base + Duration::seconds(secs)
    }

    #[test]
    fn sustained_right_strafe_warns_after_threshold() {
        let base = Local::now();
        let mut monitor = HoldMonitor::new();

        for t in 0..=5 {
            let out = monitor.evaluate(0.5, 0.0, at(base, t), DEADZONE, THRESHOLD);
            assert!(out.is_empty(), "unexpected warning at t={t}: {out:?}");
        }
        let out = monitor.evaluate(0.5, 0.0, at(base, 6), DEADZONE, THRESHOLD);
        assert_eq!(out, vec!["HOLDING RIGHT STRAFE TOO LONG".to_string()]);
    }

    #[test]
    fn oscillating_stick_never_warns() {
        let base = Local::now();
        let mut monitor = HoldMonitor::new();

        for t in 0..30 {
            let x = if t % 2 == 0 { 0.5 } else { -0.5 };
            assert!(monitor
                .evaluate(x, 0.0, at(base, t), DEADZONE, THRESHOLD)
                .is_empty());
        }
    }

    #[test]
    fn returning_to_neutral_restarts_the_timer() {
        let base = Local::now();
        let mut monitor = HoldMonitor::new();

        for t in 0..=6 {
            monitor.evaluate(0.5, 0.0, at(base, t), DEADZONE, THRESHOLD);
        }
        assert!(monitor
            .evaluate(0.1, 0.0, at(base, 7), DEADZONE, THRESHOLD)
            .is_empty());
        assert_eq!(*monitor.state(HeldAxis::Lateral), AxisHoldState::Idle);

        for t in 8..=13 {
            assert!(monitor
                .evaluate(0.5, 0.0, at(base, t), DEADZONE, THRESHOLD)
                .is_empty());
        }
        assert_eq!(
            monitor.evaluate(0.5, 0.0, at(base, 14), DEADZONE, THRESHOLD),
            vec!["HOLDING RIGHT STRAFE TOO LONG".to_string()]
        );
    }

    #[test]
    fn forward_and_backward_labels() {
        let base = Local::now();

        let mut monitor = HoldMonitor::new();
        monitor.evaluate(0.0, -0.5, base, DEADZONE, THRESHOLD);
        assert_eq!(
            monitor.evaluate(0.0, -0.5, at(base, 6), DEADZONE, THRESHOLD),
            vec!["HOLDING FORWARD TOO LONG".to_string()]
        );

        let mut monitor = HoldMonitor::new();
        monitor.evaluate(0.0, 0.5, base, DEADZONE, THRESHOLD);
        assert_eq!(
            monitor.evaluate(0.0, 0.5, at(base, 6), DEADZONE, THRESHOLD),
            vec!["HOLDING BACKWARD TOO LONG".to_string()]
        );
    }

    #[test]
    fn left_strafe_label() {
        let base = Local::now();
        let mut monitor = HoldMonitor::new();
        monitor.evaluate(-0.9, 0.0, base, DEADZONE, THRESHOLD);
        assert_eq!(
            monitor.evaluate(-0.9, 0.0, at(base, 10), DEADZONE, THRESHOLD),
            vec!["HOLDING LEFT STRAFE TOO LONG".to_string()]
        );
    }

    #[test]
    fn both_axes_report_x_first() {
        let base = Local::now();
        let mut monitor = HoldMonitor::new();
        monitor.evaluate(-0.6, 0.6, base, DEADZONE, THRESHOLD);
        assert_eq!(
            monitor.evaluate(-0.6, 0.6, at(base, 6), DEADZONE, THRESHOLD),
            vec![
                "HOLDING LEFT STRAFE TOO LONG".to_string(),
                "HOLDING BACKWARD TOO LONG".to_string(),
            ]
        );
    }

    #[test]
    fn threshold_comparison_is_strict() {
        let base = Local::now();
        let mut monitor = HoldMonitor::new();
        monitor.evaluate(0.5, 0.0, base, DEADZONE, THRESHOLD);

        assert!(monitor
            .evaluate(0.5, 0.0, at(base, 5), DEADZONE, THRESHOLD)
            .is_empty());
        let just_after = at(base, 5) + Duration::milliseconds(1);
        assert_eq!(
            monitor.evaluate(0.5, 0.0, just_after, DEADZONE, THRESHOLD).len(),
            1
        );
    }

    #[test]
    fn repeated_evaluation_at_same_instant_is_idempotent() {
        let base = Local::now();
        let mut monitor = HoldMonitor::new();

        let first = monitor.evaluate(0.5, -0.5, base, DEADZONE, THRESHOLD);
        let state_after_first = monitor.clone();
        let second = monitor.evaluate(0.5, -0.5, base, DEADZONE, THRESHOLD);

        assert_eq!(first, second);
        assert_eq!(
            monitor.state(HeldAxis::Lateral),
            state_after_first.state(HeldAxis::Lateral)
        );
        assert_eq!(
            monitor.state(HeldAxis::Longitudinal),
            state_after_first.state(HeldAxis::Longitudinal)
        );
        assert_eq!(monitor.state(HeldAxis::Lateral).since(), Some(base));
    }

    #[test]
    fn repeated_evaluation_while_warning_is_idempotent() {
        let base = Local::now();
        let mut monitor = HoldMonitor::new();
        monitor.evaluate(0.5, 0.0, base, DEADZONE, THRESHOLD);

        let expected = vec!["HOLDING RIGHT STRAFE TOO LONG".to_string()];
        let first = monitor.evaluate(0.5, 0.0, at(base, 6), DEADZONE, THRESHOLD);
        let second = monitor.evaluate(0.5, 0.0, at(base, 6), DEADZONE, THRESHOLD);

        assert_eq!(first, expected);
        assert_eq!(second, expected);
        assert_eq!(monitor.state(HeldAxis::Lateral).since(), Some(base));
        assert_eq!(
            monitor.state(HeldAxis::Lateral).direction(),
            Some(Deflection::Positive)
        );
    }

    #[test]
    fn reversal_restarts_hold() {
        let base = Local::now();
        let mut monitor = HoldMonitor::new();
        monitor.evaluate(0.5, 0.0, base, DEADZONE, THRESHOLD);
        monitor.evaluate(-0.5, 0.0, at(base, 4), DEADZONE, THRESHOLD);

        let state = monitor.state(HeldAxis::Lateral);
        assert_eq!(state.direction(), Some(Deflection::Negative));
        assert_eq!(state.since(), Some(at(base, 4)));
        assert!(monitor
            .evaluate(-0.5, 0.0, at(base, 8), DEADZONE, THRESHOLD)
            .is_empty());
    }

    #[test]
    fn axes_are_tracked_independently() {
        let base = Local::now();
        let mut monitor = HoldMonitor::new();
        monitor.evaluate(0.5, 0.0, base, DEADZONE, THRESHOLD);
        monitor.evaluate(0.5, -0.5, at(base, 3), DEADZONE, THRESHOLD);

        assert_eq!(monitor.state(HeldAxis::Lateral).since(), Some(base));
        assert_eq!(
            monitor.state(HeldAxis::Longitudinal).since(),
            Some(at(base, 3))
        );
        assert_eq!(
            monitor.evaluate(0.5, -0.5, at(base, 6), DEADZONE, THRESHOLD),
            vec!["HOLDING RIGHT STRAFE TOO LONG".to_string()]
        );
    }

    #[test]
    fn config_change_mid_hold_keeps_timer() {
        let base = Local::now();
        let mut monitor = HoldMonitor::new();
        monitor.evaluate(0.5, 0.0, base, DEADZONE, THRESHOLD);
        assert!(monitor.evaluate(0.5, 0.0, at(base, 3), 0.2, 10.0).is_empty());
        assert_eq!(monitor.evaluate(0.5, 0.0, at(base, 4), 0.2, 2.0).len(), 1);
        assert_eq!(monitor.state(HeldAxis::Lateral).since(), Some(base));
    }

    #[test]
    fn deadzone_edge_is_neutral() {
        assert_eq!(Deflection::classify(0.3, 0.3), None);
        assert_eq!(Deflection::classify(-0.3, 0.3), None);
        assert_eq!(Deflection::classify(0.31, 0.3), Some(Deflection::Positive));
        assert_eq!(Deflection::classify(-0.31, 0.3), Some(Deflection::Negative));
    }

    #[test]
    fn idle_state_has_no_start_time() {
        let monitor = HoldMonitor::new();
        for axis in [HeldAxis::Lateral, HeldAxis::Longitudinal] {
            assert_eq!(monitor.state(axis).direction(), None);
            assert_eq!(monitor.state(axis).since(), None);
        }
    }
}
