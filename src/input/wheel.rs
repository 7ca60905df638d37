//! Wheel rotation accumulation
//!
//! Turns raw scroll deltas into whole "rotations". Sub-rotation input is
//! carried over to the next event instead of being truncated away, so a slow
//! touchpad swipe eventually scrolls.

use log::trace;
use serde::{Deserialize, Serialize};

use super::Modifiers;
use crate::config::WheelConfig;
use crate::protocol::{AxisPart, ScrollAxis};

/// Raw scroll input for one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WheelInput {
    /// Continuous vector length (touchpads)
    Vector(f64),
    /// Wheel steps in 1/120ths of a detent
    Notches(i32),
}

/// Result of feeding one input to an accumulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelStep {
    pub rotation: i32,
    pub precise: f64,
    pub scroll_amount: u32,
}

impl WheelStep {
    fn magnitude(&self) -> i64 {
        (self.scroll_amount as i64 * self.rotation as i64).abs()
    }
}

/// Per-axis fractional and notch remainders.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WheelAccumulator {
    fractional_remainder: f64,
    notch_remainder: i32,
}

impl WheelAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fractional_remainder(&self) -> f64 {
        self.fractional_remainder
    }

    pub fn notch_remainder(&self) -> i32 {
        self.notch_remainder
    }

    /// Add `input`, returning the new accumulator and the whole rotations it yields.
    pub fn accumulate(self, input: WheelInput, config: &WheelConfig) -> (Self, WheelStep) {
        match input {
            WheelInput::Vector(delta) => {
                let raw = delta * config.vector_rotation_factor;
                let total = self.fractional_remainder + raw;
                let rotation = total.trunc();
                let next = Self {
                    fractional_remainder: total - rotation,
                    ..self
                };
                let step = WheelStep {
                    rotation: rotation as i32,
                    precise: raw,
                    scroll_amount: config.vector_scroll_amount,
                };
                (next, step)
            }
            WheelInput::Notches(value120) => {
                let per_rotation = i64::from(config.notches_per_rotation.max(1));
                // Widened so a wire value near i32::MAX cannot overflow the carry.
                let total = i64::from(self.notch_remainder) + i64::from(value120);
                let next = Self {
                    notch_remainder: (total % per_rotation) as i32,
                    ..self
                };
                let rotation = (total / per_rotation).clamp(i64::from(i32::MIN), i64::from(i32::MAX));
                let step = WheelStep {
                    rotation: rotation as i32,
                    precise: f64::from(value120) / per_rotation as f64,
                    scroll_amount: config.notch_scroll_amount,
                };
                (next, step)
            }
        }
    }
}

/// Accumulators for both axes of one pointer/surface pairing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollState {
    pub vertical: WheelAccumulator,
    pub horizontal: WheelAccumulator,
}

impl ScrollState {
    pub fn axis(&self, axis: ScrollAxis) -> &WheelAccumulator {
        match axis {
            ScrollAxis::Vertical => &self.vertical,
            ScrollAxis::Horizontal => &self.horizontal,
        }
    }

    fn with_axis(self, axis: ScrollAxis, acc: WheelAccumulator) -> Self {
        match axis {
            ScrollAxis::Vertical => Self {
                vertical: acc,
                ..self
            },
            ScrollAxis::Horizontal => Self {
                horizontal: acc,
                ..self
            },
        }
    }

    /// Feed one frame's axis information.
    ///
    /// Returns the new state and the wheel steps worth an event, vertical
    /// first. With the horizontal-scroll modifier held both axes collapse into
    /// a single horizontal step.
    pub fn apply(
        self,
        part: &AxisPart,
        modifiers: Modifiers,
        config: &WheelConfig,
    ) -> (Self, Vec<(ScrollAxis, WheelStep)>) {
        let mut state = self;
        let mut vertical = None;
        let mut horizontal = None;

        for sample in &part.samples {
            let Some(axis) = sample.scroll_axis() else {
                trace!("ignoring unknown scroll axis {}", sample.axis);
                continue;
            };

            let input = match (sample.value120, sample.value) {
                (Some(value120), _) => Some(WheelInput::Notches(value120)),
                (None, Some(value)) => Some(WheelInput::Vector(value)),
                (None, None) => None,
            };

            if let Some(input) = input {
                let (acc, step) = state.axis(axis).accumulate(input, config);
                state = state.with_axis(axis, acc);
                match axis {
                    ScrollAxis::Vertical => vertical = Some(step),
                    ScrollAxis::Horizontal => horizontal = Some(step),
                }
            }

            if sample.stop {
                state = state.with_axis(axis, WheelAccumulator::new());
            }
        }

        let shifted = !config.horizontal_scroll_modifier.is_empty()
            && modifiers.contains(config.horizontal_scroll_modifier);

        let steps = if shifted {
            merge_horizontal(vertical, horizontal)
                .map(|step| vec![(ScrollAxis::Horizontal, step)])
                .unwrap_or_default()
        } else {
            [(ScrollAxis::Vertical, vertical), (ScrollAxis::Horizontal, horizontal)]
                .into_iter()
                .filter_map(|(axis, step)| step.filter(|s| s.rotation != 0).map(|s| (axis, s)))
                .collect()
        };

        (state, steps)
    }
}

/// Pick the step to report when vertical scrolling is redirected horizontally.
///
/// Same direction: the larger magnitude wins (vertical on a tie). Opposite
/// directions: vertical wins. A vertical step of zero defers to horizontal.
pub fn merge_horizontal(
    vertical: Option<WheelStep>,
    horizontal: Option<WheelStep>,
) -> Option<WheelStep> {
    let vertical = vertical.filter(|s| s.rotation != 0);
    let horizontal = horizontal.filter(|s| s.rotation != 0);
    match (vertical, horizontal) {
        (None, h) => h,
        (Some(v), None) => Some(v),
        (Some(v), Some(h)) => {
            if v.rotation.signum() == h.rotation.signum() && h.magnitude() > v.magnitude() {
                Some(h)
            } else {
                Some(v)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::AxisSample;

    fn unit_config() -> WheelConfig {
        WheelConfig {
            vector_rotation_factor: 1.0,
            ..WheelConfig::default()
        }
    }

    fn step(rotation: i32, scroll_amount: u32) -> WheelStep {
        WheelStep {
            rotation,
            precise: rotation as f64,
            scroll_amount,
        }
    }

    fn vector_part(vertical: Option<f64>, horizontal: Option<f64>) -> AxisPart {
        let mut part = AxisPart::default();
        if let Some(v) = vertical {
            part.samples.push(AxisSample {
                value: Some(v),
                ..AxisSample::new(0)
            });
        }
        if let Some(h) = horizontal {
            part.samples.push(AxisSample {
                value: Some(h),
                ..AxisSample::new(1)
            });
        }
        part
    }

    #[test]
    fn test_sub_rotation_deltas_eventually_rotate() {
        let config = unit_config();
        let mut acc = WheelAccumulator::new();
        let mut rotations = Vec::new();
        for delta in [0.2, 0.1, 0.4, 0.4] {
            let (next, step) = acc.accumulate(WheelInput::Vector(delta), &config);
            acc = next;
            rotations.push(step.rotation);
        }
        assert_eq!(rotations, vec![0, 0, 0, 1]);
        assert!((acc.fractional_remainder() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_negative_vector_rotates_negative() {
        let config = unit_config();
        let (acc, step) = WheelAccumulator::new().accumulate(WheelInput::Vector(-2.5), &config);
        assert_eq!(step.rotation, -2);
        assert!((acc.fractional_remainder() + 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_notches_accumulate_in_120ths() {
        let config = WheelConfig::default();
        let (acc, first) = WheelAccumulator::new().accumulate(WheelInput::Notches(60), &config);
        assert_eq!(first.rotation, 0);
        assert_eq!(acc.notch_remainder(), 60);
        let (acc, second) = acc.accumulate(WheelInput::Notches(90), &config);
        assert_eq!(second.rotation, 1);
        assert_eq!(second.scroll_amount, 3);
        assert_eq!(acc.notch_remainder(), 30);
        assert!((second.precise - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_extreme_notch_values_do_not_overflow() {
        let config = WheelConfig::default();
        let (acc, _) = WheelAccumulator::new().accumulate(WheelInput::Notches(60), &config);
        let (acc, step) = acc.accumulate(WheelInput::Notches(i32::MAX), &config);
        assert_eq!(step.rotation, 17_895_697);
        assert_eq!(acc.notch_remainder(), 67);

        let (acc, _) = WheelAccumulator::new().accumulate(WheelInput::Notches(-60), &config);
        let (acc, step) = acc.accumulate(WheelInput::Notches(i32::MIN), &config);
        assert_eq!(step.rotation, -17_895_697);
        assert_eq!(acc.notch_remainder(), -68);
    }

    #[test]
    fn test_vector_uses_vector_scroll_amount() {
        let config = unit_config();
        let (_, step) = WheelAccumulator::new().accumulate(WheelInput::Vector(1.0), &config);
        assert_eq!(step.scroll_amount, 1);
    }

    #[test]
    fn test_stop_resets_axis() {
        let config = unit_config();
        let (state, _) = ScrollState::default().apply(
            &vector_part(Some(0.7), None),
            Modifiers::empty(),
            &config,
        );
        assert!(state.vertical.fractional_remainder() > 0.6);

        let mut stop = AxisPart::default();
        stop.samples.push(AxisSample {
            stop: true,
            ..AxisSample::new(0)
        });
        let (state, steps) = state.apply(&stop, Modifiers::empty(), &config);
        assert!(steps.is_empty());
        assert_eq!(state.vertical, WheelAccumulator::new());
    }

    #[test]
    fn test_both_axes_emit_vertical_first() {
        let config = unit_config();
        let (_, steps) = ScrollState::default().apply(
            &vector_part(Some(1.0), Some(-2.0)),
            Modifiers::empty(),
            &config,
        );
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].0, ScrollAxis::Vertical);
        assert_eq!(steps[1].0, ScrollAxis::Horizontal);
        assert_eq!(steps[1].1.rotation, -2);
    }

    #[test]
    fn test_shift_redirects_vertical_to_horizontal() {
        let config = unit_config();
        let (_, steps) = ScrollState::default().apply(
            &vector_part(Some(2.0), None),
            Modifiers::SHIFT,
            &config,
        );
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].0, ScrollAxis::Horizontal);
        assert_eq!(steps[0].1.rotation, 2);
    }

    #[test]
    fn test_merge_same_sign_picks_larger() {
        let merged = merge_horizontal(Some(step(1, 3)), Some(step(2, 3))).unwrap();
        assert_eq!(merged.rotation, 2);
        let merged = merge_horizontal(Some(step(2, 3)), Some(step(4, 1))).unwrap();
        assert_eq!(merged.rotation, 2);
    }

    #[test]
    fn test_merge_opposite_sign_prefers_vertical() {
        let merged = merge_horizontal(Some(step(-1, 3)), Some(step(5, 3))).unwrap();
        assert_eq!(merged.rotation, -1);
    }

    #[test]
    fn test_merge_zero_vertical_falls_back() {
        let merged = merge_horizontal(Some(step(0, 3)), Some(step(-3, 3))).unwrap();
        assert_eq!(merged.rotation, -3);
        assert!(merge_horizontal(Some(step(0, 3)), None).is_none());
    }

    #[test]
    fn test_unknown_axis_is_ignored() {
        let config = unit_config();
        let mut part = AxisPart::default();
        part.samples.push(AxisSample {
            value: Some(5.0),
            ..AxisSample::new(7)
        });
        let (state, steps) = ScrollState::default().apply(&part, Modifiers::empty(), &config);
        assert!(steps.is_empty());
        assert_eq!(state, ScrollState::default());
    }
}
