//! Click counting and drag detection
//!
//! Decoration code and GUI widgets should consume [`ClickAndDragClassifier`]
//! instead of reimplementing press/click bookkeeping. Hit-testing stays with
//! the caller.

use serde::{Deserialize, Serialize};

use crate::config::ClickConfig;
use crate::protocol::{PointerButton, SurfaceId, Timestamp};

/// The most recent button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PressRecord {
    pub surface: SurfaceId,
    pub timestamp: Timestamp,
    pub click_count: u32,
    pub button: PointerButton,
    /// Logical position of the press
    pub x: i32,
    pub y: i32,
    /// The matching release has been seen
    pub released: bool,
    /// Motion since the press exceeded the drag threshold
    pub dragging: bool,
}

/// A press about to be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressInput {
    pub surface: SurfaceId,
    pub button: PointerButton,
    pub timestamp: Timestamp,
    pub x: i32,
    pub y: i32,
}

/// What a release amounts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseOutcome {
    pub click_count: u32,
    /// A click event should follow the release
    pub clicked: bool,
    pub record: Option<PressRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickAndDragClassifier {
    multi_click_time_ms: u32,
    drag_threshold_px: i32,
    position_tolerance_px: i32,
}

impl Default for ClickAndDragClassifier {
    fn default() -> Self {
        Self::new(&ClickConfig::default())
    }
}

impl ClickAndDragClassifier {
    pub fn new(config: &ClickConfig) -> Self {
        Self {
            multi_click_time_ms: config.multi_click_time_ms,
            drag_threshold_px: config.drag_threshold_px as i32,
            position_tolerance_px: config.click_position_tolerance_px as i32,
        }
    }

    pub fn multi_click_time_ms(&self) -> u32 {
        self.multi_click_time_ms
    }

    /// Record a new press, continuing the click sequence when it qualifies.
    ///
    /// The count only grows for a release-then-press of the same button on
    /// the same surface, within the multi-click window and position tolerance.
    pub fn press(&self, previous: Option<&PressRecord>, input: PressInput) -> PressRecord {
        let click_count = match previous {
            Some(prev) if self.continues_sequence(prev, &input) => prev.click_count + 1,
            _ => 1,
        };

        PressRecord {
            surface: input.surface,
            timestamp: input.timestamp,
            click_count,
            button: input.button,
            x: input.x,
            y: input.y,
            released: false,
            dragging: false,
        }
    }

    /// Classify a release of `button` on `surface`.
    ///
    /// A release that does not match the current press is treated as if the
    /// button had been pressed silently: click count 1, no click, record kept.
    pub fn release(
        &self,
        current: Option<&PressRecord>,
        surface: SurfaceId,
        button: PointerButton,
    ) -> ReleaseOutcome {
        match current {
            Some(record) if record.button == button && record.surface == surface && !record.released => {
                let updated = PressRecord {
                    released: true,
                    ..*record
                };
                ReleaseOutcome {
                    click_count: record.click_count,
                    clicked: !record.dragging,
                    record: Some(updated),
                }
            }
            _ => ReleaseOutcome {
                click_count: 1,
                clicked: false,
                record: current.copied(),
            },
        }
    }

    /// Update the drag flag of a held press after pointer motion.
    pub fn motion(&self, current: Option<&PressRecord>, x: i32, y: i32) -> Option<PressRecord> {
        let record = current?;
        if record.released || record.dragging {
            return Some(*record);
        }
        Some(PressRecord {
            dragging: self.is_significant_drag_distance((record.x, record.y), (x, y)),
            ..*record
        })
    }

    /// True once either axis moved strictly further than the drag threshold.
    pub fn is_significant_drag_distance(&self, from: (i32, i32), to: (i32, i32)) -> bool {
        let dx = (to.0 - from.0).abs();
        let dy = (to.1 - from.1).abs();
        dx > self.drag_threshold_px || dy > self.drag_threshold_px
    }

    fn continues_sequence(&self, prev: &PressRecord, input: &PressInput) -> bool {
        let same_button = prev.button == input.button;
        let same_surface = prev.surface == input.surface;
        let quick = input.timestamp.wrapping_sub(prev.timestamp) <= self.multi_click_time_ms;
        let close = (input.x - prev.x).abs() <= self.position_tolerance_px
            && (input.y - prev.y).abs() <= self.position_tolerance_px;
        prev.released && same_button && same_surface && quick && close
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const S: SurfaceId = SurfaceId(1);

    fn input(button: PointerButton, timestamp: Timestamp, x: i32, y: i32) -> PressInput {
        PressInput {
            surface: S,
            button,
            timestamp,
            x,
            y,
        }
    }

    fn press_release(
        classifier: &ClickAndDragClassifier,
        prev: Option<&PressRecord>,
        press: PressInput,
    ) -> PressRecord {
        let pressed = classifier.press(prev, press);
        classifier
            .release(Some(&pressed), press.surface, press.button)
            .record
            .unwrap()
    }

    #[test]
    fn test_double_click_within_window() {
        let classifier = ClickAndDragClassifier::default();
        let first = press_release(&classifier, None, input(PointerButton::Left, 1000, 5, 5));
        let second = classifier.press(Some(&first), input(PointerButton::Left, 1100, 5, 5));
        assert_eq!(second.click_count, 2);
    }

    #[test]
    fn test_click_outside_window_restarts() {
        let classifier = ClickAndDragClassifier::default();
        let first = press_release(&classifier, None, input(PointerButton::Left, 1000, 5, 5));
        let second = classifier.press(Some(&first), input(PointerButton::Left, 1600, 5, 5));
        assert_eq!(second.click_count, 1);
    }

    #[test]
    fn test_click_elsewhere_restarts() {
        let classifier = ClickAndDragClassifier::default();
        let first = press_release(&classifier, None, input(PointerButton::Left, 1000, 5, 5));
        let second = classifier.press(Some(&first), input(PointerButton::Left, 1100, 55, 5));
        assert_eq!(second.click_count, 1);
    }

    #[test]
    fn test_position_tolerance_is_tunable() {
        let config = ClickConfig {
            click_position_tolerance_px: 3,
            ..ClickConfig::default()
        };
        let classifier = ClickAndDragClassifier::new(&config);
        let first = press_release(&classifier, None, input(PointerButton::Left, 0, 5, 5));
        let second = classifier.press(Some(&first), input(PointerButton::Left, 10, 8, 2));
        assert_eq!(second.click_count, 2);
    }

    #[test]
    fn test_different_button_restarts() {
        let classifier = ClickAndDragClassifier::default();
        let first = press_release(&classifier, None, input(PointerButton::Left, 0, 5, 5));
        let second = classifier.press(Some(&first), input(PointerButton::Right, 10, 5, 5));
        assert_eq!(second.click_count, 1);
    }

    #[test]
    fn test_press_without_release_restarts() {
        let classifier = ClickAndDragClassifier::default();
        let first = classifier.press(None, input(PointerButton::Left, 0, 5, 5));
        let second = classifier.press(Some(&first), input(PointerButton::Left, 10, 5, 5));
        assert_eq!(second.click_count, 1);
    }

    #[test]
    fn test_timestamp_wraparound_counts_as_quick() {
        let classifier = ClickAndDragClassifier::default();
        let first = press_release(&classifier, None, input(PointerButton::Left, u32::MAX - 10, 0, 0));
        let second = classifier.press(Some(&first), input(PointerButton::Left, 20, 0, 0));
        assert_eq!(second.click_count, 2);
    }

    #[test]
    fn test_unmatched_release_is_single_click_without_click_event() {
        let classifier = ClickAndDragClassifier::default();
        let outcome = classifier.release(None, S, PointerButton::Middle);
        assert_eq!(outcome.click_count, 1);
        assert!(!outcome.clicked);
        assert!(outcome.record.is_none());
    }

    #[test]
    fn test_drag_suppresses_click() {
        let classifier = ClickAndDragClassifier::default();
        let pressed = classifier.press(None, input(PointerButton::Left, 0, 10, 10));
        let moved = classifier.motion(Some(&pressed), 12, 11).unwrap();
        assert!(!moved.dragging);
        let dragged = classifier.motion(Some(&moved), 20, 10).unwrap();
        assert!(dragged.dragging);
        // Coming back does not undo the drag.
        let back = classifier.motion(Some(&dragged), 10, 10).unwrap();
        assert!(back.dragging);
        let outcome = classifier.release(Some(&back), S, PointerButton::Left);
        assert!(!outcome.clicked);
    }

    #[test]
    fn test_drag_threshold_is_exclusive() {
        let classifier = ClickAndDragClassifier::default();
        assert!(!classifier.is_significant_drag_distance((0, 0), (4, -4)));
        assert!(classifier.is_significant_drag_distance((0, 0), (0, 5)));
    }
}
