//! Presence-checked input fragments
//!
//! A [`PointerFragment`] accumulates one or more `wl_pointer` notifications
//! that arrived before a `frame` event. Not every part is present in every
//! fragment, so every getter returns an `Option` and the `has_*` predicates
//! tell which fields are valid. A missing coordinate is never read as `0`,
//! since `0` is a perfectly good coordinate.

use serde::{Deserialize, Serialize};

use super::codes::{AxisSource, ScrollAxis};
use super::{Serial, SurfaceId, Timestamp};
use crate::input::Modifiers;

/// `wl_pointer.enter`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnterPart {
    pub surface: SurfaceId,
    pub serial: Serial,
    /// Surface-local position in protocol units
    pub x: f64,
    pub y: f64,
}

/// `wl_pointer.leave`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeavePart {
    pub surface: SurfaceId,
    pub serial: Serial,
}

/// `wl_pointer.motion`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionPart {
    pub time: Timestamp,
    pub x: f64,
    pub y: f64,
}

/// `wl_pointer.button`; the code is kept raw so unknown buttons can be skipped later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonPart {
    pub serial: Serial,
    pub time: Timestamp,
    pub code: u32,
    pub pressed: bool,
}

/// Scroll information for a single raw axis id within one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisSample {
    /// Raw `wl_pointer.axis` id
    pub axis: u32,
    /// Length of the scroll vector in protocol units
    pub value: Option<f64>,
    /// Scroll distance in 1/120ths of a wheel detent
    pub value120: Option<i32>,
    /// `wl_pointer.axis_stop` was received for this axis
    pub stop: bool,
}

impl AxisSample {
    pub fn new(axis: u32) -> Self {
        Self {
            axis,
            value: None,
            value120: None,
            stop: false,
        }
    }

    pub fn scroll_axis(&self) -> Option<ScrollAxis> {
        ScrollAxis::from_raw(self.axis)
    }

    pub fn has_delta(&self) -> bool {
        self.value.is_some() || self.value120.is_some()
    }
}

/// All axis notifications of one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisPart {
    pub time: Option<Timestamp>,
    pub source: Option<AxisSource>,
    pub samples: Vec<AxisSample>,
}

impl AxisPart {
    /// Sample for a known axis, if the frame carried one.
    pub fn sample(&self, axis: ScrollAxis) -> Option<&AxisSample> {
        self.samples.iter().find(|s| s.scroll_axis() == Some(axis))
    }

    pub(crate) fn sample_mut(&mut self, axis: u32) -> &mut AxisSample {
        if let Some(pos) = self.samples.iter().position(|s| s.axis == axis) {
            &mut self.samples[pos]
        } else {
            self.samples.push(AxisSample::new(axis));
            let last = self.samples.len() - 1;
            &mut self.samples[last]
        }
    }

    /// True if at least one sample refers to an axis we understand.
    pub fn has_known_axis(&self) -> bool {
        self.samples.iter().any(|s| s.scroll_axis().is_some())
    }
}

/// One pointer "frame" worth of protocol information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointerFragment {
    pub(crate) enter: Option<EnterPart>,
    pub(crate) leave: Option<LeavePart>,
    pub(crate) motion: Option<MotionPart>,
    pub(crate) button: Option<ButtonPart>,
    pub(crate) axis: Option<AxisPart>,
}

impl PointerFragment {
    pub fn enter(surface: SurfaceId, serial: Serial, x: f64, y: f64) -> Self {
        Self {
            enter: Some(EnterPart {
                surface,
                serial,
                x,
                y,
            }),
            ..Self::default()
        }
    }

    pub fn leave(surface: SurfaceId, serial: Serial) -> Self {
        Self {
            leave: Some(LeavePart { surface, serial }),
            ..Self::default()
        }
    }

    pub fn motion(time: Timestamp, x: f64, y: f64) -> Self {
        Self {
            motion: Some(MotionPart { time, x, y }),
            ..Self::default()
        }
    }

    pub fn button(serial: Serial, time: Timestamp, code: u32, pressed: bool) -> Self {
        Self {
            button: Some(ButtonPart {
                serial,
                time,
                code,
                pressed,
            }),
            ..Self::default()
        }
    }

    /// Continuous (vector) scroll on a raw axis id.
    pub fn axis(time: Timestamp, axis: u32, value: f64) -> Self {
        let mut part = AxisPart {
            time: Some(time),
            ..AxisPart::default()
        };
        part.sample_mut(axis).value = Some(value);
        Self {
            axis: Some(part),
            ..Self::default()
        }
    }

    /// Wheel scroll expressed in 1/120ths of a detent, with its vector length.
    pub fn axis_value120(time: Timestamp, axis: u32, value: f64, value120: i32) -> Self {
        let mut part = AxisPart {
            time: Some(time),
            source: Some(AxisSource::Wheel),
            ..AxisPart::default()
        };
        let sample = part.sample_mut(axis);
        sample.value = Some(value);
        sample.value120 = Some(value120);
        Self {
            axis: Some(part),
            ..Self::default()
        }
    }

    pub fn axis_stop(time: Timestamp, axis: u32) -> Self {
        let mut part = AxisPart {
            time: Some(time),
            ..AxisPart::default()
        };
        part.sample_mut(axis).stop = true;
        Self {
            axis: Some(part),
            ..Self::default()
        }
    }

    pub fn has_enter_event(&self) -> bool {
        self.enter.is_some()
    }

    pub fn has_leave_event(&self) -> bool {
        self.leave.is_some()
    }

    pub fn has_motion_event(&self) -> bool {
        self.motion.is_some()
    }

    pub fn has_button_event(&self) -> bool {
        self.button.is_some()
    }

    pub fn has_axis_event(&self) -> bool {
        self.axis.is_some()
    }

    /// True if the surface field is valid (enter or leave).
    pub fn has_surface(&self) -> bool {
        self.has_enter_event() || self.has_leave_event()
    }

    /// True if a serial is valid (enter, leave or button).
    pub fn has_serial(&self) -> bool {
        self.has_enter_event() || self.has_leave_event() || self.has_button_event()
    }

    /// True if a timestamp is valid (motion or button).
    pub fn has_timestamp(&self) -> bool {
        self.has_motion_event() || self.has_button_event()
    }

    /// True if surface-local coordinates are valid (motion or enter).
    pub fn has_coordinates(&self) -> bool {
        self.has_motion_event() || self.has_enter_event()
    }

    pub fn is_empty(&self) -> bool {
        !(self.has_surface() || self.has_motion_event() || self.has_button_event() || self.has_axis_event())
    }

    pub fn enter_part(&self) -> Option<&EnterPart> {
        self.enter.as_ref()
    }

    pub fn leave_part(&self) -> Option<&LeavePart> {
        self.leave.as_ref()
    }

    pub fn motion_part(&self) -> Option<&MotionPart> {
        self.motion.as_ref()
    }

    pub fn button_part(&self) -> Option<&ButtonPart> {
        self.button.as_ref()
    }

    pub fn axis_part(&self) -> Option<&AxisPart> {
        self.axis.as_ref()
    }

    /// Surface named by the fragment. Enter wins over leave.
    pub fn surface(&self) -> Option<SurfaceId> {
        self.enter
            .map(|e| e.surface)
            .or_else(|| self.leave.map(|l| l.surface))
    }

    pub fn timestamp(&self) -> Option<Timestamp> {
        self.button
            .map(|b| b.time)
            .or_else(|| self.motion.map(|m| m.time))
    }

    /// Latest valid position: motion if present, enter otherwise.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.motion
            .map(|m| (m.x, m.y))
            .or_else(|| self.enter.map(|e| (e.x, e.y)))
    }

    /// A copy without the button part, used when the button code is unknown.
    pub(crate) fn without_button(&self) -> Self {
        Self {
            button: None,
            ..self.clone()
        }
    }
}

/// `wl_keyboard` notifications. Each one stands alone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KeyboardFragment {
    Enter {
        surface: SurfaceId,
        serial: Serial,
    },
    Leave {
        surface: SurfaceId,
        serial: Serial,
    },
    Key {
        serial: Serial,
        time: Timestamp,
        /// evdev key code
        code: u32,
        /// Unicode code point produced by the key, if the keymap yields one
        codepoint: Option<u32>,
        pressed: bool,
    },
    Modifiers {
        serial: Serial,
        /// Keyboard modifier bits only; pointer bits are ignored
        mask: Modifiers,
    },
}

impl KeyboardFragment {
    pub fn surface(&self) -> Option<SurfaceId> {
        match self {
            KeyboardFragment::Enter { surface, .. } | KeyboardFragment::Leave { surface, .. } => {
                Some(*surface)
            }
            _ => None,
        }
    }

    pub fn serial(&self) -> Serial {
        match self {
            KeyboardFragment::Enter { serial, .. }
            | KeyboardFragment::Leave { serial, .. }
            | KeyboardFragment::Key { serial, .. }
            | KeyboardFragment::Modifiers { serial, .. } => *serial,
        }
    }
}

/// Anything the state machine accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFragment {
    Pointer(PointerFragment),
    Keyboard(KeyboardFragment),
}

impl InputFragment {
    pub fn as_pointer(&self) -> Option<&PointerFragment> {
        match self {
            InputFragment::Pointer(p) => Some(p),
            InputFragment::Keyboard(_) => None,
        }
    }

    pub fn as_keyboard(&self) -> Option<&KeyboardFragment> {
        match self {
            InputFragment::Keyboard(k) => Some(k),
            InputFragment::Pointer(_) => None,
        }
    }

    /// Surface explicitly referenced by the fragment, if any.
    pub fn surface(&self) -> Option<SurfaceId> {
        match self {
            InputFragment::Pointer(p) => p.surface(),
            InputFragment::Keyboard(k) => k.surface(),
        }
    }
}

impl From<PointerFragment> for InputFragment {
    fn from(fragment: PointerFragment) -> Self {
        InputFragment::Pointer(fragment)
    }
}

impl From<KeyboardFragment> for InputFragment {
    fn from(fragment: KeyboardFragment) -> Self {
        InputFragment::Keyboard(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leave_only_fragment_has_no_coordinates() {
        let fragment = PointerFragment::leave(SurfaceId(7), 3);
        assert!(fragment.has_surface());
        assert!(fragment.has_serial());
        assert!(!fragment.has_timestamp());
        assert!(!fragment.has_coordinates());
        assert_eq!(fragment.coordinates(), None);
        assert_eq!(fragment.timestamp(), None);
    }

    #[test]
    fn test_enter_carries_zero_coordinates() {
        let fragment = PointerFragment::enter(SurfaceId(1), 5, 0.0, 0.0);
        assert!(fragment.has_coordinates());
        assert_eq!(fragment.coordinates(), Some((0.0, 0.0)));
        assert!(!fragment.has_timestamp());
    }

    #[test]
    fn test_motion_coordinates_win_over_enter() {
        let mut fragment = PointerFragment::enter(SurfaceId(1), 5, 1.0, 1.0);
        fragment.motion = Some(MotionPart {
            time: 9,
            x: 3.0,
            y: 4.0,
        });
        assert_eq!(fragment.coordinates(), Some((3.0, 4.0)));
        assert_eq!(fragment.timestamp(), Some(9));
    }

    #[test]
    fn test_button_fragment_presence() {
        let fragment = PointerFragment::button(11, 100, 0x110, true);
        assert!(fragment.has_serial());
        assert!(fragment.has_timestamp());
        assert!(!fragment.has_surface());
        assert!(!fragment.has_coordinates());
        assert_eq!(fragment.surface(), None);
    }

    #[test]
    fn test_axis_part_merges_samples_per_axis() {
        let mut part = AxisPart::default();
        part.sample_mut(0).value = Some(1.0);
        part.sample_mut(1).value = Some(2.0);
        part.sample_mut(0).stop = true;
        assert_eq!(part.samples.len(), 2);
        let vertical = part.sample(ScrollAxis::Vertical).unwrap();
        assert!(vertical.stop);
        assert_eq!(vertical.value, Some(1.0));
    }

    #[test]
    fn test_unknown_axis_is_not_known() {
        let fragment = PointerFragment::axis(1, 5, 1.0);
        assert!(fragment.has_axis_event());
        assert!(!fragment.axis_part().unwrap().has_known_axis());
    }

    #[test]
    fn test_keyboard_surface_only_for_focus_changes() {
        let enter = KeyboardFragment::Enter {
            surface: SurfaceId(2),
            serial: 1,
        };
        let key = KeyboardFragment::Key {
            serial: 2,
            time: 0,
            code: 30,
            codepoint: Some('a' as u32),
            pressed: true,
        };
        assert_eq!(enter.surface(), Some(SurfaceId(2)));
        assert_eq!(key.surface(), None);
        assert_eq!(key.serial(), 2);
    }
}
