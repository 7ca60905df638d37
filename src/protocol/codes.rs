//! Button and axis codes as they appear on the wire

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::input::Modifiers;

/// Pointer buttons we understand, keyed by their `<linux/input-event-codes.h>` code.
///
/// Anything else the compositor sends is ignored by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    Left,
    Right,
    Middle,
    // Most mice report BTN_SIDE for backward and BTN_EXTRA for forward.
    Side,
    Extra,
    Forward,
    Back,
}

impl PointerButton {
    pub const ALL: [PointerButton; 7] = [
        PointerButton::Left,
        PointerButton::Right,
        PointerButton::Middle,
        PointerButton::Side,
        PointerButton::Extra,
        PointerButton::Forward,
        PointerButton::Back,
    ];

    /// Resolve a raw button code, `None` for codes we do not know.
    pub fn from_linux_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.linux_code() == code)
    }

    pub fn linux_code(self) -> u32 {
        match self {
            PointerButton::Left => 0x110,
            PointerButton::Right => 0x111,
            PointerButton::Middle => 0x112,
            PointerButton::Side => 0x113,
            PointerButton::Extra => 0x114,
            PointerButton::Forward => 0x115,
            PointerButton::Back => 0x116,
        }
    }

    /// Modifier bit reflecting that this button is held down.
    pub fn mask(self) -> Modifiers {
        match self {
            PointerButton::Left => Modifiers::BUTTON_LEFT,
            PointerButton::Right => Modifiers::BUTTON_RIGHT,
            PointerButton::Middle => Modifiers::BUTTON_MIDDLE,
            PointerButton::Side => Modifiers::BUTTON_SIDE,
            PointerButton::Extra => Modifiers::BUTTON_EXTRA,
            PointerButton::Forward => Modifiers::BUTTON_FORWARD,
            PointerButton::Back => Modifiers::BUTTON_BACK,
        }
    }

    // TODO: make this configurable for left-handed setups
    pub fn is_popup_trigger(self) -> bool {
        self == PointerButton::Right
    }
}

impl fmt::Display for PointerButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PointerButton::Left => "left",
            PointerButton::Right => "right",
            PointerButton::Middle => "middle",
            PointerButton::Side => "side",
            PointerButton::Extra => "extra",
            PointerButton::Forward => "forward",
            PointerButton::Back => "back",
        };
        f.write_str(name)
    }
}

/// `wl_pointer.axis` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollAxis {
    Vertical,
    Horizontal,
}

impl ScrollAxis {
    pub fn from_raw(axis: u32) -> Option<Self> {
        match axis {
            0 => Some(ScrollAxis::Vertical),
            1 => Some(ScrollAxis::Horizontal),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            ScrollAxis::Vertical => 0,
            ScrollAxis::Horizontal => 1,
        }
    }
}

/// `wl_pointer.axis_source` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisSource {
    Wheel,
    Finger,
    Continuous,
    WheelTilt,
}

impl AxisSource {
    pub fn from_raw(source: u32) -> Option<Self> {
        match source {
            0 => Some(AxisSource::Wheel),
            1 => Some(AxisSource::Finger),
            2 => Some(AxisSource::Continuous),
            3 => Some(AxisSource::WheelTilt),
            _ => None,
        }
    }
}
