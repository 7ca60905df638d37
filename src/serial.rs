//! Serial selection for privileged window requests
//!
//! Compositors only honour move, resize, menu and activation requests that
//! present the serial of a recent user gesture. [`SerialAuthorizer`] picks
//! that serial out of an [`InputState`]; a zero serial means the request is
//! not issued at all.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::input::InputState;
use crate::protocol::Serial;

/// A request that needs proof of a user gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// `xdg_toplevel.move`
    Move,
    /// `xdg_toplevel.resize`
    Resize,
    /// `xdg_toplevel.show_window_menu`
    ShowMenu,
    /// `xdg_activation_v1` token request
    Activate,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestKind::Move => "move",
            RequestKind::Resize => "resize",
            RequestKind::ShowMenu => "show-menu",
            RequestKind::Activate => "activate",
        };
        f.write_str(name)
    }
}

/// Which recorded serial a candidate refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialKind {
    PointerButton,
    Key,
    KeyboardEnter,
}

impl SerialKind {
    fn read(self, state: &InputState) -> Serial {
        match self {
            SerialKind::PointerButton => state.pointer_button_serial(),
            SerialKind::Key => state.key_serial(),
            SerialKind::KeyboardEnter => state.keyboard_enter_serial(),
        }
    }
}

/// Anything that can hand out a serial for a privileged request.
pub trait SerialSource {
    /// The serial to present for `kind`, or `None` if the request must not be sent.
    fn select_serial_for(&self, kind: RequestKind) -> Option<Serial>;
}

/// Serial selection policy.
///
/// Pointer-driven requests (move, resize, menu) can only be justified by a
/// button press. Activation takes the first non-zero serial among pointer
/// button, key and keyboard enter, so losing keyboard focus does not change
/// the answer while a button serial is still valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerialAuthorizer;

impl SerialAuthorizer {
    pub fn new() -> Self {
        Self
    }

    /// Candidate serials for `kind`, most preferred first.
    pub fn candidates(&self, kind: RequestKind) -> &'static [SerialKind] {
        match kind {
            RequestKind::Move | RequestKind::Resize | RequestKind::ShowMenu => {
                &[SerialKind::PointerButton]
            }
            RequestKind::Activate => &[
                SerialKind::PointerButton,
                SerialKind::Key,
                SerialKind::KeyboardEnter,
            ],
        }
    }

    pub fn select(&self, state: &InputState, kind: RequestKind) -> Option<Serial> {
        self.candidates(kind)
            .iter()
            .map(|candidate| candidate.read(state))
            .find(|&serial| serial != 0)
    }
}

impl SerialSource for InputState {
    fn select_serial_for(&self, kind: RequestKind) -> Option<Serial> {
        SerialAuthorizer.select(self, kind)
    }
}
