//! Wayland seat protocol fragments
//!
//! This module models what the transport hands us from `wl_pointer` and
//! `wl_keyboard`. Nothing here interprets input; it only describes it.
//!
//! # Overview
//!
//! - **codes**: Linux button codes, scroll axes and axis sources
//! - **fragment**: presence-checked pointer/keyboard fragments consumed by
//!   the input state machine
//! - **wire**: individual protocol notifications and the frame assembler that
//!   groups pointer notifications between two `wl_pointer.frame` events
//!
//! # Usage
//!
//! ```
//! use waynorm::protocol::{FrameAssembler, SurfaceId, WireEvent};
//!
//! let mut assembler = FrameAssembler::new();
//! assert!(assembler
//!     .push(WireEvent::PointerMotion { time: 10, x: 4.0, y: 2.5 })
//!     .is_none());
//!
//! let fragment = assembler.push(WireEvent::PointerFrame).unwrap();
//! assert!(fragment.as_pointer().unwrap().has_motion_event());
//! # let _ = SurfaceId(1);
//! ```

pub mod codes;
pub mod fragment;
pub mod wire;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use codes::{AxisSource, PointerButton, ScrollAxis};
pub use fragment::{
    AxisPart, AxisSample, ButtonPart, EnterPart, InputFragment, KeyboardFragment, LeavePart,
    MotionPart, PointerFragment,
};
pub use wire::{FrameAssembler, WireEvent};

/// Compositor-issued token proving a user gesture. Zero means "unknown".
pub type Serial = u32;

/// Protocol timestamp in milliseconds (wraps around).
pub type Timestamp = u32;

/// Opaque handle of a `wl_surface`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface@{:#x}", self.0)
    }
}
