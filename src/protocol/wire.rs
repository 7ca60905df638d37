//! Individual seat notifications and pointer frame assembly

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::codes::AxisSource;
use super::fragment::{
    AxisPart, ButtonPart, EnterPart, InputFragment, KeyboardFragment, LeavePart, MotionPart,
    PointerFragment,
};
use super::{Serial, SurfaceId, Timestamp};
use crate::input::Modifiers;

/// A single notification as delivered by the transport, in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireEvent {
    PointerEnter {
        surface: SurfaceId,
        serial: Serial,
        x: f64,
        y: f64,
    },
    PointerLeave {
        surface: SurfaceId,
        serial: Serial,
    },
    PointerMotion {
        time: Timestamp,
        x: f64,
        y: f64,
    },
    PointerButton {
        serial: Serial,
        time: Timestamp,
        button: u32,
        pressed: bool,
    },
    PointerAxis {
        time: Timestamp,
        axis: u32,
        value: f64,
    },
    PointerAxisSource {
        source: u32,
    },
    PointerAxisStop {
        time: Timestamp,
        axis: u32,
    },
    PointerAxisValue120 {
        axis: u32,
        value120: i32,
    },
    PointerFrame,
    KeyboardEnter {
        surface: SurfaceId,
        serial: Serial,
    },
    KeyboardLeave {
        surface: SurfaceId,
        serial: Serial,
    },
    KeyboardKey {
        serial: Serial,
        time: Timestamp,
        key: u32,
        #[serde(default)]
        codepoint: Option<u32>,
        pressed: bool,
    },
    KeyboardModifiers {
        serial: Serial,
        depressed: u32,
        #[serde(default)]
        latched: u32,
        #[serde(default)]
        locked: u32,
        #[serde(default)]
        group: u32,
    },
}

impl WireEvent {
    pub fn is_pointer(&self) -> bool {
        matches!(
            self,
            WireEvent::PointerEnter { .. }
                | WireEvent::PointerLeave { .. }
                | WireEvent::PointerMotion { .. }
                | WireEvent::PointerButton { .. }
                | WireEvent::PointerAxis { .. }
                | WireEvent::PointerAxisSource { .. }
                | WireEvent::PointerAxisStop { .. }
                | WireEvent::PointerAxisValue120 { .. }
                | WireEvent::PointerFrame
        )
    }
}

/// Groups pointer notifications between two `frame` events into one fragment.
///
/// Keyboard notifications pass straight through. A pending fragment is
/// flushed early when a notification would overwrite a part it already holds
/// (two buttons in one frame), when motion follows a button or when an enter
/// follows a leave, so that the state machine still sees everything in wire
/// order.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    pending: PointerFragment,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one notification. Returns a fragment once one is complete.
    pub fn push(&mut self, event: WireEvent) -> Option<InputFragment> {
        self.accept(event)
    }

    /// Feed a batch, returning every completed fragment in order.
    pub fn push_all<I>(&mut self, events: I) -> Vec<InputFragment>
    where
        I: IntoIterator<Item = WireEvent>,
    {
        events
            .into_iter()
            .filter_map(|event| self.push(event))
            .collect()
    }

    /// Drop whatever is pending. Used when the seat goes away mid-frame.
    pub fn reset(&mut self) {
        self.pending = PointerFragment::default();
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    fn accept(&mut self, event: WireEvent) -> Option<InputFragment> {
        match event {
            WireEvent::PointerEnter {
                surface,
                serial,
                x,
                y,
            } => {
                let early = self.flush_if(|p| p.enter.is_some() || p.leave.is_some());
                self.pending.enter = Some(EnterPart {
                    surface,
                    serial,
                    x,
                    y,
                });
                early
            }
            WireEvent::PointerLeave { surface, serial } => {
                let early = self.flush_if(|p| p.leave.is_some());
                self.pending.leave = Some(LeavePart { surface, serial });
                early
            }
            WireEvent::PointerMotion { time, x, y } => {
                // Motion after a button belongs to the next fragment so the
                // press keeps the position it happened at. Otherwise later
                // motion supersedes earlier motion.
                let early = self.flush_if(|p| p.button.is_some());
                self.pending.motion = Some(MotionPart { time, x, y });
                early
            }
            WireEvent::PointerButton {
                serial,
                time,
                button,
                pressed,
            } => {
                let early = self.flush_if(|p| p.button.is_some());
                self.pending.button = Some(ButtonPart {
                    serial,
                    time,
                    code: button,
                    pressed,
                });
                early
            }
            WireEvent::PointerAxis { time, axis, value } => {
                let part = self.axis_part();
                part.time = Some(time);
                let sample = part.sample_mut(axis);
                sample.value = Some(sample.value.unwrap_or(0.0) + value);
                None
            }
            WireEvent::PointerAxisSource { source } => {
                let source = AxisSource::from_raw(source);
                if source.is_none() {
                    trace!("ignoring unknown axis source");
                }
                self.axis_part().source = source;
                None
            }
            WireEvent::PointerAxisStop { time, axis } => {
                let part = self.axis_part();
                part.time.get_or_insert(time);
                part.sample_mut(axis).stop = true;
                None
            }
            WireEvent::PointerAxisValue120 { axis, value120 } => {
                let sample = self.axis_part().sample_mut(axis);
                sample.value120 = Some(sample.value120.unwrap_or(0).saturating_add(value120));
                None
            }
            WireEvent::PointerFrame => {
                if self.pending.is_empty() {
                    trace!("empty pointer frame");
                    return None;
                }
                Some(InputFragment::Pointer(std::mem::take(&mut self.pending)))
            }
            WireEvent::KeyboardEnter { surface, serial } => {
                Some(InputFragment::Keyboard(KeyboardFragment::Enter { surface, serial }))
            }
            WireEvent::KeyboardLeave { surface, serial } => {
                Some(InputFragment::Keyboard(KeyboardFragment::Leave { surface, serial }))
            }
            WireEvent::KeyboardKey {
                serial,
                time,
                key,
                codepoint,
                pressed,
            } => Some(InputFragment::Keyboard(KeyboardFragment::Key {
                serial,
                time,
                code: key,
                codepoint,
                pressed,
            })),
            WireEvent::KeyboardModifiers {
                serial,
                depressed,
                latched,
                locked,
                group: _,
            } => Some(InputFragment::Keyboard(KeyboardFragment::Modifiers {
                serial,
                mask: Modifiers::from_xkb(depressed, latched, locked),
            })),
        }
    }

    fn axis_part(&mut self) -> &mut AxisPart {
        self.pending.axis.get_or_insert_with(AxisPart::default)
    }

    fn flush_if(&mut self, pred: impl Fn(&PointerFragment) -> bool) -> Option<InputFragment> {
        if !pred(&self.pending) {
            return None;
        }
        debug!("pointer frame split early to keep wire order");
        let flushed = std::mem::take(&mut self.pending);
        Some(InputFragment::Pointer(flushed))
    }
}
