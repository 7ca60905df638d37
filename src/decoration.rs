//! Title bar gestures for client-side decorations
//!
//! Turns semantic pointer events on a decorated window into window-manager
//! requests: the window menu, interactive move and maximize toggling. Which
//! pixels belong to the title bar is the caller's business and comes in
//! through [`TitlebarHitTest`].

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::ClickConfig;
use crate::input::{ClickAndDragClassifier, EventKind, SemanticEvent};
use crate::protocol::{PointerButton, Serial};
use crate::serial::{RequestKind, SerialSource};

/// A request for the compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "request", rename_all = "snake_case")]
pub enum WindowRequest {
    ShowMenu { serial: Serial, x: i32, y: i32 },
    Move { serial: Serial },
    ToggleMaximize,
}

/// Decoration geometry, in logical surface coordinates.
pub trait TitlebarHitTest {
    fn in_title_bar(&self, x: i32, y: i32) -> bool;

    /// Where a press may start an interactive move. Defaults to the title bar.
    fn in_drag_start_area(&self, x: i32, y: i32) -> bool {
        self.in_title_bar(x, y)
    }
}

/// A plain rectangular title bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitlebarBounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl TitlebarHitTest for TitlebarBounds {
    fn in_title_bar(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

pub struct TitlebarGestures<H> {
    hit_test: H,
    classifier: ClickAndDragClassifier,
    pressed_at: Option<(i32, i32)>,
}

impl<H: TitlebarHitTest> TitlebarGestures<H> {
    pub fn new(hit_test: H, click: &ClickConfig) -> Self {
        Self {
            hit_test,
            classifier: ClickAndDragClassifier::new(click),
            pressed_at: None,
        }
    }

    pub fn hit_test(&self) -> &H {
        &self.hit_test
    }

    /// Feed one event. Returns the request it triggers, if any.
    pub fn handle(
        &mut self,
        event: &SemanticEvent,
        serials: &dyn SerialSource,
    ) -> Option<WindowRequest> {
        let point = (event.x, event.y);
        match event.kind {
            EventKind::PointerPressed { button, .. } => {
                self.pressed_at = Some(point);
                if button == PointerButton::Right && self.hit_test.in_title_bar(event.x, event.y) {
                    let serial = serials.select_serial_for(RequestKind::ShowMenu)?;
                    return Some(WindowRequest::ShowMenu {
                        serial,
                        x: event.x,
                        y: event.y,
                    });
                }
                None
            }
            EventKind::PointerDragged => {
                let from = self.pressed_at?;
                if !self.hit_test.in_drag_start_area(from.0, from.1)
                    || !self.classifier.is_significant_drag_distance(from, point)
                {
                    return None;
                }
                self.pressed_at = None;
                let serial = serials.select_serial_for(RequestKind::Move)?;
                debug!("title bar drag from {:?} starts move", from);
                Some(WindowRequest::Move { serial })
            }
            EventKind::PointerClicked { click_count: 2, .. }
                if self.hit_test.in_drag_start_area(event.x, event.y) =>
            {
                Some(WindowRequest::ToggleMaximize)
            }
            EventKind::PointerReleased { .. } | EventKind::PointerExited => {
                self.pressed_at = None;
                None
            }
            _ => None,
        }
    }
}
