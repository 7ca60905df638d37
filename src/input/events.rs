//! Semantic events handed to the GUI layer

use serde::{Deserialize, Serialize};

use super::Modifiers;
use crate::protocol::{PointerButton, ScrollAxis, SurfaceId, Timestamp};

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    PointerEntered,
    PointerExited,
    PointerPressed {
        button: PointerButton,
        click_count: u32,
    },
    PointerReleased {
        button: PointerButton,
        click_count: u32,
    },
    PointerClicked {
        button: PointerButton,
        click_count: u32,
    },
    PointerDragged,
    PointerMoved,
    WheelRotated {
        axis: ScrollAxis,
        /// Whole rotations; positive scrolls down/right
        rotation: i32,
        /// Fractional rotations carried by the raw input
        precise: f64,
        /// Units to scroll per rotation
        scroll_amount: u32,
    },
    KeyPressed {
        code: u32,
        codepoint: Option<u32>,
    },
    KeyReleased {
        code: u32,
        codepoint: Option<u32>,
    },
    KeyTyped {
        ch: char,
    },
    FocusGained,
    FocusLost,
}

/// An ordered, self-contained input event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticEvent {
    pub kind: EventKind,
    pub surface: SurfaceId,
    /// Logical-space position
    pub x: i32,
    pub y: i32,
    pub modifiers: Modifiers,
    pub timestamp: Timestamp,
}

impl SemanticEvent {
    pub fn is_pointer(&self) -> bool {
        matches!(
            self.kind,
            EventKind::PointerEntered
                | EventKind::PointerExited
                | EventKind::PointerPressed { .. }
                | EventKind::PointerReleased { .. }
                | EventKind::PointerClicked { .. }
                | EventKind::PointerDragged
                | EventKind::PointerMoved
                | EventKind::WheelRotated { .. }
        )
    }

    pub fn click_count(&self) -> Option<u32> {
        match self.kind {
            EventKind::PointerPressed { click_count, .. }
            | EventKind::PointerReleased { click_count, .. }
            | EventKind::PointerClicked { click_count, .. } => Some(click_count),
            _ => None,
        }
    }

    pub fn button(&self) -> Option<PointerButton> {
        match self.kind {
            EventKind::PointerPressed { button, .. }
            | EventKind::PointerReleased { button, .. }
            | EventKind::PointerClicked { button, .. } => Some(button),
            _ => None,
        }
    }

    /// Short name, handy in logs and tests.
    pub fn name(&self) -> &'static str {
        match self.kind {
            EventKind::PointerEntered => "entered",
            EventKind::PointerExited => "exited",
            EventKind::PointerPressed { .. } => "pressed",
            EventKind::PointerReleased { .. } => "released",
            EventKind::PointerClicked { .. } => "clicked",
            EventKind::PointerDragged => "dragged",
            EventKind::PointerMoved => "moved",
            EventKind::WheelRotated { .. } => "wheel",
            EventKind::KeyPressed { .. } => "key_pressed",
            EventKind::KeyReleased { .. } => "key_released",
            EventKind::KeyTyped { .. } => "key_typed",
            EventKind::FocusGained => "focus_gained",
            EventKind::FocusLost => "focus_lost",
        }
    }
}
