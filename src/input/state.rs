//! Immutable input state and its transition function

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::click::{ClickAndDragClassifier, PressInput, PressRecord};
use super::events::{EventKind, SemanticEvent};
use super::wheel::ScrollState;
use super::Modifiers;
use crate::config::{NormalizerConfig, WheelConfig};
use crate::protocol::{
    InputFragment, KeyboardFragment, PointerButton, PointerFragment, Serial, SurfaceId, Timestamp,
};
use crate::scale::{CoordinateTransformer, ScaleContext};

/// Everything a transition needs besides the state itself.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionContext {
    pub classifier: ClickAndDragClassifier,
    pub wheel: WheelConfig,
    /// Scale of the surface the fragment applies to
    pub scale: ScaleContext,
}

impl Default for TransitionContext {
    fn default() -> Self {
        Self::from_config(&NormalizerConfig::default(), ScaleContext::default())
    }
}

impl TransitionContext {
    pub fn from_config(config: &NormalizerConfig, scale: ScaleContext) -> Self {
        Self {
            classifier: ClickAndDragClassifier::new(&config.click),
            wheel: config.wheel.clone(),
            scale: scale.with_identity_conversions(config.scale.identity_conversions),
        }
    }

    pub fn with_scale(&self, scale: ScaleContext) -> Self {
        Self {
            scale: scale.with_identity_conversions(self.scale.identity_conversions()),
            ..self.clone()
        }
    }

    fn transformer(&self) -> CoordinateTransformer {
        self.scale.transformer()
    }
}

/// Snapshot of all input-relevant facts.
///
/// Transitions never mutate a snapshot; they return a new one together with
/// the semantic events the fragment produced. A serial of `0` means unknown.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InputState {
    entered_surface: Option<SurfaceId>,
    pointer_over_surface: bool,
    pointer_enter_serial: Serial,
    pointer_button_serial: Serial,
    keyboard_enter_serial: Serial,
    key_serial: Serial,
    latest_input_serial: Serial,
    /// Time of the latest pointer fragment that carried one
    last_timestamp: Option<Timestamp>,
    /// Time of the latest key notification
    last_key_timestamp: Option<Timestamp>,
    /// Surface-local protocol position of the latest fragment that carried one
    last_position: Option<(f64, f64)>,
    press_record: Option<PressRecord>,
    modifiers: Modifiers,
    keyboard_focus_surface: Option<SurfaceId>,
    scroll: ScrollState,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entered_surface(&self) -> Option<SurfaceId> {
        self.entered_surface
    }

    pub fn is_pointer_over_surface(&self) -> bool {
        self.pointer_over_surface
    }

    pub fn pointer_enter_serial(&self) -> Serial {
        self.pointer_enter_serial
    }

    pub fn pointer_button_serial(&self) -> Serial {
        self.pointer_button_serial
    }

    pub fn keyboard_enter_serial(&self) -> Serial {
        self.keyboard_enter_serial
    }

    pub fn key_serial(&self) -> Serial {
        self.key_serial
    }

    pub fn latest_input_serial(&self) -> Serial {
        self.latest_input_serial
    }

    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.last_timestamp
    }

    pub fn last_key_timestamp(&self) -> Option<Timestamp> {
        self.last_key_timestamp
    }

    pub fn last_position(&self) -> Option<(f64, f64)> {
        self.last_position
    }

    pub fn press_record(&self) -> Option<&PressRecord> {
        self.press_record.as_ref()
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn keyboard_focus_surface(&self) -> Option<SurfaceId> {
        self.keyboard_focus_surface
    }

    pub fn scroll(&self) -> &ScrollState {
        &self.scroll
    }

    /// Click count of the most recent press, 1 if there was none.
    pub fn click_count(&self) -> u32 {
        self.press_record.map_or(1, |r| r.click_count)
    }

    pub fn has_pointer_button_pressed(&self) -> bool {
        self.modifiers.any_button_pressed()
    }

    pub fn has_this_pointer_button_pressed(&self, button: PointerButton) -> bool {
        self.modifiers.contains(button.mask())
    }

    /// Last known pointer position in logical units.
    pub fn logical_position(&self, transformer: &CoordinateTransformer) -> (i32, i32) {
        self.last_position.map_or((0, 0), |(x, y)| {
            (
                transformer.protocol_to_logical_position(x),
                transformer.protocol_to_logical_position(y),
            )
        })
    }

    /// Apply any fragment.
    pub fn transition(
        &self,
        fragment: &InputFragment,
        ctx: &TransitionContext,
    ) -> (InputState, Vec<SemanticEvent>) {
        match fragment {
            InputFragment::Pointer(pointer) => self.apply_pointer(pointer, ctx),
            InputFragment::Keyboard(keyboard) => self.apply_keyboard(keyboard, ctx),
        }
    }

    /// Apply one pointer frame.
    ///
    /// Events come out as enter, press/release, click, wheel, motion/drag,
    /// leave regardless of how many parts the frame carries.
    pub fn apply_pointer(
        &self,
        fragment: &PointerFragment,
        ctx: &TransitionContext,
    ) -> (InputState, Vec<SemanticEvent>) {
        let mut fragment = fragment;
        let stripped;
        let mut button = None;
        if let Some(part) = fragment.button_part() {
            match PointerButton::from_linux_code(part.code) {
                Some(known) => button = Some(known),
                None => {
                    trace!("ignoring unknown pointer button {:#x}", part.code);
                    stripped = fragment.without_button();
                    fragment = &stripped;
                }
            }
        }

        if fragment.is_empty() {
            return (self.clone(), Vec::new());
        }

        let transformer = ctx.transformer();
        let mut next = self.clone();
        let mut events = Vec::new();

        if let Some(enter) = fragment.enter_part() {
            if next.entered_surface != Some(enter.surface) {
                next.scroll = ScrollState::default();
            }
            next.entered_surface = Some(enter.surface);
            next.pointer_over_surface = true;
            next.pointer_enter_serial = enter.serial;
            debug!("pointer entered {} (serial {})", enter.surface, enter.serial);
        }

        if let Some(time) = fragment.timestamp() {
            next.last_timestamp = Some(time);
        }

        if let Some(position) = fragment.coordinates() {
            next.last_position = Some(position);
        }

        let (x, y) = next.logical_position(&transformer);
        let timestamp = next.last_timestamp.unwrap_or(0);
        let buttons_held_before = self.modifiers.any_button_pressed();

        // Drag detection looks at the held press before this frame's button
        if fragment.has_motion_event() {
            next.press_record = ctx.classifier.motion(next.press_record.as_ref(), x, y);
        }

        let target = next.entered_surface;
        let mut emit = |kind: EventKind, state: &InputState, surface: Option<SurfaceId>| {
            if let Some(surface) = surface {
                events.push(SemanticEvent {
                    kind,
                    surface,
                    x,
                    y,
                    modifiers: state.modifiers,
                    timestamp,
                });
            }
        };

        if let Some(enter) = fragment.enter_part() {
            emit(EventKind::PointerEntered, &next, Some(enter.surface));
        }

        if let (Some(part), Some(button)) = (fragment.button_part(), button) {
            next.pointer_button_serial = part.serial;
            next.latest_input_serial = part.serial;

            if part.pressed {
                next.modifiers |= button.mask();
                if let Some(surface) = target {
                    let record = ctx.classifier.press(
                        next.press_record.as_ref(),
                        PressInput {
                            surface,
                            button,
                            timestamp: part.time,
                            x,
                            y,
                        },
                    );
                    next.press_record = Some(record);
                    emit(
                        EventKind::PointerPressed {
                            button,
                            click_count: record.click_count,
                        },
                        &next,
                        target,
                    );
                }
            } else {
                next.modifiers.remove(button.mask());
                if let Some(surface) = target {
                    let outcome = ctx
                        .classifier
                        .release(next.press_record.as_ref(), surface, button);
                    next.press_record = outcome.record;
                    emit(
                        EventKind::PointerReleased {
                            button,
                            click_count: outcome.click_count,
                        },
                        &next,
                        target,
                    );
                    if outcome.clicked {
                        emit(
                            EventKind::PointerClicked {
                                button,
                                click_count: outcome.click_count,
                            },
                            &next,
                            target,
                        );
                    }
                }
            }
        }

        if let Some(axis) = fragment.axis_part() {
            let (scroll, steps) = next.scroll.apply(axis, next.modifiers, &ctx.wheel);
            next.scroll = scroll;
            for (axis, step) in steps {
                emit(
                    EventKind::WheelRotated {
                        axis,
                        rotation: step.rotation,
                        precise: step.precise,
                        scroll_amount: step.scroll_amount,
                    },
                    &next,
                    target,
                );
            }
        }

        if fragment.has_motion_event() {
            let kind = if buttons_held_before {
                EventKind::PointerDragged
            } else {
                EventKind::PointerMoved
            };
            emit(kind, &next, target);
        }

        if let Some(leave) = fragment.leave_part() {
            next = InputState {
                entered_surface: None,
                ..next.reset_pointer_state()
            };
            emit(EventKind::PointerExited, &next, Some(leave.surface));
            debug!("pointer left {}", leave.surface);
        }

        (next, events)
    }

    /// Apply one keyboard notification.
    pub fn apply_keyboard(
        &self,
        fragment: &KeyboardFragment,
        ctx: &TransitionContext,
    ) -> (InputState, Vec<SemanticEvent>) {
        let transformer = ctx.transformer();
        let mut next = self.clone();
        let mut events = Vec::new();

        match *fragment {
            KeyboardFragment::Enter { surface, serial } => {
                next.keyboard_enter_serial = serial;
                next.keyboard_focus_surface = Some(surface);
                next.key_serial = 0;
                next.latest_input_serial = serial;
                events.push(next.keyboard_event(EventKind::FocusGained, surface, &transformer));
                debug!("keyboard focus on {} (serial {})", surface, serial);
            }
            KeyboardFragment::Leave { surface, .. } => {
                let keyboard_serials = [self.keyboard_enter_serial, self.key_serial];
                if self.latest_input_serial != 0
                    && keyboard_serials.contains(&self.latest_input_serial)
                {
                    next.latest_input_serial = self.pointer_button_serial;
                }
                next.keyboard_enter_serial = 0;
                next.key_serial = 0;
                next.keyboard_focus_surface = None;
                next.modifiers = next.modifiers.pointer_part();
                events.push(next.keyboard_event(EventKind::FocusLost, surface, &transformer));
                debug!("keyboard focus left {}", surface);
            }
            KeyboardFragment::Key {
                serial,
                time,
                code,
                codepoint,
                pressed,
            } => {
                next.key_serial = serial;
                next.latest_input_serial = serial;
                next.last_key_timestamp = Some(time);
                match next.keyboard_focus_surface {
                    Some(surface) => {
                        let kind = if pressed {
                            EventKind::KeyPressed { code, codepoint }
                        } else {
                            EventKind::KeyReleased { code, codepoint }
                        };
                        events.push(next.keyboard_event(kind, surface, &transformer));
                        if let Some(ch) = typed_char(pressed, codepoint) {
                            events.push(next.keyboard_event(
                                EventKind::KeyTyped { ch },
                                surface,
                                &transformer,
                            ));
                        }
                    }
                    None => trace!("key {} without keyboard focus", code),
                }
            }
            KeyboardFragment::Modifiers { mask, .. } => {
                next.modifiers = next.modifiers.with_keyboard(mask);
                trace!("keyboard modifiers now {:?}", next.modifiers.keyboard_part());
            }
        }

        (next, events)
    }

    /// Forget pointer buttons, pointer presence and pointer serials, e.g.
    /// when the surface under the pointer goes away. The press record stays.
    ///
    /// `entered_surface` is kept so late fragments for the dead surface can
    /// still be recognized; a leave clears it on top of this.
    pub fn reset_pointer_state(&self) -> InputState {
        let mut next = InputState {
            modifiers: self.modifiers.keyboard_part(),
            pointer_over_surface: false,
            pointer_enter_serial: 0,
            pointer_button_serial: 0,
            scroll: ScrollState::default(),
            ..self.clone()
        };
        let pointer_serials = [self.pointer_enter_serial, self.pointer_button_serial];
        if self.latest_input_serial != 0 && pointer_serials.contains(&self.latest_input_serial) {
            next.latest_input_serial = if self.key_serial != 0 {
                self.key_serial
            } else {
                self.keyboard_enter_serial
            };
        }
        next
    }

    /// Key and focus events carry the pointer position when the pointer is
    /// over the focused surface, and the origin otherwise.
    fn keyboard_event(
        &self,
        kind: EventKind,
        surface: SurfaceId,
        transformer: &CoordinateTransformer,
    ) -> SemanticEvent {
        let (x, y) = if self.entered_surface == Some(surface) {
            self.logical_position(transformer)
        } else {
            (0, 0)
        };
        SemanticEvent {
            kind,
            surface,
            x,
            y,
            modifiers: self.modifiers,
            timestamp: self.last_key_timestamp.or(self.last_timestamp).unwrap_or(0),
        }
    }
}

/// The character a key press types, if it is printable.
fn typed_char(pressed: bool, codepoint: Option<u32>) -> Option<char> {
    if !pressed {
        return None;
    }
    codepoint
        .and_then(char::from_u32)
        .filter(|ch| !ch.is_control())
}
