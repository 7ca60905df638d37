//! Input normalizer façade
//!
//! Owns everything the dispatch thread needs: configuration, the surface
//! registry, the frame assembler and the current [`InputState`]. Feed it wire
//! events or ready-made fragments; it hands back semantic events in order.

use log::{debug, trace, warn};

use crate::config::NormalizerConfig;
use crate::input::{InputState, SemanticEvent, TransitionContext};
use crate::protocol::{FrameAssembler, InputFragment, KeyboardFragment, Serial, SurfaceId, WireEvent};
use crate::scale::ScaleContext;
use crate::serial::{RequestKind, SerialSource};
use crate::surface::{SurfaceInfo, SurfaceRegistry};

pub struct InputNormalizer {
    config: NormalizerConfig,
    context: TransitionContext,
    registry: SurfaceRegistry,
    assembler: FrameAssembler,
    state: InputState,
    processed: u64,
    dropped: u64,
}

impl InputNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        let context = TransitionContext::from_config(&config, ScaleContext::default());
        Self {
            config,
            context,
            registry: SurfaceRegistry::new(),
            assembler: FrameAssembler::new(),
            state: InputState::new(),
            processed: 0,
            dropped: 0,
        }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    pub fn state(&self) -> &InputState {
        &self.state
    }

    pub fn registry(&self) -> &SurfaceRegistry {
        &self.registry
    }

    /// Number of fragments applied to the state.
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Number of fragments dropped because they named an unknown surface.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn register_surface(&mut self, id: SurfaceId, width: i32, height: i32, scale: ScaleContext) {
        self.registry
            .register(SurfaceInfo::new(id, width, height, scale));
    }

    pub fn update_scale(&mut self, id: SurfaceId, scale: ScaleContext) {
        if !self.registry.update_scale(id, scale) {
            warn!("scale update for unknown {}", id);
        }
    }

    pub fn resize_surface(&mut self, id: SurfaceId, width: i32, height: i32) {
        if !self.registry.resize(id, width, height) {
            warn!("resize for unknown {}", id);
        }
    }

    /// Forget a surface. Input already applied stays applied; the pointer and
    /// keyboard stop being associated with the surface.
    ///
    /// Returns the `focus_lost` event when the surface held keyboard focus.
    pub fn unregister_surface(&mut self, id: SurfaceId) -> Vec<SemanticEvent> {
        if self.registry.unregister(id).is_none() {
            return Vec::new();
        }

        if self.state.entered_surface() == Some(id) {
            debug!("{} went away under the pointer", id);
            self.state = self.state.reset_pointer_state();
        }

        if self.state.keyboard_focus_surface() == Some(id) {
            debug!("{} went away with keyboard focus", id);
            let leave = KeyboardFragment::Leave {
                surface: id,
                serial: 0,
            };
            let (next, events) = self.state.apply_keyboard(&leave, &self.context);
            self.state = next;
            return events;
        }

        Vec::new()
    }

    /// Feed one wire notification. Pointer notifications are buffered until
    /// the frame completes.
    pub fn handle_wire(&mut self, event: WireEvent) -> Vec<SemanticEvent> {
        match self.assembler.push(event) {
            Some(fragment) => self.process(&fragment),
            None => Vec::new(),
        }
    }

    /// Apply one fragment and return the events it produced.
    pub fn process(&mut self, fragment: &InputFragment) -> Vec<SemanticEvent> {
        let Some(scale) = self.resolve_scale(fragment) else {
            self.dropped += 1;
            return Vec::new();
        };

        let context = self.context.with_scale(scale);
        let (next, events) = self.state.transition(fragment, &context);
        self.state = next;
        self.processed += 1;
        trace!("{} event(s) from {:?}", events.len(), fragment);
        events
    }

    /// Scale of the surface a fragment applies to, or `None` if the fragment
    /// references a surface that is not registered.
    fn resolve_scale(&self, fragment: &InputFragment) -> Option<ScaleContext> {
        let target = match fragment {
            InputFragment::Pointer(pointer) => pointer.surface().or(self.state.entered_surface()),
            InputFragment::Keyboard(keyboard) => keyboard
                .surface()
                .or(self.state.keyboard_focus_surface()),
        };

        match target {
            Some(id) => match self.registry.get(id) {
                Some(info) => Some(info.scale),
                None => {
                    warn!("dropping input for unknown {}", id);
                    None
                }
            },
            None => Some(ScaleContext::default()),
        }
    }

    /// True while the pointer is over a registered surface and its last
    /// position lies inside that surface.
    pub fn is_pointer_over_surface(&self) -> bool {
        if !self.state.is_pointer_over_surface() {
            return false;
        }
        let Some(info) = self.state.entered_surface().and_then(|id| self.registry.get(id)) else {
            return false;
        };
        let transformer = self.context.with_scale(info.scale).scale.transformer();
        let (x, y) = self.state.logical_position(&transformer);
        info.contains(x, y)
    }
}

impl SerialSource for InputNormalizer {
    fn select_serial_for(&self, kind: RequestKind) -> Option<Serial> {
        let serial = self.state.select_serial_for(kind);
        if serial.is_none() {
            debug!("no serial for {} request", kind);
        }
        serial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PointerFragment;

    const S: SurfaceId = SurfaceId(0x1);
    const GONE: SurfaceId = SurfaceId(0x2);

    fn normalizer() -> InputNormalizer {
        let mut normalizer = InputNormalizer::new(NormalizerConfig::default());
        normalizer.register_surface(S, 100, 50, ScaleContext::default());
        normalizer
    }

    #[test]
    fn test_wire_events_are_grouped_by_frame() {
        let mut n = normalizer();
        assert!(n
            .handle_wire(WireEvent::PointerEnter {
                serial: 1,
                surface: S,
                x: 3.0,
                y: 4.0,
            })
            .is_empty());
        let events = n.handle_wire(WireEvent::PointerFrame);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name(), "entered");
        assert_eq!((events[0].x, events[0].y), (3, 4));
        assert_eq!(n.processed(), 1);
    }

    #[test]
    fn test_unknown_surface_is_dropped() {
        let mut n = normalizer();
        let events = n.process(&PointerFragment::enter(GONE, 1, 0.0, 0.0).into());
        assert!(events.is_empty());
        assert_eq!(n.dropped(), 1);
        assert_eq!(n.state().entered_surface(), None);
    }

    #[test]
    fn test_unregister_under_pointer_resets_buttons() {
        let mut n = normalizer();
        n.process(&PointerFragment::enter(S, 1, 1.0, 1.0).into());
        n.process(&PointerFragment::button(2, 1, 0x110, true).into());
        assert!(n.state().has_pointer_button_pressed());

        let record = n.state().press_record().copied();

        assert!(n.unregister_surface(S).is_empty());
        assert!(!n.state().has_pointer_button_pressed());
        assert!(!n.is_pointer_over_surface());
        // Pointer serials die with the surface, the press record does not.
        assert_eq!(n.state().pointer_button_serial(), 0);
        assert_eq!(n.state().pointer_enter_serial(), 0);
        assert_eq!(n.select_serial_for(RequestKind::Move), None);
        assert_eq!(n.select_serial_for(RequestKind::Activate), None);
        assert_eq!(n.state().press_record().copied(), record);

        // Late motion for the torn-down surface is dropped.
        assert!(n.process(&PointerFragment::motion(2, 5.0, 5.0).into()).is_empty());
        assert_eq!(n.dropped(), 1);
    }

    #[test]
    fn test_unregister_keyboard_focus_invalidates_serials() {
        let mut n = normalizer();
        n.process(
            &KeyboardFragment::Enter {
                surface: S,
                serial: 7,
            }
            .into(),
        );
        assert_eq!(n.select_serial_for(RequestKind::Activate), Some(7));
        let events = n.unregister_surface(S);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name(), "focus_lost");
        assert_eq!(events[0].surface, S);
        assert_eq!(n.select_serial_for(RequestKind::Activate), None);
        assert_eq!(n.state().keyboard_focus_surface(), None);
    }

    #[test]
    fn test_keys_use_focused_surface_scale() {
        let mut n = normalizer();
        n.update_scale(S, ScaleContext::from_fraction(crate::scale::SCALE_DENOMINATOR, 2));
        n.process(&PointerFragment::enter(S, 1, 10.0, 5.0).into());
        n.process(
            &KeyboardFragment::Enter {
                surface: S,
                serial: 2,
            }
            .into(),
        );
        let events = n.process(
            &KeyboardFragment::Key {
                serial: 3,
                time: 30,
                code: 1,
                codepoint: None,
                pressed: true,
            }
            .into(),
        );
        assert_eq!(events[0].name(), "key_pressed");
        assert_eq!((events[0].x, events[0].y), (20, 10));
    }

    #[test]
    fn test_pointer_over_surface_checks_bounds() {
        let mut n = normalizer();
        n.process(&PointerFragment::enter(S, 1, 10.0, 10.0).into());
        assert!(n.is_pointer_over_surface());
        n.process(&PointerFragment::motion(1, 120.0, 10.0).into());
        assert!(!n.is_pointer_over_surface());
    }

    #[test]
    fn test_scale_follows_surface() {
        let mut n = normalizer();
        n.update_scale(S, ScaleContext::from_fraction(crate::scale::SCALE_DENOMINATOR, 2));
        let events = n.process(&PointerFragment::enter(S, 1, 10.0, 10.0).into());
        assert_eq!((events[0].x, events[0].y), (20, 20));
    }
}
