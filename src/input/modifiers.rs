//! Combined pointer-button and keyboard modifier mask

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Modifier state attached to every semantic event.
    ///
    /// Pointer button bits live in the low half, keyboard bits in the high
    /// half, so each source can be masked out without touching the other.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Modifiers: u32 {
        const BUTTON_LEFT = 1 << 0;
        const BUTTON_MIDDLE = 1 << 1;
        const BUTTON_RIGHT = 1 << 2;
        const BUTTON_SIDE = 1 << 3;
        const BUTTON_EXTRA = 1 << 4;
        const BUTTON_FORWARD = 1 << 5;
        const BUTTON_BACK = 1 << 6;

        const SHIFT = 1 << 16;
        const CTRL = 1 << 17;
        const ALT = 1 << 18;
        const META = 1 << 19;
        const ALT_GRAPH = 1 << 20;
        const CAPS_LOCK = 1 << 21;
        const NUM_LOCK = 1 << 22;

        const POINTER_MASK = Self::BUTTON_LEFT.bits()
            | Self::BUTTON_MIDDLE.bits()
            | Self::BUTTON_RIGHT.bits()
            | Self::BUTTON_SIDE.bits()
            | Self::BUTTON_EXTRA.bits()
            | Self::BUTTON_FORWARD.bits()
            | Self::BUTTON_BACK.bits();

        const KEYBOARD_MASK = Self::SHIFT.bits()
            | Self::CTRL.bits()
            | Self::ALT.bits()
            | Self::META.bits()
            | Self::ALT_GRAPH.bits()
            | Self::CAPS_LOCK.bits()
            | Self::NUM_LOCK.bits();
    }
}

// Default xkb modifier indices (Shift, Lock, Control, Mod1..Mod5).
const XKB_SHIFT: u32 = 1 << 0;
const XKB_LOCK: u32 = 1 << 1;
const XKB_CONTROL: u32 = 1 << 2;
const XKB_MOD1: u32 = 1 << 3;
const XKB_MOD2: u32 = 1 << 4;
const XKB_MOD4: u32 = 1 << 6;
const XKB_MOD5: u32 = 1 << 7;

impl Modifiers {
    /// Translate `wl_keyboard.modifiers` masks into keyboard bits.
    pub fn from_xkb(depressed: u32, latched: u32, locked: u32) -> Self {
        let active = depressed | latched;
        let mut mods = Modifiers::empty();
        mods.set(Modifiers::SHIFT, active & XKB_SHIFT != 0);
        mods.set(Modifiers::CTRL, active & XKB_CONTROL != 0);
        mods.set(Modifiers::ALT, active & XKB_MOD1 != 0);
        mods.set(Modifiers::META, active & XKB_MOD4 != 0);
        mods.set(Modifiers::ALT_GRAPH, active & XKB_MOD5 != 0);
        mods.set(Modifiers::CAPS_LOCK, locked & XKB_LOCK != 0);
        mods.set(Modifiers::NUM_LOCK, locked & XKB_MOD2 != 0);
        mods
    }

    pub fn pointer_part(self) -> Self {
        self & Modifiers::POINTER_MASK
    }

    pub fn keyboard_part(self) -> Self {
        self & Modifiers::KEYBOARD_MASK
    }

    /// Keep this mask's pointer bits and take the keyboard bits from `keyboard`.
    pub fn with_keyboard(self, keyboard: Modifiers) -> Self {
        self.pointer_part() | keyboard.keyboard_part()
    }

    pub fn any_button_pressed(self) -> bool {
        self.intersects(Modifiers::POINTER_MASK)
    }
}
