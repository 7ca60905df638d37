//! Input normalization core
//!
//! Turns presence-checked protocol fragments into ordered semantic events.
//! [`InputState`] is an immutable snapshot; every transition returns a new
//! snapshot plus the events it produced. Click counting, drag detection and
//! wheel accumulation are computed as part of the transition.

pub mod click;
pub mod events;
pub mod modifiers;
pub mod state;
pub mod wheel;

pub use click::{ClickAndDragClassifier, PressInput, PressRecord, ReleaseOutcome};
pub use events::{EventKind, SemanticEvent};
pub use modifiers::Modifiers;
pub use state::{InputState, TransitionContext};
pub use wheel::{merge_horizontal, ScrollState, WheelAccumulator, WheelInput, WheelStep};
