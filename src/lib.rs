//! # waynorm
//!
//! Normalizes Wayland seat input into ordered semantic events.
//!
//! The compositor delivers pointer and keyboard input as many small,
//! decoupled notifications. waynorm assembles them into frames, runs them
//! through an immutable state machine and produces press, release, click,
//! drag, wheel and focus events in logical coordinates. It also keeps the
//! serials needed to authorize move, resize, menu and activation requests.
//!
//! ## Architecture
//!
//! - `protocol`: wire notifications, frame assembly and presence-checked fragments
//! - `input`: the input state machine, click/drag classification and wheel accumulation
//! - `scale`: logical, protocol and device coordinate conversion
//! - `serial`: serial selection for privileged requests
//! - `surface`: registered surfaces and their scale
//! - `normalizer`: the façade tying the above together
//! - `dispatch`: transport and dispatch threads
//! - `decoration`: title bar gestures built on the event stream
//! - `trace`: JSON-lines session replay
//! - `config`: configuration parsing and management
//!
//! ## Usage
//!
//! ```rust
//! use waynorm::{InputNormalizer, NormalizerConfig};
//! use waynorm::protocol::{PointerFragment, SurfaceId};
//! use waynorm::scale::ScaleContext;
//!
//! let mut normalizer = InputNormalizer::new(NormalizerConfig::default());
//! normalizer.register_surface(SurfaceId(1), 640, 480, ScaleContext::default());
//!
//! let events = normalizer.process(&PointerFragment::enter(SurfaceId(1), 5, 10.0, 10.0).into());
//! assert_eq!(events[0].name(), "entered");
//! ```

pub mod config;
pub mod decoration;
pub mod dispatch;
pub mod input;
pub mod logging;
pub mod normalizer;
pub mod protocol;
pub mod scale;
pub mod serial;
pub mod surface;
pub mod trace;

// Re-export main types for easy access
pub use config::NormalizerConfig;
pub use dispatch::{Dispatcher, DispatcherHandle, EventSink, FragmentSource, Incoming, ReadResult};
pub use input::{InputState, Modifiers, SemanticEvent};
pub use normalizer::InputNormalizer;
pub use serial::{RequestKind, SerialAuthorizer, SerialSource};

// Re-export common error types
pub use anyhow::{Context, Error, Result};

/// Version information for waynorm
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
