//! Transport and dispatch threads
//!
//! The transport thread reads batches from a [`FragmentSource`] and hands
//! each batch to the dispatch thread over a channel. It then waits until the
//! dispatch thread reports the batch drained before reading again, so at most
//! one batch is ever in flight and ordering is exactly the transport's.
//!
//! The dispatch thread owns the [`InputNormalizer`]. It is the only place
//! state transitions happen; nothing in a transition blocks.
//!
//! ```text
//! ┌───────────────────┐  batch   ┌──────────────────┐  events  ┌───────────┐
//! │ waynorm-transport │─────────►│ waynorm-dispatch │─────────►│ EventSink │
//! │   (source.read)   │◄─────────│   (normalizer)   │          └───────────┘
//! └───────────────────┘ drained  └──────────────────┘
//! ```

use log::{debug, error, info, trace, warn};
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

use crate::input::SemanticEvent;
use crate::normalizer::InputNormalizer;
use crate::protocol::{InputFragment, SurfaceId, WireEvent};
use crate::scale::ScaleContext;
use crate::serial::SerialSource;

/// One item read from the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Incoming {
    /// A single seat notification
    Wire(WireEvent),
    /// An already assembled fragment
    Fragment(InputFragment),
    RegisterSurface {
        surface: SurfaceId,
        width: i32,
        height: i32,
        scale: ScaleContext,
    },
    UpdateScale {
        surface: SurfaceId,
        scale: ScaleContext,
    },
    UnregisterSurface {
        surface: SurfaceId,
    },
}

impl Incoming {
    /// Apply to the normalizer, returning any semantic events.
    pub fn apply(self, normalizer: &mut InputNormalizer) -> Vec<SemanticEvent> {
        match self {
            Incoming::Wire(event) => normalizer.handle_wire(event),
            Incoming::Fragment(fragment) => normalizer.process(&fragment),
            Incoming::RegisterSurface {
                surface,
                width,
                height,
                scale,
            } => {
                normalizer.register_surface(surface, width, height, scale);
                Vec::new()
            }
            Incoming::UpdateScale { surface, scale } => {
                normalizer.update_scale(surface, scale);
                Vec::new()
            }
            Incoming::UnregisterSurface { surface } => normalizer.unregister_surface(surface),
        }
    }
}

/// Outcome of one transport read.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadResult {
    /// New items arrived
    Events(Vec<Incoming>),
    /// The read finished without producing anything
    NoNewEvents,
    /// Nothing arrived within the idle timeout
    Idle,
    /// The transport is gone
    Closed,
    /// The transport failed
    Error(String),
}

/// Where raw input comes from. Runs on the transport thread.
pub trait FragmentSource: Send + 'static {
    /// Read the next batch, waiting at most about `idle_timeout` when idle.
    fn read(&mut self, idle_timeout: Duration) -> ReadResult;
}

/// Where semantic events go. Runs on the dispatch thread.
pub trait EventSink: Send + 'static {
    fn dispatch(&mut self, event: &SemanticEvent, serials: &dyn SerialSource);

    /// Called after each drained batch.
    fn batch_done(&mut self) {}
}

impl<F> EventSink for F
where
    F: FnMut(&SemanticEvent, &dyn SerialSource) + Send + 'static,
{
    fn dispatch(&mut self, event: &SemanticEvent, serials: &dyn SerialSource) {
        self(event, serials)
    }
}

/// Forwards events over a channel.
pub struct ChannelSink {
    sender: Sender<SemanticEvent>,
}

impl ChannelSink {
    pub fn channel() -> (Self, Receiver<SemanticEvent>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelSink {
    fn dispatch(&mut self, event: &SemanticEvent, _serials: &dyn SerialSource) {
        if self.sender.send(event.clone()).is_err() {
            trace!("event receiver dropped");
        }
    }
}

/// A source that replays pre-built read results, then reports `Closed`.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    reads: VecDeque<ReadResult>,
}

impl ScriptedSource {
    pub fn new(reads: impl IntoIterator<Item = ReadResult>) -> Self {
        Self {
            reads: reads.into_iter().collect(),
        }
    }

    /// One batch per item.
    pub fn from_batches(batches: impl IntoIterator<Item = Vec<Incoming>>) -> Self {
        Self::new(batches.into_iter().map(ReadResult::Events))
    }
}

impl FragmentSource for ScriptedSource {
    fn read(&mut self, _idle_timeout: Duration) -> ReadResult {
        self.reads.pop_front().unwrap_or(ReadResult::Closed)
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} thread panicked")]
    Panicked(&'static str),
}

/// What the dispatcher leaves behind once both threads have stopped.
pub struct DispatchReport {
    pub normalizer: InputNormalizer,
    /// Items applied to the normalizer
    pub processed: u64,
    /// Set if the transport stopped because of an error
    pub transport_error: Option<String>,
}

#[derive(Debug, Default)]
struct HandoffState {
    batch_pending: bool,
    shutdown: bool,
}

/// Two-phase handoff between the threads.
#[derive(Debug, Default)]
struct Handoff {
    state: Mutex<HandoffState>,
    changed: Condvar,
}

impl Handoff {
    fn begin_batch(&self) {
        self.state.lock().batch_pending = true;
    }

    fn batch_drained(&self) {
        self.state.lock().batch_pending = false;
        self.changed.notify_all();
    }

    fn shutdown(&self) {
        self.state.lock().shutdown = true;
        self.changed.notify_all();
    }

    fn is_shutdown(&self) -> bool {
        self.state.lock().shutdown
    }

    /// Block until the pending batch is drained. False on shutdown.
    fn wait_drained(&self, timeout: Duration) -> bool {
        let mut state = self.state.lock();
        while state.batch_pending && !state.shutdown {
            if self.changed.wait_for(&mut state, timeout).timed_out() {
                trace!("dispatch still draining");
            }
        }
        !state.shutdown
    }

    /// Sleep for up to `timeout`, waking early on shutdown. False on shutdown.
    fn idle(&self, timeout: Duration) -> bool {
        let mut state = self.state.lock();
        if !state.shutdown {
            self.changed.wait_for(&mut state, timeout);
        }
        !state.shutdown
    }
}

pub struct Dispatcher;

impl Dispatcher {
    /// Start the transport and dispatch threads.
    pub fn spawn<S, K>(
        normalizer: InputNormalizer,
        source: S,
        sink: K,
    ) -> Result<DispatcherHandle, DispatchError>
    where
        S: FragmentSource,
        K: EventSink,
    {
        let idle_timeout = normalizer.config().dispatch.idle_timeout();
        let handoff = Arc::new(Handoff::default());
        let (batches_tx, batches_rx) = mpsc::channel::<Vec<Incoming>>();

        let dispatch_handoff = Arc::clone(&handoff);
        let dispatch = thread::Builder::new()
            .name(DISPATCH_THREAD.to_string())
            .spawn(move || dispatch_loop(normalizer, sink, batches_rx, &dispatch_handoff))
            .map_err(|source| DispatchError::Spawn {
                name: DISPATCH_THREAD,
                source,
            })?;

        let transport_handoff = Arc::clone(&handoff);
        let transport = thread::Builder::new()
            .name(TRANSPORT_THREAD.to_string())
            .spawn(move || transport_loop(source, batches_tx, &transport_handoff, idle_timeout))
            .map_err(|source| {
                handoff.shutdown();
                DispatchError::Spawn {
                    name: TRANSPORT_THREAD,
                    source,
                }
            })?;

        info!("🔄 Dispatcher started (idle timeout {:?})", idle_timeout);

        Ok(DispatcherHandle {
            transport,
            dispatch,
            handoff,
        })
    }
}

const TRANSPORT_THREAD: &str = "waynorm-transport";
const DISPATCH_THREAD: &str = "waynorm-dispatch";

/// Stops a running dispatcher from another thread or task.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    handoff: Arc<Handoff>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.handoff.shutdown();
    }
}

pub struct DispatcherHandle {
    transport: JoinHandle<Option<String>>,
    dispatch: JoinHandle<(InputNormalizer, u64)>,
    handoff: Arc<Handoff>,
}

impl DispatcherHandle {
    /// Ask both threads to stop. Items not yet applied are discarded.
    pub fn shutdown(&self) {
        debug!("dispatcher shutdown requested");
        self.handoff.shutdown();
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            handoff: Arc::clone(&self.handoff),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.transport.is_finished() && self.dispatch.is_finished()
    }

    /// Wait for both threads.
    pub fn join(self) -> Result<DispatchReport, DispatchError> {
        let transport_error = self
            .transport
            .join()
            .map_err(|_| DispatchError::Panicked(TRANSPORT_THREAD))?;
        let (normalizer, processed) = self
            .dispatch
            .join()
            .map_err(|_| DispatchError::Panicked(DISPATCH_THREAD))?;

        Ok(DispatchReport {
            normalizer,
            processed,
            transport_error,
        })
    }
}

struct ReleaseOnExit<'a>(&'a Handoff);

impl Drop for ReleaseOnExit<'_> {
    fn drop(&mut self) {
        self.0.shutdown();
    }
}

fn transport_loop<S: FragmentSource>(
    mut source: S,
    batches: Sender<Vec<Incoming>>,
    handoff: &Handoff,
    idle_timeout: Duration,
) -> Option<String> {
    while !handoff.is_shutdown() {
        match source.read(idle_timeout) {
            ReadResult::Events(batch) => {
                if batch.is_empty() {
                    continue;
                }
                trace!("handing over {} item(s)", batch.len());
                handoff.begin_batch();
                if batches.send(batch).is_err() {
                    warn!("dispatch thread is gone, stopping transport");
                    break;
                }
                if !handoff.wait_drained(idle_timeout) {
                    break;
                }
            }
            ReadResult::NoNewEvents | ReadResult::Idle => {
                if !handoff.idle(idle_timeout) {
                    break;
                }
            }
            ReadResult::Closed => {
                debug!("transport closed");
                break;
            }
            ReadResult::Error(message) => {
                error!("❌ Transport error: {}", message);
                return Some(message);
            }
        }
    }
    None
}

fn dispatch_loop<K: EventSink>(
    mut normalizer: InputNormalizer,
    mut sink: K,
    batches: Receiver<Vec<Incoming>>,
    handoff: &Handoff,
) -> (InputNormalizer, u64) {
    // Releases the transport thread even if a sink panics.
    let _release = ReleaseOnExit(handoff);
    let mut processed = 0u64;

    while let Ok(batch) = batches.recv() {
        let total = batch.len();
        for (index, item) in batch.into_iter().enumerate() {
            if handoff.is_shutdown() {
                debug!("discarding {} item(s) on shutdown", total - index);
                break;
            }
            for event in item.apply(&mut normalizer) {
                sink.dispatch(&event, &normalizer);
            }
            processed += 1;
        }
        sink.batch_done();
        handoff.batch_drained();
    }

    debug!("dispatch finished after {} item(s)", processed);
    (normalizer, processed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizerConfig;

    fn normalizer() -> InputNormalizer {
        let mut config = NormalizerConfig::default();
        config.dispatch.idle_timeout_ms = 5;
        InputNormalizer::new(config)
    }

    fn register(surface: u64) -> Incoming {
        Incoming::RegisterSurface {
            surface: SurfaceId(surface),
            width: 100,
            height: 100,
            scale: ScaleContext::default(),
        }
    }

    #[test]
    fn test_batches_are_applied_in_order() {
        let source = ScriptedSource::new([
            ReadResult::Events(vec![register(1)]),
            ReadResult::Idle,
            ReadResult::Events(vec![
                Incoming::Wire(WireEvent::PointerEnter {
                    surface: SurfaceId(1),
                    serial: 1,
                    x: 1.0,
                    y: 1.0,
                }),
                Incoming::Wire(WireEvent::PointerFrame),
            ]),
            ReadResult::NoNewEvents,
            ReadResult::Events(vec![
                Incoming::Wire(WireEvent::PointerMotion {
                    time: 5,
                    x: 2.0,
                    y: 2.0,
                }),
                Incoming::Wire(WireEvent::PointerFrame),
            ]),
        ]);
        let (sink, events) = ChannelSink::channel();

        let handle = Dispatcher::spawn(normalizer(), source, sink).unwrap();
        let report = handle.join().unwrap();

        let names: Vec<_> = events.try_iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["entered", "moved"]);
        assert_eq!(report.processed, 5);
        assert!(report.transport_error.is_none());
        assert_eq!(report.normalizer.state().entered_surface(), Some(SurfaceId(1)));
    }

    #[test]
    fn test_unregister_dispatches_focus_lost() {
        let mut n = normalizer();
        register(1).apply(&mut n);
        let gained = Incoming::Wire(WireEvent::KeyboardEnter {
            surface: SurfaceId(1),
            serial: 4,
        })
        .apply(&mut n);
        assert_eq!(gained[0].name(), "focus_gained");

        let lost = Incoming::UnregisterSurface {
            surface: SurfaceId(1),
        }
        .apply(&mut n);
        assert_eq!(lost.len(), 1);
        assert_eq!(lost[0].name(), "focus_lost");
        assert_eq!(lost[0].surface, SurfaceId(1));
    }

    #[test]
    fn test_transport_error_is_reported() {
        let source = ScriptedSource::new([
            ReadResult::Events(vec![register(1)]),
            ReadResult::Error("broken pipe".to_string()),
            ReadResult::Events(vec![register(2)]),
        ]);
        let handle = Dispatcher::spawn(normalizer(), source, |_: &SemanticEvent, _: &dyn SerialSource| {}).unwrap();
        let report = handle.join().unwrap();
        assert_eq!(report.transport_error.as_deref(), Some("broken pipe"));
        assert_eq!(report.processed, 1);
        assert_eq!(report.normalizer.registry().len(), 1);
    }

    /// A source that never closes on its own.
    struct Endless;

    impl FragmentSource for Endless {
        fn read(&mut self, idle_timeout: Duration) -> ReadResult {
            thread::sleep(idle_timeout);
            ReadResult::Idle
        }
    }

    #[test]
    fn test_shutdown_stops_idle_dispatcher() {
        let (sink, _events) = ChannelSink::channel();
        let handle = Dispatcher::spawn(normalizer(), Endless, sink).unwrap();
        handle.shutdown();
        let report = handle.join().unwrap();
        assert_eq!(report.processed, 0);
    }

    #[test]
    fn test_sink_sees_serials() {
        let source = ScriptedSource::from_batches([vec![
            register(1),
            Incoming::Wire(WireEvent::PointerEnter {
                surface: SurfaceId(1),
                serial: 1,
                x: 1.0,
                y: 1.0,
            }),
            Incoming::Wire(WireEvent::PointerFrame),
            Incoming::Wire(WireEvent::PointerButton {
                serial: 42,
                time: 1,
                button: 0x111,
                pressed: true,
            }),
            Incoming::Wire(WireEvent::PointerFrame),
        ]]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_sink = Arc::clone(&seen);
        let sink = move |event: &SemanticEvent, serials: &dyn SerialSource| {
            if event.name() == "pressed" {
                seen_in_sink
                    .lock()
                    .push(serials.select_serial_for(crate::serial::RequestKind::ShowMenu));
            }
        };
        Dispatcher::spawn(normalizer(), source, sink).unwrap().join().unwrap();
        assert_eq!(*seen.lock(), vec![Some(42)]);
    }
}
