//! # Event Multiplexer
//!
//! Fans native delegate callbacks out to any number of host listeners.
//!
//! ## Overview
//!
//! The native SDK accepts a single delegate. The bridge installs one relay as
//! that delegate for its whole lifetime; the relay normalizes each callback
//! into a [`BridgeEvent`] and publishes it here. The multiplexer consists of:
//! - **BridgeEventKind**: the closed set of event names hosts subscribe to
//! - **Listener registry**: per-kind registrations in registration order
//! - **Pump task**: a single task draining an unbounded FIFO, the one delivery
//!   context for every listener
//! - **EventStream**: broadcast-backed stream subscribers with filtering
//!
//! ## Architecture
//!
//! ```text
//! native thread(s)            pump task (tokio)
//! ┌──────────────┐  publish  ┌───────────┐  snapshot   ┌────────────┐
//! │ NativeRelay  ├──────────>│ unbounded ├────────────>│ listeners  │
//! └──────────────┘           │   FIFO    │             └────────────┘
//!                            └─────┬─────┘  broadcast  ┌────────────┐
//!                                  └──────────────────>│ EventStream│
//!                                                      └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::events::{BridgeEventKind, EventMultiplexer};
//!
//! let multiplexer = EventMultiplexer::new(100)?;
//! let handle = multiplexer.add_listener(BridgeEventKind::Events, |event| {
//!     println!("events: {:?}", event);
//!     Ok(())
//! });
//!
//! // later
//! handle.remove();
//! ```
//!
//! ## Delivery Rules
//!
//! - Events are delivered in publish order; each listener sees an event at
//!   most once.
//! - Listeners are snapshotted per event. A listener removed while an event
//!   is being delivered is skipped if it has not been reached yet.
//! - A listener returning an error or panicking is logged and does not stop
//!   delivery to the others.
//! - Nothing is buffered for listeners registered later.

use crate::error::{Error, Result};

use core_schema::{Event, Location, LocationSource, Status, User, VerifiedLocationToken};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, warn};

pub use tokio::sync::broadcast::error::RecvError;
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for stream subscribers.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Host-facing event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BridgeEventKind {
    #[serde(rename = "clientLocation")]
    ClientLocation,
    #[serde(rename = "location")]
    Location,
    #[serde(rename = "events")]
    Events,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "log")]
    Log,
    #[serde(rename = "token")]
    Token,
}

impl BridgeEventKind {
    pub const ALL: [BridgeEventKind; 6] = [
        BridgeEventKind::ClientLocation,
        BridgeEventKind::Location,
        BridgeEventKind::Events,
        BridgeEventKind::Error,
        BridgeEventKind::Log,
        BridgeEventKind::Token,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BridgeEventKind::ClientLocation => "clientLocation",
            BridgeEventKind::Location => "location",
            BridgeEventKind::Events => "events",
            BridgeEventKind::Error => "error",
            BridgeEventKind::Log => "log",
            BridgeEventKind::Token => "token",
        }
    }

    /// Exact, case-sensitive lookup of a host event name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for BridgeEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized native callback, serialized as the payload hosts receive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BridgeEvent {
    /// Every location the device produced, before server processing.
    ClientLocation {
        location: Location,
        stopped: bool,
        source: LocationSource,
    },
    /// A location the server accepted, with the updated user.
    Location { location: Location, user: User },
    /// Events generated by a location update.
    Events {
        events: Vec<Event>,
        #[serde(skip_serializing_if = "Option::is_none")]
        user: Option<User>,
    },
    Error { status: Status },
    Log { message: String },
    Token { token: VerifiedLocationToken },
}

impl BridgeEvent {
    pub fn kind(&self) -> BridgeEventKind {
        match self {
            BridgeEvent::ClientLocation { .. } => BridgeEventKind::ClientLocation,
            BridgeEvent::Location { .. } => BridgeEventKind::Location,
            BridgeEvent::Events { .. } => BridgeEventKind::Events,
            BridgeEvent::Error { .. } => BridgeEventKind::Error,
            BridgeEvent::Log { .. } => BridgeEventKind::Log,
            BridgeEvent::Token { .. } => BridgeEventKind::Token,
        }
    }
}

/// Listener callback. Errors are logged and never reach the publisher.
pub type Listener = Arc<dyn Fn(&BridgeEvent) -> anyhow::Result<()> + Send + Sync>;

struct Registration {
    id: u64,
    kind: BridgeEventKind,
    active: AtomicBool,
    callback: Listener,
}

#[derive(Default)]
struct Registry {
    listeners: Mutex<HashMap<BridgeEventKind, Vec<Arc<Registration>>>>,
    next_id: AtomicU64,
}

impl Registry {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<BridgeEventKind, Vec<Arc<Registration>>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(&self, kind: BridgeEventKind, callback: Listener) -> Arc<Registration> {
        let registration = Arc::new(Registration {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            kind,
            active: AtomicBool::new(true),
            callback,
        });
        self.lock()
            .entry(kind)
            .or_default()
            .push(Arc::clone(&registration));
        registration
    }

    fn remove(&self, registration: &Registration) {
        registration.active.store(false, Ordering::SeqCst);
        if let Some(entries) = self.lock().get_mut(&registration.kind) {
            entries.retain(|entry| entry.id != registration.id);
        }
    }

    fn remove_all(&self, kind: Option<BridgeEventKind>) {
        let mut listeners = self.lock();
        let removed: Vec<Arc<Registration>> = match kind {
            Some(kind) => listeners.remove(&kind).unwrap_or_default(),
            None => listeners.drain().flat_map(|(_, entries)| entries).collect(),
        };
        for registration in removed {
            registration.active.store(false, Ordering::SeqCst);
        }
    }

    fn count(&self, kind: BridgeEventKind) -> usize {
        self.lock().get(&kind).map_or(0, Vec::len)
    }

    fn snapshot(&self, kind: BridgeEventKind) -> Vec<Arc<Registration>> {
        self.lock().get(&kind).cloned().unwrap_or_default()
    }

    fn deliver(&self, event: &BridgeEvent) {
        let kind = event.kind();
        for registration in self.snapshot(kind) {
            if !registration.active.load(Ordering::SeqCst) {
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| (registration.callback)(event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(event = %kind, listener = registration.id, error = %err, "Listener failed");
                }
                Err(_) => {
                    error!(event = %kind, listener = registration.id, "Listener panicked");
                }
            }
        }
    }
}

enum Envelope {
    Event(BridgeEvent),
    Barrier(oneshot::Sender<()>),
}

/// Handle returned by [`EventMultiplexer::add_listener`].
///
/// Dropping the handle keeps the listener registered; call [`remove`](Self::remove).
pub struct ListenerHandle {
    registry: Weak<Registry>,
    registration: Arc<Registration>,
}

impl ListenerHandle {
    /// Unregisters the listener.
    ///
    /// Events published after this returns never reach it. A delivery the
    /// pump has already started may still complete one call: the pump checks
    /// the flag just before invoking, so a removal from another thread can
    /// land between the check and the call. Removing from inside a listener
    /// takes effect for the next listener call.
    pub fn remove(&self) {
        match self.registry.upgrade() {
            Some(registry) => registry.remove(&self.registration),
            None => self.registration.active.store(false, Ordering::SeqCst),
        }
    }

    pub fn is_active(&self) -> bool {
        self.registration.active.load(Ordering::SeqCst)
    }

    pub fn kind(&self) -> BridgeEventKind {
        self.registration.kind
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("id", &self.registration.id)
            .field("kind", &self.registration.kind)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Single-producer-context, multi-listener event fan-out.
#[derive(Clone)]
pub struct EventMultiplexer {
    registry: Arc<Registry>,
    queue: mpsc::UnboundedSender<Envelope>,
    sender: broadcast::Sender<BridgeEvent>,
}

impl EventMultiplexer {
    /// Creates the multiplexer and spawns its pump on the current tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RuntimeUnavailable`] when called outside a runtime and
    /// [`Error::Config`] for a zero `capacity`.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        let handle = tokio::runtime::Handle::try_current().map_err(|e| {
            Error::RuntimeUnavailable(format!(
                "EventMultiplexer must be created inside a tokio runtime: {}",
                e
            ))
        })?;

        let registry = Arc::new(Registry::default());
        let (queue, mut inbox) = mpsc::unbounded_channel();
        let (sender, _) = broadcast::channel(capacity);

        let pump_registry = Arc::clone(&registry);
        let pump_sender = sender.clone();
        handle.spawn(async move {
            while let Some(envelope) = inbox.recv().await {
                match envelope {
                    Envelope::Event(event) => {
                        pump_registry.deliver(&event);
                        // No stream subscribers is not an error.
                        let _ = pump_sender.send(event);
                    }
                    Envelope::Barrier(done) => {
                        let _ = done.send(());
                    }
                }
            }
            debug!("Event pump stopped");
        });

        Ok(Self {
            registry,
            queue,
            sender,
        })
    }

    /// Enqueues an event for delivery. Safe to call from any thread.
    pub fn publish(&self, event: BridgeEvent) {
        let kind = event.kind();
        if self.queue.send(Envelope::Event(event)).is_err() {
            warn!(event = %kind, "Event pump is not running; event dropped");
        }
    }

    /// Registers a listener for one event kind.
    pub fn add_listener<F>(&self, kind: BridgeEventKind, callback: F) -> ListenerHandle
    where
        F: Fn(&BridgeEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let registration = self.registry.insert(kind, Arc::new(callback));
        debug!(event = %kind, listener = registration.id, "Listener added");
        ListenerHandle {
            registry: Arc::downgrade(&self.registry),
            registration,
        }
    }

    /// Removes every listener of `kind`, or every listener when `None`.
    pub fn remove_all_listeners(&self, kind: Option<BridgeEventKind>) {
        self.registry.remove_all(kind);
    }

    pub fn listener_count(&self, kind: BridgeEventKind) -> usize {
        self.registry.count(kind)
    }

    /// Resolves once every event published before this call was delivered.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.queue.send(Envelope::Barrier(done)).is_ok() {
            let _ = wait.await;
        }
    }

    /// Creates a stream subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.sender.subscribe())
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventMultiplexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: Vec<(&str, usize)> = BridgeEventKind::ALL
            .iter()
            .map(|kind| (kind.as_str(), self.listener_count(*kind)))
            .collect();
        f.debug_struct("EventMultiplexer")
            .field("listeners", &counts)
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&BridgeEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with filtering.
pub struct EventStream {
    receiver: Receiver<BridgeEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<BridgeEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events that match the filter will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&BridgeEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Keeps only events of one kind.
    pub fn of_kind(self, kind: BridgeEventKind) -> Self {
        self.filter(move |event| event.kind() == kind)
    }

    fn accepts(&self, event: &BridgeEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` once the multiplexer is gone.
    pub async fn recv(&mut self) -> std::result::Result<BridgeEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Returns `None` if no events are currently available.
    pub fn try_recv(&mut self) -> Option<std::result::Result<BridgeEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn log(message: &str) -> BridgeEvent {
        BridgeEvent::Log {
            message: message.to_string(),
        }
    }

    fn counter(
        multiplexer: &EventMultiplexer,
        kind: BridgeEventKind,
    ) -> (Arc<AtomicUsize>, ListenerHandle) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let handle = multiplexer.add_listener(kind, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        (count, handle)
    }

    #[test]
    fn test_requires_runtime() {
        let result = EventMultiplexer::new(10);
        assert!(matches!(result, Err(Error::RuntimeUnavailable(_))));
    }

    #[tokio::test]
    async fn test_rejects_zero_capacity() {
        assert!(matches!(EventMultiplexer::new(0), Err(Error::Config(_))));
    }

    #[test]
    fn test_kind_names() {
        for kind in BridgeEventKind::ALL {
            assert_eq!(BridgeEventKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(BridgeEventKind::from_name("Events"), None);
        assert_eq!(BridgeEventKind::from_name("geofence"), None);
    }

    #[tokio::test]
    async fn test_delivers_only_to_matching_kind() {
        let multiplexer = EventMultiplexer::new(10).unwrap();
        let (logs, _a) = counter(&multiplexer, BridgeEventKind::Log);
        let (errors, _b) = counter(&multiplexer, BridgeEventKind::Error);

        multiplexer.publish(log("hello"));
        multiplexer.flush().await;

        assert_eq!(logs.load(Ordering::SeqCst), 1);
        assert_eq!(errors.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_self_removal_during_dispatch_still_delivers_to_next() {
        let multiplexer = EventMultiplexer::new(10).unwrap();
        let slot: Arc<Mutex<Option<ListenerHandle>>> = Arc::new(Mutex::new(None));
        let a_calls = Arc::new(AtomicUsize::new(0));

        let own = Arc::clone(&slot);
        let a_seen = Arc::clone(&a_calls);
        let a = multiplexer.add_listener(BridgeEventKind::Events, move |_| {
            a_seen.fetch_add(1, Ordering::SeqCst);
            if let Some(handle) = own.lock().unwrap().as_ref() {
                handle.remove();
            }
            Ok(())
        });
        *slot.lock().unwrap() = Some(a);
        let (b_calls, _b) = counter(&multiplexer, BridgeEventKind::Events);

        multiplexer.publish(BridgeEvent::Events {
            events: vec![],
            user: None,
        });
        multiplexer.flush().await;

        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 1);
        assert_eq!(multiplexer.listener_count(BridgeEventKind::Events), 1);

        multiplexer.publish(BridgeEvent::Events {
            events: vec![],
            user: None,
        });
        multiplexer.flush().await;

        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_listener_removed_mid_dispatch_is_skipped() {
        let multiplexer = EventMultiplexer::new(10).unwrap();
        let slot: Arc<Mutex<Option<ListenerHandle>>> = Arc::new(Mutex::new(None));

        let target = Arc::clone(&slot);
        let _a = multiplexer.add_listener(BridgeEventKind::Log, move |_| {
            if let Some(handle) = target.lock().unwrap().as_ref() {
                handle.remove();
            }
            Ok(())
        });
        let (b_calls, b) = counter(&multiplexer, BridgeEventKind::Log);
        *slot.lock().unwrap() = Some(b);

        multiplexer.publish(log("one"));
        multiplexer.flush().await;

        assert_eq!(b_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failing_listeners_do_not_block_others() {
        let multiplexer = EventMultiplexer::new(10).unwrap();
        let _failing =
            multiplexer.add_listener(BridgeEventKind::Log, |_| Err(anyhow::anyhow!("boom")));
        let _panicking = multiplexer.add_listener(BridgeEventKind::Log, |_| panic!("listener bug"));
        let (calls, _ok) = counter(&multiplexer, BridgeEventKind::Log);

        multiplexer.publish(log("one"));
        multiplexer.publish(log("two"));
        multiplexer.flush().await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_preserves_order_within_kind() {
        let multiplexer = EventMultiplexer::new(10).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _handle = multiplexer.add_listener(BridgeEventKind::Log, move |event| {
            if let BridgeEvent::Log { message } = event {
                sink.lock().unwrap().push(message.clone());
            }
            Ok(())
        });

        let publisher = multiplexer.clone();
        std::thread::spawn(move || {
            for i in 0..20 {
                publisher.publish(log(&i.to_string()));
            }
        })
        .join()
        .unwrap();
        multiplexer.flush().await;

        let expected: Vec<String> = (0..20).map(|i| i.to_string()).collect();
        assert_eq!(*seen.lock().unwrap(), expected);
    }

    #[tokio::test]
    async fn test_no_replay_for_late_listener() {
        let multiplexer = EventMultiplexer::new(10).unwrap();
        multiplexer.publish(log("early"));
        multiplexer.flush().await;

        let (calls, _handle) = counter(&multiplexer, BridgeEventKind::Log);
        multiplexer.flush().await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_removed_listener_skips_already_queued_events() {
        let multiplexer = EventMultiplexer::new(10).unwrap();
        let (calls, handle) = counter(&multiplexer, BridgeEventKind::Log);

        // The pump has not run yet on this single-threaded runtime.
        multiplexer.publish(log("queued"));
        handle.remove();
        multiplexer.flush().await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!handle.is_active());
    }

    #[tokio::test]
    async fn test_remove_all_listeners() {
        let multiplexer = EventMultiplexer::new(10).unwrap();
        let (logs, log_handle) = counter(&multiplexer, BridgeEventKind::Log);
        let (_errors, _error_handle) = counter(&multiplexer, BridgeEventKind::Error);

        multiplexer.remove_all_listeners(Some(BridgeEventKind::Log));
        assert_eq!(multiplexer.listener_count(BridgeEventKind::Log), 0);
        assert_eq!(multiplexer.listener_count(BridgeEventKind::Error), 1);
        assert!(!log_handle.is_active());

        multiplexer.remove_all_listeners(None);
        assert_eq!(multiplexer.listener_count(BridgeEventKind::Error), 0);

        multiplexer.publish(log("ignored"));
        multiplexer.flush().await;
        assert_eq!(logs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stream_receives_after_listeners() {
        let multiplexer = EventMultiplexer::new(10).unwrap();
        let mut stream = multiplexer.subscribe().of_kind(BridgeEventKind::Error);

        multiplexer.publish(log("skip me"));
        multiplexer.publish(BridgeEvent::Error {
            status: Status::ErrorLocation,
        });

        let received = stream.recv().await.unwrap();
        assert_eq!(
            received,
            BridgeEvent::Error {
                status: Status::ErrorLocation
            }
        );
        assert!(stream.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_event_payload_shape() {
        let event = BridgeEvent::Error {
            status: Status::ErrorNetwork,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, serde_json::json!({"status": "ERROR_NETWORK"}));

        let events = BridgeEvent::Events {
            events: vec![],
            user: None,
        };
        let json = serde_json::to_value(&events).unwrap();
        assert_eq!(json, serde_json::json!({"events": []}));
    }
}
