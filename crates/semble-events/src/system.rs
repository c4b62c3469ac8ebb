//! The publish/subscribe hub.

use crate::error::{EventError, EventResult, ListenerError};
use crate::event::Event;
use futures_util::future::{join_all, BoxFuture};
use parking_lot::Mutex;
use std::cmp::Reverse;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Default number of events kept in history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Default deadline for [`EventSystem::wait_for`].
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Synchronous listener callback.
pub type SyncHandler = Arc<dyn Fn(&Event) -> Result<(), ListenerError> + Send + Sync>;

/// Asynchronous listener callback.
pub type AsyncHandler =
    Arc<dyn Fn(Event) -> BoxFuture<'static, Result<(), ListenerError>> + Send + Sync>;

/// Predicate used by [`EventSystem::wait_for`].
pub type EventFilter = Box<dyn Fn(&Event) -> bool + Send + Sync>;

/// A listener callback.
#[derive(Clone)]
pub enum Handler {
    /// Runs inline during `emit`.
    Sync(SyncHandler),
    /// Awaited together with the other async listeners at the end of `emit`.
    Async(AsyncHandler),
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Handler::Sync"),
            Self::Async(_) => f.write_str("Handler::Async"),
        }
    }
}

/// Identifies a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Registration options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Higher fires first.
    pub priority: i32,
    /// Removed after the first delivery.
    pub once: bool,
    /// Only events from this source are delivered.
    pub source: Option<String>,
}

impl ListenerOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Makes the listener one-shot.
    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    /// Restricts delivery to one source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

#[derive(Debug, Clone)]
struct Registration {
    id: ListenerId,
    handler: Handler,
    options: ListenerOptions,
}

impl Registration {
    fn accepts(&self, event: &Event) -> bool {
        self.options
            .source
            .as_deref()
            .map_or(true, |source| source == event.source)
    }
}

#[derive(Debug, Default)]
struct State {
    listeners: HashMap<String, Vec<Registration>>,
    history: VecDeque<Event>,
}

struct Inner {
    state: Mutex<State>,
    capacity: usize,
    wait_timeout: Duration,
    next_id: AtomicU64,
}

/// Removes a listener when dropped.
struct ListenerGuard {
    system: EventSystem,
    id: ListenerId,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.system.off(self.id);
    }
}

/// Publish/subscribe hub with priorities, one-shot listeners and history.
///
/// Cloning is cheap; clones share the same listeners and history.
#[derive(Clone)]
pub struct EventSystem {
    inner: Arc<Inner>,
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("EventSystem")
            .field("event_types", &state.listeners.len())
            .field("history_len", &state.history.len())
            .field("capacity", &self.inner.capacity)
            .field("wait_timeout", &self.inner.wait_timeout)
            .finish()
    }
}

impl EventSystem {
    /// Creates a hub keeping [`DEFAULT_HISTORY_CAPACITY`] events.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Creates a hub keeping at most `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_limits(capacity, DEFAULT_WAIT_TIMEOUT)
    }

    /// Creates a hub keeping at most `capacity` events whose
    /// [`wait_for`](Self::wait_for) falls back to `wait_timeout`.
    pub fn with_limits(capacity: usize, wait_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                capacity,
                wait_timeout,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Returns the history capacity.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Returns the deadline used when [`wait_for`](Self::wait_for) gets none.
    pub fn wait_timeout(&self) -> Duration {
        self.inner.wait_timeout
    }

    /// Registers a synchronous listener.
    pub fn on<F>(&self, event_type: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&Event) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.on_with(event_type, Handler::Sync(Arc::new(listener)), ListenerOptions::default())
    }

    /// Registers a synchronous listener removed after its first delivery.
    pub fn once<F>(&self, event_type: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&Event) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.on_with(
            event_type,
            Handler::Sync(Arc::new(listener)),
            ListenerOptions::new().once(),
        )
    }

    /// Registers an asynchronous listener.
    pub fn on_async<F, Fut>(&self, event_type: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ListenerError>> + Send + 'static,
    {
        let handler: AsyncHandler =
            Arc::new(move |event: Event| -> BoxFuture<'static, Result<(), ListenerError>> {
                Box::pin(listener(event))
            });
        self.on_with(event_type, Handler::Async(handler), ListenerOptions::default())
    }

    /// Registers a listener with explicit options.
    pub fn on_with(
        &self,
        event_type: impl Into<String>,
        handler: Handler,
        options: ListenerOptions,
    ) -> ListenerId {
        let event_type = event_type.into();
        let id = ListenerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(event_type = %event_type, listener_id = %id, priority = options.priority, once = options.once, "listener registered");
        self.inner
            .state
            .lock()
            .listeners
            .entry(event_type)
            .or_default()
            .push(Registration { id, handler, options });
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut state = self.inner.state.lock();
        let mut emptied = None;
        let mut removed = false;
        for (event_type, registrations) in &mut state.listeners {
            if let Some(pos) = registrations.iter().position(|r| r.id == id) {
                registrations.remove(pos);
                removed = true;
                if registrations.is_empty() {
                    emptied = Some(event_type.clone());
                }
                break;
            }
        }
        if let Some(event_type) = emptied {
            state.listeners.remove(&event_type);
        }
        removed
    }

    /// Publishes an event.
    ///
    /// Synchronous listeners run inline in descending priority order; their
    /// errors are logged and do not stop delivery. Asynchronous listeners
    /// are started in the same order and awaited together before returning.
    pub async fn emit(&self, event: Event) {
        let delivered = self.record_and_select(&event);
        debug!(event_type = %event.event_type, event_id = %event.id, listeners = delivered.len(), "emitting event");

        let mut pending = Vec::new();
        for registration in delivered {
            match registration.handler {
                Handler::Sync(handler) => {
                    if let Err(err) = handler(&event) {
                        warn!(event_type = %event.event_type, listener_id = %registration.id, error = %err, "event listener failed");
                    }
                }
                Handler::Async(handler) => {
                    pending.push((registration.id, handler(event.clone())));
                }
            }
        }

        if pending.is_empty() {
            return;
        }
        let (ids, futures): (Vec<_>, Vec<_>) = pending.into_iter().unzip();
        for (id, outcome) in ids.into_iter().zip(join_all(futures).await) {
            if let Err(err) = outcome {
                warn!(event_type = %event.event_type, listener_id = %id, error = %err, "async event listener failed");
            }
        }
    }

    /// Publishes an event without waiting for asynchronous listeners.
    ///
    /// Synchronous listeners run inline. Asynchronous listeners are spawned
    /// onto the current tokio runtime; outside a runtime they are skipped
    /// with a warning.
    pub fn notify(&self, event: Event) {
        let delivered = self.record_and_select(&event);
        debug!(event_type = %event.event_type, event_id = %event.id, listeners = delivered.len(), "notifying event");

        for registration in delivered {
            match registration.handler {
                Handler::Sync(handler) => {
                    if let Err(err) = handler(&event) {
                        warn!(event_type = %event.event_type, listener_id = %registration.id, error = %err, "event listener failed");
                    }
                }
                Handler::Async(handler) => match tokio::runtime::Handle::try_current() {
                    Ok(runtime) => {
                        let pending = handler(event.clone());
                        let event_type = event.event_type.clone();
                        let id = registration.id;
                        runtime.spawn(async move {
                            if let Err(err) = pending.await {
                                warn!(event_type = %event_type, listener_id = %id, error = %err, "async event listener failed");
                            }
                        });
                    }
                    Err(_) => {
                        warn!(event_type = %event.event_type, listener_id = %registration.id, "no async runtime, async listener skipped");
                    }
                },
            }
        }
    }

    fn record_and_select(&self, event: &Event) -> Vec<Registration> {
        let mut state = self.inner.state.lock();

        if self.inner.capacity > 0 {
            while state.history.len() >= self.inner.capacity {
                state.history.pop_front();
            }
            state.history.push_back(event.clone());
        }

        let Some(registrations) = state.listeners.get_mut(&event.event_type) else {
            return Vec::new();
        };

        let mut selected: Vec<Registration> = registrations
            .iter()
            .filter(|r| r.accepts(event))
            .cloned()
            .collect();
        selected.sort_by_key(|r| Reverse(r.options.priority));

        registrations.retain(|r| !(r.options.once && r.accepts(event)));
        if registrations.is_empty() {
            state.listeners.remove(&event.event_type);
        }
        selected
    }

    /// Returns recorded events, oldest first.
    ///
    /// Filters by type first, then keeps the most recent `limit` entries.
    /// `Some(0)` returns nothing.
    pub fn history(&self, event_type: Option<&str>, limit: Option<usize>) -> Vec<Event> {
        let state = self.inner.state.lock();
        let matching: Vec<Event> = state
            .history
            .iter()
            .filter(|e| event_type.map_or(true, |t| e.event_type == t))
            .cloned()
            .collect();
        match limit {
            Some(limit) if limit < matching.len() => matching[matching.len() - limit..].to_vec(),
            _ => matching,
        }
    }

    /// Waits for the first event of a type that passes `filter`.
    ///
    /// The listener is registered before this returns, so events emitted
    /// after the call are observed even if the future is polled later. The
    /// listener is removed when the wait resolves or the future is dropped.
    /// Without `timeout` the hub's [`wait_timeout`](Self::wait_timeout)
    /// applies.
    pub fn wait_for(
        &self,
        event_type: impl Into<String>,
        timeout: Option<Duration>,
        filter: Option<EventFilter>,
    ) -> impl Future<Output = EventResult<Event>> + Send + 'static {
        let event_type = event_type.into();
        let timeout = timeout.unwrap_or(self.inner.wait_timeout);
        let (tx, rx) = oneshot::channel();
        let slot = Mutex::new(Some(tx));

        let id = self.on(event_type.clone(), move |event| {
            if filter.as_ref().map_or(true, |accept| accept(event)) {
                if let Some(tx) = slot.lock().take() {
                    let _ = tx.send(event.clone());
                }
            }
            Ok(())
        });

        let guard = ListenerGuard {
            system: self.clone(),
            id,
        };
        async move {
            let outcome = tokio::time::timeout(timeout, rx).await;
            drop(guard);
            match outcome {
                Ok(Ok(event)) => Ok(event),
                Ok(Err(_)) => Err(EventError::ListenerRemoved { event_type }),
                Err(_) => Err(EventError::Timeout { event_type, timeout }),
            }
        }
    }

    /// Runs `operation`, emitting `<name>.started` before and
    /// `<name>.completed` or `<name>.failed` after.
    pub async fn instrument<T, E, F>(&self, name: &str, source: &str, operation: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.emit(Event::new(format!("{name}.started"), source)).await;
        let start = Instant::now();
        let result = operation.await;
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let event = match &result {
            Ok(_) => Event::new(format!("{name}.completed"), source),
            Err(err) => Event::new(format!("{name}.failed"), source).with_payload("error", err.to_string()),
        };
        self.emit(event.with_payload("durationMs", duration_ms)).await;
        result
    }

    /// Returns the number of listeners for a type.
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.inner
            .state
            .lock()
            .listeners
            .get(event_type)
            .map_or(0, Vec::len)
    }

    /// Returns the types that have listeners, sorted.
    pub fn event_types(&self) -> Vec<String> {
        let mut types: Vec<_> = self.inner.state.lock().listeners.keys().cloned().collect();
        types.sort();
        types
    }

    /// Removes the listeners of one type, or all listeners.
    pub fn remove_all_listeners(&self, event_type: Option<&str>) {
        let mut state = self.inner.state.lock();
        match event_type {
            Some(event_type) => {
                state.listeners.remove(event_type);
            }
            None => state.listeners.clear(),
        }
    }

    /// Drops the recorded history.
    pub fn clear_history(&self) {
        self.inner.state.lock().history.clear();
    }
}
