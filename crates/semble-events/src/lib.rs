//! # Semble Events
//!
//! Publish/subscribe hub used for lifecycle notifications across the Semble
//! integration layer.
//!
//! - Listeners are ordered by descending priority, ties by registration order
//! - One-shot and source-filtered listeners
//! - Bounded history of emitted events
//! - [`EventSystem::wait_for`] with a deadline
//!
//! ## Example
//!
//! ```rust
//! use semble_events::{Event, EventSystem};
//!
//! # async fn example() {
//! let events = EventSystem::new();
//! events.on("patient.synced", |event| {
//!     println!("synced {}", event.id);
//!     Ok(())
//! });
//!
//! events.emit(Event::new("patient.synced", "poller")).await;
//! assert_eq!(events.history(Some("patient.synced"), None).len(), 1);
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/semble-events/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod event;
mod system;

pub use error::{EventError, EventResult, ListenerError};
pub use event::{types, Event, RESERVED_KEYS};
pub use system::{
    AsyncHandler, EventFilter, EventSystem, Handler, ListenerId, ListenerOptions, SyncHandler,
    DEFAULT_HISTORY_CAPACITY, DEFAULT_WAIT_TIMEOUT,
};
