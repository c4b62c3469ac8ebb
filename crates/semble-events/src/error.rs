//! Error types for the event system.

use std::time::Duration;
use thiserror::Error;

/// Result type for event operations.
pub type EventResult<T> = Result<T, EventError>;

/// Errors surfaced to callers of the event system.
///
/// Listener failures never show up here; they are logged and isolated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// No matching event arrived before the deadline.
    #[error("timed out after {timeout:?} waiting for event '{event_type}'")]
    Timeout {
        /// Awaited event type.
        event_type: String,
        /// Deadline that elapsed.
        timeout: Duration,
    },

    /// The waiting listener was removed before a matching event arrived.
    #[error("listener for event '{event_type}' was removed while waiting")]
    ListenerRemoved {
        /// Awaited event type.
        event_type: String,
    },

    /// A typed payload could not be serialized.
    #[error("failed to serialize payload for event '{event_type}': {reason}")]
    Payload {
        /// Event type being built.
        event_type: String,
        /// Serializer message.
        reason: String,
    },
}

impl EventError {
    /// Returns `true` for the timeout kind.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// A failure reported by a single listener.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ListenerError(pub String);

impl ListenerError {
    /// Creates a listener error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = EventError::Timeout {
            event_type: "x".to_string(),
            timeout: Duration::from_millis(50),
        };
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "timed out after 50ms waiting for event 'x'");
    }

    #[test]
    fn test_listener_error_display() {
        assert_eq!(ListenerError::new("boom").to_string(), "boom");
    }
}
