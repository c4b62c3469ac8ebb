//! Event values and the well-known event types.

use crate::error::{EventError, EventResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;
use uuid::Uuid;

/// Event types emitted by the middleware pipeline.
pub mod types {
    /// A middleware was registered.
    pub const MIDDLEWARE_REGISTERED: &str = "pipeline.middleware_registered";
    /// An execution started.
    pub const PIPELINE_STARTED: &str = "pipeline.started";
    /// A stage failed while errors were being collected.
    pub const MIDDLEWARE_ERROR: &str = "pipeline.middleware_error";
    /// An execution finished without a recorded error.
    pub const PIPELINE_COMPLETED: &str = "pipeline.completed";
    /// An execution finished with a recorded error.
    pub const PIPELINE_COMPLETED_WITH_ERRORS: &str = "pipeline.completed_with_errors";
    /// An execution was aborted.
    pub const PIPELINE_FAILED: &str = "pipeline.failed";
}

/// Envelope keys that payload fields may not use.
pub const RESERVED_KEYS: [&str; 4] = ["id", "type", "timestamp", "source"];

fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// A published event.
///
/// `event_type` is the only dispatch key. Payload fields are flattened next
/// to the envelope when serialized and never use a [`RESERVED_KEYS`] name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique id (UUID v7 unless overridden).
    pub id: String,
    /// Dot-namespaced type tag.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Emitting component.
    pub source: String,
    /// Type-specific fields.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Event {
    /// Creates an event with an empty payload.
    pub fn new(event_type: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            source: source.into(),
            payload: Map::new(),
        }
    }

    /// Creates an event whose payload is a serialized value.
    ///
    /// Objects become the payload directly; any other value is stored under
    /// `data`.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Payload`] if the value cannot be serialized or
    /// an object field uses one of the [`RESERVED_KEYS`].
    pub fn typed<T: Serialize>(
        event_type: impl Into<String>,
        source: impl Into<String>,
        payload: &T,
    ) -> EventResult<Self> {
        let mut event = Self::new(event_type, source);
        let value = serde_json::to_value(payload).map_err(|e| EventError::Payload {
            event_type: event.event_type.clone(),
            reason: e.to_string(),
        })?;
        match value {
            Value::Object(map) => {
                if let Some(key) = map.keys().find(|key| is_reserved(key)) {
                    return Err(EventError::Payload {
                        event_type: event.event_type,
                        reason: format!("field '{key}' collides with the event envelope"),
                    });
                }
                event.payload = map;
            }
            other => {
                event.payload.insert("data".to_string(), other);
            }
        }
        Ok(event)
    }

    /// Overrides the generated id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Adds a payload field.
    ///
    /// Fields named after a [`RESERVED_KEYS`] entry are dropped with a
    /// warning; use [`with_id`](Self::with_id) to change the id.
    pub fn with_payload(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if is_reserved(&key) {
            warn!(event_type = %self.event_type, key = %key, "reserved payload key ignored");
            return self;
        }
        self.payload.insert(key, value.into());
        self
    }

    /// Returns a payload field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Started {
        middleware_count: usize,
    }

    #[derive(Serialize)]
    struct PatientSynced {
        id: String,
    }

    #[test]
    fn test_new_event_has_unique_ids() {
        let a = Event::new("x", "test");
        let b = Event::new("x", "test");
        assert_ne!(a.id, b.id);
        assert_eq!(a.event_type, "x");
        assert_eq!(a.source, "test");
    }

    #[test]
    fn test_typed_object_payload() {
        let event = Event::typed("pipeline.started", "pipeline", &Started { middleware_count: 3 }).unwrap();
        assert_eq!(event.get("middleware_count"), Some(&json!(3)));
    }

    #[test]
    fn test_typed_scalar_payload() {
        let event = Event::typed("x", "test", &42).unwrap();
        assert_eq!(event.get("data"), Some(&json!(42)));
    }

    #[test]
    fn test_serialized_shape_is_flat() {
        let event = Event::new("user.created", "api")
            .with_id("evt-1")
            .with_payload("userId", "u-1");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["id"], "evt-1");
        assert_eq!(value["type"], "user.created");
        assert_eq!(value["userId"], "u-1");

        let back: Event = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_typed_rejects_envelope_fields() {
        let err = Event::typed("patient.synced", "poller", &PatientSynced { id: "p-1".to_string() })
            .unwrap_err();
        assert!(matches!(
            err,
            EventError::Payload { ref event_type, ref reason }
                if event_type == "patient.synced" && reason.contains("'id'")
        ));
    }

    #[test]
    fn test_reserved_payload_keys_ignored() {
        let event = Event::new("x", "src")
            .with_id("real")
            .with_payload("id", "shadow")
            .with_payload("type", "y")
            .with_payload("kept", 1);
        assert_eq!(event.get("id"), None);
        assert_eq!(event.get("kept"), Some(&json!(1)));

        let text = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&text).unwrap();
        assert_eq!(back.id, "real");
        assert_eq!(back.event_type, "x");
        assert_eq!(back, event);
    }
}
