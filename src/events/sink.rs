//! Event output.

use crate::events::model::{Event, EventType};
use crate::observability::metrics;

/// Destination for raised events.
pub trait EventSink: Send + Sync {
    fn write(&self, event: &Event);
}

/// Writes events as structured log lines and counts them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn write(&self, event: &Event) {
        metrics::record_event(event.category, event.event_type.as_str());

        let json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(event_id = event.id, error = %e, "Failed to serialize event");
                return;
            }
        };

        match event.event_type {
            EventType::Error | EventType::Failure => {
                tracing::error!(target: "identity_server::events", event_id = event.id, name = event.name, "{}", json)
            }
            EventType::Success | EventType::Information => {
                tracing::info!(target: "identity_server::events", event_id = event.id, name = event.name, "{}", json)
            }
        }
    }
}
