//! Event raising API.

use std::sync::Arc;

use crate::config::schema::EventsConfig;
use crate::container::RequestContext;
use crate::credentials::SigningCredential;
use crate::events::model::{Event, EventType};
use crate::events::sink::EventSink;

/// Notification API used by the server to report auditable events.
///
/// Calls are fire-and-forget; implementations must not fail the caller.
pub trait EventService: Send + Sync {
    /// Raise an arbitrary event.
    fn raise(&self, event: Event);

    fn raise_no_certificate_configured(&self) {
        self.raise(Event::no_certificate_configured());
    }

    fn raise_certificate_private_key_not_accessible(&self, credential: &SigningCredential) {
        self.raise(Event::certificate_private_key_not_accessible(credential));
    }

    fn raise_certificate_expiring_soon(&self, credential: &SigningCredential) {
        self.raise(Event::certificate_expiring_soon(credential));
    }

    fn raise_certificate_validated(&self, credential: &SigningCredential) {
        self.raise(Event::certificate_validated(credential));
    }
}

/// Scoped event service: stamps the scope's request context, applies the
/// configured filter and forwards to the sink.
pub struct DefaultEventService {
    config: EventsConfig,
    context: RequestContext,
    sink: Arc<dyn EventSink>,
}

impl DefaultEventService {
    pub fn new(config: EventsConfig, context: RequestContext, sink: Arc<dyn EventSink>) -> Self {
        Self { config, context, sink }
    }

    fn can_raise(&self, event_type: EventType) -> bool {
        match event_type {
            EventType::Success => self.config.raise_success_events,
            EventType::Failure => self.config.raise_failure_events,
            EventType::Information => self.config.raise_information_events,
            EventType::Error => self.config.raise_error_events,
        }
    }
}

impl EventService for DefaultEventService {
    fn raise(&self, mut event: Event) {
        if !self.can_raise(event.event_type) {
            tracing::trace!(event_id = event.id, "Event type disabled, not raised");
            return;
        }
        event.context.activity_id = self.context.request_id.clone();
        self.sink.write(&event);
    }
}
