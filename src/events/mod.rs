//! Event subsystem.
//!
//! # Data Flow
//! ```text
//! Server code (e.g., certificate diagnostics)
//!     → EventService (service.rs, resolved from a dependency scope)
//!     → filter by [events] toggles, stamp request context
//!     → EventSink (sink.rs) → structured log line + counter
//! ```
//!
//! # Design Decisions
//! - Raising an event never fails the caller
//! - The service is scoped so events carry the request correlation id
//! - The sink is replaceable for alerting integrations

pub mod model;
pub mod service;
pub mod sink;

pub use model::{CertificateDetails, Event, EventContext, EventType};
pub use service::{DefaultEventService, EventService};
pub use sink::{EventSink, TracingEventSink};
