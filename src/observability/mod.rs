//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     -> logging.rs (structured log events)
//!     -> metrics.rs (counters, gauges)
//!
//! Consumers:
//!     -> Log aggregation (stdout)
//!     -> Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every request span
//! - Events are logged and counted by the event sink

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LoggingError};
pub use metrics::init_metrics;
