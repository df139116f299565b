//! Metrics collection and exposition.
//!
//! # Metrics
//! - `identity_events_total` (counter): raised events by category and type
//! - `identity_signing_certificate_health` (gauge): 1 for the current state,
//!   0 for the others
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

const CERTIFICATE_STATES: &[&str] = &["missing", "private_key_inaccessible", "expiring_soon", "valid"];

/// Install the Prometheus recorder with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| e.to_string())?;

    ::metrics::describe_counter!("identity_events_total", "Events raised by the identity server");
    ::metrics::describe_gauge!(
        "identity_signing_certificate_health",
        "Health of the signing certificate at startup"
    );
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

pub fn record_event(category: &'static str, event_type: &'static str) {
    ::metrics::counter!("identity_events_total", "category" => category, "type" => event_type)
        .increment(1);
}

pub fn record_certificate_health(state: &'static str) {
    for candidate in CERTIFICATE_STATES {
        let value = if *candidate == state { 1.0 } else { 0.0 };
        ::metrics::gauge!("identity_signing_certificate_health", "state" => *candidate).set(value);
    }
}
