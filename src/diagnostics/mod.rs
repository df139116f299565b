//! Startup diagnostics.
//!
//! Runs once per process after the pipeline is assembled. Degraded states
//! are reported through logging and the event service; none of them abort
//! startup.

pub mod certificate;

pub use certificate::{check_signing_certificate, CertificateHealth, EXPIRY_WARNING_WINDOW};
