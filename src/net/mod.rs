//! Network layer.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     -> tls.rs (optional TLS handshake, TlsConnection marker)
//!     -> Hand off to the HTTP layer
//! ```

pub mod tls;

pub use tls::{load_tls_config, TlsConnection};
