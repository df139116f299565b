//! Token signing credentials.
//!
//! # Data Flow
//! ```text
//! [signing] certificate_path + private_key_path
//!     → signing.rs (PEM → DER, X.509 parse, key check)
//!     → SigningCredential (subject, thumbprint, not_after, key accessibility)
//!     → ServerOptions → certificate diagnostics at startup
//! ```

pub mod signing;

pub use signing::{CredentialError, SigningCredential};
