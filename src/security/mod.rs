//! Security stages.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     -> require_ssl.rs (reject non-TLS requests)
//!     -> data_protection.rs (attach the protector)
//!     -> cors.rs (cross-origin policy)
//!     -> cookies.rs (read the primary session cookie)
//!     -> Pass to the remaining stages
//! ```
//!
//! # Design Decisions
//! - Fail closed: an insecure request never reaches a handler
//! - Cookie payloads are never trusted without a valid signature

pub mod cookies;
pub mod cors;
pub mod data_protection;
pub mod require_ssl;

pub use cookies::{
    clear_cookie, AuthenticatedSession, Claim, CookieAuthentication, CookieAuthenticationStage,
    RequestSecurity,
};
pub use cors::{create_cors_layer, CorsStage};
pub use data_protection::{
    DataProtection, DataProtectionError, DataProtectionStage, DataProtector, HmacDataProtector,
};
pub use require_ssl::{is_secure_request, RequireSslStage};
