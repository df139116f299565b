//! HTTP hosting and request-level stages.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     -> server.rs (Axum hosting, graceful shutdown)
//!     -> request_id.rs (assign x-request-id, tracing span)
//!     -> server_urls.rs (public base URL and issuer)
//!     -> remaining pipeline stages
//! ```

pub mod request_id;
pub mod server;
pub mod server_urls;

pub use request_id::{RequestIdStage, X_REQUEST_ID};
pub use server::HttpServer;
pub use server_urls::{ServerUrlResolver, ServerUrls, ServerUrlsStage};
