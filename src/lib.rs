//! Identity server bootstrap.
//!
//! Assembles the request pipeline of an identity/token-issuance server in a
//! fixed, security-relevant order and checks the signing certificate before
//! any traffic is served.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!         -> require_ssl -> request_id -> data_protection -> server_urls
//!         -> cors -> cookie_authentication -> dependency_scope
//!         -> [plugin stages] -> [identity provider stages]
//!         -> static_files -> core_api
//!
//!     Startup
//!         config -> ServerOptions -> PipelineAssembler -> certificate diagnostics
//! ```

// Core subsystems
pub mod config;
pub mod constants;
pub mod container;
pub mod pipeline;

// Identity
pub mod credentials;
pub mod diagnostics;
pub mod events;
pub mod tokens;

// Stages
pub mod api;
pub mod assets;
pub mod http;
pub mod net;
pub mod security;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::{ServerConfig, ServerOptions};
pub use diagnostics::CertificateHealth;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::{use_identity_server, PipelineBuilder, StartupError, UseIdentityServer};
