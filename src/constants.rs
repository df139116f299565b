//! Fixed identifiers shared across the pipeline.

/// Route paths served by the core API.
pub mod routes {
    pub const DISCOVERY_CONFIGURATION: &str = "/.well-known/openid-configuration";
    pub const END_SESSION_CALLBACK: &str = "/connect/endsession/callback";
    pub const ASSETS: &str = "/assets";
}

/// Authentication scheme used by the primary session cookie.
pub const PRIMARY_AUTHENTICATION_TYPE: &str = "idsrv";

/// Authentication scheme handed to external identity provider registrations.
pub const EXTERNAL_AUTHENTICATION_TYPE: &str = "idsrv.external";
