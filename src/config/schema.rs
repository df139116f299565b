//! Configuration schema definitions.
//!
//! This module defines the file-level configuration of the identity server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::constants::PRIMARY_AUTHENTICATION_TYPE;

/// Root configuration for the identity server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Display name of the server (used in the discovery document).
    pub site_name: String,

    /// Reject any request that did not arrive over TLS.
    pub require_ssl: bool,

    /// Externally visible origin (e.g., "https://id.example.com").
    /// When unset the base URL is derived from each request.
    pub public_host_name: Option<String>,

    /// Explicit token issuer identifier. Defaults to the base URL.
    pub issuer_uri: Option<String>,

    /// URLs rendered on sign-out so that relying parties can end their sessions.
    pub protocol_logout_urls: Vec<String>,

    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Cross-origin policy.
    pub cors: CorsConfig,

    /// Authentication settings.
    pub authentication: AuthenticationConfig,

    /// Data protection settings.
    pub data_protection: DataProtectionConfig,

    /// Token signing material.
    pub signing: SigningConfig,

    /// Static file serving.
    pub static_files: StaticFilesConfig,

    /// Which event types are raised.
    pub events: EventsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            site_name: "Identity Server".to_string(),
            require_ssl: true,
            public_host_name: None,
            issuer_uri: None,
            protocol_logout_urls: Vec::new(),
            listener: ListenerConfig::default(),
            cors: CorsConfig::default(),
            authentication: AuthenticationConfig::default(),
            data_protection: DataProtectionConfig::default(),
            signing: SigningConfig::default(),
            static_files: StaticFilesConfig::default(),
            events: EventsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:44333").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Honor `X-Forwarded-Proto` when deciding whether a request is secure.
    /// Only enable behind a trusted reverse proxy.
    pub trust_forwarded_headers: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:44333".to_string(),
            tls: None,
            trust_forwarded_headers: false,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Cross-origin resource sharing policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. `"*"` allows any origin.
    pub allowed_origins: Vec<String>,

    /// Allowed methods.
    pub allowed_methods: Vec<String>,

    /// Allowed request headers. `"*"` allows any header.
    pub allowed_headers: Vec<String>,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: u64,

    /// Allow cookies and authorization headers on cross-origin requests.
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            allowed_methods: vec!["GET".to_string(), "POST".to_string()],
            allowed_headers: vec!["*".to_string()],
            max_age_secs: 3600,
            allow_credentials: false,
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthenticationConfig {
    /// Options for the primary authentication cookie.
    pub cookie: CookieOptions,
}

/// When the authentication cookie carries the `Secure` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CookieSecureMode {
    /// Always mark the cookie secure.
    Always,
    /// Mark the cookie secure only when the request was secure.
    SameAsRequest,
}

/// Authentication cookie options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CookieOptions {
    /// Cookie name.
    pub name: String,

    /// Cookie path.
    pub path: String,

    /// Session lifetime in seconds.
    pub expire_secs: u64,

    /// Secure attribute policy.
    pub secure: CookieSecureMode,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            name: PRIMARY_AUTHENTICATION_TYPE.to_string(),
            path: "/".to_string(),
            expire_secs: 10 * 60 * 60,
            secure: CookieSecureMode::SameAsRequest,
        }
    }
}

/// Data protection configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DataProtectionConfig {
    /// Base64-encoded key (at least 32 bytes). A random key is generated
    /// when unset, which invalidates cookies on every restart.
    pub key: Option<String>,
}

/// Token signing configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Path to the signing certificate (PEM).
    pub certificate_path: Option<String>,

    /// Path to the signing private key (PEM).
    pub private_key_path: Option<String>,
}

/// Static file configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Serve `/assets` from this directory instead of the embedded files.
    pub directory: Option<String>,
}

/// Controls which event types reach the event sink.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Raise success events (e.g. certificate validated).
    pub raise_success_events: bool,

    /// Raise failure events.
    pub raise_failure_events: bool,

    /// Raise informational events.
    pub raise_information_events: bool,

    /// Raise error events (e.g. private key not accessible).
    pub raise_error_events: bool,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            raise_success_events: true,
            raise_failure_events: true,
            raise_information_events: true,
            raise_error_events: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
