//! CORS stage.
//!
//! Wrapper around tower-http CORS driven by the `[cors]` section.

use std::time::Duration;

use axum::http::{request::Parts, HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, Any, CorsLayer};

use crate::config::schema::CorsConfig;
use crate::pipeline::{AssemblyContext, StageError, StageFactory, StageLayer};

/// Create the CORS layer from configuration.
pub fn create_cors_layer(config: &CorsConfig) -> Result<CorsLayer, StageError> {
    let wildcard_origin = config.allowed_origins.iter().any(|o| o == "*");
    if wildcard_origin && config.allow_credentials {
        return Err(StageError::InvalidSetting {
            setting: "cors.allow_credentials",
            message: "cannot be combined with a wildcard origin".to_string(),
        });
    }

    let allow_origin = if wildcard_origin {
        AllowOrigin::any()
    } else {
        let allowed: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| {
                parse_entry("origin", o, |o| o.trim_end_matches('/').parse::<HeaderValue>().ok())
            })
            .collect();
        AllowOrigin::predicate(move |origin: &HeaderValue, _parts: &Parts| {
            let is_allowed = allowed.contains(origin);
            if !is_allowed {
                tracing::warn!(
                    origin = %origin.to_str().unwrap_or("<non-utf8>"),
                    "CORS origin rejected"
                );
            }
            is_allowed
        })
    };

    let methods: Vec<Method> = config
        .allowed_methods
        .iter()
        .filter_map(|m| parse_entry("method", m, |m| m.parse::<Method>().ok()))
        .collect();

    // Wildcard headers are not allowed together with credentials; mirror instead.
    let wildcard_headers = config.allowed_headers.iter().any(|h| h == "*");
    let allow_headers = match (wildcard_headers, config.allow_credentials) {
        (true, true) => AllowHeaders::mirror_request(),
        (true, false) => AllowHeaders::from(Any),
        (false, _) => {
            let headers: Vec<HeaderName> = config
                .allowed_headers
                .iter()
                .filter_map(|h| parse_entry("header", h, |h| h.parse::<HeaderName>().ok()))
                .collect();
            AllowHeaders::list(headers)
        }
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(methods)
        .allow_headers(allow_headers)
        .allow_credentials(config.allow_credentials)
        .max_age(Duration::from_secs(config.max_age_secs)))
}

/// Parse one configured entry, logging it when it is dropped.
fn parse_entry<T>(kind: &'static str, raw: &str, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
    let parsed = parse(raw);
    if parsed.is_none() {
        tracing::warn!(kind, entry = %raw, "Ignoring unparseable CORS entry");
    }
    parsed
}

/// Installs CORS handling using the configured policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorsStage;

impl StageFactory for CorsStage {
    fn build(&self, ctx: &AssemblyContext) -> Result<StageLayer, StageError> {
        let layer = create_cors_layer(&ctx.options.config.cors)?;
        Ok(Box::new(move |router| router.layer(layer)))
    }
}
