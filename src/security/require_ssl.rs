//! HTTPS enforcement.
//!
//! # Responsibilities
//! - Decide whether a request arrived over TLS
//! - Reject insecure requests before any other stage sees them
//!
//! # Design Decisions
//! - `X-Forwarded-Proto` is only trusted when explicitly enabled
//! - Insecure requests get 403, never a redirect that would leak credentials

use axum::{
    extract::{Request, State},
    http::{header::CONTENT_TYPE, uri::Scheme, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};

use crate::net::tls::TlsConnection;
use crate::pipeline::{AssemblyContext, StageError, StageFactory, StageLayer};

pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Whether the request was received over TLS.
pub fn is_secure_request<B>(request: &axum::http::Request<B>, trust_forwarded: bool) -> bool {
    if request.uri().scheme() == Some(&Scheme::HTTPS) {
        return true;
    }
    if request.extensions().get::<TlsConnection>().is_some() {
        return true;
    }
    trust_forwarded
        && request
            .headers()
            .get(X_FORWARDED_PROTO)
            .and_then(|v| v.to_str().ok())
            .map(|proto| proto.trim().eq_ignore_ascii_case("https"))
            .unwrap_or(false)
}

async fn require_ssl_middleware(
    State(trust_forwarded): State<bool>,
    request: Request,
    next: Next,
) -> Response {
    if is_secure_request(&request, trust_forwarded) {
        return next.run(request).await;
    }

    tracing::debug!(path = %request.uri().path(), "Rejecting non-TLS request");
    (
        StatusCode::FORBIDDEN,
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        "HTTPS required",
    )
        .into_response()
}

/// Installs HTTPS enforcement.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireSslStage;

impl StageFactory for RequireSslStage {
    fn build(&self, ctx: &AssemblyContext) -> Result<StageLayer, StageError> {
        let trust_forwarded = ctx.options.config.listener.trust_forwarded_headers;
        Ok(Box::new(move |router| {
            router.layer(middleware::from_fn_with_state(trust_forwarded, require_ssl_middleware))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn test_scheme_detection() {
        assert!(is_secure_request(&request("https://id.example.com/"), false));
        assert!(!is_secure_request(&request("http://id.example.com/"), false));
        assert!(!is_secure_request(&request("/relative"), false));
    }

    #[test]
    fn test_tls_marker() {
        let mut req = request("/relative");
        req.extensions_mut().insert(TlsConnection);
        assert!(is_secure_request(&req, false));
    }

    #[test]
    fn test_forwarded_proto_requires_trust() {
        let req = axum::http::Request::builder()
            .uri("/relative")
            .header(X_FORWARDED_PROTO, "HTTPS")
            .body(Body::empty())
            .unwrap();
        assert!(!is_secure_request(&req, false));
        assert!(is_secure_request(&req, true));
    }
}
