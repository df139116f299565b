//! Public URLs of the server.
//!
//! Handlers emit absolute URLs (discovery document, redirects) and need to
//! know how the server is reached from the outside. When a public host name
//! is configured it always wins; otherwise the URL is derived per request.

use axum::{
    extract::{Request, State},
    http::header::HOST,
    middleware::{self, Next},
    response::Response,
};

use crate::pipeline::{AssemblyContext, StageError, StageFactory, StageLayer};
use crate::security::require_ssl::is_secure_request;

/// Base URL and issuer for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerUrls {
    /// Always ends with `/`.
    pub base_url: String,
    pub issuer: String,
}

impl ServerUrls {
    pub fn new(base_url: &str, issuer_uri: Option<&str>) -> Self {
        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let issuer = issuer_uri
            .map(str::to_string)
            .unwrap_or_else(|| base_url.trim_end_matches('/').to_string());
        Self { base_url, issuer }
    }

    /// Absolute URL for a path under the base URL.
    pub fn absolute(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// How server URLs are determined.
#[derive(Debug, Clone)]
pub enum ServerUrlResolver {
    Fixed(ServerUrls),
    PerRequest {
        issuer_uri: Option<String>,
        trust_forwarded: bool,
    },
}

impl ServerUrlResolver {
    pub fn resolve<B>(&self, request: &axum::http::Request<B>) -> ServerUrls {
        match self {
            Self::Fixed(urls) => urls.clone(),
            Self::PerRequest {
                issuer_uri,
                trust_forwarded,
            } => {
                let scheme = if is_secure_request(request, *trust_forwarded) {
                    "https"
                } else {
                    "http"
                };
                let host = request
                    .headers()
                    .get(HOST)
                    .and_then(|v| v.to_str().ok())
                    .or_else(|| request.uri().authority().map(|a| a.as_str()))
                    .unwrap_or("localhost");
                ServerUrls::new(&format!("{}://{}", scheme, host), issuer_uri.as_deref())
            }
        }
    }
}

async fn server_urls_middleware(
    State(resolver): State<ServerUrlResolver>,
    mut request: Request,
    next: Next,
) -> Response {
    let urls = resolver.resolve(&request);
    request.extensions_mut().insert(urls);
    next.run(request).await
}

/// Installs public URL resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerUrlsStage;

impl StageFactory for ServerUrlsStage {
    fn build(&self, ctx: &AssemblyContext) -> Result<StageLayer, StageError> {
        let config = &ctx.options.config;
        let resolver = match config.public_host_name.as_deref() {
            Some(host) => {
                let parsed = url::Url::parse(host).map_err(|e| StageError::InvalidSetting {
                    setting: "public_host_name",
                    message: e.to_string(),
                })?;
                ServerUrlResolver::Fixed(ServerUrls::new(parsed.as_str(), config.issuer_uri.as_deref()))
            }
            None => ServerUrlResolver::PerRequest {
                issuer_uri: config.issuer_uri.clone(),
                trust_forwarded: config.listener.trust_forwarded_headers,
            },
        };
        tracing::debug!(resolver = ?resolver, "Server URL resolution configured");
        Ok(Box::new(move |router| {
            router.layer(middleware::from_fn_with_state(resolver, server_urls_middleware))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_issuer_defaults_to_base_url() {
        let urls = ServerUrls::new("https://id.example.com", None);
        assert_eq!(urls.base_url, "https://id.example.com/");
        assert_eq!(urls.issuer, "https://id.example.com");
        assert_eq!(
            urls.absolute("/connect/endsession/callback"),
            "https://id.example.com/connect/endsession/callback"
        );
    }

    #[test]
    fn test_explicit_issuer() {
        let urls = ServerUrls::new("https://id.example.com/core/", Some("urn:issuer"));
        assert_eq!(urls.base_url, "https://id.example.com/core/");
        assert_eq!(urls.issuer, "urn:issuer");
    }

    #[test]
    fn test_per_request_resolution() {
        let resolver = ServerUrlResolver::PerRequest {
            issuer_uri: None,
            trust_forwarded: true,
        };
        let request = axum::http::Request::builder()
            .uri("/")
            .header(HOST, "login.example.com:8443")
            .header("x-forwarded-proto", "https")
            .body(Body::empty())
            .unwrap();
        let urls = resolver.resolve(&request);
        assert_eq!(urls.base_url, "https://login.example.com:8443/");

        let bare = axum::http::Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(resolver.resolve(&bare).base_url, "http://localhost/");
    }
}
