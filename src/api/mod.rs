//! Core request handling.
//!
//! # Responsibilities
//! - Serve the discovery document
//! - Finish a sign-out: clear the primary cookie and render the logout page
//!
//! # Design Decisions
//! - Handlers read configuration through the request's dependency scope,
//!   never through globals

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header::SET_COOKIE, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;

use crate::config::options::ServerOptions;
use crate::constants::routes::{ASSETS, DISCOVERY_CONFIGURATION, END_SESSION_CALLBACK};
use crate::container::ServiceScope;
use crate::http::ServerUrls;
use crate::pipeline::{AssemblyContext, StageError, StageFactory, StageLayer};
use crate::security::{clear_cookie, RequestSecurity};

/// Discovery document.
#[derive(Debug, Serialize)]
pub struct DiscoveryDocument {
    pub issuer: String,
    pub end_session_callback: String,
    pub frontchannel_logout_supported: bool,
    pub frontchannel_logout_session_supported: bool,
}

async fn discovery(Extension(urls): Extension<ServerUrls>) -> Json<DiscoveryDocument> {
    Json(DiscoveryDocument {
        end_session_callback: urls.absolute(END_SESSION_CALLBACK),
        issuer: urls.issuer,
        frontchannel_logout_supported: true,
        frontchannel_logout_session_supported: true,
    })
}

async fn end_session_callback(request: Request) -> Response {
    let Some(scope) = request.extensions().get::<Arc<ServiceScope>>() else {
        tracing::error!("End session callback invoked without a dependency scope");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    let options = match scope.resolve::<ServerOptions>() {
        Ok(options) => options,
        Err(e) => {
            tracing::error!(error = %e, "Failed to resolve server options");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let secure = request
        .extensions()
        .get::<RequestSecurity>()
        .map(|s| s.secure)
        .unwrap_or(false);

    let cookie = match clear_cookie(&options.config.authentication.cookie, secure) {
        Ok(cookie) => cookie,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build sign-out cookie");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    tracing::info!(request_id = ?scope.context().request_id, "Session ended");
    ([(SET_COOKIE, cookie)], Html(signed_out_page(&options.config.site_name))).into_response()
}

fn signed_out_page(site_name: &str) -> String {
    let site_name = escape_html(site_name);
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{site_name}</title>\n\
         <link rel=\"stylesheet\" href=\"{ASSETS}/site.css\">\n</head>\n<body>\n\
         <div class=\"page\">\n<h1>{site_name}</h1>\n<p>You are now signed out.</p>\n</div>\n</body>\n</html>\n"
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Router with the core endpoints.
pub fn api_router() -> Router {
    Router::new()
        .route(DISCOVERY_CONFIGURATION, get(discovery))
        .route(END_SESSION_CALLBACK, get(end_session_callback))
}

/// Installs the core request-handling layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreApiStage;

impl StageFactory for CoreApiStage {
    fn build(&self, _ctx: &AssemblyContext) -> Result<StageLayer, StageError> {
        Ok(Box::new(|router| router.merge(api_router())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_out_page_escapes_site_name() {
        let page = signed_out_page("<Acme & Co>");
        assert!(page.contains("&lt;Acme &amp; Co&gt;"));
        assert!(page.contains("/assets/site.css"));
    }
}
