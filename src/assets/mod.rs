//! Static and embedded resources served under `/assets`.
//!
//! The stylesheet used by the server's own pages is compiled into the
//! binary. A configured directory replaces the embedded files entirely.

use std::path::Path;

use axum::{
    extract::Path as UrlPath,
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::services::ServeDir;

use crate::constants::routes::ASSETS;
use crate::pipeline::{AssemblyContext, StageError, StageFactory, StageLayer};

const EMBEDDED: &[(&str, &str, &str)] = &[("site.css", "text/css; charset=utf-8", include_str!("site.css"))];

async fn embedded_asset(UrlPath(file): UrlPath<String>) -> Response {
    match EMBEDDED.iter().find(|(name, _, _)| *name == file) {
        Some((_, content_type, body)) => ([(CONTENT_TYPE, *content_type)], *body).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Router serving `/assets`.
pub fn assets_router(directory: Option<&str>) -> Result<Router, StageError> {
    match directory {
        Some(dir) => {
            if !Path::new(dir).is_dir() {
                return Err(StageError::InvalidSetting {
                    setting: "static_files.directory",
                    message: format!("{} is not a directory", dir),
                });
            }
            tracing::info!(directory = %dir, "Serving assets from directory");
            Ok(Router::new().nest_service(ASSETS, ServeDir::new(dir)))
        }
        None => Ok(Router::new().route(&format!("{}/{{*file}}", ASSETS), get(embedded_asset))),
    }
}

/// Installs static file serving.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticFilesStage;

impl StageFactory for StaticFilesStage {
    fn build(&self, ctx: &AssemblyContext) -> Result<StageLayer, StageError> {
        let assets = assets_router(ctx.options.config.static_files.directory.as_deref())?;
        Ok(Box::new(move |router| router.merge(assets)))
    }
}
