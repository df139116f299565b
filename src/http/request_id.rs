//! Request correlation.
//!
//! # Responsibilities
//! - Assign an `x-request-id` to every request that lacks one
//! - Open a tracing span carrying the id
//! - Echo the id on the response
//!
//! # Design Decisions
//! - A client-supplied id is kept so that callers can correlate across hops

use axum::body::Body;
use axum::http::{HeaderName, Request};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::pipeline::{AssemblyContext, StageError, StageFactory, StageLayer};

pub const X_REQUEST_ID: &str = "x-request-id";

fn request_span(request: &Request<Body>) -> tracing::Span {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}

/// Installs request id assignment, request tracing and id propagation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdStage;

impl StageFactory for RequestIdStage {
    fn build(&self, _ctx: &AssemblyContext) -> Result<StageLayer, StageError> {
        let header = HeaderName::from_static(X_REQUEST_ID);
        let layers = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(header.clone(), MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(PropagateRequestIdLayer::new(header));
        Ok(Box::new(move |router| router.layer(layers)))
    }
}
