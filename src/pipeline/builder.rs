//! The application pipeline builder.
//!
//! # Responsibilities
//! - Record stages in installation order
//! - Guard the relative order of the core stages
//! - Carry shared properties between the assembler, hooks and the host
//! - Fold the recorded stages into an axum `Router`
//!
//! # Design Decisions
//! - Core stages declare a rank; installing one whose rank does not exceed
//!   the last installed core stage fails instead of silently reordering
//! - Extension stages (host or plugin supplied) are unranked
//! - The first installed stage becomes the outermost layer
//!
//! # Data Flow
//! ```text
//! install(RequireSsl) -> install(RequestId) -> ... -> install(CoreApi)
//!                              |
//!                           build()
//!                              |
//! Router = RequireSsl(RequestId(...(CoreApi routes)))
//! ```

use std::fmt;

use axum::http::Extensions;
use axum::Router;

use crate::pipeline::error::StageError;

/// Deferred installation of one stage onto the router.
pub type StageLayer = Box<dyn FnOnce(Router) -> Router + Send>;

/// Identifies an installed stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    RequireSsl,
    RequestId,
    DataProtection,
    ServerUrls,
    Cors,
    CookieAuthentication,
    DependencyScope,
    StaticFiles,
    CoreApi,
    /// A stage added by the host or by a hook.
    Extension(&'static str),
}

impl StageKind {
    /// Relative position of a core stage. `None` for extension stages.
    pub fn rank(&self) -> Option<u8> {
        match self {
            Self::RequireSsl => Some(0),
            Self::RequestId => Some(1),
            Self::DataProtection => Some(2),
            Self::ServerUrls => Some(3),
            Self::Cors => Some(4),
            Self::CookieAuthentication => Some(5),
            Self::DependencyScope => Some(6),
            Self::StaticFiles => Some(7),
            Self::CoreApi => Some(8),
            Self::Extension(_) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::RequireSsl => "require_ssl",
            Self::RequestId => "request_id",
            Self::DataProtection => "data_protection",
            Self::ServerUrls => "server_urls",
            Self::Cors => "cors",
            Self::CookieAuthentication => "cookie_authentication",
            Self::DependencyScope => "dependency_scope",
            Self::StaticFiles => "static_files",
            Self::CoreApi => "core_api",
            Self::Extension(name) => *name,
        }
    }

    pub fn is_core(&self) -> bool {
        self.rank().is_some()
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered stage registrations plus a property bag.
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<(StageKind, StageLayer)>,
    last_core: Option<StageKind>,
    properties: Extensions,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage. Core stages must be installed in rank order.
    pub fn install(&mut self, kind: StageKind, layer: StageLayer) -> Result<&mut Self, StageError> {
        if let (Some(rank), Some(last)) = (kind.rank(), self.last_core) {
            if last.rank().is_some_and(|last_rank| last_rank >= rank) {
                return Err(StageError::OutOfOrder { stage: kind, after: last });
            }
        }
        if kind.is_core() {
            self.last_core = Some(kind);
        }
        self.stages.push((kind, layer));
        Ok(self)
    }

    /// Append an unranked extension stage.
    pub fn use_stage<F>(&mut self, name: &'static str, apply: F) -> &mut Self
    where
        F: FnOnce(Router) -> Router + Send + 'static,
    {
        self.stages.push((StageKind::Extension(name), Box::new(apply)));
        self
    }

    /// Installed stages, in installation order.
    pub fn stage_kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(|(kind, _)| *kind).collect()
    }

    pub fn contains(&self, kind: StageKind) -> bool {
        self.stages.iter().any(|(k, _)| *k == kind)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn properties(&self) -> &Extensions {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut Extensions {
        &mut self.properties
    }

    /// Compose the stages into a router; the first stage is outermost.
    pub fn build(self) -> Router {
        tracing::debug!(stages = self.stages.len(), "Building request pipeline");
        self.stages
            .into_iter()
            .rev()
            .fold(Router::new(), |router, (_, apply)| apply(router))
    }
}

impl fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("stages", &self.stage_kinds())
            .finish_non_exhaustive()
    }
}
