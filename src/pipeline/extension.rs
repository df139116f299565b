//! Caller-supplied pipeline extensions.

use std::fmt;
use std::sync::Arc;

use crate::config::options::ServerOptions;
use crate::pipeline::builder::PipelineBuilder;
use crate::pipeline::error::StageError;

pub type PluginHook =
    Arc<dyn Fn(&mut PipelineBuilder, &ServerOptions) -> Result<(), StageError> + Send + Sync>;

pub type IdentityProviderHook =
    Arc<dyn Fn(&mut PipelineBuilder, &str) -> Result<(), StageError> + Send + Sync>;

/// A hook run during assembly, after the dependency scope stage and before
/// static files. Plugins run first, then identity providers, each group in
/// registration order.
#[derive(Clone)]
pub enum PipelineExtension {
    /// Adds arbitrary stages. Receives the server options.
    Plugin(PluginHook),
    /// Registers federated login handlers. Receives the external
    /// authentication scheme name.
    IdentityProviders(IdentityProviderHook),
}

impl PipelineExtension {
    pub fn plugin<F>(hook: F) -> Self
    where
        F: Fn(&mut PipelineBuilder, &ServerOptions) -> Result<(), StageError> + Send + Sync + 'static,
    {
        Self::Plugin(Arc::new(hook))
    }

    pub fn identity_providers<F>(hook: F) -> Self
    where
        F: Fn(&mut PipelineBuilder, &str) -> Result<(), StageError> + Send + Sync + 'static,
    {
        Self::IdentityProviders(Arc::new(hook))
    }
}

impl fmt::Debug for PipelineExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plugin(_) => f.write_str("Plugin"),
            Self::IdentityProviders(_) => f.write_str("IdentityProviders"),
        }
    }
}
