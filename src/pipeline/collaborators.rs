//! Collaborators consumed by the assembler.
//!
//! Each stage's behaviour lives behind a factory so that hosts and tests
//! can substitute their own. `Collaborators::default()` wires the built-in
//! implementations.

use std::sync::Arc;

use crate::api::CoreApiStage;
use crate::assets::StaticFilesStage;
use crate::config::options::ServerOptions;
use crate::config::validation::{validate_config, ValidationError};
use crate::container::graph::DefaultContainerBuilder;
use crate::container::ServiceContainer;
use crate::http::{RequestIdStage, ServerUrlsStage};
use crate::pipeline::builder::StageLayer;
use crate::pipeline::error::StageError;
use crate::security::{CookieAuthenticationStage, CorsStage, DataProtectionStage, RequireSslStage};
use crate::tokens::TokenHandlerSettings;

/// State shared with every factory during assembly.
#[derive(Clone)]
pub struct AssemblyContext {
    pub options: Arc<ServerOptions>,
    /// Claim handling for every collaborator that reads or writes claims.
    pub token_handling: TokenHandlerSettings,
}

pub trait ConfigValidator: Send + Sync {
    fn validate(&self, options: &ServerOptions) -> Result<(), Vec<ValidationError>>;
}

/// Builds one stage from the assembly context.
pub trait StageFactory: Send + Sync {
    fn build(&self, ctx: &AssemblyContext) -> Result<StageLayer, StageError>;
}

/// Builds the dependency-injection graph.
pub trait ContainerBuilder: Send + Sync {
    fn build(&self, ctx: &AssemblyContext) -> Result<Arc<ServiceContainer>, StageError>;
}

/// Validates the file-level configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConfigValidator;

impl ConfigValidator for DefaultConfigValidator {
    fn validate(&self, options: &ServerOptions) -> Result<(), Vec<ValidationError>> {
        validate_config(&options.config)
    }
}

/// The full set of collaborators, one per assembly step.
pub struct Collaborators {
    pub validator: Box<dyn ConfigValidator>,
    pub require_ssl: Box<dyn StageFactory>,
    pub request_id: Box<dyn StageFactory>,
    pub data_protection: Box<dyn StageFactory>,
    pub server_urls: Box<dyn StageFactory>,
    pub cors: Box<dyn StageFactory>,
    pub cookie_authentication: Box<dyn StageFactory>,
    pub container: Box<dyn ContainerBuilder>,
    pub static_files: Box<dyn StageFactory>,
    pub core_api: Box<dyn StageFactory>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            validator: Box::new(DefaultConfigValidator),
            require_ssl: Box::new(RequireSslStage),
            request_id: Box::new(RequestIdStage),
            data_protection: Box::new(DataProtectionStage),
            server_urls: Box::new(ServerUrlsStage),
            cors: Box::new(CorsStage),
            cookie_authentication: Box::new(CookieAuthenticationStage),
            container: Box::new(DefaultContainerBuilder),
            static_files: Box::new(StaticFilesStage),
            core_api: Box::new(CoreApiStage),
        }
    }
}
