//! Request pipeline assembly.
//!
//! # Data Flow
//! ```text
//! Host
//!     -> builder.rs (PipelineBuilder: ordered stages + properties)
//!     -> assembler.rs (fixed stage order, hooks, diagnostics)
//!         -> collaborators.rs (one factory per stage)
//!         -> extension.rs (plugin / identity provider hooks)
//!     -> PipelineBuilder::build() -> axum Router
//! ```
//!
//! # Design Decisions
//! - Stage order is enforced by the builder, not only by call order
//! - Any failure aborts assembly; nothing is rolled back

pub mod assembler;
pub mod builder;
pub mod collaborators;
pub mod error;
pub mod extension;

pub use assembler::{use_identity_server, PipelineAssembler, UseIdentityServer};
pub use builder::{PipelineBuilder, StageKind, StageLayer};
pub use collaborators::{
    AssemblyContext, Collaborators, ConfigValidator, ContainerBuilder, DefaultConfigValidator,
    StageFactory,
};
pub use error::{StageError, StartupError};
pub use extension::{IdentityProviderHook, PipelineExtension, PluginHook};
