//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     -> loader.rs (parse & deserialize)
//!     -> validation.rs (semantic checks, all violations reported)
//!     -> ServerConfig (validated)
//!     -> options.rs (ServerOptions: config + credential, protector, hooks)
//!     -> shared via Arc with every pipeline stage
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Options are read-only once assembly has started

pub mod loader;
pub mod options;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use options::{OptionsError, ServerOptions};
pub use schema::{ListenerConfig, ServerConfig};
pub use validation::{validate_config, ValidationError};
