//! Dependency injection.
//!
//! # Data Flow
//! ```text
//! AssemblyContext
//!     -> graph.rs (default registrations)
//!     -> registry.rs (ServiceRegistry -> Arc<ServiceContainer>)
//!     -> scope.rs (ServiceScope per request or per startup check)
//!         -> resolve::<T>() (singletons shared, scoped cached per scope)
//! ```
//!
//! # Design Decisions
//! - Services are keyed by `Arc<T>` so trait objects can be registered
//! - Scopes release themselves on drop, including on error paths

pub mod graph;
pub mod registry;
pub mod scope;

pub use graph::DefaultContainerBuilder;
pub use registry::{ResolveError, ServiceContainer, ServiceRegistry};
pub use scope::{dependency_scope_middleware, RequestContext, ServiceScope};
