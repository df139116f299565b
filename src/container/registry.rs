//! Service registrations and the built container.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::container::scope::{RequestContext, ServiceScope};

type AnyInstance = Box<dyn Any + Send + Sync>;
type ScopedFactory = Arc<dyn Fn(&RequestContext) -> AnyInstance + Send + Sync>;

/// Error type for service resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("no service registered for {0}")]
    NotRegistered(&'static str),

    #[error("registration for {0} holds an instance of a different type")]
    TypeMismatch(&'static str),
}

pub(crate) enum Registration {
    Singleton(AnyInstance),
    Scoped(ScopedFactory),
}

/// Collects registrations before the container is built.
#[derive(Default)]
pub struct ServiceRegistry {
    registrations: HashMap<TypeId, Registration>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shared instance. Later registrations for the same type win.
    pub fn register_instance<T>(&mut self, instance: Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.registrations
            .insert(key::<T>(), Registration::Singleton(Box::new(instance)));
        self
    }

    /// Register a factory invoked once per scope.
    pub fn register_scoped<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&RequestContext) -> Arc<T> + Send + Sync + 'static,
    {
        let factory: ScopedFactory = Arc::new(move |ctx| Box::new(factory(ctx)) as AnyInstance);
        self.registrations.insert(key::<T>(), Registration::Scoped(factory));
        self
    }

    pub fn build(self) -> Arc<ServiceContainer> {
        tracing::debug!(services = self.registrations.len(), "Service container built");
        Arc::new(ServiceContainer {
            registrations: self.registrations,
            active_scopes: AtomicUsize::new(0),
        })
    }
}

/// The object graph shared by every request.
pub struct ServiceContainer {
    registrations: HashMap<TypeId, Registration>,
    active_scopes: AtomicUsize,
}

impl ServiceContainer {
    /// Open a scope bound to one unit of work.
    pub fn create_scope(self: &Arc<Self>, context: RequestContext) -> ServiceScope {
        self.active_scopes.fetch_add(1, Ordering::SeqCst);
        ServiceScope::new(Arc::clone(self), context)
    }

    /// Number of scopes not yet released.
    pub fn active_scopes(&self) -> usize {
        self.active_scopes.load(Ordering::SeqCst)
    }

    pub fn is_registered<T>(&self) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.registrations.contains_key(&key::<T>())
    }

    pub(crate) fn registration<T>(&self) -> Result<&Registration, ResolveError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.registrations
            .get(&key::<T>())
            .ok_or(ResolveError::NotRegistered(type_name::<T>()))
    }

    pub(crate) fn release_scope(&self) {
        self.active_scopes.fetch_sub(1, Ordering::SeqCst);
    }
}

pub(crate) fn key<T: ?Sized + 'static>() -> TypeId {
    TypeId::of::<Arc<T>>()
}
