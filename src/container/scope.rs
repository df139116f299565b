//! Dependency scopes.
//!
//! A scope resolves services for one unit of work: a single request, or the
//! startup diagnostic check. Scoped instances are created at most once per
//! scope. Dropping the scope releases it.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::container::registry::{key, Registration, ResolveError, ServiceContainer};
use crate::http::X_REQUEST_ID;

/// Request data visible to scoped services.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Correlation id assigned by the request-id stage.
    pub request_id: Option<String>,
    pub path: Option<String>,
}

impl RequestContext {
    /// Context for work that is not tied to a request.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_request(request: &Request) -> Self {
        Self {
            request_id: request
                .headers()
                .get(X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            path: Some(request.uri().path().to_string()),
        }
    }
}

/// A short-lived resolution context.
pub struct ServiceScope {
    container: Arc<ServiceContainer>,
    context: RequestContext,
    instances: Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl ServiceScope {
    pub(crate) fn new(container: Arc<ServiceContainer>, context: RequestContext) -> Self {
        tracing::trace!(request_id = ?context.request_id, "Dependency scope created");
        Self {
            container,
            context,
            instances: Mutex::new(HashMap::new()),
        }
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// Resolve a service registered as `Arc<T>`.
    pub fn resolve<T>(&self) -> Result<Arc<T>, ResolveError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        match self.container.registration::<T>()? {
            Registration::Singleton(instance) => instance
                .downcast_ref::<Arc<T>>()
                .cloned()
                .ok_or(ResolveError::TypeMismatch(type_name::<T>())),
            Registration::Scoped(factory) => {
                let mut instances = self.instances.lock().expect("scope instance cache poisoned");
                if let Some(existing) = instances.get(&key::<T>()) {
                    return existing
                        .downcast_ref::<Arc<T>>()
                        .cloned()
                        .ok_or(ResolveError::TypeMismatch(type_name::<T>()));
                }

                let created = factory(&self.context)
                    .downcast::<Arc<T>>()
                    .map_err(|_| ResolveError::TypeMismatch(type_name::<T>()))?;
                let instance = Arc::clone(&created);
                instances.insert(key::<T>(), created);
                Ok(instance)
            }
        }
    }
}

impl Drop for ServiceScope {
    fn drop(&mut self) {
        self.container.release_scope();
        tracing::trace!(request_id = ?self.context.request_id, "Dependency scope released");
    }
}

/// Per-request scope stage: opens a scope for the request and attaches it
/// to the request extensions. The scope is released with the request.
pub async fn dependency_scope_middleware(
    State(container): State<Arc<ServiceContainer>>,
    mut request: Request,
    next: Next,
) -> Response {
    let scope = container.create_scope(RequestContext::from_request(&request));
    request.extensions_mut().insert(Arc::new(scope));
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ServiceRegistry;
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct Hello(Option<String>);

    impl Greeter for Hello {
        fn greet(&self) -> String {
            format!("hello {}", self.0.as_deref().unwrap_or("nobody"))
        }
    }

    #[test]
    fn test_resolve_singleton_trait_object() {
        let mut registry = ServiceRegistry::new();
        registry.register_instance::<dyn Greeter>(Arc::new(Hello(None)));
        let container = registry.build();

        let scope = container.create_scope(RequestContext::empty());
        assert_eq!(scope.resolve::<dyn Greeter>().unwrap().greet(), "hello nobody");
    }

    #[test]
    fn test_scoped_instance_created_once_per_scope() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        let mut registry = ServiceRegistry::new();
        registry.register_scoped::<dyn Greeter, _>(move |ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            let greeter: Arc<dyn Greeter> = Arc::new(Hello(ctx.request_id.clone()));
            greeter
        });
        let container = registry.build();

        let scope = container.create_scope(RequestContext {
            request_id: Some("abc".into()),
            path: None,
        });
        let first = scope.resolve::<dyn Greeter>().unwrap();
        let second = scope.resolve::<dyn Greeter>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.greet(), "hello abc");

        let other = container.create_scope(RequestContext::empty());
        other.resolve::<dyn Greeter>().unwrap();
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unregistered_service() {
        let container = ServiceRegistry::new().build();
        let scope = container.create_scope(RequestContext::empty());
        assert!(matches!(
            scope.resolve::<String>(),
            Err(ResolveError::NotRegistered(_))
        ));
    }

    #[test]
    fn test_scope_release_on_drop() {
        let container = ServiceRegistry::new().build();
        {
            let _a = container.create_scope(RequestContext::empty());
            let _b = container.create_scope(RequestContext::empty());
            assert_eq!(container.active_scopes(), 2);
        }
        assert_eq!(container.active_scopes(), 0);
    }
}
