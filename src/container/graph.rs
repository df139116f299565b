//! The default service graph.

use std::sync::Arc;

use crate::config::options::ServerOptions;
use crate::container::registry::{ServiceContainer, ServiceRegistry};
use crate::events::{DefaultEventService, EventService, EventSink};
use crate::pipeline::{AssemblyContext, ContainerBuilder, StageError};
use crate::security::DataProtector;
use crate::tokens::TokenHandlerSettings;

/// Registers the options, data protector, token handling and event sink as
/// singletons and the event service per scope.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultContainerBuilder;

impl ContainerBuilder for DefaultContainerBuilder {
    fn build(&self, ctx: &AssemblyContext) -> Result<Arc<ServiceContainer>, StageError> {
        let options = Arc::clone(&ctx.options);
        let sink = Arc::clone(&options.event_sink);
        let events_config = options.config.events.clone();

        let mut registry = ServiceRegistry::new();
        registry
            .register_instance::<ServerOptions>(Arc::clone(&options))
            .register_instance::<dyn DataProtector>(Arc::clone(&options.data_protector))
            .register_instance::<TokenHandlerSettings>(Arc::new(ctx.token_handling.clone()))
            .register_instance::<dyn EventSink>(Arc::clone(&sink))
            .register_scoped::<dyn EventService, _>(move |request| {
                let service: Arc<dyn EventService> = Arc::new(DefaultEventService::new(
                    events_config.clone(),
                    request.clone(),
                    Arc::clone(&sink),
                ));
                service
            });
        Ok(registry.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ServerConfig;
    use crate::container::RequestContext;

    #[test]
    fn test_default_graph() {
        let ctx = AssemblyContext {
            options: Arc::new(ServerOptions::new(ServerConfig::default())),
            token_handling: TokenHandlerSettings::without_claim_mapping(),
        };
        let container = DefaultContainerBuilder.build(&ctx).unwrap();
        assert!(container.is_registered::<ServerOptions>());
        assert!(container.is_registered::<dyn DataProtector>());
        assert!(container.is_registered::<dyn EventSink>());

        let scope = container.create_scope(RequestContext::empty());
        let a = scope.resolve::<dyn EventService>().unwrap();
        let b = scope.resolve::<dyn EventService>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let token_handling = scope.resolve::<TokenHandlerSettings>().unwrap();
        assert!(token_handling.inbound_claim_type_map.is_empty());
    }
}
