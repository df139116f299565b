//! Identity server pipeline assembly.
//!
//! # Responsibilities
//! - Gate assembly on configuration validation
//! - Install the core stages in their fixed order
//! - Run plugin and identity-provider hooks
//! - Check the signing certificate before traffic is served
//!
//! # Data Flow
//! ```text
//! ServerOptions
//!     -> validate (fail fast, nothing installed)
//!     -> require_ssl? -> request_id -> logout URL -> data_protection
//!     -> server_urls -> cors -> cookie_authentication
//!     -> container + dependency_scope
//!     -> plugin hooks -> identity provider hooks
//!     -> static_files -> core_api
//!     -> certificate diagnostics (transient scope)
//! ```

use std::sync::Arc;
use std::time::SystemTime;

use axum::middleware;
use uuid::Uuid;

use crate::config::options::ServerOptions;
use crate::constants::{routes::END_SESSION_CALLBACK, EXTERNAL_AUTHENTICATION_TYPE};
use crate::container::{dependency_scope_middleware, RequestContext};
use crate::diagnostics::{check_signing_certificate, CertificateHealth};
use crate::events::EventService;
use crate::pipeline::builder::{PipelineBuilder, StageKind};
use crate::pipeline::collaborators::{AssemblyContext, Collaborators, StageFactory};
use crate::pipeline::error::StartupError;
use crate::tokens::TokenHandlerSettings;

/// Assembles the identity server onto a pipeline builder.
#[derive(Default)]
pub struct PipelineAssembler {
    collaborators: Collaborators,
}

impl PipelineAssembler {
    pub fn new(collaborators: Collaborators) -> Self {
        Self { collaborators }
    }

    /// Run the full assembly sequence.
    ///
    /// On success the builder's properties hold `Arc<ServerOptions>`,
    /// `Arc<ServiceContainer>` and the computed `CertificateHealth`. Stages
    /// installed before a failure are left in place; the caller is expected
    /// to abort startup.
    pub fn assemble(
        &self,
        app: &mut PipelineBuilder,
        options: ServerOptions,
    ) -> Result<CertificateHealth, StartupError> {
        let span = tracing::info_span!("startup", component = "Startup", run_id = %Uuid::new_v4());
        let _guard = span.enter();

        self.collaborators
            .validator
            .validate(&options)
            .map_err(StartupError::Configuration)?;

        let mut ctx = AssemblyContext {
            options: Arc::new(options),
            token_handling: TokenHandlerSettings::without_claim_mapping(),
        };

        if ctx.options.config.require_ssl {
            install(app, StageKind::RequireSsl, self.collaborators.require_ssl.as_ref(), &ctx)?;
        }
        install(app, StageKind::RequestId, self.collaborators.request_id.as_ref(), &ctx)?;

        if Arc::make_mut(&mut ctx.options).add_protocol_logout_url(END_SESSION_CALLBACK) {
            tracing::debug!(url = END_SESSION_CALLBACK, "Protocol logout URL registered");
        }

        install(app, StageKind::DataProtection, self.collaborators.data_protection.as_ref(), &ctx)?;
        install(app, StageKind::ServerUrls, self.collaborators.server_urls.as_ref(), &ctx)?;
        install(app, StageKind::Cors, self.collaborators.cors.as_ref(), &ctx)?;
        install(
            app,
            StageKind::CookieAuthentication,
            self.collaborators.cookie_authentication.as_ref(),
            &ctx,
        )?;

        let container = self
            .collaborators
            .container
            .build(&ctx)
            .map_err(StartupError::stage(StageKind::DependencyScope))?;
        let scope_container = Arc::clone(&container);
        app.install(
            StageKind::DependencyScope,
            Box::new(move |router| {
                router.layer(middleware::from_fn_with_state(
                    scope_container,
                    dependency_scope_middleware,
                ))
            }),
        )
        .map_err(StartupError::stage(StageKind::DependencyScope))?;
        tracing::debug!(stage = %StageKind::DependencyScope, "Stage installed");

        app.properties_mut().insert(Arc::clone(&ctx.options));
        app.properties_mut().insert(Arc::clone(&container));

        let options: &ServerOptions = &ctx.options;
        for plugin in options.plugins() {
            plugin(app, options).map_err(StartupError::stage(StageKind::Extension("plugin")))?;
        }
        for providers in options.identity_provider_hooks() {
            providers(app, EXTERNAL_AUTHENTICATION_TYPE)
                .map_err(StartupError::stage(StageKind::Extension("identity_providers")))?;
        }

        install(app, StageKind::StaticFiles, self.collaborators.static_files.as_ref(), &ctx)?;
        install(app, StageKind::CoreApi, self.collaborators.core_api.as_ref(), &ctx)?;

        let health = {
            let scope = container.create_scope(RequestContext::empty());
            let events = scope
                .resolve::<dyn EventService>()
                .map_err(StartupError::Diagnostics)?;
            check_signing_certificate(
                ctx.options.signing_credential.as_ref(),
                SystemTime::now(),
                events.as_ref(),
            )
        };
        app.properties_mut().insert(health);

        tracing::info!(
            stages = app.len(),
            certificate = %health,
            "Identity server pipeline assembled"
        );
        Ok(health)
    }
}

fn install(
    app: &mut PipelineBuilder,
    kind: StageKind,
    factory: &dyn StageFactory,
    ctx: &AssemblyContext,
) -> Result<(), StartupError> {
    let layer = factory.build(ctx).map_err(StartupError::stage(kind))?;
    app.install(kind, layer).map_err(StartupError::stage(kind))?;
    tracing::debug!(stage = %kind, "Stage installed");
    Ok(())
}

/// Assemble the identity server onto `app` with the built-in collaborators.
///
/// Returns the same builder for chaining.
pub fn use_identity_server(
    app: Option<&mut PipelineBuilder>,
    options: Option<ServerOptions>,
) -> Result<&mut PipelineBuilder, StartupError> {
    let app = app.ok_or(StartupError::Argument("app"))?;
    let options = options.ok_or(StartupError::Argument("options"))?;
    PipelineAssembler::default().assemble(app, options)?;
    Ok(app)
}

/// Fluent entry point on the pipeline builder.
pub trait UseIdentityServer {
    fn use_identity_server(&mut self, options: ServerOptions) -> Result<&mut Self, StartupError>;
}

impl UseIdentityServer for PipelineBuilder {
    fn use_identity_server(&mut self, options: ServerOptions) -> Result<&mut Self, StartupError> {
        use_identity_server(Some(self), Some(options))
    }
}
