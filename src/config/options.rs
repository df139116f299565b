//! Runtime server options.
//!
//! `ServerConfig` is what the file says; `ServerOptions` is what the server
//! runs with: the validated configuration plus live objects built from it
//! (signing credential, data protector, event sink) and the extension hooks
//! registered by the host.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::config::schema::ServerConfig;
use crate::credentials::{CredentialError, SigningCredential};
use crate::events::{EventSink, TracingEventSink};
use crate::pipeline::{IdentityProviderHook, PipelineExtension, PluginHook};
use crate::security::{DataProtectionError, DataProtector, HmacDataProtector};

/// Error type for building options from configuration.
#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("failed to load signing credential: {0}")]
    Credential(#[from] CredentialError),

    #[error("failed to configure data protection: {0}")]
    DataProtection(#[from] DataProtectionError),
}

/// Everything the assembler needs to build the pipeline.
#[derive(Clone)]
pub struct ServerOptions {
    pub config: ServerConfig,
    /// Absent is a valid state, reported by startup diagnostics.
    pub signing_credential: Option<SigningCredential>,
    pub data_protector: Arc<dyn DataProtector>,
    pub event_sink: Arc<dyn EventSink>,
    pub extensions: Vec<PipelineExtension>,
}

impl ServerOptions {
    /// Options with no signing credential and a random data protection key.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            signing_credential: None,
            data_protector: Arc::new(HmacDataProtector::generate()),
            event_sink: Arc::new(TracingEventSink),
            extensions: Vec::new(),
        }
    }

    /// Build options from file configuration, loading the signing
    /// credential and the data protection key it refers to.
    pub fn from_config(config: ServerConfig) -> Result<Self, OptionsError> {
        let signing_credential = match config.signing.certificate_path.as_deref() {
            Some(cert_path) => Some(SigningCredential::load(
                Path::new(cert_path),
                config.signing.private_key_path.as_deref().map(Path::new),
            )?),
            None => None,
        };

        let data_protector: Arc<dyn DataProtector> = match config.data_protection.key.as_deref() {
            Some(key) => Arc::new(HmacDataProtector::from_base64(key)?),
            None => {
                tracing::warn!("No data protection key configured; cookies will not survive a restart");
                Arc::new(HmacDataProtector::generate())
            }
        };

        Ok(Self {
            signing_credential,
            data_protector,
            ..Self::new(config)
        })
    }

    pub fn with_signing_credential(mut self, credential: SigningCredential) -> Self {
        self.signing_credential = Some(credential);
        self
    }

    pub fn with_data_protector(mut self, protector: Arc<dyn DataProtector>) -> Self {
        self.data_protector = protector;
        self
    }

    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    pub fn with_extension(mut self, extension: PipelineExtension) -> Self {
        self.extensions.push(extension);
        self
    }

    /// Add a protocol logout URL unless it is already present.
    ///
    /// Returns whether the URL was added.
    pub fn add_protocol_logout_url(&mut self, url: &str) -> bool {
        if self.config.protocol_logout_urls.iter().any(|u| u == url) {
            return false;
        }
        self.config.protocol_logout_urls.push(url.to_string());
        true
    }

    /// Plugin hooks in registration order.
    pub fn plugins(&self) -> impl Iterator<Item = &PluginHook> {
        self.extensions.iter().filter_map(|ext| match ext {
            PipelineExtension::Plugin(hook) => Some(hook),
            PipelineExtension::IdentityProviders(_) => None,
        })
    }

    /// Identity provider hooks in registration order.
    pub fn identity_provider_hooks(&self) -> impl Iterator<Item = &IdentityProviderHook> {
        self.extensions.iter().filter_map(|ext| match ext {
            PipelineExtension::IdentityProviders(hook) => Some(hook),
            PipelineExtension::Plugin(_) => None,
        })
    }
}

impl fmt::Debug for ServerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerOptions")
            .field("config", &self.config)
            .field("signing_credential", &self.signing_credential)
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::SigningConfig;

    #[test]
    fn test_logout_url_set_semantics() {
        let mut options = ServerOptions::new(ServerConfig::default());
        assert!(options.add_protocol_logout_url("/connect/endsession/callback"));
        assert!(!options.add_protocol_logout_url("/connect/endsession/callback"));
        assert_eq!(options.config.protocol_logout_urls.len(), 1);
    }

    #[test]
    fn test_hooks_filtered_by_kind() {
        let options = ServerOptions::new(ServerConfig::default())
            .with_extension(PipelineExtension::plugin(|_, _| Ok(())))
            .with_extension(PipelineExtension::identity_providers(|_, _| Ok(())))
            .with_extension(PipelineExtension::plugin(|_, _| Ok(())));
        assert_eq!(options.plugins().count(), 2);
        assert_eq!(options.identity_provider_hooks().count(), 1);
    }

    #[test]
    fn test_from_config_without_signing() {
        let options = ServerOptions::from_config(ServerConfig::default()).unwrap();
        assert!(options.signing_credential.is_none());
    }

    #[test]
    fn test_from_config_missing_certificate_file() {
        let config = ServerConfig {
            signing: SigningConfig {
                certificate_path: Some("/nonexistent/signing.pem".to_string()),
                private_key_path: None,
            },
            ..ServerConfig::default()
        };
        assert!(matches!(
            ServerOptions::from_config(config),
            Err(OptionsError::Credential(_))
        ));
    }
}
