//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use identity_server::config::{ServerConfig, ServerOptions};
use identity_server::container::{DefaultContainerBuilder, ServiceContainer};
use identity_server::credentials::SigningCredential;
use identity_server::events::{Event, EventSink};
use identity_server::pipeline::{
    AssemblyContext, Collaborators, ConfigValidator, ContainerBuilder, DefaultConfigValidator,
    StageError, StageFactory, StageLayer,
};
use identity_server::security::HmacDataProtector;

pub const DAY: Duration = Duration::from_secs(86_400);

/// Shared record of collaborator invocations, in call order.
pub type CallLog = Arc<Mutex<Vec<&'static str>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<&'static str> {
    log.lock().unwrap().clone()
}

/// Event sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn write(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// A valid configuration for tests.
pub fn test_config(require_ssl: bool) -> ServerConfig {
    ServerConfig {
        require_ssl,
        site_name: "Test Identity Server".to_string(),
        ..ServerConfig::default()
    }
}

/// A signing credential with an accessible private key.
pub fn credential_expiring_in(lifetime: Duration) -> SigningCredential {
    SigningCredential::new(
        "CN=test-signing",
        SystemTime::now() + lifetime,
        vec![0x30, 0x82, 0x01],
        Some(vec![0x01, 0x02]),
    )
}

/// Options with a fixed data protection key and a recording event sink.
pub fn test_options(config: ServerConfig, sink: Arc<RecordingSink>) -> ServerOptions {
    ServerOptions::new(config)
        .with_data_protector(Arc::new(test_protector()))
        .with_event_sink(sink)
}

pub fn test_protector() -> HmacDataProtector {
    HmacDataProtector::new(&[42u8; 32]).unwrap()
}

/// Stage factory that records its invocation and installs nothing.
pub struct CountingFactory {
    name: &'static str,
    log: CallLog,
    fail: bool,
}

impl CountingFactory {
    pub fn new(name: &'static str, log: &CallLog) -> Self {
        Self {
            name,
            log: log.clone(),
            fail: false,
        }
    }

    pub fn failing(name: &'static str, log: &CallLog) -> Self {
        Self {
            fail: true,
            ..Self::new(name, log)
        }
    }
}

impl StageFactory for CountingFactory {
    fn build(&self, ctx: &AssemblyContext) -> Result<StageLayer, StageError> {
        self.log.lock().unwrap().push(self.name);
        assert!(ctx.token_handling.inbound_claim_type_map.is_empty());
        assert!(ctx.token_handling.outbound_claim_type_map.is_empty());
        if self.fail {
            return Err(StageError::Failed(format!("{} unavailable", self.name)));
        }
        Ok(Box::new(|router| router))
    }
}

pub struct CountingValidator {
    log: CallLog,
}

impl ConfigValidator for CountingValidator {
    fn validate(
        &self,
        options: &ServerOptions,
    ) -> Result<(), Vec<identity_server::config::ValidationError>> {
        self.log.lock().unwrap().push("validator");
        DefaultConfigValidator.validate(options)
    }
}

/// Container builder that records its invocation and builds the default graph.
pub struct CountingContainer {
    log: CallLog,
}

impl ContainerBuilder for CountingContainer {
    fn build(&self, ctx: &AssemblyContext) -> Result<Arc<ServiceContainer>, StageError> {
        self.log.lock().unwrap().push("container");
        DefaultContainerBuilder.build(ctx)
    }
}

/// Collaborators that record every call and install no-op stages.
pub fn counting_collaborators(log: &CallLog) -> Collaborators {
    Collaborators {
        validator: Box::new(CountingValidator { log: log.clone() }),
        require_ssl: Box::new(CountingFactory::new("require_ssl", log)),
        request_id: Box::new(CountingFactory::new("request_id", log)),
        data_protection: Box::new(CountingFactory::new("data_protection", log)),
        server_urls: Box::new(CountingFactory::new("server_urls", log)),
        cors: Box::new(CountingFactory::new("cors", log)),
        cookie_authentication: Box::new(CountingFactory::new("cookie_authentication", log)),
        container: Box::new(CountingContainer { log: log.clone() }),
        static_files: Box::new(CountingFactory::new("static_files", log)),
        core_api: Box::new(CountingFactory::new("core_api", log)),
    }
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a thread-local subscriber and return its plain-text output.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buffer = SharedBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    let output = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
    (result, output)
}
