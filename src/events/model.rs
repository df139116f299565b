//! Event model.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::credentials::SigningCredential;

/// Event categories.
pub mod categories {
    pub const INTERNAL_ERROR: &str = "InternalError";
    pub const INFORMATION: &str = "Information";
}

/// Event identifiers.
pub mod ids {
    pub const CERTIFICATE_PRIVATE_KEY_NOT_ACCESSIBLE: u32 = 5001;
    pub const NO_CERTIFICATE_CONFIGURED: u32 = 5002;
    pub const CERTIFICATE_EXPIRING_SOON: u32 = 5003;
    pub const CERTIFICATE_VALIDATED: u32 = 5004;
}

/// Severity class of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventType {
    Success,
    Failure,
    Information,
    Error,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Success => "success",
            EventType::Failure => "failure",
            EventType::Information => "information",
            EventType::Error => "error",
        }
    }
}

/// Ambient data attached to every raised event.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventContext {
    /// Correlation id of the request that raised the event, if any.
    pub activity_id: Option<String>,
    /// Seconds since the Unix epoch.
    pub time_stamp: u64,
    pub process_id: u32,
}

/// Details attached to certificate events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateDetails {
    pub subject: String,
    pub thumbprint: String,
    /// Seconds since the Unix epoch.
    pub not_after: u64,
}

impl From<&SigningCredential> for CertificateDetails {
    fn from(credential: &SigningCredential) -> Self {
        Self {
            subject: credential.subject().to_string(),
            thumbprint: credential.thumbprint().to_string(),
            not_after: credential.not_after_unix(),
        }
    }
}

/// An auditable server event.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub id: u32,
    pub category: &'static str,
    pub name: &'static str,
    pub event_type: EventType,
    pub message: Option<String>,
    pub details: Option<serde_json::Value>,
    pub context: EventContext,
}

impl Event {
    pub fn new(id: u32, category: &'static str, name: &'static str, event_type: EventType) -> Self {
        Self {
            id,
            category,
            name,
            event_type,
            message: None,
            details: None,
            context: EventContext {
                activity_id: None,
                time_stamp: SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_secs(),
                process_id: std::process::id(),
            },
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_details<T: Serialize>(mut self, details: &T) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    pub fn no_certificate_configured() -> Self {
        Event::new(
            ids::NO_CERTIFICATE_CONFIGURED,
            categories::INTERNAL_ERROR,
            "No signing certificate configured",
            EventType::Error,
        )
        .with_message("No signing certificate configured")
    }

    pub fn certificate_private_key_not_accessible(credential: &SigningCredential) -> Self {
        Event::new(
            ids::CERTIFICATE_PRIVATE_KEY_NOT_ACCESSIBLE,
            categories::INTERNAL_ERROR,
            "Signing certificate private key not accessible",
            EventType::Error,
        )
        .with_details(&CertificateDetails::from(credential))
    }

    pub fn certificate_expiring_soon(credential: &SigningCredential) -> Self {
        Event::new(
            ids::CERTIFICATE_EXPIRING_SOON,
            categories::INFORMATION,
            "Signing certificate expiring soon",
            EventType::Information,
        )
        .with_details(&CertificateDetails::from(credential))
    }

    pub fn certificate_validated(credential: &SigningCredential) -> Self {
        Event::new(
            ids::CERTIFICATE_VALIDATED,
            categories::INFORMATION,
            "Signing certificate validated",
            EventType::Success,
        )
        .with_details(&CertificateDetails::from(credential))
    }
}
