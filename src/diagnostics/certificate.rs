//! Signing certificate health check.
//!
//! # States
//! ```text
//! credential absent                 → Missing
//! private key not readable          → PrivateKeyInaccessible
//! not_after - now < 30 days         → ExpiringSoon
//! otherwise                         → Valid
//! ```
//! First match wins. Exactly one event is raised per evaluation.

use std::time::{Duration, SystemTime};

use crate::credentials::SigningCredential;
use crate::events::EventService;
use crate::observability::metrics;

/// Remaining lifetime below which the certificate is reported as expiring.
pub const EXPIRY_WARNING_WINDOW: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Health of the configured signing credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateHealth {
    Missing,
    PrivateKeyInaccessible,
    ExpiringSoon,
    Valid,
}

impl CertificateHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateHealth::Missing => "missing",
            CertificateHealth::PrivateKeyInaccessible => "private_key_inaccessible",
            CertificateHealth::ExpiringSoon => "expiring_soon",
            CertificateHealth::Valid => "valid",
        }
    }
}

impl std::fmt::Display for CertificateHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the signing credential and raise the matching event.
pub fn check_signing_certificate(
    credential: Option<&SigningCredential>,
    now: SystemTime,
    events: &dyn EventService,
) -> CertificateHealth {
    let health = classify(credential, now, events);
    metrics::record_certificate_health(health.as_str());
    health
}

fn classify(
    credential: Option<&SigningCredential>,
    now: SystemTime,
    events: &dyn EventService,
) -> CertificateHealth {
    let Some(cert) = credential else {
        tracing::warn!("No signing certificate configured.");
        events.raise_no_certificate_configured();
        return CertificateHealth::Missing;
    };

    if !cert.is_private_key_accessible() {
        tracing::error!(
            subject = %cert.subject(),
            thumbprint = %cert.thumbprint(),
            "Signing certificate private key is not accessible. Make sure the account running the server has access to the private key"
        );
        events.raise_certificate_private_key_not_accessible(cert);
        return CertificateHealth::PrivateKeyInaccessible;
    }

    // An already expired certificate has no remaining lifetime.
    let remaining = cert.not_after().duration_since(now).unwrap_or(Duration::ZERO);
    if remaining < EXPIRY_WARNING_WINDOW {
        tracing::warn!(
            subject = %cert.subject(),
            not_after = cert.not_after_unix(),
            remaining_days = remaining.as_secs() / 86_400,
            "The signing certificate will expire in the next 30 days"
        );
        events.raise_certificate_expiring_soon(cert);
        return CertificateHealth::ExpiringSoon;
    }

    tracing::debug!(subject = %cert.subject(), "Signing certificate validated");
    events.raise_certificate_validated(cert);
    CertificateHealth::Valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Event;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DAY: Duration = Duration::from_secs(86_400);

    #[derive(Default)]
    struct CountingEvents {
        missing: AtomicUsize,
        inaccessible: AtomicUsize,
        expiring: AtomicUsize,
        validated: AtomicUsize,
        other: AtomicUsize,
    }

    impl CountingEvents {
        fn counts(&self) -> [usize; 4] {
            [
                self.missing.load(Ordering::SeqCst),
                self.inaccessible.load(Ordering::SeqCst),
                self.expiring.load(Ordering::SeqCst),
                self.validated.load(Ordering::SeqCst),
            ]
        }
    }

    impl EventService for CountingEvents {
        fn raise(&self, _event: Event) {
            self.other.fetch_add(1, Ordering::SeqCst);
        }
        fn raise_no_certificate_configured(&self) {
            self.missing.fetch_add(1, Ordering::SeqCst);
        }
        fn raise_certificate_private_key_not_accessible(&self, _: &SigningCredential) {
            self.inaccessible.fetch_add(1, Ordering::SeqCst);
        }
        fn raise_certificate_expiring_soon(&self, _: &SigningCredential) {
            self.expiring.fetch_add(1, Ordering::SeqCst);
        }
        fn raise_certificate_validated(&self, _: &SigningCredential) {
            self.validated.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn credential(not_after: SystemTime, key: bool) -> SigningCredential {
        SigningCredential::new("CN=idsrv", not_after, vec![0x30], key.then(|| vec![1, 2, 3]))
    }

    #[test]
    fn test_missing() {
        let events = CountingEvents::default();
        let health = check_signing_certificate(None, SystemTime::now(), &events);
        assert_eq!(health, CertificateHealth::Missing);
        assert_eq!(events.counts(), [1, 0, 0, 0]);
        assert_eq!(events.other.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_private_key_takes_priority_over_expiry() {
        let now = SystemTime::now();
        let events = CountingEvents::default();

        let far = credential(now + 400 * DAY, false);
        assert_eq!(
            check_signing_certificate(Some(&far), now, &events),
            CertificateHealth::PrivateKeyInaccessible
        );

        let expired = credential(now - DAY, false);
        assert_eq!(
            check_signing_certificate(Some(&expired), now, &events),
            CertificateHealth::PrivateKeyInaccessible
        );
        assert_eq!(events.counts(), [0, 2, 0, 0]);
    }

    #[test]
    fn test_expiring_soon() {
        let now = SystemTime::now();
        let events = CountingEvents::default();
        let cert = credential(now + 10 * DAY, true);
        assert_eq!(
            check_signing_certificate(Some(&cert), now, &events),
            CertificateHealth::ExpiringSoon
        );
        assert_eq!(events.counts(), [0, 0, 1, 0]);
    }

    #[test]
    fn test_already_expired_is_expiring_soon() {
        let now = SystemTime::now();
        let events = CountingEvents::default();
        let cert = credential(now - 5 * DAY, true);
        assert_eq!(
            check_signing_certificate(Some(&cert), now, &events),
            CertificateHealth::ExpiringSoon
        );
    }

    #[test]
    fn test_window_boundary() {
        let now = SystemTime::now();
        let events = CountingEvents::default();

        let just_inside = credential(now + EXPIRY_WARNING_WINDOW - Duration::from_secs(1), true);
        assert_eq!(
            check_signing_certificate(Some(&just_inside), now, &events),
            CertificateHealth::ExpiringSoon
        );

        let at_window = credential(now + EXPIRY_WARNING_WINDOW, true);
        assert_eq!(
            check_signing_certificate(Some(&at_window), now, &events),
            CertificateHealth::Valid
        );
    }

    #[test]
    fn test_valid() {
        let now = SystemTime::now();
        let events = CountingEvents::default();
        let cert = credential(now + 400 * DAY, true);
        assert_eq!(
            check_signing_certificate(Some(&cert), now, &events),
            CertificateHealth::Valid
        );
        assert_eq!(events.counts(), [0, 0, 0, 1]);
    }
}
