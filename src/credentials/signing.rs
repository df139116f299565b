//! Signing credential loading.
//!
//! # Responsibilities
//! - Read the signing certificate chain from PEM
//! - Extract subject, thumbprint and expiry from the leaf certificate
//! - Probe whether the private key is readable by this process
//!
//! # Design Decisions
//! - An unreadable private key is a credential state, not a load error
//! - The certificate itself must parse; a broken certificate aborts startup

use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

/// Error type for credential loading.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("failed to read certificate {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no certificate found in {0}")]
    MissingCertificate(String),

    #[error("invalid certificate in {path}: {message}")]
    InvalidCertificate { path: String, message: String },
}

/// The asymmetric key used to sign issued tokens.
#[derive(Clone)]
pub struct SigningCredential {
    subject: String,
    thumbprint: String,
    not_after: SystemTime,
    certificate_der: Vec<u8>,
    private_key_der: Option<Vec<u8>>,
}

impl SigningCredential {
    /// Create a credential from already-parsed parts.
    pub fn new(
        subject: impl Into<String>,
        not_after: SystemTime,
        certificate_der: Vec<u8>,
        private_key_der: Option<Vec<u8>>,
    ) -> Self {
        let thumbprint = hex::encode(Sha256::digest(&certificate_der));
        Self {
            subject: subject.into(),
            thumbprint,
            not_after,
            certificate_der,
            private_key_der,
        }
    }

    /// Load a credential from a PEM certificate and an optional PEM private key.
    pub fn load(cert_path: &Path, key_path: Option<&Path>) -> Result<Self, CredentialError> {
        let path_display = cert_path.display().to_string();
        let file = File::open(cert_path).map_err(|source| CredentialError::Io {
            path: path_display.clone(),
            source,
        })?;

        let mut reader = BufReader::new(file);
        let certificate_der = rustls_pemfile::certs(&mut reader)
            .next()
            .ok_or_else(|| CredentialError::MissingCertificate(path_display.clone()))?
            .map_err(|source| CredentialError::Io {
                path: path_display.clone(),
                source,
            })?
            .to_vec();

        let (_, certificate) = x509_parser::parse_x509_certificate(&certificate_der).map_err(|e| {
            CredentialError::InvalidCertificate {
                path: path_display.clone(),
                message: e.to_string(),
            }
        })?;

        let subject = certificate.subject().to_string();
        let not_after = unix_to_system_time(certificate.validity().not_after.timestamp());
        let private_key_der = key_path.and_then(read_private_key);

        tracing::debug!(
            subject = %subject,
            path = %path_display,
            private_key = private_key_der.is_some(),
            "Signing certificate loaded"
        );

        Ok(Self::new(subject, not_after, certificate_der, private_key_der))
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Hex SHA-256 of the DER certificate.
    pub fn thumbprint(&self) -> &str {
        &self.thumbprint
    }

    pub fn not_after(&self) -> SystemTime {
        self.not_after
    }

    pub fn certificate_der(&self) -> &[u8] {
        &self.certificate_der
    }

    /// Whether the running process can use the private key.
    pub fn is_private_key_accessible(&self) -> bool {
        self.private_key_der.is_some()
    }

    /// Seconds since the Unix epoch of `not_after`, clamped at zero.
    pub fn not_after_unix(&self) -> u64 {
        self.not_after
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

impl std::fmt::Debug for SigningCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningCredential")
            .field("subject", &self.subject)
            .field("thumbprint", &self.thumbprint)
            .field("not_after", &self.not_after_unix())
            .field("private_key", &self.is_private_key_accessible())
            .finish()
    }
}

fn read_private_key(path: &Path) -> Option<Vec<u8>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            if e.kind() == ErrorKind::PermissionDenied {
                tracing::debug!(path = %path.display(), "Private key exists but is not readable");
            } else {
                tracing::debug!(path = %path.display(), error = %e, "Private key could not be opened");
            }
            return None;
        }
    };

    match rustls_pemfile::private_key(&mut BufReader::new(file)) {
        Ok(Some(key)) => Some(key.secret_der().to_vec()),
        Ok(None) => {
            tracing::debug!(path = %path.display(), "No private key found in PEM file");
            None
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Private key could not be parsed");
            None
        }
    }
}

fn unix_to_system_time(secs: i64) -> SystemTime {
    if secs >= 0 {
        UNIX_EPOCH + Duration::from_secs(secs as u64)
    } else {
        UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn generate(not_after_year: i32) -> (String, String) {
        let key_pair = rcgen::KeyPair::generate().unwrap();
        let mut params = rcgen::CertificateParams::new(vec!["idsrv.test".to_string()]).unwrap();
        params.not_after = rcgen::date_time_ymd(not_after_year, 1, 1);
        let cert = params.self_signed(&key_pair).unwrap();
        (cert.pem(), key_pair.serialize_pem())
    }

    #[test]
    fn test_load_with_private_key() {
        let (cert_pem, key_pem) = generate(2099);
        let cert = write_temp(&cert_pem);
        let key = write_temp(&key_pem);

        let credential = SigningCredential::load(cert.path(), Some(key.path())).unwrap();
        assert!(credential.is_private_key_accessible());
        assert_eq!(credential.thumbprint().len(), 64);
        // 2099-01-01T00:00:00Z
        assert_eq!(credential.not_after_unix(), 4_070_908_800);
    }

    #[test]
    fn test_load_logs_certificate_path() {
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Buffer(Arc<Mutex<Vec<u8>>>);

        impl Write for Buffer {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let (cert_pem, _) = generate(2099);
        let cert = write_temp(&cert_pem);
        let buffer = Buffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            SigningCredential::load(cert.path(), None).unwrap();
        });

        let logs = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
        assert!(logs.contains("Signing certificate loaded"));
        assert!(logs.contains(&cert.path().display().to_string()));
        assert!(logs.contains("private_key=false"));
    }

    #[test]
    fn test_missing_key_file_is_inaccessible() {
        let (cert_pem, _) = generate(2099);
        let cert = write_temp(&cert_pem);

        let credential =
            SigningCredential::load(cert.path(), Some(Path::new("/nonexistent/key.pem"))).unwrap();
        assert!(!credential.is_private_key_accessible());

        let credential = SigningCredential::load(cert.path(), None).unwrap();
        assert!(!credential.is_private_key_accessible());
    }

    #[test]
    fn test_pem_without_key_is_inaccessible() {
        let (cert_pem, _) = generate(2099);
        let cert = write_temp(&cert_pem);
        let not_a_key = write_temp(&cert_pem);

        let credential = SigningCredential::load(cert.path(), Some(not_a_key.path())).unwrap();
        assert!(!credential.is_private_key_accessible());
    }

    #[test]
    fn test_file_without_certificate() {
        let empty = write_temp("");
        assert!(matches!(
            SigningCredential::load(empty.path(), None),
            Err(CredentialError::MissingCertificate(_))
        ));
    }

    #[test]
    fn test_debug_hides_key_material() {
        let credential = SigningCredential::new("CN=test", UNIX_EPOCH, vec![1, 2, 3], Some(vec![9; 8]));
        let debug = format!("{:?}", credential);
        assert!(debug.contains("private_key: true"));
        assert!(!debug.contains("9, 9"));
    }
}
