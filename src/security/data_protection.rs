//! Data protection for values round-tripped through the client.
//!
//! # Responsibilities
//! - Integrity-protect payloads (cookies, state parameters) with a server key
//! - Bind each payload to a purpose so it cannot be replayed elsewhere
//! - Expose the protector to downstream stages
//!
//! # Format
//! ```text
//! base64url(payload) "." base64url(HMAC-SHA256(key, purpose || 0x00 || payload))
//! ```

use std::sync::Arc;

use axum::Extension;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use hmac::digest::generic_array::GenericArray;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::config::validation::MIN_DATA_PROTECTION_KEY_LEN;
use crate::pipeline::{AssemblyContext, StageError, StageFactory, StageLayer};

type HmacSha256 = Hmac<Sha256>;

/// Error type for data protection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataProtectionError {
    #[error("invalid data protection key: {0}")]
    InvalidKey(String),

    #[error("protected payload is malformed")]
    Malformed,

    #[error("protected payload signature does not match")]
    InvalidSignature,
}

/// Protects and unprotects opaque payloads.
pub trait DataProtector: Send + Sync {
    fn protect(&self, purpose: &str, data: &[u8]) -> String;

    fn unprotect(&self, purpose: &str, protected: &str) -> Result<Vec<u8>, DataProtectionError>;
}

/// HMAC-SHA256 based protector.
#[derive(Clone)]
pub struct HmacDataProtector {
    mac: HmacSha256,
}

impl HmacDataProtector {
    pub fn new(key: &[u8]) -> Result<Self, DataProtectionError> {
        if key.len() < MIN_DATA_PROTECTION_KEY_LEN {
            return Err(DataProtectionError::InvalidKey(format!(
                "expected at least {} bytes, got {}",
                MIN_DATA_PROTECTION_KEY_LEN,
                key.len()
            )));
        }
        let mac = HmacSha256::new_from_slice(key)
            .map_err(|e| DataProtectionError::InvalidKey(e.to_string()))?;
        Ok(Self { mac })
    }

    /// Decode a standard base64 key.
    pub fn from_base64(key: &str) -> Result<Self, DataProtectionError> {
        let bytes = STANDARD
            .decode(key.trim())
            .map_err(|e| DataProtectionError::InvalidKey(e.to_string()))?;
        Self::new(&bytes)
    }

    /// A protector with a random per-process key of one SHA-256 block.
    pub fn generate() -> Self {
        let mut key = [0u8; 64];
        rand::thread_rng().fill_bytes(&mut key);
        Self {
            mac: <HmacSha256 as Mac>::new(GenericArray::from_slice(&key)),
        }
    }

    fn keyed(&self, purpose: &str, data: &[u8]) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(purpose.as_bytes());
        mac.update(&[0]);
        mac.update(data);
        mac
    }
}

impl DataProtector for HmacDataProtector {
    fn protect(&self, purpose: &str, data: &[u8]) -> String {
        let tag = self.keyed(purpose, data).finalize().into_bytes();
        format!("{}.{}", URL_SAFE_NO_PAD.encode(data), URL_SAFE_NO_PAD.encode(tag))
    }

    fn unprotect(&self, purpose: &str, protected: &str) -> Result<Vec<u8>, DataProtectionError> {
        let (payload, tag) = protected
            .split_once('.')
            .ok_or(DataProtectionError::Malformed)?;
        let data = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| DataProtectionError::Malformed)?;
        let tag = URL_SAFE_NO_PAD
            .decode(tag)
            .map_err(|_| DataProtectionError::Malformed)?;

        self.keyed(purpose, &data)
            .verify_slice(&tag)
            .map_err(|_| DataProtectionError::InvalidSignature)?;
        Ok(data)
    }
}

/// Request extension carrying the configured protector.
#[derive(Clone)]
pub struct DataProtection(pub Arc<dyn DataProtector>);

/// Makes the configured protector available to every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataProtectionStage;

impl StageFactory for DataProtectionStage {
    fn build(&self, ctx: &AssemblyContext) -> Result<StageLayer, StageError> {
        let protection = DataProtection(Arc::clone(&ctx.options.data_protector));
        Ok(Box::new(move |router| router.layer(Extension(protection))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protect_unprotect() {
        let protector = HmacDataProtector::generate();
        let protected = protector.protect("cookie", b"alice");
        assert_eq!(protector.unprotect("cookie", &protected).unwrap(), b"alice");
    }

    #[test]
    fn test_purpose_is_bound() {
        let protector = HmacDataProtector::generate();
        let protected = protector.protect("cookie", b"alice");
        assert_eq!(
            protector.unprotect("state", &protected),
            Err(DataProtectionError::InvalidSignature)
        );
    }

    #[test]
    fn test_tampered_payload() {
        let protector = HmacDataProtector::new(&[3u8; 32]).unwrap();
        let protected = protector.protect("cookie", b"alice");
        let (_, tag) = protected.split_once('.').unwrap();
        let forged = format!("{}.{}", URL_SAFE_NO_PAD.encode(b"mallory"), tag);

        assert_eq!(
            protector.unprotect("cookie", &forged),
            Err(DataProtectionError::InvalidSignature)
        );
        assert_eq!(
            protector.unprotect("cookie", "no-separator"),
            Err(DataProtectionError::Malformed)
        );
    }

    #[test]
    fn test_keys_are_not_interchangeable() {
        let a = HmacDataProtector::new(&[1u8; 32]).unwrap();
        let b = HmacDataProtector::from_base64(&STANDARD.encode([2u8; 32])).unwrap();
        let protected = a.protect("cookie", b"alice");
        assert!(b.unprotect("cookie", &protected).is_err());
    }

    #[test]
    fn test_short_key_rejected() {
        assert!(matches!(
            HmacDataProtector::new(&[0u8; 8]),
            Err(DataProtectionError::InvalidKey(_))
        ));
    }
}
