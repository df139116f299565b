//! Primary cookie authentication.
//!
//! # Responsibilities
//! - Issue the `idsrv` session cookie after a successful sign-in
//! - Read and verify the cookie on every request
//! - Clear the cookie when the session ends
//!
//! # Design Decisions
//! - The cookie payload is JSON protected by the configured data protector
//! - Claim types pass through the token-handling maps in both directions;
//!   with mapping disabled they are stored exactly as issued
//!
//! # Data Flow
//! ```text
//! Cookie header -> unprotect -> JSON -> expiry check -> AuthenticatedSession
//!                                                            |
//!                                                  request extension
//! ```

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Request, State},
    http::{header::COOKIE, HeaderMap, HeaderValue},
    middleware::{self, Next},
    response::Response,
};
use serde::{Deserialize, Serialize};

use crate::config::schema::{CookieOptions, CookieSecureMode};
use crate::pipeline::{AssemblyContext, StageError, StageFactory, StageLayer};
use crate::security::data_protection::DataProtector;
use crate::security::require_ssl::is_secure_request;
use crate::tokens::TokenHandlerSettings;

/// Purpose string binding protected cookie payloads.
pub const COOKIE_PURPOSE: &str = "identity_server.cookie";

/// Error type for cookie issuance.
#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    #[error("failed to serialize session: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("cookie is not a valid header value: {0}")]
    InvalidHeader(#[from] axum::http::header::InvalidHeaderValue),
}

/// A single claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    #[serde(rename = "type")]
    pub claim_type: String,
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// The authenticated user carried by the primary cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedSession {
    pub subject: String,
    pub claims: Vec<Claim>,
    /// Unix seconds.
    pub issued_at: u64,
    /// Unix seconds.
    pub expires_at: u64,
}

impl AuthenticatedSession {
    pub fn claim(&self, claim_type: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|c| c.claim_type == claim_type)
            .map(|c| c.value.as_str())
    }
}

/// Issues and reads the primary authentication cookie.
pub struct CookieAuthentication {
    options: CookieOptions,
    protector: Arc<dyn DataProtector>,
    token_handling: TokenHandlerSettings,
}

impl CookieAuthentication {
    pub fn new(
        options: CookieOptions,
        protector: Arc<dyn DataProtector>,
        token_handling: TokenHandlerSettings,
    ) -> Self {
        Self {
            options,
            protector,
            token_handling,
        }
    }

    pub fn options(&self) -> &CookieOptions {
        &self.options
    }

    /// Build the `Set-Cookie` value for a new session.
    pub fn issue(
        &self,
        subject: &str,
        claims: &[Claim],
        now: SystemTime,
        request_secure: bool,
    ) -> Result<HeaderValue, CookieError> {
        let issued_at = unix_seconds(now);
        let session = AuthenticatedSession {
            subject: subject.to_string(),
            claims: claims
                .iter()
                .map(|c| {
                    Claim::new(
                        self.token_handling.outbound_claim_type_map.map(&c.claim_type),
                        c.value.clone(),
                    )
                })
                .collect(),
            issued_at,
            expires_at: issued_at.saturating_add(self.options.expire_secs),
        };

        let payload = serde_json::to_vec(&session)?;
        let value = self.protector.protect(COOKIE_PURPOSE, &payload);

        let mut cookie = format!(
            "{}={}; Path={}; Max-Age={}; HttpOnly; SameSite=Lax",
            self.options.name, value, self.options.path, self.options.expire_secs
        );
        if secure_attribute(self.options.secure, request_secure) {
            cookie.push_str("; Secure");
        }
        Ok(HeaderValue::from_str(&cookie)?)
    }

    /// Read the session from request headers. Missing, tampered and expired
    /// cookies all yield `None`.
    pub fn read(&self, headers: &HeaderMap, now: SystemTime) -> Option<AuthenticatedSession> {
        let raw = find_cookie(headers, &self.options.name)?;
        let payload = match self.protector.unprotect(COOKIE_PURPOSE, raw) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unreadable authentication cookie");
                return None;
            }
        };
        let mut session: AuthenticatedSession = serde_json::from_slice(&payload).ok()?;

        if session.expires_at <= unix_seconds(now) {
            tracing::debug!(subject = %session.subject, "Authentication cookie expired");
            return None;
        }

        for claim in &mut session.claims {
            let mapped = self.token_handling.inbound_claim_type_map.map(&claim.claim_type);
            if mapped != claim.claim_type {
                claim.claim_type = mapped.to_string();
            }
        }
        Some(session)
    }
}

/// Build a `Set-Cookie` value that removes the authentication cookie.
pub fn clear_cookie(options: &CookieOptions, request_secure: bool) -> Result<HeaderValue, CookieError> {
    let mut cookie = format!(
        "{}=; Path={}; Max-Age=0; HttpOnly; SameSite=Lax",
        options.name, options.path
    );
    if secure_attribute(options.secure, request_secure) {
        cookie.push_str("; Secure");
    }
    Ok(HeaderValue::from_str(&cookie)?)
}

fn secure_attribute(mode: CookieSecureMode, request_secure: bool) -> bool {
    match mode {
        CookieSecureMode::Always => true,
        CookieSecureMode::SameAsRequest => request_secure,
    }
}

fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn unix_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

/// Whether the current request was secure, as seen by the cookie stage.
#[derive(Debug, Clone, Copy)]
pub struct RequestSecurity {
    pub secure: bool,
}

async fn cookie_authentication_middleware(
    State((auth, trust_forwarded)): State<(Arc<CookieAuthentication>, bool)>,
    mut request: Request,
    next: Next,
) -> Response {
    let secure = is_secure_request(&request, trust_forwarded);
    request.extensions_mut().insert(RequestSecurity { secure });
    if let Some(session) = auth.read(request.headers(), SystemTime::now()) {
        tracing::trace!(subject = %session.subject, "Authenticated request");
        request.extensions_mut().insert(session);
    }
    next.run(request).await
}

/// Installs the primary cookie authentication scheme.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookieAuthenticationStage;

impl StageFactory for CookieAuthenticationStage {
    fn build(&self, ctx: &AssemblyContext) -> Result<StageLayer, StageError> {
        let cookie = &ctx.options.config.authentication.cookie;
        if cookie.name.trim().is_empty() {
            return Err(StageError::InvalidSetting {
                setting: "authentication.cookie.name",
                message: "must not be empty".to_string(),
            });
        }

        let auth = Arc::new(CookieAuthentication::new(
            cookie.clone(),
            Arc::clone(&ctx.options.data_protector),
            ctx.token_handling.clone(),
        ));
        let trust_forwarded = ctx.options.config.listener.trust_forwarded_headers;
        Ok(Box::new(move |router| {
            router.layer(middleware::from_fn_with_state(
                (auth, trust_forwarded),
                cookie_authentication_middleware,
            ))
        }))
    }
}
