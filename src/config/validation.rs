//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check URL consistency (public host name, issuer, logout URLs, CORS origins)
//! - Validate cookie and key settings
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before any pipeline stage is installed

use axum::http::{HeaderName, HeaderValue, Method};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use url::Url;

use crate::config::schema::ServerConfig;

/// Minimum data protection key length in bytes.
pub const MIN_DATA_PROTECTION_KEY_LEN: usize = 32;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending setting.
    pub field: String,
    /// Human readable description.
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a configuration, collecting every violation.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.site_name.trim().is_empty() {
        errors.push(ValidationError::new("site_name", "must not be empty"));
    }

    if let Some(host) = &config.public_host_name {
        match parse_origin(host) {
            Ok(url) => {
                if config.require_ssl && url.scheme() != "https" {
                    errors.push(ValidationError::new(
                        "public_host_name",
                        "must use https when require_ssl is enabled",
                    ));
                }
            }
            Err(message) => errors.push(ValidationError::new("public_host_name", message)),
        }
    }

    if let Some(issuer) = &config.issuer_uri {
        if let Err(message) = parse_origin(issuer) {
            errors.push(ValidationError::new("issuer_uri", message));
        }
    }

    for (i, logout_url) in config.protocol_logout_urls.iter().enumerate() {
        let rooted = logout_url.starts_with('/') && !logout_url.starts_with("//");
        if !rooted && Url::parse(logout_url).is_err() {
            errors.push(ValidationError::new(
                format!("protocol_logout_urls[{}]", i),
                "must be an absolute URL or a path starting with '/'",
            ));
        }
    }

    let cookie = &config.authentication.cookie;
    if cookie.name.is_empty() {
        errors.push(ValidationError::new("authentication.cookie.name", "must not be empty"));
    } else if cookie
        .name
        .chars()
        .any(|c| c.is_whitespace() || c == ';' || c == '=' || c == ',')
    {
        errors.push(ValidationError::new(
            "authentication.cookie.name",
            "must not contain whitespace, ';', ',' or '='",
        ));
    }
    if !cookie.path.starts_with('/') {
        errors.push(ValidationError::new("authentication.cookie.path", "must start with '/'"));
    }
    if cookie.expire_secs == 0 {
        errors.push(ValidationError::new("authentication.cookie.expire_secs", "must be greater than 0"));
    }

    let cors = &config.cors;
    let wildcard = cors.allowed_origins.iter().any(|o| o == "*");
    if wildcard && cors.allow_credentials {
        errors.push(ValidationError::new(
            "cors.allow_credentials",
            "cannot be combined with a wildcard origin",
        ));
    }
    for (i, origin) in cors.allowed_origins.iter().enumerate() {
        if origin == "*" {
            continue;
        }
        let valid = parse_origin(origin).is_ok_and(|url| url.path() == "/")
            && HeaderValue::from_str(origin.trim_end_matches('/')).is_ok();
        if !valid {
            errors.push(ValidationError::new(
                format!("cors.allowed_origins[{}]", i),
                "must be '*' or an absolute origin without a path",
            ));
        }
    }
    for (i, method) in cors.allowed_methods.iter().enumerate() {
        if method.parse::<Method>().is_err() {
            errors.push(ValidationError::new(
                format!("cors.allowed_methods[{}]", i),
                "must be a valid HTTP method",
            ));
        }
    }
    for (i, header) in cors.allowed_headers.iter().enumerate() {
        if header != "*" && header.parse::<HeaderName>().is_err() {
            errors.push(ValidationError::new(
                format!("cors.allowed_headers[{}]", i),
                "must be '*' or a valid header name",
            ));
        }
    }

    if config.signing.private_key_path.is_some() && config.signing.certificate_path.is_none() {
        errors.push(ValidationError::new(
            "signing.certificate_path",
            "required when signing.private_key_path is set",
        ));
    }

    if let Some(key) = &config.data_protection.key {
        match STANDARD.decode(key) {
            Ok(bytes) if bytes.len() >= MIN_DATA_PROTECTION_KEY_LEN => {}
            Ok(_) => errors.push(ValidationError::new(
                "data_protection.key",
                format!("must decode to at least {} bytes", MIN_DATA_PROTECTION_KEY_LEN),
            )),
            Err(_) => errors.push(ValidationError::new("data_protection.key", "must be valid base64")),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn parse_origin(value: &str) -> Result<Url, &'static str> {
    let url = Url::parse(value).map_err(|_| "must be an absolute URL")?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err("must use the http or https scheme");
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("must not contain a query or fragment");
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(errors: &[ValidationError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ServerConfig::default();
        config.site_name = " ".into();
        config.authentication.cookie.name = "bad name".into();
        config.authentication.cookie.expire_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            fields(&errors),
            vec![
                "site_name",
                "authentication.cookie.name",
                "authentication.cookie.expire_secs"
            ]
        );
    }

    #[test]
    fn test_http_public_host_rejected_when_ssl_required() {
        let mut config = ServerConfig::default();
        config.public_host_name = Some("http://id.example.com".into());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(fields(&errors), vec!["public_host_name"]);

        config.require_ssl = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_public_host_must_be_absolute() {
        let mut config = ServerConfig::default();
        config.public_host_name = Some("id.example.com".into());
        assert!(validate_config(&config).is_err());

        config.public_host_name = Some("https://id.example.com/?x=1".into());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_logout_urls() {
        let mut config = ServerConfig::default();
        config.protocol_logout_urls = vec![
            "/connect/endsession/callback".into(),
            "https://rp.example.com/signout".into(),
            "relative/path".into(),
        ];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(fields(&errors), vec!["protocol_logout_urls[2]"]);
    }

    #[test]
    fn test_cors_wildcard_with_credentials() {
        let mut config = ServerConfig::default();
        config.cors.allowed_origins = vec!["*".into()];
        config.cors.allow_credentials = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(fields(&errors), vec!["cors.allow_credentials"]);
    }

    #[test]
    fn test_cors_entries_must_parse() {
        let mut config = ServerConfig::default();
        config.cors.allowed_origins = vec![
            "https://app.example.com".into(),
            "https://app.example.com/callback".into(),
            "not an origin".into(),
        ];
        config.cors.allowed_methods = vec!["GET".into(), "BAD METHOD".into()];
        config.cors.allowed_headers = vec!["x-custom".into(), "bad header".into()];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            fields(&errors),
            vec![
                "cors.allowed_origins[1]",
                "cors.allowed_origins[2]",
                "cors.allowed_methods[1]",
                "cors.allowed_headers[1]",
            ]
        );
    }

    #[test]
    fn test_private_key_without_certificate() {
        let mut config = ServerConfig::default();
        config.signing.private_key_path = Some("/etc/idsrv/key.pem".into());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(fields(&errors), vec!["signing.certificate_path"]);
    }

    #[test]
    fn test_short_data_protection_key() {
        let mut config = ServerConfig::default();
        config.data_protection.key = Some(STANDARD.encode([7u8; 16]));
        assert!(validate_config(&config).is_err());

        config.data_protection.key = Some(STANDARD.encode([7u8; 32]));
        assert!(validate_config(&config).is_ok());
    }
}
