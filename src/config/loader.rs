//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

pub(crate) fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ServerConfig, ConfigError> {
    let config: ServerConfig = toml::from_str(content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::CookieSecureMode;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert!(config.require_ssl);
        assert_eq!(config.authentication.cookie.name, "idsrv");
    }

    #[test]
    fn test_parse_sections() {
        let config = parse_config(
            r#"
            site_name = "Acme Login"
            require_ssl = false
            public_host_name = "http://localhost:44333"
            protocol_logout_urls = ["https://rp.example.com/signout"]

            [authentication.cookie]
            name = "acme"
            secure = "always"

            [cors]
            allowed_origins = ["https://app.example.com"]
            "#,
        )
        .unwrap();

        assert_eq!(config.site_name, "Acme Login");
        assert!(!config.require_ssl);
        assert_eq!(config.authentication.cookie.secure, CookieSecureMode::Always);
        assert_eq!(config.cors.allowed_origins.len(), 1);
        assert_eq!(config.protocol_logout_urls.len(), 1);
    }

    #[test]
    fn test_invalid_config_reports_validation() {
        let err = parse_config("site_name = \"\"").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("site_name"));
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(parse_config("require_ssl = "), Err(ConfigError::Parse(_))));
    }
}
