//! Claim type mapping.
//!
//! Token handlers historically rewrite short JWT claim names (`sub`, `role`)
//! into long URI claim types on the way in, and back on the way out. The
//! identity server works with the short names only, so the pipeline
//! constructs its token handling with both tables empty.

use std::collections::HashMap;

const NAME_IDENTIFIER: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier";
const NAME: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name";
const EMAIL: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress";
const GIVEN_NAME: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/givenname";
const SURNAME: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/surname";
const ROLE: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role";
const AUTH_TIME: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/authenticationinstant";

const LEGACY_INBOUND: &[(&str, &str)] = &[
    ("sub", NAME_IDENTIFIER),
    ("unique_name", NAME),
    ("email", EMAIL),
    ("given_name", GIVEN_NAME),
    ("family_name", SURNAME),
    ("role", ROLE),
    ("auth_time", AUTH_TIME),
];

/// A claim type substitution table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimTypeMap {
    entries: HashMap<String, String>,
}

impl ClaimTypeMap {
    /// A map that leaves every claim type untouched.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }

    /// Map a claim type, returning the input when no entry exists.
    pub fn map<'a>(&'a self, claim_type: &'a str) -> &'a str {
        self.entries
            .get(claim_type)
            .map(String::as_str)
            .unwrap_or(claim_type)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Claim handling passed to every collaborator that reads or writes claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHandlerSettings {
    pub inbound_claim_type_map: ClaimTypeMap,
    pub outbound_claim_type_map: ClaimTypeMap,
}

impl TokenHandlerSettings {
    /// Settings with both remapping tables disabled.
    pub fn without_claim_mapping() -> Self {
        Self {
            inbound_claim_type_map: ClaimTypeMap::none(),
            outbound_claim_type_map: ClaimTypeMap::none(),
        }
    }
}

impl Default for TokenHandlerSettings {
    /// The legacy tables: short names become URIs on read and back on write.
    fn default() -> Self {
        let inbound = ClaimTypeMap::from_pairs(LEGACY_INBOUND.iter().copied());
        let outbound = ClaimTypeMap::from_pairs(LEGACY_INBOUND.iter().map(|(short, long)| (*long, *short)));
        Self {
            inbound_claim_type_map: inbound,
            outbound_claim_type_map: outbound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_mapping_rewrites_short_names() {
        let settings = TokenHandlerSettings::default();
        assert_eq!(settings.inbound_claim_type_map.map("sub"), NAME_IDENTIFIER);
        assert_eq!(settings.outbound_claim_type_map.map(ROLE), "role");
        assert_eq!(settings.inbound_claim_type_map.map("custom"), "custom");
    }

    #[test]
    fn test_disabled_mapping_is_identity() {
        let settings = TokenHandlerSettings::without_claim_mapping();
        assert!(settings.inbound_claim_type_map.is_empty());
        assert!(settings.outbound_claim_type_map.is_empty());
        assert_eq!(settings.inbound_claim_type_map.map("sub"), "sub");
    }
}
