//! Validated email address value type.

use serde::{Deserialize, Serialize};

/// An email address, validated at construction time so that malformed
/// addresses are rejected at the ingress boundary rather than surfacing
/// as obscure failures deep in saga processing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Email(String);

/// The address did not look like `local@domain`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid email address: {0}")]
pub struct EmailError(pub String);

impl Email {
    /// Validates and wraps an email address.
    ///
    /// The check is deliberately shallow — a non-empty local part, an `@`,
    /// and a domain part containing a `.` — matching the boundary the spec
    /// actually needs (reject garbage, not implement RFC 5322).
    pub fn parse(s: impl Into<String>) -> Result<Self, EmailError> {
        let s = s.into();
        let Some((local, domain)) = s.split_once('@') else {
            return Err(EmailError(s));
        };
        if local.is_empty() || domain.is_empty() || !domain.contains('.') || s.contains(' ') {
            return Err(EmailError(s));
        }
        Ok(Self(s))
    }

    /// Returns the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Email {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Email::parse(raw).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_addresses() {
        assert!(Email::parse("alice@example.com").is_ok());
        assert!(Email::parse("vendor@shop.example.co").is_ok());
    }

    #[test]
    fn rejects_missing_at_sign() {
        assert!(Email::parse("alice.example.com").is_err());
    }

    #[test]
    fn rejects_empty_local_or_domain() {
        assert!(Email::parse("@example.com").is_err());
        assert!(Email::parse("alice@").is_err());
    }

    #[test]
    fn rejects_domain_without_dot() {
        assert!(Email::parse("alice@localhost").is_err());
    }

    #[test]
    fn rejects_embedded_whitespace() {
        assert!(Email::parse("alice smith@example.com").is_err());
    }

    #[test]
    fn deserialize_rejects_malformed_json_string() {
        let result: Result<Email, _> = serde_json::from_str("\"not-an-email\"");
        assert!(result.is_err());
    }

    #[test]
    fn serialization_roundtrip() {
        let email = Email::parse("alice@example.com").unwrap();
        let json = serde_json::to_string(&email).unwrap();
        let back: Email = serde_json::from_str(&json).unwrap();
        assert_eq!(email, back);
    }
}
