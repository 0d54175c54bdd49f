//! Bearer-token authentication against an external authorization service.
//!
//! The authorization side-car itself is out of scope (spec.md §1); this
//! module only defines the contract the ingress handlers call and two
//! implementations of it: an HTTP client mirroring `auth_http_client.py`'s
//! cascading customer/vendor/admin probe, and an in-memory stand-in for
//! tests.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// The role under which a caller's token was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    Customer,
    Vendor,
    Admin,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing or malformed Authorization header")]
    MissingToken,
    #[error("token was rejected by every role endpoint")]
    Rejected,
    #[error("authorization service error: {0}")]
    ServiceUnavailable(String),
}

/// Validates a bearer token against the external authorization service.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<Principal, AuthError>;
}

/// Calls the authorization service's per-role policy endpoints, trying
/// customer, then vendor, then admin — the same cascade
/// `authenticate_user` performs in the system this was distilled from.
pub struct HttpTokenValidator {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTokenValidator {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build authorization HTTP client");
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    async fn probe(&self, endpoint: &str, token: &str) -> bool {
        let url = format!("{}{}", self.base_url, endpoint);
        match self
            .client
            .post(&url)
            .header("accept", "*/*")
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!(error = %e, endpoint, "authorization probe failed");
                false
            }
        }
    }
}

#[async_trait]
impl TokenValidator for HttpTokenValidator {
    async fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        if self.probe("/customer-policy", token).await {
            return Ok(Principal::Customer);
        }
        if self.probe("/vendor-policy", token).await {
            return Ok(Principal::Vendor);
        }
        if self.probe("/admin-policy", token).await {
            return Ok(Principal::Admin);
        }
        Err(AuthError::Rejected)
    }
}

/// Accepts any non-empty token as the given role. Used by tests and local
/// development so the ingress API can be exercised without a running
/// authorization side-car.
pub struct AllowAllValidator {
    role: Principal,
}

impl AllowAllValidator {
    pub fn new(role: Principal) -> Self {
        Self { role }
    }
}

#[async_trait]
impl TokenValidator for AllowAllValidator {
    async fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        Ok(self.role)
    }
}

/// Extracts the bearer token from an `Authorization` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingToken)?;
    header
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_strips_prefix() {
        assert_eq!(bearer_token(Some("Bearer abc123")).unwrap(), "abc123");
    }

    #[test]
    fn bearer_token_rejects_missing_header() {
        assert!(bearer_token(None).is_err());
    }

    #[test]
    fn bearer_token_rejects_wrong_scheme() {
        assert!(bearer_token(Some("Basic abc123")).is_err());
    }

    #[tokio::test]
    async fn allow_all_validator_accepts_any_nonempty_token() {
        let validator = AllowAllValidator::new(Principal::Customer);
        assert_eq!(validator.authenticate("t").await.unwrap(), Principal::Customer);
    }

    #[tokio::test]
    async fn allow_all_validator_rejects_empty_token() {
        let validator = AllowAllValidator::new(Principal::Customer);
        assert!(validator.authenticate("").await.is_err());
    }
}
