//! Application-level credential validation.
//!
//! Cryptographic verification proves a token was signed by a trusted key; it
//! says nothing about whether the account still exists, is enabled, or is
//! allowed in. That decision belongs to the caller through
//! [`CredentialValidator`], invoked exactly once per request after a token
//! passes verification.
//!
//! The validator's answer is a tagged result with three cases, so every call
//! site handles all of them explicitly: a takeover response (returned to the
//! client verbatim), an accept, or a reject. Accepts and rejects may substitute
//! the credentials the host sees and attach extra artifacts.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::claims::Claims;
use crate::error::BoxError;
use crate::extract::{AuthRequest, ExtractedToken};
use crate::scheme::TakeoverResponse;

/// A credential validation failure.
#[derive(Debug, Error)]
pub enum ValidatorError {
    /// The request must be rejected. Converted to an unauthenticated verdict
    /// carrying the verified claims and this error's message.
    #[error("{0}")]
    Denied(BoxError),

    /// The validator itself broke (datastore outage, bug, ...). Rethrown to
    /// the host as [`AuthError::Validator`](crate::AuthError::Validator),
    /// fatal to the request handling layer.
    #[error("validator failure: {0}")]
    Fatal(BoxError),
}

/// The validator's accept/reject decision.
#[derive(Debug, Default)]
pub struct ValidationDecision {
    /// Whether the credentials are valid at the application level.
    pub is_valid: bool,
    /// Optional replacement credentials. Used only if it is a JSON object;
    /// otherwise the verified claims are kept.
    pub credentials: Option<serde_json::Value>,
    /// Optional extra artifacts, merged with the raw token.
    pub artifacts: Option<HashMap<String, serde_json::Value>>,
}

impl ValidationDecision {
    /// Accept the credentials as-is.
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            ..Self::default()
        }
    }

    /// Reject the credentials.
    pub fn invalid() -> Self {
        Self::default()
    }

    /// Substitute the credentials handed to the host.
    #[must_use]
    pub fn with_credentials(mut self, credentials: serde_json::Value) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Attach an artifact alongside the raw token.
    #[must_use]
    pub fn with_artifact(
        mut self,
        name: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        self.artifacts
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value);
        self
    }
}

/// What the validator decided.
#[derive(Debug)]
pub enum ValidationOutcome {
    /// Bypass accept/reject entirely and send this response to the client.
    Takeover(TakeoverResponse),
    /// A normal accept/reject decision.
    Decision(ValidationDecision),
}

impl From<ValidationDecision> for ValidationOutcome {
    fn from(decision: ValidationDecision) -> Self {
        Self::Decision(decision)
    }
}

/// Caller-supplied validation logic, invoked once per cryptographically
/// verified token.
///
/// Implementations may suspend on I/O (account lookups, revocation checks).
/// Any binding context the validator needs is its own state; the scheme passes
/// nothing beyond the request, the extracted token, and the verified claims.
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    /// Decide whether `claims` represent valid credentials for `request`.
    ///
    /// # Errors
    ///
    /// [`ValidatorError::Denied`] rejects the request;
    /// [`ValidatorError::Fatal`] aborts it at the host layer.
    async fn validate(
        &self,
        request: &AuthRequest,
        token: &ExtractedToken,
        claims: &Claims,
    ) -> Result<ValidationOutcome, ValidatorError>;
}

/// Default validator: a token is valid iff it carries a non-empty `sub` claim.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubjectValidator;

#[async_trait]
impl CredentialValidator for SubjectValidator {
    async fn validate(
        &self,
        _request: &AuthRequest,
        _token: &ExtractedToken,
        claims: &Claims,
    ) -> Result<ValidationOutcome, ValidatorError> {
        let decision = if claims.subject().is_some() {
            ValidationDecision::valid()
        } else {
            ValidationDecision::invalid()
        };
        Ok(decision.into())
    }
}
