//! JWT claims handling.

use std::collections::HashMap;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Registered JWT claims per RFC 7519 Section 4.1.
///
/// Claims outside the registered set are preserved in `additional`. The `aud`
/// claim is kept as a raw JSON value because tokens in the wild carry it as
/// either a single string or an array of strings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Claims {
    /// Issuer (iss) - identifies who issued the token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Subject (sub) - identifies the principal (user ID)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Audience (aud) - identifies the recipients
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<serde_json::Value>,

    /// Expiration Time (exp) - Unix timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,

    /// Not Before (nbf) - Unix timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,

    /// Issued At (iat) - Unix timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,

    /// JWT ID (jti) - unique identifier for replay prevention
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Additional claims not in RFC 7519
    #[serde(flatten)]
    pub additional: HashMap<String, serde_json::Value>,
}

/// Failure to read a token payload without signature verification.
#[derive(Debug, Error)]
pub enum PayloadDecodeError {
    /// The token is not three dot-separated segments.
    #[error("token is not three dot-separated segments")]
    Shape,

    /// The payload segment is not valid base64url.
    #[error("invalid payload encoding: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// The payload segment is not a JSON claims object.
    #[error("invalid payload JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Claims {
    /// Read the payload of `token` **without verifying its signature**.
    ///
    /// The result exists solely to drive key resolution (e.g. picking a key by
    /// issuer or `kid`). It must never be used as credentials or for any
    /// authorization decision; only claims returned by the verifier are
    /// trustworthy.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadDecodeError`] when the token does not have the
    /// three-segment shape or its payload is not base64url-encoded JSON.
    pub fn decode_payload_unverified(token: &str) -> Result<Self, PayloadDecodeError> {
        let mut segments = token.split('.');
        let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(_), Some(payload), Some(_), None) => payload,
            _ => return Err(PayloadDecodeError::Shape),
        };

        let bytes = URL_SAFE_NO_PAD.decode(payload)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// The subject claim, if present and non-empty.
    pub fn subject(&self) -> Option<&str> {
        self.sub.as_deref().filter(|s| !s.is_empty())
    }

    /// Render the claims as a JSON object for use as credentials.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
