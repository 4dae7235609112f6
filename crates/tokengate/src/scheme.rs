//! The authentication decision engine.
//!
//! [`AuthScheme::authenticate`] runs a single request through the full pass:
//!
//! ```text
//! locate token -> unverified payload peek -> resolve keys
//!     -> verify (ordered key fallback) -> validate credentials -> verdict
//! ```
//!
//! Exactly one [`Verdict`] is produced per request. Per-request failures
//! become [`Verdict::Unauthenticated`]; only unimplemented sources, resolver
//! malfunctions, and fatal validator failures surface as `Err` to the host.
//!
//! Key fallback is strictly sequential with first-success short-circuit.
//! Rejections never say which key failed, only that none succeeded.

use std::collections::HashMap;
use std::sync::Arc;

use http::StatusCode;
use jsonwebtoken::DecodingKey;
use tracing::{debug, warn};

use crate::claims::Claims;
use crate::config::{KeySource, SchemeConfig};
use crate::error::AuthError;
use crate::extract::{AuthRequest, ExtractFailure, ExtractedToken, locate_token};
use crate::validate::{ValidationOutcome, ValidatorError};
use crate::verify::{VerifyError, verify_token};

/// Challenge scheme reported when no token reached type classification.
const DEFAULT_CHALLENGE_SCHEME: &str = "jwt";

/// A caller-constructed response that bypasses accept/reject handling and is
/// returned to the client verbatim.
pub type TakeoverResponse = http::Response<Vec<u8>>;

/// Why a request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// No configured source produced a token.
    MissingToken,
    /// The authorization header shape is unusable (client-error class).
    MalformedHeader,
    /// The authorization scheme label is not an accepted token type.
    UnknownScheme,
    /// The token is not three dot-separated segments.
    BadTokenFormat,
    /// No candidate key verified the token.
    InvalidToken,
    /// No candidate key verified the token and the last cause was expiration.
    ExpiredToken,
    /// The token verified but its credentials were rejected.
    InvalidCredentials,
}

/// Diagnostic attributes attached to a rejection.
#[derive(Debug, Clone, Default)]
pub struct ChallengeAttributes {
    /// The raw token, when one was extracted.
    pub token: Option<String>,
    /// The declared token type, when one was classified.
    pub token_type: Option<String>,
    /// The credentials that were evaluated, when validation was reached.
    pub credentials: Option<serde_json::Value>,
}

/// An unauthenticated outcome: reason, challenge scheme, and diagnostics.
#[derive(Debug, Clone)]
pub struct Unauthorized {
    /// The rejection category.
    pub kind: RejectionKind,
    /// A reason message, when one is defined for the category.
    pub message: Option<String>,
    /// The challenge scheme reported back to the client.
    pub scheme: String,
    /// Diagnostic attributes.
    pub attributes: ChallengeAttributes,
}

impl Unauthorized {
    pub(crate) fn missing_token() -> Self {
        Self {
            kind: RejectionKind::MissingToken,
            message: None,
            scheme: DEFAULT_CHALLENGE_SCHEME.to_string(),
            attributes: ChallengeAttributes::default(),
        }
    }

    pub(crate) fn malformed_header() -> Self {
        Self {
            kind: RejectionKind::MalformedHeader,
            message: Some("Malformed authorization header".to_string()),
            scheme: DEFAULT_CHALLENGE_SCHEME.to_string(),
            attributes: ChallengeAttributes::default(),
        }
    }

    pub(crate) fn unknown_scheme(label: &str) -> Self {
        Self {
            kind: RejectionKind::UnknownScheme,
            message: None,
            scheme: label.to_string(),
            attributes: ChallengeAttributes::default(),
        }
    }

    pub(crate) fn bad_format(raw: String) -> Self {
        Self {
            kind: RejectionKind::BadTokenFormat,
            message: Some("Invalid token format".to_string()),
            scheme: DEFAULT_CHALLENGE_SCHEME.to_string(),
            attributes: ChallengeAttributes {
                token: Some(raw),
                ..ChallengeAttributes::default()
            },
        }
    }

    pub(crate) fn invalid_token(expired: bool, token: &ExtractedToken) -> Self {
        let (kind, message) = if expired {
            (RejectionKind::ExpiredToken, "Expired token")
        } else {
            (RejectionKind::InvalidToken, "Invalid token")
        };
        Self {
            kind,
            message: Some(message.to_string()),
            scheme: DEFAULT_CHALLENGE_SCHEME.to_string(),
            attributes: ChallengeAttributes {
                token: Some(token.raw.clone()),
                token_type: Some(token.token_type.clone()),
                credentials: None,
            },
        }
    }

    pub(crate) fn invalid_credentials(credentials: Option<serde_json::Value>) -> Self {
        Self {
            kind: RejectionKind::InvalidCredentials,
            message: Some("Invalid credentials".to_string()),
            scheme: DEFAULT_CHALLENGE_SCHEME.to_string(),
            attributes: ChallengeAttributes {
                credentials,
                ..ChallengeAttributes::default()
            },
        }
    }

    pub(crate) fn validator_denied(message: String, credentials: serde_json::Value) -> Self {
        Self {
            kind: RejectionKind::InvalidCredentials,
            message: Some(message),
            scheme: DEFAULT_CHALLENGE_SCHEME.to_string(),
            attributes: ChallengeAttributes {
                credentials: Some(credentials),
                ..ChallengeAttributes::default()
            },
        }
    }

    /// The HTTP status class for this rejection: 400 for a malformed header,
    /// 401 otherwise.
    pub fn status(&self) -> StatusCode {
        match self.kind {
            RejectionKind::MalformedHeader => StatusCode::BAD_REQUEST,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// The `WWW-Authenticate` challenge value for this rejection.
    pub fn challenge(&self) -> String {
        match &self.message {
            Some(message) => format!("{} error=\"{}\"", self.scheme, message),
            None => self.scheme.clone(),
        }
    }
}

/// Artifacts accompanying an authenticated verdict. Always carries the raw
/// token; the validator may attach more.
#[derive(Debug, Clone, Default)]
pub struct Artifacts {
    /// The raw token string that authenticated the request.
    pub token: String,
    /// Validator-supplied artifacts.
    pub extra: HashMap<String, serde_json::Value>,
}

/// The single authentication outcome for a request.
#[derive(Debug)]
pub enum Verdict {
    /// The request is authenticated.
    Authenticated {
        /// The credentials the host should attach to the request: the verified
        /// claims, or the validator's substitute when it supplied a
        /// well-formed one.
        credentials: serde_json::Value,
        /// The raw token plus any validator-supplied artifacts.
        artifacts: Artifacts,
    },
    /// The request is rejected.
    Unauthenticated(Unauthorized),
    /// The validator hijacked the response; return it verbatim.
    Takeover(TakeoverResponse),
}

impl Verdict {
    /// Whether this verdict authenticates the request.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// The authentication gate for one scheme configuration.
///
/// Holds only the immutable [`SchemeConfig`]; every request runs an
/// independent sequential pass, so one `AuthScheme` (usually behind an `Arc`)
/// serves any number of concurrent requests without locking.
#[derive(Debug)]
pub struct AuthScheme {
    config: SchemeConfig,
}

impl AuthScheme {
    /// Create a scheme from a validated configuration.
    pub fn new(config: SchemeConfig) -> Self {
        Self { config }
    }

    /// The scheme's configuration.
    pub fn config(&self) -> &SchemeConfig {
        &self.config
    }

    /// Run the full authentication pass for one request.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] only for failures the host must handle itself:
    /// an unimplemented token source, a key-resolver malfunction, or a fatal
    /// validator failure. Everything else is a [`Verdict`].
    pub async fn authenticate(&self, request: &AuthRequest) -> Result<Verdict, AuthError> {
        let token = match locate_token(request, &self.config) {
            Ok(token) => token,
            Err(ExtractFailure::Rejected(rejection)) => {
                return Ok(Verdict::Unauthenticated(rejection));
            }
            Err(ExtractFailure::NotImplemented(source)) => {
                return Err(AuthError::NotImplemented(source));
            }
        };

        // The unverified payload only drives key resolution; it is never
        // handed out as credentials.
        let unverified = match Claims::decode_payload_unverified(&token.raw) {
            Ok(claims) => claims,
            Err(err) => {
                debug!(error = %err, "token payload is not decodable");
                return Ok(Verdict::Unauthenticated(Unauthorized::bad_format(
                    token.raw,
                )));
            }
        };

        let resolved;
        let keys: &[DecodingKey] = match &self.config.keys {
            KeySource::Static(keys) => keys,
            KeySource::Resolver(resolver) => {
                let resolution = resolver
                    .resolve(&unverified)
                    .await
                    .map_err(AuthError::KeyResolution)?;
                if resolution.is_valid {
                    resolved = resolution.keys;
                } else {
                    // An invalid resolution verifies against an empty key
                    // set, guaranteeing a final unauthenticated verdict.
                    warn!(issuer = ?unverified.iss, "key resolver marked token unresolvable");
                    resolved = Vec::new();
                }
                &resolved
            }
        };

        let mut verified = None;
        let mut last_error: Option<VerifyError> = None;
        for key in keys {
            match verify_token(&token.raw, key, &self.config.verify) {
                Ok(claims) => {
                    verified = Some(claims);
                    break;
                }
                Err(err) => {
                    debug!(error = %err, "verification attempt failed, trying next key");
                    last_error = Some(err);
                }
            }
        }

        let Some(claims) = verified else {
            return Ok(Verdict::Unauthenticated(match last_error {
                Some(err) => Unauthorized::invalid_token(err.is_expired(), &token),
                // Exhausted without a single attempt: the resolved key set
                // was empty.
                None => Unauthorized::invalid_credentials(Some(unverified.to_value())),
            }));
        };

        match self.config.validator.validate(request, &token, &claims).await {
            Ok(ValidationOutcome::Takeover(response)) => {
                debug!("validator took over the response");
                Ok(Verdict::Takeover(response))
            }
            Ok(ValidationOutcome::Decision(decision)) => {
                let credentials = match decision.credentials {
                    Some(value) if value.is_object() => value,
                    Some(_) => {
                        warn!("substituted credentials are not an object; keeping verified claims");
                        claims.to_value()
                    }
                    None => claims.to_value(),
                };

                if decision.is_valid {
                    debug!(subject = ?claims.sub, "authentication succeeded");
                    Ok(Verdict::Authenticated {
                        credentials,
                        artifacts: Artifacts {
                            token: token.raw,
                            extra: decision.artifacts.unwrap_or_default(),
                        },
                    })
                } else {
                    Ok(Verdict::Unauthenticated(Unauthorized::invalid_credentials(
                        Some(credentials),
                    )))
                }
            }
            Err(ValidatorError::Denied(err)) => Ok(Verdict::Unauthenticated(
                Unauthorized::validator_denied(err.to_string(), claims.to_value()),
            )),
            Err(ValidatorError::Fatal(err)) => Err(AuthError::Validator(err)),
        }
    }
}

/// Convenience: wrap a validated configuration into a shareable scheme.
impl From<SchemeConfig> for Arc<AuthScheme> {
    fn from(config: SchemeConfig) -> Self {
        Arc::new(AuthScheme::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_status_classes() {
        assert_eq!(
            Unauthorized::malformed_header().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Unauthorized::missing_token().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Unauthorized::invalid_credentials(None).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn challenge_includes_message_when_present() {
        let rejected = Unauthorized::invalid_credentials(None);
        assert_eq!(rejected.challenge(), "jwt error=\"Invalid credentials\"");

        let rejected = Unauthorized::unknown_scheme("Basic");
        assert_eq!(rejected.challenge(), "Basic");
    }
}
