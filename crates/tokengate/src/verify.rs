//! Cryptographic token verification.
//!
//! [`verify_token`] checks one token against one key. It is free of shared
//! mutable state, so the orchestrator can call it repeatedly across a candidate
//! key list; a failure with one key says nothing about the next.
//!
//! The signing algorithm is checked against the configured allowlist from the
//! token header **before** any cryptographic work. Accepting whatever algorithm
//! the header declares would let an attacker downgrade verification (the
//! classic algorithm-substitution attack), so a token signed with anything
//! outside the allowlist is rejected even if its signature would verify.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, TokenData, decode, decode_header};
use thiserror::Error;
use tracing::debug;

use crate::claims::Claims;
use crate::config::VerifyOptions;

/// A typed verification failure for a single (token, key) attempt.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The token's `exp` claim (or configured max age) has passed.
    #[error("token has expired")]
    Expired,

    /// The token's `nbf` claim is in the future.
    #[error("token is not yet valid")]
    NotYetValid,

    /// The signature does not verify under the attempted key.
    #[error("signature verification failed")]
    BadSignature,

    /// The token header declares an algorithm outside the allowlist.
    #[error("algorithm {0:?} is not allowed")]
    DisallowedAlgorithm(Algorithm),

    /// The token is not structurally a JWT.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// A standard claim failed validation (audience, issuer, subject, ...).
    #[error("claim validation failed: {0}")]
    Claim(String),
}

impl VerifyError {
    /// Whether the failure is an expiration, which the orchestrator reports as
    /// `"Expired token"` rather than `"Invalid token"`.
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired)
    }

    fn from_jwt(err: &jsonwebtoken::errors::Error) -> Self {
        let detail = err.to_string();
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::NotYetValid,
            ErrorKind::InvalidSignature => Self::BadSignature,
            ErrorKind::InvalidAudience
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidSubject
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::MissingRequiredClaim(_) => Self::Claim(detail),
            _ => Self::Malformed(detail),
        }
    }
}

/// Verify `token` against `key` under `options`.
///
/// On success returns the decoded claims; these are the only claims value safe
/// to hand to the credential validator or to use as credentials.
///
/// # Errors
///
/// Returns a [`VerifyError`] describing why this attempt failed. The caller
/// decides whether to fall back to another key.
pub fn verify_token(
    token: &str,
    key: &DecodingKey,
    options: &VerifyOptions,
) -> Result<Claims, VerifyError> {
    let header = decode_header(token).map_err(|e| {
        debug!(error = %e, "failed to decode token header");
        VerifyError::Malformed(e.to_string())
    })?;

    if !options.algorithms.contains(&header.alg) {
        debug!(
            algorithm = ?header.alg,
            allowed = ?options.algorithms,
            "token algorithm not in allowlist"
        );
        return Err(VerifyError::DisallowedAlgorithm(header.alg));
    }

    let validation = options.to_validation();
    let data: TokenData<Claims> =
        decode(token, key, &validation).map_err(|e| VerifyError::from_jwt(&e))?;

    if let Some(max_age) = options.max_age_secs {
        check_max_age(&data.claims, max_age, options.leeway_secs)?;
    }

    Ok(data.claims)
}

fn check_max_age(claims: &Claims, max_age: u64, leeway: u64) -> Result<(), VerifyError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    match claims.iat {
        Some(iat) if now.saturating_sub(iat) <= max_age.saturating_add(leeway) => Ok(()),
        // A max-age violation is an expiration, matching exp handling.
        Some(_) => Err(VerifyError::Expired),
        None => Err(VerifyError::Claim(
            "max age configured but token has no iat claim".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    const SECRET: &[u8] = b"verification-test-secret-0123456789abcdef";

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    fn mint(claims: &Claims, alg: Algorithm) -> String {
        encode(&Header::new(alg), claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    fn base_claims() -> Claims {
        Claims {
            sub: Some("user-1".to_string()),
            exp: Some(now() + 3600),
            iat: Some(now()),
            ..Claims::default()
        }
    }

    fn options() -> VerifyOptions {
        VerifyOptions::new(vec![Algorithm::HS256])
    }

    #[test]
    fn accepts_valid_token() {
        let token = mint(&base_claims(), Algorithm::HS256);
        let claims =
            verify_token(&token, &DecodingKey::from_secret(SECRET), &options()).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("user-1"));
    }

    #[test]
    fn rejects_wrong_key() {
        let token = mint(&base_claims(), Algorithm::HS256);
        let err =
            verify_token(&token, &DecodingKey::from_secret(b"other-key"), &options()).unwrap_err();
        assert!(matches!(err, VerifyError::BadSignature));
    }

    #[test]
    fn rejects_disallowed_algorithm_before_signature_check() {
        // HS384-signed with the right secret; the allowlist only has HS256.
        let token = mint(&base_claims(), Algorithm::HS384);
        let err = verify_token(&token, &DecodingKey::from_secret(SECRET), &options()).unwrap_err();
        assert!(matches!(
            err,
            VerifyError::DisallowedAlgorithm(Algorithm::HS384)
        ));
    }

    #[test]
    fn expired_token_is_typed_as_expired() {
        let claims = Claims {
            exp: Some(now() - 120),
            ..base_claims()
        };
        let token = mint(&claims, Algorithm::HS256);
        let err = verify_token(&token, &DecodingKey::from_secret(SECRET), &options()).unwrap_err();
        assert!(err.is_expired());
    }

    #[test]
    fn ignore_expiration_accepts_expired_token() {
        let claims = Claims {
            exp: Some(now() - 120),
            ..base_claims()
        };
        let token = mint(&claims, Algorithm::HS256);
        let opts = options().ignore_expiration();
        assert!(verify_token(&token, &DecodingKey::from_secret(SECRET), &opts).is_ok());
    }

    #[test]
    fn future_nbf_is_rejected_unless_ignored() {
        let claims = Claims {
            nbf: Some(now() + 600),
            ..base_claims()
        };
        let token = mint(&claims, Algorithm::HS256);

        let err = verify_token(&token, &DecodingKey::from_secret(SECRET), &options()).unwrap_err();
        assert!(matches!(err, VerifyError::NotYetValid));

        let opts = options().ignore_not_before();
        assert!(verify_token(&token, &DecodingKey::from_secret(SECRET), &opts).is_ok());
    }

    #[test]
    fn audience_mismatch_is_a_claim_error() {
        let claims = Claims {
            aud: Some(serde_json::json!("https://other.example")),
            ..base_claims()
        };
        let token = mint(&claims, Algorithm::HS256);
        let opts = options().with_audience(["https://api.example.com"]);
        let err = verify_token(&token, &DecodingKey::from_secret(SECRET), &opts).unwrap_err();
        assert!(matches!(err, VerifyError::Claim(_)));
        assert!(!err.is_expired());
    }

    #[test]
    fn token_without_exp_passes_when_exp_not_required() {
        let claims = Claims {
            sub: Some("user-1".to_string()),
            iat: Some(now()),
            ..Claims::default()
        };
        let token = mint(&claims, Algorithm::HS256);
        assert!(verify_token(&token, &DecodingKey::from_secret(SECRET), &options()).is_ok());
    }

    #[test]
    fn max_age_rejects_old_tokens_as_expired() {
        let claims = Claims {
            iat: Some(now() - 900),
            ..base_claims()
        };
        let token = mint(&claims, Algorithm::HS256);
        let opts = options().with_max_age(600);
        let err = verify_token(&token, &DecodingKey::from_secret(SECRET), &opts).unwrap_err();
        assert!(err.is_expired());

        let opts = options().with_max_age(1800);
        assert!(verify_token(&token, &DecodingKey::from_secret(SECRET), &opts).is_ok());
    }

    #[test]
    fn clock_tolerance_applies_to_expiration() {
        let claims = Claims {
            exp: Some(now() - 30),
            ..base_claims()
        };
        let token = mint(&claims, Algorithm::HS256);

        let opts = options().with_leeway(60);
        assert!(verify_token(&token, &DecodingKey::from_secret(SECRET), &opts).is_ok());
    }
}
