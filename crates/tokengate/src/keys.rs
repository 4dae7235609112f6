//! Per-request key resolution.
//!
//! A [`KeyResolver`] lets the caller pick verification keys based on the
//! *unverified* token payload (typically the `iss` claim or a `kid` carried in
//! a custom claim) without this crate knowing anything about key storage. The
//! resolver may perform I/O; the authentication pass awaits it without blocking
//! other in-flight requests. Any caching belongs behind the resolver.

use async_trait::async_trait;
use jsonwebtoken::DecodingKey;

use crate::claims::Claims;
use crate::error::BoxError;

/// The outcome of a key-resolution attempt.
///
/// `is_valid == false` marks the token as unresolvable (unknown issuer,
/// revoked key, ...). Verification then proceeds with an empty key set, which
/// guarantees a final unauthenticated verdict without leaking why resolution
/// failed.
pub struct KeyResolution {
    /// Whether the resolver considers the token resolvable at all.
    pub is_valid: bool,
    /// Candidate keys, attempted in order.
    pub keys: Vec<DecodingKey>,
}

impl KeyResolution {
    /// A successful resolution with an ordered candidate key list.
    pub fn valid(keys: Vec<DecodingKey>) -> Self {
        Self {
            is_valid: true,
            keys,
        }
    }

    /// A successful resolution with a single key.
    pub fn single(key: DecodingKey) -> Self {
        Self::valid(vec![key])
    }

    /// Mark the token as unresolvable.
    pub fn invalid() -> Self {
        Self {
            is_valid: false,
            keys: Vec::new(),
        }
    }
}

impl std::fmt::Debug for KeyResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyResolution")
            .field("is_valid", &self.is_valid)
            .field("keys", &self.keys.len())
            .finish()
    }
}

/// Caller-supplied key lookup driven by the unverified token payload.
#[async_trait]
pub trait KeyResolver: Send + Sync {
    /// Resolve the candidate keys for a token whose payload decodes to
    /// `claims`.
    ///
    /// The claims have **not** been verified; treat them as attacker-supplied
    /// routing hints, never as identity.
    ///
    /// # Errors
    ///
    /// An `Err` is a resolver malfunction (e.g. a key store outage) and
    /// propagates to the host as
    /// [`AuthError::KeyResolution`](crate::AuthError::KeyResolution). To reject
    /// a token whose keys cannot be determined, return
    /// [`KeyResolution::invalid`] instead.
    async fn resolve(&self, claims: &Claims) -> Result<KeyResolution, BoxError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_constructors() {
        let valid = KeyResolution::single(DecodingKey::from_secret(b"k"));
        assert!(valid.is_valid);
        assert_eq!(valid.keys.len(), 1);

        let invalid = KeyResolution::invalid();
        assert!(!invalid.is_valid);
        assert!(invalid.keys.is_empty());
    }

    #[test]
    fn debug_does_not_expose_key_material() {
        let resolution = KeyResolution::single(DecodingKey::from_secret(b"super-secret"));
        let rendered = format!("{resolution:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("keys: 1"));
    }
}
