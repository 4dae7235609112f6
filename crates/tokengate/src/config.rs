//! Authentication scheme configuration.
//!
//! A [`SchemeConfig`] is built once at setup through [`SchemeConfig::builder`],
//! validated by [`SchemeConfigBuilder::build`], and is immutable afterwards.
//! Every per-request decision reads from it; no request-time code path can
//! observe an invalid configuration.
//!
//! The key material is a typed alternative chosen at configuration time:
//! [`KeySource::Static`] for a fixed key list, [`KeySource::Resolver`] for a
//! caller-supplied lookup that inspects the unverified token payload (per-issuer
//! key selection, JWKS caches, and similar schemes live behind that trait).

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::error::ConfigError;
use crate::keys::KeyResolver;
use crate::validate::{CredentialValidator, SubjectValidator};

/// Pseudo token type allowing an un-prefixed token in the authorization header.
///
/// When present in the configured token types, a header value with no scheme
/// label (e.g. `authorization: eyJ...`) is accepted and classified as `Token`.
pub const INLINE_TOKEN_TYPE: &str = "Inline";

/// Declared type assigned to tokens that arrive without a scheme label
/// (inline header tokens, custom header fields, query parameters).
pub(crate) const DEFAULT_TOKEN_TYPE: &str = "Token";

/// Where to look for the token in the incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// A request header (the standard `authorization` field gets scheme-label
    /// parsing; any other field name is taken verbatim).
    Header,
    /// A cookie. Declared for configuration compatibility but deliberately
    /// unimplemented: selecting it fails with
    /// [`AuthError::NotImplemented`](crate::AuthError::NotImplemented).
    Cookie,
    /// A query-string parameter.
    Query,
}

/// Key material for signature verification.
pub enum KeySource {
    /// A fixed, ordered key list. Verification walks it in order and stops at
    /// the first key that validates the token.
    Static(Vec<DecodingKey>),
    /// A caller-supplied resolver invoked with the unverified token payload.
    Resolver(Arc<dyn KeyResolver>),
}

// DecodingKey carries secret material and implements neither Debug nor Display.
impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(keys) => f.debug_tuple("Static").field(&keys.len()).finish(),
            Self::Resolver(_) => f.debug_tuple("Resolver").finish(),
        }
    }
}

/// Standard-claim verification options.
///
/// At least one allowed algorithm is required; everything else is optional.
#[derive(Debug, Clone)]
pub struct VerifyOptions {
    /// Allowed signing algorithms. Tokens signed with any other algorithm are
    /// rejected before signature verification (algorithm-substitution defense).
    pub algorithms: Vec<Algorithm>,
    /// Accepted audiences. Empty means the `aud` claim is not checked.
    pub audience: Vec<String>,
    /// Accepted issuers. Empty means the `iss` claim is not checked.
    pub issuer: Vec<String>,
    /// Required subject. `None` means the `sub` claim is not checked.
    pub subject: Option<String>,
    /// Skip the expiration check entirely.
    pub ignore_expiration: bool,
    /// Skip the not-before check entirely.
    pub ignore_not_before: bool,
    /// Clock tolerance in seconds applied to time-based claims.
    pub leeway_secs: u64,
    /// Maximum accepted token age in seconds, measured from `iat`.
    pub max_age_secs: Option<u64>,
}

impl VerifyOptions {
    /// Create verification options for the given algorithm allowlist.
    pub fn new(algorithms: Vec<Algorithm>) -> Self {
        Self {
            algorithms,
            audience: Vec::new(),
            issuer: Vec::new(),
            subject: None,
            ignore_expiration: false,
            ignore_not_before: false,
            leeway_secs: 0,
            max_age_secs: None,
        }
    }

    /// Require the `aud` claim to match one of `audience`.
    #[must_use]
    pub fn with_audience<I, S>(mut self, audience: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audience = audience.into_iter().map(Into::into).collect();
        self
    }

    /// Require the `iss` claim to match one of `issuer`.
    #[must_use]
    pub fn with_issuer<I, S>(mut self, issuer: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.issuer = issuer.into_iter().map(Into::into).collect();
        self
    }

    /// Require the `sub` claim to equal `subject`.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Skip the expiration check.
    #[must_use]
    pub fn ignore_expiration(mut self) -> Self {
        self.ignore_expiration = true;
        self
    }

    /// Skip the not-before check.
    #[must_use]
    pub fn ignore_not_before(mut self) -> Self {
        self.ignore_not_before = true;
        self
    }

    /// Set the clock tolerance for time-based claims.
    #[must_use]
    pub fn with_leeway(mut self, secs: u64) -> Self {
        self.leeway_secs = secs;
        self
    }

    /// Reject tokens older than `secs`, measured from their `iat` claim.
    #[must_use]
    pub fn with_max_age(mut self, secs: u64) -> Self {
        self.max_age_secs = Some(secs);
        self
    }

    /// Assemble the `jsonwebtoken` validation rules for these options.
    pub(crate) fn to_validation(&self) -> Validation {
        let seed = self.algorithms.first().copied().unwrap_or(Algorithm::HS256);
        let mut validation = Validation::new(seed);
        validation.algorithms = self.algorithms.clone();
        validation.leeway = self.leeway_secs;
        validation.validate_exp = !self.ignore_expiration;
        validation.validate_nbf = !self.ignore_not_before;
        // Optional claims that are absent must not fail verification; each
        // check applies only when the claim is present.
        validation.required_spec_claims = HashSet::new();
        if self.audience.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(&self.audience);
        }
        if !self.issuer.is_empty() {
            validation.set_issuer(&self.issuer);
        }
        validation.sub = self.subject.clone();
        validation
    }
}

/// Immutable configuration for an [`AuthScheme`](crate::AuthScheme).
pub struct SchemeConfig {
    pub(crate) token_sources: Vec<TokenSource>,
    pub(crate) token_types: Vec<String>,
    pub(crate) header_field: String,
    pub(crate) query_field: String,
    pub(crate) cookie_field: String,
    pub(crate) keys: KeySource,
    pub(crate) verify: VerifyOptions,
    pub(crate) validator: Arc<dyn CredentialValidator>,
}

// CredentialValidator is a caller-supplied trait object with no Debug bound.
impl fmt::Debug for SchemeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemeConfig")
            .field("token_sources", &self.token_sources)
            .field("token_types", &self.token_types)
            .field("header_field", &self.header_field)
            .field("query_field", &self.query_field)
            .field("cookie_field", &self.cookie_field)
            .field("keys", &self.keys)
            .field("verify", &self.verify)
            .finish_non_exhaustive()
    }
}

impl SchemeConfig {
    /// Start building a configuration.
    pub fn builder() -> SchemeConfigBuilder {
        SchemeConfigBuilder::new()
    }

    /// The configured token sources, in extraction priority order.
    pub fn token_sources(&self) -> &[TokenSource] {
        &self.token_sources
    }

    /// The accepted token type labels, in order.
    pub fn token_types(&self) -> &[String] {
        &self.token_types
    }

    /// The verification options.
    pub fn verify_options(&self) -> &VerifyOptions {
        &self.verify
    }

    /// Whether un-prefixed inline header tokens are accepted.
    pub(crate) fn allows_inline(&self) -> bool {
        self.token_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(INLINE_TOKEN_TYPE))
    }

    /// Case-insensitive match of a presented scheme label against the
    /// configured token types, excluding the inline pseudo-type.
    pub(crate) fn matches_token_type(&self, label: &str) -> bool {
        self.token_types.iter().any(|t| {
            !t.eq_ignore_ascii_case(INLINE_TOKEN_TYPE) && t.eq_ignore_ascii_case(label)
        })
    }
}

/// Builder for [`SchemeConfig`].
pub struct SchemeConfigBuilder {
    token_sources: Vec<TokenSource>,
    token_types: Vec<String>,
    header_field: String,
    query_field: String,
    cookie_field: String,
    keys: Option<KeySource>,
    verify: Option<VerifyOptions>,
    validator: Arc<dyn CredentialValidator>,
}

impl SchemeConfigBuilder {
    fn new() -> Self {
        Self {
            token_sources: vec![TokenSource::Header],
            token_types: vec![
                DEFAULT_TOKEN_TYPE.to_string(),
                "JWT".to_string(),
                "Bearer".to_string(),
                INLINE_TOKEN_TYPE.to_string(),
            ],
            header_field: "authorization".to_string(),
            query_field: "token".to_string(),
            cookie_field: "token".to_string(),
            keys: None,
            verify: None,
            validator: Arc::new(SubjectValidator),
        }
    }

    /// Replace the token source priority order (default: header only).
    #[must_use]
    pub fn token_sources(mut self, sources: Vec<TokenSource>) -> Self {
        self.token_sources = sources;
        self
    }

    /// Replace the accepted token type labels
    /// (default: `Token`, `JWT`, `Bearer`, `Inline`).
    #[must_use]
    pub fn token_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.token_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Set the header field to read the token from (default: `authorization`).
    #[must_use]
    pub fn header_field(mut self, name: impl Into<String>) -> Self {
        self.header_field = name.into();
        self
    }

    /// Set the query parameter to read the token from (default: `token`).
    #[must_use]
    pub fn query_field(mut self, name: impl Into<String>) -> Self {
        self.query_field = name.into();
        self
    }

    /// Set the cookie name declared for the (unimplemented) cookie source.
    #[must_use]
    pub fn cookie_field(mut self, name: impl Into<String>) -> Self {
        self.cookie_field = name.into();
        self
    }

    /// Verify signatures against a single static key.
    #[must_use]
    pub fn key(self, key: DecodingKey) -> Self {
        self.keys(vec![key])
    }

    /// Verify signatures against an ordered static key list, attempted in
    /// order with first-success short-circuit.
    #[must_use]
    pub fn keys(mut self, keys: Vec<DecodingKey>) -> Self {
        self.keys = Some(KeySource::Static(keys));
        self
    }

    /// Resolve keys per request from the unverified token payload.
    #[must_use]
    pub fn key_resolver(mut self, resolver: Arc<dyn KeyResolver>) -> Self {
        self.keys = Some(KeySource::Resolver(resolver));
        self
    }

    /// Set the standard-claim verification options (required).
    #[must_use]
    pub fn verify(mut self, options: VerifyOptions) -> Self {
        self.verify = Some(options);
        self
    }

    /// Set the credential validator invoked after cryptographic verification.
    ///
    /// Defaults to [`SubjectValidator`], which accepts any token carrying a
    /// non-empty `sub` claim.
    #[must_use]
    pub fn validator(mut self, validator: Arc<dyn CredentialValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Validate and freeze the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when no token source is configured, token type
    /// labels collide, key material is missing or empty, or the verification
    /// options allow no algorithm.
    pub fn build(self) -> Result<SchemeConfig, ConfigError> {
        if self.token_sources.is_empty() {
            return Err(ConfigError::NoTokenSources);
        }

        let mut seen = HashSet::new();
        for label in &self.token_types {
            if !seen.insert(label.to_ascii_lowercase()) {
                return Err(ConfigError::DuplicateTokenType(label.clone()));
            }
        }

        let keys = self.keys.ok_or(ConfigError::MissingKeys)?;
        if let KeySource::Static(list) = &keys
            && list.is_empty()
        {
            return Err(ConfigError::EmptyKeyList);
        }

        let verify = self.verify.ok_or(ConfigError::NoAlgorithms)?;
        if verify.algorithms.is_empty() {
            return Err(ConfigError::NoAlgorithms);
        }

        Ok(SchemeConfig {
            token_sources: self.token_sources,
            token_types: self.token_types,
            header_field: self.header_field,
            query_field: self.query_field,
            cookie_field: self.cookie_field,
            keys,
            verify,
            validator: self.validator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> DecodingKey {
        DecodingKey::from_secret(b"configuration-test-secret")
    }

    #[test]
    fn build_with_defaults() {
        let config = SchemeConfig::builder()
            .key(secret())
            .verify(VerifyOptions::new(vec![Algorithm::HS256]))
            .build()
            .unwrap();

        assert_eq!(config.token_sources(), &[TokenSource::Header]);
        assert_eq!(config.token_types().len(), 4);
        assert!(config.allows_inline());
        assert!(config.matches_token_type("bearer"));
        assert!(config.matches_token_type("JWT"));
        // The inline pseudo-type never matches a presented scheme label.
        assert!(!config.matches_token_type("inline"));
        assert!(!config.matches_token_type("Basic"));
    }

    #[test]
    fn rejects_missing_keys() {
        let err = SchemeConfig::builder()
            .verify(VerifyOptions::new(vec![Algorithm::HS256]))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingKeys));
    }

    #[test]
    fn rejects_empty_key_list() {
        let err = SchemeConfig::builder()
            .keys(Vec::new())
            .verify(VerifyOptions::new(vec![Algorithm::HS256]))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyKeyList));
    }

    #[test]
    fn rejects_empty_algorithm_list() {
        let err = SchemeConfig::builder()
            .key(secret())
            .verify(VerifyOptions::new(Vec::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::NoAlgorithms));

        let err = SchemeConfig::builder().key(secret()).build().unwrap_err();
        assert!(matches!(err, ConfigError::NoAlgorithms));
    }

    #[test]
    fn rejects_empty_source_list() {
        let err = SchemeConfig::builder()
            .token_sources(Vec::new())
            .key(secret())
            .verify(VerifyOptions::new(vec![Algorithm::HS256]))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::NoTokenSources));
    }

    #[test]
    fn rejects_duplicate_token_types() {
        let err = SchemeConfig::builder()
            .token_types(["Bearer", "bearer"])
            .key(secret())
            .verify(VerifyOptions::new(vec![Algorithm::HS256]))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateTokenType(_)));
    }

    #[test]
    fn validation_rules_follow_options() {
        let options = VerifyOptions::new(vec![Algorithm::HS256, Algorithm::HS384])
            .with_audience(["https://api.example.com"])
            .with_issuer(["https://issuer.example"])
            .with_leeway(30);
        let validation = options.to_validation();

        assert_eq!(
            validation.algorithms,
            vec![Algorithm::HS256, Algorithm::HS384]
        );
        assert_eq!(validation.leeway, 30);
        assert!(validation.validate_exp);
        assert!(validation.validate_nbf);
        assert!(validation.validate_aud);
        assert!(validation.required_spec_claims.is_empty());
    }

    #[test]
    fn validation_rules_skip_unconfigured_claims() {
        let options = VerifyOptions::new(vec![Algorithm::HS256]).ignore_expiration();
        let validation = options.to_validation();

        assert!(!validation.validate_exp);
        assert!(!validation.validate_aud);
        assert!(validation.iss.is_none());
        assert!(validation.sub.is_none());
    }
}
