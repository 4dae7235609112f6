//! Error taxonomy for the authentication gate.
//!
//! Failures fall into two groups:
//!
//! - Per-request rejections (missing, malformed, invalid, or expired tokens and
//!   rejected credentials) are **not** errors. They become an
//!   [`Unauthenticated`](crate::Verdict::Unauthenticated) verdict and the host
//!   pipeline turns them into a response.
//! - [`AuthError`] covers the cases that must surface to the host instead:
//!   unimplemented token sources, key-resolver failures, and fatal validator
//!   failures.
//!
//! [`ConfigError`] is only ever produced at setup time by
//! [`SchemeConfigBuilder::build`](crate::SchemeConfigBuilder::build); a
//! constructed scheme never reports configuration problems at request time.

use thiserror::Error;

/// Boxed error type used at the caller-supplied callback seams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Invalid scheme configuration, reported once when the config is built.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No token source was configured.
    #[error("at least one token source must be configured")]
    NoTokenSources,

    /// Two configured token type labels collide case-insensitively.
    #[error("token type labels must be unique (duplicate: {0})")]
    DuplicateTokenType(String),

    /// Neither a static key list nor a key resolver was supplied.
    #[error("a signing key or key resolver is required")]
    MissingKeys,

    /// A static key source was supplied with no keys in it.
    #[error("static key list must not be empty")]
    EmptyKeyList,

    /// Verification options did not allow any algorithm.
    #[error("at least one allowed algorithm is required")]
    NoAlgorithms,
}

/// Request-time failures that propagate to the host instead of becoming a
/// verdict.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A configured token source has no implementation (cookie extraction).
    /// Maps to a 501-class server error; never a silent pass-through.
    #[error("{0} token source is not implemented")]
    NotImplemented(&'static str),

    /// The caller-supplied key resolver returned an error.
    #[error("key resolution failed: {0}")]
    KeyResolution(BoxError),

    /// The credential validator reported a fatal (system-level) failure.
    #[error("credential validator failed: {0}")]
    Validator(BoxError),
}
