//! # tokengate - Bearer-Token Authentication Gate
//!
//! A request-authentication decision engine: extract a bearer-style JWT from a
//! request, verify it against one or more keys with ordered fallback, hand the
//! verified claims to caller-supplied validation logic, and produce exactly
//! one verdict per request.
//!
//! This is middleware, not a framework. The host pipeline supplies request
//! data ([`AuthRequest`]) and acts on the [`Verdict`]; `tokengate` never opens
//! sockets, issues tokens, or defines application-level authorization.
//!
//! ## Design Principles
//!
//! - **One verdict per request**: [`Verdict`] is a three-case tagged result
//!   (authenticated / unauthenticated / takeover); every call site handles all
//!   three explicitly.
//! - **Typed configuration**: key material is a sum type chosen at setup
//!   ([`KeySource::Static`] or [`KeySource::Resolver`]); no runtime capability
//!   sniffing.
//! - **Timing-safe fallback**: the key list is walked sequentially with a
//!   first-success short-circuit, and rejections never reveal which key
//!   failed.
//! - **Algorithm allowlist**: tokens signed with anything outside
//!   [`VerifyOptions::algorithms`] are rejected before signature work.
//!
//! ## Architecture
//!
//! - [`config`] - immutable scheme configuration, validated once at setup
//! - [`extract`] - token location: header / query (cookie is declared but
//!   deliberately unimplemented)
//! - [`keys`] - caller-supplied per-request key resolution
//! - [`verify`] - cryptographic verification with typed failures
//! - [`validate`] - caller-supplied credential validation
//! - [`scheme`] - the decision orchestrator producing the verdict
//! - `tower` - optional Tower middleware adapter (feature `middleware`)
//!
//! ## Quick Start
//!
//! ```rust
//! use tokengate::{
//!     Algorithm, AuthRequest, AuthScheme, DecodingKey, SchemeConfig, Verdict, VerifyOptions,
//! };
//!
//! # tokio_test::block_on(async {
//! let config = SchemeConfig::builder()
//!     .key(DecodingKey::from_secret(b"your-256-bit-secret"))
//!     .verify(VerifyOptions::new(vec![Algorithm::HS256]))
//!     .build()?;
//! let scheme = AuthScheme::new(config);
//!
//! let request = AuthRequest::new(Default::default(), Default::default());
//! match scheme.authenticate(&request).await? {
//!     Verdict::Authenticated { credentials, artifacts } => {
//!         println!("subject: {:?}, token: {}", credentials["sub"], artifacts.token);
//!     }
//!     Verdict::Unauthenticated(rejection) => {
//!         println!("{} {}", rejection.status(), rejection.challenge());
//!     }
//!     Verdict::Takeover(_response) => { /* return verbatim */ }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```

// Submodules
pub mod claims;
pub mod config;
pub mod error;
pub mod extract;
pub mod keys;
pub mod scheme;
#[cfg(feature = "middleware")]
pub mod tower;
pub mod validate;
pub mod verify;

// Re-export the crate surface
#[doc(inline)]
pub use claims::{Claims, PayloadDecodeError};
#[doc(inline)]
pub use config::{
    INLINE_TOKEN_TYPE, KeySource, SchemeConfig, SchemeConfigBuilder, TokenSource, VerifyOptions,
};
#[doc(inline)]
pub use error::{AuthError, BoxError, ConfigError};
#[doc(inline)]
pub use extract::{AuthRequest, ExtractedToken};
#[doc(inline)]
pub use keys::{KeyResolution, KeyResolver};
#[doc(inline)]
pub use scheme::{
    Artifacts, AuthScheme, ChallengeAttributes, RejectionKind, TakeoverResponse, Unauthorized,
    Verdict,
};
#[doc(inline)]
pub use validate::{
    CredentialValidator, SubjectValidator, ValidationDecision, ValidationOutcome, ValidatorError,
};
#[doc(inline)]
pub use verify::{VerifyError, verify_token};

// Re-export the jsonwebtoken types that appear in the configuration surface
pub use jsonwebtoken::{Algorithm, DecodingKey};
