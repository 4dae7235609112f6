//! # Tower Middleware Integration
//!
//! Adapts an [`AuthScheme`](crate::AuthScheme) to the Tower ecosystem so the
//! gate can sit in an ordinary `Service` stack (Axum, Tower-HTTP, Hyper):
//!
//! - [`AuthLayer`] - a Tower `Layer` that wraps services with the gate
//! - [`AuthService`] - the `Service` that runs the authentication pass
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tower::ServiceBuilder;
//! use tokengate::tower::AuthLayer;
//!
//! let service = ServiceBuilder::new()
//!     .layer(AuthLayer::new(Arc::new(scheme)))
//!     .service(my_http_handler);
//! ```
//!
//! Verdicts map to HTTP as follows: an authenticated request is forwarded
//! with [`AuthExtension`] inserted into its extensions; a rejection becomes a
//! response built from [`Unauthorized::status`](crate::Unauthorized::status)
//! and a `WWW-Authenticate` challenge; a takeover response is returned
//! verbatim.

mod layer;
mod service;

pub use layer::AuthLayer;
pub use service::{AuthExtension, AuthService, AuthServiceFuture};
