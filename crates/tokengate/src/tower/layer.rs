//! Tower Layer for the authentication gate.

use std::sync::Arc;

use tower::Layer;

use super::AuthService;
use crate::scheme::AuthScheme;

/// A Tower `Layer` wrapping services with an [`AuthScheme`].
///
/// The scheme is shared behind an `Arc`; cloning the layer or its services
/// never duplicates configuration or key material.
#[derive(Debug, Clone)]
pub struct AuthLayer {
    scheme: Arc<AuthScheme>,
}

impl AuthLayer {
    /// Create a layer from a shared scheme.
    pub fn new(scheme: Arc<AuthScheme>) -> Self {
        Self { scheme }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService::new(inner, Arc::clone(&self.scheme))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SchemeConfig, VerifyOptions};
    use jsonwebtoken::{Algorithm, DecodingKey};

    #[test]
    fn layer_wraps_service() {
        let config = SchemeConfig::builder()
            .key(DecodingKey::from_secret(b"layer-test"))
            .verify(VerifyOptions::new(vec![Algorithm::HS256]))
            .build()
            .unwrap();
        let layer = AuthLayer::new(Arc::new(AuthScheme::new(config)));

        let inner = tower::service_fn(|_req: http::Request<Vec<u8>>| async move {
            Ok::<_, std::convert::Infallible>(http::Response::new(Vec::<u8>::new()))
        });
        let _service = layer.layer(inner);
    }
}
