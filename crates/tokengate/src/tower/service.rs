//! Tower Service implementation for the authentication gate.

use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use http::header::WWW_AUTHENTICATE;
use http::{HeaderValue, Request, Response};
use tower_service::Service;

use crate::error::BoxError;
use crate::extract::AuthRequest;
use crate::scheme::{Artifacts, AuthScheme, Unauthorized, Verdict};

/// Request extension inserted on successful authentication.
///
/// Inner services read it back with
/// `req.extensions().get::<AuthExtension>()`.
#[derive(Debug, Clone)]
pub struct AuthExtension {
    /// The credentials produced by the authentication pass.
    pub credentials: serde_json::Value,
    /// The raw token plus validator-supplied artifacts.
    pub artifacts: Artifacts,
}

/// Future type returned by [`AuthService`].
pub type AuthServiceFuture<T> = BoxFuture<'static, Result<T, BoxError>>;

/// A Tower `Service` that gates requests behind an [`AuthScheme`].
#[derive(Debug, Clone)]
pub struct AuthService<S> {
    inner: S,
    scheme: Arc<AuthScheme>,
}

impl<S> AuthService<S> {
    /// Create a new auth service around `inner`.
    pub fn new(inner: S, scheme: Arc<AuthScheme>) -> Self {
        Self { inner, scheme }
    }

    /// Get a reference to the inner service.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

fn rejection_response<ResBody>(rejection: &Unauthorized) -> Response<ResBody>
where
    ResBody: From<Vec<u8>>,
{
    let mut response = Response::new(ResBody::from(Vec::new()));
    *response.status_mut() = rejection.status();
    if let Ok(value) = HeaderValue::from_str(&rejection.challenge()) {
        response.headers_mut().insert(WWW_AUTHENTICATE, value);
    }
    response
}

impl<S, B, ResBody> Service<Request<B>> for AuthService<S>
where
    S: Service<Request<B>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Into<BoxError>,
    B: Send + 'static,
    ResBody: From<Vec<u8>> + 'static,
{
    type Response = Response<ResBody>;
    type Error = BoxError;
    type Future = AuthServiceFuture<Self::Response>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let scheme = Arc::clone(&self.scheme);
        let inner = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, inner);

        Box::pin(async move {
            let auth_request = AuthRequest::from_http(&req);
            match scheme.authenticate(&auth_request).await {
                Ok(Verdict::Authenticated {
                    credentials,
                    artifacts,
                }) => {
                    let mut req = req;
                    req.extensions_mut().insert(AuthExtension {
                        credentials,
                        artifacts,
                    });
                    inner.call(req).await.map_err(Into::into)
                }
                Ok(Verdict::Unauthenticated(rejection)) => Ok(rejection_response(&rejection)),
                Ok(Verdict::Takeover(response)) => Ok(response.map(ResBody::from)),
                Err(err) => Err(err.into()),
            }
        })
    }
}
