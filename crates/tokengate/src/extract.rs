//! Token location and extraction.
//!
//! [`locate_token`] walks the configured token sources in priority order and
//! produces the raw token string plus its declared type label. Extraction
//! never touches cryptography; it only decides *where* the token is and
//! whether its transport shape is acceptable.

use std::collections::HashMap;

use http::HeaderMap;
use tracing::debug;

use crate::config::{DEFAULT_TOKEN_TYPE, SchemeConfig, TokenSource};
use crate::scheme::Unauthorized;

/// The authentication-relevant view of a host request: its header map and
/// query-parameter map.
///
/// The host pipeline constructs one per request, either directly from the two
/// maps or from an `http::Request` via [`AuthRequest::from_http`]. A cookie
/// map is deliberately absent; the cookie source is declared in configuration
/// but has no extraction behavior.
#[derive(Debug, Clone)]
pub struct AuthRequest {
    headers: HeaderMap,
    query: HashMap<String, String>,
}

impl AuthRequest {
    /// Build a request view from its header and query maps.
    pub fn new(headers: HeaderMap, query: HashMap<String, String>) -> Self {
        Self { headers, query }
    }

    /// Build a request view from an `http::Request`, parsing the URI query
    /// string. Repeated query parameters keep the last value.
    pub fn from_http<B>(request: &http::Request<B>) -> Self {
        let query = request
            .uri()
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self {
            headers: request.headers().clone(),
            query,
        }
    }

    /// The request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The request query parameters.
    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }
}

/// A raw token pulled out of a request, with its declared type label.
///
/// Transient: produced per request, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedToken {
    /// The raw token string as presented by the client.
    pub raw: String,
    /// The declared type label (`Bearer`, `JWT`, ... or `Token` for tokens
    /// presented without a scheme label).
    pub token_type: String,
}

/// Why extraction stopped.
#[derive(Debug)]
pub(crate) enum ExtractFailure {
    /// The request is rejected with an unauthenticated verdict.
    Rejected(Unauthorized),
    /// The selected source has no implementation (cookie).
    NotImplemented(&'static str),
}

/// Extract a token from `request` following the configured source priority.
pub(crate) fn locate_token(
    request: &AuthRequest,
    config: &SchemeConfig,
) -> Result<ExtractedToken, ExtractFailure> {
    let mut located = None;

    for source in &config.token_sources {
        match source {
            TokenSource::Header => {
                if let Some(token) = from_header(request, config)? {
                    located = Some(token);
                }
            }
            TokenSource::Cookie => return Err(ExtractFailure::NotImplemented("cookie")),
            TokenSource::Query => {
                if let Some(value) = request.query.get(&config.query_field) {
                    located = Some(ExtractedToken {
                        raw: value.clone(),
                        token_type: DEFAULT_TOKEN_TYPE.to_string(),
                    });
                }
            }
        }
        if located.is_some() {
            break;
        }
    }

    let Some(token) = located else {
        debug!("no token found in any configured source");
        return Err(ExtractFailure::Rejected(Unauthorized::missing_token()));
    };

    // Structural gate: header.payload.signature, nothing else reaches the
    // verifier.
    if token.raw.split('.').count() != 3 {
        debug!(token_type = %token.token_type, "token is not three dot-separated segments");
        return Err(ExtractFailure::Rejected(Unauthorized::bad_format(
            token.raw,
        )));
    }

    Ok(token)
}

/// Extract from the configured header field.
///
/// Returns `Ok(None)` when the header is absent so extraction can fall through
/// to the next source. A header that is present but unusable is a hard
/// failure, never a fall-through.
fn from_header(
    request: &AuthRequest,
    config: &SchemeConfig,
) -> Result<Option<ExtractedToken>, ExtractFailure> {
    let Some(value) = request.headers.get(config.header_field.as_str()) else {
        return Ok(None);
    };
    let Ok(value) = value.to_str() else {
        return Err(ExtractFailure::Rejected(Unauthorized::malformed_header()));
    };

    // A custom header field carries the bare token; only the standard
    // authorization field gets scheme-label parsing.
    if !config.header_field.eq_ignore_ascii_case("authorization") {
        return Ok(Some(ExtractedToken {
            raw: value.trim().to_string(),
            token_type: DEFAULT_TOKEN_TYPE.to_string(),
        }));
    }

    let parts: Vec<&str> = value.split_whitespace().collect();
    match parts.as_slice() {
        [label, token] => {
            if config.matches_token_type(label) {
                Ok(Some(ExtractedToken {
                    raw: (*token).to_string(),
                    token_type: (*label).to_string(),
                }))
            } else {
                debug!(scheme = %label, "authorization scheme not in configured token types");
                Err(ExtractFailure::Rejected(Unauthorized::unknown_scheme(
                    label,
                )))
            }
        }
        [token] if config.allows_inline() => Ok(Some(ExtractedToken {
            raw: (*token).to_string(),
            token_type: DEFAULT_TOKEN_TYPE.to_string(),
        })),
        _ => Err(ExtractFailure::Rejected(Unauthorized::malformed_header())),
    }
}
