//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use http::{HeaderMap, HeaderValue};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use tokengate::{AuthRequest, Claims};

pub const K1: &[u8] = b"first_test_secret_at_least_32_bytes_long_1234";
pub const K2: &[u8] = b"second_test_secret_at_least_32_bytes_long_567";

pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_secs()
}

/// A claims payload that passes the default checks: subject plus a future
/// expiration.
pub fn claims_for(sub: &str) -> Claims {
    Claims {
        sub: Some(sub.to_string()),
        exp: Some(current_timestamp() + 3600),
        iat: Some(current_timestamp()),
        ..Claims::default()
    }
}

pub fn mint(secret: &[u8], alg: Algorithm, claims: &Claims) -> String {
    encode(&Header::new(alg), claims, &EncodingKey::from_secret(secret))
        .expect("failed to encode test token")
}

pub fn bearer_request(token: &str) -> AuthRequest {
    header_request("authorization", &format!("Bearer {token}"))
}

pub fn header_request(name: &'static str, value: &str) -> AuthRequest {
    let mut headers = HeaderMap::new();
    headers.insert(name, HeaderValue::from_str(value).expect("header value"));
    AuthRequest::new(headers, HashMap::new())
}

pub fn query_request(param: &str, token: &str) -> AuthRequest {
    AuthRequest::new(
        HeaderMap::new(),
        HashMap::from([(param.to_string(), token.to_string())]),
    )
}

pub fn empty_request() -> AuthRequest {
    AuthRequest::new(HeaderMap::new(), HashMap::new())
}
