// crates/promscope-proxy/src/credentials.rs
// ============================================================================
// Module: Caller Credentials
// Description: Extract the caller's access token from request headers.
// Purpose: Produce a credential for resolver lookup, cookie before header.
// Dependencies: axum, promscope-core
// ============================================================================

//! ## Overview
//! The access token arrives either in a named cookie or in a bearer
//! `Authorization` header; the cookie wins when both are present. Anything
//! missing, empty, or non-UTF-8 yields an anonymous credential, which the
//! resolvers refuse.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::header::COOKIE;
use promscope_core::CallerCredential;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Bearer scheme prefix on the `Authorization` header.
const BEARER_PREFIX: &str = "Bearer ";

// ============================================================================
// SECTION: Extraction
// ============================================================================

/// Extracts the caller credential from request headers.
#[must_use]
pub fn extract_credential(headers: &HeaderMap, cookie_name: &str) -> CallerCredential {
    if let Some(token) = cookie_token(headers, cookie_name) {
        return CallerCredential::Token(token);
    }
    if let Some(token) = bearer_token(headers) {
        return CallerCredential::Token(token);
    }
    CallerCredential::Anonymous
}

/// Reads the named cookie from every `Cookie` header.
fn cookie_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    for value in headers.get_all(COOKIE) {
        let Ok(text) = value.to_str() else {
            continue;
        };
        for pair in text.split(';') {
            let pair = pair.trim();
            if let Some((name, token)) = pair.split_once('=') {
                if name == cookie_name && !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }
    None
}

/// Reads a bearer token from the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?;
    let text = value.to_str().ok()?;
    let token = text.strip_prefix(BEARER_PREFIX)?;
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions."
    )]

    use axum::http::HeaderValue;

    use super::*;

    /// Cookie name used across tests.
    const COOKIE_NAME: &str = "promscope-access-token";

    #[test]
    fn cookie_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("other=1; promscope-access-token=abc; more=2"),
        );
        assert_eq!(
            extract_credential(&headers, COOKIE_NAME),
            CallerCredential::Token("abc".to_string())
        );
    }

    #[test]
    fn cookie_wins_over_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("promscope-access-token=cookie"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer header"));
        assert_eq!(
            extract_credential(&headers, COOKIE_NAME),
            CallerCredential::Token("cookie".to_string())
        );
    }

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(
            extract_credential(&headers, COOKIE_NAME),
            CallerCredential::Token("abc".to_string())
        );
    }

    #[test]
    fn non_bearer_scheme_is_anonymous() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert_eq!(extract_credential(&headers, COOKIE_NAME), CallerCredential::Anonymous);
    }

    #[test]
    fn empty_values_are_anonymous() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("promscope-access-token="));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_credential(&headers, COOKIE_NAME), CallerCredential::Anonymous);
    }

    #[test]
    fn missing_headers_are_anonymous() {
        assert_eq!(
            extract_credential(&HeaderMap::new(), COOKIE_NAME),
            CallerCredential::Anonymous
        );
    }
}
