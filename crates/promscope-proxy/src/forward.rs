// crates/promscope-proxy/src/forward.rs
// ============================================================================
// Module: Upstream Forwarder
// Description: Forward authorized requests to the upstream query engine.
// Purpose: Relay requests with service credentials and clean headers.
// Dependencies: axum, promscope-config, reqwest, tokio, url
// ============================================================================

//! ## Overview
//! The forwarder relays a GET request to the upstream engine, joining the
//! request path onto the configured base URL and carrying the rewritten
//! query string. Caller credentials never travel upstream; a service token
//! read from disk per request replaces them. Hop-by-hop headers are
//! stripped in both directions.
//! Invariants:
//! - The inbound `Authorization` and `Cookie` headers are always dropped.
//! - The service token is re-read on every request so rotations apply
//!   without restart.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use axum::body::Body;
use axum::http::HeaderMap;
use axum::http::Response;
use axum::http::StatusCode;
use promscope_config::UpstreamConfig;
use reqwest::Client;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Hop-by-hop headers never relayed in either direction.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Inbound headers that must not leak upstream.
const CREDENTIAL_HEADERS: &[&str] = &["authorization", "cookie"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Forwarding errors.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The upstream base URL could not be parsed.
    #[error("invalid upstream url: {0}")]
    BaseUrl(String),
    /// The HTTP client could not be created.
    #[error("upstream client construction failed: {0}")]
    Client(String),
    /// The upstream request failed.
    #[error("upstream request failed: {0}")]
    Upstream(String),
}

// ============================================================================
// SECTION: Forwarder
// ============================================================================

/// Relays authorized requests to the upstream query engine.
pub struct Forwarder {
    /// HTTP client with the configured timeout applied.
    client: Client,
    /// Upstream base URL, possibly carrying a path prefix.
    base: Url,
    /// Optional service token file injected as a bearer credential.
    token_file: Option<PathBuf>,
}

impl Forwarder {
    /// Builds a forwarder from upstream configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ForwardError`] when the base URL is unparseable or the
    /// client cannot be created.
    pub fn new(config: &UpstreamConfig) -> Result<Self, ForwardError> {
        let base = Url::parse(&config.url).map_err(|err| ForwardError::BaseUrl(err.to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(config.danger_accept_invalid_certs)
            .build()
            .map_err(|err| ForwardError::Client(err.to_string()))?;
        Ok(Self {
            client,
            base,
            token_file: config.token_file.clone(),
        })
    }

    /// Forwards a GET request and returns the upstream response.
    ///
    /// # Errors
    ///
    /// Returns [`ForwardError`] when the upstream is unreachable or its
    /// response cannot be relayed.
    pub async fn forward(
        &self,
        path: &str,
        raw_query: Option<&str>,
        headers: &HeaderMap,
    ) -> Result<Response<Body>, ForwardError> {
        let target = self.target_url(path, raw_query);
        let mut request = self.client.get(target).headers(relay_request_headers(headers));
        if let Some(token) = self.read_token().await {
            request = request.bearer_auth(token);
        }
        let upstream = request
            .send()
            .await
            .map_err(|err| ForwardError::Upstream(err.to_string()))?;
        let status = StatusCode::from_u16(upstream.status().as_u16())
            .map_err(|err| ForwardError::Upstream(err.to_string()))?;
        let mut builder = Response::builder().status(status);
        for (name, value) in upstream.headers() {
            if is_hop_by_hop(name.as_str()) {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_bytes());
        }
        let body = upstream
            .bytes()
            .await
            .map_err(|err| ForwardError::Upstream(err.to_string()))?;
        builder
            .body(Body::from(body))
            .map_err(|err| ForwardError::Upstream(err.to_string()))
    }

    /// Joins the request path and query onto the base URL.
    fn target_url(&self, path: &str, raw_query: Option<&str>) -> Url {
        let mut target = self.base.clone();
        let prefix = self.base.path().trim_end_matches('/');
        target.set_path(&format!("{prefix}{path}"));
        target.set_query(raw_query.filter(|query| !query.is_empty()));
        target
    }

    /// Reads the service token. A missing or empty file forwards without a
    /// credential; the upstream refuses the request if one was required.
    async fn read_token(&self) -> Option<String> {
        let path = self.token_file.as_ref()?;
        let text = tokio::fs::read_to_string(path).await.ok()?;
        let token = text.trim();
        if token.is_empty() {
            return None;
        }
        Some(token.to_string())
    }
}

// ============================================================================
// SECTION: Header Relay
// ============================================================================

/// Returns true when a header must not cross the proxy.
fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS.iter().any(|header| name.eq_ignore_ascii_case(header))
}

/// Copies relayable request headers, dropping hop-by-hop, credential, and
/// host headers.
fn relay_request_headers(headers: &HeaderMap) -> reqwest::header::HeaderMap {
    let mut relayed = reqwest::header::HeaderMap::new();
    for (name, value) in headers {
        let name_str = name.as_str();
        if is_hop_by_hop(name_str)
            || name_str.eq_ignore_ascii_case("host")
            || CREDENTIAL_HEADERS.iter().any(|header| name_str.eq_ignore_ascii_case(header))
        {
            continue;
        }
        let Ok(relayed_name) = reqwest::header::HeaderName::from_bytes(name_str.as_bytes()) else {
            continue;
        };
        let Ok(relayed_value) = reqwest::header::HeaderValue::from_bytes(value.as_bytes()) else {
            continue;
        };
        relayed.append(relayed_name, relayed_value);
    }
    relayed
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

    /// Forwarder over a base URL, no token file.
    fn forwarder(base: &str) -> Forwarder {
        Forwarder::new(&UpstreamConfig {
            url: base.to_string(),
            token_file: None,
            danger_accept_invalid_certs: false,
            request_timeout_ms: 1_000,
        })
        .unwrap()
    }

    #[test]
    fn target_joins_path_onto_bare_base() {
        let target = forwarder("https://upstream:9091").target_url("/api/v1/query", Some("query=up"));
        assert_eq!(target.as_str(), "https://upstream:9091/api/v1/query?query=up");
    }

    #[test]
    fn target_preserves_base_path_prefix() {
        let target = forwarder("https://upstream:9091/thanos/").target_url("/api/v1/labels", None);
        assert_eq!(target.as_str(), "https://upstream:9091/thanos/api/v1/labels");
    }

    #[test]
    fn credential_and_hop_headers_are_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer caller"));
        headers.insert("cookie", HeaderValue::from_static("a=1"));
        headers.insert("connection", HeaderValue::from_static("close"));
        headers.insert("accept", HeaderValue::from_static("application/json"));
        let relayed = relay_request_headers(&headers);
        assert_eq!(relayed.len(), 1);
        assert!(relayed.contains_key("accept"));
    }
}
