// crates/promscope-proxy/src/routes/tests.rs
// ============================================================================
// Module: Route Orchestration Tests
// Description: Unit tests for per-request authorization and rewriting.
// Purpose: Validate the resolve/enforce/rewrite pipeline and its refusals.
// Dependencies: promscope-core, promscope-resolver
// ============================================================================

//! ## Overview
//! Exercises `authorize_and_rewrite` directly with in-memory resolvers so
//! the decision pipeline is tested without sockets.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderMap;
use promscope_config::UpstreamConfig;
use promscope_core::CallerCredential;
use promscope_core::NO_DATA_NAMESPACE;
use promscope_core::NamespaceScope;
use promscope_core::ResolveError;
use promscope_resolver::StaticResolver;

use super::*;
use crate::query::extract_params;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Resolver that refuses every caller.
struct DenyingResolver;

#[async_trait]
impl NamespaceResolver for DenyingResolver {
    async fn resolve(&self, _credential: &CallerCredential) -> Result<NamespaceScope, ResolveError> {
        Err(ResolveError::AccessDenied)
    }
}

/// State over the given resolver, with an unreachable forwarder.
fn state_with(resolver: Arc<dyn NamespaceResolver>) -> AppState {
    let forwarder = Forwarder::new(&UpstreamConfig {
        url: "http://127.0.0.1:9".to_string(),
        token_file: None,
        danger_accept_invalid_certs: false,
        request_timeout_ms: 1_000,
    })
    .unwrap();
    AppState {
        tenant_label: "namespace".to_string(),
        cookie_name: "promscope-access-token".to_string(),
        resolver,
        forwarder: Arc::new(forwarder),
        telemetry: Arc::new(crate::telemetry::NoopTelemetry),
    }
}

/// State granting the fixed scope `[foo, bar]`.
fn scoped_state() -> AppState {
    let resolver =
        StaticResolver::new(&["foo".to_string(), "bar".to_string()]).unwrap();
    state_with(Arc::new(resolver))
}

/// State granting the unbounded scope.
fn unbounded_state() -> AppState {
    let resolver = StaticResolver::new(&["ALL".to_string()]).unwrap();
    state_with(Arc::new(resolver))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[tokio::test]
async fn unbounded_scope_passes_through() {
    let plan = authorize_and_rewrite(&unbounded_state(), &HeaderMap::new(), "query=up", QUERY_PARAM)
        .await
        .unwrap();
    assert_eq!(plan, RewritePlan::Passthrough);
}

#[tokio::test]
async fn named_scope_rewrites_the_query_parameter() {
    let plan = authorize_and_rewrite(&scoped_state(), &HeaderMap::new(), "query=up&time=5", QUERY_PARAM)
        .await
        .unwrap();
    let RewritePlan::Rewritten {
        raw_query,
        sentinel_injected,
    } = plan
    else {
        panic!("expected rewritten plan");
    };
    assert!(!sentinel_injected);
    let queries = extract_params(&raw_query, QUERY_PARAM);
    assert_eq!(queries, vec![r#"up{namespace=~"^foo$|^bar$"}"#.to_string()]);
    assert_eq!(extract_params(&raw_query, "time"), vec!["5".to_string()]);
}

#[tokio::test]
async fn out_of_scope_selector_injects_the_sentinel() {
    let raw = "query=up%7Bnamespace%3D%22qux%22%7D";
    let plan = authorize_and_rewrite(&scoped_state(), &HeaderMap::new(), raw, QUERY_PARAM)
        .await
        .unwrap();
    let RewritePlan::Rewritten {
        raw_query,
        sentinel_injected,
    } = plan
    else {
        panic!("expected rewritten plan");
    };
    assert!(sentinel_injected);
    assert!(extract_params(&raw_query, QUERY_PARAM)[0].contains(NO_DATA_NAMESPACE));
}

#[tokio::test]
async fn every_series_selector_is_rewritten() {
    let raw = "match%5B%5D=up&match%5B%5D=node_info";
    let plan = authorize_and_rewrite(&scoped_state(), &HeaderMap::new(), raw, MATCH_PARAM)
        .await
        .unwrap();
    let RewritePlan::Rewritten {
        raw_query, ..
    } = plan
    else {
        panic!("expected rewritten plan");
    };
    let selectors = extract_params(&raw_query, MATCH_PARAM);
    assert_eq!(selectors.len(), 2);
    assert!(selectors.iter().all(|selector| selector.contains("namespace=~")));
}

#[tokio::test]
async fn resolver_denial_is_forbidden() {
    let state = state_with(Arc::new(DenyingResolver));
    let outcome = authorize_and_rewrite(&state, &HeaderMap::new(), "query=up", QUERY_PARAM).await;
    assert_eq!(outcome, Err(QueryRejection::Forbidden));
}

#[tokio::test]
async fn missing_expression_is_malformed() {
    let outcome =
        authorize_and_rewrite(&scoped_state(), &HeaderMap::new(), "time=5", QUERY_PARAM).await;
    assert!(matches!(outcome, Err(QueryRejection::Malformed(_))));
}

#[tokio::test]
async fn unparseable_expression_is_malformed() {
    let raw = "query=up%7B";
    let outcome = authorize_and_rewrite(&scoped_state(), &HeaderMap::new(), raw, QUERY_PARAM).await;
    assert!(matches!(outcome, Err(QueryRejection::Malformed(_))));
}

#[tokio::test]
async fn unbounded_scope_skips_expression_validation() {
    // Unbounded callers get byte-for-byte passthrough, even of garbage.
    let plan = authorize_and_rewrite(&unbounded_state(), &HeaderMap::new(), "query=up%7B", QUERY_PARAM)
        .await
        .unwrap();
    assert_eq!(plan, RewritePlan::Passthrough);
}
