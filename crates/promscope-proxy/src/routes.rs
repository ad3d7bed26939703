// crates/promscope-proxy/src/routes.rs
// ============================================================================
// Module: Query API Routes
// Description: Route table and per-request authorization orchestration.
// Purpose: Resolve scope, rewrite expressions, and relay upstream.
// Dependencies: axum, promscope-core, promscope-resolver
// ============================================================================

//! ## Overview
//! Every expression-bearing endpoint follows the same pipeline: extract the
//! caller credential, resolve its namespace scope, rewrite each expression
//! parameter, and forward the request. Unbounded scopes skip rewriting and
//! forward the original query string byte for byte. Label metadata
//! endpoints pass through unrewritten. Only GET is routed; axum answers
//! anything else with 405.
//! Invariants:
//! - A rejected request never reaches the upstream.
//! - Authorization failures share one status and body, regardless of cause.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::RawQuery;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::Uri;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use promscope_core::MatcherEnforcer;
use promscope_core::NO_DATA_NAMESPACE;
use promscope_core::NamespaceResolver;
use promscope_core::RewriteError;
use promscope_core::rewrite_query;

use crate::credentials::extract_credential;
use crate::forward::Forwarder;
use crate::query::MATCH_PARAM;
use crate::query::QUERY_PARAM;
use crate::query::extract_params;
use crate::query::replace_params;
use crate::telemetry::Endpoint;
use crate::telemetry::ProxyTelemetry;
use crate::telemetry::QueryDecision;
use crate::telemetry::QueryEvent;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Body returned for every authorization failure.
const FORBIDDEN_BODY: &str = "access denied";
/// Body returned when the upstream cannot be reached.
const UPSTREAM_UNAVAILABLE_BODY: &str = "upstream unavailable";

// ============================================================================
// SECTION: Application State
// ============================================================================

/// Shared per-request state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Metrics label that denotes the owning namespace.
    pub tenant_label: String,
    /// Cookie carrying the caller's access token.
    pub cookie_name: String,
    /// Resolver mapping credentials to namespace scopes.
    pub resolver: Arc<dyn NamespaceResolver>,
    /// Upstream request relay.
    pub forwarder: Arc<Forwarder>,
    /// Decision metrics sink.
    pub telemetry: Arc<dyn ProxyTelemetry>,
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the read-only query API route table.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/query", get(handle_query))
        .route("/api/v1/query_range", get(handle_query_range))
        .route("/api/v1/series", get(handle_series))
        .route("/api/v1/labels", get(handle_labels))
        .route("/api/v1/label/{name}/values", get(handle_label_values))
        .with_state(state)
}

// ============================================================================
// SECTION: Authorization Outcome
// ============================================================================

/// Outcome of authorizing one expression-bearing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RewritePlan {
    /// Unbounded scope; forward the original query string untouched.
    Passthrough,
    /// Forward the rewritten query string.
    Rewritten {
        /// Re-encoded query string carrying enforced expressions.
        raw_query: String,
        /// True when enforcement injected the no-data sentinel.
        sentinel_injected: bool,
    },
}

/// Request refusal, mapped to a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum QueryRejection {
    /// Caller is not allowed to query. Cause is deliberately withheld.
    Forbidden,
    /// The expression could not be parsed or rewritten.
    Malformed(String),
}

impl IntoResponse for QueryRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Forbidden => {
                (StatusCode::FORBIDDEN, FORBIDDEN_BODY.to_string()).into_response()
            }
            Self::Malformed(diagnostic) => {
                (StatusCode::BAD_REQUEST, format!("invalid query expression: {diagnostic}"))
                    .into_response()
            }
        }
    }
}

// ============================================================================
// SECTION: Orchestration
// ============================================================================

/// Resolves the caller's scope and rewrites every value of `param` in the
/// raw query string.
///
/// # Errors
///
/// Returns [`QueryRejection::Forbidden`] for any resolution or enforcement
/// setup failure and [`QueryRejection::Malformed`] for unparseable
/// expressions.
pub(crate) async fn authorize_and_rewrite(
    state: &AppState,
    headers: &HeaderMap,
    raw_query: &str,
    param: &str,
) -> Result<RewritePlan, QueryRejection> {
    let credential = extract_credential(headers, &state.cookie_name);
    let scope = state
        .resolver
        .resolve(&credential)
        .await
        .map_err(|_| QueryRejection::Forbidden)?;
    if scope.is_all() {
        return Ok(RewritePlan::Passthrough);
    }
    let enforcer = MatcherEnforcer::new(state.tenant_label.clone(), &scope)
        .map_err(|_| QueryRejection::Forbidden)?;
    let expressions = extract_params(raw_query, param);
    if expressions.is_empty() {
        return Err(QueryRejection::Malformed(format!("missing {param} parameter")));
    }
    let mut rewritten = Vec::with_capacity(expressions.len());
    let mut sentinel_injected = false;
    for expression in &expressions {
        let enforced = rewrite_query(expression, &enforcer).map_err(|err| match err {
            RewriteError::Parse(diagnostic) => QueryRejection::Malformed(diagnostic),
            RewriteError::UnsupportedNode(node) => {
                QueryRejection::Malformed(format!("unsupported expression node: {node}"))
            }
        })?;
        sentinel_injected = sentinel_injected || enforced.contains(NO_DATA_NAMESPACE);
        rewritten.push(enforced);
    }
    Ok(RewritePlan::Rewritten {
        raw_query: replace_params(raw_query, param, &rewritten),
        sentinel_injected,
    })
}

/// Runs the full pipeline for one expression-bearing endpoint.
async fn enforced_endpoint(
    state: AppState,
    endpoint: Endpoint,
    path: &str,
    headers: HeaderMap,
    raw_query: Option<String>,
    param: &str,
) -> Response {
    let raw_query = raw_query.unwrap_or_default();
    let plan = match authorize_and_rewrite(&state, &headers, &raw_query, param).await {
        Ok(plan) => plan,
        Err(rejection) => {
            let decision = match &rejection {
                QueryRejection::Forbidden => QueryDecision::RejectedForbidden,
                QueryRejection::Malformed(_) => QueryDecision::RejectedMalformed,
            };
            state.telemetry.record_query(QueryEvent {
                endpoint,
                decision,
                sentinel_injected: false,
            });
            return rejection.into_response();
        }
    };
    let (outgoing, decision, sentinel_injected) = match plan {
        RewritePlan::Passthrough => (raw_query, QueryDecision::Passthrough, false),
        RewritePlan::Rewritten {
            raw_query,
            sentinel_injected,
        } => (raw_query, QueryDecision::Rewritten, sentinel_injected),
    };
    state.telemetry.record_query(QueryEvent {
        endpoint,
        decision,
        sentinel_injected,
    });
    relay(&state, endpoint, path, Some(&outgoing), &headers).await
}

/// Forwards to the upstream, mapping failures to 502.
async fn relay(
    state: &AppState,
    endpoint: Endpoint,
    path: &str,
    raw_query: Option<&str>,
    headers: &HeaderMap,
) -> Response {
    match state.forwarder.forward(path, raw_query, headers).await {
        Ok(response) => response,
        Err(_) => {
            state.telemetry.record_forward_failure(endpoint);
            Response::builder()
                .status(StatusCode::BAD_GATEWAY)
                .body(Body::from(UPSTREAM_UNAVAILABLE_BODY))
                .unwrap_or_else(|_| StatusCode::BAD_GATEWAY.into_response())
        }
    }
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Instant query endpoint.
async fn handle_query(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(raw_query): RawQuery,
) -> Response {
    enforced_endpoint(state, Endpoint::Query, "/api/v1/query", headers, raw_query, QUERY_PARAM)
        .await
}

/// Range query endpoint.
async fn handle_query_range(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(raw_query): RawQuery,
) -> Response {
    enforced_endpoint(
        state,
        Endpoint::QueryRange,
        "/api/v1/query_range",
        headers,
        raw_query,
        QUERY_PARAM,
    )
    .await
}

/// Series metadata endpoint; every `match[]` selector is enforced.
async fn handle_series(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(raw_query): RawQuery,
) -> Response {
    enforced_endpoint(state, Endpoint::Series, "/api/v1/series", headers, raw_query, MATCH_PARAM)
        .await
}

/// Label names endpoint; forwarded without rewriting.
async fn handle_labels(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(raw_query): RawQuery,
) -> Response {
    relay(&state, Endpoint::Labels, "/api/v1/labels", raw_query.as_deref(), &headers).await
}

/// Label values endpoint; forwarded without rewriting.
async fn handle_label_values(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    RawQuery(raw_query): RawQuery,
) -> Response {
    relay(&state, Endpoint::LabelValues, uri.path(), raw_query.as_deref(), &headers).await
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
