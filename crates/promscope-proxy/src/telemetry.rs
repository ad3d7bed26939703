// crates/promscope-proxy/src/telemetry.rs
// ============================================================================
// Module: Proxy Telemetry
// Description: Observability hooks for query authorization and forwarding.
// Purpose: Provide metric events without a hard backend dependency.
// Dependencies: none
// ============================================================================

//! ## Overview
//! This module exposes a thin metrics interface for per-request decision
//! counters. It is intentionally dependency-light so deployments can plug
//! in Prometheus or OpenTelemetry without redesign.
//! Security posture: telemetry must never carry raw query text or tokens.

// ============================================================================
// SECTION: Metric Labels
// ============================================================================

/// Proxied endpoint classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Instant query endpoint.
    Query,
    /// Range query endpoint.
    QueryRange,
    /// Series metadata endpoint.
    Series,
    /// Label names endpoint.
    Labels,
    /// Label values endpoint.
    LabelValues,
}

impl Endpoint {
    /// Returns a stable label for the endpoint.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::QueryRange => "query_range",
            Self::Series => "series",
            Self::Labels => "labels",
            Self::LabelValues => "label_values",
        }
    }
}

/// Per-request authorization decision classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryDecision {
    /// Unbounded scope; the request was forwarded untouched.
    Passthrough,
    /// Expressions were rewritten before forwarding.
    Rewritten,
    /// The caller was refused authorization.
    RejectedForbidden,
    /// The expression was malformed or unsupported.
    RejectedMalformed,
}

impl QueryDecision {
    /// Returns a stable label for the decision.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passthrough => "passthrough",
            Self::Rewritten => "rewritten",
            Self::RejectedForbidden => "rejected_forbidden",
            Self::RejectedMalformed => "rejected_malformed",
        }
    }
}

/// Query decision metric event payload.
#[derive(Debug, Clone, Copy)]
pub struct QueryEvent {
    /// Endpoint the request targeted.
    pub endpoint: Endpoint,
    /// Authorization decision taken.
    pub decision: QueryDecision,
    /// True when enforcement injected the no-data sentinel.
    pub sentinel_injected: bool,
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Metrics sink for proxy decisions.
pub trait ProxyTelemetry: Send + Sync {
    /// Records one authorization decision.
    fn record_query(&self, event: QueryEvent);
    /// Records an upstream forwarding failure.
    fn record_forward_failure(&self, endpoint: Endpoint);
}

/// No-op metrics sink.
///
/// # Invariants
/// - Metrics are intentionally discarded.
pub struct NoopTelemetry;

impl ProxyTelemetry for NoopTelemetry {
    fn record_query(&self, _event: QueryEvent) {}

    fn record_forward_failure(&self, _endpoint: Endpoint) {}
}
