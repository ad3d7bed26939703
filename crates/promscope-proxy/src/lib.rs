// crates/promscope-proxy/src/lib.rs
// ============================================================================
// Module: Promscope Proxy Library
// Description: HTTP surface, query rewriting orchestration, and forwarding.
// Purpose: Serve the tenant-scoped query API in front of an upstream engine.
// Dependencies: axum, promscope-config, promscope-core, promscope-resolver
// ============================================================================

//! ## Overview
//! The proxy accepts read-only query API requests, resolves the caller's
//! namespace scope, rewrites selector matchers inside query expressions,
//! and forwards the result upstream. Label metadata endpoints pass through
//! unrewritten; everything else is refused.
//! Invariants:
//! - No query expression reaches the upstream without enforcement unless
//!   the caller's scope is unbounded.
//! - Authorization failures are indistinguishable to the caller.
//!
//! Security posture: request parameters and headers are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod credentials;
pub mod forward;
pub mod query;
pub mod routes;
pub mod server;
pub mod telemetry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use forward::ForwardError;
pub use forward::Forwarder;
pub use routes::AppState;
pub use routes::router;
pub use server::ServerError;
pub use server::run;
pub use telemetry::Endpoint;
pub use telemetry::NoopTelemetry;
pub use telemetry::ProxyTelemetry;
pub use telemetry::QueryDecision;
pub use telemetry::QueryEvent;
