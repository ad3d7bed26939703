// crates/promscope-proxy/src/server.rs
// ============================================================================
// Module: Proxy Server Lifecycle
// Description: Wire configuration into a running axum server.
// Purpose: Own startup, the listener, and graceful shutdown.
// Dependencies: axum, promscope-config, promscope-resolver, tokio
// ============================================================================

//! ## Overview
//! Startup is strict: resolver and forwarder construction failures abort
//! before the listener binds. The server drains in-flight requests on
//! ctrl-c or SIGTERM.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use promscope_config::ProxyConfig;
use promscope_resolver::ResolverBuildError;
use promscope_resolver::build_resolver;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::forward::ForwardError;
use crate::forward::Forwarder;
use crate::routes::AppState;
use crate::routes::router;
use crate::telemetry::ProxyTelemetry;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server startup and runtime errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The resolver backend could not be constructed.
    #[error("resolver startup failed: {0}")]
    Resolver(#[from] ResolverBuildError),
    /// The upstream forwarder could not be constructed.
    #[error("forwarder startup failed: {0}")]
    Forwarder(#[from] ForwardError),
    /// The listen address could not be bound.
    #[error("bind failed: {0}")]
    Bind(String),
    /// The server loop terminated abnormally.
    #[error("serve failed: {0}")]
    Serve(String),
}

// ============================================================================
// SECTION: Lifecycle
// ============================================================================

/// Runs the proxy until shutdown is requested.
///
/// # Errors
///
/// Returns [`ServerError`] when a component cannot be constructed, the
/// listen address cannot be bound, or the server loop fails.
pub async fn run(config: ProxyConfig, telemetry: Arc<dyn ProxyTelemetry>) -> Result<(), ServerError> {
    let resolver = build_resolver(&config.resolver)?;
    let forwarder = Forwarder::new(&config.upstream)?;
    let state = AppState {
        tenant_label: config.server.tenant_label.clone(),
        cookie_name: config.server.auth_cookie_name.clone(),
        resolver,
        forwarder: Arc::new(forwarder),
        telemetry,
    };
    let listener = TcpListener::bind(config.server.listen_address)
        .await
        .map_err(|err| ServerError::Bind(format!("{}: {err}", config.server.listen_address)))?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| ServerError::Serve(err.to_string()))
}

/// Resolves when the process receives ctrl-c or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
