// crates/promscope-cli/src/main.rs
// ============================================================================
// Module: Promscope CLI Entry Point
// Description: Launcher for the tenant-scoped query proxy.
// Purpose: Load configuration, start the server, and report fatal errors.
// Dependencies: clap, promscope-config, promscope-proxy, tokio
// ============================================================================

//! ## Overview
//! The binary loads TOML configuration and runs the proxy until ctrl-c.
//! Configuration errors and startup failures are fatal and land on stderr
//! with a nonzero exit code.
//! Security posture: the config file and environment are untrusted inputs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use promscope_config::ProxyConfig;
use promscope_config::config::CONFIG_ENV_VAR;
use promscope_proxy::NoopTelemetry;

// ============================================================================
// SECTION: Arguments
// ============================================================================

/// Tenant-scoped query proxy for Prometheus-compatible engines.
#[derive(Debug, Parser)]
#[command(name = "promscope", version, about)]
struct Cli {
    /// Path to the TOML configuration file. Falls back to the
    /// `PROMSCOPE_CONFIG` environment variable, then `promscope.toml`.
    #[arg(long, short = 'c', env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => emit_error(&message),
    }
}

/// Loads configuration and serves until shutdown.
async fn run(cli: Cli) -> Result<(), String> {
    let config = ProxyConfig::load(cli.config.as_deref()).map_err(|err| err.to_string())?;
    promscope_proxy::run(config, Arc::new(NoopTelemetry))
        .await
        .map_err(|err| err.to_string())
}

/// Writes a fatal error to stderr and returns the failure code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}

/// Writes one line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

// ============================================================================
// SECTION: Tests
// ============================================================================
