// crates/promscope-config/src/lib.rs
// ============================================================================
// Module: Promscope Configuration Library
// Description: Configuration loading and validation for Promscope.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, thiserror, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and value
//! limits. Missing, malformed, or unrecognized configuration is a fatal
//! startup error; nothing falls back to permissive defaults.
//!
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::ConfigError;
pub use config::ProxyConfig;
pub use config::ResolverConfig;
pub use config::ServerConfig;
pub use config::UpstreamConfig;
