// crates/promscope-config/src/config.rs
// ============================================================================
// Module: Promscope Configuration
// Description: Configuration types, loading, and validation for the proxy.
// Purpose: Reject unusable configuration before the listener starts.
// Dependencies: serde, thiserror, toml, url
// ============================================================================

//! ## Overview
//! [`ProxyConfig`] describes the inbound listener, the upstream query
//! engine, and the namespace resolver backend. Loading applies a file size
//! cap, denies unknown fields, and validates every value against hard
//! limits; any failure is fatal at startup.
//! Invariants:
//! - Unknown resolver kinds and unknown fields never load.
//! - Static resolver namespace lists are non-empty and hold plain literal
//!   names (or the reserved `ALL` sentinel).
//! - Every timeout sits inside its declared bounds.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::Ipv4Addr;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "promscope.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "PROMSCOPE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;
/// Maximum total path length for the config file.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Reserved namespace name granting access to every namespace.
pub const ALL_NAMESPACES: &str = "ALL";
/// Maximum number of namespaces in a static resolver list.
pub(crate) const MAX_STATIC_NAMESPACES: usize = 4096;
/// Maximum length of a single namespace name.
pub(crate) const MAX_NAMESPACE_LENGTH: usize = 253;
/// Maximum length of the tenant label name.
pub(crate) const MAX_LABEL_LENGTH: usize = 128;
/// Maximum length of the auth cookie name.
pub(crate) const MAX_COOKIE_NAME_LENGTH: usize = 128;
/// Minimum upstream request timeout in milliseconds.
pub(crate) const MIN_UPSTREAM_TIMEOUT_MS: u64 = 500;
/// Maximum upstream request timeout in milliseconds.
pub(crate) const MAX_UPSTREAM_TIMEOUT_MS: u64 = 300_000;
/// Minimum resolver connect timeout in milliseconds.
pub(crate) const MIN_RESOLVER_CONNECT_TIMEOUT_MS: u64 = 100;
/// Maximum resolver connect timeout in milliseconds.
pub(crate) const MAX_RESOLVER_CONNECT_TIMEOUT_MS: u64 = 10_000;
/// Minimum resolver request timeout in milliseconds.
pub(crate) const MIN_RESOLVER_REQUEST_TIMEOUT_MS: u64 = 500;
/// Maximum resolver request timeout in milliseconds.
pub(crate) const MAX_RESOLVER_REQUEST_TIMEOUT_MS: u64 = 30_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Top-level Promscope configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProxyConfig {
    /// Inbound listener configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream query engine configuration.
    pub upstream: UpstreamConfig,
    /// Namespace resolver backend selection.
    pub resolver: ResolverConfig,
}

/// Inbound listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address the proxy listens on.
    #[serde(default = "default_listen_address")]
    pub listen_address: SocketAddr,
    /// Name of the metrics label that denotes the owning namespace.
    #[serde(default = "default_tenant_label")]
    pub tenant_label: String,
    /// Name of the cookie carrying the caller's access token.
    #[serde(default = "default_auth_cookie_name")]
    pub auth_cookie_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            tenant_label: default_tenant_label(),
            auth_cookie_name: default_auth_cookie_name(),
        }
    }
}

/// Upstream query engine configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Base URL of the upstream query engine.
    pub url: String,
    /// Optional file holding the service token injected on forwarded
    /// requests.
    #[serde(default)]
    pub token_file: Option<PathBuf>,
    /// Accept invalid upstream TLS certificates (in-cluster self-signed
    /// endpoints only).
    #[serde(default)]
    pub danger_accept_invalid_certs: bool,
    /// Upstream request timeout in milliseconds.
    #[serde(default = "default_upstream_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Namespace resolver backend selection.
///
/// # Invariants
/// - Unrecognized `kind` values fail deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ResolverConfig {
    /// Fixed namespace list from configuration.
    Static {
        /// Namespaces every caller may access; the reserved `ALL` entry
        /// grants access to every namespace.
        namespaces: Vec<String>,
    },
    /// External IAM service mapping a caller token to its namespaces.
    Iam {
        /// Base URL of the credential-verification endpoint.
        userinfo_url: String,
        /// Base URL of the resource-lookup endpoint.
        resources_url: String,
        /// Connect timeout in milliseconds.
        #[serde(default = "default_resolver_connect_timeout_ms")]
        connect_timeout_ms: u64,
        /// Per-request timeout in milliseconds.
        #[serde(default = "default_resolver_request_timeout_ms")]
        request_timeout_ms: u64,
    },
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl ProxyConfig {
    /// Loads and validates configuration from `path`, the `PROMSCOPE_CONFIG`
    /// environment variable, or the default filename, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file is unreadable, oversized,
    /// malformed, or fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = resolve_path(path)?;
        let metadata =
            fs::metadata(&path).map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds max size".to_string()));
        }
        let text =
            fs::read_to_string(&path).map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
        Self::from_toml(&text)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the text is malformed or fails
    /// validation.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every configured value against its hard limits.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_label_name(&self.server.tenant_label)?;
        validate_cookie_name(&self.server.auth_cookie_name)?;
        validate_http_url("upstream.url", &self.upstream.url)?;
        validate_bounds(
            "upstream.request_timeout_ms",
            self.upstream.request_timeout_ms,
            MIN_UPSTREAM_TIMEOUT_MS,
            MAX_UPSTREAM_TIMEOUT_MS,
        )?;
        match &self.resolver {
            ResolverConfig::Static {
                namespaces,
            } => validate_static_namespaces(namespaces),
            ResolverConfig::Iam {
                userinfo_url,
                resources_url,
                connect_timeout_ms,
                request_timeout_ms,
            } => {
                validate_http_url("resolver.userinfo_url", userinfo_url)?;
                validate_http_url("resolver.resources_url", resources_url)?;
                validate_bounds(
                    "resolver.connect_timeout_ms",
                    *connect_timeout_ms,
                    MIN_RESOLVER_CONNECT_TIMEOUT_MS,
                    MAX_RESOLVER_CONNECT_TIMEOUT_MS,
                )?;
                validate_bounds(
                    "resolver.request_timeout_ms",
                    *request_timeout_ms,
                    MIN_RESOLVER_REQUEST_TIMEOUT_MS,
                    MAX_RESOLVER_REQUEST_TIMEOUT_MS,
                )
            }
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates a metrics label name (Prometheus label charset).
fn validate_label_name(label: &str) -> Result<(), ConfigError> {
    if label.is_empty() || label.len() > MAX_LABEL_LENGTH {
        return Err(ConfigError::Invalid("server.tenant_label length out of range".to_string()));
    }
    let mut chars = label.chars();
    let leading_ok = chars.next().is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_');
    if !leading_ok || !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Err(ConfigError::Invalid(
            "server.tenant_label is not a valid metrics label name".to_string(),
        ));
    }
    Ok(())
}

/// Validates the auth cookie name against the token charset.
fn validate_cookie_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() || name.len() > MAX_COOKIE_NAME_LENGTH {
        return Err(ConfigError::Invalid(
            "server.auth_cookie_name length out of range".to_string(),
        ));
    }
    let valid = name
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'));
    if !valid {
        return Err(ConfigError::Invalid(
            "server.auth_cookie_name contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// Validates an `http`/`https` base URL.
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|err| ConfigError::Invalid(format!("{field} is not a valid URL: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid(format!("{field} must use http or https")));
    }
    if url.host().is_none() {
        return Err(ConfigError::Invalid(format!("{field} is missing a host")));
    }
    Ok(())
}

/// Validates an inclusive numeric bound.
fn validate_bounds(field: &str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::Invalid(format!("{field} must be between {min} and {max}")));
    }
    Ok(())
}

/// Validates a static resolver namespace list.
fn validate_static_namespaces(namespaces: &[String]) -> Result<(), ConfigError> {
    if namespaces.is_empty() {
        return Err(ConfigError::Invalid("resolver.namespaces must be non-empty".to_string()));
    }
    if namespaces.len() > MAX_STATIC_NAMESPACES {
        return Err(ConfigError::Invalid("resolver.namespaces exceeds max entries".to_string()));
    }
    for name in namespaces {
        if name == ALL_NAMESPACES {
            continue;
        }
        if name.is_empty() || name.len() > MAX_NAMESPACE_LENGTH {
            return Err(ConfigError::Invalid(
                "resolver.namespaces entry length out of range".to_string(),
            ));
        }
        let literal = name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_'));
        if !literal {
            return Err(ConfigError::Invalid(format!(
                "resolver.namespaces entry is not a plain literal: {name}"
            )));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default inbound listen address.
pub(crate) fn default_listen_address() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 9096))
}

/// Default tenant label name.
pub(crate) fn default_tenant_label() -> String {
    "namespace".to_string()
}

/// Default auth cookie name.
pub(crate) fn default_auth_cookie_name() -> String {
    "promscope-access-token".to_string()
}

/// Default upstream request timeout in milliseconds.
pub(crate) const fn default_upstream_timeout_ms() -> u64 {
    30_000
}

/// Default resolver connect timeout in milliseconds.
pub(crate) const fn default_resolver_connect_timeout_ms() -> u64 {
    500
}

/// Default resolver request timeout in milliseconds.
pub(crate) const fn default_resolver_request_timeout_ms() -> u64 {
    2_000
}
