// crates/promscope-resolver/src/registry.rs
// ============================================================================
// Module: Resolver Registry
// Description: Construct the configured resolver backend.
// Purpose: Turn resolver configuration into a shared resolver instance.
// Dependencies: promscope-config, promscope-core, reqwest, thiserror
// ============================================================================

//! ## Overview
//! The registry builds exactly one resolver from validated configuration.
//! Construction failures are startup errors; no fallback backend exists.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use promscope_config::ResolverConfig;
use promscope_core::NamespaceResolver;
use reqwest::Client;
use thiserror::Error;

use crate::iam::IamResolver;
use crate::iam::IamResolverConfig;
use crate::static_list::StaticResolver;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Resolver construction errors.
#[derive(Debug, Error)]
pub enum ResolverBuildError {
    /// The static namespace list collapsed to nothing.
    #[error("static resolver has no usable namespaces")]
    EmptyStaticScope,
    /// The IAM HTTP client could not be created.
    #[error("iam client construction failed: {0}")]
    Client(String),
}

// ============================================================================
// SECTION: Construction
// ============================================================================

/// Builds the configured resolver backend.
///
/// # Errors
///
/// Returns [`ResolverBuildError`] when the backend cannot be constructed.
pub fn build_resolver(
    config: &ResolverConfig,
) -> Result<Arc<dyn NamespaceResolver>, ResolverBuildError> {
    match config {
        ResolverConfig::Static {
            namespaces,
        } => {
            let resolver =
                StaticResolver::new(namespaces).ok_or(ResolverBuildError::EmptyStaticScope)?;
            Ok(Arc::new(resolver))
        }
        ResolverConfig::Iam {
            userinfo_url,
            resources_url,
            connect_timeout_ms,
            request_timeout_ms,
        } => {
            // In-cluster IAM endpoints present self-signed certificates.
            let client = Client::builder()
                .connect_timeout(Duration::from_millis(*connect_timeout_ms))
                .timeout(Duration::from_millis(*request_timeout_ms))
                .danger_accept_invalid_certs(true)
                .build()
                .map_err(|err| ResolverBuildError::Client(err.to_string()))?;
            Ok(Arc::new(IamResolver::new(
                client,
                IamResolverConfig {
                    userinfo_url: userinfo_url.clone(),
                    resources_url: resources_url.clone(),
                },
            )))
        }
    }
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

    use super::*;

    #[test]
    fn static_backend_builds() {
        let config = ResolverConfig::Static {
            namespaces: vec!["foo".to_string()],
        };
        assert!(build_resolver(&config).is_ok());
    }

    #[test]
    fn empty_static_backend_fails() {
        let config = ResolverConfig::Static {
            namespaces: vec![String::new()],
        };
        assert!(matches!(
            build_resolver(&config),
            Err(ResolverBuildError::EmptyStaticScope)
        ));
    }

    #[test]
    fn iam_backend_builds() {
        let config = ResolverConfig::Iam {
            userinfo_url: "https://iam.svc".to_string(),
            resources_url: "https://resources.svc".to_string(),
            connect_timeout_ms: 500,
            request_timeout_ms: 2_000,
        };
        assert!(build_resolver(&config).is_ok());
    }
}
