// crates/promscope-core/src/resolver.rs
// ============================================================================
// Module: Namespace Resolver Contract
// Description: Capability interface for resolving a caller's namespace scope.
// Purpose: Provide a pluggable, fail-closed resolution seam for backends.
// Dependencies: async-trait, thiserror
// ============================================================================

//! ## Overview
//! The [`NamespaceResolver`] contract answers "which namespaces can this
//! caller see" for one request. Backends are independently swappable and are
//! selected by configuration; the engine consumes only this interface.
//! Invariants:
//! - Resolution is deterministic for a given credential within one call.
//! - Zero accessible namespaces must surface as [`ResolveError::AccessDenied`];
//!   named scopes are never empty.
//! - Network-backed implementations bound their I/O with a timeout and
//!   surface expiry as [`ResolveError::Upstream`].
//!
//! Security posture: resolution is a trust boundary and must fail closed on
//! missing or invalid credentials.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use thiserror::Error;

use crate::scope::NamespaceScope;

// ============================================================================
// SECTION: Credentials
// ============================================================================

/// Caller credential extracted from an inbound request.
///
/// # Invariants
/// - This is a pure value container; validation happens in the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerCredential {
    /// Bearer-style token taken from a cookie or `Authorization` header.
    Token(String),
    /// No usable credential was present on the request.
    Anonymous,
}

impl CallerCredential {
    /// Returns the token value when one is present.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Token(token) => Some(token),
            Self::Anonymous => None,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while resolving a caller's namespace scope.
///
/// # Invariants
/// - Variants are terminal for the current request; nothing is retried.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No usable credential was found on the request.
    #[error("no usable credential found")]
    Unauthenticated,
    /// The credential is valid but grants zero accessible namespaces.
    #[error("no namespace accessible to caller")]
    AccessDenied,
    /// The resolution backend was unreachable or returned an invalid
    /// response.
    #[error("namespace resolution failed: {0}")]
    Upstream(String),
}

// ============================================================================
// SECTION: Resolver Trait
// ============================================================================

/// Resolves the namespace scope a caller is authorized to query.
#[async_trait]
pub trait NamespaceResolver: Send + Sync {
    /// Resolves the authorized scope for the given credential.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when no credential is usable, the caller has
    /// zero accessible namespaces, or the backend fails.
    async fn resolve(&self, credential: &CallerCredential) -> Result<NamespaceScope, ResolveError>;
}
