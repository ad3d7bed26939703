// crates/promscope-resolver/src/static_list.rs
// ============================================================================
// Module: Static Resolver
// Description: Fixed-list namespace resolver from configuration.
// Purpose: Grant every caller the same configured namespace scope.
// Dependencies: async-trait, promscope-config, promscope-core
// ============================================================================

//! ## Overview
//! The static resolver returns one scope computed at construction. A list
//! containing the reserved `ALL` entry promotes the whole scope to
//! unbounded. An empty effective scope is rejected at construction, not at
//! resolve time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use promscope_config::config::ALL_NAMESPACES;
use promscope_core::CallerCredential;
use promscope_core::NamespaceResolver;
use promscope_core::NamespaceScope;
use promscope_core::ResolveError;

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Resolver granting a fixed namespace scope to every caller.
///
/// # Invariants
/// - The scope is computed once at construction and never changes.
/// - Construction fails when the configured list collapses to nothing.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    /// Scope granted to every caller.
    scope: NamespaceScope,
}

impl StaticResolver {
    /// Builds a resolver from the configured namespace list.
    ///
    /// Returns `None` when the list holds no usable entries.
    #[must_use]
    pub fn new(namespaces: &[String]) -> Option<Self> {
        if namespaces.iter().any(|name| name == ALL_NAMESPACES) {
            return Some(Self {
                scope: NamespaceScope::All,
            });
        }
        NamespaceScope::named(namespaces.iter().cloned()).map(|scope| Self {
            scope,
        })
    }

    /// Returns the scope granted to every caller.
    #[must_use]
    pub const fn scope(&self) -> &NamespaceScope {
        &self.scope
    }
}

#[async_trait]
impl NamespaceResolver for StaticResolver {
    async fn resolve(&self, _credential: &CallerCredential) -> Result<NamespaceScope, ResolveError> {
        Ok(self.scope.clone())
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

    /// Owned string list helper.
    fn list(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn named_list_resolves_for_any_credential() {
        let resolver = StaticResolver::new(&list(&["foo", "bar"])).unwrap();
        let scope = resolver.resolve(&CallerCredential::Anonymous).await.unwrap();
        assert_eq!(scope.names().unwrap(), &["foo".to_string(), "bar".to_string()]);
    }

    #[tokio::test]
    async fn reserved_all_entry_promotes_to_unbounded_scope() {
        let resolver = StaticResolver::new(&list(&["foo", "ALL", "bar"])).unwrap();
        let scope = resolver
            .resolve(&CallerCredential::Token("ignored".to_string()))
            .await
            .unwrap();
        assert!(scope.is_all());
    }

    #[test]
    fn empty_list_fails_construction() {
        assert!(StaticResolver::new(&[]).is_none());
        assert!(StaticResolver::new(&list(&["", ""])).is_none());
    }
}
