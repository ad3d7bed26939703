// crates/promscope-core/src/scope.rs
// ============================================================================
// Module: Namespace Scope
// Description: The set of namespaces one caller is authorized to query.
// Purpose: Provide an ordered, deduplicated scope with an "all" sentinel.
// Dependencies: std
// ============================================================================

//! ## Overview
//! A [`NamespaceScope`] is the result of resolving "which namespaces can this
//! caller see" for one request. It is either the distinguished
//! [`NamespaceScope::All`] value, which authorizes every namespace and
//! short-circuits query rewriting entirely, or a named scope holding an
//! ordered, deduplicated, non-empty list of namespace names.
//! Invariants:
//! - Named scopes are never empty; zero accessible namespaces must surface
//!   as a resolution failure instead.
//! - Names keep their first-seen order and contain no duplicates.

// ============================================================================
// SECTION: Scope Type
// ============================================================================

/// The namespaces a caller is authorized to query.
///
/// # Invariants
/// - `Named` holds a non-empty, ordered, deduplicated list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceScope {
    /// Every namespace is authorized; rewriting is bypassed.
    All,
    /// Only the listed namespaces are authorized.
    Named(Vec<String>),
}

impl NamespaceScope {
    /// Builds a named scope from the provided names, deduplicating while
    /// preserving first-seen order. Returns `None` when no names remain.
    #[must_use]
    pub fn named<I, S>(names: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !name.is_empty() && !unique.contains(&name) {
                unique.push(name);
            }
        }
        if unique.is_empty() {
            return None;
        }
        Some(Self::Named(unique))
    }

    /// Returns true when the scope authorizes every namespace.
    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Returns true when the named scope contains `name`. The all-namespaces
    /// scope contains every name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(names) => names.iter().any(|candidate| candidate == name),
        }
    }

    /// Returns the ordered names of a named scope, or `None` for
    /// [`NamespaceScope::All`].
    #[must_use]
    pub fn names(&self) -> Option<&[String]> {
        match self {
            Self::All => None,
            Self::Named(names) => Some(names),
        }
    }
}
