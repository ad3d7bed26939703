// crates/promscope-core/src/enforce.rs
// ============================================================================
// Module: Matcher Enforcement Engine
// Description: Validates and rewrites the tenant-label matcher of a selector.
// Purpose: Confine one matcher list to an authorized namespace scope.
// Dependencies: promql-parser, regex, thiserror
// ============================================================================

//! ## Overview
//! The [`MatcherEnforcer`] inspects the matcher list of a single PromQL
//! selector and rewrites its tenant-label matcher so the selector can only
//! match authorized namespaces. Construction precompiles the anchored
//! alternation for the scope; enforcement itself is a pure function that
//! always produces a valid matcher list.
//! Invariants:
//! - Non-tenant matchers pass through unchanged.
//! - The output contains exactly one tenant-label matcher.
//! - Every undecidable input (negative operators, duplicate tenant matchers,
//!   regex values that are not plain alternations of authorized names, `or`
//!   matcher groups) rewrites to the [`NO_DATA_NAMESPACE`] matcher, which
//!   forces an empty result set.
//!
//! Security posture: matcher values are untrusted caller input; validation
//! never interprets them as regular expressions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use promql_parser::label::MatchOp;
use promql_parser::label::Matcher;
use promql_parser::label::Matchers;
use regex::Regex;
use thiserror::Error;

use crate::scope::NamespaceScope;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Reserved namespace value guaranteed to match no real namespace.
///
/// Injecting an equality matcher on this value forces an empty result set.
/// The value is retained verbatim from earlier deployments of this proxy so
/// that dashboards and alerts matching on it keep working.
pub const NO_DATA_NAMESPACE: &str = "__ibm-ocpthanos-proxy-no-data-namespace__";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while constructing a [`MatcherEnforcer`].
///
/// # Invariants
/// - Enforcement itself is infallible; only construction can fail.
#[derive(Debug, Error)]
pub enum EnforceError {
    /// The tenant label name is empty.
    #[error("tenant label name must be non-empty")]
    EmptyLabel,
    /// Enforcement is undefined for the all-namespaces scope.
    #[error("cannot build an enforcer for the all-namespaces scope")]
    UnboundedScope,
    /// A namespace name contains characters that are not plain literals.
    #[error("namespace name is not a plain literal: {0}")]
    InvalidNamespaceName(String),
    /// The anchored alternation failed to compile.
    #[error("invalid namespace alternation: {0}")]
    InvalidAlternation(String),
}

// ============================================================================
// SECTION: Matcher Enforcer
// ============================================================================

/// Rewrites the tenant-label matcher of one selector to an authorized scope.
///
/// # Invariants
/// - `names` is non-empty and holds only plain literal namespace names.
/// - `alternation` anchors every name as `^name$` joined by `|`.
#[derive(Debug, Clone)]
pub struct MatcherEnforcer {
    /// Label name whose value denotes the owning namespace.
    tenant_label: String,
    /// Authorized namespace names, in scope order.
    names: Vec<String>,
    /// Rendered anchored alternation over `names`.
    alternation: String,
    /// Compiled form of `alternation`, cloned into synthesized matchers.
    alternation_regex: Regex,
}

impl MatcherEnforcer {
    /// Builds an enforcer for the given tenant label and named scope.
    ///
    /// # Errors
    ///
    /// Returns [`EnforceError`] when the label is empty, the scope is the
    /// all-namespaces sentinel, or a namespace name is not a plain literal.
    pub fn new(tenant_label: impl Into<String>, scope: &NamespaceScope) -> Result<Self, EnforceError> {
        let tenant_label = tenant_label.into();
        if tenant_label.is_empty() {
            return Err(EnforceError::EmptyLabel);
        }
        let Some(names) = scope.names() else {
            return Err(EnforceError::UnboundedScope);
        };
        for name in names {
            if !is_literal_name(name) {
                return Err(EnforceError::InvalidNamespaceName(name.clone()));
            }
        }
        let alternation = names
            .iter()
            .map(|name| format!("^{name}$"))
            .collect::<Vec<String>>()
            .join("|");
        let alternation_regex = Regex::new(&alternation)
            .map_err(|err| EnforceError::InvalidAlternation(err.to_string()))?;
        Ok(Self {
            tenant_label,
            names: names.to_vec(),
            alternation,
            alternation_regex,
        })
    }

    /// Returns the tenant label name this enforcer rewrites.
    #[must_use]
    pub fn tenant_label(&self) -> &str {
        &self.tenant_label
    }

    /// Validates and rewrites one selector's matcher list.
    ///
    /// Non-tenant matchers pass through unchanged. The tenant-label matcher
    /// is kept only when it provably selects a subset of the authorized
    /// scope; otherwise it is replaced with the no-data matcher. When no
    /// tenant matcher is present, one is synthesized from the scope.
    #[must_use]
    pub fn enforce(&self, matchers: &Matchers) -> Matchers {
        if !matchers.or_matchers.is_empty() {
            // Branch-wise validation of `or` groups is not supported.
            return Matchers::new(vec![self.no_data_matcher()]);
        }
        let mut kept: Vec<Matcher> = Vec::with_capacity(matchers.matchers.len() + 1);
        let mut tenant: Vec<&Matcher> = Vec::new();
        for matcher in &matchers.matchers {
            if matcher.name == self.tenant_label {
                tenant.push(matcher);
            } else {
                kept.push(matcher.clone());
            }
        }
        let rewritten = match tenant.as_slice() {
            [] => self.scope_matcher(),
            [single] => self.validate_tenant_matcher(single),
            _ => self.no_data_matcher(),
        };
        kept.push(rewritten);
        Matchers::new(kept)
    }

    /// Keeps an existing tenant matcher only when it is provably confined to
    /// the scope; everything else becomes the no-data matcher.
    fn validate_tenant_matcher(&self, matcher: &Matcher) -> Matcher {
        let authorized = match &matcher.op {
            MatchOp::Equal => self.is_authorized(&matcher.value),
            MatchOp::Re(_) => self.is_authorized_alternation(&matcher.value),
            MatchOp::NotEqual | MatchOp::NotRe(_) => false,
        };
        if authorized {
            matcher.clone()
        } else {
            self.no_data_matcher()
        }
    }

    /// Returns true when `name` is a member of the authorized scope.
    fn is_authorized(&self, name: &str) -> bool {
        self.names.iter().any(|candidate| candidate == name)
    }

    /// Returns true when `value` is a plain `name|name|...` alternation and
    /// every name is authorized. Anchors, classes, wildcards, and empty
    /// segments can never validate because authorized names are plain
    /// literals. The enforcer's own anchored alternation is recognized so
    /// that re-running enforcement is a no-op.
    fn is_authorized_alternation(&self, value: &str) -> bool {
        if value == self.alternation {
            return true;
        }
        value
            .split('|')
            .all(|part| is_literal_name(part) && self.is_authorized(part))
    }

    /// Synthesizes the regexp matcher selecting exactly the scope names.
    fn scope_matcher(&self) -> Matcher {
        Matcher {
            op: MatchOp::Re(self.alternation_regex.clone()),
            name: self.tenant_label.clone(),
            value: self.alternation.clone(),
        }
    }

    /// Builds the equality matcher that forces an empty result set.
    fn no_data_matcher(&self) -> Matcher {
        Matcher {
            op: MatchOp::Equal,
            name: self.tenant_label.clone(),
            value: NO_DATA_NAMESPACE.to_string(),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true when `name` is a non-empty literal with no regex
/// metacharacters (ASCII alphanumerics, `-`, and `_` only).
fn is_literal_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_'))
}
