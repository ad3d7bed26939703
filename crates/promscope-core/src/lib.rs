// crates/promscope-core/src/lib.rs
// ============================================================================
// Module: Promscope Core Library
// Description: Tenant-scoping engine for PromQL query rewriting.
// Purpose: Confine metrics queries to the namespaces a caller may see.
// Dependencies: async-trait, promql-parser, regex, thiserror
// ============================================================================

//! ## Overview
//! Promscope Core rewrites the tenant-label matchers of a PromQL query so
//! that results are confined to an authorized [`NamespaceScope`]. The
//! [`MatcherEnforcer`] validates and rewrites the matcher list of a single
//! selector; [`rewrite_expr`] walks every node of a parsed expression tree
//! and applies the enforcer at each selector; the [`NamespaceResolver`]
//! contract supplies the authorized scope for a request.
//! Invariants:
//! - After rewriting, each selector carries at most one tenant-label matcher.
//! - Unauthorized matcher values are replaced with [`NO_DATA_NAMESPACE`],
//!   which matches no real namespace and forces an empty result set.
//! - Enforcement never widens a query's visibility; every undecidable case
//!   fails closed to the no-data matcher.
//!
//! Security posture: query text and matcher values are untrusted caller
//! input; refusal decisions happen at resolution time, before any rewrite.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod enforce;
pub mod resolver;
pub mod rewrite;
pub mod scope;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use enforce::EnforceError;
pub use enforce::MatcherEnforcer;
pub use enforce::NO_DATA_NAMESPACE;
pub use resolver::CallerCredential;
pub use resolver::NamespaceResolver;
pub use resolver::ResolveError;
pub use rewrite::RewriteError;
pub use rewrite::rewrite_expr;
pub use rewrite::rewrite_query;
pub use rewrite::rewrite_stmt;
pub use scope::NamespaceScope;
