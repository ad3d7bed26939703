// crates/promscope-resolver/src/lib.rs
// ============================================================================
// Module: Promscope Resolver Library
// Description: Namespace resolver backends for Promscope.
// Purpose: Map caller credentials to namespace scopes, failing closed.
// Dependencies: async-trait, promscope-config, promscope-core, reqwest
// ============================================================================

//! ## Overview
//! Resolver backends implement [`promscope_core::NamespaceResolver`]. The
//! static backend grants a fixed list to every caller; the IAM backend asks
//! an external identity service which namespaces the presented token may
//! see. Any resolver failure denies access.
//! Invariants:
//! - A resolver never widens scope on error.
//! - The reserved `ALL` namespace entry is the only path to an unbounded
//!   scope.
//!
//! Security posture: caller tokens and IAM responses are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod iam;
pub mod registry;
pub mod static_list;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use iam::IamResolver;
pub use iam::IamResolverConfig;
pub use registry::ResolverBuildError;
pub use registry::build_resolver;
pub use static_list::StaticResolver;
