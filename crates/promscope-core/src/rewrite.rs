// crates/promscope-core/src/rewrite.rs
// ============================================================================
// Module: Expression Walker
// Description: Recursive rewrite of every selector in a PromQL expression.
// Purpose: Apply matcher enforcement at each leaf selector of a query tree.
// Dependencies: promql-parser, thiserror
// ============================================================================

//! ## Overview
//! The walker visits every node of a parsed PromQL expression tree in a
//! fixed, deterministic order and applies the [`MatcherEnforcer`] to the
//! matcher list of each vector and matrix selector. All other node variants
//! are pure structural recursion points; number and string literals are
//! no-ops. Node variants the walker cannot handle surface as a typed
//! [`RewriteError`] instead of aborting the process.
//! Invariants:
//! - Recursion order: aggregation visits its sub-expression then its
//!   parameter; binary visits left then right; calls visit arguments in
//!   order; paren, unary, and subquery visit their single child.
//! - The rewritten tree always re-serializes to valid PromQL.

// ============================================================================
// SECTION: Imports
// ============================================================================

use promql_parser::parser::EvalStmt;
use promql_parser::parser::Expr;
use promql_parser::parser::parse;
use thiserror::Error;

use crate::enforce::MatcherEnforcer;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while rewriting a query.
///
/// # Invariants
/// - Variants are terminal for the current request; nothing is retried.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// The raw query text failed to parse.
    #[error("query parse error: {0}")]
    Parse(String),
    /// The expression tree contains a node the walker cannot handle.
    #[error("unsupported expression node: {0}")]
    UnsupportedNode(&'static str),
}

// ============================================================================
// SECTION: Walker
// ============================================================================

/// Parses `query`, rewrites every selector, and re-serializes the tree.
///
/// # Errors
///
/// Returns [`RewriteError::Parse`] with the parser's diagnostic when the
/// text is not valid PromQL, or [`RewriteError::UnsupportedNode`] when the
/// tree contains an unrecognized node variant.
pub fn rewrite_query(query: &str, enforcer: &MatcherEnforcer) -> Result<String, RewriteError> {
    let mut expr = parse(query).map_err(RewriteError::Parse)?;
    rewrite_expr(&mut expr, enforcer)?;
    Ok(expr.to_string())
}

/// Rewrites every selector beneath an evaluation statement wrapper.
///
/// # Errors
///
/// Returns [`RewriteError::UnsupportedNode`] when the wrapped expression
/// contains an unrecognized node variant.
pub fn rewrite_stmt(stmt: &mut EvalStmt, enforcer: &MatcherEnforcer) -> Result<(), RewriteError> {
    rewrite_expr(&mut stmt.expr, enforcer)
}

/// Rewrites every selector in the expression tree in place.
///
/// # Errors
///
/// Returns [`RewriteError::UnsupportedNode`] when the tree contains an
/// unrecognized node variant.
pub fn rewrite_expr(expr: &mut Expr, enforcer: &MatcherEnforcer) -> Result<(), RewriteError> {
    match expr {
        Expr::Aggregate(aggregate) => {
            rewrite_expr(&mut aggregate.expr, enforcer)?;
            if let Some(param) = &mut aggregate.param {
                rewrite_expr(param, enforcer)?;
            }
            Ok(())
        }
        Expr::Unary(unary) => rewrite_expr(&mut unary.expr, enforcer),
        Expr::Binary(binary) => {
            rewrite_expr(&mut binary.lhs, enforcer)?;
            rewrite_expr(&mut binary.rhs, enforcer)
        }
        Expr::Paren(paren) => rewrite_expr(&mut paren.expr, enforcer),
        Expr::Subquery(subquery) => rewrite_expr(&mut subquery.expr, enforcer),
        Expr::NumberLiteral(_) | Expr::StringLiteral(_) => Ok(()),
        Expr::VectorSelector(selector) => {
            selector.matchers = enforcer.enforce(&selector.matchers);
            Ok(())
        }
        Expr::MatrixSelector(selector) => {
            selector.vs.matchers = enforcer.enforce(&selector.vs.matchers);
            Ok(())
        }
        Expr::Call(call) => {
            for argument in &mut call.args.args {
                rewrite_expr(argument, enforcer)?;
            }
            Ok(())
        }
        Expr::Extension(_) => Err(RewriteError::UnsupportedNode("extension")),
    }
}
