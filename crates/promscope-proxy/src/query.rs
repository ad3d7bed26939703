// crates/promscope-proxy/src/query.rs
// ============================================================================
// Module: Query String Handling
// Description: Extract and replace expression parameters in query strings.
// Purpose: Carry rewritten expressions without disturbing other parameters.
// Dependencies: url
// ============================================================================

//! ## Overview
//! The query API carries expressions in the `query` parameter (instant and
//! range queries) or in repeated `match[]` parameters (series). Extraction
//! decodes values in document order; replacement substitutes new values
//! positionally and re-encodes the whole string, preserving parameter order
//! and every unrelated parameter.

// ============================================================================
// SECTION: Imports
// ============================================================================

use url::form_urlencoded;

// ============================================================================
// SECTION: Parameter Names
// ============================================================================

/// Expression parameter on instant and range queries.
pub const QUERY_PARAM: &str = "query";
/// Repeated selector parameter on series requests.
pub const MATCH_PARAM: &str = "match[]";

// ============================================================================
// SECTION: Operations
// ============================================================================

/// Returns the decoded values of `name`, in document order.
#[must_use]
pub fn extract_params(raw: &str, name: &str) -> Vec<String> {
    form_urlencoded::parse(raw.as_bytes())
        .filter(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .collect()
}

/// Replaces the values of `name` positionally with `replacements` and
/// re-encodes the query string.
///
/// Callers must pass one replacement per occurrence; surplus occurrences
/// keep their original value.
#[must_use]
pub fn replace_params(raw: &str, name: &str, replacements: &[String]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut next = 0;
    for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
        if key == name {
            let replacement = replacements.get(next).map_or(value.as_ref(), String::as_str);
            next += 1;
            serializer.append_pair(&key, replacement);
        } else {
            serializer.append_pair(&key, &value);
        }
    }
    serializer.finish()
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
    fn extract_decodes_in_document_order() {
        let raw = "start=1&query=up%7Bjob%3D%22a%22%7D&end=2";
        assert_eq!(extract_params(raw, QUERY_PARAM), vec![r#"up{job="a"}"#.to_string()]);
    }

    #[test]
    fn extract_collects_repeated_match_params() {
        let raw = "match%5B%5D=up&match%5B%5D=node_info&start=1";
        assert_eq!(
            extract_params(raw, MATCH_PARAM),
            vec!["up".to_string(), "node_info".to_string()]
        );
    }

    #[test]
    fn extract_returns_empty_when_absent() {
        assert!(extract_params("start=1&end=2", QUERY_PARAM).is_empty());
    }

    #[test]
    fn replace_preserves_order_and_other_params() {
        let raw = "start=1&query=up&end=2";
        let out = replace_params(raw, QUERY_PARAM, &[r#"up{ns="foo"}"#.to_string()]);
        assert_eq!(extract_params(&out, QUERY_PARAM), vec![r#"up{ns="foo"}"#.to_string()]);
        assert_eq!(extract_params(&out, "start"), vec!["1".to_string()]);
        assert_eq!(extract_params(&out, "end"), vec!["2".to_string()]);
        let keys: Vec<String> = form_urlencoded::parse(out.as_bytes())
            .map(|(key, _)| key.into_owned())
            .collect();
        assert_eq!(keys, vec!["start".to_string(), "query".to_string(), "end".to_string()]);
    }

    #[test]
    fn replace_substitutes_repeated_params_positionally() {
        let raw = "match%5B%5D=a&match%5B%5D=b";
        let out = replace_params(raw, MATCH_PARAM, &["x".to_string(), "y".to_string()]);
        assert_eq!(extract_params(&out, MATCH_PARAM), vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn replacement_round_trips_through_encoding() {
        let expression = r#"sum(rate(up{namespace=~"^foo$|^bar$"}[5m]))"#;
        let out = replace_params("query=up", QUERY_PARAM, &[expression.to_string()]);
        assert_eq!(extract_params(&out, QUERY_PARAM), vec![expression.to_string()]);
    }
}
