// SPDX-License-Identifier: Apache-2.0

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Namespace prefix for per-sample annotation predicates.
pub const ANNOTATION_PREFIX: &str = "annotation";

/// Structured outcome of parsing a free-form sample-annotation expression:
/// recognized catalog fields become direct constraints, everything else is
/// accumulated into one composite list of namespaced annotation predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SampleQuery {
    /// Direct field constraints, `field -> "<op><value>"`.
    pub fields: BTreeMap<String, String>,
    /// Composite annotation predicates, each `annotation.key<op>value`.
    pub annotations: Vec<String>,
}

impl SampleQuery {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.annotations.is_empty()
    }
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*([a-zA-Z0-9_.:\-]+)\s*(<=|>=|!=|=~|==|<|>|~|=)\s*([^=<>~!]+.*?)\s*$")
            .unwrap_or_else(|e| panic!("invalid annotation token pattern: {e}"))
    })
}

/// Parse a semicolon-separated `key<op>value` expression.
///
/// Tokens that do not match the grammar are skipped; callers that care
/// should check the resulting query's non-emptiness. Best-effort by
/// contract.
pub fn parse_sample_annotation(
    expression: &str,
    is_recognized_field: impl Fn(&str) -> bool,
) -> SampleQuery {
    let mut query = SampleQuery::default();
    let namespaced = format!("{ANNOTATION_PREFIX}.");
    for token in expression.split(';') {
        if token.trim().is_empty() {
            continue;
        }
        let Some(captures) = token_pattern().captures(token) else {
            tracing_skip(token);
            continue;
        };
        let key = &captures[1];
        let operator = &captures[2];
        let value = &captures[3];

        if is_recognized_field(key) && !key.starts_with(&namespaced) {
            query
                .fields
                .insert(key.to_string(), format!("{operator}{value}"));
        } else if key.starts_with(&namespaced) {
            query.annotations.push(format!("{key}{operator}{value}"));
        } else {
            query
                .annotations
                .push(format!("{ANNOTATION_PREFIX}.{key}{operator}{value}"));
        }
    }
    query
}

fn tracing_skip(token: &str) {
    // Malformed tokens are tolerated, not fatal.
    tracing::debug!(token, "skipping malformed sample-annotation token");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognized(key: &str) -> bool {
        matches!(key, "age" | "source" | "somatic")
    }

    #[test]
    fn recognized_field_becomes_direct_constraint() {
        let query = parse_sample_annotation("age>30;hpo=HP:0001250", recognized);
        assert_eq!(query.fields.get("age").map(String::as_str), Some(">30"));
        assert_eq!(query.annotations, vec!["annotation.hpo=HP:0001250"]);
    }

    #[test]
    fn recognized_field_named_like_the_namespace_stays_direct() {
        let query = parse_sample_annotation("annotations=3", |key| key == "annotations");
        assert_eq!(query.fields.get("annotations").map(String::as_str), Some("=3"));
        assert!(query.annotations.is_empty());
    }

    #[test]
    fn already_namespaced_keys_are_not_double_prefixed() {
        let query = parse_sample_annotation("annotation.tissue=blood", recognized);
        assert_eq!(query.annotations, vec!["annotation.tissue=blood"]);
    }

    #[test]
    fn malformed_tokens_are_skipped() {
        let query = parse_sample_annotation("age>30;;not a token;=oops", recognized);
        assert_eq!(query.fields.len(), 1);
        assert!(query.annotations.is_empty());
    }

    #[test]
    fn comparison_and_regex_operators_survive() {
        let query = parse_sample_annotation("age<=12;name~BR.*", recognized);
        assert_eq!(query.fields.get("age").map(String::as_str), Some("<=12"));
        assert_eq!(query.annotations, vec!["annotation.name~BR.*"]);
    }

    #[test]
    fn empty_expression_yields_empty_query() {
        let query = parse_sample_annotation("", recognized);
        assert!(query.is_empty());
    }
}
