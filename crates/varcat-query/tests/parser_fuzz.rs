// SPDX-License-Identifier: Apache-2.0

use proptest::prelude::*;
use varcat_query::{parse_sample_annotation, ANNOTATION_PREFIX};

proptest! {
    #[test]
    fn parser_never_panics(expr in "\\PC{0,128}") {
        let _ = parse_sample_annotation(&expr, |_| false);
    }

    #[test]
    fn unrecognized_tokens_are_always_namespaced(
        key in "[a-z]{1,8}",
        value in "[a-zA-Z0-9:]{1,8}",
    ) {
        let query = parse_sample_annotation(&format!("{key}={value}"), |_| false);
        for predicate in &query.annotations {
            prop_assert!(predicate.starts_with(ANNOTATION_PREFIX));
        }
    }
}
