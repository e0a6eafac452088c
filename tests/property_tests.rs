//! Property-based tests
//!
//! Uses proptest to pin down the build log parser and the batch
//! vocabulary enums across their whole input space, not just the
//! handpicked cases in the unit tests.

use proptest::prelude::*;

// =============================================================================
// Build summary parsing
// =============================================================================

use mcubatch::buildlog::{evaluate, parse_summary, scoped_warnings};

proptest! {
    /// Any well-formed summary trailer parses back to its counts.
    #[test]
    fn summary_roundtrip(errors in 0usize..10_000, warnings in 0usize..10_000) {
        let output = format!(
            "make all\n20:38:05 Build Finished. {} errors, {} warnings. (took 1s.835ms)\n",
            errors, warnings
        );
        prop_assert_eq!(parse_summary(&output), Some((errors, warnings)));
    }

    /// With several summaries in one output, the last one wins.
    #[test]
    fn last_summary_wins(first in 0usize..100, second in 0usize..100) {
        let output = format!(
            "Build Failed. {} errors, 0 warnings.\nrebuild\nBuild Finished. {} errors, 0 warnings.\n",
            first, second
        );
        prop_assert_eq!(parse_summary(&output), Some((second, 0)));
    }

    /// completed is 1 exactly when the error count is 0.
    #[test]
    fn completed_tracks_error_count(errors in 0usize..100) {
        let output = format!("Build done. {} errors, 0 warnings.\n", errors);
        let eval = evaluate(&output, "/fsp/", &[]).unwrap();
        prop_assert_eq!(eval.completed, u8::from(errors == 0));
        prop_assert!(eval.disallowed.is_empty());
    }

    /// Every marker-scoped warning line is captured, nothing else.
    #[test]
    fn scoped_warning_count(scoped in 0usize..20, foreign in 0usize..20) {
        let mut output = String::new();
        for i in 0..scoped {
            output.push_str(&format!("../ra/fsp/src/file{}.c:1:1: warning: scoped\n", i));
        }
        for i in 0..foreign {
            output.push_str(&format!("../third_party/file{}.c:1:1: warning: foreign\n", i));
        }
        prop_assert_eq!(scoped_warnings(&output, "/fsp/").len(), scoped);
    }

    /// A warning matched by N copies of the same pattern is excluded once.
    #[test]
    fn allowed_warning_excluded_once(copies in 1usize..5) {
        let output = "\
../ra/fsp/src/r_gpt.c:42:1: warning: unused variable 'x'\n\
Build Finished. 0 errors, 1 warnings.\n";
        let patterns: Vec<String> =
            std::iter::repeat_n(".*unused variable.*".to_string(), copies).collect();
        let eval = evaluate(output, "/fsp/", &patterns).unwrap();
        prop_assert!(eval.disallowed.is_empty());
        prop_assert_eq!(eval.allowed.len(), 1);
    }
}

// =============================================================================
// Batch vocabulary enums
// =============================================================================

use mcubatch::types::{safe_project_name, Expect, ProjectKind};

fn expect_strategy() -> impl Strategy<Value = Expect> {
    prop_oneof![Just(Expect::Yes), Just(Expect::No)]
}

fn kind_strategy() -> impl Strategy<Value = ProjectKind> {
    prop_oneof![
        Just(ProjectKind::Flat),
        Just(ProjectKind::Secure),
        Just(ProjectKind::Nonsecure),
    ]
}

proptest! {
    /// Expect: serde round-trip is identity.
    #[test]
    fn expect_roundtrip(expect in expect_strategy()) {
        let json = serde_json::to_string(&expect).unwrap();
        let parsed: Expect = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(expect, parsed);
    }

    /// ProjectKind: serde round-trip is identity.
    #[test]
    fn project_kind_roundtrip(kind in kind_strategy()) {
        let json = serde_json::to_string(&kind).unwrap();
        let parsed: ProjectKind = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(kind, parsed);
    }

    /// Mangled project names never contain characters the IDE rejects.
    #[test]
    fn safe_names_have_no_rejected_chars(input in ".{0,40}") {
        let safe = safe_project_name(&input);
        for c in ['-', ' ', '+', '.', '(', ')'] {
            prop_assert!(!safe.contains(c));
        }
    }
}
