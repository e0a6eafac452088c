//! Build output analysis
//!
//! The build bridge returns the combined console output of a build. The
//! toolchain-independent trailer looks like:
//!
//! ```text
//! 20:38:05 Build Finished. 0 errors, 0 warnings. (took 1s.835ms)
//! 20:39:48 Build Failed. 3 errors, 0 warnings. (took 1s.78ms)
//! ```
//!
//! A build "completed" iff the error count is zero. Warnings are only
//! counted when they come from files under the project's path marker
//! (third-party kernel sources warn freely and are not ours to fix), and
//! each scoped warning may be excused by a `warnings_allowed` regex.
//! Output without a summary trailer means the build machinery itself went
//! wrong and is reported as a parse error.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Both GCC and IAR warning lines: `...warning: ...` / `...Warning[Pa082]: ...`
fn warning_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[Ww]arning[:\[]").expect("static regex"))
}

fn summary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9]+) errors, ([0-9]+) warnings").expect("static regex"))
}

/// Failures while interpreting build output.
#[derive(Error, Debug)]
pub enum BuildLogError {
    #[error("no '<N> errors, <M> warnings' summary found in build output")]
    MissingSummary,

    #[error("invalid warnings_allowed pattern '{pattern}': {source}")]
    BadPattern {
        pattern: String,
        source: regex::Error,
    },
}

/// Interpreted outcome of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEvaluation {
    pub errors: usize,
    /// 1 iff the build finished with zero errors.
    pub completed: u8,
    /// Scoped warnings not excused by any allow pattern. Any entry here
    /// fails the build check.
    pub disallowed: Vec<String>,
    /// Scoped warnings excused by an allow pattern, for logging.
    pub allowed: Vec<String>,
}

/// Parse the trailing build summary. When several builds ran back to back
/// in one output, the last summary wins.
pub fn parse_summary(output: &str) -> Option<(usize, usize)> {
    summary_re()
        .captures_iter(output)
        .last()
        .map(|caps| {
            // The pattern only admits digits.
            let errors = caps[1].parse().unwrap_or(usize::MAX);
            let warnings = caps[2].parse().unwrap_or(usize::MAX);
            (errors, warnings)
        })
}

/// Warning lines attributable to the project's own sources, i.e. lines
/// containing `marker` in their path.
pub fn scoped_warnings(output: &str, marker: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| line.contains(marker) && warning_re().is_match(line))
        .map(str::to_string)
        .collect()
}

/// Evaluate a build output against the project's path marker and the
/// step's allow patterns.
///
/// Allow patterns are matched against individual warning lines, anchored
/// at the start of the line. A warning matched by at least one pattern is
/// excluded from the count exactly once, even if several patterns match it.
pub fn evaluate(
    output: &str,
    marker: &str,
    allowed_patterns: &[String],
) -> Result<BuildEvaluation, BuildLogError> {
    let (errors, warnings) = parse_summary(output).ok_or(BuildLogError::MissingSummary)?;
    let completed = if errors > 0 { 0 } else { 1 };

    let mut disallowed = Vec::new();
    let mut allowed = Vec::new();

    if warnings > 0 {
        let compiled: Vec<Regex> = allowed_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| BuildLogError::BadPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<_, _>>()?;

        for warning in scoped_warnings(output, marker) {
            let excused = compiled
                .iter()
                .any(|re| re.find(&warning).is_some_and(|m| m.start() == 0));
            if excused {
                allowed.push(warning);
            } else {
                disallowed.push(warning);
            }
        }
    }

    Ok(BuildEvaluation {
        errors,
        completed,
        disallowed,
        allowed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN: &str = "make all\n20:38:05 Build Finished. 0 errors, 0 warnings. (took 1s.835ms)\n";
    const FAILED: &str = "a.c:3: error: oops\n20:39:48 Build Failed. 3 errors, 0 warnings. (took 1s.78ms)\n";

    #[test]
    fn test_parse_summary() {
        assert_eq!(parse_summary(CLEAN), Some((0, 0)));
        assert_eq!(parse_summary(FAILED), Some((3, 0)));
        assert_eq!(parse_summary("gibberish"), None);
    }

    #[test]
    fn test_last_summary_wins() {
        let two = "Build Failed. 2 errors, 1 warnings.\nrebuild\nBuild Finished. 0 errors, 0 warnings.\n";
        assert_eq!(parse_summary(two), Some((0, 0)));
    }

    #[test]
    fn test_scoped_warnings_filter_by_marker() {
        let output = "\
../ra/fsp/src/r_gpt.c:42:1: warning: unused variable 'x' [-Wunused-variable]
../ra/aws/amazon-freertos/freertos_kernel/tasks.c:3932:39: warning: unused parameter 'pxTCB' [-Wunused-parameter]
\"/work/p0/ra/fsp/src/bsp.c\",4659  Warning[Pa082]: undefined behavior
Build Finished. 0 errors, 3 warnings.
";
        let scoped = scoped_warnings(output, "/fsp/");
        assert_eq!(scoped.len(), 2);
        assert!(scoped[0].contains("r_gpt.c"));
        assert!(scoped[1].contains("Pa082"));
    }

    #[test]
    fn test_allowed_warning_excluded_exactly_once() {
        let output = "\
../ra/fsp/src/r_gpt.c:42:1: warning: unused variable 'x' [-Wunused-variable]
Build Finished. 0 errors, 1 warnings.
";
        // Both patterns match the same warning; it must not be counted
        // twice, nor allowed twice.
        let patterns = vec![
            ".*unused variable.*".to_string(),
            ".*r_gpt.*".to_string(),
        ];
        let eval = evaluate(output, "/fsp/", &patterns).unwrap();
        assert_eq!(eval.completed, 1);
        assert!(eval.disallowed.is_empty());
        assert_eq!(eval.allowed.len(), 1);
    }

    #[test]
    fn test_allow_patterns_anchor_at_line_start() {
        let output = "\
../ra/fsp/src/r_gpt.c:42:1: warning: unused variable 'x'
Build Finished. 0 errors, 1 warnings.
";
        // Pattern matches mid-line only, so it must not excuse the warning.
        let patterns = vec!["warning: unused".to_string()];
        let eval = evaluate(output, "/fsp/", &patterns).unwrap();
        assert_eq!(eval.disallowed.len(), 1);
    }

    #[test]
    fn test_missing_summary_is_an_error() {
        assert!(matches!(
            evaluate("no trailer here", "/fsp/", &[]),
            Err(BuildLogError::MissingSummary)
        ));
    }

    #[test]
    fn test_bad_pattern_is_reported() {
        let patterns = vec!["([unclosed".to_string()];
        let output = "x.c: warning: y /fsp/\nBuild Finished. 0 errors, 1 warnings.\n";
        assert!(matches!(
            evaluate(output, "/fsp/", &patterns),
            Err(BuildLogError::BadPattern { .. })
        ));
    }
}
