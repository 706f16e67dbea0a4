//! Human-readable summary: a per-category list of test names in a fixed
//! title order, followed by a fixed-order count line. Ported from the
//! summary printer's output ordering described in spec.md §4.9 (the
//! original scatters this logic across `Main.cpp`'s completion handler).

use crate::test::{ResultCode, Test, TestResult};

pub struct SummaryOptions {
    pub quiet: bool,
}

const GROUP_TITLES: &[(ResultCode, &str)] = &[
    (ResultCode::Xpass, "Unexpected Passing Tests (XPASS)"),
    (ResultCode::Fail, "Failing Tests (FAIL)"),
    (ResultCode::Unresolved, "Unresolved Tests (UNRESOLVED)"),
    (ResultCode::Unsupported, "Unsupported Tests (UNSUPPORTED)"),
    (ResultCode::Xfail, "Expected Failing Tests (XFAIL)"),
    (ResultCode::Timeout, "Timed Out Tests (TIMEOUT)"),
];

const COUNT_LINES: &[(ResultCode, &str)] = &[
    (ResultCode::Pass, "Expected Passes"),
    (ResultCode::FlakyPass, "Passes With Retry"),
    (ResultCode::Xfail, "Expected Failures"),
    (ResultCode::Unsupported, "Unsupported Tests"),
    (ResultCode::Unresolved, "Unresolved Tests"),
    (ResultCode::Xpass, "Unexpected Passes"),
    (ResultCode::Fail, "Unexpected Failures"),
    (ResultCode::Timeout, "Individual Timeouts"),
];

fn is_failure_category(code: ResultCode) -> bool {
    code.is_failure()
}

pub fn render_summary(results: &[(Test, TestResult)], opts: &SummaryOptions) -> String {
    let mut out = String::new();

    for (code, title) in GROUP_TITLES {
        let names: Vec<String> = results.iter().filter(|(_, r)| r.code == *code).map(|(t, _)| t.display_name()).collect();
        if names.is_empty() {
            continue;
        }
        if opts.quiet && !is_failure_category(*code) {
            continue;
        }
        out.push_str(&format!("{title}:\n"));
        for name in &names {
            out.push_str(&format!("    {name}\n"));
        }
        out.push('\n');
    }

    for (code, label) in COUNT_LINES {
        let count = results.iter().filter(|(_, r)| r.code == *code).count();
        if count == 0 {
            continue;
        }
        if opts.quiet && !is_failure_category(*code) {
            continue;
        }
        out.push_str(&format!("{label:>24}: {count}\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TestingConfig;
    use crate::test::TestSuite;
    use std::sync::Arc;

    fn test_with(name: &str) -> Test {
        let config = Arc::new(TestingConfig::empty("suite"));
        let suite = Arc::new(TestSuite {
            id: 1,
            name: "suite".into(),
            source_root: std::path::PathBuf::from("/tmp"),
            exec_root: std::path::PathBuf::from("/tmp"),
            config: Arc::clone(&config),
        });
        Test::new(suite, vec![name.to_string()], config)
    }

    #[test]
    fn zero_count_categories_are_suppressed() {
        let results = vec![(test_with("a.test"), TestResult::new(ResultCode::Pass, ""))];
        let summary = render_summary(&results, &SummaryOptions { quiet: false });
        assert!(summary.contains("Expected Passes"));
        assert!(!summary.contains("Unexpected Failures"));
    }

    #[test]
    fn quiet_suppresses_non_failure_categories() {
        let results = vec![
            (test_with("a.test"), TestResult::new(ResultCode::Pass, "")),
            (test_with("b.test"), TestResult::new(ResultCode::Fail, "")),
        ];
        let summary = render_summary(&results, &SummaryOptions { quiet: true });
        assert!(!summary.contains("Expected Passes"));
        assert!(summary.contains("Unexpected Failures"));
        assert!(summary.contains("Failing Tests (FAIL)"));
    }

    #[test]
    fn failing_tests_listed_under_their_title() {
        let results = vec![(test_with("b.test"), TestResult::new(ResultCode::Fail, ""))];
        let summary = render_summary(&results, &SummaryOptions { quiet: false });
        assert!(summary.contains("Failing Tests (FAIL):"));
        assert!(summary.contains("suite::b.test"));
    }
}
