use std::path::PathBuf;
use std::sync::Arc;

use lit::config::TestingConfig;
use lit::reporter::{render_json, render_junit, render_summary, SummaryOptions};
use lit::test::{ResultCode, Test, TestResult, TestSuite};

fn test_with(suite_name: &str, path: &str) -> Test {
    let config = Arc::new(TestingConfig::empty(suite_name));
    let suite = Arc::new(TestSuite {
        id: 1,
        name: suite_name.into(),
        source_root: PathBuf::from("/tmp"),
        exec_root: PathBuf::from("/tmp"),
        config: Arc::clone(&config),
    });
    Test::new(suite, vec![path.to_string()], config)
}

#[test]
fn all_three_reporters_agree_on_pass_fail_counts() {
    let results = vec![
        (test_with("suite", "a.test"), TestResult::new(ResultCode::Pass, "").with_elapsed(0.1)),
        (test_with("suite", "b.test"), TestResult::new(ResultCode::Fail, "boom").with_elapsed(0.2)),
        (test_with("suite", "c.test"), TestResult::new(ResultCode::Unsupported, "Skipping because of: x").with_elapsed(0.0)),
    ];

    let summary = render_summary(&results, &SummaryOptions { quiet: false });
    assert!(summary.contains("Expected Passes"));
    assert!(summary.contains("Unexpected Failures"));
    assert!(summary.contains("Unsupported Tests"));

    let xml = render_junit(&results);
    assert!(xml.contains("tests=\"3\""));
    assert!(xml.contains("failures=\"1\""));
    assert!(xml.contains("skipped=\"1\""));

    let json = render_json("1.0.0", 0.3, &results);
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["tests"].as_array().unwrap().len(), 3);
    let codes: Vec<&str> = parsed["tests"].as_array().unwrap().iter().map(|t| t["code"].as_str().unwrap()).collect();
    assert!(codes.contains(&"PASS"));
    assert!(codes.contains(&"FAIL"));
    assert!(codes.contains(&"UNSUPPORTED"));
}

#[test]
fn multiple_suites_each_get_their_own_junit_testsuite_element() {
    let results = vec![
        (test_with("suite-a", "a.test"), TestResult::new(ResultCode::Pass, "")),
        (test_with("suite-b", "b.test"), TestResult::new(ResultCode::Pass, "")),
    ];
    let xml = render_junit(&results);
    assert_eq!(xml.matches("<testsuite ").count(), 2);
}
