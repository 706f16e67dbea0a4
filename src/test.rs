//! Test identity and result types. Ported from `Test.h`: `ResultCode` keeps
//! its closed set of outcomes and `is_failure` predicate, `Result` keeps the
//! "constructed empty, filled exactly once" contract, and `Test` keeps
//! identity as `(suite, path_in_suite)` plus the xfail/requires/unsupported
//! boolean-expression lists scanned by the directive parser.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::config::TestingConfig;

/// Closed outcome set for a single test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResultCode {
    Pass,
    FlakyPass,
    Xfail,
    Fail,
    Xpass,
    Unresolved,
    Unsupported,
    Timeout,
}

impl ResultCode {
    pub fn name(self) -> &'static str {
        match self {
            ResultCode::Pass => "PASS",
            ResultCode::FlakyPass => "FLAKYPASS",
            ResultCode::Xfail => "XFAIL",
            ResultCode::Fail => "FAIL",
            ResultCode::Xpass => "XPASS",
            ResultCode::Unresolved => "UNRESOLVED",
            ResultCode::Unsupported => "UNSUPPORTED",
            ResultCode::Timeout => "TIMEOUT",
        }
    }

    pub fn is_failure(self) -> bool {
        matches!(self, ResultCode::Fail | ResultCode::Xpass | ResultCode::Unresolved | ResultCode::Timeout)
    }
}

/// A metric attached to a Result: most test formats only ever report plain
/// numbers, but some (micro-benchmarks embedded in a test) report JSON blobs.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Integer(i64),
    Real(f64),
    Json(serde_json::Value),
}

/// A single test's outcome. Constructed via `Result::new` with no code set
/// conceptually by the caller assigning every field once, before it is
/// published through the scheduler's completion callback.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    pub code: ResultCode,
    pub output: String,
    pub elapsed: Option<f64>,
    pub metrics: BTreeMap<String, MetricValue>,
    pub micro_results: BTreeMap<String, TestResult>,
}

impl TestResult {
    pub fn new(code: ResultCode, output: impl Into<String>) -> Self {
        Self { code, output: output.into(), elapsed: None, metrics: BTreeMap::new(), micro_results: BTreeMap::new() }
    }

    pub fn with_elapsed(mut self, elapsed: f64) -> Self {
        self.elapsed = Some(elapsed);
        self
    }
}

/// Stable per-process suite identity, assigned monotonically at discovery.
pub type SuiteId = u64;

#[derive(Debug)]
pub struct TestSuite {
    pub id: SuiteId,
    pub name: String,
    pub source_root: PathBuf,
    pub exec_root: PathBuf,
    pub config: Arc<TestingConfig>,
}

/// One discovered test: identity is `(suite.id, path_in_suite)`.
#[derive(Debug, Clone)]
pub struct Test {
    pub suite: Arc<TestSuite>,
    pub path_in_suite: Vec<String>,
    pub config: Arc<TestingConfig>,
    pub file_path: Option<PathBuf>,
    pub xfails: Vec<String>,
    pub requires: Vec<String>,
    pub unsupported: Vec<String>,
    pub result: Option<TestResult>,
}

impl Test {
    pub fn new(suite: Arc<TestSuite>, path_in_suite: Vec<String>, config: Arc<TestingConfig>) -> Self {
        Self {
            suite,
            path_in_suite,
            config,
            file_path: None,
            xfails: Vec::new(),
            requires: Vec::new(),
            unsupported: Vec::new(),
            result: None,
        }
    }

    /// Dotted display name, e.g. `my-suite::a/b.test`.
    pub fn display_name(&self) -> String {
        format!("{}::{}", self.suite.name, self.path_in_suite.join("/"))
    }

    pub fn source_path(&self) -> PathBuf {
        self.file_path.clone().unwrap_or_else(|| {
            let mut p = self.suite.source_root.clone();
            for component in &self.path_in_suite {
                p.push(component);
            }
            p
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TestingConfig;

    #[test]
    fn failure_set_matches_spec() {
        assert!(ResultCode::Fail.is_failure());
        assert!(ResultCode::Xpass.is_failure());
        assert!(ResultCode::Unresolved.is_failure());
        assert!(ResultCode::Timeout.is_failure());
        assert!(!ResultCode::Pass.is_failure());
        assert!(!ResultCode::Xfail.is_failure());
        assert!(!ResultCode::Unsupported.is_failure());
        assert!(!ResultCode::FlakyPass.is_failure());
    }

    #[test]
    fn display_name_joins_suite_and_path() {
        let config = Arc::new(TestingConfig::empty("site"));
        let suite = Arc::new(TestSuite {
            id: 1,
            name: "suite".into(),
            source_root: PathBuf::from("/src"),
            exec_root: PathBuf::from("/exec"),
            config: Arc::clone(&config),
        });
        let test = Test::new(suite, vec!["a".into(), "b.test".into()], config);
        assert_eq!(test.display_name(), "suite::a/b.test");
    }
}
