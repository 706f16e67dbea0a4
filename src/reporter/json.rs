//! JSON result output: `{engineVersion, elapsed, tests:[...]}` per
//! spec.md §4.9, built with `serde_json` the same way the teacher
//! codebase's `--json` flag serializes its interpreter output.

use serde::Serialize;
use serde_json::json;

use crate::test::{Test, TestResult};

#[derive(Serialize)]
struct JsonTest {
    name: String,
    code: &'static str,
    output: String,
    elapse: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "microTests")]
    micro_tests: Option<Vec<JsonTest>>,
}

fn to_json_test(test: &Test, result: &TestResult) -> JsonTest {
    JsonTest {
        name: test.display_name(),
        code: result.code.name(),
        output: result.output.clone(),
        elapse: result.elapsed.unwrap_or(0.0),
        metrics: if result.metrics.is_empty() { None } else { serde_json::to_value(&result.metrics).ok() },
        micro_tests: if result.micro_results.is_empty() {
            None
        } else {
            Some(
                result
                    .micro_results
                    .iter()
                    .map(|(name, r)| JsonTest {
                        name: name.clone(),
                        code: r.code.name(),
                        output: r.output.clone(),
                        elapse: r.elapsed.unwrap_or(0.0),
                        metrics: None,
                        micro_tests: None,
                    })
                    .collect(),
            )
        },
    }
}

pub fn render_json(engine_version: &str, elapsed: f64, results: &[(Test, TestResult)]) -> String {
    let tests: Vec<JsonTest> = results.iter().map(|(t, r)| to_json_test(t, r)).collect();
    let doc = json!({
        "engineVersion": engine_version,
        "elapsed": elapsed,
        "tests": tests,
    });
    serde_json::to_string_pretty(&doc).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TestingConfig;
    use crate::test::{ResultCode, TestSuite};
    use std::sync::Arc;

    #[test]
    fn renders_name_code_and_elapse() {
        let config = Arc::new(TestingConfig::empty("suite"));
        let suite = Arc::new(TestSuite {
            id: 1,
            name: "suite".into(),
            source_root: std::path::PathBuf::from("/tmp"),
            exec_root: std::path::PathBuf::from("/tmp"),
            config: Arc::clone(&config),
        });
        let test = Test::new(suite, vec!["a.test".into()], config);
        let result = TestResult::new(ResultCode::Pass, "").with_elapsed(0.25);
        let out = render_json("1.0.0", 1.5, &[(test, result)]);
        assert!(out.contains("\"name\": \"suite::a.test\""));
        assert!(out.contains("\"code\": \"PASS\""));
        assert!(out.contains("\"elapse\": 0.25"));
    }
}
