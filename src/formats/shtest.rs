//! ShTest: the primary test format. Reads a test file's RUN lines,
//! substitutes and parses each one, and executes the resulting command
//! trees in source order through `ShellExec`, stopping at the first
//! nonzero exit — exactly the "shtest" format in upstream lit.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use super::TestFormat;
use crate::config::LitConfig;
use crate::directives::{self, ScannedDirectives};
use crate::scheduler::timer::TimeoutHelper;
use crate::shell::env::ShellEnvironment;
use crate::shell::exec::{ExecRecord, ShellExec};
use crate::shell::parser;
use crate::shell::substitute::{self, Substitution};
use crate::test::{ResultCode, Test, TestResult};

const DEFAULT_COMMENT_PREFIXES: &[&str] = &["//", "#", ";"];

pub struct ShTestFormat;

impl ShTestFormat {
    pub fn new() -> Self {
        Self
    }

    fn comment_prefixes(&self, test: &Test) -> Vec<String> {
        match test.config.extra_config.get("comment_prefixes") {
            Some(v) => v.split(',').map(|s| s.trim().to_string()).collect(),
            None => DEFAULT_COMMENT_PREFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn make_temp_paths(&self, test: &Test) -> (PathBuf, PathBuf) {
        let base = std::env::temp_dir().join("lit-tmp");
        let _ = std::fs::create_dir_all(&base);
        let stem = test.path_in_suite.last().cloned().unwrap_or_else(|| "test".to_string());
        let unique: u64 = rand::random();
        let temp_dir = base.join(format!("{stem}-{unique:016x}"));
        let _ = std::fs::create_dir_all(&temp_dir);
        let temp_file = temp_dir.join(format!("{stem}.tmp"));
        (temp_file, temp_dir)
    }

    fn substitutions_for(&self, test: &Test, temp_file: &PathBuf, temp_dir: &PathBuf) -> Vec<Substitution> {
        let source_path = test.source_path();
        let source_dir = source_path.parent().map(|p| p.to_path_buf()).unwrap_or_default();
        let mut subs = substitute::default_substitutions(
            &source_path.to_string_lossy(),
            &source_dir.to_string_lossy(),
            &temp_file.to_string_lossy(),
            &temp_dir.to_string_lossy(),
        );
        subs.extend(test.config.substitutions.iter().cloned());
        subs
    }
}

impl Default for ShTestFormat {
    fn default() -> Self {
        Self::new()
    }
}

fn format_record(record: &ExecRecord) -> String {
    let mut s = format!("$ {}\n", record.argv.join(" "));
    s.push_str(&record.stdout);
    s.push_str(&record.stderr);
    if record.exit_code != 0 {
        s.push_str(&format!("# exit code {}\n", record.exit_code));
    }
    s
}

impl TestFormat for ShTestFormat {
    fn execute(&self, test: &Test, lit_config: &LitConfig) -> TestResult {
        let start = Instant::now();
        let source_path = test.source_path();
        let source = match std::fs::read_to_string(&source_path) {
            Ok(s) => s,
            Err(e) => {
                return TestResult::new(ResultCode::Unresolved, format!("could not read test file: {e}"))
                    .with_elapsed(start.elapsed().as_secs_f64())
            }
        };

        let prefixes: Vec<&str> = self.comment_prefixes(test).iter().map(String::as_str).collect();
        let custom_keywords: Vec<&str> = Vec::new();
        let scanned: ScannedDirectives = match directives::scan(&source, &prefixes, &custom_keywords) {
            Ok(s) => s,
            Err(e) => {
                return TestResult::new(ResultCode::Unresolved, format!("error scanning directives: {e}"))
                    .with_elapsed(start.elapsed().as_secs_f64())
            }
        };

        let unsupported = match directives::compute_unsupported(
            &scanned.requires,
            &scanned.unsupported,
            &test.config.available_features,
            &test.config.limit_to_features,
        ) {
            Ok(b) => b,
            Err(e) => {
                return TestResult::new(ResultCode::Unresolved, format!("error evaluating requires: {e}"))
                    .with_elapsed(start.elapsed().as_secs_f64())
            }
        };
        if unsupported {
            let unmet = match directives::unmet_requires(&scanned.requires, &test.config.available_features) {
                Ok(u) => u,
                Err(e) => {
                    return TestResult::new(ResultCode::Unresolved, format!("error evaluating requires: {e}"))
                        .with_elapsed(start.elapsed().as_secs_f64())
                }
            };
            return TestResult::new(ResultCode::Unsupported, format!("Skipping because of: {}", unmet.join(", ")))
                .with_elapsed(start.elapsed().as_secs_f64());
        }

        if scanned.run_lines.is_empty() {
            return TestResult::new(ResultCode::Unresolved, "Test has no run line!")
                .with_elapsed(start.elapsed().as_secs_f64());
        }

        let (temp_file, temp_dir) = self.make_temp_paths(test);
        let subs = self.substitutions_for(test, &temp_file, &temp_dir);

        let exec_dir = test.suite.exec_root.clone();
        let mut env = ShellEnvironment::new(exec_dir, test.config.environment.clone());

        let timeout_secs = test.config.max_individual_test_time;
        let timeout_helper =
            if timeout_secs > 0 { Some(TimeoutHelper::new(Duration::from_secs(timeout_secs))) } else { None };
        if let Some(helper) = &timeout_helper {
            helper.start();
        }

        let mut all_records: Vec<ExecRecord> = Vec::new();
        let mut any_run_executed = false;
        let mut final_code = ResultCode::Pass;
        let mut diagnostic = String::new();

        for raw_line in &scanned.run_lines {
            let line = match substitute::apply(raw_line, &subs) {
                Ok(l) => l,
                Err(e) => {
                    final_code = if any_run_executed { ResultCode::Fail } else { ResultCode::Unresolved };
                    diagnostic = format!("shell parser error on: {raw_line}\n{e}");
                    break;
                }
            };
            let tree = match parser::parse(&line, cfg!(windows), test.config.pipefail) {
                Ok(t) => t,
                Err(e) => {
                    final_code = if any_run_executed { ResultCode::Fail } else { ResultCode::Unresolved };
                    diagnostic = format!("shell parser error on: {line}\n{e}");
                    break;
                }
            };

            let outcome = ShellExec::new(timeout_helper.clone()).execute(&tree, &mut env);
            any_run_executed = true;
            all_records.extend(outcome.records);

            if !outcome.diagnostic.is_empty() {
                final_code = if all_records.len() > 1 { ResultCode::Fail } else { ResultCode::Unresolved };
                diagnostic = outcome.diagnostic;
                break;
            }
            if outcome.exit_code != 0 {
                final_code = ResultCode::Fail;
                break;
            }
        }

        if let Some(helper) = &timeout_helper {
            helper.cancel();
        }

        let timed_out = timeout_helper.as_ref().map(|h| h.timeout_reached()).unwrap_or(false);
        if timed_out {
            final_code = ResultCode::Timeout;
        }

        let xfail_matched = directives::xfail_matches(&scanned.xfails, &test.config.available_features).unwrap_or(false);
        final_code = directives::remap_result_code(final_code, xfail_matched);

        let mut output = String::new();
        if !diagnostic.is_empty() {
            output.push_str(&diagnostic);
            output.push('\n');
        }
        if final_code.is_failure() || lit_config.is_debug {
            for record in &all_records {
                output.push_str(&format_record(record));
            }
        }

        let _ = std::fs::remove_dir_all(&temp_dir);

        TestResult::new(final_code, output).with_elapsed(start.elapsed().as_secs_f64())
    }
}
