//! TestFormat: the strategy interface a test suite's `test_format`
//! resolves to. Discovery calls `get_tests_in_directory` only when a
//! format needs custom directory listing (`needSearchAgain`); the
//! scheduler calls `execute` once per discovered Test.

pub mod shtest;

use crate::config::LitConfig;
use crate::test::{Test, TestResult};

pub trait TestFormat: Send + Sync {
    fn needs_search_again(&self) -> bool {
        false
    }

    fn get_tests_in_directory(&self, _suite_dir: &std::path::Path, _lit_config: &LitConfig) -> Vec<Test> {
        Vec::new()
    }

    fn execute(&self, test: &Test, lit_config: &LitConfig) -> TestResult;
}

pub use shtest::ShTestFormat;
