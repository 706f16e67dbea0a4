//! lit - a parallel integrated-test driver
//!
//! Discovers directory trees of test artifacts, parses embedded RUN-line
//! directives, executes each test's shell sublanguage through an
//! in-process interpreter, enforces per-test timeouts, and reports
//! results as a human summary, JUnit XML, or JSON.

pub mod boolexpr;
pub mod cli;
pub mod config;
pub mod directives;
pub mod discovery;
pub mod error;
pub mod formats;
pub mod reporter;
pub mod scheduler;
pub mod shell;
pub mod test;

pub use config::{ConfigLoader, LitConfig, TableConfigLoader, TestingConfig};
pub use error::{LitError, LitResult};
pub use test::{ResultCode, Test, TestResult, TestSuite};
