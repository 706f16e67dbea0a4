//! Reporter: groups completed (Test, Result) pairs by ResultCode and
//! renders them as a human summary, JUnit XML, or JSON — the three output
//! shapes spec.md §4.9 names.

pub mod json;
pub mod junit;
pub mod summary;

pub use json::render_json;
pub use junit::render_junit;
pub use summary::{render_summary, SummaryOptions};
