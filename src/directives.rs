//! Directive scanning: pulls RUN lines and test metadata out of a source
//! file's trailing comments, and the UNSUPPORTED/XFAIL determination logic
//! that consults them after directives and after execution respectively.

use std::collections::HashSet;

use crate::boolexpr;
use crate::error::LitError;
use crate::test::ResultCode;

const RUN: &str = "RUN";
const XFAIL: &str = "XFAIL";
const REQUIRES_ANY: &str = "REQUIRES-ANY";
const REQUIRES: &str = "REQUIRES";
const UNSUPPORTED: &str = "UNSUPPORTED";
const END: &str = "END";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordKind {
    Tag,
    Command,
    List,
    BooleanExpr,
    Custom,
}

/// Result of scanning one test file for directives.
#[derive(Debug, Default, Clone)]
pub struct ScannedDirectives {
    pub run_lines: Vec<String>,
    pub xfails: Vec<String>,
    pub requires: Vec<String>,
    pub unsupported: Vec<String>,
    pub custom: std::collections::HashMap<String, Vec<String>>,
}

fn strip_comment_prefix<'a>(line: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    let trimmed = line.trim_start();
    for p in prefixes {
        if let Some(rest) = trimmed.strip_prefix(p) {
            return Some(rest.trim_start());
        }
    }
    None
}

fn split_comma_list(value: &str) -> Vec<String> {
    value.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
}

/// Scan `source` line by line for `KEYWORD:` directives found in comment
/// lines using one of `comment_prefixes`. `custom_keywords` are treated as
/// opaque CUSTOM-kind directives whose raw values are accumulated verbatim.
pub fn scan(source: &str, comment_prefixes: &[&str], custom_keywords: &[&str]) -> Result<ScannedDirectives, LitError> {
    let mut out = ScannedDirectives::default();
    let mut lines = source.lines();

    while let Some(raw_line) = lines.next() {
        let Some(rest) = strip_comment_prefix(raw_line, comment_prefixes) else {
            continue;
        };

        if let Some(value) = rest.strip_prefix(&format!("{RUN}:")) {
            let mut value = value.trim().to_string();
            loop {
                if let Some(stripped) = value.strip_suffix('\\') {
                    let mut accumulated = stripped.trim_end().to_string();
                    match lines.next() {
                        Some(cont) => {
                            accumulated.push(' ');
                            accumulated.push_str(cont.trim());
                            value = accumulated;
                        }
                        None => {
                            value = accumulated;
                            break;
                        }
                    }
                } else {
                    break;
                }
            }
            out.run_lines.push(value);
            continue;
        }
        if let Some(value) = rest.strip_prefix(&format!("{XFAIL}:")) {
            out.xfails.extend(split_comma_list(value));
            continue;
        }
        if let Some(value) = rest.strip_prefix(&format!("{REQUIRES_ANY}:")) {
            let parts = split_comma_list(value);
            if !parts.is_empty() {
                out.requires.push(parts.join(" || "));
            }
            continue;
        }
        if let Some(value) = rest.strip_prefix(&format!("{REQUIRES}:")) {
            out.requires.extend(split_comma_list(value));
            continue;
        }
        if let Some(value) = rest.strip_prefix(&format!("{UNSUPPORTED}:")) {
            out.unsupported.extend(split_comma_list(value));
            continue;
        }
        if rest.trim() == END || rest.starts_with(&format!("{END}:")) {
            break;
        }
        for kw in custom_keywords {
            if let Some(value) = rest.strip_prefix(&format!("{kw}:")) {
                out.custom.entry((*kw).to_string()).or_default().push(value.trim().to_string());
            }
        }
    }

    Ok(out)
}

/// Determine whether a test is UNSUPPORTED given its scanned requires,
/// the config's available/limited feature sets.
pub fn compute_unsupported(
    requires: &[String],
    unsupported: &[String],
    available_features: &HashSet<String>,
    limit_to_features: &HashSet<String>,
) -> Result<bool, LitError> {
    let features: Vec<&str> = available_features.iter().map(String::as_str).collect();

    for expr in requires {
        if !boolexpr::evaluate(expr, &features, "")? {
            return Ok(true);
        }
    }
    for expr in unsupported {
        if boolexpr::evaluate(expr, &features, "")? {
            return Ok(true);
        }
    }
    if !limit_to_features.is_empty() {
        let reduced: Vec<&str> =
            available_features.iter().filter(|f| limit_to_features.contains(*f)).map(String::as_str).collect();
        let mut any_true = false;
        for expr in requires {
            if boolexpr::evaluate(expr, &reduced, "")? {
                any_true = true;
                break;
            }
        }
        if !any_true {
            return Ok(true);
        }
    }
    Ok(false)
}

/// The subset of `requires` that evaluate false against `available_features`,
/// i.e. the ones actually responsible for an UNSUPPORTED verdict.
pub fn unmet_requires(requires: &[String], available_features: &HashSet<String>) -> Result<Vec<String>, LitError> {
    let features: Vec<&str> = available_features.iter().map(String::as_str).collect();
    let mut unmet = Vec::new();
    for expr in requires {
        if !boolexpr::evaluate(expr, &features, "")? {
            unmet.push(expr.clone());
        }
    }
    Ok(unmet)
}

/// Whether any XFAIL entry matches the available features; `*` matches
/// unconditionally without going through the BoolExpr grammar.
pub fn xfail_matches(xfails: &[String], available_features: &HashSet<String>) -> Result<bool, LitError> {
    let features: Vec<&str> = available_features.iter().map(String::as_str).collect();
    for expr in xfails {
        if expr.trim() == "*" || boolexpr::evaluate(expr, &features, "")? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Apply the PASS->XPASS / FAIL->XFAIL remap for a matched XFAIL entry;
/// every other result code (including UNRESOLVED, TIMEOUT) passes through.
pub fn remap_result_code(code: ResultCode, xfail_matched: bool) -> ResultCode {
    if !xfail_matched {
        return code;
    }
    match code {
        ResultCode::Pass => ResultCode::Xpass,
        ResultCode::Fail => ResultCode::Xfail,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_run_lines_with_continuation() {
        let src = "// RUN: echo a \\\n// RUN-EXTRA should not matter\n// RUN: echo b\n";
        let scanned = scan(src, &["//"], &[]).unwrap();
        assert_eq!(scanned.run_lines, vec!["echo a // RUN-EXTRA should not matter", "echo b"]);
    }

    #[test]
    fn requires_any_merges_into_requires_as_or() {
        let src = "// REQUIRES-ANY: a, b, c\n";
        let scanned = scan(src, &["//"], &[]).unwrap();
        assert_eq!(scanned.requires, vec!["a || b || c"]);
    }

    #[test]
    fn end_stops_further_scanning() {
        let src = "// RUN: echo a\n// END\n// RUN: echo b\n";
        let scanned = scan(src, &["//"], &[]).unwrap();
        assert_eq!(scanned.run_lines, vec!["echo a"]);
    }

    #[test]
    fn unsupported_when_a_require_is_false() {
        let available = HashSet::from(["linux".to_string()]);
        let limit = HashSet::new();
        let unsupported = compute_unsupported(&["windows".to_string()], &[], &available, &limit).unwrap();
        assert!(unsupported);
    }

    #[test]
    fn unsupported_when_unsupported_expr_is_true() {
        let available = HashSet::from(["linux".to_string()]);
        let limit = HashSet::new();
        let unsupported = compute_unsupported(&[], &["linux".to_string()], &available, &limit).unwrap();
        assert!(unsupported);
    }

    #[test]
    fn unmet_requires_excludes_satisfied_expressions() {
        let available = HashSet::from(["linux".to_string()]);
        let unmet = unmet_requires(&["linux".to_string(), "windows".to_string()], &available).unwrap();
        assert_eq!(unmet, vec!["windows".to_string()]);
    }

    #[test]
    fn xfail_wildcard_matches_unconditionally() {
        let available = HashSet::new();
        assert!(xfail_matches(&["*".to_string()], &available).unwrap());
    }

    #[test]
    fn remap_pass_to_xpass_on_xfail_match() {
        assert_eq!(remap_result_code(ResultCode::Pass, true), ResultCode::Xpass);
        assert_eq!(remap_result_code(ResultCode::Fail, true), ResultCode::Xfail);
        assert_eq!(remap_result_code(ResultCode::Unresolved, true), ResultCode::Unresolved);
        assert_eq!(remap_result_code(ResultCode::Pass, false), ResultCode::Pass);
    }
}
