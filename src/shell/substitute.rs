//! Substituter: rewrites one RUN line before it is parsed.
//!
//! Strips `%dbg(...)` markers (used by some test suites purely to label a
//! RUN line in failure output, never meaningful to the shell) and then
//! applies an ordered list of regex substitutions — the default sigils
//! (`%s`, `%S`, `%t`, `%T`, `%p`, `%{pathsep}`) followed by any extras a
//! `TestingConfig` contributes. Order matters: a later pattern can match
//! text a config substitution just inserted.

use lazy_static::lazy_static;
use regex_lite::Regex;

use crate::error::LitError;

lazy_static! {
    static ref DBG_MARKER: Regex = Regex::new(r"%dbg\([^)]*\)").unwrap();
}

/// One (pattern, replacement) pair, applied in the order it appears in the
/// owning list.
#[derive(Debug, Clone)]
pub struct Substitution {
    pub pattern: String,
    pub replacement: String,
}

impl Substitution {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self { pattern: pattern.into(), replacement: replacement.into() }
    }

    fn literal(sigil: &str, replacement: impl Into<String>) -> Self {
        Self { pattern: regex_lite::escape(sigil), replacement: replacement.into() }
    }
}

/// Build the default substitution list for one test: `%s`/`%p` resolve to
/// the source path/directory, `%t`/`%T` to a private scratch file/dir,
/// `%{pathsep}` to the platform path list separator.
pub fn default_substitutions(
    source_path: &str,
    source_dir: &str,
    temp_file: &str,
    temp_dir: &str,
) -> Vec<Substitution> {
    let pathsep = if cfg!(windows) { ";" } else { ":" };
    vec![
        Substitution::literal("%s", source_path),
        Substitution::literal("%S", source_dir),
        Substitution::literal("%t", temp_file),
        Substitution::literal("%T", temp_dir),
        Substitution::literal("%p", source_dir),
        Substitution::literal("%{pathsep}", pathsep),
    ]
}

/// Strip `%dbg(...)` markers, then apply `subs` in order, replacing every
/// match of each pattern in turn.
pub fn apply(line: &str, subs: &[Substitution]) -> Result<String, LitError> {
    let mut out = DBG_MARKER.replace_all(line, "").into_owned();
    for sub in subs {
        let re = Regex::new(&sub.pattern)
            .map_err(|e| LitError::value(format!("bad substitution pattern '{}': {e}", sub.pattern)))?;
        out = re.replace_all(&out, sub.replacement.as_str()).into_owned();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_dbg_marker() {
        let subs = default_substitutions("/src/a.test", "/src", "/tmp/a.test.tmp", "/tmp");
        let out = apply("%dbg(run: 1) echo hi", &subs).unwrap();
        assert_eq!(out, " echo hi");
    }

    #[test]
    fn default_sigils_substitute_in_order() {
        let subs = default_substitutions("/src/a.test", "/src", "/tmp/a.test.tmp", "/tmp");
        let out = apply("cat %s > %t", &subs).unwrap();
        assert_eq!(out, "cat /src/a.test > /tmp/a.test.tmp");
    }

    #[test]
    fn extra_config_substitution_applies_after_defaults() {
        let mut subs = default_substitutions("/src/a.test", "/src", "/tmp/a.test.tmp", "/tmp");
        subs.push(Substitution::new(r"FOO", "bar"));
        let out = apply("%s FOO", &subs).unwrap();
        assert_eq!(out, "/src/a.test bar");
    }

    #[test]
    fn pathsep_substitutes_to_platform_separator() {
        let subs = default_substitutions("/src/a.test", "/src", "/tmp/a.test.tmp", "/tmp");
        let out = apply("PATH=a%{pathsep}b", &subs).unwrap();
        let expected = if cfg!(windows) { "PATH=a;b" } else { "PATH=a:b" };
        assert_eq!(out, expected);
    }
}
