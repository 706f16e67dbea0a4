//! GlobResolve: resolve a `*`/`?` argument against a working directory.
//!
//! Ported from `ShellCommands.cpp`'s `GlobItem::resolve`: joins a relative
//! pattern to `cwd`, expands it with POSIX glob semantics and tilde
//! expansion enabled, and — matching the shell's nullglob-off behavior —
//! falls back to the unexpanded joined path when nothing matches.

use std::path::{Path, PathBuf};

/// Expand a leading `~` or `~user` the way a POSIX shell's tilde expansion
/// would, for the plain `~` and `~/...` cases this crate needs.
fn expand_tilde(pattern: &str) -> String {
    if pattern == "~" {
        return std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
    }
    if let Some(rest) = pattern.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return format!("{}/{}", home.trim_end_matches('/'), rest);
        }
    }
    pattern.to_string()
}

/// Resolve a glob pattern against `cwd`. Returns the list of matching paths
/// as strings, or a single-element vector containing the unexpanded joined
/// path if nothing matched.
pub fn resolve(pattern: &str, cwd: &Path) -> Vec<String> {
    let expanded = expand_tilde(pattern);
    let joined: PathBuf = if Path::new(&expanded).is_absolute() {
        PathBuf::from(&expanded)
    } else {
        cwd.join(&expanded)
    };
    let joined_str = joined.to_string_lossy().to_string();

    let matches: Vec<String> = match glob::glob(&joined_str) {
        Ok(paths) => paths
            .filter_map(|r| r.ok())
            .map(|p| p.to_string_lossy().to_string())
            .collect(),
        Err(_) => Vec::new(),
    };

    if matches.is_empty() {
        vec![joined_str]
    } else {
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn no_match_returns_unexpanded_joined_path() {
        let dir = std::env::temp_dir().join("lit_glob_test_nomatch");
        let _ = fs::create_dir_all(&dir);
        let result = resolve("*.nonexistent_ext_zzz", &dir);
        assert_eq!(result.len(), 1);
        assert!(result[0].ends_with("*.nonexistent_ext_zzz"));
    }

    #[test]
    fn relative_pattern_is_joined_to_cwd() {
        let dir = std::env::temp_dir().join("lit_glob_test_join");
        let _ = fs::create_dir_all(&dir);
        fs::write(dir.join("a.txt"), "").unwrap();
        let result = resolve("*.txt", &dir);
        assert_eq!(result.len(), 1);
        assert!(result[0].ends_with("a.txt"));
    }
}
