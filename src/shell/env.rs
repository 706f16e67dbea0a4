//! ShellEnvironment: the scoped cwd/env pair mutated by `cd`/`export`
//! built-ins during one command-tree execution. The parent process
//! environment is never mutated.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ShellEnvironment {
    pub cwd: PathBuf,
    /// Ordered KEY=VAL pairs; later entries for the same key shadow earlier
    /// ones on lookup, but insertion order is preserved for iteration.
    pub env: Vec<(String, String)>,
}

impl ShellEnvironment {
    pub fn new(cwd: impl Into<PathBuf>, env: Vec<(String, String)>) -> Self {
        Self { cwd: cwd.into(), env }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.env.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        if let Some(entry) = self.env.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value.to_string();
        } else {
            self.env.push((key.to_string(), value.to_string()));
        }
    }

    pub fn unset(&mut self, key: &str) {
        self.env.retain(|(k, _)| k != key);
    }

    pub fn as_os_env(&self) -> Vec<(String, String)> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for (k, v) in self.env.iter().rev() {
            if seen.insert(k.clone()) {
                out.push((k.clone(), v.clone()));
            }
        }
        out.reverse();
        out
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.cwd.join(p)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_overrides_existing_key_in_place() {
        let mut e = ShellEnvironment::new("/tmp", vec![("A".into(), "1".into())]);
        e.set("A", "2");
        assert_eq!(e.get("A"), Some("2"));
        assert_eq!(e.env.len(), 1);
    }

    #[test]
    fn unset_removes_key() {
        let mut e = ShellEnvironment::new("/tmp", vec![("A".into(), "1".into())]);
        e.unset("A");
        assert_eq!(e.get("A"), None);
    }
}
