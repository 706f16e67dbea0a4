//! Discovery: walks input paths, resolves the inheritable TestingConfig
//! frame at every directory, and constructs the final Test list.
//!
//! Ported from `Discovery.cpp`. The original resolves a directory's config
//! by dlopen'ing a compiled "CfgSetter"; here that's `LitConfig::config_loader`
//! (a `ConfigLoader`, §6 ambient) invoked with the config file's path.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{LitConfig, TestingConfig};
use crate::test::{SuiteId, Test, TestSuite};

const SITE_CONFIG_NAMES: &[&str] = &["lit.site.cfg"];
const ROOT_CONFIG_NAMES: &[&str] = &["lit.cfg"];
const LOCAL_CONFIG_NAME: &str = "lit.local.cfg";
const SKIP_DIR_NAMES: &[&str] = &["Output", ".svn", ".git"];

/// Resolve `@file` input lists into a flat list of plain input paths.
fn expand_inputs(inputs: &[String]) -> std::io::Result<Vec<String>> {
    let mut out = Vec::new();
    for input in inputs {
        if let Some(list_path) = input.strip_prefix('@') {
            let contents = fs::read_to_string(list_path)?;
            out.extend(contents.lines().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()));
        } else {
            out.push(input.clone());
        }
    }
    Ok(out)
}

fn find_config_file(dir: &Path, names: &[&str]) -> Option<PathBuf> {
    for name in names {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Walk up from `start` looking for a site config, else a root config.
/// Returns the config file path and the directory that contains it.
fn find_suite_config(start: &Path) -> Option<(PathBuf, PathBuf)> {
    let mut dir = if start.is_dir() { start.to_path_buf() } else { start.parent()?.to_path_buf() };
    loop {
        if let Some(cfg) = find_config_file(&dir, SITE_CONFIG_NAMES) {
            return Some((cfg, dir));
        }
        if let Some(cfg) = find_config_file(&dir, ROOT_CONFIG_NAMES) {
            return Some((cfg, dir));
        }
        match dir.parent() {
            Some(parent) if parent != dir => dir = parent.to_path_buf(),
            _ => return None,
        }
    }
}

pub struct Discovery<'a> {
    lit_config: &'a LitConfig,
    config_map: Option<&'a HashMap<PathBuf, PathBuf>>,
    next_suite_id: SuiteId,
    suite_cache: HashMap<PathBuf, Arc<TestSuite>>,
    tests: Vec<Test>,
}

impl<'a> Discovery<'a> {
    fn translate(&self, path: &Path) -> PathBuf {
        self.config_map.and_then(|m| m.get(path)).cloned().unwrap_or_else(|| path.to_path_buf())
    }

    fn load_suite(&mut self, config_path: &Path, config_dir: &Path) -> std::io::Result<Arc<TestSuite>> {
        let canonical = fs::canonicalize(config_dir)?;
        if let Some(existing) = self.suite_cache.get(&canonical) {
            return Ok(Arc::clone(existing));
        }
        let mut cfg = TestingConfig::empty(config_dir.file_name().and_then(|n| n.to_str()).unwrap_or("suite"));
        let load_path = self.translate(config_path);
        if let Err(e) = self.lit_config.config_loader.load(&load_path, &mut cfg, self.lit_config) {
            self.lit_config.warning(&format!("error loading config {}: {e}", load_path.display()));
        }
        let source_root = cfg.test_source_root.clone().unwrap_or_else(|| config_dir.to_path_buf());
        let exec_root = cfg.test_exec_root.clone().unwrap_or_else(|| config_dir.to_path_buf());
        let id = self.next_suite_id;
        self.next_suite_id += 1;
        let suite = Arc::new(TestSuite { id, name: cfg.name.clone(), source_root, exec_root, config: Arc::new(cfg) });
        self.suite_cache.insert(canonical, Arc::clone(&suite));
        Ok(suite)
    }

    fn descend(&mut self, suite: &Arc<TestSuite>, dir: &Path, config: &TestingConfig) -> std::io::Result<()> {
        let mut config = config.clone();
        if let Some(local) = find_config_file(dir, &[LOCAL_CONFIG_NAME]) {
            if let Err(e) = self.lit_config.config_loader.load(&self.translate(&local), &mut config, self.lit_config) {
                self.lit_config.warning(&format!("error loading local config {}: {e}", local.display()));
            }
        }

        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                self.lit_config.warning(&format!("cannot read directory {}: {e}", dir.display()));
                return Ok(());
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            if config.excludes.contains(&name) {
                continue;
            }
            if path.is_dir() {
                if SKIP_DIR_NAMES.contains(&name.as_str()) {
                    continue;
                }
                if let Some((nested_cfg_path, nested_dir)) = find_config_file(&path, SITE_CONFIG_NAMES)
                    .map(|p| (p, path.clone()))
                    .or_else(|| find_config_file(&path, ROOT_CONFIG_NAMES).map(|p| (p, path.clone())))
                {
                    let nested_canonical = fs::canonicalize(&nested_dir)?;
                    let current_canonical = fs::canonicalize(dir)?;
                    if nested_canonical == current_canonical {
                        continue;
                    }
                    let nested_suite = self.load_suite(&nested_cfg_path, &nested_dir)?;
                    let nested_config = Arc::clone(&nested_suite.config);
                    self.descend(&nested_suite, &nested_dir, &nested_config)?;
                    continue;
                }
                self.descend(suite, &path, &config)?;
            } else {
                if name.starts_with('.') {
                    continue;
                }
                let suffix = path.extension().and_then(|e| e.to_str()).unwrap_or("");
                if !config.suffixes.contains(suffix) {
                    continue;
                }
                let rel = path.strip_prefix(&suite.source_root).unwrap_or(&path);
                let path_in_suite: Vec<String> = rel.components().map(|c| c.as_os_str().to_string_lossy().to_string()).collect();
                let test = Test::new(Arc::clone(suite), path_in_suite, Arc::new(config.clone()));
                self.tests.push(test);
            }
        }
        Ok(())
    }

    fn discover_one(&mut self, input: &str) -> std::io::Result<()> {
        let path = PathBuf::from(input);
        let canonical = match fs::canonicalize(&path) {
            Ok(p) => p,
            Err(_) => {
                self.lit_config.warning(&format!("no such input: {input}"));
                return Ok(());
            }
        };
        let Some((config_path, config_dir)) = find_suite_config(&canonical) else {
            self.lit_config.warning(&format!("{input} is not inside any test suite"));
            return Ok(());
        };
        let suite = self.load_suite(&config_path, &config_dir)?;
        let config = Arc::clone(&suite.config);
        if canonical.is_dir() {
            self.descend(&suite, &canonical, &config)?;
        } else {
            let suffix = canonical.extension().and_then(|e| e.to_str()).unwrap_or("");
            if config.suffixes.contains(suffix) {
                let rel = canonical.strip_prefix(&suite.source_root).unwrap_or(&canonical);
                let path_in_suite: Vec<String> =
                    rel.components().map(|c| c.as_os_str().to_string_lossy().to_string()).collect();
                self.tests.push(Test::new(Arc::clone(&suite), path_in_suite, Arc::new((*config).clone())));
            }
        }
        Ok(())
    }
}

/// Entry point: discover every test reachable from `inputs`.
pub fn discover_tests(
    inputs: &[String],
    lit_config: &LitConfig,
    config_map: Option<&HashMap<PathBuf, PathBuf>>,
) -> std::io::Result<Vec<Test>> {
    let mut discovery =
        Discovery { lit_config, config_map, next_suite_id: 0, suite_cache: HashMap::new(), tests: Vec::new() };
    for input in expand_inputs(inputs)? {
        discovery.discover_one(&input)?;
    }
    Ok(discovery.tests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableConfigLoader;
    use std::sync::Arc as StdArc;

    fn lit_config_with(loader: TableConfigLoader) -> LitConfig {
        LitConfig::new(StdArc::new(loader))
    }

    #[test]
    fn discovers_tests_matching_configured_suffix() {
        let dir = std::env::temp_dir().join("lit_discovery_test_basic");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("lit.cfg"), "").unwrap();
        fs::write(dir.join("a.test"), "RUN: true\n").unwrap();
        fs::write(dir.join("b.txt"), "not a test\n").unwrap();

        let mut loader = TableConfigLoader::new();
        let cfg_path = fs::canonicalize(&dir).unwrap().join("lit.cfg");
        loader.register(cfg_path, |cfg, _lit| {
            cfg.suffixes.insert("test".to_string());
        });
        let lit_config = lit_config_with(loader);

        let tests = discover_tests(&[dir.to_string_lossy().to_string()], &lit_config, None).unwrap();
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].path_in_suite, vec!["a.test".to_string()]);
    }

    #[test]
    fn skips_output_and_dotted_directories() {
        let dir = std::env::temp_dir().join("lit_discovery_test_skip");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("Output")).unwrap();
        fs::create_dir_all(dir.join(".git")).unwrap();
        fs::write(dir.join("lit.cfg"), "").unwrap();
        fs::write(dir.join("Output").join("skip.test"), "").unwrap();

        let mut loader = TableConfigLoader::new();
        let cfg_path = fs::canonicalize(&dir).unwrap().join("lit.cfg");
        loader.register(cfg_path, |cfg, _lit| {
            cfg.suffixes.insert("test".to_string());
        });
        let lit_config = lit_config_with(loader);

        let tests = discover_tests(&[dir.to_string_lossy().to_string()], &lit_config, None).unwrap();
        assert!(tests.is_empty());
    }
}
