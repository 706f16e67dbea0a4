//! TestingConfig: the inheritable per-directory configuration frame, and
//! the ambient `ConfigLoader`/`LitConfig` machinery that populates it.
//!
//! Ported from `TestingConfig.h`. The original loads each directory's
//! config by dlopen'ing a compiled "CfgSetter" shared library
//! (`CfgSetterPluginLoader.h`); per the REDESIGN FLAG in spec.md §9, this
//! crate replaces that with a `ConfigLoader` trait the embedder implements
//! in ordinary Rust and registers ahead of discovery.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::LitError;
use crate::shell::substitute::Substitution;
use crate::test::Test;

/// A test's parallelism group assignment: either a fixed name shared by
/// every test that inherits this config frame, or a function computing the
/// group name per-`Test` (e.g. keying off a substring of its path).
#[derive(Debug, Clone)]
pub enum ParallelismGroup {
    Fixed(String),
    Dynamic(fn(&Test) -> String),
}

impl ParallelismGroup {
    pub fn resolve(&self, test: &Test) -> String {
        match self {
            ParallelismGroup::Fixed(name) => name.clone(),
            ParallelismGroup::Dynamic(assign) => assign(test),
        }
    }
}

/// The inheritable configuration frame. Each directory's config file is
/// loaded into a fresh clone of the parent frame; mutating the clone never
/// touches the parent (`TestingConfig::child` is the only way to derive
/// one, and it always clones first).
#[derive(Debug, Clone)]
pub struct TestingConfig {
    pub name: String,
    pub suffixes: HashSet<String>,
    pub excludes: HashSet<String>,
    pub test_format: Option<String>,
    pub environment: Vec<(String, String)>,
    pub substitutions: Vec<Substitution>,
    pub available_features: HashSet<String>,
    pub limit_to_features: HashSet<String>,
    pub unsupported: bool,
    pub pipefail: bool,
    pub is_early: bool,
    pub parallelism_group: Option<ParallelismGroup>,
    pub extra_config: HashMap<String, String>,
    pub test_source_root: Option<PathBuf>,
    pub test_exec_root: Option<PathBuf>,
    pub max_individual_test_time: u64,
}

impl TestingConfig {
    /// An empty frame with no parent, used as the root of a discovery run
    /// before any per-directory config has been loaded into it.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            suffixes: HashSet::new(),
            excludes: HashSet::new(),
            test_format: None,
            environment: Vec::new(),
            substitutions: Vec::new(),
            available_features: HashSet::new(),
            limit_to_features: HashSet::new(),
            unsupported: false,
            pipefail: false,
            is_early: false,
            parallelism_group: None,
            extra_config: HashMap::new(),
            test_source_root: None,
            test_exec_root: None,
            max_individual_test_time: 0,
        }
    }

    /// Produce a fresh frame to load a subdirectory's config into. Cloning
    /// first is what makes the invariant "mutating a child never mutates
    /// its parent" hold trivially.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut c = self.clone();
        c.name = name.into();
        c
    }

}

/// Embedder callback invoked once per discovered config file. Replaces the
/// original's dlopen'd shared-library setter with an ordinary Rust trait
/// object the embedder registers ahead of a discovery run.
pub trait ConfigLoader: Send + Sync {
    fn load(&self, path: &Path, cfg: &mut TestingConfig, lit_config: &LitConfig) -> Result<(), LitError>;
}

/// A `ConfigLoader` backed by a fixed table of per-path setter closures,
/// registered by the embedder before calling `discover_tests`. Any path not
/// present in the table is a no-op load (the frame is inherited unchanged).
#[derive(Default)]
pub struct TableConfigLoader {
    setters: HashMap<PathBuf, Box<dyn Fn(&mut TestingConfig, &LitConfig) + Send + Sync>>,
}

impl TableConfigLoader {
    pub fn new() -> Self {
        Self { setters: HashMap::new() }
    }

    pub fn register(
        &mut self,
        path: impl Into<PathBuf>,
        setter: impl Fn(&mut TestingConfig, &LitConfig) + Send + Sync + 'static,
    ) {
        self.setters.insert(path.into(), Box::new(setter));
    }
}

impl ConfigLoader for TableConfigLoader {
    fn load(&self, path: &Path, cfg: &mut TestingConfig, lit_config: &LitConfig) -> Result<(), LitError> {
        if let Some(setter) = self.setters.get(path) {
            setter(cfg, lit_config);
        }
        Ok(())
    }
}

/// Process-wide knobs and the diagnostics sink threaded through discovery,
/// directive scanning, and shell execution in place of a global
/// `sg_litCfg` pointer (REDESIGN FLAG, spec.md §9).
pub struct LitConfig {
    pub is_debug: bool,
    pub is_quiet: bool,
    pub config_loader: Arc<dyn ConfigLoader>,
}

impl LitConfig {
    pub fn new(config_loader: Arc<dyn ConfigLoader>) -> Self {
        Self { is_debug: false, is_quiet: false, config_loader }
    }

    pub fn warning(&self, msg: &str) {
        eprintln!("lit: warning: {msg}");
    }

    pub fn note(&self, msg: &str) {
        if self.is_debug {
            eprintln!("lit: note: {msg}");
        }
    }
}
