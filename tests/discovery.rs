use std::fs;
use std::sync::Arc;

use lit::config::{LitConfig, TableConfigLoader};
use lit::discovery::discover_tests;

fn lit_config_with(loader: TableConfigLoader) -> LitConfig {
    LitConfig::new(Arc::new(loader))
}

#[test]
fn local_config_applies_only_beneath_its_own_directory() {
    let dir = std::env::temp_dir().join("lit_it_discovery_local_cfg");
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(dir.join("sub")).unwrap();
    fs::write(dir.join("lit.cfg"), "").unwrap();
    fs::write(dir.join("sub").join("lit.local.cfg"), "").unwrap();
    fs::write(dir.join("top.test"), "").unwrap();
    fs::write(dir.join("sub").join("nested.test"), "").unwrap();

    let root_cfg_path = fs::canonicalize(&dir).unwrap().join("lit.cfg");
    let local_cfg_path = fs::canonicalize(&dir).unwrap().join("sub").join("lit.local.cfg");

    let mut loader = TableConfigLoader::new();
    loader.register(root_cfg_path, |cfg, _lit| {
        cfg.suffixes.insert("test".to_string());
    });
    loader.register(local_cfg_path, |cfg, _lit| {
        cfg.available_features.insert("sub-only".to_string());
    });
    let lit_config = lit_config_with(loader);

    let tests = discover_tests(&[dir.to_string_lossy().to_string()], &lit_config, None).unwrap();
    assert_eq!(tests.len(), 2);
    let nested = tests.iter().find(|t| t.path_in_suite.last().unwrap() == "nested.test").unwrap();
    let top = tests.iter().find(|t| t.path_in_suite.last().unwrap() == "top.test").unwrap();
    assert!(nested.config.available_features.contains("sub-only"));
    assert!(!top.config.available_features.contains("sub-only"));
}

#[test]
fn excluded_names_are_not_descended_into_or_collected() {
    let dir = std::env::temp_dir().join("lit_it_discovery_excludes");
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(dir.join("vendor")).unwrap();
    fs::write(dir.join("lit.cfg"), "").unwrap();
    fs::write(dir.join("vendor").join("skip.test"), "").unwrap();
    fs::write(dir.join("keep.test"), "").unwrap();

    let cfg_path = fs::canonicalize(&dir).unwrap().join("lit.cfg");
    let mut loader = TableConfigLoader::new();
    loader.register(cfg_path, |cfg, _lit| {
        cfg.suffixes.insert("test".to_string());
        cfg.excludes.insert("vendor".to_string());
    });
    let lit_config = lit_config_with(loader);

    let tests = discover_tests(&[dir.to_string_lossy().to_string()], &lit_config, None).unwrap();
    assert_eq!(tests.len(), 1);
    assert_eq!(tests[0].path_in_suite.last().unwrap(), "keep.test");
}
