//! Integration tests for layered configuration

use crate::integration::test_utils::with_xdg_env;
use lakelog::config::{global_config_path, ConfigLoader};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_global_config_is_read() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("ws");
    fs::create_dir_all(&workspace).unwrap();

    let config = with_xdg_env(&test_dir, || {
        let global = global_config_path().unwrap();
        fs::create_dir_all(global.parent().unwrap()).unwrap();
        fs::write(&global, "[lake]\npath = \"/from/global\"\n").unwrap();
        ConfigLoader::load(&workspace).unwrap()
    });
    assert_eq!(config.lake.path, Some(PathBuf::from("/from/global")));
}

#[test]
fn test_environment_overrides_files() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("ws");
    fs::create_dir_all(workspace.join(".lakelog")).unwrap();
    fs::write(
        workspace.join(".lakelog").join("config.toml"),
        "[lake]\npath = \"/from/workspace\"\n",
    )
    .unwrap();

    let config = with_xdg_env(&test_dir, || {
        std::env::set_var("LAKELOG__LAKE__PATH", "/from/env");
        let config = ConfigLoader::load(&workspace);
        std::env::remove_var("LAKELOG__LAKE__PATH");
        config.unwrap()
    });
    assert_eq!(config.lake.path, Some(PathBuf::from("/from/env")));
}

#[test]
fn test_default_lake_path_uses_data_dir() {
    let test_dir = TempDir::new().unwrap();
    let workspace = test_dir.path().join("ws");
    fs::create_dir_all(&workspace).unwrap();

    let (config, lake_path, data_home) = with_xdg_env(&test_dir, || {
        let config = ConfigLoader::load(&workspace).unwrap();
        let lake_path = config.lake_path(&workspace);
        (
            config,
            lake_path,
            PathBuf::from(std::env::var("XDG_DATA_HOME").unwrap()),
        )
    });
    if cfg!(target_os = "linux") {
        assert_eq!(lake_path, data_home.join("lakelog").join("lake"));
    }
    assert!(lake_path.ends_with("lake"));
    assert_eq!(config.head_path(&workspace), workspace.join(".lakelog_head"));
}
