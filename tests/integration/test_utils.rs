//! Shared test utilities for integration tests

use lakelog::{CancelToken, Lake, Payload, PoolId, MAIN_BRANCH};
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

/// Serializes tests that change process environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Environment variable state to restore after test
struct EnvState {
    vars: Vec<(&'static str, Option<String>)>,
}

impl EnvState {
    fn capture(names: &[&'static str]) -> Self {
        Self {
            vars: names
                .iter()
                .map(|name| (*name, std::env::var(name).ok()))
                .collect(),
        }
    }

    fn restore(self) {
        for (name, value) in self.vars {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
    }
}

/// Run `f` with XDG_CONFIG_HOME and XDG_DATA_HOME pointed into `test_dir`.
pub fn with_xdg_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let state = EnvState::capture(&["XDG_CONFIG_HOME", "XDG_DATA_HOME"]);

    let config_home = test_dir.path().join("xdg_config");
    let data_home = test_dir.path().join("xdg_data");
    std::fs::create_dir_all(&config_home).unwrap();
    std::fs::create_dir_all(&data_home).unwrap();
    std::env::set_var("XDG_CONFIG_HOME", &config_home);
    std::env::set_var("XDG_DATA_HOME", &data_home);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));
    state.restore();
    match result {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// A fresh lake with one pool.
pub fn lake_with_pool(dir: &Path, pool: &str) -> (Lake, PoolId) {
    let lake = Lake::init(&dir.join("lake")).unwrap();
    let pool = lake.create_pool(pool).unwrap().id;
    (lake, pool)
}

/// Append `n` commits to main, returning their messages newest first.
pub fn commit_n(lake: &Lake, pool: &PoolId, n: usize) -> Vec<String> {
    let cancel = CancelToken::new();
    let mut messages: Vec<String> = (0..n)
        .map(|i| {
            let message = format!("commit {}", i);
            lake.commit(pool, MAIN_BRANCH, Payload::new("tester", &message), &cancel)
                .unwrap();
            message
        })
        .collect();
    messages.reverse();
    messages
}
