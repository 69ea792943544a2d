//! Configuration System
//!
//! Layered configuration, lowest to highest precedence: built-in defaults, the
//! global file, the workspace file, then `LAKELOG__*` environment variables.

use crate::error::LakeError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod merge;
mod sources;

pub use sources::global_file::global_config_path;
pub use sources::workspace_file::workspace_config_dir;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LakelogConfig {
    #[serde(default)]
    pub lake: LakeSettings,

    #[serde(default)]
    pub head: HeadSettings,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LakeSettings {
    /// Lake directory. Relative paths are taken from the workspace root.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadSettings {
    /// HEAD file. Relative paths are taken from the workspace root.
    #[serde(default = "default_head_file")]
    pub file: PathBuf,
}

fn default_head_file() -> PathBuf {
    PathBuf::from(crate::head::HEAD_FILE_NAME)
}

impl Default for HeadSettings {
    fn default() -> Self {
        Self {
            file: default_head_file(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Require a token on every command that opens the lake.
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub tokens: Vec<TokenEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntry {
    pub token: String,
    pub tenant_id: String,
    pub user_id: String,
}

impl LakelogConfig {
    /// Lake directory for `workspace_root`.
    ///
    /// Falls back to the per-user data directory, then `.lakelog/lake` in the
    /// workspace.
    pub fn lake_path(&self, workspace_root: &Path) -> PathBuf {
        match &self.lake.path {
            Some(path) => workspace_root.join(path),
            None => directories::ProjectDirs::from("", "", "lakelog")
                .map(|dirs| dirs.data_dir().join("lake"))
                .unwrap_or_else(|| workspace_config_dir(workspace_root).join("lake")),
        }
    }

    pub fn head_path(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(&self.head.file)
    }

    pub fn validate(&self) -> Result<(), LakeError> {
        if self.head.file.as_os_str().is_empty() {
            return Err(LakeError::ConfigError("head.file cannot be empty".to_string()));
        }
        if self.auth.enabled && self.auth.tokens.is_empty() {
            return Err(LakeError::ConfigError(
                "auth is enabled but no tokens are configured".to_string(),
            ));
        }
        if self.auth.tokens.iter().any(|t| t.token.is_empty()) {
            return Err(LakeError::ConfigError("auth tokens cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Loads [`LakelogConfig`] from its layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for `workspace_root`.
    pub fn load(workspace_root: &Path) -> Result<LakelogConfig, LakeError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = merge::merge_policy::add_environment(builder);

        let config: LakelogConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from one explicit file, still honoring the
    /// environment layer.
    pub fn load_from_file(path: &Path) -> Result<LakelogConfig, LakeError> {
        if !path.exists() {
            return Err(LakeError::ConfigError(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let builder = merge::merge_policy::builder_with_defaults()?
            .add_source(config::File::from(path).required(true));
        let builder = merge::merge_policy::add_environment(builder);

        let config: LakelogConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}
