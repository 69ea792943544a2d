//! HEAD State
//!
//! The default pool and branch of a working context. Commands that take an
//! optional reference fall back to HEAD when the reference omits the pool.

use crate::error::HeadError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Default HEAD file name, relative to the working directory.
pub const HEAD_FILE_NAME: &str = ".lakelog_head";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Head {
    pub pool: String,
    pub branch: String,
}

impl Head {
    pub fn new(pool: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            pool: pool.into(),
            branch: branch.into(),
        }
    }
}

impl fmt::Display for Head {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.pool, self.branch)
    }
}

/// Persisted HEAD pointer.
pub trait HeadStore {
    /// Fails with [`HeadError::Unset`] when HEAD was never written.
    fn read(&self) -> Result<Head, HeadError>;

    fn write(&self, head: &Head) -> Result<(), HeadError>;
}

impl<T: HeadStore + ?Sized> HeadStore for &T {
    fn read(&self) -> Result<Head, HeadError> {
        (**self).read()
    }

    fn write(&self, head: &Head) -> Result<(), HeadError> {
        (**self).write(head)
    }
}

/// HEAD kept in a small TOML file.
///
/// Writes go through a temp file in the same directory and an atomic rename,
/// so a reader sees either the old or the new HEAD.
#[derive(Debug, Clone)]
pub struct HeadFile {
    path: PathBuf,
}

impl HeadFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// HEAD file of a working directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(HEAD_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HeadStore for HeadFile {
    fn read(&self) -> Result<Head, HeadError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(HeadError::Unset),
            Err(e) => return Err(HeadError::IoError(e)),
        };
        let head: Head = toml::from_str(&contents).map_err(|e| HeadError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        if head.pool.is_empty() || head.branch.is_empty() {
            return Err(HeadError::Corrupt {
                path: self.path.clone(),
                reason: "pool and branch must be non-empty".to_string(),
            });
        }
        Ok(head)
    }

    fn write(&self, head: &Head) -> Result<(), HeadError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let body = toml::to_string(head).map_err(|e| HeadError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(body.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| HeadError::IoError(e.error))?;

        info!(head = %head, path = ?self.path, "wrote HEAD");
        Ok(())
    }
}

/// In-memory HEAD, used for per-invocation overrides and tests.
#[derive(Debug, Default)]
pub struct MemoryHead {
    head: RwLock<Option<Head>>,
}

impl MemoryHead {
    pub fn new(head: Option<Head>) -> Self {
        Self {
            head: RwLock::new(head),
        }
    }
}

impl HeadStore for MemoryHead {
    fn read(&self) -> Result<Head, HeadError> {
        self.head.read().clone().ok_or(HeadError::Unset)
    }

    fn write(&self, head: &Head) -> Result<(), HeadError> {
        *self.head.write() = Some(head.clone());
        Ok(())
    }
}
