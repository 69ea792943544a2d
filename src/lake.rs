//! Lake
//!
//! Entry point to a lake directory: opens the database, exposes the registry
//! and implements the writer path (append a commit, then advance the branch).

use crate::commit::{Commit, LogReader, NewCommit, Payload};
use crate::commitish::Resolver;
use crate::concurrency::CancelToken;
use crate::error::StorageError;
use crate::head::HeadStore;
use crate::registry::{Branch, PoolConfig, Registry, Target};
use crate::store::{ObjectStore, SledObjectStore};
use crate::types::{CommitId, IdGenerator, PoolId};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Name of the database directory inside a lake root.
pub const DB_DIR: &str = "db";

/// Longest [`Lake::open`] waits for another process to release the lake.
pub const LOCK_WAIT: Duration = Duration::from_secs(5);

const LOCK_BACKOFF_START: Duration = Duration::from_millis(10);
const LOCK_BACKOFF_MAX: Duration = Duration::from_millis(250);

pub struct Lake {
    root: PathBuf,
    db: sled::Db,
    registry: Registry,
}

impl Lake {
    /// Create the lake directory if needed and open it.
    pub fn init(root: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(root.join(DB_DIR))?;
        info!(path = ?root, "initialized lake");
        Self::open(root)
    }

    /// Open an existing lake. Fails with `NoLake` if `root` holds none.
    pub fn open(root: &Path) -> Result<Self, StorageError> {
        Self::open_with(root, &CancelToken::new())
    }

    /// Open an existing lake, waiting while another process holds it.
    ///
    /// The database admits one process at a time. Contention is retried with
    /// backoff until [`LOCK_WAIT`] passes or `cancel` fires, then reported as
    /// `Locked`.
    pub fn open_with(root: &Path, cancel: &CancelToken) -> Result<Self, StorageError> {
        let db_path = root.join(DB_DIR);
        if !db_path.is_dir() {
            return Err(StorageError::NoLake(root.to_path_buf()));
        }

        let deadline = Instant::now() + LOCK_WAIT;
        let mut backoff = LOCK_BACKOFF_START;
        let db = loop {
            match sled::open(&db_path) {
                Ok(db) => break db,
                Err(err) if is_lock_contention(&err) => {
                    let now = Instant::now();
                    if cancel.is_cancelled() || now >= deadline {
                        warn!(path = ?root, "lake is held by another process");
                        return Err(StorageError::Locked(root.to_path_buf()));
                    }
                    let pause = backoff.min(deadline - now);
                    debug!(path = ?root, pause = ?pause, "lake locked, retrying");
                    thread::sleep(pause);
                    backoff = (backoff * 2).min(LOCK_BACKOFF_MAX);
                }
                Err(err) => return Err(err.into()),
            }
        };

        let registry = Registry::open(&db, IdGenerator::new())?;
        Ok(Self {
            root: root.to_path_buf(),
            db,
            registry,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn create_pool(&self, name: &str) -> Result<PoolConfig, StorageError> {
        self.registry.create_pool(name)
    }

    pub fn pools(&self) -> Result<Vec<PoolConfig>, StorageError> {
        self.registry.pools()
    }

    pub fn pool_id(&self, name_or_id: &str) -> Result<PoolId, StorageError> {
        self.registry.pool_id(name_or_id)
    }

    pub fn commit_object(&self, pool: &PoolId, reference: &str) -> Result<Commit, StorageError> {
        self.registry.commit_object(pool, reference)
    }

    /// Create branch `name` at whatever `from` names in `pool`.
    pub fn create_branch(
        &self,
        pool: &PoolId,
        name: &str,
        from: &str,
    ) -> Result<Branch, StorageError> {
        let at = self.registry.commit_object(pool, from)?;
        self.registry.create_branch(pool, name, at.id)
    }

    /// Append a commit to `branch` and move the branch to it.
    ///
    /// A concurrent writer that moved the branch first makes this fail with
    /// `Conflict`; the new commit is then left unreferenced and the caller may
    /// retry against the new leaf.
    pub fn commit(
        &self,
        pool: &PoolId,
        branch: &str,
        payload: Payload,
        cancel: &CancelToken,
    ) -> Result<CommitId, StorageError> {
        cancel.check()?;
        let leaf = self
            .registry
            .branch(pool, branch)?
            .ok_or_else(|| StorageError::BranchNotFound {
                pool: *pool,
                branch: branch.to_string(),
            })?
            .commit;

        let store = self.registry.open_store(pool)?;
        cancel.check()?;
        let id = store.put(NewCommit::new(leaf, payload))?;

        cancel.check()?;
        match self.registry.advance_branch(pool, branch, leaf, id) {
            Ok(_) => {
                info!(pool = %pool, branch, commit = %id, parent = %leaf, "committed");
                Ok(id)
            }
            Err(err) => {
                warn!(pool = %pool, branch, commit = %id, error = %err, "commit not applied");
                Err(err)
            }
        }
    }

    /// History of `target` in `pool`, newest first, excluding `stop` and
    /// everything before it.
    pub fn log(
        &self,
        pool: &PoolId,
        target: &Target,
        stop: CommitId,
        cancel: CancelToken,
    ) -> Result<LogReader<SledObjectStore>, StorageError> {
        let leaf = match target {
            Target::Branch(name) => {
                self.registry
                    .branch(pool, name)?
                    .ok_or_else(|| StorageError::BranchNotFound {
                        pool: *pool,
                        branch: name.clone(),
                    })?
                    .commit
            }
            Target::Commit(id) => *id,
        };
        let store = self.registry.open_store(pool)?;
        Ok(LogReader::new(store, leaf, stop, cancel))
    }

    pub fn resolver<H: HeadStore>(&self, head: H) -> Resolver<'_, H> {
        Resolver::new(&self.registry, head)
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

/// sled reports a lock file held elsewhere as an I/O error.
fn is_lock_contention(err: &sled::Error) -> bool {
    match err {
        sled::Error::Io(e) => {
            e.kind() == io::ErrorKind::WouldBlock || e.to_string().contains("could not acquire lock")
        }
        _ => false,
    }
}
