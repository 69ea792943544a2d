//! Branch/Pool Registry
//!
//! Maps pool names to pool identifiers and, within a pool, branch names to
//! leaf commits. Branch pointers only move through a storage-level
//! compare-and-swap, so concurrent writers cannot lose each other's updates.

use crate::commit::{Commit, NewCommit, Payload};
use crate::error::StorageError;
use crate::store::{ObjectStore, SledObjectStore};
use crate::types::{CommitId, IdGenerator, PoolId, MAIN_BRANCH};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::transaction::{abort, TransactionError};
use sled::Transactional;
use tracing::{debug, info, warn};

const POOLS_TREE: &str = "pools";
const POOL_NAMES_TREE: &str = "pool_names";

/// Author recorded on the root commit written at pool creation.
pub const SYSTEM_AUTHOR: &str = "lakelog";

/// Message of the root commit written at pool creation.
pub const ROOT_MESSAGE: &str = "initialized pool";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub id: PoolId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub pool: PoolId,
    pub name: String,
    pub commit: CommitId,
}

/// What a reference within a pool names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Branch(String),
    Commit(CommitId),
}

/// Check a pool or branch name.
pub fn validate_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() || name.contains('@') || name.chars().any(char::is_whitespace) {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct Registry {
    db: sled::Db,
    pools: sled::Tree,
    names: sled::Tree,
    ids: IdGenerator,
}

impl Registry {
    pub fn open(db: &sled::Db, ids: IdGenerator) -> Result<Self, StorageError> {
        Ok(Self {
            db: db.clone(),
            pools: db.open_tree(POOLS_TREE)?,
            names: db.open_tree(POOL_NAMES_TREE)?,
            ids,
        })
    }

    fn branches_tree(&self, pool: &PoolId) -> Result<sled::Tree, StorageError> {
        Ok(self.db.open_tree(format!("pool:{}:branches", pool))?)
    }

    /// Create a pool with a root commit and a `main` branch pointing at it.
    pub fn create_pool(&self, name: &str) -> Result<PoolConfig, StorageError> {
        validate_name(name)?;

        let config = PoolConfig {
            id: self.ids.pool_id(),
            name: name.to_string(),
            created_at: Utc::now(),
        };

        if self.names.contains_key(name.as_bytes())? {
            return Err(StorageError::PoolExists(name.to_string()));
        }

        // The root commit goes first; an orphan root left by a failed create
        // is unreachable and harmless.
        let store = SledObjectStore::open(&self.db, &config.id, self.ids.clone())?;
        let root = store.put(NewCommit::new(
            CommitId::NIL,
            Payload::new(SYSTEM_AUTHOR, ROOT_MESSAGE),
        ))?;

        let record = bincode::serialize(&config)
            .map_err(|e| StorageError::Serialization(format!("pool {}: {}", name, e)))?;
        let id_key = config.id.to_bytes();
        let root_key = root.to_bytes();
        let branches = self.branches_tree(&config.id)?;

        // Record, `main` and name become visible together: whoever finds the
        // name finds a complete pool.
        (&self.pools, &branches, &self.names)
            .transaction(|(pools, branches, names)| {
                if names.get(name.as_bytes())?.is_some() {
                    return abort(StorageError::PoolExists(name.to_string()));
                }
                pools.insert(&id_key[..], record.as_slice())?;
                branches.insert(MAIN_BRANCH.as_bytes(), &root_key[..])?;
                names.insert(name.as_bytes(), &id_key[..])?;
                Ok(())
            })
            .map_err(|err| match err {
                TransactionError::Abort(err) => err,
                TransactionError::Storage(err) => StorageError::Database(err),
            })?;
        self.db.flush()?;

        info!(pool = %config.name, id = %config.id, root = %root, "created pool");
        Ok(config)
    }

    /// All pools, in creation order.
    pub fn pools(&self) -> Result<Vec<PoolConfig>, StorageError> {
        self.pools
            .iter()
            .values()
            .map(|value| decode_pool(&value?))
            .collect()
    }

    pub fn pool_config(&self, id: &PoolId) -> Result<PoolConfig, StorageError> {
        let value = self
            .pools
            .get(id.to_bytes())?
            .ok_or_else(|| StorageError::PoolNotFound(id.to_string()))?;
        decode_pool(&value)
    }

    /// Look up a pool by identifier, then by name.
    pub fn pool_id(&self, name_or_id: &str) -> Result<PoolId, StorageError> {
        if let Some(id) = PoolId::parse(name_or_id) {
            if self.pools.contains_key(id.to_bytes())? {
                return Ok(id);
            }
        }
        match self.names.get(name_or_id.as_bytes())? {
            Some(value) => PoolId::from_slice(&value).ok_or_else(|| {
                StorageError::Corrupt(format!("bad pool id under name {:?}", name_or_id))
            }),
            None => Err(StorageError::PoolNotFound(name_or_id.to_string())),
        }
    }

    fn ensure_pool(&self, pool: &PoolId) -> Result<(), StorageError> {
        if self.pools.contains_key(pool.to_bytes())? {
            Ok(())
        } else {
            Err(StorageError::PoolNotFound(pool.to_string()))
        }
    }

    /// Commit object store of `pool`.
    pub fn open_store(&self, pool: &PoolId) -> Result<SledObjectStore, StorageError> {
        self.ensure_pool(pool)?;
        SledObjectStore::open(&self.db, pool, self.ids.clone())
    }

    /// Create branch `name` in `pool` pointing at existing commit `at`.
    pub fn create_branch(
        &self,
        pool: &PoolId,
        name: &str,
        at: CommitId,
    ) -> Result<Branch, StorageError> {
        validate_name(name)?;
        let store = self.open_store(pool)?;
        if !store.contains(&at)? {
            return Err(StorageError::CommitNotFound(at));
        }

        let tree = self.branches_tree(pool)?;
        if tree
            .compare_and_swap(name, None as Option<&[u8]>, Some(&at.to_bytes()[..]))?
            .is_err()
        {
            return Err(StorageError::BranchExists {
                pool: *pool,
                branch: name.to_string(),
            });
        }
        tree.flush()?;

        info!(pool = %pool, branch = name, commit = %at, "created branch");
        Ok(Branch {
            pool: *pool,
            name: name.to_string(),
            commit: at,
        })
    }

    /// Branches of `pool`, sorted by name.
    pub fn branches(&self, pool: &PoolId) -> Result<Vec<Branch>, StorageError> {
        self.ensure_pool(pool)?;
        self.branches_tree(pool)?
            .iter()
            .map(|entry| {
                let (key, value) = entry?;
                let name = String::from_utf8(key.to_vec())
                    .map_err(|_| StorageError::Corrupt("branch name is not UTF-8".to_string()))?;
                let commit = decode_leaf(&name, &value)?;
                Ok(Branch {
                    pool: *pool,
                    name,
                    commit,
                })
            })
            .collect()
    }

    pub fn branch(&self, pool: &PoolId, name: &str) -> Result<Option<Branch>, StorageError> {
        self.ensure_pool(pool)?;
        match self.branches_tree(pool)?.get(name)? {
            Some(value) => Ok(Some(Branch {
                pool: *pool,
                name: name.to_string(),
                commit: decode_leaf(name, &value)?,
            })),
            None => Ok(None),
        }
    }

    /// Resolve a branch name or commit id within `pool`.
    ///
    /// Branch names win over commit ids.
    pub fn resolve_target(
        &self,
        pool: &PoolId,
        reference: &str,
    ) -> Result<(Target, Commit), StorageError> {
        let store = self.open_store(pool)?;
        if let Some(branch) = self.branch(pool, reference)? {
            let commit = store.get(&branch.commit)?;
            return Ok((Target::Branch(branch.name), commit));
        }
        if let Some(id) = CommitId::parse(reference) {
            if store.contains(&id)? {
                return Ok((Target::Commit(id), store.get(&id)?));
            }
        }
        Err(StorageError::NotFound {
            pool: *pool,
            reference: reference.to_string(),
        })
    }

    pub fn commit_object(&self, pool: &PoolId, reference: &str) -> Result<Commit, StorageError> {
        self.resolve_target(pool, reference).map(|(_, commit)| commit)
    }

    /// Move branch `name` from `expected` to `new` in one atomic step.
    ///
    /// Fails with `Conflict` if the branch no longer points at `expected`.
    pub fn advance_branch(
        &self,
        pool: &PoolId,
        name: &str,
        expected: CommitId,
        new: CommitId,
    ) -> Result<Branch, StorageError> {
        let store = self.open_store(pool)?;
        if !store.contains(&new)? {
            return Err(StorageError::CommitNotFound(new));
        }

        let tree = self.branches_tree(pool)?;
        let swapped = tree.compare_and_swap(
            name,
            Some(&expected.to_bytes()[..]),
            Some(&new.to_bytes()[..]),
        )?;
        if let Err(err) = swapped {
            return match err.current {
                None => Err(StorageError::BranchNotFound {
                    pool: *pool,
                    branch: name.to_string(),
                }),
                Some(current) => {
                    let actual = decode_leaf(name, &current)?;
                    warn!(pool = %pool, branch = name, expected = %expected, actual = %actual, "branch moved concurrently");
                    Err(StorageError::Conflict {
                        branch: name.to_string(),
                        expected,
                        actual: Some(actual),
                    })
                }
            };
        }
        tree.flush()?;

        debug!(pool = %pool, branch = name, from = %expected, to = %new, "advanced branch");
        Ok(Branch {
            pool: *pool,
            name: name.to_string(),
            commit: new,
        })
    }
}

fn decode_pool(bytes: &[u8]) -> Result<PoolConfig, StorageError> {
    bincode::deserialize(bytes)
        .map_err(|e| StorageError::Corrupt(format!("failed to deserialize pool: {}", e)))
}

fn decode_leaf(branch: &str, bytes: &[u8]) -> Result<CommitId, StorageError> {
    CommitId::from_slice(bytes)
        .ok_or_else(|| StorageError::Corrupt(format!("bad leaf for branch {:?}", branch)))
}
