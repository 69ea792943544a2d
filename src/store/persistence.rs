//! Persistence layer for the commit object store

use crate::commit::{Commit, NewCommit};
use crate::error::StorageError;
use crate::store::ObjectStore;
use crate::types::{CommitId, IdGenerator, PoolId};
use tracing::{debug, warn};

const COMMIT_FORMAT_V1: u32 = 1;
const ENVELOPE_HEADER_LEN: usize = 4 + 32;

/// Serialize a commit into its stored envelope.
///
/// Envelope: 4-byte format version, 32-byte blake3 digest of the body, then
/// the bincode body.
pub fn encode_commit(commit: &Commit) -> Result<Vec<u8>, StorageError> {
    let body = bincode::serialize(commit).map_err(|e| {
        StorageError::Serialization(format!("commit {}: {}", commit.id, e))
    })?;
    let digest = blake3::hash(&body);

    let mut bytes = Vec::with_capacity(ENVELOPE_HEADER_LEN + body.len());
    bytes.extend_from_slice(&COMMIT_FORMAT_V1.to_le_bytes());
    bytes.extend_from_slice(digest.as_bytes());
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

/// Decode a stored envelope, verifying version and digest.
pub fn decode_commit(bytes: &[u8]) -> Result<Commit, StorageError> {
    if bytes.len() < ENVELOPE_HEADER_LEN {
        return Err(StorageError::Corrupt(format!(
            "commit envelope too short ({} bytes)",
            bytes.len()
        )));
    }
    let version = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if version != COMMIT_FORMAT_V1 {
        return Err(StorageError::Corrupt(format!(
            "unsupported commit format version {}",
            version
        )));
    }
    let body = &bytes[ENVELOPE_HEADER_LEN..];
    if blake3::hash(body).as_bytes() != &bytes[4..ENVELOPE_HEADER_LEN] {
        return Err(StorageError::Corrupt("commit digest mismatch".to_string()));
    }
    bincode::deserialize(body)
        .map_err(|e| StorageError::Corrupt(format!("failed to deserialize commit: {}", e)))
}

/// Sled-based implementation of ObjectStore
///
/// One sled tree per pool, keyed by the big-endian commit id so that tree
/// order is creation order.
#[derive(Clone)]
pub struct SledObjectStore {
    tree: sled::Tree,
    ids: IdGenerator,
}

impl SledObjectStore {
    pub fn tree_name(pool: &PoolId) -> String {
        format!("pool:{}:commits", pool)
    }

    /// Open the commit tree of `pool` inside `db`.
    pub fn open(db: &sled::Db, pool: &PoolId, ids: IdGenerator) -> Result<Self, StorageError> {
        let tree = db.open_tree(Self::tree_name(pool))?;
        Ok(Self { tree, ids })
    }

    /// Get the underlying sled tree (for advanced operations)
    pub fn tree(&self) -> &sled::Tree {
        &self.tree
    }

    /// Number of commits in the store
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// A fresh id strictly greater than `after`, so parents always sort
    /// before their children.
    ///
    /// The generator only orders ids within one process. A lake reopened after
    /// the clock stepped back can hold commits newer than now, and children of
    /// those get the next id after their parent instead.
    fn id_after(&self, after: CommitId) -> Result<CommitId, StorageError> {
        let id = self.ids.commit_id();
        if id > after {
            return Ok(id);
        }
        after
            .ulid()
            .increment()
            .map(CommitId::from_ulid)
            .ok_or_else(|| StorageError::Corrupt(format!("no commit id after {}", after)))
    }
}

impl ObjectStore for SledObjectStore {
    fn put(&self, commit: NewCommit) -> Result<CommitId, StorageError> {
        if !commit.parent.is_nil() && !self.contains(&commit.parent)? {
            return Err(StorageError::CommitNotFound(commit.parent));
        }

        let mut stored = Commit::from_new(self.id_after(commit.parent)?, commit);
        loop {
            let value = encode_commit(&stored)?;
            let key = stored.id.to_bytes();
            match self
                .tree
                .compare_and_swap(key, None as Option<&[u8]>, Some(value))?
            {
                Ok(()) => break,
                Err(_) => {
                    // Ids bumped past the same parent can collide; ids are write-once.
                    warn!(commit = %stored.id, "commit id already taken, reassigning");
                    stored.id = self.id_after(stored.id)?;
                }
            }
        }

        self.tree.flush()?;
        debug!(commit = %stored.id, parent = %stored.parent, "stored commit");
        Ok(stored.id)
    }

    fn get_bytes(&self, id: &CommitId) -> Result<(Vec<u8>, Commit), StorageError> {
        let value = self
            .tree
            .get(id.to_bytes())?
            .ok_or(StorageError::CommitNotFound(*id))?;
        let commit = decode_commit(&value)?;
        if commit.id != *id {
            return Err(StorageError::Corrupt(format!(
                "object stored under {} claims id {}",
                id, commit.id
            )));
        }
        Ok((value.to_vec(), commit))
    }

    fn contains(&self, id: &CommitId) -> Result<bool, StorageError> {
        Ok(self.tree.contains_key(id.to_bytes())?)
    }
}
