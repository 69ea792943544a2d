//! Commit Object Store
//!
//! Write-once key/value storage for commit objects, keyed by time-sortable
//! commit identifiers. The store assigns identifiers itself so that two
//! writers never contend for the same key.

pub mod persistence;

pub use persistence::{decode_commit, encode_commit, SledObjectStore};

use crate::commit::{Commit, NewCommit};
use crate::error::StorageError;
use crate::types::CommitId;

/// Object store interface
pub trait ObjectStore {
    /// Assign a fresh identifier to `commit` and store it durably.
    ///
    /// The object is fully visible to readers once this returns and is never
    /// overwritten afterwards.
    fn put(&self, commit: NewCommit) -> Result<CommitId, StorageError>;

    /// Retrieve the stored bytes of a commit together with the decoded commit.
    ///
    /// Fails with `CommitNotFound` for unknown identifiers and `Corrupt` when
    /// the stored bytes do not decode to a commit with the requested id.
    fn get_bytes(&self, id: &CommitId) -> Result<(Vec<u8>, Commit), StorageError>;

    fn contains(&self, id: &CommitId) -> Result<bool, StorageError>;

    fn get(&self, id: &CommitId) -> Result<Commit, StorageError> {
        self.get_bytes(id).map(|(_, commit)| commit)
    }
}

impl<T: ObjectStore + ?Sized> ObjectStore for &T {
    fn put(&self, commit: NewCommit) -> Result<CommitId, StorageError> {
        (**self).put(commit)
    }

    fn get_bytes(&self, id: &CommitId) -> Result<(Vec<u8>, Commit), StorageError> {
        (**self).get_bytes(id)
    }

    fn contains(&self, id: &CommitId) -> Result<bool, StorageError> {
        (**self).contains(id)
    }
}
