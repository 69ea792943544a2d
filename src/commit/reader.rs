//! Log Reader
//!
//! Streams the history of a branch by following parent links from a leaf
//! commit. Records are produced lazily, one fetch per step, so a reader over a
//! long history holds a single commit in memory at a time.

use crate::commit::CommitRecord;
use crate::concurrency::CancelToken;
use crate::error::StorageError;
use crate::store::ObjectStore;
use crate::types::CommitId;
use tracing::debug;

/// Cursor over a commit chain, newest first.
///
/// Yields commits from `leaf` back to the root, or up to but excluding `stop`
/// when a stop commit is given. `None` marks the end of the history; errors are
/// yielded as `Some(Err(_))` and end the iteration.
///
/// The store gives every child an id greater than its parent, so a parent
/// that does not sort below its child means the chain is damaged. That check
/// also rules out cycles without remembering visited commits.
pub struct LogReader<S: ObjectStore> {
    store: S,
    cursor: CommitId,
    stop: CommitId,
    cancel: CancelToken,
    started: bool,
    fused: bool,
}

impl<S: ObjectStore> LogReader<S> {
    /// Pass `CommitId::NIL` as `stop` to read to the root.
    pub fn new(store: S, leaf: CommitId, stop: CommitId, cancel: CancelToken) -> Self {
        let cursor = if leaf == stop { CommitId::NIL } else { leaf };
        Self {
            store,
            cursor,
            stop,
            cancel,
            started: false,
            fused: false,
        }
    }

    /// Commit the next call to `next` will fetch, or `NIL` once exhausted.
    pub fn cursor(&self) -> CommitId {
        self.cursor
    }

    fn step(&mut self) -> Result<CommitRecord, StorageError> {
        self.cancel.check()?;

        let at = self.cursor;
        let commit = match self.store.get(&at) {
            Ok(commit) => commit,
            Err(err) if !self.started => return Err(err),
            Err(StorageError::Cancelled) => return Err(StorageError::Cancelled),
            Err(err) => {
                return Err(StorageError::BrokenChain {
                    at,
                    reason: format!("parent unreadable: {}", err),
                })
            }
        };

        self.started = true;
        if !commit.parent.is_nil() && commit.parent >= commit.id {
            return Err(StorageError::BrokenChain {
                at,
                reason: format!("parent {} does not precede its child", commit.parent),
            });
        }

        self.cursor = if commit.parent == self.stop {
            CommitId::NIL
        } else {
            commit.parent
        };
        debug!(commit = %commit.id, next = %self.cursor, "log step");
        Ok(CommitRecord::from(&commit))
    }
}

impl<S: ObjectStore> Iterator for LogReader<S> {
    type Item = Result<CommitRecord, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused || self.cursor.is_nil() {
            return None;
        }
        let result = self.step();
        if result.is_err() {
            self.fused = true;
        }
        Some(result)
    }
}

impl<S: ObjectStore> std::iter::FusedIterator for LogReader<S> {}
