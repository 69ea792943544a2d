//! Commit Objects
//!
//! Immutable records of a change to a pool. Each commit names its parent, so
//! the commits of a branch form a chain from the branch leaf back to the root
//! commit written when the pool was created.

pub mod reader;
pub mod record;

pub use reader::LogReader;
pub use record::{CommitRecord, RecordFormat, RecordWriter};

use crate::types::{CommitId, ObjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Descriptor of a data object added by a commit. The object bytes live
/// outside the commit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataObject {
    pub id: ObjectId,
    pub size: u64,
    pub count: u64,
}

/// One change record in a commit payload.
///
/// The log stores and replays actions without interpreting them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Add { object: DataObject },
    Delete { object: ObjectId },
    AddVector { object: ObjectId },
    DeleteVector { object: ObjectId },
    Meta { key: String, value: String },
}

/// Payload supplied by a writer. The lake stamps the date and parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    pub author: String,
    pub message: String,
    pub actions: Vec<Action>,
}

impl Payload {
    pub fn new(author: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            message: message.into(),
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }
}

/// A commit that has not been assigned an identifier yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommit {
    pub parent: CommitId,
    pub author: String,
    pub date: DateTime<Utc>,
    pub message: String,
    pub actions: Vec<Action>,
}

impl NewCommit {
    pub fn new(parent: CommitId, payload: Payload) -> Self {
        Self {
            parent,
            author: payload.author,
            date: Utc::now(),
            message: payload.message,
            actions: payload.actions,
        }
    }
}

/// Commit object as stored in the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: CommitId,
    pub parent: CommitId,
    pub author: String,
    pub date: DateTime<Utc>,
    pub message: String,
    pub actions: Vec<Action>,
}

impl Commit {
    pub fn from_new(id: CommitId, new: NewCommit) -> Self {
        Self {
            id,
            parent: new.parent,
            author: new.author,
            date: new.date,
            message: new.message,
            actions: new.actions,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_nil()
    }
}
