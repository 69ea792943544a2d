//! Lakelog: versioned commit log for a data lake
//!
//! An append-only log of immutable commit objects, organized into named
//! branches within pools, plus a local HEAD pointer that lets tooling work
//! against a default pool and branch.

pub mod auth;
pub mod cli;
pub mod commit;
pub mod commitish;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod head;
pub mod lake;
pub mod logging;
pub mod registry;
pub mod store;
pub mod types;

pub use commit::{Action, Commit, CommitRecord, DataObject, LogReader, Payload};
pub use commitish::{Commitish, Resolved, Resolver, Target};
pub use concurrency::CancelToken;
pub use error::{ErrorKind, HeadError, LakeError, StorageError};
pub use head::{Head, HeadFile, HeadStore, MemoryHead};
pub use lake::Lake;
pub use registry::{Branch, PoolConfig, Registry};
pub use store::{ObjectStore, SledObjectStore};
pub use types::{CommitId, IdGenerator, ObjectId, PoolId, MAIN_BRANCH};
