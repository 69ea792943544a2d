//! Error types for the lake commit log.

use crate::types::{CommitId, PoolId};
use std::path::PathBuf;
use thiserror::Error;

/// Storage-related errors: object store, branch registry and log traversal.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("pool not found: {0}")]
    PoolNotFound(String),

    #[error("branch \"{branch}\" not found in pool {pool}")]
    BranchNotFound { pool: PoolId, branch: String },

    #[error("commit not found: {0}")]
    CommitNotFound(CommitId),

    #[error("\"{reference}\" is neither a branch nor a commit in pool {pool}")]
    NotFound { pool: PoolId, reference: String },

    #[error("no lake at {0}")]
    NoLake(PathBuf),

    #[error("pool already exists: {0}")]
    PoolExists(String),

    #[error("branch \"{branch}\" already exists in pool {pool}")]
    BranchExists { pool: PoolId, branch: String },

    #[error("invalid name {0:?}: names must be non-empty and contain no '@' or whitespace")]
    InvalidName(String),

    #[error("branch \"{branch}\" moved: expected {expected}, found {}", display_leaf(.actual))]
    Conflict {
        branch: String,
        expected: CommitId,
        actual: Option<CommitId>,
    },

    #[error("corrupt object: {0}")]
    Corrupt(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("lake at {0} is in use by another process")]
    Locked(PathBuf),

    #[error("broken commit chain at {at}: {reason}")]
    BrokenChain { at: CommitId, reason: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

fn display_leaf(leaf: &Option<CommitId>) -> String {
    match leaf {
        Some(id) => id.to_string(),
        None => "no branch".to_string(),
    }
}

/// HEAD state errors.
#[derive(Debug, Error)]
pub enum HeadError {
    #[error("HEAD is unset")]
    Unset,

    #[error("HEAD file {path:?} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("HEAD I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors surfaced to lake clients (CLI and RPC boundary).
#[derive(Debug, Error)]
pub enum LakeError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("default pool unset")]
    NoDefaultPool,

    #[error("default pool and branch unset")]
    HeadUnset,

    #[error("{0}")]
    Head(HeadError),

    #[error("too many arguments")]
    TooManyArguments,

    #[error("invalid reference {reference:?}: {reason}")]
    InvalidReference { reference: String, reason: String },

    #[error("invalid argument {argument:?}: {reason}")]
    InvalidArgument { argument: String, reason: String },

    #[error("HEAD is at commit {0}, not a branch; use a branch to commit")]
    DetachedHead(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Error classes of the lake taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Exists,
    Corrupt,
    Unset,
    InvalidReference,
    InvalidArgument,
    Unauthorized,
    /// The lake is held by another process.
    Busy,
    Cancelled,
    Internal,
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::PoolNotFound(_)
            | StorageError::BranchNotFound { .. }
            | StorageError::CommitNotFound(_)
            | StorageError::NotFound { .. }
            | StorageError::NoLake(_) => ErrorKind::NotFound,
            StorageError::PoolExists(_) | StorageError::BranchExists { .. } => ErrorKind::Exists,
            StorageError::InvalidName(_) => ErrorKind::InvalidReference,
            StorageError::Conflict { .. } => ErrorKind::Conflict,
            StorageError::Corrupt(_) | StorageError::BrokenChain { .. } => ErrorKind::Corrupt,
            StorageError::Cancelled => ErrorKind::Cancelled,
            StorageError::Locked(_) => ErrorKind::Busy,
            StorageError::Serialization(_)
            | StorageError::Database(_) | StorageError::IoError(_) => ErrorKind::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl LakeError {
    pub fn invalid_argument(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        LakeError::InvalidArgument {
            argument: argument.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_reference(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        LakeError::InvalidReference {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LakeError::Storage(e) => e.kind(),
            LakeError::NoDefaultPool | LakeError::HeadUnset => ErrorKind::Unset,
            LakeError::Head(HeadError::Unset) => ErrorKind::Unset,
            LakeError::Head(HeadError::Corrupt { .. }) => ErrorKind::Corrupt,
            LakeError::Head(HeadError::IoError(_)) => ErrorKind::Internal,
            LakeError::TooManyArguments
            | LakeError::InvalidReference { .. }
            | LakeError::DetachedHead(_) => ErrorKind::InvalidReference,
            LakeError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            LakeError::Unauthorized(_) => ErrorKind::Unauthorized,
            LakeError::ConfigError(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status an RPC boundary reports for this error.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict | ErrorKind::Exists => 409,
            ErrorKind::Unset => 412,
            ErrorKind::InvalidReference | ErrorKind::InvalidArgument => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Cancelled => 499,
            ErrorKind::Busy => 503,
            ErrorKind::Corrupt | ErrorKind::Internal => 500,
        }
    }
}

impl From<HeadError> for LakeError {
    fn from(err: HeadError) -> Self {
        match err {
            HeadError::Unset => LakeError::HeadUnset,
            other => LakeError::Head(other),
        }
    }
}

impl From<config::ConfigError> for LakeError {
    fn from(err: config::ConfigError) -> Self {
        LakeError::ConfigError(err.to_string())
    }
}
