//! Commit-ish references and their resolution.
//!
//! A reference names a pool, a branch within it, or a commit:
//!
//! ```text
//! pool            main branch of pool
//! pool@branch     branch (or commit id) within pool
//! @branch         branch (or commit id) within HEAD's pool
//! commit-id       commit within HEAD's pool, when no pool has that name or id
//! ```

use crate::error::{HeadError, LakeError, StorageError};
use crate::head::{Head, HeadStore};
use crate::registry::Registry;
use crate::store::ObjectStore;
use crate::types::{CommitId, PoolId, MAIN_BRANCH};
use std::fmt;
use tracing::debug;

pub use crate::registry::Target;

/// A parsed reference. Either side may be empty until resolved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Commitish {
    pub pool: String,
    pub branch: String,
}

impl Commitish {
    pub fn parse(s: &str) -> Result<Self, LakeError> {
        if s.is_empty() {
            return Err(LakeError::invalid_reference(s, "empty reference"));
        }
        if s.chars().any(char::is_whitespace) {
            return Err(LakeError::invalid_reference(s, "whitespace in reference"));
        }
        let mut parts = s.split('@');
        let pool = parts.next().unwrap_or_default();
        let branch = parts.next();
        if parts.next().is_some() {
            return Err(LakeError::invalid_reference(s, "more than one '@'"));
        }
        match branch {
            None => Ok(Self {
                pool: pool.to_string(),
                branch: String::new(),
            }),
            Some("") => Err(LakeError::invalid_reference(s, "missing branch after '@'")),
            Some(branch) => Ok(Self {
                pool: pool.to_string(),
                branch: branch.to_string(),
            }),
        }
    }

    /// True for a lone token with no '@', which may name a pool or a commit.
    pub fn is_bare(&self) -> bool {
        !self.pool.is_empty() && self.branch.is_empty()
    }
}

impl fmt::Display for Commitish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.pool.is_empty(), self.branch.is_empty()) {
            (_, true) => write!(f, "{}", self.pool),
            (true, false) => write!(f, "@{}", self.branch),
            (false, false) => write!(f, "{}@{}", self.pool, self.branch),
        }
    }
}

impl std::str::FromStr for Commitish {
    type Err = LakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Commitish::parse(s)
    }
}

/// A reference resolved against the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// The reference with pool and branch filled in, as written to HEAD.
    pub commitish: Commitish,
    pub pool_id: PoolId,
    pub target: Target,
    /// Commit the target points at.
    pub commit: CommitId,
}

impl Resolved {
    pub fn head(&self) -> Head {
        Head::new(self.commitish.pool.clone(), self.commitish.branch.clone())
    }

    /// Branch name, or `None` when the reference names a commit.
    pub fn branch(&self) -> Option<&str> {
        match &self.target {
            Target::Branch(name) => Some(name),
            Target::Commit(_) => None,
        }
    }
}

/// Resolves references using HEAD for the missing parts. Never writes.
pub struct Resolver<'a, H: HeadStore> {
    registry: &'a Registry,
    head: H,
}

impl<'a, H: HeadStore> Resolver<'a, H> {
    pub fn new(registry: &'a Registry, head: H) -> Self {
        Self { registry, head }
    }

    /// Resolve the zero or one reference given on a command line.
    ///
    /// With no reference, HEAD itself is resolved.
    pub fn resolve_args(&self, args: &[String]) -> Result<Resolved, LakeError> {
        match args {
            [] => self.resolve_head(),
            [reference] => self.resolve_str(reference),
            _ => Err(LakeError::TooManyArguments),
        }
    }

    pub fn resolve_head(&self) -> Result<Resolved, LakeError> {
        let head = self.head.read()?;
        self.resolve(&Commitish {
            pool: head.pool,
            branch: head.branch,
        })
    }

    pub fn resolve_str(&self, reference: &str) -> Result<Resolved, LakeError> {
        self.resolve(&Commitish::parse(reference)?)
    }

    pub fn resolve(&self, commitish: &Commitish) -> Result<Resolved, LakeError> {
        if commitish.is_bare() {
            if let Some(resolved) = self.resolve_headless(&commitish.pool)? {
                return Ok(resolved);
            }
        }

        let mut filled = commitish.clone();
        if filled.pool.is_empty() {
            filled.pool = self.head_pool()?;
        }
        if filled.branch.is_empty() {
            filled.branch = MAIN_BRANCH.to_string();
        }

        let pool_id = self.registry.pool_id(&filled.pool)?;
        let (target, commit) = self.registry.resolve_target(&pool_id, &filled.branch)?;
        debug!(reference = %commitish, pool = %pool_id, commit = %commit.id, "resolved reference");
        Ok(Resolved {
            commitish: filled,
            pool_id,
            target,
            commit: commit.id,
        })
    }

    fn head_pool(&self) -> Result<String, LakeError> {
        match self.head.read() {
            Ok(head) => Ok(head.pool),
            Err(HeadError::Unset) => Err(LakeError::NoDefaultPool),
            Err(e) => Err(e.into()),
        }
    }

    /// A bare token that names no pool but is a commit of HEAD's pool.
    fn resolve_headless(&self, token: &str) -> Result<Option<Resolved>, LakeError> {
        match self.registry.pool_id(token) {
            Ok(_) => return Ok(None),
            Err(StorageError::PoolNotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
        let Some(id) = CommitId::parse(token) else {
            return Ok(None);
        };
        let head = match self.head.read() {
            Ok(head) => head,
            Err(HeadError::Unset) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let pool_id = match self.registry.pool_id(&head.pool) {
            Ok(pool_id) => pool_id,
            Err(StorageError::PoolNotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if !self.registry.open_store(&pool_id)?.contains(&id)? {
            return Ok(None);
        }
        Ok(Some(Resolved {
            commitish: Commitish {
                pool: head.pool,
                branch: id.to_string(),
            },
            pool_id,
            target: Target::Commit(id),
            commit: id,
        }))
    }
}
