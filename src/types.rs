//! Identifier types shared across the lake.
//!
//! Every identifier is a ULID: 128 bits, lexically and numerically sortable by
//! creation time. The all-zero value is reserved as the nil sentinel.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use ulid::{Generator, Ulid};

/// Name of the branch a pool-only reference resolves to.
pub const MAIN_BRANCH: &str = "main";

/// Length of the canonical Crockford base32 rendering of an identifier.
pub const ID_LEN: usize = 26;

macro_rules! ulid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Ulid);

        impl $name {
            pub const NIL: $name = $name(Ulid(0));

            pub fn from_ulid(ulid: Ulid) -> Self {
                $name(ulid)
            }

            pub fn ulid(&self) -> Ulid {
                self.0
            }

            pub fn is_nil(&self) -> bool {
                self.0 .0 == 0
            }

            /// Big-endian bytes, so byte order matches creation order.
            pub fn to_bytes(&self) -> [u8; 16] {
                self.0.to_bytes()
            }

            pub fn from_slice(bytes: &[u8]) -> Option<Self> {
                let raw: [u8; 16] = bytes.try_into().ok()?;
                Some($name(Ulid::from_bytes(raw)))
            }

            /// Parse the canonical 26-character form. Returns `None` for
            /// anything that is not lexically an identifier.
            pub fn parse(s: &str) -> Option<Self> {
                if s.len() != ID_LEN {
                    return None;
                }
                Ulid::from_string(s).ok().map($name)
            }

            /// Milliseconds since the Unix epoch encoded in the identifier.
            pub fn timestamp_ms(&self) -> u64 {
                self.0.timestamp_ms()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ulid::DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ulid::from_string(s).map($name)
            }
        }
    };
}

ulid_id!(
    /// Identifier of an immutable commit object.
    CommitId
);

ulid_id!(
    /// Stable identifier of a pool, assigned at creation.
    PoolId
);

ulid_id!(
    /// Identifier of a data object referenced by a commit payload.
    ObjectId
);

/// Shared monotonic ULID source.
///
/// Within one process every generated value is strictly greater than the
/// previous one, even when several are produced in the same millisecond.
#[derive(Clone)]
pub struct IdGenerator {
    inner: Arc<Mutex<Generator>>,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Generator::new())),
        }
    }

    pub fn next_ulid(&self) -> Ulid {
        let mut generator = self.inner.lock();
        // The random component only overflows after 2^80 ids in one millisecond.
        generator.generate().unwrap_or_else(|_| Ulid::new())
    }

    pub fn commit_id(&self) -> CommitId {
        CommitId::from_ulid(self.next_ulid())
    }

    pub fn pool_id(&self) -> PoolId {
        PoolId::from_ulid(self.next_ulid())
    }

    pub fn object_id(&self) -> ObjectId {
        ObjectId::from_ulid(self.next_ulid())
    }
}

impl fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdGenerator").finish_non_exhaustive()
    }
}
