//! Collection types mapped onto flat rows of the ordered storage.
//!
//! Each instance is bound to one logical key and caches its cursors or member count behind a
//! read/write lock. Mutations build a single [`WriteBatch`] that carries the row changes and the
//! updated info row together, commit it, and only then publish the new cached state. A failed
//! commit therefore leaves the cache exactly as it was before the call.

pub mod hash;
pub mod list;
pub mod set;
pub mod zset;

use bytes::Bytes;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error as ThisError;
use tracing::{debug, error, warn};

use crate::keys::KeyType;
use crate::storage::{Storage, StorageError, WriteBatch};

pub use hash::Hash;
pub use list::List;
pub use set::Set;
pub use zset::SortedSet;

#[derive(Debug, ThisError, PartialEq)]
pub enum StructureError {
    #[error("invalid range, start {start} stop {stop}")]
    InvalidRange { start: i64, stop: i64 },
    #[error("hash value is not an integer")]
    NotAnInteger,
    #[error("increment or decrement would overflow")]
    Overflow,
    #[error("corrupt data stored for key {key:?}")]
    Corrupt { key: Bytes },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("write for key {key:?} failed after its state was read: {source}")]
    Unrecoverable { key: Bytes, source: StorageError },
}

/// Operations every structure supports regardless of its type.
pub trait Structure: Send + Sync {
    fn key(&self) -> &Bytes;

    fn key_type(&self) -> KeyType;

    fn len(&self) -> i64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deletes every row of the key, including its info row. The instance stays usable.
    fn clear(&self) -> Result<bool, StructureError>;
}

pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn commit(
    storage: &dyn Storage,
    key: &Bytes,
    batch: WriteBatch,
) -> Result<(), StorageError> {
    let ops = batch.len();
    if let Err(e) = storage.write(batch) {
        warn!(?key, ops, error = %e, "batch commit failed, keeping cached state");
        return Err(e);
    }
    debug!(?key, ops, "batch committed");
    Ok(())
}

/// Reads a decimal member count from an info row. Missing rows mean an empty structure.
pub(crate) fn read_count(
    storage: &dyn Storage,
    key: &Bytes,
    info_key: &[u8],
) -> Result<i64, StructureError> {
    let Some(raw) = storage.get(info_key)? else {
        return Ok(0);
    };
    match std::str::from_utf8(&raw).ok().and_then(|s| s.parse().ok()) {
        Some(count) if count > 0 => Ok(count),
        _ => {
            error!(?key, ?raw, "bad count in info row");
            Err(StructureError::Corrupt { key: key.clone() })
        }
    }
}

/// Appends the info row update for a counted structure: deleted when the count reaches zero,
/// rewritten otherwise.
pub(crate) fn put_count(batch: &mut WriteBatch, info_key: &[u8], count: i64) {
    if count <= 0 {
        batch.delete(info_key.to_vec());
    } else {
        batch.put(info_key.to_vec(), count.to_string());
    }
}
