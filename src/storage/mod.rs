//! Ordered key-value storage contract.
//!
//! Every structure in this crate is decomposed into flat rows that live in a single ordered,
//! byte-keyed store. The store only has to provide point reads, atomic batched writes and
//! ordered range scans with early stop; everything else is built on top of that.

pub mod memory;
#[cfg(feature = "rocksdb")]
pub mod rocks;

use bytes::Bytes;
use std::ops::{Bound, ControlFlow};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error as ThisError;

use crate::config::StorageKind;

pub use memory::MemoryStorage;

#[derive(Debug, ThisError, Clone, PartialEq)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("storage backend {0} is not compiled into this binary")]
    Unavailable(&'static str),
}

/// Iteration order of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn from_descending(descending: bool) -> Self {
        if descending {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BatchOp {
    Put(Bytes, Bytes),
    Delete(Bytes),
}

/// A list of puts and deletes that the storage applies as one indivisible unit.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<Bytes>, value: impl Into<Bytes>) {
        self.ops.push(BatchOp::Put(key.into(), value.into()));
    }

    pub fn delete(&mut self, key: impl Into<Bytes>) {
        self.ops.push(BatchOp::Delete(key.into()));
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}

/// Visitor handed to scans. Returning `ControlFlow::Break` stops the scan.
pub type Visitor<'a> = dyn FnMut(&[u8], &[u8]) -> ControlFlow<()> + 'a;

pub trait Storage: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Bytes>, StorageError>;

    /// Applies every operation of the batch, or none of them.
    fn write(&self, batch: WriteBatch) -> Result<(), StorageError>;

    fn scan(
        &self,
        low: Bound<&[u8]>,
        high: Bound<&[u8]>,
        direction: Direction,
        visit: &mut Visitor<'_>,
    ) -> Result<(), StorageError>;

    /// Scans `[low, high]`, both ends included.
    fn scan_range(
        &self,
        low: &[u8],
        high: &[u8],
        direction: Direction,
        visit: &mut Visitor<'_>,
    ) -> Result<(), StorageError> {
        if low > high {
            return Ok(());
        }
        self.scan(
            Bound::Included(low),
            Bound::Included(high),
            direction,
            visit,
        )
    }

    fn scan_prefix(
        &self,
        prefix: &[u8],
        direction: Direction,
        visit: &mut Visitor<'_>,
    ) -> Result<(), StorageError> {
        match prefix_successor(prefix) {
            Some(end) => self.scan(
                Bound::Included(prefix),
                Bound::Excluded(&end),
                direction,
                visit,
            ),
            None => self.scan(Bound::Included(prefix), Bound::Unbounded, direction, visit),
        }
    }
}

/// The smallest key that is greater than every key starting with `prefix`, or `None` when no
/// such key exists (empty prefix or a prefix made only of `0xff`).
pub fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

pub fn open(kind: StorageKind, data_dir: &Path) -> Result<Arc<dyn Storage>, StorageError> {
    match kind {
        StorageKind::Memory => Ok(Arc::new(MemoryStorage::new())),
        #[cfg(feature = "rocksdb")]
        StorageKind::Rocksdb => Ok(Arc::new(rocks::RocksStorage::open(data_dir)?)),
        #[cfg(not(feature = "rocksdb"))]
        StorageKind::Rocksdb => {
            let _ = data_dir;
            Err(StorageError::Unavailable("rocksdb"))
        }
    }
}
