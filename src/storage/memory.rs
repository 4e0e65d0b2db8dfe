use bytes::Bytes;
use std::collections::BTreeMap;
use std::ops::{Bound, ControlFlow};
use std::sync::{PoisonError, RwLock};

use super::{BatchOp, Direction, Storage, StorageError, Visitor, WriteBatch};

/// An ordered in-memory backend. Rows are kept in a `BTreeMap`, which gives the same unsigned
/// byte-lexicographic order a disk backend would.
#[derive(Default)]
pub struct MemoryStorage {
    rows: RwLock<BTreeMap<Bytes, Bytes>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &[u8]) -> Result<Option<Bytes>, StorageError> {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        Ok(rows.get(key).cloned())
    }

    fn write(&self, batch: WriteBatch) -> Result<(), StorageError> {
        // Holding the write lock for the whole batch is what makes it atomic to readers.
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        for op in batch.into_ops() {
            match op {
                BatchOp::Put(key, value) => {
                    rows.insert(key, value);
                }
                BatchOp::Delete(key) => {
                    rows.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn scan(
        &self,
        low: Bound<&[u8]>,
        high: Bound<&[u8]>,
        direction: Direction,
        visit: &mut Visitor<'_>,
    ) -> Result<(), StorageError> {
        if is_empty_range(low, high) {
            return Ok(());
        }

        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        let range = rows.range::<[u8], _>((low, high));
        match direction {
            Direction::Forward => {
                for (key, value) in range {
                    if visit(&key[..], &value[..]).is_break() {
                        break;
                    }
                }
            }
            Direction::Backward => {
                for (key, value) in range.rev() {
                    if visit(&key[..], &value[..]).is_break() {
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}

// `BTreeMap::range` panics on inverted bounds, so those are answered up front.
fn is_empty_range(low: Bound<&[u8]>, high: Bound<&[u8]>) -> bool {
    match (low, high) {
        (Bound::Included(l), Bound::Included(h)) => l > h,
        (Bound::Included(l), Bound::Excluded(h))
        | (Bound::Excluded(l), Bound::Included(h))
        | (Bound::Excluded(l), Bound::Excluded(h)) => l >= h,
        _ => false,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    /// Wraps a `MemoryStorage` and rejects every batch while `fail_writes` is set.
    #[derive(Default)]
    pub(crate) struct FlakyStorage {
        pub(crate) inner: MemoryStorage,
        fail_writes: AtomicBool,
    }

    impl FlakyStorage {
        pub(crate) fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }
    }

    impl Storage for FlakyStorage {
        fn get(&self, key: &[u8]) -> Result<Option<Bytes>, StorageError> {
            self.inner.get(key)
        }

        fn write(&self, batch: WriteBatch) -> Result<(), StorageError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::Backend("injected write failure".to_string()));
            }
            self.inner.write(batch)
        }

        fn scan(
            &self,
            low: Bound<&[u8]>,
            high: Bound<&[u8]>,
            direction: Direction,
            visit: &mut Visitor<'_>,
        ) -> Result<(), StorageError> {
            self.inner.scan(low, high, direction, visit)
        }
    }
}
