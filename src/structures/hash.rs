use bytes::Bytes;
use itertools::Itertools;
use std::ops::ControlFlow;
use std::sync::{Arc, RwLock};

use super::{commit, put_count, read_count, read_lock, write_lock, Structure, StructureError};
use crate::keys::{self, KeyType};
use crate::storage::{Direction, Storage, WriteBatch};

/// A field to value map with a cached field count. Sets reuse it with empty values.
pub struct Hash {
    key: Bytes,
    key_type: KeyType,
    prefix: Vec<u8>,
    info_key: Vec<u8>,
    storage: Arc<dyn Storage>,
    count: RwLock<i64>,
}

impl Hash {
    pub fn open(storage: Arc<dyn Storage>, key: Bytes) -> Result<Hash, StructureError> {
        Self::open_as(storage, key, KeyType::Hash)
    }

    pub(crate) fn open_as(
        storage: Arc<dyn Storage>,
        key: Bytes,
        key_type: KeyType,
    ) -> Result<Hash, StructureError> {
        let info_key = keys::info_key(&key, key_type);
        let count = read_count(storage.as_ref(), &key, &info_key)?;

        Ok(Hash {
            prefix: keys::field_prefix(key_type, &key),
            key,
            key_type,
            info_key,
            storage,
            count: RwLock::new(count),
        })
    }

    fn field_key(&self, field: &[u8]) -> Vec<u8> {
        keys::field_key(&self.prefix, field)
    }

    /// Writes every pair, the last value winning for repeated fields. Returns the number of
    /// fields that did not exist before.
    pub fn set(&self, pairs: &[(Bytes, Bytes)]) -> Result<i64, StructureError> {
        let mut count = write_lock(&self.count);

        let mut batch = WriteBatch::new();
        let mut added = 0;
        for (field, value) in pairs.iter().rev().unique_by(|(field, _)| field.clone()) {
            let field_key = self.field_key(field);
            if self.storage.get(&field_key)?.is_none() {
                added += 1;
            }
            batch.put(field_key, value.clone());
        }
        if batch.is_empty() {
            return Ok(0);
        }
        if added > 0 {
            put_count(&mut batch, &self.info_key, *count + added);
        }

        commit(self.storage.as_ref(), &self.key, batch)?;
        *count += added;
        Ok(added)
    }

    pub fn get(&self, field: &[u8]) -> Result<Option<Bytes>, StructureError> {
        let _count = read_lock(&self.count);
        Ok(self.storage.get(&self.field_key(field))?)
    }

    pub fn get_many(&self, fields: &[Bytes]) -> Result<Vec<Option<Bytes>>, StructureError> {
        let _count = read_lock(&self.count);
        fields
            .iter()
            .map(|field| Ok(self.storage.get(&self.field_key(field))?))
            .collect()
    }

    pub fn exists(&self, field: &[u8]) -> Result<bool, StructureError> {
        Ok(self.get(field)?.is_some())
    }

    /// Removes the given fields. Returns how many existed.
    pub fn remove(&self, fields: &[Bytes]) -> Result<i64, StructureError> {
        let mut count = write_lock(&self.count);

        let mut batch = WriteBatch::new();
        let mut removed = 0;
        for field in fields.iter().unique() {
            let field_key = self.field_key(field);
            if self.storage.get(&field_key)?.is_some() {
                batch.delete(field_key);
                removed += 1;
            }
        }
        if removed == 0 {
            return Ok(0);
        }
        let next = (*count - removed).max(0);
        put_count(&mut batch, &self.info_key, next);

        commit(self.storage.as_ref(), &self.key, batch)?;
        *count = next;
        Ok(removed)
    }

    /// Adds `delta` to the integer stored in `field`, treating a missing field as zero.
    pub fn incr_by(&self, field: &[u8], delta: i64) -> Result<i64, StructureError> {
        let mut count = write_lock(&self.count);

        let field_key = self.field_key(field);
        let (current, next_count) = match self.storage.get(&field_key)? {
            Some(raw) => {
                let current = std::str::from_utf8(&raw)
                    .ok()
                    .and_then(|s| s.parse::<i64>().ok())
                    .ok_or(StructureError::NotAnInteger)?;
                (current, *count)
            }
            None => (0, *count + 1),
        };
        let value = current
            .checked_add(delta)
            .ok_or(StructureError::Overflow)?;

        let mut batch = WriteBatch::new();
        batch.put(field_key, value.to_string());
        if next_count != *count {
            put_count(&mut batch, &self.info_key, next_count);
        }

        commit(self.storage.as_ref(), &self.key, batch)?;
        *count = next_count;
        Ok(value)
    }

    /// Visits every field in byte order.
    pub fn enumerate<F>(&self, mut visit: F) -> Result<(), StructureError>
    where
        F: FnMut(&[u8], &[u8]) -> ControlFlow<()>,
    {
        let _count = read_lock(&self.count);
        let prefix_len = self.prefix.len();
        self.storage
            .scan_prefix(&self.prefix, Direction::Forward, &mut |key, value| {
                visit(&key[prefix_len..], value)
            })?;
        Ok(())
    }

    pub fn get_all(&self) -> Result<Vec<(Bytes, Bytes)>, StructureError> {
        let mut pairs = vec![];
        self.enumerate(|field, value| {
            pairs.push((Bytes::copy_from_slice(field), Bytes::copy_from_slice(value)));
            ControlFlow::Continue(())
        })?;
        Ok(pairs)
    }

    pub fn len(&self) -> i64 {
        *read_lock(&self.count)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) -> Result<bool, StructureError> {
        let mut count = write_lock(&self.count);
        if *count == 0 {
            return Ok(true);
        }

        let mut batch = WriteBatch::new();
        self.storage
            .scan_prefix(&self.prefix, Direction::Forward, &mut |key, _| {
                batch.delete(key.to_vec());
                ControlFlow::Continue(())
            })?;
        batch.delete(self.info_key.clone());

        commit(self.storage.as_ref(), &self.key, batch)?;
        *count = 0;
        Ok(true)
    }
}

impl Structure for Hash {
    fn key(&self) -> &Bytes {
        &self.key
    }

    fn key_type(&self) -> KeyType {
        self.key_type
    }

    fn len(&self) -> i64 {
        Hash::len(self)
    }

    fn clear(&self) -> Result<bool, StructureError> {
        Hash::clear(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::testing::FlakyStorage;
    use crate::storage::MemoryStorage;

    fn pairs(items: &[(&'static str, &'static str)]) -> Vec<(Bytes, Bytes)> {
        items
            .iter()
            .map(|(field, value)| (Bytes::from(*field), Bytes::from(*value)))
            .collect()
    }

    fn new_hash() -> (Arc<MemoryStorage>, Hash) {
        let storage = Arc::new(MemoryStorage::new());
        let hash = Hash::open(storage.clone(), Bytes::from("H")).unwrap();
        (storage, hash)
    }

    #[test]
    fn set_counts_new_fields_only() {
        let (_, hash) = new_hash();

        assert_eq!(hash.set(&pairs(&[("a", "1"), ("b", "2")])).unwrap(), 2);
        assert_eq!(hash.set(&pairs(&[("a", "3"), ("c", "4")])).unwrap(), 1);

        assert_eq!(hash.len(), 3);
        assert_eq!(hash.get(b"a").unwrap(), Some(Bytes::from("3")));
        assert_eq!(hash.get(b"zz").unwrap(), None);
    }

    #[test]
    fn get_all_is_ordered_by_field() {
        let (_, hash) = new_hash();
        hash.set(&pairs(&[("b", "2"), ("a", "1")])).unwrap();

        assert_eq!(hash.get_all().unwrap(), pairs(&[("a", "1"), ("b", "2")]));
        assert_eq!(
            hash.get_many(&[Bytes::from("b"), Bytes::from("x")]).unwrap(),
            vec![Some(Bytes::from("2")), None]
        );
    }

    #[test]
    fn remove_deletes_info_row_at_zero() {
        let (storage, hash) = new_hash();
        hash.set(&pairs(&[("a", "1"), ("b", "2")])).unwrap();

        assert_eq!(
            hash.remove(&[Bytes::from("a"), Bytes::from("missing")])
                .unwrap(),
            1
        );
        assert_eq!(hash.len(), 1);
        assert_eq!(hash.remove(&[Bytes::from("b")]).unwrap(), 1);

        assert!(hash.is_empty());
        assert!(storage.is_empty());
    }

    #[test]
    fn incr_by_parses_existing_value() {
        let (_, hash) = new_hash();
        hash.set(&pairs(&[("n", "10"), ("s", "abc")])).unwrap();

        assert_eq!(hash.incr_by(b"n", -3).unwrap(), 7);
        assert_eq!(hash.incr_by(b"fresh", 5).unwrap(), 5);
        assert_eq!(hash.len(), 3);
        assert_eq!(hash.incr_by(b"s", 1), Err(StructureError::NotAnInteger));
    }

    #[test]
    fn failed_commit_keeps_count() {
        let storage = Arc::new(FlakyStorage::default());
        let hash = Hash::open(storage.clone(), Bytes::from("H")).unwrap();

        storage.fail_writes(true);
        assert!(hash.set(&pairs(&[("a", "1")])).is_err());
        storage.fail_writes(false);

        assert_eq!(hash.len(), 0);
        assert_eq!(hash.get(b"a").unwrap(), None);
    }

    #[test]
    fn clear_and_reopen() {
        let (storage, hash) = new_hash();
        hash.set(&pairs(&[("a", "1")])).unwrap();

        let reopened = Hash::open(storage.clone(), Bytes::from("H")).unwrap();
        assert_eq!(reopened.len(), 1);

        assert!(reopened.clear().unwrap());
        assert!(storage.is_empty());
    }
}
