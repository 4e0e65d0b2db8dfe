use bytes::Bytes;
use std::ops::ControlFlow;
use std::sync::Arc;

use super::{Hash, Structure, StructureError};
use crate::keys::KeyType;
use crate::storage::Storage;

/// An unordered collection of unique members, stored as hash fields with empty values under
/// their own key space.
pub struct Set {
    inner: Hash,
}

impl Set {
    pub fn open(storage: Arc<dyn Storage>, key: Bytes) -> Result<Set, StructureError> {
        Ok(Set {
            inner: Hash::open_as(storage, key, KeyType::Set)?,
        })
    }

    /// Returns the number of members that were not already present.
    pub fn add(&self, members: &[Bytes]) -> Result<i64, StructureError> {
        let pairs: Vec<(Bytes, Bytes)> = members
            .iter()
            .map(|member| (member.clone(), Bytes::new()))
            .collect();
        self.inner.set(&pairs)
    }

    pub fn remove(&self, members: &[Bytes]) -> Result<i64, StructureError> {
        self.inner.remove(members)
    }

    pub fn contains(&self, member: &[u8]) -> Result<bool, StructureError> {
        self.inner.exists(member)
    }

    pub fn members(&self) -> Result<Vec<Bytes>, StructureError> {
        let mut members = vec![];
        self.inner.enumerate(|member, _| {
            members.push(Bytes::copy_from_slice(member));
            ControlFlow::Continue(())
        })?;
        Ok(members)
    }

    pub fn len(&self) -> i64 {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&self) -> Result<bool, StructureError> {
        self.inner.clear()
    }
}

impl Structure for Set {
    fn key(&self) -> &Bytes {
        Structure::key(&self.inner)
    }

    fn key_type(&self) -> KeyType {
        KeyType::Set
    }

    fn len(&self) -> i64 {
        Set::len(self)
    }

    fn clear(&self) -> Result<bool, StructureError> {
        Set::clear(self)
    }
}
