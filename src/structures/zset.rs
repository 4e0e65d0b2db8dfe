use bytes::Bytes;
use itertools::Itertools;
use std::cmp::Ordering;
use std::ops::ControlFlow;
use std::sync::{Arc, RwLock};

use super::{commit, put_count, read_count, read_lock, write_lock, Structure, StructureError};
use crate::keys::{self, KeyType, MAX_BYTE};
use crate::storage::{Direction, Storage, StorageError, WriteBatch};

/// A score ordered set.
///
/// Each member owns two rows: a member row holding its score, and a score row whose key sorts
/// by `(score, member)` and forms the secondary index used by rank and range queries. Rank is a
/// linear scan of that index, there is no auxiliary rank structure.
pub struct SortedSet {
    key: Bytes,
    info_key: Vec<u8>,
    score_prefix: Vec<u8>,
    storage: Arc<dyn Storage>,
    count: RwLock<i64>,
}

impl SortedSet {
    pub fn open(storage: Arc<dyn Storage>, key: Bytes) -> Result<SortedSet, StructureError> {
        let info_key = keys::info_key(&key, KeyType::SortedSet);
        let count = read_count(storage.as_ref(), &key, &info_key)?;

        Ok(SortedSet {
            score_prefix: keys::score_prefix(&key),
            key,
            info_key,
            storage,
            count: RwLock::new(count),
        })
    }

    fn member_key(&self, member: &[u8]) -> Vec<u8> {
        keys::member_key(&self.key, member)
    }

    fn score_key(&self, score: i64, member: &[u8]) -> Vec<u8> {
        keys::score_key(&self.key, score, member)
    }

    fn stored_score(&self, member: &[u8]) -> Result<Option<i64>, StructureError> {
        match self.storage.get(&self.member_key(member))? {
            None => Ok(None),
            Some(raw) => keys::parse_score(&raw)
                .map(Some)
                .ok_or_else(|| StructureError::Corrupt {
                    key: self.key.clone(),
                }),
        }
    }

    // Mutations that already used a read to compute their delta cannot be compensated once the
    // write fails, so the failure is reported as unrecoverable.
    fn commit_mutation(&self, batch: WriteBatch) -> Result<(), StructureError> {
        commit(self.storage.as_ref(), &self.key, batch).map_err(|source| {
            StructureError::Unrecoverable {
                key: self.key.clone(),
                source,
            }
        })
    }

    /// Sets the score of every member. Returns the number of members that were not present
    /// before; members whose score was only updated are not counted. When a member is repeated
    /// the last score wins.
    pub fn add(&self, pairs: &[(i64, Bytes)]) -> Result<i64, StructureError> {
        let mut count = write_lock(&self.count);

        let mut batch = WriteBatch::new();
        let mut added = 0;
        for (score, member) in pairs.iter().rev().unique_by(|(_, member)| member.clone()) {
            match self.stored_score(member)? {
                Some(old) => batch.delete(self.score_key(old, member)),
                None => added += 1,
            }
            batch.put(self.member_key(member), keys::score_bytes(*score).to_vec());
            batch.put(self.score_key(*score, member), Bytes::new());
        }
        if batch.is_empty() {
            return Ok(0);
        }
        if added > 0 {
            put_count(&mut batch, &self.info_key, *count + added);
        }

        self.commit_mutation(batch)?;
        *count += added;
        Ok(added)
    }

    pub fn score(&self, member: &[u8]) -> Result<Option<i64>, StructureError> {
        let _count = read_lock(&self.count);
        self.stored_score(member)
    }

    /// Adds `delta` to the score of `member`, inserting it with score `delta` when absent.
    /// Returns the new score.
    pub fn incr_by(&self, member: &[u8], delta: i64) -> Result<i64, StructureError> {
        let mut count = write_lock(&self.count);

        let mut batch = WriteBatch::new();
        let mut next_count = *count;
        let score = match self.stored_score(member)? {
            Some(old) => {
                batch.delete(self.score_key(old, member));
                old.checked_add(delta).ok_or(StructureError::Overflow)?
            }
            None => {
                next_count += 1;
                delta
            }
        };
        batch.put(self.member_key(member), keys::score_bytes(score).to_vec());
        batch.put(self.score_key(score, member), Bytes::new());
        if next_count != *count {
            put_count(&mut batch, &self.info_key, next_count);
        }

        self.commit_mutation(batch)?;
        *count = next_count;
        Ok(score)
    }

    /// Zero based position of `member` in ascending (or descending) `(score, member)` order.
    ///
    /// This walks the score index from the requested end until it meets the member, so it costs
    /// O(rank). Absent members are answered without scanning.
    pub fn rank(&self, descending: bool, member: &[u8]) -> Result<Option<i64>, StructureError> {
        let _count = read_lock(&self.count);
        let Some(score) = self.stored_score(member)? else {
            return Ok(None);
        };

        let mut position = 0;
        let mut rank = None;
        self.scan_scores(Direction::from_descending(descending), |current, current_member| {
            match ((current, current_member).cmp(&(score, member)), descending) {
                (Ordering::Equal, _) => {
                    rank = Some(position);
                    ControlFlow::Break(())
                }
                // Walked past the place the member would occupy.
                (Ordering::Greater, false) | (Ordering::Less, true) => ControlFlow::Break(()),
                _ => {
                    position += 1;
                    ControlFlow::Continue(())
                }
            }
        })?;

        Ok(rank)
    }

    /// Members at positions `[start, stop]`, with a `stop` of `-1` meaning no upper bound.
    pub fn range_by_index(
        &self,
        descending: bool,
        start: i64,
        stop: i64,
    ) -> Result<Vec<(i64, Bytes)>, StructureError> {
        if start < 0 || (stop != -1 && start > stop) {
            return Err(StructureError::InvalidRange { start, stop });
        }

        let _count = read_lock(&self.count);
        let mut members = vec![];
        let mut position = 0;
        self.scan_scores(Direction::from_descending(descending), |score, member| {
            if stop != -1 && position > stop {
                return ControlFlow::Break(());
            }
            if position >= start {
                members.push((score, Bytes::copy_from_slice(member)));
            }
            position += 1;
            ControlFlow::Continue(())
        })?;

        Ok(members)
    }

    /// Members whose score lies in `[min, max]`, skipping the first `offset` matches and
    /// returning at most `count` of them (`-1` for all).
    pub fn range_by_score(
        &self,
        descending: bool,
        min: i64,
        max: i64,
        offset: i64,
        count: i64,
    ) -> Result<Vec<(i64, Bytes)>, StructureError> {
        let _count = read_lock(&self.count);
        let mut members = vec![];
        let mut position = 0;
        self.scan_score_range(
            Direction::from_descending(descending),
            min,
            max,
            |score, member| {
                if count != -1 && position >= offset.saturating_add(count) {
                    return ControlFlow::Break(());
                }
                if position >= offset {
                    members.push((score, Bytes::copy_from_slice(member)));
                }
                position += 1;
                ControlFlow::Continue(())
            },
        )?;

        Ok(members)
    }

    /// Removes the given members. Returns how many were present.
    pub fn remove(&self, members: &[Bytes]) -> Result<i64, StructureError> {
        let mut count = write_lock(&self.count);

        let mut batch = WriteBatch::new();
        let mut removed = 0;
        for member in members.iter().unique() {
            if let Some(score) = self.stored_score(member)? {
                batch.delete(self.member_key(member));
                batch.delete(self.score_key(score, member));
                removed += 1;
            }
        }

        self.commit_removal(&mut count, batch, removed)
    }

    /// Removes the members at positions `[start, stop]` in ascending order.
    pub fn remove_by_index(&self, start: i64, stop: i64) -> Result<i64, StructureError> {
        if start < 0 || (stop != -1 && start > stop) {
            return Err(StructureError::InvalidRange { start, stop });
        }

        let mut count = write_lock(&self.count);
        let mut batch = WriteBatch::new();
        let mut removed = 0;
        let mut position = 0;
        self.scan_scores(Direction::Forward, |score, member| {
            if stop != -1 && position > stop {
                return ControlFlow::Break(());
            }
            if position >= start {
                batch.delete(self.member_key(member));
                batch.delete(self.score_key(score, member));
                removed += 1;
            }
            position += 1;
            ControlFlow::Continue(())
        })?;

        self.commit_removal(&mut count, batch, removed)
    }

    /// Removes every member whose score lies in `[min, max]`.
    pub fn remove_by_score(&self, min: i64, max: i64) -> Result<i64, StructureError> {
        let mut count = write_lock(&self.count);
        let mut batch = WriteBatch::new();
        let mut removed = 0;
        self.scan_score_range(Direction::Forward, min, max, |score, member| {
            batch.delete(self.member_key(member));
            batch.delete(self.score_key(score, member));
            removed += 1;
            ControlFlow::Continue(())
        })?;

        self.commit_removal(&mut count, batch, removed)
    }

    fn commit_removal(
        &self,
        count: &mut i64,
        mut batch: WriteBatch,
        removed: i64,
    ) -> Result<i64, StructureError> {
        if removed == 0 {
            return Ok(0);
        }
        let next = (*count - removed).max(0);
        put_count(&mut batch, &self.info_key, next);

        self.commit_mutation(batch)?;
        *count = next;
        Ok(removed)
    }

    /// Visits every `(score, member)` pair in ascending order.
    pub fn enumerate<F>(&self, mut visit: F) -> Result<(), StructureError>
    where
        F: FnMut(usize, i64, &[u8]) -> ControlFlow<()>,
    {
        let _count = read_lock(&self.count);
        let mut position = 0;
        self.scan_scores(Direction::Forward, |score, member| {
            let flow = visit(position, score, member);
            position += 1;
            flow
        })?;
        Ok(())
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
        self.storage.scan_prefix(
            &keys::zset_prefix(&self.key),
            Direction::Forward,
            &mut |key, _| {
                batch.delete(key.to_vec());
                ControlFlow::Continue(())
            },
        )?;
        batch.delete(self.info_key.clone());

        commit(self.storage.as_ref(), &self.key, batch)?;
        *count = 0;
        Ok(true)
    }

    fn scan_scores<F>(&self, direction: Direction, mut visit: F) -> Result<(), StorageError>
    where
        F: FnMut(i64, &[u8]) -> ControlFlow<()>,
    {
        self.storage
            .scan_prefix(&self.score_prefix, direction, &mut |row, _| {
                match keys::split_score_key(&self.score_prefix, row) {
                    Some((score, member)) => visit(score, member),
                    None => ControlFlow::Continue(()),
                }
            })
    }

    fn scan_score_range<F>(
        &self,
        direction: Direction,
        min: i64,
        max: i64,
        mut visit: F,
    ) -> Result<(), StorageError>
    where
        F: FnMut(i64, &[u8]) -> ControlFlow<()>,
    {
        if min > max {
            return Ok(());
        }
        let low = keys::score_prefix_with(&self.key, min);
        let mut high = keys::score_prefix_with(&self.key, max);
        high.push(MAX_BYTE);

        self.storage
            .scan_range(&low, &high, direction, &mut |row, _| {
                match keys::split_score_key(&self.score_prefix, row) {
                    Some((score, member)) => visit(score, member),
                    None => ControlFlow::Continue(()),
                }
            })
    }
}

impl Structure for SortedSet {
    fn key(&self) -> &Bytes {
        &self.key
    }

    fn key_type(&self) -> KeyType {
        KeyType::SortedSet
    }

    fn len(&self) -> i64 {
        SortedSet::len(self)
    }

    fn clear(&self) -> Result<bool, StructureError> {
        SortedSet::clear(self)
    }
}
