use bytes::Bytes;
use std::ops::ControlFlow;
use std::sync::{Arc, RwLock};
use tracing::error;

use super::{commit, read_lock, write_lock, Structure, StructureError};
use crate::keys::{self, KeyType};
use crate::storage::{Direction, Storage, WriteBatch};

/// Logical bounds of a list. Every index in `[start, end]` has exactly one entry row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    start: i64,
    end: i64,
}

impl Cursor {
    const EMPTY: Cursor = Cursor { start: 0, end: -1 };

    fn len(&self) -> i64 {
        if self.end < self.start {
            0
        } else {
            self.end - self.start + 1
        }
    }

    fn encode(&self) -> String {
        format!("{},{}", self.start, self.end)
    }

    fn decode(raw: &[u8]) -> Option<Cursor> {
        let raw = std::str::from_utf8(raw).ok()?;
        let (start, end) = raw.split_once(',')?;
        let cursor = Cursor {
            start: start.parse().ok()?,
            end: end.parse().ok()?,
        };
        (cursor == Cursor::EMPTY || cursor.start <= cursor.end).then_some(cursor)
    }
}

/// The end of a list an element is pushed to or popped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// A double ended sequence. Pushing moves one of the two cursors outwards, so existing entries
/// are never renumbered.
pub struct List {
    key: Bytes,
    prefix: Vec<u8>,
    info_key: Vec<u8>,
    storage: Arc<dyn Storage>,
    cursor: RwLock<Cursor>,
}

impl List {
    pub fn open(storage: Arc<dyn Storage>, key: Bytes) -> Result<List, StructureError> {
        let info_key = keys::info_key(&key, KeyType::List);
        let cursor = match storage.get(&info_key)? {
            None => Cursor::EMPTY,
            Some(raw) => match Cursor::decode(&raw) {
                Some(cursor) if cursor.len() > 0 => cursor,
                _ => {
                    error!(?key, ?raw, "bad list cursors in info row");
                    return Err(StructureError::Corrupt { key });
                }
            },
        };

        Ok(List {
            prefix: keys::list_prefix(&key),
            key,
            info_key,
            storage,
            cursor: RwLock::new(cursor),
        })
    }

    fn entry_key(&self, index: i64) -> Vec<u8> {
        keys::list_entry_key(&self.prefix, index)
    }

    /// Prepends `values` one by one, so the last value ends up at the head. Returns the new
    /// length.
    pub fn lpush(&self, values: &[Bytes]) -> Result<i64, StructureError> {
        self.push(Side::Left, values)
    }

    /// Appends `values` in order. Returns the new length.
    pub fn rpush(&self, values: &[Bytes]) -> Result<i64, StructureError> {
        self.push(Side::Right, values)
    }

    pub fn push(&self, side: Side, values: &[Bytes]) -> Result<i64, StructureError> {
        let mut cursor = write_lock(&self.cursor);
        if values.is_empty() {
            return Ok(cursor.len());
        }

        let mut next = *cursor;
        let mut batch = WriteBatch::new();
        for value in values {
            let index = match side {
                Side::Left => {
                    next.start -= 1;
                    next.start
                }
                Side::Right => {
                    next.end += 1;
                    next.end
                }
            };
            batch.put(self.entry_key(index), value.clone());
        }
        batch.put(self.info_key.clone(), next.encode());

        commit(self.storage.as_ref(), &self.key, batch)?;
        *cursor = next;
        Ok(next.len())
    }

    pub fn lpop(&self) -> Result<Option<Bytes>, StructureError> {
        self.pop(Side::Left)
    }

    pub fn rpop(&self) -> Result<Option<Bytes>, StructureError> {
        self.pop(Side::Right)
    }

    pub fn pop(&self, side: Side) -> Result<Option<Bytes>, StructureError> {
        let mut cursor = write_lock(&self.cursor);
        if cursor.len() == 0 {
            return Ok(None);
        }

        let index = match side {
            Side::Left => cursor.start,
            Side::Right => cursor.end,
        };
        let entry_key = self.entry_key(index);
        let Some(value) = self.storage.get(&entry_key)? else {
            error!(key = ?self.key, index, "list entry missing inside cursor range");
            return Err(StructureError::Corrupt {
                key: self.key.clone(),
            });
        };

        let mut batch = WriteBatch::new();
        batch.delete(entry_key);
        let next = if cursor.len() == 1 {
            batch.delete(self.info_key.clone());
            Cursor::EMPTY
        } else {
            let mut next = *cursor;
            match side {
                Side::Left => next.start += 1,
                Side::Right => next.end -= 1,
            }
            batch.put(self.info_key.clone(), next.encode());
            next
        };

        commit(self.storage.as_ref(), &self.key, batch)?;
        *cursor = next;
        Ok(Some(value))
    }

    /// Keeps only the first `count` elements. Returns how many were removed.
    pub fn trim_left(&self, count: i64) -> Result<i64, StructureError> {
        self.trim(0, count.max(0) - 1)
    }

    /// Keeps the logical positions `[start, stop]` and deletes everything else. A `stop` lower
    /// than `start` keeps nothing. Returns how many elements were removed.
    pub fn trim(&self, start: i64, stop: i64) -> Result<i64, StructureError> {
        if start < 0 {
            return Err(StructureError::InvalidRange { start, stop });
        }

        let mut cursor = write_lock(&self.cursor);
        let len = cursor.len();
        let keep_stop = stop.min(len - 1);
        let keep_start = start.min(len);

        let mut batch = WriteBatch::new();
        let mut removed = 0;
        let dropped = (0..keep_start).chain((keep_stop + 1).max(keep_start)..len);
        for i in dropped {
            batch.delete(self.entry_key(cursor.start + i));
            removed += 1;
        }
        if removed == 0 {
            return Ok(0);
        }

        let next = if keep_start > keep_stop {
            Cursor::EMPTY
        } else {
            Cursor {
                start: cursor.start + keep_start,
                end: cursor.start + keep_stop,
            }
        };
        if next.len() == 0 {
            batch.delete(self.info_key.clone());
        } else {
            batch.put(self.info_key.clone(), next.encode());
        }

        commit(self.storage.as_ref(), &self.key, batch)?;
        *cursor = next;
        Ok(removed)
    }

    /// Returns the elements at logical positions `[start, stop]`, where a `stop` of `-1` means
    /// the end of the list.
    pub fn range(&self, start: i64, stop: i64) -> Result<Vec<Bytes>, StructureError> {
        if start < 0 || (stop != -1 && start > stop) {
            return Err(StructureError::InvalidRange { start, stop });
        }

        let cursor = read_lock(&self.cursor);
        let len = cursor.len();
        if start >= len {
            return Ok(vec![]);
        }
        let stop = if stop == -1 || stop >= len {
            len - 1
        } else {
            stop
        };

        let low = self.entry_key(cursor.start + start);
        let high = self.entry_key(cursor.start + stop);
        let mut values = Vec::with_capacity((stop - start + 1).min(1000) as usize);
        self.storage
            .scan_range(&low, &high, Direction::Forward, &mut |key, value| {
                if !key.starts_with(&self.prefix) {
                    return ControlFlow::Break(());
                }
                values.push(Bytes::copy_from_slice(value));
                ControlFlow::Continue(())
            })?;

        Ok(values)
    }

    pub fn index(&self, i: i64) -> Result<Option<Bytes>, StructureError> {
        let cursor = read_lock(&self.cursor);
        if i < 0 || i >= cursor.len() {
            return Ok(None);
        }
        Ok(self.storage.get(&self.entry_key(cursor.start + i))?)
    }

    /// Visits every element from head to tail along with its position.
    pub fn enumerate<F>(&self, mut visit: F) -> Result<(), StructureError>
    where
        F: FnMut(usize, &[u8]) -> ControlFlow<()>,
    {
        let _cursor = read_lock(&self.cursor);
        let mut position = 0;
        self.storage
            .scan_prefix(&self.prefix, Direction::Forward, &mut |_, value| {
                let flow = visit(position, value);
                position += 1;
                flow
            })?;
        Ok(())
    }

    pub fn len(&self) -> i64 {
        read_lock(&self.cursor).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) -> Result<bool, StructureError> {
        let mut cursor = write_lock(&self.cursor);

        let mut batch = WriteBatch::new();
        self.storage
            .scan_prefix(&self.prefix, Direction::Forward, &mut |key, _| {
                batch.delete(key.to_vec());
                ControlFlow::Continue(())
            })?;
        batch.delete(self.info_key.clone());

        commit(self.storage.as_ref(), &self.key, batch)?;
        *cursor = Cursor::EMPTY;
        Ok(true)
    }
}

impl Structure for List {
    fn key(&self) -> &Bytes {
        &self.key
    }

    fn key_type(&self) -> KeyType {
        KeyType::List
    }

    fn len(&self) -> i64 {
        List::len(self)
    }

    fn clear(&self) -> Result<bool, StructureError> {
        List::clear(self)
    }
}
