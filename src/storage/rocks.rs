use bytes::Bytes;
use rocksdb::{IteratorMode, Options, WriteOptions, DB};
use std::ops::{Bound, ControlFlow};
use std::path::Path;
use tracing::info;

use super::{BatchOp, Direction, Storage, StorageError, Visitor, WriteBatch};

/// RocksDB backed storage. Keys are compared with RocksDB's default bytewise comparator, which
/// is the order the key codec is designed for.
pub struct RocksStorage {
    db: DB,
    write_opts: WriteOptions,
}

impl RocksStorage {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DB::open(&opts, path).map_err(backend)?;

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(false);

        info!("Opened RocksDB storage at {}", path.display());
        Ok(Self { db, write_opts })
    }
}

impl Storage for RocksStorage {
    fn get(&self, key: &[u8]) -> Result<Option<Bytes>, StorageError> {
        self.db
            .get(key)
            .map(|value| value.map(Bytes::from))
            .map_err(backend)
    }

    fn write(&self, batch: WriteBatch) -> Result<(), StorageError> {
        let mut rocks_batch = rocksdb::WriteBatch::default();
        for op in batch.into_ops() {
            match op {
                BatchOp::Put(key, value) => rocks_batch.put(key, value),
                BatchOp::Delete(key) => rocks_batch.delete(key),
            }
        }
        self.db
            .write_opt(rocks_batch, &self.write_opts)
            .map_err(backend)
    }

    fn scan(
        &self,
        low: Bound<&[u8]>,
        high: Bound<&[u8]>,
        direction: Direction,
        visit: &mut Visitor<'_>,
    ) -> Result<(), StorageError> {
        let mode = match (direction, low, high) {
            (Direction::Forward, Bound::Included(key) | Bound::Excluded(key), _) => {
                IteratorMode::From(key, rocksdb::Direction::Forward)
            }
            (Direction::Forward, Bound::Unbounded, _) => IteratorMode::Start,
            (Direction::Backward, _, Bound::Included(key) | Bound::Excluded(key)) => {
                IteratorMode::From(key, rocksdb::Direction::Reverse)
            }
            (Direction::Backward, _, Bound::Unbounded) => IteratorMode::End,
        };

        for item in self.db.iterator(mode) {
            let (key, value) = item.map_err(backend)?;
            let key = &key[..];

            if !above_low(key, low) {
                match direction {
                    Direction::Forward => continue,
                    Direction::Backward => break,
                }
            }
            if !below_high(key, high) {
                match direction {
                    Direction::Forward => break,
                    Direction::Backward => continue,
                }
            }
            if let ControlFlow::Break(()) = visit(key, &value) {
                break;
            }
        }
        Ok(())
    }
}

fn above_low(key: &[u8], low: Bound<&[u8]>) -> bool {
    match low {
        Bound::Included(low) => key >= low,
        Bound::Excluded(low) => key > low,
        Bound::Unbounded => true,
    }
}

fn below_high(key: &[u8], high: Bound<&[u8]>) -> bool {
    match high {
        Bound::Included(high) => key <= high,
        Bound::Excluded(high) => key < high,
        Bound::Unbounded => true,
    }
}

fn backend(err: rocksdb::Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_with(rows: &[&'static str]) -> (tempfile::TempDir, RocksStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = RocksStorage::open(dir.path()).unwrap();
        let mut batch = WriteBatch::new();
        for row in rows {
            batch.put(*row, *row);
        }
        storage.write(batch).unwrap();
        (dir, storage)
    }

    fn collect_prefix(storage: &RocksStorage, prefix: &[u8], direction: Direction) -> Vec<String> {
        let mut keys = vec![];
        storage
            .scan_prefix(prefix, direction, &mut |key, _| {
                keys.push(String::from_utf8_lossy(key).into_owned());
                ControlFlow::Continue(())
            })
            .unwrap();
        keys
    }

    fn collect_range(
        storage: &RocksStorage,
        low: &[u8],
        high: &[u8],
        direction: Direction,
    ) -> Vec<String> {
        let mut keys = vec![];
        storage
            .scan_range(low, high, direction, &mut |key, _| {
                keys.push(String::from_utf8_lossy(key).into_owned());
                ControlFlow::Continue(())
            })
            .unwrap();
        keys
    }

    #[test]
    fn prefix_scan_in_both_directions() {
        let (_dir, storage) = open_with(&["a", "a1", "a2", "a3", "b", "b1"]);

        assert_eq!(
            collect_prefix(&storage, b"a", Direction::Forward),
            vec!["a", "a1", "a2", "a3"]
        );
        // The excluded upper bound "b" exists, a reverse scan must skip it.
        assert_eq!(
            collect_prefix(&storage, b"a", Direction::Backward),
            vec!["a3", "a2", "a1", "a"]
        );
        assert_eq!(
            collect_prefix(&storage, b"b", Direction::Backward),
            vec!["b1", "b"]
        );
    }

    #[test]
    fn range_scan_in_both_directions() {
        let (_dir, storage) = open_with(&["k1", "k2", "k3", "k4"]);

        assert_eq!(
            collect_range(&storage, b"k2", b"k3", Direction::Forward),
            vec!["k2", "k3"]
        );
        assert_eq!(
            collect_range(&storage, b"k2", b"k3", Direction::Backward),
            vec!["k3", "k2"]
        );
        // Bounds that fall between stored keys.
        assert_eq!(
            collect_range(&storage, b"k0", b"k25", Direction::Backward),
            vec!["k2", "k1"]
        );
        assert!(collect_range(&storage, b"k3", b"k2", Direction::Forward).is_empty());
    }

    #[test]
    fn scan_stops_when_visitor_breaks() {
        let (_dir, storage) = open_with(&["k1", "k2", "k3"]);

        let mut seen = vec![];
        storage
            .scan(
                Bound::Unbounded,
                Bound::Unbounded,
                Direction::Backward,
                &mut |key, _| {
                    seen.push(key.to_vec());
                    ControlFlow::Break(())
                },
            )
            .unwrap();

        assert_eq!(seen, vec![b"k3".to_vec()]);
    }

    #[test]
    fn batches_are_visible_after_reopening() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = RocksStorage::open(dir.path()).unwrap();
            let mut batch = WriteBatch::new();
            batch.put("a", "1");
            batch.put("b", "2");
            batch.delete("a");
            storage.write(batch).unwrap();
        }

        let storage = RocksStorage::open(dir.path()).unwrap();
        assert_eq!(storage.get(b"a").unwrap(), None);
        assert_eq!(storage.get(b"b").unwrap(), Some(Bytes::from("2")));
    }
}
