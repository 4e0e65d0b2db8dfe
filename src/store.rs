use bytes::Bytes;
use glob_match::glob_match;
use std::collections::HashMap;
use std::ops::{ControlFlow, Deref};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error as ThisError;
use tracing::debug;

use crate::keys::{self, KeyType};
use crate::metrics::Metrics;
use crate::storage::{Direction, MemoryStorage, Storage, StorageError, WriteBatch};
use crate::structures::{Hash, List, Set, SortedSet, Structure, StructureError};

/// Registries smaller than this are never swept for idle empty instances.
const SWEEP_THRESHOLD: usize = 1024;

#[derive(Debug, ThisError, PartialEq)]
pub enum StoreError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error(transparent)]
    Structure(#[from] StructureError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The Store hands out the one structure instance bound to each key, and owns the plain string
/// values. It is cheap to clone and shared by every connection.
#[derive(Clone)]
pub struct Store {
    inner: Arc<InnerStore>,
}

impl Store {
    pub fn new(storage: Arc<dyn Storage>, metrics: Arc<Metrics>) -> Store {
        let inner = Arc::new(InnerStore {
            storage,
            metrics,
            registry: Mutex::new(Registry {
                entries: HashMap::new(),
                sweep_at: SWEEP_THRESHOLD,
            }),
        });

        Self { inner }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(Arc::new(MemoryStorage::new()), Arc::new(Metrics::new()))
    }
}

impl Deref for Store {
    type Target = InnerStore;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

pub struct InnerStore {
    storage: Arc<dyn Storage>,
    metrics: Arc<Metrics>,
    registry: Mutex<Registry>,
}

struct Registry {
    entries: HashMap<Bytes, Entry>,
    sweep_at: usize,
}

impl Registry {
    /// Drops empty instances nobody else holds. Handles are only given out under the registry
    /// lock, so a count of one means no other caller can still reach the instance.
    fn sweep(&mut self) {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.handles() > 1 || !entry.structure().is_empty());
        self.sweep_at = (self.entries.len() * 2).max(SWEEP_THRESHOLD);
        debug!(
            before,
            after = self.entries.len(),
            "swept idle structures from the registry"
        );
    }
}

enum Entry {
    List(Arc<List>),
    SortedSet(Arc<SortedSet>),
    Hash(Arc<Hash>),
    Set(Arc<Set>),
}

impl Entry {
    fn structure(&self) -> &dyn Structure {
        match self {
            Entry::List(list) => list.as_ref(),
            Entry::SortedSet(zset) => zset.as_ref(),
            Entry::Hash(hash) => hash.as_ref(),
            Entry::Set(set) => set.as_ref(),
        }
    }

    fn handles(&self) -> usize {
        match self {
            Entry::List(list) => Arc::strong_count(list),
            Entry::SortedSet(zset) => Arc::strong_count(zset),
            Entry::Hash(hash) => Arc::strong_count(hash),
            Entry::Set(set) => Arc::strong_count(set),
        }
    }
}

/// A structure type the registry can cache.
trait Cached: Structure + Sized {
    const KEY_TYPE: KeyType;

    fn open(storage: Arc<dyn Storage>, key: Bytes) -> Result<Self, StructureError>;

    fn wrap(this: Arc<Self>) -> Entry;

    fn unwrap(entry: &Entry) -> Option<Arc<Self>>;
}

macro_rules! cached {
    ($ty:ident, $variant:ident, $key_type:expr) => {
        impl Cached for $ty {
            const KEY_TYPE: KeyType = $key_type;

            fn open(storage: Arc<dyn Storage>, key: Bytes) -> Result<Self, StructureError> {
                $ty::open(storage, key)
            }

            fn wrap(this: Arc<Self>) -> Entry {
                Entry::$variant(this)
            }

            fn unwrap(entry: &Entry) -> Option<Arc<Self>> {
                match entry {
                    Entry::$variant(this) => Some(this.clone()),
                    _ => None,
                }
            }
        }
    };
}

cached!(List, List, KeyType::List);
cached!(SortedSet, SortedSet, KeyType::SortedSet);
cached!(Hash, Hash, KeyType::Hash);
cached!(Set, Set, KeyType::Set);

impl InnerStore {
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn list(&self, key: &Bytes) -> Result<Arc<List>, StoreError> {
        self.structure(key)
    }

    pub fn sorted_set(&self, key: &Bytes) -> Result<Arc<SortedSet>, StoreError> {
        self.structure(key)
    }

    pub fn hash(&self, key: &Bytes) -> Result<Arc<Hash>, StoreError> {
        self.structure(key)
    }

    pub fn set(&self, key: &Bytes) -> Result<Arc<Set>, StoreError> {
        self.structure(key)
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn structure<T: Cached>(&self, key: &Bytes) -> Result<Arc<T>, StoreError> {
        let mut registry = self.lock();

        if let Some(entry) = registry.entries.get(key) {
            if let Some(this) = T::unwrap(entry) {
                // An empty instance may be stale: the key can have been rewritten as another
                // type while a command still held this handle.
                if !this.is_empty() || !self.holds_other_type::<T>(key)? {
                    return Ok(this);
                }
                drop(this);
                if entry.handles() == 1 {
                    registry.entries.remove(key);
                }
                return Err(StoreError::WrongType);
            }
            // An idle empty instance of another type may be replaced.
            if entry.handles() > 1 || !entry.structure().is_empty() {
                return Err(StoreError::WrongType);
            }
            registry.entries.remove(key);
        }

        if self.holds_other_type::<T>(key)? {
            return Err(StoreError::WrongType);
        }

        if registry.entries.len() >= registry.sweep_at {
            registry.sweep();
        }

        let this = Arc::new(T::open(self.storage.clone(), key.clone())?);
        registry.entries.insert(key.clone(), T::wrap(this.clone()));
        debug!(?key, key_type = %T::KEY_TYPE, "opened structure");
        Ok(this)
    }

    fn holds_other_type<T: Cached>(&self, key: &[u8]) -> Result<bool, StorageError> {
        Ok(self
            .stored_types(key)?
            .into_iter()
            .any(|stored| stored != T::KEY_TYPE))
    }

    /// Types recorded in the info rows of `key`. A consistent store holds at most one.
    fn stored_types(&self, key: &[u8]) -> Result<Vec<KeyType>, StorageError> {
        let mut types = vec![];
        self.storage.scan_prefix(
            &keys::info_prefix(key),
            Direction::Forward,
            &mut |row, _| {
                if let Some((_, key_type)) = keys::parse_info_key(row) {
                    types.push(key_type);
                }
                ControlFlow::Continue(())
            },
        )?;
        Ok(types)
    }

    pub fn key_type(&self, key: &[u8]) -> Result<Option<KeyType>, StoreError> {
        Ok(self.stored_types(key)?.into_iter().next())
    }

    pub fn exists(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.key_type(key)?.is_some())
    }

    /// Returns the string stored at `key`. Keys holding a structure are a type error.
    pub fn get(&self, key: &[u8]) -> Result<Option<Bytes>, StoreError> {
        if let Some(value) = self.storage.get(&keys::info_key(key, KeyType::String))? {
            return Ok(Some(value));
        }
        match self.key_type(key)? {
            Some(_) => Err(StoreError::WrongType),
            None => Ok(None),
        }
    }

    /// Stores a string at `key`, discarding whatever the key held before.
    pub fn set_string(&self, key: &Bytes, value: Bytes) -> Result<(), StoreError> {
        let mut registry = self.lock();
        self.clear_structure(&mut registry, key)?;

        let mut batch = WriteBatch::new();
        batch.put(keys::info_key(key, KeyType::String), value);
        self.storage.write(batch)?;
        Ok(())
    }

    /// Removes every row of `key`. Returns whether the key existed.
    pub fn del(&self, key: &Bytes) -> Result<bool, StoreError> {
        let mut registry = self.lock();
        let mut existed = self.clear_structure(&mut registry, key)?;

        let string_key = keys::info_key(key, KeyType::String);
        if self.storage.get(&string_key)?.is_some() {
            let mut batch = WriteBatch::new();
            batch.delete(string_key);
            self.storage.write(batch)?;
            existed = true;
        }
        Ok(existed)
    }

    /// Clears the structure held by `key`, cached or not, and evicts the cached instance when
    /// nobody else holds it.
    fn clear_structure(&self, registry: &mut Registry, key: &Bytes) -> Result<bool, StoreError> {
        let mut cleared = false;

        if let Some(entry) = registry.entries.get(key) {
            let structure = entry.structure();
            if !structure.is_empty() {
                structure.clear()?;
                cleared = true;
            }
            if entry.handles() == 1 {
                registry.entries.remove(key);
            }
        }

        for key_type in self.stored_types(key)? {
            let storage = self.storage.clone();
            let structure: Box<dyn Structure> = match key_type {
                KeyType::String => continue,
                KeyType::List => Box::new(List::open(storage, key.clone())?),
                KeyType::SortedSet => Box::new(SortedSet::open(storage, key.clone())?),
                KeyType::Hash => Box::new(Hash::open(storage, key.clone())?),
                KeyType::Set => Box::new(Set::open(storage, key.clone())?),
            };
            structure.clear()?;
            cleared = true;
        }

        Ok(cleared)
    }

    /// Every key whose name matches the glob `pattern`, in byte order.
    pub fn keys(&self, pattern: &str) -> Result<Vec<Bytes>, StoreError> {
        let mut matched: Vec<Bytes> = vec![];
        self.storage.scan_prefix(
            &keys::info_space(),
            Direction::Forward,
            &mut |row, _| {
                if let Some((key, _)) = keys::parse_info_key(row) {
                    if glob_match(pattern, &String::from_utf8_lossy(&key)) {
                        matched.push(key);
                    }
                }
                ControlFlow::Continue(())
            },
        )?;
        // Rows are grouped by key length first, so restore plain byte order.
        matched.sort();
        matched.dedup();
        Ok(matched)
    }
}
