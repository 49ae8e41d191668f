use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;

/// Byte-oriented key-value store underlying accounts, balances, contracts
/// and module state.
pub trait KvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;
    fn set(&mut self, key: &[u8], value: Vec<u8>) -> Result<()>;
    fn delete(&mut self, key: &[u8]) -> Result<()>;
}

/// Typed helpers on top of any [`KvStore`], values are bincode encoded.
pub trait KvStoreExt: KvStore {
    fn get_value<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key.as_bytes())? {
            Some(data) => Ok(Some(bincode::deserialize(&data)?)),
            None => Ok(None),
        }
    }

    fn put_value<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let serialized = bincode::serialize(value)?;
        self.set(key.as_bytes(), serialized)
    }

    fn has(&self, key: &str) -> Result<bool> {
        Ok(self.get(key.as_bytes())?.is_some())
    }
}

impl<S: KvStore + ?Sized> KvStoreExt for S {}

/// In-memory ordered store, used for simulation and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.entries.insert(key.to_vec(), value);
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Durable store backed by a sled database.
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl KvStore for SledStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(key)?.map(|v| v.to_vec()))
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.db.insert(key, value)?;
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.db.remove(key)?;
        Ok(())
    }
}

/// Write overlay on top of a parent store.
///
/// Reads check the overlay first and fall through to the parent. Nothing
/// reaches the parent until [`BranchStore::commit`]; dropping the branch
/// discards every write.
pub struct BranchStore<'a> {
    parent: &'a mut dyn KvStore,
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> BranchStore<'a> {
    pub fn new(parent: &'a mut dyn KvStore) -> Self {
        Self {
            parent,
            writes: BTreeMap::new(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        !self.writes.is_empty()
    }

    pub fn commit(self) -> Result<()> {
        for (key, value) in self.writes {
            match value {
                Some(value) => self.parent.set(&key, value)?,
                None => self.parent.delete(&key)?,
            }
        }
        Ok(())
    }
}

impl KvStore for BranchStore<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.writes.get(key) {
            Some(value) => Ok(value.clone()),
            None => self.parent.get(key),
        }
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.writes.insert(key.to_vec(), Some(value));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.writes.insert(key.to_vec(), None);
        Ok(())
    }
}
