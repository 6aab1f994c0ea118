use std::sync::Arc;

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};

use crate::{errors::AppError, repositories::store::KeyValueStore};

/// Process-local store. Clones share the same map.
#[derive(Debug)]
pub struct MemoryStore<V> {
    map: Arc<DashMap<String, V>>,
}

impl<V> MemoryStore<V> {
    pub fn new() -> Self {
        MemoryStore {
            map: Arc::new(DashMap::new()),
        }
    }
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for MemoryStore<V> {
    fn clone(&self) -> Self {
        MemoryStore {
            map: Arc::clone(&self.map),
        }
    }
}

#[async_trait]
impl<V> KeyValueStore<V> for MemoryStore<V>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>, AppError> {
        Ok(self.map.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: V) -> Result<(), AppError> {
        self.map.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<Option<V>, AppError> {
        Ok(self.map.remove(key).map(|(_, value)| value))
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&V>,
        new: Option<V>,
    ) -> Result<bool, AppError> {
        // The entry guard holds the shard lock for the whole compare and write.
        match self.map.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if expected != Some(occupied.get()) {
                    return Ok(false);
                }
                match new {
                    Some(value) => {
                        occupied.insert(value);
                    }
                    None => {
                        occupied.remove();
                    }
                }
                Ok(true)
            }
            Entry::Vacant(vacant) => {
                if expected.is_some() {
                    return Ok(false);
                }
                if let Some(value) = new {
                    vacant.insert(value);
                }
                Ok(true)
            }
        }
    }

    async fn purge(&self, predicate: &(dyn for<'a> Fn(&'a V) -> bool + Send + Sync)) -> Result<usize, AppError> {
        let mut removed = 0;
        self.map.retain(|_, value| {
            let drop = predicate(value);
            if drop {
                removed += 1;
            }
            !drop
        });
        Ok(removed)
    }

    async fn count(&self) -> Result<usize, AppError> {
        Ok(self.map.len())
    }
}
