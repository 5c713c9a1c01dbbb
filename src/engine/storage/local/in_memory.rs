use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use anyhow::{anyhow, Result};
use crate::engine::storage::area::{LocalStore, StorageArea};

/// In‑memory local storage (no persistence). Used as a default when no storage is defined by the host.
#[derive(Default)]
pub struct InMemoryLocalStore {
    areas: Mutex<HashMap<url::Origin, Arc<dyn StorageArea>>>,
}

impl InMemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for InMemoryLocalStore {
    fn area(&self, origin: &url::Origin) -> Result<Arc<dyn StorageArea>> {
        let mut guard = self
            .areas
            .lock()
            .map_err(|_| anyhow!("local store lock poisoned"))?;
        Ok(guard
            .entry(origin.clone())
            .or_insert_with(|| Arc::new(InMemoryLocalArea::default()) as Arc<dyn StorageArea>)
            .clone())
    }
}

/// A single in-memory storage area. Can be used directly when no origin scoping is needed.
#[derive(Default)]
pub struct InMemoryLocalArea {
    map: Mutex<HashMap<String, String>>,
}

impl InMemoryLocalArea {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.map.lock().map_err(|_| anyhow!("storage area lock poisoned"))
    }
}

impl StorageArea for InMemoryLocalArea {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.map()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.map()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.map()?.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.map()?.clear();
        Ok(())
    }

    fn len(&self) -> usize {
        self.map().map(|m| m.len()).unwrap_or(0)
    }

    fn keys(&self) -> Vec<String> {
        let mut v: Vec<String> = self
            .map()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        v.sort_unstable();
        v
    }
}
