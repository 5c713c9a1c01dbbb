use anyhow::Result;
use std::sync::Arc;

/// Object-safe key/value storage area (DOM's Storage).
pub trait StorageArea: Send + Sync {
    /// Retrieves the value associated with the given key, or `None` if not found.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Sets the value for the given key, overwriting any existing value.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removes the item with the given key.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Clears all items in the storage area.
    fn clear(&self) -> Result<()>;

    /// Returns the number of items in the storage area.
    fn len(&self) -> usize;

    /// Returns true when the storage area holds no items.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a vector of all keys in the storage area.
    fn keys(&self) -> Vec<String>;
}

/// Store for localStorage-like areas (one area per origin, shared by every widget on that origin).
pub trait LocalStore: Send + Sync {
    /// Retrieves the storage area for the given origin.
    fn area(&self, origin: &url::Origin) -> Result<Arc<dyn StorageArea>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::storage::InMemoryLocalStore;

    fn set(area: &Arc<dyn StorageArea>, k: &str, v: &str) {
        area.set_item(k, v).unwrap();
    }

    fn o(s: &str) -> url::Origin {
        let url = url::Url::parse(s).expect("valid URL");
        url.origin()
    }

    #[test]
    fn storagearea_basic_contract() {
        let store = InMemoryLocalStore::new();
        let area = store.area(&o("https://example.com")).unwrap();

        // starts empty
        assert!(area.is_empty());
        assert!(area.get_item("missing").unwrap().is_none());

        set(&area, "a", "1");
        set(&area, "b", "2");
        assert_eq!(area.len(), 2);
        assert_eq!(area.get_item("a").unwrap().as_deref(), Some("1"));

        // overwrite keeps len()
        set(&area, "a", "ONE");
        assert_eq!(area.len(), 2);
        assert_eq!(area.get_item("a").unwrap().as_deref(), Some("ONE"));

        area.remove_item("b").unwrap();
        assert_eq!(area.keys(), vec!["a".to_string()]);

        area.clear().unwrap();
        assert!(area.is_empty());
    }
}
