use std::sync::Arc;
use anyhow::{bail, Result};
use crate::engine::storage::area::{LocalStore, StorageArea};

/// Storage that refuses every operation, like a browser with storage disabled or a full quota.
/// Every read and write fails; the consent store turns those failures into "absent" and no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStorage;

impl LocalStore for UnavailableStorage {
    fn area(&self, _origin: &url::Origin) -> Result<Arc<dyn StorageArea>> {
        Ok(Arc::new(UnavailableStorage))
    }
}

impl StorageArea for UnavailableStorage {
    fn get_item(&self, _key: &str) -> Result<Option<String>> {
        bail!("storage is unavailable")
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<()> {
        bail!("storage is unavailable")
    }

    fn remove_item(&self, _key: &str) -> Result<()> {
        bail!("storage is unavailable")
    }

    fn clear(&self) -> Result<()> {
        bail!("storage is unavailable")
    }

    fn len(&self) -> usize {
        0
    }

    fn keys(&self) -> Vec<String> {
        vec![]
    }
}
