//! Consent persistence on top of a [`StorageArea`].
//!
//! The store namespaces keys per banner instance (the optional suffix lets
//! several independent banners share one origin) and never fails: storage
//! errors are logged and turned into "absent" reads and no-op writes, so a
//! visitor with storage disabled simply gets the first-run experience on
//! every page load.

use crate::engine::categories::CategoryRegistry;
use crate::engine::storage::StorageArea;
use std::sync::Arc;

/// Key prefix of the per-category consent records.
pub const CHOICE_KEY_PREFIX: &str = "silktideCookieChoice_";
/// Key of the first-run flag (before the suffix).
pub const INITIAL_CHOICE_KEY: &str = "silktideCookieBanner_InitialChoice";
/// Value written for the first-run flag. Anything else reads as "not set".
pub const INITIAL_CHOICE_SENTINEL: &str = "1";

#[derive(Clone)]
pub struct ConsentStore {
    area: Arc<dyn StorageArea>,
    suffix: String,
}

impl std::fmt::Debug for ConsentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsentStore")
            .field("suffix", &self.suffix)
            .finish_non_exhaustive()
    }
}

impl ConsentStore {
    pub fn new(area: Arc<dyn StorageArea>, suffix: impl Into<String>) -> Self {
        Self {
            area,
            suffix: suffix.into(),
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Storage key of the consent record of `category_id`.
    pub fn choice_key(&self, category_id: &str) -> String {
        format!("{CHOICE_KEY_PREFIX}{category_id}{}", self.suffix)
    }

    /// Storage key of the first-run flag.
    pub fn initial_choice_key(&self) -> String {
        format!("{INITIAL_CHOICE_KEY}{}", self.suffix)
    }

    /// Raw read. Storage failures read as absent.
    pub fn get(&self, key: &str) -> Option<String> {
        match self.area.get_item(key) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("storage read of '{key}' failed, treating as absent: {e:#}");
                None
            }
        }
    }

    /// Raw write. Storage failures are a no-op. Returns true when the write went through.
    pub fn set(&self, key: &str, value: &str) -> bool {
        match self.area.set_item(key, value) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("storage write of '{key}' failed, ignoring: {e:#}");
                false
            }
        }
    }

    /// Raw removal. Storage failures are a no-op.
    pub fn remove(&self, key: &str) -> bool {
        match self.area.remove_item(key) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("storage removal of '{key}' failed, ignoring: {e:#}");
                false
            }
        }
    }

    /// Has the visitor completed the first-run decision?
    pub fn initial_choice_made(&self) -> bool {
        self.get(&self.initial_choice_key()).as_deref() == Some(INITIAL_CHOICE_SENTINEL)
    }

    pub fn mark_initial_choice(&self) -> bool {
        self.set(&self.initial_choice_key(), INITIAL_CHOICE_SENTINEL)
    }

    /// Stored decision for a category, `None` when nothing was stored. Any value other than
    /// `"true"` reads as denied.
    pub fn consent_for(&self, category_id: &str) -> Option<bool> {
        self.get(&self.choice_key(category_id))
            .map(|value| value == "true")
    }

    pub fn set_consent(&self, category_id: &str, granted: bool) -> bool {
        self.set(&self.choice_key(category_id), if granted { "true" } else { "false" })
    }

    /// Removes every record of `registry` and the first-run flag for this suffix.
    pub fn forget(&self, registry: &CategoryRegistry) {
        for category in registry.iter() {
            self.remove(&self.choice_key(&category.id));
        }
        self.remove(&self.initial_choice_key());
    }
}
