//! Storage system for the consent engine.
//!
//! This module defines the traits and implementations of the durable key/value
//! persistence that consent decisions are written to. The semantics follow
//! HTML5 **LocalStorage**: synchronous, string keyed, scoped per origin, with
//! no expiry. Every widget on the same origin shares one area.
//!
//! All stores implement the [`StorageArea`] trait, which provides the basic API
//! for `get_item`, `set_item`, `remove_item`, and `clear`. A [`LocalStore`] hands
//! out the area belonging to an origin.
//!
//! # Available types
//!
//! - [`StorageArea`]: Trait for any storage backend.
//! - [`LocalStore`]: Provisions one area per `url::Origin`.
//! - [`InMemoryLocalStore`]: In-memory backend, lost when the process ends.
//! - [`SqliteLocalStore`]: SQLite-backed persistent backend (feature `sqlite_store`).
//! - [`UnavailableStorage`]: Backend where every operation fails (storage disabled).
//!
//! # Example
//!
//! ```no_run
//! use silktide_consent::storage::{LocalStore, SqliteLocalStore};
//!
//! let store = SqliteLocalStore::new("local.db").unwrap();
//! let origin = url::Url::parse("https://example.com").unwrap().origin();
//! let area = store.area(&origin).unwrap();
//! area.set_item("greeting", "hello").unwrap();
//! ```
//!
//! Failures surface as `anyhow::Result`. The [`ConsentStore`](crate::consent_store::ConsentStore)
//! sitting on top of an area is responsible for degrading them.

/// Storage area module, defining the key/value storage interface.
pub mod area;

/// Local storage module, providing the storage backends.
pub mod local {
    /// In-memory local storage implementation.
    pub mod in_memory;
    /// SQLite-backed local storage implementation.
    #[cfg(feature = "sqlite_store")]
    pub mod sqlite_store;
    /// Storage that is switched off.
    pub mod unavailable;
}

pub use area::{LocalStore, StorageArea};
pub use local::in_memory::{InMemoryLocalArea, InMemoryLocalStore};
#[cfg(feature = "sqlite_store")]
pub use local::sqlite_store::SqliteLocalStore;
pub use local::unavailable::UnavailableStorage;
