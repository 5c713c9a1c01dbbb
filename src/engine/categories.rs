//! Cookie categories: [`CategoryDefinition`] and [`CategoryRegistry`].
//!
//! A category is a group of cookies/trackers the visitor can consent to as a
//! whole ("essential", "analytics", "marketing", ...). Required categories are
//! always granted and cannot be toggled. The registry keeps the configured
//! order, which drives rendering and callback order.

use crate::engine::callback::Callback;
use std::collections::HashSet;

/// A single configured category. Immutable for the lifetime of a widget instance.
#[derive(Clone, Debug, Default)]
pub struct CategoryDefinition {
    /// Unique id within a registry, also part of the storage key
    pub id: String,
    /// Display name shown in the preferences modal
    pub name: Option<String>,
    /// Display description shown in the preferences modal
    pub description: Option<String>,
    /// Required categories are always granted
    pub required: bool,
    /// Value assumed before any stored decision exists (non-required only)
    pub default_value: bool,
    /// Runs when the category is granted
    pub on_accept: Option<Callback>,
    /// Runs when the category is denied
    pub on_reject: Option<Callback>,
}

impl CategoryDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn default_value(mut self, value: bool) -> Self {
        self.default_value = value;
        self
    }

    pub fn on_accept(mut self, cb: impl Into<Callback>) -> Self {
        self.on_accept = Some(cb.into());
        self
    }

    pub fn on_reject(mut self, cb: impl Into<Callback>) -> Self {
        self.on_reject = Some(cb.into());
        self
    }

    /// Value used when nothing has been stored yet.
    pub fn initial_value(&self) -> bool {
        self.required || self.default_value
    }
}

/// Ordered list of categories with lookup by id.
#[derive(Clone, Debug, Default)]
pub struct CategoryRegistry {
    categories: Vec<CategoryDefinition>,
}

impl CategoryRegistry {
    /// Builds a registry. Entries with an empty id and duplicate ids (after the first) are
    /// dropped; neither is fatal for the rest of the list.
    pub fn new(definitions: impl IntoIterator<Item = CategoryDefinition>) -> Self {
        let mut seen = HashSet::new();
        let mut categories = Vec::new();

        for def in definitions {
            if def.id.trim().is_empty() {
                log::warn!("ignoring cookie category without an id");
                continue;
            }
            if !seen.insert(def.id.clone()) {
                log::warn!("ignoring duplicate cookie category '{}'", def.id);
                continue;
            }
            categories.push(def);
        }

        Self { categories }
    }

    pub fn get(&self, id: &str) -> Option<&CategoryDefinition> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryDefinition> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
