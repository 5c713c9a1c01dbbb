//! Contracts of the external collaborators that draw the widget.
//!
//! The engine never touches the DOM (or whatever the host draws with). It
//! sends [`ViewCommand`]s to a [`View`] and asks a [`ScrollLock`] to freeze
//! page scrolling while the modal is open. A [`ViewFactory`] produces a fresh
//! view for every widget instance.

use crate::engine::config::{BannerConfig, TextConfig};
use crate::engine::events::ViewCommand;
use crate::engine::instance::WidgetId;
use anyhow::Result;
use std::collections::HashSet;
use std::sync::Arc;

/// Everything the view needs to build its surfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub widget_id: WidgetId,
    pub text: TextConfig,
    pub banner_position: Option<String>,
    pub icon_position: Option<String>,
    pub show_background: bool,
    pub categories: Vec<CategoryView>,
}

impl ViewModel {
    pub fn from_config(widget_id: WidgetId, config: &BannerConfig) -> Self {
        let mut seen = HashSet::new();
        Self {
            widget_id,
            text: config.text.clone(),
            banner_position: config.banner_position.clone(),
            icon_position: config.icon_position.clone(),
            show_background: config.show_background,
            categories: config
                .cookie_types
                .iter()
                .filter(|c| !c.id.trim().is_empty() && seen.insert(c.id.as_str()))
                .map(|c| CategoryView {
                    id: c.id.clone(),
                    name: c.name.clone().unwrap_or_else(|| c.id.clone()),
                    description: c.description.clone().unwrap_or_default(),
                    required: c.required,
                })
                .collect(),
        }
    }
}

/// One category row of the preferences modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub required: bool,
}

/// State of one toggle in the preferences modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckboxState {
    pub id: String,
    pub checked: bool,
    /// Required categories cannot be toggled
    pub disabled: bool,
}

/// Renders the widget surfaces.
pub trait View {
    /// Applies a single command. An error makes the controller fall back to the icon.
    fn apply(&mut self, command: ViewCommand) -> Result<()>;
}

/// Produces one view per widget instance.
pub trait ViewFactory {
    fn create(&mut self) -> Box<dyn View>;
}

impl<F> ViewFactory for F
where
    F: FnMut() -> Box<dyn View>,
{
    fn create(&mut self) -> Box<dyn View> {
        self()
    }
}

/// View that draws nothing. Useful for headless hosts that only want the callbacks.
#[derive(Debug, Default)]
pub struct NullView;

impl View for NullView {
    fn apply(&mut self, _command: ViewCommand) -> Result<()> {
        Ok(())
    }
}

/// Page-wide scroll lock capability.
pub trait ScrollLock: Send + Sync {
    fn lock(&self);
    fn unlock(&self);
}

/// Scroll lock for hosts without a scrollable page.
#[derive(Debug, Default)]
pub struct NoScrollLock;

impl ScrollLock for NoScrollLock {
    fn lock(&self) {}
    fn unlock(&self) {}
}

/// Holds the page scroll lock; releases it when dropped.
pub struct ScrollGuard {
    lock: Arc<dyn ScrollLock>,
}

impl ScrollGuard {
    pub fn acquire(lock: Arc<dyn ScrollLock>) -> Self {
        lock.lock();
        Self { lock }
    }
}

impl Drop for ScrollGuard {
    fn drop(&mut self) {
        self.lock.unlock();
    }
}
