//! Consent engine.
//!
//! A [`LifecycleManager`](lifecycle::LifecycleManager) owns at most one live
//! [`WidgetInstance`](instance::WidgetInstance). Each instance pairs a
//! [`ConsentEngine`](consent::ConsentEngine), which decides and persists, with a
//! [`PresentationController`](presentation::PresentationController), which turns
//! the engine's surface into [`ViewCommand`](events::ViewCommand)s for the host's
//! [`View`](view::View).

pub mod callback;
pub mod categories;
pub mod config;
pub mod consent;
pub mod consent_store;
pub mod errors;
pub mod events;
pub mod instance;
pub mod lifecycle;
pub mod presentation;
pub mod storage;
pub mod view;

#[cfg(test)]
mod testing;

pub use callback::Callback;
pub use categories::{CategoryDefinition, CategoryRegistry};
pub use config::{BannerConfig, ConfigError, ConfigUpdate, LifecycleHooks};
pub use consent::{ConsentEngine, Decision, EngineState, Surface};
pub use errors::ConsentError;
pub use events::{ViewCommand, ViewEvent};
pub use instance::{WidgetId, WidgetInstance};
pub use lifecycle::LifecycleManager;
pub use view::{NullView, ScrollLock, View, ViewFactory};
