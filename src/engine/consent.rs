//! The consent engine: a small state machine that decides which surface the
//! visitor should see, turns a visitor's choice into persisted consent
//! records, and fires the category callbacks.
//!
//! States per widget instance: `Uninitialized → FirstRunPending → Decided`.
//! The first-run flag write is the commit point of the single transition to
//! `Decided`.
//!
//! Applying a choice happens in three separate steps:
//! 1. [`resolve_decision`] computes the effective value of every category
//!    (pure, no storage or callbacks involved),
//! 2. the records and the first-run flag are written,
//! 3. the callbacks are fired, each one isolated from the others.

use crate::engine::callback::{fire, Callback};
use crate::engine::categories::CategoryRegistry;
use crate::engine::config::BannerConfig;
use crate::engine::consent_store::ConsentStore;
use crate::engine::errors::ConsentError;
use crate::engine::view::CheckboxState;
use std::collections::BTreeMap;

/// Lifecycle state of the engine.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// The store has not been consulted yet
    #[default]
    Uninitialized,
    /// No first-run decision has been made
    FirstRunPending,
    /// The visitor has accepted, rejected or saved preferences
    Decided,
}

/// The UI surface that should be visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Banner,
    Modal,
    Icon,
    None,
}

/// A visitor's choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    AcceptAll,
    RejectAll,
    /// Per-category values, usually the modal's checkbox snapshot
    PerCategory(BTreeMap<String, bool>),
}

impl Decision {
    pub fn per_category<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = (S, bool)>,
        S: Into<String>,
    {
        Decision::PerCategory(values.into_iter().map(|(id, v)| (id.into(), v)).collect())
    }
}

/// Effective granted value of every category, in registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectiveDecision {
    entries: Vec<(String, bool)>,
}

impl EffectiveDecision {
    pub fn get(&self, id: &str) -> Option<bool> {
        self.entries.iter().find(|(k, _)| k == id).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Computes the effective value of every category for `decision`.
///
/// Required categories are always granted. For a per-category decision, an id
/// missing from the mapping keeps its stored value, or falls back to the
/// category default. Ids that are not in the registry are ignored.
pub fn resolve_decision(
    registry: &CategoryRegistry,
    decision: &Decision,
    stored: impl Fn(&str) -> Option<bool>,
) -> EffectiveDecision {
    if let Decision::PerCategory(values) = decision {
        for id in values.keys().filter(|id| !registry.contains(id)) {
            log::debug!("ignoring decision for unknown cookie category '{id}'");
        }
    }

    let entries = registry
        .iter()
        .map(|category| {
            let granted = category.required
                || match decision {
                    Decision::AcceptAll => true,
                    Decision::RejectAll => false,
                    Decision::PerCategory(values) => values
                        .get(&category.id)
                        .copied()
                        .or_else(|| stored(&category.id))
                        .unwrap_or_else(|| category.initial_value()),
                };
            (category.id.clone(), granted)
        })
        .collect();

    EffectiveDecision { entries }
}

/// What [`ConsentEngine::apply_choice`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// The values that were written
    pub effective: EffectiveDecision,
    /// False when at least one storage write was dropped
    pub persisted: bool,
    /// Callbacks invoked, in order
    pub fired: Vec<String>,
}

pub struct ConsentEngine {
    registry: CategoryRegistry,
    store: ConsentStore,
    show_banner: bool,
    on_accept_all: Option<Callback>,
    on_reject_all: Option<Callback>,
    state: EngineState,
    /// Preferences modal explicitly requested
    modal_open: bool,
    /// Checkbox values while the modal is open, in registry order
    checkboxes: Vec<(String, bool)>,
}

impl ConsentEngine {
    pub fn new(registry: CategoryRegistry, store: ConsentStore) -> Self {
        Self {
            registry,
            store,
            show_banner: true,
            on_accept_all: None,
            on_reject_all: None,
            state: EngineState::Uninitialized,
            modal_open: false,
            checkboxes: Vec::new(),
        }
    }

    /// Builds an engine from the categories, hooks and banner flag of `config`.
    pub fn from_config(config: &BannerConfig, store: ConsentStore) -> Self {
        let mut engine = Self::new(CategoryRegistry::new(config.cookie_types.clone()), store);
        engine.show_banner = config.show_banner;
        engine.on_accept_all = config.hooks.on_accept_all.clone();
        engine.on_reject_all = config.hooks.on_reject_all.clone();
        engine
    }

    pub fn with_show_banner(mut self, show: bool) -> Self {
        self.show_banner = show;
        self
    }

    pub fn with_on_accept_all(mut self, cb: impl Into<Callback>) -> Self {
        self.on_accept_all = Some(cb.into());
        self
    }

    pub fn with_on_reject_all(mut self, cb: impl Into<Callback>) -> Self {
        self.on_reject_all = Some(cb.into());
        self
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn store(&self) -> &ConsentStore {
        &self.store
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_decided(&self) -> bool {
        self.state == EngineState::Decided
    }

    /// Consults the store for a prior decision. A returning visitor gets their accepted
    /// callbacks fired right away. Returns the surface to show.
    pub fn start(&mut self) -> Surface {
        if self.state != EngineState::Uninitialized {
            log::warn!("consent engine already started");
            return self.current_surface();
        }

        if self.registry.is_empty() {
            log::debug!("no cookie categories configured, nothing to decide");
            self.state = EngineState::Decided;
        } else if self.store.initial_choice_made() {
            self.state = EngineState::Decided;
            self.load_persisted_state();
        } else {
            self.state = EngineState::FirstRunPending;
            if !self.show_banner {
                self.apply_defaults();
            }
        }

        log::debug!("consent engine started in state {:?}", self.state);
        self.current_surface()
    }

    pub fn current_surface(&self) -> Surface {
        match self.state {
            EngineState::Uninitialized => Surface::None,
            _ if self.modal_open => Surface::Modal,
            EngineState::FirstRunPending if self.show_banner => Surface::Banner,
            _ => Surface::Icon,
        }
    }

    /// Requests the preferences modal and seeds the checkboxes from the store. Writes nothing.
    pub fn open_preferences(&mut self) -> Result<(), ConsentError> {
        if self.state == EngineState::Uninitialized {
            return Err(ConsentError::NotStarted);
        }

        self.checkboxes = self
            .registry
            .iter()
            .map(|c| {
                let checked = c.required || self.store.consent_for(&c.id).unwrap_or_else(|| c.initial_value());
                (c.id.clone(), checked)
            })
            .collect();
        self.modal_open = true;
        Ok(())
    }

    pub fn is_preferences_open(&self) -> bool {
        self.modal_open
    }

    /// Updates the checkbox snapshot. Unknown and required categories are ignored.
    pub fn toggle_checkbox(&mut self, id: &str, checked: bool) -> bool {
        if !self.modal_open {
            log::debug!("ignoring toggle of '{id}': preferences are not open");
            return false;
        }
        if self.registry.get(id).is_some_and(|c| c.required) {
            log::debug!("ignoring toggle of required category '{id}'");
            return false;
        }

        match self.checkboxes.iter_mut().find(|(k, _)| k == id) {
            Some((_, value)) => {
                *value = checked;
                true
            }
            None => {
                log::debug!("ignoring toggle of unknown category '{id}'");
                false
            }
        }
    }

    pub fn checkbox_states(&self) -> Vec<CheckboxState> {
        self.checkboxes
            .iter()
            .map(|(id, checked)| CheckboxState {
                id: id.clone(),
                checked: *checked,
                disabled: self.registry.get(id).is_some_and(|c| c.required),
            })
            .collect()
    }

    /// Closes the modal, persisting whatever the checkboxes show. `None` when the modal
    /// was not open.
    pub fn close_preferences(&mut self) -> Result<Option<ApplyOutcome>, ConsentError> {
        if !self.modal_open {
            return Ok(None);
        }

        let snapshot = Decision::per_category(self.checkboxes.clone());
        self.apply_choice(snapshot).map(Some)
    }

    /// Persists `decision` for every category, commits the first-run decision and fires
    /// the callbacks.
    pub fn apply_choice(&mut self, decision: Decision) -> Result<ApplyOutcome, ConsentError> {
        if self.state == EngineState::Uninitialized {
            return Err(ConsentError::NotStarted);
        }

        let effective = resolve_decision(&self.registry, &decision, |id| self.store.consent_for(id));

        let mut persisted = true;
        for (id, granted) in effective.iter() {
            persisted &= self.store.set_consent(id, granted);
        }
        persisted &= self.store.mark_initial_choice();
        if !persisted {
            log::warn!("consent decision could not be fully persisted");
        }

        if self.state == EngineState::FirstRunPending {
            log::info!("first-run consent decision committed");
        }
        self.state = EngineState::Decided;
        self.modal_open = false;
        self.checkboxes.clear();

        let mut fired = Vec::new();
        for (id, granted) in effective.iter() {
            let Some(category) = self.registry.get(id) else {
                continue;
            };
            let (callback, name) = if granted {
                (category.on_accept.as_ref(), format!("{id}.on_accept"))
            } else {
                (category.on_reject.as_ref(), format!("{id}.on_reject"))
            };
            if fire(callback, &name) {
                fired.push(name);
            }
        }

        let hook = match decision {
            Decision::AcceptAll => Some((self.on_accept_all.as_ref(), "on_accept_all")),
            Decision::RejectAll => Some((self.on_reject_all.as_ref(), "on_reject_all")),
            Decision::PerCategory(_) => None,
        };
        if let Some((callback, name)) = hook {
            if fire(callback, name) {
                fired.push(name.to_string());
            }
        }

        Ok(ApplyOutcome { effective, persisted, fired })
    }

    /// Fires the accept callbacks of a returning visitor: every required category, and every
    /// category whose stored value is granted. Never fires reject callbacks, never writes.
    pub fn load_persisted_state(&self) -> Vec<String> {
        let mut fired = Vec::new();
        for category in self.registry.iter() {
            if !category.required && self.store.consent_for(&category.id) != Some(true) {
                continue;
            }
            let name = format!("{}.on_accept", category.id);
            if fire(category.on_accept.as_ref(), &name) {
                fired.push(name);
            }
        }
        fired
    }

    /// Puts the category defaults into effect when no banner asks the visitor: fires
    /// `on_accept` of every category granted by default. Writes nothing, commits nothing.
    fn apply_defaults(&self) {
        log::debug!("banner suppressed, category defaults in effect");
        let defaults = resolve_decision(&self.registry, &Decision::PerCategory(BTreeMap::new()), |id| {
            self.store.consent_for(id)
        });

        for (id, _) in defaults.iter().filter(|(_, granted)| *granted) {
            if let Some(category) = self.registry.get(id) {
                fire(category.on_accept.as_ref(), &format!("{id}.on_accept"));
            }
        }
    }

    /// Whether `id` is currently granted: the stored value, else the category default.
    pub fn is_granted(&self, id: &str) -> bool {
        match self.registry.get(id) {
            Some(c) if c.required => true,
            Some(c) => self.store.consent_for(&c.id).unwrap_or(c.default_value),
            None => false,
        }
    }

    /// Drops a preferences request the view could not honour. Writes nothing.
    pub fn cancel_preferences(&mut self) {
        if self.modal_open {
            log::debug!("preferences request cancelled");
        }
        self.modal_open = false;
        self.checkboxes.clear();
    }

    /// Granted state of every category, stored values first, defaults otherwise.
    pub fn consent_snapshot(&self) -> EffectiveDecision {
        EffectiveDecision {
            entries: self
                .registry
                .iter()
                .map(|c| (c.id.clone(), self.is_granted(&c.id)))
                .collect(),
        }
    }
}
