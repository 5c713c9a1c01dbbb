use std::fmt::Display;
use std::sync::Arc;
use uuid::Uuid;
use crate::engine::config::BannerConfig;
use crate::engine::consent::{ConsentEngine, Decision, Surface};
use crate::engine::consent_store::ConsentStore;
use crate::engine::errors::ConsentError;
use crate::engine::events::ViewEvent;
use crate::engine::presentation::PresentationController;
use crate::engine::view::{ScrollLock, View, ViewModel};

/// A unique identifier for a widget instance, represented as a UUID.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(Uuid);

impl WidgetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WidgetId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for WidgetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A live widget: one consent engine and the presentation controller it drives.
///
/// Created from an immutable snapshot of the configuration. Raw view events go in through
/// [`handle_event`](Self::handle_event); the engine decides, the controller shows the result.
pub struct WidgetInstance {
    id: WidgetId,
    engine: ConsentEngine,
    presentation: PresentationController,
}

impl WidgetInstance {
    /// Mounts the view, consults the store and shows the first surface. A returning
    /// visitor's accept callbacks fire during creation.
    pub fn create(
        config: &BannerConfig,
        store: ConsentStore,
        view: Box<dyn View>,
        scroll_lock: Arc<dyn ScrollLock>,
    ) -> Self {
        let id = WidgetId::new();
        let mut engine = ConsentEngine::from_config(config, store);
        let mut presentation = PresentationController::new(
            id,
            view,
            scroll_lock,
            config.hooks.clone(),
            config.show_background,
        );

        if let Err(e) = presentation.mount(ViewModel::from_config(id, config)) {
            log::error!("widget {id}: cannot mount view, continuing headless: {e}");
        }

        let surface = engine.start();
        log::info!("widget {id} created, showing {:?}", surface);

        let mut instance = Self { id, engine, presentation };
        instance.present();
        instance
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn engine(&self) -> &ConsentEngine {
        &self.engine
    }

    pub fn presentation(&self) -> &PresentationController {
        &self.presentation
    }

    pub fn surface(&self) -> Surface {
        self.engine.current_surface()
    }

    /// Feeds a raw user action to the engine and shows the resulting surface.
    pub fn handle_event(&mut self, event: ViewEvent) -> Result<(), ConsentError> {
        log::debug!("widget {}: {}", self.id, event);

        match event {
            ViewEvent::AcceptAllClicked => {
                self.engine.apply_choice(Decision::AcceptAll)?;
            }
            ViewEvent::RejectAllClicked => {
                self.engine.apply_choice(Decision::RejectAll)?;
            }
            ViewEvent::PreferencesClicked | ViewEvent::IconClicked => {
                self.engine.open_preferences()?;
            }
            ViewEvent::ModalClosed => {
                self.engine.close_preferences()?;
            }
            ViewEvent::CheckboxToggled { id, checked } => {
                self.engine.toggle_checkbox(&id, checked);
                // also undoes a toggle the engine refused
                self.presentation.sync_checkboxes(&self.engine.checkbox_states());
                return Ok(());
            }
        }

        self.present();
        Ok(())
    }

    /// Shows the engine's surface. A modal the view could not show is cancelled, so the
    /// engine never commits a checkbox snapshot nobody saw.
    fn present(&mut self) {
        let surface = self.engine.current_surface();
        let shown = self.presentation.present(surface, &self.engine.checkbox_states());
        if !shown && surface == Surface::Modal {
            log::warn!("widget {}: preferences could not be shown", self.id);
            self.engine.cancel_preferences();
            let surface = self.engine.current_surface();
            self.presentation.present(surface, &[]);
        }
    }

    /// Tears the widget down: hides every surface, releases the scroll lock and unmounts the view.
    pub fn destroy(mut self) {
        self.presentation.unmount();
        log::info!("widget {} destroyed", self.id);
    }
}
