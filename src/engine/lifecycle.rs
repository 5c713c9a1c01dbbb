//! Lifecycle manager: owns the one live [`WidgetInstance`].
//!
//! The manager is an explicit object held by the host, not module state. It
//! merges configuration updates, tears down and rebuilds the widget, waits
//! for the host document to become interactive, and reacts to navigation
//! signals from client-side routing. Uniqueness of the live instance is
//! guaranteed by the single `Option<WidgetInstance>` slot: a new instance is
//! only built after the previous one has been destroyed.

use crate::engine::categories::CategoryRegistry;
use crate::engine::config::{BannerConfig, ConfigUpdate};
use crate::engine::consent_store::ConsentStore;
use crate::engine::errors::ConsentError;
use crate::engine::events::ViewEvent;
use crate::engine::instance::WidgetInstance;
use crate::engine::storage::{LocalStore, StorageArea, UnavailableStorage};
use crate::engine::view::{NoScrollLock, ScrollLock, ViewFactory};
use std::sync::Arc;

pub struct LifecycleManager {
    /// Merged configuration, `None` until the first update
    config: Option<BannerConfig>,
    /// Origin's storage area, shared by every instance
    area: Arc<dyn StorageArea>,
    views: Box<dyn ViewFactory>,
    scroll_lock: Arc<dyn ScrollLock>,
    /// Has the host document become interactive?
    document_ready: bool,
    instance: Option<WidgetInstance>,
}

impl LifecycleManager {
    pub fn new(area: Arc<dyn StorageArea>, views: impl ViewFactory + 'static) -> Self {
        Self {
            config: None,
            area,
            views: Box::new(views),
            scroll_lock: Arc::new(NoScrollLock),
            document_ready: false,
            instance: None,
        }
    }

    /// Uses the area `store` keeps for `origin`. When the store cannot provide one, the
    /// manager runs on [`UnavailableStorage`] and every visit is a first visit.
    pub fn for_origin(store: &dyn LocalStore, origin: &url::Origin, views: impl ViewFactory + 'static) -> Self {
        let area = store.area(origin).unwrap_or_else(|e| {
            log::warn!("local storage unavailable for {}: {e:#}", origin.ascii_serialization());
            Arc::new(UnavailableStorage)
        });
        Self::new(area, views)
    }

    pub fn with_scroll_lock(mut self, lock: Arc<dyn ScrollLock>) -> Self {
        self.scroll_lock = lock;
        self
    }

    pub fn config(&self) -> Option<&BannerConfig> {
        self.config.as_ref()
    }

    pub fn instance(&self) -> Option<&WidgetInstance> {
        self.instance.as_ref()
    }

    pub fn has_live_instance(&self) -> bool {
        self.instance.is_some()
    }

    pub fn is_document_ready(&self) -> bool {
        self.document_ready
    }

    /// Merges `update` into the current configuration and rebuilds the widget. The live
    /// instance is always destroyed first; the new one is built right away when the
    /// document is ready, otherwise on [`on_document_ready`](Self::on_document_ready).
    pub fn update_config(&mut self, update: impl Into<ConfigUpdate>) {
        self.config
            .get_or_insert_with(BannerConfig::default)
            .merge(update.into());

        self.teardown();
        if self.document_ready {
            self.build();
        } else {
            log::debug!("document not ready, deferring widget creation");
        }
    }

    /// Same as [`update_config`](Self::update_config) for a JSON document. Only a document
    /// that is not a JSON object is rejected; malformed fields inside it are skipped.
    pub fn update_config_json(&mut self, json: &str) -> Result<(), ConsentError> {
        let update = ConfigUpdate::from_json(json)?;
        self.update_config(update);
        Ok(())
    }

    /// The host document became interactive.
    pub fn on_document_ready(&mut self) {
        self.document_ready = true;
        if self.instance.is_none() && self.config.is_some() {
            self.build();
        }
    }

    /// Client-side navigation happened. Recreates the widget only when none is live.
    /// Returns true when a widget was built.
    pub fn on_navigation_signal(&mut self) -> bool {
        if self.instance.is_some() {
            log::trace!("navigation signal ignored, widget is live");
            return false;
        }
        if !self.document_ready || self.config.is_none() {
            return false;
        }
        log::debug!("navigation left no widget behind, rebuilding");
        self.build();
        true
    }

    /// Routes a raw user action to the live widget.
    pub fn handle_event(&mut self, event: ViewEvent) -> Result<(), ConsentError> {
        self.instance
            .as_mut()
            .ok_or(ConsentError::NoLiveInstance)?
            .handle_event(event)
    }

    /// Destroys the live widget, if any.
    pub fn teardown(&mut self) {
        if let Some(instance) = self.instance.take() {
            instance.destroy();
        }
    }

    /// Forgets every stored decision of the current banner (records and first-run flag)
    /// and rebuilds the widget, so the visitor is asked again.
    pub fn reset_consent(&mut self) -> Result<(), ConsentError> {
        let config = self.config.as_ref().ok_or(ConsentError::NotConfigured)?;
        let registry = CategoryRegistry::new(config.cookie_types.clone());
        ConsentStore::new(self.area.clone(), config.banner_suffix.clone()).forget(&registry);
        log::info!("stored consent forgotten");

        self.teardown();
        if self.document_ready {
            self.build();
        }
        Ok(())
    }

    fn build(&mut self) {
        // never two live widgets
        self.teardown();

        let Some(config) = self.config.as_ref() else {
            return;
        };
        let store = ConsentStore::new(self.area.clone(), config.banner_suffix.clone());
        let view = self.views.create();
        self.instance = Some(WidgetInstance::create(config, store, view, self.scroll_lock.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::categories::CategoryDefinition;
    use crate::engine::config::ConfigError;
    use crate::engine::consent::Surface;
    use crate::engine::events::ViewCommand;
    use crate::engine::storage::{InMemoryLocalArea, InMemoryLocalStore, StorageArea};
    use crate::engine::testing::{CallLog, CountingScrollLock, ViewLog};
    use crate::engine::view::View;

    fn manager(area: &Arc<InMemoryLocalArea>, log: &ViewLog) -> LifecycleManager {
        let log = log.clone();
        LifecycleManager::new(area.clone(), move || Box::new(log.view()) as Box<dyn View>)
    }

    fn config(calls: &CallLog) -> BannerConfig {
        BannerConfig::builder()
            .category(CategoryDefinition::new("essential").required(true).on_accept(calls.callback("essential.accept")))
            .category(CategoryDefinition::new("analytics").on_accept(calls.callback("analytics.accept")))
            .build()
            .unwrap()
    }

    #[test]
    fn creation_waits_for_document_ready() {
        let area = Arc::new(InMemoryLocalArea::new());
        let log = ViewLog::default();
        let calls = CallLog::default();
        let mut m = manager(&area, &log);

        m.update_config(config(&calls));
        assert!(!m.has_live_instance());
        assert_eq!(log.mounts(), 0);

        m.on_document_ready();
        assert!(m.has_live_instance());
        assert_eq!(m.instance().unwrap().surface(), Surface::Banner);
    }

    #[test]
    fn two_updates_leave_exactly_one_live_widget() {
        let area = Arc::new(InMemoryLocalArea::new());
        let log = ViewLog::default();
        let calls = CallLog::default();
        let mut m = manager(&area, &log);
        m.on_document_ready();

        m.update_config(config(&calls));
        let first = m.instance().unwrap().id();
        m.update_config(ConfigUpdate { show_background: Some(true), ..Default::default() });
        let second = m.instance().unwrap().id();

        assert_ne!(first, second);
        assert_eq!(log.mounts(), 2);
        assert_eq!(log.live_mounts(), 1);
        // banners shown minus banners hidden: only one on screen
        assert_eq!(log.count(&ViewCommand::ShowBanner) - log.count(&ViewCommand::HideBanner), 1);
        // the merged config kept the categories
        assert_eq!(m.config().unwrap().cookie_types.len(), 2);
        assert!(m.config().unwrap().show_background);
    }

    #[test]
    fn navigation_signal_only_rebuilds_when_no_widget_is_live() {
        let area = Arc::new(InMemoryLocalArea::new());
        let log = ViewLog::default();
        let calls = CallLog::default();
        let mut m = manager(&area, &log);

        // nothing configured yet
        m.on_document_ready();
        assert!(!m.on_navigation_signal());

        m.update_config(config(&calls));
        assert!(!m.on_navigation_signal());
        assert!(!m.on_navigation_signal());
        assert_eq!(log.mounts(), 1);

        m.teardown();
        assert!(m.on_navigation_signal());
        assert_eq!(log.mounts(), 2);
        assert_eq!(log.live_mounts(), 1);
    }

    #[test]
    fn decision_survives_rebuilds() {
        let area = Arc::new(InMemoryLocalArea::new());
        let log = ViewLog::default();
        let calls = CallLog::default();
        let mut m = manager(&area, &log);
        m.on_document_ready();
        m.update_config(config(&calls));

        m.handle_event(ViewEvent::PreferencesClicked).unwrap();
        m.handle_event(ViewEvent::CheckboxToggled { id: "analytics".into(), checked: true }).unwrap();
        m.handle_event(ViewEvent::ModalClosed).unwrap();
        calls.clear();

        m.teardown();
        m.on_navigation_signal();
        assert_eq!(m.instance().unwrap().surface(), Surface::Icon);
        assert_eq!(calls.names(), vec!["essential.accept", "analytics.accept"]);
    }

    #[test]
    fn update_while_modal_open_releases_scroll() {
        let area = Arc::new(InMemoryLocalArea::new());
        let log = ViewLog::default();
        let calls = CallLog::default();
        let lock = Arc::new(CountingScrollLock::default());
        let mut m = manager(&area, &log).with_scroll_lock(lock.clone());
        m.on_document_ready();
        m.update_config(config(&calls));

        m.handle_event(ViewEvent::PreferencesClicked).unwrap();
        assert!(lock.is_locked());

        m.update_config(ConfigUpdate::default());
        assert!(!lock.is_locked());
        // nothing was committed by the teardown
        assert_eq!(m.instance().unwrap().surface(), Surface::Banner);
    }

    #[test]
    fn reset_consent_brings_the_banner_back() {
        let area = Arc::new(InMemoryLocalArea::new());
        let log = ViewLog::default();
        let calls = CallLog::default();
        let mut m = manager(&area, &log);

        assert!(matches!(m.reset_consent(), Err(ConsentError::NotConfigured)));

        m.on_document_ready();
        m.update_config(config(&calls));
        m.handle_event(ViewEvent::AcceptAllClicked).unwrap();
        assert_eq!(m.instance().unwrap().surface(), Surface::Icon);

        m.reset_consent().unwrap();
        assert_eq!(m.instance().unwrap().surface(), Surface::Banner);
        assert!(area.is_empty());
    }

    #[test]
    fn events_without_widget_are_rejected() {
        let area = Arc::new(InMemoryLocalArea::new());
        let log = ViewLog::default();
        let mut m = manager(&area, &log);
        assert!(matches!(
            m.handle_event(ViewEvent::AcceptAllClicked),
            Err(ConsentError::NoLiveInstance)
        ));
    }

    #[test]
    fn independent_banners_share_an_origin() {
        let store = InMemoryLocalStore::new();
        let origin = url::Url::parse("https://shop.test").unwrap().origin();
        let calls = CallLog::default();

        let log_a = ViewLog::default();
        let la = log_a.clone();
        let mut a = LifecycleManager::for_origin(&store, &origin, move || Box::new(la.view()) as Box<dyn View>);
        a.on_document_ready();
        a.update_config(config(&calls));
        a.update_config(ConfigUpdate { banner_suffix: Some("_a".into()), ..Default::default() });
        a.handle_event(ViewEvent::AcceptAllClicked).unwrap();

        let log_b = ViewLog::default();
        let lb = log_b.clone();
        let mut b = LifecycleManager::for_origin(&store, &origin, move || Box::new(lb.view()) as Box<dyn View>);
        b.on_document_ready();
        let mut cfg = config(&calls);
        cfg.banner_suffix = "_b".into();
        b.update_config(cfg);

        assert_eq!(b.instance().unwrap().surface(), Surface::Banner);
        assert_eq!(log_b.count(&ViewCommand::ShowBanner), 1);
        assert_eq!(log_a.count(&ViewCommand::ShowIcon), 1);
    }

    #[test]
    fn json_configuration() {
        let area = Arc::new(InMemoryLocalArea::new());
        let log = ViewLog::default();
        let mut m = manager(&area, &log);
        m.on_document_ready();

        assert!(matches!(
            m.update_config_json("[1, 2]"),
            Err(ConsentError::InvalidConfig(ConfigError::NotAnObject))
        ));
        assert!(!m.has_live_instance());

        m.update_config_json(
            r#"{
                "cookieTypes": [
                    { "id": "essential", "required": true },
                    { "name": "missing id" },
                    { "id": "marketing", "defaultValue": true }
                ],
                "background": { "showBackground": "yes" },
                "bannerSuffix": "_json"
            }"#,
        )
        .unwrap();

        let cfg = m.config().unwrap();
        assert_eq!(cfg.cookie_types.len(), 2);
        assert!(!cfg.show_background);
        assert_eq!(m.instance().unwrap().surface(), Surface::Banner);

        m.handle_event(ViewEvent::RejectAllClicked).unwrap();
        assert_eq!(area.get_item("silktideCookieChoice_marketing_json").unwrap().as_deref(), Some("false"));
        assert_eq!(area.get_item("silktideCookieBanner_InitialChoice_json").unwrap().as_deref(), Some("1"));
    }
}
