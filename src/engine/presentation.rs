//! Presentation controller.
//!
//! A thin state machine over the widget's surfaces (banner, preferences
//! modal, floating icon, backdrop). It owns no consent logic: the engine
//! decides which [`Surface`] should be visible and the controller turns that
//! into the minimal list of [`ViewCommand`]s, fires the open/close hooks on
//! every visibility edge, and holds the page scroll lock while the modal is
//! open.
//!
//! Invariants:
//! - banner and modal are never visible together,
//! - the backdrop is only visible behind a visible banner or modal, and only
//!   when `show_background` is configured,
//! - the scroll lock is held exactly while the modal is visible.

use crate::engine::callback::fire;
use crate::engine::config::LifecycleHooks;
use crate::engine::consent::Surface;
use crate::engine::errors::ConsentError;
use crate::engine::events::ViewCommand;
use crate::engine::instance::WidgetId;
use crate::engine::view::{CheckboxState, ScrollGuard, ScrollLock, View, ViewModel};
use bitflags::bitflags;
use std::sync::Arc;

bitflags! {
    /// Currently visible surfaces
    pub struct Visibility: u8 {
        const BANNER   = 0b0001;
        const MODAL    = 0b0010;
        const ICON     = 0b0100;
        const BACKDROP = 0b1000;
    }
}

pub struct PresentationController {
    widget_id: WidgetId,
    view: Box<dyn View>,
    scroll_lock: Arc<dyn ScrollLock>,
    scroll_guard: Option<ScrollGuard>,
    hooks: LifecycleHooks,
    show_background: bool,
    visible: Visibility,
    live: bool,
}

impl PresentationController {
    pub fn new(
        widget_id: WidgetId,
        view: Box<dyn View>,
        scroll_lock: Arc<dyn ScrollLock>,
        hooks: LifecycleHooks,
        show_background: bool,
    ) -> Self {
        Self {
            widget_id,
            view,
            scroll_lock,
            scroll_guard: None,
            hooks,
            show_background,
            visible: Visibility::empty(),
            live: false,
        }
    }

    /// Builds the view's subtree. Every surface starts hidden.
    pub fn mount(&mut self, model: ViewModel) -> Result<(), ConsentError> {
        self.apply(ViewCommand::Mount { model })?;
        self.live = true;
        Ok(())
    }

    /// Hides everything, releases the scroll lock and tears down the view's subtree.
    pub fn unmount(&mut self) {
        if !self.live {
            return;
        }
        self.hide_all();
        if let Err(e) = self.apply(ViewCommand::Unmount) {
            log::error!("widget {}: {e}", self.widget_id);
        }
        self.scroll_guard = None;
        self.live = false;
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn visibility(&self) -> Visibility {
        self.visible
    }

    pub fn is_scroll_locked(&self) -> bool {
        self.scroll_guard.is_some()
    }

    /// Shows the surface the engine asked for. Returns false when the view could not show
    /// it (the icon is shown instead) or nothing is mounted.
    pub fn present(&mut self, surface: Surface, checkboxes: &[CheckboxState]) -> bool {
        match surface {
            Surface::Banner => self.show_banner(),
            Surface::Modal => self.show_modal(checkboxes),
            Surface::Icon => self.show_icon(),
            Surface::None => self.hide_all(),
        }
    }

    pub fn show_banner(&mut self) -> bool {
        self.transition(Visibility::BANNER)
    }

    pub fn show_modal(&mut self, checkboxes: &[CheckboxState]) -> bool {
        if !self.live {
            return false;
        }
        let sync = ViewCommand::SetCheckboxes { states: checkboxes.to_vec() };
        if let Err(e) = self.apply(sync) {
            self.fall_back_to_icon(e);
            return false;
        }
        self.transition(Visibility::MODAL)
    }

    /// Re-syncs the modal's toggles without changing visibility.
    pub fn sync_checkboxes(&mut self, checkboxes: &[CheckboxState]) {
        if !self.live || !self.visible.contains(Visibility::MODAL) {
            return;
        }
        if let Err(e) = self.apply(ViewCommand::SetCheckboxes { states: checkboxes.to_vec() }) {
            log::warn!("widget {}: {e}", self.widget_id);
        }
    }

    pub fn show_icon(&mut self) -> bool {
        self.transition(Visibility::ICON)
    }

    pub fn hide_all(&mut self) -> bool {
        self.transition(Visibility::empty())
    }

    fn transition(&mut self, target: Visibility) -> bool {
        if !self.live {
            log::debug!("widget {}: not mounted, ignoring {:?}", self.widget_id, target);
            return false;
        }
        match self.set_visibility(target) {
            Ok(()) => true,
            Err(e) if target != Visibility::ICON => {
                self.fall_back_to_icon(e);
                false
            }
            Err(e) => {
                log::error!("widget {}: cannot show the cookie icon: {e}", self.widget_id);
                false
            }
        }
    }

    fn fall_back_to_icon(&mut self, e: ConsentError) {
        log::error!("widget {}: {e}, falling back to the cookie icon", self.widget_id);
        if let Err(e) = self.set_visibility(Visibility::ICON) {
            log::error!("widget {}: cannot show the cookie icon: {e}", self.widget_id);
        }
    }

    fn set_visibility(&mut self, mut target: Visibility) -> Result<(), ConsentError> {
        target.remove(Visibility::BACKDROP);
        if target.contains(Visibility::BANNER | Visibility::MODAL) {
            // modal wins
            target.remove(Visibility::BANNER);
        }
        if self.show_background && target.intersects(Visibility::BANNER | Visibility::MODAL) {
            target.insert(Visibility::BACKDROP);
        }

        // close first, so two exclusive surfaces are never visible at once
        if self.visible.contains(Visibility::BANNER) && !target.contains(Visibility::BANNER) {
            self.apply(ViewCommand::HideBanner)?;
            self.visible.remove(Visibility::BANNER);
            fire(self.hooks.on_banner_close.as_ref(), "on_banner_close");
        }
        if self.visible.contains(Visibility::MODAL) && !target.contains(Visibility::MODAL) {
            self.apply(ViewCommand::HideModal)?;
            self.visible.remove(Visibility::MODAL);
            self.scroll_guard = None;
            fire(self.hooks.on_preferences_close.as_ref(), "on_preferences_close");
        }
        if self.visible.contains(Visibility::ICON) && !target.contains(Visibility::ICON) {
            self.apply(ViewCommand::HideIcon)?;
            self.visible.remove(Visibility::ICON);
        }
        if self.visible.contains(Visibility::BACKDROP) && !target.contains(Visibility::BACKDROP) {
            self.apply(ViewCommand::HideBackdrop)?;
            self.visible.remove(Visibility::BACKDROP);
            fire(self.hooks.on_backdrop_close.as_ref(), "on_backdrop_close");
        }

        if target.contains(Visibility::BACKDROP) && !self.visible.contains(Visibility::BACKDROP) {
            self.apply(ViewCommand::ShowBackdrop)?;
            self.visible.insert(Visibility::BACKDROP);
            fire(self.hooks.on_backdrop_open.as_ref(), "on_backdrop_open");
        }
        if target.contains(Visibility::BANNER) && !self.visible.contains(Visibility::BANNER) {
            self.apply(ViewCommand::ShowBanner)?;
            self.visible.insert(Visibility::BANNER);
            fire(self.hooks.on_banner_open.as_ref(), "on_banner_open");
        }
        if target.contains(Visibility::MODAL) && !self.visible.contains(Visibility::MODAL) {
            self.apply(ViewCommand::ShowModal)?;
            self.visible.insert(Visibility::MODAL);
            self.scroll_guard = Some(ScrollGuard::acquire(self.scroll_lock.clone()));
            self.apply(ViewCommand::FocusModalClose)?;
            fire(self.hooks.on_preferences_open.as_ref(), "on_preferences_open");
        }
        if target.contains(Visibility::ICON) && !self.visible.contains(Visibility::ICON) {
            self.apply(ViewCommand::ShowIcon)?;
            self.visible.insert(Visibility::ICON);
        }

        Ok(())
    }

    fn apply(&mut self, command: ViewCommand) -> Result<(), ConsentError> {
        log::trace!("widget {}: {:?}", self.widget_id, command);
        self.view
            .apply(command)
            .map_err(|e| ConsentError::ViewError(format!("{e:#}")))
    }
}

impl Drop for PresentationController {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::BannerConfig;
    use crate::engine::testing::{CallLog, CountingScrollLock, ViewLog};

    fn controller(log: &ViewLog, lock: &Arc<CountingScrollLock>, hooks: LifecycleHooks, background: bool) -> PresentationController {
        let id = WidgetId::new();
        let mut c = PresentationController::new(id, Box::new(log.view()), lock.clone(), hooks, background);
        c.mount(ViewModel::from_config(id, &BannerConfig::default())).unwrap();
        c
    }

    fn hooks(calls: &CallLog) -> LifecycleHooks {
        LifecycleHooks {
            on_banner_open: Some(calls.callback("banner_open")),
            on_banner_close: Some(calls.callback("banner_close")),
            on_preferences_open: Some(calls.callback("preferences_open")),
            on_preferences_close: Some(calls.callback("preferences_close")),
            on_backdrop_open: Some(calls.callback("backdrop_open")),
            on_backdrop_close: Some(calls.callback("backdrop_close")),
            ..Default::default()
        }
    }

    #[test]
    fn banner_then_modal_then_icon() {
        let log = ViewLog::default();
        let lock = Arc::new(CountingScrollLock::default());
        let calls = CallLog::default();
        let mut c = controller(&log, &lock, hooks(&calls), true);
        log.clear();

        c.show_banner();
        assert_eq!(c.visibility(), Visibility::BANNER | Visibility::BACKDROP);
        assert_eq!(log.commands(), vec![ViewCommand::ShowBackdrop, ViewCommand::ShowBanner]);

        log.clear();
        c.show_modal(&[]);
        assert_eq!(c.visibility(), Visibility::MODAL | Visibility::BACKDROP);
        assert_eq!(
            log.commands(),
            vec![
                ViewCommand::SetCheckboxes { states: vec![] },
                ViewCommand::HideBanner,
                ViewCommand::ShowModal,
                ViewCommand::FocusModalClose,
            ]
        );
        assert!(lock.is_locked());
        assert!(c.is_scroll_locked());

        c.show_icon();
        assert_eq!(c.visibility(), Visibility::ICON);
        assert!(!lock.is_locked());

        assert_eq!(
            calls.names(),
            vec![
                "backdrop_open",
                "banner_open",
                "banner_close",
                "preferences_open",
                "preferences_close",
                "backdrop_close",
            ]
        );
    }

    #[test]
    fn no_backdrop_without_background() {
        let log = ViewLog::default();
        let lock = Arc::new(CountingScrollLock::default());
        let mut c = controller(&log, &lock, LifecycleHooks::default(), false);

        c.show_banner();
        assert_eq!(c.visibility(), Visibility::BANNER);
        c.show_modal(&[]);
        assert_eq!(c.visibility(), Visibility::MODAL);
        assert_eq!(log.count(&ViewCommand::ShowBackdrop), 0);
        // modal still locks scrolling
        assert!(lock.is_locked());
    }

    #[test]
    fn repeated_commands_are_idempotent() {
        let log = ViewLog::default();
        let lock = Arc::new(CountingScrollLock::default());
        let mut c = controller(&log, &lock, LifecycleHooks::default(), false);

        c.show_icon();
        c.show_icon();
        assert_eq!(log.count(&ViewCommand::ShowIcon), 1);

        c.show_modal(&[]);
        c.show_modal(&[]);
        assert_eq!(log.count(&ViewCommand::ShowModal), 1);
        assert_eq!(lock.acquisitions(), 1);
    }

    #[test]
    fn unmount_releases_scroll_and_hides_everything() {
        let log = ViewLog::default();
        let lock = Arc::new(CountingScrollLock::default());
        let mut c = controller(&log, &lock, LifecycleHooks::default(), true);

        c.show_modal(&[]);
        assert!(lock.is_locked());
        c.unmount();

        assert!(!lock.is_locked());
        assert!(!c.is_live());
        assert_eq!(c.visibility(), Visibility::empty());
        assert_eq!(log.commands().last(), Some(&ViewCommand::Unmount));

        // commands after unmount are ignored
        log.clear();
        c.show_banner();
        assert!(log.commands().is_empty());
    }

    #[test]
    fn drop_unmounts() {
        let log = ViewLog::default();
        let lock = Arc::new(CountingScrollLock::default());
        {
            let mut c = controller(&log, &lock, LifecycleHooks::default(), false);
            c.show_modal(&[]);
        }
        assert!(!lock.is_locked());
        assert_eq!(log.live_mounts(), 0);
    }

    #[test]
    fn broken_banner_falls_back_to_icon() {
        let log = ViewLog::default();
        let lock = Arc::new(CountingScrollLock::default());
        let id = WidgetId::new();
        let mut c = PresentationController::new(
            id,
            Box::new(log.broken_banner_view()),
            lock.clone(),
            LifecycleHooks::default(),
            true,
        );
        c.mount(ViewModel::from_config(id, &BannerConfig::default())).unwrap();

        assert!(!c.present(Surface::Banner, &[]));
        assert_eq!(c.visibility(), Visibility::ICON);
        assert_eq!(log.count(&ViewCommand::ShowIcon), 1);
        // the backdrop shown before the failure is gone again
        assert_eq!(log.count(&ViewCommand::HideBackdrop), 1);
    }

    #[test]
    fn broken_modal_reports_failure_and_releases_scroll() {
        let log = ViewLog::default();
        let lock = Arc::new(CountingScrollLock::default());
        let id = WidgetId::new();
        let mut c = PresentationController::new(
            id,
            Box::new(log.broken_modal_view()),
            lock.clone(),
            LifecycleHooks::default(),
            false,
        );
        c.mount(ViewModel::from_config(id, &BannerConfig::default())).unwrap();

        assert!(c.present(Surface::Banner, &[]));
        assert!(!c.present(Surface::Modal, &[]));
        assert_eq!(c.visibility(), Visibility::ICON);
        assert!(!lock.is_locked());
    }
}
