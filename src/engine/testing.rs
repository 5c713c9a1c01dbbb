//! Test doubles shared by the unit tests of the engine modules.

use crate::engine::callback::Callback;
use crate::engine::events::ViewCommand;
use crate::engine::view::{ScrollLock, View};
use anyhow::{bail, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Ordered record of callback invocations, by name.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn callback(&self, name: &str) -> Callback {
        let log = self.0.clone();
        let name = name.to_string();
        Callback::new(move || log.lock().unwrap().push(name.clone()))
    }

    pub fn names(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|n| *n == name).count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// Shared render log of every [`RecordingView`] created from it.
#[derive(Clone, Default)]
pub struct ViewLog(Arc<Mutex<Vec<ViewCommand>>>);

impl ViewLog {
    pub fn view(&self) -> RecordingView {
        RecordingView { log: self.clone(), fail_on: None }
    }

    /// View whose `ShowBanner` always fails.
    pub fn broken_banner_view(&self) -> RecordingView {
        RecordingView { log: self.clone(), fail_on: Some(ViewCommand::ShowBanner) }
    }

    /// View whose `ShowModal` always fails.
    pub fn broken_modal_view(&self) -> RecordingView {
        RecordingView { log: self.clone(), fail_on: Some(ViewCommand::ShowModal) }
    }

    pub fn commands(&self) -> Vec<ViewCommand> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, command: &ViewCommand) -> usize {
        self.0.lock().unwrap().iter().filter(|c| *c == command).count()
    }

    pub fn mounts(&self) -> usize {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, ViewCommand::Mount { .. }))
            .count()
    }

    /// Mounted views that have not been unmounted yet.
    pub fn live_mounts(&self) -> usize {
        self.mounts() - self.count(&ViewCommand::Unmount)
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

pub struct RecordingView {
    log: ViewLog,
    fail_on: Option<ViewCommand>,
}

impl View for RecordingView {
    fn apply(&mut self, command: ViewCommand) -> Result<()> {
        if self.fail_on.as_ref() == Some(&command) {
            bail!("{command:?} failed to render");
        }
        self.log.0.lock().unwrap().push(command);
        Ok(())
    }
}

#[derive(Default)]
pub struct CountingScrollLock {
    locked: AtomicBool,
    acquisitions: AtomicUsize,
}

impl CountingScrollLock {
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }
}

impl ScrollLock for CountingScrollLock {
    fn lock(&self) {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        self.locked.store(true, Ordering::SeqCst);
    }

    fn unlock(&self) {
        self.locked.store(false, Ordering::SeqCst);
    }
}
