//! Events and commands exchanged with the view.
//!
//! - [`ViewEvent`]: raw user actions the view reports back (button clicks, toggles).
//! - [`ViewCommand`]: instructions the presentation controller sends to the view.

use crate::engine::view::{CheckboxState, ViewModel};
use std::fmt::Display;

/// Raw user action reported by the view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// "Accept all" on the banner or in the modal
    AcceptAllClicked,
    /// "Reject" on the banner or in the modal
    RejectAllClicked,
    /// "Preferences" on the banner
    PreferencesClicked,
    /// Close control of the modal
    ModalClosed,
    /// A category toggle in the modal changed
    CheckboxToggled { id: String, checked: bool },
    /// The floating cookie icon
    IconClicked,
}

impl Display for ViewEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewEvent::AcceptAllClicked => write!(f, "acceptAllClicked"),
            ViewEvent::RejectAllClicked => write!(f, "rejectAllClicked"),
            ViewEvent::PreferencesClicked => write!(f, "preferencesClicked"),
            ViewEvent::ModalClosed => write!(f, "modalClosed"),
            ViewEvent::CheckboxToggled { id, checked } => write!(f, "checkboxToggled({id}, {checked})"),
            ViewEvent::IconClicked => write!(f, "iconClicked"),
        }
    }
}

/// Commands the presentation controller sends to the view
#[derive(Debug, Clone, PartialEq)]
pub enum ViewCommand {
    // ****************************************
    // ** Lifecycle
    /// Build the widget subtree (all surfaces start hidden)
    Mount { model: ViewModel },
    /// Release the widget subtree
    Unmount,

    // ****************************************
    // ** Surfaces
    ShowBanner,
    HideBanner,
    ShowModal,
    HideModal,
    ShowIcon,
    HideIcon,
    ShowBackdrop,
    HideBackdrop,

    // ****************************************
    // ** Modal content
    /// Sync the category toggles with the engine's snapshot
    SetCheckboxes { states: Vec<CheckboxState> },
    /// Move input focus to the modal's close control
    FocusModalClose,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_event_display() {
        assert_eq!(ViewEvent::AcceptAllClicked.to_string(), "acceptAllClicked");
        assert_eq!(ViewEvent::IconClicked.to_string(), "iconClicked");
        let e = ViewEvent::CheckboxToggled { id: "analytics".into(), checked: true };
        assert_eq!(e.to_string(), "checkboxToggled(analytics, true)");
    }

    #[test]
    fn view_command_equality_and_debug() {
        let a = ViewCommand::SetCheckboxes {
            states: vec![CheckboxState { id: "essential".into(), checked: true, disabled: true }],
        };
        let b = a.clone();
        assert_eq!(a, b);
        assert!(format!("{:?}", a).contains("SetCheckboxes"));
    }
}
