//! Host view callbacks
//!
//! Everything the selection system needs from a user interface: per-object
//! change delivery, visibility control, cursor feedback and status text.
//! All methods default to no-ops so hosts implement only what they have.

use rk_core::ObjectKey;
use serde::{Deserialize, Serialize};

use crate::change::SelectionChange;

/// Override cursors the selection system requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// Shown while a gate rejects the hovered candidate
    Forbidden,
}

/// Visibility request for [`set_visible`](crate::SelectionContext::set_visible)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisibleState {
    Hide,
    Show,
    Toggle,
}

pub trait ViewHost: Send {
    /// Deliver a change to the view of the affected object
    fn on_selection_changed(&mut self, _change: &SelectionChange) {}

    /// Visibility of `element` as drawn inside `parent`, if the parent controls it
    fn element_visibility(&self, _parent: &ObjectKey, _element: &str) -> Option<bool> {
        None
    }

    fn set_element_visible(&mut self, _parent: &ObjectKey, _element: &str, _visible: bool) {}

    /// Visibility of the object's own view, if it has one
    fn object_visibility(&self, _object: &ObjectKey) -> Option<bool> {
        None
    }

    fn show(&mut self, _object: &ObjectKey) {}

    fn hide(&mut self, _object: &ObjectKey) {}

    fn set_override_cursor(&mut self, _cursor: Cursor) {}

    fn restore_override_cursor(&mut self) {}

    /// Show a status message
    fn show_message(&mut self, _message: &str) {}

    fn beep(&mut self) {}

    /// Refresh selection-dependent commands
    fn update_actions(&mut self) {}
}

/// View host for headless use
#[derive(Debug, Default, Clone, Copy)]
pub struct NullView;

impl ViewHost for NullView {}
