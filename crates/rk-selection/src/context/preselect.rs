//! Preselection (hover) state

use glam::Vec3;
use rk_core::ObjectKey;
use tracing::trace;

use super::SelectionContext;
use crate::change::{ChangeKind, MessageSource, SelectionChange};
use crate::resolve::resolve;
use crate::view::Cursor;

/// The current hover target
#[derive(Debug, Clone, PartialEq)]
pub struct Hover {
    pub document: String,
    pub object: String,
    pub sub_name: String,
    pub position: Vec3,
    pub source: MessageSource,
}

impl Hover {
    /// Check if the hover is over the given sub-element
    pub fn is_target(&self, document: &str, object: &str, sub_name: &str) -> bool {
        self.document == document && self.object == object && self.sub_name == sub_name
    }

    fn change(&self, kind: ChangeKind) -> SelectionChange {
        SelectionChange::for_object(kind, &self.document, &self.object, &self.sub_name)
            .with_position(self.position)
            .with_source(self.source)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Preselection {
    #[default]
    Idle,
    Hovering(Hover),
}

/// Result of [`SelectionContext::set_preselect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreselectOutcome {
    /// The target was already hovered; only the coordinates changed
    Refreshed,
    /// Nothing is hovered afterwards
    Rejected,
    /// The target is now hovered
    Set,
}

impl PreselectOutcome {
    /// Numeric form: `-1`, `0` or `1`
    pub fn code(self) -> i32 {
        match self {
            Self::Refreshed => -1,
            Self::Rejected => 0,
            Self::Set => 1,
        }
    }
}

/// Status-bar text for a hovered point
///
/// Coordinates whose magnitude does not exceed `precision` are shown as zero.
pub fn preselection_info(
    document: &str,
    object: &str,
    sub_name: &str,
    position: Vec3,
    precision: f64,
    decimals: usize,
) -> String {
    let axis = |value: f32| {
        let value = f64::from(value);
        if value.abs() > precision { value } else { 0.0 }
    };
    format!(
        "Preselected: {}.{}.{} ({:.*} mm, {:.*} mm, {:.*} mm)",
        document,
        object,
        sub_name,
        decimals,
        axis(position.x),
        decimals,
        axis(position.y),
        decimals,
        axis(position.z),
    )
}

impl SelectionContext {
    /// Hover over a sub-element
    ///
    /// Requests without a document or object clear the hover. Unless the
    /// request is [`MessageSource::Internal`], the installed gate is asked
    /// first and a rejection leaves nothing hovered.
    pub fn set_preselect(
        &mut self,
        document: &str,
        object: &str,
        sub_name: &str,
        position: Vec3,
        source: MessageSource,
    ) -> PreselectOutcome {
        if self.shut_down {
            return PreselectOutcome::Rejected;
        }
        if document.is_empty() || object.is_empty() {
            self.rmv_preselect();
            return PreselectOutcome::Rejected;
        }

        if let Preselection::Hovering(hover) = &mut self.preselection {
            if hover.is_target(document, object, sub_name) {
                hover.position = position;
                let change = SelectionChange::for_object(
                    ChangeKind::SetPreselectSignal,
                    document,
                    object,
                    sub_name,
                )
                .with_position(position)
                .with_source(source);
                self.notify(change);
                return PreselectOutcome::Refreshed;
            }
        }

        self.rmv_preselect();

        if source != MessageSource::Internal && self.gate.is_some() {
            if !self.preselect_allowed(document, object, sub_name) {
                return PreselectOutcome::Rejected;
            }
            self.view.restore_override_cursor();
        }

        let hover = Hover {
            document: document.to_string(),
            object: object.to_string(),
            sub_name: sub_name.to_string(),
            position,
            source,
        };
        let message = preselection_info(
            document,
            object,
            sub_name,
            position,
            self.config.preselect_precision,
            self.config.decimals(),
        );
        self.view.show_message(&message);
        trace!("Preselect {}#{}.{}", document, object, sub_name);

        let first = if source == MessageSource::Internal {
            ChangeKind::SetPreselectSignal
        } else {
            ChangeKind::SetPreselect
        };
        let first = hover.change(first);
        let second = hover.change(ChangeKind::SetPreselect);
        self.preselection = Preselection::Hovering(hover);

        self.notify(first);
        if source == MessageSource::Internal && self.has_preselection() {
            self.notify(second);
        }

        if self.has_preselection() {
            PreselectOutcome::Set
        } else {
            PreselectOutcome::Rejected
        }
    }

    /// Gate check for a hover request, with cursor and message feedback
    fn preselect_allowed(&mut self, document: &str, object: &str, sub_name: &str) -> bool {
        let Some(document) = self.graph.resolve_document(document) else {
            return false;
        };
        let top = ObjectKey::new(document, object);
        if !self.graph.contains_object(&top) {
            return false;
        }
        let resolve_mode = self.gate.as_ref().map(|g| g.resolve).unwrap_or_default();

        let (owner, subelement) = if resolve_mode.resolves() {
            match resolve(self.graph.as_ref(), &top, sub_name) {
                Some(resolution) => (
                    resolution.object.clone(),
                    resolution.subelement(resolve_mode).to_string(),
                ),
                None => return false,
            }
        } else {
            (top.clone(), sub_name.to_string())
        };

        match self.gate_allows(&owner.document, Some(&owner), &subelement) {
            Ok(()) => true,
            Err(reason) => {
                let message = reason.unwrap_or_else(|| {
                    format!("Not allowed: {}.{}.{}", top.document, top.object, sub_name)
                });
                self.view.show_message(&message);
                self.view.set_override_cursor(Cursor::Forbidden);
                self.last_rejection = Some(message);
                false
            }
        }
    }

    /// Clear the hover and notify observers
    pub fn rmv_preselect(&mut self) {
        let Preselection::Hovering(hover) = std::mem::take(&mut self.preselection) else {
            return;
        };
        if self.gate.is_some() {
            self.view.restore_override_cursor();
        }
        trace!("Rmv preselect");
        self.notify(hover.change(ChangeKind::RmvPreselect));
    }

    /// Announce the hover is going away without clearing it
    pub fn signal_rmv_preselect(&mut self) {
        if let Preselection::Hovering(hover) = &self.preselection {
            let change = hover.change(ChangeKind::RmvPreselectSignal);
            self.notify(change);
        }
    }

    /// Update the hovered point and its status text
    pub fn set_preselect_coord(&mut self, position: Vec3) {
        let Preselection::Hovering(hover) = &mut self.preselection else {
            return;
        };
        hover.position = position;
        let message = preselection_info(
            &hover.document,
            &hover.object,
            &hover.sub_name,
            position,
            self.config.preselect_precision,
            self.config.decimals(),
        );
        self.view.show_message(&message);
    }

    pub fn preselection(&self) -> &Preselection {
        &self.preselection
    }

    pub fn has_preselection(&self) -> bool {
        matches!(self.preselection, Preselection::Hovering(_))
    }
}
