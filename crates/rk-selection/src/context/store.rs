//! Selection mutators

use std::collections::HashSet;

use glam::Vec3;
use rk_core::{BASE_TYPE, ObjectKey, SUB_NAME_SEPARATOR};
use tracing::debug;

use super::SelectionContext;
use super::query::is_member;
use crate::change::{ChangeKind, SelectionChange};
use crate::command_log::{ReplayLine, log_item};
use crate::error::SelectionResult;
use crate::item::{SelectionEntry, SelectionItem, SelectionObject, SelectionPath};
use crate::resolve::{ResolveMode, object_of_type, resolve};
use crate::view::VisibleState;

/// Check if removing `target` also removes `stored`
fn removal_covers(target: &str, stored: &str) -> bool {
    if target.is_empty() || stored == target {
        return true;
    }
    stored.starts_with(target)
        && (target.ends_with(SUB_NAME_SEPARATOR)
            || stored[target.len()..].starts_with(SUB_NAME_SEPARATOR))
}

impl SelectionContext {
    // ============== Adding ==============

    /// Add a sub-element to the selection
    ///
    /// Returns `true` if it is selected once all observers have run.
    pub fn add_selection(&mut self, document: &str, object: &str, sub_name: &str, position: Vec3) -> bool {
        self.add_selection_with(document, object, sub_name, position, None, true)
    }

    /// Add a sub-element, optionally replacing the picked list first
    ///
    /// Duplicates and gate rejections are refused. Unless `clear_preselect`
    /// is false the hover is cleared.
    pub fn add_selection_with(
        &mut self,
        document: &str,
        object: &str,
        sub_name: &str,
        position: Vec3,
        picked: Option<&[SelectionEntry]>,
        clear_preselect: bool,
    ) -> bool {
        if self.shut_down {
            return false;
        }
        if let Some(picked) = picked {
            self.replace_picked_list(picked);
        }

        let Ok(mut item) = self.prepare_item(document, object, sub_name, false) else {
            return false;
        };
        if is_member(&item, &self.items, ResolveMode::NoResolve) {
            return false;
        }
        item.position = position;

        if let Err(reason) = self.check_item_gate(&item) {
            self.reject_selection(reason);
            return false;
        }

        if !self.log_suppression.is_active() {
            log_item(self.command_log.as_mut(), &mut item, false, clear_preselect);
        }

        let change = Self::item_change(ChangeKind::AddSelection, &item);
        let path = item.path();
        self.items.push(item);
        self.stack.clear_forward();

        if clear_preselect {
            self.rmv_preselect();
        }
        debug!(
            "Add selection {}#{}.{} ({}, {}, {})",
            path.document, path.object, path.sub_name, position.x, position.y, position.z
        );

        self.notify(change);
        self.view.update_actions();
        self.signal_rmv_preselect();

        self.is_selected(&path.document, &path.object, &path.sub_name, ResolveMode::NoResolve)
    }

    /// Add several sub-elements of one object, logged as a single command
    ///
    /// Gate rejections are reported once for the whole batch. Returns `true`
    /// if anything was added.
    pub fn add_selections(&mut self, document: &str, object: &str, sub_names: &[&str]) -> bool {
        if self.shut_down {
            return false;
        }
        if !self.picked.is_empty() {
            self.picked.clear();
            self.notify(SelectionChange::new(ChangeKind::PickedListChanged));
        }

        let mut logged = Vec::new();
        let mut target = None;
        let mut added = false;
        let mut rejection = None;
        for sub_name in sub_names {
            let Ok(mut item) = self.prepare_item(document, object, sub_name, false) else {
                continue;
            };
            if is_member(&item, &self.items, ResolveMode::NoResolve) {
                continue;
            }
            if let Err(reason) = self.check_item_gate(&item) {
                rejection.get_or_insert(reason);
                continue;
            }
            if !self.log_suppression.is_active() && !item.sub_name.is_empty() {
                item.logged = true;
                logged.push(item.old_style_sub_name());
            }
            if target.is_none() {
                target = Some(item.object_key());
            }

            let change = Self::item_change(ChangeKind::AddSelection, &item);
            debug!("Add selection {}#{}.{}", item.document, item.object, item.sub_name);
            self.items.push(item);
            self.stack.clear_forward();
            self.notify(change);
            added = true;
        }

        if let Some(target) = target {
            if !logged.is_empty() {
                self.command_log.add_line(&ReplayLine::AddMany {
                    document: target.document,
                    object: target.object,
                    sub_names: logged,
                });
            }
        }
        if let Some(reason) = rejection {
            self.reject_selection(reason);
        }
        if added {
            self.view.update_actions();
        }
        added
    }

    /// Add every sub-element of `object`, or the whole object if it has none
    pub fn add_selection_object(&mut self, object: &SelectionObject, clear_preselect: bool) -> bool {
        if object.sub_names.is_empty() {
            return self.add_selection_with(
                &object.document,
                &object.object,
                "",
                Vec3::ZERO,
                None,
                clear_preselect,
            );
        }
        let mut added = false;
        for (i, sub_name) in object.sub_names.iter().enumerate() {
            let position = object.positions.get(i).copied().unwrap_or(Vec3::ZERO);
            added |= self.add_selection_with(
                &object.document,
                &object.object,
                sub_name,
                position,
                None,
                clear_preselect,
            );
        }
        added
    }

    /// Select whole objects of one document, notifying once
    pub fn set_selection(&mut self, document: &str, objects: &[&str]) {
        if self.shut_down {
            return;
        }
        let Some(document) = self.graph.resolve_document(document) else {
            return;
        };
        if !self.picked.is_empty() {
            self.picked.clear();
            self.notify(SelectionChange::new(ChangeKind::PickedListChanged));
        }

        let mut touched = false;
        for object in objects {
            let Ok(item) = self.prepare_item(&document, object, "", false) else {
                continue;
            };
            if is_member(&item, &self.items, ResolveMode::NoResolve) {
                continue;
            }
            self.items.push(item);
            touched = true;
        }

        if touched {
            self.stack.clear_forward();
            debug!("Set selection in {}", document);
            self.notify(SelectionChange::for_document(ChangeKind::SetSelection, document));
            self.view.update_actions();
        }
    }

    // ============== Removing ==============

    /// Remove a sub-element and everything below it
    ///
    /// Removing `"Body"` also removes `"Body.Edge1"` but not `"Body2.Edge1"`;
    /// an empty sub name removes every entry of the object.
    pub fn rmv_selection(
        &mut self,
        document: &str,
        object: &str,
        sub_name: &str,
        picked: Option<&[SelectionEntry]>,
    ) {
        if self.shut_down {
            return;
        }
        if let Some(picked) = picked {
            self.replace_picked_list(picked);
        }

        let Ok(target) = self.removal_target(document, object, sub_name) else {
            return;
        };

        let mut removed = Vec::new();
        self.items.retain(|item| {
            let hit = item.document == target.document
                && item.object == target.object
                && removal_covers(&target.sub_name, &item.sub_name);
            if hit {
                removed.push(item.clone());
            }
            !hit
        });
        if removed.is_empty() {
            return;
        }

        if !self.log_suppression.is_active() {
            for item in &mut removed {
                log_item(self.command_log.as_mut(), item, true, true);
            }
        }
        for item in &removed {
            debug!("Rmv selection {}#{}.{}", item.document, item.object, item.sub_name);
            self.notify(Self::item_change(ChangeKind::RmvSelection, item));
        }
        self.view.update_actions();
    }

    /// Canonical form of a removal request
    ///
    /// The object must exist; a sub name that does not resolve is kept
    /// verbatim so that partial paths can still remove their descendants.
    fn removal_target(&self, document: &str, object: &str, sub_name: &str) -> SelectionResult<SelectionPath> {
        let top = self.lookup_object(document, object)?;
        let sub_name = match resolve(self.graph.as_ref(), &top, sub_name) {
            Some(resolution) => resolution.canonical_sub_name(),
            None => sub_name.to_string(),
        };
        Ok(SelectionPath::new(top.document, top.object, sub_name))
    }

    /// Clear the selection of one document
    ///
    /// `"*"` and `""` clear every document.
    pub fn clear_selection(&mut self, document: &str, clear_preselect: bool) {
        if document.is_empty() || document == "*" {
            return self.clear_complete_selection(clear_preselect);
        }
        if self.shut_down {
            return;
        }
        if !self.picked.is_empty() {
            self.picked.clear();
            self.notify(SelectionChange::new(ChangeKind::PickedListChanged));
        }
        let Some(document) = self.graph.resolve_document(document) else {
            return;
        };

        if clear_preselect {
            let hovered_here = matches!(
                &self.preselection,
                super::Preselection::Hovering(hover) if hover.document == document
            );
            if hovered_here {
                self.rmv_preselect();
            }
        }

        let before = self.items.len();
        self.items.retain(|item| item.document != document);
        if self.items.len() == before {
            return;
        }

        if !self.log_suppression.is_active() {
            self.command_log.add_line(&ReplayLine::Clear {
                document: Some(document.clone()),
                keep_preselect: !clear_preselect,
            });
        }
        debug!("Clear selection of {}", document);
        self.notify(SelectionChange::for_document(ChangeKind::ClrSelection, document));
        self.view.update_actions();
    }

    /// Clear the selection of every document
    pub fn clear_complete_selection(&mut self, clear_preselect: bool) {
        if !self.picked.is_empty() {
            self.picked.clear();
            self.notify(SelectionChange::new(ChangeKind::PickedListChanged));
        }
        if clear_preselect {
            self.rmv_preselect();
        }
        if self.items.is_empty() {
            return;
        }

        if !self.log_suppression.is_active() {
            self.command_log.add_line(&ReplayLine::Clear {
                document: None,
                keep_preselect: !clear_preselect,
            });
        }

        let mut seen = HashSet::new();
        for item in &self.items {
            if seen.insert(item.object_key()) {
                self.view.on_selection_changed(&SelectionChange::for_object(
                    ChangeKind::ClrSelection,
                    &item.document,
                    &item.object,
                    "",
                ));
            }
        }

        self.items.clear();
        debug!("Clear selection");
        self.notify(SelectionChange::new(ChangeKind::ClrSelection));
        self.view.update_actions();
    }

    /// Drop every reference to an object that is being deleted
    pub fn on_object_deleted(&mut self, object: &ObjectKey) {
        let hovered = matches!(
            &self.preselection,
            super::Preselection::Hovering(hover)
                if hover.document == object.document && hover.object == object.object
        );
        if hovered {
            self.rmv_preselect();
        }

        let mut removed = Vec::new();
        self.items.retain(|item| {
            let hit = item.object_key() == *object || item.resolved.as_ref() == Some(object);
            if hit {
                removed.push(item.clone());
            }
            !hit
        });
        for item in &removed {
            debug!("Rmv selection {}#{}.{} (deleted)", item.document, item.object, item.sub_name);
            self.notify(Self::item_change(ChangeKind::RmvSelection, item));
        }
        if !removed.is_empty() {
            self.view.update_actions();
        }

        let before = self.picked.len();
        self.picked
            .retain(|item| item.document != object.document || item.object != object.object);
        if self.picked.len() != before {
            self.notify(SelectionChange::new(ChangeKind::PickedListChanged));
        }
    }

    // ============== Visibility ==============

    /// Emit a show or hide signal for a selected sub-element
    ///
    /// Returns `false` if the sub-element is not selected.
    pub fn update_selection(&mut self, show: bool, document: &str, object: &str, sub_name: &str) -> bool {
        let hovered = matches!(
            &self.preselection,
            super::Preselection::Hovering(hover) if hover.is_target(document, object, sub_name)
        );
        if hovered {
            if show {
                self.notify(SelectionChange::for_object(
                    ChangeKind::SetPreselectSignal,
                    document,
                    object,
                    sub_name,
                ));
            } else {
                self.rmv_preselect();
            }
        }

        let Ok(top) = self.lookup_object(document, object) else {
            return false;
        };
        if !self.is_selected(&top.document, &top.object, sub_name, ResolveMode::NoResolve) {
            return false;
        }

        let kind = if show {
            ChangeKind::ShowSelection
        } else {
            ChangeKind::HideSelection
        };
        let type_name = self.graph.type_name(&top).unwrap_or_default();
        self.notify(
            SelectionChange::for_object(kind, top.document, top.object, sub_name).with_type(type_name),
        );
        true
    }

    /// Show, hide or toggle every selected object
    ///
    /// A selected child is toggled through its parent's element visibility
    /// when the parent controls it. Each target is touched once even if
    /// several entries lead to it.
    pub fn set_visible(&mut self, state: VisibleState) {
        let targets: Vec<SelectionPath> = self
            .items
            .iter()
            .filter(|item| !item.document.is_empty() && !item.object.is_empty())
            .map(SelectionItem::path)
            .collect();

        let mut visited: HashSet<(ObjectKey, Option<ObjectKey>)> = HashSet::new();
        for path in targets {
            let top = ObjectKey::new(path.document.clone(), path.object.clone());
            let Some(resolution) = resolve(self.graph.as_ref(), &top, &path.sub_name) else {
                continue;
            };
            let target = resolution.sub_object().clone();

            if let Some(parent) = resolution.parent().cloned() {
                if let Some(current) = self.view.element_visibility(&parent, &target.object) {
                    if !visited.insert((target.clone(), Some(parent.clone()))) {
                        continue;
                    }
                    let visible = match state {
                        VisibleState::Show => true,
                        VisibleState::Hide => false,
                        VisibleState::Toggle => !current,
                    };
                    if visible == current {
                        continue;
                    }
                    if !visible {
                        self.update_selection(false, &path.document, &path.object, &path.sub_name);
                    }
                    self.view.set_element_visible(&parent, &target.object, visible);
                    if visible {
                        self.update_selection(true, &path.document, &path.object, &path.sub_name);
                    }
                    continue;
                }
            }

            if !visited.insert((target.clone(), None)) {
                continue;
            }
            let Some(shown) = self.view.object_visibility(&target) else {
                continue;
            };
            let visible = match state {
                VisibleState::Show => true,
                VisibleState::Hide => false,
                VisibleState::Toggle => !shown,
            };
            if visible {
                self.view.show(&target);
                self.update_selection(true, &path.document, &path.object, &path.sub_name);
            } else {
                self.update_selection(false, &path.document, &path.object, &path.sub_name);
                self.view.hide(&target);
            }
        }
    }

    // ============== Picked list ==============

    /// Turn picked-list collection on or off, discarding the current list
    pub fn enable_picked_list(&mut self, enable: bool) {
        if enable == self.need_picked_list {
            return;
        }
        self.need_picked_list = enable;
        self.picked.clear();
        self.notify(SelectionChange::new(ChangeKind::PickedListChanged));
    }

    /// Replace the picked list with one notification
    fn replace_picked_list(&mut self, entries: &[SelectionEntry]) {
        self.picked = entries.iter().map(SelectionItem::from_entry).collect();
        self.notify(SelectionChange::new(ChangeKind::PickedListChanged));
    }

    // ============== Helpers ==============

    /// Gate check for a stored candidate under the gate's resolve mode
    fn check_item_gate(&mut self, item: &SelectionItem) -> Result<(), Option<String>> {
        let Some(mode) = self.gate.as_ref().map(|g| g.resolve) else {
            return Ok(());
        };
        match object_of_type(self.graph.as_ref(), item, BASE_TYPE, mode) {
            Some((object, subelement)) => {
                let document = object.document.clone();
                self.gate_allows(&document, Some(&object), &subelement)
            }
            None => {
                let document = item.document.clone();
                self.gate_allows(&document, None, "")
            }
        }
    }

    fn item_change(kind: ChangeKind, item: &SelectionItem) -> SelectionChange {
        SelectionChange::for_object(kind, &item.document, &item.object, &item.sub_name)
            .with_type(&item.type_name)
            .with_position(item.position)
    }
}
