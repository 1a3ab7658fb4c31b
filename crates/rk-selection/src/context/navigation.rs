//! Selection history navigation

use glam::Vec3;
use rk_core::BASE_TYPE;
use tracing::debug;

use super::SelectionContext;
use super::query::is_member;
use crate::item::SelectionObject;
use crate::resolve::ResolveMode;
use crate::stack::{SelectionStack, StackSnapshot};

impl SelectionContext {
    /// Record the current selection in the history
    ///
    /// With `overwrite` the most recent snapshot is replaced.
    pub fn sel_stack_push(&mut self, clear_forward: bool, overwrite: bool) {
        let snapshot: StackSnapshot = self.items.iter().map(|item| item.path()).collect();
        if self.stack.push(snapshot, clear_forward, overwrite) {
            debug!("Selection history: {} back", self.stack.back_len());
        }
    }

    /// Restore the selection `count` steps back
    ///
    /// Snapshots that no longer resolve are skipped and kept for going
    /// forward again.
    pub fn sel_stack_go_back(&mut self, count: usize) {
        let mut count = count.min(self.stack.back_len());
        if count == 0 {
            return;
        }
        if self.items.is_empty() {
            count -= 1;
        } else {
            self.sel_stack_push(false, true);
            self.clear_complete_selection(true);
        }

        for _ in 0..count {
            self.stack.move_back_to_forward();
        }

        let mut pending = self.stack.take_forward();
        while let Some(snapshot) = self.stack.top().cloned() {
            if self.restore_snapshot(&snapshot) {
                break;
            }
            if let Some(snapshot) = self.stack.pop_back() {
                pending.push_front(snapshot);
            }
        }
        self.stack.set_forward(pending);
        self.view.update_actions();
    }

    /// Restore the selection `count` steps forward
    pub fn sel_stack_go_forward(&mut self, count: usize) {
        let count = count.min(self.stack.forward_len());
        if count == 0 {
            return;
        }
        if !self.items.is_empty() {
            self.sel_stack_push(false, true);
            self.clear_complete_selection(true);
        }

        for _ in 0..count {
            self.stack.move_forward_to_back();
        }

        let mut pending = self.stack.take_forward();
        loop {
            let restored = match self.stack.top().cloned() {
                Some(snapshot) => self.restore_snapshot(&snapshot),
                None => false,
            };
            if restored {
                break;
            }
            match pending.pop_front() {
                Some(snapshot) => self.stack.push_back(snapshot),
                None => break,
            }
        }
        self.stack.set_forward(pending);
        self.view.update_actions();
    }

    /// A history snapshot as grouped objects
    ///
    /// `index >= 0` counts back from the most recent snapshot, negative
    /// indices count forward starting at `-1`. Entries that no longer
    /// resolve are dropped.
    pub fn sel_stack_get(&self, document: &str, mode: ResolveMode, index: i32) -> Vec<SelectionObject> {
        let snapshot = if index >= 0 {
            self.stack.back_item(index.unsigned_abs() as usize)
        } else {
            self.stack.forward_item((index.unsigned_abs() - 1) as usize)
        };
        let Some(snapshot) = snapshot else {
            return Vec::new();
        };
        let Some(scope) = self.scope(document) else {
            return Vec::new();
        };

        let mut items = Vec::new();
        for path in snapshot {
            let Ok(item) = self.prepare_item(&path.document, &path.object, &path.sub_name, true) else {
                continue;
            };
            if !is_member(&item, &items, ResolveMode::NoResolve) {
                items.push(item);
            }
        }
        self.object_list(&scope, BASE_TYPE, &items, mode, false)
    }

    /// The history stacks
    pub fn selection_stack(&self) -> &SelectionStack {
        &self.stack
    }

    /// Re-add every resolvable entry of `snapshot`
    ///
    /// Returns `true` if any entry resolved.
    fn restore_snapshot(&mut self, snapshot: &StackSnapshot) -> bool {
        let mut found = false;
        for path in snapshot {
            if self
                .prepare_item(&path.document, &path.object, &path.sub_name, true)
                .is_err()
            {
                continue;
            }
            found = true;
            self.add_selection(&path.document, &path.object, &path.sub_name, Vec3::ZERO);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::super::test_support::context;
    use super::*;
    use crate::config::SelectionConfig;
    use crate::item::SelectionPath;

    #[test]
    fn test_back_and_forward() {
        let (_docs, mut selection) = context();
        selection.add_selection("Doc", "Box", "Face1", Vec3::ZERO);
        selection.sel_stack_push(true, false);
        selection.clear_complete_selection(true);
        selection.add_selection("Doc", "Box", "Face2", Vec3::ZERO);
        selection.sel_stack_push(true, false);

        selection.sel_stack_go_back(1);
        assert_eq!(selection.items().len(), 1);
        assert_eq!(selection.items()[0].sub_name, "Face1");
        assert_eq!(selection.selection_stack().forward_len(), 1);

        selection.sel_stack_go_forward(1);
        assert_eq!(selection.items().len(), 1);
        assert_eq!(selection.items()[0].sub_name, "Face2");
        assert_eq!(selection.selection_stack().forward_len(), 0);
    }

    #[test]
    fn test_go_back_skips_dead_snapshots() {
        let (docs, mut selection) = context();
        docs.add_object("Doc", "Temp", rk_core::GEO_FEATURE_TYPE).unwrap();
        selection.add_selection("Doc", "Box", "Face1", Vec3::ZERO);
        selection.sel_stack_push(true, false);
        selection.clear_complete_selection(true);
        selection.add_selection("Doc", "Temp", "", Vec3::ZERO);
        selection.sel_stack_push(true, false);
        selection.clear_complete_selection(true);
        docs.remove_object(&rk_core::ObjectKey::new("Doc", "Temp")).unwrap();

        selection.sel_stack_go_back(1);
        assert_eq!(selection.items().len(), 1);
        assert_eq!(selection.items()[0].object, "Box");
        assert_eq!(selection.selection_stack().forward_len(), 1);
    }

    #[test]
    fn test_go_forward_skips_dead_snapshots() {
        let (docs, mut selection) = context();
        docs.add_object("Doc", "Temp", rk_core::GEO_FEATURE_TYPE).unwrap();
        selection.add_selection("Doc", "Box", "Face1", Vec3::ZERO);
        selection.sel_stack_push(true, false);
        selection.clear_complete_selection(true);
        selection.add_selection("Doc", "Temp", "", Vec3::ZERO);
        selection.sel_stack_push(true, false);
        selection.clear_complete_selection(true);
        selection.add_selection("Doc", "Box", "Face2", Vec3::ZERO);
        selection.sel_stack_push(true, false);

        selection.sel_stack_go_back(2);
        assert_eq!(selection.items()[0].sub_name, "Face1");
        assert_eq!(selection.selection_stack().forward_len(), 2);

        docs.remove_object(&rk_core::ObjectKey::new("Doc", "Temp")).unwrap();
        selection.sel_stack_go_forward(1);
        assert_eq!(selection.items().len(), 1);
        assert_eq!(selection.items()[0].sub_name, "Face2");
        assert_eq!(selection.selection_stack().forward_len(), 0);
        assert_eq!(selection.selection_stack().back_len(), 3);
    }

    #[test]
    fn test_forward_stack_trimmed_to_capacity() {
        let (_docs, mut selection) = context();
        for sub_name in ["Face1", "Face2"] {
            selection.add_selection("Doc", "Box", sub_name, Vec3::ZERO);
            selection.sel_stack_push(true, false);
            selection.clear_complete_selection(true);
        }
        selection.add_selection("Doc", "Part", "Body.Edge2", Vec3::ZERO);
        selection.sel_stack_push(true, false);

        selection.sel_stack_go_back(2);
        selection.sel_stack_go_back(1);
        assert!(!selection.has_selection());
        assert_eq!(selection.selection_stack().forward_len(), 3);

        let config = SelectionConfig {
            stack_size: 2,
            ..SelectionConfig::default()
        };
        selection.set_config(config);
        let stack = selection.selection_stack();
        assert_eq!(stack.forward_len(), 2);
        let next = stack.forward_item(0).unwrap();
        assert!(next.contains(&SelectionPath::new("Doc", "Box", "Face1")));

        selection.sel_stack_go_forward(1);
        assert_eq!(selection.items()[0].sub_name, "Face1");
    }

    #[test]
    fn test_stack_get() {
        let (_docs, mut selection) = context();
        selection.add_selection("Doc", "Box", "Face1", Vec3::ZERO);
        selection.add_selection("Doc", "Box", "Face2", Vec3::ZERO);
        selection.sel_stack_push(true, false);

        let objects = selection.sel_stack_get("Doc", ResolveMode::OldStyleElement, 0);
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].sub_names.len(), 2);
        assert!(selection.sel_stack_get("Doc", ResolveMode::OldStyleElement, 1).is_empty());
        assert!(selection.sel_stack_get("Doc", ResolveMode::OldStyleElement, -1).is_empty());
    }
}
