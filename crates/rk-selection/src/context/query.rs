//! Selection queries and membership

use std::collections::{HashMap, HashSet};

use glam::Vec3;
use rk_core::{BASE_TYPE, ObjectKey, SUB_NAME_SEPARATOR};
use tracing::{debug, error};

use super::SelectionContext;
use crate::error::{SelectionError, SelectionResult};
use crate::item::{SelectionEntry, SelectionItem, SelectionObject};
use crate::resolve::{ResolveMode, object_of_type, resolve};

/// Membership of a candidate in the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// The candidate does not resolve
    Invalid,
    NotSelected,
    Selected,
}

impl Membership {
    /// Numeric form: `-1`, `0` or `1`
    pub fn code(self) -> i32 {
        match self {
            Self::Invalid => -1,
            Self::NotSelected => 0,
            Self::Selected => 1,
        }
    }

    pub fn is_selected(self) -> bool {
        self == Self::Selected
    }
}

/// Documents a query covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DocumentScope {
    All,
    Only(String),
}

impl DocumentScope {
    pub fn contains(&self, document: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(name) => name == document,
        }
    }
}

/// Check if `prefix` names `sub_name` or one of its ancestors
pub(crate) fn encloses(prefix: &str, sub_name: &str) -> bool {
    if !sub_name.starts_with(prefix) {
        return false;
    }
    prefix.is_empty()
        || prefix.ends_with(SUB_NAME_SEPARATOR)
        || sub_name.len() == prefix.len()
        || sub_name[prefix.len()..].starts_with(SUB_NAME_SEPARATOR)
}

/// Check if `candidate` is in `list` under `mode`
///
/// Exact sub names on the same object always match. Under new-style modes a
/// candidate also matches when its object path encloses a stored entry, or
/// a stored whole-object entry encloses it. Under old-style a candidate
/// matches a stored entry resolving to the same object and element, even
/// when the two start from different top-level objects.
pub(crate) fn is_member(candidate: &SelectionItem, list: &[SelectionItem], mode: ResolveMode) -> bool {
    let same_top = list
        .iter()
        .filter(|s| s.document == candidate.document && s.object == candidate.object);
    for stored in same_top {
        if stored.sub_name == candidate.sub_name {
            return true;
        }
        if mode.is_new_style()
            && (encloses(candidate.prefix(), &stored.sub_name)
                || (stored.is_whole_object() && encloses(&stored.sub_name, &candidate.sub_name)))
        {
            return true;
        }
    }

    if mode == ResolveMode::OldStyleElement {
        let Some(resolved) = candidate.resolved.as_ref() else {
            return false;
        };
        return list.iter().any(|stored| {
            stored.resolved.as_ref() == Some(resolved)
                && (candidate.element.is_empty() || stored.element.same_element(&candidate.element))
        });
    }
    false
}

impl SelectionContext {
    // ============== Candidates ==============

    /// Resolve a candidate into a storable item, logging failures
    ///
    /// `quiet` lowers the log level for speculative lookups.
    pub(crate) fn prepare_item(
        &self,
        document: &str,
        object: &str,
        sub_name: &str,
        quiet: bool,
    ) -> SelectionResult<SelectionItem> {
        let result = self.build_item(document, object, sub_name);
        if let Err(e) = &result {
            if quiet || matches!(e, SelectionError::ObjectRemoving(_)) {
                debug!("{}", e);
            } else {
                error!("{}", e);
            }
        }
        result
    }

    fn build_item(&self, document: &str, object: &str, sub_name: &str) -> SelectionResult<SelectionItem> {
        let top = self.lookup_object(document, object)?;
        let resolution = resolve(self.graph.as_ref(), &top, sub_name).ok_or_else(|| {
            SelectionError::SubObjectNotFound {
                object: top.clone(),
                sub_name: sub_name.to_string(),
            }
        })?;
        if self.graph.is_removing(&resolution.object) {
            return Err(SelectionError::ObjectRemoving(resolution.object));
        }

        Ok(SelectionItem {
            type_name: self.graph.type_name(&top).unwrap_or_default(),
            document: top.document,
            object: top.object,
            sub_name: resolution.canonical_sub_name(),
            resolved: Some(resolution.object.clone()),
            element: resolution.element,
            position: Vec3::ZERO,
            logged: false,
        })
    }

    /// Find a live top-level object
    pub(crate) fn lookup_object(&self, document: &str, object: &str) -> SelectionResult<ObjectKey> {
        let document = self
            .graph
            .resolve_document(document)
            .ok_or_else(|| SelectionError::DocumentNotFound(document.to_string()))?;
        let key = ObjectKey::new(document, object);
        if object.is_empty() || !self.graph.contains_object(&key) {
            return Err(SelectionError::ObjectNotFound {
                document: key.document,
                object: key.object,
            });
        }
        if self.graph.is_removing(&key) {
            return Err(SelectionError::ObjectRemoving(key));
        }
        Ok(key)
    }

    /// `"*"` covers every document, anything else names one (`""` the active one)
    pub(crate) fn scope(&self, document: &str) -> Option<DocumentScope> {
        if document == "*" {
            return Some(DocumentScope::All);
        }
        self.graph.resolve_document(document).map(DocumentScope::Only)
    }

    // ============== Membership ==============

    /// Membership of a sub-element under `mode`
    pub fn check_selection(
        &self,
        document: &str,
        object: &str,
        sub_name: &str,
        mode: ResolveMode,
    ) -> Membership {
        match self.prepare_item(document, object, sub_name, true) {
            Ok(candidate) if is_member(&candidate, &self.items, mode) => Membership::Selected,
            Ok(_) => Membership::NotSelected,
            Err(_) => Membership::Invalid,
        }
    }

    pub fn is_selected(&self, document: &str, object: &str, sub_name: &str, mode: ResolveMode) -> bool {
        self.check_selection(document, object, sub_name, mode)
            .is_selected()
    }

    pub fn is_object_selected(&self, object: &ObjectKey, sub_name: &str, mode: ResolveMode) -> bool {
        self.is_selected(&object.document, &object.object, sub_name, mode)
    }

    /// The stored sub name covering `sub_name` on `object`
    ///
    /// A whole-object entry covers everything. Without `sub_name` only a
    /// whole-object entry matches.
    pub fn selected_element(&self, object: &ObjectKey, sub_name: Option<&str>) -> Option<&str> {
        for item in &self.items {
            if item.document != object.document || item.object != object.object {
                continue;
            }
            if item.sub_name.is_empty() {
                return Some("");
            }
            if let Some(sub_name) = sub_name {
                if sub_name.starts_with(&item.sub_name)
                    && (sub_name.len() == item.sub_name.len()
                        || item.sub_name.ends_with(SUB_NAME_SEPARATOR))
                {
                    return Some(&item.sub_name);
                }
            }
        }
        None
    }

    // ============== Selection list ==============

    pub fn items(&self) -> &[SelectionItem] {
        &self.items
    }

    pub fn has_selection(&self) -> bool {
        !self.items.is_empty()
    }

    /// Check if `document` has a selection that resolves under `mode`
    pub fn has_selection_in(&self, document: &str, mode: ResolveMode) -> bool {
        let Some(scope) = self.scope(document) else {
            return false;
        };
        self.items.iter().any(|item| {
            scope.contains(&item.document)
                && object_of_type(self.graph.as_ref(), item, BASE_TYPE, mode).is_some()
        })
    }

    /// Check if `document` has a selection below the top level
    ///
    /// With `sub_element`, a selected element counts as well as a selected
    /// child object.
    pub fn has_sub_selection(&self, document: &str, sub_element: bool) -> bool {
        let Some(scope) = self.scope(document) else {
            return false;
        };
        self.items
            .iter()
            .filter(|item| scope.contains(&item.document) && !item.sub_name.is_empty())
            .any(|item| {
                (sub_element && !item.sub_name.ends_with(SUB_NAME_SEPARATOR))
                    || item.resolved.as_ref() != Some(&item.object_key())
            })
    }

    /// Flat selection rows of `document` under `mode`
    ///
    /// Resolved rows name the owning object and omit repeated elements. With
    /// `single`, anything but exactly one row yields nothing.
    pub fn selection(&self, document: &str, mode: ResolveMode, single: bool) -> Vec<SelectionEntry> {
        let Some(scope) = self.scope(document) else {
            return Vec::new();
        };

        let mut seen: HashMap<ObjectKey, HashSet<String>> = HashMap::new();
        let mut rows = Vec::new();
        for item in &self.items {
            if !scope.contains(&item.document) {
                continue;
            }
            let Some((object, sub_name)) = object_of_type(self.graph.as_ref(), item, BASE_TYPE, mode) else {
                continue;
            };
            if mode.resolves() && !seen.entry(object.clone()).or_default().insert(sub_name.clone()) {
                continue;
            }
            if single && !rows.is_empty() {
                return Vec::new();
            }
            rows.push(SelectionEntry {
                type_name: self.graph.type_name(&object).unwrap_or_default(),
                document: object.document,
                object: object.object,
                sub_name,
                resolved: item.resolved.clone(),
                position: item.position,
            });
        }
        rows
    }

    /// Rows of every document
    pub fn complete_selection(&self, mode: ResolveMode) -> Vec<SelectionEntry> {
        self.selection("*", mode, false)
    }

    /// Selection of `document` grouped per object of `type_name`
    pub fn selection_ex(
        &self,
        document: &str,
        type_name: &str,
        mode: ResolveMode,
        single: bool,
    ) -> Vec<SelectionObject> {
        match self.scope(document) {
            Some(scope) => self.object_list(&scope, type_name, &self.items, mode, single),
            None => Vec::new(),
        }
    }

    /// Selection re-rooted below `container`
    ///
    /// Each selected path passing through `container` is rewritten to start
    /// at the first object after it, so `Part` + `"Body.Edge1"` seen from
    /// `Part` becomes `Body` + `"Edge1"`. Paths not passing through the
    /// container, or ending at it, are dropped. The object the rewritten path
    /// lands on must be of `type_name`. Without a container this is the raw
    /// selection of every document.
    pub fn selection_in(
        &self,
        container: Option<&ObjectKey>,
        type_name: &str,
        single: bool,
    ) -> Vec<SelectionObject> {
        let Some(container) = container else {
            return self.selection_ex("*", type_name, ResolveMode::NoResolve, single);
        };
        let selected = self.object_list(
            &DocumentScope::All,
            BASE_TYPE,
            &self.items,
            ResolveMode::NoResolve,
            single,
        );

        let mut index: HashMap<ObjectKey, usize> = HashMap::new();
        let mut objects: Vec<SelectionObject> = Vec::new();
        for group in &selected {
            let root = group.object_key();
            for (sub_name, position) in group.sub_names.iter().zip(&group.positions) {
                let Some((new_root, new_sub)) = self.reroot(&root, sub_name, container) else {
                    continue;
                };
                let lands_on_type = resolve(self.graph.as_ref(), &new_root, &new_sub)
                    .is_some_and(|r| self.graph.is_derived_from(r.sub_object(), type_name));
                if !lands_on_type {
                    continue;
                }

                let slot = match index.get(&new_root) {
                    Some(&slot) => slot,
                    None => {
                        if single && !objects.is_empty() {
                            return Vec::new();
                        }
                        let type_name = self.graph.type_name(&new_root).unwrap_or_default();
                        objects.push(SelectionObject::new(
                            new_root.document.clone(),
                            new_root.object.clone(),
                            type_name,
                        ));
                        index.insert(new_root, objects.len() - 1);
                        objects.len() - 1
                    }
                };
                if !new_sub.is_empty() {
                    objects[slot].push_sub(new_sub, *position);
                }
            }
        }
        objects
    }

    /// Split `sub_name` of `root` at `container`
    ///
    /// Returns the first object after the container and the remaining path.
    fn reroot(&self, root: &ObjectKey, sub_name: &str, container: &ObjectKey) -> Option<(ObjectKey, String)> {
        let mut passed = root == container;
        let mut current = root.clone();
        let mut new_root: Option<ObjectKey> = None;
        let mut new_sub = String::new();

        for name in sub_name.split(SUB_NAME_SEPARATOR) {
            let Some(child) = self.graph.child(&current, name) else {
                new_sub.push_str(name);
                break;
            };
            if passed {
                if new_root.is_none() {
                    new_root = Some(child.clone());
                } else {
                    new_sub.push_str(name);
                    new_sub.push(SUB_NAME_SEPARATOR);
                }
            }
            if &child == container {
                passed = true;
            }
            current = child;
        }
        new_root.map(|object| (object, new_sub))
    }

    /// Distinct objects of `type_name` in the selection of `document`
    pub fn objects_of_type(&self, type_name: &str, document: &str, mode: ResolveMode) -> Vec<ObjectKey> {
        let Some(scope) = self.scope(document) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        self.items
            .iter()
            .filter(|item| scope.contains(&item.document))
            .filter_map(|item| object_of_type(self.graph.as_ref(), item, type_name, mode))
            .map(|(object, _)| object)
            .filter(|object| seen.insert(object.clone()))
            .collect()
    }

    /// Number of selection entries on objects of `type_name`
    pub fn count_objects_of_type(&self, type_name: &str, document: &str, mode: ResolveMode) -> usize {
        let Some(scope) = self.scope(document) else {
            return 0;
        };
        self.items
            .iter()
            .filter(|item| scope.contains(&item.document))
            .filter(|item| object_of_type(self.graph.as_ref(), item, type_name, mode).is_some())
            .count()
    }

    // ============== Picked list ==============

    /// Check if hosts asked for picked lists
    pub fn need_picked_list(&self) -> bool {
        self.need_picked_list
    }

    pub fn has_picked_list(&self) -> bool {
        !self.picked.is_empty()
    }

    /// Picked rows of `document`
    pub fn picked_list(&self, document: &str) -> Vec<SelectionEntry> {
        let Some(scope) = self.scope(document) else {
            return Vec::new();
        };
        self.picked
            .iter()
            .filter(|item| scope.contains(&item.document))
            .map(SelectionItem::entry)
            .collect()
    }

    /// Picked list of `document` grouped per object of `type_name`
    pub fn picked_list_ex(&self, document: &str, type_name: &str) -> Vec<SelectionObject> {
        match self.scope(document) {
            Some(scope) => self.object_list(&scope, type_name, &self.picked, ResolveMode::NoResolve, false),
            None => Vec::new(),
        }
    }

    /// Group `list` per object, keeping the order objects first appear in
    pub(crate) fn object_list(
        &self,
        scope: &DocumentScope,
        type_name: &str,
        list: &[SelectionItem],
        mode: ResolveMode,
        single: bool,
    ) -> Vec<SelectionObject> {
        let mut index: HashMap<ObjectKey, usize> = HashMap::new();
        let mut subs: Vec<HashSet<String>> = Vec::new();
        let mut objects: Vec<SelectionObject> = Vec::new();

        for item in list {
            if !scope.contains(&item.document) {
                continue;
            }
            let Some((object, sub_name)) = object_of_type(self.graph.as_ref(), item, type_name, mode) else {
                continue;
            };

            let slot = match index.get(&object) {
                Some(&slot) => slot,
                None => {
                    if single && !objects.is_empty() {
                        return Vec::new();
                    }
                    let type_name = self.graph.type_name(&object).unwrap_or_default();
                    objects.push(SelectionObject::new(
                        object.document.clone(),
                        object.object.clone(),
                        type_name,
                    ));
                    subs.push(HashSet::new());
                    index.insert(object, objects.len() - 1);
                    objects.len() - 1
                }
            };

            if sub_name.is_empty() {
                continue;
            }
            if mode.resolves() && !subs[slot].insert(sub_name.clone()) {
                continue;
            }
            objects[slot].push_sub(sub_name, item.position);
        }
        objects
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use rk_core::{GEO_FEATURE_TYPE, GROUP_TYPE, ObjectKey};

    use super::super::test_support::context;
    use super::*;

    #[test]
    fn test_encloses() {
        assert!(encloses("", "Body.Edge1"));
        assert!(encloses("Body.", "Body.Edge1"));
        assert!(encloses("Body", "Body.Edge1"));
        assert!(encloses("Body.Edge1", "Body.Edge1"));
        assert!(!encloses("Body", "Body2.Edge1"));
        assert!(!encloses("Body.", "OtherBody.Edge1"));
    }

    #[test]
    fn test_check_selection_codes() {
        let (_docs, mut selection) = context();
        selection.add_selection("Doc", "Box", "Face1", Vec3::ZERO);

        assert_eq!(
            selection.check_selection("Doc", "Box", "Face1", ResolveMode::NoResolve),
            Membership::Selected
        );
        assert_eq!(
            selection
                .check_selection("Doc", "Box", "Face2", ResolveMode::NoResolve)
                .code(),
            0
        );
        assert_eq!(
            selection
                .check_selection("Doc", "Box", "Face9", ResolveMode::NoResolve)
                .code(),
            -1
        );
        assert_eq!(
            selection.check_selection("Nowhere", "Box", "", ResolveMode::NoResolve),
            Membership::Invalid
        );
    }

    #[test]
    fn test_resolved_rows_deduplicate() {
        let (_docs, mut selection) = context();
        selection.add_selection("Doc", "Part", "Body.Edge1", Vec3::ZERO);
        selection.add_selection("Doc", "Body", "Edge1", Vec3::ZERO);

        assert_eq!(selection.selection("Doc", ResolveMode::NoResolve, false).len(), 2);

        let rows = selection.selection("Doc", ResolveMode::OldStyleElement, false);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].object, "Body");
        assert_eq!(rows[0].sub_name, "Edge1");
        assert_eq!(rows[0].type_name, GEO_FEATURE_TYPE);

        assert!(selection.selection("Doc", ResolveMode::NoResolve, true).is_empty());
        assert_eq!(selection.selection("Doc", ResolveMode::OldStyleElement, true).len(), 1);
    }

    #[test]
    fn test_selection_ex_groups_subs() {
        let (_docs, mut selection) = context();
        selection.add_selection("Doc", "Box", "Face1", Vec3::X);
        selection.add_selection("Doc", "Box", "Face2", Vec3::Y);
        selection.add_selection("Doc", "Part", "", Vec3::ZERO);

        let objects = selection.selection_ex("Doc", BASE_TYPE, ResolveMode::OldStyleElement, false);
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].object, "Box");
        assert_eq!(objects[0].sub_names, vec!["Face1".to_string(), "Face2".to_string()]);
        assert_eq!(objects[0].positions, vec![Vec3::X, Vec3::Y]);
        assert!(objects[1].is_whole_object());

        let features = selection.selection_ex("Doc", GEO_FEATURE_TYPE, ResolveMode::OldStyleElement, false);
        assert_eq!(features.len(), 1);
        assert!(selection.selection_ex("Doc", BASE_TYPE, ResolveMode::OldStyleElement, true).is_empty());
    }

    #[test]
    fn test_type_queries() {
        let (_docs, mut selection) = context();
        selection.add_selection("Doc", "Box", "Face1", Vec3::ZERO);
        selection.add_selection("Doc", "Box", "Face2", Vec3::ZERO);
        selection.add_selection("Doc", "Part", "", Vec3::ZERO);

        assert_eq!(
            selection.objects_of_type(GEO_FEATURE_TYPE, "Doc", ResolveMode::OldStyleElement),
            vec![ObjectKey::new("Doc", "Box")]
        );
        assert_eq!(
            selection.count_objects_of_type(GEO_FEATURE_TYPE, "Doc", ResolveMode::OldStyleElement),
            2
        );
        assert_eq!(selection.count_objects_of_type(BASE_TYPE, "*", ResolveMode::NoResolve), 3);
        assert!(selection.has_selection_in("", ResolveMode::NoResolve));
        assert!(!selection.has_selection_in("Lib", ResolveMode::NoResolve));
        assert!(!selection.has_selection_in("Missing", ResolveMode::NoResolve));
    }

    #[test]
    fn test_selection_in_reroots_under_container() {
        let (_docs, mut selection) = context();
        let part = ObjectKey::new("Doc", "Part");
        let body = ObjectKey::new("Doc", "Body");
        selection.add_selection("Doc", "Part", "Body.Edge2", Vec3::X);
        selection.add_selection("Doc", "Part", "Body.Face3", Vec3::Y);
        selection.add_selection("Doc", "Box", "Face1", Vec3::Z);

        let objects = selection.selection_in(Some(&part), BASE_TYPE, false);
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].object_key(), body);
        assert_eq!(objects[0].type_name, GEO_FEATURE_TYPE);
        assert_eq!(objects[0].sub_names, vec!["Edge2".to_string(), "Face3".to_string()]);
        assert_eq!(objects[0].positions, vec![Vec3::X, Vec3::Y]);

        // Nothing but elements follows the body itself
        assert!(selection.selection_in(Some(&body), BASE_TYPE, false).is_empty());
        assert_eq!(selection.selection_in(None, BASE_TYPE, false).len(), 2);
    }

    #[test]
    fn test_selection_in_filters_type() {
        let (_docs, mut selection) = context();
        let part = ObjectKey::new("Doc", "Part");
        selection.add_selection("Doc", "Part", "Body.Edge2", Vec3::ZERO);

        assert!(selection.selection_in(Some(&part), GROUP_TYPE, false).is_empty());
        assert_eq!(selection.selection_in(Some(&part), GEO_FEATURE_TYPE, false).len(), 1);
    }

    #[test]
    fn test_selection_in_single() {
        let (docs, mut selection) = context();
        let part = ObjectKey::new("Doc", "Part");
        let pad = docs.add_object("Doc", "Pad", GEO_FEATURE_TYPE).unwrap();
        docs.add_elements(&pad, &["Face7"]).unwrap();
        docs.add_child(&part, "Pad").unwrap();

        selection.add_selection("Doc", "Part", "Body.Edge2", Vec3::ZERO);
        selection.add_selection("Doc", "Part", "Body.Face3", Vec3::ZERO);
        assert_eq!(selection.selection_in(Some(&part), BASE_TYPE, true).len(), 1);

        selection.add_selection("Doc", "Part", "Pad.Face7", Vec3::ZERO);
        assert_eq!(selection.selection_in(Some(&part), BASE_TYPE, false).len(), 2);
        assert!(selection.selection_in(Some(&part), BASE_TYPE, true).is_empty());
    }

    #[test]
    fn test_sub_selection() {
        let (_docs, mut selection) = context();
        selection.add_selection("Doc", "Box", "", Vec3::ZERO);
        assert!(!selection.has_sub_selection("Doc", true));

        selection.add_selection("Doc", "Box", "Face1", Vec3::ZERO);
        assert!(selection.has_sub_selection("Doc", true));
        assert!(!selection.has_sub_selection("Doc", false));

        selection.add_selection("Doc", "Part", "Body.", Vec3::ZERO);
        assert!(selection.has_sub_selection("Doc", false));
    }

    #[test]
    fn test_selected_element() {
        let (_docs, mut selection) = context();
        let part = ObjectKey::new("Doc", "Part");
        selection.add_selection("Doc", "Part", "Body.", Vec3::ZERO);

        assert_eq!(selection.selected_element(&part, Some("Body.Edge1")), Some("Body."));
        assert_eq!(selection.selected_element(&part, None), None);

        selection.add_selection("Doc", "Box", "", Vec3::ZERO);
        let cube = ObjectKey::new("Doc", "Box");
        assert_eq!(selection.selected_element(&cube, None), Some(""));
    }
}
