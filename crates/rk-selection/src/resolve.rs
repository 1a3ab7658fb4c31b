//! Sub-element resolution
//!
//! A sub name is a dot-separated path through child objects, optionally
//! ending in a leaf element: `"Part.Body.Edge1"` walks `Part` and `Body`,
//! then names `Edge1` of `Body`. A trailing `.` selects the last walked
//! object as a whole. Links redirect the walk into their target's document.

use rk_core::{DocumentGraph, ElementNamePair, ObjectKey, SUB_NAME_SEPARATOR};
use serde::{Deserialize, Serialize};

use crate::item::SelectionItem;

/// How a raw sub name is canonicalized
///
/// Modes are ordered from weakest to strongest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum ResolveMode {
    /// Keep the top-level object and the raw path verbatim
    NoResolve,
    /// Resolve to the owning object and the legacy element name
    #[default]
    OldStyleElement,
    /// Resolve to the owning object and the stable element name
    NewStyleElement,
    /// As `NewStyleElement`, and match link targets when checking types
    FollowLink,
}

impl ResolveMode {
    /// Check if this mode resolves at all
    pub fn resolves(self) -> bool {
        self != ResolveMode::NoResolve
    }

    /// Check if this mode prefers new-style element names
    pub fn is_new_style(self) -> bool {
        self >= ResolveMode::NewStyleElement
    }
}

/// Outcome of walking a sub name from a top-level object
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Object the walk started from
    pub top: ObjectKey,
    /// Sub-objects walked, outermost first
    pub path: Vec<ObjectKey>,
    /// Object owning the leaf element
    pub object: ObjectKey,
    /// Both names of the leaf element (empty for whole-object selections)
    pub element: ElementNamePair,
    /// Byte offset of the leaf element inside `sub_name`
    pub element_offset: usize,
    /// The raw sub name that was resolved
    pub sub_name: String,
}

impl Resolution {
    /// The object-path part of the sub name
    pub fn prefix(&self) -> &str {
        &self.sub_name[..self.element_offset]
    }

    /// The leaf element as written in the raw sub name
    pub fn leaf(&self) -> &str {
        &self.sub_name[self.element_offset..]
    }

    /// Check if the sub name ends in a leaf element
    pub fn has_element(&self) -> bool {
        !self.leaf().is_empty()
    }

    /// Sub name with the leaf rewritten to its new-style name when available
    pub fn canonical_sub_name(&self) -> String {
        if self.has_element() && !self.element.new_name.is_empty() {
            format!("{}{}", self.prefix(), self.element.new_name)
        } else {
            self.sub_name.clone()
        }
    }

    /// The deepest walked object, or the top object if nothing was walked
    pub fn sub_object(&self) -> &ObjectKey {
        self.path.last().unwrap_or(&self.top)
    }

    /// Container of [`sub_object`](Self::sub_object)
    pub fn parent(&self) -> Option<&ObjectKey> {
        match self.path.len() {
            0 => None,
            1 => Some(&self.top),
            n => self.path.get(n - 2),
        }
    }

    /// The object a caller sees under `mode`
    pub fn object_for(&self, mode: ResolveMode) -> &ObjectKey {
        if mode.resolves() {
            &self.object
        } else {
            &self.top
        }
    }

    /// The sub-element a caller sees under `mode`
    pub fn subelement(&self, mode: ResolveMode) -> &str {
        match mode {
            ResolveMode::NoResolve => &self.sub_name,
            ResolveMode::OldStyleElement => &self.element.old_name,
            ResolveMode::NewStyleElement | ResolveMode::FollowLink => self.element.preferred(),
        }
    }
}

/// Walk `sub_name` from `top`
///
/// Returns `None` if the top object is gone, an intermediate object is
/// missing, or the leaf is not an element of the object it lands on.
pub fn resolve(graph: &dyn DocumentGraph, top: &ObjectKey, sub_name: &str) -> Option<Resolution> {
    if !graph.contains_object(top) {
        return None;
    }

    let mut current = top.clone();
    let mut path = Vec::new();
    let mut offset = 0;
    while let Some(dot) = sub_name[offset..].find(SUB_NAME_SEPARATOR) {
        let segment = &sub_name[offset..offset + dot];
        match graph.child(&current, segment) {
            Some(child) => {
                path.push(child.clone());
                current = child;
                offset += dot + 1;
            }
            None => break,
        }
    }

    let leaf = &sub_name[offset..];
    let owner = if leaf.is_empty() {
        current
    } else {
        graph.linked_object(&current, true).unwrap_or(current)
    };
    let element = graph.element_name(&owner, leaf)?;

    Some(Resolution {
        top: top.clone(),
        path,
        object: owner,
        element,
        element_offset: offset,
        sub_name: sub_name.to_string(),
    })
}

/// Object and sub-element of a stored item under `mode`, if of `type_name`
///
/// Under [`ResolveMode::FollowLink`] a resolved link whose target has the
/// requested type yields the target.
pub fn object_of_type(
    graph: &dyn DocumentGraph,
    item: &SelectionItem,
    type_name: &str,
    mode: ResolveMode,
) -> Option<(ObjectKey, String)> {
    let top = item.object_key();
    if !graph.contains_object(&top) {
        return None;
    }

    let (object, subelement) = match mode {
        ResolveMode::NoResolve => (top, item.sub_name.clone()),
        ResolveMode::OldStyleElement => (item.resolved.clone()?, item.element.old_name.clone()),
        ResolveMode::NewStyleElement | ResolveMode::FollowLink => (
            item.resolved.clone()?,
            item.element.preferred().to_string(),
        ),
    };

    if graph.is_derived_from(&object, type_name) {
        return Some((object, subelement));
    }
    if mode == ResolveMode::FollowLink {
        if let Some(target) = graph.linked_object(&object, true) {
            if graph.is_derived_from(&target, type_name) {
                return Some((target, subelement));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use rk_core::{BASE_TYPE, GEO_FEATURE_TYPE, GROUP_TYPE, LINK_TYPE, MemoryDocuments};

    fn graph() -> MemoryDocuments {
        let docs = MemoryDocuments::new();
        docs.add_document("Doc").unwrap();
        docs.add_document("Lib").unwrap();
        let part = docs.add_object("Doc", "Part", GROUP_TYPE).unwrap();
        let body = docs.add_object("Doc", "Body", GEO_FEATURE_TYPE).unwrap();
        docs.add_child(&part, "Body").unwrap();
        docs.add_elements(&body, &["Face3"]).unwrap();
        docs.add_element(&body, ElementNamePair::new(";e1;Pad", "Edge1"))
            .unwrap();

        let shape = docs.add_object("Lib", "Shape", GEO_FEATURE_TYPE).unwrap();
        docs.add_elements(&shape, &["Edge5"]).unwrap();
        let link = docs.add_object("Doc", "Link", LINK_TYPE).unwrap();
        docs.set_link(&link, &shape).unwrap();
        docs
    }

    #[test]
    fn test_mode_ordering() {
        assert!(ResolveMode::NoResolve < ResolveMode::OldStyleElement);
        assert!(ResolveMode::FollowLink.is_new_style());
        assert!(!ResolveMode::OldStyleElement.is_new_style());
        assert!(!ResolveMode::NoResolve.resolves());
    }

    #[test]
    fn test_resolve_nested_element() {
        let docs = graph();
        let part = ObjectKey::new("Doc", "Part");
        let r = resolve(&docs, &part, "Body.Edge1").unwrap();

        assert_eq!(r.object, ObjectKey::new("Doc", "Body"));
        assert_eq!(r.prefix(), "Body.");
        assert_eq!(r.leaf(), "Edge1");
        assert_eq!(r.canonical_sub_name(), "Body.;e1;Pad");
        assert_eq!(r.subelement(ResolveMode::NoResolve), "Body.Edge1");
        assert_eq!(r.subelement(ResolveMode::OldStyleElement), "Edge1");
        assert_eq!(r.subelement(ResolveMode::NewStyleElement), ";e1;Pad");
        assert_eq!(r.object_for(ResolveMode::NoResolve), &part);
        assert_eq!(r.parent(), Some(&part));
    }

    #[test]
    fn test_resolve_new_style_leaf() {
        let docs = graph();
        let part = ObjectKey::new("Doc", "Part");
        let r = resolve(&docs, &part, "Body.;e1;Pad").unwrap();
        assert_eq!(r.element.old_name, "Edge1");
        assert_eq!(r.canonical_sub_name(), "Body.;e1;Pad");
    }

    #[test]
    fn test_resolve_whole_sub_object() {
        let docs = graph();
        let part = ObjectKey::new("Doc", "Part");
        let r = resolve(&docs, &part, "Body.").unwrap();
        assert!(!r.has_element());
        assert!(r.element.is_empty());
        assert_eq!(r.sub_object(), &ObjectKey::new("Doc", "Body"));

        let whole = resolve(&docs, &part, "").unwrap();
        assert_eq!(whole.object, part);
        assert!(whole.parent().is_none());
    }

    #[test]
    fn test_resolve_missing_segments() {
        let docs = graph();
        let part = ObjectKey::new("Doc", "Part");
        assert!(resolve(&docs, &part, "Bdy.Edge1").is_none());
        assert!(resolve(&docs, &part, "Body.Edge99").is_none());
        assert!(resolve(&docs, &ObjectKey::new("Doc", "Gone"), "").is_none());
    }

    #[test]
    fn test_resolve_through_link() {
        let docs = graph();
        let link = ObjectKey::new("Doc", "Link");
        let r = resolve(&docs, &link, "Edge5").unwrap();
        assert_eq!(r.object, ObjectKey::new("Lib", "Shape"));

        let whole = resolve(&docs, &link, "").unwrap();
        assert_eq!(whole.object, link);
    }

    #[test]
    fn test_object_of_type_follow_link() {
        let docs = graph();
        let link = ObjectKey::new("Doc", "Link");
        let item = SelectionItem {
            document: "Doc".into(),
            object: "Link".into(),
            sub_name: String::new(),
            type_name: LINK_TYPE.into(),
            resolved: Some(link.clone()),
            element: ElementNamePair::default(),
            position: Vec3::ZERO,
            logged: false,
        };

        assert!(object_of_type(&docs, &item, GEO_FEATURE_TYPE, ResolveMode::NewStyleElement).is_none());
        let (obj, sub) =
            object_of_type(&docs, &item, GEO_FEATURE_TYPE, ResolveMode::FollowLink).unwrap();
        assert_eq!(obj, ObjectKey::new("Lib", "Shape"));
        assert!(sub.is_empty());

        let (obj, _) = object_of_type(&docs, &item, BASE_TYPE, ResolveMode::NoResolve).unwrap();
        assert_eq!(obj, link);
    }
}
