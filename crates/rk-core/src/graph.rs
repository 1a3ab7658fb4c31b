//! Document graph trait definitions
//!
//! The selection subsystem only reads the document layer through this trait.
//! Object references are by name, so a reference never keeps an object alive.

use crate::object::{ElementNamePair, ObjectKey};

/// Read-only view of the documents and objects of an application
pub trait DocumentGraph: Send + Sync {
    /// Name of the active document, if any
    fn active_document(&self) -> Option<String>;

    /// Check if a document with this name is open
    fn has_document(&self, name: &str) -> bool;

    /// Check if the object exists in its document
    fn contains_object(&self, key: &ObjectKey) -> bool;

    /// Check if the object is in the middle of being removed
    fn is_removing(&self, _key: &ObjectKey) -> bool {
        false
    }

    /// Type name of the object
    fn type_name(&self, key: &ObjectKey) -> Option<String>;

    /// Check if the object's type is `type_name` or derives from it
    fn is_derived_from(&self, key: &ObjectKey, type_name: &str) -> bool;

    /// Resolve a named child of `parent`
    ///
    /// Links expose the children of their target, looked up in the target's
    /// document.
    fn child(&self, parent: &ObjectKey, name: &str) -> Option<ObjectKey>;

    /// Target of a link object
    ///
    /// With `recursive`, chains of links are followed to the final target.
    /// Returns `None` for objects that are not links.
    fn linked_object(&self, key: &ObjectKey, recursive: bool) -> Option<ObjectKey>;

    /// Canonical name pair for a leaf element of the object
    ///
    /// The element may be written in either naming scheme. An empty element
    /// names the whole object and yields an empty pair. Unknown elements
    /// yield `None`.
    fn element_name(&self, key: &ObjectKey, element: &str) -> Option<ElementNamePair>;

    /// Resolve a document name, where an empty name means the active document
    fn resolve_document(&self, name: &str) -> Option<String> {
        if name.is_empty() {
            self.active_document()
        } else if self.has_document(name) {
            Some(name.to_string())
        } else {
            None
        }
    }
}
