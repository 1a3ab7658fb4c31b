//! In-memory document graph
//!
//! [`MemoryDocuments`] keeps documents, objects, child lists, link targets
//! and element maps behind a lock so that hosts can keep editing the graph
//! while the selection system holds a shared reference to it.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use thiserror::Error;

use crate::constants::{BASE_TYPE, MAX_LINK_DEPTH};
use crate::graph::DocumentGraph;
use crate::object::{ElementNamePair, ObjectKey};
use crate::types::TypeRegistry;

/// Document-related errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Document already exists: {0}")]
    DocumentExists(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectKey),

    #[error("Object already exists: {0}")]
    ObjectExists(ObjectKey),

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Child {child} must live in the document of {parent}")]
    ForeignChild { parent: ObjectKey, child: String },
}

/// Result type for document operations
pub type DocumentResult<T> = Result<T, DocumentError>;

#[derive(Debug, Clone)]
struct ObjectRecord {
    type_name: String,
    children: Vec<String>,
    link: Option<ObjectKey>,
    elements: Vec<ElementNamePair>,
    removing: bool,
}

impl ObjectRecord {
    fn new(type_name: String) -> Self {
        Self {
            type_name,
            children: Vec::new(),
            link: None,
            elements: Vec::new(),
            removing: false,
        }
    }
}

#[derive(Debug, Default)]
struct Document {
    objects: HashMap<String, ObjectRecord>,
}

#[derive(Debug, Default)]
struct Inner {
    documents: BTreeMap<String, Document>,
    active: Option<String>,
    types: TypeRegistry,
}

impl Inner {
    fn record(&self, key: &ObjectKey) -> Option<&ObjectRecord> {
        self.documents
            .get(&key.document)
            .and_then(|doc| doc.objects.get(&key.object))
    }

    fn record_mut(&mut self, key: &ObjectKey) -> DocumentResult<&mut ObjectRecord> {
        self.documents
            .get_mut(&key.document)
            .and_then(|doc| doc.objects.get_mut(&key.object))
            .ok_or_else(|| DocumentError::ObjectNotFound(key.clone()))
    }

    fn follow_link(&self, key: &ObjectKey, recursive: bool) -> Option<ObjectKey> {
        let mut target = self.record(key)?.link.clone()?;
        if !recursive {
            return Some(target);
        }
        for _ in 0..MAX_LINK_DEPTH {
            match self.record(&target).and_then(|r| r.link.clone()) {
                Some(next) => target = next,
                None => return Some(target),
            }
        }
        tracing::warn!("Link chain starting at {} exceeds {} hops", key, MAX_LINK_DEPTH);
        None
    }
}

/// Documents and objects held in memory
#[derive(Debug, Default)]
pub struct MemoryDocuments {
    inner: RwLock<Inner>,
}

impl MemoryDocuments {
    /// Create an empty graph with the built-in types registered
    pub fn new() -> Self {
        Self::default()
    }

    // ============== Types ==============

    /// Register an object type deriving from `parent`
    pub fn register_type(&self, name: &str, parent: &str) -> DocumentResult<()> {
        if self.inner.write().types.register(name, parent) {
            Ok(())
        } else {
            Err(DocumentError::UnknownType(parent.to_string()))
        }
    }

    // ============== Documents ==============

    /// Open a new document; the first document opened becomes active
    pub fn add_document(&self, name: &str) -> DocumentResult<()> {
        let mut inner = self.inner.write();
        if inner.documents.contains_key(name) {
            return Err(DocumentError::DocumentExists(name.to_string()));
        }
        inner.documents.insert(name.to_string(), Document::default());
        if inner.active.is_none() {
            inner.active = Some(name.to_string());
        }
        Ok(())
    }

    /// Close a document
    pub fn remove_document(&self, name: &str) -> DocumentResult<()> {
        let mut inner = self.inner.write();
        if inner.documents.remove(name).is_none() {
            return Err(DocumentError::DocumentNotFound(name.to_string()));
        }
        if inner.active.as_deref() == Some(name) {
            inner.active = inner.documents.keys().next().cloned();
        }
        Ok(())
    }

    /// Make a document the active one
    pub fn set_active_document(&self, name: &str) -> DocumentResult<()> {
        let mut inner = self.inner.write();
        if !inner.documents.contains_key(name) {
            return Err(DocumentError::DocumentNotFound(name.to_string()));
        }
        inner.active = Some(name.to_string());
        Ok(())
    }

    /// Names of all open documents
    pub fn document_names(&self) -> Vec<String> {
        self.inner.read().documents.keys().cloned().collect()
    }

    // ============== Objects ==============

    /// Add an object of the given type to a document
    pub fn add_object(&self, document: &str, name: &str, type_name: &str) -> DocumentResult<ObjectKey> {
        let mut inner = self.inner.write();
        if !inner.types.contains(type_name) {
            return Err(DocumentError::UnknownType(type_name.to_string()));
        }
        let key = ObjectKey::new(document, name);
        let doc = inner
            .documents
            .get_mut(document)
            .ok_or_else(|| DocumentError::DocumentNotFound(document.to_string()))?;
        if doc.objects.contains_key(name) {
            return Err(DocumentError::ObjectExists(key));
        }
        doc.objects
            .insert(name.to_string(), ObjectRecord::new(type_name.to_string()));
        Ok(key)
    }

    /// Add a plain object of the base type
    pub fn add_plain_object(&self, document: &str, name: &str) -> DocumentResult<ObjectKey> {
        self.add_object(document, name, BASE_TYPE)
    }

    /// Remove an object and drop it from every child list of its document
    pub fn remove_object(&self, key: &ObjectKey) -> DocumentResult<()> {
        let mut inner = self.inner.write();
        let doc = inner
            .documents
            .get_mut(&key.document)
            .ok_or_else(|| DocumentError::DocumentNotFound(key.document.clone()))?;
        if doc.objects.remove(&key.object).is_none() {
            return Err(DocumentError::ObjectNotFound(key.clone()));
        }
        for record in doc.objects.values_mut() {
            record.children.retain(|c| c != &key.object);
        }
        Ok(())
    }

    /// Make `child` (an object of the same document) a child of `parent`
    pub fn add_child(&self, parent: &ObjectKey, child: &str) -> DocumentResult<()> {
        let mut inner = self.inner.write();
        let child_key = ObjectKey::new(parent.document.clone(), child);
        if inner.record(&child_key).is_none() {
            return Err(DocumentError::ForeignChild {
                parent: parent.clone(),
                child: child.to_string(),
            });
        }
        let record = inner.record_mut(parent)?;
        if !record.children.iter().any(|c| c == child) {
            record.children.push(child.to_string());
        }
        Ok(())
    }

    /// Point a link object at its target, which may live in another document
    pub fn set_link(&self, link: &ObjectKey, target: &ObjectKey) -> DocumentResult<()> {
        let mut inner = self.inner.write();
        if inner.record(target).is_none() {
            return Err(DocumentError::ObjectNotFound(target.clone()));
        }
        inner.record_mut(link)?.link = Some(target.clone());
        Ok(())
    }

    /// Register a leaf element of an object
    pub fn add_element(&self, key: &ObjectKey, element: ElementNamePair) -> DocumentResult<()> {
        let mut inner = self.inner.write();
        let record = inner.record_mut(key)?;
        if !record.elements.contains(&element) {
            record.elements.push(element);
        }
        Ok(())
    }

    /// Register several legacy-named elements at once
    pub fn add_elements(&self, key: &ObjectKey, names: &[&str]) -> DocumentResult<()> {
        for name in names {
            self.add_element(key, ElementNamePair::old_style(*name))?;
        }
        Ok(())
    }

    /// Flag an object as being removed
    pub fn set_removing(&self, key: &ObjectKey, removing: bool) -> DocumentResult<()> {
        self.inner.write().record_mut(key)?.removing = removing;
        Ok(())
    }

    /// Children of an object, in insertion order
    pub fn children(&self, key: &ObjectKey) -> Vec<String> {
        self.inner
            .read()
            .record(key)
            .map(|r| r.children.clone())
            .unwrap_or_default()
    }
}

impl DocumentGraph for MemoryDocuments {
    fn active_document(&self) -> Option<String> {
        self.inner.read().active.clone()
    }

    fn has_document(&self, name: &str) -> bool {
        self.inner.read().documents.contains_key(name)
    }

    fn contains_object(&self, key: &ObjectKey) -> bool {
        self.inner.read().record(key).is_some()
    }

    fn is_removing(&self, key: &ObjectKey) -> bool {
        self.inner.read().record(key).is_some_and(|r| r.removing)
    }

    fn type_name(&self, key: &ObjectKey) -> Option<String> {
        self.inner.read().record(key).map(|r| r.type_name.clone())
    }

    fn is_derived_from(&self, key: &ObjectKey, type_name: &str) -> bool {
        let inner = self.inner.read();
        inner
            .record(key)
            .is_some_and(|r| inner.types.is_derived_from(&r.type_name, type_name))
    }

    fn child(&self, parent: &ObjectKey, name: &str) -> Option<ObjectKey> {
        let inner = self.inner.read();
        let container = match inner.record(parent)?.link {
            Some(_) => inner.follow_link(parent, true)?,
            None => parent.clone(),
        };
        let record = inner.record(&container)?;
        if !record.children.iter().any(|c| c == name) {
            return None;
        }
        let key = ObjectKey::new(container.document, name);
        inner.record(&key).map(|_| key)
    }

    fn linked_object(&self, key: &ObjectKey, recursive: bool) -> Option<ObjectKey> {
        self.inner.read().follow_link(key, recursive)
    }

    fn element_name(&self, key: &ObjectKey, element: &str) -> Option<ElementNamePair> {
        let inner = self.inner.read();
        let record = inner.record(key)?;
        if element.is_empty() {
            return Some(ElementNamePair::default());
        }
        record.elements.iter().find(|e| e.matches(element)).cloned()
    }
}
