//! Selection items and query results

use glam::Vec3;
use rk_core::{ElementNamePair, ObjectKey};
use serde::{Deserialize, Serialize};

/// A stored selection (or picked-list) entry
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionItem {
    /// Document of the top-level object
    pub document: String,
    /// Top-level object the sub name is relative to
    pub object: String,
    /// Sub-element path, canonicalized to the new-style leaf name when one exists
    pub sub_name: String,
    /// Type of the top-level object
    pub type_name: String,
    /// Object owning the leaf element, as resolved when the item was created
    pub resolved: Option<ObjectKey>,
    /// Both names of the leaf element
    pub element: ElementNamePair,
    /// Picked point
    pub position: Vec3,
    /// Whether a replay line was already written for this item
    pub logged: bool,
}

impl SelectionItem {
    /// Key of the top-level object
    pub fn object_key(&self) -> ObjectKey {
        ObjectKey::new(self.document.clone(), self.object.clone())
    }

    /// Identity of the item for history snapshots
    pub fn path(&self) -> SelectionPath {
        SelectionPath::new(
            self.document.clone(),
            self.object.clone(),
            self.sub_name.clone(),
        )
    }

    /// Check if the item selects a whole (sub-)object rather than an element
    pub fn is_whole_object(&self) -> bool {
        self.element.is_empty()
    }

    /// The object-path part of the sub name, without the leaf element
    pub fn prefix(&self) -> &str {
        if self.element.is_empty() {
            return &self.sub_name;
        }
        self.sub_name
            .strip_suffix(self.element.preferred())
            .unwrap_or(&self.sub_name)
    }

    /// Sub name with the leaf written in its legacy form
    pub fn old_style_sub_name(&self) -> String {
        if self.element.new_name.is_empty() || self.element.old_name.is_empty() {
            return self.sub_name.clone();
        }
        match self.sub_name.strip_suffix(&self.element.new_name) {
            Some(prefix) => format!("{}{}", prefix, self.element.old_name),
            None => self.sub_name.clone(),
        }
    }

    /// Flat query row for this item
    pub fn entry(&self) -> SelectionEntry {
        SelectionEntry {
            document: self.document.clone(),
            object: self.object.clone(),
            sub_name: self.sub_name.clone(),
            type_name: self.type_name.clone(),
            resolved: self.resolved.clone(),
            position: self.position,
        }
    }

    pub(crate) fn from_entry(entry: &SelectionEntry) -> Self {
        Self {
            document: entry.document.clone(),
            object: entry.object.clone(),
            sub_name: entry.sub_name.clone(),
            type_name: entry.type_name.clone(),
            resolved: entry.resolved.clone(),
            element: ElementNamePair::default(),
            position: entry.position,
            logged: false,
        }
    }
}

/// A flat selection query row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionEntry {
    pub document: String,
    pub object: String,
    pub sub_name: String,
    pub type_name: String,
    pub resolved: Option<ObjectKey>,
    pub position: Vec3,
}

impl SelectionEntry {
    /// Create an entry with no type, resolution or position
    pub fn new(
        document: impl Into<String>,
        object: impl Into<String>,
        sub_name: impl Into<String>,
    ) -> Self {
        Self {
            document: document.into(),
            object: object.into(),
            sub_name: sub_name.into(),
            type_name: String::new(),
            resolved: None,
            position: Vec3::ZERO,
        }
    }

    /// Set the picked point
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Key of the entry's object
    pub fn object_key(&self) -> ObjectKey {
        ObjectKey::new(self.document.clone(), self.object.clone())
    }
}

/// One object with all of its selected sub-elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionObject {
    pub document: String,
    pub object: String,
    pub type_name: String,
    /// Selected sub names, in selection order
    pub sub_names: Vec<String>,
    /// Picked point of each sub name
    pub positions: Vec<Vec3>,
}

impl SelectionObject {
    /// Create an entry without sub-elements
    pub fn new(
        document: impl Into<String>,
        object: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            document: document.into(),
            object: object.into(),
            type_name: type_name.into(),
            sub_names: Vec::new(),
            positions: Vec::new(),
        }
    }

    /// Append a sub-element and its picked point
    pub fn push_sub(&mut self, sub_name: impl Into<String>, position: Vec3) {
        self.sub_names.push(sub_name.into());
        self.positions.push(position);
    }

    /// Check if only the whole object is selected
    pub fn is_whole_object(&self) -> bool {
        self.sub_names.is_empty()
    }

    /// Key of the object
    pub fn object_key(&self) -> ObjectKey {
        ObjectKey::new(self.document.clone(), self.object.clone())
    }
}

/// `(document, object, sub name)` identity of a selection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SelectionPath {
    pub document: String,
    pub object: String,
    pub sub_name: String,
}

impl SelectionPath {
    /// Create a new path
    pub fn new(
        document: impl Into<String>,
        object: impl Into<String>,
        sub_name: impl Into<String>,
    ) -> Self {
        Self {
            document: document.into(),
            object: object.into(),
            sub_name: sub_name.into(),
        }
    }
}
