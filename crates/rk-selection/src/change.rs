//! Selection change events

use glam::Vec3;
use rk_core::ObjectKey;

/// Kind of a selection change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    AddSelection,
    RmvSelection,
    SetPreselect,
    /// Hover refresh without a change of target
    SetPreselectSignal,
    RmvPreselect,
    /// Hover removal notice without a change of state
    RmvPreselectSignal,
    ClrSelection,
    SetSelection,
    ShowSelection,
    HideSelection,
    PickedListChanged,
}

/// Where a change request originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MessageSource {
    #[default]
    Any,
    /// Issued by the selection system itself; bypasses the gate
    Internal,
    TreeView,
}

/// An immutable record of one selection change
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChange {
    pub kind: ChangeKind,
    pub document: String,
    pub object: String,
    pub sub_name: String,
    pub type_name: String,
    pub position: Vec3,
    pub source: MessageSource,
    /// The unresolved event, when this is a resolved rendition of it
    pub original: Option<Box<SelectionChange>>,
}

impl SelectionChange {
    /// Create a change not tied to any document
    pub fn new(kind: ChangeKind) -> Self {
        Self {
            kind,
            document: String::new(),
            object: String::new(),
            sub_name: String::new(),
            type_name: String::new(),
            position: Vec3::ZERO,
            source: MessageSource::Any,
            original: None,
        }
    }

    /// Create a change scoped to a document
    pub fn for_document(kind: ChangeKind, document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            ..Self::new(kind)
        }
    }

    /// Create a change targeting an object's sub-element
    pub fn for_object(
        kind: ChangeKind,
        document: impl Into<String>,
        object: impl Into<String>,
        sub_name: impl Into<String>,
    ) -> Self {
        Self {
            document: document.into(),
            object: object.into(),
            sub_name: sub_name.into(),
            ..Self::new(kind)
        }
    }

    /// Set the type name
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }

    /// Set the picked point
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Set the source
    pub fn with_source(mut self, source: MessageSource) -> Self {
        self.source = source;
        self
    }

    /// Key of the targeted object, if the change names one
    pub fn object_key(&self) -> Option<ObjectKey> {
        if self.document.is_empty() || self.object.is_empty() {
            None
        } else {
            Some(ObjectKey::new(self.document.clone(), self.object.clone()))
        }
    }

    /// Check if the change targets the given sub-element
    pub fn targets(&self, document: &str, object: &str, sub_name: &str) -> bool {
        self.document == document && self.object == object && self.sub_name == sub_name
    }
}
