//! Object references and element names

use std::fmt;

use serde::{Deserialize, Serialize};

/// A non-owning reference to an object, by document and object name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKey {
    /// Name of the owning document
    pub document: String,
    /// Name of the object inside its document
    pub object: String,
}

impl ObjectKey {
    /// Create a new object key
    pub fn new(document: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            object: object.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.document, self.object)
    }
}

/// Both names of a leaf element
///
/// `new_name` is the stable name meant to survive recomputation and may be
/// empty when the object has no such mapping. `old_name` is the legacy,
/// index-based name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementNamePair {
    pub new_name: String,
    pub old_name: String,
}

impl ElementNamePair {
    /// Create a pair with both names
    pub fn new(new_name: impl Into<String>, old_name: impl Into<String>) -> Self {
        Self {
            new_name: new_name.into(),
            old_name: old_name.into(),
        }
    }

    /// Create a pair with only a legacy name
    pub fn old_style(old_name: impl Into<String>) -> Self {
        Self {
            new_name: String::new(),
            old_name: old_name.into(),
        }
    }

    /// Check if neither name is set
    pub fn is_empty(&self) -> bool {
        self.new_name.is_empty() && self.old_name.is_empty()
    }

    /// The new-style name if available, the old one otherwise
    pub fn preferred(&self) -> &str {
        if self.new_name.is_empty() {
            &self.old_name
        } else {
            &self.new_name
        }
    }

    /// Check if `name` is either of the two names
    pub fn matches(&self, name: &str) -> bool {
        !name.is_empty() && (self.new_name == name || self.old_name == name)
    }

    /// Compare two pairs by new names when both have one, by old names otherwise
    pub fn same_element(&self, other: &ElementNamePair) -> bool {
        if !self.new_name.is_empty() && !other.new_name.is_empty() {
            self.new_name == other.new_name
        } else {
            self.old_name == other.old_name
        }
    }
}
