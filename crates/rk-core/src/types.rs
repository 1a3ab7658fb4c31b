//! Object type registry
//!
//! Types form a single-inheritance tree rooted at [`BASE_TYPE`].

use std::collections::HashMap;

use crate::constants::{BASE_TYPE, GEO_FEATURE_TYPE, GROUP_TYPE, LINK_TYPE};

/// Maps each known type name to its parent type
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    parents: HashMap<String, Option<String>>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        let mut registry = Self {
            parents: HashMap::new(),
        };
        registry.parents.insert(BASE_TYPE.to_string(), None);
        for name in [GEO_FEATURE_TYPE, GROUP_TYPE, LINK_TYPE] {
            registry
                .parents
                .insert(name.to_string(), Some(BASE_TYPE.to_string()));
        }
        registry
    }
}

impl TypeRegistry {
    /// Create a registry holding the built-in types
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type deriving from `parent`
    ///
    /// Returns false if the parent is unknown. Re-registering a type moves it
    /// under the new parent.
    pub fn register(&mut self, name: impl Into<String>, parent: &str) -> bool {
        if !self.parents.contains_key(parent) {
            return false;
        }
        self.parents.insert(name.into(), Some(parent.to_string()));
        true
    }

    /// Check if a type is known
    pub fn contains(&self, name: &str) -> bool {
        self.parents.contains_key(name)
    }

    /// Get the parent of a type
    pub fn parent(&self, name: &str) -> Option<&str> {
        self.parents.get(name).and_then(|p| p.as_deref())
    }

    /// Check if `name` is `base` or one of its descendants
    pub fn is_derived_from(&self, name: &str, base: &str) -> bool {
        let mut current = Some(name);
        // A chain can never be longer than the registry itself
        for _ in 0..=self.parents.len() {
            match current {
                Some(ty) if ty == base => return true,
                Some(ty) => current = self.parent(ty),
                None => return false,
            }
        }
        false
    }
}
