//! Selection gates
//!
//! A gate vets every candidate before it enters the selection or becomes
//! the hover target. At most one gate is installed at a time.

use std::fmt;

use rk_core::{DocumentGraph, ObjectKey};

use crate::observer::ObserverId;
use crate::resolve::ResolveMode;

/// A candidate presented to a gate, already resolved under the gate's mode
#[derive(Debug, Clone, Copy)]
pub struct GateCandidate<'a> {
    /// Document of `object`
    pub document: &'a str,
    /// Object the candidate resolves to, if resolution succeeded
    pub object: Option<&'a ObjectKey>,
    /// Sub-element under the gate's resolve mode
    pub subelement: &'a str,
}

/// Vets selection and preselection candidates
pub trait SelectionGate: Send {
    /// Check if the candidate may be selected
    fn allow(&mut self, graph: &dyn DocumentGraph, candidate: &GateCandidate<'_>) -> bool;

    /// Reason for the last rejection, consumed on read
    fn take_rejection_reason(&mut self) -> Option<String> {
        None
    }
}

/// Gate built from a closure
pub struct FnGate<F> {
    filter: F,
    reason: Option<String>,
    pending: Option<String>,
}

impl<F> FnGate<F>
where
    F: FnMut(&dyn DocumentGraph, &GateCandidate<'_>) -> bool + Send,
{
    /// Create a gate that rejects whatever `filter` returns `false` for
    pub fn new(filter: F) -> Self {
        Self {
            filter,
            reason: None,
            pending: None,
        }
    }

    /// Report `reason` on every rejection
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl<F> SelectionGate for FnGate<F>
where
    F: FnMut(&dyn DocumentGraph, &GateCandidate<'_>) -> bool + Send,
{
    fn allow(&mut self, graph: &dyn DocumentGraph, candidate: &GateCandidate<'_>) -> bool {
        let allowed = (self.filter)(graph, candidate);
        if !allowed {
            self.pending = self.reason.clone();
        }
        allowed
    }

    fn take_rejection_reason(&mut self) -> Option<String> {
        self.pending.take()
    }
}

impl<F> fmt::Debug for FnGate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnGate")
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

/// Keeps selections inside one document and away from one owner object
#[derive(Debug, Clone)]
pub struct ExternalObjectGate {
    document: String,
    owner: Option<String>,
    pending: Option<String>,
}

impl ExternalObjectGate {
    /// Reject objects outside `document`, and `owner` itself when given
    pub fn new(document: impl Into<String>, owner: Option<String>) -> Self {
        Self {
            document: document.into(),
            owner,
            pending: None,
        }
    }

    /// Gate for an observer owned by `owner`
    pub fn for_owner(owner: &ObjectKey) -> Self {
        Self::new(owner.document.clone(), Some(owner.object.clone()))
    }
}

impl SelectionGate for ExternalObjectGate {
    fn allow(&mut self, _graph: &dyn DocumentGraph, candidate: &GateCandidate<'_>) -> bool {
        let Some(object) = candidate.object else {
            return true;
        };
        if !self.document.is_empty() && object.document != self.document {
            self.pending = Some("Cannot select external object".to_string());
            return false;
        }
        if self.owner.as_deref() == Some(object.object.as_str()) {
            self.pending = Some("Cannot select self".to_string());
            return false;
        }
        true
    }

    fn take_rejection_reason(&mut self) -> Option<String> {
        self.pending.take()
    }
}

/// The installed gate and the mode candidates are resolved under
pub(crate) struct ActiveGate {
    pub gate: Box<dyn SelectionGate>,
    pub resolve: ResolveMode,
    /// Observer that installed the gate, removed along with it
    pub owner: Option<ObserverId>,
}

impl fmt::Debug for ActiveGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveGate")
            .field("resolve", &self.resolve)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rk_core::MemoryDocuments;

    fn candidate<'a>(object: &'a ObjectKey, sub: &'a str) -> GateCandidate<'a> {
        GateCandidate {
            document: &object.document,
            object: Some(object),
            subelement: sub,
        }
    }

    #[test]
    fn test_fn_gate_reason() {
        let docs = MemoryDocuments::new();
        let mut gate = FnGate::new(|_: &dyn DocumentGraph, c: &GateCandidate<'_>| {
            c.subelement.starts_with("Edge")
        })
        .with_reason("Only edges");

        let body = ObjectKey::new("Doc", "Body");
        assert!(gate.allow(&docs, &candidate(&body, "Edge1")));
        assert_eq!(gate.take_rejection_reason(), None);

        assert!(!gate.allow(&docs, &candidate(&body, "Face1")));
        assert_eq!(gate.take_rejection_reason().as_deref(), Some("Only edges"));
        assert_eq!(gate.take_rejection_reason(), None);
    }

    #[test]
    fn test_external_object_gate() {
        let docs = MemoryDocuments::new();
        let owner = ObjectKey::new("Doc", "Sketch");
        let mut gate = ExternalObjectGate::for_owner(&owner);

        let body = ObjectKey::new("Doc", "Body");
        assert!(gate.allow(&docs, &candidate(&body, "Edge1")));

        let foreign = ObjectKey::new("Other", "Body");
        assert!(!gate.allow(&docs, &candidate(&foreign, "Edge1")));
        assert_eq!(
            gate.take_rejection_reason().as_deref(),
            Some("Cannot select external object")
        );

        assert!(!gate.allow(&docs, &candidate(&owner, "")));
        assert_eq!(gate.take_rejection_reason().as_deref(), Some("Cannot select self"));

        let unresolved = GateCandidate {
            document: "Other",
            object: None,
            subelement: "",
        };
        assert!(gate.allow(&docs, &unresolved));
    }
}
