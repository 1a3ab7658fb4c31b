//! Selection observers
//!
//! Observers are held weakly. Dropping the last strong handle detaches the
//! observer; the registry prunes it before the next dispatch.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use thiserror::Error;
use uuid::Uuid;

use crate::change::SelectionChange;
use crate::context::SelectionContext;
use crate::error::SelectionError;
use crate::resolve::ResolveMode;

/// Failure reported by an observer
///
/// Errors are logged by the dispatcher and never reach the code that
/// raised the change.
#[derive(Debug, Error)]
pub enum ObserverError {
    #[error("selection error: {0}")]
    Selection(#[from] SelectionError),

    #[error("{0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl ObserverError {
    /// Wrap any error
    pub fn other(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Other(error.into())
    }
}

/// Result type for observer callbacks
pub type ObserverResult = Result<(), ObserverError>;

/// Receives selection changes
///
/// The handler gets the selection context back and may mutate it; changes
/// raised from inside a handler are queued and delivered after it returns.
pub trait SelectionObserver: Send {
    fn on_selection_changed(
        &mut self,
        selection: &mut SelectionContext,
        change: &SelectionChange,
    ) -> ObserverResult;
}

impl<F> SelectionObserver for F
where
    F: FnMut(&mut SelectionContext, &SelectionChange) -> ObserverResult + Send,
{
    fn on_selection_changed(
        &mut self,
        selection: &mut SelectionContext,
        change: &SelectionChange,
    ) -> ObserverResult {
        self(selection, change)
    }
}

/// Wrap a closure as a shareable observer
pub fn shared_observer<F>(handler: F) -> Arc<Mutex<F>>
where
    F: FnMut(&mut SelectionContext, &SelectionChange) -> ObserverResult + Send,
{
    Arc::new(Mutex::new(handler))
}

/// Handle returned by attach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(Uuid);

impl ObserverId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub(crate) type ObserverHandle = Arc<Mutex<dyn SelectionObserver>>;

struct ObserverEntry {
    id: ObserverId,
    observer: Weak<Mutex<dyn SelectionObserver>>,
    resolve: ResolveMode,
    blocked: bool,
}

impl fmt::Debug for ObserverEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverEntry")
            .field("id", &self.id)
            .field("resolve", &self.resolve)
            .field("blocked", &self.blocked)
            .field("alive", &(self.observer.strong_count() > 0))
            .finish()
    }
}

/// Attached observers in attach order
#[derive(Debug, Default)]
pub struct ObserverRegistry {
    entries: Vec<ObserverEntry>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an observer receiving changes resolved under `resolve`
    pub fn attach<O>(&mut self, observer: &Arc<Mutex<O>>, resolve: ResolveMode) -> ObserverId
    where
        O: SelectionObserver + 'static,
    {
        let strong: ObserverHandle = observer.clone();
        let id = ObserverId::new();
        self.entries.push(ObserverEntry {
            id,
            observer: Arc::downgrade(&strong),
            resolve,
            blocked: false,
        });
        id
    }

    /// Detach an observer; returns `false` if it was not attached
    pub fn detach(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Block or unblock delivery; returns the previous blocked state
    pub fn block(&mut self, id: ObserverId, blocked: bool) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => std::mem::replace(&mut entry.blocked, blocked),
            None => false,
        }
    }

    pub fn is_blocked(&self, id: ObserverId) -> bool {
        self.entries.iter().any(|e| e.id == id && e.blocked)
    }

    /// Check if the observer is attached and still alive
    pub fn is_attached(&self, id: ObserverId) -> bool {
        self.entries
            .iter()
            .any(|e| e.id == id && e.observer.strong_count() > 0)
    }

    /// Number of live observers
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.observer.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Live, unblocked observers for one dispatch
    pub(crate) fn snapshot(&mut self) -> Vec<(ObserverId, ResolveMode, ObserverHandle)> {
        self.entries.retain(|e| e.observer.strong_count() > 0);
        self.entries
            .iter()
            .filter(|e| !e.blocked)
            .filter_map(|e| e.observer.upgrade().map(|o| (e.id, e.resolve, o)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;

    impl SelectionObserver for Silent {
        fn on_selection_changed(
            &mut self,
            _selection: &mut SelectionContext,
            _change: &SelectionChange,
        ) -> ObserverResult {
            Ok(())
        }
    }

    #[test]
    fn test_attach_detach() {
        let mut registry = ObserverRegistry::new();
        let observer = Arc::new(Mutex::new(Silent));
        let id = registry.attach(&observer, ResolveMode::NoResolve);

        assert!(registry.is_attached(id));
        assert_eq!(registry.len(), 1);
        assert!(registry.detach(id));
        assert!(!registry.detach(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_dropped_observer_is_pruned() {
        let mut registry = ObserverRegistry::new();
        let observer = Arc::new(Mutex::new(Silent));
        let id = registry.attach(&observer, ResolveMode::OldStyleElement);
        drop(observer);

        assert!(!registry.is_attached(id));
        assert!(registry.snapshot().is_empty());
        assert!(!registry.detach(id));
    }

    #[test]
    fn test_blocked_observer_skipped() {
        let mut registry = ObserverRegistry::new();
        let observer = Arc::new(Mutex::new(Silent));
        let id = registry.attach(&observer, ResolveMode::NoResolve);

        assert!(!registry.block(id, true));
        assert!(registry.is_blocked(id));
        assert!(registry.snapshot().is_empty());
        assert!(registry.block(id, false));
        assert_eq!(registry.snapshot().len(), 1);
    }
}
