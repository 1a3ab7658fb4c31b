//! Change delivery
//!
//! Every change goes through one queue. The first caller drains it; changes
//! raised by observers while the drain runs are appended and delivered
//! afterwards. Each change is re-checked against the current state right
//! before delivery so observers never see stale adds or removals.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{error, warn};

use super::{Preselection, SelectionContext};
use crate::change::{ChangeKind, SelectionChange};
use crate::observer::{ObserverError, ObserverHandle, ObserverId};
use crate::resolve::{ResolveMode, resolve};

impl SelectionContext {
    /// Queue a change and deliver pending changes unless a drain is running
    pub fn notify(&mut self, change: SelectionChange) {
        self.queue.push(change);
        let Some(_guard) = self.queue.begin() else {
            return;
        };
        while let Some(change) = self.queue.pop() {
            if self.should_deliver(&change) {
                self.dispatch(&change);
            }
        }
    }

    /// Check if a queued change still describes the current state
    fn should_deliver(&self, change: &SelectionChange) -> bool {
        match change.kind {
            ChangeKind::AddSelection => self.is_selected(
                &change.document,
                &change.object,
                &change.sub_name,
                ResolveMode::NoResolve,
            ),
            ChangeKind::RmvSelection => !self.is_selected(
                &change.document,
                &change.object,
                &change.sub_name,
                ResolveMode::NoResolve,
            ),
            ChangeKind::SetPreselect => matches!(
                &self.preselection,
                Preselection::Hovering(hover)
                    if hover.is_target(&change.document, &change.object, &change.sub_name)
            ),
            ChangeKind::RmvPreselect => matches!(self.preselection, Preselection::Idle),
            _ => true,
        }
    }

    fn dispatch(&mut self, change: &SelectionChange) {
        self.view.on_selection_changed(change);

        let observers = self.observers.snapshot();
        if observers.is_empty() {
            return;
        }

        let needs_resolved =
            !change.sub_name.is_empty() && observers.iter().any(|(_, mode, _)| mode.resolves());
        let (old_style, new_style) = if needs_resolved {
            (
                self.resolved_change(change, ResolveMode::OldStyleElement),
                self.resolved_change(change, ResolveMode::NewStyleElement),
            )
        } else {
            (None, None)
        };

        for (id, mode, observer) in observers {
            // an earlier handler may have detached or blocked this one
            if !self.observers.is_attached(id) || self.observers.is_blocked(id) {
                continue;
            }
            let delivered = if !mode.resolves() {
                change
            } else if matches!(
                change.kind,
                ChangeKind::SetPreselectSignal
                    | ChangeKind::ShowSelection
                    | ChangeKind::HideSelection
            ) {
                continue;
            } else if change.sub_name.is_empty() {
                change
            } else {
                let resolved = if mode.is_new_style() {
                    new_style.as_ref()
                } else {
                    old_style.as_ref()
                };
                match resolved {
                    Some(resolved) => resolved,
                    None => continue,
                }
            };
            self.call_observer(id, &observer, delivered);
        }
    }

    /// The change as seen by observers attached under `mode`
    fn resolved_change(&self, change: &SelectionChange, mode: ResolveMode) -> Option<SelectionChange> {
        let top = change.object_key()?;
        let resolution = resolve(self.graph.as_ref(), &top, &change.sub_name)?;
        let type_name = self
            .graph
            .type_name(&resolution.object)
            .unwrap_or_default();
        Some(SelectionChange {
            kind: change.kind,
            document: resolution.object.document.clone(),
            object: resolution.object.object.clone(),
            sub_name: resolution.subelement(mode).to_string(),
            type_name,
            position: change.position,
            source: change.source,
            original: Some(Box::new(change.clone())),
        })
    }

    /// Run one handler, containing its errors and panics
    fn call_observer(&mut self, id: ObserverId, observer: &ObserverHandle, change: &SelectionChange) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match observer.try_lock() {
            Some(mut handler) => handler.on_selection_changed(self, change),
            None => {
                warn!(
                    "Selection observer {} is busy, dropping {:?}",
                    id, change.kind
                );
                Ok(())
            }
        }));

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(ObserverError::Selection(e))) => {
                error!("Unhandled selection error in selection observer {}: {}", id, e);
            }
            Ok(Err(e)) => {
                error!("Unhandled error in selection observer {}: {}", id, e);
            }
            Err(payload) => {
                error!(
                    "Unhandled panic in selection observer {}: {}",
                    id,
                    panic_message(payload.as_ref())
                );
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec3;
    use parking_lot::Mutex;

    use super::super::test_support::{Recorder, context};
    use crate::context::SelectionContext;
    use crate::change::{ChangeKind, SelectionChange};
    use crate::observer::{ObserverError, ObserverResult, shared_observer};
    use crate::resolve::ResolveMode;

    #[test]
    fn test_handler_mutation_is_queued() {
        let (_docs, mut selection) = context();
        let recorder = Arc::new(Mutex::new(Recorder::default()));
        let clearer = shared_observer(|sel: &mut SelectionContext, change: &SelectionChange| -> ObserverResult {
            if change.kind == ChangeKind::AddSelection {
                sel.clear_complete_selection(true);
            }
            Ok(())
        });
        selection.attach(&clearer, ResolveMode::NoResolve);
        selection.attach(&recorder, ResolveMode::NoResolve);

        assert!(!selection.add_selection("Doc", "Box", "Face1", Vec3::ZERO));
        assert!(!selection.has_selection());
        assert_eq!(
            recorder.lock().kinds(),
            vec![ChangeKind::AddSelection, ChangeKind::ClrSelection]
        );
    }

    #[test]
    fn test_failing_observers_are_contained() {
        let (_docs, mut selection) = context();
        let failing = shared_observer(|_: &mut SelectionContext, _: &SelectionChange| -> ObserverResult {
            Err(ObserverError::other("no handler"))
        });
        let panicking = shared_observer(|_: &mut SelectionContext, _: &SelectionChange| -> ObserverResult {
            panic!("handler bug")
        });
        let recorder = Arc::new(Mutex::new(Recorder::default()));
        selection.attach(&failing, ResolveMode::NoResolve);
        selection.attach(&panicking, ResolveMode::NoResolve);
        selection.attach(&recorder, ResolveMode::NoResolve);

        assert!(selection.add_selection("Doc", "Box", "Face1", Vec3::ZERO));
        assert_eq!(recorder.lock().kinds(), vec![ChangeKind::AddSelection]);
        assert!(!selection.queue.is_draining());

        assert!(selection.add_selection("Doc", "Box", "Face2", Vec3::ZERO));
        assert_eq!(recorder.lock().changes.len(), 2);
    }

    #[test]
    fn test_resolved_observer_receives_owner() {
        let (_docs, mut selection) = context();
        let raw = Arc::new(Mutex::new(Recorder::default()));
        let old = Arc::new(Mutex::new(Recorder::default()));
        let new = Arc::new(Mutex::new(Recorder::default()));
        selection.attach(&raw, ResolveMode::NoResolve);
        selection.attach(&old, ResolveMode::OldStyleElement);
        selection.attach(&new, ResolveMode::NewStyleElement);

        selection.add_selection("Doc", "Part", "Body.Edge1", Vec3::ZERO);

        let raw = raw.lock();
        assert_eq!(raw.changes[0].object, "Part");
        assert_eq!(raw.changes[0].sub_name, "Body.;e1;Pad");

        let old = old.lock();
        assert_eq!(old.changes[0].object, "Body");
        assert_eq!(old.changes[0].sub_name, "Edge1");
        let original = old.changes[0].original.as_deref().unwrap();
        assert_eq!(original.object, "Part");

        assert_eq!(new.lock().changes[0].sub_name, ";e1;Pad");
    }

    #[test]
    fn test_resolved_observer_skips_signals() {
        let (_docs, mut selection) = context();
        let resolved = Arc::new(Mutex::new(Recorder::default()));
        selection.attach(&resolved, ResolveMode::OldStyleElement);

        selection.notify(SelectionChange::for_object(
            ChangeKind::ShowSelection,
            "Doc",
            "Box",
            "Face1",
        ));
        selection.notify(SelectionChange::for_document(ChangeKind::ClrSelection, "Doc"));
        assert_eq!(resolved.lock().kinds(), vec![ChangeKind::ClrSelection]);
    }

    #[test]
    fn test_stale_add_not_delivered() {
        let (_docs, mut selection) = context();
        let recorder = Arc::new(Mutex::new(Recorder::default()));
        selection.attach(&recorder, ResolveMode::NoResolve);

        selection.notify(SelectionChange::for_object(
            ChangeKind::AddSelection,
            "Doc",
            "Box",
            "Face1",
        ));
        assert!(recorder.lock().changes.is_empty());
    }

    #[test]
    fn test_stale_removal_not_delivered() {
        let (_docs, mut selection) = context();
        let toggler = shared_observer(|sel: &mut SelectionContext, change: &SelectionChange| -> ObserverResult {
            if change.kind == ChangeKind::AddSelection && change.sub_name == "Face2" {
                sel.rmv_selection("Doc", "Box", "Face1", None);
                sel.add_selection("Doc", "Box", "Face1", Vec3::ZERO);
            }
            Ok(())
        });
        let recorder = Arc::new(Mutex::new(Recorder::default()));
        selection.attach(&toggler, ResolveMode::NoResolve);
        selection.attach(&recorder, ResolveMode::NoResolve);

        selection.add_selection("Doc", "Box", "Face1", Vec3::ZERO);
        selection.add_selection("Doc", "Box", "Face2", Vec3::ZERO);

        let recorded = recorder.lock();
        assert_eq!(
            recorded.kinds(),
            vec![ChangeKind::AddSelection, ChangeKind::AddSelection, ChangeKind::AddSelection]
        );
        assert_eq!(recorded.changes[2].sub_name, "Face1");
        assert!(selection.is_selected("Doc", "Box", "Face1", ResolveMode::NoResolve));
    }

    #[test]
    fn test_blocked_and_dropped_observers() {
        let (_docs, mut selection) = context();
        let recorder = Arc::new(Mutex::new(Recorder::default()));
        let id = selection.attach(&recorder, ResolveMode::NoResolve);

        selection.block_observer(id, true);
        selection.add_selection("Doc", "Box", "Face1", Vec3::ZERO);
        assert!(recorder.lock().changes.is_empty());

        selection.block_observer(id, false);
        selection.add_selection("Doc", "Box", "Face2", Vec3::ZERO);
        assert_eq!(recorder.lock().changes.len(), 1);

        drop(recorder);
        assert!(!selection.is_observer_attached(id));
        selection.clear_complete_selection(true);
    }
}
