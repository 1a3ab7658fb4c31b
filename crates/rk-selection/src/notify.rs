//! Notification queue
//!
//! Changes raised while observers are being notified are appended to the
//! queue and delivered by the outer drain loop, in order, once the current
//! handler returns.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::change::SelectionChange;

/// Whether a drain loop is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrainState {
    #[default]
    Idle,
    Draining,
}

/// FIFO of pending changes plus the drain flag
#[derive(Debug, Default)]
pub struct NotificationQueue {
    pending: VecDeque<SelectionChange>,
    state: Arc<Mutex<DrainState>>,
}

impl NotificationQueue {
    /// Create an empty, idle queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Current drain state
    pub fn state(&self) -> DrainState {
        *self.state.lock()
    }

    /// Check if a drain loop is running
    pub fn is_draining(&self) -> bool {
        self.state() == DrainState::Draining
    }

    /// Append a change
    pub fn push(&mut self, change: SelectionChange) {
        self.pending.push_back(change);
    }

    /// Take the oldest pending change
    pub fn pop(&mut self) -> Option<SelectionChange> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop all pending changes
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Start draining
    ///
    /// Returns `None` if a drain is already running. The state returns to
    /// [`DrainState::Idle`] when the guard drops, including during unwinding.
    pub fn begin(&self) -> Option<DrainGuard> {
        let mut state = self.state.lock();
        if *state == DrainState::Draining {
            return None;
        }
        *state = DrainState::Draining;
        Some(DrainGuard {
            state: Arc::clone(&self.state),
        })
    }
}

/// Holds the queue in [`DrainState::Draining`]
#[must_use = "the drain ends when the guard is dropped"]
#[derive(Debug)]
pub struct DrainGuard {
    state: Arc<Mutex<DrainState>>,
}

impl Drop for DrainGuard {
    fn drop(&mut self) {
        *self.state.lock() = DrainState::Idle;
    }
}
