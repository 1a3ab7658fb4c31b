//! Selection history
//!
//! Two bounded stacks of selection snapshots. The back stack holds past
//! selections with the most recent at its end; the forward stack holds
//! selections undone by going back, the next one at its front.

use std::collections::{BTreeSet, VecDeque};

use crate::item::SelectionPath;

/// A past selection
pub type StackSnapshot = BTreeSet<SelectionPath>;

/// Back and forward selection history
#[derive(Debug, Clone)]
pub struct SelectionStack {
    back: VecDeque<StackSnapshot>,
    forward: VecDeque<StackSnapshot>,
    capacity: usize,
}

impl SelectionStack {
    /// Create empty stacks holding at most `capacity` snapshots each
    pub fn new(capacity: usize) -> Self {
        Self {
            back: VecDeque::new(),
            forward: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity, dropping the oldest snapshots if needed
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.back.len() > self.capacity {
            self.back.pop_front();
        }
        self.forward.truncate(self.capacity);
    }

    /// Record a snapshot on the back stack
    ///
    /// Empty snapshots and duplicates of the current top are ignored. With
    /// `overwrite` the top is replaced instead of pushed over. Returns
    /// `true` if the stack changed.
    pub fn push(&mut self, snapshot: StackSnapshot, clear_forward: bool, overwrite: bool) -> bool {
        if clear_forward {
            self.forward.clear();
        }
        if snapshot.is_empty() || self.back.back() == Some(&snapshot) {
            return false;
        }
        match self.back.back_mut() {
            Some(top) if overwrite => *top = snapshot,
            _ => self.push_back(snapshot),
        }
        true
    }

    pub fn clear_forward(&mut self) {
        self.forward.clear();
    }

    pub fn clear(&mut self) {
        self.back.clear();
        self.forward.clear();
    }

    pub fn back_len(&self) -> usize {
        self.back.len()
    }

    pub fn forward_len(&self) -> usize {
        self.forward.len()
    }

    /// Back snapshot by distance from the top, `0` being the most recent
    pub fn back_item(&self, index: usize) -> Option<&StackSnapshot> {
        let len = self.back.len();
        if index >= len {
            return None;
        }
        self.back.get(len - 1 - index)
    }

    /// Forward snapshot by distance, `0` being the next one
    pub fn forward_item(&self, index: usize) -> Option<&StackSnapshot> {
        self.forward.get(index)
    }

    // ============== Navigation primitives ==============

    pub(crate) fn top(&self) -> Option<&StackSnapshot> {
        self.back.back()
    }

    pub(crate) fn pop_back(&mut self) -> Option<StackSnapshot> {
        self.back.pop_back()
    }

    pub(crate) fn push_back(&mut self, snapshot: StackSnapshot) {
        self.back.push_back(snapshot);
        while self.back.len() > self.capacity {
            self.back.pop_front();
        }
    }

    /// Move the back top onto the front of the forward stack
    pub(crate) fn move_back_to_forward(&mut self) -> bool {
        match self.back.pop_back() {
            Some(snapshot) => {
                self.forward.push_front(snapshot);
                self.forward.truncate(self.capacity);
                true
            }
            None => false,
        }
    }

    /// Move the next forward snapshot onto the back stack
    pub(crate) fn move_forward_to_back(&mut self) -> bool {
        match self.forward.pop_front() {
            Some(snapshot) => {
                self.push_back(snapshot);
                true
            }
            None => false,
        }
    }

    pub(crate) fn take_forward(&mut self) -> VecDeque<StackSnapshot> {
        std::mem::take(&mut self.forward)
    }

    pub(crate) fn set_forward(&mut self, mut forward: VecDeque<StackSnapshot>) {
        forward.truncate(self.capacity);
        self.forward = forward;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(subs: &[&str]) -> StackSnapshot {
        subs.iter()
            .map(|s| SelectionPath::new("Doc", "Body", *s))
            .collect()
    }

    #[test]
    fn test_push_ignores_empty_and_duplicate() {
        let mut stack = SelectionStack::new(10);
        assert!(!stack.push(StackSnapshot::new(), false, false));
        assert!(stack.push(snapshot(&["Edge1"]), false, false));
        assert!(!stack.push(snapshot(&["Edge1"]), false, false));
        assert_eq!(stack.back_len(), 1);
    }

    #[test]
    fn test_push_overwrite() {
        let mut stack = SelectionStack::new(10);
        stack.push(snapshot(&["Edge1"]), false, false);
        stack.push(snapshot(&["Edge2"]), false, true);
        assert_eq!(stack.back_len(), 1);
        assert_eq!(stack.back_item(0), Some(&snapshot(&["Edge2"])));
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut stack = SelectionStack::new(2);
        stack.push(snapshot(&["Edge1"]), false, false);
        stack.push(snapshot(&["Edge2"]), false, false);
        stack.push(snapshot(&["Edge3"]), false, false);
        assert_eq!(stack.back_len(), 2);
        assert_eq!(stack.back_item(0), Some(&snapshot(&["Edge3"])));
        assert_eq!(stack.back_item(1), Some(&snapshot(&["Edge2"])));
        assert_eq!(stack.back_item(2), None);
    }

    #[test]
    fn test_move_between_stacks() {
        let mut stack = SelectionStack::new(10);
        stack.push(snapshot(&["Edge1"]), false, false);
        stack.push(snapshot(&["Edge2"]), false, false);

        assert!(stack.move_back_to_forward());
        assert_eq!(stack.forward_item(0), Some(&snapshot(&["Edge2"])));
        assert!(stack.move_forward_to_back());
        assert_eq!(stack.forward_len(), 0);
        assert_eq!(stack.back_item(0), Some(&snapshot(&["Edge2"])));

        stack.move_back_to_forward();
        assert!(stack.push(snapshot(&["Face1"]), true, false));
        assert_eq!(stack.forward_len(), 0);
    }
}
