//! Snapshot-based undo/redo stacks.

use crate::item::Item;

/// A full copy of the item sequence.
pub type Snapshot = Vec<Item>;

/// How many undo states to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryLimit {
    #[default]
    Unbounded,
    /// Keep at most this many snapshots, dropping the oldest first.
    Capped(usize),
}

/// Linear undo/redo over item snapshots.
///
/// The top of each stack is the last element of its vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    past: Vec<Snapshot>,
    future: Vec<Snapshot>,
    limit: HistoryLimit,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: HistoryLimit) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Push the state prior to a change. Any redo branch is discarded.
    pub fn record(&mut self, prior: &[Item]) {
        self.past.push(prior.to_vec());
        self.future.clear();

        if let HistoryLimit::Capped(max) = self.limit {
            while self.past.len() > max {
                self.past.remove(0);
            }
        }
    }

    /// Step back: `current` is replaced with the newest past snapshot.
    /// Returns false if there was nothing to undo.
    pub fn undo(&mut self, current: &mut Vec<Item>) -> bool {
        let Some(previous) = self.past.pop() else {
            return false;
        };
        let replaced = std::mem::replace(current, previous);
        self.future.push(replaced);
        true
    }

    /// Step forward again after an undo.
    /// Returns false if there was nothing to redo.
    pub fn redo(&mut self, current: &mut Vec<Item>) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };
        let replaced = std::mem::replace(current, next);
        self.past.push(replaced);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Past snapshots, oldest first.
    pub fn past(&self) -> &[Snapshot] {
        &self.past
    }

    /// Redo snapshots; the last one is restored by the next redo.
    pub fn future(&self) -> &[Snapshot] {
        &self.future
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemId, ItemKind};

    fn text(id: u64) -> Item {
        Item::new(ItemId(id), ItemKind::Text, format!("#{id}"))
    }

    #[test]
    fn test_undo_empty_stack() {
        let mut history = History::new();
        let mut items = vec![text(1)];
        assert!(!history.can_undo());
        assert!(!history.undo(&mut items));
        assert!(!history.redo(&mut items));
        assert_eq!(items, vec![text(1)]);
    }

    #[test]
    fn test_undo_then_redo() {
        let mut history = History::new();
        let mut items = Vec::new();

        history.record(&items);
        items.push(text(1));

        assert!(history.undo(&mut items));
        assert!(items.is_empty());
        assert!(history.can_redo());

        assert!(history.redo(&mut items));
        assert_eq!(items, vec![text(1)]);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::new();
        let mut items = Vec::new();
        history.record(&items);
        items.push(text(1));
        history.undo(&mut items);

        history.record(&items);
        items.push(text(2));
        assert!(history.future().is_empty());
    }

    #[test]
    fn test_capped_history_drops_oldest() {
        let mut history = History::with_limit(HistoryLimit::Capped(2));
        let mut items = Vec::new();
        for id in 1..=3 {
            history.record(&items);
            items.push(text(id));
        }
        assert_eq!(history.past().len(), 2);
        // Oldest remaining snapshot is the one taken before item 2 was added.
        assert_eq!(history.past()[0], vec![text(1)]);
    }
}
