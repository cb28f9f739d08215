//! Editor state and the actions that mutate it.
//!
//! All changes to items, background and selection go through [`Action`]s.
//! Item additions, updates and removals are recorded for undo; bulk
//! replacement, background and selection changes are not.

use crate::color::HexColor;
use crate::history::{History, HistoryLimit};
use crate::item::{Item, ItemId, ItemPatch};
use serde::{Deserialize, Serialize};

/// Canvas-wide background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasBackground {
    pub color: HexColor,
    /// Image data URI, painted over the color with cover scaling.
    pub image: Option<String>,
}

impl Default for CanvasBackground {
    fn default() -> Self {
        Self {
            color: HexColor::WHITE,
            image: None,
        }
    }
}

/// A named mutation of the editor state.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Append an item. Ignored if its id is already present.
    Add(Item),
    /// Merge a patch into an item. Ignored if the id is unknown.
    Update { id: ItemId, patch: ItemPatch },
    /// Merge a patch without recording history, continuing the most
    /// recent recorded change. Used to fold a drag into one undo step.
    Amend { id: ItemId, patch: ItemPatch },
    /// Drop an item. Ignored if the id is unknown.
    Remove(ItemId),
    Undo,
    Redo,
    /// Replace the item sequence without touching history.
    SetAll(Vec<Item>),
    SetBackgroundColor(HexColor),
    SetBackgroundImage(Option<String>),
    /// Change the selected item. Never recorded.
    Select(Option<ItemId>),
}

/// What an action touched, so observers can skip unnecessary work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Change {
    pub items: bool,
    pub background: bool,
    pub selection: bool,
}

impl Change {
    const ITEMS: Self = Self {
        items: true,
        background: false,
        selection: false,
    };
    const BACKGROUND: Self = Self {
        items: false,
        background: true,
        selection: false,
    };
    const SELECTION: Self = Self {
        items: false,
        background: false,
        selection: true,
    };

    pub fn is_none(&self) -> bool {
        !(self.items || self.background || self.selection)
    }
}

/// The complete editor state: items, history, background and selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorState {
    items: Vec<Item>,
    history: History,
    background: CanvasBackground,
    selection: Option<ItemId>,
}

/// Apply an action to a state, returning the new state.
pub fn apply(state: EditorState, action: Action) -> EditorState {
    state.apply(action)
}

impl EditorState {
    /// Create an empty state with unbounded history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty state with the given history limit.
    pub fn with_history_limit(limit: HistoryLimit) -> Self {
        Self {
            history: History::with_limit(limit),
            ..Self::default()
        }
    }

    /// Apply an action, consuming and returning the state.
    pub fn apply(mut self, action: Action) -> Self {
        self.dispatch(action);
        self
    }

    /// Apply an action in place and report what changed.
    pub fn dispatch(&mut self, action: Action) -> Change {
        let change = match action {
            Action::Add(item) => {
                if self.contains(item.id) {
                    log::warn!("Ignoring add of duplicate item id {}", item.id);
                    return Change::default();
                }
                self.history.record(&self.items);
                self.items.push(item);
                Change::ITEMS
            }
            Action::Update { id, patch } => {
                let Some(index) = self.index_of(id) else {
                    log::debug!("Ignoring update of unknown item {}", id);
                    return Change::default();
                };
                self.history.record(&self.items);
                patch.apply_to(&mut self.items[index]);
                Change::ITEMS
            }
            Action::Amend { id, patch } => {
                let Some(index) = self.index_of(id) else {
                    log::debug!("Ignoring amend of unknown item {}", id);
                    return Change::default();
                };
                patch.apply_to(&mut self.items[index]);
                Change::ITEMS
            }
            Action::Remove(id) => {
                let Some(index) = self.index_of(id) else {
                    log::debug!("Ignoring removal of unknown item {}", id);
                    return Change::default();
                };
                self.history.record(&self.items);
                self.items.remove(index);
                Change::ITEMS
            }
            Action::Undo => {
                if !self.history.undo(&mut self.items) {
                    return Change::default();
                }
                Change::ITEMS
            }
            Action::Redo => {
                if !self.history.redo(&mut self.items) {
                    return Change::default();
                }
                Change::ITEMS
            }
            Action::SetAll(items) => {
                self.items = items;
                Change::ITEMS
            }
            Action::SetBackgroundColor(color) => {
                self.background.color = color;
                Change::BACKGROUND
            }
            Action::SetBackgroundImage(image) => {
                self.background.image = image;
                Change::BACKGROUND
            }
            Action::Select(selection) => {
                let selection = selection.filter(|&id| self.contains(id));
                if selection == self.selection {
                    return Change::default();
                }
                self.selection = selection;
                Change::SELECTION
            }
        };

        if change.items {
            self.prune_selection()
        } else {
            change
        }
    }

    /// Drop the selection if the selected item no longer exists.
    fn prune_selection(&mut self) -> Change {
        match self.selection {
            Some(id) if !self.contains(id) => {
                self.selection = None;
                Change {
                    selection: true,
                    ..Change::ITEMS
                }
            }
            _ => Change::ITEMS,
        }
    }

    fn index_of(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// Items in paint order (back to front).
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn background(&self) -> &CanvasBackground {
        &self.background
    }

    pub fn selection(&self) -> Option<ItemId> {
        self.selection
    }

    pub fn selected_item(&self) -> Option<&Item> {
        self.selection.and_then(|id| self.get(id))
    }

    pub fn is_selected(&self, id: ItemId) -> bool {
        self.selection == Some(id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKind;
    use kurbo::Point;

    fn text(id: u64, content: &str) -> Item {
        Item::new(ItemId(id), ItemKind::Text, content)
    }

    fn emoji(id: u64, glyph: &str) -> Item {
        Item::new(ItemId(id), ItemKind::Emoji, glyph)
    }

    fn contents(state: &EditorState) -> Vec<&str> {
        state.items().iter().map(|i| i.content.as_str()).collect()
    }

    #[test]
    fn test_undo_redo_scenario() {
        let state = EditorState::new()
            .apply(Action::Add(text(1, "A")))
            .apply(Action::Add(emoji(2, "😊")));
        assert_eq!(contents(&state), ["A", "😊"]);

        let state = state.apply(Action::Undo);
        assert_eq!(contents(&state), ["A"]);
        let state = state.apply(Action::Undo);
        assert!(state.is_empty());
        let state = state.apply(Action::Redo);
        assert_eq!(contents(&state), ["A"]);
        let state = state.apply(Action::Redo);
        assert_eq!(contents(&state), ["A", "😊"]);

        let before = state.clone();
        let state = state.apply(Action::Redo);
        assert_eq!(state, before);
    }

    #[test]
    fn test_history_counts_recorded_actions() {
        let mut state = EditorState::new();
        state.dispatch(Action::Add(text(1, "a")));
        state.dispatch(Action::Add(text(2, "b")));
        state.dispatch(Action::Update {
            id: ItemId(1),
            patch: ItemPatch::size(30.0),
        });
        state.dispatch(Action::Remove(ItemId(2)));
        state.dispatch(Action::SetBackgroundColor(HexColor::BLACK));
        state.dispatch(Action::Select(Some(ItemId(1))));
        assert_eq!(state.history().past().len(), 4);

        // Undo reverses in LIFO order.
        state.dispatch(Action::Undo);
        assert_eq!(contents(&state), ["a", "b"]);
        state.dispatch(Action::Undo);
        assert_eq!(state.get(ItemId(1)).unwrap().size, 24.0);
        state.dispatch(Action::Undo);
        state.dispatch(Action::Undo);
        assert!(state.is_empty());
        assert!(!state.can_undo());
    }

    #[test]
    fn test_redo_undo_round_trip() {
        let state = EditorState::new()
            .apply(Action::Add(text(1, "a")))
            .apply(Action::Update {
                id: ItemId(1),
                patch: ItemPatch::angle(45.0),
            });
        let items = state.items().to_vec();
        let state = state.apply(Action::Undo).apply(Action::Redo);
        assert_eq!(state.items(), items.as_slice());
    }

    #[test]
    fn test_new_action_after_undo_clears_future() {
        let state = EditorState::new()
            .apply(Action::Add(text(1, "a")))
            .apply(Action::Add(text(2, "b")))
            .apply(Action::Undo)
            .apply(Action::Undo);
        assert_eq!(state.history().future().len(), 2);

        let state = state.apply(Action::Add(text(3, "c")));
        assert!(state.history().future().is_empty());
        assert!(!state.can_redo());
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let mut state = EditorState::new().apply(Action::Add(text(1, "a")));
        let before = state.clone();
        let change = state.dispatch(Action::Update {
            id: ItemId(99),
            patch: ItemPatch::content("zzz"),
        });
        assert!(change.is_none());
        assert_eq!(state, before);

        let change = state.dispatch(Action::Remove(ItemId(99)));
        assert!(change.is_none());
        assert_eq!(state, before);
    }

    #[test]
    fn test_duplicate_add_is_ignored() {
        let state = EditorState::new()
            .apply(Action::Add(text(1, "a")))
            .apply(Action::Add(text(1, "again")));
        assert_eq!(contents(&state), ["a"]);
        assert_eq!(state.history().past().len(), 1);
    }

    #[test]
    fn test_background_and_selection_not_recorded() {
        let mut state = EditorState::new().apply(Action::Add(text(1, "a")));
        for _ in 0..5 {
            state.dispatch(Action::SetBackgroundColor(HexColor::new(1, 2, 3)));
            state.dispatch(Action::SetBackgroundImage(Some("data:image/png;base64,".into())));
            state.dispatch(Action::Select(Some(ItemId(1))));
            state.dispatch(Action::Select(None));
        }
        assert_eq!(state.history().past().len(), 1);
        assert!(state.history().future().is_empty());

        state.dispatch(Action::Undo);
        for _ in 0..3 {
            state.dispatch(Action::SetBackgroundColor(HexColor::WHITE));
            state.dispatch(Action::Select(None));
        }
        assert_eq!(state.history().future().len(), 1);
        assert!(state.history().past().is_empty());
    }

    #[test]
    fn test_set_all_bypasses_history() {
        let state = EditorState::new().apply(Action::SetAll(vec![text(1, "a"), text(2, "b")]));
        assert_eq!(state.len(), 2);
        assert!(!state.can_undo());
    }

    #[test]
    fn test_amend_is_not_recorded() {
        let state = EditorState::new()
            .apply(Action::Add(text(1, "a")))
            .apply(Action::Update {
                id: ItemId(1),
                patch: ItemPatch::position(Point::new(110.0, 100.0)),
            })
            .apply(Action::Amend {
                id: ItemId(1),
                patch: ItemPatch::position(Point::new(150.0, 120.0)),
            });
        assert_eq!(state.history().past().len(), 2);
        assert_eq!(state.get(ItemId(1)).unwrap().position, Point::new(150.0, 120.0));

        let state = state.apply(Action::Undo);
        assert_eq!(state.get(ItemId(1)).unwrap().position, Point::new(100.0, 100.0));
    }

    #[test]
    fn test_selection_is_single_and_pruned() {
        let mut state = EditorState::new()
            .apply(Action::Add(text(1, "a")))
            .apply(Action::Add(text(2, "b")));

        state.dispatch(Action::Select(Some(ItemId(1))));
        state.dispatch(Action::Select(Some(ItemId(2))));
        assert_eq!(state.selection(), Some(ItemId(2)));
        assert!(!state.is_selected(ItemId(1)));

        // Selecting an unknown id clears the selection.
        state.dispatch(Action::Select(Some(ItemId(42))));
        assert_eq!(state.selection(), None);

        state.dispatch(Action::Select(Some(ItemId(2))));
        let change = state.dispatch(Action::Remove(ItemId(2)));
        assert!(change.items && change.selection);
        assert_eq!(state.selection(), None);
    }

    /// Small deterministic generator so action sequences are reproducible.
    struct XorShift(u64);

    impl XorShift {
        fn next(&mut self) -> u64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            self.0
        }

        fn below(&mut self, n: u64) -> u64 {
            self.next() % n
        }
    }

    #[test]
    fn test_history_laws_hold_for_generated_sequences() {
        for seed in 1..=40u64 {
            let mut rng = XorShift(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15));
            let mut state = EditorState::new();
            // Item sequences as they were before each recorded action, newest last.
            let mut undo_model: Vec<Vec<Item>> = Vec::new();
            let mut redo_model: Vec<Vec<Item>> = Vec::new();
            let mut next_id = 1;

            for _ in 0..60 {
                let before = state.items().to_vec();
                let existing = |rng: &mut XorShift| match before.len() as u64 {
                    0 => ItemId(999),
                    _ if rng.below(5) == 0 => ItemId(999),
                    n => before[rng.below(n) as usize].id,
                };
                let action = match rng.below(6) {
                    0 | 1 => {
                        next_id += 1;
                        Action::Add(text(next_id, "x"))
                    }
                    2 => Action::Update {
                        id: existing(&mut rng),
                        patch: ItemPatch::size(1.0 + rng.below(80) as f64),
                    },
                    3 => Action::Remove(existing(&mut rng)),
                    4 => Action::Undo,
                    _ => Action::Redo,
                };

                let stale = matches!(
                    &action,
                    Action::Update { id, .. } | Action::Remove(id) if !state.contains(*id)
                );
                match action {
                    Action::Undo => {
                        let change = state.dispatch(Action::Undo);
                        match undo_model.pop() {
                            Some(prior) => {
                                assert!(change.items);
                                assert_eq!(state.items(), prior.as_slice());
                                redo_model.push(before);
                            }
                            None => assert!(change.is_none()),
                        }
                    }
                    Action::Redo => {
                        let change = state.dispatch(Action::Redo);
                        match redo_model.pop() {
                            Some(next) => {
                                assert!(change.items);
                                assert_eq!(state.items(), next.as_slice());
                                undo_model.push(before);
                            }
                            None => assert!(change.is_none()),
                        }
                    }
                    stale_action if stale => {
                        let change = state.dispatch(stale_action);
                        assert!(change.is_none());
                        assert_eq!(state.items(), before.as_slice());
                    }
                    recorded => {
                        assert!(state.dispatch(recorded).items);
                        undo_model.push(before);
                        redo_model.clear();
                        assert!(state.history().future().is_empty());
                    }
                }

                assert_eq!(state.history().past().len(), undo_model.len());
                assert_eq!(state.history().future().len(), redo_model.len());

                if state.can_undo() {
                    let round_trip = state.clone().apply(Action::Undo).apply(Action::Redo);
                    assert_eq!(round_trip.items(), state.items());
                }
            }
        }
    }

    #[test]
    fn test_free_apply_function() {
        let state = apply(EditorState::new(), Action::Add(text(1, "a")));
        assert_eq!(state.len(), 1);
    }
}
