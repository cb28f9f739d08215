//! Editing session: state, drag handling, id allocation and persistence.
//!
//! [`Editor`] is what front ends talk to. Every mutation is dispatched as an
//! [`Action`] and, when storage is attached, mirrored to it afterwards.

use crate::catalog::FontFamily;
use crate::color::HexColor;
use crate::drag::{DragController, DragHistory};
use crate::history::HistoryLimit;
use crate::input::PointerEvent;
use crate::item::{IdAllocator, Item, ItemId, ItemKind, ItemPatch};
use crate::state::{Action, CanvasBackground, Change, EditorState};
use crate::storage::{Persistence, SlotKeys, SlotStorage};
use kurbo::Size;

/// Editor configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    pub drag_history: DragHistory,
    pub history_limit: HistoryLimit,
    /// Logical canvas size.
    pub canvas_size: Size,
    pub slot_keys: SlotKeys,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            drag_history: DragHistory::default(),
            history_limit: HistoryLimit::default(),
            canvas_size: Size::new(800.0, 600.0),
            slot_keys: SlotKeys::default(),
        }
    }
}

/// One editing session over a single canvas.
pub struct Editor {
    config: EditorConfig,
    state: EditorState,
    drag: DragController,
    ids: IdAllocator,
    persistence: Option<Persistence<Box<dyn SlotStorage>>>,
}

impl Editor {
    /// Toolbar size step.
    pub const SIZE_STEP: f64 = 4.0;
    /// Toolbar rotation step, in degrees.
    pub const ROTATION_STEP: f64 = 15.0;

    /// Create an editor that keeps everything in memory.
    pub fn new(config: EditorConfig) -> Self {
        Self {
            state: EditorState::with_history_limit(config.history_limit),
            drag: DragController::new(config.drag_history),
            ids: IdAllocator::new(),
            persistence: None,
            config,
        }
    }

    /// Create an editor backed by `storage`, restoring whatever it holds.
    pub fn with_storage(config: EditorConfig, storage: Box<dyn SlotStorage>) -> Self {
        let keys = config.slot_keys.clone();
        let mut editor = Self::new(config);
        editor.persistence = Some(Persistence::with_keys(storage, keys));
        editor.restore();
        editor
    }

    /// Reload items and background from storage without recording history.
    pub fn restore(&mut self) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        let restored = persistence.restore();
        self.ids.observe(&restored.items);
        self.drag.cancel();
        self.state.dispatch(Action::SetAll(restored.items));
        self.state
            .dispatch(Action::SetBackgroundColor(restored.background.color));
        self.state
            .dispatch(Action::SetBackgroundImage(restored.background.image));
    }

    /// Apply an action and mirror the result to storage.
    ///
    /// Recorded edits that do not come from the drag controller start a new
    /// undo step for any drag in progress, so later moves are not folded into
    /// the edit.
    pub fn dispatch(&mut self, action: Action) -> Change {
        let recorded = matches!(
            action,
            Action::Add(_) | Action::Update { .. } | Action::Remove(_)
        );
        let change = self.apply(action);
        if recorded && change.items {
            self.drag.break_collapse();
        }
        change
    }

    fn apply(&mut self, action: Action) -> Change {
        match &action {
            Action::Undo | Action::Redo => self.drag.cancel(),
            Action::SetAll(items) => {
                self.drag.cancel();
                self.ids.observe(items);
            }
            Action::Add(item) => self.ids.observe([item]),
            _ => {}
        }
        let change = self.state.dispatch(action);
        if change.items {
            if let Some(session) = self.drag.session() {
                if !self.state.contains(session.item) {
                    self.drag.cancel();
                }
            }
        }
        self.persist(change);
        change
    }

    fn persist(&self, change: Change) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        if change.items {
            if let Err(e) = persistence.save_items(self.state.items()) {
                log::warn!("Failed to save items: {}", e);
            }
        }
        if change.background {
            if let Err(e) = persistence.save_background(self.state.background()) {
                log::warn!("Failed to save background: {}", e);
            }
        }
    }

    /// Add a new item with default properties and return its id.
    pub fn add(&mut self, kind: ItemKind, content: impl Into<String>) -> ItemId {
        let id = self.ids.allocate();
        log::debug!("Adding {} item {}", kind.name(), id);
        let change = self.dispatch(Action::Add(Item::new(id, kind, content)));
        debug_assert!(change.items, "allocated id {} was already in use", id);
        id
    }

    pub fn add_text(&mut self, text: impl Into<String>) -> ItemId {
        self.add(ItemKind::Text, text)
    }

    pub fn add_emoji(&mut self, glyph: impl Into<String>) -> ItemId {
        self.add(ItemKind::Emoji, glyph)
    }

    /// Add an image from a data URI.
    pub fn add_image(&mut self, data_uri: impl Into<String>) -> ItemId {
        self.add(ItemKind::Image, data_uri)
    }

    pub fn select(&mut self, id: Option<ItemId>) -> Change {
        self.dispatch(Action::Select(id))
    }

    /// Feed a pointer event. Pressing on an item selects it and starts a drag.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Change {
        let mut change = Change::default();
        if let PointerEvent::Down {
            target: Some(id), ..
        } = event
        {
            if self.drag.is_dragging() {
                // Only the pointer that owns the drag may re-target it.
                if self.drag.session().map(|s| s.pointer) != Some(event.pointer()) {
                    return change;
                }
            }
            change = self.select(Some(id));
        }
        match self.drag.handle(&self.state, event) {
            Some(action) => {
                let moved = self.apply(action);
                Change {
                    items: moved.items,
                    background: false,
                    selection: change.selection || moved.selection,
                }
            }
            None => change,
        }
    }

    /// Patch the selected item. Without a selection this does nothing.
    pub fn update_selected(&mut self, patch: ItemPatch) -> Change {
        match self.state.selection() {
            Some(id) => self.dispatch(Action::Update { id, patch }),
            None => Change::default(),
        }
    }

    fn selected(&self) -> Option<&Item> {
        self.state.selected_item()
    }

    /// Grow or shrink the selected item by `delta`.
    pub fn resize_by(&mut self, delta: f64) -> Change {
        match self.selected().map(|item| item.size) {
            Some(size) => self.update_selected(ItemPatch::size(size + delta)),
            None => Change::default(),
        }
    }

    /// Rotate the selected item by `degrees`.
    pub fn rotate_by(&mut self, degrees: f64) -> Change {
        match self.selected().map(|item| item.angle) {
            Some(angle) => self.update_selected(ItemPatch::angle(angle + degrees)),
            None => Change::default(),
        }
    }

    pub fn set_size(&mut self, size: f64) -> Change {
        self.update_selected(ItemPatch::size(size))
    }

    pub fn set_angle(&mut self, angle: f64) -> Change {
        self.update_selected(ItemPatch::angle(angle))
    }

    pub fn set_color(&mut self, color: HexColor) -> Change {
        self.update_selected(ItemPatch::color(color))
    }

    pub fn set_opacity(&mut self, opacity: f64) -> Change {
        self.update_selected(ItemPatch::opacity(opacity))
    }

    /// Set the selected item's background fill.
    pub fn set_fill(&mut self, color: HexColor, opacity: Option<f64>) -> Change {
        self.update_selected(ItemPatch::background(color, opacity))
    }

    /// Change the font of the selected item. Only text items have a font.
    pub fn set_font(&mut self, family: FontFamily) -> Change {
        if self.selected().is_some_and(Item::is_text) {
            self.update_selected(ItemPatch::font_family(family))
        } else {
            Change::default()
        }
    }

    pub fn set_content(&mut self, content: impl Into<String>) -> Change {
        self.update_selected(ItemPatch::content(content))
    }

    pub fn remove_selected(&mut self) -> Change {
        match self.state.selection() {
            Some(id) => self.dispatch(Action::Remove(id)),
            None => Change::default(),
        }
    }

    pub fn undo(&mut self) -> Change {
        self.dispatch(Action::Undo)
    }

    pub fn redo(&mut self) -> Change {
        self.dispatch(Action::Redo)
    }

    pub fn set_background_color(&mut self, color: HexColor) -> Change {
        self.dispatch(Action::SetBackgroundColor(color))
    }

    pub fn set_background_image(&mut self, data_uri: Option<String>) -> Change {
        self.dispatch(Action::SetBackgroundImage(data_uri))
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn items(&self) -> &[Item] {
        self.state.items()
    }

    pub fn background(&self) -> &CanvasBackground {
        self.state.background()
    }

    pub fn selection(&self) -> Option<ItemId> {
        self.state.selection()
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn canvas_size(&self) -> Size {
        self.config.canvas_size
    }

    pub fn is_persistent(&self) -> bool {
        self.persistence.is_some()
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}
