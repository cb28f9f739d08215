//! Drag interaction: turns pointer motion into item position updates.
//!
//! The controller owns the in-flight drag (captured item, pointer start,
//! item start). The editor state only ever sees the resulting actions.

use crate::input::{PointerEvent, PointerId};
use crate::item::{ItemId, ItemPatch};
use crate::state::{Action, EditorState};
use kurbo::{Point, Vec2};

/// How a drag shows up in undo history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragHistory {
    /// One undo step per drag, from pointer-down to pointer-up.
    #[default]
    Collapsed,
    /// One undo step per pointer move.
    PerMove,
}

/// Snapshot taken at pointer-down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub item: ItemId,
    pub pointer: PointerId,
    pub pointer_start: Point,
    pub item_start: Point,
    /// Whether a position update has been emitted yet.
    moved: bool,
}

impl DragSession {
    /// Drag offset from the start position.
    pub fn delta(&self, pointer: Point) -> Vec2 {
        pointer - self.pointer_start
    }

    /// Where the item lands for the given pointer position.
    pub fn target_position(&self, pointer: Point) -> Point {
        self.item_start + self.delta(pointer)
    }
}

/// Tracks at most one active drag.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    session: Option<DragSession>,
    mode: DragHistory,
}

impl DragController {
    pub fn new(mode: DragHistory) -> Self {
        Self {
            session: None,
            mode,
        }
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Start dragging `item`. Returns false if the item does not exist or
    /// another pointer already owns a drag.
    pub fn begin(
        &mut self,
        state: &EditorState,
        item: ItemId,
        pointer: PointerId,
        position: Point,
    ) -> bool {
        if let Some(active) = &self.session {
            if active.pointer != pointer {
                log::debug!("Ignoring drag start from pointer {:?} while {:?} drags", pointer, active.pointer);
                return false;
            }
        }
        let Some(found) = state.get(item) else {
            return false;
        };
        self.session = Some(DragSession {
            item,
            pointer,
            pointer_start: position,
            item_start: found.position,
            moved: false,
        });
        true
    }

    /// Pointer moved. Returns the update to dispatch, if this pointer owns a drag.
    pub fn update(&mut self, pointer: PointerId, position: Point) -> Option<Action> {
        let mode = self.mode;
        let session = self.session.as_mut().filter(|s| s.pointer == pointer)?;
        let target = session.target_position(position);
        let patch = ItemPatch::position(target);
        let first = !session.moved;
        session.moved = true;

        if first || mode == DragHistory::PerMove {
            Some(Action::Update {
                id: session.item,
                patch,
            })
        } else {
            Some(Action::Amend {
                id: session.item,
                patch,
            })
        }
    }

    /// Pointer released. Ends the drag owned by this pointer wherever it is.
    pub fn end(&mut self, pointer: PointerId) -> Option<DragSession> {
        if self.session.as_ref()?.pointer != pointer {
            return None;
        }
        self.session.take()
    }

    /// Make the next move of the active drag record a new undo step instead
    /// of amending the most recent one.
    pub fn break_collapse(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.moved = false;
        }
    }

    /// Abandon any drag in progress.
    pub fn cancel(&mut self) {
        self.session = None;
    }

    /// Feed a pointer event. Returns the action to dispatch, if any.
    ///
    /// Pointer-down on an item only captures the drag; selection is the
    /// caller's concern.
    pub fn handle(&mut self, state: &EditorState, event: PointerEvent) -> Option<Action> {
        match event {
            PointerEvent::Down {
                pointer,
                position,
                target: Some(item),
            } => {
                self.begin(state, item, pointer, position);
                None
            }
            PointerEvent::Down { target: None, .. } => None,
            PointerEvent::Move { pointer, position } => self.update(pointer, position),
            PointerEvent::Up { pointer, .. } => {
                self.end(pointer);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Item, ItemKind};

    fn state_with_item() -> EditorState {
        EditorState::new().apply(Action::Add(
            Item::new(ItemId(1), ItemKind::Text, "X").at(Point::new(100.0, 100.0)),
        ))
    }

    fn drive(state: &mut EditorState, drag: &mut DragController, event: PointerEvent) {
        if let Some(action) = drag.handle(state, event) {
            state.dispatch(action);
        }
    }

    #[test]
    fn test_drag_moves_by_pointer_delta() {
        let mut state = state_with_item();
        let mut drag = DragController::default();

        drive(&mut state, &mut drag, PointerEvent::mouse_down(Point::new(50.0, 50.0), Some(ItemId(1))));
        drive(&mut state, &mut drag, PointerEvent::mouse_move(Point::new(70.0, 80.0)));

        assert_eq!(state.get(ItemId(1)).unwrap().position, Point::new(120.0, 130.0));
    }

    #[test]
    fn test_collapsed_drag_is_one_undo_step() {
        let mut state = state_with_item();
        let mut drag = DragController::new(DragHistory::Collapsed);

        drive(&mut state, &mut drag, PointerEvent::mouse_down(Point::new(0.0, 0.0), Some(ItemId(1))));
        for step in 1..=10 {
            let p = Point::new(step as f64 * 5.0, step as f64 * 2.0);
            drive(&mut state, &mut drag, PointerEvent::mouse_move(p));
        }
        drive(&mut state, &mut drag, PointerEvent::mouse_up(Point::new(50.0, 20.0)));

        assert_eq!(state.get(ItemId(1)).unwrap().position, Point::new(150.0, 120.0));
        assert_eq!(state.history().past().len(), 2);

        state.dispatch(Action::Undo);
        assert_eq!(state.get(ItemId(1)).unwrap().position, Point::new(100.0, 100.0));
    }

    #[test]
    fn test_per_move_drag_records_each_move() {
        let mut state = state_with_item();
        let mut drag = DragController::new(DragHistory::PerMove);

        drive(&mut state, &mut drag, PointerEvent::mouse_down(Point::ZERO, Some(ItemId(1))));
        for step in 1..=3 {
            drive(&mut state, &mut drag, PointerEvent::mouse_move(Point::new(step as f64, 0.0)));
        }
        assert_eq!(state.history().past().len(), 4);

        state.dispatch(Action::Undo);
        assert_eq!(state.get(ItemId(1)).unwrap().position, Point::new(102.0, 100.0));
    }

    #[test]
    fn test_click_without_move_records_nothing() {
        let mut state = state_with_item();
        let mut drag = DragController::default();
        drive(&mut state, &mut drag, PointerEvent::mouse_down(Point::ZERO, Some(ItemId(1))));
        drive(&mut state, &mut drag, PointerEvent::mouse_up(Point::ZERO));
        assert_eq!(state.history().past().len(), 1);
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_release_ends_drag_anywhere() {
        let mut state = state_with_item();
        let mut drag = DragController::default();
        drive(&mut state, &mut drag, PointerEvent::mouse_down(Point::ZERO, Some(ItemId(1))));
        drive(&mut state, &mut drag, PointerEvent::mouse_up(Point::new(-500.0, 9000.0)));
        assert!(!drag.is_dragging());

        drive(&mut state, &mut drag, PointerEvent::mouse_move(Point::new(30.0, 30.0)));
        assert_eq!(state.get(ItemId(1)).unwrap().position, Point::new(100.0, 100.0));
    }

    #[test]
    fn test_move_without_drag_does_nothing() {
        let state = state_with_item();
        let mut drag = DragController::default();
        assert!(drag.handle(&state, PointerEvent::mouse_move(Point::new(5.0, 5.0))).is_none());
    }

    #[test]
    fn test_down_on_unknown_item_does_not_start_drag() {
        let state = state_with_item();
        let mut drag = DragController::default();
        drag.handle(&state, PointerEvent::mouse_down(Point::ZERO, Some(ItemId(99))));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_second_pointer_is_ignored_while_dragging() {
        let mut state = state_with_item()
            .apply(Action::Add(Item::new(ItemId(2), ItemKind::Emoji, "😊").at(Point::new(300.0, 300.0))));
        let mut drag = DragController::default();
        let finger_a = PointerId(10);
        let finger_b = PointerId(11);

        drive(&mut state, &mut drag, PointerEvent::Down {
            pointer: finger_a,
            position: Point::ZERO,
            target: Some(ItemId(1)),
        });
        drive(&mut state, &mut drag, PointerEvent::Down {
            pointer: finger_b,
            position: Point::new(300.0, 300.0),
            target: Some(ItemId(2)),
        });
        assert_eq!(drag.session().unwrap().item, ItemId(1));

        // Moves and releases from the other finger do not affect the drag.
        drive(&mut state, &mut drag, PointerEvent::Move {
            pointer: finger_b,
            position: Point::new(400.0, 400.0),
        });
        drive(&mut state, &mut drag, PointerEvent::Up {
            pointer: finger_b,
            position: Point::new(400.0, 400.0),
        });
        assert!(drag.is_dragging());
        assert_eq!(state.get(ItemId(2)).unwrap().position, Point::new(300.0, 300.0));

        drive(&mut state, &mut drag, PointerEvent::Move {
            pointer: finger_a,
            position: Point::new(10.0, 0.0),
        });
        assert_eq!(state.get(ItemId(1)).unwrap().position, Point::new(110.0, 100.0));
    }

    #[test]
    fn test_same_pointer_down_restarts_capture() {
        let mut state = state_with_item()
            .apply(Action::Add(Item::new(ItemId(2), ItemKind::Emoji, "😊").at(Point::new(300.0, 300.0))));
        let mut drag = DragController::default();

        drive(&mut state, &mut drag, PointerEvent::mouse_down(Point::ZERO, Some(ItemId(1))));
        drive(&mut state, &mut drag, PointerEvent::mouse_down(Point::new(5.0, 5.0), Some(ItemId(2))));
        drive(&mut state, &mut drag, PointerEvent::mouse_move(Point::new(15.0, 5.0)));

        assert_eq!(state.get(ItemId(1)).unwrap().position, Point::new(100.0, 100.0));
        assert_eq!(state.get(ItemId(2)).unwrap().position, Point::new(310.0, 300.0));
    }
}
