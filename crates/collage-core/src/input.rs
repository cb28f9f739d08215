//! Pointer events for mouse/touch/pen input.

use crate::item::ItemId;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Identifies one physical pointer (the mouse, or a single touch contact).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointerId(pub i32);

impl PointerId {
    /// The primary mouse pointer.
    pub const MOUSE: PointerId = PointerId(1);
}

/// Pointer event type for unified mouse/touch handling.
///
/// Positions are in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        pointer: PointerId,
        position: Point,
        /// The item under the pointer, if any.
        target: Option<ItemId>,
    },
    Move {
        pointer: PointerId,
        position: Point,
    },
    Up {
        pointer: PointerId,
        position: Point,
    },
}

impl PointerEvent {
    /// Mouse press over an item.
    pub fn mouse_down(position: Point, target: Option<ItemId>) -> Self {
        PointerEvent::Down {
            pointer: PointerId::MOUSE,
            position,
            target,
        }
    }

    pub fn mouse_move(position: Point) -> Self {
        PointerEvent::Move {
            pointer: PointerId::MOUSE,
            position,
        }
    }

    pub fn mouse_up(position: Point) -> Self {
        PointerEvent::Up {
            pointer: PointerId::MOUSE,
            position,
        }
    }

    pub fn pointer(&self) -> PointerId {
        match *self {
            PointerEvent::Down { pointer, .. }
            | PointerEvent::Move { pointer, .. }
            | PointerEvent::Up { pointer, .. } => pointer,
        }
    }

    pub fn position(&self) -> Point {
        match *self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Move { position, .. }
            | PointerEvent::Up { position, .. } => position,
        }
    }
}
