//! Collage Core Library
//!
//! Platform-agnostic item store, undo history, drag handling and persistence
//! for the Collage canvas editor.

pub mod catalog;
pub mod color;
pub mod drag;
pub mod editor;
pub mod history;
pub mod image;
pub mod input;
pub mod item;
pub mod state;
pub mod storage;

pub use catalog::{EMOJI_CATEGORIES, EmojiCategory, FontFamily};
pub use color::{ColorError, HexColor};
pub use drag::{DragController, DragHistory, DragSession};
pub use editor::{Editor, EditorConfig};
pub use history::{History, HistoryLimit};
pub use image::{DataUri, DataUriError, ImageFormat};
pub use input::{PointerEvent, PointerId};
pub use item::{IdAllocator, Item, ItemId, ItemKind, ItemPatch};
pub use state::{Action, CanvasBackground, Change, EditorState};
pub use storage::{MemoryStorage, Persistence, SlotStorage, StorageError, StorageResult};
