//! Placed canvas items and the patches that edit them.

use crate::catalog::FontFamily;
use crate::color::HexColor;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle identifying an item within the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out fresh item ids for a session.
///
/// Ids are a plain counter; after restoring items the allocator is
/// re-seeded above the largest id seen so restored and new items never clash.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id.
    pub fn allocate(&mut self) -> ItemId {
        let id = ItemId(self.next);
        self.next += 1;
        id
    }

    /// Make sure future ids are greater than every id in `items`.
    pub fn observe<'a>(&mut self, items: impl IntoIterator<Item = &'a Item>) {
        if let Some(max) = items.into_iter().map(|item| item.id.0).max() {
            self.next = self.next.max(max + 1);
        }
    }
}

/// What an item displays. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Text,
    Emoji,
    Image,
}

impl ItemKind {
    /// Initial size: font size for text and emoji, pixel width for images.
    pub fn default_size(&self) -> f64 {
        match self {
            ItemKind::Text | ItemKind::Emoji => Item::DEFAULT_FONT_SIZE,
            ItemKind::Image => Item::DEFAULT_IMAGE_WIDTH,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ItemKind::Text => "text",
            ItemKind::Emoji => "emoji",
            ItemKind::Image => "image",
        }
    }
}

/// A text, emoji or image placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    /// Literal text, a single emoji glyph, or an image data URI.
    pub content: String,
    /// Top-left anchor in canvas coordinates.
    pub position: Point,
    /// Font size for text and emoji, pixel width for images.
    pub size: f64,
    /// Rotation about the anchor, in degrees.
    pub angle: f64,
    pub color: HexColor,
    /// Whole-item alpha in [0, 1].
    pub opacity: f64,
    pub background_color: HexColor,
    /// Alpha of the background fill only.
    pub background_opacity: f64,
    /// Only meaningful for text items.
    pub font_family: FontFamily,
}

impl Item {
    pub const DEFAULT_FONT_SIZE: f64 = 24.0;
    pub const DEFAULT_IMAGE_WIDTH: f64 = 100.0;
    /// Where new items are placed.
    pub const DEFAULT_POSITION: Point = Point::new(100.0, 100.0);
    /// Sizes never shrink below this.
    pub const MIN_SIZE: f64 = 1.0;

    /// Create an item with the toolbar defaults for its kind.
    pub fn new(id: ItemId, kind: ItemKind, content: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            content: content.into(),
            position: Self::DEFAULT_POSITION,
            size: kind.default_size(),
            angle: 0.0,
            color: HexColor::BLACK,
            opacity: 1.0,
            background_color: HexColor::WHITE,
            background_opacity: 1.0,
            font_family: FontFamily::default(),
        }
    }

    /// Place the item at a different anchor.
    pub fn at(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    pub fn is_text(&self) -> bool {
        self.kind == ItemKind::Text
    }
}

/// A partial update to an item. `None` fields are left untouched.
///
/// There is deliberately no way to change `id` or `kind`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPatch {
    pub content: Option<String>,
    pub position: Option<Point>,
    pub size: Option<f64>,
    pub angle: Option<f64>,
    pub color: Option<HexColor>,
    pub opacity: Option<f64>,
    pub background_color: Option<HexColor>,
    pub background_opacity: Option<f64>,
    pub font_family: Option<FontFamily>,
}

impl ItemPatch {
    pub fn position(position: Point) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn size(size: f64) -> Self {
        Self {
            size: Some(size),
            ..Self::default()
        }
    }

    pub fn angle(angle: f64) -> Self {
        Self {
            angle: Some(angle),
            ..Self::default()
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn color(color: HexColor) -> Self {
        Self {
            color: Some(color),
            ..Self::default()
        }
    }

    pub fn opacity(opacity: f64) -> Self {
        Self {
            opacity: Some(opacity),
            ..Self::default()
        }
    }

    pub fn background(color: HexColor, opacity: Option<f64>) -> Self {
        Self {
            background_color: Some(color),
            background_opacity: opacity,
            ..Self::default()
        }
    }

    pub fn font_family(family: FontFamily) -> Self {
        Self {
            font_family: Some(family),
            ..Self::default()
        }
    }

    /// True if applying this patch would change nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the patch into `item`, clamping opacities into [0, 1]
    /// and sizes to at least [`Item::MIN_SIZE`].
    pub fn apply_to(&self, item: &mut Item) {
        if let Some(content) = &self.content {
            item.content.clone_from(content);
        }
        if let Some(position) = self.position {
            item.position = position;
        }
        if let Some(size) = self.size {
            item.size = size.max(Item::MIN_SIZE);
        }
        if let Some(angle) = self.angle {
            item.angle = angle;
        }
        if let Some(color) = self.color {
            item.color = color;
        }
        if let Some(opacity) = self.opacity {
            item.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(color) = self.background_color {
            item.background_color = color;
        }
        if let Some(opacity) = self.background_opacity {
            item.background_opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(family) = self.font_family {
            item.font_family = family;
        }
    }
}
