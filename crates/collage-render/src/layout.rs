//! Item geometry shared by every renderer.
//!
//! An item's frame sits at its anchor in local coordinates; the transform
//! translates to the anchor and rotates about it.

use collage_core::{Item, ItemId, ItemKind};
use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Padding between an item's frame and its content.
pub const FRAME_PADDING: f64 = 4.0;
/// Corner radius of the frame's background fill.
pub const FRAME_RADIUS: f64 = 4.0;
/// Width of the selection outline.
pub const SELECTION_WIDTH: f64 = 2.0;
/// Text boxes are never narrower than this.
pub const MIN_TEXT_WIDTH: f64 = 100.0;
/// Inner padding of text boxes (horizontal, vertical).
pub const TEXT_INSET: Vec2 = Vec2::new(8.0, 4.0);
/// First-line height of a text box, as a multiple of the font size.
pub const TEXT_LINE_HEIGHT: f64 = 1.5;
/// Height of each further line, as a multiple of the font size.
pub const TEXT_LINE_SPACING: f64 = 1.2;
/// Rough glyph advance used before text is shaped.
const AVERAGE_ADVANCE: f64 = 0.6;

/// Resolved geometry of one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemLayout {
    /// Outer box in item-local coordinates, anchored at the origin.
    pub frame: Rect,
    /// Where the content is drawn, in item-local coordinates.
    pub content: Rect,
    /// Item-local to canvas coordinates.
    pub transform: Affine,
}

impl ItemLayout {
    /// Lay out an item. `image_size` is the intrinsic size of an image
    /// item's picture; without it images are laid out square.
    pub fn of(item: &Item, image_size: Option<Size>) -> Self {
        let content_size = content_size(item, image_size);
        let content = Rect::from_origin_size(Point::new(FRAME_PADDING, FRAME_PADDING), content_size);
        let frame = Rect::new(
            0.0,
            0.0,
            content_size.width + 2.0 * FRAME_PADDING,
            content_size.height + 2.0 * FRAME_PADDING,
        );
        let transform =
            Affine::translate(item.position.to_vec2()) * Affine::rotate(item.angle.to_radians());
        Self {
            frame,
            content,
            transform,
        }
    }

    /// Axis-aligned bounds of the rotated frame in canvas coordinates.
    pub fn bounds(&self) -> Rect {
        self.transform.transform_rect_bbox(self.frame)
    }

    /// Whether a canvas point falls inside the rotated frame.
    pub fn contains(&self, point: Point) -> bool {
        self.frame.contains(self.transform.inverse() * point)
    }

    /// Top-left of the first text line, in item-local coordinates.
    pub fn text_origin(&self) -> Point {
        self.content.origin() + TEXT_INSET
    }
}

fn content_size(item: &Item, image_size: Option<Size>) -> Size {
    match item.kind {
        ItemKind::Text => {
            let lines: Vec<&str> = item.content.split('\n').collect();
            let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
            let text_width = longest as f64 * item.size * AVERAGE_ADVANCE;
            let extra_lines = lines.len().saturating_sub(1) as f64;
            Size::new(
                (text_width + 2.0 * TEXT_INSET.x).max(MIN_TEXT_WIDTH),
                item.size * TEXT_LINE_HEIGHT + extra_lines * item.size * TEXT_LINE_SPACING,
            )
        }
        ItemKind::Emoji => Size::new(item.size, item.size * TEXT_LINE_SPACING),
        ItemKind::Image => {
            let aspect = image_size
                .filter(|s| s.width > 0.0 && s.height > 0.0)
                .map(|s| s.height / s.width)
                .unwrap_or(1.0);
            Size::new(item.size, item.size * aspect)
        }
    }
}

/// Rectangle that covers `canvas` with an image of the given size,
/// centered and preserving aspect ratio.
pub fn cover_rect(image: Size, canvas: Size) -> Rect {
    if image.width <= 0.0 || image.height <= 0.0 {
        return canvas.to_rect();
    }
    let scale = (canvas.width / image.width).max(canvas.height / image.height);
    let size = Size::new(image.width * scale, image.height * scale);
    let origin = Point::new(
        (canvas.width - size.width) / 2.0,
        (canvas.height - size.height) / 2.0,
    );
    Rect::from_origin_size(origin, size)
}

/// Topmost item under `point`.
pub fn hit_test(
    items: &[Item],
    point: Point,
    mut image_size: impl FnMut(&Item) -> Option<Size>,
) -> Option<ItemId> {
    items
        .iter()
        .rev()
        .find(|item| ItemLayout::of(item, image_size(item)).contains(point))
        .map(|item| item.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(kind: ItemKind, content: &str) -> Item {
        Item::new(ItemId(1), kind, content)
    }

    #[test]
    fn test_text_has_minimum_width() {
        let layout = ItemLayout::of(&item(ItemKind::Text, "hi"), None);
        assert_eq!(layout.content.width(), MIN_TEXT_WIDTH);
        assert_eq!(layout.content.height(), 36.0);
        assert_eq!(layout.frame.width(), MIN_TEXT_WIDTH + 8.0);
    }

    #[test]
    fn test_multiline_text_grows() {
        let one = ItemLayout::of(&item(ItemKind::Text, "a"), None);
        let two = ItemLayout::of(&item(ItemKind::Text, "a\nb"), None);
        assert!(two.frame.height() > one.frame.height());
    }

    #[test]
    fn test_image_keeps_aspect() {
        let layout = ItemLayout::of(&item(ItemKind::Image, ""), Some(Size::new(200.0, 50.0)));
        assert_eq!(layout.content.size(), Size::new(100.0, 25.0));

        let unknown = ItemLayout::of(&item(ItemKind::Image, ""), None);
        assert_eq!(unknown.content.size(), Size::new(100.0, 100.0));
    }

    #[test]
    fn test_transform_anchors_at_position() {
        let layout = ItemLayout::of(&item(ItemKind::Emoji, "😊"), None);
        assert_eq!(layout.transform * Point::ZERO, Point::new(100.0, 100.0));
        assert!(layout.contains(Point::new(101.0, 101.0)));
        assert!(!layout.contains(Point::new(99.0, 99.0)));
    }

    #[test]
    fn test_rotation_is_about_anchor() {
        let mut rotated = item(ItemKind::Image, "");
        rotated.angle = 90.0;
        let layout = ItemLayout::of(&rotated, None);
        assert!((layout.transform * Point::ZERO - Point::new(100.0, 100.0)).hypot() < 1e-9);
        // A 90° turn swings the frame to the left of the anchor.
        assert!(layout.contains(Point::new(50.0, 150.0)));
        assert!(!layout.contains(Point::new(150.0, 150.0)));
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let below = Item::new(ItemId(1), ItemKind::Text, "below");
        let above = Item::new(ItemId(2), ItemKind::Text, "above");
        let items = vec![below, above];
        assert_eq!(hit_test(&items, Point::new(120.0, 110.0), |_| None), Some(ItemId(2)));
        assert_eq!(hit_test(&items, Point::new(10.0, 10.0), |_| None), None);
    }

    #[test]
    fn test_cover_rect() {
        let canvas = Size::new(800.0, 600.0);
        let rect = cover_rect(Size::new(400.0, 400.0), canvas);
        assert_eq!(rect.size(), Size::new(800.0, 800.0));
        assert_eq!(rect.origin(), Point::new(0.0, -100.0));
    }
}
