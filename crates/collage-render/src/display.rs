//! Retained rendering: keyed display nodes reconciled frame to frame.
//!
//! Hosts that keep one element per item (DOM nodes, scene graph entries)
//! apply the [`NodeChange`]s instead of repainting everything.

use crate::layout::ItemLayout;
use crate::renderer::{RenderContext, RenderResult, Renderer};
use collage_core::{FontFamily, ImageFormat, Item, ItemId, ItemKind, DataUri};
use kurbo::{Affine, Rect, Size};
use peniko::Color;
use std::collections::{HashMap, HashSet};

/// RGBA8 color as carried by display nodes, comparable across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl NodeColor {
    /// CSS `rgba(...)` notation.
    pub fn to_css(&self) -> String {
        format!("rgba({},{},{},{})", self.r, self.g, self.b, self.a as f64 / 255.0)
    }
}

impl From<Color> for NodeColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<NodeColor> for Color {
    fn from(color: NodeColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// What a node shows inside its frame.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    Text {
        text: String,
        font_size: f64,
        font: FontFamily,
        color: NodeColor,
    },
    Emoji {
        glyph: String,
        font_size: f64,
        color: NodeColor,
    },
    Image {
        /// Data URI as stored on the item.
        src: String,
    },
}

/// One item, resolved for display.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayNode {
    pub id: ItemId,
    pub transform: Affine,
    pub frame: Rect,
    pub content_rect: Rect,
    pub opacity: f64,
    pub fill: NodeColor,
    pub content: NodeContent,
    /// Selection outline color, if selected.
    pub outline: Option<NodeColor>,
}

impl DisplayNode {
    fn build(item: &Item, image_size: Option<Size>, ctx: &RenderContext) -> Self {
        let layout = ItemLayout::of(item, image_size);
        let content = match item.kind {
            ItemKind::Text => NodeContent::Text {
                text: item.content.clone(),
                font_size: item.size,
                font: item.font_family,
                color: item.color.with_alpha(1.0).into(),
            },
            ItemKind::Emoji => NodeContent::Emoji {
                glyph: item.content.clone(),
                font_size: item.size,
                color: item.color.with_alpha(1.0).into(),
            },
            ItemKind::Image => NodeContent::Image {
                src: item.content.clone(),
            },
        };
        Self {
            id: item.id,
            transform: layout.transform,
            frame: layout.frame,
            content_rect: layout.content,
            opacity: item.opacity,
            fill: item.background_color.with_alpha(item.background_opacity).into(),
            content,
            outline: ctx.is_selected(item.id).then(|| ctx.selection_color.into()),
        }
    }
}

/// Canvas-wide background, resolved for display.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundNode {
    pub size: Size,
    pub color: NodeColor,
    pub image: Option<String>,
}

/// A single edit to apply to the host's node tree.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeChange {
    /// The background changed.
    Background(BackgroundNode),
    /// Insert a new node at `index` in paint order.
    Insert { index: usize, node: DisplayNode },
    /// Replace an existing node's properties.
    Update(DisplayNode),
    Remove(ItemId),
    /// Surviving nodes changed relative order; this is the full new order.
    Reorder(Vec<ItemId>),
}

/// Keeps the last frame's nodes and emits the difference to the next.
#[derive(Default)]
pub struct RetainedRenderer {
    background: Option<BackgroundNode>,
    nodes: Vec<DisplayNode>,
    image_sizes: HashMap<String, Option<Size>>,
}

impl RetainedRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes of the last rendered frame, in paint order.
    pub fn nodes(&self) -> &[DisplayNode] {
        &self.nodes
    }

    pub fn background(&self) -> Option<&BackgroundNode> {
        self.background.as_ref()
    }

    /// Number of image sizes held.
    pub fn cached_images(&self) -> usize {
        self.image_sizes.len()
    }

    /// Forget the previous frame so the next render emits everything.
    pub fn reset(&mut self) {
        self.background = None;
        self.nodes.clear();
    }

    fn image_size(&mut self, item: &Item) -> Option<Size> {
        if item.kind != ItemKind::Image {
            return None;
        }
        *self
            .image_sizes
            .entry(item.content.clone())
            .or_insert_with(|| image_dimensions(&item.content))
    }
}

/// Intrinsic size of a data URI image, read from its header.
pub fn image_dimensions(src: &str) -> Option<Size> {
    let uri = DataUri::parse(src).ok()?;
    let format = match uri.format()? {
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::WebP => image::ImageFormat::WebP,
        ImageFormat::Gif => image::ImageFormat::Gif,
    };
    let reader = image::ImageReader::with_format(std::io::Cursor::new(uri.data), format);
    match reader.into_dimensions() {
        Ok((w, h)) => Some(Size::new(w as f64, h as f64)),
        Err(e) => {
            log::debug!("Could not read image dimensions: {}", e);
            None
        }
    }
}

impl Renderer for RetainedRenderer {
    type Output = Vec<NodeChange>;

    fn render(&mut self, ctx: &RenderContext) -> RenderResult<Vec<NodeChange>> {
        let mut changes = Vec::new();

        let background = BackgroundNode {
            size: ctx.canvas_size,
            color: ctx.background.color.with_alpha(1.0).into(),
            image: ctx.background.image.clone(),
        };
        if self.background.as_ref() != Some(&background) {
            changes.push(NodeChange::Background(background.clone()));
            self.background = Some(background);
        }

        let mut next = Vec::with_capacity(ctx.items.len());
        for item in ctx.items {
            let size = self.image_size(item);
            next.push(DisplayNode::build(item, size, ctx));
        }

        let next_ids: HashSet<ItemId> = next.iter().map(|n| n.id).collect();
        let previous: HashMap<ItemId, &DisplayNode> = self.nodes.iter().map(|n| (n.id, n)).collect();

        for node in &self.nodes {
            if !next_ids.contains(&node.id) {
                changes.push(NodeChange::Remove(node.id));
            }
        }

        let survivors_before: Vec<ItemId> = self
            .nodes
            .iter()
            .map(|n| n.id)
            .filter(|id| next_ids.contains(id))
            .collect();
        let survivors_after: Vec<ItemId> = next
            .iter()
            .map(|n| n.id)
            .filter(|id| previous.contains_key(id))
            .collect();

        for (index, node) in next.iter().enumerate() {
            match previous.get(&node.id) {
                None => changes.push(NodeChange::Insert {
                    index,
                    node: node.clone(),
                }),
                Some(old) if *old != node => changes.push(NodeChange::Update(node.clone())),
                Some(_) => {}
            }
        }

        if survivors_before != survivors_after {
            changes.push(NodeChange::Reorder(next.iter().map(|n| n.id).collect()));
        }

        self.nodes = next;
        let live = ctx.image_sources();
        self.image_sizes.retain(|src, _| live.contains(src.as_str()));
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collage_core::{Action, EditorState, HexColor, ItemPatch};
    use kurbo::{Point, Size};

    const CANVAS: Size = Size::new(800.0, 600.0);

    fn text(id: u64, content: &str) -> Item {
        Item::new(ItemId(id), ItemKind::Text, content)
    }

    fn render(renderer: &mut RetainedRenderer, state: &EditorState) -> Vec<NodeChange> {
        renderer.render(&RenderContext::new(state, CANVAS)).unwrap()
    }

    #[test]
    fn test_first_frame_inserts_everything() {
        let state = EditorState::new()
            .apply(Action::Add(text(1, "a")))
            .apply(Action::Add(text(2, "b")));
        let mut renderer = RetainedRenderer::new();
        let changes = render(&mut renderer, &state);

        assert!(matches!(changes[0], NodeChange::Background(_)));
        assert!(matches!(changes[1], NodeChange::Insert { index: 0, .. }));
        assert!(matches!(changes[2], NodeChange::Insert { index: 1, .. }));
        assert_eq!(changes.len(), 3);
    }

    #[test]
    fn test_unchanged_frame_emits_nothing() {
        let state = EditorState::new().apply(Action::Add(text(1, "a")));
        let mut renderer = RetainedRenderer::new();
        render(&mut renderer, &state);
        assert!(render(&mut renderer, &state).is_empty());
    }

    #[test]
    fn test_update_and_remove() {
        let mut state = EditorState::new()
            .apply(Action::Add(text(1, "a")))
            .apply(Action::Add(text(2, "b")));
        let mut renderer = RetainedRenderer::new();
        render(&mut renderer, &state);

        state.dispatch(Action::Update {
            id: ItemId(2),
            patch: ItemPatch::position(Point::new(5.0, 5.0)),
        });
        state.dispatch(Action::Remove(ItemId(1)));
        let changes = render(&mut renderer, &state);

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0], NodeChange::Remove(ItemId(1)));
        match &changes[1] {
            NodeChange::Update(node) => {
                assert_eq!(node.id, ItemId(2));
                assert_eq!(node.transform * Point::ZERO, Point::new(5.0, 5.0));
            }
            other => panic!("expected update, got {:?}", other),
        }
    }

    #[test]
    fn test_undo_reinserts_at_original_index() {
        let mut state = EditorState::new()
            .apply(Action::Add(text(1, "a")))
            .apply(Action::Add(text(2, "b")))
            .apply(Action::Add(text(3, "c")))
            .apply(Action::Remove(ItemId(2)));
        let mut renderer = RetainedRenderer::new();
        render(&mut renderer, &state);

        state.dispatch(Action::Undo);
        let changes = render(&mut renderer, &state);
        assert_eq!(changes.len(), 1);
        assert!(matches!(&changes[0], NodeChange::Insert { index: 1, node } if node.id == ItemId(2)));
    }

    #[test]
    fn test_reorder_detected() {
        let mut state = EditorState::new().apply(Action::SetAll(vec![text(1, "a"), text(2, "b")]));
        let mut renderer = RetainedRenderer::new();
        render(&mut renderer, &state);

        state.dispatch(Action::SetAll(vec![text(2, "b"), text(1, "a")]));
        let changes = render(&mut renderer, &state);
        assert_eq!(changes, vec![NodeChange::Reorder(vec![ItemId(2), ItemId(1)])]);
    }

    #[test]
    fn test_selection_and_background_changes() {
        let mut state = EditorState::new().apply(Action::Add(text(1, "a")));
        let mut renderer = RetainedRenderer::new();
        render(&mut renderer, &state);

        state.dispatch(Action::Select(Some(ItemId(1))));
        state.dispatch(Action::SetBackgroundColor(HexColor::new(0, 0, 0)));
        let changes = render(&mut renderer, &state);
        assert_eq!(changes.len(), 2);
        assert!(matches!(&changes[0], NodeChange::Background(bg) if bg.image.is_none()));
        assert!(matches!(&changes[1], NodeChange::Update(node) if node.outline.is_some()));
    }

    #[test]
    fn test_undecodable_image_still_gets_a_node() {
        let state = EditorState::new().apply(Action::Add(Item::new(
            ItemId(1),
            ItemKind::Image,
            "data:image/png;base64,AAAA",
        )));
        let mut renderer = RetainedRenderer::new();
        render(&mut renderer, &state);
        assert_eq!(renderer.nodes().len(), 1);
        assert_eq!(renderer.nodes()[0].content_rect.size(), Size::new(100.0, 100.0));
    }

    #[test]
    fn test_image_cache_follows_items() {
        let image = |id, src: &str| Item::new(ItemId(id), ItemKind::Image, src);
        let mut state = EditorState::new()
            .apply(Action::Add(image(1, "data:image/png;base64,AAAA")))
            .apply(Action::Add(image(2, "data:image/png;base64,BBBB")))
            .apply(Action::SetBackgroundImage(Some("data:image/png;base64,CCCC".into())));
        let mut renderer = RetainedRenderer::new();
        render(&mut renderer, &state);
        assert_eq!(renderer.cached_images(), 2);

        state.dispatch(Action::Remove(ItemId(1)));
        render(&mut renderer, &state);
        assert_eq!(renderer.cached_images(), 1);

        state.dispatch(Action::Undo);
        render(&mut renderer, &state);
        assert_eq!(renderer.cached_images(), 2);
    }
}
