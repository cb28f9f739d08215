//! Renderer trait abstraction.

use collage_core::{CanvasBackground, Editor, EditorState, Item, ItemId, ItemKind};
use kurbo::Size;
use peniko::Color;
use std::collections::HashSet;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Initialization failed: {0}")]
    InitFailed(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("Image decode failed: {0}")]
    ImageDecode(String),
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Default selection outline color.
pub const SELECTION_COLOR: Color = Color::from_rgba8(0, 122, 255, 255);

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// Items in paint order.
    pub items: &'a [Item],
    pub background: &'a CanvasBackground,
    pub selection: Option<ItemId>,
    /// Logical canvas size.
    pub canvas_size: Size,
    /// Device pixel ratio, or the export scale.
    pub scale_factor: f64,
    pub selection_color: Color,
    /// Whether to outline the selected item.
    pub show_selection: bool,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(state: &'a EditorState, canvas_size: Size) -> Self {
        Self {
            items: state.items(),
            background: state.background(),
            selection: state.selection(),
            canvas_size,
            scale_factor: 1.0,
            selection_color: SELECTION_COLOR,
            show_selection: true,
        }
    }

    /// Create a context for an editor's current state.
    pub fn for_editor(editor: &'a Editor) -> Self {
        Self::new(editor.state(), editor.canvas_size())
    }

    /// Set the scale factor for HiDPI or export.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_selection_color(mut self, color: Color) -> Self {
        self.selection_color = color;
        self
    }

    /// Toggle the selection outline.
    pub fn with_selection(mut self, show: bool) -> Self {
        self.show_selection = show;
        self
    }

    /// Output size in physical pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        let w = (self.canvas_size.width * self.scale_factor).round().max(1.0);
        let h = (self.canvas_size.height * self.scale_factor).round().max(1.0);
        (w as u32, h as u32)
    }

    pub fn is_selected(&self, id: ItemId) -> bool {
        self.show_selection && self.selection == Some(id)
    }

    /// Data URIs of every image this frame shows. Image caches keep only these.
    pub fn image_sources(&self) -> HashSet<&'a str> {
        self.items
            .iter()
            .filter(|item| item.kind == ItemKind::Image)
            .map(|item| item.content.as_str())
            .chain(self.background.image.as_deref())
            .collect()
    }
}

/// Trait for rendering backends.
///
/// Retained renderers produce a description of what changed, immediate
/// renderers paint the whole frame each call.
pub trait Renderer {
    type Output;

    /// Render one frame.
    fn render(&mut self, ctx: &RenderContext) -> RenderResult<Self::Output>;
}
