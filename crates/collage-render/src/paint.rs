//! Immediate-mode rendering through a [`Painter`].
//!
//! Every frame repaints the background and all items back to front, the
//! way a canvas draw loop does.

use crate::layout::{FRAME_RADIUS, ItemLayout, SELECTION_WIDTH, TEXT_LINE_SPACING, cover_rect};
use crate::renderer::{RenderContext, RenderResult, Renderer};
use collage_core::{FontFamily, Item, ItemKind};
use kurbo::{Affine, Point, Rect, Size};
use peniko::Color;
use std::collections::HashSet;

/// Drawing surface used by [`ImmediateRenderer`].
///
/// Coordinates are logical canvas units; the painter applies the frame's
/// scale itself. `set_transform` and `set_alpha` stay in effect until
/// changed again.
pub trait Painter {
    /// Prepare a surface of `canvas` logical size at `scale` device pixels per unit.
    fn begin_frame(&mut self, canvas: Size, scale: f64) -> RenderResult<()>;

    fn set_transform(&mut self, transform: Affine);

    /// Alpha multiplied into everything drawn until changed.
    fn set_alpha(&mut self, alpha: f64);

    fn fill_rect(&mut self, rect: Rect, radius: f64, color: Color);

    fn stroke_rect(&mut self, rect: Rect, radius: f64, color: Color, width: f64);

    /// Draw a single line of text with its top-left at `origin`.
    fn draw_text(&mut self, text: &str, origin: Point, font_size: f64, font: FontFamily, color: Color);

    /// Draw a data URI image stretched into `rect`.
    fn draw_image(&mut self, src: &str, rect: Rect) -> RenderResult<()>;

    /// Intrinsic size of a data URI image, if it can be decoded.
    fn image_size(&mut self, src: &str) -> Option<Size>;

    fn end_frame(&mut self) -> RenderResult<()>;

    /// Forget cached images other than `live`. Called after every frame.
    fn retain_images(&mut self, _live: &HashSet<&str>) {}
}

/// Repaints the whole canvas every frame.
pub struct ImmediateRenderer<P> {
    painter: P,
}

impl<P: Painter> ImmediateRenderer<P> {
    pub fn new(painter: P) -> Self {
        Self { painter }
    }

    pub fn painter(&self) -> &P {
        &self.painter
    }

    pub fn painter_mut(&mut self) -> &mut P {
        &mut self.painter
    }

    fn paint_background(&mut self, ctx: &RenderContext) {
        let canvas = ctx.canvas_size;
        self.painter.set_transform(Affine::IDENTITY);
        self.painter.set_alpha(1.0);
        self.painter
            .fill_rect(canvas.to_rect(), 0.0, ctx.background.color.with_alpha(1.0));

        if let Some(src) = &ctx.background.image {
            let Some(size) = self.painter.image_size(src) else {
                log::warn!("Skipping undecodable background image");
                return;
            };
            if let Err(e) = self.painter.draw_image(src, cover_rect(size, canvas)) {
                log::warn!("Skipping background image: {}", e);
            }
        }
    }

    fn paint_item(&mut self, item: &Item, selected: bool, selection_color: Color) {
        let image_size = match item.kind {
            ItemKind::Image => self.painter.image_size(&item.content),
            _ => None,
        };
        let layout = ItemLayout::of(item, image_size);

        self.painter.set_transform(layout.transform);
        self.painter.set_alpha(item.opacity);
        self.painter.fill_rect(
            layout.frame,
            FRAME_RADIUS,
            item.background_color.with_alpha(item.background_opacity),
        );

        match item.kind {
            ItemKind::Text => {
                let color = item.color.with_alpha(1.0);
                let mut origin = layout.text_origin();
                for line in item.content.split('\n') {
                    self.painter
                        .draw_text(line, origin, item.size, item.font_family, color);
                    origin.y += item.size * TEXT_LINE_SPACING;
                }
            }
            ItemKind::Emoji => {
                self.painter.draw_text(
                    &item.content,
                    layout.content.origin(),
                    item.size,
                    FontFamily::default(),
                    item.color.with_alpha(1.0),
                );
            }
            ItemKind::Image => {
                if image_size.is_none() {
                    log::debug!("Skipping undecodable image item {}", item.id);
                } else if let Err(e) = self.painter.draw_image(&item.content, layout.content) {
                    log::warn!("Skipping image item {}: {}", item.id, e);
                }
            }
        }

        if selected {
            self.painter.set_alpha(1.0);
            self.painter
                .stroke_rect(layout.frame, FRAME_RADIUS, selection_color, SELECTION_WIDTH);
        }
    }
}

impl<P: Painter> Renderer for ImmediateRenderer<P> {
    type Output = ();

    fn render(&mut self, ctx: &RenderContext) -> RenderResult<()> {
        self.painter.begin_frame(ctx.canvas_size, ctx.scale_factor)?;
        self.paint_background(ctx);
        for item in ctx.items {
            self.paint_item(item, ctx.is_selected(item.id), ctx.selection_color);
        }
        self.painter.set_transform(Affine::IDENTITY);
        self.painter.set_alpha(1.0);
        self.painter.end_frame()?;
        self.painter.retain_images(&ctx.image_sources());
        Ok(())
    }
}
