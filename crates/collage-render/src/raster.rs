//! CPU painter backed by a tiny-skia pixmap.

use crate::paint::Painter;
use crate::renderer::{RenderResult, RendererError};
use collage_core::{DataUri, FontFamily};
use kurbo::{Affine, PathEl, Point, Rect, RoundedRect, Shape, Size};
use peniko::Color;
use std::collections::{HashMap, HashSet};
use tiny_skia::{
    FillRule, FilterQuality, IntSize, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform,
};

/// Raw RGBA pixels of a finished frame.
#[derive(Debug)]
pub struct RgbaFrame {
    /// RGBA pixel data (4 bytes per pixel, not premultiplied).
    pub rgba_data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Paints into an in-memory pixmap.
pub struct RasterPainter {
    pixmap: Option<Pixmap>,
    scale: f64,
    transform: Affine,
    alpha: f64,
    /// Decoded images keyed by data URI. `None` marks undecodable input.
    images: HashMap<String, Option<Pixmap>>,
    #[cfg(feature = "raster-text")]
    text: TextRasterizer,
}

impl Default for RasterPainter {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterPainter {
    pub fn new() -> Self {
        Self {
            pixmap: None,
            scale: 1.0,
            transform: Affine::IDENTITY,
            alpha: 1.0,
            images: HashMap::new(),
            #[cfg(feature = "raster-text")]
            text: TextRasterizer::new(),
        }
    }

    /// Number of decoded (or known-bad) images held.
    pub fn cached_images(&self) -> usize {
        self.images.len()
    }

    /// The current frame, if one has begun.
    pub fn pixmap(&self) -> Option<&Pixmap> {
        self.pixmap.as_ref()
    }

    /// Take the finished frame as straight RGBA.
    pub fn take_frame(&mut self) -> RenderResult<RgbaFrame> {
        let pixmap = self
            .pixmap
            .take()
            .ok_or_else(|| RendererError::RenderFailed("No frame has been painted".to_string()))?;
        let mut rgba_data = Vec::with_capacity(pixmap.data().len());
        for pixel in pixmap.pixels() {
            let c = pixel.demultiply();
            rgba_data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Ok(RgbaFrame {
            rgba_data,
            width: pixmap.width(),
            height: pixmap.height(),
        })
    }

    fn device_transform(&self) -> Transform {
        to_skia(Affine::scale(self.scale) * self.transform)
    }

    fn paint(&self, color: Color) -> Paint<'static> {
        let rgba = color.to_rgba8();
        let a = (rgba.a as f64 * self.alpha).round().clamp(0.0, 255.0) as u8;
        let mut paint = Paint::default();
        paint.set_color_rgba8(rgba.r, rgba.g, rgba.b, a);
        paint.anti_alias = true;
        paint
    }

    fn decoded(&mut self, src: &str) -> Option<&Pixmap> {
        self.images
            .entry(src.to_string())
            .or_insert_with(|| match decode_image(src) {
                Ok(pixmap) => Some(pixmap),
                Err(e) => {
                    log::debug!("{}", e);
                    None
                }
            })
            .as_ref()
    }
}

fn to_skia(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

fn rounded_rect_path(rect: Rect, radius: f64) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    for el in RoundedRect::from_rect(rect, radius).path_elements(0.1) {
        match el {
            PathEl::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => {
                builder.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32)
            }
            PathEl::CurveTo(p1, p2, p3) => builder.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => builder.close(),
        }
    }
    builder.finish()
}

/// Decode a data URI into a premultiplied pixmap.
pub fn decode_image(src: &str) -> RenderResult<Pixmap> {
    let uri = DataUri::parse(src).map_err(|e| RendererError::ImageDecode(e.to_string()))?;
    let decoded = image::load_from_memory(&uri.data)
        .map_err(|e| RendererError::ImageDecode(e.to_string()))?
        .to_rgba8();
    let (width, height) = decoded.dimensions();
    let size = IntSize::from_wh(width, height)
        .ok_or_else(|| RendererError::ImageDecode("Image has no pixels".to_string()))?;

    let mut data = decoded.into_raw();
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u16;
        for channel in &mut px[..3] {
            *channel = ((*channel as u16 * a + 127) / 255) as u8;
        }
    }
    Pixmap::from_vec(data, size)
        .ok_or_else(|| RendererError::ImageDecode("Invalid pixel buffer".to_string()))
}

impl Painter for RasterPainter {
    fn begin_frame(&mut self, canvas: Size, scale: f64) -> RenderResult<()> {
        let width = (canvas.width * scale).round().max(1.0) as u32;
        let height = (canvas.height * scale).round().max(1.0) as u32;
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            RendererError::InitFailed(format!("Cannot allocate {}x{} pixmap", width, height))
        })?;
        self.pixmap = Some(pixmap);
        self.scale = scale;
        self.transform = Affine::IDENTITY;
        self.alpha = 1.0;
        Ok(())
    }

    fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    fn fill_rect(&mut self, rect: Rect, radius: f64, color: Color) {
        let paint = self.paint(color);
        let transform = self.device_transform();
        let Some(path) = rounded_rect_path(rect, radius) else {
            return;
        };
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
        }
    }

    fn stroke_rect(&mut self, rect: Rect, radius: f64, color: Color, width: f64) {
        let paint = self.paint(color);
        let transform = self.device_transform();
        let Some(path) = rounded_rect_path(rect, radius) else {
            return;
        };
        let stroke = Stroke {
            width: width as f32,
            ..Stroke::default()
        };
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.stroke_path(&path, &paint, &stroke, transform, None);
        }
    }

    #[cfg(feature = "raster-text")]
    fn draw_text(&mut self, text: &str, origin: Point, font_size: f64, font: FontFamily, color: Color) {
        if text.is_empty() {
            return;
        }
        let Some(glyphs) = self.text.rasterize(text, font_size * self.scale, font, color) else {
            return;
        };
        let transform = to_skia(
            Affine::scale(self.scale)
                * self.transform
                * Affine::translate(origin.to_vec2())
                * Affine::scale(1.0 / self.scale),
        );
        let paint = PixmapPaint {
            opacity: self.alpha as f32,
            ..PixmapPaint::default()
        };
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.draw_pixmap(0, 0, glyphs.as_ref(), &paint, transform, None);
        }
    }

    #[cfg(not(feature = "raster-text"))]
    fn draw_text(&mut self, _text: &str, _origin: Point, _font_size: f64, _font: FontFamily, _color: Color) {}

    fn draw_image(&mut self, src: &str, rect: Rect) -> RenderResult<()> {
        let base = Affine::scale(self.scale) * self.transform;
        let opacity = self.alpha as f32;
        if self.decoded(src).is_none() {
            return Err(RendererError::ImageDecode("Undecodable image".to_string()));
        }
        let Some(Some(image)) = self.images.get(src) else {
            return Err(RendererError::ImageDecode("Undecodable image".to_string()));
        };
        let sx = rect.width() / image.width() as f64;
        let sy = rect.height() / image.height() as f64;
        let transform = to_skia(
            base * Affine::translate(rect.origin().to_vec2()) * Affine::scale_non_uniform(sx, sy),
        );
        let paint = PixmapPaint {
            opacity,
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.draw_pixmap(0, 0, image.as_ref(), &paint, transform, None);
        }
        Ok(())
    }

    fn image_size(&mut self, src: &str) -> Option<Size> {
        self.decoded(src)
            .map(|p| Size::new(p.width() as f64, p.height() as f64))
    }

    fn end_frame(&mut self) -> RenderResult<()> {
        if self.pixmap.is_none() {
            return Err(RendererError::RenderFailed("Frame was never started".to_string()));
        }
        Ok(())
    }

    fn retain_images(&mut self, live: &HashSet<&str>) {
        self.images.retain(|src, _| live.contains(src.as_str()));
    }
}

/// Shapes and rasterizes text with cosmic-text.
#[cfg(feature = "raster-text")]
struct TextRasterizer {
    font_system: cosmic_text::FontSystem,
    swash_cache: cosmic_text::SwashCache,
}

#[cfg(feature = "raster-text")]
impl TextRasterizer {
    fn new() -> Self {
        Self {
            font_system: cosmic_text::FontSystem::new(),
            swash_cache: cosmic_text::SwashCache::new(),
        }
    }

    /// Render one line of text into a tightly sized pixmap.
    fn rasterize(&mut self, text: &str, font_size: f64, font: FontFamily, color: Color) -> Option<Pixmap> {
        use cosmic_text::{Attrs, Buffer, Family, Metrics, Shaping, Wrap};

        let size = font_size as f32;
        let metrics = Metrics::new(size, size * 1.2);
        let family = if font.is_generic() {
            Family::SansSerif
        } else {
            Family::Name(font.name())
        };

        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        let mut buffer = buffer.borrow_with(&mut self.font_system);
        buffer.set_wrap(Wrap::None);
        buffer.set_size(f32::MAX, size * 2.0);
        buffer.set_text(text, Attrs::new().family(family), Shaping::Advanced);
        buffer.shape_until_scroll(true);

        let width = buffer
            .layout_runs()
            .map(|run| run.line_w)
            .fold(0.0f32, f32::max)
            .ceil() as u32;
        let height = (metrics.line_height * 1.25).ceil() as u32;
        let mut glyphs = Pixmap::new(width.max(1), height.max(1))?;

        let rgba = color.to_rgba8();
        let base = cosmic_text::Color::rgba(rgba.r, rgba.g, rgba.b, rgba.a);
        buffer.draw(&mut self.swash_cache, base, |x, y, w, h, c| {
            let Some(rect) = tiny_skia::Rect::from_xywh(x as f32, y as f32, w as f32, h as f32) else {
                return;
            };
            let mut paint = Paint::default();
            paint.set_color_rgba8(c.r(), c.g(), c.b(), c.a());
            glyphs.fill_rect(rect, &paint, Transform::identity(), None);
        });
        Some(glyphs)
    }
}
