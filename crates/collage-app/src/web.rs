//! WebAssembly entry point and browser bindings.

use collage_core::storage::create_default_storage;
use collage_core::{
    Editor, EditorConfig, FontFamily, HexColor, ItemId, ItemKind, PointerEvent, PointerId,
};
use collage_render::{
    DisplayNode, EXPORT_FILE_NAME, Exporter, ImmediateRenderer, NodeChange, NodeColor,
    NodeContent, Painter, RenderContext, RenderResult, Renderer, RendererError,
    RetainedRenderer, hit_test,
};
use kurbo::{Affine, PathEl, Point, Rect, RoundedRect, Shape, Size};
use peniko::Color;
use std::collections::{HashMap, HashSet};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

/// Initialize logging for the WASM build.
#[wasm_bindgen(start)]
pub fn run_wasm() {
    console_error_panic_hook::set_once();

    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }

    log::info!("Starting Collage (WASM)");
}

/// Paints onto a 2D canvas context.
///
/// Images are decoded by the browser, so the first frames after an image
/// is added may skip it until it finishes loading.
struct CanvasPainter {
    ctx: CanvasRenderingContext2d,
    scale: f64,
    images: HashMap<String, HtmlImageElement>,
}

impl CanvasPainter {
    fn new(ctx: CanvasRenderingContext2d) -> Self {
        Self {
            ctx,
            scale: 1.0,
            images: HashMap::new(),
        }
    }

    fn image(&mut self, src: &str) -> Option<&HtmlImageElement> {
        if !self.images.contains_key(src) {
            let element = match HtmlImageElement::new() {
                Ok(element) => element,
                Err(e) => {
                    log::warn!("Failed to create image element: {:?}", e);
                    return None;
                }
            };
            element.set_src(src);
            self.images.insert(src.to_string(), element);
        }
        self.images.get(src)
    }

    /// Whether any image is still being decoded.
    fn loading(&self) -> bool {
        self.images.values().any(|image| !image.complete())
    }

    fn trace(&self, rect: Rect, radius: f64) {
        self.ctx.begin_path();
        for el in RoundedRect::from_rect(rect, radius).path_elements(0.1) {
            match el {
                PathEl::MoveTo(p) => self.ctx.move_to(p.x, p.y),
                PathEl::LineTo(p) => self.ctx.line_to(p.x, p.y),
                PathEl::QuadTo(c, p) => self.ctx.quadratic_curve_to(c.x, c.y, p.x, p.y),
                PathEl::CurveTo(c1, c2, p) => {
                    self.ctx.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y)
                }
                PathEl::ClosePath => self.ctx.close_path(),
            }
        }
    }
}

fn css(color: Color) -> String {
    NodeColor::from(color).to_css()
}

impl Painter for CanvasPainter {
    fn begin_frame(&mut self, canvas: Size, scale: f64) -> RenderResult<()> {
        self.scale = scale;
        self.ctx
            .set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
            .map_err(|e| RendererError::RenderFailed(format!("{:?}", e)))?;
        self.ctx
            .clear_rect(0.0, 0.0, canvas.width * scale, canvas.height * scale);
        self.ctx.set_text_baseline("top");
        Ok(())
    }

    fn set_transform(&mut self, transform: Affine) {
        let [a, b, c, d, e, f] = (Affine::scale(self.scale) * transform).as_coeffs();
        if let Err(err) = self.ctx.set_transform(a, b, c, d, e, f) {
            log::warn!("Failed to set canvas transform: {:?}", err);
        }
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.ctx.set_global_alpha(alpha);
    }

    fn fill_rect(&mut self, rect: Rect, radius: f64, color: Color) {
        self.ctx.set_fill_style_str(&css(color));
        if radius > 0.0 {
            self.trace(rect, radius);
            self.ctx.fill();
        } else {
            self.ctx.fill_rect(rect.x0, rect.y0, rect.width(), rect.height());
        }
    }

    fn stroke_rect(&mut self, rect: Rect, radius: f64, color: Color, width: f64) {
        self.ctx.set_stroke_style_str(&css(color));
        self.ctx.set_line_width(width);
        self.trace(rect, radius);
        self.ctx.stroke();
    }

    fn draw_text(&mut self, text: &str, origin: Point, font_size: f64, font: FontFamily, color: Color) {
        self.ctx
            .set_font(&format!("{}px {}", font_size, font.css_value()));
        self.ctx.set_fill_style_str(&css(color));
        if let Err(e) = self.ctx.fill_text(text, origin.x, origin.y) {
            log::warn!("Failed to draw text: {:?}", e);
        }
    }

    fn draw_image(&mut self, src: &str, rect: Rect) -> RenderResult<()> {
        let ctx = self.ctx.clone();
        let image = self
            .image(src)
            .ok_or_else(|| RendererError::ImageDecode("Image element unavailable".to_string()))?;
        ctx.draw_image_with_html_image_element_and_dw_and_dh(
            image,
            rect.x0,
            rect.y0,
            rect.width(),
            rect.height(),
        )
        .map_err(|e| RendererError::RenderFailed(format!("{:?}", e)))
    }

    fn image_size(&mut self, src: &str) -> Option<Size> {
        let image = self.image(src)?;
        if !image.complete() || image.natural_width() == 0 {
            return None;
        }
        Some(Size::new(
            image.natural_width() as f64,
            image.natural_height() as f64,
        ))
    }

    fn end_frame(&mut self) -> RenderResult<()> {
        self.ctx
            .set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
            .map_err(|e| RendererError::RenderFailed(format!("{:?}", e)))?;
        self.ctx.set_global_alpha(1.0);
        Ok(())
    }

    fn retain_images(&mut self, live: &HashSet<&str>) {
        self.images.retain(|src, _| live.contains(src.as_str()));
    }
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// The editor as seen from JavaScript.
///
/// State is saved to local storage after every change and restored on
/// construction.
#[wasm_bindgen]
pub struct WebEditor {
    editor: Editor,
    renderer: Option<ImmediateRenderer<CanvasPainter>>,
    retained: RetainedRenderer,
    exporter: Exporter,
    scale_factor: f64,
}

#[wasm_bindgen]
impl WebEditor {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebEditor {
        let config = EditorConfig::default();
        let editor = match create_default_storage() {
            Ok(storage) => Editor::with_storage(config, Box::new(storage)),
            Err(e) => {
                log::warn!("Local storage unavailable, changes will not be saved: {}", e);
                Editor::new(config)
            }
        };
        let scale_factor = web_sys::window()
            .map(|w| w.device_pixel_ratio())
            .unwrap_or(1.0);
        WebEditor {
            editor,
            renderer: None,
            retained: RetainedRenderer::new(),
            exporter: Exporter::new(),
            scale_factor,
        }
    }

    pub fn add_text(&mut self, text: &str) -> u64 {
        self.editor.add_text(text).0
    }

    pub fn add_emoji(&mut self, glyph: &str) -> u64 {
        self.editor.add_emoji(glyph).0
    }

    pub fn add_image(&mut self, data_uri: &str) -> u64 {
        self.editor.add_image(data_uri).0
    }

    /// Select an item; `undefined` clears the selection.
    pub fn select(&mut self, id: Option<u64>) {
        self.editor.select(id.map(ItemId));
    }

    pub fn selection(&self) -> Option<u64> {
        self.editor.selection().map(|id| id.0)
    }

    /// Topmost item under a canvas point.
    pub fn item_at(&mut self, x: f64, y: f64) -> Option<u64> {
        let point = Point::new(x, y);
        let items = self.editor.items();
        let hit = match self.renderer.as_mut() {
            Some(renderer) => hit_test(items, point, |item| match item.kind {
                ItemKind::Image => renderer.painter_mut().image_size(&item.content),
                _ => None,
            }),
            None => hit_test(items, point, |_| None),
        };
        hit.map(|id| id.0)
    }

    pub fn pointer_down(&mut self, pointer: i32, x: f64, y: f64) {
        let target = self.item_at(x, y).map(ItemId);
        self.editor.handle_pointer(PointerEvent::Down {
            pointer: PointerId(pointer),
            position: Point::new(x, y),
            target,
        });
    }

    pub fn pointer_move(&mut self, pointer: i32, x: f64, y: f64) {
        self.editor.handle_pointer(PointerEvent::Move {
            pointer: PointerId(pointer),
            position: Point::new(x, y),
        });
    }

    pub fn pointer_up(&mut self, pointer: i32, x: f64, y: f64) {
        self.editor.handle_pointer(PointerEvent::Up {
            pointer: PointerId(pointer),
            position: Point::new(x, y),
        });
    }

    /// Grow (positive) or shrink (negative) the selection by toolbar steps.
    pub fn resize(&mut self, steps: f64) {
        self.editor.resize_by(steps * Editor::SIZE_STEP);
    }

    /// Rotate the selection by toolbar steps.
    pub fn rotate(&mut self, steps: f64) {
        self.editor.rotate_by(steps * Editor::ROTATION_STEP);
    }

    pub fn set_color(&mut self, hex: &str) -> Result<(), JsValue> {
        let color: HexColor = hex.parse().map_err(to_js)?;
        self.editor.set_color(color);
        Ok(())
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        self.editor.set_opacity(opacity);
    }

    pub fn set_fill(&mut self, hex: &str, opacity: Option<f64>) -> Result<(), JsValue> {
        let color: HexColor = hex.parse().map_err(to_js)?;
        self.editor.set_fill(color, opacity);
        Ok(())
    }

    pub fn set_font(&mut self, name: &str) -> Result<(), JsValue> {
        let family = FontFamily::from_name(name)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown font: {}", name)))?;
        self.editor.set_font(family);
        Ok(())
    }

    pub fn set_content(&mut self, content: &str) {
        self.editor.set_content(content);
    }

    pub fn remove_selected(&mut self) {
        self.editor.remove_selected();
    }

    pub fn undo(&mut self) -> bool {
        !self.editor.undo().is_none()
    }

    pub fn redo(&mut self) -> bool {
        !self.editor.redo().is_none()
    }

    pub fn can_undo(&self) -> bool {
        self.editor.state().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.editor.state().can_redo()
    }

    pub fn set_background_color(&mut self, hex: &str) -> Result<(), JsValue> {
        let color: HexColor = hex.parse().map_err(to_js)?;
        self.editor.set_background_color(color);
        Ok(())
    }

    pub fn set_background_image(&mut self, data_uri: Option<String>) {
        self.editor.set_background_image(data_uri);
    }

    /// Whether images are still loading, so another frame is needed.
    pub fn images_loading(&self) -> bool {
        self.renderer
            .as_ref()
            .is_some_and(|r| r.painter().loading())
    }

    /// Repaint into a 2D context.
    pub fn render(&mut self, ctx: &CanvasRenderingContext2d) -> Result<(), JsValue> {
        let renderer = self
            .renderer
            .get_or_insert_with(|| ImmediateRenderer::new(CanvasPainter::new(ctx.clone())));
        renderer.painter_mut().ctx = ctx.clone();
        let render_ctx =
            RenderContext::for_editor(&self.editor).with_scale_factor(self.scale_factor);
        renderer.render(&render_ctx).map_err(to_js)
    }

    /// Node changes since the previous call, for hosts that keep one DOM
    /// element per item. The first call lists everything.
    pub fn display_list(&mut self) -> Result<js_sys::Array, JsValue> {
        let ctx = RenderContext::for_editor(&self.editor);
        let changes = self.retained.render(&ctx).map_err(to_js)?;
        let list = js_sys::Array::new();
        for change in &changes {
            list.push(&change_to_js(change)?);
        }
        Ok(list)
    }

    /// Make the next `display_list` call list everything again.
    pub fn reset_display_list(&mut self) {
        self.retained.reset();
    }

    /// Rasterize the canvas and download it as a PNG.
    pub fn export_png(&mut self) -> Result<(), JsValue> {
        let export = self.exporter.export_editor(&self.editor).map_err(to_js)?;
        download_binary_file(EXPORT_FILE_NAME, &export.png_data, "image/png")
    }

    /// Logical canvas size as `[width, height]`.
    pub fn canvas_size(&self) -> Vec<f64> {
        let size = self.editor.canvas_size();
        vec![size.width, size.height]
    }

    pub fn item_count(&self) -> usize {
        self.editor.items().len()
    }
}

impl Default for WebEditor {
    fn default() -> Self {
        Self::new()
    }
}

fn object(fields: &[(&str, JsValue)]) -> Result<JsValue, JsValue> {
    let object = js_sys::Object::new();
    for (key, value) in fields {
        js_sys::Reflect::set(&object, &JsValue::from_str(key), value)?;
    }
    Ok(object.into())
}

fn rect_to_js(rect: Rect) -> Result<JsValue, JsValue> {
    object(&[
        ("x", rect.x0.into()),
        ("y", rect.y0.into()),
        ("width", rect.width().into()),
        ("height", rect.height().into()),
    ])
}

fn node_to_js(node: &DisplayNode) -> Result<JsValue, JsValue> {
    let transform = js_sys::Array::new();
    for coeff in node.transform.as_coeffs() {
        transform.push(&coeff.into());
    }
    let (kind, content) = match &node.content {
        NodeContent::Text {
            text,
            font_size,
            font,
            color,
        } => (
            "text",
            object(&[
                ("text", text.as_str().into()),
                ("fontSize", (*font_size).into()),
                ("font", font.css_value().into()),
                ("color", color.to_css().into()),
            ])?,
        ),
        NodeContent::Emoji {
            glyph,
            font_size,
            color,
        } => (
            "emoji",
            object(&[
                ("text", glyph.as_str().into()),
                ("fontSize", (*font_size).into()),
                ("color", color.to_css().into()),
            ])?,
        ),
        NodeContent::Image { src } => ("image", object(&[("src", src.as_str().into())])?),
    };
    object(&[
        ("id", (node.id.0 as f64).into()),
        ("kind", kind.into()),
        ("transform", transform.into()),
        ("frame", rect_to_js(node.frame)?),
        ("content", rect_to_js(node.content_rect)?),
        ("opacity", node.opacity.into()),
        ("fill", node.fill.to_css().into()),
        ("body", content),
        (
            "outline",
            node.outline
                .map(|c| JsValue::from_str(&c.to_css()))
                .unwrap_or(JsValue::NULL),
        ),
    ])
}

fn change_to_js(change: &NodeChange) -> Result<JsValue, JsValue> {
    match change {
        NodeChange::Background(background) => object(&[
            ("op", "background".into()),
            ("width", background.size.width.into()),
            ("height", background.size.height.into()),
            ("color", background.color.to_css().into()),
            (
                "image",
                background
                    .image
                    .as_deref()
                    .map(JsValue::from_str)
                    .unwrap_or(JsValue::NULL),
            ),
        ]),
        NodeChange::Insert { index, node } => object(&[
            ("op", "insert".into()),
            ("index", (*index as f64).into()),
            ("node", node_to_js(node)?),
        ]),
        NodeChange::Update(node) => {
            object(&[("op", "update".into()), ("node", node_to_js(node)?)])
        }
        NodeChange::Remove(id) => object(&[("op", "remove".into()), ("id", (id.0 as f64).into())]),
        NodeChange::Reorder(order) => {
            let ids = js_sys::Array::new();
            for id in order {
                ids.push(&(id.0 as f64).into());
            }
            object(&[("op", "reorder".into()), ("ids", ids.into())])
        }
    }
}

/// Offer bytes to the user as a file download.
fn download_binary_file(filename: &str, data: &[u8], mime_type: &str) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("No window")?;
    let document = window.document().ok_or("No document")?;

    let uint8_array = js_sys::Uint8Array::from(data);
    let blob_parts = js_sys::Array::new();
    blob_parts.push(&uint8_array);

    let options = web_sys::BlobPropertyBag::new();
    options.set_type(mime_type);

    let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&blob_parts, &options)?;
    let url = web_sys::Url::create_object_url_with_blob(&blob)?;

    let a = document
        .create_element("a")?
        .dyn_into::<web_sys::HtmlAnchorElement>()?;
    a.set_href(&url);
    a.set_download(filename);
    a.click();

    web_sys::Url::revoke_object_url(&url).ok();
    Ok(())
}
