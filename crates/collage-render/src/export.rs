//! PNG export of the whole canvas.

use crate::paint::ImmediateRenderer;
use crate::raster::RasterPainter;
use crate::renderer::{RenderContext, RenderResult, Renderer, RendererError};
use collage_core::{Editor, EditorState};
use kurbo::Size;

/// Pixel density of exported images relative to the logical canvas.
pub const EXPORT_SCALE: f64 = 2.0;
/// File name offered for downloads.
pub const EXPORT_FILE_NAME: &str = "canvas.png";

/// An encoded PNG and its pixel dimensions.
#[derive(Debug)]
pub struct PngExport {
    pub png_data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Rasterizes the canvas on the CPU and encodes it as PNG.
///
/// The selection outline is left out of exports.
pub struct Exporter {
    scale: f64,
    renderer: ImmediateRenderer<RasterPainter>,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Exporter {
    pub fn new() -> Self {
        Self::with_scale(EXPORT_SCALE)
    }

    pub fn with_scale(scale: f64) -> Self {
        Self {
            scale,
            renderer: ImmediateRenderer::new(RasterPainter::new()),
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Render and encode a state laid out on a canvas of `canvas_size`.
    pub fn export(&mut self, state: &EditorState, canvas_size: Size) -> RenderResult<PngExport> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(RendererError::RenderFailed(format!("Invalid export scale {}", self.scale)));
        }
        let ctx = RenderContext::new(state, canvas_size)
            .with_scale_factor(self.scale)
            .with_selection(false);
        self.renderer.render(&ctx)?;

        let frame = self.renderer.painter_mut().take_frame()?;
        let png_data = encode_png(&frame.rgba_data, frame.width, frame.height)?;
        log::info!(
            "Exported {}x{} PNG ({} bytes)",
            frame.width,
            frame.height,
            png_data.len()
        );
        Ok(PngExport {
            png_data,
            width: frame.width,
            height: frame.height,
        })
    }

    pub fn export_editor(&mut self, editor: &Editor) -> RenderResult<PngExport> {
        self.export(editor.state(), editor.canvas_size())
    }
}

/// Encode RGBA pixel data to PNG bytes.
pub fn encode_png(rgba_data: &[u8], width: u32, height: u32) -> RenderResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| RendererError::Encode(format!("Failed to write PNG header: {}", e)))?;
        writer
            .write_image_data(rgba_data)
            .map_err(|e| RendererError::Encode(format!("Failed to write PNG data: {}", e)))?;
    }
    Ok(png_data)
}
