//! Collage Render Library
//!
//! Renderer abstraction for the Collage canvas: a retained display-list
//! renderer, an immediate-mode renderer over a [`Painter`], and a CPU
//! painter used for PNG export.

pub mod display;
pub mod export;
pub mod layout;
pub mod paint;
pub mod raster;
mod renderer;

pub use display::{BackgroundNode, DisplayNode, NodeChange, NodeColor, NodeContent, RetainedRenderer};
pub use export::{EXPORT_FILE_NAME, EXPORT_SCALE, Exporter, PngExport, encode_png};
pub use layout::{ItemLayout, cover_rect, hit_test};
pub use paint::{ImmediateRenderer, Painter};
pub use raster::{RasterPainter, RgbaFrame};
pub use renderer::{RenderContext, RenderResult, Renderer, RendererError, SELECTION_COLOR};
