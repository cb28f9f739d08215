//! Line-oriented command shell driving an [`Editor`].
//!
//! One command per line. Property commands act on the selected item, the
//! same way the toolbar does.

use crate::config::AppConfig;
use collage_core::image::to_data_uri;
use collage_core::storage::{FileStorage, create_default_storage};
use collage_core::{
    ColorError, EMOJI_CATEGORIES, Editor, FontFamily, HexColor, ItemId, ItemKind, MemoryStorage,
    PointerEvent, SlotStorage,
};
use collage_render::{Exporter, RendererError};
use kurbo::Point;
use std::fmt::Write as _;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Shell errors.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Unknown command: {0} (try `help`)")]
    UnknownCommand(String),
    #[error("{command}: missing {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("Not a number: {0}")]
    InvalidNumber(String),
    #[error(transparent)]
    InvalidColor(#[from] ColorError),
    #[error("Unknown font: {0} (try `fonts`)")]
    UnknownFont(String),
    #[error("No item with id {0}")]
    UnknownItem(ItemId),
    #[error("Nothing is selected")]
    NoSelection,
    #[error("drag: expected x/y pairs")]
    UnpairedCoordinates,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Export failed: {0}")]
    Export(#[from] RendererError),
}

/// Absolute value, or a relative change counted in toolbar steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjust {
    By(f64),
    To(f64),
}

impl FromStr for Adjust {
    type Err = ShellError;

    fn from_str(s: &str) -> Result<Self, ShellError> {
        match s {
            "+" => Ok(Adjust::By(1.0)),
            "-" => Ok(Adjust::By(-1.0)),
            _ if s.starts_with('+') || s.starts_with('-') => parse_number(s).map(Adjust::By),
            _ => parse_number(s).map(Adjust::To),
        }
    }
}

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Text(String),
    Emoji(String),
    Image(PathBuf),
    Select(Option<ItemId>),
    /// Press on an item at the first point, move through the rest, release.
    Drag { item: ItemId, path: Vec<Point> },
    Size(Adjust),
    Rotate(Adjust),
    Color(HexColor),
    Opacity(f64),
    Fill { color: HexColor, opacity: Option<f64> },
    Font(FontFamily),
    Content(String),
    Remove,
    Undo,
    Redo,
    Background(HexColor),
    BackgroundImage(Option<PathBuf>),
    List,
    Export(PathBuf),
    Emojis,
    Fonts,
    Help,
    Quit,
}

fn parse_number(s: &str) -> Result<f64, ShellError> {
    s.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| ShellError::InvalidNumber(s.to_string()))
}

fn parse_id(s: &str) -> Result<ItemId, ShellError> {
    s.trim_start_matches('#')
        .parse::<u64>()
        .map(ItemId)
        .map_err(|_| ShellError::InvalidNumber(s.to_string()))
}

fn required<'a>(
    value: Option<&'a str>,
    command: &'static str,
    argument: &'static str,
) -> Result<&'a str, ShellError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ShellError::MissingArgument { command, argument })
}

impl FromStr for Command {
    type Err = ShellError;

    fn from_str(line: &str) -> Result<Self, ShellError> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let rest = (!rest.is_empty()).then_some(rest);
        let mut args = rest.unwrap_or("").split_whitespace();

        let command = match name {
            "text" => Command::Text(required(rest, "text", "content")?.replace("\\n", "\n")),
            "emoji" => Command::Emoji(required(rest, "emoji", "glyph")?.to_string()),
            "image" => Command::Image(PathBuf::from(required(rest, "image", "path")?)),
            "select" => match required(args.next(), "select", "item id")? {
                "none" => Command::Select(None),
                id => Command::Select(Some(parse_id(id)?)),
            },
            "drag" => {
                let item = parse_id(required(args.next(), "drag", "item id")?)?;
                let coords = args.map(parse_number).collect::<Result<Vec<_>, _>>()?;
                if coords.is_empty() {
                    return Err(ShellError::MissingArgument {
                        command: "drag",
                        argument: "start position",
                    });
                }
                if coords.len() % 2 != 0 {
                    return Err(ShellError::UnpairedCoordinates);
                }
                let path = coords.chunks(2).map(|c| Point::new(c[0], c[1])).collect();
                Command::Drag { item, path }
            }
            "size" => Command::Size(required(args.next(), "size", "amount")?.parse()?),
            "rotate" => Command::Rotate(required(args.next(), "rotate", "degrees")?.parse()?),
            "color" => Command::Color(required(args.next(), "color", "hex color")?.parse()?),
            "opacity" => Command::Opacity(parse_number(required(args.next(), "opacity", "value")?)?),
            "bg-fill" => Command::Fill {
                color: required(args.next(), "bg-fill", "hex color")?.parse()?,
                opacity: args.next().map(parse_number).transpose()?,
            },
            "font" => {
                let name = required(rest, "font", "name")?;
                Command::Font(
                    FontFamily::from_name(name).ok_or_else(|| ShellError::UnknownFont(name.to_string()))?,
                )
            }
            "content" => Command::Content(required(rest, "content", "text")?.replace("\\n", "\n")),
            "remove" => Command::Remove,
            "undo" => Command::Undo,
            "redo" => Command::Redo,
            "background" => {
                Command::Background(required(args.next(), "background", "hex color")?.parse()?)
            }
            "background-image" => match required(rest, "background-image", "path")? {
                "none" => Command::BackgroundImage(None),
                path => Command::BackgroundImage(Some(PathBuf::from(path))),
            },
            "list" => Command::List,
            "export" => Command::Export(PathBuf::from(rest.unwrap_or(collage_render::EXPORT_FILE_NAME))),
            "emojis" => Command::Emojis,
            "fonts" => Command::Fonts,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(ShellError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

/// What the shell should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Keep reading; print the message if non-empty.
    Continue(String),
    Quit,
}

const HELP: &str = "\
Commands:
  text <content>              add a text item (\\n for newlines)
  emoji <glyph>               add an emoji item
  image <path>                add an image item from a file
  select <id>|none            select an item
  drag <id> <x> <y> ...       press on an item, move through points, release
  size <+steps|-steps|px>     grow/shrink by 4px steps, or set
  rotate <+steps|-steps|deg>  turn by 15 degree steps, or set
  color <#hex>                foreground color
  opacity <0..1>              item opacity
  bg-fill <#hex> [opacity]    item background fill
  font <name>                 font family (text items)
  content <text>              replace text (\\n for newlines)
  remove                      delete the selection
  undo | redo
  background <#hex>           canvas color
  background-image <path>|none
  list                        show items
  export [path]               write a PNG
  emojis | fonts              show catalogs
  quit";

/// Drives an editor from text commands.
pub struct Shell {
    editor: Editor,
    export_scale: f64,
    exporter: Option<Exporter>,
}

impl Shell {
    pub fn new(editor: Editor, export_scale: f64) -> Self {
        Self {
            editor,
            export_scale,
            exporter: None,
        }
    }

    /// Open an editor as configured, restoring saved state unless running
    /// in memory. An unusable data directory falls back to memory.
    pub fn from_config(config: &AppConfig) -> Self {
        let editor_config = config.editor_config();
        let editor = if config.in_memory {
            Editor::new(editor_config)
        } else {
            let storage = match &config.data_dir {
                Some(dir) => FileStorage::new(dir.clone()),
                None => create_default_storage(),
            };
            let storage: Box<dyn SlotStorage> = match storage {
                Ok(storage) => {
                    log::info!("Saving canvas state to {}", storage.base_path().display());
                    Box::new(storage)
                }
                Err(e) => {
                    log::warn!("Failed to open data directory, changes will not be saved: {}", e);
                    Box::new(MemoryStorage::new())
                }
            };
            Editor::with_storage(editor_config, storage)
        };
        Self::new(editor, config.export_scale)
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    fn require_selection(&self) -> Result<ItemId, ShellError> {
        self.editor.selection().ok_or(ShellError::NoSelection)
    }

    /// Parse and run one line. Blank lines and `#` comments do nothing.
    pub fn run_line(&mut self, line: &str) -> Result<Outcome, ShellError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(Outcome::Continue(String::new()));
        }
        self.execute(line.parse()?)
    }

    /// Run commands until input ends or `quit`. Errors are reported and skipped.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> std::io::Result<()> {
        for line in input.lines() {
            match self.run_line(&line?) {
                Ok(Outcome::Quit) => break,
                Ok(Outcome::Continue(message)) if message.is_empty() => {}
                Ok(Outcome::Continue(message)) => writeln!(output, "{}", message)?,
                Err(e) => writeln!(output, "error: {}", e)?,
            }
        }
        output.flush()
    }

    pub fn execute(&mut self, command: Command) -> Result<Outcome, ShellError> {
        let message = match command {
            Command::Text(text) => format!("added {}", self.editor.add_text(text)),
            Command::Emoji(glyph) => format!("added {}", self.editor.add_emoji(glyph)),
            Command::Image(path) => {
                let uri = read_data_uri(&path)?;
                format!("added {}", self.editor.add_image(uri))
            }
            Command::Select(None) => {
                self.editor.select(None);
                String::new()
            }
            Command::Select(Some(id)) => {
                if !self.editor.state().contains(id) {
                    return Err(ShellError::UnknownItem(id));
                }
                self.editor.select(Some(id));
                String::new()
            }
            Command::Drag { item, path } => {
                if !self.editor.state().contains(item) {
                    return Err(ShellError::UnknownItem(item));
                }
                let mut points = path.into_iter();
                let start = points.next().unwrap_or(Point::ZERO);
                let mut last = start;
                self.editor
                    .handle_pointer(PointerEvent::mouse_down(start, Some(item)));
                for point in points {
                    self.editor.handle_pointer(PointerEvent::mouse_move(point));
                    last = point;
                }
                self.editor.handle_pointer(PointerEvent::mouse_up(last));
                let position = self.editor.state().get(item).map(|i| i.position);
                match position {
                    Some(p) => format!("{} at ({}, {})", item, p.x, p.y),
                    None => String::new(),
                }
            }
            Command::Size(adjust) => {
                self.require_selection()?;
                match adjust {
                    Adjust::By(delta) => self.editor.resize_by(delta * Editor::SIZE_STEP),
                    Adjust::To(size) => self.editor.set_size(size),
                };
                String::new()
            }
            Command::Rotate(adjust) => {
                self.require_selection()?;
                match adjust {
                    Adjust::By(delta) => self.editor.rotate_by(delta * Editor::ROTATION_STEP),
                    Adjust::To(angle) => self.editor.set_angle(angle),
                };
                String::new()
            }
            Command::Color(color) => {
                self.require_selection()?;
                self.editor.set_color(color);
                String::new()
            }
            Command::Opacity(opacity) => {
                self.require_selection()?;
                self.editor.set_opacity(opacity);
                String::new()
            }
            Command::Fill { color, opacity } => {
                self.require_selection()?;
                self.editor.set_fill(color, opacity);
                String::new()
            }
            Command::Font(family) => {
                self.require_selection()?;
                if self.editor.set_font(family).is_none() {
                    "fonts only apply to text items".to_string()
                } else {
                    String::new()
                }
            }
            Command::Content(text) => {
                self.require_selection()?;
                self.editor.set_content(text);
                String::new()
            }
            Command::Remove => {
                let id = self.require_selection()?;
                self.editor.remove_selected();
                format!("removed {}", id)
            }
            Command::Undo => {
                if self.editor.undo().is_none() {
                    "nothing to undo".to_string()
                } else {
                    String::new()
                }
            }
            Command::Redo => {
                if self.editor.redo().is_none() {
                    "nothing to redo".to_string()
                } else {
                    String::new()
                }
            }
            Command::Background(color) => {
                self.editor.set_background_color(color);
                String::new()
            }
            Command::BackgroundImage(path) => {
                let uri = path.as_deref().map(read_data_uri).transpose()?;
                self.editor.set_background_image(uri);
                String::new()
            }
            Command::List => self.list(),
            Command::Export(path) => {
                let scale = self.export_scale;
                let exporter = self.exporter.get_or_insert_with(|| Exporter::with_scale(scale));
                let export = exporter.export_editor(&self.editor)?;
                std::fs::write(&path, &export.png_data)?;
                format!(
                    "wrote {} ({}x{})",
                    path.display(),
                    export.width,
                    export.height
                )
            }
            Command::Emojis => {
                let mut out = String::new();
                for category in EMOJI_CATEGORIES {
                    let _ = writeln!(out, "{}: {}", category.name, category.glyphs().join(" "));
                }
                out.trim_end().to_string()
            }
            Command::Fonts => FontFamily::all()
                .iter()
                .map(|f| format!("{:16} {}", f.display_name(), f.css_value()))
                .collect::<Vec<_>>()
                .join("\n"),
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Outcome::Quit),
        };
        Ok(Outcome::Continue(message))
    }

    fn list(&self) -> String {
        if self.editor.items().is_empty() {
            return "(empty canvas)".to_string();
        }
        let mut out = String::new();
        for item in self.editor.items() {
            let marker = if self.editor.selection() == Some(item.id) { '*' } else { ' ' };
            let content = match item.kind {
                ItemKind::Image => format!("[image, {} bytes]", item.content.len()),
                _ => format!("{:?}", item.content),
            };
            let _ = writeln!(
                out,
                "{}{:>4} {:6} ({}, {}) size={} angle={} {}",
                marker,
                item.id,
                item.kind.name(),
                item.position.x,
                item.position.y,
                item.size,
                item.angle,
                content
            );
        }
        out.trim_end().to_string()
    }
}

/// Read a file as a data URI. The content type is sniffed, not checked.
fn read_data_uri(path: &Path) -> Result<String, ShellError> {
    let bytes = std::fs::read(path)?;
    log::debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(to_data_uri(&bytes))
}
