//! Application configuration.

use collage_core::{DragHistory, EditorConfig, HistoryLimit};
use collage_render::EXPORT_SCALE;
use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    /// Directory for persisted slots. `None` uses the platform default.
    pub data_dir: Option<PathBuf>,
    /// Keep everything in memory instead of persisting.
    pub in_memory: bool,
    /// Commands to run instead of reading stdin.
    pub script: Option<PathBuf>,
    pub export_scale: f64,
    pub drag_history: DragHistory,
    /// Maximum number of undo steps; `None` keeps everything.
    pub history_limit: Option<usize>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Collage".to_string(),
            data_dir: None,
            in_memory: false,
            script: None,
            export_scale: EXPORT_SCALE,
            drag_history: DragHistory::Collapsed,
            history_limit: None,
        }
    }
}

impl AppConfig {
    /// Editor settings derived from this configuration.
    pub fn editor_config(&self) -> EditorConfig {
        EditorConfig {
            drag_history: self.drag_history,
            history_limit: match self.history_limit {
                Some(n) => HistoryLimit::Capped(n),
                None => HistoryLimit::Unbounded,
            },
            ..EditorConfig::default()
        }
    }
}

#[cfg(feature = "native")]
pub use cli::CliArgs;

#[cfg(feature = "native")]
mod cli {
    use super::AppConfig;
    use clap::{Parser, ValueEnum};
    use collage_core::DragHistory;
    use std::path::PathBuf;

    /// How drags are recorded in undo history.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
    pub enum DragHistoryArg {
        /// One undo step per drag.
        Collapsed,
        /// One undo step per pointer move.
        PerMove,
    }

    impl From<DragHistoryArg> for DragHistory {
        fn from(arg: DragHistoryArg) -> Self {
            match arg {
                DragHistoryArg::Collapsed => DragHistory::Collapsed,
                DragHistoryArg::PerMove => DragHistory::PerMove,
            }
        }
    }

    /// Command-line arguments for the collage shell.
    #[derive(Debug, Clone, Parser)]
    #[command(name = "collage")]
    #[command(about = "Place text, emoji and images on a canvas and export it as PNG")]
    #[command(version)]
    pub struct CliArgs {
        /// Directory for saved canvas state
        #[arg(long, env = "COLLAGE_DATA_DIR")]
        pub data_dir: Option<PathBuf>,

        /// Do not load or save canvas state
        #[arg(long)]
        pub in_memory: bool,

        /// Read commands from a file instead of stdin
        #[arg(long)]
        pub script: Option<PathBuf>,

        /// Pixel density of exported PNGs
        #[arg(long, default_value = "2.0")]
        pub export_scale: f64,

        /// How drags are recorded in undo history
        #[arg(long, value_enum, default_value = "collapsed")]
        pub drag_history: DragHistoryArg,

        /// Maximum number of undo steps (unlimited if omitted)
        #[arg(long)]
        pub history_limit: Option<usize>,
    }

    impl From<CliArgs> for AppConfig {
        fn from(args: CliArgs) -> Self {
            Self {
                data_dir: args.data_dir,
                in_memory: args.in_memory,
                script: args.script,
                export_scale: args.export_scale,
                drag_history: args.drag_history.into(),
                history_limit: args.history_limit,
                ..AppConfig::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_editor_config() {
        let config = AppConfig::default().editor_config();
        assert_eq!(config.history_limit, HistoryLimit::Unbounded);
        assert_eq!(config.drag_history, DragHistory::Collapsed);
        assert_eq!(config.canvas_size, kurbo::Size::new(800.0, 600.0));
    }

    #[test]
    fn test_history_limit_maps_to_cap() {
        let config = AppConfig {
            history_limit: Some(10),
            ..AppConfig::default()
        };
        assert_eq!(config.editor_config().history_limit, HistoryLimit::Capped(10));
    }

    #[cfg(feature = "native")]
    #[test]
    fn test_cli_args() {
        use clap::Parser;
        let args = CliArgs::parse_from([
            "collage",
            "--in-memory",
            "--drag-history",
            "per-move",
            "--export-scale",
            "1",
        ]);
        let config = AppConfig::from(args);
        assert!(config.in_memory);
        assert_eq!(config.drag_history, DragHistory::PerMove);
        assert_eq!(config.export_scale, 1.0);
    }
}
