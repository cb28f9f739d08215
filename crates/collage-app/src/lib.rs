//! Collage Application
//!
//! The application shell: configuration, a command shell for native
//! builds and the browser bindings for WASM.

mod config;

#[cfg(not(target_arch = "wasm32"))]
mod shell;

pub use config::AppConfig;

#[cfg(feature = "native")]
pub use config::CliArgs;

#[cfg(not(target_arch = "wasm32"))]
pub use shell::{Adjust, Command, Outcome, Shell, ShellError};

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::WebEditor;
