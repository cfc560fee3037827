//! UI Module
//!
//! Connection dialog, floating favorites toolbar and the surfaces they are
//! presented on.

mod app;
mod boundary;
mod connection_dialog;
mod console;
mod floating_toolbar;
mod overlay;
#[cfg(target_os = "windows")]
mod overlay_window;

pub use app::run_app;
pub use boundary::ErrorBoundary;
