//! Business logic module
//!
//! Toolkit-independent logic behind the shell's UI: favorite tools, drag
//! arithmetic and theme bootstrap.

mod drag;
mod favorites;
mod theme;

pub use drag::{clamp_to_viewport, DragTracker, Point, Size};
pub use favorites::{default_catalog, FavoritesProjection, ToolCatalog, ToolDescriptor};
pub use theme::{apply_saved_theme, Document, Palette};
