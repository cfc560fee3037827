//! Overlay Host
//!
//! Rendering target for always-on-top floating elements, outside the normal
//! UI hierarchy.

use crate::business::{Point, Size};
use crate::ui::floating_toolbar::{HitTarget, ToolbarView};

/// Capability a floating element requests from its environment
pub trait OverlayHost {
    /// Current viewport size in pixels
    fn viewport(&self) -> Size;

    /// Size of the overlay as last laid out, if known
    fn measured_size(&self) -> Option<Size>;

    /// Route all pointer movement to the overlay until released
    fn capture_pointer(&mut self);

    fn release_pointer(&mut self);

    /// Show `view`, or remove the overlay when `None`
    fn present(&mut self, view: Option<&ToolbarView>);
}

/// Pointer input delivered by an overlay host
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayInput {
    PointerDown { point: Point, target: HitTarget },
    PointerMove { point: Point },
    PointerUp,
    PointerEnter { tool_id: String },
    PointerLeave,
    Click { tool_id: String },
}

/// Overlay host without a window: keeps the last presented view and logs
/// what would be drawn.
#[derive(Debug)]
pub struct HeadlessOverlay {
    viewport: Size,
    captured: bool,
    presented: Option<ToolbarView>,
    present_count: usize,
}

impl HeadlessOverlay {
    pub fn new(viewport: Size) -> Self {
        Self {
            viewport,
            captured: false,
            presented: None,
            present_count: 0,
        }
    }

    #[cfg(test)]
    pub fn is_captured(&self) -> bool {
        self.captured
    }

    #[cfg(test)]
    pub fn presented(&self) -> Option<&ToolbarView> {
        self.presented.as_ref()
    }

    #[cfg(test)]
    pub fn present_count(&self) -> usize {
        self.present_count
    }
}

impl OverlayHost for HeadlessOverlay {
    fn viewport(&self) -> Size {
        self.viewport
    }

    fn measured_size(&self) -> Option<Size> {
        self.presented.as_ref().map(ToolbarView::size)
    }

    fn capture_pointer(&mut self) {
        self.captured = true;
    }

    fn release_pointer(&mut self) {
        self.captured = false;
    }

    fn present(&mut self, view: Option<&ToolbarView>) {
        self.present_count += 1;
        match view {
            Some(view) => tracing::debug!(
                "Overlay frame {} at ({:.0}, {:.0}) with {} tools, captured: {}",
                self.present_count,
                view.position.x,
                view.position.y,
                view.items.len(),
                self.captured
            ),
            None if self.presented.is_some() => tracing::debug!("Overlay removed"),
            None => {}
        }
        self.presented = view.cloned();
    }
}
