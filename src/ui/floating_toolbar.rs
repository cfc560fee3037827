//! Floating Favorites Toolbar
//!
//! A draggable overlay listing the user's favorite drawing tools. Nothing is
//! shown while the favorites list is empty. The position survives restarts.

use std::sync::mpsc::Sender;

use serde::{Deserialize, Serialize};

use crate::business::{
    clamp_to_viewport, DragTracker, FavoritesProjection, Palette, Point, Size, ToolCatalog, ToolDescriptor,
};
use crate::data::{keys, SharedStore};
use crate::ui::overlay::{OverlayHost, OverlayInput};

/// Size assumed for clamping before the overlay has been laid out
pub const DEFAULT_SIZE: Size = Size::new(200.0, 50.0);

/// Width of the grip on the left edge
pub const HANDLE_WIDTH: f64 = 20.0;
/// Width of one tool cell
pub const CELL_WIDTH: f64 = 40.0;
pub const PADDING: f64 = 4.0;
pub const TOOLBAR_HEIGHT: f64 = 48.0;

/// Distance of the default position from the right edge of the viewport
const DEFAULT_RIGHT_INSET: f64 = 800.0;
const DEFAULT_TOP: f64 = 100.0;

/// Events from the floating toolbar
#[derive(Debug, Clone, PartialEq)]
pub enum ToolbarEvent {
    /// User picked a tool
    ToolSelected(String),
}

/// What a pointer-down landed on
#[derive(Debug, Clone, PartialEq)]
pub enum HitTarget {
    DragHandle,
    Tool(String),
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Default,
    Grabbing,
}

/// One rendered tool icon
#[derive(Debug, Clone, PartialEq)]
pub struct ToolbarItem {
    pub id: String,
    pub icon: String,
    pub label: String,
    pub active: bool,
    pub show_tooltip: bool,
}

/// Everything an overlay host needs to draw the toolbar
#[derive(Debug, Clone, PartialEq)]
pub struct ToolbarView {
    pub position: Point,
    pub cursor: Cursor,
    pub palette: Palette,
    pub items: Vec<ToolbarItem>,
}

impl ToolbarView {
    /// Laid-out size: padding, grip, then one cell per tool
    pub fn size(&self) -> Size {
        Size::new(
            PADDING * 2.0 + HANDLE_WIDTH + CELL_WIDTH * self.items.len() as f64,
            TOOLBAR_HEIGHT,
        )
    }

    /// Hit test a point relative to the toolbar's top-left corner
    pub fn hit_test(&self, local: Point) -> HitTarget {
        let size = self.size();
        if local.x < 0.0 || local.y < 0.0 || local.x >= size.width || local.y >= size.height {
            return HitTarget::Background;
        }
        let x = local.x - PADDING;
        if (0.0..HANDLE_WIDTH).contains(&x) {
            return HitTarget::DragHandle;
        }
        let cell = ((x - HANDLE_WIDTH) / CELL_WIDTH).floor();
        if cell >= 0.0 {
            if let Some(item) = self.items.get(cell as usize) {
                return HitTarget::Tool(item.id.clone());
            }
        }
        HitTarget::Background
    }
}

/// Persisted position record
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct ToolbarPosition {
    x: f64,
    y: f64,
}

/// Floating toolbar state, rendered through an overlay host
pub struct FloatingToolbar<H: OverlayHost> {
    store: SharedStore,
    host: H,
    palette: Palette,
    catalog: ToolCatalog,
    favorites: Vec<String>,
    active_tool: Option<String>,
    projection: FavoritesProjection,
    position: Point,
    drag: Option<DragTracker>,
    hovered_tool: Option<String>,
    event_tx: Sender<ToolbarEvent>,
}

impl<H: OverlayHost> FloatingToolbar<H> {
    /// Create a toolbar at its saved position, or the default one
    pub fn new(store: SharedStore, host: H, palette: Palette, event_tx: Sender<ToolbarEvent>) -> Self {
        let position = load_position(&store, host.viewport());
        Self {
            store,
            host,
            palette,
            catalog: ToolCatalog::new(Vec::new()),
            favorites: Vec::new(),
            active_tool: None,
            projection: FavoritesProjection::new(),
            position,
            drag: None,
            hovered_tool: None,
            event_tx,
        }
    }

    pub fn set_catalog(&mut self, catalog: ToolCatalog) {
        for group in catalog.groups() {
            tracing::debug!("Tool group {}: {} tools", group.name, group.items.len());
        }
        self.catalog = catalog;
    }

    pub fn set_favorites(&mut self, favorites: Vec<String>) {
        self.favorites = favorites;
    }

    pub fn set_active_tool(&mut self, tool_id: Option<String>) {
        self.active_tool = tool_id;
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Favorite tools found in the catalog, in favorites order
    pub fn favorite_tools(&mut self) -> &[ToolDescriptor] {
        self.projection.resolve(&self.favorites, &self.catalog)
    }

    /// Current render output; `None` while there are no favorites
    pub fn view(&mut self) -> Option<ToolbarView> {
        if self.favorites.is_empty() {
            return None;
        }

        let active = self.active_tool.clone();
        let hovered = self.hovered_tool.clone();
        let items = self
            .favorite_tools()
            .iter()
            .map(|tool| ToolbarItem {
                id: tool.id.clone(),
                icon: tool.icon.clone(),
                label: tool.label.clone(),
                active: active.as_deref() == Some(tool.id.as_str()),
                show_tooltip: hovered.as_deref() == Some(tool.id.as_str()),
            })
            .collect();

        Some(ToolbarView {
            position: self.position,
            cursor: if self.is_dragging() {
                Cursor::Grabbing
            } else {
                Cursor::Default
            },
            palette: self.palette,
            items,
        })
    }

    /// Push the current view to the overlay host
    pub fn render(&mut self) {
        let view = self.view();
        self.host.present(view.as_ref());
    }

    /// Apply one input from the overlay host and re-render
    pub fn handle(&mut self, input: OverlayInput) {
        match input {
            OverlayInput::PointerDown { point, target } => {
                self.pointer_down(point, &target);
            }
            OverlayInput::PointerMove { point } => self.pointer_move(point),
            OverlayInput::PointerUp => self.pointer_up(),
            OverlayInput::PointerEnter { tool_id } => self.pointer_enter(&tool_id),
            OverlayInput::PointerLeave => self.pointer_leave(),
            OverlayInput::Click { tool_id } => self.click(&tool_id),
        }
        self.render();
    }

    /// Start a drag if the pointer went down on the grip. Returns whether a
    /// drag started.
    pub fn pointer_down(&mut self, point: Point, target: &HitTarget) -> bool {
        if *target != HitTarget::DragHandle || self.drag.is_some() {
            return false;
        }
        self.drag = Some(DragTracker::start(point, self.position));
        self.host.capture_pointer();
        tracing::debug!("Toolbar drag started at ({:.0}, {:.0})", point.x, point.y);
        true
    }

    pub fn pointer_move(&mut self, point: Point) {
        let Some(drag) = self.drag else {
            return;
        };
        let size = self.host.measured_size().unwrap_or(DEFAULT_SIZE);
        self.position = drag.follow(point, size, self.host.viewport());
    }

    /// Finish a drag and persist the final position
    pub fn pointer_up(&mut self) {
        if self.drag.take().is_none() {
            return;
        }
        self.host.release_pointer();
        let size = self.host.measured_size().unwrap_or(DEFAULT_SIZE);
        self.position = clamp_to_viewport(self.position, size, self.host.viewport());
        self.save_position();
    }

    pub fn pointer_enter(&mut self, tool_id: &str) {
        self.hovered_tool = Some(tool_id.to_string());
    }

    pub fn pointer_leave(&mut self) {
        self.hovered_tool = None;
    }

    pub fn click(&mut self, tool_id: &str) {
        tracing::debug!("Toolbar tool selected: {}", tool_id);
        let _ = self.event_tx.send(ToolbarEvent::ToolSelected(tool_id.to_string()));
    }

    fn save_position(&self) {
        let record = ToolbarPosition {
            x: self.position.x,
            y: self.position.y,
        };
        let result = serde_json::to_string(&record)
            .map_err(|e| e.to_string())
            .and_then(|json| {
                self.store
                    .set(keys::FLOATING_TOOLBAR_POS, &json)
                    .map_err(|e| e.to_string())
            });
        match result {
            Ok(()) => tracing::debug!("Toolbar position saved: ({:.0}, {:.0})", record.x, record.y),
            Err(e) => tracing::warn!("Could not save toolbar position: {}", e),
        }
    }
}

impl<H: OverlayHost> Drop for FloatingToolbar<H> {
    fn drop(&mut self) {
        if self.drag.take().is_some() {
            self.host.release_pointer();
        }
    }
}

fn load_position(store: &SharedStore, viewport: Size) -> Point {
    let default = Point::new(viewport.width - DEFAULT_RIGHT_INSET, DEFAULT_TOP);
    let Some(saved) = store.get(keys::FLOATING_TOOLBAR_POS) else {
        return default;
    };
    match serde_json::from_str::<ToolbarPosition>(&saved) {
        Ok(pos) => Point::new(pos.x, pos.y),
        Err(e) => {
            tracing::warn!("Ignoring saved toolbar position {:?}: {}", saved, e);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business::default_catalog;
    use crate::data::{KeyValueStore, MemoryStore};
    use crate::ui::overlay::HeadlessOverlay;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc::{channel, Receiver};
    use std::sync::Arc;

    const VIEWPORT: Size = Size::new(1600.0, 900.0);

    fn toolbar(
        store: Arc<MemoryStore>,
        favorites: &[&str],
    ) -> (FloatingToolbar<HeadlessOverlay>, Receiver<ToolbarEvent>) {
        let (tx, rx) = channel();
        let mut toolbar =
            FloatingToolbar::new(store, HeadlessOverlay::new(VIEWPORT), Palette::DARK, tx);
        toolbar.set_catalog(default_catalog());
        toolbar.set_favorites(favorites.iter().map(|s| s.to_string()).collect());
        (toolbar, rx)
    }

    fn saved_position(store: &MemoryStore) -> Option<(f64, f64)> {
        let json = store.get(keys::FLOATING_TOOLBAR_POS)?;
        let value: serde_json::Value = serde_json::from_str(&json).ok()?;
        Some((value["x"].as_f64()?, value["y"].as_f64()?))
    }

    #[test]
    fn renders_nothing_without_favorites() {
        let (mut toolbar, _rx) = toolbar(Arc::new(MemoryStore::new()), &[]);
        assert!(toolbar.view().is_none());
        toolbar.render();
        assert!(toolbar.host().presented().is_none());
        assert_eq!(toolbar.host().present_count(), 1);
    }

    #[test]
    fn renders_one_icon_per_known_favorite_in_order() {
        let (mut toolbar, _rx) =
            toolbar(Arc::new(MemoryStore::new()), &["rectangle", "ghost", "trendline"]);
        toolbar.set_active_tool(Some("trendline".to_string()));

        let view = toolbar.view().unwrap();
        let ids: Vec<&str> = view.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["rectangle", "trendline"]);
        assert!(!view.items[0].active);
        assert!(view.items[1].active);
    }

    #[test]
    fn unknown_favorites_still_show_an_empty_toolbar() {
        let (mut toolbar, _rx) = toolbar(Arc::new(MemoryStore::new()), &["ghost"]);
        let view = toolbar.view().unwrap();
        assert!(view.items.is_empty());
    }

    #[test]
    fn default_position_is_right_of_viewport() {
        let (toolbar, _rx) = toolbar(Arc::new(MemoryStore::new()), &["text"]);
        assert_eq!(toolbar.position(), Point::new(800.0, 100.0));
    }

    #[test]
    fn restores_saved_position_and_ignores_garbage() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::FLOATING_TOOLBAR_POS, r#"{"x":42,"y":7}"#).unwrap();
        let (toolbar_a, _rx) = toolbar(store.clone(), &["text"]);
        assert_eq!(toolbar_a.position(), Point::new(42.0, 7.0));

        store.set(keys::FLOATING_TOOLBAR_POS, "{broken").unwrap();
        let (toolbar_b, _rx) = toolbar(store, &["text"]);
        assert_eq!(toolbar_b.position(), Point::new(800.0, 100.0));
    }

    #[test]
    fn drag_moves_clamps_and_persists_on_release() {
        let store = Arc::new(MemoryStore::new());
        let (mut toolbar, _rx) = toolbar(store.clone(), &["text"]);

        // Grab the grip 10px right and 20px down from the top-left corner
        toolbar.handle(OverlayInput::PointerDown {
            point: Point::new(810.0, 120.0),
            target: HitTarget::DragHandle,
        });
        assert!(toolbar.is_dragging());
        assert!(toolbar.host().is_captured());
        assert_eq!(toolbar.view().unwrap().cursor, Cursor::Grabbing);

        toolbar.handle(OverlayInput::PointerMove {
            point: Point::new(310.0, 220.0),
        });
        assert_eq!(toolbar.position(), Point::new(300.0, 200.0));
        assert_eq!(saved_position(&store), None);

        toolbar.handle(OverlayInput::PointerMove {
            point: Point::new(5000.0, -300.0),
        });
        toolbar.handle(OverlayInput::PointerUp);

        // One tool: 4 + 20 + 40 + 4 = 68 wide, 48 high
        let size = toolbar.view().unwrap().size();
        assert_eq!(size, Size::new(68.0, 48.0));
        assert_eq!(toolbar.position(), Point::new(1600.0 - 68.0, 0.0));
        assert_eq!(saved_position(&store), Some((1532.0, 0.0)));
        assert!(!toolbar.is_dragging());
        assert!(!toolbar.host().is_captured());
    }

    #[test]
    fn release_position_is_within_viewport() {
        let store = Arc::new(MemoryStore::new());
        let (mut toolbar, _rx) = toolbar(store.clone(), &["text", "ray", "circle"]);
        toolbar.render();
        let size = toolbar.host().measured_size().unwrap();

        for (px, py) in [(-90.0, 40.0), (3000.0, 3000.0), (700.0, 450.0), (1599.0, 899.0)] {
            let start = toolbar.position();
            toolbar.handle(OverlayInput::PointerDown {
                point: Point::new(start.x + 5.0, start.y + 5.0),
                target: HitTarget::DragHandle,
            });
            toolbar.handle(OverlayInput::PointerMove {
                point: Point::new(px, py),
            });
            toolbar.handle(OverlayInput::PointerUp);

            let (x, y) = saved_position(&store).unwrap();
            assert!(x >= 0.0 && x <= VIEWPORT.width - size.width, "x = {x}");
            assert!(y >= 0.0 && y <= VIEWPORT.height - size.height, "y = {y}");
        }
    }

    #[test]
    fn release_without_move_pulls_toolbar_into_small_viewport() {
        let store = Arc::new(MemoryStore::new());
        let (tx, _rx) = channel();
        let mut toolbar = FloatingToolbar::new(
            store.clone(),
            HeadlessOverlay::new(Size::new(600.0, 400.0)),
            Palette::DARK,
            tx,
        );
        toolbar.set_catalog(default_catalog());
        toolbar.set_favorites(vec!["text".to_string()]);
        toolbar.render();
        assert_eq!(toolbar.position(), Point::new(-200.0, 100.0));

        let start = toolbar.position();
        toolbar.handle(OverlayInput::PointerDown {
            point: Point::new(start.x + 5.0, start.y + 5.0),
            target: HitTarget::DragHandle,
        });
        toolbar.handle(OverlayInput::PointerUp);

        assert_eq!(toolbar.position(), Point::new(0.0, 100.0));
        assert_eq!(saved_position(&store), Some((0.0, 100.0)));
    }

    #[test]
    fn unmeasured_toolbar_clamps_with_default_size() {
        let (mut toolbar, _rx) = toolbar(Arc::new(MemoryStore::new()), &["text"]);
        let start = toolbar.position();
        toolbar.pointer_down(start, &HitTarget::DragHandle);
        toolbar.pointer_move(Point::new(10_000.0, 10_000.0));
        assert_eq!(
            toolbar.position(),
            Point::new(VIEWPORT.width - DEFAULT_SIZE.width, VIEWPORT.height - DEFAULT_SIZE.height)
        );
    }

    #[test]
    fn only_the_grip_starts_a_drag() {
        let (mut toolbar, _rx) = toolbar(Arc::new(MemoryStore::new()), &["text"]);
        let start = toolbar.position();
        assert!(!toolbar.pointer_down(start, &HitTarget::Tool("text".to_string())));
        assert!(!toolbar.pointer_down(start, &HitTarget::Background));
        toolbar.pointer_move(Point::new(0.0, 0.0));
        assert_eq!(toolbar.position(), start);
        assert!(!toolbar.host().is_captured());
    }

    /// Host that reports capture state through a shared flag
    struct ProbeHost {
        inner: HeadlessOverlay,
        captured: Arc<AtomicBool>,
    }

    impl OverlayHost for ProbeHost {
        fn viewport(&self) -> Size {
            self.inner.viewport()
        }
        fn measured_size(&self) -> Option<Size> {
            self.inner.measured_size()
        }
        fn capture_pointer(&mut self) {
            self.captured.store(true, Ordering::SeqCst);
        }
        fn release_pointer(&mut self) {
            self.captured.store(false, Ordering::SeqCst);
        }
        fn present(&mut self, view: Option<&ToolbarView>) {
            self.inner.present(view);
        }
    }

    #[test]
    fn dropping_mid_drag_releases_capture() {
        let store = Arc::new(MemoryStore::new());
        let captured = Arc::new(AtomicBool::new(false));
        let host = ProbeHost {
            inner: HeadlessOverlay::new(VIEWPORT),
            captured: captured.clone(),
        };
        let (tx, _rx) = channel();
        let mut toolbar = FloatingToolbar::new(store.clone(), host, Palette::DARK, tx);
        toolbar.set_favorites(vec!["text".to_string()]);

        let start = toolbar.position();
        toolbar.pointer_down(start, &HitTarget::DragHandle);
        assert!(captured.load(Ordering::SeqCst));

        drop(toolbar);
        assert!(!captured.load(Ordering::SeqCst));
        assert_eq!(saved_position(&store), None);
    }

    #[test]
    fn hover_shows_tooltip_and_click_emits_event() {
        let (mut toolbar, rx) = toolbar(Arc::new(MemoryStore::new()), &["text", "ray"]);

        toolbar.handle(OverlayInput::PointerEnter {
            tool_id: "ray".to_string(),
        });
        let view = toolbar.view().unwrap();
        assert!(!view.items[0].show_tooltip);
        assert!(view.items[1].show_tooltip);
        assert_eq!(view.items[1].label, "Ray");

        toolbar.handle(OverlayInput::PointerLeave);
        assert!(toolbar.view().unwrap().items.iter().all(|i| !i.show_tooltip));

        toolbar.handle(OverlayInput::Click {
            tool_id: "text".to_string(),
        });
        assert_eq!(rx.try_recv().unwrap(), ToolbarEvent::ToolSelected("text".to_string()));
    }

    #[test]
    fn projection_is_reused_across_renders() {
        let (mut toolbar, _rx) = toolbar(Arc::new(MemoryStore::new()), &["text", "ray"]);
        toolbar.render();
        toolbar.handle(OverlayInput::PointerEnter {
            tool_id: "ray".to_string(),
        });
        toolbar.handle(OverlayInput::PointerLeave);
        assert_eq!(toolbar.projection.computations(), 1);

        toolbar.set_favorites(vec!["ray".to_string()]);
        toolbar.render();
        assert_eq!(toolbar.projection.computations(), 2);
    }

    #[test]
    fn hit_test_maps_grip_and_cells() {
        let (mut toolbar, _rx) = toolbar(Arc::new(MemoryStore::new()), &["text", "ray"]);
        let view = toolbar.view().unwrap();
        assert_eq!(view.hit_test(Point::new(10.0, 10.0)), HitTarget::DragHandle);
        assert_eq!(view.hit_test(Point::new(30.0, 10.0)), HitTarget::Tool("text".to_string()));
        assert_eq!(view.hit_test(Point::new(70.0, 10.0)), HitTarget::Tool("ray".to_string()));
        assert_eq!(view.hit_test(Point::new(2.0, 10.0)), HitTarget::Background);
        assert_eq!(view.hit_test(Point::new(500.0, 10.0)), HitTarget::Background);
    }
}
