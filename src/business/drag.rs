//! Drag Tracking
//!
//! Pointer-offset drag arithmetic for overlays, with viewport clamping.

use serde::{Deserialize, Serialize};

/// A point in viewport pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Keep a box of `size` at `origin` inside `viewport`.
///
/// Each axis is limited to `[0, viewport - size]`; when the box is larger than
/// the viewport the axis pins to 0.
pub fn clamp_to_viewport(origin: Point, size: Size, viewport: Size) -> Point {
    let max_x = viewport.width - size.width;
    let max_y = viewport.height - size.height;
    Point {
        x: origin.x.min(max_x).max(0.0),
        y: origin.y.min(max_y).max(0.0),
    }
}

/// An active drag: the pointer's offset from the dragged box's top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragTracker {
    offset: Point,
}

impl DragTracker {
    /// Start dragging a box whose top-left corner is at `origin`
    pub fn start(pointer: Point, origin: Point) -> Self {
        Self {
            offset: Point::new(pointer.x - origin.x, pointer.y - origin.y),
        }
    }

    /// Position of the box for the current pointer location
    pub fn follow(&self, pointer: Point, size: Size, viewport: Size) -> Point {
        let origin = Point::new(pointer.x - self.offset.x, pointer.y - self.offset.y);
        clamp_to_viewport(origin, size, viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Size = Size::new(1280.0, 720.0);
    const BOX: Size = Size::new(200.0, 50.0);

    #[test]
    fn follows_pointer_keeping_grab_offset() {
        let drag = DragTracker::start(Point::new(110.0, 105.0), Point::new(100.0, 100.0));
        assert_eq!(drag.follow(Point::new(510.0, 305.0), BOX, VIEWPORT), Point::new(500.0, 300.0));
    }

    #[test]
    fn clamps_every_edge() {
        let drag = DragTracker::start(Point::new(10.0, 10.0), Point::new(0.0, 0.0));
        assert_eq!(drag.follow(Point::new(-50.0, -50.0), BOX, VIEWPORT), Point::new(0.0, 0.0));
        assert_eq!(
            drag.follow(Point::new(5000.0, 5000.0), BOX, VIEWPORT),
            Point::new(1080.0, 670.0)
        );
    }

    #[test]
    fn stays_inside_viewport_for_any_pointer() {
        let drag = DragTracker::start(Point::new(30.0, 20.0), Point::new(0.0, 0.0));
        let mut pointer = Point::new(-400.0, -300.0);
        while pointer.x < 2000.0 {
            let p = drag.follow(pointer, BOX, VIEWPORT);
            assert!(p.x >= 0.0 && p.x <= VIEWPORT.width - BOX.width, "{p:?}");
            assert!(p.y >= 0.0 && p.y <= VIEWPORT.height - BOX.height, "{p:?}");
            pointer.x += 37.5;
            pointer.y += 21.25;
        }
    }

    #[test]
    fn oversized_box_pins_to_origin() {
        let small = Size::new(150.0, 40.0);
        assert_eq!(
            clamp_to_viewport(Point::new(80.0, 10.0), BOX, small),
            Point::new(0.0, 0.0)
        );
    }
}
