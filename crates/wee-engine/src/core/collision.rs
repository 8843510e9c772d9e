//! Axis-aligned rectangles and entity hitboxes.

use glam::Vec2;

/// Axis-aligned rectangle: top-left corner plus extent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    pub fn from_min_size(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    /// A rectangle with zero (or negative) width or height.
    pub fn is_degenerate(&self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Overlap test, inclusive on all four edges.
    /// Degenerate rectangles never intersect anything.
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_degenerate() || other.is_degenerate() {
            return false;
        }
        let (a_min, a_max) = (self.min, self.max());
        let (b_min, b_max) = (other.min, other.max());
        a_min.x <= b_max.x && b_min.x <= a_max.x && a_min.y <= b_max.y && b_min.y <= a_max.y
    }

    pub fn translated(&self, by: Vec2) -> Rect {
        Rect {
            min: self.min + by,
            size: self.size,
        }
    }
}

/// Collision box relative to an entity's position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hitbox {
    /// Offset of the box's top-left corner from the entity position.
    pub origin: Vec2,
    pub size: Vec2,
}

impl Hitbox {
    pub fn new(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    /// World-space rectangle for an entity standing at `pos`.
    pub fn rect_at(&self, pos: Vec2) -> Rect {
        Rect::from_min_size(pos + self.origin, self.size)
    }
}
