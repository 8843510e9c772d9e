//! The drawing contract the engine renders into.
//!
//! The engine never talks to a canvas directly. Each host supplies a
//! [`Surface`]: the browser host wraps `CanvasRenderingContext2d`, tests use
//! the recording [`DrawList`](super::draw_list::DrawList). Any backend that
//! can fill, stroke and blit bitmaps under a save/restore transform stack is
//! interchangeable.

use glam::Vec2;

use crate::api::types::Color;
use crate::assets::bitmap::Bitmap;
use crate::core::collision::Rect;

/// A 2D draw target with a canvas-style transform stack.
///
/// Coordinates are in surface pixels, y pointing down. `translate`,
/// `rotate` and `set_alpha` affect subsequent calls until the matching
/// `restore`.
pub trait Surface {
    /// Width and height in pixels.
    fn size(&self) -> Vec2;

    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Outline a rectangle with a 1px line.
    fn stroke_rect(&mut self, rect: Rect, color: Color);

    /// Draw `bitmap` once with its top-left corner at `at`.
    fn draw_bitmap(&mut self, bitmap: &Bitmap, at: Vec2);

    /// Tile `bitmap` across `rect`, tiles anchored at the rect's top-left.
    fn fill_pattern(&mut self, bitmap: &Bitmap, rect: Rect);

    /// Push the current transform and alpha.
    fn save(&mut self);

    /// Pop back to the last `save`.
    fn restore(&mut self);

    fn translate(&mut self, by: Vec2);

    /// Rotate subsequent drawing by `radians`, clockwise on screen.
    fn rotate(&mut self, radians: f32);

    /// Global alpha (0.0..=1.0) for subsequent drawing.
    fn set_alpha(&mut self, alpha: f32);

    /// Paint the whole surface with `color`.
    fn clear(&mut self, color: Color) {
        let size = self.size();
        self.fill_rect(Rect::from_min_size(Vec2::ZERO, size), color);
    }
}
