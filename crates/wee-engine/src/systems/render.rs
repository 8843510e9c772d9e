//! Sprite frame drawing: placement, pivot rotation, alpha and tiling.

use glam::Vec2;

use crate::assets::bitmap::Bitmap;
use crate::core::collision::Rect;
use crate::renderer::traits::Surface;

/// Where and how to draw one sprite frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// World position of the pivot point (entity position + sprite offset).
    pub position: Vec2,
    /// Pivot, relative to the frame's top-left corner.
    pub pivot: Vec2,
    /// Clockwise rotation about the pivot, in degrees.
    pub rotation: f32,
    /// Opacity, 0.0..=1.0.
    pub alpha: f32,
    /// Tile the frame across this size instead of drawing it once.
    pub fill: Option<Vec2>,
}

impl Placement {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            pivot: Vec2::ZERO,
            rotation: 0.0,
            alpha: 1.0,
            fill: None,
        }
    }
}

/// Draw `frame` at `placement`.
///
/// The plain case is a single blit at `position - pivot`. Rotation or
/// translucency wrap the draw in save/translate/rotate/alpha/restore so the
/// frame turns about its pivot. A fill size different from the frame's own
/// size tiles the frame as a pattern over that area.
pub fn draw_frame(surface: &mut dyn Surface, frame: &Bitmap, placement: &Placement) {
    let native = Vec2::new(frame.width() as f32, frame.height() as f32);
    let tiled = placement.fill.filter(|size| *size != native);
    let rotated = placement.rotation != 0.0;
    let faded = placement.alpha != 1.0;

    if !rotated && !faded {
        blit(surface, frame, placement.position - placement.pivot, tiled);
        return;
    }

    surface.save();
    surface.translate(placement.position);
    if rotated {
        surface.rotate(placement.rotation.to_radians());
    }
    if faded {
        surface.set_alpha(placement.alpha.clamp(0.0, 1.0));
    }
    blit(surface, frame, -placement.pivot, tiled);
    surface.restore();
}

fn blit(surface: &mut dyn Surface, frame: &Bitmap, top_left: Vec2, tiled: Option<Vec2>) {
    match tiled {
        Some(size) => surface.fill_pattern(frame, Rect::from_min_size(top_left, size)),
        None => surface.draw_bitmap(frame, top_left),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Color;
    use crate::renderer::draw_list::{DrawCommand, DrawList};

    fn frame() -> Bitmap {
        Bitmap::filled(16, 16, Color::WHITE)
    }

    #[test]
    fn plain_draw_subtracts_pivot() {
        let f = frame();
        let mut list = DrawList::new(100.0, 100.0);
        let mut p = Placement::at(Vec2::new(50.0, 40.0));
        p.pivot = Vec2::new(8.0, 16.0);
        draw_frame(&mut list, &f, &p);
        assert_eq!(
            list.commands(),
            &[DrawCommand::DrawBitmap {
                bitmap: f.id(),
                at: Vec2::new(42.0, 24.0)
            }]
        );
    }

    #[test]
    fn rotation_and_alpha_use_transform_stack() {
        let f = frame();
        let mut list = DrawList::new(100.0, 100.0);
        let p = Placement {
            position: Vec2::new(10.0, 10.0),
            pivot: Vec2::new(8.0, 8.0),
            rotation: 90.0,
            alpha: 0.5,
            fill: None,
        };
        draw_frame(&mut list, &f, &p);
        assert_eq!(
            list.commands(),
            &[
                DrawCommand::Save,
                DrawCommand::Translate(Vec2::new(10.0, 10.0)),
                DrawCommand::Rotate(90f32.to_radians()),
                DrawCommand::SetAlpha(0.5),
                DrawCommand::DrawBitmap {
                    bitmap: f.id(),
                    at: Vec2::new(-8.0, -8.0)
                },
                DrawCommand::Restore,
            ]
        );
    }

    #[test]
    fn fill_tiles_pattern_when_size_differs() {
        let f = frame();
        let mut list = DrawList::new(100.0, 100.0);
        let mut p = Placement::at(Vec2::new(0.0, 80.0));
        p.fill = Some(Vec2::new(100.0, 16.0));
        draw_frame(&mut list, &f, &p);
        assert_eq!(
            list.commands(),
            &[DrawCommand::FillPattern {
                bitmap: f.id(),
                rect: Rect::new(0.0, 80.0, 100.0, 16.0)
            }]
        );
    }

    #[test]
    fn fill_equal_to_native_size_draws_once() {
        let f = frame();
        let mut list = DrawList::new(100.0, 100.0);
        let mut p = Placement::at(Vec2::ZERO);
        p.fill = Some(Vec2::new(16.0, 16.0));
        draw_frame(&mut list, &f, &p);
        assert!(matches!(list.commands()[0], DrawCommand::DrawBitmap { .. }));
    }
}
