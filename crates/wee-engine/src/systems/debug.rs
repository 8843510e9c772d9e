//! Debug overlay: hitbox outlines and position markers.
//!
//! Enabled with `Game::set_debug(true)`; drawn by the stage after every
//! entity has rendered, so it sits on top of the frame.

use glam::Vec2;

use crate::components::entity::Entity;
use crate::core::collision::Rect;
use crate::renderer::traits::Surface;

/// Side of the square marking an entity's raw position.
pub const MARKER_SIZE: f32 = 2.0;

/// Outline every entity's hitbox and mark its position, in its `hitbox_color`.
pub fn draw_hitboxes(surface: &mut dyn Surface, entities: &[Entity]) {
    for entity in entities {
        surface.stroke_rect(entity.hit_rect(Vec2::ZERO), entity.hitbox_color);
        let half = Vec2::splat(MARKER_SIZE / 2.0);
        surface.fill_rect(
            Rect::from_min_size(entity.pos - half, Vec2::splat(MARKER_SIZE)),
            entity.hitbox_color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Color;
    use crate::renderer::draw_list::{DrawCommand, DrawList};

    #[test]
    fn empty_hitbox_still_gets_a_marker() {
        let mut list = DrawList::new(50.0, 50.0);
        draw_hitboxes(&mut list, &[Entity::new(5.0, 5.0)]);
        assert_eq!(
            list.commands(),
            &[
                DrawCommand::StrokeRect {
                    rect: Rect::new(5.0, 5.0, 0.0, 0.0),
                    color: Color::WHITE
                },
                DrawCommand::FillRect {
                    rect: Rect::new(4.0, 4.0, 2.0, 2.0),
                    color: Color::WHITE
                },
            ]
        );
    }
}
