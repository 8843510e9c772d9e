use glam::Vec2;

use crate::api::types::Color;
use crate::assets::bitmap::Bitmap;
use crate::core::collision::Rect;
use crate::renderer::traits::Surface;

/// One recorded drawing operation.
/// Bitmaps are referenced by ID; the list never holds pixel data.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillRect { rect: Rect, color: Color },
    StrokeRect { rect: Rect, color: Color },
    DrawBitmap { bitmap: u64, at: Vec2 },
    FillPattern { bitmap: u64, rect: Rect },
    Save,
    Restore,
    Translate(Vec2),
    Rotate(f32),
    SetAlpha(f32),
}

/// Surface that records every call instead of rasterizing.
///
/// Used by tests to assert what a frame drew, and by hosts that replay the
/// commands into their own renderer.
pub struct DrawList {
    size: Vec2,
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            commands: Vec::with_capacity(256),
        }
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Take the recorded commands, leaving the list empty.
    pub fn drain(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// IDs of bitmaps drawn or tiled, in draw order.
    pub fn bitmaps_drawn(&self) -> Vec<u64> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::DrawBitmap { bitmap, .. } | DrawCommand::FillPattern { bitmap, .. } => {
                    Some(*bitmap)
                }
                _ => None,
            })
            .collect()
    }
}

impl Surface for DrawList {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::StrokeRect { rect, color });
    }

    fn draw_bitmap(&mut self, bitmap: &Bitmap, at: Vec2) {
        self.commands.push(DrawCommand::DrawBitmap {
            bitmap: bitmap.id(),
            at,
        });
    }

    fn fill_pattern(&mut self, bitmap: &Bitmap, rect: Rect) {
        self.commands.push(DrawCommand::FillPattern {
            bitmap: bitmap.id(),
            rect,
        });
    }

    fn save(&mut self) {
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.commands.push(DrawCommand::Restore);
    }

    fn translate(&mut self, by: Vec2) {
        self.commands.push(DrawCommand::Translate(by));
    }

    fn rotate(&mut self, radians: f32) {
        self.commands.push(DrawCommand::Rotate(radians));
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.commands.push(DrawCommand::SetAlpha(alpha));
    }
}
