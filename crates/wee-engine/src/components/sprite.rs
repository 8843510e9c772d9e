use std::rc::Rc;

use glam::Vec2;

use crate::api::types::EntityId;
use crate::assets::bitmap::Bitmap;
use crate::assets::registry::AssetRegistry;
use crate::components::animation::Animation;
use crate::error::AssetError;
use crate::renderer::traits::Surface;
use crate::systems::render::{draw_frame, Placement};

/// Region of the source image a sprite is cut from.
/// `None` extents run to the image's right/bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Crop {
    pub x: u32,
    pub y: u32,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Animated slice of a sprite sheet.
///
/// A sprite is built in two phases. Construction only records which asset
/// and which region to use. [`Sprite::finish_loading`] slices the decoded
/// source into frames once it is in the [`AssetRegistry`]; until then
/// rendering draws nothing. When a sprite is rendered before its frames
/// exist, it finishes loading on its own as soon as the asset arrives.
#[derive(Debug, Clone)]
pub struct Sprite {
    asset: String,
    frame_width: Option<u32>,
    frame_height: Option<u32>,
    crop: Crop,
    frames: Rc<[Bitmap]>,
    ready: bool,
    animation: Animation,
    /// Offset of the pivot point from the owning entity's position.
    pub offset: Vec2,
    /// Pivot, relative to the frame's top-left corner.
    pub pivot: Vec2,
    /// Clockwise rotation about the pivot, in degrees.
    pub rotation: f32,
    /// Opacity, 0.0..=1.0.
    pub alpha: f32,
    /// Tile the frame over this area instead of drawing it once.
    pub fill: Option<Vec2>,
    pub visible: bool,
    entity: Option<EntityId>,
}

impl Sprite {
    /// Sheet of `frame_width x frame_height` frames cut from `asset`.
    pub fn new(asset: impl Into<String>, frame_width: u32, frame_height: u32) -> Self {
        let mut sprite = Self::whole(asset);
        sprite.frame_width = Some(frame_width);
        sprite.frame_height = Some(frame_height);
        sprite
    }

    /// A single frame covering the whole (cropped) image.
    pub fn whole(asset: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            frame_width: None,
            frame_height: None,
            crop: Crop::default(),
            frames: Rc::from(Vec::new()),
            ready: false,
            animation: Animation::default(),
            offset: Vec2::ZERO,
            pivot: Vec2::ZERO,
            rotation: 0.0,
            alpha: 1.0,
            fill: None,
            visible: true,
            entity: None,
        }
    }

    // -- Builder pattern --

    /// Frame size per axis; `None` spans the whole cropped region on that
    /// axis, so `(Some(16), None)` cuts a horizontal strip.
    pub fn with_frame_size(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.frame_width = width;
        self.frame_height = height;
        self
    }

    pub fn with_crop(mut self, crop: Crop) -> Self {
        self.crop = crop;
        self
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_pivot(mut self, pivot: Vec2) -> Self {
        self.pivot = pivot;
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_fill(mut self, size: Vec2) -> Self {
        self.fill = Some(size);
        self
    }

    /// Take this sprite's frames from `registry`, which slices the source
    /// on first use of a given cut. Returns the frame count.
    ///
    /// Fails with `MissingAsset` while the source is not in `registry`
    /// (the sprite stays unready and may be finished later) and with
    /// `EmptyCrop` if the crop region misses the image.
    pub fn finish_loading(&mut self, registry: &AssetRegistry) -> Result<usize, AssetError> {
        self.frames = registry.frames(&self.asset, self.crop, self.frame_width, self.frame_height)?;
        self.ready = true;
        self.animation.rewind();
        Ok(self.frames.len())
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[Bitmap] {
        &self.frames
    }

    /// Play `sequence` at `speed` frames per second.
    /// See [`Animation::play`] for when playback restarts.
    pub fn play(&mut self, sequence: &[usize], speed: f32, force: bool) -> bool {
        self.animation.play(sequence, speed, force)
    }

    pub fn animation(&self) -> &Animation {
        &self.animation
    }

    /// Sheet index of the frame currently showing.
    pub fn current_frame(&self) -> usize {
        self.animation.current_frame()
    }

    /// The bitmap currently showing, if frames are loaded and the index is in range.
    pub fn current_bitmap(&self) -> Option<&Bitmap> {
        self.frames.get(self.animation.current_frame())
    }

    /// The entity this sprite is attached to.
    pub fn entity(&self) -> Option<EntityId> {
        self.entity
    }

    pub(crate) fn set_entity(&mut self, entity: Option<EntityId>) {
        self.entity = entity;
    }

    /// Advance the animation by `delta` seconds and draw the current frame
    /// with its pivot at `at + offset`. Draws nothing until frames exist.
    pub fn render(&mut self, surface: &mut dyn Surface, at: Vec2, delta: f32, assets: &AssetRegistry) {
        if !self.ready {
            if !assets.contains(&self.asset) {
                return;
            }
            if let Err(e) = self.finish_loading(assets) {
                // keep the failure from being retried every frame
                log::warn!("{}", e);
                self.ready = true;
            }
        }

        self.animation.tick(delta);
        if !self.visible {
            return;
        }

        let Some(frame) = self.current_bitmap() else {
            log::trace!(
                "{}: frame {} out of range ({} frames)",
                self.asset,
                self.animation.current_frame(),
                self.frames.len()
            );
            return;
        };

        let placement = Placement {
            position: at + self.offset,
            pivot: self.pivot,
            rotation: self.rotation,
            alpha: self.alpha,
            fill: self.fill,
        };
        draw_frame(surface, frame, &placement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Color;
    use crate::assets::bitmap::tests::grid_sheet;
    use crate::renderer::draw_list::{DrawCommand, DrawList};

    fn registry_with_sheet() -> AssetRegistry {
        let reg = AssetRegistry::new();
        reg.insert("hero.png", grid_sheet(64, 32, 16));
        reg
    }

    #[test]
    fn finish_loading_slices_row_major() {
        let reg = registry_with_sheet();
        let mut sprite = Sprite::new("hero.png", 16, 16);
        assert!(!sprite.is_ready());
        assert_eq!(sprite.finish_loading(&reg).unwrap(), 8);
        assert!(sprite.is_ready());
        assert_eq!(sprite.frames()[4].pixel(0, 0), Some(Color::rgb(0, 1, 0)));
    }

    #[test]
    fn crop_limits_the_sliced_region() {
        let reg = registry_with_sheet();
        let mut sprite = Sprite::new("hero.png", 16, 16).with_crop(Crop {
            x: 16,
            y: 16,
            width: None,
            height: None,
        });
        assert_eq!(sprite.finish_loading(&reg).unwrap(), 3);

        let mut outside = Sprite::whole("hero.png").with_crop(Crop {
            x: 64,
            ..Crop::default()
        });
        assert!(matches!(
            outside.finish_loading(&reg),
            Err(AssetError::EmptyCrop { .. })
        ));
    }

    #[test]
    fn whole_sprite_is_one_frame() {
        let reg = registry_with_sheet();
        let mut sprite = Sprite::whole("hero.png");
        assert_eq!(sprite.finish_loading(&reg).unwrap(), 1);
        assert_eq!(sprite.frames()[0].width(), 64);
    }

    #[test]
    fn missing_asset_keeps_sprite_unready() {
        let reg = AssetRegistry::new();
        let mut sprite = Sprite::new("later.png", 8, 8);
        assert!(matches!(
            sprite.finish_loading(&reg),
            Err(AssetError::MissingAsset(_))
        ));
        assert!(!sprite.is_ready());
    }

    #[test]
    fn render_is_noop_until_asset_arrives_then_loads_lazily() {
        let reg = AssetRegistry::new();
        let mut list = DrawList::new(100.0, 100.0);
        let mut sprite = Sprite::new("hero.png", 16, 16);

        sprite.render(&mut list, Vec2::new(5.0, 5.0), 0.016, &reg);
        assert!(list.is_empty());

        reg.insert("hero.png", grid_sheet(64, 32, 16));
        sprite.render(&mut list, Vec2::new(5.0, 5.0), 0.016, &reg);
        assert!(sprite.is_ready());
        assert_eq!(
            list.commands(),
            &[DrawCommand::DrawBitmap {
                bitmap: sprite.frames()[0].id(),
                at: Vec2::new(5.0, 5.0)
            }]
        );
    }

    #[test]
    fn render_advances_animation_then_draws_current_frame() {
        let reg = registry_with_sheet();
        let mut list = DrawList::new(100.0, 100.0);
        let mut sprite = Sprite::new("hero.png", 16, 16).with_offset(Vec2::new(2.0, 3.0));
        sprite.finish_loading(&reg).unwrap();
        sprite.play(&[2, 0, 1], 2.0, false);

        sprite.render(&mut list, Vec2::ZERO, 0.25, &reg);
        assert_eq!(sprite.current_frame(), 2);
        sprite.render(&mut list, Vec2::ZERO, 0.25, &reg);
        assert_eq!(sprite.current_frame(), 0);

        let drawn = list.bitmaps_drawn();
        assert_eq!(drawn, vec![sprite.frames()[2].id(), sprite.frames()[0].id()]);
        assert!(matches!(
            list.commands()[1],
            DrawCommand::DrawBitmap { at, .. } if at == Vec2::new(2.0, 3.0)
        ));
    }

    #[test]
    fn sprites_of_one_sheet_draw_the_same_bitmaps() {
        let reg = registry_with_sheet();
        let mut list = DrawList::new(100.0, 100.0);
        let mut a = Sprite::new("hero.png", 16, 16);
        let mut b = Sprite::new("hero.png", 16, 16);
        a.play(&[3], 1.0, false);
        b.play(&[3], 1.0, false);

        a.render(&mut list, Vec2::ZERO, 0.0, &reg);
        b.render(&mut list, Vec2::new(20.0, 0.0), 0.0, &reg);
        let drawn = list.bitmaps_drawn();
        assert_eq!(drawn.len(), 2);
        assert_eq!(drawn[0], drawn[1]);
    }

    #[test]
    fn out_of_range_frame_draws_nothing() {
        let reg = registry_with_sheet();
        let mut list = DrawList::new(100.0, 100.0);
        let mut sprite = Sprite::new("hero.png", 16, 16);
        sprite.finish_loading(&reg).unwrap();
        sprite.play(&[42], 1.0, false);
        sprite.render(&mut list, Vec2::ZERO, 0.0, &reg);
        assert!(list.is_empty());
    }

    #[test]
    fn hidden_sprite_still_animates() {
        let reg = registry_with_sheet();
        let mut list = DrawList::new(100.0, 100.0);
        let mut sprite = Sprite::new("hero.png", 16, 16);
        sprite.finish_loading(&reg).unwrap();
        sprite.play(&[0, 1], 1.0, false);
        sprite.visible = false;
        sprite.render(&mut list, Vec2::ZERO, 1.0, &reg);
        assert!(list.is_empty());
        assert_eq!(sprite.current_frame(), 1);
    }
}
