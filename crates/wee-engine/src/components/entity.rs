use std::rc::Weak;

use glam::Vec2;

use crate::api::context::UpdateContext;
use crate::api::types::{Color, EntityId};
use crate::assets::registry::AssetRegistry;
use crate::components::sprite::Sprite;
use crate::core::collision::{Hitbox, Rect};
use crate::core::stage::StageLink;
use crate::renderer::traits::Surface;

/// Per-entity game logic, run once per tick before the entity's sprite
/// is drawn.
///
/// Any `FnMut(&mut UpdateContext)` closure is a behavior.
pub trait EntityBehavior {
    fn update(&mut self, ctx: &mut UpdateContext<'_>);
}

impl<F> EntityBehavior for F
where
    F: FnMut(&mut UpdateContext<'_>),
{
    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        self(ctx)
    }
}

/// A positioned, optionally collidable object that may own one sprite.
pub struct Entity {
    id: Option<EntityId>,
    /// Position in surface pixels.
    pub pos: Vec2,
    z: f32,
    /// Collision box relative to `pos`. Zero-sized boxes never collide.
    pub hitbox: Hitbox,
    /// Collision group tag matched by `collide` queries.
    pub group: String,
    /// Outline color in debug mode.
    pub hitbox_color: Color,
    sprite: Option<Sprite>,
    behavior: Option<Box<dyn EntityBehavior>>,
    stage: Weak<StageLink>,
}

impl Entity {
    /// Create an entity at (x, y) with no sprite and an empty hitbox.
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            id: None,
            pos: Vec2::new(x, y),
            z: 0.0,
            hitbox: Hitbox::default(),
            group: String::new(),
            hitbox_color: Color::WHITE,
            sprite: None,
            behavior: None,
            stage: Weak::new(),
        }
    }

    // -- Builder pattern --

    pub fn with_pos(mut self, pos: Vec2) -> Self {
        self.pos = pos;
        self
    }

    pub fn with_z(mut self, z: f32) -> Self {
        self.set_z(z);
        self
    }

    pub fn with_hitbox(mut self, origin: Vec2, size: Vec2) -> Self {
        self.hitbox = Hitbox::new(origin, size);
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn with_hitbox_color(mut self, color: Color) -> Self {
        self.hitbox_color = color;
        self
    }

    pub fn with_sprite(mut self, sprite: Sprite) -> Self {
        self.set_sprite(sprite);
        self
    }

    pub fn with_behavior(mut self, behavior: impl EntityBehavior + 'static) -> Self {
        self.behavior = Some(Box::new(behavior));
        self
    }

    /// Assigned by the stage on `add`; None while detached.
    pub fn id(&self) -> Option<EntityId> {
        self.id
    }

    pub fn z(&self) -> f32 {
        self.z
    }

    /// Set the draw/update order key. Marks the hosting stage for a
    /// re-sort at the start of its next tick.
    pub fn set_z(&mut self, z: f32) {
        self.z = z;
        if let Some(link) = self.stage.upgrade() {
            link.reorder_z();
        }
    }

    /// Whether the entity currently belongs to a live stage.
    pub fn is_attached(&self) -> bool {
        self.stage.strong_count() > 0
    }

    pub fn sprite(&self) -> Option<&Sprite> {
        self.sprite.as_ref()
    }

    pub fn sprite_mut(&mut self) -> Option<&mut Sprite> {
        self.sprite.as_mut()
    }

    /// Give this entity a sprite, replacing (and returning) any previous one.
    /// The sprite's back-reference is rebound to this entity.
    pub fn set_sprite(&mut self, mut sprite: Sprite) -> Option<Sprite> {
        sprite.set_entity(self.id);
        self.take_sprite_and(Some(sprite))
    }

    /// Remove the sprite, leaving the entity invisible.
    pub fn take_sprite(&mut self) -> Option<Sprite> {
        self.take_sprite_and(None)
    }

    fn take_sprite_and(&mut self, next: Option<Sprite>) -> Option<Sprite> {
        let mut previous = std::mem::replace(&mut self.sprite, next);
        if let Some(old) = previous.as_mut() {
            old.set_entity(None);
        }
        previous
    }

    pub fn set_behavior(&mut self, behavior: impl EntityBehavior + 'static) {
        self.behavior = Some(Box::new(behavior));
    }

    pub fn has_behavior(&self) -> bool {
        self.behavior.is_some()
    }

    /// World-space hitbox, optionally displaced by `offset`.
    pub fn hit_rect(&self, offset: Vec2) -> Rect {
        self.hitbox.rect_at(self.pos + offset)
    }

    /// AABB test against `other`, testing this entity as if moved by
    /// `offset` (for movement prediction). Touching edges collide.
    pub fn collide_with(&self, other: &Entity, offset: Vec2) -> bool {
        self.hit_rect(offset).intersects(&other.hit_rect(Vec2::ZERO))
    }

    pub(crate) fn attach(&mut self, id: EntityId, stage: Weak<StageLink>) {
        self.id = Some(id);
        self.stage = stage;
        if let Some(sprite) = self.sprite.as_mut() {
            sprite.set_entity(Some(id));
        }
    }

    pub(crate) fn detach(&mut self) {
        self.id = None;
        self.stage = Weak::new();
        if let Some(sprite) = self.sprite.as_mut() {
            sprite.set_entity(None);
        }
    }

    pub(crate) fn take_behavior(&mut self) -> Option<Box<dyn EntityBehavior>> {
        self.behavior.take()
    }

    /// Put a behavior back after its update, unless the update installed a new one.
    pub(crate) fn restore_behavior(&mut self, behavior: Box<dyn EntityBehavior>) {
        if self.behavior.is_none() {
            self.behavior = Some(behavior);
        }
    }

    pub(crate) fn render(&mut self, surface: &mut dyn Surface, delta: f32, assets: &AssetRegistry) {
        let pos = self.pos;
        if let Some(sprite) = self.sprite.as_mut() {
            sprite.render(surface, pos, delta, assets);
        }
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("pos", &self.pos)
            .field("z", &self.z)
            .field("hitbox", &self.hitbox)
            .field("group", &self.group)
            .field("sprite", &self.sprite.as_ref().map(Sprite::asset))
            .field("behavior", &self.behavior.is_some())
            .finish()
    }
}
