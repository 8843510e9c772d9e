//! Views handed to stage and entity logic during a tick.

use glam::Vec2;

use crate::api::types::EntityId;
use crate::assets::registry::AssetRegistry;
use crate::components::entity::Entity;
use crate::core::stage::{Commands, Stage, StageLink};
use crate::input::state::InputState;
use crate::renderer::traits::Surface;

/// Everything a stage needs from its host for one tick.
pub struct Frame<'a> {
    pub surface: &'a mut dyn Surface,
    pub input: &'a InputState,
    pub assets: &'a AssetRegistry,
    /// Seconds since the previous tick.
    pub delta: f32,
    /// Draw hitbox outlines after the entity pass.
    pub debug: bool,
    /// Set when logic asks for a different stage; the host swaps it in
    /// after this tick.
    pub next_stage: &'a mut Option<Stage>,
}

/// Passed to an [`EntityBehavior`](crate::components::entity::EntityBehavior)
/// for one update: the entity itself, read access to its siblings, and
/// deferred control over the stage.
pub struct UpdateContext<'a> {
    pub(crate) me: &'a mut Entity,
    pub(crate) before: &'a [Entity],
    pub(crate) after: &'a [Entity],
    pub(crate) input: &'a InputState,
    pub(crate) assets: &'a AssetRegistry,
    pub(crate) delta: f32,
    pub(crate) link: &'a StageLink,
    pub(crate) commands: &'a mut Commands,
    pub(crate) next_stage: &'a mut Option<Stage>,
}

impl<'a> UpdateContext<'a> {
    /// The entity being updated.
    pub fn entity(&self) -> &Entity {
        &*self.me
    }

    pub fn entity_mut(&mut self) -> &mut Entity {
        &mut *self.me
    }

    pub fn id(&self) -> Option<EntityId> {
        self.me.id()
    }

    /// Seconds since the previous tick.
    pub fn delta(&self) -> f32 {
        self.delta
    }

    pub fn input(&self) -> &InputState {
        self.input
    }

    pub fn assets(&self) -> &AssetRegistry {
        self.assets
    }

    /// Every other entity on the stage, in stage order.
    pub fn others(&self) -> impl Iterator<Item = &Entity> {
        self.before.iter().chain(self.after.iter())
    }

    /// Look up an entity by ID (including this one).
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        if self.me.id() == Some(id) {
            return Some(&*self.me);
        }
        self.others().find(|e| e.id() == Some(id))
    }

    /// Siblings in `group` this entity would touch if moved by `offset`.
    /// Nothing moves; pass `Vec2::ZERO` to test the current position.
    pub fn collide(&self, group: &str, offset: Vec2) -> Vec<&Entity> {
        self.others()
            .filter(|other| other.group == group && self.me.collide_with(other, offset))
            .collect()
    }

    /// Queue a new entity. It joins the stage after this tick's entity pass;
    /// its ID is valid immediately.
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        let id = self.link.allocate_id();
        self.commands.spawn(id, entity);
        id
    }

    /// Queue removal of `id` at the end of this tick.
    pub fn despawn(&mut self, id: EntityId) {
        self.commands.despawn(id);
    }

    pub fn despawn_self(&mut self) {
        if let Some(id) = self.me.id() {
            self.commands.despawn(id);
        }
    }

    /// Replace the running stage starting with the next tick.
    pub fn switch_stage(&mut self, stage: Stage) {
        *self.next_stage = Some(stage);
    }
}

/// Passed to a [`StageBehavior`](crate::core::stage::StageBehavior) once per
/// tick, before entities update.
pub struct StageContext<'a> {
    pub(crate) entities: &'a mut [Entity],
    pub(crate) input: &'a InputState,
    pub(crate) assets: &'a AssetRegistry,
    pub(crate) delta: f32,
    pub(crate) link: &'a StageLink,
    pub(crate) commands: &'a mut Commands,
    pub(crate) next_stage: &'a mut Option<Stage>,
}

impl<'a> StageContext<'a> {
    pub fn entities(&self) -> &[Entity] {
        &*self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut *self.entities
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id() == Some(id))
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id() == Some(id))
    }

    pub fn find_by_group(&self, group: &str) -> Vec<&Entity> {
        self.entities.iter().filter(|e| e.group == group).collect()
    }

    pub fn delta(&self) -> f32 {
        self.delta
    }

    pub fn input(&self) -> &InputState {
        self.input
    }

    pub fn assets(&self) -> &AssetRegistry {
        self.assets
    }

    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        let id = self.link.allocate_id();
        self.commands.spawn(id, entity);
        id
    }

    pub fn despawn(&mut self, id: EntityId) {
        self.commands.despawn(id);
    }

    pub fn switch_stage(&mut self, stage: Stage) {
        *self.next_stage = Some(stage);
    }
}
