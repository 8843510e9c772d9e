use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;

use crate::api::context::{Frame, StageContext, UpdateContext};
use crate::api::types::{EntityId, GameId};
use crate::components::entity::Entity;
use crate::systems::debug::draw_hitboxes;

/// Per-stage logic, run once per tick before any entity updates.
///
/// Any `FnMut(&mut StageContext)` closure is a behavior.
pub trait StageBehavior {
    fn update(&mut self, ctx: &mut StageContext<'_>);
}

impl<F> StageBehavior for F
where
    F: FnMut(&mut StageContext<'_>),
{
    fn update(&mut self, ctx: &mut StageContext<'_>) {
        self(ctx)
    }
}

/// State an entity can reach back into without owning its stage.
/// Entities hold a `Weak` to this; the stage holds the only `Rc`.
#[derive(Debug, Default)]
pub(crate) struct StageLink {
    reorder: Cell<bool>,
    next_id: Cell<u32>,
}

impl StageLink {
    pub(crate) fn reorder_z(&self) {
        self.reorder.set(true);
    }

    fn needs_reorder(&self) -> bool {
        self.reorder.get()
    }

    fn take_reorder(&self) -> bool {
        self.reorder.replace(false)
    }

    pub(crate) fn allocate_id(&self) -> EntityId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        EntityId(id)
    }
}

enum Command {
    Spawn(EntityId, Entity),
    Despawn(EntityId),
}

/// Structural changes requested mid-tick, applied after the entity pass.
#[derive(Default)]
pub(crate) struct Commands {
    queue: Vec<Command>,
}

impl Commands {
    pub(crate) fn spawn(&mut self, id: EntityId, entity: Entity) {
        self.queue.push(Command::Spawn(id, entity));
    }

    pub(crate) fn despawn(&mut self, id: EntityId) {
        self.queue.push(Command::Despawn(id));
    }

    fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.queue)
    }
}

/// A scene: an ordered set of entities, updated and drawn in ascending z.
///
/// Entities are kept in insertion order until some entity's z changes; the
/// next tick then stable-sorts the set, so equal z keeps insertion order.
pub struct Stage {
    entities: Vec<Entity>,
    link: Rc<StageLink>,
    behavior: Option<Box<dyn StageBehavior>>,
    commands: Commands,
    game: Option<GameId>,
}

impl Stage {
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entities: Vec::with_capacity(capacity),
            link: Rc::new(StageLink::default()),
            behavior: None,
            commands: Commands::default(),
            game: None,
        }
    }

    pub fn with_behavior(mut self, behavior: impl StageBehavior + 'static) -> Self {
        self.behavior = Some(Box::new(behavior));
        self
    }

    pub fn set_behavior(&mut self, behavior: impl StageBehavior + 'static) {
        self.behavior = Some(Box::new(behavior));
    }

    /// Append an entity and attach it to this stage. Returns its new ID.
    pub fn add(&mut self, entity: Entity) -> EntityId {
        let id = self.link.allocate_id();
        self.insert(id, entity);
        id
    }

    fn insert(&mut self, id: EntityId, mut entity: Entity) {
        entity.attach(id, Rc::downgrade(&self.link));
        if self.entities.last().is_some_and(|last| entity.z() < last.z()) {
            self.link.reorder_z();
        }
        self.entities.push(entity);
    }

    /// Remove an entity, keeping the rest in order. Missing IDs are a no-op.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let idx = self.entities.iter().position(|e| e.id() == Some(id))?;
        let mut entity = self.entities.remove(idx);
        entity.detach();
        Some(entity)
    }

    /// Entities in update/draw order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id() == Some(id))
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id() == Some(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    /// All entities whose collision group is `group`.
    pub fn find_by_group(&self, group: &str) -> Vec<&Entity> {
        self.entities.iter().filter(|e| e.group == group).collect()
    }

    /// Entities in `group` that `id` would touch if moved by `offset`.
    /// The entity never collides with itself.
    pub fn collide(&self, id: EntityId, group: &str, offset: Vec2) -> Vec<&Entity> {
        let Some(me) = self.get(id) else {
            return Vec::new();
        };
        self.entities
            .iter()
            .filter(|other| other.id() != Some(id))
            .filter(|other| other.group == group && me.collide_with(other, offset))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Detach and drop every entity.
    pub fn clear(&mut self) {
        for entity in self.entities.iter_mut() {
            entity.detach();
        }
        self.entities.clear();
    }

    /// Request a z re-sort at the start of the next tick.
    pub fn reorder_z(&self) {
        self.link.reorder_z();
    }

    pub fn needs_reorder(&self) -> bool {
        self.link.needs_reorder()
    }

    /// The game hosting this stage, if any.
    pub fn game(&self) -> Option<GameId> {
        self.game
    }

    pub(crate) fn set_game(&mut self, game: Option<GameId>) {
        self.game = game;
    }

    /// Run one frame: sort if dirty, stage logic, then update and draw each
    /// entity in order, the debug overlay, and finally any queued spawns
    /// and despawns.
    pub fn tick(&mut self, frame: &mut Frame<'_>) {
        if self.link.take_reorder() {
            self.entities.sort_by(|a, b| a.z().total_cmp(&b.z()));
            log::trace!("stage re-sorted {} entities by z", self.entities.len());
        }

        if let Some(mut behavior) = self.behavior.take() {
            let mut ctx = StageContext {
                entities: &mut self.entities,
                input: frame.input,
                assets: frame.assets,
                delta: frame.delta,
                link: &self.link,
                commands: &mut self.commands,
                next_stage: &mut *frame.next_stage,
            };
            behavior.update(&mut ctx);
            self.behavior = Some(behavior);
        }

        for i in 0..self.entities.len() {
            if let Some(mut behavior) = self.entities[i].take_behavior() {
                let (before, rest) = self.entities.split_at_mut(i);
                if let Some((me, after)) = rest.split_first_mut() {
                    let mut ctx = UpdateContext {
                        me,
                        before,
                        after,
                        input: frame.input,
                        assets: frame.assets,
                        delta: frame.delta,
                        link: &self.link,
                        commands: &mut self.commands,
                        next_stage: &mut *frame.next_stage,
                    };
                    behavior.update(&mut ctx);
                }
                self.entities[i].restore_behavior(behavior);
            }
            self.entities[i].render(&mut *frame.surface, frame.delta, frame.assets);
        }

        if frame.debug {
            draw_hitboxes(&mut *frame.surface, &self.entities);
        }

        self.apply_commands();
    }

    fn apply_commands(&mut self) {
        for command in self.commands.take() {
            match command {
                Command::Spawn(id, entity) => self.insert(id, entity),
                Command::Despawn(id) => {
                    if self.remove(id).is_none() {
                        log::debug!("despawn of {:?}: not in stage", id);
                    }
                }
            }
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("entities", &self.entities.len())
            .field("needs_reorder", &self.needs_reorder())
            .field("behavior", &self.behavior.is_some())
            .field("game", &self.game)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Color;
    use crate::assets::registry::AssetRegistry;
    use crate::core::collision::Rect;
    use crate::input::state::InputState;
    use crate::renderer::draw_list::{DrawCommand, DrawList};
    use std::cell::RefCell;

    struct Harness {
        surface: DrawList,
        input: InputState,
        assets: AssetRegistry,
        next_stage: Option<Stage>,
        debug: bool,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                surface: DrawList::new(100.0, 100.0),
                input: InputState::new(),
                assets: AssetRegistry::new(),
                next_stage: None,
                debug: false,
            }
        }

        fn tick(&mut self, stage: &mut Stage, delta: f32) {
            let mut frame = Frame {
                surface: &mut self.surface,
                input: &self.input,
                assets: &self.assets,
                delta,
                debug: self.debug,
                next_stage: &mut self.next_stage,
            };
            stage.tick(&mut frame);
        }
    }

    fn ids(stage: &Stage) -> Vec<EntityId> {
        stage.iter().filter_map(Entity::id).collect()
    }

    #[test]
    fn add_then_remove_restores_list() {
        let mut stage = Stage::new();
        let a = stage.add(Entity::new(0.0, 0.0));
        let b = stage.add(Entity::new(1.0, 0.0));
        let before = ids(&stage);

        let c = stage.add(Entity::new(2.0, 0.0));
        assert_eq!(stage.len(), 3);
        let removed = stage.remove(c).unwrap();
        assert!(!removed.is_attached());
        assert_eq!(removed.id(), None);

        assert_eq!(ids(&stage), before);
        assert_eq!(ids(&stage), vec![a, b]);
    }

    #[test]
    fn remove_keeps_order_and_ignores_missing() {
        let mut stage = Stage::new();
        let a = stage.add(Entity::new(0.0, 0.0));
        let b = stage.add(Entity::new(0.0, 0.0));
        let c = stage.add(Entity::new(0.0, 0.0));
        stage.remove(a);
        assert_eq!(ids(&stage), vec![b, c]);
        assert!(stage.remove(a).is_none());
        assert_eq!(stage.len(), 2);
    }

    #[test]
    fn ids_are_unique_per_stage() {
        let mut stage = Stage::new();
        let a = stage.add(Entity::new(0.0, 0.0));
        stage.remove(a);
        let b = stage.add(Entity::new(0.0, 0.0));
        assert_ne!(a, b);
    }

    #[test]
    fn set_z_marks_stage_and_sort_is_stable() {
        let mut h = Harness::new();
        let mut stage = Stage::new();
        let a = stage.add(Entity::new(0.0, 0.0));
        let b = stage.add(Entity::new(0.0, 0.0));
        let c = stage.add(Entity::new(0.0, 0.0));
        let d = stage.add(Entity::new(0.0, 0.0));
        assert!(!stage.needs_reorder());

        stage.get_mut(c).unwrap().set_z(-1.0);
        assert!(stage.needs_reorder());
        h.tick(&mut stage, 0.0);
        assert!(!stage.needs_reorder());
        assert_eq!(ids(&stage), vec![c, a, b, d]);

        // repeated triggers never shuffle equal z
        for _ in 0..3 {
            stage.reorder_z();
            h.tick(&mut stage, 0.0);
        }
        assert_eq!(ids(&stage), vec![c, a, b, d]);
    }

    #[test]
    fn adding_lower_z_requests_sort() {
        let mut h = Harness::new();
        let mut stage = Stage::new();
        let high = stage.add(Entity::new(0.0, 0.0).with_z(5.0));
        assert!(!stage.needs_reorder());
        let low = stage.add(Entity::new(0.0, 0.0).with_z(1.0));
        assert!(stage.needs_reorder());
        h.tick(&mut stage, 0.0);
        assert_eq!(ids(&stage), vec![low, high]);
    }

    #[test]
    fn detached_entity_no_longer_marks_stage() {
        let mut stage = Stage::new();
        let a = stage.add(Entity::new(0.0, 0.0));
        let mut e = stage.remove(a).unwrap();
        e.set_z(-10.0);
        assert!(!stage.needs_reorder());
    }

    #[test]
    fn collide_filters_by_group_and_excludes_self() {
        let boxed = |x: f32, group: &str| {
            Entity::new(x, 0.0)
                .with_hitbox(Vec2::ZERO, Vec2::new(10.0, 10.0))
                .with_group(group)
        };
        let mut stage = Stage::new();
        let hero = stage.add(boxed(0.0, "hero"));
        let coin = stage.add(boxed(5.0, "coin"));
        let far = stage.add(boxed(50.0, "coin"));
        let _wall = stage.add(boxed(5.0, "wall"));
        let hit_ids = |stage: &Stage, offset: Vec2| -> Vec<EntityId> {
            stage.collide(hero, "coin", offset).iter().filter_map(|e| e.id()).collect()
        };

        assert_eq!(hit_ids(&stage, Vec2::ZERO), vec![coin]);
        assert_eq!(hit_ids(&stage, Vec2::new(5.0, 0.0)), vec![coin]);
        // predicted box spans 40..50 and touches the far coin's edge
        assert_eq!(hit_ids(&stage, Vec2::new(40.0, 0.0)), vec![far]);
        assert!(hit_ids(&stage, Vec2::new(30.0, 0.0)).is_empty());

        let _twin = stage.add(boxed(0.0, "hero"));
        assert_eq!(stage.collide(hero, "hero", Vec2::ZERO).len(), 1);
        assert_eq!(stage.find_by_group("coin").len(), 2);
    }

    #[test]
    fn entities_update_in_order_and_despawn_is_deferred() {
        let mut h = Harness::new();
        let mut stage = Stage::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let log = Rc::clone(&seen);
        let first = stage.add(Entity::new(0.0, 0.0).with_behavior(move |ctx: &mut UpdateContext| {
            log.borrow_mut().push("first");
            ctx.despawn_self();
        }));
        let log = Rc::clone(&seen);
        let second = stage.add(Entity::new(0.0, 0.0).with_behavior(move |ctx: &mut UpdateContext| {
            log.borrow_mut().push("second");
            // still visible to siblings this tick
            assert!(ctx.get(first).is_some());
        }));

        h.tick(&mut stage, 0.016);
        assert_eq!(*seen.borrow(), vec!["first", "second"]);
        assert_eq!(ids(&stage), vec![second]);
    }

    #[test]
    fn spawned_entities_join_after_the_pass() {
        let mut h = Harness::new();
        let mut stage = Stage::new();
        let spawned = Rc::new(Cell::new(None));

        let slot = Rc::clone(&spawned);
        stage.add(Entity::new(0.0, 0.0).with_behavior(move |ctx: &mut UpdateContext| {
            if slot.get().is_none() {
                let id = ctx.spawn(Entity::new(9.0, 9.0).with_group("child"));
                slot.set(Some(id));
            }
        }));

        h.tick(&mut stage, 0.0);
        let child = spawned.get().unwrap();
        let e = stage.get(child).unwrap();
        assert_eq!(e.group, "child");
        assert!(e.is_attached());
        assert_eq!(stage.len(), 2);
    }

    #[test]
    fn behavior_moves_entity_before_render() {
        let mut h = Harness::new();
        h.assets.insert("dot.png", crate::assets::bitmap::Bitmap::filled(2, 2, Color::WHITE));
        let mut stage = Stage::new();
        stage.add(
            Entity::new(0.0, 0.0)
                .with_sprite(crate::components::sprite::Sprite::whole("dot.png"))
                .with_behavior(|ctx: &mut UpdateContext| ctx.entity_mut().pos.x += 10.0),
        );
        h.tick(&mut stage, 0.0);
        assert!(matches!(
            h.surface.commands()[0],
            DrawCommand::DrawBitmap { at, .. } if at == Vec2::new(10.0, 0.0)
        ));
    }

    #[test]
    fn stage_behavior_runs_before_entities() {
        let mut h = Harness::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let mut stage = Stage::new().with_behavior(move |ctx: &mut StageContext| {
            log.borrow_mut().push(ctx.entities().len());
        });
        let log = Rc::clone(&seen);
        stage.add(Entity::new(0.0, 0.0).with_behavior(move |_: &mut UpdateContext| {
            log.borrow_mut().push(99);
        }));
        h.tick(&mut stage, 0.0);
        assert_eq!(*seen.borrow(), vec![1, 99]);

        h.tick(&mut stage, 0.0);
        assert_eq!(*seen.borrow(), vec![1, 99, 1, 99]);
    }

    #[test]
    fn debug_draws_hitbox_and_marker() {
        let mut h = Harness::new();
        h.debug = true;
        let red = Color::rgb(255, 0, 0);
        let mut stage = Stage::new();
        stage.add(
            Entity::new(10.0, 20.0)
                .with_hitbox(Vec2::new(-4.0, -8.0), Vec2::new(8.0, 16.0))
                .with_hitbox_color(red),
        );
        h.tick(&mut stage, 0.0);
        assert_eq!(
            h.surface.commands(),
            &[
                DrawCommand::StrokeRect {
                    rect: Rect::new(6.0, 12.0, 8.0, 16.0),
                    color: red
                },
                DrawCommand::FillRect {
                    rect: Rect::new(9.0, 19.0, 2.0, 2.0),
                    color: red
                },
            ]
        );
    }

    #[test]
    fn switch_stage_is_handed_to_the_host() {
        let mut h = Harness::new();
        let mut stage = Stage::new();
        stage.add(Entity::new(0.0, 0.0).with_behavior(|ctx: &mut UpdateContext| {
            ctx.switch_stage(Stage::new());
        }));
        h.tick(&mut stage, 0.0);
        assert!(h.next_stage.is_some());
        assert_eq!(stage.len(), 1);
    }
}
