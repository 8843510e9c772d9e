use std::rc::Rc;

use glam::Vec2;
use wee_engine::{
    AssetManifest, AssetRegistry, Bitmap, Color, Entity, EntityBehavior, EntityId, SheetRegistry,
    Stage, StageBehavior, StageContext, UpdateContext,
};
use wee_web::GameRunner;

const WORLD_W: f32 = 320.0;
const WORLD_H: f32 = 480.0;
const WALL: f32 = 8.0;
const HERO_SPEED: f32 = 96.0;
const HERO_SIZE: f32 = 16.0;
const COIN_SIZE: f32 = 8.0;
const SPARKLE_LIFE: f32 = 0.4;

const MANIFEST: &str = include_str!("../assets/manifest.json");

/// Paint the demo's images, register its sheets and start level 1.
/// Images are generated rather than fetched so the demo is self-contained.
pub fn setup(runner: &GameRunner) {
    paint_assets(&runner.assets());

    let manifest = match AssetManifest::from_json(MANIFEST) {
        Ok(manifest) => manifest,
        Err(e) => {
            log::error!("basic-demo: {}", e);
            return;
        }
    };
    let sheets = Rc::new(SheetRegistry::from_manifest(&manifest));
    runner.with_game(|game| {
        game.set_stage(level(&sheets, 1));
    });
}

fn paint(width: u32, height: u32, shade: impl Fn(u32, u32) -> Color) -> Bitmap {
    let pixels = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| shade(x, y))
        .collect();
    Bitmap::new(width, height, pixels)
}

fn paint_assets(assets: &AssetRegistry) {
    // 4-frame walk strip: a body with feet that swap sides
    let body = Color::rgb(0x4a, 0x9e, 0xff);
    let feet = Color::rgb(0x1d, 0x3d, 0x6b);
    assets.insert(
        "hero.png",
        paint(64, 16, |x, y| {
            let frame = x / 16;
            let (fx, fy) = (x % 16, y);
            let stride = if frame % 2 == 0 { 0 } else { 2 };
            if (3..13).contains(&fx) && (2..12).contains(&fy) {
                if fy == 5 && (fx == 5 || fx == 10) {
                    Color::WHITE
                } else {
                    body
                }
            } else if fy >= 12 && (fx == 4 + stride || fx == 11 - stride) {
                feet
            } else {
                Color::TRANSPARENT
            }
        }),
    );

    // row 0: 4 coin frames narrowing as they spin; row 1: one brick tile
    let gold = Color::rgb(0xff, 0xd2, 0x3f);
    let brick = Color::rgb(0x8c, 0x3b, 0x2a);
    let mortar = Color::rgb(0x5a, 0x25, 0x1b);
    assets.insert(
        "items.png",
        paint(32, 16, |x, y| {
            if y < 8 {
                let half_width = 4 - (x / 8) as i32;
                let dx = (x % 8) as i32 - 4;
                if dx >= -half_width && dx < half_width && (1..7).contains(&y) {
                    gold
                } else {
                    Color::TRANSPARENT
                }
            } else if y == 11 || y == 15 || (y < 11 && x % 8 == 0) || (y > 11 && x % 8 == 4) {
                mortar
            } else {
                brick
            }
        }),
    );
}

/// Build level `number`: a walled room, a hero and `number * 4` coins.
fn level(sheets: &Rc<SheetRegistry>, number: u32) -> Stage {
    let mut stage = Stage::new().with_behavior(Level {
        number,
        sheets: Rc::clone(sheets),
        advanced: false,
    });

    for (pos, size) in [
        (Vec2::ZERO, Vec2::new(WORLD_W, WALL)),
        (Vec2::new(0.0, WORLD_H - WALL), Vec2::new(WORLD_W, WALL)),
        (Vec2::new(0.0, WALL), Vec2::new(WALL, WORLD_H - 2.0 * WALL)),
        (Vec2::new(WORLD_W - WALL, WALL), Vec2::new(WALL, WORLD_H - 2.0 * WALL)),
    ] {
        let mut wall = Entity::new(pos.x, pos.y)
            .with_hitbox(Vec2::ZERO, size)
            .with_group("wall")
            .with_hitbox_color(Color::rgb(0xff, 0x60, 0x60));
        if let Some(sprite) = sheets.sprite("brick") {
            wall.set_sprite(sprite.with_fill(size));
        }
        stage.add(wall);
    }

    let mut seed = number.wrapping_mul(2_654_435_761);
    let mut next = move |span: f32| {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        (seed % 10_000) as f32 / 10_000.0 * span
    };
    let inner = Vec2::splat(WALL * 3.0);
    let span = Vec2::new(WORLD_W, WORLD_H) - inner * 2.0;
    for _ in 0..number * 4 {
        let pos = inner + Vec2::new(next(span.x), next(span.y));
        let mut coin = Entity::new(pos.x, pos.y)
            .with_hitbox(Vec2::splat(-COIN_SIZE / 2.0), Vec2::splat(COIN_SIZE))
            .with_group("coin")
            .with_hitbox_color(Color::rgb(0xff, 0xd2, 0x3f));
        if let Some(mut sprite) = sheets.sprite("coin") {
            sprite.pivot = Vec2::splat(COIN_SIZE / 2.0);
            sheets.play(&mut sprite, "coin", "spin", false);
            coin.set_sprite(sprite);
        }
        stage.add(coin);
    }

    let mut hero = Entity::new(WORLD_W / 2.0, WORLD_H / 2.0)
        .with_z(10.0)
        .with_hitbox(Vec2::new(-5.0, -6.0), Vec2::new(10.0, 12.0))
        .with_group("hero")
        .with_behavior(Hero {
            sheets: Rc::clone(sheets),
            score: 0,
        });
    if let Some(sprite) = sheets.sprite("hero") {
        hero.set_sprite(sprite.with_pivot(Vec2::splat(HERO_SIZE / 2.0)));
    }
    stage.add(hero);

    log::info!("level {}: {} entities", number, stage.len());
    stage
}

/// Advances to the next level once every coin is gone.
struct Level {
    number: u32,
    sheets: Rc<SheetRegistry>,
    advanced: bool,
}

impl StageBehavior for Level {
    fn update(&mut self, ctx: &mut StageContext<'_>) {
        if self.advanced || !ctx.find_by_group("coin").is_empty() {
            return;
        }
        self.advanced = true;
        log::info!("level {} cleared", self.number);
        ctx.switch_stage(level(&self.sheets, self.number + 1));
    }
}

/// Arrow keys move; walls block; touching a coin collects it.
struct Hero {
    sheets: Rc<SheetRegistry>,
    score: u32,
}

impl EntityBehavior for Hero {
    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        let input = ctx.input();
        let mut dir = Vec2::ZERO;
        if input.down("ArrowLeft") {
            dir.x -= 1.0;
        }
        if input.down("ArrowRight") {
            dir.x += 1.0;
        }
        if input.down("ArrowUp") {
            dir.y -= 1.0;
        }
        if input.down("ArrowDown") {
            dir.y += 1.0;
        }
        let step = dir.normalize_or_zero() * HERO_SPEED * ctx.delta();

        // resolve each axis separately so the hero slides along walls
        let mut moved = Vec2::ZERO;
        if ctx.collide("wall", Vec2::new(step.x, 0.0)).is_empty() {
            moved.x = step.x;
        }
        if ctx.collide("wall", Vec2::new(moved.x, step.y)).is_empty() {
            moved.y = step.y;
        }

        let coins: Vec<(EntityId, Vec2)> = ctx
            .collide("coin", moved)
            .iter()
            .filter_map(|coin| coin.id().map(|id| (id, coin.pos)))
            .collect();
        for (id, pos) in coins {
            ctx.despawn(id);
            self.score += 1;
            log::info!("coin collected, score {}", self.score);
            if let Some(mut sprite) = self.sheets.sprite("coin") {
                sprite.pivot = Vec2::splat(COIN_SIZE / 2.0);
                ctx.spawn(
                    Entity::new(pos.x, pos.y)
                        .with_z(20.0)
                        .with_sprite(sprite)
                        .with_behavior(Sparkle { age: 0.0 }),
                );
            }
        }

        let hero = ctx.entity_mut();
        hero.pos += moved;
        if let Some(sprite) = hero.sprite_mut() {
            let animation = if moved == Vec2::ZERO { "idle" } else { "walk" };
            self.sheets.play(sprite, "hero", animation, false);
        }
    }
}

/// Short-lived pickup effect: rises, spins and fades, then removes itself.
struct Sparkle {
    age: f32,
}

impl EntityBehavior for Sparkle {
    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        self.age += ctx.delta();
        if self.age >= SPARKLE_LIFE {
            ctx.despawn_self();
            return;
        }
        let t = self.age / SPARKLE_LIFE;
        let delta = ctx.delta();
        let me = ctx.entity_mut();
        me.pos.y -= 40.0 * delta;
        if let Some(sprite) = me.sprite_mut() {
            sprite.rotation = 360.0 * t;
            sprite.alpha = 1.0 - t;
        }
    }
}
