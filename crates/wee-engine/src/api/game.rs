use std::sync::atomic::{AtomicU32, Ordering};

use serde::Deserialize;

use crate::api::context::Frame;
use crate::api::types::{Color, GameId};
use crate::assets::registry::AssetRegistry;
use crate::core::stage::Stage;
use crate::core::time::FrameClock;
use crate::input::queue::{InputEvent, InputQueue};
use crate::input::state::InputState;
use crate::renderer::traits::Surface;

/// Configuration for a game, provided by the host or a JSON file.
/// Every field is optional in JSON; missing fields take the defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Surface width in pixels (default: 320).
    pub width: u32,
    /// Surface height in pixels (default: 480).
    pub height: u32,
    /// Color the surface is cleared to each tick (default: `#222`).
    pub background: Color,
    /// Draw hitboxes and position markers (default: off).
    pub debug: bool,
    /// Upper bound on a single tick's delta, in seconds (default: 0.25).
    pub max_delta: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 480,
            background: Color::rgb(0x22, 0x22, 0x22),
            debug: false,
            max_delta: 0.25,
        }
    }
}

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

static NEXT_GAME_ID: AtomicU32 = AtomicU32::new(1);

/// Hosts one stage at a time and drives it once per host frame.
///
/// The host owns the scheduling: it calls [`Game::tick`] with its frame
/// timestamp and forwards keyboard events through [`Game::push_input`].
/// Each tick computes the delta, applies queued input, clears the surface,
/// runs the stage, then clears the one-tick input edges.
pub struct Game<S: Surface> {
    id: GameId,
    config: GameConfig,
    surface: S,
    stage: Option<Stage>,
    clock: FrameClock,
    input: InputState,
    queue: InputQueue,
    assets: AssetRegistry,
    frame_count: u64,
}

impl<S: Surface> Game<S> {
    pub fn new(config: GameConfig, surface: S) -> Self {
        Self::with_assets(config, surface, AssetRegistry::new())
    }

    /// Create a game sharing an existing asset registry (e.g. one that a
    /// preload is already filling).
    pub fn with_assets(config: GameConfig, surface: S, assets: AssetRegistry) -> Self {
        let id = GameId(NEXT_GAME_ID.fetch_add(1, Ordering::Relaxed));
        log::info!(
            "game {:?} created: {}x{}, debug {}",
            id,
            config.width,
            config.height,
            config.debug
        );
        Self {
            id,
            clock: FrameClock::new(config.max_delta),
            config,
            surface,
            stage: None,
            input: InputState::new(),
            queue: InputQueue::new(),
            assets,
            frame_count: 0,
        }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Make `stage` the active stage, binding it to this game. Returns the
    /// stage it replaced, now unbound.
    pub fn set_stage(&mut self, mut stage: Stage) -> Option<Stage> {
        stage.set_game(Some(self.id));
        log::info!("stage switched ({} entities)", stage.len());
        let mut previous = self.stage.replace(stage);
        if let Some(old) = previous.as_mut() {
            old.set_game(None);
        }
        previous
    }

    /// Remove the active stage. Ticks still clear the surface.
    pub fn take_stage(&mut self) -> Option<Stage> {
        let mut stage = self.stage.take();
        if let Some(old) = stage.as_mut() {
            old.set_game(None);
        }
        stage
    }

    pub fn stage(&self) -> Option<&Stage> {
        self.stage.as_ref()
    }

    pub fn stage_mut(&mut self) -> Option<&mut Stage> {
        self.stage.as_mut()
    }

    /// Seconds covered by the most recent tick.
    pub fn elapsed(&self) -> f32 {
        self.clock.delta()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn debug(&self) -> bool {
        self.config.debug
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.config.debug = debug;
    }

    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    /// Queue a keyboard event; it takes effect at the start of the next tick.
    pub fn push_input(&mut self, event: InputEvent) {
        if !self.queue.push(event) {
            log::trace!("key repeat folded");
        }
    }

    /// Release every key and drop queued events. Hosts call this when
    /// focus leaves the page, since no keyup arrives for held keys.
    pub fn reset_input(&mut self) {
        self.queue.clear();
        self.input.reset();
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Run one frame. `now_ms` is the host's monotonic frame timestamp.
    pub fn tick(&mut self, now_ms: f64) {
        let delta = self.clock.advance(now_ms);

        for event in self.queue.drain() {
            self.input.apply(&event);
        }

        self.surface.clear(self.config.background);

        let mut next_stage = None;
        if let Some(stage) = self.stage.as_mut() {
            let mut frame = Frame {
                surface: &mut self.surface,
                input: &self.input,
                assets: &self.assets,
                delta,
                debug: self.config.debug,
                next_stage: &mut next_stage,
            };
            stage.tick(&mut frame);
        }

        self.input.clear_edges();

        if let Some(stage) = next_stage {
            self.set_stage(stage);
        }

        self.frame_count += 1;
        log::trace!("frame {} took {:.4}s", self.frame_count, delta);
    }
}
