//! Keyboard state with edge-triggered and level-triggered queries.
//!
//! - `down(code)` is level-triggered: true every tick the key is held.
//! - `pressed(code)` / `released(code)` are edge-triggered: true only during
//!   the tick in which the transition happened. `Game` calls `clear_edges()`
//!   once at the end of every tick.

use std::collections::HashMap;

use super::queue::InputEvent;

/// Flags tracked per key code. Unseen keys read as all-false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyState {
    pub pressed: bool,
    pub down: bool,
    pub released: bool,
}

#[derive(Debug, Default)]
pub struct InputState {
    keys: HashMap<String, KeyState>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, code: &str) {
        let key = self.keys.entry(code.to_string()).or_default();
        if !key.down {
            key.pressed = true;
        }
        key.down = true;
        key.released = false;
    }

    pub fn key_up(&mut self, code: &str) {
        let key = self.keys.entry(code.to_string()).or_default();
        if key.down {
            key.released = true;
        }
        key.down = false;
        key.pressed = false;
    }

    pub fn apply(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown { code } => self.key_down(code),
            InputEvent::KeyUp { code } => self.key_up(code),
        }
    }

    /// Current flags for `code`.
    pub fn key(&self, code: &str) -> KeyState {
        self.keys.get(code).copied().unwrap_or_default()
    }

    pub fn pressed(&self, code: &str) -> bool {
        self.key(code).pressed
    }

    pub fn down(&self, code: &str) -> bool {
        self.key(code).down
    }

    pub fn released(&self, code: &str) -> bool {
        self.key(code).released
    }

    /// Zero `pressed` and `released` on every tracked key.
    pub fn clear_edges(&mut self) {
        for key in self.keys.values_mut() {
            key.pressed = false;
            key.released = false;
        }
    }

    /// Forget every key (e.g. when the host window loses focus).
    pub fn reset(&mut self) {
        self.keys.clear();
    }

    /// Number of key codes observed so far.
    pub fn tracked(&self) -> usize {
        self.keys.len()
    }
}
