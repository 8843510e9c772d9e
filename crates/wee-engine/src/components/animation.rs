//! Frame-sequence playback for sprites.
//!
//! An animation is an ordered list of frame indices into a sprite sheet,
//! looped at a fixed frames-per-second rate. Indices may repeat.

use serde::{Deserialize, Serialize};

/// A named animation as described in an asset manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationDef {
    /// Frame indices into the sheet, in playback order.
    pub frames: Vec<usize>,
    /// Frames per second.
    #[serde(default = "default_speed")]
    pub speed: f32,
}

fn default_speed() -> f32 {
    1.0
}

impl AnimationDef {
    pub fn new(frames: Vec<usize>, speed: f32) -> Self {
        Self { frames, speed }
    }

    /// Consecutive frames `start..start + count`.
    pub fn strip(start: usize, count: usize, speed: f32) -> Self {
        Self {
            frames: (start..start + count).collect(),
            speed,
        }
    }

    /// Seconds each frame stays on screen.
    pub fn frame_duration(&self) -> f32 {
        1.0 / self.speed
    }
}

/// Playback state: active sequence, rate, position and clock.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    sequence: Vec<usize>,
    speed: f32,
    index: usize,
    clock: f32,
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            sequence: vec![0],
            speed: 1.0,
            index: 0,
            clock: 0.0,
        }
    }
}

impl Animation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to `sequence` at `speed` frames per second.
    ///
    /// Position and clock restart at zero unless `sequence` equals the one
    /// already playing and `force` is false; then playback carries on and
    /// only the speed is updated. An empty sequence means `[0]`.
    /// Returns whether playback restarted.
    pub fn play(&mut self, sequence: &[usize], speed: f32, force: bool) -> bool {
        let sequence = if sequence.is_empty() { &[0][..] } else { sequence };
        self.speed = speed;
        if !force && self.sequence == sequence {
            return false;
        }
        self.sequence = sequence.to_vec();
        self.rewind();
        true
    }

    /// Restart the current sequence from its first frame.
    pub fn rewind(&mut self) {
        self.index = 0;
        self.clock = 0.0;
    }

    /// Advance the clock by `dt` seconds. Steps to the next frame, wrapping
    /// at the end, once `1 / speed` seconds have accumulated; the clock then
    /// restarts. Returns true if the frame changed.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.speed <= 0.0 {
            return false;
        }
        self.clock += dt;
        if self.clock < 1.0 / self.speed {
            return false;
        }
        self.clock = 0.0;
        self.index = (self.index + 1) % self.sequence.len();
        true
    }

    /// Sheet frame index currently showing.
    pub fn current_frame(&self) -> usize {
        self.sequence[self.index]
    }

    /// Position within the sequence.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn sequence(&self) -> &[usize] {
        &self.sequence
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Seconds accumulated towards the next frame.
    pub fn clock(&self) -> f32 {
        self.clock
    }
}
