/// Turns host frame timestamps into per-tick deltas.
///
/// Timestamps are milliseconds as delivered by the host scheduler; deltas
/// are seconds. The first tick reports 0, and every delta is capped at
/// `max_delta` so a long stall (a backgrounded tab) does not produce one
/// huge step.
pub struct FrameClock {
    last: Option<f64>,
    delta: f32,
    max_delta: f32,
}

impl FrameClock {
    pub fn new(max_delta: f32) -> Self {
        Self {
            last: None,
            delta: 0.0,
            max_delta,
        }
    }

    /// Record a new frame timestamp. Returns the delta in seconds.
    pub fn advance(&mut self, now_ms: f64) -> f32 {
        let raw = match self.last {
            Some(last) => ((now_ms - last) / 1000.0).max(0.0) as f32,
            None => 0.0,
        };
        self.last = Some(now_ms);

        self.delta = if raw > self.max_delta {
            log::warn!("frame delta {:.3}s clamped to {:.3}s", raw, self.max_delta);
            self.max_delta
        } else {
            raw
        };
        self.delta
    }

    /// Delta computed by the most recent `advance`.
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Timestamp of the most recent `advance`, if any.
    pub fn last_timestamp(&self) -> Option<f64> {
        self.last
    }

    pub fn max_delta(&self) -> f32 {
        self.max_delta
    }

    /// Forget the last timestamp; the next tick reports 0 again.
    pub fn reset(&mut self) {
        self.last = None;
        self.delta = 0.0;
    }
}
