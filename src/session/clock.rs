use std::time::Instant;

/// Nominal frame interval in milliseconds.
pub fn frame_delta_ms(fps: u32) -> f64 {
    1000.0 / fps.max(1) as f64
}

/// Accumulated-delta timestamp, independent of how long frames take to render.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VirtualClock {
    now_ms: f64,
    frames: u64,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `delta_ms` and returns the new timestamp. Negative deltas count as zero.
    pub fn advance(&mut self, delta_ms: f64) -> f64 {
        self.now_ms += delta_ms.max(0.0);
        self.frames += 1;
        self.now_ms
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Turns presentation instants into deltas. The first tick only primes it.
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock {
    last: Option<Instant>,
}

impl WallClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, now: Instant) -> Option<f64> {
        let delta = self
            .last
            .map(|last| now.saturating_duration_since(last).as_secs_f64() * 1000.0);
        self.last = Some(now);
        delta
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// `MM:SS` for a duration in seconds.
pub fn format_elapsed(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
