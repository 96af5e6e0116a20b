//! Coarse monochrome film grain.
//!
//! The texture lives at a fixed small resolution and is stretched over the
//! frame with nearest-neighbour sampling. It is rebuilt on a virtual-time
//! cadence that is slower than the frame rate.

use rand::Rng;

use crate::render::surface::{BlendMode, Surface};

pub const TEXTURE_SIZE: usize = 256;
pub const BLOCK_SIZE: usize = 2;
pub const UPDATES_PER_SECOND: f64 = 15.0;
/// Grain opacity per unit of intensity.
pub const OPACITY_SCALE: f32 = 0.6;

#[derive(Debug, Clone)]
pub struct GrainTexture {
    values: Vec<f32>,
    last_update_ms: Option<f64>,
}

impl Default for GrainTexture {
    fn default() -> Self {
        Self::new()
    }
}

impl GrainTexture {
    pub fn new() -> Self {
        Self {
            values: vec![0.5; TEXTURE_SIZE * TEXTURE_SIZE],
            last_update_ms: None,
        }
    }

    pub fn reset(&mut self) {
        self.last_update_ms = None;
    }

    #[inline]
    pub fn value(&self, x: usize, y: usize) -> f32 {
        self.values[y * TEXTURE_SIZE + x]
    }

    /// Fills every 2x2 block with one gray level drawn from `[88, 168)`.
    pub fn regenerate<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for by in (0..TEXTURE_SIZE).step_by(BLOCK_SIZE) {
            for bx in (0..TEXTURE_SIZE).step_by(BLOCK_SIZE) {
                let v = (rng.random::<f32>() * 80.0 + 88.0).floor() / 255.0;
                for y in by..(by + BLOCK_SIZE).min(TEXTURE_SIZE) {
                    let row = y * TEXTURE_SIZE;
                    self.values[row + bx..row + (bx + BLOCK_SIZE).min(TEXTURE_SIZE)].fill(v);
                }
            }
        }
    }

    /// Regenerates when the refresh interval has elapsed, or when the clock
    /// moved backwards. Returns whether a new texture was built.
    pub fn update<R: Rng + ?Sized>(&mut self, timestamp_ms: f64, rng: &mut R) -> bool {
        let interval = 1000.0 / UPDATES_PER_SECOND;
        let due = match self.last_update_ms {
            None => true,
            Some(last) => timestamp_ms - last >= interval || timestamp_ms < last,
        };
        if due {
            self.regenerate(rng);
            self.last_update_ms = Some(timestamp_ms);
        }
        due
    }

    /// Overlays the stretched texture at `intensity * 0.6`.
    pub fn draw(&self, frame: &mut Surface, intensity: f32) {
        let alpha = (intensity * OPACITY_SCALE).min(1.0);
        if alpha <= 0.0 || frame.is_empty() {
            return;
        }
        let (w, h) = (frame.width(), frame.height());
        let columns: Vec<usize> = (0..w).map(|x| x * TEXTURE_SIZE / w).collect();
        for (y, row) in frame.pixels_mut().chunks_mut(w).enumerate() {
            let ty = y * TEXTURE_SIZE / h;
            for (px, &tx) in row.iter_mut().zip(&columns) {
                let g = self.value(tx, ty);
                BlendMode::Overlay.apply_rgb(px, [g, g, g], alpha);
            }
        }
    }
}
