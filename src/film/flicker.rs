//! Projector brightness flicker and gate weave.

use std::f64::consts::PI;

use rand::Rng;

use crate::render::surface::{BlendMode, Surface, BLACK, WHITE};

pub const MIN_BRIGHTNESS: f32 = 0.4;
pub const MAX_BRIGHTNESS: f32 = 1.5;

/// Translation applied to the whole picture, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Weave {
    pub x: f32,
    pub y: f32,
}

/// Brightness multiplier for the frame at `timestamp_ms`.
///
/// Sums a slow drift, a cadence ripple, gated dips and flashes, and a
/// random jitter, scaled by `intensity`. Exactly 1 when intensity is zero,
/// in which case no random number is consumed.
pub fn brightness<R: Rng + ?Sized>(timestamp_ms: f64, intensity: f32, rng: &mut R) -> f32 {
    if intensity <= 0.0 {
        return 1.0;
    }
    let t = timestamp_ms * 0.001;

    let drift = (t * 1.3).sin() * 0.15;
    let ripple = (t * 24.0 * PI * 2.0 * 0.04).sin() * 0.2;

    let dip_gate = (t * 5.1).sin() * (t * 7.3).sin();
    let dip = if dip_gate > 0.85 {
        -0.4 * (dip_gate - 0.85) / 0.15
    } else {
        0.0
    };

    let flash_gate = (t * 3.7).sin() * (t * 11.9).sin();
    let flash = if flash_gate > 0.9 {
        0.3 * (flash_gate - 0.9) / 0.1
    } else {
        0.0
    };

    let jitter = (rng.random::<f64>() - 0.5) * 0.3;

    let f = 1.0 + intensity as f64 * (drift + ripple + dip + flash + jitter);
    (f as f32).clamp(MIN_BRIGHTNESS, MAX_BRIGHTNESS)
}

/// Gate weave offset. Exactly zero when intensity is zero.
pub fn weave(timestamp_ms: f64, intensity: f32) -> Weave {
    if intensity <= 0.0 {
        return Weave::default();
    }
    let t = timestamp_ms * 0.001;
    let k = intensity as f64;

    let x = ((t * 3.7).sin() * 0.3 + (t * 7.1).sin() * 0.15 + (t * 13.3).sin() * 0.05) * k;
    let y = ((t * 4.3).sin() * 0.4 + (t * 9.7).sin() * 0.2 + (t * 11.1).sin() * 0.08) * k;
    Weave {
        x: x as f32,
        y: y as f32,
    }
}

/// Darkens with black below 1, brightens with white above 1.
pub fn apply_brightness(frame: &mut Surface, brightness: f32) {
    if brightness < 1.0 {
        frame.fill_blend(BLACK, 1.0 - brightness, BlendMode::SourceOver);
    } else if brightness > 1.0 {
        frame.fill_blend(WHITE, (brightness - 1.0) * 0.3, BlendMode::SourceOver);
    }
}
