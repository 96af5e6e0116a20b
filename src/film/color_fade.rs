//! Aged-print colour fade.
//!
//! Two renditions of the same look. `SepiaBlend` lerps each pixel toward a
//! fixed sepia matrix. `FilterChain` composes sepia, desaturation and a
//! slight brightness lift the way a compositor's filter stack would.

use serde::{Deserialize, Serialize};

use crate::render::surface::{Rgb, Surface};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorFadeMethod {
    #[default]
    SepiaBlend,
    FilterChain,
}

const SEPIA: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

#[inline]
fn mat_mul(m: &[[f32; 3]; 3], p: Rgb) -> Rgb {
    [
        m[0][0] * p[0] + m[0][1] * p[1] + m[0][2] * p[2],
        m[1][0] * p[0] + m[1][1] * p[1] + m[1][2] * p[2],
        m[2][0] * p[0] + m[2][1] * p[1] + m[2][2] * p[2],
    ]
}

/// `p * (1 - amount) + sepia(p) * amount`, each channel capped at 1.
pub fn sepia_blend(p: Rgb, amount: f32) -> Rgb {
    let s = mat_mul(&SEPIA, p);
    let mut out = [0.0; 3];
    for c in 0..3 {
        out[c] = (p[c] * (1.0 - amount) + s[c] * amount).min(1.0);
    }
    out
}

fn sepia_filter(amount: f32) -> [[f32; 3]; 3] {
    let k = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.393 + 0.607 * k, 0.769 - 0.769 * k, 0.189 - 0.189 * k],
        [0.349 - 0.349 * k, 0.686 + 0.314 * k, 0.168 - 0.168 * k],
        [0.272 - 0.272 * k, 0.534 - 0.534 * k, 0.131 + 0.869 * k],
    ]
}

fn saturate_filter(s: f32) -> [[f32; 3]; 3] {
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

#[inline]
fn clamp_rgb(p: Rgb) -> Rgb {
    [p[0].clamp(0.0, 1.0), p[1].clamp(0.0, 1.0), p[2].clamp(0.0, 1.0)]
}

/// Precomputed `sepia(60% * amount) saturate(1 - amount/2) brightness(1 + amount/10)`.
#[derive(Debug, Clone, Copy)]
pub struct FilterChain {
    sepia: [[f32; 3]; 3],
    saturate: [[f32; 3]; 3],
    brightness: f32,
}

impl FilterChain {
    pub fn new(amount: f32) -> Self {
        Self {
            sepia: sepia_filter(amount * 0.6),
            saturate: saturate_filter(1.0 - amount * 0.5),
            brightness: 1.0 + amount * 0.1,
        }
    }

    pub fn apply(&self, p: Rgb) -> Rgb {
        let p = clamp_rgb(mat_mul(&self.sepia, p));
        let p = clamp_rgb(mat_mul(&self.saturate, p));
        clamp_rgb([
            p[0] * self.brightness,
            p[1] * self.brightness,
            p[2] * self.brightness,
        ])
    }
}

pub fn apply_color_fade(frame: &mut Surface, amount: f32, method: ColorFadeMethod) {
    if amount <= 0.0 {
        return;
    }
    match method {
        ColorFadeMethod::SepiaBlend => {
            for px in frame.pixels_mut() {
                *px = sepia_blend(*px, amount);
            }
        }
        ColorFadeMethod::FilterChain => {
            let chain = FilterChain::new(amount);
            for px in frame.pixels_mut() {
                *px = chain.apply(*px);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_amount_is_identity() {
        let mut frame = Surface::filled(3, 3, [0.1, 0.5, 0.9]);
        let before = frame.clone();
        apply_color_fade(&mut frame, 0.0, ColorFadeMethod::SepiaBlend);
        apply_color_fade(&mut frame, 0.0, ColorFadeMethod::FilterChain);
        assert_eq!(frame, before);
    }

    #[test]
    fn full_sepia_uses_matrix() {
        let p = sepia_blend([0.5, 0.25, 0.1], 1.0);
        assert_relative_eq!(p[0], 0.5 * 0.393 + 0.25 * 0.769 + 0.1 * 0.189, epsilon = 1e-6);
        assert_relative_eq!(p[2], 0.5 * 0.272 + 0.25 * 0.534 + 0.1 * 0.131, epsilon = 1e-6);
    }

    #[test]
    fn sepia_caps_at_white() {
        assert_eq!(sepia_blend([1.0, 1.0, 1.0], 1.0)[0], 1.0);
    }

    #[test]
    fn filter_chain_at_zero_is_identity() {
        let chain = FilterChain::new(0.0);
        let p = chain.apply([0.2, 0.4, 0.6]);
        assert_relative_eq!(p[0], 0.2, epsilon = 1e-5);
        assert_relative_eq!(p[1], 0.4, epsilon = 1e-5);
        assert_relative_eq!(p[2], 0.6, epsilon = 1e-5);
    }

    #[test]
    fn both_methods_warm_a_neutral_gray() {
        for method in [ColorFadeMethod::SepiaBlend, ColorFadeMethod::FilterChain] {
            let mut frame = Surface::filled(1, 1, [0.5, 0.5, 0.5]);
            apply_color_fade(&mut frame, 1.0, method);
            let p = frame.get(0, 0);
            assert!(p[0] > p[1] && p[1] > p[2], "{method:?} gave {p:?}");
        }
    }
}
