//! Phosphor persistence and CRT display stage.
//!
//! The accumulation buffer is only ever faded, never cleared, so traces
//! leave exponentially decaying trails. The display buffer is rebuilt from
//! it every frame and is the only surface that receives scanlines and noise.

use rand::Rng;

use super::beam::{self, VisualizationMode};
use super::blur::gaussian_blur;
use super::raster::{Canvas, Mask};
use super::surface::{rgb8, BlendMode, Surface, BLACK};
use crate::audio::analysis::AnalysisFrame;
use crate::config::ScopeConfig;

/// Display background before the trace is laid down (`#0a0a0a`).
const DISPLAY_BACKGROUND: [u8; 3] = [10, 10, 10];
const BLOOM_ALPHA_SCALE: f32 = 0.3;
const NOISE_SCALE: f32 = 50.0;

/// Beam intensity for this frame: `min(1, 0.9 * (1 - u * flicker_amount))`.
pub fn beam_alpha<R: Rng + ?Sized>(flicker_amount: f32, rng: &mut R) -> f32 {
    let u: f32 = rng.random();
    (0.9 * (1.0 - u * flicker_amount)).min(1.0)
}

#[derive(Debug, Clone)]
pub struct GlowCompositor {
    accumulation: Surface,
    display: Surface,
    bloom: Surface,
    bloom_tmp: Surface,
    mask: Mask,
}

impl GlowCompositor {
    pub fn new(size: usize) -> Self {
        Self {
            accumulation: Surface::new(size, size),
            display: Surface::new(size, size),
            bloom: Surface::new(0, 0),
            bloom_tmp: Surface::new(0, 0),
            mask: Mask::new(size, size),
        }
    }

    /// Changing the size discards the trail.
    pub fn resize(&mut self, size: usize) {
        self.accumulation.resize(size, size);
        self.display.resize(size, size);
        self.mask.resize(size, size);
    }

    pub fn reset(&mut self) {
        self.accumulation.fill(BLACK);
        self.display.fill(BLACK);
        self.mask.clear();
    }

    pub fn size(&self) -> usize {
        self.accumulation.width()
    }

    pub fn accumulation(&self) -> &Surface {
        &self.accumulation
    }

    pub fn accumulation_mut(&mut self) -> &mut Surface {
        &mut self.accumulation
    }

    pub fn display(&self) -> &Surface {
        &self.display
    }

    /// Fade phase: black drawn over the trail at `1 - persistence`.
    pub fn fade(&mut self, persistence: f32) {
        self.accumulation
            .fill_blend(BLACK, 1.0 - persistence, BlendMode::SourceOver);
    }

    /// Draw phase: the selected renderer, composited additively.
    pub fn draw_beam(&mut self, scope: &ScopeConfig, analysis: &AnalysisFrame, alpha: f32) {
        let params = scope.beam_params();
        let mut canvas = Canvas::new(&mut self.accumulation, &mut self.mask, BlendMode::Lighter);
        match scope.mode {
            VisualizationMode::Waveform => {
                beam::draw_waveform(&mut canvas, scope.color, alpha, &analysis.time_domain_left, &params)
            }
            VisualizationMode::Lissajous => beam::draw_lissajous(
                &mut canvas,
                scope.color,
                alpha,
                &analysis.time_domain_left,
                &analysis.time_domain_right,
                &params,
            ),
            VisualizationMode::Spectrum => {
                beam::draw_spectrum(&mut canvas, scope.color, alpha, &analysis.frequency_data, &params)
            }
        }
    }

    /// Rebuilds the display: background, bloom halo underneath, sharp trace on top.
    pub fn compose_display(&mut self, scope: &ScopeConfig) {
        self.display.fill(rgb8(
            DISPLAY_BACKGROUND[0],
            DISPLAY_BACKGROUND[1],
            DISPLAY_BACKGROUND[2],
        ));

        if scope.bloom_radius > 0.0 {
            gaussian_blur(
                &self.accumulation,
                &mut self.bloom_tmp,
                &mut self.bloom,
                scope.bloom_radius,
            );
            self.display.draw_surface(
                &self.bloom,
                scope.glow_intensity * BLOOM_ALPHA_SCALE,
                BlendMode::SourceOver,
            );
        }

        // The trail is emitted light on black, so it adds onto the halo.
        self.display
            .draw_surface(&self.accumulation, 1.0, BlendMode::Lighter);
    }

    /// Horizontal 1px dark bands on every other row.
    pub fn apply_scanlines(&mut self, scanline_alpha: f32) {
        if scanline_alpha <= 0.0 {
            return;
        }
        let w = self.display.width();
        for y in (0..self.display.height()).step_by(2) {
            self.display
                .fill_rect(0, y, w, 1, BLACK, scanline_alpha, BlendMode::SourceOver);
        }
    }

    /// Per-pixel luminance jitter applied equally to all channels.
    pub fn apply_noise<R: Rng + ?Sized>(&mut self, noise_amount: f32, rng: &mut R) {
        if noise_amount <= 0.0 {
            return;
        }
        let scale = noise_amount * NOISE_SCALE / 255.0;
        for px in self.display.pixels_mut() {
            let n = (rng.random::<f32>() - 0.5) * scale;
            for c in px.iter_mut() {
                *c = (*c + n).clamp(0.0, 1.0);
            }
        }
    }

    /// Runs one full frame: fade, optional beam, display and CRT degradation.
    pub fn render<R: Rng + ?Sized>(
        &mut self,
        scope: &ScopeConfig,
        analysis: Option<&AnalysisFrame>,
        rng: &mut R,
    ) -> &Surface {
        self.fade(scope.persistence);
        if let Some(frame) = analysis {
            let alpha = beam_alpha(scope.flicker_amount, rng);
            self.draw_beam(scope, frame, alpha);
        }
        self.compose_display(scope);
        self.apply_scanlines(scope.scanline_alpha);
        self.apply_noise(scope.noise_amount, rng);
        &self.display
    }
}
