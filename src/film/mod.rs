//! Film-emulation overlay.
//!
//! Grain, scratches, dust and light leaks are layered over the composited
//! frame, then vignette, brightness flicker and colour fade are applied to
//! the whole picture. Weave is computed here but applied by the caller as a
//! translation of the picture underneath.

pub mod color_fade;
pub mod dust;
pub mod flicker;
pub mod grain;
pub mod light_leak;
pub mod scratches;
pub mod vignette;

use rand::Rng;

use crate::config::FilmConfig;
use crate::render::raster::{Canvas, Mask};
use crate::render::surface::{BlendMode, Surface};

pub use dust::{DustKind, DustParticle};
pub use flicker::Weave;
pub use grain::GrainTexture;
pub use light_leak::LightLeak;
pub use scratches::Scratch;

/// Cross-frame film state for one render session.
///
/// Never shared between sessions: each consumer ages its own particles.
#[derive(Debug, Clone, Default)]
pub struct FilmState {
    grain: GrainTexture,
    scratches: Vec<Scratch>,
    dust: Vec<DustParticle>,
    mask: Mask,
}

impl FilmState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.grain.reset();
        self.scratches.clear();
        self.dust.clear();
        self.mask.clear();
    }

    pub fn scratches(&self) -> &[Scratch] {
        &self.scratches
    }

    pub fn dust(&self) -> &[DustParticle] {
        &self.dust
    }

    /// Advances particle populations by one frame without drawing.
    ///
    /// Scratches keep ageing at zero intensity so the population drains;
    /// dust is discarded outright.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        width: f32,
        height: f32,
        cfg: &FilmConfig,
        rng: &mut R,
    ) {
        scratches::update_scratches(&mut self.scratches, width, cfg.scratches.max(0.0), rng);
        if cfg.dust > 0.0 {
            dust::update_dust(&mut self.dust, width, height, cfg.dust, rng);
        } else {
            self.dust.clear();
        }
    }

    /// Runs the full overlay for the frame at `timestamp_ms`.
    pub fn apply<R: Rng + ?Sized>(
        &mut self,
        frame: &mut Surface,
        cfg: &FilmConfig,
        timestamp_ms: f64,
        rng: &mut R,
    ) {
        if frame.is_empty() {
            return;
        }
        let (w, h) = (frame.width() as f32, frame.height() as f32);

        if cfg.grain > 0.0 {
            self.grain.update(timestamp_ms, rng);
            self.grain.draw(frame, cfg.grain);
        }

        self.step(w, h, cfg, rng);
        {
            let mut canvas = Canvas::new(frame, &mut self.mask, BlendMode::SourceOver);
            if cfg.scratches > 0.0 {
                scratches::draw_scratches(&mut canvas, &self.scratches, cfg.scratches);
            }
            if cfg.dust > 0.0 {
                dust::draw_dust(&mut canvas, &self.dust, cfg.dust, rng);
            }
        }

        if cfg.light_leaks > 0.0 {
            light_leak::draw_light_leak(frame, timestamp_ms, cfg.light_leaks);
        }

        vignette::apply_vignette(frame);

        let b = flicker::brightness(timestamp_ms, cfg.flicker, rng);
        flicker::apply_brightness(frame, b);

        color_fade::apply_color_fade(frame, cfg.color_fade, cfg.color_fade_method);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn disabled_film_only_vignettes() {
        let cfg = FilmConfig::disabled();
        let mut film = FilmState::new();
        let mut rng = StdRng::seed_from_u64(1);

        let mut frame = Surface::filled(32, 32, [0.5, 0.5, 0.5]);
        film.apply(&mut frame, &cfg, 1000.0, &mut rng);

        let mut expected = Surface::filled(32, 32, [0.5, 0.5, 0.5]);
        vignette::apply_vignette(&mut expected);
        assert_eq!(frame, expected);
        assert!(film.scratches().is_empty());
        assert!(film.dust().is_empty());
    }

    #[test]
    fn dust_population_tracks_intensity() {
        let cfg = FilmConfig {
            dust: 1.0,
            ..FilmConfig::disabled()
        };
        let mut film = FilmState::new();
        let mut rng = StdRng::seed_from_u64(2);
        let mut frame = Surface::new(64, 48);
        for i in 0..50 {
            film.apply(&mut frame, &cfg, i as f64 * 41.0, &mut rng);
            assert_eq!(film.dust().len(), 8);
        }

        let off = FilmConfig::disabled();
        film.apply(&mut frame, &off, 3000.0, &mut rng);
        assert!(film.dust().is_empty());
    }

    #[test]
    fn reset_clears_particles() {
        let cfg = FilmConfig {
            dust: 0.5,
            scratches: 1.0,
            ..FilmConfig::disabled()
        };
        let mut film = FilmState::new();
        let mut rng = StdRng::seed_from_u64(3);
        let mut frame = Surface::new(16, 16);
        for i in 0..100 {
            film.apply(&mut frame, &cfg, i as f64 * 41.0, &mut rng);
        }
        assert!(!film.dust().is_empty());
        film.reset();
        assert!(film.dust().is_empty());
        assert!(film.scratches().is_empty());
    }

    #[test]
    fn empty_frame_is_skipped() {
        let mut film = FilmState::new();
        let mut frame = Surface::new(0, 0);
        film.apply(&mut frame, &FilmConfig::default(), 0.0, &mut StdRng::seed_from_u64(4));
        assert!(film.dust().is_empty());
    }
}
