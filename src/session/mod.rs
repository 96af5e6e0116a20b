//! Per-consumer rendering pipeline.
//!
//! A [`RenderSession`] owns every piece of cross-frame state: the glow
//! buffers, the film particles, the virtual clock and the random source.
//! Preview and recording each build their own session, so neither can age
//! the other's particles or leave trails in the other's buffers.

pub mod clock;
pub mod driver;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::audio::analysis::AnalysisFrame;
use crate::config::{FilmConfig, ScopeConfig};
use crate::film::{flicker, FilmState, Weave};
use crate::render::glow::GlowCompositor;
use crate::render::surface::{BlendMode, Surface, BLACK};

use self::clock::VirtualClock;

/// Share of the frame's short side taken by the round CRT screen.
const CRT_FILL: f32 = 0.9;

/// Placement of the square scope display inside the output frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrtLayout {
    pub x: usize,
    pub y: usize,
    pub size: usize,
}

impl CrtLayout {
    pub fn for_frame(width: usize, height: usize) -> Self {
        let size = (width.min(height) as f32 * CRT_FILL).ceil() as usize;
        let size = size.min(width.min(height));
        Self {
            x: (width - size) / 2,
            y: (height - size) / 2,
            size,
        }
    }
}

pub struct RenderSession<R: Rng = StdRng> {
    frame: Surface,
    layout: CrtLayout,
    glow: GlowCompositor,
    film: FilmState,
    clock: VirtualClock,
    rng: R,
}

impl RenderSession<StdRng> {
    /// Reproducible session for tests and seeded exports.
    pub fn seeded(width: usize, height: usize, seed: u64) -> Self {
        Self::new(width, height, StdRng::seed_from_u64(seed))
    }

    pub fn from_os_rng(width: usize, height: usize) -> Self {
        Self::new(width, height, StdRng::from_os_rng())
    }
}

impl<R: Rng> RenderSession<R> {
    pub fn new(width: usize, height: usize, rng: R) -> Self {
        let layout = CrtLayout::for_frame(width, height);
        Self {
            frame: Surface::new(width, height),
            layout,
            glow: GlowCompositor::new(layout.size),
            film: FilmState::new(),
            clock: VirtualClock::new(),
            rng,
        }
    }

    /// Resizes every buffer. A size change discards the glow trail.
    pub fn resize(&mut self, width: usize, height: usize) {
        if self.frame.resize(width, height) {
            self.layout = CrtLayout::for_frame(width, height);
            self.glow.resize(self.layout.size);
            log::debug!("Session resized to {}x{}", width, height);
        }
    }

    /// Clears trails, particles and the virtual clock.
    pub fn reset(&mut self) {
        self.glow.reset();
        self.film.reset();
        self.clock.reset();
        self.frame.fill(BLACK);
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn layout(&self) -> CrtLayout {
        self.layout
    }

    pub fn timestamp_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.clock.frames()
    }

    pub fn frame(&self) -> &Surface {
        &self.frame
    }

    pub fn glow(&self) -> &GlowCompositor {
        &self.glow
    }

    pub fn film(&self) -> &FilmState {
        &self.film
    }

    /// Advances the virtual clock by `delta_ms` and renders at the new time.
    pub fn advance(
        &mut self,
        delta_ms: f64,
        scope: &ScopeConfig,
        film: &FilmConfig,
        analysis: Option<&AnalysisFrame>,
    ) -> &Surface {
        let now = self.clock.advance(delta_ms);
        self.render_at(now, scope, film, analysis)
    }

    /// Renders one frame at an explicit timestamp.
    ///
    /// A zero-sized session renders nothing. Without analysis data the
    /// trail only fades.
    pub fn render_at(
        &mut self,
        timestamp_ms: f64,
        scope: &ScopeConfig,
        film: &FilmConfig,
        analysis: Option<&AnalysisFrame>,
    ) -> &Surface {
        if self.frame.is_empty() || self.layout.size == 0 {
            log::trace!("Skipping frame for empty surface");
            return &self.frame;
        }

        self.glow.render(scope, analysis, &mut self.rng);

        let weave = flicker::weave(timestamp_ms, film.weave);
        compose_crt(&mut self.frame, self.glow.display(), self.layout, weave);

        self.film
            .apply(&mut self.frame, film, timestamp_ms, &mut self.rng);
        &self.frame
    }
}

/// Clears `frame` to black and draws `display` into the round CRT area,
/// shifted by `weave` with bilinear sampling. The circle edge is antialiased.
pub fn compose_crt(frame: &mut Surface, display: &Surface, layout: CrtLayout, weave: Weave) {
    frame.fill(BLACK);

    let radius = layout.size as f32 / 2.0;
    let ox = layout.x as f32 + weave.x;
    let oy = layout.y as f32 + weave.y;
    let (cx, cy) = (ox + radius, oy + radius);

    let x0 = (cx - radius - 1.0).floor().max(0.0) as usize;
    let y0 = (cy - radius - 1.0).floor().max(0.0) as usize;
    let x1 = ((cx + radius + 1.0).ceil().max(0.0) as usize).min(frame.width());
    let y1 = ((cy + radius + 1.0).ceil().max(0.0) as usize).min(frame.height());

    for y in y0..y1 {
        let py = y as f32 + 0.5;
        for x in x0..x1 {
            let px = x as f32 + 0.5;
            let d = ((px - cx).powi(2) + (py - cy).powi(2)).sqrt();
            let coverage = (radius + 0.5 - d).clamp(0.0, 1.0);
            if coverage <= 0.0 {
                continue;
            }
            let color = display.sample_bilinear(px - ox, py - oy);
            frame.blend_pixel(x, y, color, coverage, BlendMode::SourceOver);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::surface::WHITE;

    #[test]
    fn layout_is_centred_square() {
        let l = CrtLayout::for_frame(1920, 1080);
        assert_eq!(l.size, 972);
        assert_eq!(l.x, (1920 - 972) / 2);
        assert_eq!(l.y, (1080 - 972) / 2);

        let tall = CrtLayout::for_frame(1080, 1920);
        assert_eq!(tall.size, 972);
        assert!(tall.y > tall.x);
    }

    #[test]
    fn crt_is_clipped_to_a_circle() {
        let display = Surface::filled(20, 20, WHITE);
        let mut frame = Surface::new(40, 20);
        let layout = CrtLayout { x: 10, y: 0, size: 20 };
        compose_crt(&mut frame, &display, layout, Weave::default());
        assert_eq!(frame.get(20, 10), WHITE);
        assert_eq!(frame.get(10, 0), BLACK);
        assert_eq!(frame.get(2, 10), BLACK);
    }

    #[test]
    fn zero_weave_copies_pixels_exactly() {
        let mut display = Surface::new(10, 10);
        display.blend_pixel(5, 5, WHITE, 1.0, BlendMode::SourceOver);
        let mut frame = Surface::new(10, 10);
        let layout = CrtLayout { x: 0, y: 0, size: 10 };
        compose_crt(&mut frame, &display, layout, Weave::default());
        assert_eq!(frame.get(5, 5), WHITE);
        assert_eq!(frame.get(4, 5), BLACK);
    }

    #[test]
    fn empty_session_skips_frame() {
        let mut session = RenderSession::seeded(0, 0, 1);
        let frame = session.advance(41.0, &ScopeConfig::default(), &FilmConfig::default(), None);
        assert!(frame.is_empty());
    }

    #[test]
    fn reset_restarts_clock_and_film() {
        let mut session = RenderSession::seeded(32, 32, 2);
        let film = FilmConfig::default();
        for _ in 0..5 {
            session.advance(41.0, &ScopeConfig::default(), &film, None);
        }
        assert!(session.timestamp_ms() > 0.0);
        assert!(!session.film().dust().is_empty());
        session.reset();
        assert_eq!(session.timestamp_ms(), 0.0);
        assert!(session.film().dust().is_empty());
    }
}
