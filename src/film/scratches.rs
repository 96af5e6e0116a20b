use rand::Rng;

use vello_cpu::kurbo::BezPath;

use crate::render::raster::{polyline, Canvas};
use crate::render::surface::rgb8;

const SPAWN_RATE: f32 = 0.08;
const WOBBLE_STEP: usize = 20;
const BRIGHT: (u8, u8, u8) = (255, 250, 240);
const DARK: (u8, u8, u8) = (20, 15, 10);

/// A transient vertical line defect.
#[derive(Debug, Clone, PartialEq)]
pub struct Scratch {
    pub x: f32,
    pub width: f32,
    pub opacity: f32,
    /// Frames left to live.
    pub life: u32,
    /// Horizontal sway amplitude in pixels.
    pub wobble: f32,
    pub bright: bool,
}

impl Scratch {
    pub fn random<R: Rng + ?Sized>(frame_width: f32, rng: &mut R) -> Self {
        Self {
            x: rng.random::<f32>() * frame_width,
            width: 0.5 + rng.random::<f32>() * 1.5,
            opacity: 0.3 + rng.random::<f32>() * 0.7,
            life: 2 + (rng.random::<f32>() * 8.0).floor() as u32,
            wobble: (rng.random::<f32>() - 0.5) * 2.0,
            bright: rng.random::<f32>() > 0.5,
        }
    }

    /// Fades out over the last ten frames of life.
    pub fn alpha(&self) -> f32 {
        self.opacity * (self.life as f32 / 10.0)
    }

    /// Points of the swaying line from top to bottom.
    pub fn path(&self, height: f32) -> BezPath {
        let rows = (height.max(0.0).ceil() as usize).div_ceil(WOBBLE_STEP);
        let points = std::iter::once((self.x, 0.0))
            .chain((0..rows).map(|i| {
                let y = (i * WOBBLE_STEP) as f32;
                (self.x + (y * 0.01).sin() * self.wobble, y)
            }))
            .chain(std::iter::once((
                self.x + (height * 0.01).sin() * self.wobble,
                height,
            )));
        polyline(points).unwrap_or_default()
    }
}

/// Ages every scratch by one frame, drops expired ones, and maybe spawns one.
///
/// An entry survives while its remaining life was positive before ageing.
/// At zero intensity nothing spawns, so the list drains on its own.
pub fn update_scratches<R: Rng + ?Sized>(
    scratches: &mut Vec<Scratch>,
    frame_width: f32,
    intensity: f32,
    rng: &mut R,
) {
    scratches.retain_mut(|s| {
        let alive = s.life > 0;
        s.life = s.life.saturating_sub(1);
        alive
    });

    if rng.random::<f32>() < SPAWN_RATE * intensity {
        scratches.push(Scratch::random(frame_width, rng));
    }
}

/// Strokes every scratch onto the canvas with `layer_alpha` applied on top
/// of each scratch's own fade.
pub fn draw_scratches(canvas: &mut Canvas<'_>, scratches: &[Scratch], layer_alpha: f32) {
    let height = canvas.height() as f32;
    for s in scratches {
        let (r, g, b) = if s.bright { BRIGHT } else { DARK };
        canvas.stroke_path(&s.path(height), s.width, rgb8(r, g, b), s.alpha() * layer_alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scratch(life: u32) -> Scratch {
        Scratch {
            x: 10.0,
            width: 1.0,
            opacity: 1.0,
            life,
            wobble: 0.0,
            bright: true,
        }
    }

    #[test]
    fn spawned_fields_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let s = Scratch::random(640.0, &mut rng);
            assert!((0.0..640.0).contains(&s.x));
            assert!((0.5..2.0).contains(&s.width));
            assert!((0.3..1.0).contains(&s.opacity));
            assert!((2..=9).contains(&s.life));
            assert!((-1.0..1.0).contains(&s.wobble));
        }
    }

    #[test]
    fn ageing_keeps_entry_for_its_last_frame() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut list = vec![scratch(1)];
        update_scratches(&mut list, 100.0, 0.0, &mut rng);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].life, 0);
        assert_eq!(list[0].alpha(), 0.0);
        update_scratches(&mut list, 100.0, 0.0, &mut rng);
        assert!(list.is_empty());
    }

    #[test]
    fn zero_intensity_drains_within_max_life() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut list: Vec<Scratch> = (0..20).map(|_| Scratch::random(100.0, &mut rng)).collect();
        let max_life = list.iter().map(|s| s.life).max().unwrap();
        for _ in 0..=max_life {
            update_scratches(&mut list, 100.0, 0.0, &mut rng);
        }
        assert!(list.is_empty());
        for _ in 0..100 {
            update_scratches(&mut list, 100.0, 0.0, &mut rng);
            assert!(list.is_empty());
        }
    }

    #[test]
    fn full_intensity_spawns_sometimes() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut list = Vec::new();
        let mut peak = 0;
        for _ in 0..500 {
            update_scratches(&mut list, 100.0, 1.0, &mut rng);
            peak = peak.max(list.len());
        }
        assert!(peak >= 1);
        assert!(peak < 10);
    }

    #[test]
    fn path_spans_full_height() {
        let s = scratch(5);
        let pts: Vec<_> = s
            .path(100.0)
            .elements()
            .iter()
            .filter_map(|el| el.end_point())
            .collect();
        assert_eq!(pts.first().map(|p| (p.x, p.y)), Some((10.0, 0.0)));
        assert_eq!(pts.last().map(|p| p.y), Some(100.0));
        assert!(pts.iter().all(|p| p.x == 10.0));
    }
}
