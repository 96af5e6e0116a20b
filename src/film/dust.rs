use std::f32::consts::PI;

use rand::Rng;

use vello_cpu::kurbo::BezPath;

use crate::render::raster::{polyline, Canvas};
use crate::render::surface::rgb8;

const HAIR_SEGMENTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DustKind {
    Speck,
    Hair,
    Blob,
}

/// Specks are three times as common as hairs or blobs.
const KIND_TABLE: [DustKind; 5] = [
    DustKind::Speck,
    DustKind::Speck,
    DustKind::Speck,
    DustKind::Hair,
    DustKind::Blob,
];

#[derive(Debug, Clone, PartialEq)]
pub struct DustParticle {
    pub kind: DustKind,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub angle: f32,
    pub length: f32,
    pub curve: f32,
    pub opacity: f32,
    pub life: u32,
}

impl DustParticle {
    pub fn random<R: Rng + ?Sized>(width: f32, height: f32, rng: &mut R) -> Self {
        let pick = (rng.random::<f32>() * KIND_TABLE.len() as f32) as usize;
        let kind = KIND_TABLE[pick.min(KIND_TABLE.len() - 1)];
        let x = rng.random::<f32>() * width;
        let y = rng.random::<f32>() * height;
        let size = match kind {
            DustKind::Speck => 1.0 + rng.random::<f32>() * 2.0,
            _ => 2.0 + rng.random::<f32>() * 3.0,
        };
        Self {
            kind,
            x,
            y,
            size,
            angle: rng.random::<f32>() * PI,
            length: 15.0 + rng.random::<f32>() * 30.0,
            curve: (rng.random::<f32>() - 0.5) * 0.1,
            opacity: 0.1 + rng.random::<f32>() * 0.2,
            life: 60 + (rng.random::<f32>() * 200.0).floor() as u32,
        }
    }

    /// Hair fibre outline: a sine-bowed segment rotated by `angle` about its root.
    pub fn hair_path(&self) -> BezPath {
        let (sin, cos) = self.angle.sin_cos();
        polyline((0..=HAIR_SEGMENTS).map(|i| {
            let t = i as f32 / HAIR_SEGMENTS as f32;
            let lx = self.length * t;
            let ly = (t * PI).sin() * self.length * self.curve;
            (self.x + lx * cos - ly * sin, self.y + lx * sin + ly * cos)
        }))
        .unwrap_or_default()
    }
}

/// Population size maintained at `intensity`.
pub fn target_count(intensity: f32) -> usize {
    3 + (intensity * 5.0).floor().max(0.0) as usize
}

/// Ages particles, prunes the expired, and tops the population back up.
pub fn update_dust<R: Rng + ?Sized>(
    particles: &mut Vec<DustParticle>,
    width: f32,
    height: f32,
    intensity: f32,
    rng: &mut R,
) {
    particles.retain_mut(|p| {
        let alive = p.life > 0;
        p.life = p.life.saturating_sub(1);
        alive
    });

    let target = target_count(intensity);
    while particles.len() < target {
        particles.push(DustParticle::random(width, height, rng));
    }
}

/// Hair stroke width and blob rotation are re-rolled on every draw, so
/// fibres and blobs shimmer slightly from frame to frame.
pub fn draw_dust<R: Rng + ?Sized>(
    canvas: &mut Canvas<'_>,
    particles: &[DustParticle],
    layer_alpha: f32,
    rng: &mut R,
) {
    for p in particles {
        let alpha = p.opacity * layer_alpha;
        match p.kind {
            DustKind::Speck => canvas.fill_circle((p.x, p.y), p.size, rgb8(20, 15, 10), alpha),
            DustKind::Hair => {
                let width = 0.5 + rng.random::<f32>() * 0.5;
                canvas.stroke_path(&p.hair_path(), width, rgb8(30, 25, 15), alpha);
            }
            DustKind::Blob => {
                let rotation = rng.random::<f32>();
                canvas.fill_ellipse(
                    (p.x, p.y),
                    p.size,
                    p.size * 0.6,
                    rotation,
                    rgb8(15, 10, 5),
                    alpha,
                );
            }
        }
    }
}
