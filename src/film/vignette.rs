use crate::render::surface::{BlendMode, Surface, BLACK};

/// `(offset, black alpha)` stops between the inner and outer radius.
const STOPS: [(f32, f32); 3] = [(0.0, 0.0), (0.7, 0.15), (1.0, 0.5)];

/// Black alpha at `t` along the gradient, held at the end stops outside [0, 1].
pub fn vignette_alpha(t: f32) -> f32 {
    if t <= STOPS[0].0 {
        return STOPS[0].1;
    }
    for pair in STOPS.windows(2) {
        let (t0, a0) = pair[0];
        let (t1, a1) = pair[1];
        if t <= t1 {
            return a0 + (a1 - a0) * (t - t0) / (t1 - t0);
        }
    }
    STOPS[STOPS.len() - 1].1
}

/// Radial edge darkening centred on the frame. The gradient runs from a
/// quarter of the short side out to 0.7 of the long side.
pub fn apply_vignette(frame: &mut Surface) {
    if frame.is_empty() {
        return;
    }
    let (w, h) = (frame.width(), frame.height());
    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
    let inner = w.min(h) as f32 * 0.25;
    let outer = w.max(h) as f32 * 0.7;
    let span = outer - inner;

    for y in 0..h {
        let dy = y as f32 + 0.5 - cy;
        for x in 0..w {
            let dx = x as f32 + 0.5 - cx;
            let d = (dx * dx + dy * dy).sqrt();
            let alpha = vignette_alpha((d - inner) / span);
            if alpha > 0.0 {
                frame.blend_pixel(x, y, BLACK, alpha, BlendMode::SourceOver);
            }
        }
    }
}
