use crate::render::surface::{rgb8, BlendMode, Surface};

const VISIBILITY_THRESHOLD: f64 = 0.05;

/// Light leak state at one instant. Positions are percentages of the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightLeak {
    pub visible: bool,
    pub opacity: f32,
    pub hue: f32,
    pub x_pct: f32,
    pub y_pct: f32,
}

impl LightLeak {
    const HIDDEN: LightLeak = LightLeak {
        visible: false,
        opacity: 0.0,
        hue: 0.0,
        x_pct: 50.0,
        y_pct: 30.0,
    };
}

/// Two slow oscillators multiplied together; the leak shows while their
/// positive product, scaled by intensity, exceeds 0.05.
pub fn light_leak_params(timestamp_ms: f64, intensity: f32) -> LightLeak {
    if intensity <= 0.0 {
        return LightLeak::HIDDEN;
    }
    let t = timestamp_ms * 0.001;
    let cycle = (t * 0.3).sin() * (t * 0.7).sin();
    let leak = cycle.max(0.0) * intensity as f64;
    if leak <= VISIBILITY_THRESHOLD {
        return LightLeak::HIDDEN;
    }

    LightLeak {
        visible: true,
        opacity: (leak * 0.3) as f32,
        hue: (20.0 + (t * 0.5).sin() * 15.0) as f32,
        x_pct: (50.0 + (t * 0.4).sin() * 40.0) as f32,
        y_pct: (30.0 + (t * 0.6).sin() * 20.0) as f32,
    }
}

/// Warm tone of the leak, drifting between orange and amber.
pub fn leak_rgb8(timestamp_ms: f64) -> (u8, u8, u8) {
    let t = timestamp_ms * 0.001;
    let g = (120.0 + (t * 0.5).sin() * 40.0).floor() as u8;
    (255, g, 30)
}

/// Screens a radial gradient onto the frame. Its centre alpha is half the
/// leak opacity, falling linearly to nothing at half the frame width.
pub fn draw_light_leak(frame: &mut Surface, timestamp_ms: f64, intensity: f32) {
    let leak = light_leak_params(timestamp_ms, intensity);
    if !leak.visible || frame.is_empty() {
        return;
    }

    let (w, h) = (frame.width(), frame.height());
    let cx = w as f32 * leak.x_pct / 100.0;
    let cy = h as f32 * leak.y_pct / 100.0;
    let radius = w as f32 * 0.5;
    let (r, g, b) = leak_rgb8(timestamp_ms);
    let color = rgb8(r, g, b);
    let peak = leak.opacity * 0.5;

    let x0 = (cx - radius).floor().max(0.0) as usize;
    let x1 = ((cx + radius).ceil().max(0.0) as usize).min(w);
    let y0 = (cy - radius).floor().max(0.0) as usize;
    let y1 = ((cy + radius).ceil().max(0.0) as usize).min(h);
    for y in y0..y1 {
        let dy = y as f32 + 0.5 - cy;
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - cx;
            let d = (dx * dx + dy * dy).sqrt() / radius;
            if d < 1.0 {
                frame.blend_pixel(x, y, color, peak * (1.0 - d), BlendMode::Screen);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_at_zero_intensity() {
        for i in 0..100 {
            assert!(!light_leak_params(i as f64 * 997.0, 0.0).visible);
        }
    }

    #[test]
    fn hidden_at_time_zero() {
        assert!(!light_leak_params(0.0, 1.0).visible);
    }

    #[test]
    fn visible_near_cycle_peak() {
        // The oscillator product peaks near 0.69 around t = 2.8 s.
        let leak = light_leak_params(2_800.0, 1.0);
        assert!(leak.visible);
        assert!(leak.opacity > 0.15 && leak.opacity <= 0.3);
        assert!((0.0..=100.0).contains(&leak.x_pct));
        assert!((10.0..=50.0).contains(&leak.y_pct));
    }

    #[test]
    fn leak_only_brightens() {
        let mut frame = Surface::filled(40, 30, [0.2, 0.2, 0.2]);
        draw_light_leak(&mut frame, 2_800.0, 1.0);
        assert!(frame.pixels().iter().all(|p| p.iter().all(|&c| c >= 0.2)));
        assert!(frame.mean_luminance() > 0.2);
    }

    #[test]
    fn warm_tone_range() {
        for i in 0..50 {
            let (r, g, b) = leak_rgb8(i as f64 * 500.0);
            assert_eq!((r, b), (255, 30));
            assert!((80..=160).contains(&g));
        }
    }
}
