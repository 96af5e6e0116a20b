use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use phosphor::film::dust::{target_count, update_dust};
use phosphor::film::flicker::{self, Weave, MAX_BRIGHTNESS, MIN_BRIGHTNESS};
use phosphor::film::scratches::{update_scratches, Scratch};
use phosphor::render::beam::spectrum_level;
use phosphor::render::surface::{BLACK, WHITE};
use phosphor::render::GlowCompositor;
use phosphor::{AnalysisFrame, ScopeConfig, VisualizationMode};

fn bare_scope(mode: VisualizationMode) -> ScopeConfig {
    ScopeConfig {
        mode,
        gain: 1.0,
        density: 1.0,
        bloom_radius: 0.0,
        scanline_alpha: 0.0,
        noise_amount: 0.0,
        flicker_amount: 0.0,
        ..ScopeConfig::default()
    }
}

#[test]
fn trail_decays_by_persistence_each_frame() {
    let mut glow = GlowCompositor::new(8);
    glow.accumulation_mut().fill(WHITE);
    for _ in 0..10 {
        glow.fade(0.9);
    }
    let p = glow.accumulation().get(3, 3);
    assert_relative_eq!(p[0], 0.9f32.powi(10), max_relative = 1e-4);
    assert_relative_eq!(p[1], p[0]);
}

#[test]
fn silence_draws_a_flat_line_at_mid_height() {
    let mut glow = GlowCompositor::new(100);
    let frame = AnalysisFrame::silent(256, 128);
    glow.draw_beam(&bare_scope(VisualizationMode::Waveform), &frame, 0.9);

    let acc = glow.accumulation();
    for x in [5, 50, 95] {
        assert!(acc.get(x, 50)[1] > 0.5, "column {x} should be lit");
        assert_eq!(acc.get(x, 10), BLACK);
        assert_eq!(acc.get(x, 90), BLACK);
    }
}

#[test]
fn identical_channels_trace_the_diagonal() {
    let mut glow = GlowCompositor::new(100);
    let ramp: Vec<u8> = (0..=255).collect();
    let frame = AnalysisFrame {
        time_domain_left: ramp.clone(),
        time_domain_right: ramp,
        frequency_data: vec![0; 128],
    };
    glow.draw_beam(&bare_scope(VisualizationMode::Lissajous), &frame, 0.9);

    let acc = glow.accumulation();
    // x + y == 100 along the trace.
    assert!(acc.get(69, 30)[1] > 0.5);
    assert!(acc.get(49, 50)[1] > 0.5);
    assert_eq!(acc.get(30, 30), BLACK);
    assert_eq!(acc.get(70, 70), BLACK);
}

#[test]
fn spectrum_levels_follow_rising_bins() {
    let rising: Vec<u8> = (0..128).map(|i| (i * 2) as u8).collect();
    let levels: Vec<f32> = (0..64).map(|i| spectrum_level(&rising, i, 64, 1.0)).collect();
    assert!(levels.windows(2).all(|w| w[1] >= w[0]));

    let full = vec![255u8; 128];
    for i in 0..64 {
        assert_relative_eq!(spectrum_level(&full, i, 64, 0.5), 0.5, epsilon = 1e-6);
    }
}

#[test]
fn scratches_drain_once_intensity_drops() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut scratches: Vec<Scratch> = (0..5).map(|_| Scratch::random(640.0, &mut rng)).collect();
    // Longest possible life is 9 frames.
    for _ in 0..10 {
        update_scratches(&mut scratches, 640.0, 0.0, &mut rng);
    }
    assert!(scratches.is_empty());
}

#[test]
fn dust_population_holds_steady() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut dust = Vec::new();
    for _ in 0..200 {
        update_dust(&mut dust, 640.0, 480.0, 0.5, &mut rng);
        assert_eq!(dust.len(), target_count(0.5));
    }
    assert_eq!(target_count(0.5), 5);
}

#[test]
fn flicker_stays_in_range() {
    let mut rng = StdRng::seed_from_u64(3);
    for i in 0..2_000 {
        let t = i as f64 * 17.0;
        let b = flicker::brightness(t, 1.0, &mut rng);
        assert!((MIN_BRIGHTNESS..=MAX_BRIGHTNESS).contains(&b), "{b} at {t}ms");
        assert_eq!(flicker::brightness(t, 0.0, &mut rng), 1.0);
    }
}

#[test]
fn weave_is_still_without_intensity() {
    for t in [0.0, 123.0, 98_765.0] {
        assert_eq!(flicker::weave(t, 0.0), Weave::default());
    }
    let w = flicker::weave(1_000.0, 1.0);
    assert!(w.x.abs() <= 0.5 && w.y.abs() <= 0.68);
}
