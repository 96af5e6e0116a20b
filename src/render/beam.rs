//! Beam renderers.
//!
//! Each renderer strokes the same path twice: a full-width pass in the
//! phosphor colour, then a narrow, brighter, half-transparent hotspot pass.
//! They hold no state and only write pixels through the supplied canvas.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::color::PhosphorColor;
use super::raster::{polyline, Canvas, Point};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationMode {
    #[default]
    Waveform,
    Lissajous,
    Spectrum,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamParams {
    pub gain: f32,
    /// Must be positive; callers clamp.
    pub density: f32,
    pub beam_width: f32,
}

/// Every `step`-th sample is plotted.
#[inline]
pub fn decimation_step(density: f32) -> usize {
    ((1.0 / density).floor() as usize).max(1)
}

#[inline]
fn deflection(sample: u8, gain: f32) -> f32 {
    (sample as f32 - 128.0) / 128.0 * gain
}

fn trace<I>(
    canvas: &mut Canvas<'_>,
    path: I,
    color: PhosphorColor,
    alpha: f32,
    params: &BeamParams,
    hot_width: f32,
    hot_alpha: f32,
) where
    I: IntoIterator<Item = Point>,
{
    let Some(path) = polyline(path) else {
        return;
    };
    canvas.stroke_path(&path, params.beam_width, color.rgb(), alpha);
    canvas.stroke_path(&path, params.beam_width * hot_width, color.hot(), alpha * hot_alpha);
}

/// Time-series trace around mid-height.
pub fn draw_waveform(
    canvas: &mut Canvas<'_>,
    color: PhosphorColor,
    alpha: f32,
    samples: &[u8],
    params: &BeamParams,
) {
    let width = canvas.width() as f32;
    let height = canvas.height() as f32;
    let len = samples.len();
    let mid_y = height / 2.0;
    let scale = height * 0.4;
    let gain = params.gain;

    let path = (0..len)
        .step_by(decimation_step(params.density))
        .map(move |i| {
            let x = i as f32 / len as f32 * width;
            (x, mid_y - deflection(samples[i], gain) * scale)
        });
    trace(canvas, path, color, alpha, params, 0.4, 0.5);
}

/// XY plot: left channel on x, right channel on y.
pub fn draw_lissajous(
    canvas: &mut Canvas<'_>,
    color: PhosphorColor,
    alpha: f32,
    left: &[u8],
    right: &[u8],
    params: &BeamParams,
) {
    let width = canvas.width() as f32;
    let height = canvas.height() as f32;
    let len = left.len().min(right.len());
    let cx = width / 2.0;
    let cy = height / 2.0;
    let scale = width.min(height) * 0.4;
    let gain = params.gain;

    let path = (0..len)
        .step_by(decimation_step(params.density))
        .map(move |i| {
            let x = cx + deflection(left[i], gain) * scale;
            let y = cy - deflection(right[i], gain) * scale;
            (x, y)
        });
    trace(canvas, path, color, alpha, params, 0.3, 0.5);
}

/// Column height for output column `i` of `bar_count` on the logarithmic axis.
pub fn spectrum_level(frequency: &[u8], i: usize, bar_count: usize, gain: f32) -> f32 {
    let len = frequency.len();
    if len == 0 || bar_count == 0 {
        return 0.0;
    }
    let log_min = 1f32.ln();
    let log_max = (len as f32).ln();
    let log_index = log_min + (i as f32 / bar_count as f32) * (log_max - log_min);
    let index = (log_index.exp().floor() as usize).min(len - 1);
    let value = frequency[index] as f32 / 255.0;
    value.powf(0.7) * gain
}

/// Continuous top-edge line over a log-frequency axis.
pub fn draw_spectrum(
    canvas: &mut Canvas<'_>,
    color: PhosphorColor,
    alpha: f32,
    frequency: &[u8],
    params: &BeamParams,
) {
    if frequency.is_empty() {
        return;
    }
    let width = canvas.width() as f32;
    let height = canvas.height() as f32;
    let bar_count = (width * params.density * 0.5).floor() as usize;
    let gain = params.gain;

    let path = (0..bar_count).map(move |i| {
        let x = i as f32 / bar_count as f32 * width;
        let bar_h = spectrum_level(frequency, i, bar_count, gain) * height * 0.85;
        (x, height - bar_h)
    });
    trace(canvas, path, color, alpha, params, 0.3, 0.4);
}
