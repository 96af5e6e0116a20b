//! Per-frame analysis data and the analyser that produces it from decoded
//! stereo samples.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::error::{PhosphorError, Result};

pub const DEFAULT_FFT_SIZE: usize = 2048;
pub const DEFAULT_SMOOTHING: f32 = 0.8;

const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;

/// One frame of byte-quantized analysis data.
///
/// Time-domain samples are centred at 128. Frequency bins run linearly from
/// DC to Nyquist, 0 meaning silence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisFrame {
    pub time_domain_left: Vec<u8>,
    pub time_domain_right: Vec<u8>,
    pub frequency_data: Vec<u8>,
}

impl AnalysisFrame {
    /// A centred, silent frame.
    pub fn silent(fft_size: usize, bin_count: usize) -> Self {
        Self {
            time_domain_left: vec![128; fft_size],
            time_domain_right: vec![128; fft_size],
            frequency_data: vec![0; bin_count],
        }
    }
}

/// Anything that can hand the renderer one analysis frame per draw.
///
/// `None` means nothing is playing; the compositor then only fades.
pub trait AnalysisSource {
    fn analysis(&mut self) -> Option<AnalysisFrame>;
}

impl<S: AnalysisSource + ?Sized> AnalysisSource for &mut S {
    fn analysis(&mut self) -> Option<AnalysisFrame> {
        (**self).analysis()
    }
}

/// Replays a fixed list of frames, then reports nothing.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    frames: std::collections::VecDeque<Option<AnalysisFrame>>,
}

impl ScriptedSource {
    pub fn new<I: IntoIterator<Item = Option<AnalysisFrame>>>(frames: I) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl AnalysisSource for ScriptedSource {
    fn analysis(&mut self) -> Option<AnalysisFrame> {
        self.frames.pop_front().flatten()
    }
}

/// Windowed FFT analyser with byte output.
///
/// Each call looks at the `fft_size` samples ending at the read position.
/// Magnitudes are smoothed over successive calls before conversion to dB.
pub struct Analyser {
    fft_size: usize,
    smoothing: f32,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    smoothed: Vec<f32>,
    scratch: Vec<Complex<f32>>,
}

impl std::fmt::Debug for Analyser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyser")
            .field("fft_size", &self.fft_size)
            .field("smoothing", &self.smoothing)
            .finish_non_exhaustive()
    }
}

impl Analyser {
    pub fn new(fft_size: usize, smoothing: f32) -> Result<Self> {
        validate_fft_size(fft_size)?;
        validate_smoothing(smoothing)?;

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(fft_size);
        Ok(Self {
            fft_size,
            smoothing,
            fft,
            window: blackman_window(fft_size),
            smoothed: vec![0.0; fft_size / 2],
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
        })
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    pub fn smoothing(&self) -> f32 {
        self.smoothing
    }

    pub fn set_smoothing(&mut self, smoothing: f32) -> Result<()> {
        validate_smoothing(smoothing)?;
        self.smoothing = smoothing;
        Ok(())
    }

    /// Changing the size replans the transform and drops smoothing history.
    pub fn set_fft_size(&mut self, fft_size: usize) -> Result<()> {
        validate_fft_size(fft_size)?;
        if fft_size != self.fft_size {
            *self = Self::new(fft_size, self.smoothing)?;
        }
        Ok(())
    }

    /// Forgets smoothing history.
    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
    }

    /// Writes `fft_size` time-domain bytes for the window ending at `end`.
    /// Positions before the start of `samples` read as silence.
    pub fn time_domain_bytes(&self, samples: &[f32], end: usize, out: &mut Vec<u8>) {
        out.clear();
        out.extend((0..self.fft_size).map(|i| {
            let x = window_sample(samples, end, self.fft_size, i);
            (128.0 * (1.0 + x)).floor().clamp(0.0, 255.0) as u8
        }));
    }

    /// Writes `fft_size / 2` frequency bytes for the window ending at `end`
    /// and advances the smoothing state.
    pub fn frequency_bytes(&mut self, samples: &[f32], end: usize, out: &mut Vec<u8>) {
        let n = self.fft_size;
        for (i, slot) in self.scratch.iter_mut().enumerate() {
            let x = window_sample(samples, end, n, i);
            *slot = Complex::new(x * self.window[i], 0.0);
        }
        self.fft.process(&mut self.scratch);

        let tau = self.smoothing;
        let range = MAX_DECIBELS - MIN_DECIBELS;
        out.clear();
        for (k, prev) in self.smoothed.iter_mut().enumerate() {
            let magnitude = self.scratch[k].norm() / n as f32;
            *prev = tau * *prev + (1.0 - tau) * magnitude;
            let db = if *prev > 0.0 {
                20.0 * prev.log10()
            } else {
                f32::NEG_INFINITY
            };
            let scaled = (255.0 / range * (db - MIN_DECIBELS)).floor();
            out.push(scaled.clamp(0.0, 255.0) as u8);
        }
    }

    /// Full analysis frame for the stereo window ending at `end`. Frequency
    /// data follows the left channel.
    pub fn analyse(&mut self, left: &[f32], right: &[f32], end: usize) -> AnalysisFrame {
        let mut frame = AnalysisFrame {
            time_domain_left: Vec::with_capacity(self.fft_size),
            time_domain_right: Vec::with_capacity(self.fft_size),
            frequency_data: Vec::with_capacity(self.bin_count()),
        };
        self.time_domain_bytes(left, end, &mut frame.time_domain_left);
        self.time_domain_bytes(right, end, &mut frame.time_domain_right);
        self.frequency_bytes(left, end, &mut frame.frequency_data);
        frame
    }
}

#[inline]
fn window_sample(samples: &[f32], end: usize, n: usize, i: usize) -> f32 {
    let pos = end as isize - n as isize + i as isize;
    if pos < 0 {
        0.0
    } else {
        samples.get(pos as usize).copied().unwrap_or(0.0)
    }
}

fn validate_fft_size(size: usize) -> Result<()> {
    if !(32..=32768).contains(&size) || !size.is_power_of_two() {
        return Err(PhosphorError::InvalidAnalyser(format!(
            "FFT size must be a power of 2 between 32 and 32768, got {size}"
        )));
    }
    Ok(())
}

fn validate_smoothing(value: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(PhosphorError::InvalidAnalyser(format!(
            "smoothing time constant must be between 0 and 1, got {value}"
        )));
    }
    Ok(())
}

fn blackman_window(size: usize) -> Vec<f32> {
    let (a0, a1, a2) = (0.42, 0.5, 0.08);
    (0..size)
        .map(|i| {
            let phase = 2.0 * PI * i as f32 / size as f32;
            a0 - a1 * phase.cos() + a2 * (2.0 * phase).cos()
        })
        .collect()
}
