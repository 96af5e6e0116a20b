use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::encode::VideoFormat;
use crate::error::{PhosphorError, Result};
use crate::film::color_fade::ColorFadeMethod;
use crate::render::beam::{BeamParams, VisualizationMode};
use crate::render::color::PhosphorColor;

const CONFIG_FILE: &str = "phosphor.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub scope: ScopeConfig,
    #[serde(default)]
    pub film: FilmConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: VideoFormat,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_crf")]
    pub crf: u32,
    #[serde(default = "default_codec")]
    pub codec: String,
    #[serde(default = "default_pix_fmt")]
    pub pix_fmt: String,
}

/// Analyser settings for file-backed sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    #[serde(default = "default_smoothing")]
    pub smoothing: f32,
}

/// Beam and CRT parameters. Values are used as given; nothing is clamped
/// here except `density`, which the renderers need to be positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    pub mode: VisualizationMode,
    pub color: PhosphorColor,
    pub persistence: f32,
    pub glow_intensity: f32,
    pub beam_width: f32,
    pub bloom_radius: f32,
    pub gain: f32,
    pub density: f32,
    pub scanline_alpha: f32,
    pub noise_amount: f32,
    pub flicker_amount: f32,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            mode: VisualizationMode::Waveform,
            color: PhosphorColor::Green,
            persistence: 0.85,
            glow_intensity: 1.5,
            beam_width: 2.0,
            bloom_radius: 12.0,
            gain: 1.0,
            density: 1.0,
            scanline_alpha: 0.08,
            noise_amount: 0.02,
            flicker_amount: 0.02,
        }
    }
}

impl ScopeConfig {
    pub fn beam_params(&self) -> BeamParams {
        BeamParams {
            gain: self.gain,
            density: if self.density > 0.0 { self.density } else { f32::MIN_POSITIVE },
            beam_width: self.beam_width,
        }
    }
}

/// Film effect intensities, each in `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilmConfig {
    pub grain: f32,
    pub weave: f32,
    pub flicker: f32,
    pub scratches: f32,
    pub light_leaks: f32,
    pub dust: f32,
    pub color_fade: f32,
    pub color_fade_method: ColorFadeMethod,
}

impl Default for FilmConfig {
    fn default() -> Self {
        Self {
            grain: 0.4,
            weave: 0.4,
            flicker: 0.15,
            scratches: 0.3,
            light_leaks: 0.3,
            dust: 0.5,
            color_fade: 0.15,
            color_fade_method: ColorFadeMethod::SepiaBlend,
        }
    }
}

impl FilmConfig {
    /// Every effect switched off.
    pub fn disabled() -> Self {
        Self {
            grain: 0.0,
            weave: 0.0,
            flicker: 0.0,
            scratches: 0.0,
            light_leaks: 0.0,
            dust: 0.0,
            color_fade: 0.0,
            ..Self::default()
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: VideoFormat::default(),
            fps: default_fps(),
            crf: default_crf(),
            codec: default_codec(),
            pix_fmt: default_pix_fmt(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            smoothing: default_smoothing(),
        }
    }
}

fn default_fps() -> u32 { 24 }
fn default_crf() -> u32 { 18 }
fn default_codec() -> String { "libx264".into() }
fn default_pix_fmt() -> String { "yuv420p".into() }
fn default_fft_size() -> usize { 2048 }
fn default_smoothing() -> f32 { 0.8 }

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content).map_err(|e| match e {
        PhosphorError::Config(msg) => {
            PhosphorError::Config(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })
}

pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).map_err(|e| PhosphorError::Config(e.to_string()))
}

/// Explicit path first, then `./phosphor.toml`, then the user config dir.
pub fn find_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = PathBuf::from(CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("phosphor").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Loads the file found by [`find_config_path`], or defaults when none exists.
pub fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    match find_config_path(explicit) {
        Some(path) => {
            log::info!("Loading config from {}", path.display());
            load_config(&path)
        }
        None => {
            log::debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_scope_presets() {
        let c = Config::default();
        assert_eq!(c.scope.persistence, 0.85);
        assert_eq!(c.scope.bloom_radius, 12.0);
        assert_eq!(c.film.dust, 0.5);
        assert_eq!(c.output.fps, 24);
        assert_eq!(c.audio.fft_size, 2048);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let c = parse_config(
            r#"
            [scope]
            mode = "lissajous"
            color = "amber"
            persistence = 0.5

            [film]
            grain = 0.0
            color_fade_method = "filter_chain"
            "#,
        )
        .unwrap();
        assert_eq!(c.scope.mode, VisualizationMode::Lissajous);
        assert_eq!(c.scope.color, PhosphorColor::Amber);
        assert_eq!(c.scope.persistence, 0.5);
        assert_eq!(c.scope.gain, 1.0);
        assert_eq!(c.film.grain, 0.0);
        assert_eq!(c.film.weave, 0.4);
        assert_eq!(c.film.color_fade_method, ColorFadeMethod::FilterChain);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let err = parse_config("[scope]\npersistence = \"high\"").unwrap_err();
        assert!(matches!(err, PhosphorError::Config(_)));
    }

    #[test]
    fn non_positive_density_is_clamped_for_renderers() {
        let scope = ScopeConfig {
            density: 0.0,
            ..ScopeConfig::default()
        };
        assert!(scope.beam_params().density > 0.0);
    }

    #[test]
    fn explicit_path_wins() {
        let p = Path::new("/tmp/somewhere.toml");
        assert_eq!(find_config_path(Some(p)), Some(p.to_path_buf()));
    }
}
