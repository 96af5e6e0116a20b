use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use phosphor::config::Config;
use phosphor::{FilmConfig, PhosphorColor, VideoFormat, VisualizationMode};

#[derive(Parser, Debug)]
#[command(name = "phosphor", version, about = "Phosphor oscilloscope visualizer with film emulation")]
pub struct Cli {
    /// Config file (defaults to ./phosphor.toml, then the user config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record an audio file to video at a fixed frame rate
    Render(RenderArgs),
    /// Run the real-time loop without writing video
    Preview(PreviewArgs),
    /// Print the resolved configuration
    Config {
        /// Print JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
    /// List the output format presets
    Formats,
}

/// Scope and film overrides shared by `render` and `preview`.
#[derive(Args, Debug, Clone, Default)]
pub struct LookArgs {
    /// Visualization mode
    #[arg(short, long, value_enum)]
    pub mode: Option<VisualizationMode>,

    /// Phosphor color
    #[arg(long, value_enum)]
    pub color: Option<PhosphorColor>,

    /// Trail persistence; values outside 0-1 are clamped
    #[arg(long)]
    pub persistence: Option<f32>,

    /// Input gain
    #[arg(long)]
    pub gain: Option<f32>,

    /// Disable every film effect except the vignette
    #[arg(long)]
    pub no_film: bool,

    /// Seed for reproducible noise, grain and particles
    #[arg(long)]
    pub seed: Option<u64>,
}

impl LookArgs {
    /// Command-line values win over the config file.
    pub fn apply(&self, config: &mut Config) {
        if let Some(mode) = self.mode {
            config.scope.mode = mode;
        }
        if let Some(color) = self.color {
            config.scope.color = color;
        }
        if let Some(persistence) = self.persistence {
            config.scope.persistence = persistence.clamp(0.0, 1.0);
        }
        if let Some(gain) = self.gain {
            config.scope.gain = gain;
        }
        if self.no_film {
            config.film = FilmConfig {
                color_fade_method: config.film.color_fade_method,
                ..FilmConfig::disabled()
            };
        }
    }
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: PathBuf,

    /// Output video file (defaults to phosphor-<format>-<millis>.mp4)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format preset
    #[arg(short, long, value_enum)]
    pub format: Option<VideoFormat>,

    /// Frames per second
    #[arg(long)]
    pub fps: Option<u32>,

    /// Write a numbered PNG sequence to this directory instead of video
    #[arg(long)]
    pub png_dir: Option<PathBuf>,

    /// Do not mux the source audio into the video
    #[arg(long)]
    pub no_audio: bool,

    #[command(flatten)]
    pub look: LookArgs,
}

#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: PathBuf,

    /// Stop after this many seconds (defaults to the whole file)
    #[arg(long)]
    pub seconds: Option<f64>,

    /// Preview surface width
    #[arg(long, default_value_t = 960)]
    pub width: usize,

    /// Preview surface height
    #[arg(long, default_value_t = 540)]
    pub height: usize,

    /// Target presentation rate
    #[arg(long, default_value_t = 60)]
    pub target_fps: u32,

    /// Save the last frame as PNG
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    #[command(flatten)]
    pub look: LookArgs,
}
