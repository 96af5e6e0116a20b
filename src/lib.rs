//! Audio-reactive phosphor oscilloscope renderer with film emulation.
//!
//! Audio analysis frames are traced onto a persistent glow buffer, passed
//! through a CRT degradation stage and a film-effect overlay, and handed to
//! an export sink. The same [`session::RenderSession`] drives both the
//! wall-clock preview loop and the frame-indexed recording loop.

pub mod audio;
pub mod config;
pub mod encode;
pub mod error;
pub mod film;
pub mod render;
pub mod session;

pub use audio::analysis::{AnalysisFrame, AnalysisSource, Analyser};
pub use audio::playback::{Playback, PlaybackEvent, PlaybackState};
pub use config::{Config, FilmConfig, ScopeConfig};
pub use encode::{ExportOutcome, ExportSink, VideoFormat};
pub use error::{PhosphorError, Result};
pub use render::beam::{BeamParams, VisualizationMode};
pub use render::color::PhosphorColor;
pub use render::surface::Surface;
pub use session::driver::{FrameStatus, PreviewDriver, RecorderState, RecordingDriver};
pub use session::RenderSession;
