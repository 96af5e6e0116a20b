//! Export sinks and output format presets.

pub mod ffmpeg;
pub mod png;

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::render::surface::Surface;

pub use self::ffmpeg::FfmpegSink;
pub use self::png::PngSequenceSink;

/// Aspect-ratio presets for recorded video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    #[default]
    Youtube,
    Shorts,
    Instagram,
    Square,
}

impl VideoFormat {
    pub const ALL: [VideoFormat; 4] = [
        VideoFormat::Youtube,
        VideoFormat::Shorts,
        VideoFormat::Instagram,
        VideoFormat::Square,
    ];

    pub fn dimensions(self) -> (u32, u32) {
        match self {
            VideoFormat::Youtube => (1920, 1080),
            VideoFormat::Shorts => (1080, 1920),
            VideoFormat::Instagram => (1080, 1350),
            VideoFormat::Square => (1080, 1080),
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            VideoFormat::Youtube => "YouTube",
            VideoFormat::Shorts => "Shorts",
            VideoFormat::Instagram => "Instagram",
            VideoFormat::Square => "Square",
        }
    }

    pub fn aspect_ratio(self) -> &'static str {
        match self {
            VideoFormat::Youtube => "16:9",
            VideoFormat::Shorts => "9:16",
            VideoFormat::Instagram => "4:5",
            VideoFormat::Square => "1:1",
        }
    }

    /// Lowercase identifier used in file names and on the command line.
    pub fn id(self) -> &'static str {
        match self {
            VideoFormat::Youtube => "youtube",
            VideoFormat::Shorts => "shorts",
            VideoFormat::Instagram => "instagram",
            VideoFormat::Square => "square",
        }
    }
}

impl std::fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (w, h) = self.dimensions();
        write!(f, "{} ({}, {}x{})", self.display_name(), self.aspect_ratio(), w, h)
    }
}

/// `phosphor-<format>-<unix millis>.<ext>`
pub fn suggested_filename(format: VideoFormat, unix_millis: u128, extension: &str) -> String {
    format!("phosphor-{}-{}.{}", format.id(), unix_millis, extension)
}

pub fn suggested_filename_now(format: VideoFormat, extension: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    suggested_filename(format, millis, extension)
}

/// What a finished export produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    /// File or directory written, if the sink writes to disk.
    pub path: Option<PathBuf>,
    pub frames: u64,
}

/// Consumer of fully composited frames.
///
/// `begin` is called once before the first frame and `finish` once after
/// the last. A sink may be reused for another `begin` after `finish`.
pub trait ExportSink {
    fn begin(&mut self, width: u32, height: u32, fps: u32) -> Result<()>;
    fn write_frame(&mut self, frame: &Surface) -> Result<()>;
    fn finish(&mut self) -> Result<ExportOutcome>;
}

impl<S: ExportSink + ?Sized> ExportSink for Box<S> {
    fn begin(&mut self, width: u32, height: u32, fps: u32) -> Result<()> {
        (**self).begin(width, height, fps)
    }

    fn write_frame(&mut self, frame: &Surface) -> Result<()> {
        (**self).write_frame(frame)
    }

    fn finish(&mut self) -> Result<ExportOutcome> {
        (**self).finish()
    }
}

/// Keeps every frame in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub frames: Vec<Surface>,
    pub config: Option<(u32, u32, u32)>,
    pub finished: bool,
}

impl ExportSink for MemorySink {
    fn begin(&mut self, width: u32, height: u32, fps: u32) -> Result<()> {
        self.frames.clear();
        self.config = Some((width, height, fps));
        self.finished = false;
        Ok(())
    }

    fn write_frame(&mut self, frame: &Surface) -> Result<()> {
        if self.config.is_none() {
            anyhow::bail!("frame written before begin");
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<ExportOutcome> {
        self.finished = true;
        Ok(ExportOutcome {
            path: None,
            frames: self.frames.len() as u64,
        })
    }
}
