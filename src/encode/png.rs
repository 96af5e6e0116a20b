use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::{ExportOutcome, ExportSink};
use crate::render::surface::{Rgba8, Surface};

/// Writes a surface as an opaque RGBA PNG.
pub fn save_png(path: &Path, frame: &Surface) -> Result<()> {
    let rgba = frame.to_rgba8();
    save_rgba(path, frame.width() as u32, frame.height() as u32, &rgba)
}

fn save_rgba(path: &Path, width: u32, height: u32, rgba: &[Rgba8]) -> Result<()> {
    image::save_buffer_with_format(
        path,
        bytemuck::cast_slice(rgba),
        width,
        height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("Failed to write PNG: {}", path.display()))
}

/// One numbered PNG per frame: `frame-000000.png`, `frame-000001.png`, ...
pub struct PngSequenceSink {
    dir: PathBuf,
    rgba: Vec<Rgba8>,
    frames: u64,
}

impl PngSequenceSink {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            rgba: Vec::new(),
            frames: 0,
        }
    }

    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame-{:06}.png", index))
    }
}

impl ExportSink for PngSequenceSink {
    fn begin(&mut self, width: u32, height: u32, fps: u32) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        self.frames = 0;
        log::info!(
            "Writing {}x{} @ {}fps PNG sequence to {}",
            width, height, fps, self.dir.display()
        );
        Ok(())
    }

    fn write_frame(&mut self, frame: &Surface) -> Result<()> {
        frame.write_rgba8(&mut self.rgba);
        let path = self.frame_path(self.frames);
        save_rgba(&path, frame.width() as u32, frame.height() as u32, &self.rgba)?;
        self.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<ExportOutcome> {
        log::info!("PNG sequence complete: {} frames", self.frames);
        Ok(ExportOutcome {
            path: Some(self.dir.clone()),
            frames: self.frames,
        })
    }
}
