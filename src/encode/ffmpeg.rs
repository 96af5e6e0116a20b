use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use super::{ExportOutcome, ExportSink};
use crate::render::surface::{Rgba8, Surface};

/// Pipes raw RGBA frames into an `ffmpeg` child process, muxing in the
/// source audio track when one is given.
pub struct FfmpegSink {
    output_path: PathBuf,
    input_audio: Option<PathBuf>,
    codec: String,
    pix_fmt: String,
    crf: u32,
    child: Option<Child>,
    frame_size: (usize, usize),
    rgba: Vec<Rgba8>,
    frames: u64,
}

impl FfmpegSink {
    pub fn new(
        output_path: &Path,
        input_audio: Option<&Path>,
        codec: &str,
        pix_fmt: &str,
        crf: u32,
    ) -> Self {
        Self {
            output_path: output_path.to_path_buf(),
            input_audio: input_audio.map(Path::to_path_buf),
            codec: codec.to_string(),
            pix_fmt: pix_fmt.to_string(),
            crf,
            child: None,
            frame_size: (0, 0),
            rgba: Vec::new(),
            frames: 0,
        }
    }

    fn args(&self, width: u32, height: u32, fps: u32) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-y".into(),
            // stderr is only read once the encoder exits, so keep it to errors.
            "-nostats".into(),
            "-loglevel".into(), "error".into(),
            "-f".into(), "rawvideo".into(),
            "-pixel_format".into(), "rgba".into(),
            "-video_size".into(), format!("{}x{}", width, height),
            "-framerate".into(), fps.to_string(),
            "-i".into(), "pipe:0".into(),
        ];

        if let Some(audio) = &self.input_audio {
            args.extend(["-i".into(), audio.to_string_lossy().into_owned()]);
        }

        args.extend([
            "-c:v".into(), self.codec.clone(),
            "-pix_fmt".into(), self.pix_fmt.clone(),
            "-crf".into(), self.crf.to_string(),
            "-preset".into(), "medium".into(),
        ]);

        if self.input_audio.is_some() {
            args.extend([
                "-c:a".into(), "aac".into(),
                "-b:a".into(), "192k".into(),
                "-shortest".into(),
            ]);
        }

        args.push(self.output_path.to_string_lossy().into_owned());
        args
    }
}

impl ExportSink for FfmpegSink {
    fn begin(&mut self, width: u32, height: u32, fps: u32) -> Result<()> {
        if self.child.is_some() {
            anyhow::bail!("FFmpeg encoder already running");
        }
        let args = self.args(width, height, fps);
        let child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn ffmpeg. Is ffmpeg installed?")?;

        log::info!(
            "FFmpeg encoder started: {}x{} @ {}fps, codec={}",
            width, height, fps, self.codec
        );

        self.child = Some(child);
        self.frame_size = (width as usize, height as usize);
        self.frames = 0;
        Ok(())
    }

    fn write_frame(&mut self, frame: &Surface) -> Result<()> {
        if (frame.width(), frame.height()) != self.frame_size {
            anyhow::bail!(
                "frame is {}x{} but the encoder expects {}x{}",
                frame.width(), frame.height(), self.frame_size.0, self.frame_size.1
            );
        }
        frame.write_rgba8(&mut self.rgba);

        let stdin = self
            .child
            .as_mut()
            .and_then(|c| c.stdin.as_mut())
            .context("FFmpeg stdin not available")?;
        stdin
            .write_all(bytemuck::cast_slice(&self.rgba))
            .context("Failed to write frame to ffmpeg")?;
        self.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<ExportOutcome> {
        let mut child = self.child.take().context("FFmpeg encoder was not started")?;

        // Close stdin to signal EOF
        drop(child.stdin.take());

        let output = child.wait_with_output().context("Failed to wait for ffmpeg")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("FFmpeg exited with error:\n{}", stderr);
        }

        log::info!(
            "FFmpeg encoding complete: {} frames -> {}",
            self.frames,
            self.output_path.display()
        );
        Ok(ExportOutcome {
            path: Some(self.output_path.clone()),
            frames: self.frames,
        })
    }
}
