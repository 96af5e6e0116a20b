//! Frame drivers.
//!
//! [`PreviewDriver`] takes its deltas from presentation instants;
//! [`RecordingDriver`] uses a fixed `1000 / fps` step and feeds an export
//! sink. Both accumulate the deltas into a virtual timestamp, so effects
//! evolve at the same pace regardless of how fast frames are produced.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::Rng;

use super::clock::{format_elapsed, frame_delta_ms, WallClock};
use super::RenderSession;
use crate::audio::analysis::AnalysisSource;
use crate::audio::playback::{Playback, PlaybackEvent};
use crate::config::{FilmConfig, ScopeConfig};
use crate::encode::{ExportOutcome, ExportSink, VideoFormat};
use crate::error::{PhosphorError, Result};
use crate::render::surface::Surface;

/// What a driver did on one call.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameStatus {
    /// The first preview tick only records the time.
    Primed,
    Rendered { timestamp_ms: f64, delta_ms: f64 },
    /// Playback ended and the recording was finalized.
    Finished(ExportOutcome),
}

pub struct PreviewDriver<R: Rng = StdRng> {
    session: RenderSession<R>,
    wall: WallClock,
}

impl<R: Rng> PreviewDriver<R> {
    pub fn new(session: RenderSession<R>) -> Self {
        Self {
            session,
            wall: WallClock::new(),
        }
    }

    pub fn session(&self) -> &RenderSession<R> {
        &self.session
    }

    pub fn frame(&self) -> &Surface {
        self.session.frame()
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.session.resize(width, height);
    }

    /// Presentation callback. Renders with the wall-clock delta since the
    /// previous tick.
    pub fn tick<S: AnalysisSource + ?Sized>(
        &mut self,
        now: Instant,
        scope: &ScopeConfig,
        film: &FilmConfig,
        source: &mut S,
    ) -> FrameStatus {
        match self.wall.tick(now) {
            None => FrameStatus::Primed,
            Some(delta_ms) => self.render(delta_ms, scope, film, source),
        }
    }

    /// Renders with an explicit delta.
    pub fn render<S: AnalysisSource + ?Sized>(
        &mut self,
        delta_ms: f64,
        scope: &ScopeConfig,
        film: &FilmConfig,
        source: &mut S,
    ) -> FrameStatus {
        let analysis = source.analysis();
        self.session.advance(delta_ms, scope, film, analysis.as_ref());
        FrameStatus::Rendered {
            timestamp_ms: self.session.timestamp_ms(),
            delta_ms,
        }
    }
}

/// Snapshot of the recorder for status displays.
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderState {
    pub is_recording: bool,
    pub format: VideoFormat,
    /// Seconds of video recorded so far.
    pub elapsed: f64,
}

impl RecorderState {
    pub fn elapsed_label(&self) -> String {
        format_elapsed(self.elapsed)
    }
}

struct ActiveRecording {
    events: Receiver<PlaybackEvent>,
    frames: u64,
}

pub struct RecordingDriver<S: ExportSink, R: Rng = StdRng> {
    session: RenderSession<R>,
    sink: S,
    format: VideoFormat,
    fps: u32,
    active: Option<ActiveRecording>,
}

impl<S: ExportSink, R: Rng> RecordingDriver<S, R> {
    /// The session is resized to the format's dimensions.
    pub fn new(sink: S, format: VideoFormat, fps: u32, mut session: RenderSession<R>) -> Self {
        let (w, h) = format.dimensions();
        session.resize(w as usize, h as usize);
        Self {
            session,
            sink,
            format,
            fps: fps.max(1),
            active: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    pub fn format(&self) -> VideoFormat {
        self.format
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn frame_delta_ms(&self) -> f64 {
        frame_delta_ms(self.fps)
    }

    pub fn session(&self) -> &RenderSession<R> {
        &self.session
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn frame(&self) -> &Surface {
        self.session.frame()
    }

    /// The format is fixed for the duration of a recording.
    pub fn set_format(&mut self, format: VideoFormat) -> Result<()> {
        if self.is_recording() {
            return Err(PhosphorError::AlreadyRecording);
        }
        self.format = format;
        let (w, h) = format.dimensions();
        self.session.resize(w as usize, h as usize);
        Ok(())
    }

    pub fn state(&self) -> RecorderState {
        let frames = self.active.as_ref().map_or(0, |a| a.frames);
        RecorderState {
            is_recording: self.is_recording(),
            format: self.format,
            elapsed: frames as f64 * self.frame_delta_ms() / 1000.0,
        }
    }

    /// Starts a fresh recording of `playback` from its beginning.
    ///
    /// Trails, particles and the clock are reset so nothing from earlier
    /// sessions leaks into the export. Playback ending stops the recording
    /// on the next frame.
    pub fn start(&mut self, playback: &mut Playback) -> Result<()> {
        if !playback.is_loaded() {
            return Err(PhosphorError::NotLoaded);
        }
        if self.is_recording() {
            return Err(PhosphorError::AlreadyRecording);
        }

        self.session.reset();
        let (w, h) = self.format.dimensions();
        self.sink.begin(w, h, self.fps)?;

        playback.stop();
        let events = playback.subscribe();
        playback.play()?;

        self.active = Some(ActiveRecording { events, frames: 0 });
        log::info!(
            "Recording started: {} @ {}fps",
            self.format,
            self.fps
        );
        Ok(())
    }

    fn playback_ended(&mut self) -> bool {
        let Some(active) = self.active.as_ref() else {
            return false;
        };
        loop {
            match active.events.try_recv() {
                Ok(PlaybackEvent::Ended) => return true,
                Ok(_) => continue,
                Err(TryRecvError::Empty) => return false,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("Playback went away during recording");
                    return true;
                }
            }
        }
    }

    /// Renders and exports one frame, or finalizes if playback has ended.
    pub fn render_frame<A: AnalysisSource + ?Sized>(
        &mut self,
        scope: &ScopeConfig,
        film: &FilmConfig,
        source: &mut A,
    ) -> Result<FrameStatus> {
        if !self.is_recording() {
            return Err(PhosphorError::NotRecording);
        }
        if self.playback_ended() {
            log::info!("Playback ended, stopping recording");
            return self.finish_recording().map(FrameStatus::Finished);
        }

        let delta_ms = self.frame_delta_ms();
        let analysis = source.analysis();
        let frame = self
            .session
            .advance(delta_ms, scope, film, analysis.as_ref());
        if let Err(e) = self.sink.write_frame(frame) {
            log::error!("Export failed, abandoning recording: {:#}", e);
            if let Some(active) = self.active.take() {
                if let Err(finish) = self.sink.finish() {
                    log::warn!(
                        "Sink did not finalize after {} frames: {:#}",
                        active.frames,
                        finish
                    );
                }
            }
            return Err(e.into());
        }

        if let Some(active) = self.active.as_mut() {
            active.frames += 1;
            log::trace!("Recorded frame {}", active.frames);
        }
        Ok(FrameStatus::Rendered {
            timestamp_ms: self.session.timestamp_ms(),
            delta_ms,
        })
    }

    /// Stops `playback` and finalizes the sink.
    pub fn stop(&mut self, playback: &mut Playback) -> Result<ExportOutcome> {
        if !self.is_recording() {
            return Err(PhosphorError::NotRecording);
        }
        playback.stop();
        self.finish_recording()
    }

    /// Finalizes the sink. The playback subscription is dropped with it.
    fn finish_recording(&mut self) -> Result<ExportOutcome> {
        let active = self.active.take().ok_or(PhosphorError::NotRecording)?;
        let outcome = self.sink.finish()?;
        log::info!(
            "Recording stopped after {} frames ({})",
            active.frames,
            format_elapsed(active.frames as f64 * self.frame_delta_ms() / 1000.0)
        );
        Ok(outcome)
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
