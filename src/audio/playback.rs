//! Playback transport over decoded audio.
//!
//! The cursor is moved explicitly with [`Playback::advance`], so the same
//! transport works under a wall clock or a virtual frame clock. State
//! changes are published to every subscriber over an mpsc channel.

use std::sync::mpsc::{channel, Receiver, Sender};

use super::analysis::{AnalysisFrame, AnalysisSource, Analyser};
use super::decode::StereoAudio;
use crate::config::AudioConfig;
use crate::error::{PhosphorError, Result};

/// Cursor positions this close to the end count as the end, so summed
/// frame deltas land on the last frame exactly.
const END_TOLERANCE: f64 = 1e-9;

/// Snapshot of the transport, sent with every state change.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub is_loaded: bool,
    pub duration: f64,
    pub current_time: f64,
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Loaded { file_name: String, duration: f64 },
    StateChange(PlaybackState),
    /// The cursor ran past the end of the audio while playing.
    Ended,
}

#[derive(Debug)]
pub struct Playback {
    audio: Option<StereoAudio>,
    file_name: Option<String>,
    playing: bool,
    position: f64,
    analyser: Analyser,
    subscribers: Vec<Sender<PlaybackEvent>>,
}

impl Playback {
    pub fn new(analyser: Analyser) -> Self {
        Self {
            audio: None,
            file_name: None,
            playing: false,
            position: 0.0,
            analyser,
            subscribers: Vec::new(),
        }
    }

    pub fn from_config(config: &AudioConfig) -> Result<Self> {
        Ok(Self::new(Analyser::new(config.fft_size, config.smoothing)?))
    }

    /// Registers a new listener. Dropping the receiver unsubscribes it.
    pub fn subscribe(&mut self) -> Receiver<PlaybackEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: PlaybackEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn emit_state(&mut self) {
        let state = self.state();
        self.emit(PlaybackEvent::StateChange(state));
    }

    /// Replaces the current audio, stopping playback first.
    pub fn load(&mut self, file_name: impl Into<String>, audio: StereoAudio) {
        self.stop();
        let file_name = file_name.into();
        let duration = audio.duration();
        log::info!("Loaded {} ({:.1}s)", file_name, duration);

        self.audio = Some(audio);
        self.file_name = Some(file_name.clone());
        self.position = 0.0;
        self.analyser.reset();

        self.emit(PlaybackEvent::Loaded { file_name, duration });
        self.emit_state();
    }

    pub fn play(&mut self) -> Result<()> {
        if self.audio.is_none() {
            return Err(PhosphorError::NotLoaded);
        }
        if self.playing {
            return Ok(());
        }
        if self.position >= self.duration() {
            self.position = 0.0;
        }
        self.playing = true;
        self.emit_state();
        Ok(())
    }

    pub fn pause(&mut self) {
        if !self.playing {
            return;
        }
        self.playing = false;
        self.emit_state();
    }

    /// Halts and rewinds to the start.
    pub fn stop(&mut self) {
        self.playing = false;
        self.position = 0.0;
        self.emit_state();
    }

    pub fn toggle(&mut self) -> Result<()> {
        if self.playing {
            self.pause();
            Ok(())
        } else {
            self.play()
        }
    }

    /// Moves the cursor, clamped to `[0, duration]`, keeping the play state.
    pub fn seek(&mut self, seconds: f64) -> Result<()> {
        if self.audio.is_none() {
            return Err(PhosphorError::NotLoaded);
        }
        self.position = seconds.clamp(0.0, self.duration());
        self.analyser.reset();
        self.emit_state();
        Ok(())
    }

    /// Moves the cursor forward while playing. Running past the end stops,
    /// rewinds and reports [`PlaybackEvent::Ended`] once.
    pub fn advance(&mut self, seconds: f64) {
        if !self.playing {
            return;
        }
        self.position += seconds.max(0.0);
        if self.position >= self.duration() - END_TOLERANCE {
            self.playing = false;
            self.position = 0.0;
            log::debug!("Playback ended");
            self.emit(PlaybackEvent::Ended);
            self.emit_state();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_loaded(&self) -> bool {
        self.audio.is_some()
    }

    pub fn duration(&self) -> f64 {
        self.audio.as_ref().map_or(0.0, StereoAudio::duration)
    }

    pub fn current_time(&self) -> f64 {
        self.position
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn audio(&self) -> Option<&StereoAudio> {
        self.audio.as_ref()
    }

    pub fn analyser_mut(&mut self) -> &mut Analyser {
        &mut self.analyser
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            is_playing: self.playing,
            is_loaded: self.is_loaded(),
            duration: self.duration(),
            current_time: self.position,
            file_name: self.file_name.clone(),
        }
    }
}

impl AnalysisSource for Playback {
    /// Analysis of the window ending at the cursor, or `None` unless playing.
    fn analysis(&mut self) -> Option<AnalysisFrame> {
        if !self.playing {
            return None;
        }
        let audio = self.audio.as_ref()?;
        let end = (self.position * audio.sample_rate as f64).floor() as usize;
        Some(self.analyser.analyse(&audio.left, &audio.right, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playback() -> Playback {
        Playback::new(Analyser::new(256, 0.8).unwrap())
    }

    fn drain(rx: &Receiver<PlaybackEvent>) -> Vec<PlaybackEvent> {
        rx.try_iter().collect()
    }

    #[test]
    fn play_requires_audio() {
        let mut p = playback();
        assert!(matches!(p.play(), Err(PhosphorError::NotLoaded)));
        assert!(matches!(p.seek(1.0), Err(PhosphorError::NotLoaded)));
        assert!(p.analysis().is_none());
    }

    #[test]
    fn load_announces_file() {
        let mut p = playback();
        let rx = p.subscribe();
        p.load("tone.wav", StereoAudio::silent(2.0, 8_000));
        let events = drain(&rx);
        assert!(events.contains(&PlaybackEvent::Loaded {
            file_name: "tone.wav".into(),
            duration: 2.0,
        }));
        assert!(matches!(events.last(), Some(PlaybackEvent::StateChange(s)) if s.is_loaded));
    }

    #[test]
    fn analysis_only_while_playing() {
        let mut p = playback();
        p.load("a", StereoAudio::silent(1.0, 8_000));
        assert!(p.analysis().is_none());
        p.play().unwrap();
        let frame = p.analysis().unwrap();
        assert_eq!(frame.time_domain_left.len(), 256);
        assert_eq!(frame.frequency_data.len(), 128);
        p.pause();
        assert!(p.analysis().is_none());
    }

    #[test]
    fn ended_fires_once_and_rewinds() {
        let mut p = playback();
        p.load("a", StereoAudio::silent(1.0, 8_000));
        let rx = p.subscribe();
        p.play().unwrap();
        for _ in 0..30 {
            p.advance(0.05);
        }
        let ended = drain(&rx)
            .into_iter()
            .filter(|e| *e == PlaybackEvent::Ended)
            .count();
        assert_eq!(ended, 1);
        assert!(!p.is_playing());
        assert_eq!(p.current_time(), 0.0);
    }

    #[test]
    fn frame_steps_reach_the_end_exactly() {
        let mut p = playback();
        p.load("a", StereoAudio::silent(1.0, 8_000));
        let rx = p.subscribe();
        p.play().unwrap();
        for _ in 0..24 {
            p.advance(1.0 / 24.0);
        }
        assert!(drain(&rx).contains(&PlaybackEvent::Ended));
    }

    #[test]
    fn seek_is_clamped_and_keeps_playing() {
        let mut p = playback();
        p.load("a", StereoAudio::silent(3.0, 8_000));
        p.play().unwrap();
        p.seek(10.0).unwrap();
        assert_eq!(p.current_time(), 3.0);
        assert!(p.is_playing());
        p.seek(-1.0).unwrap();
        assert_eq!(p.current_time(), 0.0);
    }

    #[test]
    fn toggle_and_stop() {
        let mut p = playback();
        p.load("a", StereoAudio::silent(3.0, 8_000));
        p.toggle().unwrap();
        assert!(p.is_playing());
        p.advance(1.0);
        p.toggle().unwrap();
        assert!(!p.is_playing());
        assert_eq!(p.current_time(), 1.0);
        p.stop();
        assert_eq!(p.current_time(), 0.0);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut p = playback();
        let rx = p.subscribe();
        drop(rx);
        let live = p.subscribe();
        p.load("a", StereoAudio::silent(1.0, 8_000));
        assert_eq!(p.subscribers.len(), 1);
        assert!(!drain(&live).is_empty());
    }
}
