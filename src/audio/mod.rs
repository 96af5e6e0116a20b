pub mod analysis;
pub mod decode;
pub mod playback;

pub use analysis::{AnalysisFrame, AnalysisSource, Analyser, ScriptedSource};
pub use decode::{decode_audio, StereoAudio};
pub use playback::{Playback, PlaybackEvent, PlaybackState};
