use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decoded audio split into left and right channels.
///
/// Mono sources are duplicated into both channels; anything beyond the
/// first two channels is ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StereoAudio {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
    pub sample_rate: u32,
}

impl StereoAudio {
    pub fn from_channels(left: Vec<f32>, right: Vec<f32>, sample_rate: u32) -> Self {
        debug_assert_eq!(left.len(), right.len());
        Self {
            left,
            right,
            sample_rate,
        }
    }

    /// `seconds` of silence.
    pub fn silent(seconds: f32, sample_rate: u32) -> Self {
        let frames = (seconds * sample_rate as f32).round() as usize;
        Self::from_channels(vec![0.0; frames], vec![0.0; frames], sample_rate)
    }

    pub fn frames(&self) -> usize {
        self.left.len()
    }

    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

pub fn decode_audio(path: &Path) -> Result<StereoAudio> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Failed to probe audio format")?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .context("No audio tracks found")?;

    let track_id = track.id;
    let channels = track.codec_params.channels.map_or(1, |c| c.count()).max(1);
    let sample_rate = track.codec_params.sample_rate.context("Unknown sample rate")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create audio decoder")?;

    let mut left: Vec<f32> = Vec::new();
    let mut right: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                log::warn!("Skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();

        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        split_interleaved(sample_buf.samples(), channels, &mut left, &mut right);
    }

    let audio = StereoAudio::from_channels(left, right, sample_rate);
    log::info!(
        "Decoded audio: {} frames x {} channel(s), {}Hz, {:.1}s",
        audio.frames(),
        channels,
        sample_rate,
        audio.duration()
    );

    Ok(audio)
}

fn split_interleaved(samples: &[f32], channels: usize, left: &mut Vec<f32>, right: &mut Vec<f32>) {
    if channels == 1 {
        left.extend_from_slice(samples);
        right.extend_from_slice(samples);
        return;
    }
    for frame in samples.chunks_exact(channels) {
        left.push(frame[0]);
        right.push(frame[1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_is_duplicated() {
        let (mut l, mut r) = (Vec::new(), Vec::new());
        split_interleaved(&[0.1, 0.2, 0.3], 1, &mut l, &mut r);
        assert_eq!(l, vec![0.1, 0.2, 0.3]);
        assert_eq!(l, r);
    }

    #[test]
    fn extra_channels_are_dropped() {
        let (mut l, mut r) = (Vec::new(), Vec::new());
        split_interleaved(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, &mut l, &mut r);
        assert_eq!(l, vec![1.0, 4.0]);
        assert_eq!(r, vec![2.0, 5.0]);
    }

    #[test]
    fn silent_buffer_has_expected_duration() {
        let audio = StereoAudio::silent(1.0, 44_100);
        assert_eq!(audio.frames(), 44_100);
        assert!((audio.duration() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = decode_audio(Path::new("/nonexistent/track.wav")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/track.wav"));
    }
}
