use phosphor::audio::analysis::ScriptedSource;
use phosphor::audio::decode::StereoAudio;
use phosphor::encode::MemorySink;
use phosphor::session::clock::frame_delta_ms;
use phosphor::{
    AnalysisFrame, Analyser, ExportOutcome, ExportSink, FilmConfig, FrameStatus, Playback,
    PreviewDriver, RecordingDriver, RenderSession, ScopeConfig, Surface, VideoFormat,
};

fn light_scope() -> ScopeConfig {
    // Small blur radius keeps full-size frames cheap.
    ScopeConfig {
        bloom_radius: 2.0,
        ..ScopeConfig::default()
    }
}

fn tone_frames(n: usize) -> Vec<Option<AnalysisFrame>> {
    (0..n)
        .map(|i| {
            let wave: Vec<u8> = (0..512)
                .map(|s| (128.0 + 100.0 * ((s + i * 7) as f32 * 0.05).sin()) as u8)
                .collect();
            Some(AnalysisFrame {
                time_domain_left: wave.clone(),
                time_domain_right: wave,
                frequency_data: vec![64; 256],
            })
        })
        .collect()
}

#[test]
fn preview_and_recording_agree_for_the_same_seed() {
    let scope = light_scope();
    let film = FilmConfig::default();
    let frames = tone_frames(3);
    let (w, h) = VideoFormat::Square.dimensions();

    let mut preview = PreviewDriver::new(RenderSession::seeded(w as usize, h as usize, 42));
    let mut preview_src = ScriptedSource::new(frames.clone());

    let mut recorder = RecordingDriver::new(
        MemorySink::default(),
        VideoFormat::Square,
        24,
        RenderSession::seeded(1, 1, 42),
    );
    let mut playback = Playback::new(Analyser::new(512, 0.8).unwrap());
    playback.load("tone", StereoAudio::silent(5.0, 8_000));
    recorder.start(&mut playback).unwrap();
    let mut record_src = ScriptedSource::new(frames);

    let delta = frame_delta_ms(24);
    for _ in 0..3 {
        preview.render(delta, &scope, &film, &mut preview_src);
        let status = recorder.render_frame(&scope, &film, &mut record_src).unwrap();
        assert!(matches!(status, FrameStatus::Rendered { .. }));
    }

    let recorded = recorder.sink().frames.last().unwrap();
    assert_eq!(preview.frame(), recorded);
    assert_eq!(
        preview.session().timestamp_ms(),
        recorder.session().timestamp_ms()
    );
}

/// Per-frame readings of an export, cheap enough to keep for every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FrameReading {
    centre: f32,
    corner: [f32; 3],
    mean: f32,
}

#[derive(Default)]
struct ReadingSink {
    size: Option<(u32, u32, u32)>,
    readings: Vec<FrameReading>,
}

impl ExportSink for ReadingSink {
    fn begin(&mut self, width: u32, height: u32, fps: u32) -> anyhow::Result<()> {
        self.size = Some((width, height, fps));
        self.readings.clear();
        Ok(())
    }

    fn write_frame(&mut self, frame: &Surface) -> anyhow::Result<()> {
        let (w, h, _) = self.size.ok_or_else(|| anyhow::anyhow!("not started"))?;
        anyhow::ensure!(frame.width() == w as usize && frame.height() == h as usize);
        self.readings.push(FrameReading {
            centre: frame.get(frame.width() / 2, frame.height() / 2)[1],
            corner: frame.get(5, 5),
            mean: frame.mean_luminance(),
        });
        Ok(())
    }

    fn finish(&mut self) -> anyhow::Result<ExportOutcome> {
        Ok(ExportOutcome {
            path: None,
            frames: self.readings.len() as u64,
        })
    }
}

#[test]
fn one_second_of_silence_records_24_frames() {
    const PERSISTENCE: f32 = 0.85;
    const TOLERANCE: f32 = 1e-3;

    let mut playback = Playback::new(Analyser::new(2048, 0.8).unwrap());
    playback.load("silence", StereoAudio::silent(1.0, 8_000));

    let mut recorder = RecordingDriver::new(
        ReadingSink::default(),
        VideoFormat::Square,
        24,
        RenderSession::seeded(1, 1, 7),
    );
    // Randomised scope effects off, so every frame follows the trail decay alone.
    let scope = ScopeConfig {
        persistence: PERSISTENCE,
        scanline_alpha: 0.0,
        noise_amount: 0.0,
        flicker_amount: 0.0,
        ..light_scope()
    };
    let film = FilmConfig::disabled();

    recorder.start(&mut playback).unwrap();
    let outcome = loop {
        match recorder.render_frame(&scope, &film, &mut playback).unwrap() {
            FrameStatus::Rendered { delta_ms, .. } => playback.advance(delta_ms / 1000.0),
            FrameStatus::Finished(outcome) => break outcome,
            FrameStatus::Primed => unreachable!(),
        }
    };

    assert_eq!(outcome.frames, 24);
    assert!(!recorder.is_recording());
    let sink = recorder.into_sink();
    assert_eq!(sink.size, Some((1080, 1080, 24)));
    assert_eq!(sink.readings.len(), 24);

    // Silence is a flat trace through the centre of the screen, on every frame.
    for (i, r) in sink.readings.iter().enumerate() {
        assert!(r.centre > 0.3, "frame {i} centre {}", r.centre);
        assert_eq!(r.corner, [0.0, 0.0, 0.0], "frame {i}");
    }

    // The first frame is a single fresh trace over a black trail. After it,
    // the picture never fades faster than the persistence and never gains
    // more than one fresh trace.
    let fresh = sink.readings[0].mean;
    assert!(fresh > 0.0);
    for (i, pair) in sink.readings.windows(2).enumerate() {
        let (prev, next) = (pair[0].mean, pair[1].mean);
        assert!(
            next >= PERSISTENCE * prev - TOLERANCE,
            "frame {} faded from {prev} to {next}",
            i + 1
        );
        assert!(
            next <= prev + fresh + TOLERANCE,
            "frame {} jumped from {prev} to {next}",
            i + 1
        );
    }

    // The same trace every frame settles the trail.
    let last = sink.readings[23].mean;
    let before = sink.readings[22].mean;
    assert!((last - before).abs() <= 0.01 * last, "{before} -> {last}");
}
