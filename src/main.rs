mod cli;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use phosphor::audio::decode::decode_audio;
use phosphor::config::{resolve_config, Config};
use phosphor::encode::png::save_png;
use phosphor::encode::{suggested_filename_now, FfmpegSink, PngSequenceSink};
use phosphor::session::clock::format_elapsed;
use phosphor::{
    ExportSink, FrameStatus, Playback, PreviewDriver, RecordingDriver, RenderSession,
    VideoFormat,
};

use cli::{Cli, Command, PreviewArgs, RenderArgs};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Command::Render(args) => render(config, args),
        Command::Preview(args) => preview(config, args),
        Command::Config { json } => print_config(&config, json),
        Command::Formats => {
            for format in VideoFormat::ALL {
                println!("  {:<10} {}", format.id(), format);
            }
            Ok(())
        }
    }
}

fn session_for(width: usize, height: usize, seed: Option<u64>) -> RenderSession {
    match seed {
        Some(seed) => {
            log::info!("Using seed {}", seed);
            RenderSession::seeded(width, height, seed)
        }
        None => RenderSession::from_os_rng(width, height),
    }
}

fn load_playback(config: &Config, input: &Path) -> Result<Playback> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    log::info!("Decoding audio...");
    let audio = decode_audio(input)?;
    let mut playback = Playback::from_config(&config.audio)?;
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    playback.load(name, audio);
    Ok(playback)
}

fn render(mut config: Config, args: RenderArgs) -> Result<()> {
    args.look.apply(&mut config);
    let format = args.format.unwrap_or(config.output.format);
    let fps = args.fps.unwrap_or(config.output.fps).max(1);

    let mut playback = load_playback(&config, &args.input)?;

    let sink: Box<dyn ExportSink> = match &args.png_dir {
        Some(dir) => Box::new(PngSequenceSink::new(dir)),
        None => {
            let output = args
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(suggested_filename_now(format, "mp4")));
            log::info!("Output: {}", output.display());
            let audio = (!args.no_audio).then_some(args.input.as_path());
            Box::new(FfmpegSink::new(
                &output,
                audio,
                &config.output.codec,
                &config.output.pix_fmt,
                config.output.crf,
            ))
        }
    };

    log::info!("Format: {}, {}fps, mode {:?}", format, fps, config.scope.mode);
    let session = session_for(1, 1, args.look.seed);
    let mut recorder = RecordingDriver::new(sink, format, fps, session);

    let total_frames = (playback.duration() * fps as f64).ceil() as u64;
    let pb = ProgressBar::new(total_frames);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")
            .context("Invalid progress template")?
            .progress_chars("=>-"),
    );

    recorder.start(&mut playback)?;
    let outcome = loop {
        match recorder.render_frame(&config.scope, &config.film, &mut playback)? {
            FrameStatus::Rendered { delta_ms, .. } => {
                playback.advance(delta_ms / 1000.0);
                pb.inc(1);
            }
            FrameStatus::Finished(outcome) => break outcome,
            FrameStatus::Primed => {}
        }
    };
    pb.finish_and_clear();

    match outcome.path {
        Some(path) => log::info!(
            "Done! {} frames ({}) written to {}",
            outcome.frames,
            format_elapsed(outcome.frames as f64 / fps as f64),
            path.display()
        ),
        None => log::info!("Done! {} frames", outcome.frames),
    }
    Ok(())
}

fn preview(mut config: Config, args: PreviewArgs) -> Result<()> {
    args.look.apply(&mut config);
    let mut playback = load_playback(&config, &args.input)?;
    let limit = args
        .seconds
        .unwrap_or_else(|| playback.duration())
        .min(playback.duration());

    let mut driver = PreviewDriver::new(session_for(args.width, args.height, args.look.seed));
    let interval = Duration::from_secs_f64(1.0 / args.target_fps.max(1) as f64);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .context("Invalid progress template")?,
    );

    playback.play()?;
    let mut presented = 0u64;
    let started = Instant::now();
    while playback.is_playing() && playback.current_time() < limit {
        let frame_start = Instant::now();
        match driver.tick(frame_start, &config.scope, &config.film, &mut playback) {
            FrameStatus::Rendered { delta_ms, .. } => {
                playback.advance(delta_ms / 1000.0);
                presented += 1;
            }
            FrameStatus::Primed | FrameStatus::Finished(_) => {}
        }
        pb.set_message(format!(
            "{} / {}  {} frames",
            format_elapsed(playback.current_time()),
            format_elapsed(playback.duration()),
            presented
        ));
        if let Some(rest) = interval.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }
    playback.stop();
    pb.finish_and_clear();

    let secs = started.elapsed().as_secs_f64();
    log::info!(
        "Preview finished: {} frames in {:.1}s ({:.1} fps)",
        presented,
        secs,
        presented as f64 / secs.max(f64::EPSILON)
    );

    if let Some(path) = &args.snapshot {
        save_png(path, driver.frame())?;
        log::info!("Snapshot saved to {}", path.display());
    }
    Ok(())
}

fn print_config(config: &Config, json: bool) -> Result<()> {
    let text = if json {
        serde_json::to_string_pretty(config).context("Failed to serialize config")?
    } else {
        toml::to_string_pretty(config).context("Failed to serialize config")?
    };
    println!("{}", text);
    Ok(())
}
