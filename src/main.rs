mod audio;
mod cli;
mod config;
mod control;
mod dsp;
mod render;
mod session;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::BufWriter;

use audio::playback::ClockPlayback;
use cli::Cli;
use config::Config;
use dsp::{SampleWindowExtractor, SpectrumComputer};
use render::scheduler::RenderLoop;
use render::sink::{GeometrySink, JsonLinesSink, NullSink};
use session::{Session, SessionOptions};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    // Explicit --config path, or auto-detect sonoscope.toml / global config
    let mut cfg = match cli.config.clone().or_else(config::find_config_path) {
        Some(path) => match config::load_config(&path) {
            Ok(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            Err(err) => {
                log::warn!("Failed to load config from {}: {}", path.display(), err);
                Config::default()
            }
        },
        None => Config::default(),
    };
    cli.apply_to(&mut cfg);
    cfg.validate().context("Invalid settings")?;

    if !cli.interactive && cli.input.is_none() {
        anyhow::bail!("Input audio file is required (or pass --interactive)");
    }

    log::info!("sonoscope - spectrum and waveform visualizer");
    log::info!(
        "Transform: N={}, stride={}, waveform stride={}, scale={}, boundary={:?}",
        cfg.analysis.transform_size,
        cfg.analysis.stride,
        cfg.analysis.waveform_stride(),
        cfg.analysis.display_scale,
        cfg.analysis.boundary
    );
    log::info!("Canvas: {}x{} @ {}Hz", cfg.render.width, cfg.render.height, cfg.render.fps);

    let sink: Box<dyn GeometrySink> = match &cli.geometry {
        Some(path) if path.as_os_str() == "-" => Box::new(JsonLinesSink::new(
            BufWriter::new(std::io::stdout()),
            cfg.layout.clone(),
        )),
        Some(path) => {
            log::info!("Writing geometry to {}", path.display());
            Box::new(JsonLinesSink::create(path, cfg.layout.clone())?)
        }
        None => Box::new(NullSink),
    };

    let extractor = SampleWindowExtractor::new(
        cfg.analysis.lowpass_taps,
        cfg.analysis.lowpass_spacing,
        cfg.analysis.boundary,
    );
    let render_loop = RenderLoop::new(
        cfg.loop_settings(),
        extractor,
        SpectrumComputer::new(cfg.analysis.display_scale),
        ClockPlayback::new(),
        sink,
    );

    let mut session = Session::new(
        render_loop,
        SessionOptions {
            autoplay: !cli.interactive || cli.autoplay,
            show_progress: !cli.interactive && !cli.no_progress,
        },
    );

    if let Some(input) = &cli.input {
        if !input.exists() {
            anyhow::bail!("Input file not found: {}", input.display());
        }
        session.load_file(input, cli.format.as_deref())?;
    }

    let (tx, rx) = crossbeam_channel::unbounded();
    if cli.interactive {
        eprintln!("{}", control::HELP);
        control::spawn_stdin_reader(tx).context("Failed to start command reader")?;
    } else {
        drop(tx);
    }

    session.run(rx)?;

    log::info!("Done");
    Ok(())
}
