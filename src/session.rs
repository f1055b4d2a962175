use anyhow::{Context, Result};
use crossbeam_channel::{never, select, tick, Receiver};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Instant;

use crate::audio::decode::{spawn_decode, AudioFormat, DecodeError};
use crate::audio::playback::Playback;
use crate::audio::AudioTrack;
use crate::control::Control;
use crate::render::scheduler::{LoopError, LoopState, RenderLoop};
use crate::render::sink::GeometrySink;

type DecodeResult = Result<AudioTrack, DecodeError>;

enum Event {
    /// `None` when the decoder went away without sending
    Decoded(Option<DecodeResult>),
    /// `None` once the command source is closed
    Command(Option<Control>),
    Tick,
}

pub struct SessionOptions {
    /// Play as soon as a decoded track is published
    pub autoplay: bool,
    pub show_progress: bool,
}

/// Single scheduling thread for a [`RenderLoop`].
///
/// Multiplexes decode completion, user commands and the ticker. Everything
/// the loop touches is mutated here, so the decode worker only hands over a
/// finished track through its channel.
pub struct Session<P, S> {
    render_loop: RenderLoop<P, S>,
    pending_decode: Option<Receiver<DecodeResult>>,
    ticker: Receiver<Instant>,
    options: SessionOptions,
    progress: Option<ProgressBar>,
}

impl<P: Playback, S: GeometrySink> Session<P, S> {
    pub fn new(render_loop: RenderLoop<P, S>, options: SessionOptions) -> Self {
        Self {
            render_loop,
            pending_decode: None,
            ticker: never(),
            options,
            progress: None,
        }
    }

    /// Start reading and decoding `path` in the background. Unsupported
    /// formats fail here; read and decode errors arrive through `run`.
    pub fn load_file(&mut self, path: &Path, format: Option<&str>) -> Result<()> {
        let format = match format {
            Some(tag) => tag.parse::<AudioFormat>()?,
            None => AudioFormat::from_path(path)?,
        };
        log::info!("Decoding {} as {:?}...", path.display(), format);
        if self.pending_decode.is_some() {
            log::info!("Superseding the previous decode");
        }
        self.pending_decode = Some(spawn_decode(path.to_path_buf(), format)?);
        Ok(())
    }

    pub fn run(&mut self, control: Receiver<Control>) -> Result<()> {
        let mut control = control;
        let mut control_open = true;

        loop {
            let decode = self.pending_decode.clone().unwrap_or_else(never);

            let event = select! {
                recv(decode) -> msg => Event::Decoded(msg.ok()),
                recv(control) -> msg => Event::Command(msg.ok()),
                recv(self.ticker) -> _ => Event::Tick,
            };

            match event {
                Event::Decoded(result) => {
                    self.pending_decode = None;
                    match result {
                        Some(Ok(track)) => {
                            if let Err(err) = self.publish(track) {
                                if !control_open {
                                    return Err(err);
                                }
                                log::warn!("{:#}", err);
                            }
                        }
                        Some(Err(err)) if !control_open => {
                            return Err(err).context("Decoding failed");
                        }
                        Some(Err(err)) => log::error!("Decoding failed: {}", err),
                        None => log::error!("Decoder exited without a result"),
                    }
                }
                Event::Command(Some(Control::Play)) => {
                    if let Err(err) = self.play() {
                        log::warn!("{}", err);
                    }
                }
                Event::Command(Some(Control::Stop)) => self.stop(),
                Event::Command(Some(Control::Load { path, format })) => {
                    if let Err(err) = self.load_file(&path, format.as_deref()) {
                        log::error!("{:#}", err);
                    }
                }
                Event::Command(Some(Control::Quit)) => break,
                Event::Command(None) => {
                    control = never();
                    control_open = false;
                }
                Event::Tick => self.on_tick()?,
            }

            // Nothing left that could start or continue playback
            if !control_open
                && self.pending_decode.is_none()
                && self.render_loop.state() == LoopState::Idle
            {
                break;
            }
        }

        self.stop();
        if let Some(pb) = self.progress.take() {
            pb.finish_and_clear();
        }
        self.render_loop.finish()
    }

    fn publish(&mut self, track: AudioTrack) -> Result<()> {
        let duration = track.duration;
        self.stop();
        self.render_loop.load(track);

        if self.options.show_progress {
            let pb = ProgressBar::new((duration * 1000.0) as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {msg}")?
                    .progress_chars("=>-"),
            );
            if let Some(old) = self.progress.replace(pb) {
                old.finish_and_clear();
            }
        }

        if self.options.autoplay {
            self.play()?;
        }
        Ok(())
    }

    fn play(&mut self) -> Result<(), LoopError> {
        self.render_loop.play()?;
        self.ticker = tick(self.render_loop.tick_interval());
        Ok(())
    }

    fn stop(&mut self) {
        // Drop the ticker first so no queued tick survives the stop
        self.ticker = never();
        self.render_loop.stop();
        if let Some(pb) = &self.progress {
            pb.set_position(0);
            pb.set_message("stopped");
        }
    }

    fn on_tick(&mut self) -> Result<()> {
        self.render_loop.tick()?;

        if let Some(pb) = &self.progress {
            let playback = self.render_loop.playback();
            pb.set_position((playback.position() * 1000.0) as u64);
            pb.set_message(format!("{:.1}s / {:.1}s", playback.position(), playback.duration()));
        }

        if self.render_loop.is_finished() {
            log::info!("Playback reached the end of the track");
            self.stop();
        }
        Ok(())
    }
}
