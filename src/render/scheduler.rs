use anyhow::Result;
use std::time::{Duration, Instant};
use thiserror::Error;

use super::sink::{GeometrySink, TickFrame};
use crate::audio::playback::Playback;
use crate::audio::AudioTrack;
use crate::dsp::{AnalysisContext, DspError, SampleWindowExtractor, SpectrumComputer};

#[derive(Error, Debug)]
pub enum LoopError {
    #[error("Please load an audio file first")]
    NoSamplesLoaded,

    #[error(transparent)]
    Dsp(#[from] DspError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Playing,
}

/// Fixed parameters of the per-tick pipeline
#[derive(Clone, Debug)]
pub struct LoopSettings {
    pub transform_size: usize,
    pub stride: usize,
    pub waveform_stride: usize,
    pub width: u32,
    pub height: u32,
    pub tick_interval: Duration,
}

#[derive(Debug)]
struct TickStats {
    started: Instant,
    ticks: u64,
    overruns: u64,
}

impl TickStats {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            ticks: 0,
            overruns: 0,
        }
    }
}

/// Play/stop state machine around the spectrum and waveform pipeline.
///
/// The loop owns no timer. Whoever drives it calls [`RenderLoop::tick`] at
/// [`RenderLoop::tick_interval`] while the state is [`LoopState::Playing`];
/// ticks while idle are ignored.
pub struct RenderLoop<P, S> {
    settings: LoopSettings,
    extractor: SampleWindowExtractor,
    spectrum: SpectrumComputer,
    context: Option<AnalysisContext>,
    track: Option<AudioTrack>,
    playback: P,
    sink: S,
    state: LoopState,
    stats: TickStats,
}

impl<P: Playback, S: GeometrySink> RenderLoop<P, S> {
    pub fn new(
        settings: LoopSettings,
        extractor: SampleWindowExtractor,
        spectrum: SpectrumComputer,
        playback: P,
        sink: S,
    ) -> Self {
        Self {
            settings,
            extractor,
            spectrum,
            context: None,
            track: None,
            playback,
            sink,
            state: LoopState::Idle,
            stats: TickStats::new(),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn tick_interval(&self) -> Duration {
        self.settings.tick_interval
    }

    pub fn playback(&self) -> &P {
        &self.playback
    }

    #[cfg(test)]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Replace the current track. A playing loop is stopped first.
    pub fn load(&mut self, track: AudioTrack) {
        if self.state == LoopState::Playing {
            log::info!("New track published while playing, stopping");
            self.stop();
        }
        self.playback.load(track.duration);
        self.track = Some(track);
    }

    pub fn play(&mut self) -> Result<(), LoopError> {
        if self.state == LoopState::Playing {
            log::debug!("Already playing");
            return Ok(());
        }

        match &self.track {
            Some(track) if !track.is_empty() => {}
            _ => return Err(LoopError::NoSamplesLoaded),
        }

        let size = self.settings.transform_size;
        match &self.context {
            Some(ctx) if ctx.size() == size => {
                log::debug!("Reusing analysis tables for N={}", size);
            }
            _ => {
                self.context = Some(AnalysisContext::new(size)?);
                log::info!("Built analysis tables for N={}", size);
            }
        }

        self.stats = TickStats::new();
        self.playback.play();
        self.state = LoopState::Playing;
        log::info!("Playing at {:.1} ticks/s", 1.0 / self.settings.tick_interval.as_secs_f64());
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.state == LoopState::Idle {
            return;
        }

        self.playback.pause();
        self.playback.seek_to_zero();
        self.state = LoopState::Idle;

        let elapsed = self.stats.started.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 { self.stats.ticks as f64 / elapsed } else { 0.0 };
        log::info!(
            "Stopped after {} ticks in {:.2}s ({:.1} ticks/s, {} overruns)",
            self.stats.ticks,
            elapsed,
            rate,
            self.stats.overruns
        );
    }

    /// True once a playing track has reached its end
    pub fn is_finished(&self) -> bool {
        self.state == LoopState::Playing && self.playback.is_finished()
    }

    /// Run the pipeline once for the current playback position and hand the
    /// result to the sink. Returns whether a frame was drawn.
    pub fn tick(&mut self) -> Result<bool> {
        if self.state != LoopState::Playing {
            return Ok(false);
        }
        let (Some(context), Some(track)) = (self.context.as_ref(), self.track.as_ref()) else {
            return Ok(false);
        };

        let started = Instant::now();
        let position = self.playback.position();
        let duration = self.playback.duration();
        let size = context.size();

        let smoothed = self.extractor.extract(
            &track.samples,
            position,
            duration,
            size,
            self.settings.stride,
            true,
        );
        let coefficients = context.transform(&smoothed)?;
        let spectrum = self.spectrum.from_coefficients(&coefficients)?;

        let waveform = self.extractor.extract(
            &track.samples,
            position,
            duration,
            size,
            self.settings.waveform_stride,
            false,
        );

        self.stats.ticks += 1;
        let frame = TickFrame {
            tick: self.stats.ticks,
            position,
            duration,
            spectrum,
            waveform,
            width: self.settings.width,
            height: self.settings.height,
        };
        self.sink.draw(&frame)?;

        let elapsed = started.elapsed();
        if elapsed > self.settings.tick_interval {
            self.stats.overruns += 1;
            log::debug!(
                "Tick {} overran: {:?} > {:?}",
                frame.tick,
                elapsed,
                self.settings.tick_interval
            );
        }
        log::trace!("Tick {} at {:.3}s took {:?}", frame.tick, position, elapsed);

        Ok(true)
    }

    pub fn finish(&mut self) -> Result<()> {
        self.stop();
        self.sink.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Transport whose position is set by hand
    #[derive(Default)]
    struct ManualPlayback {
        position: f64,
        duration: f64,
        playing: bool,
    }

    impl Playback for ManualPlayback {
        fn position(&self) -> f64 {
            self.position
        }
        fn duration(&self) -> f64 {
            self.duration
        }
        fn load(&mut self, duration: f64) {
            self.duration = duration;
            self.position = 0.0;
        }
        fn play(&mut self) {
            self.playing = true;
        }
        fn pause(&mut self) {
            self.playing = false;
        }
        fn seek_to_zero(&mut self) {
            self.position = 0.0;
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        frames: Vec<TickFrame>,
    }

    impl GeometrySink for RecordingSink {
        fn draw(&mut self, frame: &TickFrame) -> Result<()> {
            self.frames.push(frame.clone());
            Ok(())
        }
    }

    fn settings(transform_size: usize) -> LoopSettings {
        LoopSettings {
            transform_size,
            stride: 40,
            waveform_stride: 4,
            width: 1920,
            height: 1080,
            tick_interval: Duration::from_millis(16),
        }
    }

    fn render_loop(transform_size: usize) -> RenderLoop<ManualPlayback, RecordingSink> {
        RenderLoop::new(
            settings(transform_size),
            SampleWindowExtractor::default(),
            SpectrumComputer::default(),
            ManualPlayback::default(),
            RecordingSink::default(),
        )
    }

    #[test]
    fn play_without_track_is_refused() {
        let mut rl = render_loop(256);
        assert!(matches!(rl.play(), Err(LoopError::NoSamplesLoaded)));
        assert_eq!(rl.state(), LoopState::Idle);
        assert!(!rl.playback().playing);
    }

    #[test]
    fn play_with_empty_track_is_refused() {
        let mut rl = render_loop(256);
        rl.load(AudioTrack::new(Vec::new(), 44100));
        assert!(matches!(rl.play(), Err(LoopError::NoSamplesLoaded)));
        assert_eq!(rl.state(), LoopState::Idle);
    }

    #[test]
    fn invalid_transform_size_is_reported_on_play() {
        let mut rl = render_loop(100);
        rl.load(AudioTrack::new(vec![0.0; 1000], 1000));
        assert!(matches!(
            rl.play(),
            Err(LoopError::Dsp(DspError::InvalidTransformSize(100)))
        ));
        assert_eq!(rl.state(), LoopState::Idle);
    }

    #[test]
    fn idle_ticks_draw_nothing() {
        let mut rl = render_loop(256);
        rl.load(AudioTrack::new(vec![0.0; 1000], 1000));
        assert!(!rl.tick().unwrap());
        assert!(rl.sink().frames.is_empty());
    }

    #[test]
    fn silent_track_gives_silent_spectrum() {
        let mut rl = render_loop(256);
        rl.load(AudioTrack::new(vec![0.0; 44100], 44100));
        rl.play().unwrap();
        rl.playback.position = 0.5;

        assert!(rl.tick().unwrap());
        let frame = &rl.sink().frames[0];
        assert_eq!(frame.spectrum.len(), 256);
        assert_eq!(frame.waveform.len(), 256);
        assert!(frame.spectrum.iter().all(|&m| m == 0.0));
        assert!(frame.waveform.iter().all(|&v| v == 0.0));
        assert_eq!((frame.width, frame.height), (1920, 1080));
        assert_eq!(frame.position, 0.5);
    }

    #[test]
    fn sine_track_peaks_in_matching_bin() {
        // At stride 40 the frame samples 44100/40 Hz; bin 10 of 256 sits at
        // 10 * 1102.5 / 256 Hz.
        let freq = 10.0 * 1102.5 / 256.0;
        let samples: Vec<f32> = (0..44100 * 2)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / 44100.0).sin() as f32)
            .collect();

        let mut rl = render_loop(256);
        rl.load(AudioTrack::new(samples, 44100));
        rl.play().unwrap();
        rl.playback.position = 0.5;
        rl.tick().unwrap();

        let spectrum = &rl.sink().frames[0].spectrum;
        let peak = spectrum[..128]
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 10);
    }

    #[test]
    fn stop_resets_position_and_silences_ticks() {
        let mut rl = render_loop(256);
        rl.load(AudioTrack::new(vec![0.1; 44100], 44100));
        rl.play().unwrap();
        rl.playback.position = 0.3;
        assert!(rl.tick().unwrap());

        rl.stop();
        assert_eq!(rl.state(), LoopState::Idle);
        assert_eq!(rl.playback().position(), 0.0);
        assert!(!rl.playback().playing);

        assert!(!rl.tick().unwrap());
        assert_eq!(rl.sink().frames.len(), 1);
    }

    #[test]
    fn replay_reuses_tables() {
        let mut rl = render_loop(256);
        rl.load(AudioTrack::new(vec![0.1; 44100], 44100));
        rl.play().unwrap();
        rl.stop();
        rl.play().unwrap();
        assert_eq!(rl.context.as_ref().map(|c| c.size()), Some(256));
        assert!(rl.tick().unwrap());
        assert_eq!(rl.sink().frames[0].tick, 1);
    }

    #[test]
    fn loading_while_playing_stops_first() {
        let mut rl = render_loop(256);
        rl.load(AudioTrack::new(vec![0.1; 44100], 44100));
        rl.play().unwrap();
        rl.load(AudioTrack::new(vec![0.2; 22050], 44100));
        assert_eq!(rl.state(), LoopState::Idle);
        assert_eq!(rl.playback().duration(), 0.5);
    }

    #[test]
    fn finishes_at_end_of_track() {
        let mut rl = render_loop(256);
        rl.load(AudioTrack::new(vec![0.1; 44100], 44100));
        assert!(!rl.is_finished());
        rl.play().unwrap();
        rl.playback.position = 1.0;
        assert!(rl.is_finished());
        // the final frame near the end still draws
        assert!(rl.tick().unwrap());
    }
}
