use std::time::{Duration, Instant};

/// Transport controls the render loop needs from whatever is playing audio.
pub trait Playback {
    /// Current position in seconds. Non-decreasing while playing, 0 after
    /// [`Playback::seek_to_zero`].
    fn position(&self) -> f64;
    /// Length of the loaded source in seconds
    fn duration(&self) -> f64;
    fn load(&mut self, duration: f64);
    fn play(&mut self);
    fn pause(&mut self);
    fn seek_to_zero(&mut self);

    fn is_finished(&self) -> bool {
        let duration = self.duration();
        duration > 0.0 && self.position() >= duration
    }
}

/// Transport that advances with the wall clock.
///
/// Position is clamped to the loaded duration, so a finished track stays
/// parked at its end until stopped.
#[derive(Debug, Default)]
pub struct ClockPlayback {
    duration: f64,
    elapsed: Duration,
    started: Option<Instant>,
}

impl ClockPlayback {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn is_playing(&self) -> bool {
        self.started.is_some()
    }

    fn running_time(&self) -> Duration {
        match self.started {
            Some(started) => self.elapsed + started.elapsed(),
            None => self.elapsed,
        }
    }
}

impl Playback for ClockPlayback {
    fn position(&self) -> f64 {
        self.running_time().as_secs_f64().min(self.duration)
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn load(&mut self, duration: f64) {
        self.duration = duration.max(0.0);
        self.elapsed = Duration::ZERO;
        self.started = None;
    }

    fn play(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        if let Some(started) = self.started.take() {
            self.elapsed += started.elapsed();
        }
    }

    fn seek_to_zero(&mut self) {
        self.elapsed = Duration::ZERO;
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
    }
}
