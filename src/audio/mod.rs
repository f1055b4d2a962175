pub mod decode;
pub mod playback;

use std::sync::Arc;

/// Decoded single-channel audio, immutable once published.
#[derive(Clone, Debug)]
pub struct AudioTrack {
    pub samples: Arc<[f32]>,
    pub sample_rate: u32,
    /// Seconds
    pub duration: f64,
}

impl AudioTrack {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        let duration = if sample_rate == 0 {
            0.0
        } else {
            samples.len() as f64 / sample_rate as f64
        };
        Self {
            samples: samples.into(),
            sample_rate,
            duration,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
