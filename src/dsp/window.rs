use serde::Deserialize;
use std::f64::consts::PI;

/// How reads outside `[0, len)` of the sample buffer are resolved.
///
/// Frames anchored near the start or end of a track reach past the buffer
/// (the lowpass looks back `spacing * (taps - 1)` samples and the frame spans
/// `stride * size` samples forward). Every read goes through
/// [`BoundaryPolicy::read`], so the policy applies uniformly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryPolicy {
    /// Repeat the first/last sample
    #[default]
    Clamp,
    /// Treat samples outside the buffer as silence
    #[serde(rename = "zero")]
    #[value(name = "zero")]
    ZeroPad,
}

impl BoundaryPolicy {
    pub fn read(self, samples: &[f32], index: i64) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let last = samples.len() as i64 - 1;
        match self {
            BoundaryPolicy::Clamp => samples[index.clamp(0, last) as usize] as f64,
            BoundaryPolicy::ZeroPad if (0..=last).contains(&index) => samples[index as usize] as f64,
            BoundaryPolicy::ZeroPad => 0.0,
        }
    }
}

/// Blackman analysis window evaluated at `x` in `[0, 1]`.
pub fn analysis_window(x: f64) -> f64 {
    0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
}

/// Cuts fixed-length frames out of a decoded track at a playback position.
#[derive(Clone, Debug)]
pub struct SampleWindowExtractor {
    lowpass_taps: usize,
    lowpass_spacing: usize,
    boundary: BoundaryPolicy,
}

impl SampleWindowExtractor {
    pub fn new(lowpass_taps: usize, lowpass_spacing: usize, boundary: BoundaryPolicy) -> Self {
        Self {
            lowpass_taps: lowpass_taps.max(1),
            lowpass_spacing,
            boundary,
        }
    }

    /// Sample index that corresponds to `position` seconds into a track of
    /// `duration` seconds, rounded half up.
    pub fn anchor_index(sample_count: usize, position: f64, duration: f64) -> i64 {
        if !duration.is_finite() || duration <= 0.0 || !position.is_finite() {
            return 0;
        }
        (position * sample_count as f64 / duration + 0.5).floor() as i64
    }

    /// Extract `size` values starting at the sample under `position`, taking
    /// every `stride`-th sample.
    ///
    /// With `smooth` set (spectrum path) each value is lowpass filtered and
    /// weighted by the analysis window. Without it (waveform path) the raw
    /// samples are returned.
    pub fn extract(
        &self,
        samples: &[f32],
        position: f64,
        duration: f64,
        size: usize,
        stride: usize,
        smooth: bool,
    ) -> Vec<f64> {
        let now = Self::anchor_index(samples.len(), position, duration);
        let denom = size.saturating_sub(1).max(1) as f64;

        (0..size)
            .map(|i| {
                let index = now.saturating_add(saturating_offset(i, stride));
                if smooth {
                    analysis_window(i as f64 / denom) * self.lowpass(samples, index)
                } else {
                    self.boundary.read(samples, index)
                }
            })
            .collect()
    }

    /// Symmetric moving average over `taps` samples on each side of `index`,
    /// `spacing` apart. The centre sample contributes from both sides.
    pub fn lowpass(&self, samples: &[f32], index: i64) -> f64 {
        let mut sum = 0.0;
        for j in 0..self.lowpass_taps {
            let offset = saturating_offset(j, self.lowpass_spacing);
            sum += self.boundary.read(samples, index.saturating_add(offset));
            sum += self.boundary.read(samples, index.saturating_sub(offset));
        }
        sum / (2 * self.lowpass_taps) as f64
    }
}

/// `step * spacing` as a sample offset, saturating at `i64::MAX`
fn saturating_offset(step: usize, spacing: usize) -> i64 {
    let step = i64::try_from(step).unwrap_or(i64::MAX);
    let spacing = i64::try_from(spacing).unwrap_or(i64::MAX);
    step.saturating_mul(spacing)
}

impl Default for SampleWindowExtractor {
    fn default() -> Self {
        Self::new(15, 2, BoundaryPolicy::Clamp)
    }
}
