use serde::{Deserialize, Serialize};

use super::sink::TickFrame;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

/// Canvas-space shapes for one tick
#[derive(Clone, Debug, Serialize)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    /// Vertical bars rising from the spectrum baseline, one per bin in the
    /// lower half of the spectrum
    pub spectrum: Vec<Segment>,
    pub waveform: Vec<Point>,
}

/// Placement of the two views on the canvas.
///
/// Both views span the middle half of the canvas horizontally. The spectrum
/// hangs off a baseline below the vertical centre, the waveform sits above it.
#[derive(Clone, Debug, Deserialize)]
pub struct Layout {
    #[serde(default = "default_spectrum_baseline")]
    pub spectrum_baseline: f64,
    #[serde(default = "default_spectrum_overhang")]
    pub spectrum_overhang: f64,
    #[serde(default = "default_waveform_offset")]
    pub waveform_offset: f64,
    #[serde(default = "default_waveform_amplitude")]
    pub waveform_amplitude: f64,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            spectrum_baseline: default_spectrum_baseline(),
            spectrum_overhang: default_spectrum_overhang(),
            waveform_offset: default_waveform_offset(),
            waveform_amplitude: default_waveform_amplitude(),
        }
    }
}

fn default_spectrum_baseline() -> f64 { 100.0 }
fn default_spectrum_overhang() -> f64 { 2.0 }
fn default_waveform_offset() -> f64 { 200.0 }
fn default_waveform_amplitude() -> f64 { 100.0 }

impl Layout {
    pub fn apply(&self, frame: &TickFrame) -> Geometry {
        let w = frame.width as f64;
        let h = frame.height as f64;

        Geometry {
            width: frame.width,
            height: frame.height,
            spectrum: self.spectrum_bars(&frame.spectrum, w, h),
            waveform: self.waveform_points(&frame.waveform, w, h),
        }
    }

    fn spectrum_bars(&self, spectrum: &[f64], w: f64, h: f64) -> Vec<Segment> {
        // Upper half mirrors the lower half for a real input
        let bins = spectrum.len() / 2;
        let base = h / 2.0 + self.spectrum_baseline;

        spectrum[..bins]
            .iter()
            .enumerate()
            .map(|(i, &m)| {
                let x = span_x(i, bins, w);
                Segment {
                    from: Point { x, y: base + self.spectrum_overhang },
                    to: Point { x, y: base - m },
                }
            })
            .collect()
    }

    fn waveform_points(&self, waveform: &[f64], w: f64, h: f64) -> Vec<Point> {
        let top = h / 2.0 - self.waveform_offset;
        waveform
            .iter()
            .enumerate()
            .map(|(i, &v)| Point {
                x: span_x(i, waveform.len(), w),
                y: top - v * self.waveform_amplitude,
            })
            .collect()
    }
}

/// x of the `i`-th of `count` evenly spaced points across `[w/4, 3w/4]`
fn span_x(i: usize, count: usize, w: f64) -> f64 {
    let denom = count.saturating_sub(1).max(1) as f64;
    w / 4.0 + (i as f64 / denom) * (w / 2.0)
}
