use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::geometry::{Geometry, Layout};

/// Everything the renderer receives for one tick.
#[derive(Clone, Debug)]
pub struct TickFrame {
    pub tick: u64,
    /// Playback position in seconds
    pub position: f64,
    pub duration: f64,
    /// Scaled magnitudes, one per transform bin
    pub spectrum: Vec<f64>,
    /// Raw samples at the waveform stride
    pub waveform: Vec<f64>,
    pub width: u32,
    pub height: u32,
}

/// Drawing side of the render loop. Receives one frame per tick and gives
/// nothing back.
pub trait GeometrySink {
    fn draw(&mut self, frame: &TickFrame) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: GeometrySink + ?Sized> GeometrySink for Box<S> {
    fn draw(&mut self, frame: &TickFrame) -> Result<()> {
        (**self).draw(frame)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// Discards every frame
#[derive(Debug, Default)]
pub struct NullSink;

impl GeometrySink for NullSink {
    fn draw(&mut self, frame: &TickFrame) -> Result<()> {
        log::trace!("tick {} at {:.3}s", frame.tick, frame.position);
        Ok(())
    }
}

#[derive(Serialize)]
struct Record<'a> {
    tick: u64,
    position: f64,
    duration: f64,
    #[serde(flatten)]
    geometry: &'a Geometry,
}

/// Writes the laid-out geometry of each tick as one JSON object per line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    layout: Layout,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W, layout: Layout) -> Self {
        Self { writer, layout }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesSink<BufWriter<File>> {
    pub fn create(path: &Path, layout: Layout) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create geometry file: {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file), layout))
    }
}

impl<W: Write> GeometrySink for JsonLinesSink<W> {
    fn draw(&mut self, frame: &TickFrame) -> Result<()> {
        let geometry = self.layout.apply(frame);
        let record = Record {
            tick: frame.tick,
            position: frame.position,
            duration: frame.duration,
            geometry: &geometry,
        };
        serde_json::to_writer(&mut self.writer, &record).context("Failed to serialize geometry")?;
        self.writer.write_all(b"\n").context("Failed to write geometry")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush geometry output")
    }
}
