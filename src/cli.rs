use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;
use crate::dsp::BoundaryPolicy;

#[derive(Parser, Debug)]
#[command(name = "sonoscope", about = "Real-time spectrum and waveform visualizer")]
pub struct Cli {
    /// Input audio file (WAV, MP3, M4A, OGG)
    pub input: Option<PathBuf>,

    /// Format tag (wav, mp3, mpeg, m4a, ogg or an audio/* MIME type).
    /// Defaults to the input file extension.
    #[arg(short, long)]
    pub format: Option<String>,

    /// Config file (defaults to ./sonoscope.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Redraw rate in Hz
    #[arg(long)]
    pub fps: Option<f64>,

    /// Transform size (power of two)
    #[arg(long)]
    pub size: Option<usize>,

    /// Spacing between analyzed samples in the spectrum frame
    #[arg(long)]
    pub stride: Option<usize>,

    /// Spacing between samples in the waveform view (default: stride / 10)
    #[arg(long)]
    pub waveform_stride: Option<usize>,

    /// Display scale applied to spectrum magnitudes
    #[arg(long)]
    pub scale: Option<f64>,

    /// How reads past either end of the track are resolved
    #[arg(long, value_enum)]
    pub boundary: Option<BoundaryPolicy>,

    /// Canvas width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Canvas height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Write per-tick geometry as JSON lines to this file ("-" for stdout)
    #[arg(short, long)]
    pub geometry: Option<PathBuf>,

    /// Read play/stop/load/quit commands from stdin
    #[arg(short, long)]
    pub interactive: bool,

    /// Start playing as soon as a track is decoded (always on without --interactive)
    #[arg(long)]
    pub autoplay: bool,

    /// Hide the playback progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl Cli {
    /// Flags given on the command line win over config values.
    pub fn apply_to(&self, cfg: &mut Config) {
        if let Some(fps) = self.fps { cfg.render.fps = fps; }
        if let Some(width) = self.width { cfg.render.width = width; }
        if let Some(height) = self.height { cfg.render.height = height; }
        if let Some(size) = self.size { cfg.analysis.transform_size = size; }
        if let Some(stride) = self.stride { cfg.analysis.stride = stride; }
        if let Some(stride) = self.waveform_stride {
            cfg.analysis.waveform_stride = Some(stride);
        }
        if let Some(scale) = self.scale { cfg.analysis.display_scale = scale; }
        if let Some(boundary) = self.boundary { cfg.analysis.boundary = boundary; }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "sonoscope", "song.wav", "--fps", "30", "--size", "512", "--boundary", "zero",
        ]);
        let mut cfg = Config::default();
        cli.apply_to(&mut cfg);
        assert_eq!(cfg.render.fps, 30.0);
        assert_eq!(cfg.analysis.transform_size, 512);
        assert_eq!(cfg.analysis.boundary, BoundaryPolicy::ZeroPad);
        // untouched values keep the config's
        assert_eq!(cfg.analysis.stride, 40);
        assert_eq!(cfg.render.width, 1920);
    }

    #[test]
    fn interactive_without_input() {
        let cli = Cli::parse_from(["sonoscope", "--interactive"]);
        assert!(cli.interactive);
        assert!(cli.input.is_none());
    }
}
