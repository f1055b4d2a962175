use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::dsp::BoundaryPolicy;
use crate::render::geometry::Layout;
use crate::render::scheduler::LoopSettings;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0} must be at least 1")]
    Zero(&'static str),

    #[error("Transform size must be a power of two >= 2, got {0}")]
    TransformSize(usize),

    #[error("Tick rate must be a positive number of Hz, got {0}")]
    TickRate(f64),
}

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub layout: Layout,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_transform_size")]
    pub transform_size: usize,
    #[serde(default = "default_stride")]
    pub stride: usize,
    /// Defaults to a tenth of `stride`
    #[serde(default)]
    pub waveform_stride: Option<usize>,
    #[serde(default = "default_display_scale")]
    pub display_scale: f64,
    #[serde(default = "default_lowpass_taps")]
    pub lowpass_taps: usize,
    #[serde(default = "default_lowpass_spacing")]
    pub lowpass_spacing: usize,
    #[serde(default)]
    pub boundary: BoundaryPolicy,
}

#[derive(Debug, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_fps")]
    pub fps: f64,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            transform_size: default_transform_size(),
            stride: default_stride(),
            waveform_stride: None,
            display_scale: default_display_scale(),
            lowpass_taps: default_lowpass_taps(),
            lowpass_spacing: default_lowpass_spacing(),
            boundary: BoundaryPolicy::default(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_transform_size() -> usize { 256 }
fn default_stride() -> usize { 40 }
fn default_display_scale() -> f64 { 8.0 }
fn default_lowpass_taps() -> usize { 15 }
fn default_lowpass_spacing() -> usize { 2 }
fn default_fps() -> f64 { 60.0 }
fn default_width() -> u32 { 1920 }
fn default_height() -> u32 { 1080 }

impl AnalysisConfig {
    pub fn waveform_stride(&self) -> usize {
        self.waveform_stride.unwrap_or(self.stride / 10).max(1)
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let size = self.analysis.transform_size;
        if size < 2 || !size.is_power_of_two() {
            return Err(ConfigError::TransformSize(size));
        }
        if self.analysis.stride == 0 {
            return Err(ConfigError::Zero("stride"));
        }
        if self.analysis.waveform_stride == Some(0) {
            return Err(ConfigError::Zero("waveform_stride"));
        }
        if self.analysis.lowpass_taps == 0 {
            return Err(ConfigError::Zero("lowpass_taps"));
        }
        if !(self.render.fps.is_finite() && self.render.fps > 0.0) {
            return Err(ConfigError::TickRate(self.render.fps));
        }
        if self.render.width == 0 {
            return Err(ConfigError::Zero("width"));
        }
        if self.render.height == 0 {
            return Err(ConfigError::Zero("height"));
        }
        Ok(())
    }

    pub fn loop_settings(&self) -> LoopSettings {
        LoopSettings {
            transform_size: self.analysis.transform_size,
            stride: self.analysis.stride,
            waveform_stride: self.analysis.waveform_stride(),
            width: self.render.width,
            height: self.render.height,
            tick_interval: Duration::from_secs_f64(1.0 / self.render.fps),
        }
    }
}

/// `sonoscope.toml` in the working directory, then the per-user config.
pub fn find_config_path() -> Option<PathBuf> {
    let local = PathBuf::from("sonoscope.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("sonoscope").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("sonoscope").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.analysis.transform_size, 256);
        assert_eq!(cfg.analysis.stride, 40);
        assert_eq!(cfg.analysis.waveform_stride(), 4);
        assert_eq!(cfg.analysis.display_scale, 8.0);
        assert_eq!(cfg.analysis.lowpass_taps, 15);
        assert_eq!(cfg.analysis.lowpass_spacing, 2);
        assert_eq!(cfg.analysis.boundary, BoundaryPolicy::Clamp);
        assert_eq!(cfg.render.fps, 60.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn parses_sections() {
        let cfg: Config = toml::from_str(
            r#"
            [analysis]
            transform_size = 512
            stride = 20
            boundary = "zero"

            [render]
            fps = 30.0
            width = 800

            [layout]
            waveform_amplitude = 50.0
            "#,
        )
        .unwrap();
        assert_eq!(cfg.analysis.transform_size, 512);
        assert_eq!(cfg.analysis.waveform_stride(), 2);
        assert_eq!(cfg.analysis.boundary, BoundaryPolicy::ZeroPad);
        assert_eq!(cfg.render.width, 800);
        assert_eq!(cfg.render.height, 1080);
        assert_eq!(cfg.layout.waveform_amplitude, 50.0);

        let settings = cfg.loop_settings();
        assert_eq!(settings.transform_size, 512);
        assert!((settings.tick_interval.as_secs_f64() - 1.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn waveform_stride_never_drops_to_zero() {
        let mut cfg = Config::default();
        cfg.analysis.stride = 5;
        assert_eq!(cfg.analysis.waveform_stride(), 1);
        cfg.analysis.waveform_stride = Some(3);
        assert_eq!(cfg.analysis.waveform_stride(), 3);
    }

    #[test]
    fn rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.analysis.transform_size = 300;
        assert!(matches!(cfg.validate(), Err(ConfigError::TransformSize(300))));

        let mut cfg = Config::default();
        cfg.analysis.stride = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Zero("stride"))));

        let mut cfg = Config::default();
        cfg.render.fps = 0.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::TickRate(_))));

        let mut cfg = Config::default();
        cfg.render.fps = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unknown_boundary_policy_fails_to_parse() {
        let result: Result<Config, _> = toml::from_str("[analysis]\nboundary = \"wrap\"");
        assert!(result.is_err());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_config(Path::new("/nonexistent/sonoscope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
