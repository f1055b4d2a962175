//! Spectrum analysis pipeline: frame extraction, a table-driven radix-2 FFT
//! and magnitude scaling.

pub mod bit_reversal;
pub mod error;
pub mod fft;
pub mod spectrum;
pub mod twiddle;
pub mod window;

pub use error::DspError;
pub use fft::AnalysisContext;
pub use spectrum::SpectrumComputer;
pub use window::{BoundaryPolicy, SampleWindowExtractor};
