use thiserror::Error;

/// Errors raised by the analysis pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DspError {
    #[error("Transform size must be a power of two >= 2, got {0}")]
    InvalidTransformSize(usize),

    #[error("Frame length mismatch: expected {expected}, got {got}")]
    FrameSizeMismatch { expected: usize, got: usize },

    #[error("Analysis tables were built for {tables} points, transform needs {expected}")]
    TableSizeMismatch { expected: usize, tables: usize },

    #[error("Coefficient length mismatch: {real} real vs {imag} imaginary")]
    CoefficientLengthMismatch { real: usize, imag: usize },
}
