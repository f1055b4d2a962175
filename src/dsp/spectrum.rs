use super::error::DspError;
use super::fft::Coefficients;

/// Turns transform output into display magnitudes.
#[derive(Clone, Copy, Debug)]
pub struct SpectrumComputer {
    scale: f64,
}

impl SpectrumComputer {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }

    /// `sqrt(re^2 + im^2) * scale` per bin
    pub fn magnitude(&self, real: &[f64], imag: &[f64]) -> Result<Vec<f64>, DspError> {
        if real.len() != imag.len() {
            return Err(DspError::CoefficientLengthMismatch {
                real: real.len(),
                imag: imag.len(),
            });
        }

        Ok(real
            .iter()
            .zip(imag)
            .map(|(&re, &im)| (re * re + im * im).sqrt() * self.scale)
            .collect())
    }

    pub fn from_coefficients(&self, coefficients: &Coefficients) -> Result<Vec<f64>, DspError> {
        self.magnitude(&coefficients.real, &coefficients.imag)
    }
}

impl Default for SpectrumComputer {
    fn default() -> Self {
        Self::new(8.0)
    }
}
