use super::bit_reversal::BitReversalTable;
use super::error::DspError;
use super::twiddle::TwiddleFactorTable;

/// Real and imaginary parts of a transformed frame
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Coefficients {
    pub real: Vec<f64>,
    pub imag: Vec<f64>,
}

/// Precomputed tables for one transform size.
///
/// Both tables depend only on the size, so a context can be kept for as long
/// as the size does not change.
#[derive(Clone, Debug)]
pub struct AnalysisContext {
    size: usize,
    bit_reversal: BitReversalTable,
    twiddle: TwiddleFactorTable,
}

impl AnalysisContext {
    pub fn new(size: usize) -> Result<Self, DspError> {
        if size < 2 || !size.is_power_of_two() {
            return Err(DspError::InvalidTransformSize(size));
        }

        Ok(Self {
            size,
            bit_reversal: BitReversalTable::new(size),
            twiddle: TwiddleFactorTable::new(size),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn transform(&self, frame: &[f64]) -> Result<Coefficients, DspError> {
        transform(frame, &self.bit_reversal, &self.twiddle)
    }
}

/// Iterative radix-2 decimation-in-time FFT.
///
/// The input is read through the bit-reversal table, then each stage combines
/// pairs `(i, i + window_size/2)` with that stage's twiddle factors, consumed
/// in the order the table produced them.
pub fn transform(
    frame: &[f64],
    bit_reversal: &BitReversalTable,
    twiddle: &TwiddleFactorTable,
) -> Result<Coefficients, DspError> {
    let size = bit_reversal.len();
    if size < 2 || !size.is_power_of_two() {
        return Err(DspError::InvalidTransformSize(size));
    }
    if twiddle.size() != size || twiddle.stages().len() != size.trailing_zeros() as usize {
        return Err(DspError::TableSizeMismatch {
            expected: size,
            tables: twiddle.size(),
        });
    }
    if frame.len() != size {
        return Err(DspError::FrameSizeMismatch {
            expected: size,
            got: frame.len(),
        });
    }

    let mut real: Vec<f64> = bit_reversal.as_slice().iter().map(|&j| frame[j]).collect();
    let mut imag = vec![0.0; size];

    for stage in twiddle.stages() {
        let half = stage.window_size / 2;
        let pairs = (0..size).filter(|i| i % stage.window_size < half);

        for (l, i) in pairs.enumerate() {
            let k = i + half;
            let (ri, ii, rk, ik) = (real[i], imag[i], real[k], imag[k]);
            let (wi_re, wi_im) = (stage.wi_re[l], stage.wi_im[l]);
            let (wk_re, wk_im) = (stage.wk_re[l], stage.wk_im[l]);

            real[i] = ri + wi_re * rk - wi_im * ik;
            imag[i] = ii + wi_im * rk + wi_re * ik;
            real[k] = ri + wk_re * rk - wk_im * ik;
            imag[k] = ii + wk_im * rk + wk_re * ik;
        }
    }

    Ok(Coefficients { real, imag })
}
