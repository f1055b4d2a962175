/// Bit-reversal permutation for an `N`-point transform.
///
/// `table[i]` holds `i` with its low `log2(N)` bits reversed. The iterative
/// transform reads its input through this table so that the butterflies can
/// run in natural order.
#[derive(Clone, Debug)]
pub struct BitReversalTable {
    indices: Vec<usize>,
}

impl BitReversalTable {
    /// Build the table for `size` points.
    ///
    /// `size` should be an exact power of two. Any other size gives a table
    /// that is not a permutation, which [`transform`](super::fft::transform)
    /// rejects.
    pub fn new(size: usize) -> Self {
        let bits = ((size as f64).ln() / 2f64.ln()).round() as u32;
        let indices = (0..size).map(|i| reverse_bits(i, bits)).collect();

        Self { indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[cfg(test)]
    pub fn bits(&self) -> u32 {
        self.indices.len().trailing_zeros()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }
}

fn reverse_bits(num: usize, bits: u32) -> usize {
    let mut tmp = num;
    let mut reversed = 0;
    for _ in 0..bits {
        reversed = (reversed << 1) | (tmp & 1);
        tmp >>= 1;
    }
    reversed
}
