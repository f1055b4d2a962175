use std::f64::consts::PI;

/// Butterfly coefficients for one radix-2 stage.
///
/// Entry `l` belongs to the `l`-th pair `(i, k = i + window_size/2)` visited in
/// increasing `i` order. `wi` rotates the upper leg into `i`, `wk` into `k`.
#[derive(Clone, Debug)]
pub struct TwiddleStage {
    pub window_size: usize,
    pub wi_re: Vec<f64>,
    pub wi_im: Vec<f64>,
    pub wk_re: Vec<f64>,
    pub wk_im: Vec<f64>,
}

/// Per-stage twiddle factors for an `N`-point transform (`log2(N)` stages).
#[derive(Clone, Debug)]
pub struct TwiddleFactorTable {
    size: usize,
    stages: Vec<TwiddleStage>,
}

impl TwiddleFactorTable {
    pub fn new(size: usize) -> Self {
        let mut stages = Vec::new();
        let mut window_size = 1;

        while window_size < size {
            window_size *= 2;
            let half = window_size / 2;
            let mut stage = TwiddleStage {
                window_size,
                wi_re: Vec::with_capacity(size / 2),
                wi_im: Vec::with_capacity(size / 2),
                wk_re: Vec::with_capacity(size / 2),
                wk_im: Vec::with_capacity(size / 2),
            };

            for i in (0..size).filter(|i| i % window_size < half) {
                let k = i + half;
                let (wi_sin, wi_cos) = angle(i, window_size).sin_cos();
                let (wk_sin, wk_cos) = angle(k, window_size).sin_cos();
                stage.wi_re.push(wi_cos);
                stage.wi_im.push(wi_sin);
                stage.wk_re.push(wk_cos);
                stage.wk_im.push(wk_sin);
            }

            stages.push(stage);
        }

        Self { size, stages }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn stages(&self) -> &[TwiddleStage] {
        &self.stages
    }
}

fn angle(position: usize, window_size: usize) -> f64 {
    -2.0 * PI * (position % window_size) as f64 / window_size as f64
}
