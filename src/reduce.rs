use ndarray::{Array2, Axis};

/// Number of samples averaged into each 10 Hz value
pub const DECIMATION_BLOCK: usize = 3;

fn window_sums(samples: &[f64], block: usize) -> Vec<f64> {
    let n_blocks = samples.len() / block;
    let mut out = Vec::with_capacity(n_blocks);
    for w in 0..n_blocks {
        let mut sum = 0.0;
        for &v in &samples[w * block..(w + 1) * block] {
            sum += v;
        }
        out.push(sum);
    }
    out
}

/// Decimate a trimmed 30 Hz channel to 10 Hz: floor of the mean over
/// consecutive blocks of 3. The trailing remainder is dropped.
pub fn block_averages(samples: &[f64]) -> Vec<f64> {
    window_sums(samples, DECIMATION_BLOCK)
        .into_iter()
        .map(|s| (s / DECIMATION_BLOCK as f64).floor())
        .collect()
}

/// Accumulate a 10 Hz channel into epochs: floor of the sum over
/// `block`-sample windows. The trailing remainder is dropped.
pub fn block_totals(samples: &[f64], block: usize) -> Vec<f64> {
    window_sums(samples, block)
        .into_iter()
        .map(|s| s.floor())
        .collect()
}

/// Window sums for every row of a (channels, n) matrix, formulated as
/// differences of a running cumulative sum
fn window_sums_fast(data: &Array2<f64>, block: usize) -> Array2<f64> {
    let n_blocks = data.ncols() / block;
    let mut cumulative = data.clone();
    cumulative.accumulate_axis_inplace(Axis(1), |&prev, cur| *cur += prev);

    let mut out = Array2::<f64>::zeros((data.nrows(), n_blocks));
    for ch in 0..data.nrows() {
        let mut prev_end = 0.0;
        for w in 0..n_blocks {
            let end = cumulative[[ch, (w + 1) * block - 1]];
            out[[ch, w]] = end - prev_end;
            prev_end = end;
        }
    }
    out
}

/// [`block_averages`] for every row of a matrix
pub fn block_averages_fast(data: &Array2<f64>) -> Array2<f64> {
    let mut out = window_sums_fast(data, DECIMATION_BLOCK);
    out.mapv_inplace(|s| (s / DECIMATION_BLOCK as f64).floor());
    out
}

/// [`block_totals`] for every row of a matrix
pub fn block_totals_fast(data: &Array2<f64>, block: usize) -> Array2<f64> {
    let mut out = window_sums_fast(data, block);
    out.mapv_inplace(|s| s.floor());
    out
}
