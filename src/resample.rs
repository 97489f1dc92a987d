//! Rational rate conversion onto the 30 Hz count timeline.
//!
//! Frequencies that are not integer multiples of 30 Hz go through zero-stuffing,
//! a deliberately weak single-pole interpolation low-pass and decimation. The
//! filter does a poor job of rejecting the images above the passband; the
//! resulting aliasing is part of the behavior being reproduced, so the
//! coefficients and the operation order are fixed.

use ndarray::{s, Array2};
use std::f64::consts::PI;

use crate::types::SampleRate;

/// Round to 3 decimal places, ties to even (milli-g resolution)
pub fn round_milli_g(v: f64) -> f64 {
    (v * 1000.0).round_ties_even() / 1000.0
}

/// Interpolation low-pass for upsample factor `up`: returns (gain, feedback)
/// for y[n] = gain * (x[n] + x[n-1]) - feedback * y[n-1]
fn antialias_coefficients(up: usize) -> (f64, f64) {
    let l = up as f64;
    let a = PI / (PI + 2.0 * l);
    let b = (PI - 2.0 * l) / (PI + 2.0 * l);
    (a * l, b)
}

/// Resample one channel onto the 30 Hz timeline with explicit loops.
///
/// Output length is floor(n * up / down); every value is rounded to milli-g.
pub fn resample_reference(samples: &[f64], rate: SampleRate) -> Vec<f64> {
    let plan = rate.plan();
    if plan.up == 1 && plan.down == 1 {
        return samples.iter().map(|&v| round_milli_g(v)).collect();
    }

    let n_up = samples.len() * plan.up;
    let mut stuffed = vec![0.0; n_up];
    for (i, &v) in samples.iter().enumerate() {
        stuffed[i * plan.up] = v;
    }

    let filtered = if rate.needs_antialias() {
        antialias_reference(&stuffed, plan.up)
    } else {
        stuffed
    };

    let n_down = n_up / plan.down;
    let mut out = Vec::with_capacity(n_down);
    for i in 0..n_down {
        out.push(round_milli_g(filtered[i * plan.down]));
    }
    out
}

fn antialias_reference(stuffed: &[f64], up: usize) -> Vec<f64> {
    let (gain, feedback) = antialias_coefficients(up);
    let mut out = Vec::with_capacity(stuffed.len());
    let mut prev_in = 0.0;
    let mut prev_out = 0.0;
    for &x in stuffed {
        // same operation order as the vectorized path, so the two are
        // bit-identical, not merely close
        let y = gain * (x + prev_in) - feedback * prev_out;
        out.push(y);
        prev_in = x;
        prev_out = y;
    }
    out
}

/// Resample every channel of a (channels, n) matrix at once.
///
/// Identical output to running [`resample_reference`] per row.
pub fn resample_fast(raw: &Array2<f64>, rate: SampleRate) -> Array2<f64> {
    let plan = rate.plan();
    let n = raw.ncols();
    if n == 0 || (plan.up == 1 && plan.down == 1) {
        return raw.mapv(round_milli_g);
    }

    let n_up = n * plan.up;
    let mut stuffed = Array2::<f64>::zeros((raw.nrows(), n_up));
    stuffed.slice_mut(s![.., ..;plan.up]).assign(raw);

    if rate.needs_antialias() {
        antialias_fast(&mut stuffed, plan.up);
    }

    let n_down = n_up / plan.down;
    let mut out = stuffed
        .slice(s![.., ..n_down * plan.down;plan.down])
        .to_owned();
    out.mapv_inplace(round_milli_g);
    out
}

fn antialias_fast(stuffed: &mut Array2<f64>, up: usize) {
    let (gain, feedback) = antialias_coefficients(up);
    let n_up = stuffed.ncols();

    let mut shifted = Array2::<f64>::zeros(stuffed.dim());
    shifted
        .slice_mut(s![.., 1..])
        .assign(&stuffed.slice(s![.., ..n_up - 1]));
    *stuffed += &shifted;
    *stuffed *= gain;

    for mut row in stuffed.rows_mut() {
        let mut prev = 0.0;
        for v in row.iter_mut() {
            *v -= feedback * prev;
            prev = *v;
        }
    }
}
