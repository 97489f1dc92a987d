//! The fixed band-pass stage that turns resampled acceleration into count units.
//!
//! Coefficients, warm-up length and the output scale are frozen constants
//! matching the tables used by ActiLife. The trailing zero coefficients
//! never contribute but are kept so the arrays match the published
//! 9-entry tables.

use nalgebra::{DMatrix, DVector};
use ndarray::Array2;

use crate::error::{CountsError, CountsResult};

/// Feedforward (numerator) coefficients
pub const INPUT_COEFFICIENTS: [f64; 9] = [
    -0.009341062898525,
    -0.025470289659360,
    -0.004235264826105,
    0.044152415456420,
    0.036493718347760,
    -0.011893961934740,
    -0.022917390623150,
    -0.006788163862310,
    0.000000000000000,
];

/// Feedback (denominator) coefficients, first entry normalized to 1
pub const OUTPUT_COEFFICIENTS: [f64; 9] = [
    1.00000000000000000000,
    -3.63367395910957000000,
    5.03689812757486000000,
    -3.09612247819666000000,
    0.50620507633883000000,
    0.32421701566682000000,
    -0.15685485875559000000,
    0.01949130205890000000,
    0.00000000000000000000,
];

/// Conversion from filtered acceleration to count units, applied after the
/// filter. 17.127404 is used in ActiLife and 17.128125 is used in firmware.
pub const COUNT_SCALE: f64 = (3.0 / 4096.0) / (2.6 / 256.0) * 237.5;

/// Constant-input iterations that charge the filter to steady state before
/// the first real sample (36 seconds at 30 Hz)
pub const SETTLE_ITERATIONS: usize = 180 * 6;

/// Shift registers for the direct-form difference equation
#[derive(Clone, Debug)]
pub struct FilterMemory {
    inputs: [f64; 8],
    outputs: [f64; 8],
}

impl FilterMemory {
    pub fn new() -> Self {
        Self {
            inputs: [0.0; 8],
            outputs: [0.0; 8],
        }
    }

    /// Feed one sample and return the unscaled filter output.
    /// Feedback always uses unscaled outputs.
    pub fn step(&mut self, x: f64) -> f64 {
        for k in (1..8).rev() {
            self.inputs[k] = self.inputs[k - 1];
        }
        self.inputs[0] = x;

        let mut zeros_part = 0.0;
        for k in 0..8 {
            zeros_part += INPUT_COEFFICIENTS[k] * self.inputs[k];
        }
        let mut poles_part = 0.0;
        for k in 1..8 {
            poles_part += OUTPUT_COEFFICIENTS[k] * self.outputs[k - 1];
        }
        let y = zeros_part - poles_part;

        for k in (1..8).rev() {
            self.outputs[k] = self.outputs[k - 1];
        }
        self.outputs[0] = y;
        y
    }

    /// Charge the registers by feeding `x0` until the transient has decayed
    pub fn charge(&mut self, x0: f64) {
        for _ in 0..SETTLE_ITERATIONS {
            self.step(x0);
        }
    }
}

/// Filter one channel with the shift-register form. The registers are charged
/// with the channel's first sample, then the pass re-feeds that sample as the
/// first real input. Output is in count units.
pub fn filter_reference(samples: &[f64]) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }
    let mut memory = FilterMemory::new();
    memory.charge(samples[0]);
    samples
        .iter()
        .map(|&x| COUNT_SCALE * memory.step(x))
        .collect()
}

/// Initial state for the transposed direct-form-II recurrence: the fixed
/// point of the state update under unit constant input. Scaling it by a
/// channel's first sample removes the start-up transient for that channel.
pub fn steady_state_zi() -> CountsResult<[f64; 8]> {
    let order = 8;
    let mut m = DMatrix::<f64>::zeros(order, order);
    for j in 0..order {
        m[(j, 0)] += OUTPUT_COEFFICIENTS[j + 1];
        m[(j, j)] += 1.0;
        if j + 1 < order {
            m[(j, j + 1)] -= 1.0;
        }
    }
    let mut rhs = DVector::<f64>::zeros(order);
    for j in 0..order {
        rhs[j] = INPUT_COEFFICIENTS[j + 1] - OUTPUT_COEFFICIENTS[j + 1] * INPUT_COEFFICIENTS[0];
    }

    let solved = m
        .lu()
        .solve(&rhs)
        .ok_or_else(|| CountsError::Internal("steady-state filter system is singular".into()))?;
    let mut zi = [0.0; 8];
    for j in 0..order {
        zi[j] = solved[j];
    }
    Ok(zi)
}

/// Filter every row of a (channels, n) matrix in place with the transposed
/// direct-form-II recurrence, each row initialized at its own steady state.
/// Output is in count units.
pub fn filter_fast(data: &mut Array2<f64>) -> CountsResult<()> {
    if data.ncols() == 0 {
        return Ok(());
    }
    let zi = steady_state_zi()?;

    for mut row in data.rows_mut() {
        let x0 = row[0];
        let mut z = [0.0; 8];
        for k in 0..8 {
            z[k] = zi[k] * x0;
        }
        for v in row.iter_mut() {
            let x = *v;
            let y = INPUT_COEFFICIENTS[0] * x + z[0];
            for k in 0..7 {
                z[k] = INPUT_COEFFICIENTS[k + 1] * x + z[k + 1] - OUTPUT_COEFFICIENTS[k + 1] * y;
            }
            z[7] = INPUT_COEFFICIENTS[8] * x - OUTPUT_COEFFICIENTS[8] * y;
            *v = COUNT_SCALE * y;
        }
    }
    Ok(())
}
