use crossbeam::thread;
use ndarray::Array2;

use crate::bandpass;
use crate::error::{CountsError, CountsResult};
use crate::reduce;
use crate::resample;
use crate::trim;
use crate::types::{EpochCounts, Mode, RawSeries, SampleRate};

/// Rate of the decimated count stream that epochs accumulate over
pub const COUNTS_RATE_HZ: usize = 10;

/// Convert raw tri-axial samples into epoch activity counts.
///
/// The chain is resample to 30 Hz, band-pass into count units, trim,
/// decimate to 10 Hz (floored block means) and accumulate epochs (floored
/// block sums). Both modes produce the same integer matrix; `Reference`
/// runs transparent per-axis loops, `Fast` runs the vectorized
/// formulations. Input too short for a single epoch yields a 0-row result,
/// not an error.
pub fn convert(
    raw: &RawSeries,
    frequency: u32,
    epoch_seconds: u32,
    lfe_select: bool,
    mode: Mode,
) -> CountsResult<EpochCounts> {
    let rate = SampleRate::try_from(frequency)?;
    if epoch_seconds == 0 {
        return Err(CountsError::InvalidEpochLength);
    }
    if raw.y.len() != raw.x.len() || raw.z.len() != raw.x.len() {
        return Err(CountsError::ChannelMismatch {
            x: raw.x.len(),
            y: raw.y.len(),
            z: raw.z.len(),
        });
    }

    let plan = rate.plan();
    let n30 = raw.len() * plan.up / plan.down;
    let block = epoch_seconds as usize * COUNTS_RATE_HZ;
    let n_epochs = (n30 / reduce::DECIMATION_BLOCK) / block;
    if n_epochs == 0 {
        return Ok(EpochCounts::empty());
    }

    log::debug!(
        "converting {} samples at {} Hz into {} epochs of {} s (lfe: {}, mode: {})",
        raw.len(),
        frequency,
        n_epochs,
        epoch_seconds,
        lfe_select,
        mode.as_str()
    );

    match mode {
        Mode::Reference => convert_reference(raw, rate, block, lfe_select),
        Mode::Fast => convert_fast(raw, rate, block, lfe_select),
    }
}

/// One axis through the loop-based chain
fn extract_axis(samples: &[f64], rate: SampleRate, block: usize, lfe: bool) -> Vec<i64> {
    let resampled = resample::resample_reference(samples, rate);
    let filtered = bandpass::filter_reference(&resampled);
    let trimmed: Vec<f64> = filtered
        .into_iter()
        .map(|v| trim::trim_sample(v, lfe))
        .collect();
    let decimated = reduce::block_averages(&trimmed);
    reduce::block_totals(&decimated, block)
        .into_iter()
        .map(|v| v as i64)
        .collect()
}

/// The axes share no state, so each one runs on its own scoped thread
fn convert_reference(
    raw: &RawSeries,
    rate: SampleRate,
    block: usize,
    lfe: bool,
) -> CountsResult<EpochCounts> {
    let joined = thread::scope(|s| {
        let x = s.spawn(|_| extract_axis(&raw.x, rate, block, lfe));
        let y = s.spawn(|_| extract_axis(&raw.y, rate, block, lfe));
        let z = s.spawn(|_| extract_axis(&raw.z, rate, block, lfe));
        match (x.join(), y.join(), z.join()) {
            (Ok(x), Ok(y), Ok(z)) => Some((x, y, z)),
            _ => None,
        }
    });
    match joined {
        Ok(Some((x, y, z))) => Ok(EpochCounts::from_axes(x, y, z)),
        _ => Err(CountsError::Internal("axis worker panicked".into())),
    }
}

fn convert_fast(
    raw: &RawSeries,
    rate: SampleRate,
    block: usize,
    lfe: bool,
) -> CountsResult<EpochCounts> {
    let matrix = raw.channel_matrix();
    let mut data = resample::resample_fast(&matrix, rate);
    bandpass::filter_fast(&mut data)?;
    trim::trim_in_place(&mut data, lfe);
    let decimated = reduce::block_averages_fast(&data);
    let totals = reduce::block_totals_fast(&decimated, block);

    // totals is (3, epochs); the result matrix is (epochs, 3)
    let n = totals.ncols();
    let mut counts = Array2::<i64>::zeros((n, 3));
    for ch in 0..3 {
        for i in 0..n {
            counts[[i, ch]] = totals[[ch, i]] as i64;
        }
    }
    Ok(EpochCounts::from_matrix(counts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    // movement-like signal: in-band tones on x and y, gravity plus a tone on z
    fn walking_series(rate: SampleRate, seconds: usize) -> RawSeries {
        let hz = rate.hz() as f64;
        let n = seconds * rate.hz() as usize;
        let mut series = RawSeries::new();
        for i in 0..n {
            let t = i as f64 / hz;
            let x = 0.7 * (2.0 * PI * 1.2 * t).sin() + 0.05 * (2.0 * PI * 4.1 * t).cos();
            let y = 0.4 * (2.0 * PI * 0.9 * t + 0.5).sin();
            let z = 1.0 + 0.25 * (2.0 * PI * 1.7 * t).sin();
            series.push(x, y, z);
        }
        series
    }

    #[test]
    fn test_modes_produce_identical_counts() {
        for rate in SampleRate::ALL {
            for lfe in [false, true] {
                let raw = walking_series(rate, 60);
                let reference =
                    convert(&raw, rate.hz(), 10, lfe, Mode::Reference).unwrap();
                let fast = convert(&raw, rate.hz(), 10, lfe, Mode::Fast).unwrap();
                assert_eq!(
                    reference.counts,
                    fast.counts,
                    "{} Hz, lfe {}",
                    rate.hz(),
                    lfe
                );
                assert!(reference.num_epochs() > 0);
            }
        }
    }

    #[test]
    fn test_counts_are_plausible() {
        let raw = walking_series(SampleRate::Hz30, 120);
        let counts = convert(&raw, 30, 60, false, Mode::Fast).unwrap();
        assert_eq!(counts.num_epochs(), 2);
        let [x, y, z] = counts.axis_totals();
        // the 1.2 Hz 0.7 g tone dominates; gravity on z is filtered out
        assert!(x > y, "x={} y={}", x, y);
        assert!(x > 0 && y > 0);
        assert!(z < x, "z={} x={}", z, x);
    }

    #[test]
    fn test_zero_input_produces_zero_counts() {
        let raw = RawSeries::from_channels(vec![0.0; 3600], vec![0.0; 3600], vec![0.0; 3600])
            .unwrap();
        for mode in [Mode::Reference, Mode::Fast] {
            let counts = convert(&raw, 60, 10, false, mode).unwrap();
            assert_eq!(counts.num_epochs(), 6);
            assert!(counts.counts.iter().all(|&v| v == 0));
        }
    }

    #[test]
    fn test_epoch_row_counts() {
        // rows = floor(floor(floor(n * up / down) / 3) / (10 * epoch))
        for rate in SampleRate::ALL {
            let raw = walking_series(rate, 90);
            let plan = rate.plan();
            let n30 = raw.len() * plan.up / plan.down;
            let want = (n30 / 3) / 50;
            let counts = convert(&raw, rate.hz(), 5, false, Mode::Fast).unwrap();
            assert_eq!(counts.num_epochs(), want, "{} Hz", rate.hz());
        }
    }

    #[test]
    fn test_trailing_partial_epoch_is_dropped() {
        // 35 samples at 30 Hz: 11 values at 10 Hz, one complete 1 s epoch
        let raw = walking_series(SampleRate::Hz30, 2);
        let raw = RawSeries::from_channels(
            raw.x[..35].to_vec(),
            raw.y[..35].to_vec(),
            raw.z[..35].to_vec(),
        )
        .unwrap();
        let counts = convert(&raw, 30, 1, false, Mode::Reference).unwrap();
        assert_eq!(counts.num_epochs(), 1);

        // 29 samples cannot fill an epoch at all
        let short = RawSeries::from_channels(
            raw.x[..29].to_vec(),
            raw.y[..29].to_vec(),
            raw.z[..29].to_vec(),
        )
        .unwrap();
        let counts = convert(&short, 30, 1, false, Mode::Reference).unwrap();
        assert_eq!(counts.num_epochs(), 0);
    }

    #[test]
    fn test_empty_input_is_not_an_error() {
        let raw = RawSeries::new();
        for mode in [Mode::Reference, Mode::Fast] {
            let counts = convert(&raw, 50, 60, false, mode).unwrap();
            assert_eq!(counts.num_epochs(), 0);
        }
    }

    #[test]
    fn test_validation_errors() {
        let raw = walking_series(SampleRate::Hz30, 1);
        assert!(matches!(
            convert(&raw, 45, 60, false, Mode::Fast),
            Err(CountsError::UnsupportedFrequency(45))
        ));
        assert!(matches!(
            convert(&raw, 30, 0, false, Mode::Fast),
            Err(CountsError::InvalidEpochLength)
        ));
        // frequency is checked before the epoch length
        assert!(matches!(
            convert(&raw, 31, 0, false, Mode::Fast),
            Err(CountsError::UnsupportedFrequency(31))
        ));

        let lopsided = RawSeries {
            x: vec![0.0; 100],
            y: vec![0.0; 99],
            z: vec![0.0; 100],
        };
        assert!(matches!(
            convert(&lopsided, 30, 1, false, Mode::Fast),
            Err(CountsError::ChannelMismatch { x: 100, y: 99, z: 100 })
        ));
    }

    #[test]
    fn test_lfe_never_lowers_counts() {
        for rate in [SampleRate::Hz30, SampleRate::Hz80] {
            let raw = walking_series(rate, 60);
            let standard = convert(&raw, rate.hz(), 10, false, Mode::Fast).unwrap();
            let lfe = convert(&raw, rate.hz(), 10, true, Mode::Fast).unwrap();
            for (l, s) in lfe.counts.iter().zip(standard.counts.iter()) {
                assert!(l >= s, "lfe {} standard {}", l, s);
            }
        }
    }
}
