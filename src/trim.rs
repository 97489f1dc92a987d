use ndarray::Array2;

/// Count magnitude below which a sample is zeroed in standard trimming
const STANDARD_MIN_COUNT: f64 = 4.0;
/// Count magnitude below which a sample is zeroed with the low-frequency extension
const LFE_MIN_COUNT: f64 = 1.0;
/// Saturation ceiling in counts
const MAX_COUNT: f64 = 128.0;

/// Threshold one filtered sample into a non-negative integer-valued count.
///
/// Rectifies, saturates at 128, zeroes the dead band and floors everything
/// else. With the low-frequency extension the dead band shrinks to below 1
/// and magnitudes in [1, 4) map to floor minus one, admitting more
/// low-level movement. NaN input stays NaN.
pub fn trim_sample(value: f64, lfe: bool) -> f64 {
    let v = value.abs();
    if lfe {
        if v > MAX_COUNT {
            MAX_COUNT
        } else if v < LFE_MIN_COUNT {
            0.0
        } else if v < STANDARD_MIN_COUNT {
            v.floor() - 1.0
        } else {
            v.floor()
        }
    } else if v > MAX_COUNT {
        MAX_COUNT
    } else if v < STANDARD_MIN_COUNT {
        0.0
    } else {
        v.floor()
    }
}

/// Trim every element of a (channels, n) matrix in place
pub fn trim_in_place(data: &mut Array2<f64>, lfe: bool) {
    data.mapv_inplace(|v| trim_sample(v, lfe));
}
