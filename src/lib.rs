//! Conversion of raw tri-axial accelerometer recordings into ActiGraph-style
//! activity counts.
//!
//! The chain resamples the recording onto a 30 Hz timeline, runs a fixed
//! band-pass filter into count units, trims, decimates to 10 Hz and
//! accumulates epochs. Two execution paths are provided: a transparent
//! per-axis reference implementation and a vectorized fast one. Both produce
//! identical integer count matrices.

pub mod bandpass;
mod error;
pub mod pipeline;
pub mod reduce;
pub mod resample;
pub mod tabular;
pub mod trim;
mod types;

pub use error::{CountsError, CountsResult};
pub use pipeline::convert;
pub use types::{EpochCounts, Mode, RawSeries, ResamplePlan, SampleRate};
