use ndarray::Array2;

use crate::error::{CountsError, CountsResult};

/// Sampling frequencies with a defined conversion onto the 30 Hz count timeline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SampleRate {
    Hz30,
    Hz40,
    Hz50,
    Hz60,
    Hz70,
    Hz80,
    Hz90,
    Hz100,
}

/// Rational rate conversion factors: interpolate by `up`, keep every `down`-th sample
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResamplePlan {
    pub up: usize,
    pub down: usize,
}

impl SampleRate {
    pub const ALL: [SampleRate; 8] = [
        SampleRate::Hz30,
        SampleRate::Hz40,
        SampleRate::Hz50,
        SampleRate::Hz60,
        SampleRate::Hz70,
        SampleRate::Hz80,
        SampleRate::Hz90,
        SampleRate::Hz100,
    ];

    /// Nominal frequency in Hz
    pub fn hz(&self) -> u32 {
        match self {
            SampleRate::Hz30 => 30,
            SampleRate::Hz40 => 40,
            SampleRate::Hz50 => 50,
            SampleRate::Hz60 => 60,
            SampleRate::Hz70 => 70,
            SampleRate::Hz80 => 80,
            SampleRate::Hz90 => 90,
            SampleRate::Hz100 => 100,
        }
    }

    /// Fixed conversion factors onto the 30 Hz timeline. The table is frozen;
    /// factors are never derived from the frequency value.
    pub fn plan(&self) -> ResamplePlan {
        let (up, down) = match self {
            SampleRate::Hz30 => (1, 1),
            SampleRate::Hz40 => (3, 4),
            SampleRate::Hz50 => (3, 5),
            SampleRate::Hz60 => (1, 2),
            SampleRate::Hz70 => (3, 7),
            SampleRate::Hz80 => (3, 8),
            SampleRate::Hz90 => (1, 3),
            SampleRate::Hz100 => (3, 10),
        };
        ResamplePlan { up, down }
    }

    /// Whether the interpolation low-pass stage runs. Frequencies that divide
    /// into 30 Hz without interpolation (30, 60, 90) skip it.
    pub fn needs_antialias(&self) -> bool {
        self.plan().up > 1
    }
}

impl TryFrom<u32> for SampleRate {
    type Error = CountsError;

    fn try_from(freq: u32) -> Result<Self, Self::Error> {
        match freq {
            30 => Ok(SampleRate::Hz30),
            40 => Ok(SampleRate::Hz40),
            50 => Ok(SampleRate::Hz50),
            60 => Ok(SampleRate::Hz60),
            70 => Ok(SampleRate::Hz70),
            80 => Ok(SampleRate::Hz80),
            90 => Ok(SampleRate::Hz90),
            100 => Ok(SampleRate::Hz100),
            other => Err(CountsError::UnsupportedFrequency(other)),
        }
    }
}

/// Which implementation of the conversion chain runs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Per-channel loops with shift-register filtering and warm-up initialization
    Reference,
    /// Vectorized channel matrix with steady-state filter initialization
    Fast,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Reference => "reference",
            Mode::Fast => "fast",
        }
    }
}

/// Raw tri-axial accelerometer samples in g units, one buffer per axis
#[derive(Clone, Debug, Default)]
pub struct RawSeries {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

impl RawSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples per axis
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn push(&mut self, x: f64, y: f64, z: f64) {
        self.x.push(x);
        self.y.push(y);
        self.z.push(z);
    }

    /// Build from per-axis buffers of equal length
    pub fn from_channels(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> CountsResult<Self> {
        if x.len() != y.len() || x.len() != z.len() {
            return Err(CountsError::ChannelMismatch {
                x: x.len(),
                y: y.len(),
                z: z.len(),
            });
        }
        Ok(Self { x, y, z })
    }

    /// Build from (x, y, z) triplets
    pub fn from_triplets(samples: &[[f64; 3]]) -> Self {
        let mut series = Self::new();
        for s in samples {
            series.push(s[0], s[1], s[2]);
        }
        series
    }

    /// Build from a flat x0,y0,z0,x1,y1,z1,... buffer
    pub fn from_interleaved(flat: &[f64]) -> CountsResult<Self> {
        if flat.len() % 3 != 0 {
            return Err(CountsError::ShapeMismatch(flat.len()));
        }
        let mut series = Self::new();
        for chunk in flat.chunks_exact(3) {
            series.push(chunk[0], chunk[1], chunk[2]);
        }
        Ok(series)
    }

    /// Copy the axes into a (3, n) matrix, one row per axis
    pub fn channel_matrix(&self) -> Array2<f64> {
        let n = self.len();
        let mut m = Array2::<f64>::zeros((3, n));
        for (i, &v) in self.x.iter().enumerate() {
            m[[0, i]] = v;
        }
        for (i, &v) in self.y.iter().enumerate() {
            m[[1, i]] = v;
        }
        for (i, &v) in self.z.iter().enumerate() {
            m[[2, i]] = v;
        }
        m
    }
}

/// Integer activity counts, one row per epoch, columns (X, Y, Z)
#[derive(Clone, Debug, PartialEq)]
pub struct EpochCounts {
    pub counts: Array2<i64>,
}

impl EpochCounts {
    /// Result with zero epochs
    pub fn empty() -> Self {
        Self {
            counts: Array2::zeros((0, 3)),
        }
    }

    pub fn from_matrix(counts: Array2<i64>) -> Self {
        Self { counts }
    }

    /// Assemble from per-axis count columns; the columns must have equal length
    pub fn from_axes(x: Vec<i64>, y: Vec<i64>, z: Vec<i64>) -> Self {
        let n = x.len();
        let mut counts = Array2::<i64>::zeros((n, 3));
        for i in 0..n {
            counts[[i, 0]] = x[i];
            counts[[i, 1]] = y[i];
            counts[[i, 2]] = z[i];
        }
        Self { counts }
    }

    pub fn num_epochs(&self) -> usize {
        self.counts.nrows()
    }

    /// Counts for one epoch as [x, y, z]
    pub fn row(&self, epoch: usize) -> [i64; 3] {
        [
            self.counts[[epoch, 0]],
            self.counts[[epoch, 1]],
            self.counts[[epoch, 2]],
        ]
    }

    /// Euclidean norm of one epoch's axis counts
    pub fn vector_magnitude(&self, epoch: usize) -> f64 {
        let [x, y, z] = self.row(epoch);
        ((x * x + y * y + z * z) as f64).sqrt()
    }

    /// Count totals over all epochs, per axis
    pub fn axis_totals(&self) -> [i64; 3] {
        let mut totals = [0i64; 3];
        for row in self.counts.rows() {
            totals[0] += row[0];
            totals[1] += row[1];
            totals[2] += row[2];
        }
        totals
    }
}
