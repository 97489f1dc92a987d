use thiserror::Error;

/// Activity count conversion error types
#[derive(Error, Debug)]
pub enum CountsError {
    #[error("Unsupported sampling frequency: {0} Hz (supported: 30-100 Hz in steps of 10)")]
    UnsupportedFrequency(u32),

    #[error("Channel lengths differ: x={x}, y={y}, z={z}")]
    ChannelMismatch { x: usize, y: usize, z: usize },

    #[error("Interleaved sample buffer length {0} is not a multiple of 3")]
    ShapeMismatch(usize),

    #[error("Epoch length must be at least 1 second")]
    InvalidEpochLength,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Table parse error at line {line}: {message}")]
    Table { line: usize, message: String },

    #[error("Timestamp parse error: {0}")]
    Timestamp(String),
}

/// Result type for count conversion operations
pub type CountsResult<T> = Result<T, CountsError>;
