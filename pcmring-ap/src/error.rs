//! Error types for pcmring-ap
//!
//! Defines module-specific error types using thiserror for clear error propagation.
//! Buffer full and buffer empty are not errors: transfers report `Ok(0)`.

use thiserror::Error;

/// Main error type for pcmring-ap
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid construction or call parameter
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Caller-supplied window lies outside the provided slice
    #[error("Index out of range: offset {offset} + length {length} exceeds slice length {len}")]
    IndexOutOfRange {
        offset: usize,
        length: usize,
        len: usize,
    },

    /// Plane index outside the buffer
    #[error("Plane out of range: plane {plane} of {planes}")]
    PlaneOutOfRange { plane: usize, planes: usize },

    /// Rate converter construction or processing errors
    #[error("Resample error: {0}")]
    Resample(String),

    /// Sample format or WAV spec that cannot be handled
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// WAV reading or writing errors
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

/// Convenience Result type using pcmring-ap Error
pub type Result<T> = std::result::Result<T, Error>;
