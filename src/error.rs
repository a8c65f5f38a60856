//! Error types shared by the hashers and the LSH index.

use thiserror::Error;

/// Errors returned by constructors and validating operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A constructor or option value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Two signatures, or a signature and an index, disagree on length.
    #[error("signature length mismatch: expected {expected}, got {got}")]
    LengthMismatch {
        /// Length required by the receiver.
        expected: usize,
        /// Length that was supplied.
        got: usize,
    },

    /// A call-time argument has the wrong shape.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A binary or hexadecimal fingerprint string could not be decoded.
    #[error("invalid fingerprint encoding: {0}")]
    InvalidEncoding(String),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn check_threshold(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::InvalidConfig(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}
