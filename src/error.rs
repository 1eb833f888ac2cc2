//! # Error Types
//!
//! Every fallible operation in the library reports through [`LunarError`].
//! Astronomical computations on an already validated
//! [`EphemerisInstant`](crate::time_scale::EphemerisInstant) are total, so
//! errors only surface at the input boundary: malformed locations, non-finite
//! instants, timestamps that `chrono` cannot represent, or a broken config file.

use thiserror::Error;

/// Errors raised by lunar computations and their input validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LunarError {
    /// An argument is outside its valid range (location, precision, zone name...)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A numeric input or intermediate value is NaN or infinite
    #[error("non-finite value: {0}")]
    NonFinite(&'static str),

    /// The result cannot be expressed as a civil timestamp
    #[error("unrepresentable result: {0}")]
    Unrepresentable(String),

    /// Configuration file could not be parsed
    #[error("config error: {0}")]
    Config(String),
}

impl LunarError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Reject NaN and infinities with a labelled error.
pub(crate) fn ensure_finite(value: f64, what: &'static str) -> Result<f64, LunarError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(LunarError::NonFinite(what))
    }
}
