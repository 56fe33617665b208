//! Error conversion implementations.
//!
//! This module contains From trait implementations to convert from standard
//! library error types to the unified Error type.

use super::types::Error;

impl From<std::num::TryFromIntError> for Error {
    fn from(err: std::num::TryFromIntError) -> Self {
        Error::InvalidFormat(format!("integer out of range: {}", err))
    }
}
