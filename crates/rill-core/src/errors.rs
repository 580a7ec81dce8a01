//! Unified error type for sequence construction and consumption.
//!
//! Every failure a consumer can observe is a [`SequenceError`]. Errors are
//! terminal: once one is delivered through a [`Signal::Error`] the sequence
//! emits nothing further.
//!
//! [`Signal::Error`]: crate::Signal::Error

use serde::{Deserialize, Serialize};

use crate::effects::TimeError;

/// Error surfaced by a sequence, an operator, or the engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum SequenceError {
    /// Bad operator parameters (negative count, zero period, zero buffer size)
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected argument
        message: String,
    },

    /// Failure raised by a source, a mapping function, a worker, or the clock
    #[error("Upstream failure: {message}")]
    UpstreamFailure {
        /// Description of the upstream failure
        message: String,
    },

    /// A payload could not be interpreted as the expected shape
    #[error("Decode failure: {message}")]
    DecodeFailure {
        /// Description of the decoding problem
        message: String,
    },

    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },
}

impl SequenceError {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an upstream failure
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamFailure {
            message: message.into(),
        }
    }

    /// Create a decode failure
    pub fn decode(message: impl Into<String>) -> Self {
        Self::DecodeFailure {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Standard Result type for rill operations
pub type Result<T> = std::result::Result<T, SequenceError>;

impl From<TimeError> for SequenceError {
    fn from(err: TimeError) -> Self {
        Self::upstream(err.to_string())
    }
}

impl From<std::num::ParseIntError> for SequenceError {
    fn from(err: std::num::ParseIntError) -> Self {
        Self::decode(err.to_string())
    }
}
