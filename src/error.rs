//! Error types.
use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while sampling, running jobs or aggregating their results.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed bounds, a non-positive sample budget or another invalid parameter. Raised before
    /// any sampling takes place.
    #[error("configuration error: {message}")]
    Configuration {
        /// What is wrong with the configuration.
        message: String,
    },

    /// The integrand failed, or returned a non-finite value, at a sample point.
    #[error("evaluation error: {message}")]
    Evaluation {
        /// Description of the failure.
        message: String,
    },

    /// There is no successful partial result to aggregate.
    #[error("aggregation input error: {message}")]
    AggregationInput {
        /// Description of the missing input.
        message: String,
    },

    /// A participant of a reduction hung up or panicked before delivering its partial result.
    #[error("reduction error: {message}")]
    Reduction {
        /// Description of the failure.
        message: String,
    },

    /// Reading or writing an artifact failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An artifact could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Creates a [`Error::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a [`Error::Evaluation`].
    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation {
            message: message.into(),
        }
    }

    /// Creates a [`Error::AggregationInput`].
    pub fn aggregation_input(message: impl Into<String>) -> Self {
        Self::AggregationInput {
            message: message.into(),
        }
    }

    /// Creates a [`Error::Reduction`].
    pub fn reduction(message: impl Into<String>) -> Self {
        Self::Reduction {
            message: message.into(),
        }
    }
}
