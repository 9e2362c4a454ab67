//! Failures raised by step handlers.

use thiserror::Error;

/// Errors a step handler may report for a single invocation.
///
/// Handler failures never end the session: the dispatcher turns them into an
/// `error` envelope and keeps serving.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    /// The request supplied fewer arguments than the step reads.
    #[error("step '{step}' expects an argument at position {index}")]
    MissingArgument { step: &'static str, index: usize },

    /// An argument could not be read as a number.
    #[error("'{value}' is not a number")]
    InvalidNumber { value: String },

    /// An aggregate was requested before any value was recorded.
    #[error("no values have been recorded")]
    NoSamples,
}

impl StepError {
    /// Creates a missing argument error.
    pub fn missing_argument(step: &'static str, index: usize) -> Self {
        Self::MissingArgument { step, index }
    }

    /// Creates an invalid number error.
    pub fn invalid_number(value: impl Into<String>) -> Self {
        Self::InvalidNumber {
            value: value.into(),
        }
    }
}
