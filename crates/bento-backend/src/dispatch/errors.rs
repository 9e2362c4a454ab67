//! Error types for request dispatch failures.
//!
//! Framing problems (unreadable, oversized or malformed lines) and transport
//! failures end the session because the stream can no longer be trusted.
//! Everything else is scoped to a single request and is reported to the
//! runner as an `error` envelope.

use std::io;

use thiserror::Error;

use crate::registry::RegistryError;
use crate::steps::StepError;

/// Errors surfaced during request parsing and dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Request line could not be parsed as valid JSON.
    #[error("malformed JSONL: {message}")]
    MalformedJsonl {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Request exceeds the maximum allowed size.
    #[error("request too large: {size} bytes exceeds {max_size} byte limit")]
    RequestTooLarge { size: usize, max_size: usize },

    /// IO error during read or write.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Response serialization failed.
    #[error("failed to serialize response: {0}")]
    SerializeResponse(#[source] serde_json::Error),

    /// The `special` field named an unsupported request.
    #[error("unknown special request '{special}'")]
    UnknownSpecial { special: String },

    /// The request carried neither `special` nor `sentence`.
    #[error("request has neither a special nor a sentence field")]
    MissingSentence,

    /// Sentence resolution failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The step handler reported a failure.
    #[error("step failed: {0}")]
    Step(#[from] StepError),
}

impl DispatchError {
    /// Returns `true` when the session cannot continue after this error.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::MalformedJsonl { .. }
            | Self::RequestTooLarge { .. }
            | Self::Io(_)
            | Self::SerializeResponse(_) => true,
            Self::UnknownSpecial { .. }
            | Self::MissingSentence
            | Self::Registry(_)
            | Self::Step(_) => false,
        }
    }

    /// Creates a malformed JSONL error from a serde error.
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::MalformedJsonl {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a malformed JSONL error with a custom message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedJsonl {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a request too large error.
    pub fn request_too_large(size: usize, max_size: usize) -> Self {
        Self::RequestTooLarge { size, max_size }
    }

    /// Creates an unknown special error.
    pub fn unknown_special(special: impl Into<String>) -> Self {
        Self::UnknownSpecial {
            special: special.into(),
        }
    }
}
