//! Response serialization helpers for the dispatch loop.
//!
//! This module provides the `ResultEnvelope` type and the `ResponseWriter`
//! helper that frames envelopes as JSONL lines. The envelope vocabulary
//! matches what the Bento runner decodes: `sentences`, `text`, `set`, `error`
//! or an empty object.

use std::collections::BTreeMap;
use std::io::Write;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::steps::StepOutcome;

use super::errors::DispatchError;

/// Normalised result of one request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResultEnvelope {
    /// The step ran for its side effect only: `{}`.
    #[default]
    Empty,
    /// Registered templates in registration order.
    Sentences(Vec<String>),
    /// Human-readable outcome.
    Text(String),
    /// Values for the runner to bind into its own variables.
    Set(BTreeMap<String, String>),
    /// Description of a failure confined to this request.
    Error(String),
}

impl ResultEnvelope {
    /// Creates an error envelope.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    /// Returns `true` for error envelopes.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl From<StepOutcome> for ResultEnvelope {
    fn from(outcome: StepOutcome) -> Self {
        match outcome {
            StepOutcome::Nothing => Self::Empty,
            StepOutcome::Text(text) => Self::Text(text),
            StepOutcome::Set(values) => Self::Set(values),
        }
    }
}

impl From<&DispatchError> for ResultEnvelope {
    fn from(error: &DispatchError) -> Self {
        Self::Error(error.to_string())
    }
}

impl Serialize for ResultEnvelope {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let entries = usize::from(!matches!(self, Self::Empty));
        let mut map = serializer.serialize_map(Some(entries))?;
        match self {
            Self::Empty => {}
            Self::Sentences(sentences) => map.serialize_entry("sentences", sentences)?,
            Self::Text(text) => map.serialize_entry("text", text)?,
            Self::Set(values) => map.serialize_entry("set", values)?,
            Self::Error(message) => map.serialize_entry("error", message)?,
        }
        map.end()
    }
}

/// Writer that frames result envelopes onto a stream.
///
/// Each envelope is serialized in full before a single `write_all`, so a
/// response is never interleaved with a partially written predecessor.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Creates a new response writer wrapping the given output stream.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes an envelope as a JSONL line and flushes the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, writing or flushing fails.
    pub fn write_envelope(&mut self, envelope: &ResultEnvelope) -> Result<(), DispatchError> {
        let mut line = serde_json::to_vec(envelope).map_err(DispatchError::SerializeResponse)?;
        line.push(b'\n');
        self.writer.write_all(&line)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Writes an error envelope describing `error`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_error(&mut self, error: &DispatchError) -> Result<(), DispatchError> {
        self.write_envelope(&ResultEnvelope::from(error))
    }
}
