//! Errors raised while building or querying the pattern registry.

use thiserror::Error;

/// Errors surfaced by [`super::PatternRegistry`] and its builder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Template contained no tokens.
    #[error("pattern template is empty")]
    EmptyPattern,

    /// Template has the same literal skeleton as one already registered.
    #[error("pattern '{template}' duplicates registered pattern '{existing}'")]
    Duplicate { template: String, existing: String },

    /// No registered pattern matches the sentence.
    #[error("no step matches sentence '{sentence}'")]
    NotFound { sentence: String },
}

impl RegistryError {
    /// Creates a not-found error for the given sentence.
    pub fn not_found(sentence: impl Into<String>) -> Self {
        Self::NotFound {
            sentence: sentence.into(),
        }
    }
}
