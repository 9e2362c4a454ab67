//! Request deserialization for the dispatch loop.
//!
//! This module parses JSONL request lines into typed `StepRequest` values.
//! The schema mirrors what the Bento runner sends: either an introspection
//! request (`{"special":"sentences"}`) or a step invocation naming the
//! sentence and its arguments.

use serde::Deserialize;

use super::errors::DispatchError;

/// Value of `special` that asks for the registered sentence templates.
pub const SENTENCES_SPECIAL: &str = "sentences";

/// Parsed request from the runner.
#[derive(Debug, Default, Deserialize)]
pub struct StepRequest {
    /// Out-of-band request name; takes precedence over `sentence`.
    #[serde(default)]
    pub special: Option<String>,
    /// Sentence to resolve against the registry.
    #[serde(default)]
    pub sentence: Option<String>,
    /// Arguments forwarded to the handler. The runner may send `null`.
    #[serde(default)]
    pub args: Option<Vec<String>>,
}

/// What a request asks the backend to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind<'a> {
    /// List every registered template.
    Sentences,
    /// Run the step matching `sentence` with `args`.
    Step {
        /// Sentence to resolve.
        sentence: &'a str,
        /// Arguments for the handler.
        args: &'a [String],
    },
}

impl StepRequest {
    /// Parses a JSONL line into a request.
    ///
    /// Trailing whitespace (including the newline delimiter) is trimmed before
    /// parsing.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::MalformedJsonl` if the line is empty or cannot
    /// be parsed as a JSON object matching the request schema.
    pub fn parse(line: &[u8]) -> Result<Self, DispatchError> {
        let trimmed = trim_trailing_whitespace(line);
        if trimmed.is_empty() {
            return Err(DispatchError::malformed("empty request line"));
        }

        serde_json::from_slice(trimmed).map_err(DispatchError::from_json_error)
    }

    /// Arguments supplied with the request, empty when absent.
    #[must_use]
    pub fn args(&self) -> &[String] {
        self.args.as_deref().unwrap_or_default()
    }

    /// Classifies the request.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::UnknownSpecial` for unsupported `special`
    /// values and `DispatchError::MissingSentence` when neither field is set.
    pub fn kind(&self) -> Result<RequestKind<'_>, DispatchError> {
        match (self.special.as_deref(), self.sentence.as_deref()) {
            (Some(SENTENCES_SPECIAL), _) => Ok(RequestKind::Sentences),
            (Some(other), _) => Err(DispatchError::unknown_special(other)),
            (None, Some(sentence)) => Ok(RequestKind::Step {
                sentence,
                args: self.args(),
            }),
            (None, None) => Err(DispatchError::MissingSentence),
        }
    }
}

/// Returns `true` when a frame holds nothing but whitespace.
pub(crate) fn is_blank(bytes: &[u8]) -> bool {
    trim_trailing_whitespace(bytes).is_empty()
}

/// Trims trailing ASCII whitespace from a byte slice.
fn trim_trailing_whitespace(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |pos| pos + 1);
    &bytes[..end]
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn parses_sentences_special() {
        let request = StepRequest::parse(br#"{"special":"sentences"}"#).expect("parse special");
        assert_eq!(request.kind().expect("kind"), RequestKind::Sentences);
    }

    #[rstest]
    fn parses_step_invocation() {
        let request = StepRequest::parse(br#"{"sentence":"add ? to ?","args":["5","total"]}"#)
            .expect("parse step");
        let args = vec!["5".to_owned(), "total".to_owned()];
        assert_eq!(
            request.kind().expect("kind"),
            RequestKind::Step {
                sentence: "add ? to ?",
                args: &args,
            }
        );
    }

    #[rstest]
    #[case::missing(br#"{"sentence":"display ?"}"#.as_slice())]
    #[case::null(br#"{"sentence":"display ?","args":null}"#.as_slice())]
    fn absent_arguments_are_empty(#[case] input: &[u8]) {
        let request = StepRequest::parse(input).expect("parse");
        assert!(request.args().is_empty());
    }

    #[rstest]
    fn special_takes_precedence_over_sentence() {
        let request = StepRequest::parse(br#"{"special":"sentences","sentence":"display ?"}"#)
            .expect("parse");
        assert_eq!(request.kind().expect("kind"), RequestKind::Sentences);
    }

    #[rstest]
    fn trims_trailing_whitespace() {
        let request =
            StepRequest::parse(b"{\"sentence\":\"display ?\"}  \r\n").expect("parse with crlf");
        assert_eq!(request.sentence.as_deref(), Some("display ?"));
    }

    #[rstest]
    #[case::empty(b"".as_slice())]
    #[case::whitespace(b"   \n".as_slice())]
    #[case::not_json(b"not json".as_slice())]
    #[case::not_object(b"[1,2]".as_slice())]
    #[case::wrong_arg_type(br#"{"sentence":"add ? to ?","args":[5]}"#.as_slice())]
    fn rejects_malformed_lines(#[case] input: &[u8]) {
        let result = StepRequest::parse(input);
        assert!(matches!(result, Err(DispatchError::MalformedJsonl { .. })));
    }

    #[rstest]
    fn rejects_unknown_special() {
        let request = StepRequest::parse(br#"{"special":"steps"}"#).expect("parse");
        assert!(matches!(
            request.kind(),
            Err(DispatchError::UnknownSpecial { .. })
        ));
    }

    #[rstest]
    fn rejects_requests_without_sentence() {
        let request = StepRequest::parse(br#"{"args":["1"]}"#).expect("parse");
        assert!(matches!(request.kind(), Err(DispatchError::MissingSentence)));
    }
}
