//! Sentence templates and positional token matching.

use std::fmt;

use super::errors::RegistryError;

/// Token marking a wildcard slot inside a template.
pub const WILDCARD: &str = "?";

/// A single whitespace-delimited token of a template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternToken {
    /// Word that must appear verbatim at this position.
    Literal(String),
    /// Slot that accepts any single word.
    Wildcard,
}

impl PatternToken {
    fn parse(token: &str) -> Self {
        if token == WILDCARD {
            Self::Wildcard
        } else {
            Self::Literal(token.to_owned())
        }
    }

    /// Returns `true` when both tokens accept at least one common word.
    fn overlaps(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(left), Self::Literal(right)) => left == right,
            _ => true,
        }
    }
}

/// A parsed sentence template such as `add ? to ?`.
///
/// The original template text is retained verbatim so introspection returns
/// exactly what was registered. Two patterns are equal when their token
/// skeletons are equal, which ignores differences in surrounding whitespace.
#[derive(Debug, Clone)]
pub struct Pattern {
    template: String,
    tokens: Vec<PatternToken>,
}

impl Pattern {
    /// Parses a template into tokens.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyPattern`] when the template contains no
    /// tokens.
    pub fn parse(template: impl Into<String>) -> Result<Self, RegistryError> {
        let template = template.into();
        let tokens: Vec<PatternToken> = template
            .split_whitespace()
            .map(PatternToken::parse)
            .collect();
        if tokens.is_empty() {
            return Err(RegistryError::EmptyPattern);
        }
        Ok(Self { template, tokens })
    }

    /// Template text as registered.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Parsed tokens in order.
    #[must_use]
    pub fn tokens(&self) -> &[PatternToken] {
        &self.tokens
    }

    /// Number of wildcard slots.
    #[must_use]
    pub fn wildcard_count(&self) -> usize {
        self.tokens
            .iter()
            .filter(|token| matches!(token, PatternToken::Wildcard))
            .count()
    }

    /// Matches a sentence and returns the words bound to each wildcard.
    ///
    /// The sentence must have exactly as many words as the template. Literal
    /// positions compare byte for byte.
    #[must_use]
    pub fn captures(&self, sentence: &str) -> Option<Vec<String>> {
        let mut words = sentence.split_whitespace();
        let mut captures = Vec::with_capacity(self.wildcard_count());
        for token in &self.tokens {
            let word = words.next()?;
            match token {
                PatternToken::Literal(literal) if literal != word => return None,
                PatternToken::Literal(_) => {}
                PatternToken::Wildcard => captures.push(word.to_owned()),
            }
        }
        if words.next().is_some() {
            return None;
        }
        Some(captures)
    }

    /// Returns `true` when some sentence would match both patterns.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.tokens.len() == other.tokens.len()
            && self
                .tokens
                .iter()
                .zip(&other.tokens)
                .all(|(left, right)| left.overlaps(right))
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.tokens == other.tokens
    }
}

impl Eq for Pattern {}

impl fmt::Display for Pattern {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.template)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn pattern(template: &str) -> Pattern {
        Pattern::parse(template).expect("valid template")
    }

    #[rstest]
    fn parses_literals_and_wildcards() {
        let parsed = pattern("add ? to ?");
        assert_eq!(
            parsed.tokens(),
            &[
                PatternToken::Literal("add".into()),
                PatternToken::Wildcard,
                PatternToken::Literal("to".into()),
                PatternToken::Wildcard,
            ]
        );
        assert_eq!(parsed.wildcard_count(), 2);
    }

    #[rstest]
    #[case::empty("")]
    #[case::blank("   \t ")]
    fn rejects_empty_templates(#[case] template: &str) {
        assert_eq!(Pattern::parse(template), Err(RegistryError::EmptyPattern));
    }

    #[rstest]
    fn keeps_template_verbatim() {
        let parsed = pattern("display  ?");
        assert_eq!(parsed.template(), "display  ?");
        assert_eq!(parsed, pattern("display ?"));
    }

    #[rstest]
    #[case::placeholders("add ? to ?", &["?", "?"])]
    #[case::values("add 5 to total", &["5", "total"])]
    #[case::extra_spacing("  add   5 to\ttotal ", &["5", "total"])]
    fn captures_wildcard_words_in_order(#[case] sentence: &str, #[case] expected: &[&str]) {
        let captures = pattern("add ? to ?").captures(sentence).expect("sentence matches");
        assert_eq!(captures, expected);
    }

    #[rstest]
    #[case::too_few("add 5 to")]
    #[case::too_many("add 5 to total now")]
    #[case::literal_mismatch("add 5 into total")]
    #[case::case_sensitive("Add 5 to total")]
    #[case::empty("")]
    fn rejects_non_matching_sentences(#[case] sentence: &str) {
        assert_eq!(pattern("add ? to ?").captures(sentence), None);
    }

    #[rstest]
    fn literal_only_pattern_captures_nothing() {
        assert_eq!(pattern("reset").captures("reset"), Some(Vec::new()));
    }

    #[rstest]
    #[case::crossed_wildcards("add ? to x", "add y to ?", true)]
    #[case::different_literal("add ? to ?", "add ? into ?", false)]
    #[case::different_length("display ?", "display ? now", false)]
    fn detects_overlap(#[case] left: &str, #[case] right: &str, #[case] expected: bool) {
        assert_eq!(pattern(left).overlaps(&pattern(right)), expected);
    }
}
