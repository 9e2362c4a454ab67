//! Ordered table of sentence patterns and the steps they dispatch to.
//!
//! The registry is built once at startup through [`RegistryBuilder`] and is
//! read-only afterwards. Each binding pairs a [`Pattern`] with a handler
//! identifier; the identifier is an opaque `Copy` value (usually an enum)
//! that the step table later uses to decide which handler body to run.
//!
//! Matching is positional: a sentence matches a pattern when it has the same
//! number of whitespace-delimited words, every literal word is identical and
//! each `?` slot binds exactly one word. When several patterns could match the
//! same sentence, the first one registered wins, and the builder logs a
//! warning because such a table is almost certainly a mistake.

mod errors;
mod pattern;

use std::fmt;

use tracing::{debug, warn};

pub use self::errors::RegistryError;
pub use self::pattern::{Pattern, PatternToken, WILDCARD};

/// Tracing target for registry operations.
pub(crate) const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

#[derive(Debug, Clone)]
struct Binding<H> {
    pattern: Pattern,
    handler: H,
}

/// Immutable mapping from sentence patterns to handler identifiers.
#[derive(Debug, Clone)]
pub struct PatternRegistry<H> {
    bindings: Vec<Binding<H>>,
}

/// Successful lookup result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepMatch<'r, H> {
    /// Identifier of the handler bound to the matching pattern.
    pub handler: H,
    /// The matching pattern.
    pub pattern: &'r Pattern,
    /// Words bound to each wildcard, left to right.
    pub captures: Vec<String>,
}

impl<H> StepMatch<'_, H> {
    /// Template text of the matching pattern.
    #[must_use]
    pub fn template(&self) -> &str {
        self.pattern.template()
    }
}

impl<H> PatternRegistry<H>
where
    H: Copy + fmt::Debug,
{
    /// Starts building a registry.
    #[must_use]
    pub fn builder() -> RegistryBuilder<H> {
        RegistryBuilder::new()
    }

    /// Resolves a sentence to the first pattern that matches it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when no pattern matches.
    pub fn lookup(&self, sentence: &str) -> Result<StepMatch<'_, H>, RegistryError> {
        self.bindings
            .iter()
            .find_map(|binding| {
                binding.pattern.captures(sentence).map(|captures| StepMatch {
                    handler: binding.handler,
                    pattern: &binding.pattern,
                    captures,
                })
            })
            .ok_or_else(|| RegistryError::not_found(sentence))
    }

    /// Iterates over registered templates in registration order.
    pub fn templates(&self) -> impl Iterator<Item = &str> {
        self.bindings
            .iter()
            .map(|binding| binding.pattern.template())
    }

    /// Collects registered templates in registration order.
    #[must_use]
    pub fn list_templates(&self) -> Vec<String> {
        self.templates().map(str::to_owned).collect()
    }

    /// Number of registered patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` when no patterns are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Accumulates bindings before freezing them into a [`PatternRegistry`].
#[derive(Debug)]
pub struct RegistryBuilder<H> {
    bindings: Vec<Binding<H>>,
}

impl<H> Default for RegistryBuilder<H> {
    fn default() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }
}

impl<H> RegistryBuilder<H>
where
    H: Copy + fmt::Debug,
{
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a template to a handler identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyPattern`] for blank templates and
    /// [`RegistryError::Duplicate`] when the template's skeleton is already
    /// registered.
    pub fn register(
        mut self,
        template: impl Into<String>,
        handler: H,
    ) -> Result<Self, RegistryError> {
        let pattern = Pattern::parse(template)?;
        if let Some(existing) = self
            .bindings
            .iter()
            .find(|binding| binding.pattern == pattern)
        {
            return Err(RegistryError::Duplicate {
                template: pattern.template().to_owned(),
                existing: existing.pattern.template().to_owned(),
            });
        }
        debug!(
            target: REGISTRY_TARGET,
            template = pattern.template(),
            handler = ?handler,
            "registered pattern"
        );
        self.bindings.push(Binding { pattern, handler });
        Ok(self)
    }

    /// Freezes the table.
    #[must_use]
    pub fn build(self) -> PatternRegistry<H> {
        for (index, earlier) in self.bindings.iter().enumerate() {
            for later in self.bindings.iter().skip(index + 1) {
                if earlier.pattern.overlaps(&later.pattern) {
                    warn!(
                        target: REGISTRY_TARGET,
                        first = earlier.pattern.template(),
                        shadowed = later.pattern.template(),
                        "patterns overlap; the first registered wins"
                    );
                }
            }
        }
        PatternRegistry {
            bindings: self.bindings,
        }
    }
}
