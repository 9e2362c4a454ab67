//! Step handler tables.
//!
//! A step table is a type that owns whatever mutable state its handlers
//! share and knows which sentence patterns it answers. The session holds the
//! table exclusively and passes it by `&mut` into every invocation, so
//! handlers never need locks or shared globals.

mod errors;
mod scores;

use std::collections::BTreeMap;
use std::fmt;

use crate::registry::{PatternRegistry, RegistryBuilder, RegistryError};

pub use self::errors::StepError;
pub use self::scores::{AVERAGE_TARGET_SLOT, RunningTotal, ScoreStep};

/// What a handler produced for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StepOutcome {
    /// The step ran for its side effect only.
    #[default]
    Nothing,
    /// Human-readable text for the runner to display.
    Text(String),
    /// Values the runner should bind into its own variables.
    Set(BTreeMap<String, String>),
}

impl StepOutcome {
    /// Creates a text outcome.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Creates a set outcome binding a single name.
    pub fn set(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Set(BTreeMap::from([(name.into(), value.into())]))
    }
}

/// A table of step handlers and the state they share.
pub trait StepHandlers {
    /// Identifier bound to each pattern in the registry.
    type Step: Copy + fmt::Debug;

    /// Adds this table's patterns to the builder, in the order they should be
    /// listed to the runner.
    ///
    /// # Errors
    ///
    /// Propagates registration failures such as duplicate patterns.
    fn register(
        builder: RegistryBuilder<Self::Step>,
    ) -> Result<RegistryBuilder<Self::Step>, RegistryError>;

    /// Runs the handler identified by `step` with the request's arguments.
    ///
    /// # Errors
    ///
    /// Returns a [`StepError`] when the arguments are unusable or the state
    /// does not permit the operation.
    fn invoke(&mut self, step: Self::Step, args: &[String]) -> Result<StepOutcome, StepError>;

    /// Builds the registry for this table.
    ///
    /// # Errors
    ///
    /// Propagates registration failures.
    fn registry() -> Result<PatternRegistry<Self::Step>, RegistryError>
    where
        Self: Sized,
    {
        Self::register(PatternRegistry::builder()).map(RegistryBuilder::build)
    }
}
