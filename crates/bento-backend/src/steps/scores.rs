//! Reference step table that keeps a running total of scores.
//!
//! Numbers are reported with at most 14 significant digits, so `10 / 3`
//! reads `3.3333333333333` and `0.1 + 0.2` reads `0.3`. Magnitudes of
//! `1e14` and above, or below `1e-4`, use exponent notation such as
//! `1.0E+20`.

use crate::registry::{RegistryBuilder, RegistryError};

use super::{StepError, StepHandlers, StepOutcome};

/// Significant digits used when a number is reported to the runner.
const SIGNIFICANT_DIGITS: usize = 14;

/// Variable slot the average is bound into: the second wildcard of
/// `average of ? into ?`.
pub const AVERAGE_TARGET_SLOT: &str = "$1";

/// Steps understood by [`RunningTotal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreStep {
    /// `add ? to ?`: records a score.
    Add,
    /// `average of ? into ?`: binds the mean of recorded scores.
    Average,
    /// `display ?`: reports the total.
    Display,
}

impl ScoreStep {
    /// Templates in the order they are listed to the runner.
    pub const PATTERNS: [(&'static str, Self); 3] = [
        ("add ? to ?", Self::Add),
        ("average of ? into ?", Self::Average),
        ("display ?", Self::Display),
    ];

    const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Average => "average",
            Self::Display => "display",
        }
    }
}

/// Running total and sample count shared by the score steps.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunningTotal {
    total: f64,
    count: u32,
}

impl RunningTotal {
    /// Sum of recorded scores.
    #[must_use]
    pub const fn total(&self) -> f64 {
        self.total
    }

    /// Number of recorded scores.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    fn add(&mut self, args: &[String]) -> Result<StepOutcome, StepError> {
        let raw = argument(ScoreStep::Add, args, 0)?;
        let value = raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| StepError::invalid_number(raw))?;
        self.total += value;
        self.count += 1;
        Ok(StepOutcome::Nothing)
    }

    fn average(&self) -> Result<StepOutcome, StepError> {
        if self.count == 0 {
            return Err(StepError::NoSamples);
        }
        let mean = self.total / f64::from(self.count);
        Ok(StepOutcome::set(AVERAGE_TARGET_SLOT, format_number(mean)))
    }

    fn display(&self) -> StepOutcome {
        StepOutcome::text(format!("The total is {}.", format_number(self.total)))
    }
}

fn argument(step: ScoreStep, args: &[String], index: usize) -> Result<&str, StepError> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| StepError::missing_argument(step.name(), index))
}

/// Renders `value` with [`SIGNIFICANT_DIGITS`] significant digits and no
/// trailing zeros.
fn format_number(value: f64) -> String {
    scientific_exponent(value)
        .map_or_else(|| value.to_string(), |exponent| render(value, exponent))
}

/// Decimal exponent of `value` after rounding to the reported precision.
fn scientific_exponent(value: f64) -> Option<i32> {
    if !value.is_finite() {
        return None;
    }
    let scientific = format!("{value:.precision$e}", precision = SIGNIFICANT_DIGITS - 1);
    let (_, exponent) = scientific.split_once('e')?;
    exponent.parse().ok()
}

fn render(value: f64, exponent: i32) -> String {
    let digits = i32::try_from(SIGNIFICANT_DIGITS).unwrap_or(i32::MAX);
    if exponent < -4 || exponent >= digits {
        let scientific = format!("{value:.precision$e}", precision = SIGNIFICANT_DIGITS - 1);
        let (mantissa, _) = scientific.split_once('e').unwrap_or((scientific.as_str(), ""));
        let mantissa = trim_fraction(mantissa);
        let mantissa = if mantissa.contains('.') {
            mantissa.to_owned()
        } else {
            format!("{mantissa}.0")
        };
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}E{sign}{}", exponent.unsigned_abs());
    }
    let decimals = usize::try_from(digits - 1 - exponent).unwrap_or_default();
    trim_fraction(&format!("{value:.decimals$}")).to_owned()
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

impl StepHandlers for RunningTotal {
    type Step = ScoreStep;

    fn register(
        builder: RegistryBuilder<ScoreStep>,
    ) -> Result<RegistryBuilder<ScoreStep>, RegistryError> {
        ScoreStep::PATTERNS
            .into_iter()
            .try_fold(builder, |builder, (template, step)| {
                builder.register(template, step)
            })
    }

    fn invoke(&mut self, step: ScoreStep, args: &[String]) -> Result<StepOutcome, StepError> {
        match step {
            ScoreStep::Add => self.add(args),
            ScoreStep::Average => self.average(),
            ScoreStep::Display => Ok(self.display()),
        }
    }
}
