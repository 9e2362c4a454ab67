//! Sentence backend for the Bento test runner.
//!
//! The runner drives tests written as plain sentences such as
//! `add 5 to total`. It starts this process, connects to it over TCP and
//! asks which sentence templates it understands. Each later request names a
//! template and carries the runner's arguments; the backend looks the
//! template up in its [`registry`], invokes the bound step handler and sends
//! back one result envelope.
//!
//! Startup goes through [`bootstrap_with`]: configuration is loaded,
//! structured telemetry is installed, the registry is built and the listener
//! is bound. Health reporting hooks emit structured events at each stage. The
//! resulting [`Backend`] then serves exactly one runner connection.

pub mod bootstrap;
pub mod dispatch;
mod health;
pub mod registry;
mod server;
pub mod steps;
mod telemetry;
pub mod transport;

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use bento_config::Config;

pub use bootstrap::{
    BootstrapError, ConfigLoader, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use server::{Backend, ServeError, ServerState};
pub use steps::{RunningTotal, StepHandlers, StepOutcome};
pub use telemetry::{TelemetryError, TelemetryHandle};

/// Runs the backend with the score steps and returns the process exit code.
///
/// `args` includes the program name. Failures are described on `stderr`;
/// `--help` and `--version` print clap's output and succeed.
pub fn run<I, T, W>(args: I, stderr: &mut W) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    W: Write,
{
    let config = match Config::load_from_iter(args) {
        Ok(config) => config,
        Err(error) if error.is_informational() => {
            if let Err(print_error) = error.print() {
                report(stderr, &print_error);
                return ExitCode::FAILURE;
            }
            return ExitCode::SUCCESS;
        }
        Err(error) => {
            report(stderr, &error);
            return ExitCode::FAILURE;
        }
    };

    let reporter: Arc<dyn HealthReporter> = Arc::new(StructuredHealthReporter::new());
    let loader = StaticConfigLoader::new(config);
    let backend = match bootstrap_with::<RunningTotal>(&loader, reporter) {
        Ok(backend) => backend,
        Err(error) => {
            report(stderr, &error);
            return ExitCode::FAILURE;
        }
    };

    match backend.serve(RunningTotal::default()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            report(stderr, &error);
            ExitCode::FAILURE
        }
    }
}

fn report<W: Write>(stderr: &mut W, error: &dyn std::fmt::Display) {
    // Nothing else can be done if stderr itself is gone.
    let _ = writeln!(stderr, "bento-backend: {error}");
}

#[cfg(test)]
mod tests;
