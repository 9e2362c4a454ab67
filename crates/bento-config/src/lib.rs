//! Configuration for the Bento sentence backend.
//!
//! The test runner starts a backend process and tells it which port to bind
//! through the `BENTO_PORT` environment variable. Every other setting has a
//! default, and each one can be supplied either as a command-line flag or as
//! a `BENTO_*` environment variable. Flags win over the environment.

mod defaults;
mod endpoint;
mod logging;

use std::ffi::OsString;

use clap::Parser;
use thiserror::Error;

pub use defaults::{
    DEFAULT_HOST, DEFAULT_LOG_FILTER, HOST_ENV_VAR, LOG_FILTER_ENV_VAR, LOG_FORMAT_ENV_VAR,
    PORT_ENV_VAR, default_host, default_log_filter, default_log_format,
};
pub use endpoint::TcpEndpoint;
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved backend configuration.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "bento-backend",
    version,
    about = "Serves Bento sentence steps over a single TCP connection"
)]
pub struct Config {
    /// TCP port to listen on.
    #[arg(long, env = PORT_ENV_VAR)]
    pub port: u16,

    /// Address to bind.
    #[arg(long, env = HOST_ENV_VAR, default_value_t = default_host().to_owned())]
    pub host: String,

    /// `tracing` filter expression, for example `info` or `bento_backend=debug`.
    #[arg(long, env = LOG_FILTER_ENV_VAR, default_value_t = default_log_filter().to_owned())]
    pub log_filter: String,

    /// Log output format: `json` or `compact`.
    #[arg(long, env = LOG_FORMAT_ENV_VAR, default_value_t = default_log_format())]
    pub log_format: LogFormat,
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the port is missing or any value fails to
    /// parse. Help and version requests also surface as errors; see
    /// [`ConfigError::is_informational`].
    pub fn load() -> Result<Self, ConfigError> {
        Self::try_parse().map_err(ConfigError::from)
    }

    /// Loads configuration from an explicit argument list and the environment.
    ///
    /// The first item is treated as the program name.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(ConfigError::from)
    }

    /// Endpoint the listener binds.
    #[must_use]
    pub fn endpoint(&self) -> TcpEndpoint {
        TcpEndpoint::new(self.host.clone(), self.port)
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Command line or environment values were missing or invalid.
    #[error("{0}")]
    Arguments(#[from] clap::Error),
}

impl ConfigError {
    /// Returns `true` for `--help` and `--version` requests, which are not
    /// failures even though parsing stops.
    #[must_use]
    pub fn is_informational(&self) -> bool {
        let Self::Arguments(error) = self;
        matches!(
            error.kind(),
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
        )
    }

    /// Prints the message the way clap would, to stdout for informational
    /// output and stderr otherwise.
    ///
    /// # Errors
    ///
    /// Returns an IO error when the terminal cannot be written.
    pub fn print(&self) -> std::io::Result<()> {
        let Self::Arguments(error) = self;
        error.print()
    }
}
