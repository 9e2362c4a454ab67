//! Backend bootstrap orchestration.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;

use bento_config::{Config, ConfigError};

use crate::health::HealthReporter;
use crate::registry::{PatternRegistry, RegistryError};
use crate::server::Backend;
use crate::steps::StepHandlers;
use crate::telemetry::{self, TelemetryError};
use crate::transport::{ListenerError, SocketListener};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the backend configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration is missing or invalid.
    fn load(&self) -> Result<Config, ConfigError>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Config::load()
    }
}

/// Loader that returns a configuration resolved ahead of time.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already loaded configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: ConfigError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The step table registered an invalid pattern.
    #[error("failed to build pattern registry: {source}")]
    Registry {
        /// Underlying registry error.
        #[source]
        source: RegistryError,
    },
    /// The listener could not be bound.
    #[error("failed to bind listener: {source}")]
    Listener {
        /// Underlying listener error.
        #[source]
        source: ListenerError,
    },
}

/// Bootstraps the backend using the supplied collaborators.
///
/// Loads configuration, installs telemetry, builds the registry for `H` and
/// binds the listener. The returned [`Backend`] has not accepted a
/// connection yet.
///
/// # Errors
///
/// Returns [`BootstrapError`] for the first stage that fails; the reporter
/// is told about it before returning.
pub fn bootstrap_with<H>(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Backend<H::Step>, BootstrapError>
where
    H: StepHandlers,
{
    reporter.bootstrap_starting();
    match bootstrap_stages::<H>(loader) {
        Ok(stages) => {
            reporter.bootstrap_succeeded(&stages.config, stages.local_addr);
            Ok(Backend::new(
                stages.config,
                stages.registry,
                stages.listener,
                stages.local_addr,
                reporter,
            ))
        }
        Err(error) => {
            reporter.bootstrap_failed(&error);
            Err(error)
        }
    }
}

struct Stages<S> {
    config: Config,
    registry: PatternRegistry<S>,
    listener: SocketListener,
    local_addr: SocketAddr,
}

fn bootstrap_stages<H>(loader: &dyn ConfigLoader) -> Result<Stages<H::Step>, BootstrapError>
where
    H: StepHandlers,
{
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;

    telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;

    let registry = H::registry().map_err(|source| BootstrapError::Registry { source })?;

    let listener = SocketListener::bind(&config.endpoint())
        .map_err(|source| BootstrapError::Listener { source })?;
    let local_addr = listener
        .local_addr()
        .map_err(|source| BootstrapError::Listener { source })?;

    Ok(Stages {
        config,
        registry,
        listener,
        local_addr,
    })
}
