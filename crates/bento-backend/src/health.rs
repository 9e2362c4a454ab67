//! Structured health reporting for backend lifecycle events.

use std::net::SocketAddr;
use std::sync::Arc;

use bento_config::Config;

use crate::bootstrap::BootstrapError;
use crate::server::{ServeError, ServerState};

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked once the listener is bound.
    fn bootstrap_succeeded(&self, config: &Config, local_addr: SocketAddr);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked on every server state transition.
    fn state_changed(&self, state: ServerState);

    /// Invoked when the runner connects.
    fn connection_accepted(&self, peer: SocketAddr);

    /// Invoked when the runner disconnects cleanly.
    fn session_closed(&self, served: usize);

    /// Invoked when serving stops on an error.
    fn session_failed(&self, error: &ServeError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config, local_addr: SocketAddr) {
        (**self).bootstrap_succeeded(config, local_addr);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn state_changed(&self, state: ServerState) {
        (**self).state_changed(state);
    }

    fn connection_accepted(&self, peer: SocketAddr) {
        (**self).connection_accepted(peer);
    }

    fn session_closed(&self, served: usize) {
        (**self).session_closed(served);
    }

    fn session_failed(&self, error: &ServeError) {
        (**self).session_failed(error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting backend bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config, local_addr: SocketAddr) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            endpoint = %config.endpoint(),
            local_addr = %local_addr,
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            "backend bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "backend bootstrap failed"
        );
    }

    fn state_changed(&self, state: ServerState) {
        tracing::debug!(
            target: HEALTH_TARGET,
            event = "state_changed",
            state = %state,
            "server state changed"
        );
    }

    fn connection_accepted(&self, peer: SocketAddr) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "connection_accepted",
            peer = %peer,
            "runner connected"
        );
    }

    fn session_closed(&self, served: usize) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "session_closed",
            served,
            "runner disconnected"
        );
    }

    fn session_failed(&self, error: &ServeError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "session_failed",
            error = %error,
            "serving stopped"
        );
    }
}
