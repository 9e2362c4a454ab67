//! Single-connection serving loop.
//!
//! The backend accepts exactly one runner connection, serves it until the
//! runner disconnects and then stops. There is no reconnect and no second
//! client: the runner owns the backend process for the lifetime of a test
//! run.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;

use bento_config::Config;

use crate::dispatch::{DispatchError, Session};
use crate::health::HealthReporter;
use crate::registry::PatternRegistry;
use crate::steps::StepHandlers;
use crate::transport::{ListenerError, SocketListener};

/// Lifecycle phases of a bootstrapped backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Listening and waiting for the runner.
    AwaitingConnection,
    /// A runner is connected and requests are being answered.
    Serving,
    /// The connection ended and the listener has been released.
    Closed,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AwaitingConnection => "awaiting_connection",
            Self::Serving => "serving",
            Self::Closed => "closed",
        })
    }
}

/// Errors that stop the backend after bootstrap.
#[derive(Debug, Error)]
pub enum ServeError {
    /// No runner connection could be accepted.
    #[error(transparent)]
    Accept(#[from] ListenerError),
    /// The session ended on a fatal protocol or transport error.
    #[error("session failed: {0}")]
    Session(#[from] DispatchError),
}

/// A bootstrapped backend that has bound its listener but not yet accepted
/// the runner.
pub struct Backend<S> {
    config: Config,
    registry: PatternRegistry<S>,
    listener: SocketListener,
    local_addr: SocketAddr,
    reporter: Arc<dyn HealthReporter>,
}

impl<S> fmt::Debug for Backend<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("endpoint", self.listener.endpoint())
            .field("local_addr", &self.local_addr)
            .finish_non_exhaustive()
    }
}

impl<S> Backend<S>
where
    S: Copy + fmt::Debug,
{
    pub(crate) fn new(
        config: Config,
        registry: PatternRegistry<S>,
        listener: SocketListener,
        local_addr: SocketAddr,
        reporter: Arc<dyn HealthReporter>,
    ) -> Self {
        Self {
            config,
            registry,
            listener,
            local_addr,
            reporter,
        }
    }

    /// Configuration the backend was started with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Address the listener is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Patterns the backend answers.
    #[must_use]
    pub fn registry(&self) -> &PatternRegistry<S> {
        &self.registry
    }

    /// Accepts one runner connection and serves it with `handlers` until the
    /// runner disconnects.
    ///
    /// Returns the number of requests answered. The listener is closed before
    /// returning, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError`] when accepting fails or the session ends on a
    /// fatal error.
    pub fn serve<H>(self, handlers: H) -> Result<usize, ServeError>
    where
        H: StepHandlers<Step = S>,
    {
        let Self {
            registry,
            listener,
            reporter,
            ..
        } = self;

        reporter.state_changed(ServerState::AwaitingConnection);
        let result = accept_and_serve(&listener, &registry, handlers, &*reporter);
        drop(listener);
        reporter.state_changed(ServerState::Closed);

        match &result {
            Ok(served) => reporter.session_closed(*served),
            Err(error) => reporter.session_failed(error),
        }
        result
    }
}

fn accept_and_serve<H>(
    listener: &SocketListener,
    registry: &PatternRegistry<H::Step>,
    handlers: H,
    reporter: &dyn HealthReporter,
) -> Result<usize, ServeError>
where
    H: StepHandlers,
{
    let (stream, peer) = listener.accept()?;
    reporter.connection_accepted(peer);
    reporter.state_changed(ServerState::Serving);

    let mut session = Session::new(registry, handlers);
    let served = session.serve(stream)?;
    Ok(served)
}
