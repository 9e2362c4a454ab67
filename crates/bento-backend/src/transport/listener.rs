//! Blocking TCP listener that hands out a single connection.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use tracing::{debug, info};

use bento_config::TcpEndpoint;

use super::{LISTENER_TARGET, ListenerError};

/// Listener bound to the configured endpoint.
#[derive(Debug)]
pub struct SocketListener {
    endpoint: TcpEndpoint,
    listener: TcpListener,
}

impl SocketListener {
    /// Resolves and binds the endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError`] when the host cannot be resolved or the
    /// address cannot be bound.
    pub fn bind(endpoint: &TcpEndpoint) -> Result<Self, ListenerError> {
        let listener = bind_tcp(endpoint.host(), endpoint.port())?;
        Ok(Self {
            endpoint: endpoint.clone(),
            listener,
        })
    }

    /// Endpoint the listener was configured with.
    #[must_use]
    pub fn endpoint(&self) -> &TcpEndpoint {
        &self.endpoint
    }

    /// Address actually bound, which differs from the endpoint for port 0.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::LocalAddr`] if the socket cannot report it.
    pub fn local_addr(&self) -> Result<SocketAddr, ListenerError> {
        self.listener
            .local_addr()
            .map_err(|source| ListenerError::LocalAddr { source })
    }

    /// Blocks until a client connects.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Accept`] for any failure other than an
    /// interrupted system call, which is retried.
    pub fn accept(&self) -> Result<(TcpStream, SocketAddr), ListenerError> {
        info!(
            target: LISTENER_TARGET,
            endpoint = %self.endpoint,
            "awaiting connection"
        );
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    debug!(target: LISTENER_TARGET, %peer, "accepted connection");
                    return Ok((stream, peer));
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(source) => {
                    return Err(ListenerError::Accept {
                        endpoint: self.endpoint.to_string(),
                        source,
                    });
                }
            }
        }
    }
}

fn bind_tcp(host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?;
    let addr = addrs
        .next()
        .ok_or_else(|| ListenerError::ResolveEmpty {
            host: host.to_owned(),
            port,
        })?;
    TcpListener::bind(addr).map_err(|source| ListenerError::BindTcp { addr, source })
}
