//! Socket listener for the backend's TCP endpoint.
//!
//! The backend serves exactly one runner connection, so the listener is a
//! plain blocking accept with no background thread.

mod errors;
mod listener;

pub use self::errors::ListenerError;
pub use self::listener::SocketListener;

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
