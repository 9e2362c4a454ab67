//! Shared helpers for the backend test suites.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bento_config::{Config, ConfigError, LogFormat};

use crate::bootstrap::{BootstrapError, ConfigLoader, bootstrap_with};
use crate::health::HealthReporter;
use crate::server::{ServeError, ServerState};
use crate::steps::RunningTotal;

/// Loader that binds an ephemeral loopback port with logging switched off.
pub struct TestConfigLoader {
    port: u16,
}

impl TestConfigLoader {
    /// Loader for an ephemeral port.
    #[must_use]
    pub fn new() -> Self {
        Self::with_port(0)
    }

    /// Loader for a specific port.
    #[must_use]
    pub fn with_port(port: u16) -> Self {
        Self { port }
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Ok(Config {
            port: self.port,
            host: "127.0.0.1".into(),
            log_filter: "off".into(),
            log_format: LogFormat::Compact,
        })
    }
}

/// Loader that fails by passing an unknown log format.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Config::load_from_iter(["bento-backend", "--port", "0", "--log-format", "xml"])
    }
}

/// Records health events for assertions.
#[derive(Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config, _local_addr: SocketAddr) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn state_changed(&self, state: ServerState) {
        self.record(HealthEvent::StateChanged(state));
    }

    fn connection_accepted(&self, _peer: SocketAddr) {
        self.record(HealthEvent::ConnectionAccepted);
    }

    fn session_closed(&self, served: usize) {
        self.record(HealthEvent::SessionClosed(served));
    }

    fn session_failed(&self, error: &ServeError) {
        self.record(HealthEvent::SessionFailed(error.to_string()));
    }
}

/// Structured health events tracked during tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    /// Bootstrap started.
    BootstrapStarting,
    /// Bootstrap completed successfully.
    BootstrapSucceeded,
    /// Bootstrap failed with an error description.
    BootstrapFailed(String),
    /// The server moved to a new state.
    StateChanged(ServerState),
    /// The runner connected.
    ConnectionAccepted,
    /// The runner disconnected after the given number of requests.
    SessionClosed(usize),
    /// Serving stopped with an error description.
    SessionFailed(String),
}

/// A bootstrapped score backend serving on a background thread.
pub struct RunningBackend {
    pub addr: SocketAddr,
    pub reporter: Arc<RecordingHealthReporter>,
    handle: JoinHandle<Result<usize, ServeError>>,
}

impl RunningBackend {
    /// Bootstraps with [`TestConfigLoader`] and starts serving.
    pub fn start() -> Self {
        let reporter = Arc::new(RecordingHealthReporter::default());
        let backend = bootstrap_with::<RunningTotal>(&TestConfigLoader::new(), reporter.clone())
            .expect("bootstrap should succeed");
        let addr = backend.local_addr();
        let handle = thread::spawn(move || backend.serve(RunningTotal::default()));
        Self {
            addr,
            reporter,
            handle,
        }
    }

    /// Connects a runner client.
    pub fn connect(&self) -> RunnerClient {
        RunnerClient::connect(self.addr)
    }

    /// Waits for the serving thread to finish.
    pub fn join(self) -> Result<usize, ServeError> {
        self.handle.join().expect("serving thread panicked")
    }
}

/// Minimal stand-in for the runner's side of the connection.
pub struct RunnerClient {
    writer: TcpStream,
    reader: BufReader<TcpStream>,
}

impl RunnerClient {
    /// Connects to the backend with a read timeout.
    pub fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).expect("connect to backend");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("set read timeout");
        let reader = BufReader::new(stream.try_clone().expect("clone stream"));
        Self {
            writer: stream,
            reader,
        }
    }

    /// Sends one raw line and reads the response line, without its newline.
    ///
    /// Returns an empty string when the backend closed the connection.
    pub fn exchange(&mut self, line: &str) -> String {
        self.writer.write_all(line.as_bytes()).expect("write request");
        self.writer.write_all(b"\n").expect("write newline");
        self.writer.flush().expect("flush request");
        let mut response = String::new();
        self.reader
            .read_line(&mut response)
            .expect("read response");
        response.trim_end().to_owned()
    }

    /// Sends a step request built from a sentence and its arguments.
    pub fn step(&mut self, sentence: &str, args: &[&str]) -> String {
        let request = serde_json::json!({ "sentence": sentence, "args": args });
        self.exchange(&request.to_string())
    }

    /// Asks for the sentence list.
    pub fn sentences(&mut self) -> String {
        self.exchange(r#"{"special":"sentences"}"#)
    }
}
