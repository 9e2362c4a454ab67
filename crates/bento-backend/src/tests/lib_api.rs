//! Tests that exercise the crate's public re-exports over a real connection.

use std::net::TcpListener;
use std::process::ExitCode;
use std::sync::Arc;

use rstest::rstest;

use crate::dispatch::DispatchError;
use crate::transport::ListenerError;
use crate::{BootstrapError, RunningTotal, ServeError, ServerState, bootstrap_with, run};

use super::support::{HealthEvent, RecordingHealthReporter, RunningBackend, TestConfigLoader};

#[rstest]
fn bootstrap_with_reexport_binds_before_serving() {
    let reporter = Arc::new(RecordingHealthReporter::default());
    let backend = bootstrap_with::<RunningTotal>(&TestConfigLoader::new(), reporter.clone())
        .expect("bootstrap should succeed");

    assert_ne!(backend.local_addr().port(), 0);
    assert_eq!(backend.config().host, "127.0.0.1");
    assert_eq!(backend.registry().len(), 3);
    assert_eq!(
        reporter.events(),
        vec![HealthEvent::BootstrapStarting, HealthEvent::BootstrapSucceeded]
    );
}

#[rstest]
fn serves_the_score_walkthrough() {
    let backend = RunningBackend::start();
    let mut client = backend.connect();

    assert_eq!(
        client.sentences(),
        r#"{"sentences":["add ? to ?","average of ? into ?","display ?"]}"#
    );
    assert_eq!(client.step("add ? to ?", &["5", "total"]), "{}");
    assert_eq!(client.step("add ? to ?", &["3", "total"]), "{}");
    assert_eq!(
        client.step("display ?", &["total"]),
        r#"{"text":"The total is 8."}"#
    );
    assert_eq!(
        client.step("average of ? into ?", &["total", "mean"]),
        r#"{"set":{"$1":"4"}}"#
    );
    drop(client);

    let reporter = backend.reporter.clone();
    assert_eq!(backend.join().expect("clean disconnect"), 5);
    assert_eq!(
        reporter.events(),
        vec![
            HealthEvent::BootstrapStarting,
            HealthEvent::BootstrapSucceeded,
            HealthEvent::StateChanged(ServerState::AwaitingConnection),
            HealthEvent::ConnectionAccepted,
            HealthEvent::StateChanged(ServerState::Serving),
            HealthEvent::StateChanged(ServerState::Closed),
            HealthEvent::SessionClosed(5),
        ]
    );
}

#[rstest]
fn mismatched_word_counts_are_reported_without_ending_the_session() {
    let backend = RunningBackend::start();
    let mut client = backend.connect();

    let response = client.step("display ? please", &["total"]);
    assert!(response.starts_with(r#"{"error":"#), "got {response}");
    assert_eq!(
        client.step("display ?", &["total"]),
        r#"{"text":"The total is 0."}"#
    );
    drop(client);

    assert_eq!(backend.join().expect("clean disconnect"), 2);
}

#[rstest]
fn malformed_lines_end_the_session() {
    let backend = RunningBackend::start();
    let mut client = backend.connect();

    let response = client.exchange("{not json");
    assert!(response.starts_with(r#"{"error":"malformed JSONL"#), "got {response}");
    drop(client);

    let reporter = backend.reporter.clone();
    let error = backend.join().expect_err("session should fail");
    assert!(matches!(
        error,
        ServeError::Session(DispatchError::MalformedJsonl { .. })
    ));
    let events = reporter.events();
    assert_eq!(
        events.get(events.len() - 2),
        Some(&HealthEvent::StateChanged(ServerState::Closed))
    );
    assert!(matches!(events.last(), Some(HealthEvent::SessionFailed(_))));
}

#[rstest]
fn bootstrap_fails_when_the_port_is_taken() {
    let occupied = TcpListener::bind("127.0.0.1:0").expect("bind placeholder");
    let port = occupied.local_addr().expect("placeholder address").port();
    let reporter = Arc::new(RecordingHealthReporter::default());
    let loader = TestConfigLoader::with_port(port);

    let error = bootstrap_with::<RunningTotal>(&loader, reporter.clone())
        .expect_err("bind should fail");

    assert!(matches!(
        error,
        BootstrapError::Listener {
            source: ListenerError::BindTcp { .. }
        }
    ));
    assert!(matches!(
        reporter.events().last(),
        Some(HealthEvent::BootstrapFailed(_))
    ));
}

#[rstest]
fn run_reports_configuration_errors_on_stderr() {
    let mut stderr = Vec::new();
    let code = run(
        ["bento-backend", "--port", "0", "--log-format", "xml"],
        &mut stderr,
    );

    assert_eq!(format!("{code:?}"), format!("{:?}", ExitCode::FAILURE));
    let message = String::from_utf8(stderr).expect("utf8 stderr");
    assert!(message.starts_with("bento-backend: "), "got {message}");
    assert!(message.contains("xml"), "got {message}");
}

#[rstest]
fn launch_manifest_runs_this_package() {
    let manifest: serde_json::Value =
        serde_json::from_str(include_str!("../../bento.json")).expect("bento.json is valid JSON");
    let command = manifest["run"].as_str().expect("run command is a string");
    assert!(command.ends_with(env!("CARGO_PKG_NAME")), "got {command}");
}
