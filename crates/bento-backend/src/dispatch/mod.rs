//! JSONL request dispatch for sentence steps.
//!
//! This module implements the loop that reads `StepRequest` lines from the
//! connected runner, resolves each sentence against the pattern registry,
//! invokes the bound step handler and writes one `ResultEnvelope` line back
//! before reading the next request.
//!
//! ## Protocol
//!
//! The runner first asks for the sentences the backend understands:
//!
//! ```json
//! {"special":"sentences"}
//! {"sentences":["add ? to ?","average of ? into ?","display ?"]}
//! ```
//!
//! Step invocations name the template and carry the runner's arguments:
//!
//! ```json
//! {"sentence":"display ?","args":["total"]}
//! {"text":"The total is 8."}
//! ```
//!
//! Responses are `{}`, `{"text":..}`, `{"set":{..}}` or, for a request that
//! failed on its own, `{"error":..}`. Malformed or oversized lines end the
//! session.

mod errors;
mod frame;
mod request;
mod response;
mod session;

pub use self::errors::DispatchError;
pub use self::frame::{FrameReader, MAX_REQUEST_BYTES};
pub use self::request::{RequestKind, SENTENCES_SPECIAL, StepRequest};
pub use self::response::{ResponseWriter, ResultEnvelope};
pub use self::session::Session;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
