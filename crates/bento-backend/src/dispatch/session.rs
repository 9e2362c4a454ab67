//! Connection-scoped dispatch loop.
//!
//! A [`Session`] owns the step table for one accepted connection and borrows
//! the shared, read-only registry. It serves requests strictly one at a time:
//! the next frame is not read until the previous response has been written
//! and flushed, so responses arrive in request order and handler side effects
//! are applied in that same order.

use std::io::{BufReader, Read, Write};

use tracing::{debug, warn};

use crate::registry::PatternRegistry;
use crate::steps::StepHandlers;

use super::DISPATCH_TARGET;
use super::errors::DispatchError;
use super::frame::FrameReader;
use super::request::{RequestKind, StepRequest, is_blank};
use super::response::{ResponseWriter, ResultEnvelope};

/// Dispatch state for one connection.
pub struct Session<'r, H: StepHandlers> {
    registry: &'r PatternRegistry<H::Step>,
    handlers: H,
    served: usize,
}

impl<'r, H: StepHandlers> Session<'r, H> {
    /// Creates a session over the shared registry with fresh step state.
    pub fn new(registry: &'r PatternRegistry<H::Step>, handlers: H) -> Self {
        Self {
            registry,
            handlers,
            served: 0,
        }
    }

    /// Step state accumulated so far.
    pub fn handlers(&self) -> &H {
        &self.handlers
    }

    /// Serves requests from `stream` until the peer closes it.
    ///
    /// Returns the number of requests answered. A failed read ends the
    /// session the same way end-of-stream does. Requests that fail on their
    /// own (unknown sentence, handler failure) are answered with an `error`
    /// envelope and the loop continues.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`DispatchError`]: an oversized frame,
    /// malformed JSON, or a failed write. An `error` envelope is sent on a
    /// best-effort basis before returning, except after a failed write.
    pub fn serve<S>(&mut self, stream: S) -> Result<usize, DispatchError>
    where
        S: Read + Write,
    {
        let mut frames = FrameReader::new(BufReader::new(stream));
        loop {
            let frame = match frames.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    debug!(
                        target: DISPATCH_TARGET,
                        served = self.served,
                        "peer closed connection"
                    );
                    return Ok(self.served);
                }
                Err(DispatchError::Io(error)) => {
                    debug!(
                        target: DISPATCH_TARGET,
                        served = self.served,
                        %error,
                        "connection read failed; closing session"
                    );
                    return Ok(self.served);
                }
                Err(error) => return Err(abort(frames.get_mut().get_mut(), error)),
            };

            if is_blank(&frame) {
                continue;
            }

            let envelope = match self.handle_frame(&frame) {
                Ok(envelope) => envelope,
                Err(error) => return Err(abort(frames.get_mut().get_mut(), error)),
            };

            ResponseWriter::new(frames.get_mut().get_mut()).write_envelope(&envelope)?;
            self.served += 1;
        }
    }

    /// Parses one frame and produces its response.
    ///
    /// # Errors
    ///
    /// Returns the error when it is fatal to the session (see
    /// [`DispatchError::is_fatal`]); every other failure is folded into an
    /// `error` envelope.
    pub fn handle_frame(&mut self, frame: &[u8]) -> Result<ResultEnvelope, DispatchError> {
        match StepRequest::parse(frame).and_then(|request| self.dispatch(&request)) {
            Ok(envelope) => Ok(envelope),
            Err(error) if error.is_fatal() => Err(error),
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "request failed");
                Ok(ResultEnvelope::from(&error))
            }
        }
    }

    fn dispatch(&mut self, request: &StepRequest) -> Result<ResultEnvelope, DispatchError> {
        match request.kind()? {
            RequestKind::Sentences => {
                debug!(target: DISPATCH_TARGET, "listing sentences");
                Ok(ResultEnvelope::Sentences(self.registry.list_templates()))
            }
            RequestKind::Step { sentence, args } => {
                let found = self.registry.lookup(sentence)?;
                // Handlers receive the runner's typed arguments; the words
                // bound by the matcher are informational only.
                debug!(
                    target: DISPATCH_TARGET,
                    template = found.template(),
                    step = ?found.handler,
                    captures = ?found.captures,
                    args = ?args,
                    "invoking step"
                );
                let outcome = self.handlers.invoke(found.handler, args)?;
                Ok(ResultEnvelope::from(outcome))
            }
        }
    }
}

fn abort<W: Write>(stream: &mut W, error: DispatchError) -> DispatchError {
    warn!(target: DISPATCH_TARGET, %error, "ending session");
    if let Err(write_error) = ResponseWriter::new(stream).write_error(&error) {
        debug!(
            target: DISPATCH_TARGET,
            error = %write_error,
            "failed to report fatal error"
        );
    }
    error
}
