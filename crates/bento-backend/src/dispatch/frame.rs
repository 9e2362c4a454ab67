//! Newline-delimited framing for the persistent connection.
//!
//! Unlike a one-shot reader, the frame reader keeps any bytes that follow a
//! newline buffered for the next call, so requests pipelined by the runner are
//! served one at a time and in order.

use std::io::{self, BufRead};

use super::errors::DispatchError;

/// Maximum size of a single request line in bytes.
pub const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// Reads bounded JSONL frames from a buffered stream.
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    limit: usize,
}

impl<R: BufRead> FrameReader<R> {
    /// Wraps a buffered reader using [`MAX_REQUEST_BYTES`] as the limit.
    pub fn new(inner: R) -> Self {
        Self::with_limit(inner, MAX_REQUEST_BYTES)
    }

    /// Wraps a buffered reader with a custom frame limit.
    pub fn with_limit(inner: R, limit: usize) -> Self {
        Self { inner, limit }
    }

    /// Mutable access to the wrapped reader, used to write responses on the
    /// same stream.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Reads the next frame without its newline terminator.
    ///
    /// Returns `Ok(None)` at end of stream. A trailing frame without a
    /// terminator is still returned.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::RequestTooLarge` when a frame exceeds the
    /// limit and `DispatchError::Io` when reading fails.
    pub fn read_frame(&mut self) -> Result<Option<Vec<u8>>, DispatchError> {
        let mut frame = Vec::new();
        loop {
            let (consumed, complete) = {
                let available = match self.inner.fill_buf() {
                    Ok(available) => available,
                    Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                    Err(error) => return Err(error.into()),
                };

                if available.is_empty() {
                    return Ok(if frame.is_empty() { None } else { Some(frame) });
                }

                match available.iter().position(|byte| *byte == b'\n') {
                    Some(newline) => {
                        frame.extend_from_slice(&available[..newline]);
                        (newline + 1, true)
                    }
                    None => {
                        frame.extend_from_slice(available);
                        (available.len(), false)
                    }
                }
            };

            self.inner.consume(consumed);
            enforce_limit(frame.len(), self.limit)?;
            if complete {
                return Ok(Some(frame));
            }
        }
    }
}

fn enforce_limit(size: usize, limit: usize) -> Result<(), DispatchError> {
    if size > limit {
        return Err(DispatchError::request_too_large(size, limit));
    }
    Ok(())
}
