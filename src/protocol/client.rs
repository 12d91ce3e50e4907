//! Blocking request/response client.
//!
//! [`ProtocolClient`] owns both halves of a connection to a `--pipe` server:
//! a buffered reader for responses and a writer for requests. Each
//! [`ProtocolClient::query`] writes exactly one request line and reads
//! exactly one response line; there is no pipelining and no retry.
//!
//! `query` takes `&mut self`, so two requests can never be outstanding on
//! the same client. Callers that share a client across threads wrap it in a
//! `Mutex`, or open one server process per thread.

use std::ffi::OsStr;
use std::io::{BufRead, Write};

use tracing::debug;

use crate::protocol::codec::{self, MAX_LINE_BYTES};
use crate::protocol::record::{self, Record};
use crate::{AppError, Result};

/// Client side of the `--pipe` line protocol over an arbitrary byte stream pair.
#[derive(Debug)]
pub struct ProtocolClient<R, W> {
    reader: R,
    /// `None` once the outbound half has been closed.
    writer: Option<W>,
    max_line_bytes: usize,
    /// Set after a transport failure; every later query fails fast.
    broken: bool,
}

impl<R: BufRead, W: Write> ProtocolClient<R, W> {
    /// Wrap a response reader and a request writer.
    #[must_use]
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer: Some(writer),
            max_line_bytes: MAX_LINE_BYTES,
            broken: false,
        }
    }

    /// Override the maximum accepted response line length.
    #[must_use]
    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    /// Whether the connection can no longer carry requests.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.broken || self.writer.is_none()
    }

    /// Send `filename` and return the parsed response.
    ///
    /// `filename` must not contain a newline. Its encoded bytes are sent
    /// unmodified and compared byte for byte against the ` f=` suffix of the
    /// response; the returned record's `f` field is the `filename` passed here.
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidFilename`] if `filename` contains a newline.
    /// - [`AppError::ConnectionClosed`] if the server closed its output before
    ///   answering, or if the connection already failed or was closed.
    /// - [`AppError::Io`] / [`AppError::LineTooLong`] on transport failures.
    /// - [`AppError::BadPrefix`], [`AppError::BadSuffix`],
    ///   [`AppError::MalformedToken`] when the response violates the protocol.
    ///
    /// Transport failures leave the client closed. Protocol violations do not.
    pub fn query(&mut self, filename: impl AsRef<OsStr>) -> Result<Record> {
        let filename = filename.as_ref();

        if self.broken {
            return Err(AppError::ConnectionClosed);
        }
        let Some(writer) = self.writer.as_mut() else {
            return Err(AppError::ConnectionClosed);
        };

        let request = filename.as_encoded_bytes();
        debug!(filename = %filename.to_string_lossy(), "sending request");
        let sent = codec::write_request(writer, request);
        self.check(sent)?;

        let line = codec::read_response(&mut self.reader, self.max_line_bytes);
        let Some(line) = self.check(line)? else {
            debug!(filename = %filename.to_string_lossy(), "server closed its output");
            self.broken = true;
            return Err(AppError::ConnectionClosed);
        };
        debug!(response = %line.escape_ascii(), "received response");

        record::parse_response(&line, filename).map_err(|err| {
            debug!(
                filename = %filename.to_string_lossy(),
                error = %err,
                "rejected response"
            );
            err
        })
    }

    /// Flush and drop the outbound half, signalling end of input to the server.
    ///
    /// Further queries fail with [`AppError::ConnectionClosed`]. Closing twice
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`] if the final flush fails; the writer is
    /// dropped regardless.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .flush()
                .map_err(|err| AppError::Io(format!("flush failed: {err}")))?;
            debug!("request stream closed");
        }
        Ok(())
    }

    /// Mark the connection broken when `result` is a fatal error.
    fn check<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(ref err) = result {
            if err.is_fatal() {
                debug!(error = %err, "connection failed");
                self.broken = true;
            }
        }
        result
    }
}
