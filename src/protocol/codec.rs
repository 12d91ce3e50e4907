//! Line framing for the `--pipe` protocol.
//!
//! A request is the raw filename bytes followed by `\n`; a response is one
//! `\n`-terminated line. Both directions are byte oriented: nothing is decoded
//! as text at this layer, so filenames that are not valid UTF-8 survive the
//! round trip unchanged.
//!
//! Inbound lines are bounded by a maximum length so that a misbehaving server
//! that never emits a newline cannot make the client buffer without limit.

use std::io::{BufRead, Read, Write};

use tracing::debug;

use crate::{AppError, Result};

/// Default maximum response line length, newline excluded: 1 MiB.
pub const MAX_LINE_BYTES: usize = 1_048_576;

/// Write one request frame (`filename` + `\n`) and flush it.
///
/// The filename is written as-is. It is never escaped, so a filename that
/// contains `\n` is refused up front instead of corrupting the framing.
///
/// # Errors
///
/// - [`AppError::InvalidFilename`] if `filename` contains a newline. Nothing
///   is written in that case.
/// - [`AppError::Io`]`("write failed: …")` / `("flush failed: …")` when the
///   outbound pipe rejects the frame (e.g. the server has exited).
pub fn write_request<W: Write>(writer: &mut W, filename: &[u8]) -> Result<()> {
    if filename.contains(&b'\n') {
        return Err(AppError::InvalidFilename(format!(
            "contains a newline: \"{}\"",
            filename.escape_ascii()
        )));
    }

    let mut frame = Vec::with_capacity(filename.len() + 1);
    frame.extend_from_slice(filename);
    frame.push(b'\n');

    writer
        .write_all(&frame)
        .map_err(|err| AppError::Io(format!("write failed: {err}")))?;
    // The server only sees the request once the pipe buffer is flushed.
    writer
        .flush()
        .map_err(|err| AppError::Io(format!("flush failed: {err}")))?;

    Ok(())
}

/// Read one response frame, trailing newline included.
///
/// # Return value
///
/// - `Ok(Some(line))` — a complete line ending in `\n`.
/// - `Ok(None)` — the stream ended before a complete line was available,
///   either cleanly or in the middle of a line.
///
/// # Errors
///
/// - [`AppError::LineTooLong`] when more than `max_line_bytes` bytes arrive
///   without a newline.
/// - [`AppError::Io`]`("read failed: …")` on underlying read errors.
pub fn read_response<R: BufRead>(reader: &mut R, max_line_bytes: usize) -> Result<Option<Vec<u8>>> {
    // One extra byte leaves room for the newline of a maximum-length line.
    let limit = u64::try_from(max_line_bytes)
        .unwrap_or(u64::MAX)
        .saturating_add(1);

    let mut line = Vec::new();
    let read = reader
        .by_ref()
        .take(limit)
        .read_until(b'\n', &mut line)
        .map_err(|err| AppError::Io(format!("read failed: {err}")))?;

    if read == 0 {
        return Ok(None);
    }

    if line.last() == Some(&b'\n') {
        return Ok(Some(line));
    }

    if line.len() > max_line_bytes {
        return Err(AppError::LineTooLong(max_line_bytes));
    }

    debug!(
        partial = %line.escape_ascii(),
        "stream ended in the middle of a response line"
    );
    Ok(None)
}
