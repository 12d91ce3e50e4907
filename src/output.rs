//! Record rendering for the command-line client.
//!
//! Each record becomes exactly one stdout line, flushed immediately so a
//! consumer reading the client's output sees results as they arrive.

use std::io::Write;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::protocol::Record;
use crate::{AppError, Result};

/// Output line format.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// `{"f": "a.mp4", "format": "mp4", ...}` with Rust string escaping.
    #[default]
    Text,
    /// One compact JSON object per line.
    Json,
}

/// Render `record` as a single line, without the trailing newline.
///
/// # Errors
///
/// Returns `AppError::Io` if JSON serialization fails.
pub fn render(record: &Record, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(record.to_string()),
        OutputFormat::Json => serde_json::to_string(record)
            .map_err(|err| AppError::Io(format!("failed to serialise record: {err}"))),
    }
}

/// Write `record` as one line to `out` and flush.
///
/// # Errors
///
/// Returns `AppError::Io` on serialization or write failures.
pub fn write_record<W: Write>(out: &mut W, record: &Record, format: OutputFormat) -> Result<()> {
    let mut line = render(record, format)?;
    line.push('\n');
    out.write_all(line.as_bytes())
        .map_err(|err| AppError::Io(format!("write failed: {err}")))?;
    out.flush()
        .map_err(|err| AppError::Io(format!("flush failed: {err}")))?;
    Ok(())
}
