//! Error types shared across the crate.

use std::fmt::{Display, Formatter};

/// Shared crate result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Crate error enumeration covering protocol, process, and configuration failures.
///
/// Protocol variants carry the raw response line so callers can log exactly
/// what the server sent.
#[derive(Debug)]
pub enum AppError {
    /// Response did not begin with `format=` (or carried an empty format).
    BadPrefix {
        /// Raw response line, newline included.
        raw: Vec<u8>,
    },
    /// Response did not end with ` f=<filename>\n` for the requested filename.
    BadSuffix {
        /// Raw response line, newline included.
        raw: Vec<u8>,
    },
    /// The inbound stream ended before a complete response line arrived.
    ConnectionClosed,
    /// A response token had no `=`, an empty key, or was not valid UTF-8.
    MalformedToken {
        /// The offending token, lossily decoded.
        token: String,
        /// Raw response line, newline included.
        raw: Vec<u8>,
    },
    /// A response line exceeded the configured maximum length.
    LineTooLong(usize),
    /// The filename cannot be framed as a single request line.
    InvalidFilename(String),
    /// Configuration parsing or validation failure.
    Config(String),
    /// The server process could not be started.
    Spawn(String),
    /// The server process exited unsuccessfully.
    ServerFailed(String),
    /// File-system or pipe I/O failure.
    Io(String),
}

impl AppError {
    /// Raw response line attached to a protocol error, if any.
    #[must_use]
    pub fn raw_response(&self) -> Option<&[u8]> {
        match self {
            Self::BadPrefix { raw } | Self::BadSuffix { raw } | Self::MalformedToken { raw, .. } => {
                Some(raw.as_slice())
            }
            _ => None,
        }
    }

    /// Whether the server answered, but with a line that violates the protocol.
    #[must_use]
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            Self::BadPrefix { .. } | Self::BadSuffix { .. } | Self::MalformedToken { .. }
        )
    }

    /// Whether the connection can no longer be used after this error.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConnectionClosed | Self::LineTooLong(_) | Self::Io(_)
        )
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadPrefix { raw } => write!(f, "bad prefix: \"{}\"", raw.escape_ascii()),
            Self::BadSuffix { raw } => write!(f, "bad suffix: \"{}\"", raw.escape_ascii()),
            Self::ConnectionClosed => write!(f, "connection closed"),
            Self::MalformedToken { token, raw } => write!(
                f,
                "malformed token {token:?} in \"{}\"",
                raw.escape_ascii()
            ),
            Self::LineTooLong(max) => write!(f, "line too long: exceeded {max} bytes"),
            Self::InvalidFilename(msg) => write!(f, "invalid filename: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Spawn(msg) => write!(f, "spawn: {msg}"),
            Self::ServerFailed(msg) => write!(f, "server failed: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}
