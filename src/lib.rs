#![forbid(unsafe_code)]

//! Client for the `mediafileinfo --pipe` line protocol.
//!
//! The server reads one filename per line on stdin and answers each with one
//! line of space-separated `key=value` pairs:
//!
//! ```text
//! -> a.mp4
//! <- format=mp4 width=100 height=50 f=a.mp4
//! ```
//!
//! [`ProtocolClient`] speaks this protocol over any blocking reader/writer
//! pair; [`process::ServerProcess`] launches the server and binds a client to
//! its pipes.
//!
//! ```rust,ignore
//! use mediafileinfo_client::{process::ServerProcess, ClientConfig};
//!
//! let mut server = ServerProcess::spawn(&ClientConfig::default().spawn_config())?;
//! let record = server.query("a.mp4")?;
//! assert_eq!(record.format(), "mp4");
//! server.shutdown()?;
//! ```

pub mod config;
pub mod errors;
pub mod output;
pub mod process;
pub mod protocol;

pub use config::ClientConfig;
pub use errors::{AppError, Result};
pub use protocol::{ProtocolClient, Record};
