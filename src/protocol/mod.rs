//! `--pipe` line protocol.
//!
//! - `codec`: request/response line framing over blocking byte streams.
//! - `record`: response validation and `key=value` parsing into a [`Record`].
//! - `client`: [`ProtocolClient`], one request and one response per query.

pub mod client;
pub mod codec;
pub mod record;

pub use client::ProtocolClient;
pub use record::{parse_response, Record};
