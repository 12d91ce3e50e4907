//! Parsed response records.
//!
//! A response line has the shape
//!
//! ```text
//! format=<fmt> <key>=<value> ... f=<filename>\n
//! ```
//!
//! [`parse_response`] validates the `format=` prefix and the ` f=<filename>\n`
//! suffix against the request, then splits the remaining text into tokens.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fmt::{Display, Formatter};

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::{AppError, Result};

/// Literal every response must start with.
pub const FORMAT_PREFIX: &[u8] = b"format=";

/// Key of the field echoing the request filename.
pub const FILENAME_KEY: &str = "f";

/// Key of the mandatory format field.
pub const FORMAT_KEY: &str = "format";

/// One parsed response.
///
/// Holds the server's `key=value` fields plus the request filename under the
/// `f` key. The filename is kept as the caller supplied it, so it may be a
/// non-UTF-8 path; [`Record::get`] returns `None` for `f` in that case and
/// [`Record::filename`] always works.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: BTreeMap<String, String>,
    filename: OsString,
}

impl Record {
    /// Look up a field by key. `f` resolves to the request filename.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        if key == FILENAME_KEY {
            self.filename.to_str()
        } else {
            self.fields.get(key).map(String::as_str)
        }
    }

    /// Value of the `format` field. Never empty.
    #[must_use]
    pub fn format(&self) -> &str {
        self.fields.get(FORMAT_KEY).map_or("", String::as_str)
    }

    /// The request filename, exactly as passed to the query.
    #[must_use]
    pub fn filename(&self) -> &OsStr {
        &self.filename
    }

    /// Number of fields, `f` included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len() + 1
    }

    /// Always `false`: a record carries at least `format` and `f`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether the record has a field named `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        key == FILENAME_KEY || self.fields.contains_key(key)
    }

    /// Server-reported fields in key order, without `f`.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// All fields in key order with `f` in its sorted place; `f` is decoded lossily.
    fn entries(&self) -> Vec<(&str, Cow<'_, str>)> {
        let mut entries: Vec<_> = self
            .fields
            .iter()
            .map(|(k, v)| (k.as_str(), Cow::Borrowed(v.as_str())))
            .collect();
        let at = entries.partition_point(|(k, _)| *k < FILENAME_KEY);
        entries.insert(at, (FILENAME_KEY, self.filename.to_string_lossy()));
        entries
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.entries().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key:?}: {value:?}")?;
        }
        f.write_str("}")
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let entries = self.entries();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in &entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// The exact bytes a response to `filename` must end with: ` f=<filename>\n`.
#[must_use]
pub fn expected_suffix(filename: &[u8]) -> Vec<u8> {
    let mut suffix = Vec::with_capacity(filename.len() + 4);
    suffix.extend_from_slice(b" f=");
    suffix.extend_from_slice(filename);
    suffix.push(b'\n');
    suffix
}

/// Validate a raw response line against the request `filename` and parse it.
///
/// Checks run in order:
/// 1. the line starts with `format=`;
/// 2. the line ends with ` f=<filename>\n`, compared byte for byte.
///
/// The suffix is then stripped, the rest is split on single spaces, and each
/// token is split on its first `=`. Repeated keys keep the last value. Any
/// `f` sent by the server is replaced by `filename`.
///
/// # Errors
///
/// - [`AppError::BadPrefix`] if the line does not start with `format=`, or
///   the format value is empty.
/// - [`AppError::BadSuffix`] if the line does not end with the expected suffix.
/// - [`AppError::MalformedToken`] if a token has no `=`, has an empty key, or
///   is not valid UTF-8. Such lines are rejected rather than partially parsed.
pub fn parse_response(raw: &[u8], filename: &OsStr) -> Result<Record> {
    if !raw.starts_with(FORMAT_PREFIX) {
        return Err(AppError::BadPrefix { raw: raw.to_vec() });
    }

    let suffix = expected_suffix(filename.as_encoded_bytes());
    let Some(body) = raw.strip_suffix(suffix.as_slice()) else {
        return Err(AppError::BadSuffix { raw: raw.to_vec() });
    };

    let mut fields = BTreeMap::new();
    for token in body.split(|&b| b == b' ') {
        let (key, value) = split_token(token).ok_or_else(|| AppError::MalformedToken {
            token: String::from_utf8_lossy(token).into_owned(),
            raw: raw.to_vec(),
        })?;
        fields.insert(key.to_owned(), value.to_owned());
    }

    fields.remove(FILENAME_KEY);

    if fields.get(FORMAT_KEY).map_or(true, String::is_empty) {
        return Err(AppError::BadPrefix { raw: raw.to_vec() });
    }

    Ok(Record {
        fields,
        filename: filename.to_os_string(),
    })
}

/// Split `key=value` on the first `=`. Values may contain further `=`.
fn split_token(token: &[u8]) -> Option<(&str, &str)> {
    let text = std::str::from_utf8(token).ok()?;
    let (key, value) = text.split_once('=')?;
    if key.is_empty() {
        return None;
    }
    Some((key, value))
}
