//! Native keys and identifier encoding.
//!
//! Store-assigned numeric ids are exposed to records as text: the id's
//! minimal big-endian byte form, base64 encoded. All functions are pure.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Reserved property name addressing the key name in filters and orderings.
pub const KEY_PROPERTY: &str = "__key__";

/// The store's identifier for an entity: its kind plus a name.
///
/// A key without a name is incomplete and cannot be written.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NativeKey {
    pub kind: String,
    pub name: Option<String>,
}

impl NativeKey {
    /// Creates a complete key.
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: Some(name.into()),
        }
    }

    /// Creates a key that has a kind but no name yet.
    pub fn incomplete(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.name.is_some()
    }
}

impl fmt::Display for NativeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}({})", self.kind, name),
            None => write!(f, "{}(<incomplete>)", self.kind),
        }
    }
}

/// Encodes a numeric id as base64 of its minimal big-endian bytes.
///
/// Zero encodes as a single zero byte. Negative ids keep all eight bytes of
/// their two's complement form.
pub fn encode_id(id: i64) -> String {
    let bytes = id.to_be_bytes();
    let first = bytes
        .iter()
        .position(|b| *b != 0)
        .unwrap_or(bytes.len() - 1);
    STANDARD.encode(&bytes[first..])
}

/// Decodes a value produced by [`encode_id`].
///
/// Returns `None` for text that is not base64 or does not hold 1 to 8 bytes.
pub fn decode_id(encoded: &str) -> Option<i64> {
    let bytes = STANDARD.decode(encoded).ok()?;
    if bytes.is_empty() || bytes.len() > 8 {
        return None;
    }
    let mut buf = [0u8; 8];
    buf[8 - bytes.len()..].copy_from_slice(&bytes);
    Some(i64::from_be_bytes(buf))
}
