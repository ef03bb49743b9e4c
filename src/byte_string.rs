//! ByteString - a string as it appears on the binnf wire.
//!
//! binnf strings (block names, column names, log module and message) are raw
//! bytes with no encoding guarantee. `ByteString` keeps those bytes exactly,
//! so a decoded block re-encodes to the same bytes. Text views are lossy or
//! fallible and never alter the stored bytes.
//!
//! # Examples
//!
//! ```
//! use spikeport::ByteString;
//!
//! let name = ByteString::from("spike_times");
//! assert_eq!(name, "spike_times");
//! assert_eq!(name.to_str(), Some("spike_times"));
//!
//! let raw = ByteString::from(vec![b'n', 0xFF]);
//! assert_eq!(raw.len(), 2);
//! assert_eq!(raw.to_str(), None);
//! assert_eq!(raw.to_string_lossy(), "n\u{FFFD}");
//! ```

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Owned byte string with text views.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ByteString(Vec<u8>);

impl ByteString {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The bytes as `&str` if they are valid UTF-8.
    pub fn to_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    /// The bytes as text, invalid sequences replaced by U+FFFD.
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    #[inline]
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix.as_bytes())
    }
}

impl AsRef<[u8]> for ByteString {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for ByteString {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<String> for ByteString {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<&String> for ByteString {
    fn from(s: &String) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for ByteString {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl PartialEq<str> for ByteString {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for ByteString {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<String> for ByteString {
    fn eq(&self, other: &String) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<[u8]> for ByteString {
    fn eq(&self, other: &[u8]) -> bool {
        self.0 == other
    }
}

impl fmt::Display for ByteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl fmt::Debug for ByteString {
    /// UTF-8 content prints like a `str`, anything else as an escaped `b"..."`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_str() {
            Some(s) => fmt::Debug::fmt(s, f),
            None => {
                f.write_str("b\"")?;
                for &b in &self.0 {
                    write!(f, "{}", std::ascii::escape_default(b))?;
                }
                f.write_str("\"")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_are_kept() {
        let s = ByteString::from(vec![0xFF, 0x00, b'a']);
        assert_eq!(s.as_bytes(), &[0xFF, 0x00, b'a']);
        assert_eq!(s.to_string_lossy().len(), 5);
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn test_comparisons() {
        let s = ByteString::from("trace_v");
        assert_eq!(s, "trace_v");
        assert_eq!(s, String::from("trace_v"));
        assert!(s.starts_with("trace_"));
        assert!(!ByteString::from(vec![0xFF]).starts_with("trace_"));
    }

    #[test]
    fn test_debug() {
        assert_eq!(format!("{:?}", ByteString::from("abc")), "\"abc\"");
        assert_eq!(format!("{:?}", ByteString::from(vec![b'a', 0xFF])), "b\"a\\xff\"");
    }
}
