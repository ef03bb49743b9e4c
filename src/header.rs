//! Header - column schema of a binnf matrix.
//!
//! A header is an ordered list of `(name, type)` columns. It precomputes the
//! byte offset of every column inside a row and the total row stride:
//!
//! - `offset(0) == 0`
//! - `offset(i) + width(type(i)) == offset(i + 1)`
//! - `offset(len) == stride`
//!
//! Duplicate names are accepted; name lookup returns the first match. Column
//! names are kept as the raw bytes received on the wire.
//!
//! # Examples
//!
//! ```
//! use spikeport::{Header, NumericType};
//!
//! let header = Header::new([("pid", NumericType::Int32), ("weight", NumericType::Float64)]);
//! assert_eq!(header.stride(), 12);
//! assert_eq!(header.offset(1), 4);
//! assert_eq!(header.index("weight"), Some(1));
//! assert_eq!(header.index("delay"), None);
//! ```

use crate::{ByteString, NumericType, Result, SpikeportError};
use itertools::Itertools;
use std::fmt;

/// A single named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    pub name: ByteString,
    pub numeric_type: NumericType,
}

impl Column {
    pub fn new(name: impl Into<ByteString>, numeric_type: NumericType) -> Self {
        Self {
            name: name.into(),
            numeric_type,
        }
    }
}

/// Ordered column schema with precomputed offsets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Header {
    columns: Vec<Column>,
    /// Prefix sums of the column widths, `columns.len() + 1` entries
    offsets: Vec<usize>,
}

impl Header {
    /// Create a header from `(name, type)` pairs. O(N) in the columns.
    pub fn new<S, I>(columns: I) -> Self
    where
        S: Into<ByteString>,
        I: IntoIterator<Item = (S, NumericType)>,
    {
        Self::from_columns(
            columns
                .into_iter()
                .map(|(name, ty)| Column::new(name, ty))
                .collect(),
        )
    }

    /// Create a header from prepared columns.
    pub fn from_columns(columns: Vec<Column>) -> Self {
        let mut offsets = Vec::with_capacity(columns.len() + 1);
        let mut offset = 0;
        offsets.push(0);
        for column in &columns {
            offset += column.numeric_type.width();
            offsets.push(offset);
        }
        Self { columns, offsets }
    }

    /// Number of columns.
    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Bytes per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.offsets[self.columns.len()]
    }

    /// Byte offset of column `i` within a row; `offset(len())` is the stride.
    ///
    /// # Panics
    ///
    /// Panics if `i > len()`.
    #[inline]
    pub fn offset(&self, i: usize) -> usize {
        self.offsets[i]
    }

    /// Name of column `i`.
    #[inline]
    pub fn name(&self, i: usize) -> &ByteString {
        &self.columns[i].name
    }

    /// Type of column `i`.
    #[inline]
    pub fn numeric_type(&self, i: usize) -> NumericType {
        self.columns[i].numeric_type
    }

    /// All columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Index of the first column called `name`.
    pub fn index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == *name)
    }

    /// Like [`index`](Self::index) but fails with `ColumnNotFound`.
    pub fn require(&self, name: &str) -> Result<usize> {
        self.index(name)
            .ok_or_else(|| SpikeportError::ColumnNotFound(name.to_string()))
    }

    /// True if the columns are exactly `expected`, names and types, in order.
    pub fn matches(&self, expected: &[(&str, NumericType)]) -> bool {
        self.columns.len() == expected.len()
            && self
                .columns
                .iter()
                .zip(expected)
                .all(|(c, (name, ty))| c.name == *name && c.numeric_type == *ty)
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::from_columns(Vec::new())
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]",
            self.columns
                .iter()
                .map(|c| format!("{}:{}", c.name, c.numeric_type))
                .join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets() {
        let header = Header::new([
            ("a", NumericType::Int8),
            ("b", NumericType::Float64),
            ("c", NumericType::UInt16),
        ]);
        assert_eq!(header.len(), 3);
        assert_eq!(header.offset(0), 0);
        assert_eq!(header.offset(1), 1);
        assert_eq!(header.offset(2), 9);
        assert_eq!(header.offset(3), 11);
        assert_eq!(header.stride(), 11);
    }

    #[test]
    fn test_empty_header() {
        let header = Header::new(Vec::<(String, NumericType)>::new());
        assert!(header.is_empty());
        assert_eq!(header.stride(), 0);
        assert_eq!(header.offset(0), 0);
        assert_eq!(Header::default().stride(), 0);
        assert_eq!(Header::default().offset(0), 0);
    }

    #[test]
    fn test_duplicate_names_resolve_to_first() {
        let header = Header::new([("x", NumericType::Int32), ("x", NumericType::Float32)]);
        assert_eq!(header.index("x"), Some(0));
        assert!(matches!(
            header.require("y"),
            Err(SpikeportError::ColumnNotFound(name)) if name == "y"
        ));
    }

    #[test]
    fn test_display() {
        let header = Header::new([("times", NumericType::Float32), ("values", NumericType::Float32)]);
        assert_eq!(header.to_string(), "[times:f32, values:f32]");
    }
}
