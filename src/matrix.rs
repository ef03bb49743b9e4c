//! Matrix - row-major byte buffer with typed columns.
//!
//! A `Matrix` owns a contiguous buffer of `rows × stride` bytes laid out as
//! described by its [`Header`]. Cells are stored in wire byte order
//! (little-endian) so the buffer can be written to or read from a binnf stream
//! as one raw copy on any host; the typed accessors convert per cell.
//!
//! # Bounds checking
//!
//! [`get`](Matrix::get) and [`set`](Matrix::set) check `row` and `col` with
//! `debug_assert!`, so debug builds panic with a descriptive message on
//! out-of-range access. Release builds skip that check; an access outside the
//! buffer still panics through slice indexing, and a row index past `rows()`
//! that lands inside spare capacity cannot occur because the buffer is exactly
//! `rows × stride` bytes long. Use [`try_get`](Matrix::try_get) and
//! [`try_set`](Matrix::try_set) for an `IndexOutOfBounds` error instead of a
//! panic in every build.
//!
//! # Examples
//!
//! ```
//! use spikeport::{Header, Matrix, NumericType};
//!
//! let header = Header::new([("a", NumericType::Int32), ("b", NumericType::Float32)]);
//! let mut matrix = Matrix::new(header, 2);
//! matrix.set(0, 0, 1);
//! matrix.set(0, 1, 1.5);
//! matrix.set(1, 0, -2);
//!
//! assert_eq!(matrix.get::<i32>(1, 0), -2);
//! assert_eq!(matrix.get::<f64>(0, 1), 1.5);
//! assert_eq!(matrix.data().len(), 16);
//! ```

use crate::{Header, NumericType, Result, Scalar, SpikeportError, Value};
use byteorder::{ByteOrder, LittleEndian};

/// Row-major typed matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Matrix {
    header: Header,
    rows: usize,
    data: Vec<u8>,
}

impl Matrix {
    /// Allocate a zero-initialised matrix with `rows` rows.
    pub fn new(header: Header, rows: usize) -> Self {
        let size = rows * header.stride();
        Self {
            header,
            rows,
            data: vec![0; size],
        }
    }

    /// Wrap an existing wire-order buffer.
    ///
    /// # Errors
    ///
    /// Returns `LengthMismatch` if `data.len() != rows × stride`.
    pub fn from_bytes(header: Header, rows: usize, data: Vec<u8>) -> Result<Self> {
        let expected = rows * header.stride();
        if data.len() != expected {
            return Err(SpikeportError::LengthMismatch {
                declared: expected.min(u32::MAX as usize) as u32,
                actual: data.len() as u64,
            });
        }
        Ok(Self { header, rows, data })
    }

    /// Build a matrix from rows of values; each value is converted to the
    /// type of its column.
    pub fn from_rows<T: Scalar>(header: Header, rows: &[Vec<T>]) -> Result<Self> {
        let mut matrix = Matrix::new(header, rows.len());
        for (r, row) in rows.iter().enumerate() {
            if row.len() != matrix.cols() {
                return Err(SpikeportError::IndexOutOfBounds {
                    index: row.len(),
                    length: matrix.cols(),
                });
            }
            for (c, &v) in row.iter().enumerate() {
                matrix.set(r, c, v);
            }
        }
        Ok(matrix)
    }

    /// Column schema.
    #[inline]
    pub fn header(&self) -> &Header {
        &self.header
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.header.len()
    }

    /// Bytes per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.header.stride()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Resize to `rows` rows. All cells are reset to zero.
    pub fn resize(&mut self, rows: usize) {
        self.rows = rows;
        self.data.clear();
        self.data.resize(rows * self.header.stride(), 0);
    }

    /// Raw wire-order bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw wire-order bytes.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the matrix and return its parts.
    pub fn into_parts(self) -> (Header, usize, Vec<u8>) {
        (self.header, self.rows, self.data)
    }

    /// Raw bytes of a single row.
    pub fn row_bytes(&self, row: usize) -> &[u8] {
        debug_assert!(row < self.rows, "row {} out of bounds (rows: {})", row, self.rows);
        let stride = self.stride();
        &self.data[row * stride..(row + 1) * stride]
    }

    #[inline]
    fn cell_range(&self, row: usize, col: usize) -> std::ops::Range<usize> {
        let start = row * self.header.stride() + self.header.offset(col);
        start..start + self.header.numeric_type(col).width()
    }

    /// Read a cell as its tagged value.
    #[inline]
    pub fn value(&self, row: usize, col: usize) -> Value {
        debug_assert!(row < self.rows, "row {} out of bounds (rows: {})", row, self.rows);
        debug_assert!(col < self.cols(), "col {} out of bounds (cols: {})", col, self.cols());
        let range = self.cell_range(row, col);
        Value::decode(self.header.numeric_type(col), &self.data[range])
    }

    /// Write a tagged value, converting it to the column type.
    #[inline]
    pub fn set_value(&mut self, row: usize, col: usize, value: Value) {
        let ty = self.header.numeric_type(col);
        match ty {
            NumericType::Int8 => self.set(row, col, value.cast::<i8>()),
            NumericType::UInt8 => self.set(row, col, value.cast::<u8>()),
            NumericType::Int16 => self.set(row, col, value.cast::<i16>()),
            NumericType::UInt16 => self.set(row, col, value.cast::<u16>()),
            NumericType::Int32 => self.set(row, col, value.cast::<i32>()),
            NumericType::UInt32 => self.set(row, col, value.cast::<u32>()),
            NumericType::Float32 => self.set(row, col, value.cast::<f32>()),
            NumericType::Int64 => self.set(row, col, value.cast::<i64>()),
            NumericType::Float64 => self.set(row, col, value.cast::<f64>()),
        }
    }

    /// Read cell `(row, col)` converted to `T`.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `row >= rows()` or `col >= cols()`.
    #[inline]
    pub fn get<T: Scalar>(&self, row: usize, col: usize) -> T {
        T::from_value(self.value(row, col))
    }

    /// Write `v` into cell `(row, col)` converted to the column type.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `row >= rows()` or `col >= cols()`.
    #[inline]
    pub fn set<T: Scalar>(&mut self, row: usize, col: usize, v: T) {
        debug_assert!(row < self.rows, "row {} out of bounds (rows: {})", row, self.rows);
        debug_assert!(col < self.cols(), "col {} out of bounds (cols: {})", col, self.cols());
        let ty = self.header.numeric_type(col);
        let range = self.cell_range(row, col);
        v.to_value(ty).encode(&mut self.data[range]);
    }

    fn check_index(&self, row: usize, col: usize) -> Result<()> {
        if row >= self.rows {
            return Err(SpikeportError::IndexOutOfBounds {
                index: row,
                length: self.rows,
            });
        }
        if col >= self.cols() {
            return Err(SpikeportError::IndexOutOfBounds {
                index: col,
                length: self.cols(),
            });
        }
        Ok(())
    }

    /// Checked variant of [`get`](Self::get).
    pub fn try_get<T: Scalar>(&self, row: usize, col: usize) -> Result<T> {
        self.check_index(row, col)?;
        Ok(self.get(row, col))
    }

    /// Checked variant of [`set`](Self::set).
    pub fn try_set<T: Scalar>(&mut self, row: usize, col: usize, v: T) -> Result<()> {
        self.check_index(row, col)?;
        self.set(row, col, v);
        Ok(())
    }

    /// Append a row of values, converting each to its column type.
    pub fn push_row(&mut self, values: &[Value]) -> Result<()> {
        if values.len() != self.cols() {
            return Err(SpikeportError::IndexOutOfBounds {
                index: values.len(),
                length: self.cols(),
            });
        }
        self.rows += 1;
        self.data.resize(self.rows * self.stride(), 0);
        let row = self.rows - 1;
        for (col, &value) in values.iter().enumerate() {
            self.set_value(row, col, value);
        }
        Ok(())
    }

    /// Copy a column out, converting every cell to `T`.
    pub fn column<T: Scalar>(&self, col: usize) -> Vec<T> {
        (0..self.rows).map(|row| self.get(row, col)).collect()
    }

    /// Typed view over a column whose declared type is exactly `T`.
    ///
    /// Skips the per-cell type dispatch of [`get`](Self::get).
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` for a bad column and `ColumnTypeMismatch`
    /// if the column is not of type `T`.
    pub fn typed_column<T: WireCell>(&self, col: usize) -> Result<TypedColumn<'_, T>> {
        if col >= self.cols() {
            return Err(SpikeportError::IndexOutOfBounds {
                index: col,
                length: self.cols(),
            });
        }
        let ty = self.header.numeric_type(col);
        if ty != T::NUMERIC_TYPE {
            return Err(SpikeportError::ColumnTypeMismatch {
                column: col,
                actual: ty.name(),
                requested: T::NUMERIC_TYPE.name(),
            });
        }
        Ok(TypedColumn {
            data: &self.data,
            offset: self.header.offset(col),
            stride: self.stride(),
            row: 0,
            rows: self.rows,
            _marker: std::marker::PhantomData,
        })
    }
}

/// Iterator over one column of a matrix with a statically known type.
pub struct TypedColumn<'a, T> {
    data: &'a [u8],
    offset: usize,
    stride: usize,
    row: usize,
    rows: usize,
    _marker: std::marker::PhantomData<T>,
}

/// Per-type little-endian cell reads used by [`TypedColumn`].
pub trait WireCell: Scalar {
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_wire_cell {
    ($($t:ty => $read:expr),* $(,)?) => {
        $(
            impl WireCell for $t {
                #[inline(always)]
                fn read_le(bytes: &[u8]) -> Self {
                    $read(bytes)
                }
            }
        )*
    };
}

impl_wire_cell!(
    i8 => |b: &[u8]| b[0] as i8,
    u8 => |b: &[u8]| b[0],
    i16 => LittleEndian::read_i16,
    u16 => LittleEndian::read_u16,
    i32 => LittleEndian::read_i32,
    u32 => LittleEndian::read_u32,
    f32 => LittleEndian::read_f32,
    i64 => LittleEndian::read_i64,
    f64 => LittleEndian::read_f64,
);

impl<'a, T: WireCell> Iterator for TypedColumn<'a, T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        if self.row >= self.rows {
            return None;
        }
        let start = self.row * self.stride + self.offset;
        self.row += 1;
        Some(T::read_le(&self.data[start..]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.rows - self.row;
        (n, Some(n))
    }
}

impl<'a, T: WireCell> ExactSizeIterator for TypedColumn<'a, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> Header {
        Header::new([
            ("i", NumericType::Int16),
            ("f", NumericType::Float64),
            ("u", NumericType::UInt8),
        ])
    }

    #[test]
    fn test_new_zeroed() {
        let matrix = Matrix::new(sample_header(), 3);
        assert_eq!(matrix.rows(), 3);
        assert_eq!(matrix.cols(), 3);
        assert_eq!(matrix.stride(), 11);
        assert!(matrix.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_set_get_conversion() {
        let mut matrix = Matrix::new(sample_header(), 2);
        matrix.set(0, 0, 2.7f32);
        matrix.set(0, 1, 3i32);
        matrix.set(1, 2, 511i32);
        assert_eq!(matrix.get::<i16>(0, 0), 2);
        assert_eq!(matrix.get::<f64>(0, 1), 3.0);
        assert_eq!(matrix.get::<u8>(1, 2), 255);
        assert_eq!(matrix.value(0, 1), Value::Float64(3.0));
    }

    #[test]
    fn test_cells_are_little_endian() {
        let header = Header::new([("x", NumericType::UInt32)]);
        let mut matrix = Matrix::new(header, 1);
        matrix.set(0, 0, 0xA1B2C3D4u32);
        assert_eq!(matrix.data(), &[0xD4, 0xC3, 0xB2, 0xA1]);
    }

    #[test]
    fn test_try_access() {
        let mut matrix = Matrix::new(sample_header(), 1);
        assert!(matches!(
            matrix.try_get::<i32>(1, 0),
            Err(SpikeportError::IndexOutOfBounds { index: 1, length: 1 })
        ));
        assert!(matches!(
            matrix.try_set(0, 3, 1i32),
            Err(SpikeportError::IndexOutOfBounds { index: 3, length: 3 })
        ));
        matrix.try_set(0, 1, 0.25f64).unwrap();
        assert_eq!(matrix.try_get::<f64>(0, 1).unwrap(), 0.25);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "out of bounds")]
    fn test_get_out_of_bounds_panics_in_debug() {
        let matrix = Matrix::new(sample_header(), 1);
        let _ = matrix.get::<i32>(0, 5);
    }

    #[test]
    fn test_resize_discards_data() {
        let mut matrix = Matrix::new(sample_header(), 1);
        matrix.set(0, 0, 5i32);
        matrix.resize(4);
        assert_eq!(matrix.rows(), 4);
        assert_eq!(matrix.data().len(), 44);
        assert_eq!(matrix.get::<i32>(0, 0), 0);
    }

    #[test]
    fn test_push_row_and_column() {
        let header = Header::new([("times", NumericType::Float32)]);
        let mut matrix = Matrix::new(header, 0);
        for t in [0.5, 1.0, 2.5] {
            matrix.push_row(&[Value::Float64(t)]).unwrap();
        }
        assert_eq!(matrix.column::<f32>(0), vec![0.5, 1.0, 2.5]);
        let typed: Vec<f32> = matrix.typed_column::<f32>(0).unwrap().collect();
        assert_eq!(typed, vec![0.5, 1.0, 2.5]);
        assert!(matches!(
            matrix.typed_column::<i32>(0),
            Err(SpikeportError::ColumnTypeMismatch { column: 0, .. })
        ));
    }

    #[test]
    fn test_from_bytes_validates_size() {
        let header = Header::new([("x", NumericType::Int32)]);
        assert!(Matrix::from_bytes(header.clone(), 2, vec![0; 8]).is_ok());
        assert!(matches!(
            Matrix::from_bytes(header, 2, vec![0; 7]),
            Err(SpikeportError::LengthMismatch { .. })
        ));
    }
}
