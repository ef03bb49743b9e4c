//! Length accounting for binnf blocks.
//!
//! All lengths are the byte count a block body occupies between the length
//! field and the end marker, computed as `u64` so that oversized blocks can be
//! detected before they are truncated into the 32-bit field.

use crate::{Block, Header, LogRecord, Matrix};

const U32_LEN: u64 = 4;
const F64_LEN: u64 = 8;

/// Length of a length-prefixed string.
#[inline]
pub fn str_len(s: &[u8]) -> u64 {
    U32_LEN + s.len() as u64
}

/// Length of an encoded header: count plus `(name, ordinal)` per column.
pub fn header_len(header: &Header) -> u64 {
    U32_LEN
        + header
            .columns()
            .iter()
            .map(|c| str_len(c.name.as_bytes()) + U32_LEN)
            .sum::<u64>()
}

/// Length of a matrix block body including the block type field.
pub fn matrix_block_len(name: &[u8], matrix: &Matrix) -> u64 {
    U32_LEN
        + str_len(name)
        + header_len(matrix.header())
        + 2 * U32_LEN
        + (matrix.rows() as u64) * (matrix.stride() as u64)
}

/// Length of a log block body including the block type field.
pub fn log_block_len(log: &LogRecord) -> u64 {
    U32_LEN + F64_LEN + U32_LEN + str_len(log.module.as_bytes()) + str_len(log.message.as_bytes())
}

/// Value of the length field of `block`.
pub fn block_len(block: &Block) -> u64 {
    match block {
        Block::Matrix(m) => matrix_block_len(m.name.as_bytes(), &m.matrix),
        Block::Log(l) => log_block_len(l),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NumericType, Severity};

    #[test]
    fn test_matrix_block_len() {
        // type 4 + name 5 + header (4 + 5+4 + 5+4) + rows/cols 8 + data 2*8
        let header = Header::new([("a", NumericType::Int32), ("b", NumericType::Float32)]);
        let matrix = Matrix::new(header, 2);
        assert_eq!(matrix_block_len(b"t", &matrix), 4 + 5 + 22 + 8 + 16);
    }

    #[test]
    fn test_log_block_len() {
        let log = LogRecord::new(0.0, Severity::Debug, "ab", "");
        assert_eq!(log_block_len(&log), 4 + 8 + 4 + 6 + 4);
    }
}
