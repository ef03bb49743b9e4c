//! binnf - the binary network interchange format.
//!
//! A binnf stream is a plain concatenation of blocks. Every block is framed by
//! a start marker, a length field, and an end marker:
//!
//! ```text
//! u32 start marker  0x665A8CDA
//! u32 length        bytes from after this field up to the end marker
//! u32 block type    1 = matrix, 2 = log
//! ... body
//! u32 end marker    0x420062CB
//! ```
//!
//! Matrix body: name, header count, `(name, type ordinal)` per column, rows,
//! cols, row-major data. Log body: `f64` time, `u32` severity, module,
//! message. Strings are a `u32` byte count followed by raw bytes, at most
//! [`MAX_STRING_LEN`] long. All primitives are little-endian.
//!
//! [`BlockWriter`] computes the length field up-front and never seeks.
//! [`BlockReader`] resynchronises on the start marker after a corrupt block,
//! so damaged blocks are reported and skipped rather than ending the stream.
//!
//! # Examples
//!
//! ```
//! use spikeport::binnf;
//! use spikeport::{Block, Header, Matrix, NumericType};
//!
//! let mut matrix = Matrix::new(Header::new([("a", NumericType::Int32)]), 1);
//! matrix.set(0, 0, 7);
//! let block = Block::matrix("t", matrix);
//!
//! let bytes = binnf::encode(&block).unwrap();
//! assert_eq!(&bytes[..4], &[0xDA, 0x8C, 0x5A, 0x66]);
//!
//! let (blocks, diagnostics) = binnf::decode_all(&bytes);
//! assert_eq!(blocks, vec![block]);
//! assert!(diagnostics.is_empty());
//! ```

mod layout;
mod reader;
mod sync;
mod writer;

pub use layout::{block_len, header_len, log_block_len, matrix_block_len, str_len};
pub use reader::BlockReader;
pub use sync::sync_to;
pub use writer::BlockWriter;

use crate::{Block, Result, SpikeportError};

/// Marker opening every block.
pub const START_MARKER: u32 = 0x665A_8CDA;

/// Marker closing every block.
pub const END_MARKER: u32 = 0x4200_62CB;

/// Block type code of a matrix block.
pub const BLOCK_TYPE_MATRIX: u32 = 1;

/// Block type code of a log block.
pub const BLOCK_TYPE_LOG: u32 = 2;

/// Maximum length of any string on the wire, in bytes.
pub const MAX_STRING_LEN: usize = 1024;

/// Encode a single block.
pub fn encode(block: &Block) -> Result<Vec<u8>> {
    let mut writer = BlockWriter::new(Vec::with_capacity(block_len(block) as usize + 12));
    writer.write_block(block)?;
    Ok(writer.into_inner())
}

/// Encode a sequence of blocks into one stream.
pub fn encode_all<'a, I>(blocks: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a Block>,
{
    let mut writer = BlockWriter::new(Vec::new());
    for block in blocks {
        writer.write_block(block)?;
    }
    Ok(writer.into_inner())
}

/// Decode every block of an in-memory stream.
///
/// Returns the decoded blocks together with the diagnostics raised for
/// skipped or corrupt blocks.
pub fn decode_all(bytes: &[u8]) -> (Vec<Block>, Vec<SpikeportError>) {
    let mut blocks = Vec::new();
    let mut diagnostics = Vec::new();
    for item in BlockReader::new(bytes) {
        match item {
            Ok(block) => blocks.push(block),
            Err(e) => diagnostics.push(e),
        }
    }
    (blocks, diagnostics)
}

/// Re-encode every decodable block of a stream.
///
/// Corrupt blocks are dropped. This mirrors a backend that echoes the network
/// description, which makes it useful for end-to-end protocol tests.
pub fn loopback(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut writer = BlockWriter::new(Vec::with_capacity(bytes.len()));
    for item in BlockReader::new(bytes) {
        match item {
            Ok(block) => writer.write_block(&block)?,
            Err(e) if e.is_recoverable() => {
                tracing::debug!(error = %e, "loopback dropped a corrupt block");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(writer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Header, LogRecord, Matrix, NumericType, Severity};

    fn sample_blocks() -> Vec<Block> {
        let mut matrix = Matrix::new(
            Header::new([("pid", NumericType::Int32), ("w", NumericType::Float64)]),
            2,
        );
        matrix.set(0, 0, 3);
        matrix.set(1, 1, -0.5);
        vec![
            Block::matrix("params", matrix),
            Block::Log(LogRecord::new(12.5, Severity::Info, "sim", "done")),
        ]
    }

    #[test]
    fn test_encode_all_decode_all() {
        let blocks = sample_blocks();
        let bytes = encode_all(&blocks).unwrap();
        let (decoded, diagnostics) = decode_all(&bytes);
        assert_eq!(decoded, blocks);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_loopback_is_identity_on_clean_stream() {
        let bytes = encode_all(&sample_blocks()).unwrap();
        assert_eq!(loopback(&bytes).unwrap(), bytes);
    }

    #[test]
    fn test_loopback_drops_corrupt_block() {
        let blocks = sample_blocks();
        let mut bytes = encode(&blocks[0]).unwrap();
        let end = bytes.len() - 1;
        bytes[end] ^= 0xFF;
        bytes.extend(encode(&blocks[1]).unwrap());
        let echoed = loopback(&bytes).unwrap();
        assert_eq!(echoed, encode(&blocks[1]).unwrap());
    }
}
