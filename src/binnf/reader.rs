//! Block deserialisation with resynchronisation.

use super::sync::sync_to;
use super::{BLOCK_TYPE_LOG, BLOCK_TYPE_MATRIX, END_MARKER, MAX_STRING_LEN, START_MARKER};
use crate::{
    Block, ByteString, Column, Header, LogRecord, Matrix, NumericType, Result, Severity,
    SpikeportError,
};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, ErrorKind, Read};
use tracing::{debug, warn};

fn map_eof(e: io::Error, context: &'static str) -> SpikeportError {
    if e.kind() == ErrorKind::UnexpectedEof {
        SpikeportError::UnexpectedEof { context }
    } else {
        SpikeportError::Io(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Searching for the next start marker
    Seek,
    /// Positioned directly after a start marker
    Synced,
    Done,
}

/// Lazy iterator over the blocks of a binnf stream.
///
/// Yields `Ok(block)` for every intact block. A corrupt block is yielded once
/// as a recoverable `Err` (see [`SpikeportError::is_recoverable`]) and the
/// reader then resynchronises on the next start marker. Bytes between two
/// blocks are reported as a single `SkippedBytes` diagnostic; bytes before the
/// first block and the remainder of a corrupt block are dropped silently. An
/// I/O error other than end-of-stream ends the iteration.
///
/// The reader pulls single bytes while searching for a marker; wrap
/// unbuffered sources such as files or pipes in a `BufReader`.
pub struct BlockReader<R: Read> {
    inner: R,
    state: State,
    started: bool,
    recovering: bool,
    blocks_read: usize,
}

impl<R: Read> BlockReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            state: State::Seek,
            started: false,
            recovering: false,
            blocks_read: 0,
        }
    }

    /// Number of blocks decoded successfully.
    pub fn blocks_read(&self) -> usize {
        self.blocks_read
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Read one block; the start marker has already been consumed.
    fn read_block(&mut self) -> Result<Block> {
        let declared = self
            .inner
            .read_u32::<LittleEndian>()
            .map_err(|e| map_eof(e, "block length"))?;

        let mut body = Body {
            inner: &mut self.inner,
            declared,
            consumed: 0,
        };
        let block = match body.read_u32("block type")? {
            BLOCK_TYPE_MATRIX => body.read_matrix()?,
            BLOCK_TYPE_LOG => body.read_log()?,
            other => return Err(SpikeportError::UnknownBlockType(other)),
        };
        if body.consumed != u64::from(declared) {
            return Err(SpikeportError::LengthMismatch {
                declared,
                actual: body.consumed,
            });
        }

        let end = self
            .inner
            .read_u32::<LittleEndian>()
            .map_err(|e| map_eof(e, "end marker"))?;
        if end != END_MARKER {
            return Err(SpikeportError::EndMarkerMismatch { found: end });
        }
        Ok(block)
    }
}

impl<R: Read> Iterator for BlockReader<R> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                State::Done => return None,
                State::Seek => match sync_to(&mut self.inner, START_MARKER) {
                    Err(e) => {
                        self.state = State::Done;
                        return Some(Err(e.into()));
                    }
                    Ok(None) => {
                        self.state = State::Done;
                        return None;
                    }
                    Ok(Some(skipped)) => {
                        self.state = State::Synced;
                        let report = skipped > 0 && self.started && !self.recovering;
                        if skipped > 0 && !report {
                            debug!(skipped, "discarded bytes before start marker");
                        }
                        self.started = true;
                        self.recovering = false;
                        if report {
                            warn!(skipped, "skipped bytes between binnf blocks");
                            return Some(Err(SpikeportError::SkippedBytes { count: skipped }));
                        }
                    }
                },
                State::Synced => {
                    self.state = State::Seek;
                    return match self.read_block() {
                        Ok(block) => {
                            self.blocks_read += 1;
                            Some(Ok(block))
                        }
                        Err(e) if e.is_recoverable() => {
                            warn!(error = %e, "skipping corrupt binnf block");
                            self.recovering = true;
                            Some(Err(e))
                        }
                        Err(e) => {
                            self.state = State::Done;
                            Some(Err(e))
                        }
                    };
                }
            }
        }
    }
}

/// Reads a block body, never past the declared length.
struct Body<'a, R: Read> {
    inner: &'a mut R,
    declared: u32,
    consumed: u64,
}

impl<'a, R: Read> Body<'a, R> {
    /// Account for `n` more bytes, failing if they exceed the declared length.
    fn take(&mut self, n: u64) -> Result<()> {
        let next = self.consumed + n;
        if next > u64::from(self.declared) {
            return Err(SpikeportError::LengthMismatch {
                declared: self.declared,
                actual: next,
            });
        }
        self.consumed = next;
        Ok(())
    }

    fn read_u32(&mut self, context: &'static str) -> Result<u32> {
        self.take(4)?;
        self.inner
            .read_u32::<LittleEndian>()
            .map_err(|e| map_eof(e, context))
    }

    fn read_f64(&mut self, context: &'static str) -> Result<f64> {
        self.take(8)?;
        self.inner
            .read_f64::<LittleEndian>()
            .map_err(|e| map_eof(e, context))
    }

    fn read_bytes(&mut self, n: u64, context: &'static str) -> Result<Vec<u8>> {
        self.take(n)?;
        let mut buf = vec![0u8; n as usize];
        self.inner
            .read_exact(&mut buf)
            .map_err(|e| map_eof(e, context))?;
        Ok(buf)
    }

    /// Length-prefixed string, kept as raw bytes.
    fn read_str(&mut self, context: &'static str) -> Result<ByteString> {
        let len = self.read_u32(context)? as usize;
        if len > MAX_STRING_LEN {
            return Err(SpikeportError::OversizedString {
                length: len,
                limit: MAX_STRING_LEN,
            });
        }
        Ok(ByteString::from(self.read_bytes(len as u64, context)?))
    }

    fn read_matrix(&mut self) -> Result<Block> {
        let name = self.read_str("block name")?;
        let count = self.read_u32("header count")?;

        // each column takes at least eight bytes
        let remaining = u64::from(self.declared) - self.consumed;
        let mut columns = Vec::with_capacity((count as u64).min(remaining / 8) as usize);
        for _ in 0..count {
            let column = self.read_str("column name")?;
            let ordinal = self.read_u32("column type")?;
            columns.push(Column::new(column, NumericType::from_ordinal(ordinal)?));
        }

        let rows = self.read_u32("row count")?;
        let cols = self.read_u32("column count")?;
        if cols != count {
            return Err(SpikeportError::ColumnCountMismatch { cols, header: count });
        }

        let header = Header::from_columns(columns);
        let size = u64::from(rows) * header.stride() as u64;
        let data = self.read_bytes(size, "matrix data")?;
        let matrix = Matrix::from_bytes(header, rows as usize, data)?;
        Ok(Block::matrix(name, matrix))
    }

    fn read_log(&mut self) -> Result<Block> {
        let time = self.read_f64("log time")?;
        let severity = Severity::from_ordinal(self.read_u32("log severity")?)?;
        let module = self.read_str("log module")?;
        let message = self.read_str("log message")?;
        Ok(Block::Log(LogRecord {
            time,
            severity,
            module,
            message,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binnf::encode;

    fn target_block(pid: i32) -> Block {
        let mut m = Matrix::new(
            Header::new([("pid", NumericType::Int32), ("nid", NumericType::Int32)]),
            1,
        );
        m.set(0, 0, pid);
        Block::matrix("target", m)
    }

    fn collect(bytes: &[u8]) -> Vec<Result<Block>> {
        BlockReader::new(bytes).collect()
    }

    #[test]
    fn test_empty_stream() {
        assert!(collect(&[]).is_empty());
    }

    #[test]
    fn test_truncated_block() {
        let bytes = encode(&target_block(1)).unwrap();
        let items = collect(&bytes[..bytes.len() - 6]);
        assert_eq!(items.len(), 1);
        assert!(matches!(
            items[0],
            Err(SpikeportError::UnexpectedEof { context: "matrix data" })
        ));
    }

    #[test]
    fn test_unknown_block_type() {
        let mut bytes = encode(&target_block(1)).unwrap();
        bytes[8] = 9;
        bytes.extend(encode(&target_block(2)).unwrap());
        let items = collect(&bytes);
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], Err(SpikeportError::UnknownBlockType(9))));
        assert_eq!(items[1].as_ref().unwrap(), &target_block(2));
    }

    #[test]
    fn test_length_mismatch_is_detected() {
        let mut bytes = encode(&target_block(1)).unwrap();
        bytes[4] += 1;
        let items = collect(&bytes);
        assert!(matches!(
            items[0],
            Err(SpikeportError::LengthMismatch { actual, declared }) if u64::from(declared) == actual + 1
        ));
    }

    #[test]
    fn test_column_count_mismatch() {
        let mut bytes = encode(&target_block(1)).unwrap();
        // cols field sits right before the 8 data bytes and the end marker
        let cols_at = bytes.len() - 4 - 8 - 4;
        bytes[cols_at] = 3;
        let items = collect(&bytes);
        assert!(matches!(
            items[0],
            Err(SpikeportError::ColumnCountMismatch { cols: 3, header: 2 })
        ));
    }

    #[test]
    fn test_skipped_bytes_between_blocks() {
        let mut bytes = vec![1, 2, 3];
        bytes.extend(encode(&target_block(1)).unwrap());
        bytes.extend([0xFF, 0xFE]);
        bytes.extend(encode(&target_block(2)).unwrap());
        let mut reader = BlockReader::new(&bytes[..]);
        assert_eq!(reader.next().unwrap().unwrap(), target_block(1));
        assert!(matches!(
            reader.next().unwrap(),
            Err(SpikeportError::SkippedBytes { count: 2 })
        ));
        assert_eq!(reader.next().unwrap().unwrap(), target_block(2));
        assert!(reader.next().is_none());
        assert_eq!(reader.blocks_read(), 2);
    }
}
