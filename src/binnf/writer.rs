//! Block serialisation.

use super::layout::{log_block_len, matrix_block_len};
use super::{BLOCK_TYPE_LOG, BLOCK_TYPE_MATRIX, END_MARKER, MAX_STRING_LEN, START_MARKER};
use crate::{Block, LogRecord, Matrix, Result, SpikeportError};
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;

fn check_str(s: &[u8]) -> Result<()> {
    if s.len() > MAX_STRING_LEN {
        return Err(SpikeportError::OversizedString {
            length: s.len(),
            limit: MAX_STRING_LEN,
        });
    }
    Ok(())
}

fn check_len(len: u64) -> Result<u32> {
    u32::try_from(len).map_err(|_| SpikeportError::BlockTooLarge(len))
}

/// Writes binnf blocks to an underlying byte sink.
///
/// Every block is validated before its first byte is written, so a failed
/// write never leaves a partial block in the sink.
pub struct BlockWriter<W: Write> {
    inner: W,
    blocks_written: usize,
}

impl<W: Write> BlockWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            blocks_written: 0,
        }
    }

    /// Number of blocks written so far.
    pub fn blocks_written(&self) -> usize {
        self.blocks_written
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn write_block(&mut self, block: &Block) -> Result<()> {
        match block {
            Block::Matrix(m) => self.write_matrix(&m.name, &m.matrix),
            Block::Log(l) => self.write_log(l),
        }
    }

    /// Write a named matrix block. `name` is written as raw bytes.
    ///
    /// # Errors
    ///
    /// Fails with `OversizedString` if the block name or a column name is
    /// longer than 1024 bytes, and with `BlockTooLarge` if the body does not
    /// fit into the 32-bit length field.
    pub fn write_matrix(&mut self, name: impl AsRef<[u8]>, matrix: &Matrix) -> Result<()> {
        let name = name.as_ref();
        check_str(name)?;
        for column in matrix.header().columns() {
            check_str(column.name.as_bytes())?;
        }
        let len = check_len(matrix_block_len(name, matrix))?;
        let rows = u32::try_from(matrix.rows())
            .map_err(|_| SpikeportError::BlockTooLarge(matrix.rows() as u64))?;

        let w = &mut self.inner;
        w.write_u32::<LittleEndian>(START_MARKER)?;
        w.write_u32::<LittleEndian>(len)?;
        w.write_u32::<LittleEndian>(BLOCK_TYPE_MATRIX)?;
        write_str(w, name)?;
        w.write_u32::<LittleEndian>(matrix.cols() as u32)?;
        for column in matrix.header().columns() {
            write_str(w, column.name.as_bytes())?;
            w.write_u32::<LittleEndian>(column.numeric_type.ordinal())?;
        }
        w.write_u32::<LittleEndian>(rows)?;
        w.write_u32::<LittleEndian>(matrix.cols() as u32)?;
        // cells are stored in wire order already
        w.write_all(matrix.data())?;
        w.write_u32::<LittleEndian>(END_MARKER)?;

        self.blocks_written += 1;
        Ok(())
    }

    /// Write a log block.
    pub fn write_log(&mut self, log: &LogRecord) -> Result<()> {
        check_str(log.module.as_bytes())?;
        check_str(log.message.as_bytes())?;
        let len = check_len(log_block_len(log))?;

        let w = &mut self.inner;
        w.write_u32::<LittleEndian>(START_MARKER)?;
        w.write_u32::<LittleEndian>(len)?;
        w.write_u32::<LittleEndian>(BLOCK_TYPE_LOG)?;
        w.write_f64::<LittleEndian>(log.time)?;
        w.write_u32::<LittleEndian>(log.severity.ordinal())?;
        write_str(w, log.module.as_bytes())?;
        write_str(w, log.message.as_bytes())?;
        w.write_u32::<LittleEndian>(END_MARKER)?;

        self.blocks_written += 1;
        Ok(())
    }
}

fn write_str<W: Write>(w: &mut W, s: &[u8]) -> Result<()> {
    w.write_u32::<LittleEndian>(s.len() as u32)?;
    w.write_all(s)?;
    Ok(())
}
