//! Block - one framed record of a binnf stream.
//!
//! A block is either a named matrix or a log record. Log severities use the
//! fixed wire ordinals `DEBUG=10`, `INFO=20`, `WARNING=30`, `ERROR=40` and
//! `FATAL=50`.
//!
//! # Examples
//!
//! ```
//! use spikeport::{Block, Header, LogRecord, Matrix, NumericType, Severity};
//!
//! let matrix = Matrix::new(Header::new([("pid", NumericType::Int32)]), 1);
//! let block = Block::matrix("target", matrix);
//! assert_eq!(block.name(), Some("target"));
//!
//! let log = Block::Log(LogRecord::new(0.0, Severity::Warning, "nest", "slow"));
//! assert!(log.as_matrix().is_none());
//! ```

use crate::{ByteString, Matrix, Result, SpikeportError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Log severity with its wire ordinal as discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u32)]
pub enum Severity {
    Debug = 10,
    Info = 20,
    Warning = 30,
    Error = 40,
    Fatal = 50,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Fatal,
    ];

    #[inline]
    pub const fn ordinal(self) -> u32 {
        self as u32
    }

    /// Resolve a wire ordinal.
    pub fn from_ordinal(ordinal: u32) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.ordinal() == ordinal)
            .ok_or(SpikeportError::UnknownSeverity(ordinal))
    }

    pub const fn name(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A log message, either received from a backend or produced locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Seconds since the Unix epoch
    pub time: f64,
    pub severity: Severity,
    pub module: ByteString,
    pub message: ByteString,
}

impl LogRecord {
    pub fn new(
        time: f64,
        severity: Severity,
        module: impl Into<ByteString>,
        message: impl Into<ByteString>,
    ) -> Self {
        Self {
            time,
            severity,
            module: module.into(),
            message: message.into(),
        }
    }

    /// Create a record stamped with the current wall-clock time.
    pub fn now(
        severity: Severity,
        module: impl Into<ByteString>,
        message: impl Into<ByteString>,
    ) -> Self {
        let time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        Self::new(time, severity, module, message)
    }

    /// Re-emit the record as a `tracing` event at the matching level.
    pub fn emit(&self) {
        let module = self.module.to_string_lossy();
        let module: &str = &module;
        let time = self.time;
        match self.severity {
            Severity::Debug => tracing::debug!(module, time, "{}", self.message),
            Severity::Info => tracing::info!(module, time, "{}", self.message),
            Severity::Warning => tracing::warn!(module, time, "{}", self.message),
            Severity::Error => tracing::error!(module, time, "{}", self.message),
            Severity::Fatal => tracing::error!(module, time, fatal = true, "{}", self.message),
        }
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.module, self.message)
    }
}

/// A named matrix; the header is the matrix's own schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixBlock {
    pub name: ByteString,
    pub matrix: Matrix,
}

/// One record on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Matrix(MatrixBlock),
    Log(LogRecord),
}

impl Block {
    /// Create a matrix block.
    pub fn matrix(name: impl Into<ByteString>, matrix: Matrix) -> Self {
        Block::Matrix(MatrixBlock {
            name: name.into(),
            matrix,
        })
    }

    /// Name of a matrix block as text.
    ///
    /// `None` for log blocks and for names that are not valid UTF-8; use
    /// [`raw_name`](Self::raw_name) for the wire bytes.
    pub fn name(&self) -> Option<&str> {
        match self {
            Block::Matrix(m) => m.name.to_str(),
            Block::Log(_) => None,
        }
    }

    /// Name of a matrix block as received; `None` for log blocks.
    pub fn raw_name(&self) -> Option<&ByteString> {
        match self {
            Block::Matrix(m) => Some(&m.name),
            Block::Log(_) => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&MatrixBlock> {
        match self {
            Block::Matrix(m) => Some(m),
            Block::Log(_) => None,
        }
    }

    pub fn as_log(&self) -> Option<&LogRecord> {
        match self {
            Block::Log(l) => Some(l),
            Block::Matrix(_) => None,
        }
    }
}

impl From<MatrixBlock> for Block {
    fn from(m: MatrixBlock) -> Self {
        Block::Matrix(m)
    }
}

impl From<LogRecord> for Block {
    fn from(l: LogRecord) -> Self {
        Block::Log(l)
    }
}
