//! Error types for the Spikeport framework.
//!
//! This module provides a unified error type for all operations in the
//! crate, using the `thiserror` crate for ergonomic error handling. Variants
//! are grouped by the component that raises them: the binnf codec, the
//! matrix/header layer, the marshaller, connection instantiation, and the
//! transformation planner.

use thiserror::Error;

/// The main error type for Spikeport operations.
#[derive(Error, Debug)]
pub enum SpikeportError {
    // =========================================================================
    // Codec
    // =========================================================================
    /// A string exceeds the binnf length cap of 1024 bytes
    #[error("String of {length} bytes exceeds the binnf limit of {limit} bytes")]
    OversizedString {
        /// Length of the offending string
        length: usize,
        /// Maximum permitted length
        limit: usize,
    },

    /// The stream ended in the middle of a block
    #[error("Unexpected end of stream while reading {context}")]
    UnexpectedEof {
        /// What was being read
        context: &'static str,
    },

    /// The body size does not match the declared block length
    #[error("Block length mismatch: declared {declared} bytes, body needs {actual}")]
    LengthMismatch {
        /// Length field value
        declared: u32,
        /// Bytes the body consumed (or would have consumed)
        actual: u64,
    },

    /// The block was not terminated by the end marker
    #[error("Expected block end marker 0x420062CB, found {found:#010X}")]
    EndMarkerMismatch {
        /// The value read instead
        found: u32,
    },

    /// The block type field carries an unknown code
    #[error("Unknown block type {0}")]
    UnknownBlockType(u32),

    /// A column header carries an unknown numeric type ordinal
    #[error("Unknown numeric type ordinal {0}")]
    UnknownNumericType(u32),

    /// A log block carries an unknown severity ordinal
    #[error("Unknown log severity {0}")]
    UnknownSeverity(u32),

    /// The `cols` field of a matrix block disagrees with its header
    #[error("Matrix declares {cols} columns but its header has {header}")]
    ColumnCountMismatch {
        /// Column count field
        cols: u32,
        /// Header entry count
        header: u32,
    },

    /// Bytes were discarded while searching for the next start marker
    #[error("Skipped {count} bytes while resynchronising to the next block")]
    SkippedBytes {
        /// Number of discarded bytes
        count: u64,
    },

    /// A block does not fit into the 32-bit length field
    #[error("Block of {0} bytes does not fit into a binnf length field")]
    BlockTooLarge(u64),

    // =========================================================================
    // Matrix / Header
    // =========================================================================
    /// Index out of bounds
    #[error("Index out of bounds: index {index}, length {length}")]
    IndexOutOfBounds {
        /// The index that was accessed
        index: usize,
        /// The valid length
        length: usize,
    },

    /// No column with the given name exists
    #[error("Column \"{0}\" not found")]
    ColumnNotFound(String),

    /// A column type cannot be used for the requested operation
    #[error("Unknown column type for column \"{0}\"")]
    UnknownColumnType(String),

    /// A typed view was requested with the wrong element type
    #[error("Column {column} holds {actual}, requested {requested}")]
    ColumnTypeMismatch {
        /// Column index
        column: usize,
        /// Declared column type
        actual: &'static str,
        /// Requested element type
        requested: &'static str,
    },

    // =========================================================================
    // Marshaller
    // =========================================================================
    /// The backend has no wire ordinal for this neuron type
    #[error("Neuron type \"{0}\" not supported by the backend")]
    UnsupportedNeuronType(String),

    /// Per-neuron values were required but the storage is uniform
    #[error("Values are stored uniformly; expand them to per-neuron storage first")]
    HeterogeneousRequiresExpansion,

    /// A `target` block references a neuron that does not exist
    #[error("Invalid target neuron pid={pid} nid={nid}")]
    InvalidTarget {
        /// Population index
        pid: i64,
        /// Neuron index
        nid: i64,
    },

    /// A signal block arrived without a preceding `target` block
    #[error("Block \"{0}\" requires a preceding target block")]
    TargetRequired(String),

    /// A response block does not have the expected column layout
    #[error("Malformed columns in block \"{block}\": {reason}")]
    MalformedColumns {
        /// Block name
        block: String,
        /// What is wrong
        reason: String,
    },

    // =========================================================================
    // Connection instantiation
    // =========================================================================
    /// One-to-one connector over ranges of different size
    #[error("Size mismatch: source range has {src} neurons, target range has {tar}")]
    SizeMismatch {
        /// Source range size
        src: usize,
        /// Target range size
        tar: usize,
    },

    /// Fixed fan-in/out larger than the range it draws from
    #[error("Requested {requested} distinct neurons from a range of {available}")]
    FanInExceedsSource {
        /// Requested count
        requested: usize,
        /// Range size
        available: usize,
    },

    /// A random connector without seed was used in a byte-stable marshalling
    #[error("Connection {0} uses a random connector without seed")]
    NonDeterministicConnectorUsed(usize),

    /// The connection descriptor is invalid for the network
    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    // =========================================================================
    // Network / Transformations
    // =========================================================================
    /// No population with this index
    #[error("Population {0} not found")]
    PopulationNotFound(usize),

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// No chain of transformations leads to a supported neuron type
    #[error("No transformation path from neuron type \"{0}\" to a supported type")]
    NoTransformationPath(String),

    /// A transformation could not be applied
    #[error("Transformation {id} failed: {reason}")]
    TransformationFailed {
        /// Transformation identifier
        id: String,
        /// Failure description
        reason: String,
    },

    // =========================================================================
    // External
    // =========================================================================
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error occurred
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Serialization error occurred
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

impl SpikeportError {
    /// Whether the block reader resynchronises after this error.
    ///
    /// Recoverable errors describe a single corrupt block; the stream stays
    /// usable and the next block can still be decoded.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SpikeportError::OversizedString { .. }
                | SpikeportError::UnexpectedEof { .. }
                | SpikeportError::LengthMismatch { .. }
                | SpikeportError::EndMarkerMismatch { .. }
                | SpikeportError::UnknownBlockType(_)
                | SpikeportError::UnknownNumericType(_)
                | SpikeportError::UnknownSeverity(_)
                | SpikeportError::ColumnCountMismatch { .. }
                | SpikeportError::SkippedBytes { .. }
        )
    }
}

/// A specialized `Result` type for Spikeport operations.
pub type Result<T> = std::result::Result<T, SpikeportError>;
