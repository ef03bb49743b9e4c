//! Spikeport - Host-Side Spiking Neural Network Interchange
//!
//! Spikeport lets you describe a spiking neural network (populations of
//! neurons, their parameters and recorded signals, and projections between
//! them), ship that description to a simulator or neuromorphic backend, and
//! read the results back into the same description.
//!
//! # Key Characteristics
//!
//! - Byte-exact binnf interchange format with resynchronisation on corruption
//! - Row-major matrices of typed columns as the common data model
//! - Deterministic connection instantiation with per-connector seeds
//! - Transformation planning for backends with limited neuron-type support
//!
//! # Architecture
//!
//! The framework is built around several core components:
//!
//! - **Matrix / Header**: typed, row-major cell storage with a column schema
//! - **binnf**: block framing, the block reader and the block writer
//! - **Network**: populations, connection descriptors and run results
//! - **Marshaller**: lowering a network to blocks and folding responses back
//! - **Transformations**: rewriting unsupported neuron types before a run
//!
//! # Examples
//!
//! ## Matrix Blocks on the Wire
//!
//! ```
//! use spikeport::{binnf, Block, Header, Matrix, NumericType};
//!
//! let header = Header::new([("a", NumericType::Int32), ("b", NumericType::Float32)]);
//! let mut matrix = Matrix::new(header, 2);
//! matrix.set(0, 0, 1);
//! matrix.set(0, 1, 1.5f32);
//! matrix.set(1, 0, -2);
//!
//! let bytes = binnf::encode(&Block::matrix("t", matrix.clone())).unwrap();
//! assert_eq!(&bytes[bytes.len() - 4..], &[0xCB, 0x62, 0x00, 0x42]);
//!
//! let (blocks, _) = binnf::decode_all(&bytes);
//! assert_eq!(blocks[0].as_matrix().unwrap().matrix, matrix);
//! ```
//!
//! ## Marshalling a Network
//!
//! ```
//! use spikeport::marshal::{marshal_blocks, MarshalOptions, NeuronTypeMap};
//! use spikeport::{Connector, Network, NeuronType};
//!
//! let mut net = Network::new();
//! let input = net.create_population("input", 8, NeuronType::spike_source_array());
//! let exc = net.create_population("exc", 4, NeuronType::if_cond_exp());
//! net.connect_populations(input, exc, Connector::all_to_all(0.01, 1.0)).unwrap();
//!
//! let blocks = marshal_blocks(&net, &NeuronTypeMap::binnf_default(), &MarshalOptions::default()).unwrap();
//! let names: Vec<_> = blocks.iter().filter_map(|b| b.name()).take(3).collect();
//! assert_eq!(names, vec!["populations", "connections", "target"]);
//! ```
//!
//! # Endianness
//!
//! Matrix buffers always hold little-endian cells, the wire order. Typed
//! accessors convert per cell, so bulk copies between buffers and streams
//! are byte-exact on every host.
//!
//! # Safety
//!
//! Spikeport uses `debug_assert!` for bounds checking in the typed matrix
//! accessors, providing:
//!
//! - Full validation during development and testing
//! - Checked `try_get` / `try_set` variants returning `IndexOutOfBounds`
//! - Memory safety guaranteed by Rust's type system

// Module declarations
pub mod error;
pub mod numeric;
pub mod utils;

// Data model
pub mod block;
pub mod byte_string;
pub mod header;
pub mod matrix;

// Wire format
pub mod binnf;

// Network description
pub mod connector;
pub mod network;
pub mod neuron;
pub mod population;
pub mod synapse;

// Marshalling, transformations and backends
pub mod backend;
pub mod config;
pub mod marshal;
pub mod transformation;

// Re-exports for convenient access
pub use error::{Result, SpikeportError};
pub use numeric::{NumericType, Scalar, Value};

pub use block::{Block, LogRecord, MatrixBlock, Severity};
pub use byte_string::ByteString;
pub use header::{Column, Header};
pub use matrix::{Matrix, TypedColumn, WireCell};

pub use connector::{ConnectionDescriptor, Connector, LocalConnection};
pub use network::Network;
pub use neuron::{NeuronKind, NeuronType};
pub use population::{Population, Runtime, Values};
pub use synapse::{SynapseKind, SynapseModel};

pub use backend::{Backend, BinnfBackend};
pub use config::BackendConfig;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Framework name
pub const NAME: &str = "Spikeport";

/// Get version string
pub fn version() -> String {
    format!("{} v{}", NAME, VERSION)
}
