//! Marshalling between a [`Network`](crate::Network) and binnf blocks.
//!
//! The forward path lowers a network to a canonical block sequence:
//!
//! 1. `populations`: one row per population (`count`, `type`, `record_<signal>`)
//! 2. `connections`: one row per instantiated synapse
//! 3. per population either a `parameters` block, or one `target` /
//!    `spike_times` pair per neuron for spike-time sources
//!
//! The reverse path folds a backend's response (`target`, `spike_times`,
//! `trace_<signal>`, `runtimes`, log records) into the network's recorded
//! signal slots.
//!
//! # Examples
//!
//! ```
//! use spikeport::marshal::{marshal_response_bytes, marshal_to_vec, MarshalOptions, NeuronTypeMap};
//! use spikeport::{binnf, Network, NeuronType};
//!
//! let mut net = Network::new();
//! let pid = net.create_population("in", 1, NeuronType::spike_source_array());
//! net.population_mut(pid).unwrap().set_spike_times(0, vec![1.0, 2.0]).unwrap();
//! net.population_mut(pid).unwrap().record("spikes", true).unwrap();
//!
//! let bytes = marshal_to_vec(&net, &NeuronTypeMap::binnf_default(), &MarshalOptions::default()).unwrap();
//!
//! // An echoing backend returns the target/spike_times pair unchanged.
//! let response = binnf::loopback(&bytes).unwrap();
//! let summary = marshal_response_bytes(&mut net, &response).unwrap();
//! assert!(summary.diagnostics.is_empty());
//! assert_eq!(net.population(pid).unwrap().spikes(0), Some(vec![1.0, 2.0]));
//! ```

mod forward;
mod reverse;
mod types;

pub use forward::{
    connection_header, connections_block, marshal, marshal_blocks, marshal_to_vec,
    parameter_blocks, populations_block, signal_names,
};
pub use reverse::{marshal_response, marshal_response_bytes, ResponseFolder, ResponseSummary};
pub use types::NeuronTypeMap;

use serde::{Deserialize, Serialize};

/// Row layout of `parameters` blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterRows {
    /// One row with `nid = i32::MAX` for homogeneous populations
    #[default]
    Compact,
    /// Always one row per neuron
    PerNeuron,
}

/// Options of the forward marshaller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarshalOptions {
    /// Fail with `NonDeterministicConnectorUsed` instead of expanding random
    /// connectors without seed
    pub require_deterministic: bool,
    pub parameter_rows: ParameterRows,
}

/// `nid` value of a parameter row that applies to the whole population.
pub const ALL_NEURONS: i32 = i32::MAX;

/// Module name used for log records produced by the marshaller.
pub const LOG_MODULE: &str = "spikeport";
