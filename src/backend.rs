//! Backends - where a network is run.
//!
//! A [`Backend`] exposes the neuron types it accepts and a `run` entry point.
//! [`BinnfBackend`] covers every backend that speaks binnf: it marshals the
//! network, hands the bytes to a transport closure (a simulator process, a
//! socket, a hardware link) and folds the response back into the network.
//!
//! # Example
//!
//! ```
//! use spikeport::{binnf, BackendConfig, BinnfBackend, Backend, Network, NeuronType};
//!
//! // A transport that echoes the request stands in for a simulator.
//! let mut backend = BinnfBackend::new("loopback", BackendConfig::default(), |request: &[u8], _duration: f32| {
//!     binnf::loopback(request)
//! });
//!
//! let mut net = Network::new();
//! net.create_population("in", 2, NeuronType::spike_source_array());
//! backend.run(&mut net, 100.0).unwrap();
//! assert!(backend.supported_neuron_types().contains("IfCondExp"));
//! ```

use crate::marshal::{marshal_response_bytes, marshal_to_vec};
use crate::transformation::{run_transformed, TransformationRegistry};
use crate::{BackendConfig, Network, Result};
use std::collections::BTreeSet;

/// A simulator or hardware system that runs networks.
pub trait Backend {
    fn name(&self) -> &str;

    /// Names of the neuron types this backend runs natively.
    fn supported_neuron_types(&self) -> BTreeSet<String>;

    /// Run `network` for `duration` milliseconds and store the results in it.
    fn run(&mut self, network: &mut Network, duration: f32) -> Result<()>;
}

/// Backend speaking binnf over a caller-supplied transport.
///
/// The transport receives the marshalled network and the duration and
/// returns the response stream.
pub struct BinnfBackend<F> {
    name: String,
    config: BackendConfig,
    transport: F,
}

impl<F> BinnfBackend<F>
where
    F: FnMut(&[u8], f32) -> Result<Vec<u8>>,
{
    pub fn new(name: impl Into<String>, config: BackendConfig, transport: F) -> Self {
        Self {
            name: name.into(),
            config,
            transport,
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Run `network`, transforming unsupported neuron types first.
    ///
    /// Planner options, seed and duration come from the configuration.
    pub fn run_transformed(
        &mut self,
        network: &mut Network,
        registry: &TransformationRegistry,
    ) -> Result<()> {
        let options = self.config.run_options();
        run_transformed(self, network, registry, &options)
    }
}

impl<F> Backend for BinnfBackend<F>
where
    F: FnMut(&[u8], f32) -> Result<Vec<u8>>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_neuron_types(&self) -> BTreeSet<String> {
        self.config
            .neuron_types
            .names()
            .map(str::to_string)
            .collect()
    }

    fn run(&mut self, network: &mut Network, duration: f32) -> Result<()> {
        let request = marshal_to_vec(network, &self.config.neuron_types, &self.config.marshal)?;
        tracing::info!(backend = %self.name, bytes = request.len(), duration, "sending network");
        let response = (self.transport)(&request, duration)?;
        let summary = marshal_response_bytes(network, &response)?;
        if summary.diagnostics.is_empty() {
            tracing::info!(backend = %self.name, blocks = summary.blocks, "received response");
        } else {
            tracing::warn!(
                backend = %self.name,
                blocks = summary.blocks,
                diagnostics = summary.diagnostics.len(),
                "received response with errors"
            );
        }
        Ok(())
    }
}
