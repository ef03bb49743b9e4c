//! Network - populations, projections, and the results of a run.
//!
//! This module provides the `Network` struct, the in-memory description that
//! the marshaller lowers to binnf and that reverse marshalling fills with
//! recorded data.
//!
//! # Features
//!
//! - Populations addressed by a dense index (`pid`)
//! - Connection descriptors kept in canonical sorted order
//! - Validation of projection ranges on `connect`
//! - Runtime record and log history of the last run
//!
//! # Example
//!
//! ```
//! use spikeport::{Connector, Network, NeuronType, Result};
//!
//! # fn main() -> Result<()> {
//! let mut net = Network::new();
//!
//! let input = net.create_population("input", 10, NeuronType::spike_source_array());
//! let exc = net.create_population("exc", 20, NeuronType::if_cond_exp());
//!
//! net.connect_populations(input, exc, Connector::fixed_fan_in(3, 0.01, 1.0, Some(7)))?;
//! net.population_mut(exc)?.record("spikes", true)?;
//!
//! assert_eq!(net.connections().len(), 1);
//! # Ok(())
//! # }
//! ```

use crate::{
    ConnectionDescriptor, Connector, LogRecord, NeuronType, Population, Result, Runtime,
    SpikeportError, SynapseModel,
};
use itertools::Itertools;
use std::ops::Range;

/// Network owns the populations and connections of a spiking neural network.
///
/// Equality compares populations, connections and the runtime record; the log
/// history is not part of the network state.
#[derive(Debug, Clone, Default)]
pub struct Network {
    /// Populations in creation order, index == pid
    populations: Vec<Population>,

    /// Sorted by `ConnectionDescriptor::key`
    connections: Vec<ConnectionDescriptor>,

    /// Timing of the last run
    runtime: Runtime,

    /// Log records produced by the last run
    logs: Vec<LogRecord>,
}

impl Network {
    /// Create a new empty Network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a population and return its index.
    ///
    /// The population starts with the neuron type's default parameters and
    /// records nothing.
    ///
    /// # Arguments
    ///
    /// * `name` - Human readable name, not required to be unique
    /// * `size` - Number of neurons, may be zero
    /// * `neuron_type` - Type shared by all neurons
    pub fn create_population(
        &mut self,
        name: impl Into<String>,
        size: usize,
        neuron_type: NeuronType,
    ) -> usize {
        let pid = self.populations.len();
        self.populations
            .push(Population::new(pid, name, size, neuron_type));
        pid
    }

    /// Get a population by index.
    ///
    /// # Errors
    ///
    /// Returns `PopulationNotFound` if `pid` is not a population of this
    /// network.
    pub fn population(&self, pid: usize) -> Result<&Population> {
        self.populations
            .get(pid)
            .ok_or(SpikeportError::PopulationNotFound(pid))
    }

    /// Get a mutable population by index.
    pub fn population_mut(&mut self, pid: usize) -> Result<&mut Population> {
        self.populations
            .get_mut(pid)
            .ok_or(SpikeportError::PopulationNotFound(pid))
    }

    pub fn populations(&self) -> &[Population] {
        &self.populations
    }

    pub fn populations_mut(&mut self) -> impl Iterator<Item = &mut Population> {
        self.populations.iter_mut()
    }

    /// Populations whose neuron type is called `type_name`.
    pub fn populations_of_type<'a>(
        &'a self,
        type_name: &'a str,
    ) -> impl Iterator<Item = &'a Population> + 'a {
        self.populations
            .iter()
            .filter(move |p| p.neuron_type().name == type_name)
    }

    /// Replace population `population.pid()` with `population`.
    ///
    /// The replacement may change the neuron type but must keep the size, so
    /// that existing connections stay valid.
    pub fn replace_population(&mut self, population: Population) -> Result<()> {
        let pid = population.pid();
        let slot = self.population_mut(pid)?;
        if slot.size() != population.size() {
            return Err(SpikeportError::InvalidParameter(format!(
                "replacement for population {} has {} neurons instead of {}",
                pid,
                population.size(),
                slot.size()
            )));
        }
        *slot = population;
        Ok(())
    }

    /// Number of neurons over all populations.
    pub fn neuron_count(&self) -> usize {
        self.populations.iter().map(Population::size).sum()
    }

    /// Distinct neuron types in order of first appearance.
    pub fn neuron_types(&self) -> Vec<&NeuronType> {
        self.populations
            .iter()
            .map(Population::neuron_type)
            .unique_by(|t| t.name.clone())
            .collect()
    }

    /// Add a connection descriptor.
    ///
    /// The descriptor is inserted at its canonical position. Descriptors with
    /// equal keys keep their insertion order.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Either population does not exist (`PopulationNotFound`)
    /// - A neuron range is inverted or exceeds its population
    ///   (`InvalidConnection`)
    /// - The connector cannot be expanded over the ranges
    pub fn connect(&mut self, descriptor: ConnectionDescriptor) -> Result<()> {
        let src_size = self.population(descriptor.pid_src)?.size();
        let tar_size = self.population(descriptor.pid_tar)?.size();
        check_range("source", &descriptor.src(), src_size)?;
        check_range("target", &descriptor.tar(), tar_size)?;
        descriptor
            .connector
            .validate(&descriptor.src(), &descriptor.tar())?;

        let key = descriptor.key();
        let at = self.connections.partition_point(|c| c.key() <= key);
        self.connections.insert(at, descriptor);
        Ok(())
    }

    /// Connect two whole populations with a static synapse.
    pub fn connect_populations(
        &mut self,
        pid_src: usize,
        pid_tar: usize,
        connector: Connector,
    ) -> Result<()> {
        self.connect_populations_with(pid_src, pid_tar, connector, SynapseModel::default())
    }

    /// Connect two whole populations with the given synapse model.
    pub fn connect_populations_with(
        &mut self,
        pid_src: usize,
        pid_tar: usize,
        connector: Connector,
        synapse: SynapseModel,
    ) -> Result<()> {
        let src = 0..self.population(pid_src)?.size();
        let tar = 0..self.population(pid_tar)?.size();
        self.connect(
            ConnectionDescriptor::new(pid_src, src, pid_tar, tar, connector).with_synapse(synapse),
        )
    }

    pub fn connections(&self) -> &[ConnectionDescriptor] {
        &self.connections
    }

    /// Expand every random connector without seed into a list connector.
    ///
    /// After this call the network marshals to the same bytes every time.
    /// Returns the number of descriptors that were expanded.
    pub fn materialise_random_connectors(&mut self) -> Result<usize> {
        let mut count = 0;
        for descriptor in &mut self.connections {
            if descriptor.connector.is_deterministic() {
                continue;
            }
            let expanded = descriptor.instantiate()?;
            tracing::debug!(
                pid_src = descriptor.pid_src,
                pid_tar = descriptor.pid_tar,
                connector = descriptor.connector.name(),
                synapses = expanded.len(),
                "materialised random connector"
            );
            descriptor.connector = Connector::List(expanded);
            count += 1;
        }
        Ok(count)
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn set_runtime(&mut self, runtime: Runtime) {
        self.runtime = runtime;
    }

    pub fn logs(&self) -> &[LogRecord] {
        &self.logs
    }

    /// Store a log record and emit it as a `tracing` event.
    pub fn log(&mut self, record: LogRecord) {
        record.emit();
        self.logs.push(record);
    }

    /// Store log records that were already emitted elsewhere.
    pub fn append_logs<I: IntoIterator<Item = LogRecord>>(&mut self, records: I) {
        self.logs.extend(records);
    }

    /// Drop recorded signals and the runtime record.
    pub fn clear_results(&mut self) {
        for pop in &mut self.populations {
            pop.clear_signals();
        }
        self.runtime = Runtime::default();
    }
}

fn check_range(side: &str, range: &Range<usize>, size: usize) -> Result<()> {
    if range.start > range.end || range.end > size {
        return Err(SpikeportError::InvalidConnection(format!(
            "{} range {}..{} outside population of {} neurons",
            side, range.start, range.end, size
        )));
    }
    Ok(())
}

impl PartialEq for Network {
    fn eq(&self, other: &Self) -> bool {
        self.populations == other.populations
            && self.connections == other.connections
            && self.runtime == other.runtime
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Severity;

    fn two_populations() -> Network {
        let mut net = Network::new();
        net.create_population("a", 4, NeuronType::spike_source_array());
        net.create_population("b", 3, NeuronType::if_cond_exp());
        net
    }

    #[test]
    fn test_network_new() {
        let net = Network::new();
        assert!(net.populations().is_empty());
        assert!(net.connections().is_empty());
        assert_eq!(net.neuron_count(), 0);
    }

    #[test]
    fn test_create_population() {
        let net = two_populations();
        assert_eq!(net.population(1).unwrap().name(), "b");
        assert_eq!(net.neuron_count(), 7);
        assert!(matches!(
            net.population(2),
            Err(SpikeportError::PopulationNotFound(2))
        ));
    }

    #[test]
    fn test_connections_sorted() {
        let mut net = two_populations();
        net.connect(ConnectionDescriptor::new(1, 0..3, 0, 0..3, Connector::one_to_one(1.0, 1.0)))
            .unwrap();
        net.connect(ConnectionDescriptor::new(0, 2..4, 1, 0..3, Connector::all_to_all(1.0, 1.0)))
            .unwrap();
        net.connect(ConnectionDescriptor::new(0, 0..2, 1, 0..3, Connector::all_to_all(1.0, 1.0)))
            .unwrap();
        let keys: Vec<_> = net.connections().iter().map(|c| (c.pid_src, c.nid_src0)).collect();
        assert_eq!(keys, vec![(0, 0), (0, 2), (1, 0)]);
    }

    #[test]
    fn test_connect_invalid() {
        let mut net = two_populations();
        assert!(matches!(
            net.connect(ConnectionDescriptor::new(0, 0..5, 1, 0..3, Connector::all_to_all(1.0, 1.0))),
            Err(SpikeportError::InvalidConnection(_))
        ));
        assert!(matches!(
            net.connect_populations(0, 7, Connector::all_to_all(1.0, 1.0)),
            Err(SpikeportError::PopulationNotFound(7))
        ));
        assert!(matches!(
            net.connect_populations(0, 1, Connector::one_to_one(1.0, 1.0)),
            Err(SpikeportError::SizeMismatch { src: 4, tar: 3 })
        ));
        assert!(net.connections().is_empty());
    }

    #[test]
    fn test_materialise_random_connectors() {
        let mut net = two_populations();
        net.connect_populations(0, 1, Connector::fixed_fan_in(2, 1.0, 1.0, None))
            .unwrap();
        net.connect_populations(0, 1, Connector::fixed_fan_in(2, 1.0, 1.0, Some(1)))
            .unwrap();
        assert_eq!(net.materialise_random_connectors().unwrap(), 1);
        assert!(net.connections().iter().all(|c| c.connector.is_deterministic()));
        let snapshot = net.clone();
        assert_eq!(net.materialise_random_connectors().unwrap(), 0);
        assert_eq!(net, snapshot);
    }

    #[test]
    fn test_logs_excluded_from_equality() {
        let mut a = two_populations();
        let b = a.clone();
        a.log(LogRecord::new(0.0, Severity::Info, "test", "hello"));
        assert_eq!(a.logs().len(), 1);
        assert_eq!(a, b);
    }

    #[test]
    fn test_neuron_types_unique() {
        let mut net = two_populations();
        net.create_population("c", 1, NeuronType::spike_source_array());
        let names: Vec<_> = net.neuron_types().iter().map(|t| t.name.clone()).collect();
        assert_eq!(names, vec!["SpikeSourceArray", "IfCondExp"]);
    }

    #[test]
    fn test_replace_population() {
        let mut net = two_populations();
        let pop = Population::new(0, "a", 4, NeuronType::spike_source_poisson());
        net.replace_population(pop).unwrap();
        assert_eq!(net.population(0).unwrap().neuron_type().name, "SpikeSourcePoisson");
        let wrong = Population::new(0, "a", 2, NeuronType::spike_source_poisson());
        assert!(net.replace_population(wrong).is_err());
    }
}
