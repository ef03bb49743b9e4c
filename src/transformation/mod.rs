//! Transformations - rewriting networks for backends with limited support.
//!
//! A [`Transformation`] replaces the populations of one neuron type by
//! populations of another. The [`TransformationRegistry`] holds the known
//! transformations as graph edges, [`plan`] searches that graph for the
//! cheapest chain that makes a network acceptable to a backend, and
//! [`run_transformed`] applies the chain, runs the backend and copies the
//! results back into the caller's network.

mod planner;
mod registry;
mod runner;
mod spike_sources;

pub use planner::{plan, PlanOptions, PlanStep};
pub use registry::{RegistryEntry, TransformationCtor, TransformationRegistry};
pub use runner::{run_transformed, RunOptions};
pub use spike_sources::{
    constant_interval_spike_times, poisson_spike_times, CFToCI, CFToSA, CIToCF, PoissonToSA,
};

use crate::{Network, Result, SpikeportError};
use serde::{Deserialize, Serialize};

/// Cost and lossiness of a transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformationProperties {
    /// Edge weight in the planner graph
    pub cost: u32,
    /// True if the result does not reproduce the original dynamics exactly
    pub lossy: bool,
}

impl Default for TransformationProperties {
    fn default() -> Self {
        Self {
            cost: 100,
            lossy: false,
        }
    }
}

/// Context handed to every transformation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransformationAuxData {
    /// Simulation duration in milliseconds
    pub duration: f64,
    /// Seed for transformations that draw random numbers
    pub seed: Option<u64>,
}

/// A rewrite of a network.
pub trait Transformation {
    /// Stable identifier, used to disable a transformation.
    fn id(&self) -> &str;

    fn properties(&self) -> TransformationProperties {
        TransformationProperties::default()
    }

    /// Produce the transformed network.
    ///
    /// The input network is left untouched. Population indices and sizes must
    /// be preserved so that results can be mapped back.
    fn transform(&self, network: &Network, aux: &TransformationAuxData) -> Result<Network>;

    /// Copy the results of a run on the transformed network `src` back to the
    /// network `tar` the transformation was applied to.
    fn copy_results(&self, src: &Network, tar: &mut Network) -> Result<()> {
        copy_signals_by_name(self.id(), src, tar)
    }
}

/// Copy recorded signals between networks of identical shape, matching
/// signals of each population pair by name.
pub fn copy_signals_by_name(id: &str, src: &Network, tar: &mut Network) -> Result<()> {
    if src.populations().len() != tar.populations().len() {
        return Err(SpikeportError::TransformationFailed {
            id: id.to_string(),
            reason: format!(
                "population count changed from {} to {}",
                tar.populations().len(),
                src.populations().len()
            ),
        });
    }
    for (from, to) in src.populations().iter().zip(tar.populations_mut()) {
        if from.size() != to.size() {
            return Err(SpikeportError::TransformationFailed {
                id: id.to_string(),
                reason: format!("population {} changed its size", to.pid()),
            });
        }
        let mapping: Vec<(usize, usize)> = to
            .neuron_type()
            .signal_names
            .iter()
            .enumerate()
            .filter_map(|(to_idx, name)| {
                from.neuron_type()
                    .signal_index(name)
                    .map(|from_idx| (from_idx, to_idx))
            })
            .collect();
        for nid in 0..from.size() {
            for &(from_idx, to_idx) in &mapping {
                if let Some(data) = from.signal_data(nid, from_idx) {
                    to.set_signal_data(nid, to_idx, data.clone())?;
                }
            }
        }
    }
    Ok(())
}
