//! Neuron type identities.
//!
//! The core does not simulate neurons. A [`NeuronType`] is an identity (its
//! name) plus the ordered parameter and signal names the marshaller needs to
//! lay out `parameters` and `populations` columns. Types compare by value;
//! two types with the same name are expected to describe the same model.
//!
//! # Examples
//!
//! ```
//! use spikeport::{NeuronKind, NeuronType};
//!
//! let lif = NeuronType::if_cond_exp();
//! assert_eq!(lif.kind, NeuronKind::Neuron);
//! assert_eq!(lif.parameter_index("v_thresh"), Some(6));
//! assert_eq!(lif.signal_index("spikes"), Some(0));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a neuron type is lowered to binnf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeuronKind {
    /// Simulated neuron, sent as a `parameters` block
    Neuron,
    /// Spike generator described by parameters (rate, interval, ...)
    SpikeSource,
    /// Spike generator whose per-neuron parameter vector is its spike times,
    /// sent as `target` / `spike_times` block pairs
    SpikeTimes,
}

/// Name and layout of a neuron model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuronType {
    pub name: String,
    pub parameter_names: Vec<String>,
    /// Default value for each parameter, same order as `parameter_names`
    pub parameter_defaults: Vec<f64>,
    pub signal_names: Vec<String>,
    pub kind: NeuronKind,
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl NeuronType {
    /// Create a neuron type.
    ///
    /// # Panics
    ///
    /// Panics if `parameter_defaults` and `parameter_names` differ in length.
    pub fn new(
        name: impl Into<String>,
        parameter_names: &[&str],
        parameter_defaults: &[f64],
        signal_names: &[&str],
        kind: NeuronKind,
    ) -> Self {
        assert_eq!(
            parameter_names.len(),
            parameter_defaults.len(),
            "one default per parameter"
        );
        Self {
            name: name.into(),
            parameter_names: owned(parameter_names),
            parameter_defaults: parameter_defaults.to_vec(),
            signal_names: owned(signal_names),
            kind,
        }
    }

    pub fn parameter_index(&self, name: &str) -> Option<usize> {
        self.parameter_names.iter().position(|n| n == name)
    }

    pub fn signal_index(&self, name: &str) -> Option<usize> {
        self.signal_names.iter().position(|n| n == name)
    }

    #[inline]
    pub fn is_spike_source(&self) -> bool {
        self.kind != NeuronKind::Neuron
    }

    /// Parameter vector a new neuron starts with.
    pub fn default_parameters(&self) -> Vec<f64> {
        match self.kind {
            NeuronKind::SpikeTimes => Vec::new(),
            _ => self.parameter_defaults.clone(),
        }
    }

    /// Spike source with an explicit list of spike times per neuron.
    pub fn spike_source_array() -> Self {
        Self::new("SpikeSourceArray", &[], &[], &["spikes"], NeuronKind::SpikeTimes)
    }

    /// Poisson spike source; rate in Hz, times in ms.
    pub fn spike_source_poisson() -> Self {
        Self::new(
            "SpikeSourcePoisson",
            &["rate", "start", "duration"],
            &[1.0, 0.0, 1000.0],
            &["spikes"],
            NeuronKind::SpikeSource,
        )
    }

    /// Constant-frequency spike source with optional Gaussian jitter.
    pub fn spike_source_const_freq() -> Self {
        Self::new(
            "SpikeSourceConstFreq",
            &["rate", "start", "duration", "sigma"],
            &[1.0, 0.0, 1000.0, 0.0],
            &["spikes"],
            NeuronKind::SpikeSource,
        )
    }

    /// Constant-interval spike source with optional Gaussian jitter.
    pub fn spike_source_const_interval() -> Self {
        Self::new(
            "SpikeSourceConstInterval",
            &["interval", "start", "duration", "sigma"],
            &[1000.0, 0.0, 1000.0, 0.0],
            &["spikes"],
            NeuronKind::SpikeSource,
        )
    }

    /// Conductance-based leaky integrate-and-fire neuron.
    pub fn if_cond_exp() -> Self {
        Self::new(
            "IfCondExp",
            &[
                "cm",
                "tau_m",
                "tau_syn_E",
                "tau_syn_I",
                "tau_refrac",
                "v_rest",
                "v_thresh",
                "v_reset",
                "e_rev_E",
                "e_rev_I",
                "i_offset",
            ],
            &[1.0, 20.0, 5.0, 5.0, 0.1, -65.0, -50.0, -65.0, 0.0, -70.0, 0.0],
            &["spikes", "v", "gsyn_exc", "gsyn_inh"],
            NeuronKind::Neuron,
        )
    }

    /// Adaptive exponential integrate-and-fire neuron.
    pub fn eif_cond_exp_isfa_ista() -> Self {
        Self::new(
            "EifCondExpIsfaIsta",
            &[
                "cm",
                "tau_m",
                "tau_syn_E",
                "tau_syn_I",
                "tau_refrac",
                "tau_w",
                "v_rest",
                "v_thresh",
                "v_reset",
                "e_rev_E",
                "e_rev_I",
                "i_offset",
                "a",
                "b",
                "delta_T",
            ],
            &[
                0.281, 9.3667, 5.0, 5.0, 0.1, 144.0, -70.6, -50.4, -70.6, 0.0, -80.0, 0.0, 4.0,
                0.0805, 2.0,
            ],
            &["spikes", "v", "gsyn_exc", "gsyn_inh"],
            NeuronKind::Neuron,
        )
    }

    /// Neuron model of the first-generation FACETS hardware.
    pub fn if_facets_hardware1() -> Self {
        Self::new(
            "IfFacetsHardware1",
            &["g_leak", "tau_refrac", "v_rest", "v_thresh", "v_reset", "e_rev_I"],
            &[40.0, 1.0, -75.0, -55.0, -80.0, -80.0],
            &["spikes", "v"],
            NeuronKind::Neuron,
        )
    }

    /// All built-in neuron types.
    pub fn builtin() -> Vec<NeuronType> {
        vec![
            Self::spike_source_array(),
            Self::spike_source_poisson(),
            Self::spike_source_const_freq(),
            Self::spike_source_const_interval(),
            Self::if_cond_exp(),
            Self::eif_cond_exp_isfa_ista(),
            Self::if_facets_hardware1(),
        ]
    }

    /// Look up a built-in type by name.
    pub fn builtin_by_name(name: &str) -> Option<NeuronType> {
        Self::builtin().into_iter().find(|t| t.name == name)
    }
}

impl fmt::Display for NeuronType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
