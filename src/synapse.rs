//! Synapse models attached to connections.
//!
//! Every model starts with `weight` and `delay`; plastic models append their
//! own parameters. The marshaller writes the extra parameters as additional
//! `connections` columns in [`SynapseKind::EXTRA_COLUMNS`] order.

use crate::{Result, SpikeportError};
use serde::{Deserialize, Serialize};

/// Synapse model identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SynapseKind {
    Static,
    SpikePairRuleAdditive,
    SpikePairRuleMultiplicative,
    TsodyksMarkram,
}

const STDP_NAMES: [&str; 8] = [
    "weight", "delay", "tau_plus", "tau_minus", "A_plus", "A_minus", "w_min", "w_max",
];
const STDP_DEFAULTS: [f64; 8] = [0.015, 1.0, 20.0, 20.0, 0.01, 0.01, 0.0, 0.1];

impl SynapseKind {
    /// Union of all non-base parameters in column order.
    pub const EXTRA_COLUMNS: [&'static str; 9] = [
        "tau_plus",
        "tau_minus",
        "A_plus",
        "A_minus",
        "w_min",
        "w_max",
        "U",
        "tau_rec",
        "tau_facil",
    ];

    pub const fn name(self) -> &'static str {
        match self {
            SynapseKind::Static => "StaticSynapse",
            SynapseKind::SpikePairRuleAdditive => "SpikePairRuleAdditive",
            SynapseKind::SpikePairRuleMultiplicative => "SpikePairRuleMultiplicative",
            SynapseKind::TsodyksMarkram => "TsodyksMarkramMechanism",
        }
    }

    /// Value written to the `synapse` column.
    pub const fn ordinal(self) -> i32 {
        match self {
            SynapseKind::Static => 0,
            SynapseKind::SpikePairRuleAdditive => 1,
            SynapseKind::SpikePairRuleMultiplicative => 2,
            SynapseKind::TsodyksMarkram => 3,
        }
    }

    pub fn parameter_names(self) -> &'static [&'static str] {
        match self {
            SynapseKind::Static => &STDP_NAMES[..2],
            SynapseKind::SpikePairRuleAdditive | SynapseKind::SpikePairRuleMultiplicative => {
                &STDP_NAMES
            }
            SynapseKind::TsodyksMarkram => &["weight", "delay", "U", "tau_rec", "tau_facil"],
        }
    }

    pub fn parameter_defaults(self) -> &'static [f64] {
        match self {
            SynapseKind::Static => &STDP_DEFAULTS[..2],
            SynapseKind::SpikePairRuleAdditive | SynapseKind::SpikePairRuleMultiplicative => {
                &STDP_DEFAULTS
            }
            SynapseKind::TsodyksMarkram => &[0.015, 1.0, 0.0, 100.0, 0.0],
        }
    }

    /// True for models whose weights change during the simulation.
    pub const fn learning(self) -> bool {
        matches!(
            self,
            SynapseKind::SpikePairRuleAdditive | SynapseKind::SpikePairRuleMultiplicative
        )
    }
}

/// A synapse model with its parameter values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynapseModel {
    kind: SynapseKind,
    parameters: Vec<f64>,
}

impl SynapseModel {
    /// Model with default parameters.
    pub fn new(kind: SynapseKind) -> Self {
        Self {
            kind,
            parameters: kind.parameter_defaults().to_vec(),
        }
    }

    /// Static synapse with the given weight and delay.
    pub fn static_synapse(weight: f64, delay: f64) -> Self {
        Self {
            kind: SynapseKind::Static,
            parameters: vec![weight, delay],
        }
    }

    /// Model with explicit parameters in `kind.parameter_names()` order.
    pub fn with_parameters(kind: SynapseKind, parameters: Vec<f64>) -> Result<Self> {
        if parameters.len() != kind.parameter_names().len() {
            return Err(SpikeportError::InvalidParameter(format!(
                "{} expects {} parameters, got {}",
                kind.name(),
                kind.parameter_names().len(),
                parameters.len()
            )));
        }
        Ok(Self { kind, parameters })
    }

    #[inline]
    pub fn kind(&self) -> SynapseKind {
        self.kind
    }

    pub fn parameters(&self) -> &[f64] {
        &self.parameters
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.kind == SynapseKind::Static
    }

    #[inline]
    pub fn learning(&self) -> bool {
        self.kind.learning()
    }

    #[inline]
    pub fn weight(&self) -> f64 {
        self.parameters[0]
    }

    #[inline]
    pub fn delay(&self) -> f64 {
        self.parameters[1]
    }

    /// Named parameter, `None` if the model does not carry it.
    pub fn get(&self, name: &str) -> Option<f64> {
        let idx = self.kind.parameter_names().iter().position(|n| *n == name)?;
        Some(self.parameters[idx])
    }

    pub fn set(&mut self, name: &str, value: f64) -> Result<()> {
        let idx = self
            .kind
            .parameter_names()
            .iter()
            .position(|n| *n == name)
            .ok_or_else(|| {
                SpikeportError::InvalidParameter(format!(
                    "{} has no parameter \"{}\"",
                    self.kind.name(),
                    name
                ))
            })?;
        self.parameters[idx] = value;
        Ok(())
    }
}

impl Default for SynapseModel {
    fn default() -> Self {
        Self::new(SynapseKind::Static)
    }
}
