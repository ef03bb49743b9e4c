//! Backend configuration serialization.
//!
//! This module provides [`BackendConfig`], the settings a binnf backend needs
//! besides the network itself: the neuron type ordinals, planner options,
//! marshaller options and the simulation duration. Configurations can be
//! stored as JSON or as a compact binary snapshot.
//!
//! # Example
//!
//! ```
//! use spikeport::BackendConfig;
//!
//! let config = BackendConfig::default()
//!     .with_duration(500.0)
//!     .with_metadata("simulator", "nest");
//!
//! let json = config.to_json().unwrap();
//! let restored = BackendConfig::from_json(&json).unwrap();
//! assert_eq!(config, restored);
//!
//! // Fields missing from the JSON fall back to their defaults.
//! let partial = BackendConfig::from_json(r#"{ "allow_lossy": true }"#).unwrap();
//! assert!(partial.allow_lossy);
//! assert_eq!(partial.neuron_types, BackendConfig::default().neuron_types);
//! ```

use crate::marshal::{MarshalOptions, NeuronTypeMap};
use crate::transformation::{PlanOptions, RunOptions};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Complete backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    /// Version of the serialization format
    pub version: String,

    /// Wire ordinal of every neuron type the backend accepts
    pub neuron_types: NeuronTypeMap,

    /// Allow the planner to use lossy transformations
    pub allow_lossy: bool,

    /// Transformations the planner must not use
    pub disabled_transformations: BTreeSet<String>,

    pub marshal: MarshalOptions,

    /// Simulation duration in milliseconds
    pub duration: f64,

    /// Seed for transformations that draw random numbers
    pub seed: Option<u64>,

    /// Optional metadata (simulator name, host, ...)
    pub metadata: BTreeMap<String, String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            neuron_types: NeuronTypeMap::binnf_default(),
            allow_lossy: false,
            disabled_transformations: BTreeSet::new(),
            marshal: MarshalOptions::default(),
            duration: 1000.0,
            seed: None,
            metadata: BTreeMap::new(),
        }
    }
}

impl BackendConfig {
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Add metadata to the configuration.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Planner options carried by this configuration.
    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            allow_lossy: self.allow_lossy,
            disabled: self.disabled_transformations.clone(),
        }
    }

    /// Options for [`run_transformed`](crate::transformation::run_transformed).
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            duration: self.duration,
            plan: self.plan_options(),
            seed: self.seed,
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the configuration as JSON to `path`.
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read a JSON configuration from `path`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize to binary (bincode).
    pub fn to_binary(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from binary (bincode).
    pub fn from_binary(data: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(data)?)
    }
}
