//! Neuron type ordinals on the wire.

use crate::{NeuronType, Result, SpikeportError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Map from neuron type name to the backend's integer ordinal.
///
/// The `type` column of the `populations` block carries these ordinals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NeuronTypeMap(BTreeMap<String, i32>);

impl NeuronTypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordinals understood by the reference binnf simulators.
    pub fn binnf_default() -> Self {
        let mut map = Self::new();
        map.insert("SpikeSourceArray", 0);
        map.insert("IfCondExp", 1);
        map.insert("EifCondExpIsfaIsta", 2);
        map.insert("IfFacetsHardware1", 3);
        map
    }

    pub fn insert(&mut self, name: impl Into<String>, ordinal: i32) -> Option<i32> {
        self.0.insert(name.into(), ordinal)
    }

    pub fn remove(&mut self, name: &str) -> Option<i32> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Wire ordinal of `neuron_type`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedNeuronType` if the type has no ordinal.
    pub fn ordinal(&self, neuron_type: &NeuronType) -> Result<i32> {
        self.0
            .get(&neuron_type.name)
            .copied()
            .ok_or_else(|| SpikeportError::UnsupportedNeuronType(neuron_type.name.clone()))
    }

    /// Type name carrying `ordinal`.
    pub fn name(&self, ordinal: i32) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, &o)| o == ordinal)
            .map(|(n, _)| n.as_str())
    }

    /// Names of all mapped types.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
