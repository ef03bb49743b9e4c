//! Populations - groups of neurons sharing one neuron type.
//!
//! Parameters and record flags are stored either once for the whole
//! population or once per neuron, see [`Values`]. Recorded signals are kept
//! per neuron and per signal as shared [`Matrix`] handles, so a snapshot
//! handed to a consumer stays valid while the reverse marshaller installs new
//! data.
//!
//! # Examples
//!
//! ```
//! use spikeport::{NeuronType, Population};
//!
//! let mut pop = Population::new(0, "exc", 4, NeuronType::if_cond_exp());
//! pop.set_parameter("v_thresh", -52.0).unwrap();
//! assert!(pop.parameters().is_uniform());
//!
//! pop.set_neuron_parameter(2, "tau_m", 10.0).unwrap();
//! assert!(!pop.parameters().is_uniform());
//! assert_eq!(pop.neuron_parameters(2)[1], 10.0);
//! assert_eq!(pop.neuron_parameters(0)[1], 20.0);
//! ```

use crate::{Matrix, NeuronKind, NeuronType, Result, SpikeportError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Values shared by all neurons of a population or stored per neuron.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Values<T> {
    Uniform(T),
    PerNeuron(Vec<T>),
}

impl<T: Clone> Values<T> {
    #[inline]
    pub fn is_uniform(&self) -> bool {
        matches!(self, Values::Uniform(_))
    }

    /// Value of neuron `i`.
    ///
    /// # Panics
    ///
    /// Panics if the storage is per-neuron and `i` is out of range.
    #[inline]
    pub fn get(&self, i: usize) -> &T {
        match self {
            Values::Uniform(v) => v,
            Values::PerNeuron(vs) => &vs[i],
        }
    }

    /// Mutable value of neuron `i`, expanding uniform storage to `size`
    /// entries first.
    pub fn get_mut(&mut self, size: usize, i: usize) -> &mut T {
        self.expand(size);
        match self {
            Values::PerNeuron(vs) => &mut vs[i],
            Values::Uniform(v) => v,
        }
    }

    /// Set the value of neuron `i`; uniform storage is expanded to `size`
    /// entries first.
    pub fn set(&mut self, size: usize, i: usize, value: T) {
        *self.get_mut(size, i) = value;
    }

    /// Set every neuron to `value`, collapsing to uniform storage.
    pub fn set_all(&mut self, value: T) {
        *self = Values::Uniform(value);
    }

    /// Convert uniform storage to `size` per-neuron copies.
    pub fn expand(&mut self, size: usize) {
        if let Values::Uniform(v) = self {
            *self = Values::PerNeuron(vec![v.clone(); size]);
        }
    }

    /// Per-neuron copy of the values.
    pub fn expanded(&self, size: usize) -> Vec<T> {
        match self {
            Values::Uniform(v) => vec![v.clone(); size],
            Values::PerNeuron(vs) => vs.clone(),
        }
    }

    /// Borrow the per-neuron values.
    ///
    /// # Errors
    ///
    /// Returns `HeterogeneousRequiresExpansion` for uniform storage.
    pub fn as_per_neuron(&self) -> Result<&[T]> {
        match self {
            Values::PerNeuron(vs) => Ok(vs),
            Values::Uniform(_) => Err(SpikeportError::HeterogeneousRequiresExpansion),
        }
    }

    /// Apply `f` to every stored value, keeping the storage shape.
    pub fn map<U, F: FnMut(&T) -> U>(&self, mut f: F) -> Values<U> {
        match self {
            Values::Uniform(v) => Values::Uniform(f(v)),
            Values::PerNeuron(vs) => Values::PerNeuron(vs.iter().map(f).collect()),
        }
    }
}

impl<T: Clone + PartialEq> Values<T> {
    /// True if all `size` neurons hold the same value.
    pub fn is_homogeneous(&self) -> bool {
        match self {
            Values::Uniform(_) => true,
            Values::PerNeuron(vs) => vs.windows(2).all(|w| w[0] == w[1]),
        }
    }

    /// Collapse non-empty per-neuron storage whose entries are all equal.
    pub fn compact(&mut self) {
        if let Values::PerNeuron(vs) = self {
            if !vs.is_empty() && vs.windows(2).all(|w| w[0] == w[1]) {
                let v = vs[0].clone();
                *self = Values::Uniform(v);
            }
        }
    }
}

/// Timing of a simulation run in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Runtime {
    pub total: f64,
    pub sim: f64,
    pub initialize: f64,
    pub finalize: f64,
}

/// A group of neurons of the same type.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    pid: usize,
    name: String,
    size: usize,
    neuron_type: NeuronType,
    parameters: Values<Vec<f64>>,
    record: Values<Vec<bool>>,
    /// `signals[nid][signal]`
    signals: Vec<Vec<Option<Arc<Matrix>>>>,
}

impl Population {
    /// Create a population with default parameters, recording nothing.
    pub fn new(pid: usize, name: impl Into<String>, size: usize, neuron_type: NeuronType) -> Self {
        let signal_count = neuron_type.signal_names.len();
        Self {
            pid,
            name: name.into(),
            size,
            parameters: Values::Uniform(neuron_type.default_parameters()),
            record: Values::Uniform(vec![false; signal_count]),
            signals: vec![vec![None; signal_count]; size],
            neuron_type,
        }
    }

    #[inline]
    pub fn pid(&self) -> usize {
        self.pid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn neuron_type(&self) -> &NeuronType {
        &self.neuron_type
    }

    pub fn parameters(&self) -> &Values<Vec<f64>> {
        &self.parameters
    }

    /// Parameter vector of neuron `nid`.
    pub fn neuron_parameters(&self, nid: usize) -> &[f64] {
        self.parameters.get(nid)
    }

    fn check_nid(&self, nid: usize) -> Result<()> {
        if nid >= self.size {
            return Err(SpikeportError::IndexOutOfBounds {
                index: nid,
                length: self.size,
            });
        }
        Ok(())
    }

    fn check_vector(&self, params: &[f64]) -> Result<()> {
        let expected = self.neuron_type.parameter_names.len();
        if self.neuron_type.kind != NeuronKind::SpikeTimes && params.len() != expected {
            return Err(SpikeportError::InvalidParameter(format!(
                "{} expects {} parameters, got {}",
                self.neuron_type.name,
                expected,
                params.len()
            )));
        }
        Ok(())
    }

    fn parameter_index(&self, name: &str) -> Result<usize> {
        self.neuron_type.parameter_index(name).ok_or_else(|| {
            SpikeportError::InvalidParameter(format!(
                "{} has no parameter \"{}\"",
                self.neuron_type.name, name
            ))
        })
    }

    /// Replace all parameters.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidParameter` if a vector does not match the neuron
    /// type, or if per-neuron storage has the wrong number of entries.
    pub fn set_parameters(&mut self, parameters: Values<Vec<f64>>) -> Result<()> {
        match &parameters {
            Values::Uniform(p) => self.check_vector(p)?,
            Values::PerNeuron(ps) => {
                if ps.len() != self.size {
                    return Err(SpikeportError::InvalidParameter(format!(
                        "{} parameter vectors for a population of {}",
                        ps.len(),
                        self.size
                    )));
                }
                for p in ps {
                    self.check_vector(p)?;
                }
            }
        }
        self.parameters = parameters;
        Ok(())
    }

    /// Set one named parameter on every neuron, keeping the storage shape.
    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        let idx = self.parameter_index(name)?;
        match &mut self.parameters {
            Values::Uniform(p) => p[idx] = value,
            Values::PerNeuron(ps) => ps.iter_mut().for_each(|p| p[idx] = value),
        }
        Ok(())
    }

    /// Set one named parameter on neuron `nid`, de-homogenising the storage.
    pub fn set_neuron_parameter(&mut self, nid: usize, name: &str, value: f64) -> Result<()> {
        self.check_nid(nid)?;
        let idx = self.parameter_index(name)?;
        self.parameters.get_mut(self.size, nid)[idx] = value;
        Ok(())
    }

    /// Spike times of neuron `nid` for spike-time sources.
    pub fn spike_times(&self, nid: usize) -> &[f64] {
        self.parameters.get(nid)
    }

    /// Set the spike times of neuron `nid`.
    pub fn set_spike_times(&mut self, nid: usize, times: Vec<f64>) -> Result<()> {
        self.check_nid(nid)?;
        if self.neuron_type.kind != NeuronKind::SpikeTimes {
            return Err(SpikeportError::InvalidParameter(format!(
                "{} has no spike times",
                self.neuron_type.name
            )));
        }
        self.parameters.set(self.size, nid, times);
        Ok(())
    }

    pub fn record_flags(&self) -> &Values<Vec<bool>> {
        &self.record
    }

    /// Replace all record flags.
    pub fn set_record_flags(&mut self, record: Values<Vec<bool>>) -> Result<()> {
        let count = self.neuron_type.signal_names.len();
        let ok = match &record {
            Values::Uniform(r) => r.len() == count,
            Values::PerNeuron(rs) => rs.len() == self.size && rs.iter().all(|r| r.len() == count),
        };
        if !ok {
            return Err(SpikeportError::InvalidParameter(format!(
                "record flags do not match {} signals",
                count
            )));
        }
        self.record = record;
        Ok(())
    }

    fn signal(&self, name: &str) -> Result<usize> {
        self.neuron_type.signal_index(name).ok_or_else(|| {
            SpikeportError::InvalidParameter(format!(
                "{} has no signal \"{}\"",
                self.neuron_type.name, name
            ))
        })
    }

    /// Record (or stop recording) `signal` on every neuron.
    pub fn record(&mut self, signal: &str, enabled: bool) -> Result<()> {
        let idx = self.signal(signal)?;
        match &mut self.record {
            Values::Uniform(r) => r[idx] = enabled,
            Values::PerNeuron(rs) => rs.iter_mut().for_each(|r| r[idx] = enabled),
        }
        Ok(())
    }

    /// Record (or stop recording) `signal` on neuron `nid` only.
    pub fn record_neuron(&mut self, nid: usize, signal: &str, enabled: bool) -> Result<()> {
        self.check_nid(nid)?;
        let idx = self.signal(signal)?;
        self.record.get_mut(self.size, nid)[idx] = enabled;
        Ok(())
    }

    #[inline]
    pub fn is_recording(&self, nid: usize, signal: usize) -> bool {
        self.record.get(nid).get(signal).copied().unwrap_or(false)
    }

    /// True if at least one neuron records `signal`.
    pub fn records_any(&self, signal: usize) -> bool {
        match &self.record {
            Values::Uniform(r) => self.size > 0 && r.get(signal).copied().unwrap_or(false),
            Values::PerNeuron(rs) => rs.iter().any(|r| r.get(signal).copied().unwrap_or(false)),
        }
    }

    /// Recorded data of neuron `nid` for `signal`.
    pub fn signal_data(&self, nid: usize, signal: usize) -> Option<&Arc<Matrix>> {
        self.signals.get(nid)?.get(signal)?.as_ref()
    }

    /// Install recorded data for neuron `nid`.
    pub fn set_signal_data(&mut self, nid: usize, signal: usize, data: Arc<Matrix>) -> Result<()> {
        self.check_nid(nid)?;
        let slot = self.signals[nid]
            .get_mut(signal)
            .ok_or(SpikeportError::IndexOutOfBounds {
                index: signal,
                length: self.neuron_type.signal_names.len(),
            })?;
        *slot = Some(data);
        Ok(())
    }

    /// Recorded spike times of neuron `nid`, if any.
    pub fn spikes(&self, nid: usize) -> Option<Vec<f32>> {
        let idx = self.neuron_type.signal_index("spikes")?;
        self.signal_data(nid, idx).map(|m| m.column::<f32>(0))
    }

    /// Drop all recorded data.
    pub fn clear_signals(&mut self) {
        for neuron in &mut self.signals {
            neuron.iter_mut().for_each(|s| *s = None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Header, NumericType};

    #[test]
    fn test_values_expand_and_compact() {
        let mut v = Values::Uniform(1);
        assert!(matches!(
            v.as_per_neuron(),
            Err(SpikeportError::HeterogeneousRequiresExpansion)
        ));
        v.set(3, 1, 5);
        assert_eq!(v, Values::PerNeuron(vec![1, 5, 1]));
        assert!(!v.is_homogeneous());
        v.set(3, 1, 1);
        assert!(v.is_homogeneous());
        v.compact();
        assert_eq!(v, Values::Uniform(1));

        let mut empty: Values<i32> = Values::PerNeuron(vec![]);
        empty.compact();
        assert!(!empty.is_uniform());
    }

    #[test]
    fn test_parameter_validation() {
        let mut pop = Population::new(0, "p", 2, NeuronType::if_facets_hardware1());
        assert!(pop.set_parameters(Values::Uniform(vec![1.0])).is_err());
        assert!(pop
            .set_parameters(Values::PerNeuron(vec![vec![0.0; 6]]))
            .is_err());
        pop.set_parameters(Values::PerNeuron(vec![vec![0.0; 6], vec![1.0; 6]]))
            .unwrap();
        assert_eq!(pop.neuron_parameters(1), &[1.0; 6]);
        assert!(pop.set_parameter("nope", 1.0).is_err());
        assert!(pop.set_neuron_parameter(2, "g_leak", 1.0).is_err());
    }

    #[test]
    fn test_spike_times() {
        let mut pop = Population::new(1, "in", 2, NeuronType::spike_source_array());
        pop.set_spike_times(0, vec![1.0, 2.0]).unwrap();
        assert_eq!(pop.spike_times(0), &[1.0, 2.0]);
        assert!(pop.spike_times(1).is_empty());

        let mut lif = Population::new(0, "lif", 1, NeuronType::if_cond_exp());
        assert!(lif.set_spike_times(0, vec![1.0]).is_err());
    }

    #[test]
    fn test_recording() {
        let mut pop = Population::new(0, "p", 3, NeuronType::if_cond_exp());
        assert!(!pop.records_any(0));
        pop.record_neuron(1, "v", true).unwrap();
        assert!(pop.is_recording(1, 1));
        assert!(!pop.is_recording(0, 1));
        assert!(pop.records_any(1));
        pop.record("spikes", true).unwrap();
        assert!((0..3).all(|n| pop.is_recording(n, 0)));
        assert!(pop.record("nope", true).is_err());

        let empty = Population::new(0, "e", 0, NeuronType::if_cond_exp());
        assert!(!empty.records_any(0));
    }

    #[test]
    fn test_signal_data() {
        let mut pop = Population::new(0, "p", 1, NeuronType::spike_source_array());
        assert!(pop.spikes(0).is_none());
        let mut m = Matrix::new(Header::new([("times", NumericType::Float32)]), 2);
        m.set(0, 0, 0.5f32);
        m.set(1, 0, 1.5f32);
        pop.set_signal_data(0, 0, Arc::new(m)).unwrap();
        assert_eq!(pop.spikes(0), Some(vec![0.5, 1.5]));
        assert!(pop.set_signal_data(0, 3, Arc::new(Matrix::new(Header::default(), 0))).is_err());
        pop.clear_signals();
        assert!(pop.spikes(0).is_none());
    }
}
