//! Connectors - symbolic projections between neuron ranges.
//!
//! A [`Connector`] describes how a source range connects to a target range.
//! [`Connector::instantiate`] expands it into explicit
//! [`LocalConnection`]s. Random connectors carry an `Option<u64>` seed: with a
//! seed the expansion is reproducible, without one it draws fresh entropy on
//! every call.
//!
//! Expansion order:
//!
//! - `AllToAll`: `(src, tar)` lexicographic
//! - `OneToOne`: `src[i] -> tar[i]`
//! - `FixedFanIn`: target ascending, then selection order
//! - `FixedFanOut`: source ascending, then selection order
//! - `FixedProbability`: the kept subset of the inner connector, order kept
//! - `List`: as given
//!
//! # Examples
//!
//! ```
//! use spikeport::Connector;
//!
//! let conn = Connector::FixedFanIn { k: 2, weight: 0.1, delay: 1.0, seed: Some(3) };
//! let a = conn.instantiate(0..10, 0..4).unwrap();
//! let b = conn.instantiate(0..10, 0..4).unwrap();
//! assert_eq!(a.len(), 8);
//! assert_eq!(a, b);
//! ```

use crate::utils::rng_from_seed;
use crate::{Result, SpikeportError, SynapseModel};
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// One explicit synapse between two neurons of a known population pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalConnection {
    pub src: usize,
    pub tar: usize,
    pub weight: f64,
    pub delay: f64,
}

impl LocalConnection {
    pub fn new(src: usize, tar: usize, weight: f64, delay: f64) -> Self {
        Self {
            src,
            tar,
            weight,
            delay,
        }
    }
}

/// Symbolic description of a projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Connector {
    AllToAll {
        weight: f64,
        delay: f64,
    },
    OneToOne {
        weight: f64,
        delay: f64,
    },
    /// `k` distinct sources per target
    FixedFanIn {
        k: usize,
        weight: f64,
        delay: f64,
        seed: Option<u64>,
    },
    /// `k` distinct targets per source
    FixedFanOut {
        k: usize,
        weight: f64,
        delay: f64,
        seed: Option<u64>,
    },
    /// Keep each synapse of `inner` with probability `p`
    FixedProbability {
        inner: Box<Connector>,
        p: f64,
        seed: Option<u64>,
    },
    /// Explicit synapses with absolute neuron indices
    List(Vec<LocalConnection>),
}

impl Connector {
    pub fn all_to_all(weight: f64, delay: f64) -> Self {
        Connector::AllToAll { weight, delay }
    }

    pub fn one_to_one(weight: f64, delay: f64) -> Self {
        Connector::OneToOne { weight, delay }
    }

    pub fn fixed_fan_in(k: usize, weight: f64, delay: f64, seed: Option<u64>) -> Self {
        Connector::FixedFanIn {
            k,
            weight,
            delay,
            seed,
        }
    }

    pub fn fixed_fan_out(k: usize, weight: f64, delay: f64, seed: Option<u64>) -> Self {
        Connector::FixedFanOut {
            k,
            weight,
            delay,
            seed,
        }
    }

    pub fn fixed_probability(inner: Connector, p: f64, seed: Option<u64>) -> Self {
        Connector::FixedProbability {
            inner: Box::new(inner),
            p,
            seed,
        }
    }

    /// Short name used in log messages.
    pub fn name(&self) -> &'static str {
        match self {
            Connector::AllToAll { .. } => "AllToAllConnector",
            Connector::OneToOne { .. } => "OneToOneConnector",
            Connector::FixedFanIn { .. } => "FixedFanInConnector",
            Connector::FixedFanOut { .. } => "FixedFanOutConnector",
            Connector::FixedProbability { .. } => "FixedProbabilityConnector",
            Connector::List(_) => "FromListConnector",
        }
    }

    /// True if two expansions over the same ranges are guaranteed equal.
    pub fn is_deterministic(&self) -> bool {
        match self {
            Connector::AllToAll { .. } | Connector::OneToOne { .. } | Connector::List(_) => true,
            Connector::FixedFanIn { seed, .. } | Connector::FixedFanOut { seed, .. } => {
                seed.is_some()
            }
            Connector::FixedProbability { inner, seed, .. } => {
                seed.is_some() && inner.is_deterministic()
            }
        }
    }

    /// Check that the connector can be expanded over the given range sizes.
    pub fn validate(&self, src: &Range<usize>, tar: &Range<usize>) -> Result<()> {
        match self {
            Connector::OneToOne { .. } if src.len() != tar.len() => {
                Err(SpikeportError::SizeMismatch {
                    src: src.len(),
                    tar: tar.len(),
                })
            }
            Connector::FixedFanIn { k, .. } if *k > src.len() => {
                Err(SpikeportError::FanInExceedsSource {
                    requested: *k,
                    available: src.len(),
                })
            }
            Connector::FixedFanOut { k, .. } if *k > tar.len() => {
                Err(SpikeportError::FanInExceedsSource {
                    requested: *k,
                    available: tar.len(),
                })
            }
            Connector::FixedProbability { inner, p, .. } => {
                if !(0.0..=1.0).contains(p) {
                    return Err(SpikeportError::InvalidParameter(format!(
                        "connection probability {} outside [0, 1]",
                        p
                    )));
                }
                inner.validate(src, tar)
            }
            Connector::List(entries) => {
                match entries
                    .iter()
                    .find(|c| !src.contains(&c.src) || !tar.contains(&c.tar))
                {
                    Some(c) => Err(SpikeportError::InvalidConnection(format!(
                        "list entry {} -> {} outside {:?} -> {:?}",
                        c.src, c.tar, src, tar
                    ))),
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }

    /// Expected number of synapses, exact for all but `FixedProbability`.
    pub fn connection_count(&self, src: &Range<usize>, tar: &Range<usize>) -> usize {
        match self {
            Connector::AllToAll { .. } => src.len() * tar.len(),
            Connector::OneToOne { .. } => src.len(),
            Connector::FixedFanIn { k, .. } => k * tar.len(),
            Connector::FixedFanOut { k, .. } => k * src.len(),
            Connector::FixedProbability { inner, p, .. } => {
                (inner.connection_count(src, tar) as f64 * p).ceil() as usize
            }
            Connector::List(entries) => entries.len(),
        }
    }

    /// Expand into explicit synapses.
    ///
    /// # Errors
    ///
    /// `SizeMismatch` for a one-to-one connector over ranges of different
    /// size, `FanInExceedsSource` if a fixed fan-in/out exceeds its range,
    /// `InvalidParameter` for a probability outside `[0, 1]`, and
    /// `InvalidConnection` for list entries outside the ranges.
    pub fn instantiate(&self, src: Range<usize>, tar: Range<usize>) -> Result<Vec<LocalConnection>> {
        self.validate(&src, &tar)?;
        let mut out = Vec::with_capacity(self.connection_count(&src, &tar));
        match self {
            Connector::AllToAll { weight, delay } => {
                for s in src.clone() {
                    for t in tar.clone() {
                        out.push(LocalConnection::new(s, t, *weight, *delay));
                    }
                }
            }
            Connector::OneToOne { weight, delay } => {
                out.extend(
                    src.zip(tar)
                        .map(|(s, t)| LocalConnection::new(s, t, *weight, *delay)),
                );
            }
            Connector::FixedFanIn {
                k,
                weight,
                delay,
                seed,
            } => {
                let mut rng = rng_from_seed(*seed);
                let (first, n) = (src.start, src.len());
                for t in tar {
                    for i in index::sample(&mut rng, n, *k) {
                        out.push(LocalConnection::new(first + i, t, *weight, *delay));
                    }
                }
            }
            Connector::FixedFanOut {
                k,
                weight,
                delay,
                seed,
            } => {
                let mut rng = rng_from_seed(*seed);
                let (first, n) = (tar.start, tar.len());
                for s in src {
                    for i in index::sample(&mut rng, n, *k) {
                        out.push(LocalConnection::new(s, first + i, *weight, *delay));
                    }
                }
            }
            Connector::FixedProbability { inner, p, seed } => {
                let mut rng = rng_from_seed(*seed);
                out.extend(
                    inner
                        .instantiate(src, tar)?
                        .into_iter()
                        .filter(|_| rng.gen::<f64>() < *p),
                );
            }
            Connector::List(entries) => out.extend_from_slice(entries),
        }
        Ok(out)
    }
}

/// A connector applied to a pair of neuron ranges.
///
/// Descriptors order lexicographically by
/// `(pid_src, nid_src0, nid_src1, pid_tar, nid_tar0, nid_tar1)`; the network
/// keeps its descriptors sorted by this key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    pub pid_src: usize,
    pub nid_src0: usize,
    pub nid_src1: usize,
    pub pid_tar: usize,
    pub nid_tar0: usize,
    pub nid_tar1: usize,
    pub connector: Connector,
    pub synapse: SynapseModel,
}

impl ConnectionDescriptor {
    pub fn new(
        pid_src: usize,
        src: Range<usize>,
        pid_tar: usize,
        tar: Range<usize>,
        connector: Connector,
    ) -> Self {
        Self {
            pid_src,
            nid_src0: src.start,
            nid_src1: src.end,
            pid_tar,
            nid_tar0: tar.start,
            nid_tar1: tar.end,
            connector,
            synapse: SynapseModel::default(),
        }
    }

    pub fn with_synapse(mut self, synapse: SynapseModel) -> Self {
        self.synapse = synapse;
        self
    }

    #[inline]
    pub fn src(&self) -> Range<usize> {
        self.nid_src0..self.nid_src1
    }

    #[inline]
    pub fn tar(&self) -> Range<usize> {
        self.nid_tar0..self.nid_tar1
    }

    /// Sort key.
    #[inline]
    pub fn key(&self) -> (usize, usize, usize, usize, usize, usize) {
        (
            self.pid_src,
            self.nid_src0,
            self.nid_src1,
            self.pid_tar,
            self.nid_tar0,
            self.nid_tar1,
        )
    }

    /// Expand the connector over the descriptor's ranges.
    pub fn instantiate(&self) -> Result<Vec<LocalConnection>> {
        self.connector.instantiate(self.src(), self.tar())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_to_all_order() {
        let conns = Connector::all_to_all(0.5, 1.0).instantiate(0..2, 3..5).unwrap();
        let pairs: Vec<(usize, usize)> = conns.iter().map(|c| (c.src, c.tar)).collect();
        assert_eq!(pairs, vec![(0, 3), (0, 4), (1, 3), (1, 4)]);
        assert!(conns.iter().all(|c| c.weight == 0.5 && c.delay == 1.0));
    }

    #[test]
    fn test_one_to_one_size_mismatch() {
        let conn = Connector::one_to_one(1.0, 1.0);
        assert_eq!(conn.instantiate(2..5, 0..3).unwrap().len(), 3);
        assert!(matches!(
            conn.instantiate(0..3, 0..4),
            Err(SpikeportError::SizeMismatch { src: 3, tar: 4 })
        ));
    }

    #[test]
    fn test_fixed_fan_in() {
        let conn = Connector::fixed_fan_in(3, 1.0, 1.0, Some(11));
        let conns = conn.instantiate(0..5, 0..4).unwrap();
        assert_eq!(conns.len(), 12);
        for (t, chunk) in conns.chunks(3).enumerate() {
            assert!(chunk.iter().all(|c| c.tar == t));
            let mut srcs: Vec<usize> = chunk.iter().map(|c| c.src).collect();
            srcs.sort();
            srcs.dedup();
            assert_eq!(srcs.len(), 3);
        }
        assert!(matches!(
            Connector::fixed_fan_in(6, 1.0, 1.0, None).instantiate(0..5, 0..1),
            Err(SpikeportError::FanInExceedsSource { requested: 6, available: 5 })
        ));
    }

    #[test]
    fn test_fixed_fan_out() {
        let conns = Connector::fixed_fan_out(2, 1.0, 1.0, Some(5))
            .instantiate(0..3, 10..20)
            .unwrap();
        assert_eq!(conns.len(), 6);
        assert_eq!(conns.iter().map(|c| c.src).collect::<Vec<_>>(), vec![0, 0, 1, 1, 2, 2]);
        assert!(conns.iter().all(|c| (10..20).contains(&c.tar)));
    }

    #[test]
    fn test_fixed_probability_bounds() {
        let all = Connector::fixed_probability(Connector::all_to_all(1.0, 1.0), 1.0, Some(0));
        assert_eq!(all.instantiate(0..4, 0..4).unwrap().len(), 16);
        let none = Connector::fixed_probability(Connector::all_to_all(1.0, 1.0), 0.0, Some(0));
        assert!(none.instantiate(0..4, 0..4).unwrap().is_empty());
        let bad = Connector::fixed_probability(Connector::all_to_all(1.0, 1.0), 1.5, Some(0));
        assert!(matches!(
            bad.instantiate(0..1, 0..1),
            Err(SpikeportError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_list_passthrough_and_validation() {
        let entries = vec![LocalConnection::new(1, 0, 0.2, 1.5), LocalConnection::new(0, 2, 0.1, 1.0)];
        let conn = Connector::List(entries.clone());
        assert_eq!(conn.instantiate(0..2, 0..3).unwrap(), entries);
        assert!(matches!(
            conn.instantiate(0..1, 0..3),
            Err(SpikeportError::InvalidConnection(_))
        ));
    }

    #[test]
    fn test_determinism_flags() {
        assert!(Connector::all_to_all(1.0, 1.0).is_deterministic());
        assert!(!Connector::fixed_fan_in(1, 1.0, 1.0, None).is_deterministic());
        let seeded_outer_unseeded_inner =
            Connector::fixed_probability(Connector::fixed_fan_out(1, 1.0, 1.0, None), 0.5, Some(1));
        assert!(!seeded_outer_unseeded_inner.is_deterministic());
    }

    #[test]
    fn test_descriptor_key_order() {
        let a = ConnectionDescriptor::new(0, 0..5, 1, 0..5, Connector::all_to_all(1.0, 1.0));
        let b = ConnectionDescriptor::new(0, 0..5, 0, 0..5, Connector::all_to_all(1.0, 1.0));
        assert!(b.key() < a.key());
        assert_eq!(a.src(), 0..5);
    }
}
