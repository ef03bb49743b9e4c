//! Shortest transformation chains.
//!
//! Nodes are neuron type names, edges are registry entries weighted by their
//! cost. For every unsupported type of the network a Dijkstra search runs
//! until it pops the first supported node. Path keys order by
//! `(uses a lossy edge, total cost)`, so among paths that are allowed a
//! lossless one always wins.

use super::{RegistryEntry, TransformationCtor, TransformationRegistry};
use crate::{Result, SpikeportError};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

/// Planner options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanOptions {
    /// Fall back to lossy transformations if no lossless chain exists
    pub allow_lossy: bool,
    /// Identifiers of transformations the planner must not use
    pub disabled: BTreeSet<String>,
}

/// One transformation of a plan.
#[derive(Clone)]
pub struct PlanStep {
    pub id: String,
    pub source: String,
    pub target: String,
    pub cost: u32,
    pub lossy: bool,
    pub ctor: TransformationCtor,
}

impl std::fmt::Debug for PlanStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} -> {} (cost {}{})",
            self.id,
            self.source,
            self.target,
            self.cost,
            if self.lossy { ", lossy" } else { "" }
        )
    }
}

impl From<&RegistryEntry> for PlanStep {
    fn from(entry: &RegistryEntry) -> Self {
        Self {
            id: entry.id.clone(),
            source: entry.source.clone(),
            target: entry.target.clone(),
            cost: entry.properties.cost,
            lossy: entry.properties.lossy,
            ctor: entry.ctor,
        }
    }
}

type Key = (bool, u64);

struct Graph<'a> {
    names: Vec<&'a str>,
    /// Outgoing registry entries per node
    edges: Vec<Vec<&'a RegistryEntry>>,
    index: BTreeMap<&'a str, usize>,
}

impl<'a> Graph<'a> {
    fn new(
        registry: &'a TransformationRegistry,
        present: &[&'a str],
        disabled: &BTreeSet<String>,
        lossy: bool,
    ) -> Self {
        let mut graph = Graph {
            names: Vec::new(),
            edges: Vec::new(),
            index: BTreeMap::new(),
        };
        for &name in present {
            graph.node(name);
        }
        for entry in registry.entries() {
            let src = graph.node(&entry.source);
            graph.node(&entry.target);
            if disabled.contains(&entry.id) || (entry.properties.lossy && !lossy) {
                continue;
            }
            graph.edges[src].push(entry);
        }
        graph
    }

    fn node(&mut self, name: &'a str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.names.len();
        self.names.push(name);
        self.edges.push(Vec::new());
        self.index.insert(name, idx);
        idx
    }

    /// Dijkstra from `start` to the closest node with `supported[node]`.
    ///
    /// Returns the edges of the path from the supported node back to `start`.
    fn search(&self, start: usize, supported: &[bool]) -> Option<Vec<&'a RegistryEntry>> {
        let n = self.names.len();
        let mut best: Vec<Option<Key>> = vec![None; n];
        let mut prev: Vec<Option<&'a RegistryEntry>> = vec![None; n];
        let mut heap = BinaryHeap::new();
        best[start] = Some((false, 0));
        heap.push(Reverse(((false, 0u64), start)));

        while let Some(Reverse((key, node))) = heap.pop() {
            if best[node].map_or(false, |b| b < key) {
                continue;
            }
            if supported[node] {
                let mut path = Vec::new();
                let mut cur = node;
                while let Some(entry) = prev[cur] {
                    path.push(entry);
                    cur = self.index[entry.source.as_str()];
                }
                return Some(path);
            }
            for &entry in &self.edges[node] {
                let next = self.index[entry.target.as_str()];
                let cand = (key.0 || entry.properties.lossy, key.1 + entry.properties.cost as u64);
                if best[next].map_or(true, |b| cand < b) {
                    best[next] = Some(cand);
                    prev[next] = Some(entry);
                    heap.push(Reverse((cand, next)));
                }
            }
        }
        None
    }
}

/// Plan a single pass; `Err(type)` names the first type without a path.
fn plan_pass<'a>(
    registry: &'a TransformationRegistry,
    present: &[&'a str],
    supported: &BTreeSet<String>,
    disabled: &BTreeSet<String>,
    lossy: bool,
) -> std::result::Result<Vec<PlanStep>, String> {
    let graph = Graph::new(registry, present, disabled, lossy);
    let mut reachable: Vec<bool> = graph
        .names
        .iter()
        .map(|name| supported.contains(*name))
        .collect();

    let mut steps = Vec::new();
    for name in present {
        let start = graph.index[name];
        if reachable[start] {
            continue;
        }
        let path = graph.search(start, &reachable).ok_or_else(|| name.to_string())?;
        for entry in path {
            reachable[graph.index[entry.source.as_str()]] = true;
            steps.push(PlanStep::from(entry));
        }
    }
    steps.reverse();
    Ok(steps)
}

/// Find the chain of transformations that maps every type in `present` to a
/// type in `supported`.
///
/// The steps are in application order. A first pass only uses lossless
/// transformations; if that fails and `options.allow_lossy` is set, the whole
/// plan is repeated with lossy transformations enabled.
///
/// # Errors
///
/// Returns `NoTransformationPath` naming the first type that cannot be mapped.
pub fn plan(
    registry: &TransformationRegistry,
    present: &[&str],
    supported: &BTreeSet<String>,
    options: &PlanOptions,
) -> Result<Vec<PlanStep>> {
    let steps = match plan_pass(registry, present, supported, &options.disabled, false) {
        Ok(steps) => steps,
        Err(_) if options.allow_lossy => {
            let steps = plan_pass(registry, present, supported, &options.disabled, true)
                .map_err(SpikeportError::NoTransformationPath)?;
            for step in steps.iter().filter(|s| s.lossy) {
                tracing::warn!(id = %step.id, source = %step.source, target = %step.target, "planning lossy transformation");
            }
            steps
        }
        Err(name) => return Err(SpikeportError::NoTransformationPath(name)),
    };
    tracing::debug!(plan = ?steps, "transformation plan");
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformation::{Transformation, TransformationAuxData, TransformationProperties};
    use crate::Network;

    struct Edge;

    impl Transformation for Edge {
        fn id(&self) -> &str {
            "edge"
        }

        fn properties(&self) -> TransformationProperties {
            TransformationProperties { cost: 1, lossy: false }
        }

        fn transform(&self, network: &Network, _aux: &TransformationAuxData) -> Result<Network> {
            Ok(network.clone())
        }
    }

    fn supported(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_supported_types_need_no_plan() {
        let registry = TransformationRegistry::with_builtin();
        let steps = plan(&registry, &["SpikeSourceArray"], &supported(&["SpikeSourceArray"]), &PlanOptions::default())
            .unwrap();
        assert!(steps.is_empty());
    }

    #[test]
    fn test_chain_in_application_order() {
        let registry = TransformationRegistry::with_builtin();
        let steps = plan(
            &registry,
            &["SpikeSourceConstInterval"],
            &supported(&["SpikeSourceArray"]),
            &PlanOptions::default(),
        )
        .unwrap();
        let ids: Vec<&str> = steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["CIToCF", "CFToSA"]);
    }

    #[test]
    fn test_shared_prefix_applied_first() {
        let registry = TransformationRegistry::with_builtin();
        let steps = plan(
            &registry,
            &["SpikeSourceConstInterval", "SpikeSourceConstFreq"],
            &supported(&["SpikeSourceArray"]),
            &PlanOptions::default(),
        )
        .unwrap();
        let ids: Vec<&str> = steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["CIToCF", "CFToSA"]);
    }

    #[test]
    fn test_unknown_type_has_no_path() {
        let mut registry = TransformationRegistry::new();
        registry.register_neuron_type_transformation(|| Box::new(Edge), "A", "B");
        assert!(matches!(
            plan(&registry, &["C"], &supported(&["B"]), &PlanOptions::default()),
            Err(SpikeportError::NoTransformationPath(name)) if name == "C"
        ));
    }

    #[test]
    fn test_disabled_transformation() {
        let mut registry = TransformationRegistry::new();
        registry.register_neuron_type_transformation(|| Box::new(Edge), "A", "B");
        let options = PlanOptions {
            allow_lossy: true,
            disabled: supported(&["edge"]),
        };
        assert!(plan(&registry, &["A"], &supported(&["B"]), &options).is_err());
    }
}
