//! Network to binnf.
//!
//! Every block is built before the first byte is written, so a network that
//! cannot be marshalled fails without producing partial output.

use super::{MarshalOptions, NeuronTypeMap, ParameterRows, ALL_NEURONS};
use crate::binnf::BlockWriter;
use crate::{
    Block, Header, Matrix, Network, NeuronKind, NumericType, Population, Result,
    SpikeportError, SynapseKind,
};
use itertools::Itertools;
use std::borrow::Cow;
use std::io::Write;

/// Signal names over all populations, in order of first appearance.
pub fn signal_names(network: &Network) -> Vec<&str> {
    network
        .populations()
        .iter()
        .flat_map(|p| p.neuron_type().signal_names.iter().map(String::as_str))
        .unique()
        .collect()
}

/// Build the `populations` block.
///
/// # Errors
///
/// Returns `UnsupportedNeuronType` for a population whose type has no
/// ordinal in `types`.
pub fn populations_block(network: &Network, types: &NeuronTypeMap) -> Result<Block> {
    let signals = signal_names(network);
    let header = Header::new(
        ["count", "type"]
            .into_iter()
            .map(str::to_string)
            .chain(signals.iter().map(|s| format!("record_{}", s)))
            .map(|name| (name, NumericType::Int32)),
    );

    let mut matrix = Matrix::new(header, network.populations().len());
    for (row, pop) in network.populations().iter().enumerate() {
        matrix.set(row, 0, pop.size() as i32);
        matrix.set(row, 1, types.ordinal(pop.neuron_type())?);
        for (i, signal) in signals.iter().enumerate() {
            let recording = pop
                .neuron_type()
                .signal_index(signal)
                .map_or(false, |idx| pop.records_any(idx));
            matrix.set(row, 2 + i, recording as i32);
        }
    }
    Ok(Block::matrix("populations", matrix))
}

/// Header of the `connections` block.
///
/// With `plastic` set the six base columns are followed by a `synapse`
/// ordinal and every extra synapse parameter.
pub fn connection_header(plastic: bool) -> Header {
    let mut columns = vec![
        ("pid_src", NumericType::Int32),
        ("pid_tar", NumericType::Int32),
        ("nid_src", NumericType::Int32),
        ("nid_tar", NumericType::Int32),
        ("weight", NumericType::Float32),
        ("delay", NumericType::Float32),
    ];
    if plastic {
        columns.push(("synapse", NumericType::Int32));
        columns.extend(
            SynapseKind::EXTRA_COLUMNS
                .iter()
                .map(|&name| (name, NumericType::Float32)),
        );
    }
    Header::new(columns)
}

/// Build the `connections` block by instantiating every descriptor in the
/// network's sorted order.
///
/// # Errors
///
/// Returns `NonDeterministicConnectorUsed` if `options.require_deterministic`
/// is set and a descriptor uses a random connector without seed, or any error
/// raised while instantiating a connector.
pub fn connections_block(network: &Network, options: &MarshalOptions) -> Result<Block> {
    let descriptors = network.connections();
    if options.require_deterministic {
        if let Some(idx) = descriptors
            .iter()
            .position(|d| !d.connector.is_deterministic())
        {
            return Err(SpikeportError::NonDeterministicConnectorUsed(idx));
        }
    }

    let plastic = descriptors.iter().any(|d| !d.synapse.is_static());
    let expanded = descriptors
        .iter()
        .map(|d| d.instantiate())
        .collect::<Result<Vec<_>>>()?;
    let rows = expanded.iter().map(Vec::len).sum();

    let mut matrix = Matrix::new(connection_header(plastic), rows);
    let mut row = 0;
    for (descriptor, synapses) in descriptors.iter().zip(&expanded) {
        let model = &descriptor.synapse;
        let extras: Vec<f32> = SynapseKind::EXTRA_COLUMNS
            .iter()
            .map(|name| model.get(name).unwrap_or(0.0) as f32)
            .collect();
        for synapse in synapses {
            matrix.set(row, 0, descriptor.pid_src as i32);
            matrix.set(row, 1, descriptor.pid_tar as i32);
            matrix.set(row, 2, synapse.src as i32);
            matrix.set(row, 3, synapse.tar as i32);
            matrix.set(row, 4, synapse.weight as f32);
            matrix.set(row, 5, synapse.delay as f32);
            if plastic {
                matrix.set(row, 6, model.kind().ordinal());
                for (i, &value) in extras.iter().enumerate() {
                    matrix.set(row, 7 + i, value);
                }
            }
            row += 1;
        }
    }
    Ok(Block::matrix("connections", matrix))
}

fn target_block(pid: usize, nid: usize) -> Block {
    let mut matrix = Matrix::new(
        Header::new([("pid", NumericType::Int32), ("nid", NumericType::Int32)]),
        1,
    );
    matrix.set(0, 0, pid as i32);
    matrix.set(0, 1, nid as i32);
    Block::matrix("target", matrix)
}

fn spike_times_block(times: &[f64]) -> Block {
    let mut matrix = Matrix::new(Header::new([("times", NumericType::Float32)]), times.len());
    for (row, &t) in times.iter().enumerate() {
        matrix.set(row, 0, t as f32);
    }
    Block::matrix("spike_times", matrix)
}

/// Build the parameter blocks of one population.
///
/// Empty populations produce no block. Spike-time sources produce a `target`
/// and a `spike_times` block per neuron, everything else a single
/// `parameters` block.
pub fn parameter_blocks(pop: &Population, options: &MarshalOptions) -> Result<Vec<Block>> {
    if pop.is_empty() {
        return Ok(Vec::new());
    }

    let neuron_type = pop.neuron_type();
    if neuron_type.kind == NeuronKind::SpikeTimes {
        let mut blocks = Vec::with_capacity(2 * pop.size());
        for nid in 0..pop.size() {
            blocks.push(target_block(pop.pid(), nid));
            blocks.push(spike_times_block(pop.spike_times(nid)));
        }
        return Ok(blocks);
    }

    let header = Header::new(
        ["pid", "nid"]
            .into_iter()
            .map(|n| (n.to_string(), NumericType::Int32))
            .chain(
                neuron_type
                    .parameter_names
                    .iter()
                    .map(|n| (n.clone(), NumericType::Float32)),
            ),
    );

    let compact =
        options.parameter_rows == ParameterRows::Compact && pop.parameters().is_homogeneous();
    let rows: Cow<'_, [Vec<f64>]> = if compact {
        Cow::Owned(vec![pop.neuron_parameters(0).to_vec()])
    } else {
        match pop.parameters().as_per_neuron() {
            Ok(rows) => Cow::Borrowed(rows),
            Err(SpikeportError::HeterogeneousRequiresExpansion) => {
                Cow::Owned(pop.parameters().expanded(pop.size()))
            }
            Err(e) => return Err(e),
        }
    };

    let mut matrix = Matrix::new(header, rows.len());
    for (row, params) in rows.iter().enumerate() {
        let nid = if compact { ALL_NEURONS } else { row as i32 };
        matrix.set(row, 0, pop.pid() as i32);
        matrix.set(row, 1, nid);
        for (i, &value) in params.iter().enumerate() {
            matrix.set(row, 2 + i, value as f32);
        }
    }
    Ok(vec![Block::matrix("parameters", matrix)])
}

/// Lower `network` to its canonical block sequence.
pub fn marshal_blocks(
    network: &Network,
    types: &NeuronTypeMap,
    options: &MarshalOptions,
) -> Result<Vec<Block>> {
    let mut blocks = vec![
        populations_block(network, types)?,
        connections_block(network, options)?,
    ];
    for pop in network.populations() {
        blocks.extend(parameter_blocks(pop, options)?);
    }
    tracing::debug!(
        populations = network.populations().len(),
        connections = network.connections().len(),
        blocks = blocks.len(),
        "marshalled network"
    );
    Ok(blocks)
}

/// Marshal `network` into `writer`.
///
/// Nothing is written unless the whole network can be lowered.
pub fn marshal<W: Write>(
    network: &Network,
    types: &NeuronTypeMap,
    options: &MarshalOptions,
    writer: W,
) -> Result<W> {
    let blocks = marshal_blocks(network, types, options)?;
    let mut writer = BlockWriter::new(writer);
    for block in &blocks {
        writer.write_block(block)?;
    }
    writer.flush()?;
    Ok(writer.into_inner())
}

/// Marshal `network` into a byte vector.
pub fn marshal_to_vec(
    network: &Network,
    types: &NeuronTypeMap,
    options: &MarshalOptions,
) -> Result<Vec<u8>> {
    marshal(network, types, options, Vec::new())
}
