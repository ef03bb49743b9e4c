//! binnf response to Network.

use super::LOG_MODULE;
use crate::binnf::BlockReader;
use crate::{
    Block, ByteString, LogRecord, Matrix, MatrixBlock, Network, NumericType, Result, Runtime,
    Severity, SpikeportError,
};
use std::io::Read;
use std::sync::Arc;

const SPIKE_COLUMNS: [(&str, NumericType); 1] = [("times", NumericType::Float32)];
const TRACE_COLUMNS: [(&str, NumericType); 2] = [
    ("times", NumericType::Float32),
    ("values", NumericType::Float32),
];

/// Outcome of folding a response stream.
#[derive(Debug, Default)]
pub struct ResponseSummary {
    /// Number of blocks decoded
    pub blocks: usize,
    /// Codec diagnostics and blocks that could not be folded
    pub diagnostics: Vec<SpikeportError>,
}

/// Folds response blocks into a network one at a time.
///
/// The only state is the neuron addressed by the last `target` block.
/// `spike_times` and `runtimes` consume the target, `trace_<signal>` keeps it
/// so several traces of one neuron can follow a single `target`.
pub struct ResponseFolder<'a> {
    network: &'a mut Network,
    current_target: Option<(usize, usize)>,
}

fn malformed(block: &ByteString, reason: impl Into<String>) -> SpikeportError {
    SpikeportError::MalformedColumns {
        block: block.to_string(),
        reason: reason.into(),
    }
}

/// Column `name` of an index-valued block; must be an integer column.
fn index_column(block: &MatrixBlock, name: &str) -> Result<usize> {
    let header = block.matrix.header();
    let col = header.require(name)?;
    if header.numeric_type(col).is_float() {
        return Err(SpikeportError::UnknownColumnType(name.to_string()));
    }
    Ok(col)
}

fn single_row(block: &MatrixBlock) -> Result<()> {
    match block.matrix.rows() {
        1 => Ok(()),
        n => Err(malformed(&block.name, format!("expected 1 row, got {}", n))),
    }
}

impl<'a> ResponseFolder<'a> {
    pub fn new(network: &'a mut Network) -> Self {
        Self {
            network,
            current_target: None,
        }
    }

    /// Neuron addressed by the last `target` block, as `(pid, nid)`.
    pub fn current_target(&self) -> Option<(usize, usize)> {
        self.current_target
    }

    pub fn network(&mut self) -> &mut Network {
        self.network
    }

    /// Fold one block.
    ///
    /// Unknown matrix blocks are accepted and discarded.
    pub fn fold(&mut self, block: Block) -> Result<()> {
        match block {
            Block::Log(record) => {
                self.network.log(record);
                Ok(())
            }
            Block::Matrix(block) => match block.name.as_bytes() {
                b"target" => self.fold_target(&block),
                b"spike_times" => self.fold_spike_times(block),
                b"runtimes" => self.fold_runtimes(&block),
                name if name.starts_with(b"trace_") => self.fold_trace(block),
                _ => {
                    tracing::debug!(block = %block.name, rows = block.matrix.rows(), "ignoring unknown block");
                    Ok(())
                }
            },
        }
    }

    fn fold_target(&mut self, block: &MatrixBlock) -> Result<()> {
        self.current_target = None;
        single_row(block)?;
        let pid_col = index_column(block, "pid")?;
        let nid_col = index_column(block, "nid")?;
        let pid: i64 = block.matrix.get(0, pid_col);
        let nid: i64 = block.matrix.get(0, nid_col);

        let valid = usize::try_from(pid)
            .ok()
            .zip(usize::try_from(nid).ok())
            .filter(|&(p, n)| {
                self.network
                    .populations()
                    .get(p)
                    .map_or(false, |pop| n < pop.size())
            });
        match valid {
            Some(target) => {
                self.current_target = Some(target);
                Ok(())
            }
            None => Err(SpikeportError::InvalidTarget { pid, nid }),
        }
    }

    fn fold_spike_times(&mut self, block: MatrixBlock) -> Result<()> {
        let (pid, nid) = self
            .current_target
            .take()
            .ok_or_else(|| SpikeportError::TargetRequired(block.name.to_string()))?;
        if !block.matrix.header().matches(&SPIKE_COLUMNS) {
            return Err(malformed(
                &block.name,
                format!("expected [times:f32], got {}", block.matrix.header()),
            ));
        }
        self.install(pid, nid, "spikes", block.matrix)
    }

    fn fold_trace(&mut self, block: MatrixBlock) -> Result<()> {
        let (pid, nid) = self
            .current_target
            .ok_or_else(|| SpikeportError::TargetRequired(block.name.to_string()))?;
        if !block.matrix.header().matches(&TRACE_COLUMNS) {
            return Err(malformed(
                &block.name,
                format!("expected [times:f32, values:f32], got {}", block.matrix.header()),
            ));
        }
        // signal names are text; a name that is not cannot be recorded
        match std::str::from_utf8(&block.name.as_bytes()["trace_".len()..]) {
            Ok(signal) => {
                let signal = signal.to_string();
                self.install(pid, nid, &signal, block.matrix)
            }
            Err(_) => {
                tracing::debug!(pid, nid, block = %block.name, "discarding trace of non-text signal");
                Ok(())
            }
        }
    }

    fn fold_runtimes(&mut self, block: &MatrixBlock) -> Result<()> {
        self.current_target = None;
        single_row(block)?;
        let header = block.matrix.header();
        let read = |name: &str| -> Result<f64> {
            let col = header
                .index(name)
                .ok_or_else(|| malformed(&block.name, format!("missing column \"{}\"", name)))?;
            Ok(block.matrix.get(0, col))
        };
        let runtime = Runtime {
            total: read("total")?,
            sim: read("sim")?,
            initialize: read("initialize")?,
            finalize: read("finalize")?,
        };
        self.network.set_runtime(runtime);
        Ok(())
    }

    /// Install `matrix` as the data of `signal` if the neuron records it.
    fn install(&mut self, pid: usize, nid: usize, signal: &str, matrix: Matrix) -> Result<()> {
        let pop = self.network.population_mut(pid)?;
        match pop.neuron_type().signal_index(signal) {
            Some(idx) if pop.is_recording(nid, idx) => {
                pop.set_signal_data(nid, idx, Arc::new(matrix))
            }
            _ => {
                tracing::debug!(pid, nid, signal, "discarding data of unrecorded signal");
                Ok(())
            }
        }
    }
}

/// Fold a response stream into `network`.
///
/// Corrupt blocks and blocks that cannot be folded are reported in the
/// summary and logged to the network at `ERROR` severity; folding continues
/// with the next block. Only an I/O error of the underlying stream ends the
/// fold early, in which case everything folded so far stays in the network.
pub fn marshal_response<R: Read>(network: &mut Network, reader: R) -> Result<ResponseSummary> {
    let mut summary = ResponseSummary::default();
    let mut folder = ResponseFolder::new(network);
    for item in BlockReader::new(reader) {
        let err = match item {
            Ok(block) => {
                summary.blocks += 1;
                match folder.fold(block) {
                    Ok(()) => continue,
                    Err(e) => e,
                }
            }
            Err(e) if e.is_recoverable() => e,
            Err(e) => return Err(e),
        };
        folder.network().log(LogRecord::now(
            Severity::Error,
            LOG_MODULE,
            format!("error while reading response: {}", err),
        ));
        summary.diagnostics.push(err);
    }
    Ok(summary)
}

/// Fold an in-memory response into `network`.
pub fn marshal_response_bytes(network: &mut Network, bytes: &[u8]) -> Result<ResponseSummary> {
    marshal_response(network, bytes)
}
