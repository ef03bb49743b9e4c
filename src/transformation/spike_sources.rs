//! Conversions between spike source types.
//!
//! Rates are in Hz, all times in milliseconds.

use super::{Transformation, TransformationAuxData};
use crate::utils::rng_from_seed;
use crate::{Network, NeuronType, Population, Result, SpikeportError, Values};
use rand::Rng;
use rand_distr::{Distribution, Exp, Normal};

/// Spike times of a Poisson process with `rate` in `[t_start, t_end)`.
///
/// # Errors
///
/// Returns `InvalidParameter` if `rate` is NaN or infinite.
pub fn poisson_spike_times<R: Rng>(
    t_start: f64,
    t_end: f64,
    rate: f64,
    rng: &mut R,
) -> Result<Vec<f64>> {
    let mut times = Vec::new();
    if rate <= 0.0 {
        return Ok(times);
    }
    if !rate.is_finite() {
        return Err(SpikeportError::InvalidParameter(format!("rate {} is not finite", rate)));
    }
    let isi = Exp::new(rate / 1000.0)
        .map_err(|e| SpikeportError::InvalidParameter(format!("rate {}: {}", rate, e)))?;
    let mut t = t_start;
    loop {
        t += isi.sample(rng);
        if t >= t_end {
            break;
        }
        times.push(t);
    }
    Ok(times)
}

/// Regular spike times with Gaussian jitter, sorted.
///
/// Produces `floor((t_end - t_start) / interval)` spikes at
/// `t_start + interval * (i + 1)` plus noise of deviation `sigma`.
///
/// # Errors
///
/// Returns `InvalidParameter` if `sigma` is negative or NaN.
pub fn constant_interval_spike_times<R: Rng>(
    t_start: f64,
    t_end: f64,
    interval: f64,
    sigma: f64,
    rng: &mut R,
) -> Result<Vec<f64>> {
    let jitter = Normal::new(0.0, sigma)
        .map_err(|e| SpikeportError::InvalidParameter(format!("sigma {}: {}", sigma, e)))?;
    if interval <= 0.0 || t_end <= t_start {
        return Ok(Vec::new());
    }
    let n = ((t_end - t_start) / interval) as usize;
    let mut times: Vec<f64> = (0..n)
        .map(|i| t_start + interval * (i + 1) as f64 + jitter.sample(rng))
        .collect();
    times.sort_by(|a, b| a.total_cmp(b));
    Ok(times)
}

/// Replace every population of type `source` by one of type `target`.
///
/// `convert` maps one parameter vector. Uniform storage stays uniform unless
/// `dehomogenise` returns true for it, in which case `convert` runs once per
/// neuron. Record flags are carried over by signal name.
fn rewrite<D, F>(
    network: &Network,
    source: &str,
    target: NeuronType,
    dehomogenise: D,
    mut convert: F,
) -> Result<Network>
where
    D: Fn(&[f64]) -> bool,
    F: FnMut(&[f64]) -> Result<Vec<f64>>,
{
    let mut result = network.clone();
    for pop in network.populations_of_type(source) {
        let parameters = match pop.parameters() {
            Values::Uniform(p) if !dehomogenise(p.as_slice()) => Values::Uniform(convert(p.as_slice())?),
            values => Values::PerNeuron(
                values
                    .expanded(pop.size())
                    .iter()
                    .map(|p| convert(p.as_slice()))
                    .collect::<Result<_>>()?,
            ),
        };
        let src_type = pop.neuron_type();
        let record = pop.record_flags().map(|flags| {
            target
                .signal_names
                .iter()
                .map(|name| src_type.signal_index(name).map_or(false, |i| flags[i]))
                .collect::<Vec<bool>>()
        });

        let mut replacement = Population::new(pop.pid(), pop.name(), pop.size(), target.clone());
        replacement.set_parameters(parameters)?;
        replacement.set_record_flags(record)?;
        result.replace_population(replacement)?;
    }
    Ok(result)
}

fn failed(id: &str, reason: String) -> SpikeportError {
    SpikeportError::TransformationFailed {
        id: id.to_string(),
        reason,
    }
}

fn never(_: &[f64]) -> bool {
    false
}

/// Constant interval to constant frequency source.
#[derive(Debug, Clone, Copy, Default)]
pub struct CIToCF;

impl Transformation for CIToCF {
    fn id(&self) -> &str {
        "CIToCF"
    }

    fn transform(&self, network: &Network, _aux: &TransformationAuxData) -> Result<Network> {
        rewrite(
            network,
            "SpikeSourceConstInterval",
            NeuronType::spike_source_const_freq(),
            never,
            |p| {
                if p[0] <= 0.0 {
                    return Err(failed(self.id(), format!("interval {} is not positive", p[0])));
                }
                Ok(vec![1000.0 / p[0], p[1], p[2], p[3]])
            },
        )
    }
}

/// Constant frequency to constant interval source.
#[derive(Debug, Clone, Copy, Default)]
pub struct CFToCI;

impl Transformation for CFToCI {
    fn id(&self) -> &str {
        "CFToCI"
    }

    fn transform(&self, network: &Network, _aux: &TransformationAuxData) -> Result<Network> {
        rewrite(
            network,
            "SpikeSourceConstFreq",
            NeuronType::spike_source_const_interval(),
            never,
            |p| {
                if p[0] <= 0.0 {
                    return Err(failed(self.id(), format!("rate {} is not positive", p[0])));
                }
                Ok(vec![1000.0 / p[0], p[1], p[2], p[3]])
            },
        )
    }
}

/// Poisson source to spike source array with pre-drawn spike times.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoissonToSA;

impl Transformation for PoissonToSA {
    fn id(&self) -> &str {
        "PoissonToSA"
    }

    fn transform(&self, network: &Network, aux: &TransformationAuxData) -> Result<Network> {
        let mut rng = rng_from_seed(aux.seed);
        rewrite(
            network,
            "SpikeSourcePoisson",
            NeuronType::spike_source_array(),
            |_| true,
            |p| {
                poisson_spike_times(p[1], p[1] + p[2], p[0], &mut rng)
                    .map_err(|e| failed(self.id(), e.to_string()))
            },
        )
    }
}

/// Constant frequency source to spike source array.
#[derive(Debug, Clone, Copy, Default)]
pub struct CFToSA;

impl Transformation for CFToSA {
    fn id(&self) -> &str {
        "CFToSA"
    }

    fn transform(&self, network: &Network, aux: &TransformationAuxData) -> Result<Network> {
        let mut rng = rng_from_seed(aux.seed);
        rewrite(
            network,
            "SpikeSourceConstFreq",
            NeuronType::spike_source_array(),
            |p| p[3] > 0.0,
            |p| {
                let interval = if p[0] > 0.0 { 1000.0 / p[0] } else { 0.0 };
                constant_interval_spike_times(p[1], p[1] + p[2], interval, p[3], &mut rng)
                    .map_err(|e| failed(self.id(), e.to_string()))
            },
        )
    }
}
