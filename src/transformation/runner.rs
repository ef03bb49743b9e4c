//! Running a network through a chain of transformations.

use super::{plan, PlanOptions, Transformation, TransformationAuxData, TransformationRegistry};
use crate::{Backend, Network, Result};

/// Options of [`run_transformed`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOptions {
    /// Simulation duration in milliseconds
    pub duration: f64,
    pub plan: PlanOptions,
    /// Seed handed to transformations that draw random numbers
    pub seed: Option<u64>,
}

/// Transformations applied so far, each with the network it produced.
type Chain = Vec<(Box<dyn Transformation>, Network)>;

fn last_network<'a>(chain: &'a Chain, network: &'a Network) -> &'a Network {
    chain.last().map_or(network, |(_, net)| net)
}

/// Run `network` on `backend`, transforming it first if the backend does not
/// support all of its neuron types.
///
/// The planned transformations are applied in order, each to the result of
/// the previous one; a step whose source type is no longer present is
/// skipped. If a transformation fails it is disabled and the plan is
/// recomputed from the original network. After the run, recorded signals are
/// copied back through the chain, and the runtime record and new log records
/// are copied into `network`.
///
/// # Errors
///
/// Returns `NoTransformationPath` if no applicable chain remains, any error
/// of the backend, or an error raised while copying results back.
pub fn run_transformed<B: Backend + ?Sized>(
    backend: &mut B,
    network: &mut Network,
    registry: &TransformationRegistry,
    options: &RunOptions,
) -> Result<()> {
    let supported = backend.supported_neuron_types();
    let aux = TransformationAuxData {
        duration: options.duration,
        seed: options.seed,
    };
    let present: Vec<String> = network
        .neuron_types()
        .iter()
        .map(|t| t.name.clone())
        .collect();
    let present: Vec<&str> = present.iter().map(String::as_str).collect();
    let mut plan_options = options.plan.clone();

    let mut stages: Chain = loop {
        let steps = plan(registry, &present, &supported, &plan_options)?;

        let mut chain: Chain = Vec::new();
        let mut failed = None;
        for step in &steps {
            let current = last_network(&chain, network);
            if current.populations_of_type(&step.source).next().is_none() {
                continue;
            }
            let transformation = (step.ctor)();
            match transformation.transform(current, &aux) {
                Ok(next) => {
                    if step.lossy {
                        tracing::warn!(
                            id = %step.id, source = %step.source, target = %step.target,
                            "applied lossy transformation"
                        );
                    } else {
                        tracing::info!(
                            id = %step.id, source = %step.source, target = %step.target,
                            "applied transformation"
                        );
                    }
                    chain.push((transformation, next));
                }
                Err(e) => {
                    tracing::warn!(id = %step.id, error = %e, "transformation failed, re-planning without it");
                    failed = Some(step.id.clone());
                    break;
                }
            }
        }
        match failed {
            Some(id) => {
                plan_options.disabled.insert(id);
            }
            None => break chain,
        }
    };

    let duration = options.duration as f32;
    let base_logs = network.logs().len();
    let Some((_, last)) = stages.last_mut() else {
        return backend.run(network, duration);
    };
    backend.run(last, duration)?;
    let runtime = *last.runtime();
    let new_logs = last.logs().get(base_logs..).unwrap_or(&[]).to_vec();

    for i in (1..stages.len()).rev() {
        let (head, tail) = stages.split_at_mut(i);
        let (transformation, current) = &tail[0];
        transformation.copy_results(current, &mut head[i - 1].1)?;
    }
    let (first, first_net) = &stages[0];
    first.copy_results(first_net, network)?;

    network.set_runtime(runtime);
    network.append_logs(new_logs);
    Ok(())
}
