//! Monte Carlo batches: many independent trials of one configuration on a worker pool.

use crate::{
    network::Network,
    parameters::Parameters,
    report::{EdgeClassifier, TrialRecord},
    simulation::run_trial_with_classifier,
    IxaError,
};
use log::info;
use rayon::{prelude::*, ThreadPoolBuilder};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct BatchOptions {
    /// Worker threads. `None` lets the pool pick one per available core.
    pub threads: Option<usize>,
    /// Overrides [`Network::classify_edge`] in every record.
    pub classifier: Option<EdgeClassifier>,
}

/// Runs trials `0..runs` of `parameters` on `network` and returns their records ordered by trial.
///
/// Each worker builds its own `Context` for every trial it picks up, so the only thing trials
/// share is the read-only topology. Parameters are validated once up front; if any trial fails
/// anyway, the first failure is returned.
pub fn run_batch(
    network: &Arc<Network>,
    parameters: &Parameters,
    runs: usize,
    options: &BatchOptions,
) -> Result<Vec<TrialRecord>, IxaError> {
    parameters.validate(network)?;

    let mut builder = ThreadPoolBuilder::new();
    if let Some(threads) = options.threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder.build()?;

    info!(
        "running {runs} trials on {} threads ({} nodes, {} edges)",
        pool.current_num_threads(),
        network.node_count(),
        network.edge_count()
    );

    let classifier = options.classifier.as_ref();
    let records = pool.install(|| {
        (0..runs)
            .into_par_iter()
            .map(|trial_id| run_trial_with_classifier(network, parameters, trial_id, classifier))
            .collect::<Result<Vec<_>, IxaError>>()
    })?;

    info!("finished {runs} trials");
    Ok(records)
}
