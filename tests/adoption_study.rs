//! Full adoption of the tracing app should shrink outbreaks on a small-world network.

use ixa_contact_tracing::network::connected_watts_strogatz;
use ixa_contact_tracing::{
    run_batch, BatchOptions, EdgeRate, NodeRate, Parameters, TrialRecord, TrialStatus,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;

const RUNS: usize = 50;

fn study(adoption: f64) -> Vec<TrialRecord> {
    let mut rng = StdRng::seed_from_u64(2020);
    let network = Arc::new(connected_watts_strogatz(100, 4, 0.1, 100, &mut rng).unwrap());
    let parameters = Parameters {
        adoption: NodeRate::Constant(adoption),
        activation: EdgeRate::Constant(0.5),
        tracing: EdgeRate::Constant(1.0),
        beta_hat: 0.4,
        alpha: 0.25,
        gamma: 0.1,
        zeta: 0.1,
        limit: 10,
        max_steps: None,
        seed: 1,
    };
    run_batch(&network, &parameters, RUNS, &BatchOptions::default()).unwrap()
}

fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, variance)
}

#[test]
fn full_adoption_reduces_infected_ratio() {
    let with_app = study(1.0);
    let without_app = study(0.0);

    for record in with_app.iter().chain(&without_app) {
        assert_eq!(record.status, TrialStatus::BurnedOut);
        assert!((0.0..=1.0).contains(&record.infected_ratio));
    }
    // Nobody adopts, so nothing is ever recorded.
    assert!(without_app.iter().all(|record| record.traced_contacts == 0));

    let ratios = |records: &[TrialRecord]| -> Vec<f64> {
        records.iter().map(|record| record.infected_ratio).collect()
    };
    let (mean_with, var_with) = mean_and_variance(&ratios(&with_app));
    let (mean_without, var_without) = mean_and_variance(&ratios(&without_app));

    // Welch's t statistic.
    let n = RUNS as f64;
    let t = (mean_without - mean_with) / (var_with / n + var_without / n).sqrt();
    assert!(
        mean_with < mean_without && t > 2.0,
        "expected a significant reduction: {mean_with:.3} with the app, \
         {mean_without:.3} without (t = {t:.2})"
    );
}
