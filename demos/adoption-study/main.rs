//! Sweeps the adoption rate on a Watts-Strogatz network and writes one CSV row per trial.
//!
//! ```text
//! cargo run --example adoption-study -- [output.csv]
//! ```

use ixa_contact_tracing::log::{enable_logging, info};
use ixa_contact_tracing::network::connected_watts_strogatz;
use ixa_contact_tracing::report::write_csv;
use ixa_contact_tracing::{run_batch, BatchOptions, IxaError, NodeRate, Parameters};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

static NODES: usize = 1000;
static NEIGHBORS: usize = 4;
// Roughly one rewired edge per node with K = 4.
static REWIRING: f64 = 0.256;
static RUNS: usize = 100;
static ADOPTION_RATES: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

fn run(output: &Path) -> Result<(), IxaError> {
    let config = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/adoption-study/input.json");
    let base = Parameters::from_json_file(&config)?;

    let mut rng = StdRng::seed_from_u64(base.seed);
    let network = Arc::new(connected_watts_strogatz(NODES, NEIGHBORS, REWIRING, 1000, &mut rng)?);

    let mut records = Vec::new();
    for adoption in ADOPTION_RATES {
        let parameters = Parameters {
            adoption: NodeRate::Constant(adoption),
            ..base.clone()
        };
        let batch = run_batch(&network, &parameters, RUNS, &BatchOptions::default())?;
        let mean = batch.iter().map(|record| record.infected_ratio).sum::<f64>() / RUNS as f64;
        info!("A = {adoption}: mean infected ratio {mean:.3}");
        records.extend(batch);
    }

    write_csv(&records, File::create(output)?)?;
    info!("wrote {} records to {}", records.len(), output.display());
    Ok(())
}

fn main() {
    enable_logging();
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "adoption-study.csv".to_string());
    run(Path::new(&output)).expect("Adoption study failed");
}
