/*!

The per-trial driver.

A trial is `Running` while at least one node is infectious. Each step records the susceptible
count and then runs the stages in a fixed order:

 1. [`activate_edges`]
 2. [`trace_contacts`]
 3. [`spread_infection`]
 4. [`progress_disease`]
 5. [`detect_symptoms`]
 6. [`clear_tested`]

after which the step counter advances. A trial ends `BurnedOut` when nobody is infectious (nodes
may still be exposed at that point), or `TimedOut` when `max_steps` is reached first.

*/

use crate::{
    context::Context,
    contact_manager::{activate_edges, trace_contacts},
    infection_manager::progress_disease,
    network::Network,
    parameters::{ContextParametersExt, Parameters},
    population::{initialize_trial, ContextPopulationExt, EpiState},
    report::{EdgeClassifier, TrialRecord},
    testing_manager::{clear_tested, detect_symptoms},
    transmission_manager::spread_infection,
    IxaError,
};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialStatus {
    /// No node is infectious.
    BurnedOut,
    /// The step ceiling was hit while the epidemic was still running.
    TimedOut,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrialOutcome {
    /// Number of steps executed.
    pub steps: usize,
    pub status: TrialStatus,
    /// Susceptible count at the start of every executed step.
    pub susceptible_series: Vec<usize>,
}

pub trait ContextSimulationExt {
    /// Runs every stage of one timestep and advances the step counter.
    fn step(&mut self);

    /// Steps an initialized trial until it burns out or times out.
    fn execute_trial(&mut self) -> TrialOutcome;
}

impl ContextSimulationExt for Context {
    fn step(&mut self) {
        let t = self.get_current_step();

        let active_edges = activate_edges(self);
        trace_contacts(self, &active_edges);
        let exposures = spread_infection(self, &active_edges);
        progress_disease(self);
        let positives = detect_symptoms(self);
        clear_tested(self);

        trace!(
            "step {t}: {} active edges, {exposures} exposures, {positives} positive tests",
            active_edges.len()
        );
        self.advance_step();
    }

    fn execute_trial(&mut self) -> TrialOutcome {
        let max_steps = self.get_params().max_steps;
        let mut susceptible_series = Vec::new();

        let status = loop {
            if self.count_in_state(EpiState::Infectious) == 0 {
                break TrialStatus::BurnedOut;
            }
            if max_steps.is_some_and(|max_steps| self.get_current_step() >= max_steps) {
                break TrialStatus::TimedOut;
            }
            susceptible_series.push(self.count_in_state(EpiState::Susceptible));
            self.step();
        };

        TrialOutcome {
            steps: self.get_current_step(),
            status,
            susceptible_series,
        }
    }
}

/// Runs trial `trial_id` on a private `Context` and extracts its record, classifying edges with
/// the network's own layout.
pub fn run_trial(
    network: &Arc<Network>,
    parameters: &Parameters,
    trial_id: usize,
) -> Result<TrialRecord, IxaError> {
    run_trial_with_classifier(network, parameters, trial_id, None)
}

/// Like [`run_trial`], with an optional replacement for [`Network::classify_edge`].
///
/// The trial is seeded with `parameters.seed + trial_id`, so the same base parameters give the
/// same sequence of trials on every run.
pub fn run_trial_with_classifier(
    network: &Arc<Network>,
    parameters: &Parameters,
    trial_id: usize,
    classifier: Option<&EdgeClassifier>,
) -> Result<TrialRecord, IxaError> {
    let parameters = Parameters {
        seed: parameters.seed.wrapping_add(trial_id as u64),
        ..parameters.clone()
    };

    let mut context = Context::new();
    initialize_trial(&mut context, Arc::clone(network), parameters)?;
    let outcome = context.execute_trial();
    debug!(
        "trial {trial_id}: {:?} after {} steps",
        outcome.status, outcome.steps
    );

    TrialRecord::extract(&context, trial_id, &outcome, classifier)
}
