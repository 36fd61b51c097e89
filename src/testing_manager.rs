/*!

Symptom onset, testing, and the trace-and-test cascade.

A positive test quarantines the node and tests everyone it was traced as contacting during the
last `limit` steps, transitively. Every hop of the cascade looks at the same window
`[t - limit, t]` ending at the current step, so a chain of contacts spread across that window can
be followed arbitrarily many hops. The per-step `Tested` flag is the visited set: a node is tested
at most once per step no matter how many paths reach it, which also makes the traversal terminate
on cyclic contact histories.

*/

use crate::{
    contact_history::ContextContactHistoryExt,
    context::Context,
    define_rng,
    entity::ContextEntityExt,
    network::NodeId,
    parameters::{ContextParametersExt, Parameters},
    population::{ContextPopulationExt, EpiState, Symptomatic, Tested},
    random::ContextRandomExt,
};
use log::trace;

define_rng!(SymptomRng);

/// Every infectious node shows symptoms with probability `zeta`; a symptomatic node is tested
/// immediately. Returns the number of nodes quarantined during this stage, including the ones
/// reached through tracing.
pub fn detect_symptoms(context: &mut Context) -> usize {
    let &Parameters { zeta, .. } = context.get_params();
    let mut quarantined = 0;

    for node_id in context.query_entities((EpiState::Infectious,)) {
        if context.sample_bool::<SymptomRng>(zeta) {
            context.set_property(node_id, Symptomatic(true));
            quarantined += get_tested(context, node_id);
        }
    }

    quarantined
}

/// Tests `node_id` at the current step and, on a positive result, everyone reachable from it
/// through traced contacts. Returns how many nodes tested positive.
pub fn get_tested(context: &mut Context, node_id: NodeId) -> usize {
    let t = context.get_current_step();
    let &Parameters { limit, .. } = context.get_params();
    let window_start = t.saturating_sub(limit);
    let mut positives = 0;

    let mut pending = vec![node_id];
    while let Some(node_id) = pending.pop() {
        if context.get_property::<Tested>(node_id) == Some(Tested(true)) {
            continue;
        }
        context.set_property(node_id, Tested(true));

        match context.get_epi_state(node_id) {
            EpiState::Exposed | EpiState::Infectious => {
                trace!("node {node_id}: positive test at step {t}");
                context.quarantine(node_id);
                positives += 1;
                pending.extend(context.traced_contacts_between(node_id, window_start, t));
            }
            EpiState::Susceptible | EpiState::Recovered => {}
        }
    }

    positives
}

/// Clears every node's `Tested` flag so the next step starts with nobody tested.
pub fn clear_tested(context: &mut Context) {
    for node_id in context.query_entities((Tested(true),)) {
        context.set_property(node_id, Tested(false));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact_history::StepContacts;
    use crate::network::{EdgeId, Network};
    use crate::population::{initialize_trial, ActivationProbability, Quarantined, QuarantinedAt};
    use crate::simulation::ContextSimulationExt;
    use std::sync::Arc;

    /// A path of `n` nodes, everyone susceptible. Contacts are recorded by hand.
    fn population(n: usize, limit: usize) -> Context {
        let network = Network::from_edges(n, (1..n).map(|i| (i - 1, i))).unwrap();
        let mut context = Context::new();
        let parameters = Parameters {
            limit,
            zeta: 1.0,
            ..Parameters::default()
        };
        initialize_trial(&mut context, Arc::new(network), parameters).unwrap();
        for node_id in context.entity_iter::<NodeId>() {
            context.set_property(node_id, EpiState::Susceptible);
        }
        context
    }

    fn record(context: &mut Context, t: usize, pairs: &[(usize, usize)]) {
        let mut step = StepContacts::default();
        for &(u, v) in pairs {
            step.record(NodeId(u), NodeId(v));
        }
        context.record_contacts(t, step);
    }

    fn advance_to(context: &mut Context, t: usize) {
        while context.get_current_step() < t {
            context.advance_step();
        }
    }

    #[test]
    fn negative_test_stops_the_cascade() {
        let mut context = population(3, 5);
        record(&mut context, 0, &[(0, 1), (1, 2)]);
        context.set_epi_state(NodeId(0), EpiState::Infectious);
        context.set_epi_state(NodeId(2), EpiState::Infectious);

        // Node 1 is susceptible, so node 2 is never reached through it.
        assert_eq!(get_tested(&mut context, NodeId(0)), 1);
        assert!(context.is_quarantined(NodeId(0)));
        assert!(!context.is_quarantined(NodeId(1)));
        assert!(!context.is_quarantined(NodeId(2)));
        assert_eq!(context.get_property::<Tested>(NodeId(1)), Some(Tested(true)));
        assert_eq!(context.get_property::<Tested>(NodeId(2)), Some(Tested(false)));
    }

    #[test]
    fn cascade_follows_positive_chain() {
        let mut context = population(4, 5);
        record(&mut context, 0, &[(0, 1)]);
        record(&mut context, 1, &[(1, 2)]);
        record(&mut context, 2, &[(2, 3)]);
        for node in 0..4 {
            context.set_epi_state(NodeId(node), EpiState::Exposed);
        }
        advance_to(&mut context, 2);

        assert_eq!(get_tested(&mut context, NodeId(0)), 4);
        for node in 0..4 {
            assert!(context.is_quarantined(NodeId(node)));
            assert_eq!(context.get_property::<QuarantinedAt>(NodeId(node)), Some(QuarantinedAt(2)));
        }
    }

    #[test]
    fn cycles_terminate_and_quarantine_once() {
        let mut context = population(3, 2);
        record(&mut context, 0, &[(0, 1), (1, 2), (2, 0)]);
        record(&mut context, 1, &[(0, 1), (1, 2), (2, 0)]);
        for node in 0..3 {
            context.set_epi_state(NodeId(node), EpiState::Infectious);
        }
        advance_to(&mut context, 1);

        assert_eq!(get_tested(&mut context, NodeId(0)), 3);
        // Testing again within the same step is a no-op.
        assert_eq!(get_tested(&mut context, NodeId(1)), 0);
        assert_eq!(context.query_entity_count((Quarantined(true),)), 3);
    }

    #[test]
    fn zero_limit_only_traces_the_current_step() {
        // A-B met at step 0, B-C met at step 1, B is tested at step 1.
        let mut context = population(3, 0);
        record(&mut context, 0, &[(0, 1)]);
        for node in 0..3 {
            context.set_epi_state(NodeId(node), EpiState::Infectious);
        }
        advance_to(&mut context, 1);
        record(&mut context, 1, &[(1, 2)]);

        assert_eq!(get_tested(&mut context, NodeId(1)), 2);
        assert!(context.is_quarantined(NodeId(1)));
        assert!(context.is_quarantined(NodeId(2)));
        assert!(!context.is_quarantined(NodeId(0)));
    }

    #[test]
    fn contacts_outside_the_window_are_not_traced() {
        let mut context = population(3, 1);
        record(&mut context, 0, &[(0, 1)]);
        record(&mut context, 2, &[(1, 2)]);
        for node in 0..3 {
            context.set_epi_state(NodeId(node), EpiState::Infectious);
        }
        advance_to(&mut context, 2);

        get_tested(&mut context, NodeId(1));
        assert!(context.is_quarantined(NodeId(2)));
        assert!(!context.is_quarantined(NodeId(0)));
    }

    #[test]
    fn every_hop_uses_the_full_window() {
        // 0-1 at step 1, 1-2 at step 3, 2-3 at step 3, tested at step 3 with limit 2. Each hop
        // reads [1, 3] again rather than a shrinking budget.
        let mut context = population(4, 2);
        record(&mut context, 1, &[(0, 1)]);
        record(&mut context, 3, &[(1, 2), (2, 3)]);
        for node in 0..4 {
            context.set_epi_state(NodeId(node), EpiState::Exposed);
        }
        advance_to(&mut context, 3);

        assert_eq!(get_tested(&mut context, NodeId(0)), 4);
    }

    #[test]
    fn symptoms_trigger_testing() {
        let mut context = population(2, 3);
        record(&mut context, 0, &[(0, 1)]);
        context.set_epi_state(NodeId(0), EpiState::Infectious);
        context.set_epi_state(NodeId(1), EpiState::Exposed);

        assert_eq!(detect_symptoms(&mut context), 2);
        assert_eq!(context.get_property::<Symptomatic>(NodeId(0)), Some(Symptomatic(true)));
        // Exposed nodes never show symptoms, but they still test positive when traced.
        assert_eq!(context.get_property::<Symptomatic>(NodeId(1)), Some(Symptomatic(false)));
        assert!(context.is_quarantined(NodeId(1)));
    }

    #[test]
    fn clearing_resets_every_flag() {
        let mut context = population(3, 1);
        record(&mut context, 0, &[(0, 1), (1, 2)]);
        for node in 0..3 {
            context.set_epi_state(NodeId(node), EpiState::Infectious);
        }
        get_tested(&mut context, NodeId(0));
        assert_eq!(context.query_entity_count((Tested(true),)), 3);

        clear_tested(&mut context);
        assert_eq!(context.query_entity_count((Tested(true),)), 0);
        assert_eq!(context.query_entity_count((Tested(false),)), 3);
    }

    /// The chain A-B-C stepped through the full pipeline, with A the only infectious node. Every
    /// edge meets and is recorded each step, and tests trace the current step only.
    fn chain_trial() -> Context {
        let network = Network::from_edges(3, [(0, 1), (1, 2)]).unwrap();
        let parameters = Parameters {
            adoption: 1.0.into(),
            activation: 1.0.into(),
            tracing: 1.0.into(),
            beta_hat: 1.0,
            alpha: 1.0,
            gamma: 0.0,
            zeta: 0.0,
            limit: 0,
            ..Parameters::default()
        };
        let mut context = Context::new();
        initialize_trial(&mut context, Arc::new(network), parameters).unwrap();
        for node_id in context.entity_iter::<NodeId>() {
            context.set_property(node_id, EpiState::Susceptible);
        }
        context.set_epi_state(NodeId(0), EpiState::Infectious);
        context
    }

    fn retune(context: &mut Context, alpha: f64, zeta: f64) {
        let parameters = Parameters {
            alpha,
            zeta,
            ..context.get_params().clone()
        };
        context.set_parameters(parameters);
    }

    /// Steps 0 and 1: A exposes B, who turns infectious at once, then B exposes C, who stays
    /// exposed. Nobody shows symptoms yet.
    fn expose_down_the_chain(context: &mut Context) {
        context.step();
        assert_eq!(context.get_epi_state(NodeId(1)), EpiState::Infectious);
        assert_eq!(context.get_epi_state(NodeId(2)), EpiState::Susceptible);

        retune(context, 0.0, 0.0);
        context.step();
        assert_eq!(context.get_epi_state(NodeId(2)), EpiState::Exposed);
        assert_eq!(context.query_entity_count((Quarantined(true),)), 0);
    }

    #[test]
    fn chain_traces_contact_recorded_in_the_testing_step() {
        let mut context = chain_trial();
        expose_down_the_chain(&mut context);

        retune(&mut context, 0.0, 1.0);
        context.step();

        let history = context.get_contact_history().unwrap();
        assert!(history.contacts_at(2, NodeId(1)).any(|node_id| node_id == NodeId(2)));
        assert_eq!(context.get_property::<QuarantinedAt>(NodeId(1)), Some(QuarantinedAt(2)));
        // C never showed symptoms; it was reached through the step-2 contact with B.
        assert_eq!(context.get_property::<Symptomatic>(NodeId(2)), Some(Symptomatic(false)));
        assert_eq!(context.get_property::<QuarantinedAt>(NodeId(2)), Some(QuarantinedAt(2)));
    }

    #[test]
    fn chain_skips_contact_recorded_before_the_window() {
        let mut context = chain_trial();
        expose_down_the_chain(&mut context);

        // B and C do not meet in step 2, so their latest contact is from step 1.
        context.set_property(EdgeId(1), ActivationProbability(0.0));
        retune(&mut context, 0.0, 1.0);
        context.step();

        let history = context.get_contact_history().unwrap();
        assert_eq!(history.contacts_at(2, NodeId(1)).collect::<Vec<_>>(), vec![NodeId(0)]);
        assert!(context.is_quarantined(NodeId(0)));
        assert!(context.is_quarantined(NodeId(1)));
        assert_eq!(context.get_epi_state(NodeId(2)), EpiState::Exposed);
        assert!(!context.is_quarantined(NodeId(2)));
    }
}
