use crate::{
    context::Context,
    define_rng,
    entity::ContextEntityExt,
    network::NodeId,
    parameters::{ContextParametersExt, Parameters},
    population::{ContextPopulationExt, EpiState},
    random::ContextRandomExt,
};

define_rng!(ProgressionRng);

/// Advances disease for every node in index order. An exposed node becomes infectious with
/// probability `alpha`; an infectious node recovers with probability `gamma`. The second check
/// reads the node's state after the first, so a node can become infectious and recover within the
/// same step.
pub fn progress_disease(context: &mut Context) {
    let &Parameters { alpha, gamma, .. } = context.get_params();

    for node_id in context.entity_iter::<NodeId>() {
        if context.get_epi_state(node_id) == EpiState::Exposed
            && context.sample_bool::<ProgressionRng>(alpha)
        {
            context.set_epi_state(node_id, EpiState::Infectious);
        }
        if context.get_epi_state(node_id) == EpiState::Infectious
            && context.sample_bool::<ProgressionRng>(gamma)
        {
            context.set_epi_state(node_id, EpiState::Recovered);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Network;
    use crate::population::{initialize_trial, InfectiousAt, RecoveredAt};
    use std::sync::Arc;

    fn pair(alpha: f64, gamma: f64) -> Context {
        let network = Network::from_edges(2, [(0, 1)]).unwrap();
        let mut context = Context::new();
        let parameters = Parameters {
            alpha,
            gamma,
            ..Parameters::default()
        };
        initialize_trial(&mut context, Arc::new(network), parameters).unwrap();
        context.set_property(NodeId(0), EpiState::Exposed);
        context.set_property(NodeId(1), EpiState::Infectious);
        context
    }

    #[test]
    fn certain_progression_and_recovery() {
        let mut context = pair(1.0, 1.0);
        context.advance_step();
        progress_disease(&mut context);
        // The exposed node passes through infectious and recovers in one step.
        assert_eq!(context.get_epi_state(NodeId(0)), EpiState::Recovered);
        assert_eq!(context.get_property::<InfectiousAt>(NodeId(0)), Some(InfectiousAt(1)));
        assert_eq!(context.get_property::<RecoveredAt>(NodeId(0)), Some(RecoveredAt(1)));
        assert_eq!(context.get_epi_state(NodeId(1)), EpiState::Recovered);
    }

    #[test]
    fn progression_without_recovery() {
        let mut context = pair(1.0, 0.0);
        progress_disease(&mut context);
        assert_eq!(context.get_epi_state(NodeId(0)), EpiState::Infectious);
        assert_eq!(context.get_epi_state(NodeId(1)), EpiState::Infectious);
    }

    #[test]
    fn nothing_moves_at_zero_rates() {
        let mut context = pair(0.0, 0.0);
        for _ in 0..10 {
            progress_disease(&mut context);
        }
        assert_eq!(context.get_epi_state(NodeId(0)), EpiState::Exposed);
        assert_eq!(context.get_epi_state(NodeId(1)), EpiState::Infectious);
    }

    #[test]
    fn susceptible_and_recovered_are_untouched() {
        let mut context = pair(1.0, 1.0);
        context.set_property(NodeId(0), EpiState::Susceptible);
        context.set_property(NodeId(1), EpiState::Recovered);
        progress_disease(&mut context);
        assert_eq!(context.get_epi_state(NodeId(0)), EpiState::Susceptible);
        assert_eq!(context.get_epi_state(NodeId(1)), EpiState::Recovered);
        assert_eq!(context.get_property::<InfectiousAt>(NodeId(0)), None);
    }
}
