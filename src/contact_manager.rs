//! Who met whom this step, and which of those meetings the app recorded.

use crate::{
    contact_history::{ContextContactHistoryExt, StepContacts},
    context::Context,
    define_rng,
    entity::ContextEntityExt,
    network::{EdgeId, NodeId},
    population::{ActivationProbability, ContextPopulationExt, TracingProbability},
    random::ContextRandomExt,
};
use log::trace;

define_rng!(ContactRng);
define_rng!(TracingRng);

/// An edge whose endpoints met during the current step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ActiveEdge {
    pub edge_id: EdgeId,
    pub u: NodeId,
    pub v: NodeId,
}

/// Draws this step's contacts: every edge with no quarantined endpoint is active with its own
/// probability `w`. Persistent state is not touched.
pub fn activate_edges(context: &mut Context) -> Vec<ActiveEdge> {
    let network = context.get_network();
    let mut active_edges = Vec::new();

    for (edge_id, u, v) in network.edges() {
        if context.is_quarantined(u) || context.is_quarantined(v) {
            continue;
        }
        let w = context
            .get_property::<ActivationProbability>(edge_id)
            .map_or(0.0, |ActivationProbability(w)| w);
        if context.sample_bool::<ContactRng>(w) {
            active_edges.push(ActiveEdge { edge_id, u, v });
        }
    }

    trace!(
        "step {}: {} of {} edges active",
        context.get_current_step(),
        active_edges.len(),
        network.edge_count()
    );
    active_edges
}

/// Records into the contact history, under the current step, every active edge between two
/// adopters that passes its own tracing draw `c`. Returns how many contacts were recorded.
pub fn trace_contacts(context: &mut Context, active_edges: &[ActiveEdge]) -> usize {
    let t = context.get_current_step();
    let mut step_contacts = StepContacts::default();

    for &ActiveEdge { edge_id, u, v } in active_edges {
        if !(context.is_adopter(u) && context.is_adopter(v)) {
            continue;
        }
        let c = context
            .get_property::<TracingProbability>(edge_id)
            .map_or(0.0, |TracingProbability(c)| c);
        if context.sample_bool::<TracingRng>(c) {
            step_contacts.record(u, v);
        }
    }

    let traced = step_contacts.contact_count();
    trace!("step {t}: {traced} contacts traced");
    context.record_contacts(t, step_contacts);
    traced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Network;
    use crate::parameters::{EdgeRate, NodeRate, Parameters};
    use crate::population::initialize_trial;
    use std::sync::Arc;

    fn triangle(parameters: Parameters) -> Context {
        let network = Network::from_edges(3, [(0, 1), (1, 2), (0, 2)]).unwrap();
        let mut context = Context::new();
        initialize_trial(&mut context, Arc::new(network), parameters).unwrap();
        context
    }

    #[test]
    fn all_edges_active_at_w_one() {
        let mut context = triangle(Parameters {
            activation: EdgeRate::Constant(1.0),
            ..Parameters::default()
        });
        assert_eq!(activate_edges(&mut context).len(), 3);
    }

    #[test]
    fn no_edges_active_at_w_zero() {
        let mut context = triangle(Parameters {
            activation: EdgeRate::Constant(0.0),
            ..Parameters::default()
        });
        assert!(activate_edges(&mut context).is_empty());
    }

    #[test]
    fn quarantined_endpoints_block_edges() {
        let mut context = triangle(Parameters {
            activation: EdgeRate::Constant(1.0),
            ..Parameters::default()
        });
        context.quarantine(NodeId(0));
        let active = activate_edges(&mut context);
        assert_eq!(active.len(), 1);
        assert_eq!((active[0].u, active[0].v), (NodeId(1), NodeId(2)));
    }

    #[test]
    fn tracing_records_both_directions() {
        let mut context = triangle(Parameters {
            adoption: NodeRate::Constant(1.0),
            activation: EdgeRate::Constant(1.0),
            tracing: EdgeRate::Constant(1.0),
            ..Parameters::default()
        });
        let active = activate_edges(&mut context);
        assert_eq!(trace_contacts(&mut context, &active), 3);
        let mut traced = context.traced_contacts_between(NodeId(1), 0, 0);
        traced.sort();
        assert_eq!(traced, vec![NodeId(0), NodeId(2)]);
    }

    #[test]
    fn tracing_requires_both_adopters() {
        // Only node 0 adopts, so no edge has two adopting endpoints.
        let mut context = triangle(Parameters {
            adoption: NodeRate::rule(|_, node_id, _| if node_id.0 == 0 { 1.0 } else { 0.0 }),
            activation: EdgeRate::Constant(1.0),
            tracing: EdgeRate::Constant(1.0),
            ..Parameters::default()
        });
        let active = activate_edges(&mut context);
        assert_eq!(trace_contacts(&mut context, &active), 0);
        assert!(context.get_contact_history().unwrap().at(0).unwrap().is_empty());
    }

    #[test]
    fn zero_tracing_probability_records_nothing() {
        let mut context = triangle(Parameters {
            adoption: NodeRate::Constant(1.0),
            activation: EdgeRate::Constant(1.0),
            tracing: EdgeRate::Constant(0.0),
            ..Parameters::default()
        });
        let active = activate_edges(&mut context);
        assert_eq!(trace_contacts(&mut context, &active), 0);
    }
}
