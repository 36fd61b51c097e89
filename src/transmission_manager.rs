use crate::{
    contact_manager::ActiveEdge,
    context::Context,
    define_rng,
    entity::ContextEntityExt,
    parameters::{ContextParametersExt, Parameters},
    population::{ContextPopulationExt, EpiState, Route},
    random::ContextRandomExt,
};
use log::trace;

define_rng!(TransmissionRng);

/// Attempts transmission across every active edge with one infectious and one susceptible
/// endpoint. A success exposes the susceptible endpoint and marks the edge as a route.
///
/// States are read live, so once a node has been exposed by one edge every later edge into it
/// finds it no longer susceptible. Returns the number of new exposures.
pub fn spread_infection(context: &mut Context, active_edges: &[ActiveEdge]) -> usize {
    let &Parameters { beta_hat, .. } = context.get_params();
    let mut exposures = 0;

    for &ActiveEdge { edge_id, u, v } in active_edges {
        let target = match (context.get_epi_state(u), context.get_epi_state(v)) {
            (EpiState::Infectious, EpiState::Susceptible) => v,
            (EpiState::Susceptible, EpiState::Infectious) => u,
            _ => continue,
        };
        if context.sample_bool::<TransmissionRng>(beta_hat) {
            trace!("edge {edge_id}: transmission to node {target}");
            context.set_epi_state(target, EpiState::Exposed);
            context.set_property(edge_id, Route(true));
            exposures += 1;
        }
    }

    exposures
}
