/*!

Node and edge properties, and the per-trial state initializer.

The topology is shared read-only between trials behind an `Arc`; everything that changes during a
trial is a property stored in the trial's own `Context`.

*/

use crate::{
    contact_history::ContextContactHistoryExt,
    context::{Context, DataPlugin},
    define_property,
    define_rng,
    entity::ContextEntityExt,
    network::{EdgeId, Network, NodeId},
    parameters::{check_probability, ContextParametersExt, Parameters},
    random::ContextRandomExt,
    IxaError,
};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

define_rng!(InitializationRng);
define_rng!(SeedRng);

/// SEIR stage. A node only ever moves forward through these, one stage at a time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EpiState {
    Susceptible,
    Exposed,
    Infectious,
    Recovered,
}
define_property!(EpiState, NodeId);

/// Uses the tracing app. Fixed at initialization.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Adopter(pub bool);
define_property!(Adopter, NodeId);

/// Cohort label, only used for stratified reporting.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Group(pub u8);
define_property!(Group, NodeId);

/// Isolated; a quarantined node's edges never activate. Once set, never cleared.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Quarantined(pub bool);
define_property!(Quarantined, NodeId);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Symptomatic(pub bool);
define_property!(Symptomatic, NodeId);

/// Tested during the current step. Cleared at the end of every step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Tested(pub bool);
define_property!(Tested, NodeId);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ExposedAt(pub usize);
define_property!(ExposedAt, NodeId);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InfectiousAt(pub usize);
define_property!(InfectiousAt, NodeId);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RecoveredAt(pub usize);
define_property!(RecoveredAt, NodeId);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct QuarantinedAt(pub usize);
define_property!(QuarantinedAt, NodeId);

/// `w`: per-step probability that the edge's endpoints meet.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ActivationProbability(pub f64);
define_property!(ActivationProbability, EdgeId);

/// `c`: probability that a meeting between two adopters on this edge is recorded.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TracingProbability(pub f64);
define_property!(TracingProbability, EdgeId);

/// Carried a transmission at some point in the trial.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Route(pub bool);
define_property!(Route, EdgeId);

struct NetworkPlugin {
    network: Option<Arc<Network>>,
}

impl DataPlugin for NetworkPlugin {
    const new: &'static dyn Fn() -> Self = &|| NetworkPlugin { network: None };
}

pub trait ContextPopulationExt {
    /// The trial's topology. Panics if the trial was never initialized.
    fn get_network(&self) -> Arc<Network>;

    fn get_epi_state(&self, node_id: NodeId) -> EpiState;

    /// Moves `node_id` to `state` and stamps the matching timestamp with the current step, unless
    /// that timestamp was already set.
    fn set_epi_state(&mut self, node_id: NodeId, state: EpiState);

    fn is_adopter(&self, node_id: NodeId) -> bool;

    fn is_quarantined(&self, node_id: NodeId) -> bool;

    /// Quarantines `node_id` at the current step. Quarantine is permanent, and the first
    /// quarantine time is the one kept.
    fn quarantine(&mut self, node_id: NodeId);

    fn count_in_state(&self, state: EpiState) -> usize;
}

impl ContextPopulationExt for Context {
    fn get_network(&self) -> Arc<Network> {
        self.get_data_container::<NetworkPlugin>()
            .and_then(|plugin| plugin.network.clone())
            .unwrap_or_else(|| panic!("Network not initialized"))
    }

    fn get_epi_state(&self, node_id: NodeId) -> EpiState {
        self.get_property::<EpiState>(node_id)
            .unwrap_or_else(|| panic!("{node_id:?} has no EpiState"))
    }

    fn set_epi_state(&mut self, node_id: NodeId, state: EpiState) {
        let t = self.get_current_step();
        trace!("node {node_id}: {state:?} at step {t}");
        self.set_property(node_id, state);
        match state {
            EpiState::Exposed => {
                self.set_property_once(node_id, ExposedAt(t));
            }
            EpiState::Infectious => {
                self.set_property_once(node_id, InfectiousAt(t));
            }
            EpiState::Recovered => {
                self.set_property_once(node_id, RecoveredAt(t));
            }
            EpiState::Susceptible => {}
        }
    }

    fn is_adopter(&self, node_id: NodeId) -> bool {
        self.match_entity(node_id, (Adopter(true),))
    }

    fn is_quarantined(&self, node_id: NodeId) -> bool {
        self.match_entity(node_id, (Quarantined(true),))
    }

    fn quarantine(&mut self, node_id: NodeId) {
        if self.is_quarantined(node_id) {
            return;
        }
        let t = self.get_current_step();
        trace!("node {node_id}: quarantined at step {t}");
        self.set_property(node_id, Quarantined(true));
        self.set_property_once(node_id, QuarantinedAt(t));
    }

    fn count_in_state(&self, state: EpiState) -> usize {
        self.query_entity_count((state,))
    }
}

/// Assigns every per-trial attribute: `w` and `c` on every edge, adopter flag and cohort on every
/// node, all nodes susceptible and unflagged except one uniformly chosen infectious seed. The
/// contact history starts empty.
///
/// Parameters are validated first, and every rule output is checked as it is resolved, so a bad
/// configuration fails here before any simulation work.
pub fn initialize_trial(
    context: &mut Context,
    network: Arc<Network>,
    parameters: Parameters,
) -> Result<(), IxaError> {
    parameters.validate(&network)?;
    context.init_random(parameters.seed);
    debug!(
        "initializing trial: {} nodes, {} edges, seed {}",
        network.node_count(),
        network.edge_count(),
        parameters.seed
    );

    let nodes: Vec<NodeId> = context.add_entities(network.node_count()).collect();
    let edges: Vec<EdgeId> = context.add_entities(network.edge_count()).collect();

    for &edge_id in &edges {
        let w = context.sample::<InitializationRng, _>(|rng| {
            parameters.activation.resolve(&network, edge_id, rng)
        });
        check_probability("W", w)?;
        let c = context.sample::<InitializationRng, _>(|rng| {
            parameters.tracing.resolve(&network, edge_id, rng)
        });
        check_probability("C", c)?;
        context.set_properties(
            edge_id,
            (ActivationProbability(w), TracingProbability(c), Route(false)),
        );
    }

    for &node_id in &nodes {
        let p = context.sample::<InitializationRng, _>(|rng| {
            parameters.adoption.resolve(&network, node_id, rng)
        });
        check_probability("A", p)?;
        let adopter = context.sample_bool::<InitializationRng>(p);
        let group = network.group(node_id).unwrap_or(u8::from(adopter));
        context.set_properties(
            node_id,
            (
                Adopter(adopter),
                Group(group),
                EpiState::Susceptible,
                Quarantined(false),
                Symptomatic(false),
                Tested(false),
            ),
        );
    }

    let seed = NodeId(context.sample_range::<SeedRng, _, usize>(0..network.node_count()));
    context.set_epi_state(seed, EpiState::Infectious);
    debug!("seeded infection at node {seed}");

    context.init_contact_history(parameters.limit);
    context.get_data_container_mut::<NetworkPlugin>().network = Some(network);
    context.set_parameters(parameters);
    Ok(())
}
