/*!

A discrete-time SEIR simulation of an epidemic on a contact network in which some people carry a
contact-tracing app. Every timestep runs the same pipeline over a single per-trial [`Context`]:

 1. edge activation (who met whom today),
 2. contact history (which of those meetings the app recorded),
 3. transmission,
 4. disease progression,
 5. symptom onset, testing and the trace-and-test cascade,
 6. clearing of the per-step testing flags.

Trials are independent. [`runner::run_batch`] fans them out over a worker pool.

*/

pub mod context;
pub mod contact_history;
pub mod contact_manager;
pub mod entity;
pub mod error;
mod hashing;
pub mod infection_manager;
pub mod log;
pub mod network;
pub mod parameters;
pub mod population;
pub mod property;
pub mod property_map;
pub mod random;
pub mod report;
pub mod runner;
pub mod simulation;
pub mod testing_manager;
pub mod transmission_manager;

// All modules import `crate::TypeId` in case we want to change the underlying type of `TypeId`.
#[doc(hidden)]
pub use std::any::TypeId;

pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

// Re-exported so `define_rng!` can name it from downstream crates.
pub use rand;

pub use context::Context;
pub use entity::{ContextEntityExt, EntityId};
pub use error::IxaError;
pub use network::{EdgeId, EdgeKind, Layout, Network, NodeId};
pub use parameters::{ContextParametersExt, EdgeRate, NodeRate, Parameters};
pub use property::Property;
pub use random::ContextRandomExt;
pub use report::TrialRecord;
pub use runner::{run_batch, BatchOptions};
pub use simulation::{run_trial, ContextSimulationExt, TrialOutcome, TrialStatus};

#[inline(always)]
pub fn type_of<T: 'static>() -> TypeId {
    TypeId::of::<T>()
}
