/*!

Generic per-entity property storage. The network has two kinds of entities, nodes and edges;
each gets an `EntityData<E>` plugin in the trial's `Context` holding one column per property.

*/

mod context_ext;
mod data;
mod init_list;
mod query;

// `ContextEntityExt` is the public API to `EntityData`.
pub use context_ext::{ContextEntityExt, EntityIterator};
pub use data::EntityData;
pub use init_list::InitializationList;
pub use query::Query;

use std::{fmt::Debug, hash::Hash};

/// A dense index identifying one entity of a given kind.
pub trait EntityId: Copy + Clone + Debug + Eq + Ord + Hash + 'static {
    fn from_index(index: usize) -> Self;
    fn index(self) -> usize;
}
