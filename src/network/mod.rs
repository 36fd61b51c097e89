/*!

The contact network: an immutable, undirected, simple graph together with the graph-level
metadata that ends up in every result record.

Topology is built once (by a generator or by hand) and then shared read-only between trials
behind an `Arc`. Per-trial attributes live in the trial's `Context`, never here.

*/

mod distance;
mod generators;

pub use distance::{circle_distance, square_distance};
pub use generators::{connected_watts_strogatz, rewired_grid, watts_strogatz};

use crate::{entity::EntityId, HashSet, IxaError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::fmt::{self, Display};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct EdgeId(pub(crate) usize);

impl EntityId for NodeId {
    fn from_index(index: usize) -> Self {
        NodeId(index)
    }
    fn index(self) -> usize {
        self.0
    }
}

impl EntityId for EdgeId {
    fn from_index(index: usize) -> Self {
        EdgeId(index)
    }
    fn index(self) -> usize {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How node indexes map onto space. Drives the default local/long-range edge classification.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layout {
    /// Nodes `0..n` around a ring, originally joined to their `k` nearest neighbors.
    Ring { k: usize },
    /// A periodic `rows x cols` lattice, node `(i, j)` has index `i * cols + j`.
    Grid { rows: usize, cols: usize },
    Unstructured,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Local,
    LongRange,
}

#[derive(Clone, Debug)]
pub struct Network {
    node_count: usize,
    edges: Vec<(NodeId, NodeId)>,
    edge_set: HashSet<(usize, usize)>,
    adjacency: Vec<Vec<NodeId>>,
    groups: Option<Vec<u8>>,
    layout: Layout,
    metadata: BTreeMap<String, Value>,
}

impl Network {
    /// An edgeless network on `node_count` nodes. The node count is recorded as `N`.
    pub fn new(node_count: usize) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("N".to_string(), Value::from(node_count));
        Network {
            node_count,
            edges: Vec::new(),
            edge_set: HashSet::default(),
            adjacency: vec![Vec::new(); node_count],
            groups: None,
            layout: Layout::Unstructured,
            metadata,
        }
    }

    /// Adds the undirected edge `u`-`v`. Self-loops and parallel edges are rejected.
    pub fn add_edge(&mut self, u: usize, v: usize) -> Result<EdgeId, IxaError> {
        if u >= self.node_count || v >= self.node_count {
            return Err(IxaError::NetworkError(format!(
                "edge ({u}, {v}) references a node outside 0..{}",
                self.node_count
            )));
        }
        if u == v {
            return Err(IxaError::NetworkError(format!("self-loop on node {u}")));
        }
        if !self.edge_set.insert(edge_key(u, v)) {
            return Err(IxaError::NetworkError(format!("duplicate edge ({u}, {v})")));
        }

        let edge_id = EdgeId(self.edges.len());
        self.edges.push((NodeId(u), NodeId(v)));
        self.adjacency[u].push(NodeId(v));
        self.adjacency[v].push(NodeId(u));
        Ok(edge_id)
    }

    /// Builds a network from an edge list.
    pub fn from_edges(
        node_count: usize,
        edges: impl IntoIterator<Item = (usize, usize)>,
    ) -> Result<Self, IxaError> {
        let mut network = Network::new(node_count);
        for (u, v) in edges {
            network.add_edge(u, v)?;
        }
        Ok(network)
    }

    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Supplies the cohort label of every node. Without this, cohorts default to adopter status.
    pub fn with_groups(mut self, groups: Vec<u8>) -> Result<Self, IxaError> {
        if groups.len() != self.node_count {
            return Err(IxaError::NetworkError(format!(
                "{} group labels supplied for {} nodes",
                groups.len(),
                self.node_count
            )));
        }
        self.groups = Some(groups);
        Ok(self)
    }

    /// Stashes a graph-level value (construction parameters and the like) for reporting.
    pub fn set_metadata(&mut self, key: &str, value: impl Into<Value>) {
        self.metadata.insert(key.to_string(), value.into());
    }

    #[must_use]
    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..self.node_count).map(NodeId)
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, NodeId, NodeId)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .map(|(index, &(u, v))| (EdgeId(index), u, v))
    }

    /// The endpoints of `edge_id`. Panics if the edge does not belong to this network.
    #[must_use]
    pub fn endpoints(&self, edge_id: EdgeId) -> (NodeId, NodeId) {
        self.edges[edge_id.0]
    }

    #[must_use]
    pub fn neighbors(&self, node_id: NodeId) -> &[NodeId] {
        &self.adjacency[node_id.0]
    }

    #[must_use]
    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.edge_set.contains(&edge_key(u, v))
    }

    #[must_use]
    pub fn group(&self, node_id: NodeId) -> Option<u8> {
        self.groups.as_ref().map(|groups| groups[node_id.0])
    }

    #[must_use]
    pub fn has_groups(&self) -> bool {
        self.groups.is_some()
    }

    /// The layout-derived distance between the endpoints of an edge, if the layout has one.
    #[must_use]
    pub fn edge_distance(&self, edge_id: EdgeId) -> Option<f64> {
        let (u, v) = self.endpoints(edge_id);
        match self.layout {
            #[allow(clippy::cast_precision_loss)]
            Layout::Ring { .. } => Some(circle_distance(u.0, v.0, self.node_count) as f64),
            Layout::Grid { rows, cols } => Some(square_distance(
                (u.0 / cols, u.0 % cols),
                (v.0 / cols, v.0 % cols),
                rows,
                cols,
            )),
            Layout::Unstructured => None,
        }
    }

    /// Default classifier: on a ring, an edge longer than half the original neighborhood is
    /// long-range; on a grid, anything longer than one lattice step is.
    #[must_use]
    pub fn classify_edge(&self, edge_id: EdgeId) -> EdgeKind {
        let long_range = match (self.layout, self.edge_distance(edge_id)) {
            #[allow(clippy::cast_precision_loss)]
            (Layout::Ring { k }, Some(distance)) => distance > k as f64 / 2.0,
            (Layout::Grid { .. }, Some(distance)) => distance > 1.0,
            _ => false,
        };
        if long_range {
            EdgeKind::LongRange
        } else {
            EdgeKind::Local
        }
    }

    /// Whether every node can reach every other node.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        if self.node_count == 0 {
            return true;
        }
        let mut seen = vec![false; self.node_count];
        let mut queue = VecDeque::from([NodeId(0)]);
        seen[0] = true;
        let mut reached = 1;
        while let Some(node) = queue.pop_front() {
            for &neighbor in self.neighbors(node) {
                if !seen[neighbor.0] {
                    seen[neighbor.0] = true;
                    reached += 1;
                    queue.push_back(neighbor);
                }
            }
        }
        reached == self.node_count
    }
}

fn edge_key(u: usize, v: usize) -> (usize, usize) {
    (u.min(v), u.max(v))
}
