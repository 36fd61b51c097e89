//! Small-world reference generators. The simulation itself only needs a `Network`; these exist so
//! studies and tests have the same families of graphs to run on.

use super::{Layout, Network};
use crate::IxaError;
use log::debug;
use rand::Rng;
use std::collections::BTreeSet;

/// A Watts-Strogatz small-world graph: a ring of `n` nodes, each joined to its `k / 2` nearest
/// neighbors on either side, with every lattice edge `(u, v)` rewired to `(u, w)` for a uniformly
/// random `w` with probability `p`. Rewiring never creates self-loops or parallel edges.
pub fn watts_strogatz<R: Rng + ?Sized>(
    n: usize,
    k: usize,
    p: f64,
    rng: &mut R,
) -> Result<Network, IxaError> {
    if k >= n {
        return Err(IxaError::NetworkError(format!(
            "Watts-Strogatz needs k < n, got k = {k}, n = {n}"
        )));
    }
    if !(0.0..=1.0).contains(&p) {
        return Err(IxaError::NetworkError(format!(
            "rewiring probability must be in [0, 1], got {p}"
        )));
    }

    let half = k / 2;
    let mut edges = BTreeSet::new();
    let mut degree = vec![0usize; n];
    for j in 1..=half {
        for u in 0..n {
            let v = (u + j) % n;
            if edges.insert(key(u, v)) {
                degree[u] += 1;
                degree[v] += 1;
            }
        }
    }

    for j in 1..=half {
        for u in 0..n {
            let v = (u + j) % n;
            if !rng.random_bool(p) || degree[u] >= n - 1 || !edges.contains(&key(u, v)) {
                continue;
            }
            let mut w = rng.random_range(0..n);
            while w == u || edges.contains(&key(u, w)) {
                w = rng.random_range(0..n);
            }
            edges.remove(&key(u, v));
            edges.insert(key(u, w));
            degree[v] -= 1;
            degree[w] += 1;
        }
    }

    let mut network = Network::from_edges(n, edges)?.with_layout(Layout::Ring { k });
    network.set_metadata("K", k);
    network.set_metadata("p", p);
    debug!(
        "built Watts-Strogatz network: n = {n}, k = {k}, p = {p}, {} edges",
        network.edge_count()
    );
    Ok(network)
}

/// Like [`watts_strogatz`], but retries until the result is connected.
pub fn connected_watts_strogatz<R: Rng + ?Sized>(
    n: usize,
    k: usize,
    p: f64,
    tries: usize,
    rng: &mut R,
) -> Result<Network, IxaError> {
    for _ in 0..tries {
        let network = watts_strogatz(n, k, p, rng)?;
        if network.is_connected() {
            return Ok(network);
        }
    }
    Err(IxaError::NetworkError(format!(
        "no connected Watts-Strogatz network (n = {n}, k = {k}, p = {p}) in {tries} tries"
    )))
}

/// A periodic `rows x cols` lattice in which each lattice edge is, with probability `p`, removed
/// and replaced by an edge from its first endpoint to a uniformly random other node. A
/// replacement that would duplicate an existing edge is dropped.
pub fn rewired_grid<R: Rng + ?Sized>(
    rows: usize,
    cols: usize,
    p: f64,
    rng: &mut R,
) -> Result<Network, IxaError> {
    let n = rows * cols;
    if n < 2 {
        return Err(IxaError::NetworkError(format!(
            "grid needs at least two cells, got {rows} x {cols}"
        )));
    }
    if !(0.0..=1.0).contains(&p) {
        return Err(IxaError::NetworkError(format!(
            "rewiring probability must be in [0, 1], got {p}"
        )));
    }

    let index = |i: usize, j: usize| i * cols + j;
    let mut lattice = Vec::new();
    let mut edges = BTreeSet::new();
    for i in 0..rows {
        for j in 0..cols {
            for (a, b) in [
                (index(i, j), index(i, (j + 1) % cols)),
                (index(i, j), index((i + 1) % rows, j)),
            ] {
                if a != b && edges.insert(key(a, b)) {
                    lattice.push((a, b));
                }
            }
        }
    }

    for (u, v) in lattice {
        if !rng.random_bool(p) {
            continue;
        }
        edges.remove(&key(u, v));
        let mut w = rng.random_range(0..n);
        while w == u {
            w = rng.random_range(0..n);
        }
        edges.insert(key(u, w));
    }

    let mut network = Network::from_edges(n, edges)?.with_layout(Layout::Grid { rows, cols });
    network.set_metadata("rows", rows);
    network.set_metadata("cols", cols);
    network.set_metadata("p", p);
    Ok(network)
}

fn key(u: usize, v: usize) -> (usize, usize) {
    (u.min(v), u.max(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{EdgeKind, NodeId};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn unrewired_ring_is_regular() {
        let mut rng = StdRng::seed_from_u64(1);
        let network = watts_strogatz(20, 4, 0.0, &mut rng).unwrap();
        assert_eq!(network.edge_count(), 40);
        for node in network.nodes() {
            assert_eq!(network.neighbors(node).len(), 4);
        }
        assert!(network
            .edges()
            .all(|(edge, _, _)| network.classify_edge(edge) == EdgeKind::Local));
        assert_eq!(network.metadata()["K"], serde_json::Value::from(4));
    }

    #[test]
    fn rewiring_preserves_edge_count() {
        let mut rng = StdRng::seed_from_u64(2);
        let network = watts_strogatz(100, 4, 0.3, &mut rng).unwrap();
        assert_eq!(network.edge_count(), 200);
        assert!(network
            .edges()
            .any(|(edge, _, _)| network.classify_edge(edge) == EdgeKind::LongRange));
    }

    #[test]
    fn rejects_oversized_neighborhood() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(watts_strogatz(4, 4, 0.1, &mut rng).is_err());
        assert!(watts_strogatz(10, 4, 1.5, &mut rng).is_err());
    }

    #[test]
    fn connected_generator_returns_connected_graph() {
        let mut rng = StdRng::seed_from_u64(4);
        let network = connected_watts_strogatz(100, 4, 0.1, 100, &mut rng).unwrap();
        assert!(network.is_connected());
    }

    #[test]
    fn grid_without_rewiring() {
        let mut rng = StdRng::seed_from_u64(5);
        let network = rewired_grid(4, 5, 0.0, &mut rng).unwrap();
        assert_eq!(network.node_count(), 20);
        assert_eq!(network.edge_count(), 40);
        assert_eq!(network.neighbors(NodeId(0)).len(), 4);
        assert!(network.is_connected());
    }

    #[test]
    fn rewired_grid_has_no_self_loops() {
        let mut rng = StdRng::seed_from_u64(6);
        let network = rewired_grid(6, 6, 0.5, &mut rng).unwrap();
        assert!(network.edges().all(|(_, u, v)| u != v));
        assert!(network.edge_count() <= 72);
    }
}
