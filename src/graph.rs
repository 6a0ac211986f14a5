//! Graph adapter trait and the graph types this crate ships.
//!
//! Nodes are ordinals `0..node_count()`. Every operator in this crate reads the graph only
//! through [`Graph`], so any storage can participate by implementing it.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Owned-neighbor adapter.
pub trait Graph {
    fn node_count(&self) -> usize;

    /// Outgoing neighbors of `node`. Undirected graphs list each neighbor once per endpoint.
    fn neighbors(&self, node: usize) -> Vec<usize>;

    /// Whether `a` and `b` share an edge in either direction.
    fn is_adjacent(&self, a: usize, b: usize) -> bool {
        self.neighbors(a).contains(&b) || self.neighbors(b).contains(&a)
    }
}

/// Dense adjacency matrix view: `adj[u][v] != 0.0` means an edge `u -> v`.
#[derive(Debug, Clone, Copy)]
pub struct AdjacencyMatrix<'a>(pub &'a [Vec<f64>]);

impl Graph for AdjacencyMatrix<'_> {
    fn node_count(&self) -> usize {
        self.0.len()
    }

    fn neighbors(&self, node: usize) -> Vec<usize> {
        self.0[node]
            .iter()
            .enumerate()
            .filter(|(_, &w)| w != 0.0)
            .map(|(v, _)| v)
            .collect()
    }

    fn is_adjacent(&self, a: usize, b: usize) -> bool {
        self.0[a][b] != 0.0 || self.0[b][a] != 0.0
    }
}

/// Adjacency lists, one `Vec` per node.
///
/// Handy for building graphs by hand; edges added through [`AdjacencyList::add_edge`] are
/// recorded on both endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencyList {
    adj: Vec<Vec<usize>>,
}

impl AdjacencyList {
    pub fn new(n: usize) -> Self {
        Self {
            adj: vec![Vec::new(); n],
        }
    }

    /// Build from an edge list. Out-of-range endpoints are ignored.
    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Self {
        let mut g = Self::new(n);
        for &(u, v) in edges {
            g.add_edge(u, v);
        }
        g
    }

    pub fn add_node(&mut self) -> usize {
        self.adj.push(Vec::new());
        self.adj.len() - 1
    }

    /// Add an undirected edge. Returns `false` if it already existed or is out of range.
    pub fn add_edge(&mut self, u: usize, v: usize) -> bool {
        let n = self.adj.len();
        if u >= n || v >= n || self.adj[u].contains(&v) {
            return false;
        }
        self.adj[u].push(v);
        if u != v {
            self.adj[v].push(u);
        }
        true
    }

    /// Remove an undirected edge. Returns `false` if it was not present.
    pub fn remove_edge(&mut self, u: usize, v: usize) -> bool {
        let n = self.adj.len();
        if u >= n || v >= n {
            return false;
        }
        let before = self.adj[u].len();
        self.adj[u].retain(|&x| x != v);
        self.adj[v].retain(|&x| x != u);
        self.adj[u].len() != before
    }
}

impl Graph for AdjacencyList {
    fn node_count(&self) -> usize {
        self.adj.len()
    }

    fn neighbors(&self, node: usize) -> Vec<usize> {
        self.adj[node].clone()
    }

    fn is_adjacent(&self, a: usize, b: usize) -> bool {
        self.adj[a].contains(&b)
    }
}

#[cfg(feature = "petgraph")]
impl<N, E, Ty, Ix> Graph for petgraph::Graph<N, E, Ty, Ix>
where
    Ty: petgraph::EdgeType,
    Ix: petgraph::graph::IndexType,
{
    fn node_count(&self) -> usize {
        petgraph::Graph::node_count(self)
    }

    fn neighbors(&self, node: usize) -> Vec<usize> {
        petgraph::Graph::neighbors(self, petgraph::graph::NodeIndex::new(node))
            .map(|v| v.index())
            .collect()
    }

    fn is_adjacent(&self, a: usize, b: usize) -> bool {
        let (a, b) = (
            petgraph::graph::NodeIndex::new(a),
            petgraph::graph::NodeIndex::new(b),
        );
        self.find_edge_undirected(a, b).is_some()
    }
}

/// A graph shared between readers (computations) and writers (whoever edits it).
///
/// Operators take the read guard only for as long as they need a consistent view.
#[derive(Debug, Default)]
pub struct SharedGraph<G> {
    inner: Arc<RwLock<G>>,
}

impl<G> Clone for SharedGraph<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G> SharedGraph<G> {
    pub fn new(graph: G) -> Self {
        Self {
            inner: Arc::new(RwLock::new(graph)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, G> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, G> {
        self.inner.write()
    }
}
