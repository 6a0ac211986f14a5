//! Immutable view of a graph for one reach computation.
//!
//! Capturing a snapshot is the only step that needs a consistent read of the graph; the
//! shortest-path and aggregation stages run on the snapshot alone.

use crate::attributes::{AttributeTable, AttributeType};
use crate::graph::Graph;
use crate::progress::Control;
use crate::{Error, Result};

/// Undirected adjacency plus set membership, indexed `0..n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSnapshot {
    adjacency: Vec<Vec<usize>>,
    in_set: Vec<bool>,
    complete: bool,
}

impl GraphSnapshot {
    /// Undirected adjacency of `graph`.
    ///
    /// Each `u -> v` is recorded on both endpoints. Self-loops and out-of-range neighbors are
    /// dropped, duplicates collapsed; neighbor lists are sorted.
    pub fn undirected_adjacency<G: Graph>(graph: &G) -> Vec<Vec<usize>> {
        let n = graph.node_count();
        let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];
        for u in 0..n {
            for v in graph.neighbors(u) {
                if v >= n || v == u {
                    continue;
                }
                adj[u].push(v);
                adj[v].push(u);
            }
        }
        for list in &mut adj {
            list.sort_unstable();
            list.dedup();
        }
        adj
    }

    /// Snapshot with membership read from `column` of `table`.
    ///
    /// The column must exist and be declared boolean; otherwise every flag is `false` and no
    /// per-node scan happens. The scan polls `control` before each node.
    pub fn from_table<G: Graph, A: AttributeTable + ?Sized>(
        graph: &G,
        table: &A,
        column: &str,
        control: Control<'_>,
    ) -> Self {
        let adjacency = Self::undirected_adjacency(graph);
        let n = adjacency.len();
        let mut in_set = vec![false; n];
        let mut complete = true;

        if table.column_type(column) == Some(AttributeType::Boolean) {
            for (node, flag) in in_set.iter_mut().enumerate() {
                if control.is_cancelled() {
                    complete = false;
                    break;
                }
                *flag = table
                    .value(node, column)
                    .is_some_and(|v| v.as_flag());
                control.tick();
            }
        } else {
            tracing::debug!(column, "membership column missing or not boolean; set is empty");
        }

        Self {
            adjacency,
            in_set,
            complete,
        }
    }

    /// Snapshot with caller-supplied membership.
    ///
    /// `flags.len()` must equal the node count.
    pub fn from_flags<G: Graph>(graph: &G, flags: &[bool], control: Control<'_>) -> Result<Self> {
        let adjacency = Self::undirected_adjacency(graph);
        if flags.len() != adjacency.len() {
            return Err(Error::LengthMismatch {
                what: "membership flags",
                expected: adjacency.len(),
                actual: flags.len(),
            });
        }
        let complete = !control.is_cancelled();
        if complete {
            control.advance(flags.len() as u64);
        }
        Ok(Self {
            adjacency,
            in_set: flags.to_vec(),
            complete,
        })
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn adjacency(&self) -> &[Vec<usize>] {
        &self.adjacency
    }

    pub fn in_set(&self) -> &[bool] {
        &self.in_set
    }

    pub fn set_size(&self) -> usize {
        self.in_set.iter().filter(|&&b| b).count()
    }

    /// `false` if the membership scan was cut short by cancellation.
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}
