//! `reachops`: set reach metric over undirected graphs.
//!
//! Given a node set `S`, every node outside `S` is scored by the reciprocal of its shortest-path
//! distance to the nearest member, and the scores are averaged over the non-members. Distances
//! come from Floyd–Warshall on the undirected, unit-length view of the graph.
//!
//! Public invariants (must not drift):
//! - **Node order**: outputs are indexed by node id \(0..n-1\) consistent with the input graph’s
//!   adapter semantics (e.g. `petgraph::NodeIndex::index()` when using the `petgraph` feature).
//! - **Undirected view**: edge direction is ignored; self-loops never shorten a path.
//! - **No NaN**: unreachable non-members contribute `0`; a set covering every node scores `0.0`.
//! - **Cancellation is not an error**: a cancelled run reports [`RunStatus::Cancelled`] and
//!   leaves the last completed value in place.
//!
//! Swappable (allowed to change without breaking the contract):
//! - iteration strategy (serial vs parallel relaxation)
//! - progress accounting (totals are approximate)
//! - internal data structures (so long as invariants hold)

pub mod apsp;
pub mod attributes;
pub mod cancel;
pub mod graph;
pub mod metric;
pub mod progress;
pub mod reach;
pub mod snapshot;

pub use apsp::{
    all_pairs_shortest_paths, floyd_warshall_in_place, shortest_path_matrix, DistanceMatrix,
};
pub use attributes::{
    AttributeTable, AttributeType, AttributeValue, NodeTable, DEFAULT_MEMBERSHIP_COLUMN,
};
pub use cancel::CancellationToken;
pub use graph::{AdjacencyList, AdjacencyMatrix, Graph, SharedGraph};
pub use metric::{MetricState, ReachConfig, ReachMetric, RunStatus};
pub use progress::{total_units, Control, NoProgress, ProgressCounter, ProgressSink};
pub use reach::{reach, reach_from_flags, reach_from_matrix, ReachRun};
pub use snapshot::GraphSnapshot;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("{what} length must equal node_count (len={actual} node_count={expected})")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("a reach computation is already running")]
    AlreadyRunning,
}

pub type Result<T> = std::result::Result<T, Error>;
