//! All-pairs shortest paths (Floyd–Warshall) over unit-length undirected edges.
//!
//! Invariants:
//! - `d[i][i] == 0` and `d[i][j] == d[j][i]` for matrices built from a symmetric adjacency.
//! - Every finite entry is the length of some real path, even after an interrupted run.
//! - After a completed run, `d[i][j]` is the shortest-path length, `f64::INFINITY` if none.

use crate::graph::Graph;
use crate::progress::Control;
use crate::snapshot::GraphSnapshot;

/// Dense row-major `n x n` distance matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// All pairs unreachable except the zero diagonal.
    pub fn unreachable(n: usize) -> Self {
        let mut data = vec![f64::INFINITY; n * n];
        for i in 0..n {
            data[i * n + i] = 0.0;
        }
        Self { n, data }
    }

    /// Initial distances: `0` on the diagonal, `1` between neighbors, infinity elsewhere.
    ///
    /// Polls `control` once per row; `None` if cancelled.
    pub fn from_adjacency(adjacency: &[Vec<usize>], control: Control<'_>) -> Option<Self> {
        let n = adjacency.len();
        let mut d = Self::unreachable(n);
        for (i, neighbors) in adjacency.iter().enumerate() {
            if control.is_cancelled() {
                return None;
            }
            d.connect_row(i, neighbors);
            control.advance(n as u64);
        }
        Some(d)
    }

    fn connect_row(&mut self, i: usize, neighbors: &[usize]) {
        let n = self.n;
        for &j in neighbors {
            if j < n && j != i {
                self.data[i * n + j] = 1.0;
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.n).map(move |i| self.row(i))
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.n).all(|i| (0..i).all(|j| self.get(i, j) == self.get(j, i)))
    }
}

/// Relax `d` in place, considering intermediates `k = 0..n` in order.
///
/// Row `k` is fixed during pass `k` (`d[k][k] == 0`), so it is copied once per pass and the
/// other rows are relaxed against the copy, in any order. Cancellation is polled before every
/// pass and every row; progress ticks once per `(k, i)`.
///
/// Returns `false` if cancelled; `d` is then partially relaxed and must not be used as a
/// result.
pub fn floyd_warshall_in_place(d: &mut DistanceMatrix, control: Control<'_>) -> bool {
    let n = d.n;
    let mut pivot = vec![0.0_f64; n];
    for k in 0..n {
        if control.is_cancelled() {
            return false;
        }
        pivot.copy_from_slice(d.row(k));
        relax_pass(&mut d.data, &pivot, k, control);
    }
    !control.is_cancelled()
}

#[cfg(not(feature = "parallel"))]
fn relax_pass(data: &mut [f64], pivot: &[f64], k: usize, control: Control<'_>) {
    for row in data.chunks_mut(pivot.len()) {
        if control.is_cancelled() {
            return;
        }
        relax_row(row, pivot, k);
        control.tick();
    }
}

#[cfg(feature = "parallel")]
fn relax_pass(data: &mut [f64], pivot: &[f64], k: usize, control: Control<'_>) {
    use rayon::prelude::*;

    data.par_chunks_mut(pivot.len()).for_each(|row| {
        if control.is_cancelled() {
            return;
        }
        relax_row(row, pivot, k);
        control.tick();
    });
}

#[inline]
fn relax_row(row: &mut [f64], pivot: &[f64], k: usize) {
    let dik = row[k];
    if dik.is_infinite() {
        return;
    }
    for (dij, &dkj) in row.iter_mut().zip(pivot) {
        let via = dik + dkj;
        if via < *dij {
            *dij = via;
        }
    }
}

/// Initial matrix plus full relaxation; `None` if cancelled at any point.
pub fn all_pairs_shortest_paths(
    adjacency: &[Vec<usize>],
    control: Control<'_>,
) -> Option<DistanceMatrix> {
    let mut d = DistanceMatrix::from_adjacency(adjacency, control)?;
    floyd_warshall_in_place(&mut d, control).then_some(d)
}

/// Shortest-path matrix of the undirected view of `graph`, without cancellation or progress.
pub fn shortest_path_matrix<G: Graph>(graph: &G) -> DistanceMatrix {
    let adjacency = GraphSnapshot::undirected_adjacency(graph);
    let mut d = DistanceMatrix::unreachable(adjacency.len());
    for (i, neighbors) in adjacency.iter().enumerate() {
        d.connect_row(i, neighbors);
    }
    let token = crate::cancel::CancellationToken::new();
    floyd_warshall_in_place(&mut d, Control::new(&token, &crate::progress::NoProgress));
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancellationToken;
    use crate::graph::AdjacencyList;
    use crate::progress::{NoProgress, ProgressCounter, ProgressSink};

    #[test]
    fn path_distances() {
        // 0 - 1 - 2 - 3
        let g = AdjacencyList::from_edges(4, &[(0, 1), (1, 2), (2, 3)]);
        let d = shortest_path_matrix(&g);
        assert_eq!(d.row(0), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(d.get(3, 1), 2.0);
        assert!(d.is_symmetric());
        assert_eq!(d.rows().count(), 4);
        assert_eq!(d.rows().last(), Some(d.row(3)));
    }

    #[test]
    fn disconnected_pairs_stay_infinite() {
        // 0 - 1   2
        let g = AdjacencyList::from_edges(3, &[(0, 1)]);
        let d = shortest_path_matrix(&g);
        assert!(d.get(0, 2).is_infinite());
        assert!(d.get(2, 1).is_infinite());
        assert_eq!(d.get(2, 2), 0.0);
    }

    #[test]
    fn cycle_takes_the_short_way_round() {
        // 6-cycle: opposite nodes are 3 apart, neighbors-of-neighbors 2.
        let edges: Vec<(usize, usize)> = (0..6).map(|i| (i, (i + 1) % 6)).collect();
        let g = AdjacencyList::from_edges(6, &edges);
        let d = shortest_path_matrix(&g);
        assert_eq!(d.get(0, 3), 3.0);
        assert_eq!(d.get(0, 4), 2.0);
        assert_eq!(d.get(5, 1), 2.0);
    }

    #[test]
    fn empty_matrix() {
        let d = shortest_path_matrix(&AdjacencyList::new(0));
        assert_eq!(d.node_count(), 0);
        assert_eq!(d.rows().count(), 0);
    }

    #[test]
    fn progress_counts_init_and_relaxation() {
        let g = AdjacencyList::from_edges(5, &[(0, 1), (1, 2), (3, 4)]);
        let adjacency = GraphSnapshot::undirected_adjacency(&g);
        let token = CancellationToken::new();
        let counter = ProgressCounter::new();
        counter.start(50);
        let d = all_pairs_shortest_paths(&adjacency, Control::new(&token, &counter));
        assert!(d.is_some());
        assert_eq!(counter.snapshot().done, 25 + 25);
    }

    #[test]
    fn cancelled_relaxation_leaves_real_path_lengths() {
        let edges: Vec<(usize, usize)> = (0..7).map(|i| (i, i + 1)).collect();
        let g = AdjacencyList::from_edges(8, &edges);
        let adjacency = GraphSnapshot::undirected_adjacency(&g);
        let exact = shortest_path_matrix(&g);

        struct CancelAfter {
            token: CancellationToken,
            left: std::sync::atomic::AtomicUsize,
        }
        impl ProgressSink for CancelAfter {
            fn start(&self, _total: u64) {}
            fn tick(&self) {
                use std::sync::atomic::Ordering;
                if self.left.fetch_sub(1, Ordering::SeqCst) == 1 {
                    self.token.cancel();
                }
            }
        }

        let token = CancellationToken::new();
        let sink = CancelAfter {
            token: token.clone(),
            left: std::sync::atomic::AtomicUsize::new(20),
        };
        let control = Control::new(&token, &sink);
        let mut d = DistanceMatrix::from_adjacency(&adjacency, Control::new(&token, &NoProgress))
            .unwrap();
        assert!(!floyd_warshall_in_place(&mut d, control));

        for i in 0..8 {
            assert_eq!(d.get(i, i), 0.0);
            for j in 0..8 {
                assert!(d.get(i, j) >= exact.get(i, j), "d[{i}][{j}] below true distance");
            }
        }
        assert!(all_pairs_shortest_paths(&adjacency, control).is_none());
    }
}
