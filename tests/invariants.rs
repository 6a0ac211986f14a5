use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};

use proptest::prelude::*;
use reachops::{
    reach, reach_from_flags, shortest_path_matrix, AdjacencyList, AdjacencyMatrix,
    CancellationToken, MetricState, NodeTable, ProgressSink, ReachMetric, RunStatus,
    SharedGraph, DEFAULT_MEMBERSHIP_COLUMN,
};

fn graph_from(n: usize, edges: &[(usize, usize)]) -> AdjacencyList {
    let edges: Vec<(usize, usize)> = edges
        .iter()
        .copied()
        .filter(|&(u, v)| u < n && v < n)
        .collect();
    AdjacencyList::from_edges(n, &edges)
}

#[cfg(feature = "petgraph")]
mod petgraph_invariants {
    use petgraph::prelude::*;
    use reachops::reach;

    #[test]
    fn directed_petgraph_is_read_as_undirected() {
        // 0 -> 1 -> 2, set {2}: node 0 is two hops away only if direction is ignored.
        let mut g: DiGraph<(), ()> = DiGraph::new();
        let a = g.add_node(());
        let b = g.add_node(());
        let c = g.add_node(());
        g.add_edge(a, b, ());
        g.add_edge(b, c, ());

        let value = reach(&g, &[false, false, true]).unwrap();
        assert!((value - 0.75).abs() < 1e-12, "reach={value}");
    }
}

#[test]
fn adjacency_matrix_direction_is_ignored() {
    // 0 -> 1 only
    let adj = vec![vec![0.0, 1.0], vec![0.0, 0.0]];
    let g = AdjacencyMatrix(&adj);
    assert_eq!(reach(&g, &[false, true]).unwrap(), 1.0);
    assert_eq!(reach(&g, &[true, false]).unwrap(), 1.0);
}

#[test]
fn star_center_reaches_every_leaf() {
    let g = graph_from(5, &[(0, 1), (0, 2), (0, 3), (0, 4)]);
    assert_eq!(reach(&g, &[true, false, false, false, false]).unwrap(), 1.0);

    // A leaf sees the center at 1 and the other leaves at 2.
    let leaf = reach_from_flags(&g, &[false, true, false, false, false]).unwrap();
    assert!((leaf.value - (1.0 + 3.0 * 0.5) / 4.0).abs() < 1e-12);
}

#[test]
fn cancel_from_another_thread_keeps_value() {
    // The sink parks the computation on its first tick until the other thread has cancelled.
    struct Rendezvous {
        barrier: Barrier,
        waited: AtomicBool,
    }
    impl ProgressSink for Rendezvous {
        fn start(&self, _total: u64) {}
        fn tick(&self) {
            if !self.waited.swap(true, Ordering::SeqCst) {
                self.barrier.wait();
                self.barrier.wait();
            }
        }
    }

    let metric = Arc::new(ReachMetric::new());
    let graph = SharedGraph::new(graph_from(4, &[(0, 1), (1, 2), (2, 3)]));
    let table = NodeTable::with_members(DEFAULT_MEMBERSHIP_COLUMN, &[0]);
    metric.execute(&graph, &table).unwrap();
    let before = metric.value();
    assert!(before > 0.0);

    let sink = Arc::new(Rendezvous {
        barrier: Barrier::new(2),
        waited: AtomicBool::new(false),
    });
    metric.set_progress_ticket(sink.clone());

    let worker = {
        let metric = Arc::clone(&metric);
        let graph = graph.clone();
        std::thread::spawn(move || {
            let table = NodeTable::with_members(DEFAULT_MEMBERSHIP_COLUMN, &[3]);
            metric.execute(&graph, &table).unwrap()
        })
    };

    sink.barrier.wait();
    assert_eq!(metric.state(), MetricState::Running);
    assert!(metric.cancel());
    sink.barrier.wait();

    assert_eq!(worker.join().unwrap(), RunStatus::Cancelled);
    assert_eq!(metric.state(), MetricState::Cancelled);
    assert_eq!(metric.value(), before);
}

#[test]
fn graph_is_writable_after_execute_returns() {
    let metric = ReachMetric::new();
    let graph = SharedGraph::new(graph_from(3, &[(0, 1)]));
    let table = NodeTable::with_members(DEFAULT_MEMBERSHIP_COLUMN, &[0]);
    metric.execute(&graph, &table).unwrap();
    assert!((metric.value() - 0.5).abs() < 1e-12);

    assert!(graph.write().add_edge(1, 2));
    metric.execute(&graph, &table).unwrap();
    assert!((metric.value() - 0.75).abs() < 1e-12);
}

#[test]
fn token_clones_observe_cancel() {
    let metric = ReachMetric::new();
    let token: CancellationToken = metric.cancellation_token();
    metric.cancel();
    assert!(token.is_cancelled());
}

proptest! {
    #[test]
    fn prop_distance_matrix_is_symmetric_with_zero_diagonal(
        n in 0usize..14,
        edges in proptest::collection::vec((0usize..14, 0usize..14), 0..50),
    ) {
        let g = graph_from(n, &edges);
        let d = shortest_path_matrix(&g);
        prop_assert_eq!(d.node_count(), n);
        prop_assert!(d.is_symmetric());
        for i in 0..n {
            prop_assert_eq!(d.get(i, i), 0.0);
        }
    }

    #[test]
    fn prop_triangle_inequality_over_edges(
        n in 1usize..12,
        edges in proptest::collection::vec((0usize..12, 0usize..12), 0..40),
    ) {
        let g = graph_from(n, &edges);
        let d = shortest_path_matrix(&g);
        for &(u, v) in &edges {
            if u < n && v < n && u != v {
                prop_assert_eq!(d.get(u, v), 1.0);
                for w in 0..n {
                    prop_assert!(d.get(u, w) <= d.get(v, w) + 1.0);
                }
            }
        }
    }

    #[test]
    fn prop_empty_and_full_sets_score_zero(
        n in 1usize..12,
        edges in proptest::collection::vec((0usize..12, 0usize..12), 0..40),
    ) {
        let g = graph_from(n, &edges);
        prop_assert_eq!(reach(&g, &vec![false; n]).unwrap(), 0.0);
        prop_assert_eq!(reach(&g, &vec![true; n]).unwrap(), 0.0);
    }

    #[test]
    fn prop_isolated_non_member_adds_nothing_to_numerator(
        n in 1usize..10,
        edges in proptest::collection::vec((0usize..10, 0usize..10), 0..30),
        members in proptest::collection::vec(any::<bool>(), 10),
    ) {
        let g = graph_from(n, &edges);
        let flags = &members[..n];
        let base = reach_from_flags(&g, flags).unwrap();

        let mut grown = g.clone();
        grown.add_node();
        let mut grown_flags = flags.to_vec();
        grown_flags.push(false);
        let with_isolated = reach_from_flags(&grown, &grown_flags).unwrap();

        prop_assert_eq!(with_isolated.outside, base.outside + 1);
        let base_sum = base.value * base.outside as f64;
        let grown_sum = with_isolated.value * with_isolated.outside as f64;
        prop_assert!((base_sum - grown_sum).abs() < 1e-9, "base={} grown={}", base_sum, grown_sum);
    }
}
