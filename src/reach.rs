//! Set reach metric.
//!
//! For a node set `S` over `n` nodes:
//!
//! ```text
//! dset(i) = min_{j in S} d(i, j)                  (i not in S)
//! reach   = Σ_{i not in S} 1 / dset(i)  /  (n - |S|)
//! ```
//!
//! Numeric policy:
//! - `1 / inf == 0`: a node that reaches no member (or an empty `S`) contributes nothing.
//! - `n - |S| == 0` (every node is a member, or `n == 0`): reach is `0.0`.
//!
//! The result is always finite and in `[0, 1]`.

use crate::apsp::{all_pairs_shortest_paths, shortest_path_matrix, DistanceMatrix};
use crate::graph::Graph;
use crate::progress::Control;
use crate::snapshot::GraphSnapshot;
use crate::{Error, Result};

/// Outcome of one reach computation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReachRun {
    pub value: f64,
    /// Number of members.
    pub set_size: usize,
    /// Number of non-members, the denominator.
    pub outside: usize,
    /// Non-members with no path to any member.
    pub unreachable: usize,
    /// `dset` per node: `0` for members, `f64::INFINITY` for unreachable non-members.
    pub nearest: Vec<f64>,
}

/// Distance from every node to its nearest member.
///
/// Members get `0`; non-members get `f64::INFINITY` when no member is reachable. Ticks `n` for
/// initialization and `n` for the scan. `None` if cancelled.
pub fn nearest_set_distances(
    d: &DistanceMatrix,
    in_set: &[bool],
    control: Control<'_>,
) -> Option<Vec<f64>> {
    let n = d.node_count();
    debug_assert_eq!(in_set.len(), n);

    let mut nearest = Vec::with_capacity(n);
    for _ in 0..n {
        if control.is_cancelled() {
            return None;
        }
        nearest.push(f64::INFINITY);
        control.tick();
    }

    for (i, slot) in nearest.iter_mut().enumerate() {
        if control.is_cancelled() {
            return None;
        }
        *slot = if in_set[i] {
            0.0
        } else {
            nearest_member(d.row(i), in_set)
        };
        control.tick();
    }
    Some(nearest)
}

fn nearest_member(row: &[f64], in_set: &[bool]) -> f64 {
    row.iter()
        .zip(in_set)
        .filter(|(_, &member)| member)
        .map(|(&dist, _)| dist)
        .fold(f64::INFINITY, f64::min)
}

/// Reciprocal of a distance, with `1 / inf == 0`.
#[inline]
pub fn reciprocal(distance: f64) -> f64 {
    if distance.is_infinite() {
        0.0
    } else {
        1.0 / distance
    }
}

/// Reduce nearest-member distances to the reach value. Ticks once per node; `None` if cancelled.
pub fn aggregate(nearest: Vec<f64>, in_set: &[bool], control: Control<'_>) -> Option<ReachRun> {
    debug_assert_eq!(nearest.len(), in_set.len());

    let mut sum = 0.0_f64;
    let mut unreachable = 0usize;
    for (&dist, &member) in nearest.iter().zip(in_set) {
        if control.is_cancelled() {
            return None;
        }
        if !member {
            if dist.is_infinite() {
                unreachable += 1;
            }
            sum += reciprocal(dist);
        }
        control.tick();
    }
    Some(summarize(nearest, in_set, sum, unreachable))
}

fn summarize(nearest: Vec<f64>, in_set: &[bool], sum: f64, unreachable: usize) -> ReachRun {
    let set_size = in_set.iter().filter(|&&b| b).count();
    let outside = in_set.len() - set_size;
    let value = if outside == 0 {
        0.0
    } else {
        sum / outside as f64
    };

    ReachRun {
        value,
        set_size,
        outside,
        unreachable,
        nearest,
    }
}

/// Shortest paths, nearest-member distances and aggregation over a captured snapshot.
///
/// `None` if cancelled, including when the snapshot itself was cut short.
pub fn reach_snapshot(snapshot: &GraphSnapshot, control: Control<'_>) -> Option<ReachRun> {
    if !snapshot.is_complete() {
        return None;
    }
    tracing::debug!(n = snapshot.node_count(), "computing all-pairs shortest paths");
    let d = all_pairs_shortest_paths(snapshot.adjacency(), control)?;
    tracing::debug!(set_size = snapshot.set_size(), "aggregating reach");
    let nearest = nearest_set_distances(&d, snapshot.in_set(), control)?;
    aggregate(nearest, snapshot.in_set(), control)
}

/// Reach of the set given by `in_set` over a precomputed distance matrix.
pub fn reach_from_matrix(d: &DistanceMatrix, in_set: &[bool]) -> Result<ReachRun> {
    check_flags(d.node_count(), in_set)?;
    let nearest: Vec<f64> = in_set
        .iter()
        .enumerate()
        .map(|(i, &member)| {
            if member {
                0.0
            } else {
                nearest_member(d.row(i), in_set)
            }
        })
        .collect();
    let (sum, unreachable) = nearest
        .iter()
        .zip(in_set)
        .filter(|(_, &member)| !member)
        .fold((0.0_f64, 0usize), |(sum, unreachable), (&dist, _)| {
            (sum + reciprocal(dist), unreachable + usize::from(dist.is_infinite()))
        });
    Ok(summarize(nearest, in_set, sum, unreachable))
}

/// Reach of the set given by `in_set` over the undirected view of `graph`.
pub fn reach_from_flags<G: Graph>(graph: &G, in_set: &[bool]) -> Result<ReachRun> {
    check_flags(graph.node_count(), in_set)?;
    reach_from_matrix(&shortest_path_matrix(graph), in_set)
}

/// Reach value only; see [`reach_from_flags`].
pub fn reach<G: Graph>(graph: &G, in_set: &[bool]) -> Result<f64> {
    reach_from_flags(graph, in_set).map(|run| run.value)
}

fn check_flags(n: usize, in_set: &[bool]) -> Result<()> {
    if in_set.len() != n {
        return Err(Error::LengthMismatch {
            what: "membership flags",
            expected: n,
            actual: in_set.len(),
        });
    }
    Ok(())
}
