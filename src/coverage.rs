//! Read-side coverage checks over a [`Solution`].
//!
//! All functions here are pure. They back both live validation of solver
//! responses and the test suite.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;

use crate::error::PlannerError;
use crate::model::{CheckpointId, ClusterId, RouteKind, Solution};

/// Cluster id -> checkpoints whose stops serve it.
pub type Coverage = BTreeMap<ClusterId, BTreeSet<CheckpointId>>;

/// Collect, for every cluster served by a checkpoint stop on any route, the
/// set of checkpoint ids serving it. Dynamic stops contribute nothing.
pub fn coverage_of(solution: &Solution) -> Coverage {
    solution
        .routes
        .par_iter()
        .fold(Coverage::new, |mut acc, route| {
            for stop in route.checkpoint_stops() {
                for cluster in &stop.serves_clusters {
                    acc.entry(*cluster)
                        .or_default()
                        .insert(stop.checkpoint_id.clone());
                }
            }
            acc
        })
        .reduce(Coverage::new, merge_coverage)
}

fn merge_coverage(mut left: Coverage, right: Coverage) -> Coverage {
    for (cluster, checkpoints) in right {
        left.entry(cluster).or_default().extend(checkpoints);
    }
    left
}

/// Clusters from `all_clusters` that are neither served nor listed as missing,
/// in ascending order without duplicates.
pub fn uncovered_clusters<'a, I>(solution: &Solution, all_clusters: I) -> Vec<ClusterId>
where
    I: IntoIterator<Item = &'a ClusterId>,
{
    let coverage = coverage_of(solution);
    all_clusters
        .into_iter()
        .filter(|cluster| {
            !coverage.contains_key(cluster) && !solution.missing_clusters.contains(cluster)
        })
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// True iff every id in `all_clusters` is covered or explicitly missing.
pub fn is_fully_covered<'a, I>(solution: &Solution, all_clusters: I) -> bool
where
    I: IntoIterator<Item = &'a ClusterId>,
{
    uncovered_clusters(solution, all_clusters).is_empty()
}

/// Clusters served by more than one distinct checkpoint.
pub fn redundantly_covered(coverage: &Coverage) -> Vec<ClusterId> {
    coverage
        .iter()
        .filter(|(_, checkpoints)| checkpoints.len() > 1)
        .map(|(cluster, _)| *cluster)
        .collect()
}

/// Accept or reject a solution against the coverage invariant.
///
/// Returns the active clusters served by more than one checkpoint. Those are
/// accepted but logged. Destination-based solutions carry no checkpoint stops
/// and are accepted unchanged.
pub fn validate_solution(
    solution: &Solution,
    active_clusters: &BTreeSet<ClusterId>,
) -> Result<Vec<ClusterId>, PlannerError> {
    if solution.route_kind == RouteKind::DestinationBased {
        return Ok(Vec::new());
    }

    let uncovered = uncovered_clusters(solution, active_clusters);
    if !uncovered.is_empty() {
        tracing::warn!(?uncovered, "solution violates coverage invariant");
        return Err(PlannerError::CoverageViolation { uncovered });
    }

    let redundant: Vec<ClusterId> = redundantly_covered(&coverage_of(solution))
        .into_iter()
        .filter(|cluster| active_clusters.contains(cluster))
        .collect();
    if !redundant.is_empty() {
        tracing::warn!(?redundant, "clusters served by several checkpoints");
    }

    Ok(redundant)
}
