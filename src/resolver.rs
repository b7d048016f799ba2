//! Candidate resolution: position -> owning cluster + ranked checkpoints.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::config::ResolverConfig;
use crate::error::PlannerError;
use crate::geo::{haversine_km, planar_distance};
use crate::model::{Checkpoint, CheckpointId, ClusterId, DemandCluster, Position};
use crate::traits::{AddressRecord, CandidateSource, LocationLookup};

/// A resolved point with its candidates ranked best-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub position: Position,
    pub cluster_id: ClusterId,
    pub candidates: Vec<Checkpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<AddressRecord>,
}

/// How much is known about the checkpoints reaching a resolved point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateCoverage {
    /// No checkpoint currently reaches the cluster.
    Unknown,
    Known { candidates: usize },
}

impl Resolution {
    pub fn coverage(&self) -> CandidateCoverage {
        if self.candidates.is_empty() {
            CandidateCoverage::Unknown
        } else {
            CandidateCoverage::Known {
                candidates: self.candidates.len(),
            }
        }
    }

    pub fn candidate(&self, checkpoint_id: &CheckpointId) -> Option<&Checkpoint> {
        self.candidates.iter().find(|cp| &cp.id == checkpoint_id)
    }

    /// Highest-ranked candidate, if any.
    pub fn best_candidate(&self) -> Option<&Checkpoint> {
        self.candidates.first()
    }
}

/// Order by descending confidence, ties by ascending planar distance to
/// `position`. The sort is stable, so exact ties keep their input order.
pub fn rank_candidates(position: Position, candidates: &mut [Checkpoint]) {
    candidates.sort_by(|a, b| compare_candidates(position, a, b));
}

fn compare_candidates(position: Position, a: &Checkpoint, b: &Checkpoint) -> Ordering {
    b.confidence.total_cmp(&a.confidence).then_with(|| {
        planar_distance(position, a.position).total_cmp(&planar_distance(position, b.position))
    })
}

/// Wraps a [`CandidateSource`] and ranks what it returns.
#[derive(Debug, Clone)]
pub struct CandidateResolver<S> {
    source: S,
}

impl<S: CandidateSource> CandidateResolver<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn resolve(&self, position: Position) -> Result<Resolution, PlannerError> {
        let LocationLookup {
            cluster_id,
            mut checkpoints,
            address,
        } = self.source.lookup(position)?;

        rank_candidates(position, &mut checkpoints);

        if checkpoints.is_empty() {
            tracing::info!(%position, cluster_id, "no checkpoint reaches cluster, coverage unknown");
        } else {
            tracing::debug!(%position, cluster_id, candidates = checkpoints.len(), "resolved position");
        }

        Ok(Resolution {
            position,
            cluster_id,
            candidates: checkpoints,
            address,
        })
    }
}

/// In-memory candidate source over a known set of clusters and checkpoints.
///
/// A position belongs to the cluster with the nearest centroid, provided it
/// lies within the configured service radius.
#[derive(Debug, Clone)]
pub struct ClusterIndex {
    clusters: Vec<DemandCluster>,
    checkpoints: Vec<Checkpoint>,
    config: ResolverConfig,
}

impl ClusterIndex {
    pub fn new(
        clusters: Vec<DemandCluster>,
        checkpoints: Vec<Checkpoint>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            clusters,
            checkpoints,
            config,
        }
    }

    /// Nearest cluster within the service radius, with its distance in km.
    pub fn nearest_cluster(&self, position: Position) -> Option<(&DemandCluster, f64)> {
        self.clusters
            .iter()
            .map(|cluster| (cluster, haversine_km(position, cluster.centroid)))
            .filter(|(_, km)| *km <= self.config.service_radius_km)
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
    }
}

impl CandidateSource for ClusterIndex {
    fn lookup(&self, position: Position) -> Result<LocationLookup, PlannerError> {
        let (cluster, km) = self
            .nearest_cluster(position)
            .ok_or(PlannerError::NotCovered { position })?;

        tracing::debug!(cluster_id = cluster.id, distance_km = km, "assigned nearest cluster");

        let checkpoints = self
            .checkpoints
            .iter()
            .filter(|cp| cp.serves(cluster.id))
            .cloned()
            .collect();

        Ok(LocationLookup {
            cluster_id: cluster.id,
            checkpoints,
            address: None,
        })
    }
}
