//! Boundary traits for the external collaborators of the insertion workflow.
//!
//! The workflow core never talks to a network or a database directly. Front
//! ends plug in [`crate::http::HttpBackend`], the in-memory
//! [`crate::resolver::ClusterIndex`], or their own implementations.

use serde::{Deserialize, Serialize};

use crate::error::PlannerError;
use crate::insertion::InsertionRequest;
use crate::model::{Checkpoint, ClusterId, Position, Solution};

/// Reverse-geocoded address for a position. Opaque to the core.
pub type AddressRecord = serde_json::Value;

/// Raw answer of a location lookup, before candidate ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationLookup {
    pub cluster_id: ClusterId,
    /// Checkpoints able to serve the cluster, in no particular order. May be
    /// empty.
    #[serde(default)]
    pub checkpoints: Vec<Checkpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<AddressRecord>,
}

/// Maps a raw coordinate to its owning cluster and candidate checkpoints.
pub trait CandidateSource {
    /// Fails with `NotCovered` outside every cluster's service radius and
    /// with `ServiceUnavailable` on transport failure.
    fn lookup(&self, position: Position) -> Result<LocationLookup, PlannerError>;
}

/// Re-optimizes a solution with new pickup/dropoff pairs spliced in.
pub trait InsertionSolver {
    /// Returns the updated solution, or `InfeasibleInsertion` when no
    /// feasible sequencing exists.
    fn solve_insertion(&self, request: &InsertionRequest) -> Result<Solution, PlannerError>;
}

/// Persistence of a cluster's checkpoint set.
pub trait CheckpointStore {
    fn list(&self, cluster_id: ClusterId) -> Result<Vec<Checkpoint>, PlannerError>;

    /// Derive candidate checkpoints from road topology and persist them.
    fn generate(&self, cluster_id: ClusterId) -> Result<Vec<Checkpoint>, PlannerError>;

    /// Replace the full checkpoint set of the cluster. Persisted ids are
    /// assigned by the store; read them back with `list`.
    fn save(&self, cluster_id: ClusterId, checkpoints: &[Checkpoint]) -> Result<(), PlannerError>;

    fn delete(&self, checkpoint_id: i64) -> Result<(), PlannerError>;
}

/// Read-only access to previously computed solutions.
pub trait SolutionArchive {
    fn fetch(&self, solution_id: &str) -> Result<Solution, PlannerError>;
}

impl<T: CandidateSource + ?Sized> CandidateSource for &T {
    fn lookup(&self, position: Position) -> Result<LocationLookup, PlannerError> {
        (**self).lookup(position)
    }
}

impl<T: InsertionSolver + ?Sized> InsertionSolver for &T {
    fn solve_insertion(&self, request: &InsertionRequest) -> Result<Solution, PlannerError> {
        (**self).solve_insertion(request)
    }
}
