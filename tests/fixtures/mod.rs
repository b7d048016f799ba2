//! Test fixtures for checkpoint-planner.
//!
//! Provides:
//! - A small Kuala Lumpur scenario (clusters, checkpoints, solved routes)
//! - Builders for checkpoints and solutions
//! - Fake boundary implementations (solver, sources, checkpoint store)

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};

use checkpoint_planner::config::ResolverConfig;
use checkpoint_planner::error::PlannerError;
use checkpoint_planner::insertion::InsertionRequest;
use checkpoint_planner::model::{
    Checkpoint, CheckpointId, CheckpointSource, CheckpointStop, ClusterId, DemandCluster,
    DistanceBasis, Position, RouteKind, Solution, Stop, VehicleRoute,
};
use checkpoint_planner::resolver::ClusterIndex;
use checkpoint_planner::traits::{CandidateSource, CheckpointStore, InsertionSolver, LocationLookup};

// ============================================================================
// Scenario
// ============================================================================

pub const WAREHOUSE: Position = Position::new(3.127993, 101.466972);

/// Inside cluster 7 (centroid 3.140, 101.480).
pub const PICKUP_IN_7: Position = Position::new(3.1405, 101.4805);
/// Inside cluster 9 (centroid 3.110, 101.450).
pub const DROPOFF_IN_9: Position = Position::new(3.1102, 101.4497);
/// Inside cluster 12, which no checkpoint reaches.
pub const POINT_IN_12: Position = Position::new(3.190, 101.520);
/// Far outside every cluster's service radius.
pub const OFFSHORE: Position = Position::new(2.500, 100.500);

pub fn clusters() -> Vec<DemandCluster> {
    [
        (3, 3.150, 101.460),
        (4, 3.120, 101.490),
        (6, 3.100, 101.470),
        (7, 3.140, 101.480),
        (9, 3.110, 101.450),
        (12, 3.190, 101.520),
    ]
    .into_iter()
    .map(|(id, lat, lon)| DemandCluster {
        id,
        centroid: Position::new(lat, lon),
        member_count: 5,
    })
    .collect()
}

pub fn checkpoints() -> Vec<Checkpoint> {
    vec![
        checkpoint(30, 3.149, 101.459, 0.8, &[3]),
        checkpoint(40, 3.121, 101.489, 0.7, &[4]),
        checkpoint(60, 3.101, 101.471, 0.6, &[6]),
        checkpoint(70, 3.1412, 101.4811, 0.4, &[7]),
        checkpoint(71, 3.1391, 101.4790, 0.9, &[7]),
        checkpoint(90, 3.1110, 101.4510, 0.8, &[9]),
    ]
}

pub fn active_clusters() -> BTreeSet<ClusterId> {
    [3, 4, 6, 7, 9].into_iter().collect()
}

pub fn cluster_index() -> ClusterIndex {
    ClusterIndex::new(clusters(), checkpoints(), ResolverConfig { service_radius_km: 2.0 })
}

/// Vehicle 0: 30 -> 71 -> 40, vehicle 1: 90 -> 60.
pub fn solved_scenario() -> Solution {
    SolutionBuilder::new()
        .route(10.0, vec![cp_stop(30, &[3]), cp_stop(71, &[7]), cp_stop(40, &[4])])
        .route(6.0, vec![cp_stop(90, &[9]), cp_stop(60, &[6])])
        .build()
}

// ============================================================================
// Builders
// ============================================================================

pub fn checkpoint(id: i64, lat: f64, lon: f64, confidence: f64, clusters: &[ClusterId]) -> Checkpoint {
    Checkpoint {
        id: CheckpointId::Stored(id),
        position: Position::new(lat, lon),
        serves_clusters: clusters.iter().copied().collect(),
        confidence,
        source: CheckpointSource::TopologyBottleneck,
    }
}

pub fn cp_stop(id: i64, clusters: &[ClusterId]) -> Stop {
    Stop::Checkpoint(CheckpointStop {
        checkpoint_id: CheckpointId::Stored(id),
        position: Position::new(3.1, 101.4 + id as f64 / 1000.0),
        serves_clusters: clusters.iter().copied().collect(),
    })
}

/// Builder for solutions with sensible defaults.
#[derive(Clone, Debug)]
pub struct SolutionBuilder {
    routes: Vec<VehicleRoute>,
    missing: BTreeSet<ClusterId>,
    route_kind: RouteKind,
}

impl SolutionBuilder {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            missing: BTreeSet::new(),
            route_kind: RouteKind::CheckpointBased,
        }
    }

    pub fn route(mut self, distance: f64, stops: Vec<Stop>) -> Self {
        self.routes.push(VehicleRoute {
            vehicle_index: self.routes.len(),
            stops,
            distance,
            detailed_geometry: None,
        });
        self
    }

    pub fn missing(mut self, cluster: ClusterId) -> Self {
        self.missing.insert(cluster);
        self
    }

    pub fn destination_based(mut self) -> Self {
        self.route_kind = RouteKind::DestinationBased;
        self
    }

    pub fn build(self) -> Solution {
        Solution {
            warehouse_position: WAREHOUSE,
            routes: self.routes,
            missing_clusters: self.missing,
            distance_basis: DistanceBasis::RoadNetwork,
            route_kind: self.route_kind,
        }
    }
}

// ============================================================================
// Fake boundaries
// ============================================================================

/// How the fake solver answers.
#[derive(Clone, Debug)]
pub enum SolverBehaviour {
    /// Splice the new stops after the requested index and add 1.5 km per pair.
    Splice,
    /// Return this solution verbatim.
    Return(Solution),
    Fail(PlannerError),
}

/// Records every request and answers according to its behaviour.
pub struct FakeSolver {
    pub behaviour: SolverBehaviour,
    pub requests: RefCell<Vec<InsertionRequest>>,
}

impl FakeSolver {
    pub fn new(behaviour: SolverBehaviour) -> Self {
        Self {
            behaviour,
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl InsertionSolver for FakeSolver {
    fn solve_insertion(&self, request: &InsertionRequest) -> Result<Solution, PlannerError> {
        self.requests.borrow_mut().push(request.clone());
        match &self.behaviour {
            SolverBehaviour::Splice => Ok(splice(request)),
            SolverBehaviour::Return(solution) => Ok(solution.clone()),
            SolverBehaviour::Fail(err) => Err(err.clone()),
        }
    }
}

fn splice(request: &InsertionRequest) -> Solution {
    let mut solution = request.solution.clone();
    let route = &mut solution.routes[request.target_vehicle_index];
    let new_stops: Vec<Stop> = request.dynamic_stops().cloned().map(Stop::Dynamic).collect();
    let at = request.insert_after_stop_index;
    route.stops.splice(at..at, new_stops);
    route.distance += 1.5 * request.pairs.len() as f64;
    solution
}

/// Always fails with a transport error.
pub struct UnavailableSource;

impl CandidateSource for UnavailableSource {
    fn lookup(&self, _position: Position) -> Result<LocationLookup, PlannerError> {
        Err(PlannerError::unavailable("connection refused"))
    }
}

/// In-memory checkpoint store keyed by cluster.
#[derive(Default)]
pub struct MemoryStore {
    pub sets: RefCell<HashMap<ClusterId, Vec<Checkpoint>>>,
    pub generated: Vec<Checkpoint>,
    pub deleted: RefCell<Vec<i64>>,
    next_id: RefCell<i64>,
}

impl MemoryStore {
    pub fn with_cluster(cluster_id: ClusterId, checkpoints: Vec<Checkpoint>) -> Self {
        let store = Self {
            next_id: RefCell::new(1000),
            ..Self::default()
        };
        store.sets.borrow_mut().insert(cluster_id, checkpoints);
        store
    }
}

impl CheckpointStore for &MemoryStore {
    fn list(&self, cluster_id: ClusterId) -> Result<Vec<Checkpoint>, PlannerError> {
        Ok(self.sets.borrow().get(&cluster_id).cloned().unwrap_or_default())
    }

    fn generate(&self, cluster_id: ClusterId) -> Result<Vec<Checkpoint>, PlannerError> {
        self.sets.borrow_mut().insert(cluster_id, self.generated.clone());
        Ok(self.generated.clone())
    }

    fn save(&self, cluster_id: ClusterId, checkpoints: &[Checkpoint]) -> Result<(), PlannerError> {
        let saved: Vec<Checkpoint> = checkpoints
            .iter()
            .cloned()
            .map(|mut cp| {
                if cp.id.is_temporary() {
                    let mut next = self.next_id.borrow_mut();
                    cp.id = CheckpointId::Stored(*next);
                    *next += 1;
                }
                cp
            })
            .collect();
        self.sets.borrow_mut().insert(cluster_id, saved);
        Ok(())
    }

    fn delete(&self, checkpoint_id: i64) -> Result<(), PlannerError> {
        self.deleted.borrow_mut().push(checkpoint_id);
        for set in self.sets.borrow_mut().values_mut() {
            set.retain(|cp| cp.id != CheckpointId::Stored(checkpoint_id));
        }
        Ok(())
    }
}
