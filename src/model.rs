//! Checkpoint coverage model.
//!
//! A solution is a set of vehicle routes built from checkpoints rather than
//! raw destinations. Each checkpoint stop declares which demand clusters it
//! serves; dynamic stops (pickups and dropoffs spliced in after the initial
//! solve) occupy route slots without contributing coverage.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a demand cluster.
pub type ClusterId = i64;

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl Position {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Checkpoint identifier.
///
/// Persisted checkpoints carry the integer id assigned by the store. Manually
/// placed checkpoints that have not been saved yet carry a `temp-N` id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckpointId {
    Stored(i64),
    Temporary(String),
}

impl CheckpointId {
    pub fn is_temporary(&self) -> bool {
        matches!(self, CheckpointId::Temporary(_))
    }
}

impl From<i64> for CheckpointId {
    fn from(id: i64) -> Self {
        CheckpointId::Stored(id)
    }
}

impl fmt::Display for CheckpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointId::Stored(id) => write!(f, "{}", id),
            CheckpointId::Temporary(id) => f.write_str(id),
        }
    }
}

/// A group of nearby destinations sharing one access point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandCluster {
    pub id: ClusterId,
    pub centroid: Position,
    pub member_count: u32,
}

/// How a checkpoint came to exist.
///
/// Older generators use `betweenness_centrality`, `osm_barrier` and
/// `fallback_direction`; those spellings are accepted on input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointSource {
    TopologyBottleneck,
    #[serde(alias = "betweenness_centrality")]
    CentralityAnalysis,
    #[serde(alias = "osm_barrier")]
    MapTaggedBarrier,
    #[serde(alias = "fallback_direction")]
    DirectionalFallback,
    Manual,
    /// Provenance not reported by the backend.
    #[default]
    Unspecified,
}

/// An access/transition point for one or more demand clusters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: CheckpointId,
    #[serde(flatten)]
    pub position: Position,
    #[serde(default)]
    pub serves_clusters: BTreeSet<ClusterId>,
    /// Provenance-derived trust score in `[0.0, 1.0]`.
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub source: CheckpointSource,
}

fn default_confidence() -> f64 {
    0.7
}

impl Checkpoint {
    pub fn serves(&self, cluster_id: ClusterId) -> bool {
        self.serves_clusters.contains(&cluster_id)
    }
}

/// Which half of a pickup/dropoff pair a dynamic stop represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairSide {
    Pickup,
    Dropoff,
}

impl PairSide {
    pub const BOTH: [PairSide; 2] = [PairSide::Pickup, PairSide::Dropoff];
}

impl fmt::Display for PairSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairSide::Pickup => f.write_str("pickup"),
            PairSide::Dropoff => f.write_str("dropoff"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointStop {
    pub checkpoint_id: CheckpointId,
    #[serde(flatten)]
    pub position: Position,
    pub serves_clusters: BTreeSet<ClusterId>,
}

/// A pickup or dropoff inserted after the initial solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicStop {
    pub kind: PairSide,
    #[serde(flatten)]
    pub position: Position,
    pub cluster_id: ClusterId,
    pub bound_checkpoint_id: CheckpointId,
}

/// One element of a route.
///
/// The `type` tag is explicit on the wire so a dynamic stop is never read
/// back as a checkpoint stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Stop {
    Checkpoint(CheckpointStop),
    Dynamic(DynamicStop),
}

impl Stop {
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Stop::Dynamic(_))
    }

    pub fn position(&self) -> Position {
        match self {
            Stop::Checkpoint(stop) => stop.position,
            Stop::Dynamic(stop) => stop.position,
        }
    }

    pub fn as_checkpoint(&self) -> Option<&CheckpointStop> {
        match self {
            Stop::Checkpoint(stop) => Some(stop),
            Stop::Dynamic(_) => None,
        }
    }
}

/// Ordered stops of one vehicle. The depot is implicit at both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRoute {
    pub vehicle_index: usize,
    pub stops: Vec<Stop>,
    /// Route length in kilometers, as reported by the solver.
    pub distance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_geometry: Option<Vec<Position>>,
}

impl VehicleRoute {
    pub fn checkpoint_stops(&self) -> impl Iterator<Item = &CheckpointStop> {
        self.stops.iter().filter_map(Stop::as_checkpoint)
    }

    pub fn dynamic_stop_count(&self) -> usize {
        self.stops.iter().filter(|stop| stop.is_dynamic()).count()
    }
}

/// Metric the solver used for distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceBasis {
    RoadNetwork,
    StraightLine,
}

/// What the route stops are built from, set once by the producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    CheckpointBased,
    DestinationBased,
}

/// A complete multi-vehicle solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub warehouse_position: Position,
    pub routes: Vec<VehicleRoute>,
    /// Clusters known to be uncovered, e.g. deliberately skipped.
    #[serde(default)]
    pub missing_clusters: BTreeSet<ClusterId>,
    pub distance_basis: DistanceBasis,
    pub route_kind: RouteKind,
}

impl Solution {
    pub fn route(&self, vehicle_index: usize) -> Option<&VehicleRoute> {
        self.routes.get(vehicle_index)
    }

    /// Sum of the solver-reported route distances.
    pub fn total_distance(&self) -> f64 {
        self.routes.iter().map(|route| route.distance).sum()
    }

    pub fn stop_count(&self) -> usize {
        self.routes.iter().map(|route| route.stops.len()).sum()
    }
}
