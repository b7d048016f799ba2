//! Assembly of re-optimization requests for bound pickup/dropoff pairs.
//!
//! The builder validates the splice target and packages the current solution
//! unchanged. It never estimates distances: the solver's response is the
//! only source of the updated solution.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::binding::BoundPair;
use crate::config::SolverSelection;
use crate::error::PlannerError;
use crate::model::{DynamicStop, PairSide, Solution};

/// A bound pair as two dynamic stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertionPair {
    pub pickup: DynamicStop,
    pub dropoff: DynamicStop,
}

impl From<&BoundPair> for InsertionPair {
    fn from(pair: &BoundPair) -> Self {
        Self {
            pickup: pair.pickup.to_dynamic_stop(PairSide::Pickup),
            dropoff: pair.dropoff.to_dynamic_stop(PairSide::Dropoff),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertionRequest {
    #[serde(rename = "current_solution")]
    pub solution: Solution,
    #[serde(rename = "new_location_pairs")]
    pub pairs: Vec<InsertionPair>,
    pub target_vehicle_index: usize,
    /// 0 splices right after the depot, `k` after the k-th stop.
    #[serde(rename = "insertion_point_index")]
    pub insert_after_stop_index: usize,
    #[serde(rename = "algorithm")]
    pub solver: SolverSelection,
    /// Backend handle to the data prepared for the original solve. Opaque
    /// here and passed back unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepared_data_ref: Option<Value>,
}

impl InsertionRequest {
    /// All new stops in request order, pickup before dropoff per pair.
    pub fn dynamic_stops(&self) -> impl Iterator<Item = &DynamicStop> {
        self.pairs
            .iter()
            .flat_map(|pair| [&pair.pickup, &pair.dropoff])
    }

    pub fn with_solver(mut self, solver: SolverSelection) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_prepared_data_ref(mut self, prepared_data_ref: Option<Value>) -> Self {
        self.prepared_data_ref = prepared_data_ref;
        self
    }
}

/// Validate the splice target and assemble the request.
///
/// Fails with `InvalidVehicle` when `target_vehicle_index` names no route and
/// with `InvalidInsertionPoint` when `insert_after_stop_index` falls outside
/// `[0, stops.len()]` of the target route.
pub fn build_request(
    current: &Solution,
    pairs: &[BoundPair],
    target_vehicle_index: usize,
    insert_after_stop_index: usize,
) -> Result<InsertionRequest, PlannerError> {
    if pairs.is_empty() {
        return Err(PlannerError::InvalidState("no pairs to insert"));
    }

    let route = current
        .route(target_vehicle_index)
        .ok_or(PlannerError::InvalidVehicle {
            index: target_vehicle_index,
            route_count: current.routes.len(),
        })?;

    if insert_after_stop_index > route.stops.len() {
        return Err(PlannerError::InvalidInsertionPoint {
            index: insert_after_stop_index,
            stop_count: route.stops.len(),
        });
    }

    tracing::debug!(
        vehicle = target_vehicle_index,
        after = insert_after_stop_index,
        pairs = pairs.len(),
        "assembled insertion request"
    );

    Ok(InsertionRequest {
        solution: current.clone(),
        pairs: pairs.iter().map(InsertionPair::from).collect(),
        target_vehicle_index,
        insert_after_stop_index,
        solver: SolverSelection::default(),
        prepared_data_ref: None,
    })
}
