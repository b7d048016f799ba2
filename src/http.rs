//! HTTP adapter for the planning backend.
//!
//! One blocking client implements every boundary trait. Responses go through
//! [`crate::envelope`] before any payload is read.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::config::BackendConfig;
use crate::envelope::{self, RejectionKind, Reply};
use crate::error::PlannerError;
use crate::insertion::InsertionRequest;
use crate::model::{Checkpoint, ClusterId, Position, Solution};
use crate::traits::{CandidateSource, CheckpointStore, InsertionSolver, LocationLookup, SolutionArchive};

#[derive(Debug, Clone)]
pub struct HttpBackend {
    config: BackendConfig,
    client: reqwest::blocking::Client,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self, PlannerError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Send a request and classify the envelope.
    ///
    /// Error envelopes are honoured whatever the HTTP status. A non-2xx
    /// response without a parseable envelope is a transport failure.
    fn exchange<T: DeserializeOwned>(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> Result<Reply<T>, PlannerError> {
        let response = request.send()?;
        let status = response.status();
        let text = response.text()?;

        match envelope::parse(&text) {
            Ok(reply) => Ok(reply),
            Err(err) if !status.is_success() => {
                tracing::warn!(%status, error = %err, "backend returned unparseable error response");
                Err(PlannerError::unavailable(format!("backend responded with {}", status)))
            }
            Err(err) => Err(err),
        }
    }

    fn expect_success<T: DeserializeOwned>(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> Result<T, PlannerError> {
        match self.exchange(request)? {
            Reply::Success(payload) => Ok(payload),
            Reply::Rejected(rejection) => Err(rejection.into_error()),
        }
    }
}

#[derive(Deserialize)]
struct CheckpointsPayload {
    #[serde(default)]
    checkpoints: Vec<Checkpoint>,
}

#[derive(Deserialize)]
struct UpdatedSolutionPayload {
    updated_solution: Solution,
}

#[derive(Deserialize)]
struct SolutionPayload {
    solution: Solution,
}

#[derive(Deserialize)]
struct Acknowledgement {}

/// Checkpoints returned for a cluster serve that cluster even when the
/// backend omits the field.
fn tag_cluster(cluster_id: ClusterId, checkpoints: &mut [Checkpoint]) {
    for checkpoint in checkpoints {
        checkpoint.serves_clusters.insert(cluster_id);
    }
}

impl CandidateSource for HttpBackend {
    fn lookup(&self, position: Position) -> Result<LocationLookup, PlannerError> {
        tracing::debug!(%position, "resolving location");
        let request = self
            .client
            .post(self.url("resolve_location"))
            .json(&json!({ "lat": position.lat, "lon": position.lon }));

        match self.exchange::<LocationLookup>(request)? {
            Reply::Success(mut lookup) => {
                tag_cluster(lookup.cluster_id, &mut lookup.checkpoints);
                Ok(lookup)
            }
            Reply::Rejected(rejection) if rejection.kind == Some(RejectionKind::NotCovered) => {
                Err(PlannerError::NotCovered { position })
            }
            Reply::Rejected(rejection) => Err(rejection.into_error()),
        }
    }
}

impl InsertionSolver for HttpBackend {
    fn solve_insertion(&self, request: &InsertionRequest) -> Result<Solution, PlannerError> {
        tracing::info!(
            vehicle = request.target_vehicle_index,
            after = request.insert_after_stop_index,
            pairs = request.pairs.len(),
            "requesting dynamic insertion"
        );
        let http = self.client.post(self.url("insert_dynamic")).json(request);

        match self.exchange::<UpdatedSolutionPayload>(http)? {
            Reply::Success(payload) => Ok(payload.updated_solution),
            Reply::Rejected(rejection) => Err(match rejection.kind {
                Some(RejectionKind::InvalidVehicle) => PlannerError::InvalidVehicle {
                    index: request.target_vehicle_index,
                    route_count: request.solution.routes.len(),
                },
                Some(RejectionKind::InvalidInsertionPoint) => PlannerError::InvalidInsertionPoint {
                    index: request.insert_after_stop_index,
                    stop_count: request
                        .solution
                        .route(request.target_vehicle_index)
                        .map(|route| route.stops.len())
                        .unwrap_or(0),
                },
                _ => rejection.into_error(),
            }),
        }
    }
}

impl CheckpointStore for HttpBackend {
    fn list(&self, cluster_id: ClusterId) -> Result<Vec<Checkpoint>, PlannerError> {
        let request = self.client.get(self.url(&format!("cluster/{}/checkpoints", cluster_id)));
        let mut payload: CheckpointsPayload = self.expect_success(request)?;
        tag_cluster(cluster_id, &mut payload.checkpoints);
        Ok(payload.checkpoints)
    }

    fn generate(&self, cluster_id: ClusterId) -> Result<Vec<Checkpoint>, PlannerError> {
        tracing::info!(cluster_id, "generating checkpoints");
        let request = self
            .client
            .post(self.url(&format!("cluster/{}/generate", cluster_id)));
        let mut payload: CheckpointsPayload = self.expect_success(request)?;
        tag_cluster(cluster_id, &mut payload.checkpoints);
        Ok(payload.checkpoints)
    }

    fn save(&self, cluster_id: ClusterId, checkpoints: &[Checkpoint]) -> Result<(), PlannerError> {
        tracing::info!(cluster_id, count = checkpoints.len(), "saving checkpoint set");
        let request = self
            .client
            .post(self.url(&format!("checkpoint/save_checkpoints/{}", cluster_id)))
            .json(&json!({ "checkpoints": checkpoints }));
        let Acknowledgement {} = self.expect_success(request)?;
        Ok(())
    }

    fn delete(&self, checkpoint_id: i64) -> Result<(), PlannerError> {
        let request = self
            .client
            .post(self.url(&format!("checkpoint/delete_checkpoint/{}", checkpoint_id)));
        let Acknowledgement {} = self.expect_success(request)?;
        Ok(())
    }
}

impl SolutionArchive for HttpBackend {
    fn fetch(&self, solution_id: &str) -> Result<Solution, PlannerError> {
        let request = self.client.get(self.url(&format!("solution/{}", solution_id)));
        let payload: SolutionPayload = self.expect_success(request)?;
        Ok(payload.solution)
    }
}
