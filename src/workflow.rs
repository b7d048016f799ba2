//! The dynamic-insertion workflow.
//!
//! [`InsertionWorkflow`] owns the current solution, the pair acquisition
//! state, and the backlog. The current solution is only ever replaced
//! wholesale by a solver response that passed the coverage check; every
//! failure path leaves all state as it was.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;

use crate::acquisition::{AcquisitionState, PairAcquisition, PendingPair, Prompt};
use crate::binding::bind_pairs;
use crate::config::WorkflowConfig;
use crate::coverage::validate_solution;
use crate::error::PlannerError;
use crate::insertion::build_request;
use crate::model::{CheckpointId, ClusterId, PairSide, Position, Solution};
use crate::resolver::CandidateResolver;
use crate::traits::{CandidateSource, InsertionSolver};

/// Shared flag a front end polls to disable controls while a call runs.
#[derive(Debug, Clone, Default)]
pub struct BusyIndicator(Arc<AtomicBool>);

impl BusyIndicator {
    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn acquire(&self) -> Result<BusyGuard<'_>, PlannerError> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PlannerError::Busy)?;
        Ok(BusyGuard(&self.0))
    }
}

/// Clears the busy flag on drop, on success and failure paths alike.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Summary of an adopted insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertionOutcome {
    pub previous_distance: f64,
    pub new_distance: f64,
    pub inserted_pairs: usize,
    /// Active clusters the new solution serves through more than one
    /// checkpoint.
    pub redundant_clusters: Vec<ClusterId>,
}

pub struct InsertionWorkflow<S, V> {
    resolver: CandidateResolver<S>,
    solver: V,
    config: WorkflowConfig,
    solution: Solution,
    active_clusters: BTreeSet<ClusterId>,
    acquisition: PairAcquisition,
    busy: BusyIndicator,
    prepared_data_ref: Option<Value>,
}

impl<S, V> InsertionWorkflow<S, V>
where
    S: CandidateSource,
    V: InsertionSolver,
{
    /// Start a workflow over an already solved `solution`.
    ///
    /// `active_clusters` are the clusters the solution must keep covering.
    /// The starting solution is checked against them too.
    pub fn new(
        source: S,
        solver: V,
        solution: Solution,
        active_clusters: BTreeSet<ClusterId>,
        config: WorkflowConfig,
    ) -> Result<Self, PlannerError> {
        validate_solution(&solution, &active_clusters)?;
        Ok(Self {
            resolver: CandidateResolver::new(source),
            solver,
            config,
            solution,
            active_clusters,
            acquisition: PairAcquisition::new(),
            busy: BusyIndicator::default(),
            prepared_data_ref: None,
        })
    }

    pub fn solution(&self) -> &Solution {
        &self.solution
    }

    pub fn into_solution(self) -> Solution {
        self.solution
    }

    pub fn active_clusters(&self) -> &BTreeSet<ClusterId> {
        &self.active_clusters
    }

    pub fn state(&self) -> &AcquisitionState {
        self.acquisition.state()
    }

    pub fn backlog(&self) -> &[PendingPair] {
        self.acquisition.backlog()
    }

    pub fn busy_indicator(&self) -> BusyIndicator {
        self.busy.clone()
    }

    /// Backend handle returned with the original solve, forwarded on every
    /// insertion request.
    pub fn set_prepared_data_ref(&mut self, prepared_data_ref: Option<Value>) {
        self.prepared_data_ref = prepared_data_ref;
    }

    pub fn start_picking(&mut self) -> Result<Prompt, PlannerError> {
        self.acquisition.start_picking()
    }

    pub fn point_selected(&mut self, position: Position) -> Result<Prompt, PlannerError> {
        let _guard = self.busy.acquire()?;
        self.acquisition.point_selected(&self.resolver, position)
    }

    pub fn cancel(&mut self) -> Prompt {
        self.acquisition.cancel()
    }

    pub fn select_checkpoint(
        &mut self,
        pair_index: usize,
        side: PairSide,
        checkpoint_id: CheckpointId,
    ) -> Result<(), PlannerError> {
        self.acquisition
            .backlog_mut()
            .get_mut(pair_index)
            .ok_or(PlannerError::InvalidState("no such backlog pair"))?
            .select(side, checkpoint_id)
    }

    pub fn remove_pair(&mut self, pair_index: usize) -> Option<PendingPair> {
        self.acquisition.remove_pair(pair_index)
    }

    pub fn clear_backlog(&mut self) {
        self.acquisition.clear_backlog();
    }

    /// Bind the backlog, send it to the solver, and adopt the result.
    ///
    /// The returned solution replaces the current one only if it still
    /// covers every active cluster. On success the backlog is emptied.
    pub fn insert(
        &mut self,
        target_vehicle_index: usize,
        insert_after_stop_index: usize,
    ) -> Result<InsertionOutcome, PlannerError> {
        let _guard = self.busy.acquire()?;

        if self.acquisition.state().is_picking() {
            return Err(PlannerError::InvalidState("finish or cancel the pair being picked"));
        }
        if self.acquisition.backlog().is_empty() {
            return Err(PlannerError::InvalidState("nothing to insert"));
        }

        let pairs = bind_pairs(self.acquisition.backlog())?;
        let request = build_request(
            &self.solution,
            &pairs,
            target_vehicle_index,
            insert_after_stop_index,
        )?
        .with_solver(self.config.solver)
        .with_prepared_data_ref(self.prepared_data_ref.clone());

        let updated = self.solver.solve_insertion(&request).inspect_err(|err| {
            tracing::warn!(error = %err, "insertion failed, keeping current solution");
        })?;

        let redundant_clusters =
            validate_solution(&updated, &self.active_clusters).inspect_err(|_| {
                tracing::warn!("rejecting solver response, keeping current solution");
            })?;

        let outcome = InsertionOutcome {
            previous_distance: self.solution.total_distance(),
            new_distance: updated.total_distance(),
            inserted_pairs: pairs.len(),
            redundant_clusters,
        };
        tracing::info!(
            vehicle = target_vehicle_index,
            pairs = outcome.inserted_pairs,
            previous_km = outcome.previous_distance,
            new_km = outcome.new_distance,
            "adopted updated solution"
        );

        self.solution = updated;
        self.acquisition.clear_backlog();
        Ok(outcome)
    }
}
