//! Checkpoint binding: every backlog side must carry exactly one selected
//! checkpoint drawn from its own candidates before insertion may proceed.

use serde::{Deserialize, Serialize};

use crate::acquisition::{PendingPair, PendingSide};
use crate::error::{PlannerError, UnboundReason, UnboundSide};
use crate::model::{Checkpoint, CheckpointId, ClusterId, DynamicStop, PairSide, Position};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundSide {
    pub position: Position,
    pub cluster_id: ClusterId,
    pub candidates: Vec<Checkpoint>,
    pub selected_checkpoint: Checkpoint,
}

impl BoundSide {
    pub fn to_dynamic_stop(&self, kind: PairSide) -> DynamicStop {
        DynamicStop {
            kind,
            position: self.position,
            cluster_id: self.cluster_id,
            bound_checkpoint_id: self.selected_checkpoint.id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundPair {
    pub pickup: BoundSide,
    pub dropoff: BoundSide,
}

impl PendingPair {
    /// Select a checkpoint for one side. Ids outside the side's candidates
    /// are rejected and leave the previous selection in place.
    pub fn select(&mut self, side: PairSide, checkpoint_id: CheckpointId) -> Result<(), PlannerError> {
        let pending = self.side_mut(side);
        if pending.resolution.candidate(&checkpoint_id).is_none() {
            return Err(PlannerError::UnknownCheckpoint(checkpoint_id));
        }
        pending.selected = Some(checkpoint_id);
        Ok(())
    }

    pub fn clear_selection(&mut self, side: PairSide) {
        self.side_mut(side).selected = None;
    }

    pub fn is_bound(&self) -> bool {
        PairSide::BOTH
            .iter()
            .all(|side| bind_side(self.side(*side)).is_ok())
    }
}

fn bind_side(pending: &PendingSide) -> Result<BoundSide, UnboundReason> {
    let resolution = &pending.resolution;
    let selected = match &pending.selected {
        Some(id) => id,
        None if resolution.candidates.is_empty() => return Err(UnboundReason::NoCandidates),
        None => return Err(UnboundReason::NotSelected),
    };
    let checkpoint = resolution
        .candidate(selected)
        .ok_or_else(|| UnboundReason::NotACandidate(selected.clone()))?;

    Ok(BoundSide {
        position: resolution.position,
        cluster_id: resolution.cluster_id,
        candidates: resolution.candidates.clone(),
        selected_checkpoint: checkpoint.clone(),
    })
}

/// Bind the whole backlog or nothing.
///
/// Every unbound side of every pair is reported, so the operator can fix
/// them in one pass.
pub fn bind_pairs(backlog: &[PendingPair]) -> Result<Vec<BoundPair>, PlannerError> {
    let mut bound = Vec::with_capacity(backlog.len());
    let mut unbound = Vec::new();

    for (pair_index, pair) in backlog.iter().enumerate() {
        let pickup = bind_side(&pair.pickup);
        let dropoff = bind_side(&pair.dropoff);

        match (pickup, dropoff) {
            (Ok(pickup), Ok(dropoff)) => bound.push(BoundPair { pickup, dropoff }),
            (pickup, dropoff) => {
                for (side, result) in [(PairSide::Pickup, pickup), (PairSide::Dropoff, dropoff)] {
                    if let Err(reason) = result {
                        unbound.push(UnboundSide {
                            pair_index,
                            side,
                            reason,
                        });
                    }
                }
            }
        }
    }

    if unbound.is_empty() {
        Ok(bound)
    } else {
        tracing::info!(unbound = unbound.len(), "backlog not fully bound");
        Err(PlannerError::IncompleteBinding { unbound })
    }
}
