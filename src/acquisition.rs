//! Two-click pickup/dropoff acquisition.
//!
//! ```text
//! Idle --start--> PickingPickup --point--> PickingDropoff --point--> Idle
//!                      |                          |
//!                      +--------- cancel ---------+--> Idle
//! ```
//!
//! A failed resolution leaves the state untouched so the operator can pick
//! another point. Completed pairs accumulate in the backlog until insertion.

use serde::{Deserialize, Serialize};

use crate::error::PlannerError;
use crate::model::{CheckpointId, PairSide, Position};
use crate::resolver::{CandidateResolver, Resolution};
use crate::traits::CandidateSource;

/// One resolved side of a pending pair plus the operator's checkpoint choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSide {
    pub resolution: Resolution,
    #[serde(default)]
    pub selected: Option<CheckpointId>,
}

impl PendingSide {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            selected: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingPair {
    pub pickup: PendingSide,
    pub dropoff: PendingSide,
}

impl PendingPair {
    pub fn side(&self, side: PairSide) -> &PendingSide {
        match side {
            PairSide::Pickup => &self.pickup,
            PairSide::Dropoff => &self.dropoff,
        }
    }

    pub fn side_mut(&mut self, side: PairSide) -> &mut PendingSide {
        match side {
            PairSide::Pickup => &mut self.pickup,
            PairSide::Dropoff => &mut self.dropoff,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum AcquisitionState {
    #[default]
    Idle,
    PickingPickup,
    /// The pickup half is resolved and held until the dropoff arrives.
    PickingDropoff { pickup: Resolution },
}

impl AcquisitionState {
    pub fn is_picking(&self) -> bool {
        !matches!(self, AcquisitionState::Idle)
    }
}

/// What the front end should show after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Prompt {
    SelectPickup,
    SelectDropoff,
    PairCompleted { backlog_len: usize },
    Cancelled,
}

#[derive(Debug, Default)]
pub struct PairAcquisition {
    state: AcquisitionState,
    backlog: Vec<PendingPair>,
}

impl PairAcquisition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AcquisitionState {
        &self.state
    }

    pub fn backlog(&self) -> &[PendingPair] {
        &self.backlog
    }

    pub fn backlog_mut(&mut self) -> &mut [PendingPair] {
        &mut self.backlog
    }

    pub fn start_picking(&mut self) -> Result<Prompt, PlannerError> {
        if self.state.is_picking() {
            return Err(PlannerError::InvalidState("a pair is already being picked"));
        }
        self.state = AcquisitionState::PickingPickup;
        tracing::debug!("picking pickup point");
        Ok(Prompt::SelectPickup)
    }

    /// Resolve `position` and advance. Resolution errors propagate with the
    /// state unchanged.
    pub fn point_selected<S: CandidateSource>(
        &mut self,
        resolver: &CandidateResolver<S>,
        position: Position,
    ) -> Result<Prompt, PlannerError> {
        if !self.state.is_picking() {
            return Err(PlannerError::InvalidState("not picking a point"));
        }

        let resolution = resolver.resolve(position)?;

        match std::mem::take(&mut self.state) {
            AcquisitionState::PickingDropoff { pickup } => {
                self.backlog.push(PendingPair {
                    pickup: PendingSide::new(pickup),
                    dropoff: PendingSide::new(resolution),
                });
                tracing::info!(backlog_len = self.backlog.len(), "pair added to backlog");
                Ok(Prompt::PairCompleted {
                    backlog_len: self.backlog.len(),
                })
            }
            AcquisitionState::PickingPickup | AcquisitionState::Idle => {
                self.state = AcquisitionState::PickingDropoff { pickup: resolution };
                tracing::debug!("picking dropoff point");
                Ok(Prompt::SelectDropoff)
            }
        }
    }

    /// Discard any half-built pair. The backlog is kept.
    pub fn cancel(&mut self) -> Prompt {
        if self.state.is_picking() {
            tracing::debug!("pair picking cancelled");
        }
        self.state = AcquisitionState::Idle;
        Prompt::Cancelled
    }

    pub fn remove_pair(&mut self, index: usize) -> Option<PendingPair> {
        if index < self.backlog.len() {
            Some(self.backlog.remove(index))
        } else {
            None
        }
    }

    pub fn clear_backlog(&mut self) {
        self.backlog.clear();
    }
}
