//! Error kinds surfaced by the insertion workflow.
//!
//! Every variant is meant to reach the operator. None of them trigger an
//! automatic retry.

use std::fmt;

use crate::model::{CheckpointId, ClusterId, PairSide, Position};

/// Why one side of a backlog pair cannot be bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnboundReason {
    /// No checkpoint has been selected yet.
    NotSelected,
    /// The resolver returned no candidates, so coverage is unknown.
    NoCandidates,
    /// The selected checkpoint is not among the side's candidates.
    NotACandidate(CheckpointId),
}

/// One unbound side of one backlog pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnboundSide {
    pub pair_index: usize,
    pub side: PairSide,
    pub reason: UnboundReason,
}

impl fmt::Display for UnboundSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            UnboundReason::NotSelected => {
                write!(f, "pair {} {}: no checkpoint selected", self.pair_index, self.side)
            }
            UnboundReason::NoCandidates => {
                write!(f, "pair {} {}: coverage unknown, no candidates", self.pair_index, self.side)
            }
            UnboundReason::NotACandidate(id) => write!(
                f,
                "pair {} {}: checkpoint {} is not a candidate",
                self.pair_index, self.side, id
            ),
        }
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlannerError {
    /// Network failure, timeout, or a response without a usable body.
    #[error("service unavailable: {reason}")]
    ServiceUnavailable { reason: String },

    #[error("position {position} is outside every known cluster's service radius")]
    NotCovered { position: Position },

    #[error("no feasible insertion: {message}")]
    InfeasibleInsertion { message: String },

    #[error("vehicle {index} does not exist (solution has {route_count} routes)")]
    InvalidVehicle { index: usize, route_count: usize },

    #[error("insertion point {index} is outside [0, {stop_count}]")]
    InvalidInsertionPoint { index: usize, stop_count: usize },

    #[error("incomplete checkpoint binding: {}", join(.unbound))]
    IncompleteBinding { unbound: Vec<UnboundSide> },

    #[error("solution leaves clusters uncovered: {uncovered:?}")]
    CoverageViolation { uncovered: Vec<ClusterId> },

    /// A structured rejection from the backend that carries no specific kind.
    #[error("request rejected: {message}")]
    Rejected { message: String },

    #[error("another request is already in flight")]
    Busy,

    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    #[error("checkpoint {0} is not part of this cluster")]
    UnknownCheckpoint(CheckpointId),

    #[error("checkpoints can only be moved in edit mode")]
    EditModeRequired,
}

impl PlannerError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        PlannerError::ServiceUnavailable {
            reason: reason.into(),
        }
    }

    /// Transport failures may be retried by the operator as-is; everything
    /// else needs corrected input first.
    pub fn is_transport(&self) -> bool {
        matches!(self, PlannerError::ServiceUnavailable { .. })
    }
}

impl From<reqwest::Error> for PlannerError {
    fn from(err: reqwest::Error) -> Self {
        PlannerError::unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for PlannerError {
    fn from(err: serde_json::Error) -> Self {
        PlannerError::unavailable(format!("malformed response: {}", err))
    }
}
