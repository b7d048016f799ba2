//! Response envelope validation.
//!
//! Every backend response carries `status: "success" | "error"`. The body is
//! classified here before any payload field is read; a missing or unknown
//! status is a transport failure, never an implicit success.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::PlannerError;

/// Machine-readable reason attached to an error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    NotCovered,
    InfeasibleInsertion,
    InvalidVehicle,
    InvalidInsertionPoint,
    NotFound,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub kind: Option<RejectionKind>,
    pub message: String,
}

impl Rejection {
    /// Fallback conversion for rejections the caller has no context for.
    pub fn into_error(self) -> PlannerError {
        match self.kind {
            Some(RejectionKind::InfeasibleInsertion) => PlannerError::InfeasibleInsertion {
                message: self.message,
            },
            _ => PlannerError::Rejected {
                message: self.message,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply<T> {
    Success(T),
    Rejected(Rejection),
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum Status {
    Success,
    Error,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_kind: Option<Value>,
}

/// Classify a parsed body. On success the whole object is deserialized as
/// `T`, so payload fields sit next to `status`.
pub fn classify<T: DeserializeOwned>(body: Value) -> Result<Reply<T>, PlannerError> {
    let status = body
        .get("status")
        .cloned()
        .ok_or_else(|| PlannerError::unavailable("response has no status"))?;
    let status: Status = serde_json::from_value(status)
        .map_err(|_| PlannerError::unavailable(format!("unrecognized status in response: {}", body["status"])))?;

    match status {
        Status::Success => Ok(Reply::Success(serde_json::from_value(body)?)),
        Status::Error => {
            let error: ErrorBody = serde_json::from_value(body)?;
            Ok(Reply::Rejected(Rejection {
                kind: error
                    .error_kind
                    .and_then(|kind| serde_json::from_value(kind).ok()),
                message: error
                    .message
                    .unwrap_or_else(|| "request rejected without a message".to_string()),
            }))
        }
    }
}

/// Parse and classify raw response text.
pub fn parse<T: DeserializeOwned>(text: &str) -> Result<Reply<T>, PlannerError> {
    let body: Value = serde_json::from_str(text)?;
    if !body.is_object() {
        return Err(PlannerError::unavailable("response is not a JSON object"));
    }
    classify(body)
}
