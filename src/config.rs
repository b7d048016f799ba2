//! Configuration for the backend client, the local resolver, and the
//! insertion workflow.
//!
//! Every struct has a usable `Default`. `from_env` overlays environment
//! variables on top of the defaults and ignores values that do not parse.

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    /// Applied to every request. Expiry surfaces as `ServiceUnavailable`.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 10,
        }
    }
}

impl BackendConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env::var("CHECKPOINT_BACKEND_URL").unwrap_or(defaults.base_url),
            timeout_secs: env_parse("CHECKPOINT_BACKEND_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Maximum great-circle distance from a cluster centroid, in km, for a
    /// position to count as inside that cluster.
    pub service_radius_km: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            service_radius_km: 5.0,
        }
    }
}

impl ResolverConfig {
    pub fn from_env() -> Self {
        Self {
            service_radius_km: env_parse("CHECKPOINT_SERVICE_RADIUS_KM")
                .unwrap_or(Self::default().service_radius_km),
        }
    }
}

/// Which external solver re-optimizes an insertion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverSelection {
    /// Nearest neighbour construction followed by 2-opt.
    #[default]
    #[serde(rename = "two_opt")]
    Heuristic,
    /// Constraint-programming solver.
    #[serde(rename = "or_tools")]
    ConstraintProgramming,
}

impl FromStr for SolverSelection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "two_opt" | "heuristic" => Ok(SolverSelection::Heuristic),
            "or_tools" | "constraint_programming" => Ok(SolverSelection::ConstraintProgramming),
            other => Err(format!("unknown solver: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorkflowConfig {
    pub solver: SolverSelection,
}

impl WorkflowConfig {
    pub fn from_env() -> Self {
        Self {
            solver: env_parse("CHECKPOINT_SOLVER").unwrap_or_default(),
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable configuration value");
            None
        }
    }
}
