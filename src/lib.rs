//! checkpoint-planner core
//!
//! Checkpoint-coverage route model and the workflow that splices new
//! pickup/dropoff pairs into an already solved route.

pub mod acquisition;
pub mod binding;
pub mod checkpoints;
pub mod config;
pub mod coverage;
pub mod envelope;
pub mod error;
pub mod geo;
pub mod http;
pub mod insertion;
pub mod model;
pub mod resolver;
pub mod traits;
pub mod workflow;
