//! Simulation error types.

use thiserror::Error;

/// Errors that can occur while building a simulation or persisting its results. Placement
/// failures are not errors, they are reported as penalized steps.
#[derive(Debug, Error)]
pub enum GymError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("could not parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not write results: {0}")]
    Csv(#[from] csv::Error),

    #[error("could not serialize metrics: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid distribution parameter: {0}")]
    Distribution(String),
}

pub type GymResult<T> = Result<T, GymError>;
