//! Error types for simulation.

use thiserror::Error;

/// Errors that can occur while setting up a simulation
#[derive(Debug, Error)]
pub enum SimulationError {
    /// A numeric input is out of range
    #[error("Invalid simulation parameter: {0}")]
    InvalidParameter(String),
}
