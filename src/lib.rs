pub mod config;
pub mod drone;
pub mod navigator;
pub mod outlier;
pub mod position;
pub mod sim;
pub mod state;
pub mod telemetry;
pub mod vector;

// Re-export commonly used types
pub use drone::{DroneLink, MoveCommand, NavFrame};
pub use navigator::Navigator;
pub use position::Position;
pub use state::{AggregatedState, MagnetometerBias};
pub use vector::Vector;

use thiserror::Error;

/// Errors surfaced by the navigation core.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum NavError {
    /// Aggregation was requested before the sampler stored its first sample.
    #[error("no telemetry collected yet")]
    NotReady,
}

/// Result type for navigation operations.
pub type NavResult<T> = Result<T, NavError>;

#[cfg(test)]
pub(crate) mod mocks;
