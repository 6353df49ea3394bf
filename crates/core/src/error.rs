use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the tracker to its caller.
///
/// Numeric conditions inside the control loop (saturation, clamping) are
/// resolved locally and never appear here. Transport and telemetry
/// failures are non-fatal and come back in the tick report instead.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Configuration rejected; the previous configuration stays in effect.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Tick timestamp did not advance past the previous one.
    #[error("invalid timestep: tick at {current:?} does not follow {previous:?}")]
    InvalidTimestep {
        previous: Duration,
        current: Duration,
    },

    /// Regulator asked to integrate over an empty interval.
    #[error("invalid timestep: dt must be positive")]
    ZeroTimestep,
}

pub type Result<T> = std::result::Result<T, TrackerError>;
