use serde::Serialize;

use crate::shared::axes::{Axes, Vec3};

/// Output of one control tick, ready for the PTZ transport.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ActuatorCommand {
    /// Relative step/speed per axis for step-based transports.
    pub steps: Axes<i32>,
    /// Normalized value per axis in `[-1, 1]` for pose-query transports.
    pub query: Vec3,
    /// Axes whose effort exceeded the actuator range this tick.
    pub saturated: Axes<bool>,
}

impl ActuatorCommand {
    /// Command that leaves the camera where it is.
    pub const HOLD: ActuatorCommand = ActuatorCommand {
        steps: Axes::splat(0),
        query: Vec3::ZERO,
        saturated: Axes::splat(false),
    };

    pub fn is_hold(&self) -> bool {
        self.steps.iter().all(|&s| s == 0)
    }
}
