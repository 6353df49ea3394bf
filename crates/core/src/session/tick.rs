use std::time::Duration;

use serde::Serialize;

use crate::control::domain::actuator_command::ActuatorCommand;
use crate::recovery::domain::recovery_state_machine::RecoveryEvent;
use crate::shared::axes::Vec3;
use crate::transport::domain::ptz_transport::TransportError;

/// Detector result for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickInput {
    /// Frame time on the detector's clock; must increase tick to tick.
    pub timestamp: Duration,
    pub found: bool,
    /// Normalized error; ignored when `found` is false.
    pub error: Vec3,
}

impl TickInput {
    pub fn found(timestamp: Duration, error: Vec3) -> Self {
        Self {
            timestamp,
            found: true,
            error,
        }
    }

    pub fn lost(timestamp: Duration) -> Self {
        Self {
            timestamp,
            found: false,
            error: Vec3::ZERO,
        }
    }
}

/// What the session wants the camera to do this tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickCommand {
    Move(ActuatorCommand),
    Recovery(RecoveryEvent),
}

/// Result of one tick. `command == None` means hold the current pose.
///
/// Sink and transport failures are reported here and do not fail the tick.
#[derive(Debug, Default)]
pub struct TickReport {
    pub command: Option<TickCommand>,
    pub telemetry_error: Option<std::io::Error>,
    pub transport_error: Option<TransportError>,
}

impl TickReport {
    pub fn actuator_command(&self) -> Option<&ActuatorCommand> {
        match &self.command {
            Some(TickCommand::Move(command)) => Some(command),
            _ => None,
        }
    }

    pub fn recovery_event(&self) -> Option<RecoveryEvent> {
        match self.command {
            Some(TickCommand::Recovery(event)) => Some(event),
            _ => None,
        }
    }
}
