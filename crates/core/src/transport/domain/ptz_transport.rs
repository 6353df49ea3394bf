use serde::Serialize;
use thiserror::Error;

use crate::control::domain::actuator_command::ActuatorCommand;
use crate::recovery::domain::recovery_state_machine::RecoveryEvent;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("camera not connected")]
    Disconnected,

    #[error("transport I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One call made on a [`PtzTransport`], as recorded or written out.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum TransportCall {
    Move { command: ActuatorCommand },
    RecallPreset { preset: u32 },
    ZoomOut,
}

/// Domain interface for the PTZ protocol layer.
///
/// Calls are fire-and-forget from the controller's side: a failure is
/// reported back but never retried or rolled back by the session.
pub trait PtzTransport: Send {
    fn send_move(&mut self, command: &ActuatorCommand) -> Result<(), TransportError>;

    fn recall_preset(&mut self, preset: u32) -> Result<(), TransportError>;

    fn zoom_out(&mut self) -> Result<(), TransportError>;

    /// Dispatches a recovery event to the matching call.
    fn send_recovery(&mut self, event: RecoveryEvent) -> Result<(), TransportError> {
        match event {
            RecoveryEvent::RecallPreset(id) => self.recall_preset(id),
            RecoveryEvent::ZoomOut => self.zoom_out(),
        }
    }
}
