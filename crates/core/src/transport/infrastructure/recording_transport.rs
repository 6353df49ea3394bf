use crate::control::domain::actuator_command::ActuatorCommand;
use crate::transport::domain::ptz_transport::{PtzTransport, TransportCall, TransportError};

/// In-memory transport that keeps every successful call.
///
/// `fail_next` makes the following call fail with
/// [`TransportError::Disconnected`] without being recorded, which lets
/// callers exercise their failure paths.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    calls: Vec<TransportCall>,
    pending_failures: usize,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[TransportCall] {
        &self.calls
    }

    pub fn fail_next(&mut self, count: usize) {
        self.pending_failures += count;
    }

    fn record(&mut self, call: TransportCall) -> Result<(), TransportError> {
        if self.pending_failures > 0 {
            self.pending_failures -= 1;
            return Err(TransportError::Disconnected);
        }
        self.calls.push(call);
        Ok(())
    }
}

impl PtzTransport for RecordingTransport {
    fn send_move(&mut self, command: &ActuatorCommand) -> Result<(), TransportError> {
        self.record(TransportCall::Move { command: *command })
    }

    fn recall_preset(&mut self, preset: u32) -> Result<(), TransportError> {
        self.record(TransportCall::RecallPreset { preset })
    }

    fn zoom_out(&mut self) -> Result<(), TransportError> {
        self.record(TransportCall::ZoomOut)
    }
}
