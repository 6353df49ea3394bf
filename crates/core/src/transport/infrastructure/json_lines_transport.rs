use std::io::Write;

use crate::control::domain::actuator_command::ActuatorCommand;
use crate::transport::domain::ptz_transport::{PtzTransport, TransportCall, TransportError};

/// Writes each transport call as one JSON object per line.
///
/// Stands in for a camera when replaying traces; the output can be piped
/// into a real protocol bridge. Hold commands (all steps zero) are skipped
/// unless `include_holds` is set.
pub struct JsonLinesTransport<W: Write + Send> {
    out: W,
    include_holds: bool,
}

impl<W: Write + Send> JsonLinesTransport<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            include_holds: false,
        }
    }

    pub fn with_holds(mut self, include_holds: bool) -> Self {
        self.include_holds = include_holds;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_call(&mut self, call: &TransportCall) -> Result<(), TransportError> {
        let line = serde_json::to_string(call).map_err(std::io::Error::from)?;
        writeln!(self.out, "{line}")?;
        Ok(())
    }
}

impl<W: Write + Send> PtzTransport for JsonLinesTransport<W> {
    fn send_move(&mut self, command: &ActuatorCommand) -> Result<(), TransportError> {
        if command.is_hold() && !self.include_holds {
            return Ok(());
        }
        self.write_call(&TransportCall::Move { command: *command })
    }

    fn recall_preset(&mut self, preset: u32) -> Result<(), TransportError> {
        self.write_call(&TransportCall::RecallPreset { preset })
    }

    fn zoom_out(&mut self) -> Result<(), TransportError> {
        self.write_call(&TransportCall::ZoomOut)
    }
}
