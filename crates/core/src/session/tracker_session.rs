use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use crate::control::domain::actuator_command::ActuatorCommand;
use crate::control::domain::actuator_mapper::ActuatorMapper;
use crate::control::domain::error_shaper::ErrorShaper;
use crate::control::domain::regulator::{ControllerState, Regulator};
use crate::error::{Result, TrackerError};
use crate::recovery::domain::recovery_state_machine::{
    RecoveryEvent, RecoveryState, RecoveryStateMachine,
};
use crate::session::session_control::{ControlSignal, SessionHandle};
use crate::session::tick::{TickCommand, TickInput, TickReport};
use crate::session::tracker_config::TrackerConfig;
use crate::shared::axes::Vec3;
use crate::telemetry::domain::telemetry_sink::{
    NullTelemetrySink, TelemetryRecord, TelemetrySink,
};
use crate::transport::domain::ptz_transport::PtzTransport;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionMode {
    Active,
    Paused,
}

/// One camera's control loop: shaping, regulation, mapping and face-loss
/// recovery, evaluated once per detector frame.
///
/// While paused, no commands are produced and the regulator is frozen, but
/// face loss is still timed so that resuming does not restart the loss
/// timeout.
pub struct TrackerSession {
    config: TrackerConfig,
    shaper: ErrorShaper,
    regulator: Regulator,
    mapper: ActuatorMapper,
    recovery: RecoveryStateMachine,
    mode: SessionMode,
    last_timestamp: Option<Duration>,
    last_command: Option<ActuatorCommand>,
    telemetry: Box<dyn TelemetrySink>,
    control_tx: Sender<ControlSignal>,
    control_rx: Receiver<ControlSignal>,
}

impl TrackerSession {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        let (control_tx, control_rx) = crossbeam_channel::unbounded();
        Ok(Self {
            shaper: config.error_shaper(),
            regulator: Regulator::new(config.regulator_gains()),
            mapper: config.actuator_mapper(),
            recovery: RecoveryStateMachine::new(config.recovery_policy()?),
            config,
            mode: SessionMode::Active,
            last_timestamp: None,
            last_command: None,
            telemetry: Box::new(NullTelemetrySink),
            control_tx,
            control_rx,
        })
    }

    pub fn with_telemetry(mut self, sink: Box<dyn TelemetrySink>) -> Self {
        self.telemetry = sink;
        self
    }

    /// Handle for queuing control signals from other threads.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle::new(self.control_tx.clone())
    }

    /// Runs one control tick.
    ///
    /// Fails only when the timestamp does not advance; the session is left
    /// untouched apart from queued control signals, which are applied first.
    pub fn tick(&mut self, input: &TickInput) -> Result<TickReport> {
        self.apply_pending_signals();
        let dt = self.timestep(input.timestamp)?;
        self.last_timestamp = Some(input.timestamp);

        let found = input.found && input.error.is_finite();
        if input.found && !found {
            log::warn!("Ignoring non-finite tracking error {:?}", input.error);
        }

        if self.mode == SessionMode::Paused {
            self.recovery.track(found, input.timestamp);
            return Ok(TickReport::default());
        }

        let event = self.recovery.observe(found, input.timestamp);
        let mut shaped = Vec3::ZERO;
        let command = if found {
            shaped = self.shaper.shape(input.error - self.config.target);
            let effort = self
                .regulator
                .update(shaped, dt, self.mapper.effort_limit())?;
            let actuator = self.mapper.map(effort);
            self.last_command = Some(actuator);
            Some(TickCommand::Move(actuator))
        } else {
            event.map(TickCommand::Recovery)
        };

        let telemetry_error = self.write_telemetry(input, found, shaped, command).err();
        Ok(TickReport {
            command,
            telemetry_error,
            transport_error: None,
        })
    }

    /// Runs one tick and forwards its command to `transport`.
    ///
    /// A transport failure is logged and returned in the report; the
    /// controller state is kept and the next tick proceeds normally.
    pub fn tick_and_send(
        &mut self,
        input: &TickInput,
        transport: &mut dyn PtzTransport,
    ) -> Result<TickReport> {
        let mut report = self.tick(input)?;
        let sent = match report.command {
            Some(TickCommand::Move(command)) => transport.send_move(&command),
            Some(TickCommand::Recovery(event)) => transport.send_recovery(event),
            None => Ok(()),
        };
        if let Err(e) = sent {
            log::warn!("PTZ transport failed: {e}");
            report.transport_error = Some(e);
        }
        Ok(report)
    }

    pub fn pause(&mut self) {
        if self.mode != SessionMode::Paused {
            log::debug!("Tracking paused");
            self.mode = SessionMode::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.mode != SessionMode::Active {
            log::debug!("Tracking resumed");
            self.mode = SessionMode::Active;
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.mode {
            SessionMode::Active => self.pause(),
            SessionMode::Paused => self.resume(),
        }
    }

    /// Clears the controller and recovery state back to their initial values.
    pub fn reset(&mut self) {
        log::debug!("Tracker state reset");
        self.regulator.reset();
        self.recovery.reset();
        self.last_timestamp = None;
        self.last_command = None;
    }

    /// Applies a new configuration between ticks, keeping the regulator's
    /// accumulated state. An invalid configuration is rejected and the
    /// current one stays in effect.
    pub fn update_config(&mut self, config: TrackerConfig) -> Result<()> {
        config.validate()?;
        self.recovery.set_policy(config.recovery_policy()?);
        self.shaper = config.error_shaper();
        self.regulator.set_gains(config.regulator_gains());
        self.mapper = config.actuator_mapper();
        self.config = config;
        log::debug!("Tracker configuration updated");
        Ok(())
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn is_paused(&self) -> bool {
        self.mode == SessionMode::Paused
    }

    pub fn recovery_state(&self) -> RecoveryState {
        self.recovery.state()
    }

    pub fn controller_state(&self) -> &ControllerState {
        self.regulator.state()
    }

    /// Last movement command produced while the face was found.
    pub fn last_command(&self) -> Option<&ActuatorCommand> {
        self.last_command.as_ref()
    }

    /// Flushes the telemetry sink.
    pub fn flush_telemetry(&mut self) -> std::io::Result<()> {
        self.telemetry.flush()
    }

    fn apply_pending_signals(&mut self) {
        let pending: Vec<ControlSignal> = self.control_rx.try_iter().collect();
        for signal in pending {
            match signal {
                ControlSignal::Pause => self.pause(),
                ControlSignal::Resume => self.resume(),
                ControlSignal::TogglePause => self.toggle_pause(),
                ControlSignal::Reset => self.reset(),
                ControlSignal::UpdateConfig(config) => {
                    if let Err(e) = self.update_config(*config) {
                        log::warn!("Queued tracker configuration dropped: {e}");
                    }
                }
            }
        }
    }

    fn timestep(&self, now: Duration) -> Result<Duration> {
        match self.last_timestamp {
            None => Ok(self.config.nominal_tick),
            Some(previous) if now > previous => Ok(now - previous),
            Some(previous) => Err(TrackerError::InvalidTimestep {
                previous,
                current: now,
            }),
        }
    }

    fn write_telemetry(
        &mut self,
        input: &TickInput,
        found: bool,
        shaped: Vec3,
        command: Option<TickCommand>,
    ) -> std::io::Result<()> {
        let state = self.regulator.state();
        let (command, recovery) = match command {
            Some(TickCommand::Move(c)) => (Some(c), None::<RecoveryEvent>),
            Some(TickCommand::Recovery(e)) => (None, Some(e)),
            None => (None, None),
        };
        let record = TelemetryRecord {
            timestamp_ms: input.timestamp.as_millis() as u64,
            found,
            raw_error: input.error,
            shaped_error: shaped,
            filtered_error: state.filtered_error,
            integral: state.filtered_integral,
            attenuation: state.attenuation,
            command,
            recovery,
        };
        self.telemetry.record(&record).map_err(|e| {
            log::warn!("Telemetry write failed: {e}");
            e
        })
    }
}
