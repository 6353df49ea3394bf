use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::control::domain::actuator_command::ActuatorCommand;
use crate::recovery::domain::recovery_state_machine::RecoveryEvent;
use crate::shared::axes::Vec3;

/// Per-tick snapshot of the control loop for offline tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TelemetryRecord {
    pub timestamp_ms: u64,
    pub found: bool,
    pub raw_error: Vec3,
    pub shaped_error: Vec3,
    pub filtered_error: Vec3,
    pub integral: Vec3,
    pub attenuation: f64,
    pub command: Option<ActuatorCommand>,
    pub recovery: Option<RecoveryEvent>,
}

impl TelemetryRecord {
    /// True when both records carry the same values, ignoring the timestamp.
    pub fn same_values(&self, other: &TelemetryRecord) -> bool {
        TelemetryRecord {
            timestamp_ms: other.timestamp_ms,
            ..*self
        } == *other
    }
}

/// Write-only stream of telemetry records.
///
/// The session never reads anything back; a failing sink is reported and
/// the tick result stands.
pub trait TelemetrySink: Send {
    fn record(&mut self, record: &TelemetryRecord) -> std::io::Result<()>;

    /// Flushes buffered records. Default: no-op.
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Sink that discards all records.
pub struct NullTelemetrySink;

impl TelemetrySink for NullTelemetrySink {
    fn record(&mut self, _record: &TelemetryRecord) -> std::io::Result<()> {
        Ok(())
    }
}

/// Sink that keeps records in memory, mainly for tests and tooling.
///
/// Clones share the same buffer, so a caller can hand one clone to a
/// session and inspect the records through another.
#[derive(Clone, Debug, Default)]
pub struct MemoryTelemetrySink {
    records: Arc<Mutex<Vec<TelemetryRecord>>>,
}

impl MemoryTelemetrySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TelemetryRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl TelemetrySink for MemoryTelemetrySink {
    fn record(&mut self, record: &TelemetryRecord) -> std::io::Result<()> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(*record);
        Ok(())
    }
}
