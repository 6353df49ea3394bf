use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::control::domain::actuator_mapper::ActuatorMapper;
use crate::control::domain::error_shaper::ErrorShaper;
use crate::control::domain::regulator::RegulatorGains;
use crate::error::{Result, TrackerError};
use crate::recovery::domain::recovery_policy::RecoveryPolicy;
use crate::shared::axes::{Axes, Vec3};
use crate::shared::constants::{
    DEFAULT_NOMINAL_TICK, DEFAULT_PRESET_TIMEOUT, DEFAULT_STEP_MAX, DEFAULT_ZOOMOUT_TIMEOUT,
};

/// Tuning and recovery parameters of one tracking session.
///
/// On the wire, durations are integer milliseconds (`preset_timeout_ms`,
/// `zoomout_timeout_ms`, `nominal_tick_ms`) and axis triples are arrays.
/// Missing fields take their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub kp: Vec3,
    pub ki: Vec3,
    pub klpf: Vec3,
    pub tlpf: Vec3,
    #[serde(rename = "e_deadband")]
    pub deadband: Vec3,
    #[serde(rename = "e_nonlinear")]
    pub nonlinear: Vec3,
    /// Framing offset subtracted from the detector error before shaping.
    pub target: Vec3,
    pub effort_limit: Vec3,
    pub step_max: Axes<i32>,
    #[serde(rename = "preset_timeout_ms", with = "millis")]
    pub preset_timeout: Duration,
    #[serde(rename = "zoomout_timeout_ms", with = "millis")]
    pub zoomout_timeout: Duration,
    pub lost_preset: Option<u32>,
    #[serde(rename = "nominal_tick_ms", with = "millis")]
    pub nominal_tick: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            kp: Vec3::new(1.0, 1.0, 0.5),
            ki: Vec3::new(0.3, 0.3, 0.1),
            klpf: Vec3::splat(0.5),
            tlpf: Vec3::splat(0.5),
            deadband: Vec3::new(0.02, 0.02, 0.05),
            nonlinear: Vec3::new(0.1, 0.1, 0.2),
            target: Vec3::ZERO,
            effort_limit: Vec3::splat(1.0),
            step_max: Axes::from(DEFAULT_STEP_MAX),
            preset_timeout: DEFAULT_PRESET_TIMEOUT,
            zoomout_timeout: DEFAULT_ZOOMOUT_TIMEOUT,
            lost_preset: None,
            nominal_tick: DEFAULT_NOMINAL_TICK,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<()> {
        let vectors = [
            ("kp", self.kp),
            ("ki", self.ki),
            ("klpf", self.klpf),
            ("tlpf", self.tlpf),
            ("e_deadband", self.deadband),
            ("e_nonlinear", self.nonlinear),
            ("target", self.target),
            ("effort_limit", self.effort_limit),
        ];
        for (name, v) in vectors {
            if !v.is_finite() {
                return Err(invalid(format!("{name} must be finite, got {v:?}")));
            }
        }
        for (name, v) in [("klpf", self.klpf), ("tlpf", self.tlpf)] {
            if v.iter().any(|&k| k <= 0.0 || k > 1.0) {
                return Err(invalid(format!("{name} must be within (0, 1], got {v:?}")));
            }
        }
        for (name, v) in [("e_deadband", self.deadband), ("e_nonlinear", self.nonlinear)] {
            if v.iter().any(|&k| k < 0.0) {
                return Err(invalid(format!("{name} must not be negative, got {v:?}")));
            }
        }
        if self.effort_limit.iter().any(|&l| l <= 0.0) {
            return Err(invalid(format!(
                "effort_limit must be positive, got {:?}",
                self.effort_limit
            )));
        }
        if self.step_max.iter().any(|&s| s <= 0) {
            return Err(invalid(format!(
                "step_max must be positive, got {:?}",
                self.step_max
            )));
        }
        if self.nominal_tick.is_zero() {
            return Err(invalid("nominal_tick_ms must be positive".to_string()));
        }
        self.recovery_policy().map(|_| ())
    }

    pub fn regulator_gains(&self) -> RegulatorGains {
        RegulatorGains {
            kp: self.kp,
            ki: self.ki,
            klpf: self.klpf,
            tlpf: self.tlpf,
        }
    }

    pub fn error_shaper(&self) -> ErrorShaper {
        ErrorShaper::new(self.deadband, self.nonlinear)
    }

    pub fn actuator_mapper(&self) -> ActuatorMapper {
        ActuatorMapper::new(self.effort_limit, self.step_max)
    }

    pub fn recovery_policy(&self) -> Result<RecoveryPolicy> {
        RecoveryPolicy::new(self.preset_timeout, self.lost_preset, self.zoomout_timeout)
    }
}

fn invalid(message: String) -> TrackerError {
    TrackerError::InvalidConfiguration(message)
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
