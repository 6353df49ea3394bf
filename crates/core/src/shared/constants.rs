use std::time::Duration;

/// Tick interval assumed for the very first tick of a session (~30 fps).
pub const DEFAULT_NOMINAL_TICK: Duration = Duration::from_millis(33);

/// Per-tick rate at which the integral attenuation relaxes back toward 1
/// once the output is within the actuator limits again.
pub const ATTENUATION_RECOVERY: f64 = 0.1;

pub const DEFAULT_PRESET_TIMEOUT: Duration = Duration::from_millis(3000);
pub const DEFAULT_ZOOMOUT_TIMEOUT: Duration = Duration::from_millis(10000);

/// VISCA-style speed ranges: pan 24, tilt 20, zoom 7.
pub const DEFAULT_STEP_MAX: [i32; 3] = [24, 20, 7];
