use std::time::Duration;

use crate::error::{Result, TrackerError};

/// Timeouts and preset used when the face is lost.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoveryPolicy {
    preset_timeout: Duration,
    lost_preset: Option<u32>,
    zoomout_timeout: Duration,
}

impl RecoveryPolicy {
    /// Zoom-out is the deeper fallback, so its timeout may not precede the
    /// preset recall. `lost_preset = None` skips the recall step.
    pub fn new(
        preset_timeout: Duration,
        lost_preset: Option<u32>,
        zoomout_timeout: Duration,
    ) -> Result<Self> {
        if zoomout_timeout < preset_timeout {
            return Err(TrackerError::InvalidConfiguration(format!(
                "zoom-out timeout ({} ms) must not be shorter than preset timeout ({} ms)",
                zoomout_timeout.as_millis(),
                preset_timeout.as_millis()
            )));
        }
        Ok(Self {
            preset_timeout,
            lost_preset,
            zoomout_timeout,
        })
    }

    pub fn preset_timeout(&self) -> Duration {
        self.preset_timeout
    }

    pub fn lost_preset(&self) -> Option<u32> {
        self.lost_preset
    }

    pub fn zoomout_timeout(&self) -> Duration {
        self.zoomout_timeout
    }
}
