use crossbeam_channel::Sender;

use crate::error::Result;
use crate::session::tracker_config::TrackerConfig;

/// Out-of-band request to a session, applied at the start of its next tick.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlSignal {
    Pause,
    Resume,
    TogglePause,
    Reset,
    UpdateConfig(Box<TrackerConfig>),
}

/// Cloneable, thread-safe handle for hotkeys, UIs or other threads.
///
/// Signals are queued and drained as a batch before the next tick is
/// evaluated, so a tick never observes a half-applied change. Send methods
/// return `false` once the session has been dropped.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: Sender<ControlSignal>,
}

impl SessionHandle {
    pub(crate) fn new(tx: Sender<ControlSignal>) -> Self {
        Self { tx }
    }

    pub fn pause(&self) -> bool {
        self.send(ControlSignal::Pause)
    }

    pub fn resume(&self) -> bool {
        self.send(ControlSignal::Resume)
    }

    pub fn toggle_pause(&self) -> bool {
        self.send(ControlSignal::TogglePause)
    }

    pub fn reset(&self) -> bool {
        self.send(ControlSignal::Reset)
    }

    /// Validates `config` now and queues it only when valid.
    pub fn update_config(&self, config: TrackerConfig) -> Result<bool> {
        config.validate()?;
        Ok(self.send(ControlSignal::UpdateConfig(Box::new(config))))
    }

    fn send(&self, signal: ControlSignal) -> bool {
        self.tx.send(signal).is_ok()
    }
}
