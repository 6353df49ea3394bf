use std::time::Duration;

use serde::Serialize;

use crate::recovery::domain::recovery_policy::RecoveryPolicy;

/// Fallback command issued while the face is lost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryEvent {
    RecallPreset(u32),
    ZoomOut,
}

/// Graduated face-loss state. Lost states carry the loss timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecoveryState {
    Tracking,
    LostRecent { since: Duration },
    LostPresetSent { since: Duration },
    LostZoomout { since: Duration },
}

impl RecoveryState {
    pub fn is_lost(&self) -> bool {
        !matches!(self, RecoveryState::Tracking)
    }

    pub fn lost_since(&self) -> Option<Duration> {
        match *self {
            RecoveryState::Tracking => None,
            RecoveryState::LostRecent { since }
            | RecoveryState::LostPresetSent { since }
            | RecoveryState::LostZoomout { since } => Some(since),
        }
    }
}

/// Found/lost bookkeeping across ticks.
///
/// `last_found_timestamp` only moves while the face is found and never
/// moves backwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FaceTrackingStatus {
    pub found: bool,
    pub found_previous_tick: bool,
    pub last_found_timestamp: Option<Duration>,
}

/// Face-loss recovery: brief dropouts are tolerated, a longer loss recalls
/// a preset once, a prolonged loss zooms out once.
///
/// A fresh machine starts in [`RecoveryState::Tracking`], so a session that
/// never sees a face starts timing the loss on its first tick. At most one
/// event is emitted per tick.
pub struct RecoveryStateMachine {
    policy: RecoveryPolicy,
    state: RecoveryState,
    status: FaceTrackingStatus,
}

impl RecoveryStateMachine {
    pub fn new(policy: RecoveryPolicy) -> Self {
        Self {
            policy,
            state: RecoveryState::Tracking,
            status: FaceTrackingStatus::default(),
        }
    }

    /// Records this tick's detection result and fires any fallback that is due.
    pub fn observe(&mut self, found: bool, now: Duration) -> Option<RecoveryEvent> {
        self.track(found, now);
        self.advance(now)
    }

    /// Records the detection result without escalating the loss.
    ///
    /// Used while paused: loss and re-acquisition are still timestamped,
    /// so a fallback that became due fires on the next [`observe`].
    ///
    /// [`observe`]: Self::observe
    pub fn track(&mut self, found: bool, now: Duration) {
        self.status.found_previous_tick = self.status.found;
        self.status.found = found;

        if found {
            self.status.last_found_timestamp = Some(
                self.status
                    .last_found_timestamp
                    .map_or(now, |last| last.max(now)),
            );
            if let Some(since) = self.state.lost_since() {
                log::debug!(
                    "Face reacquired after {} ms",
                    now.saturating_sub(since).as_millis()
                );
                self.state = RecoveryState::Tracking;
            }
        } else if self.state == RecoveryState::Tracking {
            log::debug!("Face lost at {} ms", now.as_millis());
            self.state = RecoveryState::LostRecent { since: now };
        }
    }

    fn advance(&mut self, now: Duration) -> Option<RecoveryEvent> {
        match self.state {
            RecoveryState::LostRecent { since }
                if now.saturating_sub(since) >= self.policy.preset_timeout() =>
            {
                self.state = RecoveryState::LostPresetSent { since };
                let preset = self.policy.lost_preset();
                match preset {
                    Some(id) => log::info!("Face lost, recalling preset {id}"),
                    None => log::debug!("Face lost, no preset configured"),
                }
                preset.map(RecoveryEvent::RecallPreset)
            }
            RecoveryState::LostPresetSent { since }
                if now.saturating_sub(since) >= self.policy.zoomout_timeout() =>
            {
                self.state = RecoveryState::LostZoomout { since };
                log::info!("Face still lost, zooming out");
                Some(RecoveryEvent::ZoomOut)
            }
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.state = RecoveryState::Tracking;
        self.status = FaceTrackingStatus::default();
    }

    /// Applies to the current loss as well; timestamps are kept.
    pub fn set_policy(&mut self, policy: RecoveryPolicy) {
        self.policy = policy;
    }

    pub fn state(&self) -> RecoveryState {
        self.state
    }

    pub fn status(&self) -> &FaceTrackingStatus {
        &self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const TICK_MS: u64 = 33;

    fn machine(preset_ms: u64, zoomout_ms: u64) -> RecoveryStateMachine {
        let policy = RecoveryPolicy::new(
            Duration::from_millis(preset_ms),
            Some(4),
            Duration::from_millis(zoomout_ms),
        )
        .unwrap();
        RecoveryStateMachine::new(policy)
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    /// Runs ticks every `TICK_MS` over `[start, end]` and collects events.
    fn run(
        m: &mut RecoveryStateMachine,
        found: bool,
        start: u64,
        end: u64,
    ) -> Vec<RecoveryEvent> {
        let mut events = Vec::new();
        let mut t = start;
        while t <= end {
            events.extend(m.observe(found, ms(t)));
            t += TICK_MS;
        }
        events
    }

    #[test]
    fn test_starts_tracking() {
        let m = machine(2000, 5000);
        assert_eq!(m.state(), RecoveryState::Tracking);
        assert_eq!(*m.status(), FaceTrackingStatus::default());
    }

    #[test]
    fn test_loss_enters_lost_recent_with_timestamp() {
        let mut m = machine(2000, 5000);
        assert_eq!(m.observe(true, ms(0)), None);
        assert_eq!(m.observe(false, ms(100)), None);
        assert_eq!(m.state(), RecoveryState::LostRecent { since: ms(100) });
    }

    #[test]
    fn test_lost_2500ms_recalls_preset_once_without_zoomout() {
        let mut m = machine(2000, 5000);
        let events = run(&mut m, false, 0, 2500);
        assert_eq!(events, vec![RecoveryEvent::RecallPreset(4)]);
        assert!(matches!(m.state(), RecoveryState::LostPresetSent { .. }));
    }

    #[rstest]
    #[case::at_preset_timeout(2000)]
    #[case::mid_window(3500)]
    #[case::just_before_zoomout(4999)]
    fn test_within_preset_window_only_preset(#[case] lost_for: u64) {
        let mut m = machine(2000, 5000);
        m.observe(false, ms(0));
        let events: Vec<_> = [lost_for / 2, lost_for]
            .iter()
            .filter_map(|&t| m.observe(false, ms(t)))
            .collect();
        assert_eq!(events, vec![RecoveryEvent::RecallPreset(4)]);
    }

    #[test]
    fn test_prolonged_loss_preset_then_zoomout_no_duplicates() {
        let mut m = machine(2000, 5000);
        let events = run(&mut m, false, 0, 20_000);
        assert_eq!(
            events,
            vec![RecoveryEvent::RecallPreset(4), RecoveryEvent::ZoomOut]
        );
        assert!(matches!(m.state(), RecoveryState::LostZoomout { .. }));
    }

    #[test]
    fn test_large_gap_emits_one_event_per_tick() {
        let mut m = machine(2000, 5000);
        assert_eq!(m.observe(false, ms(0)), None);
        assert_eq!(m.observe(false, ms(9000)), Some(RecoveryEvent::RecallPreset(4)));
        assert_eq!(m.observe(false, ms(9033)), Some(RecoveryEvent::ZoomOut));
        assert_eq!(m.observe(false, ms(9066)), None);
    }

    #[test]
    fn test_reacquire_returns_to_tracking_and_restarts_timers() {
        let mut m = machine(2000, 5000);
        let first = run(&mut m, false, 0, 3000);
        assert_eq!(first, vec![RecoveryEvent::RecallPreset(4)]);

        assert_eq!(m.observe(true, ms(3100)), None);
        assert_eq!(m.state(), RecoveryState::Tracking);

        // New loss: timers start from the new loss, not the old one.
        assert_eq!(m.observe(false, ms(4000)), None);
        assert_eq!(m.observe(false, ms(5900)), None);
        assert_eq!(m.observe(false, ms(6000)), Some(RecoveryEvent::RecallPreset(4)));
    }

    #[test]
    fn test_brief_flicker_is_tolerated() {
        let mut m = machine(2000, 5000);
        let mut events = Vec::new();
        for k in 0..300u64 {
            // Lost for 1s out of every 1.5s.
            let found = k % 45 < 15;
            events.extend(m.observe(found, ms(k * TICK_MS)));
        }
        assert!(events.is_empty());
    }

    #[test]
    fn test_no_preset_configured_still_escalates_to_zoomout() {
        let policy =
            RecoveryPolicy::new(Duration::from_millis(1000), None, Duration::from_millis(2000))
                .unwrap();
        let mut m = RecoveryStateMachine::new(policy);
        let events = run(&mut m, false, 0, 3000);
        assert_eq!(events, vec![RecoveryEvent::ZoomOut]);
    }

    #[test]
    fn test_track_does_not_escalate() {
        let mut m = machine(2000, 5000);
        m.track(false, ms(0));
        m.track(false, ms(10_000));
        assert_eq!(m.state(), RecoveryState::LostRecent { since: ms(0) });

        // Pending fallback fires on the next observed tick.
        assert_eq!(m.observe(false, ms(10_033)), Some(RecoveryEvent::RecallPreset(4)));
    }

    #[test]
    fn test_status_tracks_found_history() {
        let mut m = machine(2000, 5000);
        m.observe(true, ms(100));
        m.observe(true, ms(200));
        m.observe(false, ms(300));

        let s = m.status();
        assert!(!s.found);
        assert!(s.found_previous_tick);
        assert_eq!(s.last_found_timestamp, Some(ms(200)));
    }

    #[test]
    fn test_last_found_timestamp_never_moves_back() {
        let mut m = machine(2000, 5000);
        m.observe(true, ms(500));
        m.observe(true, ms(400));
        assert_eq!(m.status().last_found_timestamp, Some(ms(500)));
    }

    #[test]
    fn test_reset_returns_to_tracking() {
        let mut m = machine(2000, 5000);
        run(&mut m, false, 0, 6000);
        m.reset();
        assert_eq!(m.state(), RecoveryState::Tracking);
        assert_eq!(*m.status(), FaceTrackingStatus::default());

        let events = run(&mut m, false, 10_000, 12_500);
        assert_eq!(events, vec![RecoveryEvent::RecallPreset(4)]);
    }
}
