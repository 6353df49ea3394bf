use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};
use crate::shared::axes::{Axes, Vec3};
use crate::shared::constants::ATTENUATION_RECOVERY;

/// Gains of the per-axis PI regulator.
///
/// `klpf` and `tlpf` are per-tick smoothing coefficients in `(0, 1]`:
/// `1` passes the input straight through, smaller values smooth harder.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegulatorGains {
    pub kp: Vec3,
    pub ki: Vec3,
    pub klpf: Vec3,
    pub tlpf: Vec3,
}

/// Persistent regulator memory. Zero on creation and after reset.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ControllerState {
    pub integral: Vec3,
    pub filtered_error: Vec3,
    pub filtered_integral: Vec3,
    /// Anti-windup scaling of the integral term, always in `[0, 1]`.
    pub attenuation: f64,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            integral: Vec3::ZERO,
            filtered_error: Vec3::ZERO,
            filtered_integral: Vec3::ZERO,
            attenuation: 1.0,
        }
    }
}

/// Proportional + low-pass-filtered-integral controller with
/// saturation-aware anti-windup.
///
/// The attenuation factor is shared by all axes: it is lowered at once to
/// the largest value that keeps every axis within `limit`, and relaxes back
/// toward 1 by [`ATTENUATION_RECOVERY`] per tick while there is headroom.
/// Integral accumulation is scaled by the same factor, and the stored
/// integral is back-calculated so that `p + i` never exceeds `limit` in the
/// integral's direction. A saturated loop therefore holds no excess integral
/// and unwinds at once when the error reverses.
pub struct Regulator {
    gains: RegulatorGains,
    state: ControllerState,
}

impl Regulator {
    pub fn new(gains: RegulatorGains) -> Self {
        Self {
            gains,
            state: ControllerState::default(),
        }
    }

    /// Advances the loop by `dt` and returns the control effort.
    ///
    /// `limit` is the per-axis effort at which the actuator saturates.
    /// A zero `dt` is rejected without touching the state.
    pub fn update(&mut self, shaped: Vec3, dt: Duration, limit: Vec3) -> Result<Vec3> {
        if dt.is_zero() {
            return Err(TrackerError::ZeroTimestep);
        }
        let dt = dt.as_secs_f64();
        let g = self.gains;
        let s = &mut self.state;

        s.filtered_error = s.filtered_error + g.klpf * (shaped - s.filtered_error);
        s.integral = s.integral + g.ki * s.filtered_error * (dt * s.attenuation);
        s.filtered_integral = s.filtered_integral + g.tlpf * (s.integral - s.filtered_integral);

        let proportional = g.kp * s.filtered_error;
        let allowed = allowed_attenuation(proportional, s.filtered_integral, limit);
        let relaxed = s.attenuation + (1.0 - s.attenuation) * ATTENUATION_RECOVERY;
        s.attenuation = relaxed.min(allowed).clamp(0.0, 1.0);

        let bounds = proportional.zip_with(limit, integral_bounds);
        s.integral = s.integral.zip_with(bounds, |i, (lo, hi)| i.clamp(lo, hi));
        s.filtered_integral = s
            .filtered_integral
            .zip_with(bounds, |i, (lo, hi)| i.clamp(lo, hi));

        Ok(proportional + s.filtered_integral * s.attenuation)
    }

    pub fn reset(&mut self) {
        self.state = ControllerState::default();
    }

    /// Replaces the gains; the accumulated state is kept.
    pub fn set_gains(&mut self, gains: RegulatorGains) {
        self.gains = gains;
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }
}

/// Largest attenuation in `[0, 1]` with `|p + a * i| <= limit` on every axis.
///
/// Only the bound in the integral's direction matters: when the integral
/// opposes the proportional term it pulls the output back into range.
fn allowed_attenuation(proportional: Vec3, integral: Vec3, limit: Vec3) -> f64 {
    let per_axis: Axes<f64> = proportional
        .zip_with(integral, |p, i| (p, i))
        .zip_with(limit, |(p, i), l| {
            if i == 0.0 || !i.is_finite() {
                return 1.0;
            }
            ((l - p * i.signum()) / i.abs()).clamp(0.0, 1.0)
        });
    per_axis.iter().fold(1.0_f64, |acc, &a| acc.min(a))
}

/// Range of integral values for which `p + i` stays within `limit` on the
/// integral's side of zero.
fn integral_bounds(proportional: f64, limit: f64) -> (f64, f64) {
    ((-limit - proportional).min(0.0), (limit - proportional).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DT: Duration = Duration::from_micros(33_333);

    fn gains(kp: f64, ki: f64, klpf: f64, tlpf: f64) -> RegulatorGains {
        RegulatorGains {
            kp: Vec3::splat(kp),
            ki: Vec3::splat(ki),
            klpf: Vec3::splat(klpf),
            tlpf: Vec3::splat(tlpf),
        }
    }

    fn wide() -> Vec3 {
        Vec3::splat(10.0)
    }

    #[test]
    fn test_initial_state_is_zero_with_full_attenuation() {
        let reg = Regulator::new(gains(1.0, 1.0, 0.5, 0.5));
        let s = reg.state();
        assert_eq!(s.integral, Vec3::ZERO);
        assert_eq!(s.filtered_error, Vec3::ZERO);
        assert_eq!(s.filtered_integral, Vec3::ZERO);
        assert_relative_eq!(s.attenuation, 1.0);
    }

    #[test]
    fn test_proportional_only_with_unfiltered_input() {
        let mut reg = Regulator::new(gains(2.0, 0.0, 1.0, 1.0));
        let u = reg.update(Vec3::new(0.1, -0.2, 0.0), DT, wide()).unwrap();
        assert_relative_eq!(u.x, 0.2, epsilon = 1e-12);
        assert_relative_eq!(u.y, -0.4, epsilon = 1e-12);
        assert_eq!(u.z, 0.0);
    }

    #[test]
    fn test_error_lowpass_blends_toward_input() {
        let mut reg = Regulator::new(gains(1.0, 0.0, 0.5, 1.0));
        let u1 = reg.update(Vec3::splat(1.0), DT, wide()).unwrap();
        let u2 = reg.update(Vec3::splat(1.0), DT, wide()).unwrap();
        assert_relative_eq!(u1.x, 0.5);
        assert_relative_eq!(u2.x, 0.75);
    }

    #[test]
    fn test_integral_accumulates_with_dt() {
        let mut reg = Regulator::new(gains(0.0, 2.0, 1.0, 1.0));
        let dt = Duration::from_millis(100);
        reg.update(Vec3::new(0.5, 0.0, 0.0), dt, wide()).unwrap();
        let u = reg.update(Vec3::new(0.5, 0.0, 0.0), dt, wide()).unwrap();
        // 2 ticks * ki(2) * e(0.5) * dt(0.1)
        assert_relative_eq!(reg.state().integral.x, 0.2, epsilon = 1e-12);
        assert_relative_eq!(u.x, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_integral_lowpass_smooths_jumps() {
        let mut reg = Regulator::new(gains(0.0, 1.0, 1.0, 0.25));
        let dt = Duration::from_secs(1);
        reg.update(Vec3::splat(1.0), dt, wide()).unwrap();
        let s = reg.state();
        assert_relative_eq!(s.integral.x, 1.0);
        assert_relative_eq!(s.filtered_integral.x, 0.25);
    }

    #[test]
    fn test_zero_dt_rejected_without_mutation() {
        let mut reg = Regulator::new(gains(1.0, 1.0, 0.5, 0.5));
        reg.update(Vec3::splat(0.3), DT, wide()).unwrap();
        let before = *reg.state();

        let result = reg.update(Vec3::splat(0.9), Duration::ZERO, wide());
        assert!(matches!(result, Err(TrackerError::ZeroTimestep)));
        assert_eq!(*reg.state(), before);
    }

    #[test]
    fn test_closed_loop_effort_converges_to_zero() {
        let mut reg = Regulator::new(gains(1.0, 0.2, 0.5, 0.5));
        let target = Vec3::new(0.5, -0.3, 0.2);
        let mut position = Vec3::ZERO;
        let dt = DT.as_secs_f64();

        let mut effort = Vec3::ZERO;
        for _ in 0..3000 {
            // Velocity-controlled camera: effort moves the view.
            let error = target - position;
            effort = reg.update(error, DT, wide()).unwrap();
            position = position + effort * dt;
        }

        for v in effort.iter() {
            assert!(v.abs() < 1e-6, "effort did not settle: {effort:?}");
        }
        for v in (target - position).iter() {
            assert!(v.abs() < 1e-6, "error did not settle");
        }
    }

    #[test]
    fn test_sustained_saturation_holds_integral_at_limit() {
        let mut reg = Regulator::new(gains(0.5, 1.0, 0.5, 0.5));
        let limit = Vec3::splat(1.0);
        let mut effort = Vec3::ZERO;
        for _ in 0..1800 {
            effort = reg.update(Vec3::new(1.0, 0.0, 0.0), DT, limit).unwrap();
        }
        let s = reg.state();
        assert!(s.attenuation < 1.0);
        assert!(effort.x <= 1.0 + 1e-9, "effort exceeded limit: {}", effort.x);
        // limit - kp * e
        assert!(s.integral.x <= 0.5 + 1e-9, "integral wound up: {}", s.integral.x);
        assert!(s.filtered_integral.x <= 0.5 + 1e-9);
    }

    #[test]
    fn test_effort_reverses_quickly_after_long_saturation() {
        let mut reg = Regulator::new(gains(0.5, 1.0, 0.5, 0.5));
        let limit = Vec3::splat(1.0);
        for _ in 0..1800 {
            reg.update(Vec3::new(1.0, 0.0, 0.0), DT, limit).unwrap();
        }

        let wrong_way = (0..120)
            .map(|_| reg.update(Vec3::new(-0.5, 0.0, 0.0), DT, limit).unwrap())
            .take_while(|u| u.x > 0.0)
            .count();
        assert!(wrong_way < 30, "kept pushing the wrong way for {wrong_way} ticks");
    }

    #[test]
    fn test_attenuation_recovers_once_back_in_range() {
        let mut reg = Regulator::new(gains(0.5, 3.0, 0.5, 0.5));
        let limit = Vec3::splat(1.0);
        for _ in 0..60 {
            reg.update(Vec3::new(1.0, 0.0, 0.0), DT, limit).unwrap();
        }
        assert!(reg.state().attenuation < 1.0);

        for _ in 0..300 {
            reg.update(Vec3::new(-0.1, 0.0, 0.0), DT, limit).unwrap();
        }
        assert!(reg.state().attenuation > 0.99);
    }

    #[test]
    fn test_attenuation_stays_in_unit_range() {
        let mut reg = Regulator::new(gains(3.0, 5.0, 0.7, 0.3));
        let limit = Vec3::new(0.5, 1.0, 0.2);
        for k in 0..2000 {
            let t = k as f64 * 0.05;
            let e = Vec3::new((t * 1.3).sin() * 2.0, (t * 0.4).cos() * 5.0, (t * 3.1).sin());
            reg.update(e, DT, limit).unwrap();
            let a = reg.state().attenuation;
            assert!((0.0..=1.0).contains(&a), "attenuation out of range: {a}");
        }
    }

    #[test]
    fn test_reset_restores_identical_response() {
        let mut reg = Regulator::new(gains(1.0, 0.5, 0.6, 0.4));
        let inputs: Vec<Vec3> = (0..20)
            .map(|k| Vec3::new(0.1 * k as f64, -0.05 * k as f64, 0.02))
            .collect();

        let first: Vec<Vec3> = inputs
            .iter()
            .map(|&e| reg.update(e, DT, wide()).unwrap())
            .collect();
        reg.reset();
        assert_eq!(*reg.state(), ControllerState::default());

        let second: Vec<Vec3> = inputs
            .iter()
            .map(|&e| reg.update(e, DT, wide()).unwrap())
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_allowed_attenuation_ignores_opposing_integral() {
        let a = allowed_attenuation(
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(-0.5, 0.0, 0.0),
            Vec3::splat(1.0),
        );
        assert_relative_eq!(a, 1.0);
    }

    #[test]
    fn test_integral_bounds_follow_proportional_headroom() {
        assert_eq!(integral_bounds(0.25, 1.0), (-1.25, 0.75));
        assert_eq!(integral_bounds(1.5, 1.0), (-2.5, 0.0));
        assert_eq!(integral_bounds(-1.5, 1.0), (0.0, 2.5));
    }

    #[test]
    fn test_allowed_attenuation_zero_when_proportional_saturates() {
        let a = allowed_attenuation(
            Vec3::new(0.0, 1.5, 0.0),
            Vec3::new(0.0, 0.2, 0.0),
            Vec3::splat(1.0),
        );
        assert_relative_eq!(a, 0.0);
    }
}
