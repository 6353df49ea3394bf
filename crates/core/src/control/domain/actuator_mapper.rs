use crate::control::domain::actuator_command::ActuatorCommand;
use crate::shared::axes::{Axes, Vec3};

/// Converts continuous control effort into transport commands.
///
/// Per axis, `effort / effort_limit` is the normalized deflection: the
/// pose query is that ratio clamped to `[-1, 1]`, the step command is the
/// ratio scaled to `[-step_max, step_max]` and rounded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActuatorMapper {
    effort_limit: Vec3,
    step_max: Axes<i32>,
}

impl ActuatorMapper {
    /// `effort_limit` must be positive on every axis; callers validate it
    /// through the tracker configuration.
    pub fn new(effort_limit: Vec3, step_max: Axes<i32>) -> Self {
        Self {
            effort_limit,
            step_max: step_max.map(i32::saturating_abs),
        }
    }

    pub fn map(&self, effort: Vec3) -> ActuatorCommand {
        let ratio = effort.zip_with(self.effort_limit, |u, l| u / l);
        let query = ratio.map(|r| r.clamp(-1.0, 1.0));
        let steps = query.zip_with(self.step_max, |q, max| {
            ((q * f64::from(max)).round() as i32).clamp(-max, max)
        });
        let saturated = effort.zip_with(self.effort_limit, |u, l| u.abs() > l);

        ActuatorCommand {
            steps,
            query,
            saturated,
        }
    }

    /// Effort at which each axis saturates, fed back to the regulator.
    pub fn effort_limit(&self) -> Vec3 {
        self.effort_limit
    }

    pub fn step_max(&self) -> Axes<i32> {
        self.step_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn mapper() -> ActuatorMapper {
        ActuatorMapper::new(Vec3::splat(1.0), Axes::new(24, 20, 7))
    }

    #[test]
    fn test_zero_effort_maps_to_hold() {
        let cmd = mapper().map(Vec3::ZERO);
        assert_eq!(cmd, ActuatorCommand::HOLD);
        assert!(cmd.is_hold());
    }

    #[test]
    fn test_steps_are_rounded_and_scaled() {
        let cmd = mapper().map(Vec3::new(0.5, -0.26, 0.2));
        assert_eq!(cmd.steps, Axes::new(12, -5, 1));
        assert_relative_eq!(cmd.query.x, 0.5);
        assert_relative_eq!(cmd.query.y, -0.26);
        assert!(!cmd.saturated.any());
    }

    #[rstest]
    #[case::positive(5.0, 24, 1.0)]
    #[case::negative(-3.0, -24, -1.0)]
    #[case::just_over(1.0001, 24, 1.0)]
    fn test_saturates_at_transport_range(
        #[case] effort: f64,
        #[case] expected_steps: i32,
        #[case] expected_query: f64,
    ) {
        let cmd = mapper().map(Vec3::new(effort, 0.0, 0.0));
        assert_eq!(cmd.steps.x, expected_steps);
        assert_relative_eq!(cmd.query.x, expected_query);
        assert!(cmd.saturated.x);
        assert!(!cmd.saturated.y);
    }

    #[test]
    fn test_effort_limit_scales_per_axis() {
        let m = ActuatorMapper::new(Vec3::new(2.0, 0.5, 1.0), Axes::new(10, 10, 10));
        let cmd = m.map(Vec3::new(1.0, 0.25, -1.0));
        assert_eq!(cmd.steps, Axes::new(5, 5, -10));
        assert_relative_eq!(cmd.query.x, 0.5);
        assert_relative_eq!(cmd.query.y, 0.5);
        assert_relative_eq!(cmd.query.z, -1.0);
        assert!(!cmd.saturated.z);
        assert_eq!(m.effort_limit(), Vec3::new(2.0, 0.5, 1.0));
    }

    #[test]
    fn test_negative_step_max_uses_magnitude() {
        let m = ActuatorMapper::new(Vec3::splat(1.0), Axes::new(-8, 8, 8));
        assert_eq!(m.step_max(), Axes::splat(8));
        assert_eq!(m.map(Vec3::new(-2.0, 0.0, 0.0)).steps.x, -8);
    }

    #[test]
    fn test_minimum_step_max_saturates_instead_of_overflowing() {
        let m = ActuatorMapper::new(Vec3::splat(1.0), Axes::new(i32::MIN, 8, 8));
        assert_eq!(m.step_max().x, i32::MAX);
        assert_eq!(m.map(Vec3::new(3.0, 0.0, 0.0)).steps.x, i32::MAX);
        assert_eq!(m.map(Vec3::new(-3.0, 0.0, 0.0)).steps.x, -i32::MAX);
    }
}
