use crate::shared::axes::Vec3;

/// Deadband plus soft-knee shaping of the raw tracking error.
///
/// Per axis with `d = deadband`, `n = nonlinear`, `a = |e|`:
///
/// - `a < d`: zero, so detector jitter never reaches the actuators
/// - `d <= a < d + n`: `(a - d)^2 / (2n)`, a quadratic knee
/// - `a >= d + n`: `a - d - n/2`, unit slope
///
/// The pieces meet with matching value and slope, so the curve is
/// continuous, monotonic and sign-preserving. `n = 0` reduces to plain
/// deadband subtraction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ErrorShaper {
    deadband: Vec3,
    nonlinear: Vec3,
}

impl ErrorShaper {
    /// Negative parameters are taken by magnitude.
    pub fn new(deadband: Vec3, nonlinear: Vec3) -> Self {
        Self {
            deadband: deadband.abs(),
            nonlinear: nonlinear.abs(),
        }
    }

    pub fn shape(&self, raw: Vec3) -> Vec3 {
        shape(raw, self.deadband, self.nonlinear)
    }
}

pub fn shape(raw: Vec3, deadband: Vec3, nonlinear: Vec3) -> Vec3 {
    let params = deadband.zip_with(nonlinear, |d, n| (d.abs(), n.abs()));
    raw.zip_with(params, |e, (d, n)| shape_axis(e, d, n))
}

fn shape_axis(e: f64, d: f64, n: f64) -> f64 {
    let a = e.abs();
    let magnitude = if a < d {
        0.0
    } else if a < d + n {
        let r = a - d;
        r * r / (2.0 * n)
    } else {
        a - d - n * 0.5
    };
    magnitude.copysign(e)
}
