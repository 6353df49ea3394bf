use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Per-axis value triple with named accessors.
///
/// Serialized as a three-element array `[x, y, z]` so traces and telemetry
/// stay compact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[T; 3]", into = "[T; 3]")]
#[serde(bound(
    serialize = "T: Clone + Serialize",
    deserialize = "T: Deserialize<'de>"
))]
pub struct Axes<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

/// Continuous per-axis quantity (errors, efforts, gains).
pub type Vec3 = Axes<f64>;

impl<T> Axes<T> {
    pub const fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Axes<U> {
        Axes {
            x: f(self.x),
            y: f(self.y),
            z: f(self.z),
        }
    }

    pub fn zip_with<U, R>(self, other: Axes<U>, mut f: impl FnMut(T, U) -> R) -> Axes<R> {
        Axes {
            x: f(self.x, other.x),
            y: f(self.y, other.y),
            z: f(self.z, other.z),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        [&self.x, &self.y, &self.z].into_iter()
    }
}

impl<T: Copy> Axes<T> {
    pub const fn splat(value: T) -> Self {
        Self {
            x: value,
            y: value,
            z: value,
        }
    }
}

impl Axes<bool> {
    pub fn any(&self) -> bool {
        self.x || self.y || self.z
    }
}

impl Vec3 {
    pub const ZERO: Vec3 = Axes::splat(0.0);

    pub fn abs(self) -> Self {
        self.map(f64::abs)
    }

    pub fn is_finite(&self) -> bool {
        self.iter().all(|v| v.is_finite())
    }
}

impl<T> From<[T; 3]> for Axes<T> {
    fn from([x, y, z]: [T; 3]) -> Self {
        Self { x, y, z }
    }
}

impl<T> From<Axes<T>> for [T; 3] {
    fn from(a: Axes<T>) -> Self {
        [a.x, a.y, a.z]
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        self.zip_with(rhs, |a, b| a - b)
    }
}

/// Element-wise product.
impl Mul for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: Vec3) -> Vec3 {
        self.zip_with(rhs, |a, b| a * b)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f64) -> Vec3 {
        self.map(|a| a * rhs)
    }
}
