//! Fixed-Point 3D Vector
//!
//! Deterministic 3D vector operations for fighter movement and knockback.
//! X is the fight axis, Y is up, Z is stage depth (sidestep axis).

use std::fmt;
use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

use super::fixed::{
    fixed_clamp, fixed_mul, fixed_sqrt, to_float, Fixed, FIXED_ONE, FIXED_SCALE,
};

/// 3D vector with Q16.16 fixed-point components.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FixedVec3 {
    /// X component (fight axis)
    pub x: Fixed,
    /// Y component (up)
    pub y: Fixed,
    /// Z component (stage depth)
    pub z: Fixed,
}

impl FixedVec3 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0, y: 0, z: 0 };

    /// Unit vector along +X
    pub const RIGHT: Self = Self { x: FIXED_ONE, y: 0, z: 0 };

    /// Unit vector along +Y
    pub const UP: Self = Self { x: 0, y: FIXED_ONE, z: 0 };

    /// Create a new vector from fixed-point components.
    #[inline]
    pub const fn new(x: Fixed, y: Fixed, z: Fixed) -> Self {
        Self { x, y, z }
    }

    /// Create a vector from integer components.
    #[inline]
    pub const fn from_ints(x: i32, y: i32, z: i32) -> Self {
        Self {
            x: x << FIXED_SCALE,
            y: y << FIXED_SCALE,
            z: z << FIXED_SCALE,
        }
    }

    /// Add another vector.
    #[inline]
    pub fn add(self, other: Self) -> Self {
        Self {
            x: self.x.wrapping_add(other.x),
            y: self.y.wrapping_add(other.y),
            z: self.z.wrapping_add(other.z),
        }
    }

    /// Subtract another vector.
    #[inline]
    pub fn sub(self, other: Self) -> Self {
        Self {
            x: self.x.wrapping_sub(other.x),
            y: self.y.wrapping_sub(other.y),
            z: self.z.wrapping_sub(other.z),
        }
    }

    /// Scale by a fixed-point scalar.
    #[inline]
    pub fn scale(self, scalar: Fixed) -> Self {
        Self {
            x: fixed_mul(self.x, scalar),
            y: fixed_mul(self.y, scalar),
            z: fixed_mul(self.z, scalar),
        }
    }

    /// Squared length (avoids sqrt - prefer this for comparisons).
    #[inline]
    pub fn length_squared(self) -> Fixed {
        fixed_mul(self.x, self.x)
            .wrapping_add(fixed_mul(self.y, self.y))
            .wrapping_add(fixed_mul(self.z, self.z))
    }

    /// Length (magnitude). Prefer `length_squared` when possible.
    #[inline]
    pub fn length(self) -> Fixed {
        fixed_sqrt(self.length_squared())
    }

    /// Squared distance to another point.
    #[inline]
    pub fn distance_squared(self, other: Self) -> Fixed {
        self.sub(other).length_squared()
    }

    /// Distance to another point. Prefer `distance_squared` when possible.
    #[inline]
    pub fn distance(self, other: Self) -> Fixed {
        fixed_sqrt(self.distance_squared(other))
    }

    /// Dot product with another vector.
    #[inline]
    pub fn dot(self, other: Self) -> Fixed {
        fixed_mul(self.x, other.x)
            .wrapping_add(fixed_mul(self.y, other.y))
            .wrapping_add(fixed_mul(self.z, other.z))
    }

    /// Clamp each component independently.
    #[inline]
    pub fn clamp_components(self, min: Self, max: Self) -> Self {
        Self {
            x: fixed_clamp(self.x, min.x, max.x),
            y: fixed_clamp(self.y, min.y, max.y),
            z: fixed_clamp(self.z, min.z, max.z),
        }
    }

    /// Linear interpolation between two vectors.
    /// t = 0 returns self, t = FIXED_ONE returns other.
    #[inline]
    pub fn lerp(self, other: Self, t: Fixed) -> Self {
        Self {
            x: self.x.wrapping_add(fixed_mul(other.x.wrapping_sub(self.x), t)),
            y: self.y.wrapping_add(fixed_mul(other.y.wrapping_sub(self.y), t)),
            z: self.z.wrapping_add(fixed_mul(other.z.wrapping_sub(self.z), t)),
        }
    }

    /// Negate all components.
    #[inline]
    pub fn negate(self) -> Self {
        Self {
            x: self.x.wrapping_neg(),
            y: self.y.wrapping_neg(),
            z: self.z.wrapping_neg(),
        }
    }

    /// Convert to float tuple for logging.
    #[inline]
    pub fn to_floats(self) -> (f32, f32, f32) {
        (to_float(self.x), to_float(self.y), to_float(self.z))
    }
}

// Operator overloads for ergonomics
impl Add for FixedVec3 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.add(rhs)
    }
}

impl Sub for FixedVec3 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self.sub(rhs)
    }
}

impl Neg for FixedVec3 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        self.negate()
    }
}

impl fmt::Debug for FixedVec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (fx, fy, fz) = self.to_floats();
        write!(f, "Vec3({:.3}, {:.3}, {:.3})", fx, fy, fz)
    }
}

impl fmt::Display for FixedVec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (fx, fy, fz) = self.to_floats();
        write!(f, "({:.3}, {:.3}, {:.3})", fx, fy, fz)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::to_fixed;

    #[test]
    fn test_vec3_constants() {
        assert_eq!(FixedVec3::ZERO, FixedVec3::new(0, 0, 0));
        assert_eq!(FixedVec3::RIGHT.x, FIXED_ONE);
        assert_eq!(FixedVec3::UP.y, FIXED_ONE);
    }

    #[test]
    fn test_vec3_add_sub() {
        let a = FixedVec3::new(to_fixed(3.0), to_fixed(4.0), to_fixed(1.0));
        let b = FixedVec3::new(to_fixed(1.0), to_fixed(2.0), to_fixed(-1.0));

        let sum = a + b;
        assert_eq!(sum.x, to_fixed(4.0));
        assert_eq!(sum.y, to_fixed(6.0));
        assert_eq!(sum.z, 0);

        let diff = a - b;
        assert_eq!(diff.x, to_fixed(2.0));
        assert_eq!(diff.z, to_fixed(2.0));
    }

    #[test]
    fn test_vec3_scale() {
        let v = FixedVec3::new(to_fixed(2.0), to_fixed(3.0), to_fixed(0.5));
        let result = v.scale(to_fixed(2.0));
        assert_eq!(result.x, to_fixed(4.0));
        assert_eq!(result.y, to_fixed(6.0));
        assert_eq!(result.z, to_fixed(1.0));
    }

    #[test]
    fn test_vec3_length() {
        // 3-4-0 triangle in the XY plane
        let v = FixedVec3::new(to_fixed(3.0), to_fixed(4.0), 0);
        assert_eq!(v.length_squared(), to_fixed(25.0));

        let len = v.length();
        assert!((len - to_fixed(5.0)).abs() < 200, "Length should be ~5.0");
    }

    #[test]
    fn test_vec3_distance() {
        let a = FixedVec3::ZERO;
        let b = FixedVec3::new(to_fixed(3.0), 0, to_fixed(4.0));
        assert_eq!(a.distance_squared(b), to_fixed(25.0));
    }

    #[test]
    fn test_vec3_dot() {
        let a = FixedVec3::new(to_fixed(2.0), to_fixed(3.0), to_fixed(1.0));
        let b = FixedVec3::new(to_fixed(4.0), to_fixed(5.0), to_fixed(-2.0));
        // 8 + 15 - 2 = 21
        assert_eq!(a.dot(b), to_fixed(21.0));
    }

    #[test]
    fn test_vec3_clamp_components() {
        let v = FixedVec3::new(to_fixed(10.0), to_fixed(-10.0), 0);
        let min = FixedVec3::new(to_fixed(-5.0), to_fixed(-5.0), to_fixed(-5.0));
        let max = FixedVec3::new(to_fixed(5.0), to_fixed(5.0), to_fixed(5.0));
        let clamped = v.clamp_components(min, max);
        assert_eq!(clamped.x, to_fixed(5.0));
        assert_eq!(clamped.y, to_fixed(-5.0));
        assert_eq!(clamped.z, 0);
    }

    #[test]
    fn test_vec3_determinism() {
        let a = FixedVec3::new(12345678, 87654321, -11111111);
        let b = FixedVec3::new(11111111, 22222222, 33333333);

        for _ in 0..1000 {
            assert_eq!(a + b, a + b);
            assert_eq!(a.length(), a.length());
            assert_eq!(a.dot(b), a.dot(b));
        }
    }
}
