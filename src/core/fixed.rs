//! Q16.16 Fixed-Point Arithmetic
//!
//! Deterministic fixed-point math for the match simulation.
//! All gameplay logic uses integer arithmetic only - no floats in the
//! tick loop, so two engines on different platforms produce identical
//! fighter state bit for bit.
//!
//! ## Format: Q16.16
//!
//! 32-bit signed integer, 16 integer bits, 16 fractional bits.
//! Range ~±32768.0, precision 1/65536.

use std::fmt;

/// Q16.16 fixed-point number stored as i32.
pub type Fixed = i32;

/// Number of fractional bits (16)
pub const FIXED_SCALE: i32 = 16;

/// 1.0 in fixed-point (65536)
pub const FIXED_ONE: Fixed = 1 << FIXED_SCALE;

/// 0.5 in fixed-point (32768)
pub const FIXED_HALF: Fixed = FIXED_ONE >> 1;

// =============================================================================
// GAME CONSTANTS (integer literals only - no float conversion at runtime)
// =============================================================================

/// Tick duration: 1/60 second = round(65536/60) = 1092
pub const TICK_DT: Fixed = 1092;

/// Ground walk speed: 4.0 units/sec
pub const WALK_SPEED: Fixed = 262144;

/// Initial jump velocity: 12.0 units/sec
pub const JUMP_VELOCITY: Fixed = 786432;

/// Gravity acceleration: 30.0 units/sec^2
pub const GRAVITY: Fixed = 1966080;

/// Dodge burst speed: 7.0 units/sec
pub const DODGE_SPEED: Fixed = 458752;

/// Stage half-width along the fight axis: 8.0
pub const STAGE_HALF_WIDTH: Fixed = 524288;

/// Stage half-depth (sidestep axis): 2.0
pub const STAGE_HALF_DEPTH: Fixed = 131072;

/// Fighter spawn distance from stage center: 3.0
pub const SPAWN_OFFSET_X: Fixed = 196608;

/// Fighter hurtbox radius: 0.9
pub const HURTBOX_RADIUS: Fixed = 58982;

// =============================================================================
// CORE OPERATIONS (deterministic, wrapping semantics)
// =============================================================================

/// Convert a compile-time float to fixed-point.
///
/// Only for constants and test setup - never in the tick loop.
#[inline]
pub const fn to_fixed(f: f64) -> Fixed {
    (f * (FIXED_ONE as f64)) as Fixed
}

/// Convert fixed-point to float for display/logging only.
#[inline]
pub fn to_float(f: Fixed) -> f32 {
    f as f32 / FIXED_ONE as f32
}

/// Multiply two fixed-point numbers.
///
/// Widens to i64 to prevent overflow, truncates toward zero.
#[inline]
pub fn fixed_mul(a: Fixed, b: Fixed) -> Fixed {
    let wide = (a as i64) * (b as i64);
    (wide >> FIXED_SCALE) as Fixed
}

/// Divide two fixed-point numbers.
///
/// Pre-shifts the numerator to keep precision.
/// Divide-by-zero returns 0 rather than panicking.
#[inline]
pub fn fixed_div(a: Fixed, b: Fixed) -> Fixed {
    if b == 0 {
        return 0;
    }
    let wide = (a as i64) << FIXED_SCALE;
    (wide / b as i64) as Fixed
}

/// Square root via Newton-Raphson.
///
/// Exactly 6 iterations for determinism; non-positive inputs return 0.
#[inline]
pub fn fixed_sqrt(x: Fixed) -> Fixed {
    if x <= 0 {
        return 0;
    }

    let mut guess = (x >> 1).max(1);

    for _ in 0..6 {
        let div = fixed_div(x, guess);
        guess = (guess.wrapping_add(div)) >> 1;
        if guess == 0 {
            guess = 1;
        }
    }

    guess
}

/// Absolute value.
#[inline]
pub fn fixed_abs(x: Fixed) -> Fixed {
    if x < 0 { x.wrapping_neg() } else { x }
}

/// Minimum of two fixed-point numbers.
#[inline]
pub fn fixed_min(a: Fixed, b: Fixed) -> Fixed {
    if a < b { a } else { b }
}

/// Maximum of two fixed-point numbers.
#[inline]
pub fn fixed_max(a: Fixed, b: Fixed) -> Fixed {
    if a > b { a } else { b }
}

/// Clamp a fixed-point number to a range.
#[inline]
pub fn fixed_clamp(value: Fixed, min: Fixed, max: Fixed) -> Fixed {
    fixed_max(min, fixed_min(max, value))
}

/// Linear interpolation: a + (b - a) * t, with t in fixed-point.
#[inline]
pub fn fixed_lerp(a: Fixed, b: Fixed, t: Fixed) -> Fixed {
    let diff = b.wrapping_sub(a);
    a.wrapping_add(fixed_mul(diff, t))
}

/// Display helper for logging fixed-point values.
pub struct DisplayFixed(pub Fixed);

impl fmt::Display for DisplayFixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", to_float(self.0))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_constants() {
        assert_eq!(FIXED_ONE, 65536);
        assert_eq!(FIXED_HALF, 32768);
        assert_eq!(TICK_DT, 1092); // round(65536/60)
        assert_eq!(WALK_SPEED, 4 * FIXED_ONE);
        assert_eq!(STAGE_HALF_WIDTH, 8 * FIXED_ONE);
    }

    #[test]
    fn test_to_fixed() {
        assert_eq!(to_fixed(1.0), FIXED_ONE);
        assert_eq!(to_fixed(0.5), FIXED_HALF);
        assert_eq!(to_fixed(-2.0), -2 * FIXED_ONE);
    }

    #[test]
    fn test_fixed_mul() {
        assert_eq!(fixed_mul(to_fixed(2.0), to_fixed(3.0)), to_fixed(6.0));
        assert_eq!(fixed_mul(FIXED_HALF, FIXED_HALF), to_fixed(0.25));
        assert_eq!(fixed_mul(to_fixed(-2.0), to_fixed(3.0)), to_fixed(-6.0));
    }

    #[test]
    fn test_fixed_div() {
        assert_eq!(fixed_div(to_fixed(6.0), to_fixed(2.0)), to_fixed(3.0));
        assert_eq!(fixed_div(FIXED_ONE, to_fixed(4.0)), to_fixed(0.25));
        // Divide by zero returns 0
        assert_eq!(fixed_div(FIXED_ONE, 0), 0);
    }

    #[test]
    fn test_fixed_sqrt() {
        let result = fixed_sqrt(to_fixed(4.0));
        assert!((result - to_fixed(2.0)).abs() < 100, "sqrt(4) should be ~2.0");

        let result2 = fixed_sqrt(FIXED_ONE);
        assert!((result2 - FIXED_ONE).abs() < 100, "sqrt(1) should be ~1.0");

        assert_eq!(fixed_sqrt(0), 0);
        assert_eq!(fixed_sqrt(-FIXED_ONE), 0);
        assert!(fixed_sqrt(1) >= 0);
    }

    #[test]
    fn test_fixed_clamp_lerp() {
        assert_eq!(fixed_clamp(to_fixed(5.0), 0, to_fixed(3.0)), to_fixed(3.0));
        assert_eq!(fixed_clamp(to_fixed(-1.0), 0, to_fixed(3.0)), 0);
        assert_eq!(fixed_lerp(0, to_fixed(10.0), FIXED_HALF), to_fixed(5.0));
    }

    #[test]
    fn test_fixed_determinism() {
        for _ in 0..1000 {
            let a = 12345678;
            let b = 87654321;
            assert_eq!(fixed_mul(a, b), fixed_mul(a, b));
            assert_eq!(fixed_div(a, b), fixed_div(a, b));
            assert_eq!(fixed_sqrt(a), fixed_sqrt(a));
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        // Values within the range gameplay actually uses (|x| <= 128.0)
        fn gameplay_fixed() -> impl Strategy<Value = Fixed> {
            -128 * FIXED_ONE..=128 * FIXED_ONE
        }

        proptest! {
            #[test]
            fn mul_by_one_is_identity(a in gameplay_fixed()) {
                prop_assert_eq!(fixed_mul(a, FIXED_ONE), a);
            }

            #[test]
            fn mul_div_approximately_invert(
                a in gameplay_fixed(),
                b in gameplay_fixed(),
            ) {
                prop_assume!(b.abs() >= FIXED_ONE / 16);
                let roundtrip = fixed_div(fixed_mul(a, b), b);
                prop_assert!((roundtrip - a).abs() <= 64);
            }

            #[test]
            fn clamp_stays_in_bounds(
                v in any::<Fixed>(),
                lo in gameplay_fixed(),
                hi in gameplay_fixed(),
            ) {
                prop_assume!(lo <= hi);
                let clamped = fixed_clamp(v, lo, hi);
                prop_assert!(clamped >= lo && clamped <= hi);
            }

            #[test]
            fn sqrt_squares_back(x in 0..64 * FIXED_ONE) {
                let root = fixed_sqrt(x);
                let square = fixed_mul(root, root);
                // Tolerance scales with magnitude
                prop_assert!((square - x).abs() <= x / 64 + 256);
            }
        }
    }
}
