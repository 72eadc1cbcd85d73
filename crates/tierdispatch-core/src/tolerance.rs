//! Numeric equivalence policy between kernel tiers.
//!
//! Every tier of an operation must agree with the fallback within the
//! operation's declared [`Tolerance`]. The check is for tests and diagnostic
//! drivers; dispatch itself never compares outputs.

use approx::{RelativeEq, UlpsEq};
use std::fmt;

/// Floating-point lane types a tolerance can compare.
pub trait Lane: Copy + UlpsEq<Epsilon = Self> + RelativeEq<Epsilon = Self> {
    /// Raw bit pattern, widened.
    fn bits(self) -> u64;

    /// Whether the value is NaN.
    fn is_nan_lane(self) -> bool;

    /// Convert a relative bound to this lane type.
    fn from_bound(bound: f64) -> Self;
}

impl Lane for f32 {
    fn bits(self) -> u64 {
        u64::from(self.to_bits())
    }

    fn is_nan_lane(self) -> bool {
        self.is_nan()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_bound(bound: f64) -> Self {
        bound as f32
    }
}

impl Lane for f64 {
    fn bits(self) -> u64 {
        self.to_bits()
    }

    fn is_nan_lane(self) -> bool {
        self.is_nan()
    }

    fn from_bound(bound: f64) -> Self {
        bound
    }
}

/// How closely a tier must reproduce the fallback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tolerance {
    /// Identical bit patterns; any NaN matches any NaN.
    Exact,
    /// At most this many units in the last place apart.
    Ulps(u32),
    /// Relative difference at most this bound.
    Relative(f64),
}

impl Tolerance {
    /// Compare one pair of lanes.
    pub fn matches<T: Lane>(&self, expected: T, actual: T) -> bool {
        if expected.is_nan_lane() || actual.is_nan_lane() {
            return expected.is_nan_lane() && actual.is_nan_lane();
        }
        // No absolute floor: tiny lanes are held to the same bound as large ones.
        let no_floor = T::from_bound(0.0);
        match *self {
            Self::Exact => expected.bits() == actual.bits(),
            Self::Ulps(max_ulps) => expected.ulps_eq(&actual, no_floor, max_ulps),
            Self::Relative(bound) => expected.relative_eq(&actual, no_floor, T::from_bound(bound)),
        }
    }

    /// Index of the first lane outside tolerance.
    ///
    /// A length difference reports the first index past the shorter slice.
    pub fn first_mismatch<T: Lane>(&self, expected: &[T], actual: &[T]) -> Option<usize> {
        expected
            .iter()
            .zip(actual)
            .position(|(e, a)| !self.matches(*e, *a))
            .or_else(|| {
                (expected.len() != actual.len()).then(|| expected.len().min(actual.len()))
            })
    }

    /// Whether every lane matches.
    pub fn all_match<T: Lane>(&self, expected: &[T], actual: &[T]) -> bool {
        self.first_mismatch(expected, actual).is_none()
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => f.write_str("exact"),
            Self::Ulps(ulps) => write!(f, "{ulps} ulps"),
            Self::Relative(bound) => write!(f, "relative {bound:e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact() {
        let tol = Tolerance::Exact;
        assert!(tol.matches(3.0_f32, 3.0));
        assert!(!tol.matches(0.0_f32, -0.0));
        assert!(!tol.matches(1.0_f64, 1.0 + f64::EPSILON));
        assert!(tol.matches(f32::NAN, -f32::NAN));
        assert!(!tol.matches(f32::NAN, 1.0));
    }

    #[test]
    fn test_ulps() {
        let tol = Tolerance::Ulps(2);
        let x = 1.0_f32;
        let next = f32::from_bits(x.to_bits() + 2);
        let far = f32::from_bits(x.to_bits() + 3);
        assert!(tol.matches(x, next));
        assert!(!tol.matches(x, far));
    }

    #[test]
    fn test_relative() {
        let tol = Tolerance::Relative(1e-6);
        assert!(tol.matches(1000.0_f64, 1000.0005));
        assert!(!tol.matches(1000.0_f64, 1000.01));
    }

    #[test]
    fn test_small_magnitudes_respect_bound() {
        let (a, b) = (1.0e-10_f32, 5.0e-8_f32);
        assert!(!Tolerance::Ulps(0).matches(a, b));
        assert!(!Tolerance::Ulps(1000).matches(a, b));
        assert!(!Tolerance::Relative(1e-6).matches(a, b));
        assert!(!Tolerance::Relative(1e-6).matches(1.0e-300_f64, 2.0e-300));

        let next = f32::from_bits(a.to_bits() + 1);
        assert!(!Tolerance::Ulps(0).matches(a, next));
        assert!(Tolerance::Ulps(1).matches(a, next));
        assert!(Tolerance::Ulps(0).matches(0.0_f32, -0.0));
    }

    #[test]
    fn test_slices() {
        let tol = Tolerance::Exact;
        let expected = [3.0_f32, 4.0, 5.0, 6.0];
        assert!(tol.all_match(&expected, &[3.0, 4.0, 5.0, 6.0]));
        assert_eq!(tol.first_mismatch(&expected, &[3.0, 4.0, 5.5, 6.0]), Some(2));
        assert_eq!(tol.first_mismatch(&expected, &[3.0, 4.0]), Some(2));
    }

    #[test]
    fn test_display() {
        assert_eq!(Tolerance::Exact.to_string(), "exact");
        assert_eq!(Tolerance::Ulps(4).to_string(), "4 ulps");
    }
}
