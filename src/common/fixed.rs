//! 16.16 fixed-point numbers.
//!
//! QuickDraw stores sub-pixel quantities (text ratios, resolutions, header
//! bounding boxes) as a signed 32-bit integer with 16 integral and 16
//! fractional bits. All arithmetic works on the raw integer with wrapping
//! semantics so results match the original 16-bit-word oriented math.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Shl, Shr, Sub};

/// A signed 16.16 fixed-point value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FixedPoint(i32);

impl FixedPoint {
    /// Zero.
    pub const ZERO: Self = Self(0);
    /// One.
    pub const ONE: Self = Self(0x0001_0000);
    /// Raw value of one unit.
    const UNIT: i32 = 0x0001_0000;

    /// Wrap a raw 16.16 value.
    #[inline]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Build from an integer, scaled by 65536 (wraps outside the 16-bit range).
    #[inline]
    pub const fn from_int(value: i32) -> Self {
        Self(value.wrapping_shl(16))
    }

    /// Build from a double, rounding to the nearest representable value.
    #[inline]
    pub fn from_f64(value: f64) -> Self {
        Self((value * Self::UNIT as f64).round() as i32)
    }

    /// Build from a 16-bit numerator and denominator pair.
    pub fn from_ratio(numerator: i16, denominator: i16) -> Self {
        if denominator == 0 {
            return Self::ZERO;
        }
        Self::from_f64(numerator as f64 / denominator as f64)
    }

    /// The raw 32-bit representation.
    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Integral part rounded to the nearest integer (halves round up).
    #[inline]
    pub const fn rounded(self) -> i32 {
        self.0.wrapping_add(0x8000) >> 16
    }

    /// Integral part, truncated toward negative infinity.
    #[inline]
    pub const fn floor(self) -> i32 {
        self.0 >> 16
    }

    /// Value as a double.
    #[inline]
    pub fn value(self) -> f64 {
        self.0 as f64 / Self::UNIT as f64
    }

    /// True when the fractional bits are all zero.
    #[inline]
    pub const fn is_integer(self) -> bool {
        self.0 & 0xFFFF == 0
    }

    /// Absolute value (wrapping for `i32::MIN`).
    #[inline]
    pub const fn abs(self) -> Self {
        Self(self.0.wrapping_abs())
    }
}

impl From<i8> for FixedPoint {
    fn from(value: i8) -> Self {
        Self::from_int(value as i32)
    }
}

impl From<u8> for FixedPoint {
    fn from(value: u8) -> Self {
        Self::from_int(value as i32)
    }
}

impl From<i16> for FixedPoint {
    fn from(value: i16) -> Self {
        Self::from_int(value as i32)
    }
}

impl From<u16> for FixedPoint {
    fn from(value: u16) -> Self {
        Self::from_int(value as i32)
    }
}

impl From<i32> for FixedPoint {
    fn from(value: i32) -> Self {
        Self::from_int(value)
    }
}

impl Add for FixedPoint {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for FixedPoint {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

impl Neg for FixedPoint {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.wrapping_neg())
    }
}

impl Shl<u32> for FixedPoint {
    type Output = Self;

    fn shl(self, rhs: u32) -> Self {
        Self(self.0.wrapping_shl(rhs))
    }
}

impl Shr<u32> for FixedPoint {
    type Output = Self;

    fn shr(self, rhs: u32) -> Self {
        Self(self.0.wrapping_shr(rhs))
    }
}

impl Mul for FixedPoint {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self(((self.0 as i64 * rhs.0 as i64) >> 16) as i32)
    }
}

impl Mul<i32> for FixedPoint {
    type Output = Self;

    fn mul(self, rhs: i32) -> Self {
        Self(self.0.wrapping_mul(rhs))
    }
}

impl Div for FixedPoint {
    type Output = Self;

    /// Divides through `f64` and re-quantizes; a zero divisor yields zero.
    fn div(self, rhs: Self) -> Self {
        if rhs.0 == 0 {
            return Self::ZERO;
        }
        Self::from_f64(self.value() / rhs.value())
    }
}

impl Div<i32> for FixedPoint {
    type Output = Self;

    fn div(self, rhs: i32) -> Self {
        if rhs == 0 {
            return Self::ZERO;
        }
        Self(self.0.wrapping_div(rhs))
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_integer() {
            write!(f, "{}", self.floor())
        } else {
            write!(f, "{:.4}", self.value())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding() {
        assert_eq!(FixedPoint::from_raw(0x0001_8000).rounded(), 2);
        assert_eq!(FixedPoint::from_raw(0x0001_7FFF).rounded(), 1);
        assert_eq!(FixedPoint::from_f64(-1.5).rounded(), -1);
        assert_eq!(FixedPoint::from_f64(0.25).raw(), 0x4000);
    }

    #[test]
    fn test_arithmetic() {
        let a = FixedPoint::from_f64(2.5);
        let b = FixedPoint::from(2i16);
        assert_eq!((a * b).value(), 5.0);
        assert_eq!((a - b).value(), 0.5);
        assert_eq!((a / b).value(), 1.25);
        assert_eq!((a / FixedPoint::ZERO), FixedPoint::ZERO);
        assert_eq!((b / 2).value(), 1.0);
        assert!(b.is_integer());
        assert!(!a.is_integer());
    }

    #[test]
    fn test_display() {
        assert_eq!(FixedPoint::from(72i16).to_string(), "72");
        assert_eq!(FixedPoint::from_f64(0.5).to_string(), "0.5000");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_integer_round_trip(n in i16::MIN..=i16::MAX) {
                prop_assert_eq!(FixedPoint::from(n).rounded(), n as i32);
            }

            #[test]
            fn prop_additive_inverse(raw in any::<i32>()) {
                let a = FixedPoint::from_raw(raw);
                prop_assert_eq!(a + (-a), FixedPoint::ZERO);
            }

            #[test]
            fn prop_shift_round_trip(n in -128i32..128, s in 0u32..8) {
                let a = FixedPoint::from_int(n);
                prop_assert_eq!((a << s) >> s, a);
            }
        }
    }
}
