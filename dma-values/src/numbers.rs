//! Integer helpers centralizing the checked casts used by exact arithmetic.

use num_traits::cast::cast;

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Convert an intermediate 128-bit result back to i64, saturating at the
/// i64 range. Values are reduced before narrowing, so saturation only occurs
/// for magnitudes that genuinely exceed 64 bits.
#[must_use]
pub fn narrow_i128(value: i128) -> i64 {
    cast::<i128, i64>(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

/// Greatest common divisor of the magnitudes; `gcd(0, n) == |n|`.
#[must_use]
pub const fn gcd(a: i128, b: i128) -> i128 {
    let mut a = a.abs();
    let mut b = b.abs();
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gcd_handles_zero_and_signs() {
        assert_eq!(gcd(0, 7), 7);
        assert_eq!(gcd(-12, 18), 6);
        assert_eq!(gcd(35, 15), 5);
    }

    #[test]
    fn narrow_saturates_out_of_range() {
        assert_eq!(narrow_i128(42), 42);
        assert_eq!(narrow_i128(i128::from(i64::MAX) + 1), i64::MAX);
        assert_eq!(narrow_i128(i128::from(i64::MIN) - 1), i64::MIN);
    }

    #[test]
    fn i64_to_f64_converts() {
        assert!((i64_to_f64(-3) + 3.0).abs() < f64::EPSILON);
    }
}
