/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! IEEE 754 binary16 helpers
//!
//! Half floats are carried around as their raw `u16` bit patterns,
//! these helpers go through [`::half::f16`] to convert and classify them.
use ::half::f16;

/// Largest finite half value, 65504.0
pub const HALF_MAX: u16 = f16::MAX.to_bits();
/// Positive infinity
pub const HALF_POS_INF: u16 = f16::INFINITY.to_bits();
/// Negative infinity
pub const HALF_NEG_INF: u16 = f16::NEG_INFINITY.to_bits();

/// Whether the bit pattern is a NaN or an infinity
#[inline]
pub fn is_nan_or_inf(bits: u16) -> bool {
    !f16::from_bits(bits).is_finite()
}

/// Whether the bit pattern is +0.0 or -0.0
#[inline]
pub fn is_zero(bits: u16) -> bool {
    f16::from_bits(bits) == f16::ZERO
}

/// Whether the sign bit is set
#[inline]
pub fn is_negative(bits: u16) -> bool {
    f16::from_bits(bits).is_sign_negative()
}

/// Convert a half float bit pattern into a float, exactly
#[inline]
pub fn half_to_f32(bits: u16) -> f32 {
    f16::from_bits(bits).to_f32()
}

/// Convert a float to a half float bit pattern
///
/// Rounds to nearest, ties to even. Values too large for a half
/// become infinity, NaNs stay NaNs.
#[inline]
pub fn f32_to_half(value: f32) -> u16 {
    f16::from_f32(value).to_bits()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_values() {
        assert_eq!(HALF_MAX, 0x7bff);
        assert_eq!(HALF_POS_INF, 0x7c00);
        assert_eq!(HALF_NEG_INF, 0xfc00);

        assert_eq!(f32_to_half(-0.0), 0x8000);
        assert_eq!(f32_to_half(1.0), 0x3c00);
        assert_eq!(f32_to_half(65504.0), HALF_MAX);
        assert_eq!(f32_to_half(1.0e6), HALF_POS_INF);
        assert!(is_nan_or_inf(f32_to_half(f32::NAN)));
        assert_ne!(f32_to_half(f32::NAN), HALF_POS_INF);
    }

    #[test]
    fn test_predicates() {
        assert!(is_zero(0x0000));
        assert!(is_zero(0x8000));
        assert!(!is_zero(0x0001));
        assert!(is_negative(0x8000));
        assert!(is_negative(0xbc00));
        assert!(!is_negative(0x3c00));
        assert!(is_nan_or_inf(0x7e00));
        assert!(is_nan_or_inf(HALF_NEG_INF));
        assert!(!is_nan_or_inf(HALF_MAX));
    }

    #[test]
    fn test_every_finite_half_survives() {
        for bits in 0..=u16::MAX {
            if is_nan_or_inf(bits) {
                continue;
            }
            assert_eq!(f32_to_half(half_to_f32(bits)), bits, "{bits:#06x}");
        }
    }
}
