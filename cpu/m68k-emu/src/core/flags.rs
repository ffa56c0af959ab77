//! Condition code derivation shared by the arithmetic, logical and decimal instruction families.
//!
//! Carry and overflow come from the sign bits of source (`sm`), destination (`dm`) and result
//! (`rm`) at the operation width.

use crate::core::{ConditionCodes, SizedValue};
use crate::num::SignBit;

#[inline]
pub(super) fn add_carry(sm: bool, dm: bool, rm: bool) -> bool {
    (sm && dm) || (!rm && dm) || (sm && !rm)
}

#[inline]
pub(super) fn add_overflow(sm: bool, dm: bool, rm: bool) -> bool {
    (sm && dm && !rm) || (!sm && !dm && rm)
}

#[inline]
pub(super) fn sub_carry(sm: bool, dm: bool, rm: bool) -> bool {
    (sm && !dm) || (rm && !dm) || (sm && rm)
}

#[inline]
pub(super) fn sub_overflow(sm: bool, dm: bool, rm: bool) -> bool {
    (!sm && dm && !rm) || (sm && !dm && rm)
}

macro_rules! impl_add_fn {
    ($name:ident, $t:ty) => {
        #[inline]
        pub(super) fn $name(operand_l: $t, operand_r: $t, extend: bool) -> ($t, bool, bool) {
            let sum = operand_l.wrapping_add(operand_r).wrapping_add(extend.into());
            let (sm, dm, rm) = (operand_l.sign_bit(), operand_r.sign_bit(), sum.sign_bit());

            (sum, add_carry(sm, dm, rm), add_overflow(sm, dm, rm))
        }
    };
}

impl_add_fn!(add_bytes, u8);
impl_add_fn!(add_words, u16);
impl_add_fn!(add_long_words, u32);

macro_rules! impl_sub_fn {
    ($name:ident, $t:ty) => {
        /// Computes `operand_r - operand_l - extend`.
        #[inline]
        pub(super) fn $name(operand_l: $t, operand_r: $t, extend: bool) -> ($t, bool, bool) {
            let difference = operand_r.wrapping_sub(operand_l).wrapping_sub(extend.into());
            let (sm, dm, rm) = (operand_l.sign_bit(), operand_r.sign_bit(), difference.sign_bit());

            (difference, sub_carry(sm, dm, rm), sub_overflow(sm, dm, rm))
        }
    };
}

impl_sub_fn!(sub_bytes, u8);
impl_sub_fn!(sub_words, u16);
impl_sub_fn!(sub_long_words, u32);

/// Adds `source + dest + extend` at the width of the operands.
pub(super) fn add(source: SizedValue, dest: SizedValue, extend: bool) -> (SizedValue, bool, bool) {
    match (source, dest) {
        (SizedValue::Byte(source), SizedValue::Byte(dest)) => {
            let (sum, carry, overflow) = add_bytes(source, dest, extend);
            (sum.into(), carry, overflow)
        }
        (SizedValue::Word(source), SizedValue::Word(dest)) => {
            let (sum, carry, overflow) = add_words(source, dest, extend);
            (sum.into(), carry, overflow)
        }
        (source, dest) => {
            let (sum, carry, overflow) = add_long_words(source.into(), dest.into(), extend);
            (sum.into(), carry, overflow)
        }
    }
}

/// Computes `dest - source - extend` at the width of the operands.
pub(super) fn subtract(
    source: SizedValue,
    dest: SizedValue,
    extend: bool,
) -> (SizedValue, bool, bool) {
    match (source, dest) {
        (SizedValue::Byte(source), SizedValue::Byte(dest)) => {
            let (difference, carry, overflow) = sub_bytes(source, dest, extend);
            (difference.into(), carry, overflow)
        }
        (SizedValue::Word(source), SizedValue::Word(dest)) => {
            let (difference, carry, overflow) = sub_words(source, dest, extend);
            (difference.into(), carry, overflow)
        }
        (source, dest) => {
            let (difference, carry, overflow) =
                sub_long_words(source.into(), dest.into(), extend);
            (difference.into(), carry, overflow)
        }
    }
}

impl ConditionCodes {
    /// ADD/SUB/NEG family: all five flags, X follows C.
    pub(super) fn arithmetic(result: SizedValue, carry: bool, overflow: bool) -> Self {
        Self {
            carry,
            overflow,
            zero: result.is_zero(),
            negative: result.sign_bit(),
            extend: carry,
        }
    }

    /// ADDX/SUBX/NEGX family: Z can only be cleared, so multi-precision chains test zero
    /// across every word.
    pub(super) fn extended(self, result: SizedValue, carry: bool, overflow: bool) -> Self {
        Self {
            carry,
            overflow,
            zero: self.zero && result.is_zero(),
            negative: result.sign_bit(),
            extend: carry,
        }
    }

    /// CMP family: like subtraction but X is untouched.
    pub(super) fn compare(self, result: SizedValue, carry: bool, overflow: bool) -> Self {
        Self {
            carry,
            overflow,
            zero: result.is_zero(),
            negative: result.sign_bit(),
            extend: self.extend,
        }
    }

    /// Logical family: N and Z from the result, V and C cleared, X untouched.
    pub(super) fn logical(self, result: SizedValue) -> Self {
        Self {
            carry: false,
            overflow: false,
            zero: result.is_zero(),
            negative: result.sign_bit(),
            extend: self.extend,
        }
    }
}

/// Packed BCD addition of `source + dest + extend`. Returns the corrected byte, the decimal
/// carry, and the overflow flag of the correction step.
pub(super) fn decimal_add(source: u8, dest: u8, extend: bool) -> (u8, bool, bool) {
    let extend = u8::from(extend);

    let binary_sum = source.wrapping_add(dest).wrapping_add(extend);
    let binary_carry = u16::from(source) + u16::from(dest) + u16::from(extend) > 0xFF;

    let mut correction = 0;
    if (source & 0x0F) + (dest & 0x0F) + extend > 0x09 {
        correction |= 0x06;
    }

    let carry = binary_carry || binary_sum > 0x99;
    if carry {
        correction |= 0x60;
    }

    let corrected = binary_sum.wrapping_add(correction);

    // V reflects an unsigned-to-signed transition caused by the correction
    let overflow = !binary_sum.sign_bit() && corrected.sign_bit();

    (corrected, carry, overflow)
}

/// Packed BCD subtraction of `dest - source - extend`.
pub(super) fn decimal_subtract(source: u8, dest: u8, extend: bool) -> (u8, bool, bool) {
    let extend = u8::from(extend);

    let binary_difference = dest.wrapping_sub(source).wrapping_sub(extend);
    let binary_borrow = u16::from(source) + u16::from(extend) > u16::from(dest);

    let mut correction = 0;
    if (dest & 0x0F) < (source & 0x0F) + extend {
        correction |= 0x06;
    }

    if binary_borrow {
        correction |= 0x60;
    }

    let corrected = binary_difference.wrapping_sub(correction);
    let borrow = binary_borrow || (correction & 0x06 != 0 && binary_difference < 0x06);

    let overflow = binary_difference.sign_bit() && !corrected.sign_bit();

    (corrected, borrow, overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    const SAMPLES: [u32; 12] = [
        0x0000_0000,
        0x0000_0001,
        0x0000_007F,
        0x0000_0080,
        0x0000_00FF,
        0x0000_7FFF,
        0x0000_8000,
        0x0000_FFFF,
        0x7FFF_FFFF,
        0x8000_0000,
        0xFFFF_FFFF,
        0x1234_5678,
    ];

    #[test]
    fn add_flags_match_widened_arithmetic() {
        for &a in &SAMPLES {
            for &b in &SAMPLES {
                for extend in [false, true] {
                    let (sum, carry, overflow) = add_long_words(a, b, extend);
                    let wide = u64::from(a) + u64::from(b) + u64::from(extend);
                    let signed =
                        i64::from(a as i32) + i64::from(b as i32) + i64::from(extend);

                    assert_eq!(sum, wide as u32);
                    assert_eq!(carry, wide > u64::from(u32::MAX), "{a:08X} + {b:08X}");
                    assert_eq!(
                        overflow,
                        signed != i64::from(signed as i32),
                        "{a:08X} + {b:08X}"
                    );

                    let (a, b) = (a as u16, b as u16);
                    let (sum, carry, overflow) = add_words(a, b, extend);
                    let wide = u32::from(a) + u32::from(b) + u32::from(extend);
                    let signed =
                        i32::from(a as i16) + i32::from(b as i16) + i32::from(extend);

                    assert_eq!(sum, wide as u16);
                    assert_eq!(carry, wide > u32::from(u16::MAX));
                    assert_eq!(overflow, signed != i32::from(signed as i16));
                }
            }
        }
    }

    #[test]
    fn sub_flags_match_widened_arithmetic() {
        for &a in &SAMPLES {
            for &b in &SAMPLES {
                for extend in [false, true] {
                    // b - a - extend
                    let (difference, carry, overflow) = sub_long_words(a, b, extend);
                    let signed =
                        i64::from(b as i32) - i64::from(a as i32) - i64::from(extend);

                    assert_eq!(difference, b.wrapping_sub(a).wrapping_sub(extend.into()));
                    assert_eq!(
                        carry,
                        u64::from(a) + u64::from(extend) > u64::from(b),
                        "{b:08X} - {a:08X}"
                    );
                    assert_eq!(overflow, signed != i64::from(signed as i32));

                    let (a, b) = (a as u16, b as u16);
                    let (difference, carry, overflow) = sub_words(a, b, extend);
                    let signed = i32::from(b as i16) - i32::from(a as i16) - i32::from(extend);

                    assert_eq!(difference, b.wrapping_sub(a).wrapping_sub(extend.into()));
                    assert_eq!(carry, u32::from(a) + u32::from(extend) > u32::from(b));
                    assert_eq!(overflow, signed != i32::from(signed as i16), "{b:04X} - {a:04X}");
                }
            }
        }
    }

    #[test]
    fn byte_flags_match_widened_arithmetic() {
        for a in 0..=u8::MAX {
            for b in 0..=u8::MAX {
                for extend in [false, true] {
                    let (sum, carry, overflow) = add_bytes(a, b, extend);
                    let wide = u16::from(a) + u16::from(b) + u16::from(extend);
                    let signed = i16::from(a as i8) + i16::from(b as i8) + i16::from(extend);

                    assert_eq!(sum, wide as u8);
                    assert_eq!(carry, wide > u16::from(u8::MAX), "{a:02X} + {b:02X}");
                    assert_eq!(overflow, signed != i16::from(signed as i8), "{a:02X} + {b:02X}");

                    let (difference, carry, overflow) = sub_bytes(a, b, extend);
                    let signed = i16::from(b as i8) - i16::from(a as i8) - i16::from(extend);

                    assert_eq!(difference, b.wrapping_sub(a).wrapping_sub(extend.into()));
                    assert_eq!(carry, u16::from(a) + u16::from(extend) > u16::from(b));
                    assert_eq!(overflow, signed != i16::from(signed as i8), "{b:02X} - {a:02X}");
                }
            }
        }
    }

    #[test]
    fn extended_ops_only_clear_zero() {
        let ccr = ConditionCodes { zero: true, ..ConditionCodes::default() };
        let ccr = ccr.extended(SizedValue::Word(0), false, false);
        assert!(ccr.zero);

        let ccr = ccr.extended(SizedValue::Word(1), false, false);
        assert!(!ccr.zero);

        let ccr = ccr.extended(SizedValue::Word(0), false, false);
        assert!(!ccr.zero);
    }

    fn bcd_to_binary(value: u8) -> u8 {
        (value >> 4) * 10 + (value & 0x0F)
    }

    fn binary_to_bcd(value: u8) -> u8 {
        ((value / 10) << 4) | (value % 10)
    }

    #[test]
    fn decimal_add_valid_bcd() {
        for a in 0..100 {
            for b in 0..100 {
                for extend in [false, true] {
                    let (result, carry, _) =
                        decimal_add(binary_to_bcd(a), binary_to_bcd(b), extend);
                    let expected = a + b + u8::from(extend);

                    assert_eq!(bcd_to_binary(result), expected % 100, "{a} + {b} + {extend}");
                    assert_eq!(carry, expected >= 100, "{a} + {b} + {extend}");
                }
            }
        }
    }

    #[test]
    fn decimal_subtract_valid_bcd() {
        for a in 0..100_i16 {
            for b in 0..100_i16 {
                for extend in [false, true] {
                    let (result, borrow, _) =
                        decimal_subtract(binary_to_bcd(a as u8), binary_to_bcd(b as u8), extend);
                    let expected = b - a - i16::from(extend);

                    assert_eq!(
                        i16::from(bcd_to_binary(result)),
                        expected.rem_euclid(100),
                        "{b} - {a} - {extend}"
                    );
                    assert_eq!(borrow, expected < 0, "{b} - {a} - {extend}");
                }
            }
        }
    }

    #[test]
    fn decimal_add_single_digit_carry() {
        assert_eq!(decimal_add(0x01, 0x09, false), (0x10, false, false));
        assert_eq!(decimal_add(0x01, 0x99, false), (0x00, true, false));
    }
}
