use std::ops::RangeInclusive;

/// Single-bit tests on the operand widths the CPU works with.
pub(crate) trait GetBit: Copy + Into<u32> {
    const WIDTH: u8;

    #[inline]
    fn bit(self, i: u8) -> bool {
        debug_assert!(i < Self::WIDTH);
        (self.into() >> i) & 1 != 0
    }
}

impl GetBit for u8 {
    const WIDTH: u8 = 8;
}

impl GetBit for u16 {
    const WIDTH: u8 = 16;
}

impl GetBit for u32 {
    const WIDTH: u8 = 32;
}

pub(crate) trait SignBit: Copy {
    fn sign_bit(self) -> bool;
}

impl<T: GetBit> SignBit for T {
    #[inline]
    fn sign_bit(self) -> bool {
        self.bit(T::WIDTH - 1)
    }
}

/// Field extraction from opcode and extension words.
pub(crate) trait WordField {
    fn bits(self, range: RangeInclusive<u8>) -> u16;
}

impl WordField for u16 {
    #[inline]
    fn bits(self, range: RangeInclusive<u8>) -> u16 {
        let (start, end) = range.into_inner();
        debug_assert!(start <= end && end < 16);

        (self >> start) & (u16::MAX >> (15 - (end - start)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn word_fields() {
        assert_eq!(0x8801_u16.bits(0..=11), 0x801);
        assert_eq!(0x9000_u16.bits(12..=14), 1);
        assert_eq!(0xFFFF_u16.bits(0..=15), 0xFFFF);
        assert!(0x8000_u16.sign_bit());
        assert!(!0x7F_u8.sign_bit());
        assert!(0x8000_0000_u32.bit(31));
    }
}
