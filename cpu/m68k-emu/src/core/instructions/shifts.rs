//! ASd, LSd, ROd and ROXd in their register and memory forms.
//!
//! Memory forms always operate on one word and shift by exactly one bit.

use crate::core::instructions::{ShiftCount, ShiftDirection};
use crate::core::{
    AddressingMode, ConditionCodes, DataRegister, ExecuteResult, InstructionExecutor, OpSize,
    SizedValue,
};
use crate::num::SignBit;
use crate::traits::BusInterface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShiftKind {
    Arithmetic,
    Logical,
    Rotate,
    RotateThruExtend,
}

#[derive(Debug, Clone, Copy)]
struct ShiftOutput {
    value: u32,
    carry: bool,
    overflow: bool,
    extend: bool,
}

fn size_masks(size: OpSize) -> (u32, u32) {
    match size {
        OpSize::Byte => (0xFF, 0x80),
        OpSize::Word => (0xFFFF, 0x8000),
        OpSize::LongWord => (0xFFFF_FFFF, 0x8000_0000),
    }
}

fn shift(
    kind: ShiftKind,
    direction: ShiftDirection,
    size: OpSize,
    value: u32,
    count: u32,
    extend: bool,
) -> ShiftOutput {
    let (mask, msb) = size_masks(size);

    let mut value = value & mask;
    let mut carry = false;
    let mut overflow = false;
    let mut extend = extend;

    // Counts never exceed 63, so one bit per iteration is cheap enough
    for _ in 0..count {
        let shifted_out = match direction {
            ShiftDirection::Left => value & msb != 0,
            ShiftDirection::Right => value & 1 != 0,
        };

        value = match (kind, direction) {
            (ShiftKind::Arithmetic | ShiftKind::Logical, ShiftDirection::Left) => {
                (value << 1) & mask
            }
            (ShiftKind::Arithmetic, ShiftDirection::Right) => (value >> 1) | (value & msb),
            (ShiftKind::Logical, ShiftDirection::Right) => value >> 1,
            (ShiftKind::Rotate, ShiftDirection::Left) => {
                ((value << 1) & mask) | u32::from(shifted_out)
            }
            (ShiftKind::Rotate, ShiftDirection::Right) => {
                (value >> 1) | if shifted_out { msb } else { 0 }
            }
            (ShiftKind::RotateThruExtend, ShiftDirection::Left) => {
                ((value << 1) & mask) | u32::from(extend)
            }
            (ShiftKind::RotateThruExtend, ShiftDirection::Right) => {
                (value >> 1) | if extend { msb } else { 0 }
            }
        };

        // ASL sets V if the sign bit changes at any point during the shift
        if kind == ShiftKind::Arithmetic
            && direction == ShiftDirection::Left
            && shifted_out != (value & msb != 0)
        {
            overflow = true;
        }

        carry = shifted_out;
        if kind != ShiftKind::Rotate {
            extend = shifted_out;
        }
    }

    // A zero count clears C, except ROXd which copies X into C
    if count == 0 && kind == ShiftKind::RotateThruExtend {
        carry = extend;
    }

    ShiftOutput { value, carry, overflow, extend }
}

macro_rules! impl_shift_methods {
    ($register_name:ident, $memory_name:ident, $kind:expr) => {
        pub(super) fn $register_name(
            &mut self,
            size: OpSize,
            direction: ShiftDirection,
            register: DataRegister,
            count: ShiftCount,
        ) {
            let count = count.get(self.registers);
            let value = register.read_from(self.registers);

            let output = shift($kind, direction, size, value, count, self.registers.ccr.extend);
            let result = SizedValue::from_size(output.value, size);
            register.write_to(self.registers, result);

            self.set_shift_flags(result, output);
        }

        pub(super) fn $memory_name(
            &mut self,
            direction: ShiftDirection,
            dest: AddressingMode,
        ) -> ExecuteResult<()> {
            let dest_resolved = self.resolve_address_with_post(dest, OpSize::Word)?;
            let value = self.read_word_resolved(dest_resolved)?;

            let output =
                shift($kind, direction, OpSize::Word, value.into(), 1, self.registers.ccr.extend);
            let result = SizedValue::Word(output.value as u16);

            self.set_shift_flags(result, output);

            self.write_resolved(dest_resolved, result)
        }
    };
}

impl<B: BusInterface> InstructionExecutor<'_, '_, B> {
    fn set_shift_flags(&mut self, result: SizedValue, output: ShiftOutput) {
        self.registers.ccr = ConditionCodes {
            carry: output.carry,
            overflow: output.overflow,
            zero: result.is_zero(),
            negative: result.sign_bit(),
            extend: output.extend,
        };
    }

    impl_shift_methods!(asd_register, asd_memory, ShiftKind::Arithmetic);
    impl_shift_methods!(lsd_register, lsd_memory, ShiftKind::Logical);
    impl_shift_methods!(rod_register, rod_memory, ShiftKind::Rotate);
    impl_shift_methods!(roxd_register, roxd_memory, ShiftKind::RotateThruExtend);
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn asl_overflow_on_any_sign_change() {
        // 0x40 -> 0x80 -> 0x00: sign changes on the first step
        let output =
            shift(ShiftKind::Arithmetic, ShiftDirection::Left, OpSize::Byte, 0x40, 2, false);
        assert_eq!(output.value, 0x00);
        assert!(output.overflow);
        assert!(output.carry);
        assert!(output.extend);

        let output = shift(ShiftKind::Logical, ShiftDirection::Left, OpSize::Byte, 0x40, 2, false);
        assert!(!output.overflow);
    }

    #[test]
    fn asr_preserves_sign() {
        let output =
            shift(ShiftKind::Arithmetic, ShiftDirection::Right, OpSize::Word, 0x8001, 4, false);
        assert_eq!(output.value, 0xF800);
        assert!(!output.carry);

        let output =
            shift(ShiftKind::Arithmetic, ShiftDirection::Right, OpSize::Word, 0x8008, 4, false);
        assert!(output.carry);
    }

    #[test]
    fn zero_count_keeps_extend() {
        let output = shift(ShiftKind::Logical, ShiftDirection::Left, OpSize::LongWord, 1, 0, true);
        assert_eq!(output.value, 1);
        assert!(!output.carry);
        assert!(output.extend);

        let output =
            shift(ShiftKind::RotateThruExtend, ShiftDirection::Left, OpSize::LongWord, 1, 0, true);
        assert!(output.carry);
        assert!(output.extend);
    }

    #[test]
    fn rotate_leaves_extend_alone() {
        let output = shift(ShiftKind::Rotate, ShiftDirection::Right, OpSize::Byte, 0x01, 1, false);
        assert_eq!(output.value, 0x80);
        assert!(output.carry);
        assert!(!output.extend);
    }

    #[test]
    fn roxl_rotates_through_extend() {
        // 9-bit rotation: X=1, value=0x80 -> value=0x01, X=1
        let output =
            shift(ShiftKind::RotateThruExtend, ShiftDirection::Left, OpSize::Byte, 0x80, 1, true);
        assert_eq!(output.value, 0x01);
        assert!(output.carry);
        assert!(output.extend);

        // Nine rotations return the original value and X
        let output =
            shift(ShiftKind::RotateThruExtend, ShiftDirection::Left, OpSize::Byte, 0x5A, 9, true);
        assert_eq!(output.value, 0x5A);
        assert!(output.extend);
    }

    #[test]
    fn long_shift_past_width_clears() {
        let output = shift(
            ShiftKind::Logical,
            ShiftDirection::Right,
            OpSize::LongWord,
            0xFFFF_FFFF,
            40,
            false,
        );
        assert_eq!(output.value, 0);
        assert!(!output.carry);
    }
}
