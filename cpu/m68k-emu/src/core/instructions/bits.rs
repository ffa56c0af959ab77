use crate::core::instructions::BranchCondition;
use crate::core::{
    AddressingMode, DataRegister, ExecuteResult, InstructionExecutor, OpSize, SizedValue,
};
use crate::num::GetBit;
use crate::traits::BusInterface;

macro_rules! impl_bit_op {
    ($name:ident, $operator:tt) => {
        pub(super) fn $name(
            &mut self,
            size: OpSize,
            source: AddressingMode,
            dest: AddressingMode,
        ) -> ExecuteResult<()> {
            let operand_l = self.read(source, size)?;

            let dest_resolved = self.resolve_address_with_post(dest, size)?;
            let operand_r = self.read_resolved(dest_resolved, size)?;

            let value = u32::from(operand_l) $operator u32::from(operand_r);
            let value = SizedValue::from_size(value, size);

            self.registers.ccr = self.registers.ccr.logical(value);

            self.write_resolved(dest_resolved, value)
        }
    };
}

macro_rules! impl_bit_op_to_ccr {
    ($name:ident, $operator:tt) => {
        pub(super) fn $name(&mut self) -> ExecuteResult<()> {
            let byte = self.read_byte(AddressingMode::Immediate)?;
            let value = byte $operator u8::from(self.registers.ccr);
            self.registers.ccr = value.into();

            Ok(())
        }
    };
}

macro_rules! impl_bit_op_to_sr {
    ($name:ident, $operator:tt) => {
        pub(super) fn $name(&mut self) -> ExecuteResult<()> {
            self.require_supervisor()?;

            let word = self.read_word(AddressingMode::Immediate)?;
            let value = word $operator self.registers.status_register();
            self.registers.set_status_register(value);

            Ok(())
        }
    };
}

macro_rules! impl_bit_test_op {
    ($name:ident $(, |$value:ident, $bit:ident| $body:block)?) => {
        pub(super) fn $name(
            &mut self,
            source: AddressingMode,
            dest: AddressingMode,
        ) -> ExecuteResult<()> {
            let bit_index = self.read_byte(source)?;

            match dest {
                AddressingMode::DataDirect(register) => {
                    let value = register.read_from(self.registers);
                    let bit = bit_index % 32;
                    self.registers.ccr.zero = !value.bit(bit);
                    $(
                        let $value = value;
                        let $bit = bit;
                        let value = $body;
                        register.write_long_word_to(self.registers, value);
                    )?
                }
                _ => {
                    let dest_resolved = self.resolve_address_with_post(dest, OpSize::Byte)?;
                    let value = self.read_byte_resolved(dest_resolved);
                    let bit = bit_index % 8;
                    self.registers.ccr.zero = !value.bit(bit);
                    $(
                        let $value = value;
                        let $bit = bit;
                        let value = $body;
                        self.write_byte_resolved(dest_resolved, value)?;
                    )?
                }
            }

            Ok(())
        }
    };
}

impl<B: BusInterface> InstructionExecutor<'_, '_, B> {
    impl_bit_op!(and, &);
    impl_bit_op!(or, |);
    impl_bit_op!(eor, ^);

    impl_bit_op_to_ccr!(andi_to_ccr, &);
    impl_bit_op_to_ccr!(ori_to_ccr, |);
    impl_bit_op_to_ccr!(eori_to_ccr, ^);

    impl_bit_op_to_sr!(andi_to_sr, &);
    impl_bit_op_to_sr!(ori_to_sr, |);
    impl_bit_op_to_sr!(eori_to_sr, ^);

    impl_bit_test_op!(btst);
    impl_bit_test_op!(bclr, |value, bit| { value & !(1 << bit) });
    impl_bit_test_op!(bset, |value, bit| { value | (1 << bit) });
    impl_bit_test_op!(bchg, |value, bit| { value ^ (1 << bit) });

    pub(super) fn not(&mut self, size: OpSize, dest: AddressingMode) -> ExecuteResult<()> {
        let dest_resolved = self.resolve_address_with_post(dest, size)?;
        let value: u32 = self.read_resolved(dest_resolved, size)?.into();
        let negated = SizedValue::from_size(!value, size);

        self.registers.ccr = self.registers.ccr.logical(negated);

        self.write_resolved(dest_resolved, negated)
    }

    pub(super) fn clr(&mut self, size: OpSize, dest: AddressingMode) -> ExecuteResult<()> {
        let dest_resolved = self.resolve_address_with_post(dest, size)?;

        let cleared = SizedValue::from_size(0, size);
        self.registers.ccr = self.registers.ccr.logical(cleared);

        self.write_resolved(dest_resolved, cleared)
    }

    pub(super) fn ext(&mut self, size: OpSize, register: DataRegister) {
        let value = register.read_from(self.registers);
        let extended = match size {
            OpSize::LongWord => SizedValue::LongWord(value as u16 as i16 as u32),
            OpSize::Word | OpSize::Byte => SizedValue::Word(value as u8 as i8 as u16),
        };
        register.write_to(self.registers, extended);

        self.registers.ccr = self.registers.ccr.logical(extended);
    }

    pub(super) fn swap(&mut self, register: DataRegister) {
        let value = register.read_from(self.registers).rotate_left(16);
        register.write_long_word_to(self.registers, value);

        self.registers.ccr = self.registers.ccr.logical(value.into());
    }

    pub(super) fn tst(&mut self, size: OpSize, source: AddressingMode) -> ExecuteResult<()> {
        let value = self.read(source, size)?;
        self.registers.ccr = self.registers.ccr.logical(value);

        Ok(())
    }

    pub(super) fn tas(&mut self, dest: AddressingMode) -> ExecuteResult<()> {
        let dest_resolved = self.resolve_address_with_post(dest, OpSize::Byte)?;
        let value = self.read_byte_resolved(dest_resolved);

        self.registers.ccr = self.registers.ccr.logical(value.into());

        self.write_byte_resolved(dest_resolved, value | 0x80)
    }

    pub(super) fn scc(
        &mut self,
        condition: BranchCondition,
        dest: AddressingMode,
    ) -> ExecuteResult<()> {
        let value = if condition.check(self.registers.ccr) { 0xFF } else { 0x00 };
        self.write(dest, SizedValue::Byte(value))
    }
}
