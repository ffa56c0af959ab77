use crate::core::flags;
use crate::core::{
    AddressRegister, AddressingMode, ConditionCodes, DataRegister, Exception, ExecuteResult,
    InstructionExecutor, OpSize, SizedValue,
};
use crate::num::{GetBit, SignBit};
use crate::traits::BusInterface;

macro_rules! impl_extend_op_method {
    ($name:ident, $op_fn:path) => {
        fn $name(
            &mut self,
            size: OpSize,
            source: AddressingMode,
            dest: AddressingMode,
        ) -> ExecuteResult<()> {
            let operand_r = self.read(source, size)?;

            let dest_resolved = self.resolve_address_with_post(dest, size)?;
            let operand_l = self.read_resolved(dest_resolved, size)?;

            let extend = self.registers.ccr.extend;
            let (result, carry, overflow) = $op_fn(operand_r, operand_l, extend);
            self.registers.ccr = self.registers.ccr.extended(result, carry, overflow);

            self.write_resolved(dest_resolved, result)
        }
    };
}

macro_rules! impl_op_method {
    ($name:ident, $aname:ident, $xname:ident, $op_fn:path) => {
        pub(super) fn $name(
            &mut self,
            size: OpSize,
            source: AddressingMode,
            dest: AddressingMode,
            with_extend: bool,
        ) -> ExecuteResult<()> {
            if with_extend {
                return self.$xname(size, source, dest);
            }

            if let AddressingMode::AddressDirect(register) = dest {
                return self.$aname(size, source, register);
            }

            let operand_r = self.read(source, size)?;

            let dest_resolved = self.resolve_address_with_post(dest, size)?;
            let operand_l = self.read_resolved(dest_resolved, size)?;

            let (result, carry, overflow) = $op_fn(operand_r, operand_l, false);
            self.registers.ccr = ConditionCodes::arithmetic(result, carry, overflow);

            self.write_resolved(dest_resolved, result)
        }
    };
}

impl<B: BusInterface> InstructionExecutor<'_, '_, B> {
    // ADDA/SUBA/CMPA and the quick forms targeting An: word sources are sign extended and the
    // whole register participates
    fn read_address_operand(&mut self, size: OpSize, source: AddressingMode) -> ExecuteResult<u32> {
        let value = match size {
            OpSize::Byte => self.read_byte(source)? as i8 as u32,
            OpSize::Word => self.read_word(source)? as i16 as u32,
            OpSize::LongWord => self.read_long_word(source)?,
        };
        Ok(value)
    }

    fn adda(
        &mut self,
        size: OpSize,
        source: AddressingMode,
        dest: AddressRegister,
    ) -> ExecuteResult<()> {
        let operand_r = self.read_address_operand(size, source)?;
        let operand_l = dest.read_from(self.registers);

        dest.write_long_word_to(self.registers, operand_l.wrapping_add(operand_r));

        Ok(())
    }

    impl_extend_op_method!(addx, flags::add);
    impl_op_method!(add, adda, addx, flags::add);

    fn suba(
        &mut self,
        size: OpSize,
        source: AddressingMode,
        dest: AddressRegister,
    ) -> ExecuteResult<()> {
        let operand_r = self.read_address_operand(size, source)?;
        let operand_l = dest.read_from(self.registers);

        dest.write_long_word_to(self.registers, operand_l.wrapping_sub(operand_r));

        Ok(())
    }

    impl_extend_op_method!(subx, flags::subtract);
    impl_op_method!(sub, suba, subx, flags::subtract);

    pub(super) fn neg(
        &mut self,
        size: OpSize,
        dest: AddressingMode,
        with_extend: bool,
    ) -> ExecuteResult<()> {
        let dest_resolved = self.resolve_address_with_post(dest, size)?;
        let operand = self.read_resolved(dest_resolved, size)?;
        let zero = SizedValue::from_size(0, size);

        if with_extend {
            let extend = self.registers.ccr.extend;
            let (result, carry, overflow) = flags::subtract(operand, zero, extend);
            self.registers.ccr = self.registers.ccr.extended(result, carry, overflow);
            self.write_resolved(dest_resolved, result)
        } else {
            let (result, carry, overflow) = flags::subtract(operand, zero, false);
            self.registers.ccr = ConditionCodes::arithmetic(result, carry, overflow);
            self.write_resolved(dest_resolved, result)
        }
    }

    pub(super) fn cmp(
        &mut self,
        size: OpSize,
        source: AddressingMode,
        dest: AddressingMode,
    ) -> ExecuteResult<()> {
        if let AddressingMode::AddressDirect(dest) = dest {
            return self.cmpa(size, source, dest);
        }

        // CMPM reads (Ay)+ before (Ax)+
        let source_operand = self.read(source, size)?;
        let dest_operand = self.read(dest, size)?;

        let (result, carry, overflow) = flags::subtract(source_operand, dest_operand, false);
        self.registers.ccr = self.registers.ccr.compare(result, carry, overflow);

        Ok(())
    }

    fn cmpa(
        &mut self,
        size: OpSize,
        source: AddressingMode,
        dest: AddressRegister,
    ) -> ExecuteResult<()> {
        let source_operand = self.read_address_operand(size, source)?;
        let dest_operand = dest.read_from(self.registers);

        let (result, carry, overflow) =
            flags::subtract(source_operand.into(), dest_operand.into(), false);
        self.registers.ccr = self.registers.ccr.compare(result, carry, overflow);

        Ok(())
    }

    pub(super) fn muls(
        &mut self,
        register: DataRegister,
        source: AddressingMode,
    ) -> ExecuteResult<()> {
        let operand_l = self.read_word(source)? as i16;
        let operand_r = register.read_from(self.registers) as i16;

        let value = (i32::from(operand_l) * i32::from(operand_r)) as u32;
        register.write_long_word_to(self.registers, value);

        self.registers.ccr = ConditionCodes {
            carry: false,
            overflow: false,
            zero: value == 0,
            negative: value.sign_bit(),
            ..self.registers.ccr
        };

        Ok(())
    }

    pub(super) fn mulu(
        &mut self,
        register: DataRegister,
        source: AddressingMode,
    ) -> ExecuteResult<()> {
        let operand_l = self.read_word(source)?;
        let operand_r = register.read_from(self.registers) as u16;

        let value = u32::from(operand_l) * u32::from(operand_r);
        register.write_long_word_to(self.registers, value);

        self.registers.ccr = ConditionCodes {
            carry: false,
            overflow: false,
            zero: value == 0,
            negative: value.sign_bit(),
            ..self.registers.ccr
        };

        Ok(())
    }

    pub(super) fn divs(
        &mut self,
        register: DataRegister,
        source: AddressingMode,
    ) -> ExecuteResult<()> {
        let divisor = i64::from(self.read_word(source)? as i16);
        let dividend = i64::from(register.read_from(self.registers) as i32);

        if divisor == 0 {
            self.registers.ccr.carry = false;
            return Err(Exception::DivisionByZero);
        }

        let quotient = dividend / divisor;
        let remainder = dividend % divisor;

        if quotient > i16::MAX.into() || quotient < i16::MIN.into() {
            // Destination register is left untouched on overflow
            self.registers.ccr =
                ConditionCodes { carry: false, overflow: true, ..self.registers.ccr };
            return Ok(());
        }

        let quotient = quotient as u16;
        let value = (u32::from(remainder as u16) << 16) | u32::from(quotient);
        register.write_long_word_to(self.registers, value);

        self.registers.ccr = ConditionCodes {
            carry: false,
            overflow: false,
            zero: quotient == 0,
            negative: quotient.sign_bit(),
            ..self.registers.ccr
        };

        Ok(())
    }

    pub(super) fn divu(
        &mut self,
        register: DataRegister,
        source: AddressingMode,
    ) -> ExecuteResult<()> {
        let divisor: u32 = self.read_word(source)?.into();
        let dividend = register.read_from(self.registers);

        if divisor == 0 {
            self.registers.ccr.carry = false;
            return Err(Exception::DivisionByZero);
        }

        let quotient = dividend / divisor;
        let remainder = dividend % divisor;

        if quotient > u16::MAX.into() {
            self.registers.ccr =
                ConditionCodes { carry: false, overflow: true, ..self.registers.ccr };
            return Ok(());
        }

        let value = (remainder << 16) | quotient;
        register.write_long_word_to(self.registers, value);

        self.registers.ccr = ConditionCodes {
            carry: false,
            overflow: false,
            zero: quotient == 0,
            negative: quotient.bit(15),
            ..self.registers.ccr
        };

        Ok(())
    }

    fn set_decimal_flags(&mut self, result: u8, carry: bool, overflow: bool) {
        self.registers.ccr = ConditionCodes {
            carry,
            overflow,
            zero: self.registers.ccr.zero && result == 0,
            negative: result.sign_bit(),
            extend: carry,
        };
    }

    pub(super) fn abcd(
        &mut self,
        source: AddressingMode,
        dest: AddressingMode,
    ) -> ExecuteResult<()> {
        let operand_r = self.read_byte(source)?;

        let dest_resolved = self.resolve_address_with_post(dest, OpSize::Byte)?;
        let operand_l = self.read_byte_resolved(dest_resolved);

        let (sum, carry, overflow) =
            flags::decimal_add(operand_r, operand_l, self.registers.ccr.extend);
        self.set_decimal_flags(sum, carry, overflow);

        self.write_byte_resolved(dest_resolved, sum)
    }

    pub(super) fn sbcd(
        &mut self,
        source: AddressingMode,
        dest: AddressingMode,
    ) -> ExecuteResult<()> {
        let operand_r = self.read_byte(source)?;

        let dest_resolved = self.resolve_address_with_post(dest, OpSize::Byte)?;
        let operand_l = self.read_byte_resolved(dest_resolved);

        let (difference, borrow, overflow) =
            flags::decimal_subtract(operand_r, operand_l, self.registers.ccr.extend);
        self.set_decimal_flags(difference, borrow, overflow);

        self.write_byte_resolved(dest_resolved, difference)
    }

    pub(super) fn nbcd(&mut self, dest: AddressingMode) -> ExecuteResult<()> {
        let dest_resolved = self.resolve_address_with_post(dest, OpSize::Byte)?;
        let operand = self.read_byte_resolved(dest_resolved);

        let (difference, borrow, overflow) =
            flags::decimal_subtract(operand, 0, self.registers.ccr.extend);
        self.set_decimal_flags(difference, borrow, overflow);

        self.write_byte_resolved(dest_resolved, difference)
    }

    pub(super) fn chk(
        &mut self,
        register: DataRegister,
        source: AddressingMode,
    ) -> ExecuteResult<()> {
        let upper_bound = self.read_word(source)? as i16;
        let value = register.read_from(self.registers) as i16;

        self.registers.ccr =
            ConditionCodes { carry: false, overflow: false, zero: false, ..self.registers.ccr };

        if value < 0 {
            self.registers.ccr.negative = true;
            Err(Exception::CheckRegister)
        } else if value > upper_bound {
            self.registers.ccr.negative = false;
            Err(Exception::CheckRegister)
        } else {
            Ok(())
        }
    }
}
