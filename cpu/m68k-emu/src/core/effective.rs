//! Bus access and effective address resolution.

use crate::config::AlignmentPolicy;
use crate::core::{
    AddressingMode, BusOpType, Exception, ExecuteResult, InstructionExecutor, OpSize,
    ResolvedAddress, SizedValue, parse_index,
};
use crate::traits::BusInterface;

impl<B: BusInterface> InstructionExecutor<'_, '_, B> {
    fn mask_address(&self, address: u32) -> u32 {
        address & self.config.model.address_mask()
    }

    pub(super) fn check_alignment(&self, address: u32, op_type: BusOpType) -> ExecuteResult<()> {
        if self.config.alignment == AlignmentPolicy::AddressError && address % 2 != 0 {
            return Err(Exception::AddressError(address, op_type));
        }

        Ok(())
    }

    pub(super) fn read_bus_byte(&mut self, address: u32) -> u8 {
        let address = self.mask_address(address);
        self.bus.read_byte(address)
    }

    pub(super) fn write_bus_byte(&mut self, address: u32, value: u8) {
        let address = self.mask_address(address);
        self.bus.write_byte(address, value);
    }

    pub(super) fn read_bus_word(&mut self, address: u32) -> ExecuteResult<u16> {
        self.check_alignment(address, BusOpType::Read)?;

        let address = self.mask_address(address);
        Ok(self.bus.read_word(address))
    }

    pub(super) fn write_bus_word(&mut self, address: u32, value: u16) -> ExecuteResult<()> {
        self.check_alignment(address, BusOpType::Write)?;

        let address = self.mask_address(address);
        self.bus.write_word(address, value);

        Ok(())
    }

    pub(super) fn read_bus_long_word(&mut self, address: u32) -> ExecuteResult<u32> {
        self.check_alignment(address, BusOpType::Read)?;

        let address = self.mask_address(address);
        Ok(self.bus.read_long_word(address))
    }

    pub(super) fn write_bus_long_word(&mut self, address: u32, value: u32) -> ExecuteResult<()> {
        self.check_alignment(address, BusOpType::Write)?;

        let address = self.mask_address(address);
        self.bus.write_long_word(address, value);

        Ok(())
    }

    pub(super) fn fetch_operand(&mut self) -> ExecuteResult<u16> {
        let operand = self.read_bus_word(self.registers.pc_address())?;
        self.registers.advance_pc();

        Ok(operand)
    }

    pub(super) fn fetch_long_operand(&mut self) -> ExecuteResult<u32> {
        let high_word = self.fetch_operand()?;
        let low_word = self.fetch_operand()?;

        Ok((u32::from(high_word) << 16) | u32::from(low_word))
    }

    pub(super) fn resolve_address(
        &mut self,
        addressing_mode: AddressingMode,
        size: OpSize,
    ) -> ExecuteResult<ResolvedAddress> {
        let resolved_address = match addressing_mode {
            AddressingMode::DataDirect(register) => ResolvedAddress::DataRegister(register),
            AddressingMode::AddressDirect(register) => ResolvedAddress::AddressRegister(register),
            AddressingMode::AddressIndirect(register) => {
                ResolvedAddress::Memory(register.read_from(self.registers))
            }
            AddressingMode::AddressIndirectPredecrement(register) => {
                let increment = size.increment_step_for(register);
                let address = register.read_from(self.registers).wrapping_sub(increment);
                register.write_long_word_to(self.registers, address);
                ResolvedAddress::Memory(address)
            }
            AddressingMode::AddressIndirectPostincrement(register) => {
                let increment = size.increment_step_for(register);
                let address = register.read_from(self.registers);
                ResolvedAddress::MemoryPostincrement { address, register, increment }
            }
            AddressingMode::AddressIndirectDisplacement(register) => {
                let displacement = self.fetch_operand()? as i16;
                let address = register.read_from(self.registers).wrapping_add(displacement as u32);
                ResolvedAddress::Memory(address)
            }
            AddressingMode::AddressIndirectIndexed(register) => {
                let extension = self.fetch_operand()?;
                let (index_register, index_size) = parse_index(extension);
                let index = index_register.read_from(self.registers, index_size);
                let displacement = extension as i8;

                let address = register
                    .read_from(self.registers)
                    .wrapping_add(index)
                    .wrapping_add(displacement as u32);
                ResolvedAddress::Memory(address)
            }
            AddressingMode::PcRelativeDisplacement => {
                // Base is the address of the extension word itself
                let pc = self.registers.pc_address();
                let displacement = self.fetch_operand()? as i16;
                ResolvedAddress::Memory(pc.wrapping_add(displacement as u32))
            }
            AddressingMode::PcRelativeIndexed => {
                let pc = self.registers.pc_address();
                let extension = self.fetch_operand()?;
                let (index_register, index_size) = parse_index(extension);
                let index = index_register.read_from(self.registers, index_size);
                let displacement = extension as i8;

                let address = pc.wrapping_add(index).wrapping_add(displacement as u32);
                ResolvedAddress::Memory(address)
            }
            AddressingMode::AbsoluteShort => {
                let extension = self.fetch_operand()?;
                ResolvedAddress::Memory(extension as i16 as u32)
            }
            AddressingMode::AbsoluteLong => {
                let address = self.fetch_long_operand()?;
                ResolvedAddress::Memory(address)
            }
            AddressingMode::Immediate => {
                let value = match size {
                    // Byte immediates occupy the low half of a full extension word
                    OpSize::Byte => (self.fetch_operand()? as u8).into(),
                    OpSize::Word => self.fetch_operand()?.into(),
                    OpSize::LongWord => self.fetch_long_operand()?,
                };
                ResolvedAddress::Immediate(value)
            }
            AddressingMode::Quick(value) => ResolvedAddress::Immediate(value.into()),
        };

        Ok(resolved_address)
    }

    pub(super) fn resolve_address_with_post(
        &mut self,
        addressing_mode: AddressingMode,
        size: OpSize,
    ) -> ExecuteResult<ResolvedAddress> {
        let resolved = self.resolve_address(addressing_mode, size)?;
        resolved.apply_post(self.registers);
        Ok(resolved)
    }

    /// Resolves a control addressing mode (no register direct, no postincrement/predecrement,
    /// no immediate) to a memory address.
    pub(super) fn resolve_control_address(
        &mut self,
        addressing_mode: AddressingMode,
    ) -> ExecuteResult<u32> {
        match self.resolve_address(addressing_mode, OpSize::LongWord)? {
            ResolvedAddress::Memory(address) => Ok(address),
            _ => Err(Exception::IllegalInstruction(self.opcode)),
        }
    }

    pub(super) fn read_byte_resolved(&mut self, resolved_address: ResolvedAddress) -> u8 {
        match resolved_address {
            ResolvedAddress::DataRegister(register) => register.read_from(self.registers) as u8,
            ResolvedAddress::AddressRegister(register) => register.read_from(self.registers) as u8,
            ResolvedAddress::Memory(address)
            | ResolvedAddress::MemoryPostincrement { address, .. } => self.read_bus_byte(address),
            ResolvedAddress::Immediate(value) => value as u8,
        }
    }

    pub(super) fn read_word_resolved(
        &mut self,
        resolved_address: ResolvedAddress,
    ) -> ExecuteResult<u16> {
        match resolved_address {
            ResolvedAddress::DataRegister(register) => {
                Ok(register.read_from(self.registers) as u16)
            }
            ResolvedAddress::AddressRegister(register) => {
                Ok(register.read_from(self.registers) as u16)
            }
            ResolvedAddress::Memory(address)
            | ResolvedAddress::MemoryPostincrement { address, .. } => self.read_bus_word(address),
            ResolvedAddress::Immediate(value) => Ok(value as u16),
        }
    }

    pub(super) fn read_long_word_resolved(
        &mut self,
        resolved_address: ResolvedAddress,
    ) -> ExecuteResult<u32> {
        match resolved_address {
            ResolvedAddress::DataRegister(register) => Ok(register.read_from(self.registers)),
            ResolvedAddress::AddressRegister(register) => Ok(register.read_from(self.registers)),
            ResolvedAddress::Memory(address)
            | ResolvedAddress::MemoryPostincrement { address, .. } => {
                self.read_bus_long_word(address)
            }
            ResolvedAddress::Immediate(value) => Ok(value),
        }
    }

    pub(super) fn read_resolved(
        &mut self,
        resolved_address: ResolvedAddress,
        size: OpSize,
    ) -> ExecuteResult<SizedValue> {
        match size {
            OpSize::Byte => Ok(SizedValue::Byte(self.read_byte_resolved(resolved_address))),
            OpSize::Word => self.read_word_resolved(resolved_address).map(SizedValue::Word),
            OpSize::LongWord => {
                self.read_long_word_resolved(resolved_address).map(SizedValue::LongWord)
            }
        }
    }

    pub(super) fn read_byte(&mut self, source: AddressingMode) -> ExecuteResult<u8> {
        let resolved_address = self.resolve_address_with_post(source, OpSize::Byte)?;
        Ok(self.read_byte_resolved(resolved_address))
    }

    pub(super) fn read_word(&mut self, source: AddressingMode) -> ExecuteResult<u16> {
        let resolved_address = self.resolve_address_with_post(source, OpSize::Word)?;
        self.read_word_resolved(resolved_address)
    }

    pub(super) fn read_long_word(&mut self, source: AddressingMode) -> ExecuteResult<u32> {
        let resolved_address = self.resolve_address_with_post(source, OpSize::LongWord)?;
        self.read_long_word_resolved(resolved_address)
    }

    pub(super) fn read(
        &mut self,
        source: AddressingMode,
        size: OpSize,
    ) -> ExecuteResult<SizedValue> {
        match size {
            OpSize::Byte => self.read_byte(source).map(SizedValue::Byte),
            OpSize::Word => self.read_word(source).map(SizedValue::Word),
            OpSize::LongWord => self.read_long_word(source).map(SizedValue::LongWord),
        }
    }

    pub(super) fn write_byte_resolved(
        &mut self,
        resolved_address: ResolvedAddress,
        value: u8,
    ) -> ExecuteResult<()> {
        match resolved_address {
            ResolvedAddress::DataRegister(register) => {
                register.write_byte_to(self.registers, value);
            }
            ResolvedAddress::AddressRegister(register) => {
                register.write_long_word_to(self.registers, value as i8 as u32);
            }
            ResolvedAddress::Memory(address)
            | ResolvedAddress::MemoryPostincrement { address, .. } => {
                self.write_bus_byte(address, value);
            }
            ResolvedAddress::Immediate(..) => {
                return Err(Exception::IllegalInstruction(self.opcode));
            }
        }

        Ok(())
    }

    pub(super) fn write_word_resolved(
        &mut self,
        resolved_address: ResolvedAddress,
        value: u16,
    ) -> ExecuteResult<()> {
        match resolved_address {
            ResolvedAddress::DataRegister(register) => {
                register.write_word_to(self.registers, value);
            }
            ResolvedAddress::AddressRegister(register) => {
                register.write_word_to(self.registers, value);
            }
            ResolvedAddress::Memory(address)
            | ResolvedAddress::MemoryPostincrement { address, .. } => {
                self.write_bus_word(address, value)?;
            }
            ResolvedAddress::Immediate(..) => {
                return Err(Exception::IllegalInstruction(self.opcode));
            }
        }

        Ok(())
    }

    pub(super) fn write_long_word_resolved(
        &mut self,
        resolved_address: ResolvedAddress,
        value: u32,
    ) -> ExecuteResult<()> {
        match resolved_address {
            ResolvedAddress::DataRegister(register) => {
                register.write_long_word_to(self.registers, value);
            }
            ResolvedAddress::AddressRegister(register) => {
                register.write_long_word_to(self.registers, value);
            }
            ResolvedAddress::Memory(address)
            | ResolvedAddress::MemoryPostincrement { address, .. } => {
                self.write_bus_long_word(address, value)?;
            }
            ResolvedAddress::Immediate(..) => {
                return Err(Exception::IllegalInstruction(self.opcode));
            }
        }

        Ok(())
    }

    pub(super) fn write_resolved(
        &mut self,
        resolved_address: ResolvedAddress,
        value: SizedValue,
    ) -> ExecuteResult<()> {
        match value {
            SizedValue::Byte(value) => self.write_byte_resolved(resolved_address, value),
            SizedValue::Word(value) => self.write_word_resolved(resolved_address, value),
            SizedValue::LongWord(value) => self.write_long_word_resolved(resolved_address, value),
        }
    }

    pub(super) fn write(&mut self, dest: AddressingMode, value: SizedValue) -> ExecuteResult<()> {
        let resolved_address = self.resolve_address_with_post(dest, value.size())?;
        self.write_resolved(resolved_address, value)
    }

    pub(super) fn push_stack_u16(&mut self, value: u16) -> ExecuteResult<()> {
        let sp = self.registers.address[7].wrapping_sub(2);
        self.registers.address[7] = sp;
        self.write_bus_word(sp, value)
    }

    pub(super) fn push_stack_u32(&mut self, value: u32) -> ExecuteResult<()> {
        let sp = self.registers.address[7].wrapping_sub(4);
        self.registers.address[7] = sp;
        self.write_bus_long_word(sp, value)
    }

    pub(super) fn pop_stack_u16(&mut self) -> ExecuteResult<u16> {
        let sp = self.registers.address[7];
        let value = self.read_bus_word(sp)?;
        self.registers.address[7] = sp.wrapping_add(2);
        Ok(value)
    }

    pub(super) fn pop_stack_u32(&mut self) -> ExecuteResult<u32> {
        let sp = self.registers.address[7];
        let value = self.read_bus_long_word(sp)?;
        self.registers.address[7] = sp.wrapping_add(4);
        Ok(value)
    }

    /// Loads a new program counter, honoring the alignment policy for odd targets.
    pub(super) fn jump_to(&mut self, address: u32) -> ExecuteResult<()> {
        self.check_alignment(address, BusOpType::Jump)?;

        if address % 2 != 0 {
            log::debug!("Jump to odd address {address:08X}; low bit dropped");
        }
        self.registers.set_pc_address(address);

        Ok(())
    }
}
