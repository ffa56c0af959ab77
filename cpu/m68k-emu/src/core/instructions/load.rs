use crate::core::instructions::{ControlDirection, Direction, UspDirection};
use crate::core::{
    AddressRegister, AddressingMode, ConditionCodes, DataRegister, Exception, ExecuteResult,
    InstructionExecutor, OpSize, SizedValue,
};
use crate::num::{GetBit, WordField};
use crate::traits::BusInterface;

const CONTROL_SFC: u16 = 0x000;
const CONTROL_DFC: u16 = 0x001;
const CONTROL_USP: u16 = 0x800;
const CONTROL_VBR: u16 = 0x801;

// Bit 15 selects an address register, bits 12-14 the register number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GeneralRegister {
    Data(DataRegister),
    Address(AddressRegister),
}

impl GeneralRegister {
    fn from_extension(extension: u16) -> Self {
        let register = extension.bits(12..=14) as u8;
        if extension.bit(15) {
            Self::Address(register.into())
        } else {
            Self::Data(register.into())
        }
    }
}

impl<B: BusInterface> InstructionExecutor<'_, '_, B> {
    pub(super) fn move_(
        &mut self,
        size: OpSize,
        source: AddressingMode,
        dest: AddressingMode,
    ) -> ExecuteResult<()> {
        let value = self.read(source, size)?;

        // MOVEA leaves the condition codes alone
        if !dest.is_address_direct() {
            self.registers.ccr = self.registers.ccr.logical(value);
        }

        self.write(dest, value)
    }

    pub(super) fn moveq(&mut self, data: i8, register: DataRegister) {
        register.write_long_word_to(self.registers, data as u32);

        self.registers.ccr = ConditionCodes {
            carry: false,
            overflow: false,
            zero: data == 0,
            negative: data < 0,
            ..self.registers.ccr
        };
    }

    pub(super) fn move_from_sr(&mut self, dest: AddressingMode) -> ExecuteResult<()> {
        if self.is_68010() {
            self.require_supervisor()?;
        }

        let dest_resolved = self.resolve_address_with_post(dest, OpSize::Word)?;
        self.write_word_resolved(dest_resolved, self.registers.status_register())
    }

    pub(super) fn move_from_ccr(&mut self, dest: AddressingMode) -> ExecuteResult<()> {
        self.require_68010()?;

        let ccr: u8 = self.registers.ccr.into();
        let dest_resolved = self.resolve_address_with_post(dest, OpSize::Word)?;
        self.write_word_resolved(dest_resolved, ccr.into())
    }

    pub(super) fn move_to_ccr(&mut self, source: AddressingMode) -> ExecuteResult<()> {
        let value = self.read_word(source)?;
        self.registers.ccr = (value as u8).into();

        Ok(())
    }

    pub(super) fn move_to_sr(&mut self, source: AddressingMode) -> ExecuteResult<()> {
        self.require_supervisor()?;

        let value = self.read_word(source)?;
        self.registers.set_status_register(value);

        Ok(())
    }

    pub(super) fn move_usp(
        &mut self,
        direction: UspDirection,
        register: AddressRegister,
    ) -> ExecuteResult<()> {
        self.require_supervisor()?;

        match direction {
            UspDirection::RegisterToUsp => {
                let value = register.read_from(self.registers);
                self.registers.set_usp(value);
            }
            UspDirection::UspToRegister => {
                register.write_long_word_to(self.registers, self.registers.usp());
            }
        }

        Ok(())
    }

    pub(super) fn exg_data(&mut self, rx: DataRegister, ry: DataRegister) {
        self.registers.data.swap(rx.0 as usize, ry.0 as usize);
    }

    pub(super) fn exg_address(&mut self, rx: AddressRegister, ry: AddressRegister) {
        self.registers.address.swap(rx.0 as usize, ry.0 as usize);
    }

    pub(super) fn exg_data_address(&mut self, rx: DataRegister, ry: AddressRegister) {
        let data_value = rx.read_from(self.registers);
        let address_value = ry.read_from(self.registers);

        rx.write_long_word_to(self.registers, address_value);
        ry.write_long_word_to(self.registers, data_value);
    }

    // Register list index 0-7 is D0-D7, 8-15 is A0-A7
    fn read_list_register(&self, index: usize) -> u32 {
        if index < 8 { self.registers.data[index] } else { self.registers.address[index - 8] }
    }

    fn write_list_register(&mut self, index: usize, value: u32) {
        if index < 8 {
            self.registers.data[index] = value;
        } else {
            self.registers.address[index - 8] = value;
        }
    }

    fn write_sized_at(&mut self, address: u32, size: OpSize, value: u32) -> ExecuteResult<()> {
        match size {
            OpSize::LongWord => self.write_bus_long_word(address, value),
            OpSize::Word | OpSize::Byte => self.write_bus_word(address, value as u16),
        }
    }

    // Word loads are sign extended into the full register, data registers included
    fn read_sized_at(&mut self, address: u32, size: OpSize) -> ExecuteResult<u32> {
        match size {
            OpSize::LongWord => self.read_bus_long_word(address),
            OpSize::Word | OpSize::Byte => Ok(self.read_bus_word(address)? as i16 as u32),
        }
    }

    pub(super) fn movem(
        &mut self,
        size: OpSize,
        addressing_mode: AddressingMode,
        direction: Direction,
    ) -> ExecuteResult<()> {
        use AddressingMode::{AddressIndirectPostincrement, AddressIndirectPredecrement};

        let register_mask = self.fetch_operand()?;
        let step = if size == OpSize::LongWord { 4 } else { 2 };

        match (direction, addressing_mode) {
            (Direction::RegisterToMemory, AddressIndirectPredecrement(register)) => {
                // Predecrement masks are reversed: bit 0 is A7 and bit 15 is D0
                let mut address = register.read_from(self.registers);
                for index in (0..16).rev() {
                    if register_mask.bit(15 - index as u8) {
                        address = address.wrapping_sub(step);
                        let value = self.read_list_register(index);
                        self.write_sized_at(address, size, value)?;
                    }
                }
                register.write_long_word_to(self.registers, address);
            }
            (Direction::RegisterToMemory, _) => {
                let mut address = self.resolve_control_address(addressing_mode)?;
                for index in 0..16 {
                    if register_mask.bit(index as u8) {
                        let value = self.read_list_register(index);
                        self.write_sized_at(address, size, value)?;
                        address = address.wrapping_add(step);
                    }
                }
            }
            (Direction::MemoryToRegister, AddressIndirectPostincrement(register)) => {
                let mut address = register.read_from(self.registers);
                for index in 0..16 {
                    if register_mask.bit(index as u8) {
                        let value = self.read_sized_at(address, size)?;
                        self.write_list_register(index, value);
                        address = address.wrapping_add(step);
                    }
                }
                register.write_long_word_to(self.registers, address);
            }
            (Direction::MemoryToRegister, _) => {
                let mut address = self.resolve_control_address(addressing_mode)?;
                for index in 0..16 {
                    if register_mask.bit(index as u8) {
                        let value = self.read_sized_at(address, size)?;
                        self.write_list_register(index, value);
                        address = address.wrapping_add(step);
                    }
                }
            }
        }

        Ok(())
    }

    pub(super) fn movep(
        &mut self,
        size: OpSize,
        d_register: DataRegister,
        a_register: AddressRegister,
        direction: Direction,
    ) -> ExecuteResult<()> {
        let displacement = self.fetch_operand()? as i16;
        let address = a_register.read_from(self.registers).wrapping_add(displacement as u32);

        // Alternate bytes only: every other byte of the bus is skipped
        let byte_count: u32 = if size == OpSize::LongWord { 4 } else { 2 };

        match direction {
            Direction::RegisterToMemory => {
                let value = d_register.read_from(self.registers);
                for i in 0..byte_count {
                    let shift = 8 * (byte_count - 1 - i);
                    self.write_bus_byte(address.wrapping_add(2 * i), (value >> shift) as u8);
                }
            }
            Direction::MemoryToRegister => {
                let mut value = 0_u32;
                for i in 0..byte_count {
                    let byte = self.read_bus_byte(address.wrapping_add(2 * i));
                    value = (value << 8) | u32::from(byte);
                }
                d_register.write_to(self.registers, SizedValue::from_size(value, size));
            }
        }

        Ok(())
    }

    pub(super) fn movec(&mut self, direction: ControlDirection) -> ExecuteResult<()> {
        self.require_68010()?;
        self.require_supervisor()?;

        let extension = self.fetch_operand()?;
        let general = GeneralRegister::from_extension(extension);
        let control = extension.bits(0..=11);

        match direction {
            ControlDirection::ControlToGeneral => {
                let value = match control {
                    CONTROL_SFC => self.registers.sfc.into(),
                    CONTROL_DFC => self.registers.dfc.into(),
                    CONTROL_USP => self.registers.usp(),
                    CONTROL_VBR => self.registers.vbr,
                    _ => return Err(Exception::IllegalInstruction(self.opcode)),
                };
                self.write_general_register(general, value);
            }
            ControlDirection::GeneralToControl => {
                let value = self.read_general_register(general);
                match control {
                    CONTROL_SFC => self.registers.sfc = (value & 0x07) as u8,
                    CONTROL_DFC => self.registers.dfc = (value & 0x07) as u8,
                    CONTROL_USP => self.registers.set_usp(value),
                    CONTROL_VBR => self.registers.vbr = value,
                    _ => return Err(Exception::IllegalInstruction(self.opcode)),
                }
            }
        }

        Ok(())
    }

    fn read_general_register(&self, register: GeneralRegister) -> u32 {
        match register {
            GeneralRegister::Data(register) => register.read_from(self.registers),
            GeneralRegister::Address(register) => register.read_from(self.registers),
        }
    }

    fn write_general_register(&mut self, register: GeneralRegister, value: u32) {
        match register {
            GeneralRegister::Data(register) => register.write_long_word_to(self.registers, value),
            GeneralRegister::Address(register) => {
                register.write_long_word_to(self.registers, value);
            }
        }
    }

    pub(super) fn moves(
        &mut self,
        size: OpSize,
        addressing_mode: AddressingMode,
    ) -> ExecuteResult<()> {
        self.require_68010()?;
        self.require_supervisor()?;

        let extension = self.fetch_operand()?;
        let general = GeneralRegister::from_extension(extension);

        // Function codes select an address space; the bus is a single flat space
        if extension.bit(11) {
            log::trace!("MOVES to address space {}", self.registers.dfc);

            let value = SizedValue::from_size(self.read_general_register(general), size);
            self.write(addressing_mode, value)
        } else {
            log::trace!("MOVES from address space {}", self.registers.sfc);

            let value = self.read(addressing_mode, size)?;
            match general {
                GeneralRegister::Data(register) => register.write_to(self.registers, value),
                GeneralRegister::Address(register) => {
                    let value = match value {
                        SizedValue::Byte(value) => value as i8 as u32,
                        SizedValue::Word(value) => value as i16 as u32,
                        SizedValue::LongWord(value) => value,
                    };
                    register.write_long_word_to(self.registers, value);
                }
            }

            Ok(())
        }
    }
}

