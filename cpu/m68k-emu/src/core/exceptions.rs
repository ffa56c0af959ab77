use crate::core::{BusOpType, ExecuteResult, InstructionExecutor, StopSignal};
use crate::traits::BusInterface;

/// Exception vector numbers. The handler address for vector `n` is read from `VBR + 4 * n`.
pub mod vectors {
    pub const RESET_SSP: u32 = 0;
    pub const RESET_PC: u32 = 1;
    pub const BUS_ERROR: u32 = 2;
    pub const ADDRESS_ERROR: u32 = 3;
    pub const ILLEGAL_INSTRUCTION: u32 = 4;
    pub const DIVISION_BY_ZERO: u32 = 5;
    pub const CHK: u32 = 6;
    pub const TRAPV: u32 = 7;
    pub const PRIVILEGE_VIOLATION: u32 = 8;
    pub const TRACE: u32 = 9;
    pub const LINE_A: u32 = 10;
    pub const LINE_F: u32 = 11;
    pub const FORMAT_ERROR: u32 = 14;
    pub const UNINITIALIZED_INTERRUPT: u32 = 15;
    pub const SPURIOUS_INTERRUPT: u32 = 24;
    /// Level `n` autovectored interrupts use vector `AUTOVECTOR_BASE + n`.
    pub const AUTOVECTOR_BASE: u32 = 24;
    /// `TRAP #n` uses vector `TRAP_BASE + n`.
    pub const TRAP_BASE: u32 = 32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Exception {
    AddressError(u32, BusOpType),
    PrivilegeViolation,
    IllegalInstruction(u16),
    UnmappedOpcode(u16),
    LineA(u16),
    LineF(u16),
    DivisionByZero,
    CheckRegister,
    Trap(u32),
    FormatError,
}

impl Exception {
    pub(crate) fn vector(self) -> u32 {
        match self {
            Self::AddressError(..) => vectors::ADDRESS_ERROR,
            Self::PrivilegeViolation => vectors::PRIVILEGE_VIOLATION,
            Self::IllegalInstruction(..) | Self::UnmappedOpcode(..) => {
                vectors::ILLEGAL_INSTRUCTION
            }
            Self::LineA(..) => vectors::LINE_A,
            Self::LineF(..) => vectors::LINE_F,
            Self::DivisionByZero => vectors::DIVISION_BY_ZERO,
            Self::CheckRegister => vectors::CHK,
            Self::Trap(vector) => vector,
            Self::FormatError => vectors::FORMAT_ERROR,
        }
    }
}

impl<B: BusInterface> InstructionExecutor<'_, '_, B> {
    /// Stacks a short exception frame and loads the handler address.
    ///
    /// The frame is SR at the new SP with the return PC above it. 68010 frames carry an
    /// additional format/vector-offset word above the PC.
    pub(super) fn process_exception(&mut self, vector: u32) -> ExecuteResult<()> {
        let sr = self.registers.status_register();
        self.registers.set_supervisor_mode(true);
        self.registers.trace_enabled = false;

        let pc = self.registers.pc_address();
        if self.is_68010() {
            // Format 0 in the top nibble, vector offset below
            self.push_stack_u16(((vector << 2) & 0x0FFF) as u16)?;
        }
        self.push_stack_u32(pc)?;
        self.push_stack_u16(sr)?;

        let vector_address = self.registers.vbr.wrapping_add(vector << 2);
        let handler = self.read_bus_long_word(vector_address)?;
        self.registers.set_pc_address(handler);

        log::trace!("Exception vector {vector}: PC {pc:08X} -> {handler:08X}");

        Ok(())
    }

    fn handle_address_error(&mut self, address: u32, op_type: BusOpType) -> ExecuteResult<()> {
        let sr = self.registers.status_register();
        let was_supervisor = self.registers.supervisor_mode;
        self.registers.set_supervisor_mode(true);
        self.registers.trace_enabled = false;

        let pc = self.registers.pc_address();

        self.push_stack_u32(pc)?;
        self.push_stack_u16(sr)?;
        self.push_stack_u16(self.opcode)?;
        self.push_stack_u32(address)?;

        let function_code = match (was_supervisor, op_type) {
            (false, BusOpType::Read | BusOpType::Write) => 0x1,
            (false, BusOpType::Jump) => 0x2,
            (true, BusOpType::Read | BusOpType::Write) => 0x5,
            (true, BusOpType::Jump) => 0x6,
        };
        let rw_bit = op_type != BusOpType::Write;
        let status_word = (self.opcode & 0xFFE0) | (u16::from(rw_bit) << 4) | function_code;
        self.push_stack_u16(status_word)?;

        let vector_address = self.registers.vbr.wrapping_add(vectors::ADDRESS_ERROR << 2);
        let handler = self.read_bus_long_word(vector_address)?;
        self.registers.set_pc_address(handler);

        Ok(())
    }

    /// Enters an exception outside of normal instruction flow. An address error while
    /// stacking the frame halts the CPU.
    pub(crate) fn enter_exception(&mut self, vector: u32) {
        if let Err(error) = self.process_exception(vector) {
            self.double_fault(error);
        }
    }

    fn double_fault(&mut self, error: Exception) {
        let address = match error {
            Exception::AddressError(address, _) => address,
            _ => self.registers.pc_address(),
        };

        log::error!("Double fault during exception processing at {address:08X}; halting CPU");

        self.registers.halted = true;
        self.stop_signal = Some(StopSignal::DoubleFault { address });
    }

    pub(super) fn handle_exception(&mut self, exception: Exception) {
        log::trace!("Handling exception {exception:?} for opcode {:04X}", self.opcode);

        match exception {
            Exception::AddressError(address, op_type) => {
                if let Err(error) = self.handle_address_error(address, op_type) {
                    self.double_fault(error);
                }
                return;
            }
            Exception::PrivilegeViolation
            | Exception::IllegalInstruction(..)
            | Exception::LineA(..)
            | Exception::LineF(..) => {
                // Faults report the address of the offending opcode, not of any extension word
                self.registers.set_pc_address(self.instruction_pc);
            }
            Exception::UnmappedOpcode(opcode) => {
                let address = self.instruction_pc;
                self.registers.set_pc_address(address);

                log::error!("Unmapped opcode {opcode:04X} at {address:08X}");
                self.stop_signal = Some(StopSignal::UnmappedOpcode { opcode, address });
            }
            Exception::DivisionByZero
            | Exception::CheckRegister
            | Exception::Trap(..)
            | Exception::FormatError => {}
        }

        self.enter_exception(exception.vector());
    }
}
