use crate::core::instructions::BranchCondition;
use crate::core::{
    AddressRegister, AddressingMode, DataRegister, Exception, ExecuteResult, InstructionExecutor,
    StopSignal, vectors,
};
use crate::num::WordField;
use crate::traits::BusInterface;

impl<B: BusInterface> InstructionExecutor<'_, '_, B> {
    pub(super) fn lea(
        &mut self,
        source: AddressingMode,
        register: AddressRegister,
    ) -> ExecuteResult<()> {
        let address = self.resolve_control_address(source)?;
        register.write_long_word_to(self.registers, address);

        Ok(())
    }

    pub(super) fn pea(&mut self, source: AddressingMode) -> ExecuteResult<()> {
        let address = self.resolve_control_address(source)?;
        self.push_stack_u32(address)
    }

    pub(super) fn jmp(&mut self, source: AddressingMode) -> ExecuteResult<()> {
        let address = self.resolve_control_address(source)?;
        self.jump_to(address)
    }

    pub(super) fn jsr(&mut self, source: AddressingMode) -> ExecuteResult<()> {
        let address = self.resolve_control_address(source)?;
        let return_address = self.registers.pc_address();

        self.jump_to(address)?;
        self.push_stack_u32(return_address)
    }

    pub(super) fn link(&mut self, register: AddressRegister) -> ExecuteResult<()> {
        let displacement = self.fetch_operand()? as i16;

        if register.is_stack_pointer() {
            let sp = self.registers.address[7].wrapping_sub(4);
            self.push_stack_u32(sp)?;
        } else {
            self.push_stack_u32(register.read_from(self.registers))?;
        }

        let sp = self.registers.address[7];
        register.write_long_word_to(self.registers, sp);
        self.registers.address[7] = sp.wrapping_add(displacement as u32);

        Ok(())
    }

    pub(super) fn unlk(&mut self, register: AddressRegister) -> ExecuteResult<()> {
        self.registers.address[7] = register.read_from(self.registers);

        let address = self.pop_stack_u32()?;
        register.write_long_word_to(self.registers, address);

        Ok(())
    }

    pub(super) fn ret(&mut self, restore_ccr: bool) -> ExecuteResult<()> {
        if restore_ccr {
            let word = self.pop_stack_u16()?;
            self.registers.ccr = (word as u8).into();
        }

        let pc = self.pop_stack_u32()?;
        self.jump_to(pc)
    }

    pub(super) fn rte(&mut self) -> ExecuteResult<()> {
        self.require_supervisor()?;

        if self.is_68010() {
            // Only the short format is ever stacked; anything else is rejected before the
            // frame is consumed
            let format_address = self.registers.address[7].wrapping_add(6);
            let format_word = self.read_bus_word(format_address)?;
            if format_word.bits(12..=15) != 0 {
                log::debug!("RTE with unsupported stack frame format word {format_word:04X}");
                return Err(Exception::FormatError);
            }
        }

        let sr = self.pop_stack_u16()?;
        let pc = self.pop_stack_u32()?;
        if self.is_68010() {
            self.pop_stack_u16()?;
        }

        // Restoring SR may switch the active stack, so the frame must be fully consumed first
        self.registers.set_status_register(sr);
        self.jump_to(pc)
    }

    pub(super) fn rtd(&mut self) -> ExecuteResult<()> {
        self.require_68010()?;

        let displacement = self.fetch_operand()? as i16;
        let pc = self.pop_stack_u32()?;
        self.registers.address[7] = self.registers.address[7].wrapping_add(displacement as u32);

        self.jump_to(pc)
    }

    pub(super) fn trapv(&self) -> ExecuteResult<()> {
        if self.registers.ccr.overflow { Err(Exception::Trap(vectors::TRAPV)) } else { Ok(()) }
    }

    pub(super) fn reset(&mut self) -> ExecuteResult<()> {
        self.require_supervisor()?;

        log::debug!("RESET instruction executed at {:08X}", self.registers.pc_address());
        self.bus.reset_devices();

        Ok(())
    }

    pub(super) fn stop(&mut self) -> ExecuteResult<()> {
        self.require_supervisor()?;

        let sr = self.fetch_operand()?;
        self.registers.set_status_register(sr);
        self.registers.stopped = true;
        self.stop_signal = Some(StopSignal::Stopped);

        log::trace!("STOP with SR={sr:04X}");

        Ok(())
    }

    pub(super) fn bkpt(&mut self, vector: u8) -> ExecuteResult<()> {
        self.require_68010()?;

        // No debugger responds to the acknowledge cycle, so the breakpoint always ends up as an
        // illegal instruction
        log::debug!("BKPT #{vector} at {:08X}", self.registers.pc_address().wrapping_sub(2));
        Err(Exception::IllegalInstruction(self.opcode))
    }

    fn fetch_branch_displacement(&mut self, displacement: i8) -> ExecuteResult<i16> {
        if displacement == 0 { Ok(self.fetch_operand()? as i16) } else { Ok(displacement.into()) }
    }

    pub(super) fn branch(
        &mut self,
        condition: BranchCondition,
        displacement: i8,
    ) -> ExecuteResult<()> {
        // Displacements are relative to the word following the opcode
        let pc = self.registers.pc_address();
        let displacement = self.fetch_branch_displacement(displacement)?;

        if condition.check(self.registers.ccr) {
            self.jump_to(pc.wrapping_add(displacement as u32))?;
        }

        Ok(())
    }

    pub(super) fn bsr(&mut self, displacement: i8) -> ExecuteResult<()> {
        let pc = self.registers.pc_address();
        let displacement = self.fetch_branch_displacement(displacement)?;

        self.push_stack_u32(self.registers.pc_address())?;
        self.jump_to(pc.wrapping_add(displacement as u32))
    }

    pub(super) fn dbcc(
        &mut self,
        condition: BranchCondition,
        register: DataRegister,
    ) -> ExecuteResult<()> {
        let pc = self.registers.pc_address();
        let displacement = self.fetch_operand()? as i16;

        if !condition.check(self.registers.ccr) {
            let counter = (register.read_from(self.registers) as u16).wrapping_sub(1);
            register.write_word_to(self.registers, counter);

            if counter != 0xFFFF {
                self.jump_to(pc.wrapping_add(displacement as u32))?;
            }
        }

        Ok(())
    }
}

pub(super) fn trap(vector: u32) -> ExecuteResult<()> {
    Err(Exception::Trap(vectors::TRAP_BASE + vector))
}
