mod effective;
mod exceptions;
mod flags;
mod instructions;
#[cfg(test)]
mod tests;

use crate::config::{CpuModel, EngineConfig};
use crate::num::{GetBit, SignBit};
use crate::traits::BusInterface;
#[cfg(feature = "bincode")]
use bincode::{Decode, Encode};
use std::fmt::{Display, Formatter};

pub(crate) use exceptions::Exception;
pub use exceptions::vectors;
pub(crate) use instructions::{
    BranchCondition, ControlDirection, Direction, Instruction, ShiftCount, ShiftDirection,
    UspDirection, decode,
};

// T, S, I2-I0, X, N, Z, V, C
pub(crate) const SR_WRITE_MASK: u16 = 0xA71F;

const PC_MASK: u32 = 0x7FFF_FFFF;

pub(crate) type ExecuteResult<T> = Result<T, Exception>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "bincode", derive(Encode, Decode))]
pub(crate) struct ConditionCodes {
    pub(crate) carry: bool,
    pub(crate) overflow: bool,
    pub(crate) zero: bool,
    pub(crate) negative: bool,
    pub(crate) extend: bool,
}

impl From<u8> for ConditionCodes {
    fn from(value: u8) -> Self {
        Self {
            carry: value.bit(0),
            overflow: value.bit(1),
            zero: value.bit(2),
            negative: value.bit(3),
            extend: value.bit(4),
        }
    }
}

impl From<ConditionCodes> for u8 {
    fn from(value: ConditionCodes) -> Self {
        (u8::from(value.extend) << 4)
            | (u8::from(value.negative) << 3)
            | (u8::from(value.zero) << 2)
            | (u8::from(value.overflow) << 1)
            | u8::from(value.carry)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "bincode", derive(Encode, Decode))]
pub(crate) struct Registers {
    pub(crate) data: [u32; 8],
    // Index 7 is whichever stack pointer the current privilege level selects
    pub(crate) address: [u32; 8],
    // Shadow of the inactive stack pointer; only meaningful while the other mode is active
    usp: u32,
    ssp: u32,
    // Halfword index; the byte address of the next fetch is pc * 2
    pub(crate) pc: u32,
    pub(crate) ccr: ConditionCodes,
    pub(crate) interrupt_priority_mask: u8,
    pub(crate) supervisor_mode: bool,
    pub(crate) trace_enabled: bool,
    pub(crate) vbr: u32,
    pub(crate) sfc: u8,
    pub(crate) dfc: u8,
    pub(crate) stopped: bool,
    pub(crate) halted: bool,
}

impl Registers {
    pub(crate) fn new() -> Self {
        Self {
            data: [0; 8],
            address: [0; 8],
            usp: 0,
            ssp: 0,
            pc: 0,
            ccr: ConditionCodes::default(),
            interrupt_priority_mask: 7,
            supervisor_mode: true,
            trace_enabled: false,
            vbr: 0,
            sfc: 0,
            dfc: 0,
            stopped: false,
            halted: false,
        }
    }

    pub(crate) fn status_register(&self) -> u16 {
        let lsb: u8 = self.ccr.into();
        let msb = self.interrupt_priority_mask
            | (u8::from(self.supervisor_mode) << 5)
            | (u8::from(self.trace_enabled) << 7);

        u16::from_be_bytes([msb, lsb])
    }

    pub(crate) fn set_status_register(&mut self, value: u16) {
        let [msb, lsb] = (value & SR_WRITE_MASK).to_be_bytes();

        self.interrupt_priority_mask = msb & 0x07;
        self.set_supervisor_mode(msb.bit(5));
        self.trace_enabled = msb.bit(7);

        self.ccr = lsb.into();
    }

    pub(crate) fn set_supervisor_mode(&mut self, supervisor_mode: bool) {
        match (self.supervisor_mode, supervisor_mode) {
            (false, true) => {
                self.usp = self.address[7];
                self.address[7] = self.ssp;
            }
            (true, false) => {
                self.ssp = self.address[7];
                self.address[7] = self.usp;
            }
            _ => {}
        }

        self.supervisor_mode = supervisor_mode;
    }

    pub(crate) fn usp(&self) -> u32 {
        if self.supervisor_mode { self.usp } else { self.address[7] }
    }

    pub(crate) fn set_usp(&mut self, value: u32) {
        if self.supervisor_mode {
            self.usp = value;
        } else {
            self.address[7] = value;
        }
    }

    pub(crate) fn ssp(&self) -> u32 {
        if self.supervisor_mode { self.address[7] } else { self.ssp }
    }

    pub(crate) fn set_ssp(&mut self, value: u32) {
        if self.supervisor_mode {
            self.address[7] = value;
        } else {
            self.ssp = value;
        }
    }

    pub(crate) fn pc_address(&self) -> u32 {
        self.pc << 1
    }

    // Odd targets lose their low bit; callers that care check alignment first
    pub(crate) fn set_pc_address(&mut self, address: u32) {
        self.pc = (address >> 1) & PC_MASK;
    }

    pub(crate) fn advance_pc(&mut self) {
        self.pc = self.pc.wrapping_add(1) & PC_MASK;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DataRegister(pub(crate) u8);

impl DataRegister {
    pub(crate) const ALL: [Self; 8] =
        [Self(0), Self(1), Self(2), Self(3), Self(4), Self(5), Self(6), Self(7)];

    pub(crate) fn read_from(self, registers: &Registers) -> u32 {
        registers.data[self.0 as usize]
    }

    pub(crate) fn write_byte_to(self, registers: &mut Registers, value: u8) {
        let existing_value = registers.data[self.0 as usize];
        registers.data[self.0 as usize] = (existing_value & 0xFFFF_FF00) | u32::from(value);
    }

    pub(crate) fn write_word_to(self, registers: &mut Registers, value: u16) {
        let existing_value = registers.data[self.0 as usize];
        registers.data[self.0 as usize] = (existing_value & 0xFFFF_0000) | u32::from(value);
    }

    pub(crate) fn write_long_word_to(self, registers: &mut Registers, value: u32) {
        registers.data[self.0 as usize] = value;
    }

    pub(crate) fn write_to(self, registers: &mut Registers, value: SizedValue) {
        match value {
            SizedValue::Byte(value) => self.write_byte_to(registers, value),
            SizedValue::Word(value) => self.write_word_to(registers, value),
            SizedValue::LongWord(value) => self.write_long_word_to(registers, value),
        }
    }
}

impl From<u8> for DataRegister {
    fn from(value: u8) -> Self {
        Self(value & 0x07)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AddressRegister(pub(crate) u8);

impl AddressRegister {
    pub(crate) const ALL: [Self; 8] =
        [Self(0), Self(1), Self(2), Self(3), Self(4), Self(5), Self(6), Self(7)];

    pub(crate) fn is_stack_pointer(self) -> bool {
        self.0 == 7
    }

    pub(crate) fn read_from(self, registers: &Registers) -> u32 {
        registers.address[self.0 as usize]
    }

    pub(crate) fn write_word_to(self, registers: &mut Registers, value: u16) {
        // Address register writes are always sign extended to 32 bits
        self.write_long_word_to(registers, value as i16 as u32);
    }

    pub(crate) fn write_long_word_to(self, registers: &mut Registers, value: u32) {
        registers.address[self.0 as usize] = value;
    }
}

impl From<u8> for AddressRegister {
    fn from(value: u8) -> Self {
        Self(value & 0x07)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpSize {
    Byte,
    Word,
    LongWord,
}

impl OpSize {
    pub(crate) const ALL: [Self; 3] = [Self::Byte, Self::Word, Self::LongWord];

    pub(crate) fn increment_step_for(self, register: AddressRegister) -> u32 {
        match self {
            Self::Byte => u8::increment_step_for(register),
            Self::Word => u16::increment_step_for(register),
            Self::LongWord => u32::increment_step_for(register),
        }
    }

    pub(crate) fn to_bits(self) -> u16 {
        match self {
            Self::Byte => 0x0000,
            Self::Word => 0x0040,
            Self::LongWord => 0x0080,
        }
    }

    pub(crate) fn to_move_bits(self) -> u16 {
        match self {
            Self::Byte => 0x1000,
            Self::Word => 0x3000,
            Self::LongWord => 0x2000,
        }
    }
}

impl Display for OpSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Byte => write!(f, "B"),
            Self::Word => write!(f, "W"),
            Self::LongWord => write!(f, "L"),
        }
    }
}

trait IncrementStep: Copy {
    fn increment_step_for(register: AddressRegister) -> u32;
}

impl IncrementStep for u8 {
    fn increment_step_for(register: AddressRegister) -> u32 {
        // A7 stays word-aligned
        if register.is_stack_pointer() { 2 } else { 1 }
    }
}

impl IncrementStep for u16 {
    fn increment_step_for(_register: AddressRegister) -> u32 {
        2
    }
}

impl IncrementStep for u32 {
    fn increment_step_for(_register: AddressRegister) -> u32 {
        4
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SizedValue {
    Byte(u8),
    Word(u16),
    LongWord(u32),
}

impl SizedValue {
    pub(crate) fn from_size(value: u32, size: OpSize) -> Self {
        match size {
            OpSize::Byte => Self::Byte(value as u8),
            OpSize::Word => Self::Word(value as u16),
            OpSize::LongWord => Self::LongWord(value),
        }
    }

    pub(crate) fn is_zero(self) -> bool {
        match self {
            Self::Byte(value) => value == 0,
            Self::Word(value) => value == 0,
            Self::LongWord(value) => value == 0,
        }
    }

    pub(crate) fn size(self) -> OpSize {
        match self {
            Self::Byte(_) => OpSize::Byte,
            Self::Word(_) => OpSize::Word,
            Self::LongWord(_) => OpSize::LongWord,
        }
    }
}

impl SignBit for SizedValue {
    fn sign_bit(self) -> bool {
        match self {
            Self::Byte(value) => value.sign_bit(),
            Self::Word(value) => value.sign_bit(),
            Self::LongWord(value) => value.sign_bit(),
        }
    }
}

impl From<SizedValue> for u32 {
    fn from(value: SizedValue) -> Self {
        match value {
            SizedValue::Byte(value) => value.into(),
            SizedValue::Word(value) => value.into(),
            SizedValue::LongWord(value) => value,
        }
    }
}

impl From<u8> for SizedValue {
    fn from(value: u8) -> Self {
        Self::Byte(value)
    }
}

impl From<u16> for SizedValue {
    fn from(value: u16) -> Self {
        Self::Word(value)
    }
}

impl From<u32> for SizedValue {
    fn from(value: u32) -> Self {
        Self::LongWord(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IndexRegister {
    Data(DataRegister),
    Address(AddressRegister),
}

impl IndexRegister {
    fn read_from(self, registers: &Registers, size: IndexSize) -> u32 {
        let raw_value = match self {
            Self::Data(register) => register.read_from(registers),
            Self::Address(register) => register.read_from(registers),
        };

        match size {
            IndexSize::SignExtendedWord => raw_value as i16 as u32,
            IndexSize::LongWord => raw_value,
        }
    }
}

impl Display for IndexRegister {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Data(register) => write!(f, "D{}", register.0),
            Self::Address(register) => write!(f, "A{}", register.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IndexSize {
    SignExtendedWord,
    LongWord,
}

impl Display for IndexSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SignExtendedWord => write!(f, "W"),
            Self::LongWord => write!(f, "L"),
        }
    }
}

pub(crate) fn parse_index(extension: u16) -> (IndexRegister, IndexSize) {
    let register_number = ((extension >> 12) & 0x07) as u8;
    let register = if extension.bit(15) {
        IndexRegister::Address(register_number.into())
    } else {
        IndexRegister::Data(register_number.into())
    };

    let size = if extension.bit(11) { IndexSize::LongWord } else { IndexSize::SignExtendedWord };

    (register, size)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BusOpType {
    Read,
    Write,
    Jump,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AddressingMode {
    DataDirect(DataRegister),
    AddressDirect(AddressRegister),
    AddressIndirect(AddressRegister),
    AddressIndirectPostincrement(AddressRegister),
    AddressIndirectPredecrement(AddressRegister),
    AddressIndirectDisplacement(AddressRegister),
    AddressIndirectIndexed(AddressRegister),
    PcRelativeDisplacement,
    PcRelativeIndexed,
    AbsoluteShort,
    AbsoluteLong,
    Immediate,
    Quick(u8),
}

impl AddressingMode {
    pub(crate) fn is_address_direct(self) -> bool {
        matches!(self, Self::AddressDirect(..))
    }

    pub(crate) fn to_bits(self) -> u16 {
        match self {
            Self::DataDirect(register) => u16::from(register.0),
            Self::AddressDirect(register) => 0x08 | u16::from(register.0),
            Self::AddressIndirect(register) => 0x10 | u16::from(register.0),
            Self::AddressIndirectPostincrement(register) => 0x18 | u16::from(register.0),
            Self::AddressIndirectPredecrement(register) => 0x20 | u16::from(register.0),
            Self::AddressIndirectDisplacement(register) => 0x28 | u16::from(register.0),
            Self::AddressIndirectIndexed(register) => 0x30 | u16::from(register.0),
            Self::AbsoluteShort => 0x38,
            Self::AbsoluteLong => 0x39,
            Self::PcRelativeDisplacement => 0x3A,
            Self::PcRelativeIndexed => 0x3B,
            Self::Immediate => 0x3C,
            Self::Quick(..) => 0x00,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResolvedAddress {
    DataRegister(DataRegister),
    AddressRegister(AddressRegister),
    Memory(u32),
    MemoryPostincrement { address: u32, register: AddressRegister, increment: u32 },
    Immediate(u32),
}

impl ResolvedAddress {
    pub(crate) fn apply_post(self, registers: &mut Registers) {
        if let ResolvedAddress::MemoryPostincrement { address, register, increment } = self {
            register.write_long_word_to(registers, address.wrapping_add(increment));
        }
    }
}

/// Reason an embedding loop may want to stop calling [`M68k::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "bincode", derive(Encode, Decode))]
pub enum StopSignal {
    /// A STOP instruction executed; the CPU waits for an interrupt.
    Stopped,
    /// An opcode with no registered handler was fetched.
    UnmappedOpcode { opcode: u16, address: u32 },
    /// An address error occurred while stacking an exception frame; the CPU is halted.
    DoubleFault { address: u32 },
}

impl Display for StopSignal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stopped => write!(f, "CPU stopped waiting for an interrupt"),
            Self::UnmappedOpcode { opcode, address } => {
                write!(f, "unmapped opcode {opcode:04X} at {address:06X}")
            }
            Self::DoubleFault { address } => {
                write!(f, "double fault (address error at {address:06X}); CPU halted")
            }
        }
    }
}

#[derive(Debug)]
pub(crate) struct InstructionExecutor<'registers, 'bus, B> {
    pub(crate) registers: &'registers mut Registers,
    pub(crate) bus: &'bus mut B,
    pub(crate) config: EngineConfig,
    pub(crate) opcode: u16,
    /// Byte address of the current opcode word; faults stack this as the return PC.
    pub(crate) instruction_pc: u32,
    pub(crate) stop_signal: Option<StopSignal>,
}

impl<'registers, 'bus, B: BusInterface> InstructionExecutor<'registers, 'bus, B> {
    pub(crate) fn new(
        registers: &'registers mut Registers,
        bus: &'bus mut B,
        config: EngineConfig,
    ) -> Self {
        let instruction_pc = registers.pc_address();
        Self { registers, bus, config, opcode: 0, instruction_pc, stop_signal: None }
    }

    fn is_68010(&self) -> bool {
        self.config.model.is_68010()
    }

    fn require_68010(&self) -> ExecuteResult<()> {
        if self.is_68010() { Ok(()) } else { Err(Exception::IllegalInstruction(self.opcode)) }
    }

    fn require_supervisor(&self) -> ExecuteResult<()> {
        if self.registers.supervisor_mode { Ok(()) } else { Err(Exception::PrivilegeViolation) }
    }

    /// Runs a single instruction, including any exception it raises and the trace trap that
    /// follows it.
    pub(crate) fn execute(mut self) -> Option<StopSignal> {
        let trace_pending = self.registers.trace_enabled;

        match self.do_execute() {
            Ok(()) => {
                if trace_pending {
                    self.enter_exception(vectors::TRACE);
                }
            }
            Err(exception) => {
                self.handle_exception(exception);
            }
        }

        self.stop_signal
    }

    /// Samples the bus interrupt line and takes an autovectored interrupt when one is due.
    /// Returns whether an interrupt was taken.
    pub(crate) fn poll_interrupt(&mut self, last_level: &mut u8) -> bool {
        let level = self.bus.interrupt_level() & 0x07;
        // Level 7 is edge-triggered and cannot be masked
        let nmi_edge = level == 7 && *last_level != 7;
        *last_level = level;

        if level == 0 || (level <= self.registers.interrupt_priority_mask && !nmi_edge) {
            return false;
        }

        log::trace!("Handling level {level} interrupt");

        self.registers.stopped = false;
        self.enter_exception(vectors::AUTOVECTOR_BASE + u32::from(level));
        self.registers.interrupt_priority_mask = level;
        self.bus.acknowledge_interrupt(level);

        true
    }
}

fn merge_stop_signal(existing: Option<StopSignal>, new: Option<StopSignal>) -> Option<StopSignal> {
    // A halt outranks anything else reported during the same step
    match (existing, new) {
        (Some(signal @ StopSignal::DoubleFault { .. }), _) => Some(signal),
        (_, Some(signal)) => Some(signal),
        (existing, None) => existing,
    }
}

/// An MC68000-family CPU core.
///
/// The core owns its register file; memory and peripherals live behind a [`BusInterface`]
/// passed to every call that touches the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "bincode", derive(Encode, Decode))]
pub struct M68k {
    registers: Registers,
    config: EngineConfig,
    last_interrupt_level: u8,
    stop_signal: Option<StopSignal>,
}

impl M68k {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { registers: Registers::new(), config, last_interrupt_level: 0, stop_signal: None }
    }

    #[must_use]
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    #[must_use]
    pub fn model(&self) -> CpuModel {
        self.config.model
    }

    /// Performs the power-on reset sequence: the supervisor stack pointer is loaded from
    /// address 0 and the program counter from address 4.
    pub fn reset<B: BusInterface>(&mut self, bus: &mut B) {
        self.registers.set_supervisor_mode(true);
        self.registers.trace_enabled = false;
        self.registers.interrupt_priority_mask = 7;
        self.registers.vbr = 0;
        self.registers.stopped = false;
        self.registers.halted = false;

        self.registers.address[7] = bus.read_long_word(0);
        let pc = bus.read_long_word(4);
        self.registers.set_pc_address(pc);

        self.last_interrupt_level = 0;
        self.stop_signal = None;

        log::debug!(
            "Reset {}: SSP={:08X} PC={pc:08X}",
            self.config.model,
            self.registers.address[7]
        );
    }

    /// Executes one instruction, or takes one pending interrupt.
    ///
    /// Does nothing while the CPU is halted. While stopped, only an interrupt can make
    /// progress.
    pub fn step<B: BusInterface>(&mut self, bus: &mut B) {
        if self.registers.halted {
            return;
        }

        let mut executor = InstructionExecutor::new(&mut self.registers, bus, self.config);
        let signal = if executor.poll_interrupt(&mut self.last_interrupt_level) {
            executor.stop_signal
        } else if executor.registers.stopped {
            None
        } else {
            executor.execute()
        };

        self.stop_signal = merge_stop_signal(self.stop_signal, signal);
    }

    /// Raises the exception with the given vector number as if the hardware had signalled it.
    pub fn raise_exception<B: BusInterface>(&mut self, bus: &mut B, vector: u32) {
        if self.registers.halted {
            return;
        }

        self.registers.stopped = false;

        let mut executor = InstructionExecutor::new(&mut self.registers, bus, self.config);
        executor.enter_exception(vector);
        let signal = executor.stop_signal;

        self.stop_signal = merge_stop_signal(self.stop_signal, signal);
    }

    /// Returns and clears the most recent stop signal.
    pub fn take_stop_signal(&mut self) -> Option<StopSignal> {
        self.stop_signal.take()
    }

    #[must_use]
    pub fn data_registers(&self) -> [u32; 8] {
        self.registers.data
    }

    pub fn set_data_registers(&mut self, data: [u32; 8]) {
        self.registers.data = data;
    }

    /// A0-A6. A7 is exposed through the stack pointer accessors.
    #[must_use]
    pub fn address_registers(&self) -> [u32; 7] {
        let mut registers = [0; 7];
        registers.copy_from_slice(&self.registers.address[..7]);
        registers
    }

    pub fn set_address_registers(&mut self, address: [u32; 7]) {
        self.registers.address[..7].copy_from_slice(&address);
    }

    #[must_use]
    pub fn stack_pointer(&self) -> u32 {
        self.registers.address[7]
    }

    #[must_use]
    pub fn user_stack_pointer(&self) -> u32 {
        self.registers.usp()
    }

    pub fn set_user_stack_pointer(&mut self, value: u32) {
        self.registers.set_usp(value);
    }

    #[must_use]
    pub fn supervisor_stack_pointer(&self) -> u32 {
        self.registers.ssp()
    }

    pub fn set_supervisor_stack_pointer(&mut self, value: u32) {
        self.registers.set_ssp(value);
    }

    #[must_use]
    pub fn status_register(&self) -> u16 {
        self.registers.status_register()
    }

    /// Writes SR through the same mask and stack pointer banking the CPU applies internally.
    pub fn set_status_register(&mut self, value: u16) {
        self.registers.set_status_register(value);
    }

    /// PC as a halfword index.
    #[must_use]
    pub fn pc(&self) -> u32 {
        self.registers.pc
    }

    pub fn set_pc(&mut self, pc: u32) {
        self.registers.pc = pc & PC_MASK;
    }

    /// PC as a byte address.
    #[must_use]
    pub fn pc_address(&self) -> u32 {
        self.registers.pc_address()
    }

    pub fn set_pc_address(&mut self, address: u32) {
        self.registers.set_pc_address(address);
    }

    #[must_use]
    pub fn vector_base_register(&self) -> u32 {
        self.registers.vbr
    }

    pub fn set_vector_base_register(&mut self, vbr: u32) {
        self.registers.vbr = vbr;
    }

    #[must_use]
    pub fn is_supervisor_mode(&self) -> bool {
        self.registers.supervisor_mode
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.registers.stopped
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.registers.halted
    }
}

impl Default for M68k {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(feature = "bincode")]
#[derive(Debug, thiserror::Error)]
pub enum SaveStateError {
    #[error("error encoding CPU state: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("error decoding CPU state: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

#[cfg(feature = "bincode")]
impl M68k {
    /// Serializes the complete CPU state, including configuration.
    ///
    /// # Errors
    ///
    /// Propagates any bincode encoding error.
    pub fn save_state(&self) -> Result<Vec<u8>, SaveStateError> {
        let bytes = bincode::encode_to_vec(self, bincode::config::standard())?;
        Ok(bytes)
    }

    /// Restores a CPU previously serialized with [`M68k::save_state`].
    ///
    /// # Errors
    ///
    /// Propagates any bincode decoding error.
    pub fn load_state(bytes: &[u8]) -> Result<Self, SaveStateError> {
        let (cpu, _) = bincode::decode_from_slice(bytes, bincode::config::standard())?;
        Ok(cpu)
    }
}
