mod arithmetic;
mod bits;
mod controlflow;
mod load;
mod shifts;
mod table;

use crate::core::{
    AddressRegister, AddressingMode, ConditionCodes, DataRegister, Exception, ExecuteResult,
    InstructionExecutor, OpSize, Registers,
};
use crate::traits::BusInterface;

pub(crate) use table::decode;
#[cfg(test)]
pub(crate) use table::build_registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    RegisterToMemory,
    MemoryToRegister,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UspDirection {
    RegisterToUsp,
    UspToRegister,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ControlDirection {
    ControlToGeneral,
    GeneralToControl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShiftDirection {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShiftCount {
    Constant(u8),
    Register(DataRegister),
}

impl ShiftCount {
    fn get(self, registers: &Registers) -> u32 {
        match self {
            Self::Constant(count) => count.into(),
            // Register counts are taken modulo 64
            Self::Register(register) => register.read_from(registers) % 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BranchCondition {
    True,
    False,
    Higher,
    LowerOrSame,
    CarryClear,
    CarrySet,
    NotEqual,
    Equal,
    OverflowClear,
    OverflowSet,
    Plus,
    Minus,
    GreaterOrEqual,
    LessThan,
    GreaterThan,
    LessOrEqual,
}

impl BranchCondition {
    pub(crate) const ALL: [Self; 16] = [
        Self::True,
        Self::False,
        Self::Higher,
        Self::LowerOrSame,
        Self::CarryClear,
        Self::CarrySet,
        Self::NotEqual,
        Self::Equal,
        Self::OverflowClear,
        Self::OverflowSet,
        Self::Plus,
        Self::Minus,
        Self::GreaterOrEqual,
        Self::LessThan,
        Self::GreaterThan,
        Self::LessOrEqual,
    ];

    fn check(self, ccr: ConditionCodes) -> bool {
        match self {
            Self::True => true,
            Self::False => false,
            Self::Higher => !ccr.carry && !ccr.zero,
            Self::LowerOrSame => ccr.carry || ccr.zero,
            Self::CarryClear => !ccr.carry,
            Self::CarrySet => ccr.carry,
            Self::NotEqual => !ccr.zero,
            Self::Equal => ccr.zero,
            Self::OverflowClear => !ccr.overflow,
            Self::OverflowSet => ccr.overflow,
            Self::Plus => !ccr.negative,
            Self::Minus => ccr.negative,
            Self::GreaterOrEqual => ccr.negative == ccr.overflow,
            Self::LessThan => ccr.negative != ccr.overflow,
            Self::GreaterThan => !ccr.zero && ccr.negative == ccr.overflow,
            Self::LessOrEqual => ccr.zero || ccr.negative != ccr.overflow,
        }
    }

    pub(crate) fn mnemonic_suffix(self) -> &'static str {
        match self {
            Self::True => "T",
            Self::False => "F",
            Self::Higher => "HI",
            Self::LowerOrSame => "LS",
            Self::CarryClear => "CC",
            Self::CarrySet => "CS",
            Self::NotEqual => "NE",
            Self::Equal => "EQ",
            Self::OverflowClear => "VC",
            Self::OverflowSet => "VS",
            Self::Plus => "PL",
            Self::Minus => "MI",
            Self::GreaterOrEqual => "GE",
            Self::LessThan => "LT",
            Self::GreaterThan => "GT",
            Self::LessOrEqual => "LE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Instruction {
    Add { size: OpSize, source: AddressingMode, dest: AddressingMode, with_extend: bool },
    AddDecimal { source: AddressingMode, dest: AddressingMode },
    And { size: OpSize, source: AddressingMode, dest: AddressingMode },
    AndToCcr,
    AndToSr,
    ArithmeticShiftMemory(ShiftDirection, AddressingMode),
    ArithmeticShiftRegister(OpSize, ShiftDirection, DataRegister, ShiftCount),
    BitTest { source: AddressingMode, dest: AddressingMode },
    BitTestAndChange { source: AddressingMode, dest: AddressingMode },
    BitTestAndClear { source: AddressingMode, dest: AddressingMode },
    BitTestAndSet { source: AddressingMode, dest: AddressingMode },
    Branch(BranchCondition, i8),
    BranchDecrement(BranchCondition, DataRegister),
    BranchToSubroutine(i8),
    Breakpoint(u8),
    CheckRegister(DataRegister, AddressingMode),
    Clear(OpSize, AddressingMode),
    Compare { size: OpSize, source: AddressingMode, dest: AddressingMode },
    DivideSigned(DataRegister, AddressingMode),
    DivideUnsigned(DataRegister, AddressingMode),
    ExchangeAddress(AddressRegister, AddressRegister),
    ExchangeData(DataRegister, DataRegister),
    ExchangeDataAddress(DataRegister, AddressRegister),
    ExclusiveOr { size: OpSize, source: AddressingMode, dest: AddressingMode },
    ExclusiveOrToCcr,
    ExclusiveOrToSr,
    Extend(OpSize, DataRegister),
    Illegal,
    Jump(AddressingMode),
    JumpToSubroutine(AddressingMode),
    LineA { opcode: u16 },
    LineF { opcode: u16 },
    Link(AddressRegister),
    LoadEffectiveAddress(AddressingMode, AddressRegister),
    LogicalShiftMemory(ShiftDirection, AddressingMode),
    LogicalShiftRegister(OpSize, ShiftDirection, DataRegister, ShiftCount),
    Move { size: OpSize, source: AddressingMode, dest: AddressingMode },
    MoveControl(ControlDirection),
    MoveFromCcr(AddressingMode),
    MoveFromSr(AddressingMode),
    MoveMultiple(OpSize, AddressingMode, Direction),
    MovePeripheral(OpSize, DataRegister, AddressRegister, Direction),
    MoveQuick(i8, DataRegister),
    MoveSpace(OpSize, AddressingMode),
    MoveToCcr(AddressingMode),
    MoveToSr(AddressingMode),
    MoveUsp(UspDirection, AddressRegister),
    MultiplySigned(DataRegister, AddressingMode),
    MultiplyUnsigned(DataRegister, AddressingMode),
    Negate { size: OpSize, dest: AddressingMode, with_extend: bool },
    NegateDecimal(AddressingMode),
    NoOp,
    Not(OpSize, AddressingMode),
    Or { size: OpSize, source: AddressingMode, dest: AddressingMode },
    OrToCcr,
    OrToSr,
    PushEffectiveAddress(AddressingMode),
    Reset,
    Return { restore_ccr: bool },
    ReturnAndDeallocate,
    ReturnFromException,
    RotateMemory(ShiftDirection, AddressingMode),
    RotateRegister(OpSize, ShiftDirection, DataRegister, ShiftCount),
    RotateThruExtendMemory(ShiftDirection, AddressingMode),
    RotateThruExtendRegister(OpSize, ShiftDirection, DataRegister, ShiftCount),
    Set(BranchCondition, AddressingMode),
    Stop,
    Subtract { size: OpSize, source: AddressingMode, dest: AddressingMode, with_extend: bool },
    SubtractDecimal { source: AddressingMode, dest: AddressingMode },
    Swap(DataRegister),
    Test(OpSize, AddressingMode),
    TestAndSet(AddressingMode),
    Trap(u32),
    TrapOnOverflow,
    Unlink(AddressRegister),
    Unmapped { opcode: u16 },
}

impl<B: BusInterface> InstructionExecutor<'_, '_, B> {
    pub(super) fn do_execute(&mut self) -> ExecuteResult<()> {
        use Instruction::*;

        let initial_pc = self.registers.pc_address();
        self.instruction_pc = initial_pc;

        let opcode = self.fetch_operand()?;
        self.opcode = opcode;

        let instruction = decode(opcode);
        log::trace!("Decoded opcode {opcode:04X} (PC={initial_pc:06X}): {instruction:?}");

        match instruction {
            Add { size, source, dest, with_extend } => self.add(size, source, dest, with_extend),
            AddDecimal { source, dest } => self.abcd(source, dest),
            And { size, source, dest } => self.and(size, source, dest),
            AndToCcr => self.andi_to_ccr(),
            AndToSr => self.andi_to_sr(),
            ArithmeticShiftMemory(direction, dest) => self.asd_memory(direction, dest),
            ArithmeticShiftRegister(size, direction, register, count) => {
                self.asd_register(size, direction, register, count);
                Ok(())
            }
            BitTest { source, dest } => self.btst(source, dest),
            BitTestAndChange { source, dest } => self.bchg(source, dest),
            BitTestAndClear { source, dest } => self.bclr(source, dest),
            BitTestAndSet { source, dest } => self.bset(source, dest),
            Branch(condition, displacement) => self.branch(condition, displacement),
            BranchDecrement(condition, register) => self.dbcc(condition, register),
            BranchToSubroutine(displacement) => self.bsr(displacement),
            Breakpoint(vector) => self.bkpt(vector),
            CheckRegister(register, source) => self.chk(register, source),
            Clear(size, dest) => self.clr(size, dest),
            Compare { size, source, dest } => self.cmp(size, source, dest),
            DivideSigned(register, source) => self.divs(register, source),
            DivideUnsigned(register, source) => self.divu(register, source),
            ExchangeAddress(rx, ry) => {
                self.exg_address(rx, ry);
                Ok(())
            }
            ExchangeData(rx, ry) => {
                self.exg_data(rx, ry);
                Ok(())
            }
            ExchangeDataAddress(rx, ry) => {
                self.exg_data_address(rx, ry);
                Ok(())
            }
            ExclusiveOr { size, source, dest } => self.eor(size, source, dest),
            ExclusiveOrToCcr => self.eori_to_ccr(),
            ExclusiveOrToSr => self.eori_to_sr(),
            Extend(size, register) => {
                self.ext(size, register);
                Ok(())
            }
            Illegal => Err(Exception::IllegalInstruction(opcode)),
            Jump(source) => self.jmp(source),
            JumpToSubroutine(source) => self.jsr(source),
            LineA { opcode } => Err(Exception::LineA(opcode)),
            LineF { opcode } => Err(Exception::LineF(opcode)),
            Link(register) => self.link(register),
            LoadEffectiveAddress(source, dest) => self.lea(source, dest),
            LogicalShiftMemory(direction, dest) => self.lsd_memory(direction, dest),
            LogicalShiftRegister(size, direction, register, count) => {
                self.lsd_register(size, direction, register, count);
                Ok(())
            }
            Move { size, source, dest } => self.move_(size, source, dest),
            MoveControl(direction) => self.movec(direction),
            MoveFromCcr(dest) => self.move_from_ccr(dest),
            MoveFromSr(dest) => self.move_from_sr(dest),
            MoveMultiple(size, addressing_mode, direction) => {
                self.movem(size, addressing_mode, direction)
            }
            MovePeripheral(size, d_register, a_register, direction) => {
                self.movep(size, d_register, a_register, direction)
            }
            MoveQuick(data, register) => {
                self.moveq(data, register);
                Ok(())
            }
            MoveSpace(size, addressing_mode) => self.moves(size, addressing_mode),
            MoveToCcr(source) => self.move_to_ccr(source),
            MoveToSr(source) => self.move_to_sr(source),
            MoveUsp(direction, register) => self.move_usp(direction, register),
            MultiplySigned(register, source) => self.muls(register, source),
            MultiplyUnsigned(register, source) => self.mulu(register, source),
            Negate { size, dest, with_extend } => self.neg(size, dest, with_extend),
            NegateDecimal(dest) => self.nbcd(dest),
            NoOp => Ok(()),
            Not(size, dest) => self.not(size, dest),
            Or { size, source, dest } => self.or(size, source, dest),
            OrToCcr => self.ori_to_ccr(),
            OrToSr => self.ori_to_sr(),
            PushEffectiveAddress(source) => self.pea(source),
            Reset => self.reset(),
            Return { restore_ccr } => self.ret(restore_ccr),
            ReturnAndDeallocate => self.rtd(),
            ReturnFromException => self.rte(),
            RotateMemory(direction, dest) => self.rod_memory(direction, dest),
            RotateRegister(size, direction, register, count) => {
                self.rod_register(size, direction, register, count);
                Ok(())
            }
            RotateThruExtendMemory(direction, dest) => self.roxd_memory(direction, dest),
            RotateThruExtendRegister(size, direction, register, count) => {
                self.roxd_register(size, direction, register, count);
                Ok(())
            }
            Set(condition, dest) => self.scc(condition, dest),
            Stop => self.stop(),
            Subtract { size, source, dest, with_extend } => {
                self.sub(size, source, dest, with_extend)
            }
            SubtractDecimal { source, dest } => self.sbcd(source, dest),
            Swap(register) => {
                self.swap(register);
                Ok(())
            }
            Test(size, source) => self.tst(size, source),
            TestAndSet(dest) => self.tas(dest),
            Trap(vector) => controlflow::trap(vector),
            TrapOnOverflow => self.trapv(),
            Unlink(register) => self.unlk(register),
            Unmapped { opcode } => Err(Exception::UnmappedOpcode(opcode)),
        }
    }
}
