//! Debugger-facing disassembly built on the same opcode table the CPU executes from.

use crate::core::{
    AddressingMode, BranchCondition, ControlDirection, DataRegister, Direction, Instruction, M68k,
    OpSize, ShiftCount, ShiftDirection, UspDirection, decode, parse_index,
};
use crate::num::{GetBit, WordField};
use crate::traits::BusInterface;
use std::fmt::{Display, Formatter};

/// One disassembled instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disassembly {
    /// Byte address of the opcode word.
    pub address: u32,
    /// Total length in bytes, including extension words.
    pub length: u32,
    pub mnemonic: String,
    pub operands: String,
}

impl Display for Disassembly {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.operands.is_empty() {
            write!(f, "{}", self.mnemonic)
        } else {
            write!(f, "{} {}", self.mnemonic, self.operands)
        }
    }
}

impl M68k {
    /// Disassembles the instruction at the given byte address without modifying CPU state.
    ///
    /// Extension words are read through `bus`, so devices with read side effects should not be
    /// disassembled.
    pub fn disassemble<B: BusInterface>(&self, bus: &mut B, address: u32) -> Disassembly {
        let mut disassembler =
            Disassembler { bus, address_mask: self.model().address_mask(), next: address };

        let opcode = disassembler.next_word();
        let (mnemonic, operands) = disassembler.format(opcode, decode(opcode));

        Disassembly { address, length: disassembler.next.wrapping_sub(address), mnemonic, operands }
    }
}

struct Disassembler<'bus, B> {
    bus: &'bus mut B,
    address_mask: u32,
    next: u32,
}

fn signed_hex(value: i32) -> String {
    if value < 0 { format!("-${:X}", value.unsigned_abs()) } else { format!("${value:X}") }
}

fn sized(mnemonic: &str, size: OpSize) -> String {
    format!("{mnemonic}.{size}")
}

fn shift_mnemonic(base: &str, direction: ShiftDirection) -> String {
    match direction {
        ShiftDirection::Left => format!("{base}L"),
        ShiftDirection::Right => format!("{base}R"),
    }
}

fn shift_count(count: ShiftCount) -> String {
    match count {
        ShiftCount::Constant(count) => format!("#{count}"),
        ShiftCount::Register(register) => format!("D{}", register.0),
    }
}

fn data(register: DataRegister) -> String {
    format!("D{}", register.0)
}

fn control_register_name(code: u16) -> String {
    match code {
        0x000 => "SFC".into(),
        0x001 => "DFC".into(),
        0x800 => "USP".into(),
        0x801 => "VBR".into(),
        _ => format!("${code:03X}"),
    }
}

fn general_register_name(extension: u16) -> String {
    let prefix = if extension.bit(15) { 'A' } else { 'D' };
    format!("{prefix}{}", extension.bits(12..=14))
}

/// Formats a MOVEM register mask as ranges, e.g. `D0-D3/A5/A7`.
fn register_list(mask: u16, reversed: bool) -> String {
    let mask = if reversed { mask.reverse_bits() } else { mask };

    let mut groups = Vec::new();
    for (prefix, bank) in [('D', mask as u8), ('A', (mask >> 8) as u8)] {
        let mut i = 0;
        while i < 8 {
            if !bank.bit(i) {
                i += 1;
                continue;
            }

            let start = i;
            while i < 8 && bank.bit(i) {
                i += 1;
            }
            let end = i - 1;

            groups.push(if start == end {
                format!("{prefix}{start}")
            } else {
                format!("{prefix}{start}-{prefix}{end}")
            });
        }
    }

    groups.join("/")
}

impl<B: BusInterface> Disassembler<'_, B> {
    fn next_word(&mut self) -> u16 {
        let word = self.bus.read_word(self.next & self.address_mask);
        self.next = self.next.wrapping_add(2);
        word
    }

    fn next_long_word(&mut self) -> u32 {
        let high = self.next_word();
        let low = self.next_word();
        (u32::from(high) << 16) | u32::from(low)
    }

    fn operand(&mut self, mode: AddressingMode, size: OpSize) -> String {
        match mode {
            AddressingMode::DataDirect(register) => data(register),
            AddressingMode::AddressDirect(register) => format!("A{}", register.0),
            AddressingMode::AddressIndirect(register) => format!("(A{})", register.0),
            AddressingMode::AddressIndirectPostincrement(register) => {
                format!("(A{})+", register.0)
            }
            AddressingMode::AddressIndirectPredecrement(register) => {
                format!("-(A{})", register.0)
            }
            AddressingMode::AddressIndirectDisplacement(register) => {
                let displacement = self.next_word() as i16;
                format!("{}(A{})", signed_hex(displacement.into()), register.0)
            }
            AddressingMode::AddressIndirectIndexed(register) => {
                let extension = self.next_word();
                let (index, index_size) = parse_index(extension);
                let displacement = extension as i8;
                format!("{}(A{},{index}.{index_size})", signed_hex(displacement.into()), register.0)
            }
            AddressingMode::PcRelativeDisplacement => {
                let base = self.next;
                let displacement = self.next_word() as i16;
                format!("${:X}(PC)", base.wrapping_add(displacement as u32))
            }
            AddressingMode::PcRelativeIndexed => {
                let extension = self.next_word();
                let (index, index_size) = parse_index(extension);
                let displacement = extension as i8;
                format!("{}(PC,{index}.{index_size})", signed_hex(displacement.into()))
            }
            AddressingMode::AbsoluteShort => {
                let address = self.next_word() as i16 as u32;
                format!("${address:X}.W")
            }
            AddressingMode::AbsoluteLong => {
                let address = self.next_long_word();
                format!("${address:X}.L")
            }
            AddressingMode::Immediate => {
                let value = match size {
                    OpSize::Byte => u32::from(self.next_word() & 0x00FF),
                    OpSize::Word => self.next_word().into(),
                    OpSize::LongWord => self.next_long_word(),
                };
                format!("#${value:X}")
            }
            AddressingMode::Quick(value) => format!("#{value}"),
        }
    }

    fn binary(
        &mut self,
        mnemonic: String,
        size: OpSize,
        source: AddressingMode,
        dest: AddressingMode,
    ) -> (String, String) {
        let source = self.operand(source, size);
        let dest = self.operand(dest, size);
        (mnemonic, format!("{source},{dest}"))
    }

    fn unary(&mut self, mnemonic: String, size: OpSize, dest: AddressingMode) -> (String, String) {
        let dest = self.operand(dest, size);
        (mnemonic, dest)
    }

    fn branch_target(&mut self, displacement: i8) -> (String, String) {
        let base = self.next;
        if displacement == 0 {
            let displacement = self.next_word() as i16;
            (".W".into(), format!("${:X}", base.wrapping_add(displacement as u32)))
        } else {
            (".S".into(), format!("${:X}", base.wrapping_add(displacement as u32)))
        }
    }

    fn format(&mut self, opcode: u16, instruction: Instruction) -> (String, String) {
        use Instruction::*;

        match instruction {
            Add { size, source, dest, with_extend } => {
                let mnemonic = arithmetic_mnemonic("ADD", size, source, dest, with_extend);
                self.binary(mnemonic, size, source, dest)
            }
            Subtract { size, source, dest, with_extend } => {
                let mnemonic = arithmetic_mnemonic("SUB", size, source, dest, with_extend);
                self.binary(mnemonic, size, source, dest)
            }
            AddDecimal { source, dest } => self.binary("ABCD".into(), OpSize::Byte, source, dest),
            SubtractDecimal { source, dest } => {
                self.binary("SBCD".into(), OpSize::Byte, source, dest)
            }
            Compare { size, source, dest } => {
                let base = match (source, dest) {
                    (_, AddressingMode::AddressDirect(..)) => "CMPA",
                    (AddressingMode::Immediate, _) => "CMPI",
                    (
                        AddressingMode::AddressIndirectPostincrement(..),
                        AddressingMode::AddressIndirectPostincrement(..),
                    ) => "CMPM",
                    _ => "CMP",
                };
                self.binary(sized(base, size), size, source, dest)
            }
            And { size, source, dest } => {
                let base = if source == AddressingMode::Immediate { "ANDI" } else { "AND" };
                self.binary(sized(base, size), size, source, dest)
            }
            Or { size, source, dest } => {
                let base = if source == AddressingMode::Immediate { "ORI" } else { "OR" };
                self.binary(sized(base, size), size, source, dest)
            }
            ExclusiveOr { size, source, dest } => {
                let base = if source == AddressingMode::Immediate { "EORI" } else { "EOR" };
                self.binary(sized(base, size), size, source, dest)
            }
            AndToCcr => self.to_status("ANDI", "CCR", OpSize::Byte),
            OrToCcr => self.to_status("ORI", "CCR", OpSize::Byte),
            ExclusiveOrToCcr => self.to_status("EORI", "CCR", OpSize::Byte),
            AndToSr => self.to_status("ANDI", "SR", OpSize::Word),
            OrToSr => self.to_status("ORI", "SR", OpSize::Word),
            ExclusiveOrToSr => self.to_status("EORI", "SR", OpSize::Word),
            ArithmeticShiftMemory(direction, dest) => self.shift_memory("AS", direction, dest),
            LogicalShiftMemory(direction, dest) => self.shift_memory("LS", direction, dest),
            RotateMemory(direction, dest) => self.shift_memory("RO", direction, dest),
            RotateThruExtendMemory(direction, dest) => self.shift_memory("ROX", direction, dest),
            ArithmeticShiftRegister(size, direction, register, count) => {
                shift_register("AS", size, direction, register, count)
            }
            LogicalShiftRegister(size, direction, register, count) => {
                shift_register("LS", size, direction, register, count)
            }
            RotateRegister(size, direction, register, count) => {
                shift_register("RO", size, direction, register, count)
            }
            RotateThruExtendRegister(size, direction, register, count) => {
                shift_register("ROX", size, direction, register, count)
            }
            BitTest { source, dest } => self.binary("BTST".into(), OpSize::Byte, source, dest),
            BitTestAndChange { source, dest } => {
                self.binary("BCHG".into(), OpSize::Byte, source, dest)
            }
            BitTestAndClear { source, dest } => {
                self.binary("BCLR".into(), OpSize::Byte, source, dest)
            }
            BitTestAndSet { source, dest } => {
                self.binary("BSET".into(), OpSize::Byte, source, dest)
            }
            Branch(condition, displacement) => {
                let base = match condition {
                    BranchCondition::True => "BRA".to_string(),
                    _ => format!("B{}", condition.mnemonic_suffix()),
                };
                let (suffix, target) = self.branch_target(displacement);
                (base + &suffix, target)
            }
            BranchToSubroutine(displacement) => {
                let (suffix, target) = self.branch_target(displacement);
                (format!("BSR{suffix}"), target)
            }
            BranchDecrement(condition, register) => {
                let base = self.next;
                let displacement = self.next_word() as i16;
                (
                    format!("DB{}", condition.mnemonic_suffix()),
                    format!("{},${:X}", data(register), base.wrapping_add(displacement as u32)),
                )
            }
            Breakpoint(vector) => ("BKPT".into(), format!("#{vector}")),
            CheckRegister(register, source) => {
                let source = self.operand(source, OpSize::Word);
                ("CHK.W".into(), format!("{source},{}", data(register)))
            }
            Clear(size, dest) => self.unary(sized("CLR", size), size, dest),
            DivideSigned(register, source) => self.word_to_register("DIVS.W", source, register),
            DivideUnsigned(register, source) => self.word_to_register("DIVU.W", source, register),
            MultiplySigned(register, source) => self.word_to_register("MULS.W", source, register),
            MultiplyUnsigned(register, source) => {
                self.word_to_register("MULU.W", source, register)
            }
            ExchangeAddress(rx, ry) => ("EXG".into(), format!("A{},A{}", rx.0, ry.0)),
            ExchangeData(rx, ry) => ("EXG".into(), format!("{},{}", data(rx), data(ry))),
            ExchangeDataAddress(rx, ry) => ("EXG".into(), format!("{},A{}", data(rx), ry.0)),
            Extend(size, register) => (sized("EXT", size), data(register)),
            Illegal => ("ILLEGAL".into(), String::new()),
            Jump(dest) => self.unary("JMP".into(), OpSize::LongWord, dest),
            JumpToSubroutine(dest) => self.unary("JSR".into(), OpSize::LongWord, dest),
            LineA { opcode } => ("LINEA".into(), format!("${opcode:04X}")),
            LineF { opcode } => ("LINEF".into(), format!("${opcode:04X}")),
            Link(register) => {
                let displacement = self.next_word() as i16;
                ("LINK".into(), format!("A{},#{}", register.0, signed_hex(displacement.into())))
            }
            Unlink(register) => ("UNLK".into(), format!("A{}", register.0)),
            LoadEffectiveAddress(source, register) => {
                let source = self.operand(source, OpSize::LongWord);
                ("LEA".into(), format!("{source},A{}", register.0))
            }
            PushEffectiveAddress(source) => self.unary("PEA".into(), OpSize::LongWord, source),
            Move { size, source, dest } => {
                let base = if dest.is_address_direct() { "MOVEA" } else { "MOVE" };
                self.binary(sized(base, size), size, source, dest)
            }
            MoveQuick(value, register) => {
                ("MOVEQ".into(), format!("#{},{}", signed_hex(value.into()), data(register)))
            }
            MoveFromSr(dest) => {
                let dest = self.operand(dest, OpSize::Word);
                ("MOVE.W".into(), format!("SR,{dest}"))
            }
            MoveFromCcr(dest) => {
                let dest = self.operand(dest, OpSize::Word);
                ("MOVE.W".into(), format!("CCR,{dest}"))
            }
            MoveToSr(source) => {
                let source = self.operand(source, OpSize::Word);
                ("MOVE.W".into(), format!("{source},SR"))
            }
            MoveToCcr(source) => {
                let source = self.operand(source, OpSize::Word);
                ("MOVE.W".into(), format!("{source},CCR"))
            }
            MoveUsp(direction, register) => {
                let operands = match direction {
                    UspDirection::RegisterToUsp => format!("A{},USP", register.0),
                    UspDirection::UspToRegister => format!("USP,A{}", register.0),
                };
                ("MOVE.L".into(), operands)
            }
            MoveMultiple(size, mode, direction) => {
                let mask = self.next_word();
                let reversed = matches!(mode, AddressingMode::AddressIndirectPredecrement(..));
                let registers = register_list(mask, reversed);
                let ea = self.operand(mode, size);
                let operands = match direction {
                    Direction::RegisterToMemory => format!("{registers},{ea}"),
                    Direction::MemoryToRegister => format!("{ea},{registers}"),
                };
                (sized("MOVEM", size), operands)
            }
            MovePeripheral(size, d_register, a_register, direction) => {
                let displacement = self.next_word() as i16;
                let memory = format!("{}(A{})", signed_hex(displacement.into()), a_register.0);
                let operands = match direction {
                    Direction::RegisterToMemory => format!("{},{memory}", data(d_register)),
                    Direction::MemoryToRegister => format!("{memory},{}", data(d_register)),
                };
                (sized("MOVEP", size), operands)
            }
            MoveControl(direction) => {
                let extension = self.next_word();
                let general = general_register_name(extension);
                let control = control_register_name(extension.bits(0..=11));
                let operands = match direction {
                    ControlDirection::ControlToGeneral => format!("{control},{general}"),
                    ControlDirection::GeneralToControl => format!("{general},{control}"),
                };
                ("MOVEC".into(), operands)
            }
            MoveSpace(size, mode) => {
                let extension = self.next_word();
                let general = general_register_name(extension);
                let ea = self.operand(mode, size);
                let operands = if extension.bit(11) {
                    format!("{general},{ea}")
                } else {
                    format!("{ea},{general}")
                };
                (sized("MOVES", size), operands)
            }
            Negate { size, dest, with_extend } => {
                let base = if with_extend { "NEGX" } else { "NEG" };
                self.unary(sized(base, size), size, dest)
            }
            NegateDecimal(dest) => self.unary("NBCD".into(), OpSize::Byte, dest),
            Not(size, dest) => self.unary(sized("NOT", size), size, dest),
            NoOp => ("NOP".into(), String::new()),
            Reset => ("RESET".into(), String::new()),
            Return { restore_ccr } => {
                let mnemonic = if restore_ccr { "RTR" } else { "RTS" };
                (mnemonic.into(), String::new())
            }
            ReturnAndDeallocate => {
                let displacement = self.next_word() as i16;
                ("RTD".into(), format!("#{}", signed_hex(displacement.into())))
            }
            ReturnFromException => ("RTE".into(), String::new()),
            Set(condition, dest) => {
                self.unary(format!("S{}", condition.mnemonic_suffix()), OpSize::Byte, dest)
            }
            Stop => {
                let sr = self.next_word();
                ("STOP".into(), format!("#${sr:04X}"))
            }
            Swap(register) => ("SWAP".into(), data(register)),
            Test(size, source) => self.unary(sized("TST", size), size, source),
            TestAndSet(dest) => self.unary("TAS".into(), OpSize::Byte, dest),
            Trap(vector) => ("TRAP".into(), format!("#{vector}")),
            TrapOnOverflow => ("TRAPV".into(), String::new()),
            Unmapped { .. } => ("DC.W".into(), format!("${opcode:04X}")),
        }
    }

    fn shift_memory(
        &mut self,
        base: &str,
        direction: ShiftDirection,
        dest: AddressingMode,
    ) -> (String, String) {
        let mnemonic = sized(&shift_mnemonic(base, direction), OpSize::Word);
        self.unary(mnemonic, OpSize::Word, dest)
    }

    fn to_status(&mut self, mnemonic: &str, register: &str, size: OpSize) -> (String, String) {
        let value = self.operand(AddressingMode::Immediate, size);
        (sized(mnemonic, size), format!("{value},{register}"))
    }

    fn word_to_register(
        &mut self,
        mnemonic: &str,
        source: AddressingMode,
        register: DataRegister,
    ) -> (String, String) {
        let source = self.operand(source, OpSize::Word);
        (mnemonic.into(), format!("{source},{}", data(register)))
    }
}

fn arithmetic_mnemonic(
    base: &str,
    size: OpSize,
    source: AddressingMode,
    dest: AddressingMode,
    with_extend: bool,
) -> String {
    let suffix = match (source, dest) {
        _ if with_extend => "X",
        (_, AddressingMode::AddressDirect(..)) if !matches!(source, AddressingMode::Quick(..)) => {
            "A"
        }
        (AddressingMode::Immediate, _) => "I",
        (AddressingMode::Quick(..), _) => "Q",
        _ => "",
    };
    format!("{base}{suffix}.{size}")
}

fn shift_register(
    base: &str,
    size: OpSize,
    direction: ShiftDirection,
    register: DataRegister,
    count: ShiftCount,
) -> (String, String) {
    let operands = format!("{},{}", shift_count(count), data(register));
    (sized(&shift_mnemonic(base, direction), size), operands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::InMemoryBus;
    use crate::config::{CpuModel, EngineConfig};
    use test_log::test;

    fn disassemble_words(words: &[u16]) -> Disassembly {
        let mut bus = InMemoryBus::new();
        bus.load_words(0x1000, words);

        let cpu = M68k::new(EngineConfig { model: CpuModel::M68010, ..EngineConfig::default() });
        cpu.disassemble(&mut bus, 0x1000)
    }

    #[test]
    fn simple_instructions() {
        let disassembly = disassemble_words(&[0x4E71]);
        assert_eq!(disassembly.to_string(), "NOP");
        assert_eq!(disassembly.length, 2);

        assert_eq!(disassemble_words(&[0x70FF]).to_string(), "MOVEQ #-$1,D0");
        assert_eq!(disassemble_words(&[0x4AFC]).to_string(), "ILLEGAL");
        assert_eq!(disassemble_words(&[0x4E75]).to_string(), "RTS");
    }

    #[test]
    fn extension_words_are_consumed() {
        // MOVE.L #$12345678,D1
        let disassembly = disassemble_words(&[0x223C, 0x1234, 0x5678]);
        assert_eq!(disassembly.to_string(), "MOVE.L #$12345678,D1");
        assert_eq!(disassembly.length, 6);

        // ADDI.B #$5,$1234.W
        let disassembly = disassemble_words(&[0x0638, 0x0005, 0x1234]);
        assert_eq!(disassembly.to_string(), "ADDI.B #$5,$1234.W");
        assert_eq!(disassembly.length, 6);
    }

    #[test]
    fn quick_and_address_forms() {
        // SUBQ.W #1,-(A0)
        assert_eq!(disassemble_words(&[0x5360]).to_string(), "SUBQ.W #1,-(A0)");
        // ADDQ.L #8,A7
        assert_eq!(disassemble_words(&[0x508F]).to_string(), "ADDQ.L #8,A7");
        // ADDA.W D0,A1
        assert_eq!(disassemble_words(&[0xD2C0]).to_string(), "ADDA.W D0,A1");
        // ADDX.L D1,D0
        assert_eq!(disassemble_words(&[0xD181]).to_string(), "ADDX.L D1,D0");
    }

    #[test]
    fn branches_show_targets() {
        // BRA.S *+4
        let disassembly = disassemble_words(&[0x6002]);
        assert_eq!(disassembly.to_string(), "BRA.S $1004");

        // BNE.W with a word displacement relative to the extension word
        let disassembly = disassemble_words(&[0x6600, 0x0010]);
        assert_eq!(disassembly.to_string(), "BNE.W $1012");
        assert_eq!(disassembly.length, 4);

        // DBF D3,*
        assert_eq!(disassemble_words(&[0x51CB, 0xFFFE]).to_string(), "DBF D3,$1000");
    }

    #[test]
    fn movem_register_lists() {
        // MOVEM.L D0-D2/A6,-(A7)
        assert_eq!(
            disassemble_words(&[0x48E7, 0xE002]).to_string(),
            "MOVEM.L D0-D2/A6,-(A7)"
        );
        // MOVEM.W (A7)+,D0/D3
        assert_eq!(disassemble_words(&[0x4C9F, 0x0009]).to_string(), "MOVEM.W (A7)+,D0/D3");
    }

    #[test]
    fn privileged_and_68010_forms() {
        assert_eq!(disassemble_words(&[0x4E72, 0x2700]).to_string(), "STOP #$2700");
        assert_eq!(disassemble_words(&[0x4E7B, 0x8801]).to_string(), "MOVEC A0,VBR");
        assert_eq!(disassemble_words(&[0x4E7A, 0x1000]).to_string(), "MOVEC SFC,D1");
        assert_eq!(disassemble_words(&[0x027C, 0xF8FF]).to_string(), "ANDI.W #$F8FF,SR");
    }

    #[test]
    fn unmapped_opcode_is_data() {
        // MOVE.B to an address register does not exist
        let disassembly = disassemble_words(&[0x1040]);
        assert_eq!(disassembly.to_string(), "DC.W $1040");
    }
}
