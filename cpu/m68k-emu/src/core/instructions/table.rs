use crate::core::instructions::{
    BranchCondition, ControlDirection, Direction, Instruction, ShiftCount, ShiftDirection,
    UspDirection,
};
use crate::core::{AddressRegister, AddressingMode, DataRegister, OpSize};
use std::sync::OnceLock;

type InstructionTable = Box<[Instruction]>;

type Slot = Option<(Instruction, &'static str)>;

impl BranchCondition {
    fn to_bits(self) -> u16 {
        (self as u16) << 8
    }
}

/// Collects handler bindings family by family. Every opcode may be claimed by at most one
/// family; binding an occupied slot to a different instruction is a construction bug.
pub(crate) struct TableBuilder {
    slots: Vec<Slot>,
    family: &'static str,
}

impl TableBuilder {
    fn new() -> Self {
        Self { slots: vec![None; 1 << 16], family: "" }
    }

    fn bind(&mut self, opcode: u16, instruction: Instruction) {
        let family = self.family;
        let slot = &mut self.slots[opcode as usize];

        if let Some((existing, existing_family)) = slot {
            assert!(
                *existing == instruction,
                "opcode {opcode:04X} claimed by both {existing_family} and {family}"
            );
            return;
        }

        *slot = Some((instruction, family));
    }

    #[cfg(test)]
    pub(crate) fn family(&self, opcode: u16) -> Option<&'static str> {
        self.slots[opcode as usize].map(|(_, family)| family)
    }

    fn finish(self) -> InstructionTable {
        self.slots
            .into_iter()
            .zip(0..=u16::MAX)
            .map(|(slot, opcode)| match slot {
                Some((instruction, _)) => instruction,
                None => Instruction::Unmapped { opcode },
            })
            .collect()
    }
}

type Populate = fn(&mut TableBuilder);

const FAMILIES: &[(&str, Populate)] = &[
    ("ABCD", populate_abcd),
    ("ADD", populate_add),
    ("ADDA", populate_adda),
    ("ADDI", populate_addi),
    ("ADDQ", populate_addq),
    ("ADDX", populate_addx),
    ("AND", populate_and),
    ("ANDI", populate_andi),
    ("ASd", populate_asd),
    ("Bcc", populate_bcc),
    ("BCHG", populate_bchg),
    ("BCLR", populate_bclr),
    ("BKPT", populate_bkpt),
    ("BSET", populate_bset),
    ("BSR", populate_bsr),
    ("BTST", populate_btst),
    ("CHK", populate_chk),
    ("CLR", populate_clr),
    ("CMP", populate_cmp),
    ("CMPA", populate_cmpa),
    ("CMPI", populate_cmpi),
    ("CMPM", populate_cmpm),
    ("DBcc", populate_dbcc),
    ("DIVS", populate_divs),
    ("DIVU", populate_divu),
    ("EOR", populate_eor),
    ("EORI", populate_eori),
    ("EXG", populate_exg),
    ("EXT", populate_ext),
    ("ILLEGAL", populate_illegal),
    ("JMP", populate_jmp),
    ("JSR", populate_jsr),
    ("LEA", populate_lea),
    ("LINE-A", populate_line_a),
    ("LINE-F", populate_line_f),
    ("LINK", populate_link),
    ("LSd", populate_lsd),
    ("MOVE", populate_move),
    ("MOVEA", populate_movea),
    ("MOVEC", populate_movec),
    ("MOVEM", populate_movem),
    ("MOVEP", populate_movep),
    ("MOVEQ", populate_moveq),
    ("MOVES", populate_moves),
    ("MOVE CCR/SR/USP", populate_move_ccr_sr_usp),
    ("MULS", populate_muls),
    ("MULU", populate_mulu),
    ("NBCD", populate_nbcd),
    ("NEG", populate_neg),
    ("NEGX", populate_negx),
    ("NOP", populate_nop),
    ("NOT", populate_not),
    ("OR", populate_or),
    ("ORI", populate_ori),
    ("PEA", populate_pea),
    ("RESET", populate_reset),
    ("ROd", populate_rod),
    ("ROXd", populate_roxd),
    ("RTD", populate_rtd),
    ("RTE/RTR/RTS", populate_rte_rtr_rts),
    ("SBCD", populate_sbcd),
    ("Scc", populate_scc),
    ("STOP", populate_stop),
    ("SUB", populate_sub),
    ("SUBA", populate_suba),
    ("SUBI", populate_subi),
    ("SUBQ", populate_subq),
    ("SUBX", populate_subx),
    ("SWAP", populate_swap),
    ("TAS", populate_tas),
    ("TRAP", populate_trap),
    ("TST", populate_tst),
    ("UNLK", populate_unlk),
];

pub(crate) fn build_registry() -> TableBuilder {
    let mut builder = TableBuilder::new();

    for &(family, populate) in FAMILIES {
        builder.family = family;
        populate(&mut builder);
    }

    builder
}

pub(crate) fn decode(opcode: u16) -> Instruction {
    static LOOKUP_TABLE: OnceLock<InstructionTable> = OnceLock::new();

    let lookup_table = LOOKUP_TABLE.get_or_init(|| {
        let table = build_registry().finish();
        let unmapped = table
            .iter()
            .filter(|instruction| matches!(instruction, Instruction::Unmapped { .. }))
            .count();
        log::debug!("Built opcode table; {unmapped} of 65536 opcodes unmapped");
        table
    });
    lookup_table[opcode as usize]
}

fn all_addressing_modes() -> impl Iterator<Item = AddressingMode> {
    DataRegister::ALL
        .iter()
        .copied()
        .map(AddressingMode::DataDirect)
        .chain(AddressRegister::ALL.iter().copied().flat_map(|register| {
            [
                AddressingMode::AddressDirect(register),
                AddressingMode::AddressIndirect(register),
                AddressingMode::AddressIndirectPostincrement(register),
                AddressingMode::AddressIndirectPredecrement(register),
                AddressingMode::AddressIndirectDisplacement(register),
                AddressingMode::AddressIndirectIndexed(register),
            ]
        }))
        .chain([
            AddressingMode::AbsoluteShort,
            AddressingMode::AbsoluteLong,
            AddressingMode::Immediate,
            AddressingMode::PcRelativeDisplacement,
            AddressingMode::PcRelativeIndexed,
        ])
}

// Byte-sized accesses to address registers do not exist
// Byte-sized operations cannot name an address register directly
fn for_size(
    size: OpSize,
    modes: impl Iterator<Item = AddressingMode>,
) -> impl Iterator<Item = AddressingMode> {
    modes.filter(move |mode| size != OpSize::Byte || !mode.is_address_direct())
}

fn source_addressing_modes(size: OpSize) -> impl Iterator<Item = AddressingMode> {
    for_size(size, all_addressing_modes())
}

fn all_addressing_modes_no_address_direct() -> impl Iterator<Item = AddressingMode> {
    all_addressing_modes().filter(|addressing_mode| !addressing_mode.is_address_direct())
}

fn jump_addressing_modes() -> impl Iterator<Item = AddressingMode> {
    // Does not include data direct, address direct, address indirect postincrement,
    // address indirect predecrement, or immediate
    all_addressing_modes().filter(|mode| {
        !matches!(
            mode,
            AddressingMode::DataDirect(..)
                | AddressingMode::AddressDirect(..)
                | AddressingMode::AddressIndirectPostincrement(..)
                | AddressingMode::AddressIndirectPredecrement(..)
                | AddressingMode::Immediate
        )
    })
}

fn dest_addressing_modes() -> impl Iterator<Item = AddressingMode> {
    // Does not include immediate, PC relative displacement, or PC relative indexed
    all_addressing_modes().filter(|mode| {
        !matches!(
            mode,
            AddressingMode::Immediate
                | AddressingMode::PcRelativeDisplacement
                | AddressingMode::PcRelativeIndexed
        )
    })
}

fn dest_addressing_modes_no_address_direct() -> impl Iterator<Item = AddressingMode> {
    dest_addressing_modes().filter(|addressing_mode| !addressing_mode.is_address_direct())
}

fn dest_addressing_modes_no_direct() -> impl Iterator<Item = AddressingMode> {
    dest_addressing_modes().filter(|addressing_mode| {
        !matches!(
            addressing_mode,
            AddressingMode::DataDirect(..) | AddressingMode::AddressDirect(..)
        )
    })
}

fn quick_value(q_value: u16) -> AddressingMode {
    if q_value == 0 { AddressingMode::Quick(8) } else { AddressingMode::Quick(q_value as u8) }
}

fn populate_abcd(table: &mut TableBuilder) {
    for rx in 0..8_u8 {
        for ry in 0..8_u8 {
            // ABCD Dy, Dx
            let data_opcode = 0xC100 | u16::from(ry) | (u16::from(rx) << 9);
            table.bind(
                data_opcode,
                Instruction::AddDecimal {
                    source: AddressingMode::DataDirect(DataRegister(ry)),
                    dest: AddressingMode::DataDirect(DataRegister(rx)),
                },
            );

            // ABCD -(Ay), -(Ax)
            table.bind(
                data_opcode | 0x0008,
                Instruction::AddDecimal {
                    source: AddressingMode::AddressIndirectPredecrement(AddressRegister(ry)),
                    dest: AddressingMode::AddressIndirectPredecrement(AddressRegister(rx)),
                },
            );
        }
    }
}

fn populate_add(table: &mut TableBuilder) {
    for size in OpSize::ALL {
        // ADD <ea>, Dn
        for source in source_addressing_modes(size) {
            for dest in DataRegister::ALL {
                let opcode = 0xD000 | size.to_bits() | source.to_bits() | (u16::from(dest.0) << 9);
                table.bind(
                    opcode,
                    Instruction::Add {
                        size,
                        source,
                        dest: AddressingMode::DataDirect(dest),
                        with_extend: false,
                    },
                );
            }
        }

        // ADD Dn, <ea>
        for source in DataRegister::ALL {
            for dest in dest_addressing_modes_no_direct() {
                let opcode = 0xD100 | size.to_bits() | dest.to_bits() | (u16::from(source.0) << 9);
                table.bind(
                    opcode,
                    Instruction::Add {
                        size,
                        source: AddressingMode::DataDirect(source),
                        dest,
                        with_extend: false,
                    },
                );
            }
        }
    }
}

fn populate_adda(table: &mut TableBuilder) {
    // ADDA <ea>, An
    for source in all_addressing_modes() {
        for dest in AddressRegister::ALL {
            for size in [OpSize::Word, OpSize::LongWord] {
                let size_bit = u16::from(size == OpSize::LongWord) << 8;
                let opcode = 0xD0C0 | size_bit | source.to_bits() | (u16::from(dest.0) << 9);
                table.bind(
                    opcode,
                    Instruction::Add {
                        size,
                        source,
                        dest: AddressingMode::AddressDirect(dest),
                        with_extend: false,
                    },
                );
            }
        }
    }
}

fn populate_addi(table: &mut TableBuilder) {
    // ADDI #<d>, <ea>
    for dest in dest_addressing_modes_no_address_direct() {
        for size in OpSize::ALL {
            let opcode = 0x0600 | size.to_bits() | dest.to_bits();
            table.bind(
                opcode,
                Instruction::Add {
                    size,
                    source: AddressingMode::Immediate,
                    dest,
                    with_extend: false,
                },
            );
        }
    }
}

fn populate_addq(table: &mut TableBuilder) {
    // ADDQ #<d>, <ea>
    populate_quick(table, 0x5000, |size, source, dest| Instruction::Add {
        size,
        source,
        dest,
        with_extend: false,
    });
}

fn populate_quick(
    table: &mut TableBuilder,
    base: u16,
    instruction: impl Fn(OpSize, AddressingMode, AddressingMode) -> Instruction,
) {
    for q_value in 0..8_u16 {
        for size in OpSize::ALL {
            for dest in for_size(size, dest_addressing_modes()) {
                let opcode = base | size.to_bits() | dest.to_bits() | (q_value << 9);
                table.bind(opcode, instruction(size, quick_value(q_value), dest));
            }
        }
    }
}
fn populate_addx(table: &mut TableBuilder) {
    for size in OpSize::ALL {
        for rx in 0..8_u8 {
            for ry in 0..8_u8 {
                // ADDX Dy, Dx
                let data_opcode = 0xD100 | size.to_bits() | u16::from(ry) | (u16::from(rx) << 9);
                table.bind(
                    data_opcode,
                    Instruction::Add {
                        size,
                        source: AddressingMode::DataDirect(DataRegister(ry)),
                        dest: AddressingMode::DataDirect(DataRegister(rx)),
                        with_extend: true,
                    },
                );

                // ADDX -(Ay), -(Ax)
                table.bind(
                    data_opcode | 0x0008,
                    Instruction::Add {
                        size,
                        source: AddressingMode::AddressIndirectPredecrement(AddressRegister(ry)),
                        dest: AddressingMode::AddressIndirectPredecrement(AddressRegister(rx)),
                        with_extend: true,
                    },
                );
            }
        }
    }
}

fn populate_and(table: &mut TableBuilder) {
    for size in OpSize::ALL {
        // AND <ea>, Dn
        for source in all_addressing_modes_no_address_direct() {
            for dest in DataRegister::ALL {
                let opcode = 0xC000 | size.to_bits() | source.to_bits() | (u16::from(dest.0) << 9);
                table.bind(
                    opcode,
                    Instruction::And { size, source, dest: AddressingMode::DataDirect(dest) },
                );
            }
        }

        // AND Dn, <ea>
        for source in DataRegister::ALL {
            for dest in dest_addressing_modes_no_direct() {
                let opcode = 0xC100 | size.to_bits() | dest.to_bits() | (u16::from(source.0) << 9);
                table.bind(
                    opcode,
                    Instruction::And { size, source: AddressingMode::DataDirect(source), dest },
                );
            }
        }
    }
}

fn populate_andi(table: &mut TableBuilder) {
    // ANDI #<d>, <ea>
    for dest in dest_addressing_modes_no_address_direct() {
        for size in OpSize::ALL {
            let opcode = 0x0200 | size.to_bits() | dest.to_bits();
            table.bind(opcode, Instruction::And { size, source: AddressingMode::Immediate, dest });
        }
    }

    // ANDI to CCR/SR
    table.bind(0x023C, Instruction::AndToCcr);
    table.bind(0x027C, Instruction::AndToSr);
}

macro_rules! impl_populate_bit_shift {
    (
        $name:ident,
        $imm_opcode_base:expr,
        $reg_opcode_base:expr,
        $mem_opcode_base:expr,
        $register_instr:ident,
        $memory_instr:ident
    ) => {
        fn $name(table: &mut TableBuilder) {
            for dest in DataRegister::ALL {
                for size in OpSize::ALL {
                    for count_value in 0..8_u8 {
                        for (direction, direction_bit) in
                            [(ShiftDirection::Right, 0x0000), (ShiftDirection::Left, 0x0100)]
                        {
                            // xxd #<d>, Dy
                            let shift = if count_value == 0 {
                                ShiftCount::Constant(8)
                            } else {
                                ShiftCount::Constant(count_value)
                            };
                            let opcode = $imm_opcode_base
                                | direction_bit
                                | size.to_bits()
                                | u16::from(dest.0)
                                | (u16::from(count_value) << 9);
                            table.bind(
                                opcode,
                                Instruction::$register_instr(size, direction, dest, shift),
                            );

                            // xxd Dx, Dy
                            let shift = ShiftCount::Register(DataRegister(count_value));
                            let opcode = $reg_opcode_base
                                | direction_bit
                                | size.to_bits()
                                | u16::from(dest.0)
                                | (u16::from(count_value) << 9);
                            table.bind(
                                opcode,
                                Instruction::$register_instr(size, direction, dest, shift),
                            );
                        }
                    }
                }
            }

            // xxd <ea>
            for dest in dest_addressing_modes_no_direct() {
                let r_opcode = $mem_opcode_base | dest.to_bits();
                let l_opcode = r_opcode | 0x0100;

                table.bind(r_opcode, Instruction::$memory_instr(ShiftDirection::Right, dest));
                table.bind(l_opcode, Instruction::$memory_instr(ShiftDirection::Left, dest));
            }
        }
    };
}

impl_populate_bit_shift!(
    populate_asd,
    0xE000,
    0xE020,
    0xE0C0,
    ArithmeticShiftRegister,
    ArithmeticShiftMemory
);
impl_populate_bit_shift!(
    populate_lsd,
    0xE008,
    0xE028,
    0xE2C0,
    LogicalShiftRegister,
    LogicalShiftMemory
);
impl_populate_bit_shift!(populate_rod, 0xE018, 0xE038, 0xE6C0, RotateRegister, RotateMemory);
impl_populate_bit_shift!(
    populate_roxd,
    0xE010,
    0xE030,
    0xE4C0,
    RotateThruExtendRegister,
    RotateThruExtendMemory
);

fn populate_bcc(table: &mut TableBuilder) {
    // Bcc #<d>; the "false" encoding is BSR
    for condition in BranchCondition::ALL.into_iter().filter(|&cc| cc != BranchCondition::False) {
        for displacement in 0..=0xFF_u16 {
            let opcode = 0x6000 | displacement | condition.to_bits();
            table.bind(opcode, Instruction::Branch(condition, displacement as i8));
        }
    }
}

macro_rules! impl_populate_bit_test {
    ($name:ident, $imm_opcode_base:expr, $reg_opcode_base:expr, $instruction:ident) => {
        fn $name(table: &mut TableBuilder) {
            for dest in dest_addressing_modes_no_address_direct() {
                // Bxxx #<d>, <ea>
                let imm_opcode = $imm_opcode_base | dest.to_bits();
                table.bind(
                    imm_opcode,
                    Instruction::$instruction { source: AddressingMode::Immediate, dest },
                );

                // Bxxx Dn, <ea>
                for source in DataRegister::ALL {
                    let reg_opcode = $reg_opcode_base | dest.to_bits() | (u16::from(source.0) << 9);
                    table.bind(
                        reg_opcode,
                        Instruction::$instruction {
                            source: AddressingMode::DataDirect(source),
                            dest,
                        },
                    );
                }
            }
        }
    };
}

impl_populate_bit_test!(populate_bchg, 0x0840, 0x0140, BitTestAndChange);
impl_populate_bit_test!(populate_bclr, 0x0880, 0x0180, BitTestAndClear);
impl_populate_bit_test!(populate_bset, 0x08C0, 0x01C0, BitTestAndSet);

// BTST also accepts PC relative operands, and immediate operands for the dynamic form
fn populate_btst(table: &mut TableBuilder) {
    for dest in all_addressing_modes_no_address_direct() {
        // BTST #<d>, <ea>
        if dest != AddressingMode::Immediate {
            let imm_opcode = 0x0800 | dest.to_bits();
            table.bind(
                imm_opcode,
                Instruction::BitTest { source: AddressingMode::Immediate, dest },
            );
        }

        // BTST Dn, <ea>
        for source in DataRegister::ALL {
            let reg_opcode = 0x0100 | dest.to_bits() | (u16::from(source.0) << 9);
            table.bind(
                reg_opcode,
                Instruction::BitTest { source: AddressingMode::DataDirect(source), dest },
            );
        }
    }
}

fn populate_bkpt(table: &mut TableBuilder) {
    // BKPT #<d>
    for vector in 0..8_u8 {
        table.bind(0x4848 | u16::from(vector), Instruction::Breakpoint(vector));
    }
}

fn populate_bsr(table: &mut TableBuilder) {
    // BSR #<d>
    for displacement in 0..=0xFF_u16 {
        let opcode = 0x6100 | displacement;
        table.bind(opcode, Instruction::BranchToSubroutine(displacement as i8));
    }
}

fn populate_chk(table: &mut TableBuilder) {
    // CHK <ea>, Dn
    for addressing_mode in all_addressing_modes_no_address_direct() {
        for register in DataRegister::ALL {
            let opcode = 0x4180 | addressing_mode.to_bits() | (u16::from(register.0) << 9);
            table.bind(opcode, Instruction::CheckRegister(register, addressing_mode));
        }
    }
}

fn populate_clr(table: &mut TableBuilder) {
    // CLR <ea>
    for dest in dest_addressing_modes_no_address_direct() {
        for size in OpSize::ALL {
            let opcode = 0x4200 | size.to_bits() | dest.to_bits();
            table.bind(opcode, Instruction::Clear(size, dest));
        }
    }
}

fn populate_cmp(table: &mut TableBuilder) {
    // CMP <ea>, Dn
    for size in OpSize::ALL {
        for source in source_addressing_modes(size) {
            for dest in DataRegister::ALL {
                let opcode = 0xB000 | size.to_bits() | source.to_bits() | (u16::from(dest.0) << 9);
                table.bind(
                    opcode,
                    Instruction::Compare { size, source, dest: AddressingMode::DataDirect(dest) },
                );
            }
        }
    }
}

fn populate_cmpa(table: &mut TableBuilder) {
    // CMPA <ea>, An
    for source in all_addressing_modes() {
        for dest in AddressRegister::ALL {
            for size in [OpSize::Word, OpSize::LongWord] {
                let size_bit = u16::from(size == OpSize::LongWord) << 8;
                let opcode = 0xB0C0 | size_bit | source.to_bits() | (u16::from(dest.0) << 9);
                table.bind(
                    opcode,
                    Instruction::Compare {
                        size,
                        source,
                        dest: AddressingMode::AddressDirect(dest),
                    },
                );
            }
        }
    }
}

fn populate_cmpi(table: &mut TableBuilder) {
    // CMPI #<d>, <ea>
    for dest in dest_addressing_modes_no_address_direct() {
        for size in OpSize::ALL {
            let opcode = 0x0C00 | size.to_bits() | dest.to_bits();
            table.bind(
                opcode,
                Instruction::Compare { size, source: AddressingMode::Immediate, dest },
            );
        }
    }
}

fn populate_cmpm(table: &mut TableBuilder) {
    // CMPM (Ay)+, (Ax)+
    for source in AddressRegister::ALL {
        for dest in AddressRegister::ALL {
            for size in OpSize::ALL {
                let opcode =
                    0xB108 | size.to_bits() | u16::from(source.0) | (u16::from(dest.0) << 9);
                table.bind(
                    opcode,
                    Instruction::Compare {
                        size,
                        source: AddressingMode::AddressIndirectPostincrement(source),
                        dest: AddressingMode::AddressIndirectPostincrement(dest),
                    },
                );
            }
        }
    }
}

fn populate_dbcc(table: &mut TableBuilder) {
    // DBcc Dn, #<d>
    for condition in BranchCondition::ALL {
        for dest in DataRegister::ALL {
            let opcode = 0x50C8 | condition.to_bits() | u16::from(dest.0);
            table.bind(opcode, Instruction::BranchDecrement(condition, dest));
        }
    }
}

fn populate_divs(table: &mut TableBuilder) {
    // DIVS <ea>, Dn
    for source in all_addressing_modes_no_address_direct() {
        for dest in DataRegister::ALL {
            let opcode = 0x81C0 | source.to_bits() | (u16::from(dest.0) << 9);
            table.bind(opcode, Instruction::DivideSigned(dest, source));
        }
    }
}

fn populate_divu(table: &mut TableBuilder) {
    // DIVU <ea>, Dn
    for source in all_addressing_modes_no_address_direct() {
        for dest in DataRegister::ALL {
            let opcode = 0x80C0 | source.to_bits() | (u16::from(dest.0) << 9);
            table.bind(opcode, Instruction::DivideUnsigned(dest, source));
        }
    }
}

fn populate_eor(table: &mut TableBuilder) {
    // EOR Dn, <ea>
    for source in DataRegister::ALL {
        for dest in dest_addressing_modes_no_address_direct() {
            for size in OpSize::ALL {
                let opcode = 0xB100 | size.to_bits() | dest.to_bits() | (u16::from(source.0) << 9);
                table.bind(
                    opcode,
                    Instruction::ExclusiveOr {
                        size,
                        source: AddressingMode::DataDirect(source),
                        dest,
                    },
                );
            }
        }
    }
}

fn populate_eori(table: &mut TableBuilder) {
    // EORI #<d>, <ea>
    for dest in dest_addressing_modes_no_address_direct() {
        for size in OpSize::ALL {
            let opcode = 0x0A00 | size.to_bits() | dest.to_bits();
            table.bind(
                opcode,
                Instruction::ExclusiveOr { size, source: AddressingMode::Immediate, dest },
            );
        }
    }

    // EORI to CCR/SR
    table.bind(0x0A3C, Instruction::ExclusiveOrToCcr);
    table.bind(0x0A7C, Instruction::ExclusiveOrToSr);
}

fn populate_exg(table: &mut TableBuilder) {
    for rx in 0..8_u8 {
        for ry in 0..8_u8 {
            // EXG Dx, Dy
            let data_opcode = 0xC140 | u16::from(ry) | (u16::from(rx) << 9);
            table.bind(data_opcode, Instruction::ExchangeData(DataRegister(rx), DataRegister(ry)));

            // EXG Ax, Ay
            table.bind(
                data_opcode | 0x0008,
                Instruction::ExchangeAddress(AddressRegister(rx), AddressRegister(ry)),
            );

            // EXG Dx, Ay
            let mixed_opcode = 0xC188 | u16::from(ry) | (u16::from(rx) << 9);
            table.bind(
                mixed_opcode,
                Instruction::ExchangeDataAddress(DataRegister(rx), AddressRegister(ry)),
            );
        }
    }
}

fn populate_ext(table: &mut TableBuilder) {
    // EXT Dn
    for register in DataRegister::ALL {
        for size in [OpSize::Word, OpSize::LongWord] {
            let size_bit = u16::from(size == OpSize::LongWord) << 6;
            let opcode = 0x4880 | size_bit | u16::from(register.0);
            table.bind(opcode, Instruction::Extend(size, register));
        }
    }
}

fn populate_illegal(table: &mut TableBuilder) {
    table.bind(0x4AFC, Instruction::Illegal);
}

fn populate_jmp(table: &mut TableBuilder) {
    // JMP <ea>
    for dest in jump_addressing_modes() {
        table.bind(0x4EC0 | dest.to_bits(), Instruction::Jump(dest));
    }
}

fn populate_jsr(table: &mut TableBuilder) {
    // JSR <ea>
    for dest in jump_addressing_modes() {
        table.bind(0x4E80 | dest.to_bits(), Instruction::JumpToSubroutine(dest));
    }
}

fn populate_lea(table: &mut TableBuilder) {
    // LEA <ea>, An
    for source in jump_addressing_modes() {
        for dest in AddressRegister::ALL {
            let opcode = 0x41C0 | source.to_bits() | (u16::from(dest.0) << 9);
            table.bind(opcode, Instruction::LoadEffectiveAddress(source, dest));
        }
    }
}

fn populate_line_a(table: &mut TableBuilder) {
    for opcode in 0xA000..=0xAFFF_u16 {
        table.bind(opcode, Instruction::LineA { opcode });
    }
}

fn populate_line_f(table: &mut TableBuilder) {
    for opcode in 0xF000..=0xFFFF_u16 {
        table.bind(opcode, Instruction::LineF { opcode });
    }
}

fn populate_link(table: &mut TableBuilder) {
    // LINK An, #<d>
    for register in AddressRegister::ALL {
        table.bind(0x4E50 | u16::from(register.0), Instruction::Link(register));
    }
}

fn populate_move(table: &mut TableBuilder) {
    // MOVE <ea>, <ea>
    for size in OpSize::ALL {
        for source in source_addressing_modes(size) {
            for dest in dest_addressing_modes_no_address_direct() {
                // Dest bits are shifted left 6, and mode/register are flipped
                let raw_dest_bits = dest.to_bits();
                let dest_bits = ((raw_dest_bits & 0x07) << 9) | ((raw_dest_bits & 0x38) << 3);

                let opcode = size.to_move_bits() | source.to_bits() | dest_bits;
                table.bind(opcode, Instruction::Move { size, source, dest });
            }
        }
    }
}

fn populate_movea(table: &mut TableBuilder) {
    // MOVEA <ea>, An
    for source in all_addressing_modes() {
        for dest in AddressRegister::ALL {
            for size in [OpSize::Word, OpSize::LongWord] {
                let opcode =
                    0x0040 | size.to_move_bits() | source.to_bits() | (u16::from(dest.0) << 9);
                table.bind(
                    opcode,
                    Instruction::Move { size, source, dest: AddressingMode::AddressDirect(dest) },
                );
            }
        }
    }
}

fn populate_movec(table: &mut TableBuilder) {
    // MOVEC Rc, Rn
    table.bind(0x4E7A, Instruction::MoveControl(ControlDirection::ControlToGeneral));
    // MOVEC Rn, Rc
    table.bind(0x4E7B, Instruction::MoveControl(ControlDirection::GeneralToControl));
}

fn populate_movem(table: &mut TableBuilder) {
    // MOVEM <registers>, <ea>
    for dest in dest_addressing_modes_no_direct()
        .filter(|mode| !matches!(mode, AddressingMode::AddressIndirectPostincrement(..)))
    {
        for size in [OpSize::Word, OpSize::LongWord] {
            let size_bit = u16::from(size == OpSize::LongWord) << 6;
            let opcode = 0x4880 | size_bit | dest.to_bits();
            table.bind(opcode, Instruction::MoveMultiple(size, dest, Direction::RegisterToMemory));
        }
    }

    // MOVEM <ea>, <registers>
    for source in all_addressing_modes().filter(|mode| {
        !matches!(
            mode,
            AddressingMode::DataDirect(..)
                | AddressingMode::AddressDirect(..)
                | AddressingMode::AddressIndirectPredecrement(..)
                | AddressingMode::Immediate
        )
    }) {
        for size in [OpSize::Word, OpSize::LongWord] {
            let size_bit = u16::from(size == OpSize::LongWord) << 6;
            let opcode = 0x4C80 | size_bit | source.to_bits();
            table.bind(
                opcode,
                Instruction::MoveMultiple(size, source, Direction::MemoryToRegister),
            );
        }
    }
}

fn populate_movep(table: &mut TableBuilder) {
    for d_register in DataRegister::ALL {
        for a_register in AddressRegister::ALL {
            for size in [OpSize::Word, OpSize::LongWord] {
                let size_bit = u16::from(size == OpSize::LongWord) << 6;
                let to_register_opcode =
                    0x0108 | size_bit | u16::from(a_register.0) | (u16::from(d_register.0) << 9);
                let from_register_opcode = to_register_opcode | 0x0080;

                // MOVEP (d, Ay), Dx
                table.bind(
                    to_register_opcode,
                    Instruction::MovePeripheral(
                        size,
                        d_register,
                        a_register,
                        Direction::MemoryToRegister,
                    ),
                );

                // MOVEP Dx, (d, Ay)
                table.bind(
                    from_register_opcode,
                    Instruction::MovePeripheral(
                        size,
                        d_register,
                        a_register,
                        Direction::RegisterToMemory,
                    ),
                );
            }
        }
    }
}

fn populate_moveq(table: &mut TableBuilder) {
    // MOVEQ #<d>, Dn
    for dest in DataRegister::ALL {
        for immediate_value in 0..=0xFF_u16 {
            let opcode = 0x7000 | immediate_value | (u16::from(dest.0) << 9);
            table.bind(opcode, Instruction::MoveQuick(immediate_value as i8, dest));
        }
    }
}

fn populate_moves(table: &mut TableBuilder) {
    // MOVES Rn, <ea> / MOVES <ea>, Rn; direction is in the extension word
    for dest in dest_addressing_modes_no_direct() {
        for size in OpSize::ALL {
            let opcode = 0x0E00 | size.to_bits() | dest.to_bits();
            table.bind(opcode, Instruction::MoveSpace(size, dest));
        }
    }
}

fn populate_move_ccr_sr_usp(table: &mut TableBuilder) {
    // MOVE CCR, <ea>
    for dest in dest_addressing_modes_no_address_direct() {
        table.bind(0x42C0 | dest.to_bits(), Instruction::MoveFromCcr(dest));
    }

    // MOVE <ea>, CCR
    for source in all_addressing_modes_no_address_direct() {
        table.bind(0x44C0 | source.to_bits(), Instruction::MoveToCcr(source));
    }

    // MOVE SR, <ea>
    for dest in dest_addressing_modes_no_address_direct() {
        table.bind(0x40C0 | dest.to_bits(), Instruction::MoveFromSr(dest));
    }

    // MOVE <ea>, SR
    for source in all_addressing_modes_no_address_direct() {
        table.bind(0x46C0 | source.to_bits(), Instruction::MoveToSr(source));
    }

    // MOVE An, USP
    // MOVE USP, An
    for register in AddressRegister::ALL {
        let to_usp_opcode = 0x4E60 | u16::from(register.0);
        let from_usp_opcode = to_usp_opcode | 0x0008;

        table.bind(to_usp_opcode, Instruction::MoveUsp(UspDirection::RegisterToUsp, register));
        table.bind(from_usp_opcode, Instruction::MoveUsp(UspDirection::UspToRegister, register));
    }
}

fn populate_muls(table: &mut TableBuilder) {
    // MULS <ea>, Dn
    for source in all_addressing_modes_no_address_direct() {
        for dest in DataRegister::ALL {
            let opcode = 0xC1C0 | source.to_bits() | (u16::from(dest.0) << 9);
            table.bind(opcode, Instruction::MultiplySigned(dest, source));
        }
    }
}

fn populate_mulu(table: &mut TableBuilder) {
    // MULU <ea>, Dn
    for source in all_addressing_modes_no_address_direct() {
        for dest in DataRegister::ALL {
            let opcode = 0xC0C0 | source.to_bits() | (u16::from(dest.0) << 9);
            table.bind(opcode, Instruction::MultiplyUnsigned(dest, source));
        }
    }
}

fn populate_nbcd(table: &mut TableBuilder) {
    // NBCD <ea>
    for dest in dest_addressing_modes_no_address_direct() {
        table.bind(0x4800 | dest.to_bits(), Instruction::NegateDecimal(dest));
    }
}

fn populate_neg(table: &mut TableBuilder) {
    // NEG <ea>
    for dest in dest_addressing_modes_no_address_direct() {
        for size in OpSize::ALL {
            let opcode = 0x4400 | size.to_bits() | dest.to_bits();
            table.bind(opcode, Instruction::Negate { size, dest, with_extend: false });
        }
    }
}

fn populate_negx(table: &mut TableBuilder) {
    // NEGX <ea>
    for dest in dest_addressing_modes_no_address_direct() {
        for size in OpSize::ALL {
            let opcode = 0x4000 | size.to_bits() | dest.to_bits();
            table.bind(opcode, Instruction::Negate { size, dest, with_extend: true });
        }
    }
}

fn populate_nop(table: &mut TableBuilder) {
    table.bind(0x4E71, Instruction::NoOp);
}

fn populate_not(table: &mut TableBuilder) {
    // NOT <ea>
    for dest in dest_addressing_modes_no_address_direct() {
        for size in OpSize::ALL {
            let opcode = 0x4600 | size.to_bits() | dest.to_bits();
            table.bind(opcode, Instruction::Not(size, dest));
        }
    }
}

fn populate_or(table: &mut TableBuilder) {
    for size in OpSize::ALL {
        // OR <ea>, Dn
        for source in all_addressing_modes_no_address_direct() {
            for dest in DataRegister::ALL {
                let opcode = 0x8000 | size.to_bits() | source.to_bits() | (u16::from(dest.0) << 9);
                table.bind(
                    opcode,
                    Instruction::Or { size, source, dest: AddressingMode::DataDirect(dest) },
                );
            }
        }

        // OR Dn, <ea>
        for source in DataRegister::ALL {
            for dest in dest_addressing_modes_no_direct() {
                let opcode = 0x8100 | size.to_bits() | dest.to_bits() | (u16::from(source.0) << 9);
                table.bind(
                    opcode,
                    Instruction::Or { size, source: AddressingMode::DataDirect(source), dest },
                );
            }
        }
    }
}

fn populate_ori(table: &mut TableBuilder) {
    // ORI #<d>, <ea>
    for dest in dest_addressing_modes_no_address_direct() {
        for size in OpSize::ALL {
            let opcode = size.to_bits() | dest.to_bits();
            table.bind(opcode, Instruction::Or { size, source: AddressingMode::Immediate, dest });
        }
    }

    // ORI to CCR/SR
    table.bind(0x003C, Instruction::OrToCcr);
    table.bind(0x007C, Instruction::OrToSr);
}

fn populate_pea(table: &mut TableBuilder) {
    // PEA <ea>
    for source in jump_addressing_modes() {
        table.bind(0x4840 | source.to_bits(), Instruction::PushEffectiveAddress(source));
    }
}

fn populate_reset(table: &mut TableBuilder) {
    table.bind(0x4E70, Instruction::Reset);
}

fn populate_rtd(table: &mut TableBuilder) {
    table.bind(0x4E74, Instruction::ReturnAndDeallocate);
}

fn populate_rte_rtr_rts(table: &mut TableBuilder) {
    table.bind(0x4E73, Instruction::ReturnFromException);
    table.bind(0x4E77, Instruction::Return { restore_ccr: true });
    table.bind(0x4E75, Instruction::Return { restore_ccr: false });
}

fn populate_sbcd(table: &mut TableBuilder) {
    for rx in 0..8_u8 {
        for ry in 0..8_u8 {
            // SBCD Dy, Dx
            let data_opcode = 0x8100 | u16::from(ry) | (u16::from(rx) << 9);
            table.bind(
                data_opcode,
                Instruction::SubtractDecimal {
                    source: AddressingMode::DataDirect(DataRegister(ry)),
                    dest: AddressingMode::DataDirect(DataRegister(rx)),
                },
            );

            // SBCD -(Ay), -(Ax)
            table.bind(
                data_opcode | 0x0008,
                Instruction::SubtractDecimal {
                    source: AddressingMode::AddressIndirectPredecrement(AddressRegister(ry)),
                    dest: AddressingMode::AddressIndirectPredecrement(AddressRegister(rx)),
                },
            );
        }
    }
}

fn populate_scc(table: &mut TableBuilder) {
    // Scc <ea>
    for dest in dest_addressing_modes_no_address_direct() {
        for condition in BranchCondition::ALL {
            let opcode = 0x50C0 | condition.to_bits() | dest.to_bits();
            table.bind(opcode, Instruction::Set(condition, dest));
        }
    }
}

fn populate_stop(table: &mut TableBuilder) {
    table.bind(0x4E72, Instruction::Stop);
}

fn populate_sub(table: &mut TableBuilder) {
    for size in OpSize::ALL {
        // SUB <ea>, Dn
        for source in source_addressing_modes(size) {
            for dest in DataRegister::ALL {
                let opcode = 0x9000 | size.to_bits() | source.to_bits() | (u16::from(dest.0) << 9);
                table.bind(
                    opcode,
                    Instruction::Subtract {
                        size,
                        source,
                        dest: AddressingMode::DataDirect(dest),
                        with_extend: false,
                    },
                );
            }
        }

        // SUB Dn, <ea>
        for source in DataRegister::ALL {
            for dest in dest_addressing_modes_no_direct() {
                let opcode = 0x9100 | size.to_bits() | dest.to_bits() | (u16::from(source.0) << 9);
                table.bind(
                    opcode,
                    Instruction::Subtract {
                        size,
                        source: AddressingMode::DataDirect(source),
                        dest,
                        with_extend: false,
                    },
                );
            }
        }
    }
}

fn populate_suba(table: &mut TableBuilder) {
    // SUBA <ea>, An
    for source in all_addressing_modes() {
        for dest in AddressRegister::ALL {
            for size in [OpSize::Word, OpSize::LongWord] {
                let size_bit = u16::from(size == OpSize::LongWord) << 8;
                let opcode = 0x90C0 | size_bit | source.to_bits() | (u16::from(dest.0) << 9);
                table.bind(
                    opcode,
                    Instruction::Subtract {
                        size,
                        source,
                        dest: AddressingMode::AddressDirect(dest),
                        with_extend: false,
                    },
                );
            }
        }
    }
}

fn populate_subi(table: &mut TableBuilder) {
    // SUBI #<d>, <ea>
    for dest in dest_addressing_modes_no_address_direct() {
        for size in OpSize::ALL {
            let opcode = 0x0400 | size.to_bits() | dest.to_bits();
            table.bind(
                opcode,
                Instruction::Subtract {
                    size,
                    source: AddressingMode::Immediate,
                    dest,
                    with_extend: false,
                },
            );
        }
    }
}

fn populate_subq(table: &mut TableBuilder) {
    // SUBQ #<d>, <ea>
    populate_quick(table, 0x5100, |size, source, dest| Instruction::Subtract {
        size,
        source,
        dest,
        with_extend: false,
    });
}
fn populate_subx(table: &mut TableBuilder) {
    for size in OpSize::ALL {
        for rx in 0..8_u8 {
            for ry in 0..8_u8 {
                // SUBX Dy, Dx
                let data_opcode = 0x9100 | size.to_bits() | u16::from(ry) | (u16::from(rx) << 9);
                table.bind(
                    data_opcode,
                    Instruction::Subtract {
                        size,
                        source: AddressingMode::DataDirect(DataRegister(ry)),
                        dest: AddressingMode::DataDirect(DataRegister(rx)),
                        with_extend: true,
                    },
                );

                // SUBX -(Ay), -(Ax)
                table.bind(
                    data_opcode | 0x0008,
                    Instruction::Subtract {
                        size,
                        source: AddressingMode::AddressIndirectPredecrement(AddressRegister(ry)),
                        dest: AddressingMode::AddressIndirectPredecrement(AddressRegister(rx)),
                        with_extend: true,
                    },
                );
            }
        }
    }
}

fn populate_swap(table: &mut TableBuilder) {
    // SWAP Dn
    for dest in DataRegister::ALL {
        table.bind(0x4840 | u16::from(dest.0), Instruction::Swap(dest));
    }
}

fn populate_tas(table: &mut TableBuilder) {
    // TAS <ea>
    for dest in dest_addressing_modes_no_address_direct() {
        table.bind(0x4AC0 | dest.to_bits(), Instruction::TestAndSet(dest));
    }
}

fn populate_trap(table: &mut TableBuilder) {
    // TRAP #<vector>
    for vector in 0..=0xF_u16 {
        table.bind(0x4E40 | vector, Instruction::Trap(vector.into()));
    }

    // TRAPV
    table.bind(0x4E76, Instruction::TrapOnOverflow);
}

fn populate_tst(table: &mut TableBuilder) {
    // TST <ea>
    for source in dest_addressing_modes_no_address_direct() {
        for size in OpSize::ALL {
            let opcode = 0x4A00 | size.to_bits() | source.to_bits();
            table.bind(opcode, Instruction::Test(size, source));
        }
    }
}

fn populate_unlk(table: &mut TableBuilder) {
    // UNLK An
    for register in AddressRegister::ALL {
        table.bind(0x4E58 | u16::from(register.0), Instruction::Unlink(register));
    }
}
