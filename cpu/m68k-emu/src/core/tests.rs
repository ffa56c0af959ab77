use super::*;
use crate::bus::InMemoryBus;
use crate::config::AlignmentPolicy;
use crate::core::instructions::build_registry;
use test_log::test;

const PROGRAM: u32 = 0x1000;
const STACK: u32 = 0x8000;

fn handler(vector: u32) -> u32 {
    0x4000 + 0x10 * vector
}

fn setup_with(config: EngineConfig, words: &[u16]) -> (M68k, InMemoryBus) {
    let mut bus = InMemoryBus::new();
    for vector in 2..64 {
        bus.write_long_word(vector * 4, handler(vector));
    }
    bus.write_long_word(0, STACK);
    bus.write_long_word(4, PROGRAM);
    bus.load_words(PROGRAM, words);

    let mut cpu = M68k::new(config);
    cpu.reset(&mut bus);

    (cpu, bus)
}

fn setup(words: &[u16]) -> (M68k, InMemoryBus) {
    setup_with(EngineConfig::default(), words)
}

fn setup_68010(words: &[u16]) -> (M68k, InMemoryBus) {
    setup_with(EngineConfig::default().with_model(CpuModel::M68010), words)
}

fn ccr(cpu: &M68k) -> u16 {
    cpu.status_register() & 0x001F
}

#[test]
fn opcode_table_families() {
    let registry = build_registry();

    assert_eq!(registry.family(0x4AFC), Some("ILLEGAL"));
    assert_eq!(registry.family(0x6100), Some("BSR"));
    assert_eq!(registry.family(0x4E71), Some("NOP"));
    assert_eq!(registry.family(0x4E75), Some("RTE/RTR/RTS"));
    assert_eq!(registry.family(0xA123), Some("LINE-A"));
    assert_eq!(registry.family(0xF000), Some("LINE-F"));
    // MOVE.B to an address register
    assert_eq!(registry.family(0x1040), None);

    assert_eq!(decode(0x1040), Instruction::Unmapped { opcode: 0x1040 });
    assert_eq!(decode(0x4E71), Instruction::NoOp);
}

#[test]
fn reset_loads_stack_and_pc() {
    let (cpu, _) = setup(&[0x4E71]);

    assert_eq!(cpu.stack_pointer(), STACK);
    assert_eq!(cpu.pc_address(), PROGRAM);
    assert_eq!(cpu.pc(), PROGRAM >> 1);
    assert_eq!(cpu.status_register(), 0x2700);
}

#[test]
fn status_register_write_mask() {
    let (mut cpu, _) = setup(&[]);

    cpu.set_status_register(0xFFFF);
    assert_eq!(cpu.status_register(), 0xA71F);
}

#[test]
fn subq_predecrement_applies_once() {
    // SUBQ.W #1,-(A0)
    let (mut cpu, mut bus) = setup(&[0x5360]);
    cpu.set_address_registers([0x2002, 0, 0, 0, 0, 0, 0]);
    bus.write_word(0x2000, 0x0005);

    cpu.step(&mut bus);

    assert_eq!(cpu.address_registers()[0], 0x2000);
    assert_eq!(bus.read_word(0x2000), 0x0004);
    assert_eq!(cpu.pc_address(), PROGRAM + 2);
}

#[test]
fn addx_zero_flag_only_clears() {
    // ADDX.L D1,D0 three times
    let (mut cpu, mut bus) = setup(&[0xD181, 0xD181, 0xD181]);
    cpu.set_status_register(0x2704);

    cpu.step(&mut bus);
    assert_eq!(ccr(&cpu) & 0x04, 0x04);

    cpu.set_data_registers([1, 0, 0, 0, 0, 0, 0, 0]);
    cpu.step(&mut bus);
    assert_eq!(ccr(&cpu) & 0x04, 0);

    cpu.set_data_registers([0, 0, 0, 0, 0, 0, 0, 0]);
    cpu.step(&mut bus);
    assert_eq!(ccr(&cpu) & 0x04, 0);
}

#[test]
fn privileged_instructions_in_user_mode() {
    let programs: [&[u16]; 9] = [
        // MOVE #$2000,SR
        &[0x46FC, 0x2000],
        // ANDI #$F8FF,SR
        &[0x027C, 0xF8FF],
        // ORI #$0700,SR
        &[0x007C, 0x0700],
        // EORI #$2000,SR
        &[0x0A7C, 0x2000],
        // MOVE A0,USP
        &[0x4E60],
        // MOVE USP,A0
        &[0x4E68],
        // STOP #$2000
        &[0x4E72, 0x2000],
        // RESET
        &[0x4E70],
        // RTE
        &[0x4E73],
    ];

    for program in programs {
        let (mut cpu, mut bus) = setup(program);
        cpu.set_status_register(0x0000);
        cpu.set_user_stack_pointer(0x6000);

        cpu.step(&mut bus);

        assert_eq!(cpu.pc_address(), handler(vectors::PRIVILEGE_VIOLATION), "{program:04X?}");
        assert!(cpu.is_supervisor_mode());
        assert!(!cpu.is_stopped());
        assert_eq!(cpu.stack_pointer(), STACK - 6);
        assert_eq!(cpu.user_stack_pointer(), 0x6000);
        assert_eq!(bus.read_word(STACK - 6), 0x0000);
        assert_eq!(bus.read_long_word(STACK - 4), PROGRAM);
        assert_eq!(cpu.address_registers()[0], 0);
        assert_eq!(bus.reset_count(), 0);
    }
}

#[test]
fn reset_instruction_signals_devices() {
    let (mut cpu, mut bus) = setup(&[0x4E70]);

    cpu.step(&mut bus);

    assert_eq!(bus.reset_count(), 1);
    assert_eq!(cpu.pc_address(), PROGRAM + 2);
}

#[test]
fn moveq_sign_extends() {
    // MOVEQ #-1,D1
    let (mut cpu, mut bus) = setup(&[0x72FF]);

    cpu.step(&mut bus);

    assert_eq!(cpu.data_registers()[1], 0xFFFF_FFFF);
    assert_eq!(ccr(&cpu), 0x08);
}

#[test]
fn divu_by_zero_traps() {
    // DIVU #0,D1
    let (mut cpu, mut bus) = setup(&[0x82FC, 0x0000]);
    cpu.set_data_registers([0, 0x1234, 0, 0, 0, 0, 0, 0]);

    cpu.step(&mut bus);

    assert_eq!(cpu.pc_address(), handler(vectors::DIVISION_BY_ZERO));
    assert_eq!(cpu.data_registers()[1], 0x1234);
    // Traps stack the address of the next instruction
    assert_eq!(bus.read_long_word(STACK - 4), PROGRAM + 4);
}

#[test]
fn divs_overflow_leaves_register() {
    // DIVS #1,D0
    let (mut cpu, mut bus) = setup(&[0x81FC, 0x0001]);
    cpu.set_data_registers([0x0010_0000, 0, 0, 0, 0, 0, 0, 0]);

    cpu.step(&mut bus);

    assert_eq!(cpu.data_registers()[0], 0x0010_0000);
    assert_eq!(ccr(&cpu) & 0x03, 0x02);
}

#[test]
fn divs_quotient_and_remainder() {
    // DIVS #-2,D0
    let (mut cpu, mut bus) = setup(&[0x81FC, 0xFFFE]);
    cpu.set_data_registers([7, 0, 0, 0, 0, 0, 0, 0]);

    cpu.step(&mut bus);

    // Quotient -3, remainder 1
    assert_eq!(cpu.data_registers()[0], 0x0001_FFFD);
    assert_eq!(ccr(&cpu), 0x08);
}

#[test]
fn link_unlink_restores_frame() {
    // LINK A6,#-8; UNLK A6
    let (mut cpu, mut bus) = setup(&[0x4E56, 0xFFF8, 0x4E5E]);
    cpu.set_address_registers([0, 0, 0, 0, 0, 0, 0x1234_5678]);

    cpu.step(&mut bus);
    assert_eq!(cpu.address_registers()[6], STACK - 4);
    assert_eq!(cpu.stack_pointer(), STACK - 12);
    assert_eq!(bus.read_long_word(STACK - 4), 0x1234_5678);

    cpu.step(&mut bus);
    assert_eq!(cpu.address_registers()[6], 0x1234_5678);
    assert_eq!(cpu.stack_pointer(), STACK);
}

#[test]
fn abcd_decimal_carry() {
    // ABCD D1,D0 twice
    let (mut cpu, mut bus) = setup(&[0xC101, 0xC101]);
    cpu.set_status_register(0x2704);
    cpu.set_data_registers([0x09, 0x01, 0, 0, 0, 0, 0, 0]);

    cpu.step(&mut bus);
    assert_eq!(cpu.data_registers()[0], 0x10);
    assert_eq!(ccr(&cpu) & 0x15, 0);

    cpu.set_status_register(0x2704);
    cpu.set_data_registers([0x99, 0x01, 0, 0, 0, 0, 0, 0]);

    cpu.step(&mut bus);
    assert_eq!(cpu.data_registers()[0], 0x00);
    // X, Z and C
    assert_eq!(ccr(&cpu) & 0x15, 0x15);
}

#[test]
fn asl_word_register() {
    // ASL.W #2,D0
    let (mut cpu, mut bus) = setup(&[0xE540]);
    cpu.set_data_registers([0xFFFF_4000, 0, 0, 0, 0, 0, 0, 0]);

    cpu.step(&mut bus);

    assert_eq!(cpu.data_registers()[0], 0xFFFF_0000);
    assert_eq!(ccr(&cpu), 0x17);
}

#[test]
fn movem_round_trip() {
    // MOVEM.L D0-D1/A0,-(A7); MOVEM.L (A7)+,D2-D3/A1
    let (mut cpu, mut bus) = setup(&[0x48E7, 0xC080, 0x4CDF, 0x020C]);
    cpu.set_data_registers([0x1111_1111, 0x2222_2222, 0, 0, 0, 0, 0, 0]);
    cpu.set_address_registers([0x3333_3333, 0, 0, 0, 0, 0, 0]);

    cpu.step(&mut bus);
    assert_eq!(cpu.stack_pointer(), STACK - 12);
    assert_eq!(bus.read_long_word(STACK - 12), 0x1111_1111);
    assert_eq!(bus.read_long_word(STACK - 8), 0x2222_2222);
    assert_eq!(bus.read_long_word(STACK - 4), 0x3333_3333);

    cpu.step(&mut bus);
    assert_eq!(cpu.stack_pointer(), STACK);
    assert_eq!(cpu.data_registers()[2], 0x1111_1111);
    assert_eq!(cpu.data_registers()[3], 0x2222_2222);
    assert_eq!(cpu.address_registers()[1], 0x3333_3333);
}

#[test]
fn bsr_and_rts() {
    // BSR.S *+6; NOP; NOP; RTS
    let (mut cpu, mut bus) = setup(&[0x6104, 0x4E71, 0x4E71, 0x4E75]);

    cpu.step(&mut bus);
    assert_eq!(cpu.pc_address(), PROGRAM + 6);
    assert_eq!(bus.read_long_word(STACK - 4), PROGRAM + 2);

    cpu.step(&mut bus);
    assert_eq!(cpu.pc_address(), PROGRAM + 2);
    assert_eq!(cpu.stack_pointer(), STACK);
}

#[test]
fn dbf_counts_down_to_minus_one() {
    // DBF D0,*
    let (mut cpu, mut bus) = setup(&[0x51C8, 0xFFFE]);
    cpu.set_data_registers([0xABCD_0002, 0, 0, 0, 0, 0, 0, 0]);

    for _ in 0..2 {
        cpu.step(&mut bus);
        assert_eq!(cpu.pc_address(), PROGRAM);
    }

    cpu.step(&mut bus);
    assert_eq!(cpu.pc_address(), PROGRAM + 4);
    assert_eq!(cpu.data_registers()[0], 0xABCD_FFFF);
}

#[test]
fn movec_requires_68010() {
    // MOVEC A0,VBR
    let program = [0x4E7B, 0x8801];

    let (mut cpu, mut bus) = setup(&program);
    cpu.step(&mut bus);
    assert_eq!(cpu.pc_address(), handler(vectors::ILLEGAL_INSTRUCTION));
    assert_eq!(bus.read_long_word(STACK - 4), PROGRAM);

    let (mut cpu, mut bus) = setup_68010(&program);
    cpu.set_address_registers([0x0010_0000, 0, 0, 0, 0, 0, 0]);
    cpu.step(&mut bus);
    assert_eq!(cpu.vector_base_register(), 0x0010_0000);
    assert_eq!(cpu.pc_address(), PROGRAM + 4);
}

#[test]
fn movec_unknown_control_register_stacks_opcode_address() {
    // MOVEC D0,$002
    let (mut cpu, mut bus) = setup_68010(&[0x4E7B, 0x0002]);

    cpu.step(&mut bus);

    assert_eq!(cpu.pc_address(), handler(vectors::ILLEGAL_INSTRUCTION));
    assert_eq!(cpu.stack_pointer(), STACK - 8);
    assert_eq!(bus.read_word(STACK - 2), (vectors::ILLEGAL_INSTRUCTION * 4) as u16);
    assert_eq!(bus.read_long_word(STACK - 6), PROGRAM);
}

#[test]
fn move_from_sr_privileged_on_68010_only() {
    // MOVE SR,D0
    let (mut cpu, mut bus) = setup(&[0x40C0]);
    cpu.set_status_register(0x0004);
    cpu.step(&mut bus);
    assert_eq!(cpu.data_registers()[0], 0x0004);

    let (mut cpu, mut bus) = setup_68010(&[0x40C0]);
    cpu.set_status_register(0x0004);
    cpu.step(&mut bus);
    assert_eq!(cpu.pc_address(), handler(vectors::PRIVILEGE_VIOLATION));
}

#[test]
fn trap_and_rte_with_format_word() {
    // TRAP #3, with RTE in the handler
    let (mut cpu, mut bus) = setup_68010(&[0x4E43]);
    let vector = vectors::TRAP_BASE + 3;
    bus.write_word(handler(vector), 0x4E73);

    cpu.step(&mut bus);
    assert_eq!(cpu.pc_address(), handler(vector));
    assert_eq!(cpu.stack_pointer(), STACK - 8);
    assert_eq!(bus.read_word(STACK - 2), (vector * 4) as u16);
    assert_eq!(bus.read_long_word(STACK - 6), PROGRAM + 2);

    cpu.step(&mut bus);
    assert_eq!(cpu.pc_address(), PROGRAM + 2);
    assert_eq!(cpu.stack_pointer(), STACK);
    assert_eq!(cpu.status_register(), 0x2700);
}

#[test]
fn vector_base_relocates_handlers() {
    // TRAP #0
    let (mut cpu, mut bus) = setup_68010(&[0x4E40]);
    cpu.set_vector_base_register(0x0002_0000);
    bus.write_long_word(0x0002_0000 + vectors::TRAP_BASE * 4, 0x5000);

    cpu.step(&mut bus);

    assert_eq!(cpu.pc_address(), 0x5000);
}

#[test]
fn rte_rejects_unknown_frame_format() {
    let (mut cpu, mut bus) = setup_68010(&[0x4E73]);
    cpu.set_supervisor_stack_pointer(0x7000);
    bus.write_word(0x7000, 0x2700);
    bus.write_long_word(0x7002, 0x3000);
    bus.write_word(0x7006, 0x1000);

    cpu.step(&mut bus);

    assert_eq!(cpu.pc_address(), handler(vectors::FORMAT_ERROR));
}

#[test]
fn interrupts_respect_mask() {
    let (mut cpu, mut bus) = setup(&[0x4E71, 0x4E71]);
    bus.set_interrupt_level(3);

    cpu.step(&mut bus);
    assert_eq!(cpu.pc_address(), PROGRAM + 2);

    cpu.set_status_register(0x2000);
    cpu.step(&mut bus);
    assert_eq!(cpu.pc_address(), handler(vectors::AUTOVECTOR_BASE + 3));
    assert_eq!(cpu.status_register() & 0x0700, 0x0300);
    assert_eq!(bus.acknowledged_interrupts(), &[3]);
    assert_eq!(bus.read_word(STACK - 6), 0x2000);
    assert_eq!(bus.read_long_word(STACK - 4), PROGRAM + 2);
}

#[test]
fn level_seven_is_edge_triggered() {
    let (mut cpu, mut bus) = setup(&[0x4E71]);
    bus.write_word(handler(vectors::AUTOVECTOR_BASE + 7), 0x4E71);

    bus.set_interrupt_level(7);
    cpu.step(&mut bus);
    assert_eq!(cpu.pc_address(), handler(vectors::AUTOVECTOR_BASE + 7));

    // Held at level 7 with the mask at 7: no new edge
    bus.set_interrupt_level(7);
    cpu.step(&mut bus);
    assert_eq!(cpu.pc_address(), handler(vectors::AUTOVECTOR_BASE + 7) + 2);
    assert_eq!(bus.acknowledged_interrupts(), &[7]);
}

#[test]
fn trace_after_instruction() {
    let (mut cpu, mut bus) = setup(&[0x4E71]);
    cpu.set_status_register(0xA700);

    cpu.step(&mut bus);

    assert_eq!(cpu.pc_address(), handler(vectors::TRACE));
    assert_eq!(cpu.status_register() & 0x8000, 0);
    assert_eq!(bus.read_word(STACK - 6), 0xA700);
    assert_eq!(bus.read_long_word(STACK - 4), PROGRAM + 2);
}

#[test]
fn stop_waits_for_interrupt() {
    // STOP #$2000
    let (mut cpu, mut bus) = setup(&[0x4E72, 0x2000]);

    cpu.step(&mut bus);
    assert!(cpu.is_stopped());
    assert_eq!(cpu.take_stop_signal(), Some(StopSignal::Stopped));
    assert_eq!(cpu.status_register(), 0x2000);

    cpu.step(&mut bus);
    assert_eq!(cpu.pc_address(), PROGRAM + 4);

    bus.set_interrupt_level(1);
    cpu.step(&mut bus);
    assert!(!cpu.is_stopped());
    assert_eq!(cpu.pc_address(), handler(vectors::AUTOVECTOR_BASE + 1));
    assert_eq!(bus.read_long_word(STACK - 4), PROGRAM + 4);
}

#[test]
fn unmapped_opcode_reports_stop_signal() {
    let (mut cpu, mut bus) = setup(&[0x1040]);

    cpu.step(&mut bus);

    assert_eq!(
        cpu.take_stop_signal(),
        Some(StopSignal::UnmappedOpcode { opcode: 0x1040, address: PROGRAM })
    );
    assert_eq!(cpu.pc_address(), handler(vectors::ILLEGAL_INSTRUCTION));
    assert_eq!(cpu.take_stop_signal(), None);
}

#[test]
fn line_a_and_line_f() {
    let (mut cpu, mut bus) = setup(&[0xA000]);
    cpu.step(&mut bus);
    assert_eq!(cpu.pc_address(), handler(vectors::LINE_A));
    assert_eq!(bus.read_long_word(STACK - 4), PROGRAM);

    let (mut cpu, mut bus) = setup(&[0xF123]);
    cpu.step(&mut bus);
    assert_eq!(cpu.pc_address(), handler(vectors::LINE_F));
}

#[test]
fn address_error_on_odd_word_read() {
    // MOVE.W (A0),D0
    let config = EngineConfig::default().with_alignment(AlignmentPolicy::AddressError);
    let (mut cpu, mut bus) = setup_with(config, &[0x3010]);
    cpu.set_address_registers([0x2001, 0, 0, 0, 0, 0, 0]);

    cpu.step(&mut bus);

    assert_eq!(cpu.pc_address(), handler(vectors::ADDRESS_ERROR));
    assert_eq!(cpu.stack_pointer(), STACK - 14);
    assert_eq!(bus.read_long_word(STACK - 12), 0x2001);
    assert_eq!(bus.read_word(STACK - 8), 0x3010);
}

#[test]
fn odd_addresses_tolerated_by_default() {
    // MOVE.W (A0),D0
    let (mut cpu, mut bus) = setup(&[0x3010]);
    cpu.set_address_registers([0x2001, 0, 0, 0, 0, 0, 0]);
    bus.write_byte(0x2001, 0x12);
    bus.write_byte(0x2002, 0x34);

    cpu.step(&mut bus);

    assert_eq!(cpu.data_registers()[0], 0x1234);
    assert_eq!(cpu.pc_address(), PROGRAM + 2);
}

#[test]
fn double_fault_halts() {
    let config = EngineConfig::default().with_alignment(AlignmentPolicy::AddressError);
    let (mut cpu, mut bus) = setup_with(config, &[0x4AFC]);
    cpu.set_supervisor_stack_pointer(0x7001);

    cpu.step(&mut bus);

    assert!(cpu.is_halted());
    assert!(matches!(cpu.take_stop_signal(), Some(StopSignal::DoubleFault { .. })));

    let pc = cpu.pc_address();
    cpu.step(&mut bus);
    assert_eq!(cpu.pc_address(), pc);
}

#[test]
fn raise_exception_from_host() {
    let (mut cpu, mut bus) = setup(&[0x4E71]);
    cpu.set_status_register(0x0000);
    cpu.set_user_stack_pointer(0x6000);

    cpu.raise_exception(&mut bus, vectors::BUS_ERROR);

    assert!(cpu.is_supervisor_mode());
    assert_eq!(cpu.pc_address(), handler(vectors::BUS_ERROR));
    assert_eq!(bus.read_long_word(STACK - 4), PROGRAM);
}

#[test]
fn chk_out_of_bounds() {
    // CHK #10,D0
    let (mut cpu, mut bus) = setup(&[0x41BC, 0x000A]);
    cpu.set_data_registers([11, 0, 0, 0, 0, 0, 0, 0]);

    cpu.step(&mut bus);

    assert_eq!(cpu.pc_address(), handler(vectors::CHK));
    assert_eq!(ccr(&cpu) & 0x08, 0);
}

#[cfg(feature = "bincode")]
#[test]
fn save_state_round_trip() {
    let (mut cpu, mut bus) = setup(&[0x72FF]);
    cpu.step(&mut bus);

    let bytes = cpu.save_state().unwrap();
    let restored = M68k::load_state(&bytes).unwrap();

    assert_eq!(restored, cpu);
}

#[test]
fn byte_steps_through_a7_are_two() {
    // MOVE.B D0,-(A7); MOVE.B (A7)+,D1; MOVE.B D0,-(A0)
    let (mut cpu, mut bus) = setup(&[0x1F00, 0x121F, 0x1100]);
    cpu.set_data_registers([0xAB, 0, 0, 0, 0, 0, 0, 0]);
    cpu.set_address_registers([0x3000, 0, 0, 0, 0, 0, 0]);

    cpu.step(&mut bus);
    assert_eq!(cpu.stack_pointer(), STACK - 2);
    assert_eq!(bus.read_byte(STACK - 2), 0xAB);

    cpu.step(&mut bus);
    assert_eq!(cpu.stack_pointer(), STACK);
    assert_eq!(cpu.data_registers()[1], 0xAB);

    cpu.step(&mut bus);
    assert_eq!(cpu.address_registers()[0], 0x2FFF);
    assert_eq!(bus.read_byte(0x2FFF), 0xAB);
}

#[test]
fn pc_relative_addressing() {
    let (mut cpu, mut bus) = setup(&[
        // LEA (6,PC),A0
        0x41FA, 0x0006,
        // LEA (4,PC,D1.W),A1
        0x43FB, 0x1004,
        // LEA (4,PC,D1.L),A2
        0x45FB, 0x1804,
    ]);
    cpu.set_data_registers([0, 0x0001_0010, 0, 0, 0, 0, 0, 0]);

    cpu.step(&mut bus);
    assert_eq!(cpu.address_registers()[0], PROGRAM + 8);

    // Word index uses only the low half of D1
    cpu.step(&mut bus);
    assert_eq!(cpu.address_registers()[1], PROGRAM + 6 + 4 + 0x10);

    cpu.step(&mut bus);
    assert_eq!(cpu.address_registers()[2], PROGRAM + 10 + 4 + 0x0001_0010);
    assert_eq!(cpu.pc_address(), PROGRAM + 12);
}

#[test]
fn cmp_pc_relative_uses_extension_word_base() {
    // CMP.W (2,PC),D0 followed by the compared word
    let (mut cpu, mut bus) = setup(&[0xB07A, 0x0002, 0x1234]);
    cpu.set_data_registers([0x1234, 0, 0, 0, 0, 0, 0, 0]);

    cpu.step(&mut bus);

    assert_eq!(ccr(&cpu), 0x04);
    assert_eq!(cpu.pc_address(), PROGRAM + 4);
}

#[test]
fn trapv_only_traps_on_overflow() {
    let (mut cpu, mut bus) = setup(&[0x4E76]);
    cpu.step(&mut bus);
    assert_eq!(cpu.pc_address(), PROGRAM + 2);
    assert_eq!(cpu.stack_pointer(), STACK);

    let (mut cpu, mut bus) = setup(&[0x4E76]);
    cpu.set_status_register(0x2702);
    cpu.step(&mut bus);
    assert_eq!(cpu.pc_address(), handler(vectors::TRAPV));
    assert_eq!(bus.read_long_word(STACK - 4), PROGRAM + 2);
    assert_eq!(bus.read_word(STACK - 6), 0x2702);
}

#[test]
fn cmpm_increments_both_registers() {
    // CMPM.W (A0)+,(A1)+
    let (mut cpu, mut bus) = setup(&[0xB348]);
    cpu.set_address_registers([0x2000, 0x3000, 0, 0, 0, 0, 0]);
    bus.write_word(0x2000, 0x0001);
    bus.write_word(0x3000, 0x0001);

    cpu.step(&mut bus);

    assert_eq!(cpu.address_registers()[0], 0x2002);
    assert_eq!(cpu.address_registers()[1], 0x3002);
    assert_eq!(ccr(&cpu), 0x04);
}

fn expected_ccr(result_zero: bool, negative: bool, overflow: bool, carry: bool) -> u16 {
    (u16::from(carry) << 4)
        | (u16::from(negative) << 3)
        | (u16::from(result_zero) << 2)
        | (u16::from(overflow) << 1)
        | u16::from(carry)
}

const FLAG_SAMPLES: [u16; 10] =
    [0x0000, 0x0001, 0x007F, 0x0080, 0x00FF, 0x7FFF, 0x8000, 0x8001, 0xFFFF, 0x1234];

#[test]
fn add_byte_flags_match_widened_arithmetic() {
    // ADD.B D1,D0
    let (mut cpu, mut bus) = setup(&[0xD001]);

    for a in FLAG_SAMPLES.map(|sample| sample as u8) {
        for b in FLAG_SAMPLES.map(|sample| sample as u8) {
            cpu.set_data_registers([a.into(), b.into(), 0, 0, 0, 0, 0, 0]);
            cpu.set_status_register(0x2700);
            cpu.set_pc_address(PROGRAM);
            cpu.step(&mut bus);

            let wide = u16::from(a) + u16::from(b);
            let signed = i16::from(a as i8) + i16::from(b as i8);
            let sum = wide as u8;

            assert_eq!(cpu.data_registers()[0], u32::from(sum), "{a:02X} + {b:02X}");
            assert_eq!(
                ccr(&cpu),
                expected_ccr(sum == 0, sum >= 0x80, signed != i16::from(signed as i8), wide > 0xFF),
                "{a:02X} + {b:02X}"
            );
        }
    }
}

#[test]
fn sub_word_flags_match_widened_arithmetic() {
    // SUB.W D1,D0
    let (mut cpu, mut bus) = setup(&[0x9041]);

    for a in FLAG_SAMPLES {
        for b in FLAG_SAMPLES {
            cpu.set_data_registers([a.into(), b.into(), 0, 0, 0, 0, 0, 0]);
            cpu.set_status_register(0x2700);
            cpu.set_pc_address(PROGRAM);
            cpu.step(&mut bus);

            let difference = a.wrapping_sub(b);
            let signed = i32::from(a as i16) - i32::from(b as i16);

            assert_eq!(cpu.data_registers()[0], u32::from(difference), "{a:04X} - {b:04X}");
            assert_eq!(
                ccr(&cpu),
                expected_ccr(
                    difference == 0,
                    difference >= 0x8000,
                    signed != i32::from(signed as i16),
                    b > a
                ),
                "{a:04X} - {b:04X}"
            );
        }
    }
}
