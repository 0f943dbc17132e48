use super::*;
use crate::bus::FlatMemoryBus;
use test_log::test;

fn system_with_program(origin: u16, program: &[u8]) -> Mos6502System<FlatMemoryBus> {
    let mut bus = FlatMemoryBus::new();
    bus.set_reset_vector(origin);
    bus.load(origin, program);

    let mut system = Mos6502::new().connect_bus(bus);
    system.reset();
    system
}

#[test]
fn reset_state() {
    let mut bus = FlatMemoryBus::new();
    bus.set_reset_vector(0xC000);
    let mut cpu = Mos6502::new();
    cpu.registers.accumulator = 0x12;
    cpu.registers.x = 0x34;
    cpu.registers.status = StatusFlags::from_byte(0xFF);

    cpu.reset(&mut bus);

    assert_eq!(cpu.pc(), 0xC000);
    assert_eq!(
        *cpu.registers(),
        CpuRegisters {
            accumulator: 0,
            x: 0,
            y: 0,
            status: StatusFlags::new(),
            pc: 0xC000,
            sp: 0xFD
        }
    );
    assert_eq!(cpu.status().to_byte(), 0x20);
    assert_eq!(cpu.absolute_address(), 0);
    assert_eq!(cpu.relative_address(), 0);
    assert_eq!(cpu.alu_input(), 0);
    assert_eq!(cpu.clock_cycles_remaining(), 8);
}

#[test]
fn reset_cycles_drain_before_first_fetch() {
    let mut system = system_with_program(0x0400, &[0xA9, 0x42]);

    for _ in 0..8 {
        system.clock_tick().unwrap();
        assert_eq!(system.cpu().pc(), 0x0400);
        assert_eq!(system.cpu().current_opcode(), None);
    }

    system.clock_tick().unwrap();
    assert_eq!(system.cpu().registers().accumulator, 0x42);
    assert_eq!(system.cpu().current_opcode(), Some(0xA9));
}

#[test]
fn one_fetch_per_instruction() {
    let mut system = system_with_program(0x0400, &[0xAD, 0x00, 0x02, 0xEA]);
    system.step_instruction().unwrap();

    // LDA absolute: 4 base + 1 for the load itself
    system.clock_tick().unwrap();
    assert_eq!(system.cpu().pc(), 0x0403);
    assert_eq!(system.cpu().clock_cycles_remaining(), 4);

    for _ in 0..4 {
        assert!(system.cpu().is_mid_instruction());
        system.clock_tick().unwrap();
        assert_eq!(system.cpu().pc(), 0x0403);
    }

    assert!(!system.cpu().is_mid_instruction());
    system.clock_tick().unwrap();
    assert_eq!(system.cpu().pc(), 0x0404);
    assert_eq!(system.cpu().current_instruction().map(|instruction| instruction.mnemonic), Some("NOP"));
}

#[test]
fn total_cycles_counts_every_tick() {
    let mut system = system_with_program(0x0400, &[0xEA, 0xEA]);

    let reset_ticks = system.step_instruction().unwrap();
    let nop_ticks = system.step_instruction().unwrap();

    assert_eq!(reset_ticks, 8);
    assert_eq!(nop_ticks, 2);

    let (cpu, bus) = system.into_parts();
    assert_eq!(cpu.total_cycles(), 10);
    assert_eq!(bus.as_slice()[0x0401], 0xEA);
}

#[test]
fn masked_irq_is_ignored() {
    let mut system = system_with_program(0x0400, &[0x78, 0xEA]);
    system.bus_mut().set_vector(IRQ_VECTOR, 0x9000);
    system.step_instruction().unwrap();
    system.step_instruction().unwrap();

    let registers = system.cpu().registers().clone();
    system.request_interrupt();

    assert_eq!(*system.cpu().registers(), registers);
    assert_eq!(system.cpu().clock_cycles_remaining(), 0);
}

#[test]
fn irq_pushes_state_and_jumps_through_vector() {
    let mut system = system_with_program(0x0400, &[0x38, 0xEA]);
    system.bus_mut().set_vector(IRQ_VECTOR, 0x9000);
    system.step_instruction().unwrap();
    system.step_instruction().unwrap();

    system.request_interrupt();

    let cpu = system.cpu();
    assert_eq!(cpu.pc(), 0x9000);
    assert_eq!(cpu.absolute_address(), IRQ_VECTOR);
    assert_eq!(cpu.registers().sp, 0xFA);
    assert!(cpu.status().is_interrupt_disable_set());
    assert_eq!(cpu.clock_cycles_remaining(), 7);

    let stack = &system.bus().as_slice()[0x01FB..=0x01FD];
    // status (C, I, U) then PC low then PC high
    assert_eq!(stack, &[0x25, 0x01, 0x04]);
}

#[test]
fn nmi_ignores_interrupt_disable() {
    let mut system = system_with_program(0x0400, &[0x78]);
    system.bus_mut().set_vector(NMI_VECTOR, 0xA000);
    system.step_instruction().unwrap();
    system.step_instruction().unwrap();

    system.request_nmi();

    let cpu = system.cpu();
    assert_eq!(cpu.pc(), 0xA000);
    assert_eq!(cpu.absolute_address(), NMI_VECTOR);
    assert_eq!(cpu.registers().sp, 0xFA);
    assert_eq!(cpu.clock_cycles_remaining(), 8);
    assert_eq!(system.bus().as_slice()[0x01FB] & 0x30, 0x20);
}

#[test]
fn rti_returns_from_irq_handler() {
    let mut system = system_with_program(0x0400, &[0xEA, 0xEA]);
    system.bus_mut().set_vector(IRQ_VECTOR, 0x9000);
    system.bus_mut().write(0x9000, 0x40);
    system.step_instruction().unwrap();
    system.step_instruction().unwrap();

    system.request_interrupt();
    assert_eq!(system.step_instruction().unwrap(), 7);

    assert_eq!(system.step_instruction().unwrap(), 6);
    assert_eq!(system.cpu().pc(), 0x0401);
    assert_eq!(system.cpu().registers().sp, 0xFD);
    assert!(!system.cpu().status().is_break_set());
}

#[test]
fn status_flags_byte_conversions() {
    let mut flags = StatusFlags::new();
    flags.set_carry(true).set_negative(true);

    assert_eq!(flags.to_byte(), 0xA1);
    assert_eq!(flags.to_stack_byte(), 0xB1);
    assert_eq!(u8::from(StatusFlags::from(0xA1)), 0xA1);
    assert!(StatusFlags::from_byte(0x10).is_break_set());

    flags.set_zn(0x00);
    assert!(flags.is_zero_set());
    assert!(!flags.is_negative_set());
}

#[test]
fn status_flags_byte_round_trip() {
    for byte in 0..=u8::MAX {
        assert_eq!(StatusFlags::from_byte(byte).to_byte(), byte);
    }
}

#[test]
fn countdown_loop_program() {
    // LDX #$08; loop: DEX; STX $0200; CPX #$03; BNE loop; STX $0201; BRK
    let program = [0xA2, 0x08, 0xCA, 0x8E, 0x00, 0x02, 0xE0, 0x03, 0xD0, 0xF8, 0x8E, 0x01, 0x02, 0x00];
    let mut system = system_with_program(0x0600, &program);
    system.bus_mut().set_vector(IRQ_VECTOR, 0x0700);
    system.step_instruction().unwrap();

    while system.cpu().pc() != 0x0700 {
        system.step_instruction().unwrap();
    }

    let cpu = system.cpu();
    assert_eq!(cpu.registers().x, 0x03);
    assert!(cpu.status().is_zero_set());
    assert!(cpu.status().is_carry_set());
    assert_eq!(system.bus().as_slice()[0x0200], 0x03);
    assert_eq!(system.bus().as_slice()[0x0201], 0x03);
}

#[test]
fn alu_input_read_rejects_implicit_opcodes() {
    let mut bus = FlatMemoryBus::new();
    let mut cpu = Mos6502::new();
    cpu.current_opcode = Some(0x0A);

    let result = cpu.read_alu_input(&mut bus);
    assert_eq!(result, Err(CpuError::ImplicitAluInputRead { opcode: 0x0A, mnemonic: "ASL" }));
}
