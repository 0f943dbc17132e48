//! Instruction semantics.
//!
//! Operations run after the addressing mode has been resolved. They read their operand through
//! [`Mos6502::read_alu_input`] (or straight from A in implicit mode), update registers, flags and
//! memory, and report how many extra cycles they cost. Nothing is kept between calls.


use crate::bus::BusInterface;
use crate::num::{GetBit, U16Ext, page_crossed};
use crate::{CpuError, CpuRegisters, IRQ_VECTOR, Mos6502, StatusFlags, read_word};
use bincode::{Decode, Encode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum Operation {
    /// Add with carry
    Adc,
    And,
    /// Arithmetic shift left
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    /// Force interrupt
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    Ror,
    /// Return from interrupt
    Rti,
    /// Return from subroutine
    Rts,
    /// Subtract with carry
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
    /// Undocumented opcode; burns its cycles and does nothing else
    Illegal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BranchCondition {
    CarryClear,
    CarrySet,
    Equal,
    Minus,
    NotEqual,
    Positive,
    OverflowClear,
    OverflowSet,
}

impl BranchCondition {
    fn check(self, flags: StatusFlags) -> bool {
        match self {
            Self::CarryClear => !flags.is_carry_set(),
            Self::CarrySet => flags.is_carry_set(),
            Self::Equal => flags.is_zero_set(),
            Self::Minus => flags.is_negative_set(),
            Self::NotEqual => !flags.is_zero_set(),
            Self::Positive => !flags.is_negative_set(),
            Self::OverflowClear => !flags.is_overflow_set(),
            Self::OverflowSet => flags.is_overflow_set(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Register {
    A,
    X,
    Y,
}

impl Register {
    fn get(self, registers: &CpuRegisters) -> u8 {
        match self {
            Self::A => registers.accumulator,
            Self::X => registers.x,
            Self::Y => registers.y,
        }
    }

    fn get_mut(self, registers: &mut CpuRegisters) -> &mut u8 {
        match self {
            Self::A => &mut registers.accumulator,
            Self::X => &mut registers.x,
            Self::Y => &mut registers.y,
        }
    }
}

/// Execute `operation` against the current CPU state and return its extra cycle count.
pub(crate) fn execute<B: BusInterface>(
    cpu: &mut Mos6502,
    bus: &mut B,
    operation: Operation,
) -> Result<u8, CpuError> {
    let extra_cycles = match operation {
        Operation::Adc => adc(cpu, bus)?,
        Operation::Sbc => sbc(cpu, bus)?,
        Operation::And => logical(cpu, bus, |a, m| a & m)?,
        Operation::Eor => logical(cpu, bus, |a, m| a ^ m)?,
        Operation::Ora => logical(cpu, bus, |a, m| a | m)?,
        Operation::Bit => bit(cpu, bus)?,
        Operation::Cmp => compare(cpu, bus, Register::A)?,
        Operation::Cpx => compare(cpu, bus, Register::X)?,
        Operation::Cpy => compare(cpu, bus, Register::Y)?,
        Operation::Asl => modify(cpu, bus, asl)?,
        Operation::Lsr => modify(cpu, bus, lsr)?,
        Operation::Rol => modify(cpu, bus, rol)?,
        Operation::Ror => modify(cpu, bus, ror)?,
        Operation::Inc => modify_memory(cpu, bus, |m| m.wrapping_add(1))?,
        Operation::Dec => modify_memory(cpu, bus, |m| m.wrapping_sub(1))?,
        Operation::Inx => modify_register(cpu, Register::X, |r| r.wrapping_add(1)),
        Operation::Iny => modify_register(cpu, Register::Y, |r| r.wrapping_add(1)),
        Operation::Dex => modify_register(cpu, Register::X, |r| r.wrapping_sub(1)),
        Operation::Dey => modify_register(cpu, Register::Y, |r| r.wrapping_sub(1)),
        Operation::Lda => load(cpu, bus, Register::A)?,
        Operation::Ldx => load(cpu, bus, Register::X)?,
        Operation::Ldy => load(cpu, bus, Register::Y)?,
        Operation::Sta => store(cpu, bus, Register::A),
        Operation::Stx => store(cpu, bus, Register::X),
        Operation::Sty => store(cpu, bus, Register::Y),
        Operation::Bcc => branch(cpu, BranchCondition::CarryClear),
        Operation::Bcs => branch(cpu, BranchCondition::CarrySet),
        Operation::Beq => branch(cpu, BranchCondition::Equal),
        Operation::Bmi => branch(cpu, BranchCondition::Minus),
        Operation::Bne => branch(cpu, BranchCondition::NotEqual),
        Operation::Bpl => branch(cpu, BranchCondition::Positive),
        Operation::Bvc => branch(cpu, BranchCondition::OverflowClear),
        Operation::Bvs => branch(cpu, BranchCondition::OverflowSet),
        Operation::Clc => set_flag(cpu, |flags| flags.set_carry(false)),
        Operation::Cld => set_flag(cpu, |flags| flags.set_decimal(false)),
        Operation::Cli => set_flag(cpu, |flags| flags.set_interrupt_disable(false)),
        Operation::Clv => set_flag(cpu, |flags| flags.set_overflow(false)),
        Operation::Sec => set_flag(cpu, |flags| flags.set_carry(true)),
        Operation::Sed => set_flag(cpu, |flags| flags.set_decimal(true)),
        Operation::Sei => set_flag(cpu, |flags| flags.set_interrupt_disable(true)),
        Operation::Tax => transfer(cpu, Register::A, Register::X),
        Operation::Tay => transfer(cpu, Register::A, Register::Y),
        Operation::Txa => transfer(cpu, Register::X, Register::A),
        Operation::Tya => transfer(cpu, Register::Y, Register::A),
        Operation::Tsx => tsx(cpu),
        Operation::Txs => txs(cpu),
        Operation::Pha => pha(cpu, bus),
        Operation::Php => php(cpu, bus),
        Operation::Pla => pla(cpu, bus),
        Operation::Plp => plp(cpu, bus),
        Operation::Jmp => jmp(cpu),
        Operation::Jsr => jsr(cpu, bus),
        Operation::Rts => rts(cpu, bus),
        Operation::Rti => rti(cpu, bus),
        Operation::Brk => brk(cpu, bus),
        Operation::Nop | Operation::Illegal => 0,
    };

    Ok(extra_cycles)
}

// A + M + C with 16-bit intermediate sum; SBC feeds the one's complement of M through here
fn add_with_carry(registers: &mut CpuRegisters, value: u8) {
    let accumulator = registers.accumulator;
    let sum = u16::from(accumulator)
        + u16::from(value)
        + u16::from(registers.status.is_carry_set());
    let result = sum.lsb();

    // Overflow when both inputs share a sign and the result does not
    let overflow = (!(accumulator ^ value) & (accumulator ^ result)).bit(7);

    registers.status.set_carry(sum > 0xFF).set_overflow(overflow).set_zn(result);
    registers.accumulator = result;
}

fn adc<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) -> Result<u8, CpuError> {
    let operand = cpu.read_alu_input(bus)?;
    add_with_carry(&mut cpu.registers, operand);
    Ok(1)
}

fn sbc<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) -> Result<u8, CpuError> {
    let operand = cpu.read_alu_input(bus)?;
    add_with_carry(&mut cpu.registers, operand ^ 0xFF);
    Ok(1)
}

// AND, EOR, ORA
fn logical<B: BusInterface>(
    cpu: &mut Mos6502,
    bus: &mut B,
    op: impl FnOnce(u8, u8) -> u8,
) -> Result<u8, CpuError> {
    let operand = cpu.read_alu_input(bus)?;
    let result = op(cpu.registers.accumulator, operand);
    cpu.registers.accumulator = result;
    cpu.registers.status.set_zn(result);
    Ok(1)
}

fn bit<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) -> Result<u8, CpuError> {
    let operand = cpu.read_alu_input(bus)?;
    let masked = cpu.registers.accumulator & operand;
    cpu.registers
        .status
        .set_zero(masked == 0)
        .set_negative(masked.bit(7))
        .set_overflow(masked.bit(6));
    Ok(0)
}

// CMP, CPX, CPY
fn compare<B: BusInterface>(
    cpu: &mut Mos6502,
    bus: &mut B,
    register: Register,
) -> Result<u8, CpuError> {
    let operand = cpu.read_alu_input(bus)?;
    let value = register.get(&cpu.registers);
    cpu.registers.status.set_carry(value >= operand).set_zn(value.wrapping_sub(operand));
    Ok(1)
}

fn asl(value: u8, _carry_in: bool) -> (u8, bool) {
    (value << 1, value.bit(7))
}

fn lsr(value: u8, _carry_in: bool) -> (u8, bool) {
    (value >> 1, value.bit(0))
}

fn rol(value: u8, carry_in: bool) -> (u8, bool) {
    ((value << 1) | u8::from(carry_in), value.bit(7))
}

fn ror(value: u8, carry_in: bool) -> (u8, bool) {
    ((value >> 1) | (u8::from(carry_in) << 7), value.bit(0))
}

// ASL, LSR, ROL, ROR: operate on A in implicit mode, on memory otherwise
fn modify<B: BusInterface>(
    cpu: &mut Mos6502,
    bus: &mut B,
    op: fn(u8, bool) -> (u8, bool),
) -> Result<u8, CpuError> {
    let implicit = cpu.current_is_implicit();
    let operand = if implicit { cpu.alu_input } else { cpu.read_alu_input(bus)? };

    let (result, carry) = op(operand, cpu.registers.status.is_carry_set());
    cpu.registers.status.set_carry(carry).set_zn(result);

    if implicit {
        cpu.registers.accumulator = result;
    } else {
        bus.write(cpu.absolute_address, result);
    }

    Ok(0)
}

// INC, DEC
fn modify_memory<B: BusInterface>(
    cpu: &mut Mos6502,
    bus: &mut B,
    op: impl FnOnce(u8) -> u8,
) -> Result<u8, CpuError> {
    let result = op(cpu.read_alu_input(bus)?);
    bus.write(cpu.absolute_address, result);
    cpu.registers.status.set_zn(result);
    Ok(0)
}

// INX, INY, DEX, DEY
fn modify_register(cpu: &mut Mos6502, register: Register, op: impl FnOnce(u8) -> u8) -> u8 {
    let target = register.get_mut(&mut cpu.registers);
    let result = op(*target);
    *target = result;
    cpu.registers.status.set_zn(result);
    0
}

// LDA, LDX, LDY
fn load<B: BusInterface>(
    cpu: &mut Mos6502,
    bus: &mut B,
    register: Register,
) -> Result<u8, CpuError> {
    let operand = cpu.read_alu_input(bus)?;
    *register.get_mut(&mut cpu.registers) = operand;
    cpu.registers.status.set_zn(operand);
    Ok(1)
}

// STA, STX, STY
fn store<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B, register: Register) -> u8 {
    bus.write(cpu.absolute_address, register.get(&cpu.registers));
    0
}

fn branch(cpu: &mut Mos6502, condition: BranchCondition) -> u8 {
    if !condition.check(cpu.registers.status) {
        return 0;
    }

    let pc = cpu.registers.pc;
    let target = pc.wrapping_add(cpu.relative_address);
    cpu.absolute_address = target;
    cpu.registers.pc = target;

    1 + u8::from(page_crossed(pc, target))
}

fn set_flag(cpu: &mut Mos6502, op: impl FnOnce(&mut StatusFlags) -> &mut StatusFlags) -> u8 {
    op(&mut cpu.registers.status);
    0
}

// TAX, TAY, TXA, TYA
fn transfer(cpu: &mut Mos6502, from: Register, to: Register) -> u8 {
    let value = from.get(&cpu.registers);
    *to.get_mut(&mut cpu.registers) = value;
    cpu.registers.status.set_zn(value);
    0
}

fn tsx(cpu: &mut Mos6502) -> u8 {
    cpu.registers.x = cpu.registers.sp;
    cpu.registers.status.set_zn(cpu.registers.x);
    0
}

// TXS does not touch flags
fn txs(cpu: &mut Mos6502) -> u8 {
    cpu.registers.sp = cpu.registers.x;
    0
}

fn pha<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) -> u8 {
    cpu.push(bus, cpu.registers.accumulator);
    0
}

fn php<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) -> u8 {
    cpu.push(bus, cpu.registers.status.to_stack_byte());
    0
}

fn pla<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) -> u8 {
    let value = cpu.pull(bus);
    cpu.registers.accumulator = value;
    cpu.registers.status.set_zn(value);
    0
}

// Every bit comes back exactly as it was pushed
fn pull_status<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) {
    cpu.registers.status = StatusFlags::from_byte(cpu.pull(bus));
}

fn plp<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) -> u8 {
    pull_status(cpu, bus);
    0
}

fn jmp(cpu: &mut Mos6502) -> u8 {
    cpu.registers.pc = cpu.absolute_address;
    0
}

// JSR pushes the address of its own last byte; RTS adds the 1 back
fn jsr<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) -> u8 {
    let return_address = cpu.registers.pc.wrapping_sub(1);
    cpu.push(bus, return_address.msb());
    cpu.push(bus, return_address.lsb());

    cpu.registers.pc = cpu.absolute_address;
    0
}

fn rts<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) -> u8 {
    let lsb = cpu.pull(bus);
    let msb = cpu.pull(bus);
    cpu.registers.pc = u16::from_le_bytes([lsb, msb]).wrapping_add(1);
    0
}

fn rti<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) -> u8 {
    pull_status(cpu, bus);

    let lsb = cpu.pull(bus);
    let msb = cpu.pull(bus);
    cpu.registers.pc = u16::from_le_bytes([lsb, msb]);
    0
}

// The base cycle count in the table already covers everything BRK does
fn brk<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) -> u8 {
    // Skip the signature byte
    cpu.registers.pc = cpu.registers.pc.wrapping_add(1);

    cpu.registers.status.set_interrupt_disable(true);
    cpu.push(bus, cpu.registers.pc.msb());
    cpu.push(bus, cpu.registers.pc.lsb());

    cpu.registers.status.set_break(true);
    cpu.push(bus, cpu.registers.status.to_byte());
    cpu.registers.status.set_break(false);

    cpu.absolute_address = IRQ_VECTOR;
    cpu.registers.pc = read_word(bus, IRQ_VECTOR);

    log::debug!("BRK, jumping to {:04X}", cpu.registers.pc);

    0
}
