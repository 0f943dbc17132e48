//! Instruction-granular MOS 6502 emulation core.
//!
//! Each clock tick either fetches and fully executes the next instruction, then spends the
//! instruction's remaining cycles idling, or counts down a cycle of the instruction already in
//! flight. Instructions are decoded through a fixed 256-entry table (see [`table`]) into an
//! addressing mode and an operation.

mod addressing;
pub mod bus;
pub mod disassemble;
mod instructions;
pub mod num;
pub mod serialize;
pub mod table;

#[cfg(test)]
mod tests;

pub use crate::addressing::AddressingMode;
pub use crate::instructions::Operation;
pub use crate::table::Instruction;

use crate::bus::BusInterface;
use crate::num::{GetBit, U16Ext};
use bincode::{Decode, Encode};
use thiserror::Error;

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

pub const STACK_BASE: u16 = 0x0100;

const RESET_STACK_POINTER: u8 = 0xFD;
const RESET_CYCLES: u32 = 8;
const IRQ_CYCLES: u32 = 7;
const NMI_CYCLES: u32 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error(
        "instruction {mnemonic} (opcode {opcode:02X}) read the ALU input in implicit addressing mode"
    )]
    ImplicitAluInputRead { opcode: u8, mnemonic: &'static str },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Encode, Decode)]
pub struct StatusFlags {
    negative: bool,
    overflow: bool,
    unused: bool,
    break_flag: bool,
    decimal: bool,
    interrupt_disable: bool,
    zero: bool,
    carry: bool,
}

impl StatusFlags {
    /// Status register as left by RESET: only the unused bit is set.
    #[must_use]
    pub fn new() -> Self {
        Self { unused: true, ..Self::default() }
    }

    #[must_use]
    pub fn is_carry_set(self) -> bool {
        self.carry
    }

    #[must_use]
    pub fn is_zero_set(self) -> bool {
        self.zero
    }

    #[must_use]
    pub fn is_interrupt_disable_set(self) -> bool {
        self.interrupt_disable
    }

    #[must_use]
    pub fn is_decimal_set(self) -> bool {
        self.decimal
    }

    #[must_use]
    pub fn is_break_set(self) -> bool {
        self.break_flag
    }

    #[must_use]
    pub fn is_unused_set(self) -> bool {
        self.unused
    }

    #[must_use]
    pub fn is_overflow_set(self) -> bool {
        self.overflow
    }

    #[must_use]
    pub fn is_negative_set(self) -> bool {
        self.negative
    }

    pub fn set_carry(&mut self, carry: bool) -> &mut Self {
        self.carry = carry;
        self
    }

    pub fn set_zero(&mut self, zero: bool) -> &mut Self {
        self.zero = zero;
        self
    }

    pub fn set_interrupt_disable(&mut self, interrupt_disable: bool) -> &mut Self {
        self.interrupt_disable = interrupt_disable;
        self
    }

    pub fn set_decimal(&mut self, decimal: bool) -> &mut Self {
        self.decimal = decimal;
        self
    }

    pub fn set_break(&mut self, break_flag: bool) -> &mut Self {
        self.break_flag = break_flag;
        self
    }

    pub fn set_unused(&mut self, unused: bool) -> &mut Self {
        self.unused = unused;
        self
    }

    pub fn set_overflow(&mut self, overflow: bool) -> &mut Self {
        self.overflow = overflow;
        self
    }

    pub fn set_negative(&mut self, negative: bool) -> &mut Self {
        self.negative = negative;
        self
    }

    /// Set Zero and Negative from a result byte.
    pub fn set_zn(&mut self, value: u8) -> &mut Self {
        self.set_zero(value == 0).set_negative(value.bit(7))
    }

    #[must_use]
    pub fn to_byte(self) -> u8 {
        (u8::from(self.negative) << 7)
            | (u8::from(self.overflow) << 6)
            | (u8::from(self.unused) << 5)
            | (u8::from(self.break_flag) << 4)
            | (u8::from(self.decimal) << 3)
            | (u8::from(self.interrupt_disable) << 2)
            | (u8::from(self.zero) << 1)
            | u8::from(self.carry)
    }

    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        Self {
            negative: byte.bit(7),
            overflow: byte.bit(6),
            unused: byte.bit(5),
            break_flag: byte.bit(4),
            decimal: byte.bit(3),
            interrupt_disable: byte.bit(2),
            zero: byte.bit(1),
            carry: byte.bit(0),
        }
    }

    /// The byte PHP pushes: Break and Unused always read as 1 on the stack.
    #[must_use]
    pub fn to_stack_byte(self) -> u8 {
        self.to_byte() | 0x30
    }
}

impl From<StatusFlags> for u8 {
    fn from(value: StatusFlags) -> Self {
        value.to_byte()
    }
}

impl From<u8> for StatusFlags {
    fn from(value: u8) -> Self {
        Self::from_byte(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
pub struct CpuRegisters {
    pub accumulator: u8,
    pub x: u8,
    pub y: u8,
    pub status: StatusFlags,
    pub pc: u16,
    pub sp: u8,
}

#[derive(Debug, Clone, Default, Encode, Decode)]
pub struct Mos6502 {
    registers: CpuRegisters,
    absolute_address: u16,
    relative_address: u16,
    alu_input: u8,
    current_opcode: Option<u8>,
    cycles_remaining: u32,
    total_cycles: u64,
}

impl Mos6502 {
    /// Create a CPU with every register zeroed. Nothing is meaningful until [`Self::reset`] runs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the data bus. The returned system owns both halves and drives them together.
    #[must_use]
    pub fn connect_bus<B: BusInterface>(self, bus: B) -> Mos6502System<B> {
        Mos6502System { cpu: self, bus }
    }

    /// Run the CPU for 1 cycle.
    ///
    /// When no instruction is in flight, this fetches, decodes and executes the next instruction
    /// in full and then charges its base cycles plus whatever the addressing mode and the
    /// operation each asked for. Every tick, including the fetching one, counts down one cycle.
    pub fn clock_tick<B: BusInterface>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        if self.cycles_remaining == 0 {
            let pc = self.registers.pc;
            let opcode = self.fetch_byte(bus);
            let instruction = table::lookup(opcode);

            self.current_opcode = Some(opcode);
            self.cycles_remaining = instruction.cycles.into();

            let addressing_cycles = addressing::resolve(self, bus, instruction.addressing_mode);
            let operation_cycles = instructions::execute(self, bus, instruction.operation)?;
            self.cycles_remaining += u32::from(addressing_cycles) + u32::from(operation_cycles);

            log::trace!(
                "{pc:04X}: {} (opcode {opcode:02X}) for {} cycles",
                instruction.mnemonic,
                self.cycles_remaining
            );
        }

        self.cycles_remaining -= 1;
        self.total_cycles += 1;

        Ok(())
    }

    /// Bring the CPU to its power-on state with PC loaded from the RESET vector at $FFFC.
    pub fn reset<B: BusInterface>(&mut self, bus: &mut B) {
        self.absolute_address = RESET_VECTOR;
        self.registers.pc = read_word(bus, self.absolute_address);

        self.registers.accumulator = 0;
        self.registers.x = 0;
        self.registers.y = 0;
        self.registers.sp = RESET_STACK_POINTER;
        self.registers.status = StatusFlags::new();

        self.absolute_address = 0;
        self.relative_address = 0;
        self.alu_input = 0;

        self.cycles_remaining = RESET_CYCLES;

        log::debug!("CPU reset, PC={:04X}", self.registers.pc);
    }

    /// Service a maskable interrupt request. Ignored while the I flag is set.
    pub fn request_interrupt<B: BusInterface>(&mut self, bus: &mut B) {
        if self.registers.status.interrupt_disable {
            log::debug!("IRQ ignored, interrupts are disabled");
            return;
        }

        self.interrupt_service_routine(bus, IRQ_VECTOR);
        self.cycles_remaining = IRQ_CYCLES;

        log::debug!("IRQ taken, PC={:04X}", self.registers.pc);
    }

    /// Service a non-maskable interrupt.
    pub fn request_nmi<B: BusInterface>(&mut self, bus: &mut B) {
        self.interrupt_service_routine(bus, NMI_VECTOR);
        self.cycles_remaining = NMI_CYCLES;

        log::debug!("NMI taken, PC={:04X}", self.registers.pc);
    }

    fn interrupt_service_routine<B: BusInterface>(&mut self, bus: &mut B, vector: u16) {
        self.push(bus, self.registers.pc.msb());
        self.push(bus, self.registers.pc.lsb());

        self.registers.status.set_break(false).set_unused(true).set_interrupt_disable(true);
        self.push(bus, self.registers.status.to_byte());

        self.absolute_address = vector;
        self.registers.pc = read_word(bus, vector);
    }

    /// Read the operand of the current instruction from the effective address.
    ///
    /// Instructions in implicit mode have no effective address, so this is a wiring error there.
    pub fn read_alu_input<B: BusInterface>(&mut self, bus: &mut B) -> Result<u8, CpuError> {
        if let Some(opcode) = self.current_opcode {
            let instruction = table::lookup(opcode);
            if instruction.is_implicit() {
                return Err(CpuError::ImplicitAluInputRead {
                    opcode,
                    mnemonic: instruction.mnemonic,
                });
            }
        }

        self.alu_input = bus.read(self.absolute_address);
        Ok(self.alu_input)
    }

    fn fetch_byte<B: BusInterface>(&mut self, bus: &mut B) -> u8 {
        let byte = bus.read(self.registers.pc);
        self.registers.pc = self.registers.pc.wrapping_add(1);
        byte
    }

    fn fetch_word<B: BusInterface>(&mut self, bus: &mut B) -> u16 {
        let lsb = self.fetch_byte(bus);
        let msb = self.fetch_byte(bus);
        u16::from_le_bytes([lsb, msb])
    }

    fn push<B: BusInterface>(&mut self, bus: &mut B, value: u8) {
        bus.write(STACK_BASE + u16::from(self.registers.sp), value);
        self.registers.sp = self.registers.sp.wrapping_sub(1);
    }

    fn pull<B: BusInterface>(&mut self, bus: &mut B) -> u8 {
        self.registers.sp = self.registers.sp.wrapping_add(1);
        bus.read(STACK_BASE + u16::from(self.registers.sp))
    }

    fn current_is_implicit(&self) -> bool {
        self.current_instruction().is_some_and(Instruction::is_implicit)
    }

    #[inline]
    #[must_use]
    pub fn pc(&self) -> u16 {
        self.registers.pc
    }

    #[must_use]
    pub fn status(&self) -> StatusFlags {
        self.registers.status
    }

    #[must_use]
    pub fn registers(&self) -> &CpuRegisters {
        &self.registers
    }

    pub fn set_registers(&mut self, registers: CpuRegisters) {
        self.registers = registers;
    }

    #[must_use]
    pub fn absolute_address(&self) -> u16 {
        self.absolute_address
    }

    #[must_use]
    pub fn relative_address(&self) -> u16 {
        self.relative_address
    }

    #[must_use]
    pub fn alu_input(&self) -> u8 {
        self.alu_input
    }

    #[must_use]
    pub fn clock_cycles_remaining(&self) -> u32 {
        self.cycles_remaining
    }

    /// Number of clock ticks consumed since creation.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    #[must_use]
    pub fn current_opcode(&self) -> Option<u8> {
        self.current_opcode
    }

    /// The table entry of the most recently fetched instruction, if any has been fetched.
    #[must_use]
    pub fn current_instruction(&self) -> Option<&'static Instruction> {
        self.current_opcode.map(table::lookup)
    }

    #[must_use]
    pub fn is_mid_instruction(&self) -> bool {
        self.cycles_remaining != 0
    }
}

fn read_word<B: BusInterface>(bus: &mut B, address: u16) -> u16 {
    let lsb = bus.read(address);
    let msb = bus.read(address.wrapping_add(1));
    u16::from_le_bytes([lsb, msb])
}

/// A CPU with its data bus attached.
#[derive(Debug, Clone)]
pub struct Mos6502System<B> {
    cpu: Mos6502,
    bus: B,
}

impl<B: BusInterface> Mos6502System<B> {
    pub fn clock_tick(&mut self) -> Result<(), CpuError> {
        self.cpu.clock_tick(&mut self.bus)
    }

    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.bus);
    }

    pub fn request_interrupt(&mut self) {
        self.cpu.request_interrupt(&mut self.bus);
    }

    pub fn request_nmi(&mut self) {
        self.cpu.request_nmi(&mut self.bus);
    }

    /// Tick until the CPU is between instructions again and return the number of ticks taken.
    ///
    /// From an idle CPU this runs exactly one instruction. Pending reset or interrupt cycles are
    /// drained first without fetching.
    pub fn step_instruction(&mut self) -> Result<u32, CpuError> {
        let mut ticks = 0;
        loop {
            self.clock_tick()?;
            ticks += 1;

            if !self.cpu.is_mid_instruction() {
                return Ok(ticks);
            }
        }
    }

    #[must_use]
    pub fn cpu(&self) -> &Mos6502 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Mos6502 {
        &mut self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    #[must_use]
    pub fn into_parts(self) -> (Mos6502, B) {
        (self.cpu, self.bus)
    }
}
