//! Addressing-mode resolution.
//!
//! Every resolver consumes its operand bytes from PC and leaves the effective address in the
//! CPU's absolute address scratch register (or, for Implicit, copies A into the ALU input). The
//! return value is the number of extra cycles the mode costs, which is 1 only when an indexed
//! address lands on a different page than its base.


use crate::bus::BusInterface;
use crate::num::{U16Ext, page_crossed, sign_extend};
use crate::{CpuRegisters, Mos6502};
use bincode::{Decode, Encode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum AddressingMode {
    Implicit,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Relative,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
}

impl AddressingMode {
    /// Number of operand bytes that follow the opcode.
    #[must_use]
    pub fn operand_len(self) -> u16 {
        match self {
            Self::Implicit => 0,
            Self::Immediate
            | Self::ZeroPage
            | Self::ZeroPageX
            | Self::ZeroPageY
            | Self::Relative
            | Self::IndirectX
            | Self::IndirectY => 1,
            Self::Absolute | Self::AbsoluteX | Self::AbsoluteY | Self::Indirect => 2,
        }
    }

    #[must_use]
    pub fn abbreviation(self) -> &'static str {
        match self {
            Self::Implicit => "IMP",
            Self::Immediate => "IMM",
            Self::ZeroPage => "ZP0",
            Self::ZeroPageX => "ZPX",
            Self::ZeroPageY => "ZPY",
            Self::Relative => "REL",
            Self::Absolute => "ABS",
            Self::AbsoluteX => "ABX",
            Self::AbsoluteY => "ABY",
            Self::Indirect => "IND",
            Self::IndirectX => "IZX",
            Self::IndirectY => "IZY",
        }
    }
}

pub(crate) fn resolve<B: BusInterface>(
    cpu: &mut Mos6502,
    bus: &mut B,
    addressing_mode: AddressingMode,
) -> u8 {
    let CpuRegisters { x, y, .. } = cpu.registers;

    match addressing_mode {
        AddressingMode::Implicit => implicit(cpu),
        AddressingMode::Immediate => immediate(cpu),
        AddressingMode::ZeroPage => zero_page_indexed(cpu, bus, 0),
        AddressingMode::ZeroPageX => zero_page_indexed(cpu, bus, x),
        AddressingMode::ZeroPageY => zero_page_indexed(cpu, bus, y),
        AddressingMode::Relative => relative(cpu, bus),
        AddressingMode::Absolute => absolute(cpu, bus),
        AddressingMode::AbsoluteX => absolute_indexed(cpu, bus, x),
        AddressingMode::AbsoluteY => absolute_indexed(cpu, bus, y),
        AddressingMode::Indirect => indirect(cpu, bus),
        AddressingMode::IndirectX => indirect_x(cpu, bus),
        AddressingMode::IndirectY => indirect_y(cpu, bus),
    }
}

fn implicit(cpu: &mut Mos6502) -> u8 {
    cpu.alu_input = cpu.registers.accumulator;
    0
}

fn immediate(cpu: &mut Mos6502) -> u8 {
    cpu.absolute_address = cpu.registers.pc;
    cpu.registers.pc = cpu.registers.pc.wrapping_add(1);
    0
}

// Indexing never leaves page zero
fn zero_page_indexed<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B, index: u8) -> u8 {
    let base = cpu.fetch_byte(bus);
    cpu.absolute_address = base.wrapping_add(index).into();
    0
}

fn relative<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) -> u8 {
    let offset = cpu.fetch_byte(bus);
    cpu.relative_address = sign_extend(offset);
    0
}

fn absolute<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) -> u8 {
    cpu.absolute_address = cpu.fetch_word(bus);
    0
}

fn absolute_indexed<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B, index: u8) -> u8 {
    let base = cpu.fetch_word(bus);
    let address = base.wrapping_add(index.into());
    cpu.absolute_address = address;

    page_crossed(base, address).into()
}

fn indirect<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) -> u8 {
    let pointer = cpu.fetch_word(bus);

    // Hardware bug: the pointer's high byte is read without carrying into the next page, so
    // JMP ($02FF) takes its high byte from $0200
    let msb_pointer = if pointer.lsb() == 0xFF { pointer & 0xFF00 } else { pointer + 1 };

    let address_lsb = bus.read(pointer);
    let address_msb = bus.read(msb_pointer);
    cpu.absolute_address = u16::from_le_bytes([address_lsb, address_msb]);

    0
}

fn indirect_x<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) -> u8 {
    let pointer = cpu.fetch_byte(bus).wrapping_add(cpu.registers.x);

    let address_lsb = bus.read(pointer.into());
    let address_msb = bus.read(pointer.wrapping_add(1).into());
    cpu.absolute_address = u16::from_le_bytes([address_lsb, address_msb]);

    0
}

fn indirect_y<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) -> u8 {
    let pointer = cpu.fetch_byte(bus);

    let base_lsb = bus.read(pointer.into());
    let base_msb = bus.read(pointer.wrapping_add(1).into());
    let base = u16::from_le_bytes([base_lsb, base_msb]);

    let address = base.wrapping_add(cpu.registers.y.into());
    cpu.absolute_address = address;

    page_crossed(base, address).into()
}
