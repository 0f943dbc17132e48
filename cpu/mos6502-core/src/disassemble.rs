use crate::bus::BusInterface;
use crate::num::{U16Ext, sign_extend};
use crate::table::{self, Instruction};
use crate::AddressingMode;
use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disassembly {
    pub address: u16,
    pub opcode: u8,
    pub instruction: &'static Instruction,
    /// Operand bytes as a little-endian value; 0 for implicit instructions
    pub operand: u16,
}

impl Disassembly {
    #[must_use]
    pub fn next_address(&self) -> u16 {
        self.address.wrapping_add(self.instruction.byte_len())
    }

    /// Destination of a relative branch if taken.
    #[must_use]
    pub fn branch_target(&self) -> Option<u16> {
        (self.instruction.addressing_mode == AddressingMode::Relative)
            .then(|| self.next_address().wrapping_add(sign_extend(self.operand.lsb())))
    }
}

impl Display for Disassembly {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self { address, instruction, operand, .. } = *self;
        let mode = instruction.addressing_mode;

        write!(f, "${address:04X}: {}", instruction.mnemonic)?;

        match mode {
            AddressingMode::Implicit => {}
            AddressingMode::Immediate => write!(f, " #${operand:02X}")?,
            AddressingMode::ZeroPage => write!(f, " ${operand:02X}")?,
            AddressingMode::ZeroPageX => write!(f, " ${operand:02X}, X")?,
            AddressingMode::ZeroPageY => write!(f, " ${operand:02X}, Y")?,
            AddressingMode::Relative => {
                let target = self.branch_target().unwrap_or_default();
                write!(f, " ${operand:02X} [${target:04X}]")?;
            }
            AddressingMode::Absolute => write!(f, " ${operand:04X}")?,
            AddressingMode::AbsoluteX => write!(f, " ${operand:04X}, X")?,
            AddressingMode::AbsoluteY => write!(f, " ${operand:04X}, Y")?,
            AddressingMode::Indirect => write!(f, " (${operand:04X})")?,
            AddressingMode::IndirectX => write!(f, " (${operand:02X}, X)")?,
            AddressingMode::IndirectY => write!(f, " (${operand:02X}), Y")?,
        }

        write!(f, " {{{}}}", mode.abbreviation())
    }
}

/// Decode the instruction at `address`. Reads go through the bus, so this is only side-effect free
/// for buses whose reads are.
pub fn disassemble_instruction<B: BusInterface>(bus: &mut B, address: u16) -> Disassembly {
    let opcode = bus.read(address);
    let instruction = table::lookup(opcode);

    let operand = match instruction.addressing_mode.operand_len() {
        0 => 0,
        1 => bus.read(address.wrapping_add(1)).into(),
        _ => {
            let lsb = bus.read(address.wrapping_add(1));
            let msb = bus.read(address.wrapping_add(2));
            u16::from_le_bytes([lsb, msb])
        }
    };

    Disassembly { address, opcode, instruction, operand }
}

/// Disassemble every instruction that starts in `start..=end`.
pub fn disassemble_range<B: BusInterface>(bus: &mut B, start: u16, end: u16) -> Vec<Disassembly> {
    let mut disassembly = Vec::new();
    if start > end {
        return disassembly;
    }

    let mut address = start;
    loop {
        let instruction = disassemble_instruction(bus, address);
        let next_address = instruction.next_address();
        disassembly.push(instruction);

        // Stop on wraparound past $FFFF as well as on reaching the end
        if next_address <= address || next_address > end {
            return disassembly;
        }
        address = next_address;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::FlatMemoryBus;

    fn render(program: &[u8], address: u16) -> String {
        let mut bus = FlatMemoryBus::new();
        bus.load(address, program);
        disassemble_instruction(&mut bus, address).to_string()
    }

    #[test]
    fn formats_each_addressing_mode() {
        assert_eq!(render(&[0xEA], 0x8000), "$8000: NOP {IMP}");
        assert_eq!(render(&[0xA9, 0x42], 0x8000), "$8000: LDA #$42 {IMM}");
        assert_eq!(render(&[0xA5, 0x42], 0x8000), "$8000: LDA $42 {ZP0}");
        assert_eq!(render(&[0xB5, 0x42], 0x8000), "$8000: LDA $42, X {ZPX}");
        assert_eq!(render(&[0xB6, 0x42], 0x8000), "$8000: LDX $42, Y {ZPY}");
        assert_eq!(render(&[0xAD, 0x34, 0x12], 0x8000), "$8000: LDA $1234 {ABS}");
        assert_eq!(render(&[0xBD, 0x34, 0x12], 0x8000), "$8000: LDA $1234, X {ABX}");
        assert_eq!(render(&[0xB9, 0x34, 0x12], 0x8000), "$8000: LDA $1234, Y {ABY}");
        assert_eq!(render(&[0x6C, 0x34, 0x12], 0x8000), "$8000: JMP ($1234) {IND}");
        assert_eq!(render(&[0xA1, 0x42], 0x8000), "$8000: LDA ($42, X) {IZX}");
        assert_eq!(render(&[0xB1, 0x42], 0x8000), "$8000: LDA ($42), Y {IZY}");
    }

    #[test]
    fn branches_show_their_target() {
        assert_eq!(render(&[0xD0, 0x10], 0x8000), "$8000: BNE $10 [$8012] {REL}");
        assert_eq!(render(&[0xD0, 0xFE], 0x8000), "$8000: BNE $FE [$8000] {REL}");
    }

    #[test]
    fn range_walks_instruction_lengths() {
        let mut bus = FlatMemoryBus::new();
        bus.load(0x0600, &[0xA2, 0x08, 0xCA, 0x8E, 0x00, 0x02, 0xE0, 0x03, 0xD0, 0xF8]);

        let addresses: Vec<u16> = disassemble_range(&mut bus, 0x0600, 0x0609)
            .into_iter()
            .map(|disassembly| disassembly.address)
            .collect();

        assert_eq!(addresses, vec![0x0600, 0x0602, 0x0603, 0x0606, 0x0608]);
    }

    #[test]
    fn range_stops_at_end_of_address_space() {
        let mut bus = FlatMemoryBus::new();
        bus.load(0xFFFE, &[0xEA, 0xEA]);

        assert_eq!(disassemble_range(&mut bus, 0xFFFE, 0xFFFF).len(), 2);
        assert!(disassemble_range(&mut bus, 0x0010, 0x0000).is_empty());
    }
}
