//! Opcode decode table.

use crate::{AddressingMode, Operation};

/// One decoded opcode: how it resolves its operand, what it does, and its base cycle count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub mnemonic: &'static str,
    pub operation: Operation,
    pub addressing_mode: AddressingMode,
    pub cycles: u8,
}

impl Instruction {
    #[must_use]
    pub fn is_implicit(&self) -> bool {
        self.addressing_mode == AddressingMode::Implicit
    }

    /// Opcode byte plus operand bytes.
    #[must_use]
    pub fn byte_len(&self) -> u16 {
        1 + self.addressing_mode.operand_len()
    }

    #[must_use]
    pub fn is_illegal(&self) -> bool {
        self.operation == Operation::Illegal
    }

    /// Whether this entry stands in for an undocumented opcode, including the ones run as NOPs.
    #[must_use]
    pub fn is_undocumented(&self) -> bool {
        self.mnemonic == "???"
    }
}

macro_rules! entry {
    ($mnemonic:literal, $operation:ident, $addressing_mode:ident, $cycles:literal) => {
        Instruction {
            mnemonic: $mnemonic,
            operation: Operation::$operation,
            addressing_mode: AddressingMode::$addressing_mode,
            cycles: $cycles,
        }
    };
}

// Undocumented opcodes decode as "???" in implicit mode. Some are treated as NOPs of varying length,
// the rest as illegal
#[rustfmt::skip]
static INSTRUCTIONS: [Instruction; 256] = [
    /* 00 */ entry!("BRK", Brk, Implicit, 7),
    /* 01 */ entry!("ORA", Ora, IndirectX, 6),
    /* 02 */ entry!("???", Illegal, Implicit, 2),
    /* 03 */ entry!("???", Illegal, Implicit, 8),
    /* 04 */ entry!("???", Nop, Implicit, 3),
    /* 05 */ entry!("ORA", Ora, ZeroPage, 3),
    /* 06 */ entry!("ASL", Asl, ZeroPage, 5),
    /* 07 */ entry!("???", Illegal, Implicit, 5),
    /* 08 */ entry!("PHP", Php, Implicit, 3),
    /* 09 */ entry!("ORA", Ora, Immediate, 2),
    /* 0A */ entry!("ASL", Asl, Implicit, 2),
    /* 0B */ entry!("???", Illegal, Implicit, 2),
    /* 0C */ entry!("???", Nop, Implicit, 4),
    /* 0D */ entry!("ORA", Ora, Absolute, 4),
    /* 0E */ entry!("ASL", Asl, Absolute, 6),
    /* 0F */ entry!("???", Illegal, Implicit, 6),
    /* 10 */ entry!("BPL", Bpl, Relative, 2),
    /* 11 */ entry!("ORA", Ora, IndirectY, 5),
    /* 12 */ entry!("???", Illegal, Implicit, 2),
    /* 13 */ entry!("???", Illegal, Implicit, 8),
    /* 14 */ entry!("???", Nop, Implicit, 4),
    /* 15 */ entry!("ORA", Ora, ZeroPageX, 4),
    /* 16 */ entry!("ASL", Asl, ZeroPageX, 6),
    /* 17 */ entry!("???", Illegal, Implicit, 6),
    /* 18 */ entry!("CLC", Clc, Implicit, 2),
    /* 19 */ entry!("ORA", Ora, AbsoluteY, 4),
    /* 1A */ entry!("???", Nop, Implicit, 2),
    /* 1B */ entry!("???", Illegal, Implicit, 7),
    /* 1C */ entry!("???", Nop, Implicit, 4),
    /* 1D */ entry!("ORA", Ora, AbsoluteX, 4),
    /* 1E */ entry!("ASL", Asl, AbsoluteX, 7),
    /* 1F */ entry!("???", Illegal, Implicit, 7),
    /* 20 */ entry!("JSR", Jsr, Absolute, 6),
    /* 21 */ entry!("AND", And, IndirectX, 6),
    /* 22 */ entry!("???", Illegal, Implicit, 2),
    /* 23 */ entry!("???", Illegal, Implicit, 8),
    /* 24 */ entry!("BIT", Bit, ZeroPage, 3),
    /* 25 */ entry!("AND", And, ZeroPage, 3),
    /* 26 */ entry!("ROL", Rol, ZeroPage, 5),
    /* 27 */ entry!("???", Illegal, Implicit, 5),
    /* 28 */ entry!("PLP", Plp, Implicit, 4),
    /* 29 */ entry!("AND", And, Immediate, 2),
    /* 2A */ entry!("ROL", Rol, Implicit, 2),
    /* 2B */ entry!("???", Illegal, Implicit, 2),
    /* 2C */ entry!("BIT", Bit, Absolute, 4),
    /* 2D */ entry!("AND", And, Absolute, 4),
    /* 2E */ entry!("ROL", Rol, Absolute, 6),
    /* 2F */ entry!("???", Illegal, Implicit, 6),
    /* 30 */ entry!("BMI", Bmi, Relative, 2),
    /* 31 */ entry!("AND", And, IndirectY, 5),
    /* 32 */ entry!("???", Illegal, Implicit, 2),
    /* 33 */ entry!("???", Illegal, Implicit, 8),
    /* 34 */ entry!("???", Nop, Implicit, 4),
    /* 35 */ entry!("AND", And, ZeroPageX, 4),
    /* 36 */ entry!("ROL", Rol, ZeroPageX, 6),
    /* 37 */ entry!("???", Illegal, Implicit, 6),
    /* 38 */ entry!("SEC", Sec, Implicit, 2),
    /* 39 */ entry!("AND", And, AbsoluteY, 4),
    /* 3A */ entry!("???", Nop, Implicit, 2),
    /* 3B */ entry!("???", Illegal, Implicit, 7),
    /* 3C */ entry!("???", Nop, Implicit, 4),
    /* 3D */ entry!("AND", And, AbsoluteX, 4),
    /* 3E */ entry!("ROL", Rol, AbsoluteX, 7),
    /* 3F */ entry!("???", Illegal, Implicit, 7),
    /* 40 */ entry!("RTI", Rti, Implicit, 6),
    /* 41 */ entry!("EOR", Eor, IndirectX, 6),
    /* 42 */ entry!("???", Illegal, Implicit, 2),
    /* 43 */ entry!("???", Illegal, Implicit, 8),
    /* 44 */ entry!("???", Nop, Implicit, 3),
    /* 45 */ entry!("EOR", Eor, ZeroPage, 3),
    /* 46 */ entry!("LSR", Lsr, ZeroPage, 5),
    /* 47 */ entry!("???", Illegal, Implicit, 5),
    /* 48 */ entry!("PHA", Pha, Implicit, 3),
    /* 49 */ entry!("EOR", Eor, Immediate, 2),
    /* 4A */ entry!("LSR", Lsr, Implicit, 2),
    /* 4B */ entry!("???", Illegal, Implicit, 2),
    /* 4C */ entry!("JMP", Jmp, Absolute, 3),
    /* 4D */ entry!("EOR", Eor, Absolute, 4),
    /* 4E */ entry!("LSR", Lsr, Absolute, 6),
    /* 4F */ entry!("???", Illegal, Implicit, 6),
    /* 50 */ entry!("BVC", Bvc, Relative, 2),
    /* 51 */ entry!("EOR", Eor, IndirectY, 5),
    /* 52 */ entry!("???", Illegal, Implicit, 2),
    /* 53 */ entry!("???", Illegal, Implicit, 8),
    /* 54 */ entry!("???", Nop, Implicit, 4),
    /* 55 */ entry!("EOR", Eor, ZeroPageX, 4),
    /* 56 */ entry!("LSR", Lsr, ZeroPageX, 6),
    /* 57 */ entry!("???", Illegal, Implicit, 6),
    /* 58 */ entry!("CLI", Cli, Implicit, 2),
    /* 59 */ entry!("EOR", Eor, AbsoluteY, 4),
    /* 5A */ entry!("???", Nop, Implicit, 2),
    /* 5B */ entry!("???", Illegal, Implicit, 7),
    /* 5C */ entry!("???", Nop, Implicit, 4),
    /* 5D */ entry!("EOR", Eor, AbsoluteX, 4),
    /* 5E */ entry!("LSR", Lsr, AbsoluteX, 7),
    /* 5F */ entry!("???", Illegal, Implicit, 7),
    /* 60 */ entry!("RTS", Rts, Implicit, 6),
    /* 61 */ entry!("ADC", Adc, IndirectX, 6),
    /* 62 */ entry!("???", Illegal, Implicit, 2),
    /* 63 */ entry!("???", Illegal, Implicit, 8),
    /* 64 */ entry!("???", Nop, Implicit, 3),
    /* 65 */ entry!("ADC", Adc, ZeroPage, 3),
    /* 66 */ entry!("ROR", Ror, ZeroPage, 5),
    /* 67 */ entry!("???", Illegal, Implicit, 5),
    /* 68 */ entry!("PLA", Pla, Implicit, 4),
    /* 69 */ entry!("ADC", Adc, Immediate, 2),
    /* 6A */ entry!("ROR", Ror, Implicit, 2),
    /* 6B */ entry!("???", Illegal, Implicit, 2),
    /* 6C */ entry!("JMP", Jmp, Indirect, 5),
    /* 6D */ entry!("ADC", Adc, Absolute, 4),
    /* 6E */ entry!("ROR", Ror, Absolute, 6),
    /* 6F */ entry!("???", Illegal, Implicit, 6),
    /* 70 */ entry!("BVS", Bvs, Relative, 2),
    /* 71 */ entry!("ADC", Adc, IndirectY, 5),
    /* 72 */ entry!("???", Illegal, Implicit, 2),
    /* 73 */ entry!("???", Illegal, Implicit, 8),
    /* 74 */ entry!("???", Nop, Implicit, 4),
    /* 75 */ entry!("ADC", Adc, ZeroPageX, 4),
    /* 76 */ entry!("ROR", Ror, ZeroPageX, 6),
    /* 77 */ entry!("???", Illegal, Implicit, 6),
    /* 78 */ entry!("SEI", Sei, Implicit, 2),
    /* 79 */ entry!("ADC", Adc, AbsoluteY, 4),
    /* 7A */ entry!("???", Nop, Implicit, 2),
    /* 7B */ entry!("???", Illegal, Implicit, 7),
    /* 7C */ entry!("???", Nop, Implicit, 4),
    /* 7D */ entry!("ADC", Adc, AbsoluteX, 4),
    /* 7E */ entry!("ROR", Ror, AbsoluteX, 7),
    /* 7F */ entry!("???", Illegal, Implicit, 7),
    /* 80 */ entry!("???", Nop, Implicit, 2),
    /* 81 */ entry!("STA", Sta, IndirectX, 6),
    /* 82 */ entry!("???", Nop, Implicit, 2),
    /* 83 */ entry!("???", Illegal, Implicit, 6),
    /* 84 */ entry!("STY", Sty, ZeroPage, 3),
    /* 85 */ entry!("STA", Sta, ZeroPage, 3),
    /* 86 */ entry!("STX", Stx, ZeroPage, 3),
    /* 87 */ entry!("???", Illegal, Implicit, 3),
    /* 88 */ entry!("DEY", Dey, Implicit, 2),
    /* 89 */ entry!("???", Nop, Implicit, 2),
    /* 8A */ entry!("TXA", Txa, Implicit, 2),
    /* 8B */ entry!("???", Illegal, Implicit, 2),
    /* 8C */ entry!("STY", Sty, Absolute, 4),
    /* 8D */ entry!("STA", Sta, Absolute, 4),
    /* 8E */ entry!("STX", Stx, Absolute, 4),
    /* 8F */ entry!("???", Illegal, Implicit, 4),
    /* 90 */ entry!("BCC", Bcc, Relative, 2),
    /* 91 */ entry!("STA", Sta, IndirectY, 6),
    /* 92 */ entry!("???", Illegal, Implicit, 2),
    /* 93 */ entry!("???", Illegal, Implicit, 6),
    /* 94 */ entry!("STY", Sty, ZeroPageX, 4),
    /* 95 */ entry!("STA", Sta, ZeroPageX, 4),
    /* 96 */ entry!("STX", Stx, ZeroPageY, 4),
    /* 97 */ entry!("???", Illegal, Implicit, 4),
    /* 98 */ entry!("TYA", Tya, Implicit, 2),
    /* 99 */ entry!("STA", Sta, AbsoluteY, 5),
    /* 9A */ entry!("TXS", Txs, Implicit, 2),
    /* 9B */ entry!("???", Illegal, Implicit, 5),
    /* 9C */ entry!("???", Nop, Implicit, 5),
    /* 9D */ entry!("STA", Sta, AbsoluteX, 5),
    /* 9E */ entry!("???", Illegal, Implicit, 5),
    /* 9F */ entry!("???", Illegal, Implicit, 5),
    /* A0 */ entry!("LDY", Ldy, Immediate, 2),
    /* A1 */ entry!("LDA", Lda, IndirectX, 6),
    /* A2 */ entry!("LDX", Ldx, Immediate, 2),
    /* A3 */ entry!("???", Illegal, Implicit, 6),
    /* A4 */ entry!("LDY", Ldy, ZeroPage, 3),
    /* A5 */ entry!("LDA", Lda, ZeroPage, 3),
    /* A6 */ entry!("LDX", Ldx, ZeroPage, 3),
    /* A7 */ entry!("???", Illegal, Implicit, 3),
    /* A8 */ entry!("TAY", Tay, Implicit, 2),
    /* A9 */ entry!("LDA", Lda, Immediate, 2),
    /* AA */ entry!("TAX", Tax, Implicit, 2),
    /* AB */ entry!("???", Illegal, Implicit, 2),
    /* AC */ entry!("LDY", Ldy, Absolute, 4),
    /* AD */ entry!("LDA", Lda, Absolute, 4),
    /* AE */ entry!("LDX", Ldx, Absolute, 4),
    /* AF */ entry!("???", Illegal, Implicit, 4),
    /* B0 */ entry!("BCS", Bcs, Relative, 2),
    /* B1 */ entry!("LDA", Lda, IndirectY, 5),
    /* B2 */ entry!("???", Illegal, Implicit, 2),
    /* B3 */ entry!("???", Illegal, Implicit, 5),
    /* B4 */ entry!("LDY", Ldy, ZeroPageX, 4),
    /* B5 */ entry!("LDA", Lda, ZeroPageX, 4),
    /* B6 */ entry!("LDX", Ldx, ZeroPageY, 4),
    /* B7 */ entry!("???", Illegal, Implicit, 4),
    /* B8 */ entry!("CLV", Clv, Implicit, 2),
    /* B9 */ entry!("LDA", Lda, AbsoluteY, 4),
    /* BA */ entry!("TSX", Tsx, Implicit, 2),
    /* BB */ entry!("???", Illegal, Implicit, 4),
    /* BC */ entry!("LDY", Ldy, AbsoluteX, 4),
    /* BD */ entry!("LDA", Lda, AbsoluteX, 4),
    /* BE */ entry!("LDX", Ldx, AbsoluteY, 4),
    /* BF */ entry!("???", Illegal, Implicit, 4),
    /* C0 */ entry!("CPY", Cpy, Immediate, 2),
    /* C1 */ entry!("CMP", Cmp, IndirectX, 6),
    /* C2 */ entry!("???", Nop, Implicit, 2),
    /* C3 */ entry!("???", Illegal, Implicit, 8),
    /* C4 */ entry!("CPY", Cpy, ZeroPage, 3),
    /* C5 */ entry!("CMP", Cmp, ZeroPage, 3),
    /* C6 */ entry!("DEC", Dec, ZeroPage, 5),
    /* C7 */ entry!("???", Illegal, Implicit, 5),
    /* C8 */ entry!("INY", Iny, Implicit, 2),
    /* C9 */ entry!("CMP", Cmp, Immediate, 2),
    /* CA */ entry!("DEX", Dex, Implicit, 2),
    /* CB */ entry!("???", Illegal, Implicit, 2),
    /* CC */ entry!("CPY", Cpy, Absolute, 4),
    /* CD */ entry!("CMP", Cmp, Absolute, 4),
    /* CE */ entry!("DEC", Dec, Absolute, 6),
    /* CF */ entry!("???", Illegal, Implicit, 6),
    /* D0 */ entry!("BNE", Bne, Relative, 2),
    /* D1 */ entry!("CMP", Cmp, IndirectY, 5),
    /* D2 */ entry!("???", Illegal, Implicit, 2),
    /* D3 */ entry!("???", Illegal, Implicit, 8),
    /* D4 */ entry!("???", Nop, Implicit, 4),
    /* D5 */ entry!("CMP", Cmp, ZeroPageX, 4),
    /* D6 */ entry!("DEC", Dec, ZeroPageX, 6),
    /* D7 */ entry!("???", Illegal, Implicit, 6),
    /* D8 */ entry!("CLD", Cld, Implicit, 2),
    /* D9 */ entry!("CMP", Cmp, AbsoluteY, 4),
    /* DA */ entry!("NOP", Nop, Implicit, 2),
    /* DB */ entry!("???", Illegal, Implicit, 7),
    /* DC */ entry!("???", Nop, Implicit, 4),
    /* DD */ entry!("CMP", Cmp, AbsoluteX, 4),
    /* DE */ entry!("DEC", Dec, AbsoluteX, 7),
    /* DF */ entry!("???", Illegal, Implicit, 7),
    /* E0 */ entry!("CPX", Cpx, Immediate, 2),
    /* E1 */ entry!("SBC", Sbc, IndirectX, 6),
    /* E2 */ entry!("???", Nop, Implicit, 2),
    /* E3 */ entry!("???", Illegal, Implicit, 8),
    /* E4 */ entry!("CPX", Cpx, ZeroPage, 3),
    /* E5 */ entry!("SBC", Sbc, ZeroPage, 3),
    /* E6 */ entry!("INC", Inc, ZeroPage, 5),
    /* E7 */ entry!("???", Illegal, Implicit, 5),
    /* E8 */ entry!("INX", Inx, Implicit, 2),
    /* E9 */ entry!("SBC", Sbc, Immediate, 2),
    /* EA */ entry!("NOP", Nop, Implicit, 2),
    /* EB */ entry!("???", Illegal, Implicit, 2),
    /* EC */ entry!("CPX", Cpx, Absolute, 4),
    /* ED */ entry!("SBC", Sbc, Absolute, 4),
    /* EE */ entry!("INC", Inc, Absolute, 6),
    /* EF */ entry!("???", Illegal, Implicit, 6),
    /* F0 */ entry!("BEQ", Beq, Relative, 2),
    /* F1 */ entry!("SBC", Sbc, IndirectY, 5),
    /* F2 */ entry!("???", Illegal, Implicit, 2),
    /* F3 */ entry!("???", Illegal, Implicit, 8),
    /* F4 */ entry!("???", Nop, Implicit, 4),
    /* F5 */ entry!("SBC", Sbc, ZeroPageX, 4),
    /* F6 */ entry!("INC", Inc, ZeroPageX, 6),
    /* F7 */ entry!("???", Illegal, Implicit, 6),
    /* F8 */ entry!("SED", Sed, Implicit, 2),
    /* F9 */ entry!("SBC", Sbc, AbsoluteY, 4),
    /* FA */ entry!("NOP", Nop, Implicit, 2),
    /* FB */ entry!("???", Illegal, Implicit, 7),
    /* FC */ entry!("???", Nop, Implicit, 4),
    /* FD */ entry!("SBC", Sbc, AbsoluteX, 4),
    /* FE */ entry!("INC", Inc, AbsoluteX, 7),
    /* FF */ entry!("???", Illegal, Implicit, 7),
];

#[inline]
#[must_use]
pub fn lookup(opcode: u8) -> &'static Instruction {
    &INSTRUCTIONS[opcode as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_opcodes() {
        assert_eq!(
            *lookup(0xA9),
            Instruction {
                mnemonic: "LDA",
                operation: Operation::Lda,
                addressing_mode: AddressingMode::Immediate,
                cycles: 2
            }
        );
        assert_eq!(lookup(0x6C).addressing_mode, AddressingMode::Indirect);
        assert_eq!(lookup(0x20).cycles, 6);
        assert_eq!(lookup(0xEA).mnemonic, "NOP");
    }

    #[test]
    fn brk_is_implicit() {
        let brk = lookup(0x00);
        assert_eq!(brk.operation, Operation::Brk);
        assert!(brk.is_implicit());
        assert_eq!(brk.cycles, 7);
    }

    #[test]
    fn undocumented_opcodes_are_implicit() {
        for opcode in 0..=u8::MAX {
            let instruction = lookup(opcode);
            if instruction.is_undocumented() {
                assert!(instruction.is_implicit(), "opcode {opcode:02X}");
                assert!(matches!(instruction.operation, Operation::Nop | Operation::Illegal));
            }
        }

        assert!(lookup(0xEB).is_illegal());
    }

    #[test]
    fn named_opcode_count() {
        // 151 documented opcodes plus the $DA and $FA NOP aliases
        let named = (0..=u8::MAX).filter(|&opcode| !lookup(opcode).is_undocumented()).count();
        assert_eq!(named, 153);
    }

    #[test]
    fn instruction_lengths() {
        assert_eq!(lookup(0xEA).byte_len(), 1);
        assert_eq!(lookup(0xD0).byte_len(), 2);
        assert_eq!(lookup(0x4C).byte_len(), 3);
    }
}
