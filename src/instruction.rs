/// # instruction
///
/// Instruction decoding.
///
/// Decoding happens in two stages: [`Opcode::decode`] splits a raw word into
/// its nibble/byte fields, then [`Instruction::from`] names the operation.
/// Both are total; words that aren't a CHIP-8 instruction become
/// [`Instruction::Unknown`], which the executor skips.
use std::fmt;

/// the raw fields of an instruction word, `IXYN` / `IXNN` / `INNN`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub raw: u16,
    /// top nibble, the instruction family
    pub family: u8,
    pub x: usize,
    pub y: usize,
    pub n: u8,
    pub nn: u8,
    pub nnn: u16,
}

impl Opcode {
    pub fn decode(raw: u16) -> Self {
        Opcode {
            raw,
            family: (raw >> 12) as u8,
            x: ((raw >> 8) & 0xF) as usize,
            y: ((raw >> 4) & 0xF) as usize,
            n: (raw & 0xF) as u8,
            nn: (raw & 0xFF) as u8,
            nnn: raw & 0x0FFF,
        }
    }
}

/// One decoded CHIP-8 instruction. Register operands are indices 0x0..=0xF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    ClearScreen,
    /// 00EE
    Return,
    /// 1NNN
    Jump(u16),
    /// 2NNN
    Call(u16),
    /// 3XNN
    SkipIfEqualByte(usize, u8),
    /// 4XNN
    SkipIfNotEqualByte(usize, u8),
    /// 5XY0
    SkipIfRegistersEqual(usize, usize),
    /// 6XNN
    LoadByte(usize, u8),
    /// 7XNN, no carry
    AddByte(usize, u8),
    /// 8XY0
    Assign(usize, usize),
    /// 8XY1
    Or(usize, usize),
    /// 8XY2
    And(usize, usize),
    /// 8XY3
    Xor(usize, usize),
    /// 8XY4, VF = carry
    AddRegisters(usize, usize),
    /// 8XY5, VF = X > Y
    SubtractYFromX(usize, usize),
    /// 8XY6, VF = bit shifted out
    ShiftRight(usize, usize),
    /// 8XY7, VF = Y > X
    SubtractXFromY(usize, usize),
    /// 8XYE, VF = bit shifted out
    ShiftLeft(usize, usize),
    /// 9XY0
    SkipIfRegistersNotEqual(usize, usize),
    /// ANNN
    SetIndex(u16),
    /// BNNN, or BXNN depending on quirks; keeps X around for the latter
    JumpWithOffset(usize, u16),
    /// CXNN
    Random(usize, u8),
    /// DXYN
    Draw(usize, usize, u8),
    /// EX9E
    SkipIfKeyPressed(usize),
    /// EXA1
    SkipIfKeyNotPressed(usize),
    /// FX07
    ReadDelayTimer(usize),
    /// FX0A
    WaitForKey(usize),
    /// FX15
    SetDelayTimer(usize),
    /// FX18
    SetSoundTimer(usize),
    /// FX1E
    AddToIndex(usize),
    /// FX29
    FontCharacter(usize),
    /// FX33
    BinaryCodedDecimal(usize),
    /// FX55
    StoreRegisters(usize),
    /// FX65
    LoadRegisters(usize),
    /// anything else, including 0NNN machine routines
    Unknown(u16),
}

impl From<Opcode> for Instruction {
    fn from(op: Opcode) -> Self {
        use Instruction::*;
        let Opcode {
            raw,
            family,
            x,
            y,
            n,
            nn,
            nnn,
        } = op;
        match (family, n) {
            (0x0, _) => match nnn {
                0x0E0 => ClearScreen,
                0x0EE => Return,
                _ => Unknown(raw),
            },
            (0x1, _) => Jump(nnn),
            (0x2, _) => Call(nnn),
            (0x3, _) => SkipIfEqualByte(x, nn),
            (0x4, _) => SkipIfNotEqualByte(x, nn),
            (0x5, 0x0) => SkipIfRegistersEqual(x, y),
            (0x6, _) => LoadByte(x, nn),
            (0x7, _) => AddByte(x, nn),
            (0x8, 0x0) => Assign(x, y),
            (0x8, 0x1) => Or(x, y),
            (0x8, 0x2) => And(x, y),
            (0x8, 0x3) => Xor(x, y),
            (0x8, 0x4) => AddRegisters(x, y),
            (0x8, 0x5) => SubtractYFromX(x, y),
            (0x8, 0x6) => ShiftRight(x, y),
            (0x8, 0x7) => SubtractXFromY(x, y),
            (0x8, 0xE) => ShiftLeft(x, y),
            (0x9, 0x0) => SkipIfRegistersNotEqual(x, y),
            (0xA, _) => SetIndex(nnn),
            (0xB, _) => JumpWithOffset(x, nnn),
            (0xC, _) => Random(x, nn),
            (0xD, _) => Draw(x, y, n),
            (0xE, _) => match nn {
                0x9E => SkipIfKeyPressed(x),
                0xA1 => SkipIfKeyNotPressed(x),
                _ => Unknown(raw),
            },
            (0xF, _) => match nn {
                0x07 => ReadDelayTimer(x),
                0x0A => WaitForKey(x),
                0x15 => SetDelayTimer(x),
                0x18 => SetSoundTimer(x),
                0x1E => AddToIndex(x),
                0x29 => FontCharacter(x),
                0x33 => BinaryCodedDecimal(x),
                0x55 => StoreRegisters(x),
                0x65 => LoadRegisters(x),
                _ => Unknown(raw),
            },
            _ => Unknown(raw),
        }
    }
}

impl Instruction {
    pub fn decode(raw: u16) -> Self {
        Opcode::decode(raw).into()
    }
}

/// disassembly, as it shows up in trace logs
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match *self {
            ClearScreen => write!(f, "CLS"),
            Return => write!(f, "RET"),
            Jump(a) => write!(f, "JP   0x{:03x}", a),
            Call(a) => write!(f, "CALL 0x{:03x}", a),
            SkipIfEqualByte(x, b) => write!(f, "SE   V{:X}, 0x{:02x}", x, b),
            SkipIfNotEqualByte(x, b) => write!(f, "SNE  V{:X}, 0x{:02x}", x, b),
            SkipIfRegistersEqual(x, y) => write!(f, "SE   V{:X}, V{:X}", x, y),
            LoadByte(x, b) => write!(f, "LD   V{:X}, 0x{:02x}", x, b),
            AddByte(x, b) => write!(f, "ADD  V{:X}, 0x{:02x}", x, b),
            Assign(x, y) => write!(f, "LD   V{:X}, V{:X}", x, y),
            Or(x, y) => write!(f, "OR   V{:X}, V{:X}", x, y),
            And(x, y) => write!(f, "AND  V{:X}, V{:X}", x, y),
            Xor(x, y) => write!(f, "XOR  V{:X}, V{:X}", x, y),
            AddRegisters(x, y) => write!(f, "ADD  V{:X}, V{:X}", x, y),
            SubtractYFromX(x, y) => write!(f, "SUB  V{:X}, V{:X}", x, y),
            ShiftRight(x, y) => write!(f, "SHR  V{:X}, V{:X}", x, y),
            SubtractXFromY(x, y) => write!(f, "SUBN V{:X}, V{:X}", x, y),
            ShiftLeft(x, y) => write!(f, "SHL  V{:X}, V{:X}", x, y),
            SkipIfRegistersNotEqual(x, y) => write!(f, "SNE  V{:X}, V{:X}", x, y),
            SetIndex(a) => write!(f, "LD   I, 0x{:03x}", a),
            JumpWithOffset(x, a) => write!(f, "JP   V0|V{:X}, 0x{:03x}", x, a),
            Random(x, b) => write!(f, "RND  V{:X}, 0x{:02x}", x, b),
            Draw(x, y, n) => write!(f, "DRW  V{:X}, V{:X}, {}", x, y, n),
            SkipIfKeyPressed(x) => write!(f, "SKP  V{:X}", x),
            SkipIfKeyNotPressed(x) => write!(f, "SKNP V{:X}", x),
            ReadDelayTimer(x) => write!(f, "LD   V{:X}, DT", x),
            WaitForKey(x) => write!(f, "LD   V{:X}, K", x),
            SetDelayTimer(x) => write!(f, "LD   DT, V{:X}", x),
            SetSoundTimer(x) => write!(f, "LD   ST, V{:X}", x),
            AddToIndex(x) => write!(f, "ADD  I, V{:X}", x),
            FontCharacter(x) => write!(f, "LD   F, V{:X}", x),
            BinaryCodedDecimal(x) => write!(f, "LD   B, V{:X}", x),
            StoreRegisters(x) => write!(f, "LD   [I], V{:X}", x),
            LoadRegisters(x) => write!(f, "LD   V{:X}, [I]", x),
            Unknown(raw) => write!(f, "DW   0x{:04x}", raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_opcode_fields() {
        let op = Opcode::decode(0xD12A);
        assert_eq!(op.family, 0xD);
        assert_eq!(op.x, 0x1);
        assert_eq!(op.y, 0x2);
        assert_eq!(op.n, 0xA);
        assert_eq!(op.nn, 0x2A);
        assert_eq!(op.nnn, 0x12A);
    }

    #[test]
    fn test_decode_table() {
        use Instruction::*;
        let cases = [
            (0x00E0, ClearScreen),
            (0x00EE, Return),
            (0x1234, Jump(0x234)),
            (0x2ABC, Call(0xABC)),
            (0x3A42, SkipIfEqualByte(0xA, 0x42)),
            (0x4B42, SkipIfNotEqualByte(0xB, 0x42)),
            (0x5120, SkipIfRegistersEqual(1, 2)),
            (0x6005, LoadByte(0, 5)),
            (0x7003, AddByte(0, 3)),
            (0x8120, Assign(1, 2)),
            (0x8121, Or(1, 2)),
            (0x8122, And(1, 2)),
            (0x8123, Xor(1, 2)),
            (0x8124, AddRegisters(1, 2)),
            (0x8125, SubtractYFromX(1, 2)),
            (0x8126, ShiftRight(1, 2)),
            (0x8127, SubtractXFromY(1, 2)),
            (0x812E, ShiftLeft(1, 2)),
            (0x9120, SkipIfRegistersNotEqual(1, 2)),
            (0xA21E, SetIndex(0x21E)),
            (0xB312, JumpWithOffset(3, 0x312)),
            (0xC70F, Random(7, 0x0F)),
            (0xD125, Draw(1, 2, 5)),
            (0xE49E, SkipIfKeyPressed(4)),
            (0xE4A1, SkipIfKeyNotPressed(4)),
            (0xF507, ReadDelayTimer(5)),
            (0xF50A, WaitForKey(5)),
            (0xF515, SetDelayTimer(5)),
            (0xF518, SetSoundTimer(5)),
            (0xF51E, AddToIndex(5)),
            (0xF029, FontCharacter(0)),
            (0xF533, BinaryCodedDecimal(5)),
            (0xF555, StoreRegisters(5)),
            (0xF565, LoadRegisters(5)),
        ];
        for (raw, expected) in cases {
            assert_eq!(Instruction::decode(raw), expected, "0x{:04x}", raw);
        }
    }

    #[test]
    fn test_unknown_sub_opcodes() {
        for raw in [0x0000, 0x0123, 0x5121, 0x8128, 0x912F, 0xE400, 0xF5FF] {
            assert_eq!(Instruction::decode(raw), Instruction::Unknown(raw));
        }
    }

    #[test]
    fn test_disassembly() {
        assert_eq!(Instruction::decode(0xD125).to_string(), "DRW  V1, V2, 5");
        assert_eq!(Instruction::decode(0xA21E).to_string(), "LD   I, 0x21e");
        assert_eq!(Instruction::decode(0x0123).to_string(), "DW   0x0123");
    }

    #[test]
    fn test_decode_is_total() {
        for raw in 0..=u16::MAX {
            let op = Opcode::decode(raw);
            assert!(op.family <= 0xF && op.x <= 0xF && op.y <= 0xF && op.n <= 0xF);
            let _ = Instruction::from(op);
        }
    }

    proptest! {
        /// fields always reassemble into the word they came from
        #[test]
        fn fields_reassemble(raw in any::<u16>()) {
            let op = Opcode::decode(raw);
            prop_assert_eq!(((op.family as u16) << 12) | op.nnn, raw);
            prop_assert_eq!(((op.x as u16) << 8) | op.nn as u16, raw & 0x0FFF);
            prop_assert_eq!(((op.y as u8) << 4) | op.n, op.nn);
        }
    }
}
