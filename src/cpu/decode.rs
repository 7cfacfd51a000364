//! Opcode table.
//!
//! An instruction is one opcode cell followed by 0-2 operand cells. Any
//! opcode word without an entry in the table is the halt signal.

use crate::cpu::bus::Word;
use serde::{Serialize, Deserialize};

/// Number of defined opcodes.
pub const OPCODE_COUNT: usize = 27;

/// Machine instruction opcodes. The discriminant is the encoded word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    /// `addRegReg a b`: a := a + b
    AddRegReg = 0,
    /// `addMemReg m b`: b := mem[m] + b
    AddMemReg = 1,
    /// `addRegMem a m`: mem[m] := a + mem[m]
    AddRegMem = 2,
    /// `subRegReg a b`: a := a - b
    SubRegReg = 3,
    /// `subMemReg m b`: b := mem[m] - b
    SubMemReg = 4,
    /// `subRegMem a m`: mem[m] := a - mem[m]
    SubRegMem = 5,
    /// `imulMemReg m b`: b := mem[m] * b
    ImulMemReg = 6,
    /// `imulRegMem a m`: mem[m] := a * mem[m]
    ImulRegMem = 7,
    /// `imulRegReg a b`: a := a * b
    ImulRegReg = 8,
    /// `moveMemReg m r`: r := mem[m]
    MoveMemReg = 9,
    /// `moveRegMem r m`: mem[m] := r
    MoveRegMem = 10,
    /// `moveRegReg s d`: d := s
    MoveRegReg = 11,
    /// `moveImmReg i r`: r := i
    MoveImmReg = 12,
    /// `incReg r`: r := r + 1
    IncReg = 13,
    /// `incMem m`: mem[m] := mem[m] + 1
    IncMem = 14,
    /// `jmp t`
    Jmp = 15,
    /// `jn t`: jump if the negative flag is set
    Jn = 16,
    /// `jz t`: jump if the zero flag is set
    Jz = 17,
    /// `jnz t`: jump if the nonzero flag is set
    Jnz = 18,
    /// `jeq a b t`: jump if a == b
    Jeq = 19,
    /// `jgt a b t`: jump if b > a
    Jgt = 20,
    /// `jlw a b t`: jump if b < a
    Jlw = 21,
    /// `ldi r i`: r := i
    Ldi = 22,
    /// `read m r`: r := mem[m]
    Read = 23,
    /// `store r m`: mem[m] := r
    Store = 24,
    /// `addImmMem i m`: mem[m] := i + mem[m]
    AddImmMem = 25,
    /// `subImmMem i m`: mem[m] := i - mem[m]
    SubImmMem = 26,
}

impl Opcode {
    /// Every opcode, indexed by its encoding.
    pub const ALL: [Opcode; OPCODE_COUNT] = [
        Opcode::AddRegReg,
        Opcode::AddMemReg,
        Opcode::AddRegMem,
        Opcode::SubRegReg,
        Opcode::SubMemReg,
        Opcode::SubRegMem,
        Opcode::ImulMemReg,
        Opcode::ImulRegMem,
        Opcode::ImulRegReg,
        Opcode::MoveMemReg,
        Opcode::MoveRegMem,
        Opcode::MoveRegReg,
        Opcode::MoveImmReg,
        Opcode::IncReg,
        Opcode::IncMem,
        Opcode::Jmp,
        Opcode::Jn,
        Opcode::Jz,
        Opcode::Jnz,
        Opcode::Jeq,
        Opcode::Jgt,
        Opcode::Jlw,
        Opcode::Ldi,
        Opcode::Read,
        Opcode::Store,
        Opcode::AddImmMem,
        Opcode::SubImmMem,
    ];

    /// Decode an opcode word. `None` means halt.
    pub fn decode(word: Word) -> Option<Opcode> {
        usize::try_from(word).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    /// The encoded word.
    pub fn encode(self) -> Word {
        self as Word
    }

    /// Position in the dispatch table.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Assembly mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::AddRegReg => "addRegReg",
            Opcode::AddMemReg => "addMemReg",
            Opcode::AddRegMem => "addRegMem",
            Opcode::SubRegReg => "subRegReg",
            Opcode::SubMemReg => "subMemReg",
            Opcode::SubRegMem => "subRegMem",
            Opcode::ImulMemReg => "imulMemReg",
            Opcode::ImulRegMem => "imulRegMem",
            Opcode::ImulRegReg => "imulRegReg",
            Opcode::MoveMemReg => "moveMemReg",
            Opcode::MoveRegMem => "moveRegMem",
            Opcode::MoveRegReg => "moveRegReg",
            Opcode::MoveImmReg => "moveImmReg",
            Opcode::IncReg => "incReg",
            Opcode::IncMem => "incMem",
            Opcode::Jmp => "jmp",
            Opcode::Jn => "jn",
            Opcode::Jz => "jz",
            Opcode::Jnz => "jnz",
            Opcode::Jeq => "jeq",
            Opcode::Jgt => "jgt",
            Opcode::Jlw => "jlw",
            Opcode::Ldi => "ldi",
            Opcode::Read => "read",
            Opcode::Store => "store",
            Opcode::AddImmMem => "addImmMem",
            Opcode::SubImmMem => "subImmMem",
        }
    }

    /// Number of operand cells following the opcode.
    pub fn operand_count(self) -> usize {
        match self {
            Opcode::IncReg | Opcode::IncMem => 1,
            Opcode::Jmp | Opcode::Jn | Opcode::Jz | Opcode::Jnz => 1,
            Opcode::Jeq | Opcode::Jgt | Opcode::Jlw => 3,
            _ => 2,
        }
    }

    /// Whether the instruction may transfer control.
    pub fn is_jump(self) -> bool {
        matches!(
            self,
            Opcode::Jmp
                | Opcode::Jn
                | Opcode::Jz
                | Opcode::Jnz
                | Opcode::Jeq
                | Opcode::Jgt
                | Opcode::Jlw
        )
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_matches_discriminants() {
        for (i, op) in Opcode::ALL.iter().enumerate() {
            assert_eq!(op.index(), i, "{} is out of place", op);
        }
    }

    #[test]
    fn test_decode_halt_words() {
        assert_eq!(Opcode::decode(-1), None);
        assert_eq!(Opcode::decode(OPCODE_COUNT as Word), None);
        assert_eq!(Opcode::decode(Word::MAX), None);
    }

    #[test]
    fn test_decode_known_words() {
        assert_eq!(Opcode::decode(0), Some(Opcode::AddRegReg));
        assert_eq!(Opcode::decode(15), Some(Opcode::Jmp));
        assert_eq!(Opcode::decode(22), Some(Opcode::Ldi));
        assert_eq!(Opcode::decode(26), Some(Opcode::SubImmMem));
    }

    #[test]
    fn test_mnemonics_are_unique() {
        for (i, a) in Opcode::ALL.iter().enumerate() {
            for b in &Opcode::ALL[i + 1..] {
                assert_ne!(a.mnemonic(), b.mnemonic());
            }
        }
    }

    #[test]
    fn test_operand_counts() {
        assert_eq!(Opcode::IncMem.operand_count(), 1);
        assert_eq!(Opcode::Jz.operand_count(), 1);
        assert_eq!(Opcode::Jlw.operand_count(), 3);
        assert_eq!(Opcode::AddImmMem.operand_count(), 2);
        assert!(Opcode::Jgt.is_jump());
        assert!(!Opcode::Store.is_jump());
    }
}
