//! Registers and the register file.
//!
//! The machine has 7 registers, addressed by id:
//! - RPG0..RPG3 (0-3): general purpose, on the external bus and internal bus A
//! - PC (4): program counter, external bus only
//! - IR (5): instruction register, external bus and internal bus B
//! - FLAGS (6): condition bits, internal bus A only
//!
//! Registers never compute. Every operation moves a value between the
//! register and one of its wired buses.

use crate::cpu::bus::{BusId, Buses, Word};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// General-purpose register 0.
pub const RPG0: usize = 0;
/// General-purpose register 1.
pub const RPG1: usize = 1;
/// General-purpose register 2.
pub const RPG2: usize = 2;
/// General-purpose register 3.
pub const RPG3: usize = 3;
/// Program counter.
pub const PC: usize = 4;
/// Instruction register.
pub const IR: usize = 5;
/// Flags register.
pub const FLAGS: usize = 6;

/// Number of registers in the file.
pub const REGISTER_COUNT: usize = 7;

/// Number of condition bits held by FLAGS.
pub const FLAG_BITS: usize = 3;

/// Condition bits of the FLAGS register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flag {
    /// Bit 0: last result was zero.
    Zero,
    /// Bit 1: last result was negative.
    Negative,
    /// Bit 2: last result was not zero.
    NonZero,
}

impl Flag {
    /// Bit index inside FLAGS.
    pub const fn bit(self) -> usize {
        match self {
            Flag::Zero => 0,
            Flag::Negative => 1,
            Flag::NonZero => 2,
        }
    }
}

/// A named storage cell wired to up to two buses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register {
    name: String,
    value: Word,
    external: Option<BusId>,
    internal: Option<BusId>,
    flags: bool,
}

impl Register {
    /// Create a word register with the given wiring.
    pub fn new(name: &str, external: Option<BusId>, internal: Option<BusId>) -> Self {
        Self {
            name: name.to_string(),
            value: 0,
            external,
            internal,
            flags: false,
        }
    }

    /// Create the bit-addressable flags register, wired to one internal bus.
    pub fn flags(internal: BusId) -> Self {
        Self {
            name: "FLAGS".to_string(),
            value: 0,
            external: None,
            internal: Some(internal),
            flags: true,
        }
    }

    /// Register name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stored value (for FLAGS, the packed condition bits).
    pub fn value(&self) -> Word {
        self.value
    }

    /// Whether this register is wired to `bus`.
    pub fn is_wired_to(&self, bus: BusId) -> bool {
        self.external == Some(bus) || self.internal == Some(bus)
    }

    /// Put the stored value on `bus`.
    pub fn drive(&self, bus: BusId, buses: &mut Buses) -> Result<(), RegisterError> {
        self.check_wired(bus)?;
        buses.put(bus, self.value);
        Ok(())
    }

    /// Take the value on `bus` into storage.
    pub fn latch(&mut self, bus: BusId, buses: &Buses) -> Result<(), RegisterError> {
        self.check_wired(bus)?;
        self.value = buses.get(bus);
        if self.flags {
            self.value &= (1 << FLAG_BITS) - 1;
        }
        Ok(())
    }

    /// Read one condition bit. Only valid on FLAGS.
    pub fn bit(&self, index: usize) -> Result<bool, RegisterError> {
        self.check_bit(index)?;
        Ok(self.value & (1 << index) != 0)
    }

    /// Set or clear one condition bit. Only valid on FLAGS.
    pub fn set_bit(&mut self, index: usize, set: bool) -> Result<(), RegisterError> {
        self.check_bit(index)?;
        if set {
            self.value |= 1 << index;
        } else {
            self.value &= !(1 << index);
        }
        Ok(())
    }

    /// Clear the stored value.
    pub fn reset(&mut self) {
        self.value = 0;
    }

    fn check_wired(&self, bus: BusId) -> Result<(), RegisterError> {
        if self.is_wired_to(bus) {
            Ok(())
        } else {
            Err(self.not_wired(bus))
        }
    }

    fn not_wired(&self, bus: BusId) -> RegisterError {
        RegisterError::NotWired {
            register: self.name.clone(),
            bus,
        }
    }

    fn check_bit(&self, index: usize) -> Result<(), RegisterError> {
        if !self.flags {
            return Err(RegisterError::NotFlags(self.name.clone()));
        }
        if index >= FLAG_BITS {
            return Err(RegisterError::BitOutOfRange(index));
        }
        Ok(())
    }
}

/// The register file, indexed by register id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterFile {
    regs: Vec<Register>,
}

impl RegisterFile {
    /// Build the register file with its fixed wiring.
    pub fn new() -> Self {
        let ext = Some(BusId::External);
        let int_a = Some(BusId::InternalA);
        Self {
            regs: vec![
                Register::new("RPG0", ext, int_a),
                Register::new("RPG1", ext, int_a),
                Register::new("RPG2", ext, int_a),
                Register::new("RPG3", ext, int_a),
                Register::new("PC", ext, None),
                Register::new("IR", ext, Some(BusId::InternalB)),
                Register::flags(BusId::InternalA),
            ],
        }
    }

    /// Look up a register by id.
    pub fn get(&self, id: usize) -> Result<&Register, RegisterError> {
        self.regs.get(id).ok_or(RegisterError::NoSuchRegister(id as i64))
    }

    /// Look up a register by id, mutably.
    pub fn get_mut(&mut self, id: usize) -> Result<&mut Register, RegisterError> {
        self.regs.get_mut(id).ok_or(RegisterError::NoSuchRegister(id as i64))
    }

    /// Resolve a register id carried as a machine word.
    pub fn resolve(&self, word: Word) -> Result<usize, RegisterError> {
        usize::try_from(word)
            .ok()
            .filter(|&id| id < self.regs.len())
            .ok_or(RegisterError::NoSuchRegister(word as i64))
    }

    /// Find a register by name (case-insensitive).
    pub fn find(&self, name: &str) -> Option<usize> {
        self.regs.iter().position(|r| r.name.eq_ignore_ascii_case(name))
    }

    /// Iterate over all registers in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Register> {
        self.regs.iter()
    }

    /// Name/value pairs, in id order.
    pub fn snapshot(&self) -> Vec<(String, Word)> {
        self.regs.iter().map(|r| (r.name.clone(), r.value)).collect()
    }

    /// Number of registers.
    pub fn len(&self) -> usize {
        self.regs.len()
    }

    /// Always false; the file is never empty.
    pub fn is_empty(&self) -> bool {
        self.regs.is_empty()
    }

    /// Zero every register.
    pub fn reset(&mut self) {
        for reg in &mut self.regs {
            reg.reset();
        }
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors raised by register access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("no register with id {0}")]
    NoSuchRegister(i64),

    #[error("register {register} is not wired to the {bus}")]
    NotWired { register: String, bus: BusId },

    #[error("register {0} is not bit-addressable")]
    NotFlags(String),

    #[error("flag bit {0} out of range (0-2)")]
    BitOutOfRange(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_and_latch() {
        let mut file = RegisterFile::new();
        let mut buses = Buses::new();

        buses.put(BusId::External, 42);
        file.get_mut(RPG2).unwrap().latch(BusId::External, &buses).unwrap();
        assert_eq!(file.get(RPG2).unwrap().value(), 42);

        file.get(RPG2).unwrap().drive(BusId::InternalA, &mut buses).unwrap();
        assert_eq!(buses.get(BusId::InternalA), 42);
    }

    #[test]
    fn test_pc_has_no_internal_path() {
        let file = RegisterFile::new();
        let mut buses = Buses::new();

        let err = file.get(PC).unwrap().drive(BusId::InternalA, &mut buses).unwrap_err();
        assert_eq!(
            err,
            RegisterError::NotWired { register: "PC".into(), bus: BusId::InternalA }
        );
    }

    #[test]
    fn test_ir_sees_only_internal_b() {
        let file = RegisterFile::new();
        let mut buses = Buses::new();
        let ir = file.get(IR).unwrap();

        assert!(ir.drive(BusId::InternalB, &mut buses).is_ok());
        assert!(ir.drive(BusId::InternalA, &mut buses).is_err());
    }

    #[test]
    fn test_flags_not_on_external_bus() {
        let mut file = RegisterFile::new();
        let buses = Buses::new();
        assert!(file.get_mut(FLAGS).unwrap().latch(BusId::External, &buses).is_err());
    }

    #[test]
    fn test_flag_bits_are_independent() {
        let mut flags = Register::flags(BusId::InternalA);

        flags.set_bit(Flag::Negative.bit(), true).unwrap();
        flags.set_bit(Flag::NonZero.bit(), true).unwrap();
        flags.set_bit(Flag::Negative.bit(), false).unwrap();

        assert!(!flags.bit(0).unwrap());
        assert!(!flags.bit(1).unwrap());
        assert!(flags.bit(2).unwrap());
        assert_eq!(flags.value(), 0b100);
    }

    #[test]
    fn test_flag_bit_out_of_range() {
        let mut flags = Register::flags(BusId::InternalA);
        assert_eq!(flags.bit(3), Err(RegisterError::BitOutOfRange(3)));
        assert_eq!(flags.set_bit(7, true), Err(RegisterError::BitOutOfRange(7)));
    }

    #[test]
    fn test_bits_only_on_flags() {
        let reg = Register::new("RPG0", Some(BusId::External), None);
        assert_eq!(reg.bit(0), Err(RegisterError::NotFlags("RPG0".into())));
    }

    #[test]
    fn test_flags_latch_masks_to_three_bits() {
        let mut flags = Register::flags(BusId::InternalA);
        let mut buses = Buses::new();
        buses.put(BusId::InternalA, -1);
        flags.latch(BusId::InternalA, &buses).unwrap();
        assert_eq!(flags.value(), 0b111);
    }

    #[test]
    fn test_resolve_register_ids() {
        let file = RegisterFile::new();
        assert_eq!(file.len(), REGISTER_COUNT);
        assert_eq!(file.resolve(0), Ok(RPG0));
        assert_eq!(file.resolve(6), Ok(FLAGS));
        assert_eq!(file.resolve(7), Err(RegisterError::NoSuchRegister(7)));
        assert_eq!(file.resolve(-1), Err(RegisterError::NoSuchRegister(-1)));
    }

    #[test]
    fn test_find_by_name() {
        let file = RegisterFile::new();
        assert_eq!(file.find("pc"), Some(PC));
        assert_eq!(file.find("RPG3"), Some(RPG3));
        assert_eq!(file.find("ACC"), None);
    }
}
