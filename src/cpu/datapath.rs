//! The datapath: every component of the machine and the wiring between them.
//!
//! Values move only by bus transfers. A source drives a bus, a destination
//! latches it. The register file is addressed through the select bus, which
//! carries a register id; [`Endpoint::Selected`] names whichever register the
//! select bus currently points at.

use crate::cpu::bus::{Bus, BusId, Buses, Word};
use crate::cpu::memory::{Memory, MemoryError, StorePhase};
use crate::cpu::registers::{RegisterError, RegisterFile};
use crate::cpu::ula::{Slot, Ula};
use serde::{Serialize, Deserialize};

/// Something that can drive or latch a bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// A register, by id.
    Register(usize),
    /// The register whose id is on the select bus.
    Selected,
    /// A ULA slot, through the port wired to the bus in question.
    Ula(Slot),
}

/// Values on every bus at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusSnapshot {
    pub external: Word,
    pub internal_a: Word,
    pub internal_b: Word,
    pub select: Word,
}

/// All components of the machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datapath {
    pub buses: Buses,
    /// Register-select bus (carries register ids).
    pub select: Bus,
    pub registers: RegisterFile,
    pub ula: Ula,
    pub memory: Memory,
}

impl Datapath {
    /// Build the datapath with `memory_size` cells.
    pub fn new(memory_size: usize) -> Self {
        Self {
            buses: Buses::new(),
            select: Bus::new(),
            registers: RegisterFile::new(),
            ula: Ula::new(BusId::InternalA, BusId::InternalB),
            memory: Memory::new(memory_size),
        }
    }

    /// Put `from` on `bus`.
    pub fn drive(&mut self, from: Endpoint, bus: BusId) -> Result<(), RegisterError> {
        match from {
            Endpoint::Register(id) => self.registers.get(id)?.drive(bus, &mut self.buses),
            Endpoint::Selected => {
                let id = self.selected()?;
                self.registers.get(id)?.drive(bus, &mut self.buses)
            }
            Endpoint::Ula(slot) => {
                if bus == self.ula.primary_bus() {
                    self.ula.drive(slot, &mut self.buses);
                } else if bus == self.ula.alternate_bus() {
                    self.ula.drive_alternate(slot, &mut self.buses);
                } else {
                    return Err(ula_not_wired(bus));
                }
                Ok(())
            }
        }
    }

    /// Take the value on `bus` into `to`.
    pub fn latch(&mut self, to: Endpoint, bus: BusId) -> Result<(), RegisterError> {
        match to {
            Endpoint::Register(id) => self.registers.get_mut(id)?.latch(bus, &self.buses),
            Endpoint::Selected => {
                let id = self.selected()?;
                self.registers.get_mut(id)?.latch(bus, &self.buses)
            }
            Endpoint::Ula(slot) => {
                if bus == self.ula.primary_bus() {
                    self.ula.latch(slot, &self.buses);
                } else if bus == self.ula.alternate_bus() {
                    self.ula.latch_alternate(slot, &self.buses);
                } else {
                    return Err(ula_not_wired(bus));
                }
                Ok(())
            }
        }
    }

    /// Move a value from `from` to `to` over `bus`.
    pub fn transfer(&mut self, from: Endpoint, to: Endpoint, bus: BusId) -> Result<(), RegisterError> {
        self.drive(from, bus)?;
        self.latch(to, bus)
    }

    /// Copy the external bus onto the select bus.
    pub fn select_from_external(&mut self) {
        self.select.put(self.buses.get(BusId::External));
    }

    /// Register id currently on the select bus.
    pub fn selected(&self) -> Result<usize, RegisterError> {
        self.registers.resolve(self.select.get())
    }

    /// Memory read through the external bus.
    pub fn memory_read(&mut self) -> Result<(), MemoryError> {
        self.memory.read(&mut self.buses)
    }

    /// One phase of a memory write through the external bus.
    pub fn memory_store(&mut self) -> Result<StorePhase, MemoryError> {
        self.memory.store(&self.buses)
    }

    /// Write one cell using the two-phase protocol.
    pub fn write_cell(&mut self, addr: Word, value: Word) -> Result<(), MemoryError> {
        self.buses.put(BusId::External, addr);
        self.memory_store()?;
        self.buses.put(BusId::External, value);
        self.memory_store()?;
        Ok(())
    }

    /// Read one cell through the external bus.
    pub fn read_cell(&mut self, addr: Word) -> Result<Word, MemoryError> {
        self.buses.put(BusId::External, addr);
        self.memory_read()?;
        Ok(self.buses.get(BusId::External))
    }

    /// Current bus values.
    pub fn bus_snapshot(&self) -> BusSnapshot {
        BusSnapshot {
            external: self.buses.get(BusId::External),
            internal_a: self.buses.get(BusId::InternalA),
            internal_b: self.buses.get(BusId::InternalB),
            select: self.select.get(),
        }
    }

    /// Zero registers, buses and ULA, and clear memory.
    pub fn reset(&mut self) {
        self.buses.reset();
        self.select = Bus::new();
        self.registers.reset();
        self.ula.reset();
        self.memory.clear();
    }
}

fn ula_not_wired(bus: BusId) -> RegisterError {
    RegisterError::NotWired { register: "ULA".to_string(), bus }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::registers::{IR, PC, RPG0, RPG1};

    #[test]
    fn test_transfer_between_registers() {
        let mut dp = Datapath::new(16);
        dp.buses.put(BusId::External, 9);
        dp.latch(Endpoint::Register(RPG0), BusId::External).unwrap();

        dp.transfer(Endpoint::Register(RPG0), Endpoint::Register(RPG1), BusId::InternalA).unwrap();
        assert_eq!(dp.registers.get(RPG1).unwrap().value(), 9);
    }

    #[test]
    fn test_no_path_from_pc_to_ula() {
        let mut dp = Datapath::new(16);
        assert!(dp.transfer(Endpoint::Register(PC), Endpoint::Ula(Slot::Right), BusId::InternalA).is_err());
        assert!(dp.transfer(Endpoint::Register(PC), Endpoint::Ula(Slot::Right), BusId::InternalB).is_err());
    }

    #[test]
    fn test_ula_not_on_external_bus() {
        let mut dp = Datapath::new(16);
        assert_eq!(
            dp.latch(Endpoint::Ula(Slot::Left), BusId::External),
            Err(RegisterError::NotWired { register: "ULA".into(), bus: BusId::External })
        );
    }

    #[test]
    fn test_selected_register() {
        let mut dp = Datapath::new(16);
        dp.buses.put(BusId::External, RPG1 as Word);
        dp.select_from_external();
        dp.buses.put(BusId::External, -4);
        dp.latch(Endpoint::Selected, BusId::External).unwrap();
        assert_eq!(dp.registers.get(RPG1).unwrap().value(), -4);

        dp.select.put(12);
        assert_eq!(dp.selected(), Err(RegisterError::NoSuchRegister(12)));
    }

    #[test]
    fn test_ir_route_into_ula() {
        let mut dp = Datapath::new(16);
        dp.buses.put(BusId::External, 30);
        dp.latch(Endpoint::Register(IR), BusId::External).unwrap();
        dp.transfer(Endpoint::Register(IR), Endpoint::Ula(Slot::Right), BusId::InternalB).unwrap();
        assert_eq!(dp.ula.slot(Slot::Right), 30);
    }

    #[test]
    fn test_cell_helpers() {
        let mut dp = Datapath::new(16);
        dp.write_cell(3, 77).unwrap();
        assert_eq!(dp.read_cell(3), Ok(77));
        assert!(dp.write_cell(16, 1).is_err());
    }
}
