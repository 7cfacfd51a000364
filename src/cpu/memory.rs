//! Main memory.
//!
//! A fixed array of words wired to the external bus. Reads take an address
//! off the bus and replace it with the cell's contents. Writes take two
//! calls: the first latches the bus value as the pending address, the second
//! writes the bus value there and clears the latch. A read between the two
//! phases leaves the latch alone.

use crate::cpu::bus::{BusId, Buses, Word};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Default number of memory cells.
pub const MEMORY_SIZE: usize = 256;

/// Outcome of one `store` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePhase {
    /// The bus value was latched as the pending address.
    AddressLatched(usize),
    /// The bus value was written to the given address.
    Written(usize),
}

/// Word-addressed memory.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<Word>,
    pending: Option<usize>,
    port: BusId,
}

impl Memory {
    /// Create a zeroed memory with `size` cells.
    pub fn new(size: usize) -> Self {
        Self {
            cells: vec![0; size],
            pending: None,
            port: BusId::External,
        }
    }

    /// Number of cells.
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    /// Replace the address on the bus with the contents of that cell.
    pub fn read(&self, buses: &mut Buses) -> Result<(), MemoryError> {
        let addr = self.index(buses.get(self.port))?;
        buses.put(self.port, self.cells[addr]);
        Ok(())
    }

    /// One phase of the two-phase write protocol.
    pub fn store(&mut self, buses: &Buses) -> Result<StorePhase, MemoryError> {
        let value = buses.get(self.port);
        match self.pending.take() {
            None => {
                let addr = self.index(value)?;
                self.pending = Some(addr);
                Ok(StorePhase::AddressLatched(addr))
            }
            Some(addr) => {
                self.cells[addr] = value;
                Ok(StorePhase::Written(addr))
            }
        }
    }

    /// Address latched by an unfinished write, if any.
    pub fn pending_address(&self) -> Option<usize> {
        self.pending
    }

    /// Read a cell directly, bypassing the bus. For tracing and inspection.
    pub fn peek(&self, addr: usize) -> Result<Word, MemoryError> {
        self.cells
            .get(addr)
            .copied()
            .ok_or(MemoryError::AddressOutOfRange { addr: addr as i64, size: self.size() })
    }

    /// Read-only view of every cell.
    pub fn dump(&self) -> &[Word] {
        &self.cells
    }

    /// Zero every cell and drop any pending write.
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|cell| *cell = 0);
        self.pending = None;
    }

    fn index(&self, addr: Word) -> Result<usize, MemoryError> {
        usize::try_from(addr)
            .ok()
            .filter(|&i| i < self.cells.len())
            .ok_or(MemoryError::AddressOutOfRange { addr: addr as i64, size: self.size() })
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(MEMORY_SIZE)
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|&&cell| cell != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &self.cells.len())
            .field("pending", &self.pending)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Address is outside valid memory range.
    #[error("memory address {addr} out of range (0-{max})", max = .size.saturating_sub(1))]
    AddressOutOfRange { addr: i64, size: usize },

    /// A program tried to write into the control unit's scratch area.
    #[error("memory address {addr} is in the reserved area")]
    ReservedArea { addr: usize },

    /// Program does not fit below the reserved area.
    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
}
