//! Bus wires.
//!
//! A bus is a single-slot wire: the last component to drive it wins, and
//! reading it never changes anything. The machine has three data buses
//! (external, internal A, internal B) addressed by [`BusId`].

use serde::{Serialize, Deserialize};

/// Machine word carried on every bus and stored in every cell.
pub type Word = i32;

/// Identifies one of the three data buses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BusId {
    /// Connects memory, PC, IR and the general-purpose registers.
    External,
    /// Connects the general-purpose registers, FLAGS and the ULA primary port.
    InternalA,
    /// Connects IR and the ULA alternate port.
    InternalB,
}

impl BusId {
    /// All data buses, in display order.
    pub const ALL: [BusId; 3] = [BusId::External, BusId::InternalA, BusId::InternalB];
}

impl std::fmt::Display for BusId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BusId::External => "external bus",
            BusId::InternalA => "internal bus A",
            BusId::InternalB => "internal bus B",
        };
        f.write_str(name)
    }
}

/// A single-value wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bus {
    value: Word,
}

impl Bus {
    /// Create a bus carrying zero.
    pub const fn new() -> Self {
        Self { value: 0 }
    }

    /// Overwrite the value on the wire.
    #[inline]
    pub fn put(&mut self, value: Word) {
        self.value = value;
    }

    /// Current value on the wire.
    #[inline]
    pub fn get(&self) -> Word {
        self.value
    }
}

/// The three data buses of the machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buses {
    external: Bus,
    internal_a: Bus,
    internal_b: Bus,
}

impl Buses {
    /// All buses carrying zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow a bus.
    pub fn bus(&self, id: BusId) -> &Bus {
        match id {
            BusId::External => &self.external,
            BusId::InternalA => &self.internal_a,
            BusId::InternalB => &self.internal_b,
        }
    }

    /// Mutably borrow a bus.
    pub fn bus_mut(&mut self, id: BusId) -> &mut Bus {
        match id {
            BusId::External => &mut self.external,
            BusId::InternalA => &mut self.internal_a,
            BusId::InternalB => &mut self.internal_b,
        }
    }

    /// Value currently on a bus.
    #[inline]
    pub fn get(&self, id: BusId) -> Word {
        self.bus(id).get()
    }

    /// Put a value on a bus.
    #[inline]
    pub fn put(&mut self, id: BusId, value: Word) {
        self.bus_mut(id).put(value);
    }

    /// Zero every bus.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
