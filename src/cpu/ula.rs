//! Arithmetic unit (ULA).
//!
//! Two staging slots. `Left` (slot 0) is the fixed left operand; every
//! result lands in `Right` (slot 1). The unit has a primary port on internal
//! bus A and an alternate port on internal bus B; either slot can be moved
//! through either port.

use crate::cpu::bus::{BusId, Buses, Word};
use serde::{Serialize, Deserialize};

/// ULA staging slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slot {
    /// Slot 0, left operand.
    Left,
    /// Slot 1, right operand and result.
    Right,
}

impl Slot {
    const fn index(self) -> usize {
        match self {
            Slot::Left => 0,
            Slot::Right => 1,
        }
    }
}

/// The arithmetic unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ula {
    slots: [Word; 2],
    primary: BusId,
    alternate: BusId,
}

impl Ula {
    /// Create a ULA with its primary port on `primary` and alternate port on `alternate`.
    pub fn new(primary: BusId, alternate: BusId) -> Self {
        Self {
            slots: [0; 2],
            primary,
            alternate,
        }
    }

    /// Current value of a slot.
    pub fn slot(&self, slot: Slot) -> Word {
        self.slots[slot.index()]
    }

    /// Load a slot from the primary bus.
    pub fn latch(&mut self, slot: Slot, buses: &Buses) {
        self.slots[slot.index()] = buses.get(self.primary);
    }

    /// Put a slot on the primary bus.
    pub fn drive(&self, slot: Slot, buses: &mut Buses) {
        buses.put(self.primary, self.slots[slot.index()]);
    }

    /// Load a slot from the alternate bus.
    pub fn latch_alternate(&mut self, slot: Slot, buses: &Buses) {
        self.slots[slot.index()] = buses.get(self.alternate);
    }

    /// Put a slot on the alternate bus.
    pub fn drive_alternate(&self, slot: Slot, buses: &mut Buses) {
        buses.put(self.alternate, self.slots[slot.index()]);
    }

    /// Bus wired to the primary port.
    pub fn primary_bus(&self) -> BusId {
        self.primary
    }

    /// Bus wired to the alternate port.
    pub fn alternate_bus(&self) -> BusId {
        self.alternate
    }

    /// Right := Left + Right
    pub fn add(&mut self) {
        self.slots[1] = self.slots[0].wrapping_add(self.slots[1]);
    }

    /// Right := Left - Right
    pub fn sub(&mut self) {
        self.slots[1] = self.slots[0].wrapping_sub(self.slots[1]);
    }

    /// Right := Right + 1
    pub fn inc(&mut self) {
        self.slots[1] = self.slots[1].wrapping_add(1);
    }

    /// Zero both slots.
    pub fn reset(&mut self) {
        self.slots = [0; 2];
    }
}

impl Default for Ula {
    fn default() -> Self {
        Self::new(BusId::InternalA, BusId::InternalB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staged(left: Word, right: Word) -> Ula {
        let mut ula = Ula::default();
        let mut buses = Buses::new();
        buses.put(BusId::InternalA, left);
        ula.latch(Slot::Left, &buses);
        buses.put(BusId::InternalB, right);
        ula.latch_alternate(Slot::Right, &buses);
        ula
    }

    #[test]
    fn test_add_lands_in_right() {
        let mut ula = staged(10, 32);
        ula.add();
        assert_eq!(ula.slot(Slot::Right), 42);
        assert_eq!(ula.slot(Slot::Left), 10);
    }

    #[test]
    fn test_sub_is_left_minus_right() {
        let mut ula = staged(10, 32);
        ula.sub();
        assert_eq!(ula.slot(Slot::Right), -22);
    }

    #[test]
    fn test_inc_touches_only_right() {
        let mut ula = staged(5, -1);
        ula.inc();
        assert_eq!(ula.slot(Slot::Right), 0);
        assert_eq!(ula.slot(Slot::Left), 5);
    }

    #[test]
    fn test_arithmetic_wraps() {
        let mut ula = staged(Word::MAX, 1);
        ula.add();
        assert_eq!(ula.slot(Slot::Right), Word::MIN);

        let mut ula = staged(Word::MIN, 1);
        ula.sub();
        assert_eq!(ula.slot(Slot::Right), Word::MAX);
    }

    #[test]
    fn test_ports_use_their_own_bus() {
        let mut ula = staged(3, 4);
        let mut buses = Buses::new();

        ula.drive(Slot::Right, &mut buses);
        assert_eq!(buses.get(BusId::InternalA), 4);
        assert_eq!(buses.get(BusId::InternalB), 0);

        ula.drive_alternate(Slot::Left, &mut buses);
        assert_eq!(buses.get(BusId::InternalB), 3);

        ula.reset();
        assert_eq!(ula.slot(Slot::Left), 0);
        assert_eq!(ula.slot(Slot::Right), 0);
    }
}
