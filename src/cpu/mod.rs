//! CPU emulation at the register-transfer level.
//!
//! The machine is built from:
//! - three data buses (external, internal A, internal B) and a register-select bus
//! - 7 registers: RPG0-RPG3 (general purpose), PC, IR, FLAGS
//! - a two-slot arithmetic unit (ULA) on the internal buses
//! - word-addressed memory on the external bus
//! - a 27-instruction control unit built from bus transfers

pub mod bus;
pub mod registers;
pub mod ula;
pub mod memory;
pub mod datapath;
pub mod decode;
pub mod trace;
pub mod execute;

pub use bus::{Bus, BusId, Buses, Word};
pub use registers::{Flag, Register, RegisterFile, RegisterError};
pub use ula::{Slot, Ula};
pub use memory::{Memory, MemoryError, StorePhase};
pub use datapath::{BusSnapshot, Datapath, Endpoint};
pub use decode::Opcode;
pub use trace::{ConsoleTracer, JsonTracer, NoTrace, RecordingTracer, TraceEvent, TraceObserver, TracePhase};
pub use execute::{Cpu, CpuError, CpuState, MicroFault, Step};
