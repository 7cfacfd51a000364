//! # Bus Architecture Simulator
//!
//! A register-transfer level simulator of a small von Neumann CPU.
//!
//! Every instruction runs as a sequence of bus transfers between registers,
//! the arithmetic unit and memory, so the cost of the wiring is visible:
//! incrementing the program counter alone takes four transfers.

pub mod cpu;
pub mod config;
pub mod image;

// Re-export commonly used types
pub use cpu::{Cpu, CpuState, CpuError, Step, Opcode, Word, Flag, Memory, MemoryError};
pub use config::{MachineConfig, ConfigError};
pub use image::{load_image, save_image, parse_image, disassemble, LoadError};
