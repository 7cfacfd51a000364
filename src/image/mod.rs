//! Program images.
//!
//! Provides:
//! - Image file loading and saving (one decimal word per line)
//! - Disassembly listings

pub mod loader;
pub mod disasm;

pub use loader::{parse_image, load_image, save_image, load_into, LoadError};
pub use disasm::{disassemble, disassemble_instruction};
