//! Machine configuration.
//!
//! Loaded from JSON; every field is optional and falls back to the
//! standard layout (256 cells, reserved area from cell 200).

use crate::cpu::memory::MEMORY_SIZE;
use serde::{Serialize, Deserialize};
use std::path::Path;
use thiserror::Error;

/// First cell of the reserved area on the default machine.
pub const RESERVED_START: usize = 200;

/// Cells the control unit needs inside the reserved area.
pub const RESERVED_CELLS: usize = 1;

/// Machine layout and run limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Number of memory cells.
    pub memory_size: usize,
    /// First cell of the reserved scratch area. Programs must end before it.
    pub reserved_start: usize,
    /// Instruction budget for a run, if any.
    pub max_cycles: Option<u64>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            memory_size: MEMORY_SIZE,
            reserved_start: RESERVED_START,
            max_cycles: None,
        }
    }
}

impl MachineConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_json(&text)
    }

    /// Check that the reserved area fits and leaves room for a program.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reserved_start == 0 {
            return Err(ConfigError::Invalid("reserved area leaves no room for a program".into()));
        }
        let fits = self
            .reserved_start
            .checked_add(RESERVED_CELLS)
            .is_some_and(|end| end <= self.memory_size);
        if !fits {
            return Err(ConfigError::Invalid(format!(
                "reserved area at {} needs {} cells but memory has {}",
                self.reserved_start, RESERVED_CELLS, self.memory_size
            )));
        }
        if i32::try_from(self.memory_size).is_err() {
            return Err(ConfigError::Invalid(format!(
                "memory size {} is not addressable by a machine word",
                self.memory_size
            )));
        }
        Ok(())
    }

    /// Address of the cell where micro-routines park a register id.
    pub fn spill_cell(&self) -> usize {
        self.reserved_start
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("config parse error: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let config = MachineConfig::default();
        assert_eq!(config.memory_size, 256);
        assert_eq!(config.reserved_start, 200);
        assert_eq!(config.spill_cell(), 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = MachineConfig::from_json(r#"{ "max_cycles": 500 }"#).unwrap();
        assert_eq!(config.max_cycles, Some(500));
        assert_eq!(config.memory_size, 256);
    }

    #[test]
    fn test_reserved_area_must_fit() {
        let err = MachineConfig::from_json(r#"{ "memory_size": 64, "reserved_start": 64 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_huge_reserved_start_is_rejected() {
        let err = MachineConfig::from_json(r#"{ "reserved_start": 18446744073709551615 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_bad_json() {
        let err = MachineConfig::from_json("{ memory_size: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = MachineConfig::load("/nonexistent/busarch.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
