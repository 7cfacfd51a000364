//! Program image format.
//!
//! An image is a plain text file:
//! - One signed decimal word per line
//! - Surrounding whitespace is ignored
//! - Anything else, blank lines included, is an error

use crate::cpu::bus::Word;
use crate::cpu::execute::Cpu;
use crate::cpu::memory::MemoryError;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;

/// Parse an image from any reader.
pub fn parse_image<R: BufRead>(reader: R) -> Result<Vec<Word>, LoadError> {
    let mut words = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(|e| LoadError::Io(e.to_string()))?;
        let trimmed = line.trim();

        let word = trimmed.parse::<Word>().map_err(|_| LoadError::Parse {
            line: line_num + 1,
            text: trimmed.to_string(),
        })?;
        words.push(word);
    }

    Ok(words)
}

/// Load an image file from disk.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Vec<Word>, LoadError> {
    let file = std::fs::File::open(path.as_ref())
        .map_err(|e| LoadError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
    let words = parse_image(BufReader::new(file))?;
    tracing::debug!(path = %path.as_ref().display(), words = words.len(), "image parsed");
    Ok(words)
}

/// Save an image file to disk.
pub fn save_image<P: AsRef<Path>>(path: P, words: &[Word]) -> Result<(), LoadError> {
    let mut file = std::fs::File::create(path.as_ref())
        .map_err(|e| LoadError::Io(e.to_string()))?;

    for word in words {
        writeln!(file, "{}", word).map_err(|e| LoadError::Io(e.to_string()))?;
    }

    Ok(())
}

/// Load an image file into a CPU's memory.
pub fn load_into<P: AsRef<Path>>(cpu: &mut Cpu, path: P) -> Result<usize, LoadError> {
    let words = load_image(path)?;
    cpu.load_program(&words)?;
    Ok(words.len())
}

/// Errors that can occur while loading an image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("line {line}: expected an integer, found {text:?}")]
    Parse { line: usize, text: String },

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_whitespace() {
        let words = parse_image("22\n  0 \n\t5\n-1\n".as_bytes()).unwrap();
        assert_eq!(words, vec![22, 0, 5, -1]);
    }

    #[test]
    fn test_blank_line_is_an_error() {
        let err = parse_image("22\n\n5\n".as_bytes()).unwrap_err();
        assert_eq!(err, LoadError::Parse { line: 2, text: String::new() });
    }

    #[test]
    fn test_garbage_reports_line() {
        let err = parse_image("1\n2\nmov r0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Parse { line: 3, .. }));
        assert!(err.to_string().contains("mov r0"));
    }

    #[test]
    fn test_empty_image() {
        assert_eq!(parse_image("".as_bytes()).unwrap(), Vec::<Word>::new());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prog.txt");
        save_image(&path, &[15, 4, -7, i32::MIN]).unwrap();
        assert_eq!(load_image(&path).unwrap(), vec![15, 4, -7, i32::MIN]);
    }

    #[test]
    fn test_load_into_rejects_oversized_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.txt");
        save_image(&path, &[0; 250]).unwrap();

        let mut cpu = Cpu::new();
        let err = load_into(&mut cpu, &path).unwrap_err();
        assert_eq!(err, LoadError::Memory(MemoryError::ProgramTooLarge { size: 250, available: 200 }));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(load_image("/nonexistent/prog.txt"), Err(LoadError::Io(_))));
    }
}
