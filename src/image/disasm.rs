//! Disassembler for program images.
//!
//! Walks an image the way the CPU would from address 0: each opcode is
//! followed by its operands. Everything after the first halt word is data.

use crate::cpu::bus::Word;
use crate::cpu::decode::Opcode;

/// Disassemble the instruction at the start of `cells`.
///
/// Returns the text and the number of cells it covers. Operands missing
/// off the end of the slice print as `?`.
pub fn disassemble_instruction(cells: &[Word]) -> (String, usize) {
    let Some(&word) = cells.first() else {
        return (String::new(), 0);
    };

    match Opcode::decode(word) {
        Some(op) => {
            let mut text = op.mnemonic().to_string();
            for i in 1..=op.operand_count() {
                match cells.get(i) {
                    Some(v) => text.push_str(&format!(" {}", v)),
                    None => text.push_str(" ?"),
                }
            }
            (text, (1 + op.operand_count()).min(cells.len()))
        }
        None => ("END".to_string(), 1),
    }
}

/// Disassemble a whole image.
pub fn disassemble(cells: &[Word]) -> String {
    let mut output = String::new();
    output.push_str("; Program Listing\n");
    output.push_str("; ---------------\n\n");

    let mut addr = 0;
    while addr < cells.len() {
        let (line, width) = disassemble_instruction(&cells[addr..]);
        let raw: Vec<String> = cells[addr..addr + width].iter().map(|v| v.to_string()).collect();
        let target = jump_target(&cells[addr..addr + width])
            .map(|t| format!("  -> {:03}", t))
            .unwrap_or_default();
        output.push_str(&format!("{:03}: {:<24} ; {}{}\n", addr, line, raw.join(" "), target));
        addr += width;

        if Opcode::decode(cells[addr - width]).is_none() {
            break;
        }
    }

    for (offset, value) in cells[addr..].iter().enumerate() {
        output.push_str(&format!("{:03}: .word {}\n", addr + offset, value));
    }

    output
}

/// Target of a complete jump instruction.
fn jump_target(instruction: &[Word]) -> Option<Word> {
    let op = Opcode::decode(*instruction.first()?)?;
    if op.is_jump() && instruction.len() == 1 + op.operand_count() {
        instruction.last().copied()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_ldi() {
        let (text, width) = disassemble_instruction(&[22, 0, 5]);
        assert_eq!(text, "ldi 0 5");
        assert_eq!(width, 3);
    }

    #[test]
    fn test_disassemble_compare_jump() {
        let (text, width) = disassemble_instruction(&[20, 1, 2, 40, 99]);
        assert_eq!(text, "jgt 1 2 40");
        assert_eq!(width, 4);
    }

    #[test]
    fn test_truncated_operands() {
        let (text, width) = disassemble_instruction(&[24, 1]);
        assert_eq!(text, "store 1 ?");
        assert_eq!(width, 2);
    }

    #[test]
    fn test_listing_marks_jump_targets() {
        let listing = disassemble(&[17, 5, 22, 0, 1, -1]);
        assert!(listing.contains("; 17 5  -> 005"));
        assert!(!listing.contains("; 22 0 1  ->"));
    }

    #[test]
    fn test_listing_stops_at_halt() {
        let listing = disassemble(&[22, 0, 5, -1, 7, 8]);
        assert!(listing.contains("000: ldi 0 5"));
        assert!(listing.contains("003: END"));
        assert!(listing.contains("004: .word 7"));
        assert!(listing.contains("005: .word 8"));
        assert!(!listing.contains("imulRegMem"));
    }
}
