//! Disassembler.
//!
//! Renders instruction words back into assembler syntax. Immediates are
//! printed as sign-strings, so a disassembled line assembles to the same
//! words it came from.

use crate::ternary::Word;
use crate::cpu::decode::{decode, Direction, Instruction, Opcode, Source};
use crate::cpu::Memory;
use std::fmt;

/// Format a decoded instruction as assembly text.
pub fn format_instruction(instr: &Instruction) -> String {
    instr.to_string()
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = match (self.opcode, self.direction) {
            (Opcode::Lod, Direction::Store) => "STA",
            (op, _) => op.mnemonic(),
        };

        match self.opcode {
            Opcode::Nop => f.write_str(mnemonic),
            op if op.is_control_flow() => write!(f, "{} {}", mnemonic, SourceText(&self.source)),
            _ => write!(f, "{} {}, {}", mnemonic, self.x, SourceText(&self.source)),
        }
    }
}

struct SourceText<'a>(&'a Source);

impl fmt::Display for SourceText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Source::Register(reg) => write!(f, "{}", reg),
            Source::Short(value) => write!(f, "{}", Word::wrapping_from_i32(*value as i32)),
            Source::Word(word) => write!(f, "{}", word),
        }
    }
}

/// Disassemble the instruction at `addr`.
///
/// Returns the text and the number of words the instruction occupies.
/// Words that do not decode come back as `??? <word>` with width 1.
pub fn disassemble_at(mem: &Memory, addr: Word) -> (String, usize) {
    let first = mem.read(addr);
    let next = mem.read(Word::wrapping_from_i32(addr.to_i32() + 1));
    disassemble_word(first, Some(next))
}

fn disassemble_word(first: Word, next: Option<Word>) -> (String, usize) {
    match decode(first, next) {
        Ok(instr) => (instr.to_string(), instr.words()),
        Err(_) => (format!("??? {}", first), 1),
    }
}

/// Disassemble a program starting at address 0 into a listing.
pub fn disassemble(words: &[Word]) -> String {
    let mut output = String::new();
    output.push_str("; trivm disassembly\n");
    output.push_str(&format!("; {} words\n\n", words.len()));

    let mut addr = 0;
    while addr < words.len() {
        let (text, width) = disassemble_word(words[addr], words.get(addr + 1).copied());
        let raw: Vec<String> = words[addr..addr + width].iter().map(Word::to_string).collect();
        output.push_str(&format!("{:05}: {:<24} ; {}\n", addr, text, raw.join(" ")));
        addr += width;
    }

    output
}
