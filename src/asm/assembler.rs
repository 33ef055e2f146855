//! Two-pass assembler.
//!
//! Syntax:
//! ```text
//! ; Comment
//! .loop               ; Declare a label
//!     MOV r0, oooooooo+   ; Short immediate (|value| <= 4): one word
//!     ADD r0, ooooo+ooo   ; Word immediate: two words
//!     CMP r0, r1
//!     BLT .loop           ; Labels always take the two-word form
//!     STA r0, .result
//! ```
//!
//! Both passes walk the same filtered line list. Pass 1 parses every
//! instruction to learn its size and binds labels to the address cursor;
//! pass 2 parses every line again, resolves labels and writes the encoded
//! words at the address pass 1 chose.

use crate::ternary::Word;
use crate::cpu::decode::{self, Direction, EncodeError, Instruction, Opcode, Source, SHORT_IMMEDIATE_MAX};
use crate::cpu::registers::Register;
use crate::cpu::Memory;
use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Assemble source text into a memory image plus debug metadata.
pub fn assemble(source: &str) -> Result<Assembly, AssemblerError> {
    Assembler::new(source).assemble()
}

/// The output of a successful assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    /// Program image, starting at address 0.
    pub image: Memory,
    /// Diagnostics; not needed to run the program.
    pub debug: DebugInfo,
}

impl Assembly {
    /// The assembled words, from address 0 to the end of the program.
    pub fn words(&self) -> Vec<Word> {
        self.image
            .region(0, self.debug.len)
            .map(|words| words.to_vec())
            .unwrap_or_default()
    }
}

/// Debug metadata collected during assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugInfo {
    /// Address of every instruction and what was encoded there.
    pub instructions: BTreeMap<i32, Instruction>,
    /// Source line (1-based) of every instruction address.
    pub source_lines: BTreeMap<i32, usize>,
    /// Label name (without the leading `.`) to address.
    pub labels: BTreeMap<String, Word>,
    /// Non-fatal diagnostics, such as label redeclarations.
    pub warnings: Vec<String>,
    /// Number of words emitted.
    pub len: usize,
}

impl DebugInfo {
    /// Labels bound to `addr`, for listings.
    pub fn labels_at(&self, addr: i32) -> impl Iterator<Item = &str> + '_ {
        self.labels
            .iter()
            .filter(move |(_, bound)| bound.to_i32() == addr)
            .map(|(name, _)| name.as_str())
    }
}

/// A parsed operand, before label resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Register(Register),
    Immediate(Word),
    Label(String),
}

impl Operand {
    fn parse(token: &str, position: usize, line: usize) -> Result<Self, AssemblerError> {
        if let Some(name) = token.strip_prefix('.') {
            if !is_label_name(name) {
                return Err(argument(line, format!("operand {}: invalid label '{}'", position, token)));
            }
            return Ok(Operand::Label(name.to_string()));
        }

        if let Ok(reg) = token.parse::<Register>() {
            return Ok(Operand::Register(reg));
        }

        Word::parse(token).map(Operand::Immediate).map_err(|_| {
            argument(
                line,
                format!(
                    "operand {}: '{}' is not a register, a 9-trit immediate or a label",
                    position, token
                ),
            )
        })
    }

    fn kind(&self) -> &'static str {
        match self {
            Operand::Register(_) => "register",
            Operand::Immediate(_) => "immediate",
            Operand::Label(_) => "label",
        }
    }

    /// Words this operand adds to its instruction: labels and wide
    /// immediates need the trailing value word.
    fn words(&self) -> usize {
        match self {
            Operand::Register(_) => 1,
            Operand::Immediate(value) if value.to_i32().abs() <= SHORT_IMMEDIATE_MAX => 1,
            Operand::Immediate(_) | Operand::Label(_) => 2,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(reg) => write!(f, "{}", reg),
            Operand::Immediate(value) => write!(f, "{}", value),
            Operand::Label(name) => write!(f, ".{}", name),
        }
    }
}

/// Which operand kinds a mnemonic accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// `NOP`
    Bare,
    /// `OP reg, reg|imm`
    RegisterValue,
    /// `LDA reg, reg|imm|label`
    RegisterAddress,
    /// `JMP reg|imm|label`
    Target,
}

/// Look a mnemonic up, case-insensitively.
fn lookup(mnemonic: &str) -> Option<(Opcode, Direction, Shape)> {
    let upper = mnemonic.to_ascii_uppercase();
    match upper.as_str() {
        "LDA" | "LOD" => return Some((Opcode::Lod, Direction::Load, Shape::RegisterAddress)),
        "STA" => return Some((Opcode::Lod, Direction::Store, Shape::RegisterAddress)),
        _ => {}
    }

    let opcode = Opcode::ALL.iter().copied().find(|op| op.mnemonic() == upper)?;
    let shape = match opcode {
        Opcode::Nop => Shape::Bare,
        op if op.is_control_flow() => Shape::Target,
        _ => Shape::RegisterValue,
    };
    Some((opcode, Direction::Load, shape))
}

/// One parsed instruction line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub opcode: Opcode,
    pub direction: Direction,
    pub x: Register,
    pub operand: Operand,
}

impl Statement {
    /// Parse `MNEMONIC operand[, operand...]`.
    pub fn parse(text: &str, line: usize) -> Result<Self, AssemblerError> {
        let (mnemonic, rest) = match text.split_once(char::is_whitespace) {
            Some((mnemonic, rest)) => (mnemonic, rest.trim()),
            None => (text, ""),
        };

        let (opcode, direction, shape) =
            lookup(mnemonic).ok_or_else(|| AssemblerError::UnknownMnemonic {
                line,
                mnemonic: mnemonic.to_string(),
            })?;

        let tokens: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split(',').map(str::trim).collect()
        };

        let expected = match shape {
            Shape::Bare => 0,
            Shape::Target => 1,
            Shape::RegisterValue | Shape::RegisterAddress => 2,
        };
        if tokens.len() != expected {
            return Err(argument(
                line,
                format!(
                    "{} takes {} operand{}, got {}",
                    mnemonic.to_ascii_uppercase(),
                    expected,
                    if expected == 1 { "" } else { "s" },
                    tokens.len()
                ),
            ));
        }

        let operands = tokens
            .iter()
            .enumerate()
            .map(|(i, token)| Operand::parse(token, i + 1, line))
            .collect::<Result<Vec<_>, _>>()?;

        let (x, operand) = match (shape, operands.as_slice()) {
            (Shape::Bare, []) => (Register::R0, Operand::Register(Register::R0)),
            (Shape::Target, [target]) => (Register::R0, target.clone()),
            (Shape::RegisterValue | Shape::RegisterAddress, [Operand::Register(x), source]) => {
                if shape == Shape::RegisterValue && matches!(source, Operand::Label(_)) {
                    return Err(argument(
                        line,
                        format!(
                            "operand 2: {} takes a register or immediate, found label '{}'",
                            opcode.mnemonic(),
                            source
                        ),
                    ));
                }
                (*x, source.clone())
            }
            (_, [first, ..]) => {
                return Err(argument(
                    line,
                    format!("operand 1: expected a register, found {} '{}'", first.kind(), first),
                ))
            }
            // the operand count was checked above
            (_, []) => return Err(argument(line, "missing operand".to_string())),
        };

        Ok(Self {
            opcode,
            direction,
            x,
            operand,
        })
    }

    /// Number of words this statement assembles to.
    pub fn words(&self) -> usize {
        self.operand.words()
    }

    /// Resolve the operand against the label table.
    fn resolve(&self, labels: &BTreeMap<String, Word>, line: usize) -> Result<Instruction, AssemblerError> {
        let source = match &self.operand {
            Operand::Register(reg) => Source::Register(*reg),
            Operand::Immediate(value) => Source::immediate(*value),
            Operand::Label(name) => {
                let addr = labels.get(name).ok_or_else(|| AssemblerError::UndeclaredLabel {
                    line,
                    label: name.clone(),
                })?;
                Source::Word(*addr)
            }
        };

        Ok(Instruction {
            opcode: self.opcode,
            direction: self.direction,
            x: self.x,
            source,
        })
    }
}

/// A non-blank line with its comment removed.
#[derive(Debug, Clone, Copy)]
struct SourceLine<'a> {
    /// 1-based line number in the original text.
    number: usize,
    text: &'a str,
}

impl<'a> SourceLine<'a> {
    /// The label name if this line declares one.
    fn label(&self) -> Option<&'a str> {
        self.text.strip_prefix('.').map(str::trim)
    }
}

fn filter_lines(source: &str) -> Vec<SourceLine<'_>> {
    source
        .lines()
        .enumerate()
        .filter_map(|(i, raw)| {
            let text = raw.split(';').next().unwrap_or("").trim();
            (!text.is_empty()).then_some(SourceLine { number: i + 1, text })
        })
        .collect()
}

fn is_label_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn argument(line: usize, message: String) -> AssemblerError {
    AssemblerError::Argument { line, message }
}

/// The assembler state for one call.
struct Assembler<'a> {
    lines: Vec<SourceLine<'a>>,
    /// Label table, complete after pass 1.
    labels: BTreeMap<String, Word>,
    /// Pass-1 address of each instruction line, in order.
    addresses: Vec<i32>,
    warnings: Vec<String>,
    /// Words emitted by pass 1.
    len: usize,
}

impl<'a> Assembler<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: filter_lines(source),
            labels: BTreeMap::new(),
            addresses: Vec::new(),
            warnings: Vec::new(),
            len: 0,
        }
    }

    fn assemble(mut self) -> Result<Assembly, AssemblerError> {
        self.first_pass()?;
        let (image, instructions, source_lines) = self.second_pass()?;

        tracing::debug!(
            words = self.len,
            instructions = instructions.len(),
            labels = self.labels.len(),
            "assembled program"
        );

        Ok(Assembly {
            image,
            debug: DebugInfo {
                instructions,
                source_lines,
                labels: self.labels,
                warnings: self.warnings,
                len: self.len,
            },
        })
    }

    /// Size every instruction and bind labels.
    fn first_pass(&mut self) -> Result<(), AssemblerError> {
        let mut cursor: i32 = 0;

        for line in &self.lines {
            if let Some(name) = line.label() {
                if !is_label_name(name) {
                    return Err(argument(line.number, format!("invalid label name '.{}'", name)));
                }
                let addr = Word::from_i32(cursor)
                    .map_err(|_| AssemblerError::ProgramTooLarge { line: line.number })?;
                if let Some(previous) = self.labels.insert(name.to_string(), addr) {
                    tracing::warn!(
                        line = line.number,
                        label = name,
                        "label redeclared; last declaration wins"
                    );
                    self.warnings.push(format!(
                        "line {}: label .{} redeclared (was {}, now {})",
                        line.number,
                        name,
                        previous.to_i32(),
                        cursor
                    ));
                }
                continue;
            }

            let statement = Statement::parse(line.text, line.number)?;
            let words = statement.words() as i32;
            if cursor + words - 1 > Word::MAX {
                return Err(AssemblerError::ProgramTooLarge { line: line.number });
            }

            self.addresses.push(cursor);
            cursor += words;
        }

        self.len = cursor as usize;
        Ok(())
    }

    /// Re-parse, resolve, encode and store.
    #[allow(clippy::type_complexity)]
    fn second_pass(
        &self,
    ) -> Result<(Memory, BTreeMap<i32, Instruction>, BTreeMap<i32, usize>), AssemblerError> {
        let mut image = Memory::new();
        let mut instructions = BTreeMap::new();
        let mut source_lines = BTreeMap::new();
        let mut addresses = self.addresses.iter().copied();
        let mut cursor = 0;

        for line in self.lines.iter().filter(|line| line.label().is_none()) {
            let statement = Statement::parse(line.text, line.number)?;
            let instr = statement.resolve(&self.labels, line.number)?;

            let addr = addresses.next().unwrap_or(cursor);
            debug_assert_eq!(addr, cursor, "passes disagree at line {}", line.number);
            debug_assert_eq!(instr.words(), statement.words());

            let (first, second) = decode::encode(&instr).map_err(|source| AssemblerError::Encode {
                line: line.number,
                source,
            })?;

            let store = |image: &mut Memory, value: Word, at: i32| {
                image
                    .store(value, at)
                    .map_err(|_| AssemblerError::ProgramTooLarge { line: line.number })
            };
            store(&mut image, first, addr)?;
            if let Some(value) = second {
                store(&mut image, value, addr + 1)?;
            }

            instructions.insert(addr, instr);
            source_lines.insert(addr, line.number);
            cursor = addr + instr.words() as i32;
        }

        Ok((image, instructions, source_lines))
    }
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("line {line}: {message}")]
    Argument { line: usize, message: String },

    #[error("line {line}: unknown mnemonic '{mnemonic}'")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("line {line}: undeclared label '.{label}'")]
    UndeclaredLabel { line: usize, label: String },

    #[error("line {line}: program does not fit in memory")]
    ProgramTooLarge { line: usize },

    #[error("line {line}: {source}")]
    Encode { line: usize, source: EncodeError },
}

impl AssemblerError {
    /// The source line the error refers to.
    pub fn line(&self) -> usize {
        match self {
            AssemblerError::Argument { line, .. }
            | AssemblerError::UnknownMnemonic { line, .. }
            | AssemblerError::UndeclaredLabel { line, .. }
            | AssemblerError::ProgramTooLarge { line }
            | AssemblerError::Encode { line, .. } => *line,
        }
    }
}
