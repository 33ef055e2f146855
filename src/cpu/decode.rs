//! Instruction encoding and decoding.
//!
//! An instruction occupies one word, or two under the word-immediate
//! addressing mode. The first word packs five sub-fields, most significant
//! trit first:
//!
//! ```text
//!  trit:  0 1 2 | 3    | 4         | 5 6 | 7 8
//!         opcode| mode | direction |  x  |  y
//! ```
//!
//! - opcode: -13..=9, with -12 reserved
//! - mode: `o` register-register, `+` short immediate, `-` word immediate
//! - direction: `+` marks a store; only LOD may set it
//! - x: destination register selector
//! - y: source register selector, or a short immediate in -4..=4
//!
//! A word-immediate instruction is followed by the full-range value word.

use crate::ternary::{AluOp, CodecError, Trit, Word};
use crate::cpu::registers::Register;
use serde::{Serialize, Deserialize};
use thiserror::Error;

const OPCODE_FIELD: (usize, usize) = (0, 3);
const MODE_FIELD: (usize, usize) = (3, 1);
const DIRECTION_FIELD: (usize, usize) = (4, 1);
const X_FIELD: (usize, usize) = (5, 2);
const Y_FIELD: (usize, usize) = (7, 2);

/// Largest short-immediate magnitude that fits in the y field.
pub const SHORT_IMMEDIATE_MAX: i32 = 4;

/// The operation selected by an instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i8)]
pub enum Opcode {
    // ==================== Arithmetic/logic ====================
    Add = -13,
    Addc = -11,
    Mul = -10,
    Div = -9,
    Mod = -8,
    Neg = -7,
    Min = -6,
    Max = -5,
    Con = -4,
    Any = -3,
    Rsh = -2,
    Ush = -1,

    // ==================== Data movement / control ====================
    Nop = 0,
    Mov = 1,
    Cmp = 2,
    Jmp = 3,
    Beq = 4,
    Bgt = 5,
    Blt = 6,
    Jal = 7,
    Lod = 8,
    Xor = 9,
}

impl Opcode {
    /// Every defined opcode, in numeric order.
    pub const ALL: [Opcode; 22] = [
        Opcode::Add,
        Opcode::Addc,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Mod,
        Opcode::Neg,
        Opcode::Min,
        Opcode::Max,
        Opcode::Con,
        Opcode::Any,
        Opcode::Rsh,
        Opcode::Ush,
        Opcode::Nop,
        Opcode::Mov,
        Opcode::Cmp,
        Opcode::Jmp,
        Opcode::Beq,
        Opcode::Bgt,
        Opcode::Blt,
        Opcode::Jal,
        Opcode::Lod,
        Opcode::Xor,
    ];

    /// The numeric opcode.
    #[inline]
    pub const fn value(self) -> i8 {
        self as i8
    }

    /// Look an opcode up by value. -12 and anything outside -13..=9 is
    /// undefined.
    pub fn from_value(value: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.value() as i32 == value)
    }

    /// The canonical mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Addc => "ADDC",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Neg => "NEG",
            Opcode::Min => "MIN",
            Opcode::Max => "MAX",
            Opcode::Con => "CON",
            Opcode::Any => "ANY",
            Opcode::Rsh => "RSH",
            Opcode::Ush => "USH",
            Opcode::Nop => "NOP",
            Opcode::Mov => "MOV",
            Opcode::Cmp => "CMP",
            Opcode::Jmp => "JMP",
            Opcode::Beq => "BEQ",
            Opcode::Bgt => "BGT",
            Opcode::Blt => "BLT",
            Opcode::Jal => "JAL",
            Opcode::Lod => "LDA",
            Opcode::Xor => "XOR",
        }
    }

    /// The ALU operation behind an arithmetic/logic opcode.
    pub const fn alu_op(self) -> Option<AluOp> {
        match self {
            Opcode::Add => Some(AluOp::Add),
            Opcode::Addc => Some(AluOp::AddWithCarry),
            Opcode::Mul => Some(AluOp::Multiply),
            Opcode::Div => Some(AluOp::Divide),
            Opcode::Mod => Some(AluOp::Modulo),
            Opcode::Neg => Some(AluOp::Negate),
            Opcode::Min => Some(AluOp::Min),
            Opcode::Max => Some(AluOp::Max),
            Opcode::Con => Some(AluOp::Consensus),
            Opcode::Any => Some(AluOp::Any),
            Opcode::Rsh => Some(AluOp::RotateShift),
            Opcode::Ush => Some(AluOp::UnsignedShift),
            Opcode::Xor => Some(AluOp::Xor),
            _ => None,
        }
    }

    /// Control-flow opcodes take a single target operand and no x register.
    pub const fn is_control_flow(self) -> bool {
        matches!(
            self,
            Opcode::Jmp | Opcode::Beq | Opcode::Bgt | Opcode::Blt | Opcode::Jal
        )
    }
}

/// Addressing mode: how the second operand is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddrMode {
    /// y names a register (mode = O)
    RegisterRegister,
    /// y is an immediate in -4..=4 (mode = P)
    ShortImmediate,
    /// The operand is the following word (mode = N)
    WordImmediate,
}

impl AddrMode {
    /// Create from a trit.
    pub fn from_trit(t: Trit) -> Self {
        match t {
            Trit::O => AddrMode::RegisterRegister,
            Trit::P => AddrMode::ShortImmediate,
            Trit::N => AddrMode::WordImmediate,
        }
    }

    /// Convert to trit.
    pub fn to_trit(self) -> Trit {
        match self {
            AddrMode::RegisterRegister => Trit::O,
            AddrMode::ShortImmediate => Trit::P,
            AddrMode::WordImmediate => Trit::N,
        }
    }

    /// Number of words an instruction in this mode occupies.
    pub const fn words(self) -> usize {
        match self {
            AddrMode::WordImmediate => 2,
            _ => 1,
        }
    }
}

/// Transfer direction of a LOD instruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// x := memory[operand] (also the value for every non-LOD opcode)
    #[default]
    Load,
    /// memory[operand] := x
    Store,
}

/// The second operand of a decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    Register(Register),
    Short(i8),
    Word(Word),
}

impl Source {
    /// The addressing mode this operand is encoded with.
    pub fn mode(&self) -> AddrMode {
        match self {
            Source::Register(_) => AddrMode::RegisterRegister,
            Source::Short(_) => AddrMode::ShortImmediate,
            Source::Word(_) => AddrMode::WordImmediate,
        }
    }

    /// The cheapest source for an immediate value.
    pub fn immediate(value: Word) -> Self {
        let n = value.to_i32();
        if n.abs() <= SHORT_IMMEDIATE_MAX {
            Source::Short(n as i8)
        } else {
            Source::Word(value)
        }
    }
}

/// A decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub direction: Direction,
    /// Destination (or, for a store, source) register.
    pub x: Register,
    pub source: Source,
}

impl Instruction {
    /// An instruction with a destination register and a source operand.
    pub fn new(opcode: Opcode, x: Register, source: Source) -> Self {
        Self {
            opcode,
            direction: Direction::Load,
            x,
            source,
        }
    }

    /// A control-flow instruction; only the target operand is meaningful.
    pub fn branch(opcode: Opcode, target: Source) -> Self {
        Self::new(opcode, Register::R0, target)
    }

    /// `STA x, address`
    pub fn store(x: Register, address: Source) -> Self {
        Self {
            direction: Direction::Store,
            ..Self::new(Opcode::Lod, x, address)
        }
    }

    /// The zero word.
    pub fn nop() -> Self {
        Self::new(Opcode::Nop, Register::R0, Source::Register(Register::R0))
    }

    /// Addressing mode of the second operand.
    pub fn mode(&self) -> AddrMode {
        self.source.mode()
    }

    /// Number of words this instruction occupies.
    pub fn words(&self) -> usize {
        self.mode().words()
    }
}

/// Encode an instruction as its first word plus, under the word-immediate
/// mode, the value word.
pub fn encode(instr: &Instruction) -> Result<(Word, Option<Word>), EncodeError> {
    let (y, extra) = match instr.source {
        Source::Register(reg) => (reg.selector() as i32, None),
        Source::Short(value) => {
            let value = value as i32;
            if value.abs() > SHORT_IMMEDIATE_MAX {
                return Err(EncodeError::ShortImmediateOutOfRange(value));
            }
            (value, None)
        }
        Source::Word(word) => (0, Some(word)),
    };

    let direction = match instr.direction {
        Direction::Load => 0,
        Direction::Store if instr.opcode == Opcode::Lod => 1,
        Direction::Store => return Err(EncodeError::StoreWithoutLod(instr.opcode)),
    };

    let word = Word::zero()
        .with_field(OPCODE_FIELD.0, OPCODE_FIELD.1, instr.opcode.value() as i32)?
        .with_field(MODE_FIELD.0, MODE_FIELD.1, instr.mode().to_trit().to_i8() as i32)?
        .with_field(DIRECTION_FIELD.0, DIRECTION_FIELD.1, direction)?
        .with_field(X_FIELD.0, X_FIELD.1, instr.x.selector() as i32)?
        .with_field(Y_FIELD.0, Y_FIELD.1, y)?;

    Ok((word, extra))
}

/// Decode an instruction word. `next` is the word that follows it in
/// memory and is only consumed under the word-immediate mode.
pub fn decode(word: Word, next: Option<Word>) -> Result<Instruction, DecodeError> {
    let op_val = word.field(OPCODE_FIELD.0, OPCODE_FIELD.1);
    let opcode = Opcode::from_value(op_val).ok_or(DecodeError::InvalidOpcode(op_val))?;

    let direction = match word.field(DIRECTION_FIELD.0, DIRECTION_FIELD.1) {
        0 => Direction::Load,
        1 if opcode == Opcode::Lod => Direction::Store,
        trit => {
            return Err(DecodeError::InvalidDirection {
                opcode: opcode.mnemonic(),
                trit,
            })
        }
    };

    // Both selector fields are 2 trits wide, so every value is in -4..=4.
    let x_val = word.field(X_FIELD.0, X_FIELD.1);
    let y_val = word.field(Y_FIELD.0, Y_FIELD.1);
    let x = Register::from_selector(x_val).ok_or(DecodeError::InvalidSelector(x_val))?;

    let mode_trit = word.digits()[MODE_FIELD.0];
    let source = match AddrMode::from_trit(mode_trit) {
        AddrMode::RegisterRegister => Source::Register(
            Register::from_selector(y_val).ok_or(DecodeError::InvalidSelector(y_val))?,
        ),
        AddrMode::ShortImmediate => Source::Short(y_val as i8),
        AddrMode::WordImmediate => Source::Word(next.ok_or(DecodeError::MissingWord)?),
    };

    Ok(Instruction {
        opcode,
        direction,
        x,
        source,
    })
}

/// Errors that can occur during instruction encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("short immediate {0} out of range (-4 to +4)")]
    ShortImmediateOutOfRange(i32),

    #[error("{} cannot store; only LOD has a store direction", .0.mnemonic())]
    StoreWithoutLod(Opcode),

    #[error("field does not fit: {0}")]
    Field(#[from] CodecError),
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode: {0}")]
    InvalidOpcode(i32),

    #[error("invalid direction trit {trit} for {opcode}")]
    InvalidDirection { opcode: &'static str, trit: i32 },

    #[error("invalid register selector: {0}")]
    InvalidSelector(i32),

    #[error("word-immediate instruction is missing its value word")]
    MissingWord,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(instr: Instruction) -> Instruction {
        let (first, second) = encode(&instr).unwrap();
        assert_eq!(second.is_some(), instr.words() == 2);
        decode(first, second).unwrap()
    }

    #[test]
    fn test_zero_word_is_nop() {
        let instr = decode(Word::zero(), None).unwrap();
        assert_eq!(instr, Instruction::nop());
        assert_eq!(encode(&Instruction::nop()).unwrap(), (Word::zero(), None));
    }

    #[test]
    fn test_addr_mode_roundtrip() {
        for mode in [AddrMode::RegisterRegister, AddrMode::ShortImmediate, AddrMode::WordImmediate] {
            assert_eq!(AddrMode::from_trit(mode.to_trit()), mode);
        }
    }

    #[test]
    fn test_opcode_table() {
        assert_eq!(Opcode::ALL.len(), 22);
        for value in -13..=9 {
            match Opcode::from_value(value) {
                Some(op) => assert_eq!(op.value() as i32, value),
                None => assert_eq!(value, -12, "only -12 is reserved"),
            }
        }
        assert_eq!(Opcode::from_value(10), None);
        assert_eq!(Opcode::from_value(-14), None);
        assert_eq!(Opcode::Add.value(), -13);
        assert_eq!(Opcode::Xor.value(), 9);
        assert_eq!(Opcode::Lod.value(), 8);
    }

    #[test]
    fn test_encode_decode_exhaustive() {
        let long = Word::from_i32(-9000).unwrap();
        for opcode in Opcode::ALL {
            for x in Register::ALL {
                let mut sources: Vec<Source> =
                    Register::ALL.iter().map(|r| Source::Register(*r)).collect();
                sources.extend((-4..=4).map(Source::Short));
                sources.push(Source::Word(long));

                for source in sources {
                    let instr = Instruction::new(opcode, x, source);
                    assert_eq!(roundtrip(instr), instr);
                }
            }
        }
    }

    #[test]
    fn test_store_roundtrip() {
        let instr = Instruction::store(Register::R2, Source::Short(-3));
        assert_eq!(roundtrip(instr), instr);

        let (word, _) = encode(&instr).unwrap();
        assert_eq!(&word.to_string()[4..5], "+");
    }

    #[test]
    fn test_field_layout() {
        let instr = Instruction::new(Opcode::Add, Register::Sp, Source::Short(4));
        let (word, extra) = encode(&instr).unwrap();
        // ADD = -13 = ---, short immediate = +, load = o, sp = -1 = o-, 4 = ++
        assert_eq!(word.to_string(), "---+oo-++");
        assert!(extra.is_none());

        let instr = Instruction::branch(Opcode::Jmp, Source::Word(Word::from_i32(100).unwrap()));
        let (word, extra) = encode(&instr).unwrap();
        assert_eq!(word.to_string(), "o+o-ooooo");
        assert_eq!(extra.unwrap().to_i32(), 100);
    }

    #[test]
    fn test_encode_errors() {
        let bad = Instruction::new(Opcode::Mov, Register::R0, Source::Short(5));
        assert_eq!(encode(&bad), Err(EncodeError::ShortImmediateOutOfRange(5)));

        let bad = Instruction {
            direction: Direction::Store,
            ..Instruction::new(Opcode::Mov, Register::R0, Source::Short(1))
        };
        assert!(matches!(encode(&bad), Err(EncodeError::StoreWithoutLod(Opcode::Mov))));
    }

    #[test]
    fn test_decode_errors() {
        // reserved opcode -12 = --o
        let reserved = Word::parse("--oo+oooo").unwrap();
        assert_eq!(decode(reserved, None), Err(DecodeError::InvalidOpcode(-12)));

        // +++ = 13 is outside the opcode space
        let high = Word::parse("+++oooooo").unwrap();
        assert_eq!(decode(high, None), Err(DecodeError::InvalidOpcode(13)));

        // MOV with the store direction set
        let mov_store = Word::parse("oo+o+oooo").unwrap();
        assert!(matches!(decode(mov_store, None), Err(DecodeError::InvalidDirection { .. })));

        // a negative direction trit is never valid
        let lod_neg = Word::parse("+o-o-oooo").unwrap();
        assert!(matches!(decode(lod_neg, None), Err(DecodeError::InvalidDirection { trit: -1, .. })));

        // word-immediate without a value word
        let jmp = Word::parse("o+o-ooooo").unwrap();
        assert_eq!(decode(jmp, None), Err(DecodeError::MissingWord));
    }
}
