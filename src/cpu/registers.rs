//! Register file.
//!
//! Nine general registers, each addressed by a signed 2-trit selector
//! congruent to its index modulo 9:
//! - r0..r4: selectors 0..=4, r5 and r6: selectors -4 and -3
//! - ra: link register, written by JAL (selector -2)
//! - sp: stack pointer (selector -1)
//!
//! Plus the program counter, the comparison flag set by CMP and the carry
//! trit produced by ADD/ADDC.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use crate::ternary::{Trit, Word};
use serde::{Serialize, Deserialize};

/// A register name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Register {
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    Ra,
    Sp,
}

impl Register {
    /// All registers in index order.
    pub const ALL: [Register; 9] = [
        Register::R0,
        Register::R1,
        Register::R2,
        Register::R3,
        Register::R4,
        Register::R5,
        Register::R6,
        Register::Ra,
        Register::Sp,
    ];

    /// The signed selector encoded in instruction words.
    #[inline]
    pub const fn selector(self) -> i8 {
        (self as i8 + 4) % 9 - 4
    }

    /// Look a register up by selector.
    pub fn from_selector(selector: i32) -> Option<Self> {
        if !(-4..=4).contains(&selector) {
            return None;
        }
        Some(Self::ALL[selector.rem_euclid(9) as usize])
    }

    /// Lower-case assembler name.
    pub const fn name(self) -> &'static str {
        match self {
            Register::R0 => "r0",
            Register::R1 => "r1",
            Register::R2 => "r2",
            Register::R3 => "r3",
            Register::R4 => "r4",
            Register::R5 => "r5",
            Register::R6 => "r6",
            Register::Ra => "ra",
            Register::Sp => "sp",
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Register {
    type Err = ();

    /// Case-insensitive register name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.name().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// The register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// r0..r6, ra, sp in index order.
    gpr: [Word; 9],

    /// Program counter: address of the next instruction.
    pub pc: Word,

    /// Result of the last CMP:
    /// P if x > y, O if x = y, N if x < y.
    pub flag: Trit,

    /// Carry out of the last ADD or ADDC.
    pub carry: Trit,
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self {
            gpr: [Word::zero(); 9],
            pc: Word::zero(),
            flag: Trit::O,
            carry: Trit::O,
        }
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Read a general register.
    #[inline]
    pub fn get(&self, reg: Register) -> Word {
        self.gpr[reg.index()]
    }

    /// Write a general register.
    #[inline]
    pub fn set(&mut self, reg: Register, value: Word) {
        self.gpr[reg.index()] = value;
    }

    /// Record the outcome of a comparison in the flag trit.
    pub fn set_flag(&mut self, ordering: Ordering) {
        self.flag = match ordering {
            Ordering::Less => Trit::N,
            Ordering::Equal => Trit::O,
            Ordering::Greater => Trit::P,
        };
    }

    /// Advance the program counter by `words`, wrapping from the top of
    /// memory back to the bottom. Returns the old value.
    pub fn advance_pc(&mut self, words: i32) -> Word {
        let old = self.pc;
        self.pc = Word::wrapping_from_i32(old.to_i32() + words);
        old
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, addr: Word) {
        self.pc = addr;
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
