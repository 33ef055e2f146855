//! Balanced ternary number system primitives.
//!
//! This module provides the core types for working with balanced ternary:
//! - [`Trit`] - A single balanced ternary digit (-1, 0, +1)
//! - [`Word`] - A 9-trit word (memory cells, registers, instructions)
//! - [`alu`] - The arithmetic/logic unit over words

mod trit;
mod word;
mod ops;
pub mod arith;
pub mod alu;

pub use trit::Trit;
pub use word::{
    Word, CodecError, string_to_word, word_to_string, word_to_int, int_to_word,
    digits_to_int, int_to_digits,
};
pub use ops::Tritwise;
pub use alu::{AluOp, AluError};
