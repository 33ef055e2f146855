//! The 9-trit word and the numeral codec.
//!
//! A word converts three ways: to its sign-character string (most
//! significant trit first, e.g. `oooooo+-o`), to its signed integer value,
//! and to and from sub-fields of trits packed inside it.

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::ternary::Trit;

/// A 9-trit word: memory cell, register value, instruction or address.
///
/// Holds every integer in `MIN..=MAX`. Serializes as its sign string.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Word {
    /// Index `i` holds the coefficient of 3^i.
    trits: [Trit; Word::WIDTH],
}

impl Word {
    /// Trits per word.
    pub const WIDTH: usize = 9;

    /// `+++++++++`
    pub const MAX: i32 = (Self::COUNT - 1) / 2;

    /// `---------`
    pub const MIN: i32 = -Self::MAX;

    /// Number of distinct words, 3^9.
    pub const COUNT: i32 = 19_683;

    /// `ooooooooo`
    #[inline]
    pub const fn zero() -> Self {
        Self::from_trits([Trit::O; Self::WIDTH])
    }

    /// Build from trits indexed by power of three.
    #[inline]
    pub const fn from_trits(trits: [Trit; Self::WIDTH]) -> Self {
        Self { trits }
    }

    /// Trits indexed by power of three.
    #[inline]
    pub const fn trits(&self) -> &[Trit; Self::WIDTH] {
        &self.trits
    }

    /// Coefficient of 3^`power`.
    #[inline]
    pub const fn get(&self, power: usize) -> Trit {
        self.trits[power]
    }

    /// Replace the coefficient of 3^`power`.
    #[inline]
    pub fn set(&mut self, power: usize, trit: Trit) {
        self.trits[power] = trit;
    }

    /// Trits in textual order, most significant first.
    pub fn digits(&self) -> [Trit; Self::WIDTH] {
        let mut digits = self.trits;
        digits.reverse();
        digits
    }

    /// Build a word from trits in textual order, most significant first.
    pub fn from_digits(mut digits: [Trit; Self::WIDTH]) -> Self {
        digits.reverse();
        Self { trits: digits }
    }

    /// Build a word from a short most-significant-first slice,
    /// left-padding the missing high-order trits with zero.
    pub fn from_digit_slice(digits: &[Trit]) -> Result<Self, CodecError> {
        if digits.len() > Self::WIDTH {
            return Err(CodecError::Format {
                literal: digits.iter().map(|t| t.to_char()).collect(),
                reason: format!("{} trits do not fit in a word", digits.len()),
            });
        }
        let mut padded = [Trit::O; Self::WIDTH];
        padded[Self::WIDTH - digits.len()..].copy_from_slice(digits);
        Ok(Self::from_digits(padded))
    }

    /// Create from a decimal integer, rejecting values outside
    /// [-9841, +9841].
    pub fn from_i32(value: i32) -> Result<Self, CodecError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(CodecError::Range {
                value,
                min: Self::MIN,
                max: Self::MAX,
            });
        }
        Ok(Self::encode(value))
    }

    /// Create from any integer, wrapping modulo 3^9 into the word range.
    ///
    /// This is what ripple-carry arithmetic does when the final carry
    /// is discarded.
    pub fn wrapping_from_i32(value: i32) -> Self {
        let reduced = (value as i64 + Self::MAX as i64).rem_euclid(Self::COUNT as i64)
            - Self::MAX as i64;
        Self::encode(reduced as i32)
    }

    fn encode(mut value: i32) -> Self {
        let mut trits = [Trit::O; Self::WIDTH];
        for slot in trits.iter_mut() {
            *slot = take_low_digit(&mut value);
        }
        Self { trits }
    }

    /// Signed integer value.
    pub fn to_i32(&self) -> i32 {
        digits_to_int(&self.digits())
    }

    /// Additive inverse, formed by swapping N and P everywhere.
    #[inline]
    pub fn neg(&self) -> Self {
        Self::from_trits(self.trits.map(Trit::neg))
    }

    /// Whether every trit is O.
    pub fn is_zero(&self) -> bool {
        self.trits.iter().copied().all(Trit::is_zero)
    }

    /// Sign of the value, read off the most significant non-zero trit.
    pub fn sign(&self) -> Trit {
        self.trits
            .iter()
            .rev()
            .copied()
            .find(|t| !t.is_zero())
            .unwrap_or(Trit::O)
    }

    /// Read the sub-field at text positions `start..start + width` as an
    /// integer.
    ///
    /// # Panics
    /// Panics if the field runs past the end of the word.
    pub fn field(&self, start: usize, width: usize) -> i32 {
        digits_to_int(&self.digits()[start..start + width])
    }

    /// Return a copy with the sub-field at text positions
    /// `start..start + width` replaced by `value`.
    ///
    /// # Panics
    /// Panics if the field runs past the end of the word.
    pub fn with_field(&self, start: usize, width: usize, value: i32) -> Result<Self, CodecError> {
        let mut digits = self.digits();
        let field = int_to_digits(value, width)?;
        digits[start..start + width].copy_from_slice(&field);
        Ok(Self::from_digits(digits))
    }

    /// Parse a 9-character sign string such as `oooo+-oo+`.
    pub fn parse(s: &str) -> Result<Self, CodecError> {
        let count = s.chars().count();
        if count != Self::WIDTH {
            return Err(CodecError::Format {
                literal: s.to_string(),
                reason: format!("expected 9 trits, got {}", count),
            });
        }

        let mut digits = [Trit::O; Self::WIDTH];
        for (slot, c) in digits.iter_mut().zip(s.chars()) {
            *slot = Trit::from_char(c).ok_or_else(|| CodecError::Format {
                literal: s.to_string(),
                reason: format!("invalid trit character '{}' (expected '-', 'o' or '+')", c),
            })?;
        }

        Ok(Self::from_digits(digits))
    }
}

/// Parse a sign string into a word.
pub fn string_to_word(s: &str) -> Result<Word, CodecError> {
    Word::parse(s)
}

/// Render a word as its sign string, most significant trit first.
pub fn word_to_string(word: &Word) -> String {
    word.to_string()
}

/// The signed integer value of a word.
pub fn word_to_int(word: &Word) -> i32 {
    word.to_i32()
}

/// The word for an integer; values outside the word range are rejected.
pub fn int_to_word(value: i32) -> Result<Word, CodecError> {
    Word::from_i32(value)
}

/// Integer value of a most-significant-first trit slice.
///
/// A short slice behaves as if left-padded with zero trits.
pub fn digits_to_int(digits: &[Trit]) -> i32 {
    digits.iter().fold(0, |acc, t| acc * 3 + t.to_i8() as i32)
}

/// Balanced ternary digits of `value`, most significant first, left-padded
/// with zero trits to exactly `width` trits.
pub fn int_to_digits(value: i32, width: usize) -> Result<Vec<Trit>, CodecError> {
    let max = (3i64.pow(width as u32) - 1) / 2;
    if (value as i64).abs() > max {
        return Err(CodecError::Range {
            value,
            min: -max as i32,
            max: max as i32,
        });
    }

    let mut digits = vec![Trit::O; width];
    let mut rest = value;
    for slot in digits.iter_mut().rev() {
        *slot = take_low_digit(&mut rest);
    }
    Ok(digits)
}

/// Split off the least significant balanced digit of `rest`.
fn take_low_digit(rest: &mut i32) -> Trit {
    let digit = match rest.rem_euclid(3) {
        0 => Trit::O,
        1 => Trit::P,
        _ => Trit::N,
    };
    *rest = (*rest - digit.to_i8() as i32) / 3;
    digit
}

impl fmt::Debug for Word {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(out, "Word({} = {})", self, self.to_i32())
    }
}

impl fmt::Display for Word {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.digits().iter().try_for_each(|t| write!(out, "{}", t))
    }
}

impl FromStr for Word {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Word::parse(s)
    }
}

impl TryFrom<i32> for Word {
    type Error = CodecError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Word::from_i32(value)
    }
}

impl TryFrom<String> for Word {
    type Error = CodecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Word::parse(&value)
    }
}

impl From<Word> for String {
    fn from(word: Word) -> Self {
        word.to_string()
    }
}

impl From<Word> for i32 {
    fn from(word: Word) -> Self {
        word.to_i32()
    }
}

impl std::ops::Neg for Word {
    type Output = Word;

    fn neg(self) -> Word {
        Word::neg(&self)
    }
}

/// Errors from converting between words, strings and integers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A sign-string literal was malformed.
    #[error("malformed word literal `{literal}`: {reason}")]
    Format { literal: String, reason: String },

    /// An integer does not fit in the requested number of trits.
    #[error("value {value} out of range [{min}, {max}]")]
    Range { value: i32, min: i32, max: i32 },
}
