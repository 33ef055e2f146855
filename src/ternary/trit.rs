//! Single balanced ternary digit (trit).
//!
//! A trit holds -1, 0 or +1 and is stored in two bits (binary-coded
//! ternary): the low bit marks +1, the high bit marks -1, and `0b11` is not
//! a trit.
//!
//! Textually a trit is written as `-`, `o` or `+`.

use std::fmt;
use serde::{Serialize, Deserialize};

/// A single balanced ternary digit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Trit {
    /// -1
    N = 0b10,
    /// 0
    #[default]
    O = 0b00,
    /// +1
    P = 0b01,
}

impl Trit {
    /// N, O, P in ascending order.
    pub const ALL: [Trit; 3] = [Trit::N, Trit::O, Trit::P];

    /// Decode a 2-bit BCT value.
    #[inline]
    pub const fn from_bct(bits: u8) -> Option<Self> {
        match bits {
            0b00 => Some(Trit::O),
            0b01 => Some(Trit::P),
            0b10 => Some(Trit::N),
            _ => None,
        }
    }

    /// The 2-bit BCT value.
    #[inline]
    pub const fn to_bct(self) -> u8 {
        self as u8
    }

    /// Create a trit from -1, 0 or 1.
    #[inline]
    pub const fn from_i8(value: i8) -> Option<Self> {
        match value {
            -1 => Some(Trit::N),
            0 => Some(Trit::O),
            1 => Some(Trit::P),
            _ => None,
        }
    }

    /// The sign of an integer as a trit.
    #[inline]
    pub const fn sign_of(value: i32) -> Self {
        if value > 0 {
            Trit::P
        } else if value < 0 {
            Trit::N
        } else {
            Trit::O
        }
    }

    /// Integer value: the +1 bit minus the -1 bit.
    #[inline]
    pub const fn to_i8(self) -> i8 {
        let bits = self as u8;
        (bits & 1) as i8 - (bits >> 1) as i8
    }

    /// Parse one of `-`, `o`, `+`.
    #[inline]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '-' => Some(Trit::N),
            'o' => Some(Trit::O),
            '+' => Some(Trit::P),
            _ => None,
        }
    }

    /// The sign character for this trit.
    #[inline]
    pub const fn to_char(self) -> char {
        match self {
            Trit::N => '-',
            Trit::O => 'o',
            Trit::P => '+',
        }
    }

    /// Swap N and P.
    #[inline]
    pub const fn neg(self) -> Self {
        Self::sign_of(-(self.to_i8() as i32))
    }

    /// Per-trit minimum.
    #[inline]
    pub const fn min(self, other: Self) -> Self {
        if self.to_i8() <= other.to_i8() { self } else { other }
    }

    /// Per-trit maximum.
    #[inline]
    pub const fn max(self, other: Self) -> Self {
        if self.to_i8() >= other.to_i8() { self } else { other }
    }

    /// Exclusive-or: O is the identity, equal non-zero trits cancel,
    /// and mixed non-zero trits cancel as well.
    ///
    /// | a\b | N | O | P |
    /// |-----|---|---|---|
    /// |  N  | O | N | O |
    /// |  O  | N | O | P |
    /// |  P  | O | P | O |
    #[inline]
    pub const fn xor(self, other: Self) -> Self {
        match (self, other) {
            (Trit::O, t) | (t, Trit::O) => t,
            _ => Trit::O,
        }
    }

    /// Consensus: the shared value when both agree, O otherwise.
    #[inline]
    pub const fn consensus(self, other: Self) -> Self {
        if self.to_i8() == other.to_i8() { self } else { Trit::O }
    }

    /// Union: the sign of `a + b`.
    #[inline]
    pub const fn any(self, other: Self) -> Self {
        Self::sign_of((self.to_i8() + other.to_i8()) as i32)
    }

    /// Add three trits, returning (sum, carry) with
    /// `a + b + c == sum + 3 * carry`.
    #[inline]
    pub const fn full_add(self, other: Self, carry_in: Self) -> (Self, Self) {
        match self.to_i8() + other.to_i8() + carry_in.to_i8() {
            -3 => (Trit::O, Trit::N),
            -2 => (Trit::P, Trit::N),
            -1 => (Trit::N, Trit::O),
            1 => (Trit::P, Trit::O),
            2 => (Trit::N, Trit::P),
            3 => (Trit::O, Trit::P),
            _ => (Trit::O, Trit::O),
        }
    }

    /// Product of two trits; never carries.
    #[inline]
    pub const fn mul(self, other: Self) -> Self {
        Self::sign_of((self.to_i8() * other.to_i8()) as i32)
    }

    /// Whether this is O.
    #[inline]
    pub const fn is_zero(self) -> bool {
        matches!(self, Trit::O)
    }
}

impl fmt::Display for Trit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

impl std::ops::Neg for Trit {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Trit::neg(self)
    }
}

impl From<Trit> for i8 {
    fn from(trit: Trit) -> Self {
        trit.to_i8()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bct_bits() {
        assert_eq!(Trit::N.to_bct(), 0b10);
        assert_eq!(Trit::P.to_bct(), 0b01);
        for t in Trit::ALL {
            assert_eq!(Trit::from_bct(t.to_bct()), Some(t));
            assert_eq!(Trit::from_i8(t.to_i8()), Some(t));
            assert_eq!(Trit::from_char(t.to_char()), Some(t));
        }
        assert_eq!(Trit::from_bct(0b11), None);
        assert_eq!(Trit::from_i8(-2), None);
        assert_eq!(Trit::from_char('0'), None);
    }

    #[test]
    fn test_neg() {
        assert_eq!(-Trit::P, Trit::N);
        assert_eq!(-Trit::N, Trit::P);
        assert_eq!(-Trit::O, Trit::O);
    }

    #[test]
    fn test_full_add_matches_integers() {
        for a in Trit::ALL {
            for b in Trit::ALL {
                for c in Trit::ALL {
                    let (s, co) = a.full_add(b, c);
                    assert_eq!(
                        s.to_i8() + 3 * co.to_i8(),
                        a.to_i8() + b.to_i8() + c.to_i8(),
                        "{:?} + {:?} + {:?}",
                        a,
                        b,
                        c
                    );
                }
            }
        }
    }

    #[test]
    fn test_xor_identity_and_cancellation() {
        for t in Trit::ALL {
            assert_eq!(t.xor(Trit::O), t);
            assert_eq!(Trit::O.xor(t), t);
            assert_eq!(t.xor(t), Trit::O);
        }
        assert_eq!(Trit::P.xor(Trit::N), Trit::O);
        assert_eq!(Trit::N.xor(Trit::P), Trit::O);
    }

    #[test]
    fn test_consensus() {
        for t in Trit::ALL {
            assert_eq!(t.consensus(t), t);
        }
        assert_eq!(Trit::P.consensus(Trit::N), Trit::O);
        assert_eq!(Trit::N.consensus(Trit::O), Trit::O);
    }

    #[test]
    fn test_any_and_mul_are_commutative() {
        for a in Trit::ALL {
            for b in Trit::ALL {
                assert_eq!(a.any(b), b.any(a));
                assert_eq!(a.mul(b).to_i8(), a.to_i8() * b.to_i8());
            }
        }
        assert_eq!(Trit::P.any(Trit::O), Trit::P);
        assert_eq!(Trit::N.any(Trit::N), Trit::N);
        assert_eq!(Trit::N.any(Trit::P), Trit::O);
    }

    #[test]
    fn test_min_max() {
        assert_eq!(Trit::P.min(Trit::N), Trit::N);
        assert_eq!(Trit::P.max(Trit::N), Trit::P);
        assert_eq!(Trit::O.min(Trit::P), Trit::O);
        assert_eq!(Trit::O.max(Trit::N), Trit::O);
    }
}
