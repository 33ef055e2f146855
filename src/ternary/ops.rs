//! Logic operations applied position by position.
//!
//! [`Tritwise`] lifts the per-trit operators of [`Trit`] to whole words so
//! the ALU can treat single trits and words alike.

use crate::ternary::{Trit, Word};

/// Multi-valued logic that works one trit position at a time.
pub trait Tritwise: Sized {
    /// Swap every N with P.
    fn tritwise_neg(&self) -> Self;

    /// Smaller trit of each pair.
    fn tritwise_min(&self, other: &Self) -> Self;

    /// Larger trit of each pair.
    fn tritwise_max(&self, other: &Self) -> Self;

    fn tritwise_xor(&self, other: &Self) -> Self;

    fn tritwise_consensus(&self, other: &Self) -> Self;

    fn tritwise_any(&self, other: &Self) -> Self;
}

impl Tritwise for Trit {
    fn tritwise_neg(&self) -> Self {
        -*self
    }

    fn tritwise_min(&self, other: &Self) -> Self {
        (*self).min(*other)
    }

    fn tritwise_max(&self, other: &Self) -> Self {
        (*self).max(*other)
    }

    fn tritwise_xor(&self, other: &Self) -> Self {
        self.xor(*other)
    }

    fn tritwise_consensus(&self, other: &Self) -> Self {
        self.consensus(*other)
    }

    fn tritwise_any(&self, other: &Self) -> Self {
        self.any(*other)
    }
}

fn zip_with(a: &Word, b: &Word, f: impl Fn(Trit, Trit) -> Trit) -> Word {
    let mut trits = *a.trits();
    for (t, other) in trits.iter_mut().zip(b.trits()) {
        *t = f(*t, *other);
    }
    Word::from_trits(trits)
}

impl Tritwise for Word {
    fn tritwise_neg(&self) -> Self {
        -*self
    }

    fn tritwise_min(&self, other: &Self) -> Self {
        zip_with(self, other, Trit::min)
    }

    fn tritwise_max(&self, other: &Self) -> Self {
        zip_with(self, other, Trit::max)
    }

    fn tritwise_xor(&self, other: &Self) -> Self {
        zip_with(self, other, Trit::xor)
    }

    fn tritwise_consensus(&self, other: &Self) -> Self {
        zip_with(self, other, Trit::consensus)
    }

    fn tritwise_any(&self, other: &Self) -> Self {
        zip_with(self, other, Trit::any)
    }
}
