//! Multi-trit arithmetic operations.
//!
//! Addition, multiplication, division, negation and shifts over 9-trit
//! words. Results that leave the word range wrap around: the carry out of
//! the top trit is dropped (and reported where it is useful).

use std::cmp::Ordering;
use crate::ternary::{Trit, Word};

/// Negate a word.
#[inline]
pub fn negate(a: &Word) -> Word {
    a.neg()
}

/// Add two words with an incoming carry, returning (result, carry_out).
pub fn add_with_carry(a: &Word, b: &Word, carry_in: Trit) -> (Word, Trit) {
    let mut result = Word::zero();
    let mut carry = carry_in;

    for i in 0..Word::WIDTH {
        let (sum, new_carry) = a.get(i).full_add(b.get(i), carry);
        result.set(i, sum);
        carry = new_carry;
    }

    (result, carry)
}

/// Add two words, returning (result, carry_out).
#[inline]
pub fn add(a: &Word, b: &Word) -> (Word, Trit) {
    add_with_carry(a, b, Trit::O)
}

/// Subtract two words (a - b), returning (result, borrow_out).
#[inline]
pub fn subtract(a: &Word, b: &Word) -> (Word, Trit) {
    add(a, &b.neg())
}

/// Multiply two words, returning the 18-trit product as (low, high).
///
/// Schoolbook multiplication: single-trit products never carry, so each
/// partial row only needs the ripple carry of the running sum.
pub fn multiply(a: &Word, b: &Word) -> (Word, Word) {
    let mut product = [Trit::O; 18];

    for i in 0..Word::WIDTH {
        if a.get(i).is_zero() {
            continue;
        }

        let mut carry = Trit::O;
        for j in 0..Word::WIDTH {
            let partial = a.get(i).mul(b.get(j));
            let (sum, new_carry) = product[i + j].full_add(partial, carry);
            product[i + j] = sum;
            carry = new_carry;
        }

        let mut k = i + Word::WIDTH;
        while !carry.is_zero() && k < product.len() {
            let (sum, new_carry) = product[k].full_add(carry, Trit::O);
            product[k] = sum;
            carry = new_carry;
            k += 1;
        }
    }

    let mut low = [Trit::O; 9];
    let mut high = [Trit::O; 9];
    low.copy_from_slice(&product[..9]);
    high.copy_from_slice(&product[9..]);

    (Word::from_trits(low), Word::from_trits(high))
}

/// Divide `a` by `b`, returning (quotient, remainder).
///
/// The quotient truncates toward zero and the remainder takes the sign of
/// the dividend. Returns `None` when `b` is zero.
pub fn divide(a: &Word, b: &Word) -> Option<(Word, Word)> {
    if b.is_zero() {
        return None;
    }
    let (dividend, divisor) = (a.to_i32(), b.to_i32());
    Some((
        Word::wrapping_from_i32(dividend / divisor),
        Word::wrapping_from_i32(dividend % divisor),
    ))
}

/// Shift a word by `amount` trit positions, filling with zeros.
///
/// Positive amounts move toward the most significant end (multiply by
/// 3^n, losing the trits shifted out); negative amounts move toward the
/// least significant end (divide by 3^n, rounding to nearest).
pub fn shift(a: &Word, amount: i32) -> Word {
    let width = Word::WIDTH as i32;
    if amount.abs() >= width {
        return Word::zero();
    }

    let mut result = Word::zero();
    for i in 0..width {
        let source = i - amount;
        if (0..width).contains(&source) {
            result.set(i as usize, a.get(source as usize));
        }
    }
    result
}

/// Rotate a word by `amount` trit positions (positive = toward the most
/// significant end). The amount is taken modulo the word width.
pub fn rotate(a: &Word, amount: i32) -> Word {
    let width = Word::WIDTH as i32;
    let mut result = Word::zero();
    for i in 0..width {
        let target = (i + amount).rem_euclid(width);
        result.set(target as usize, a.get(i as usize));
    }
    result
}

/// Compare two words by integer value.
pub fn compare(a: &Word, b: &Word) -> Ordering {
    a.to_i32().cmp(&b.to_i32())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(value: i32) -> Word {
        Word::from_i32(value).unwrap()
    }

    #[test]
    fn test_add_basic() {
        let (result, carry) = add(&w(100), &w(50));
        assert_eq!(result.to_i32(), 150);
        assert!(carry.is_zero());
    }

    #[test]
    fn test_add_negative() {
        let (result, _) = add(&w(100), &w(-150));
        assert_eq!(result.to_i32(), -50);
    }

    #[test]
    fn test_add_wraps_at_boundary() {
        let (result, carry) = add(&w(Word::MAX), &w(1));
        assert_eq!(result.to_i32(), Word::MIN);
        assert_eq!(carry, Trit::P);

        let (result, carry) = add(&w(Word::MIN), &w(-1));
        assert_eq!(result.to_i32(), Word::MAX);
        assert_eq!(carry, Trit::N);
    }

    #[test]
    fn test_add_with_carry() {
        let (result, carry) = add_with_carry(&w(10), &w(20), Trit::P);
        assert_eq!(result.to_i32(), 31);
        assert!(carry.is_zero());

        let (result, _) = add_with_carry(&w(10), &w(20), Trit::N);
        assert_eq!(result.to_i32(), 29);
    }

    #[test]
    fn test_subtract() {
        let (result, _) = subtract(&w(100), &w(30));
        assert_eq!(result.to_i32(), 70);
    }

    #[test]
    fn test_multiply_simple() {
        let (low, high) = multiply(&w(7), &w(6));
        assert_eq!(low.to_i32(), 42);
        assert!(high.is_zero());

        let (low, _) = multiply(&w(-7), &w(6));
        assert_eq!(low.to_i32(), -42);
    }

    #[test]
    fn test_multiply_wide_product() {
        let (low, high) = multiply(&w(1000), &w(1000));
        let full = high.to_i32() as i64 * Word::COUNT as i64 + low.to_i32() as i64;
        assert_eq!(full, 1_000_000);
        assert_eq!(low, Word::wrapping_from_i32(1_000_000));
    }

    #[test]
    fn test_multiply_matches_integers() {
        for a in [-9841, -1234, -81, -5, -1, 0, 1, 4, 13, 100, 9841] {
            for b in [-9841, -300, -2, 0, 3, 77, 9841] {
                let (low, _) = multiply(&w(a), &w(b));
                let expected = Word::wrapping_from_i32(((a as i64 * b as i64) % Word::COUNT as i64) as i32);
                assert_eq!(low, expected, "{} * {}", a, b);
            }
        }
    }

    #[test]
    fn test_divide() {
        let (q, r) = divide(&w(17), &w(5)).unwrap();
        assert_eq!((q.to_i32(), r.to_i32()), (3, 2));

        let (q, r) = divide(&w(-17), &w(5)).unwrap();
        assert_eq!((q.to_i32(), r.to_i32()), (-3, -2));

        let (q, _) = divide(&w(Word::MIN), &w(-1)).unwrap();
        assert_eq!(q.to_i32(), Word::MAX);

        assert!(divide(&w(17), &Word::zero()).is_none());
    }

    #[test]
    fn test_shift() {
        assert_eq!(shift(&w(1), 1).to_i32(), 3);
        assert_eq!(shift(&w(1), 2).to_i32(), 9);
        assert_eq!(shift(&w(27), -1).to_i32(), 9);
        assert_eq!(shift(&w(27), -3).to_i32(), 1);
        assert!(shift(&w(1), 9).is_zero());
        assert!(shift(&w(Word::MAX), -9).is_zero());

        // the most significant trit falls off
        let top = Word::parse("+oooooooo").unwrap();
        assert!(shift(&top, 1).is_zero());
    }

    #[test]
    fn test_rotate() {
        let top = Word::parse("+ooooooo-").unwrap();
        assert_eq!(rotate(&top, 1).to_string(), "ooooooo-+");
        assert_eq!(rotate(&top, -1).to_string(), "-+ooooooo");
        assert_eq!(rotate(&top, 9), top);
        assert_eq!(rotate(&top, -10), rotate(&top, -1));
    }

    #[test]
    fn test_additive_inverse() {
        for val in [-9841, -100, -1, 0, 1, 100, 9841] {
            let a = w(val);
            let (result, _) = add(&a, &negate(&a));
            assert!(result.is_zero(), "Expected {} + (-{}) = 0", val, val);
        }
    }

    #[test]
    fn test_compare() {
        assert_eq!(compare(&w(3), &w(-4)), Ordering::Greater);
        assert_eq!(compare(&w(-4), &w(-4)), Ordering::Equal);
    }
}
