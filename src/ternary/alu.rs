//! The arithmetic/logic unit.
//!
//! Every operation combines a mutable accumulator with a read-only operand:
//! `acc := op(acc, operand)`. Operations work on the whole word;
//! [`apply_field`] restricts the tritwise logic operations to a sub-field.

use serde::{Serialize, Deserialize};
use thiserror::Error;
use crate::ternary::{arith, Trit, Tritwise, Word};

/// An ALU operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AluOp {
    Add,
    AddWithCarry,
    Multiply,
    Divide,
    Modulo,
    Negate,
    Min,
    Max,
    Xor,
    Consensus,
    Any,
    RotateShift,
    UnsignedShift,
}

impl AluOp {
    /// Whether the operation works trit by trit, independent of position.
    pub const fn is_tritwise(self) -> bool {
        matches!(
            self,
            AluOp::Min | AluOp::Max | AluOp::Xor | AluOp::Consensus | AluOp::Any
        )
    }
}

/// Apply `op` to the accumulator in place.
///
/// Returns the carry out of the top trit for `Add` and `AddWithCarry`
/// (which is also the only operation that reads `carry_in`); every other
/// operation returns `Trit::O`.
///
/// Division and modulo by zero leave the accumulator unchanged.
pub fn apply(op: AluOp, acc: &mut Word, operand: &Word, carry_in: Trit) -> Trit {
    let mut carry = Trit::O;
    *acc = match op {
        AluOp::Add => {
            let (sum, out) = arith::add(acc, operand);
            carry = out;
            sum
        }
        AluOp::AddWithCarry => {
            let (sum, out) = arith::add_with_carry(acc, operand, carry_in);
            carry = out;
            sum
        }
        AluOp::Multiply => arith::multiply(acc, operand).0,
        AluOp::Divide => arith::divide(acc, operand).map_or(*acc, |(q, _)| q),
        AluOp::Modulo => arith::divide(acc, operand).map_or(*acc, |(_, r)| r),
        AluOp::Negate => arith::negate(operand),
        AluOp::Min => acc.tritwise_min(operand),
        AluOp::Max => acc.tritwise_max(operand),
        AluOp::Xor => acc.tritwise_xor(operand),
        AluOp::Consensus => acc.tritwise_consensus(operand),
        AluOp::Any => acc.tritwise_any(operand),
        AluOp::RotateShift => arith::rotate(acc, operand.to_i32()),
        AluOp::UnsignedShift => arith::shift(acc, operand.to_i32()),
    };
    carry
}

/// Apply a tritwise logic operation to the sub-field at text positions
/// `start..start + width` only; trits outside the field are untouched.
pub fn apply_field(
    op: AluOp,
    acc: &mut Word,
    operand: &Word,
    start: usize,
    width: usize,
) -> Result<(), AluError> {
    if !op.is_tritwise() {
        return Err(AluError::InvalidOperand(format!(
            "{:?} does not operate on sub-fields",
            op
        )));
    }
    let end = start
        .checked_add(width)
        .filter(|end| width > 0 && *end <= Word::WIDTH)
        .ok_or_else(|| {
            AluError::InvalidOperand(format!(
                "field of {} trits at {} is not inside a {}-trit word",
                width,
                start,
                Word::WIDTH
            ))
        })?;

    let mut combined = *acc;
    apply(op, &mut combined, operand, Trit::O);

    let mut digits = acc.digits();
    digits[start..end].copy_from_slice(&combined.digits()[start..end]);
    *acc = Word::from_digits(digits);
    Ok(())
}

/// Errors raised by the ALU.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AluError {
    #[error("invalid operand: {0}")]
    InvalidOperand(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(value: i32) -> Word {
        Word::from_i32(value).unwrap()
    }

    fn run(op: AluOp, acc: i32, operand: i32) -> i32 {
        let mut acc = w(acc);
        apply(op, &mut acc, &w(operand), Trit::O);
        acc.to_i32()
    }

    #[test]
    fn test_arithmetic_ops() {
        assert_eq!(run(AluOp::Add, 40, 2), 42);
        assert_eq!(run(AluOp::Multiply, -7, 6), -42);
        assert_eq!(run(AluOp::Divide, 100, 7), 14);
        assert_eq!(run(AluOp::Modulo, 100, 7), 2);
        assert_eq!(run(AluOp::Negate, 5, 9), -9);
        assert_eq!(run(AluOp::UnsignedShift, 2, 2), 18);
        assert_eq!(run(AluOp::UnsignedShift, 18, -2), 2);
    }

    #[test]
    fn test_division_by_zero_keeps_accumulator() {
        assert_eq!(run(AluOp::Divide, 77, 0), 77);
        assert_eq!(run(AluOp::Modulo, -77, 0), -77);
    }

    #[test]
    fn test_add_reports_carry() {
        let mut acc = w(Word::MAX);
        let carry = apply(AluOp::Add, &mut acc, &w(1), Trit::O);
        assert_eq!(carry, Trit::P);
        assert_eq!(acc.to_i32(), Word::MIN);

        let mut acc = w(0);
        let carry = apply(AluOp::AddWithCarry, &mut acc, &w(5), Trit::P);
        assert_eq!(carry, Trit::O);
        assert_eq!(acc.to_i32(), 6);

        // Add ignores the incoming carry.
        let mut acc = w(0);
        apply(AluOp::Add, &mut acc, &w(5), Trit::P);
        assert_eq!(acc.to_i32(), 5);
    }

    #[test]
    fn test_rotate_via_alu() {
        let mut acc = Word::parse("+oooooooo").unwrap();
        apply(AluOp::RotateShift, &mut acc, &w(1), Trit::O);
        assert_eq!(acc.to_string(), "oooooooo+");
    }

    #[test]
    fn test_toggle_field_press_release() {
        let all_p = Word::parse("+++++++++").unwrap();
        let all_n = Word::parse("---------").unwrap();
        let press = |word: &mut Word| apply_field(AluOp::Max, word, &all_p, 3, 3).unwrap();
        let release = |word: &mut Word| apply_field(AluOp::Min, word, &all_n, 3, 3).unwrap();

        for start in ["ooooooooo", "+-o---+o-", "---+++ooo", "+++ooo---"] {
            let mut buttons = Word::parse(start).unwrap();
            let outside = |w: &Word| {
                let d = w.digits();
                (d[..3].to_vec(), d[6..].to_vec())
            };
            let before = outside(&buttons);

            press(&mut buttons);
            assert_eq!(buttons.field(3, 3), 13);
            press(&mut buttons);
            assert_eq!(buttons.field(3, 3), 13);

            release(&mut buttons);
            assert_eq!(buttons.field(3, 3), -13);
            release(&mut buttons);
            assert_eq!(buttons.field(3, 3), -13);

            press(&mut buttons);
            assert_eq!(buttons.field(3, 3), 13);
            assert_eq!(outside(&buttons), before);
        }
    }

    #[test]
    fn test_apply_field_rejects_bad_operands() {
        let mut acc = Word::zero();
        let operand = w(1);
        assert!(matches!(
            apply_field(AluOp::Add, &mut acc, &operand, 0, 3),
            Err(AluError::InvalidOperand(_))
        ));
        assert!(apply_field(AluOp::Max, &mut acc, &operand, 7, 3).is_err());
        assert!(apply_field(AluOp::Max, &mut acc, &operand, 0, 0).is_err());
        assert!(apply_field(AluOp::Max, &mut acc, &operand, 0, 9).is_ok());
        assert!(apply_field(AluOp::Max, &mut acc, &operand, 0, usize::MAX).is_err());
        assert!(apply_field(AluOp::Max, &mut acc, &operand, usize::MAX, 1).is_err());
    }
}
