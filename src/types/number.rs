//! Deferred host numbers
//!
//! A `Number` is a host integer or real whose concrete staged type is not
//! decided yet. Number-with-number operations fold on the host immediately;
//! a number meeting a staged value hands the operation to the concrete
//! side's mirrored operation, which casts the number at the concrete type.
//! Host folding follows floored division and modulo, so results agree with
//! what the same expression would produce once staged.

use crate::diagnostics::{CoreError, Result};
use crate::ir::FunctionBuilder;
use crate::types::cast::{IntoFloat, IntoIndex, IntoInt};
use crate::types::float::{FloatType, FloatValue};
use crate::types::index::IndexValue;
use crate::types::int::{BoolValue, IntType, IntValue};
use crate::types::StagedValue;

/// Host representation of a deferred number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostNum {
    Int(i64),
    Float(f64),
}

impl HostNum {
    pub fn as_f64(self) -> f64 {
        match self {
            HostNum::Int(v) => v as f64,
            HostNum::Float(v) => v,
        }
    }
}

/// Binary operation on numbers, in source-operator terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumBinOp {
    Add,
    Sub,
    Mul,
    TrueDiv,
    FloorDiv,
    Mod,
    Pow,
    Shl,
    Shr,
    BitAnd,
    BitXor,
    BitOr,
    Lt,
    Le,
    Eq,
    Ne,
    Gt,
    Ge,
}

impl NumBinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            NumBinOp::Add => "+",
            NumBinOp::Sub => "-",
            NumBinOp::Mul => "*",
            NumBinOp::TrueDiv => "/",
            NumBinOp::FloorDiv => "//",
            NumBinOp::Mod => "%",
            NumBinOp::Pow => "**",
            NumBinOp::Shl => "<<",
            NumBinOp::Shr => ">>",
            NumBinOp::BitAnd => "&",
            NumBinOp::BitXor => "^",
            NumBinOp::BitOr => "|",
            NumBinOp::Lt => "<",
            NumBinOp::Le => "<=",
            NumBinOp::Eq => "==",
            NumBinOp::Ne => "!=",
            NumBinOp::Gt => ">",
            NumBinOp::Ge => ">=",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            NumBinOp::Lt | NumBinOp::Le | NumBinOp::Eq | NumBinOp::Ne | NumBinOp::Gt | NumBinOp::Ge
        )
    }
}

/// Unary operation on numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumUnOp {
    Neg,
    Pos,
    Abs,
    Trunc,
    Floor,
    Ceil,
    Round,
    Invert,
}

/// A deferred number value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Number {
    value: HostNum,
}

impl Number {
    pub fn int(value: i64) -> Self {
        Self {
            value: HostNum::Int(value),
        }
    }

    pub fn float(value: f64) -> Self {
        Self {
            value: HostNum::Float(value),
        }
    }

    pub fn value(&self) -> HostNum {
        self.value
    }

    /// Apply `self <op> rhs`. A number on the right folds on the host; a
    /// staged value on the right receives the mirrored operation.
    pub fn binop(self, op: NumBinOp, rhs: StagedValue, fx: &mut FunctionBuilder) -> Result<StagedValue> {
        match rhs {
            StagedValue::Number(n) => self.fold(op, n, fx),
            StagedValue::Int(v) => v.reflected(op, self, fx),
            StagedValue::Float(v) => v.reflected(op, self, fx),
            StagedValue::Index(v) => v.reflected(op, self, fx),
            StagedValue::Bool(v) => v.reflected(op, self, fx),
        }
    }

    fn fold(self, op: NumBinOp, rhs: Number, fx: &mut FunctionBuilder) -> Result<StagedValue> {
        if op.is_comparison() {
            let truth = compare(op, self.value, rhs.value);
            return Ok(StagedValue::Bool(BoolValue::literal(truth, fx)));
        }
        arith(op, self.value, rhs.value).map(|value| StagedValue::Number(Number { value }))
    }

    /// Apply a unary operation on the host.
    pub fn unop(self, op: NumUnOp) -> Result<Number> {
        let value = match self.value {
            HostNum::Int(v) => match op {
                NumUnOp::Neg => HostNum::Int(narrow(-(v as i128))?),
                NumUnOp::Pos => HostNum::Int(v),
                NumUnOp::Abs => HostNum::Int(narrow((v as i128).abs())?),
                NumUnOp::Trunc | NumUnOp::Floor | NumUnOp::Ceil | NumUnOp::Round => {
                    HostNum::Int(v)
                }
                NumUnOp::Invert => HostNum::Int(!v),
            },
            HostNum::Float(v) => match op {
                NumUnOp::Neg => HostNum::Float(-v),
                NumUnOp::Pos => HostNum::Float(v),
                NumUnOp::Abs => HostNum::Float(v.abs()),
                NumUnOp::Trunc => HostNum::Int(real_to_int(v.trunc())?),
                NumUnOp::Floor => HostNum::Int(real_to_int(v.floor())?),
                NumUnOp::Ceil => HostNum::Int(real_to_int(v.ceil())?),
                // Ties round to even, matching the host language convention.
                NumUnOp::Round => HostNum::Int(real_to_int(v.round_ties_even())?),
                NumUnOp::Invert => {
                    return Err(CoreError::UnsupportedOperand {
                        op: "~",
                        operand: "a float literal".to_string(),
                    });
                }
            },
        };
        Ok(Number { value })
    }
}

impl IntoInt for Number {
    fn into_int(self, target: IntType, fx: &mut FunctionBuilder) -> Result<IntValue> {
        match self.value {
            HostNum::Int(v) => IntValue::const_checked(target, v as i128, fx),
            HostNum::Float(v) => IntValue::literal(target, v, fx),
        }
    }
}

impl IntoFloat for Number {
    fn into_float(self, target: FloatType, fx: &mut FunctionBuilder) -> Result<FloatValue> {
        FloatValue::literal(target, self.value.as_f64(), fx)
    }
}

impl IntoIndex for Number {
    fn into_index(self, fx: &mut FunctionBuilder) -> Result<IndexValue> {
        match self.value {
            HostNum::Int(v) => IndexValue::const_checked(v as i128, fx),
            HostNum::Float(v) => IndexValue::literal(v, fx),
        }
    }
}

fn narrow(n: i128) -> Result<i64> {
    i64::try_from(n).map_err(|_| CoreError::OutOfRange {
        value: n,
        type_name: "Number".to_string(),
        min: i64::MIN as i128,
        max: i64::MAX as i128,
    })
}

/// Finite real to host integer, for the rounding family.
fn real_to_int(v: f64) -> Result<i64> {
    if !v.is_finite() {
        return Err(CoreError::InvalidCast {
            value: v.to_string(),
            target: "an integer literal".to_string(),
        });
    }
    narrow(v as i128)
}

/// Floored division, quotient rounded toward negative infinity.
fn floor_div(a: i128, b: i128) -> i128 {
    let q = a / b;
    if a % b != 0 && (a < 0) != (b < 0) { q - 1 } else { q }
}

/// Modulo paired with floored division; the result takes the divisor's sign.
fn floor_mod(a: i128, b: i128) -> i128 {
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) { r + b } else { r }
}

fn compare(op: NumBinOp, a: HostNum, b: HostNum) -> bool {
    let (lt, eq, gt) = match (a, b) {
        (HostNum::Int(x), HostNum::Int(y)) => (x < y, x == y, x > y),
        _ => {
            let (x, y) = (a.as_f64(), b.as_f64());
            (x < y, x == y, x > y)
        }
    };
    match op {
        NumBinOp::Lt => lt,
        NumBinOp::Le => lt || eq,
        NumBinOp::Eq => eq,
        NumBinOp::Ne => !eq,
        NumBinOp::Gt => gt,
        NumBinOp::Ge => gt || eq,
        _ => unreachable!("not a comparison: {op:?}"),
    }
}

fn arith(op: NumBinOp, a: HostNum, b: HostNum) -> Result<HostNum> {
    match (a, b) {
        (HostNum::Int(x), HostNum::Int(y)) => int_arith(op, x, y),
        _ => float_arith(op, a.as_f64(), b.as_f64()),
    }
}

fn int_arith(op: NumBinOp, a: i64, b: i64) -> Result<HostNum> {
    let (x, y) = (a as i128, b as i128);
    let n = match op {
        NumBinOp::Add => x + y,
        NumBinOp::Sub => x - y,
        NumBinOp::Mul => x * y,
        NumBinOp::TrueDiv => {
            if b == 0 {
                return Err(CoreError::DivisionByZero);
            }
            return Ok(HostNum::Float(a as f64 / b as f64));
        }
        NumBinOp::FloorDiv => {
            if b == 0 {
                return Err(CoreError::DivisionByZero);
            }
            floor_div(x, y)
        }
        NumBinOp::Mod => {
            if b == 0 {
                return Err(CoreError::DivisionByZero);
            }
            floor_mod(x, y)
        }
        NumBinOp::Pow => {
            if b < 0 {
                if a == 0 {
                    return Err(CoreError::DivisionByZero);
                }
                return Ok(HostNum::Float((a as f64).powf(b as f64)));
            }
            match u32::try_from(b).ok().and_then(|e| x.checked_pow(e)) {
                Some(v) => v,
                None => {
                    return Err(CoreError::OutOfRange {
                        value: (a as f64).powf(b as f64) as i128,
                        type_name: "Number".to_string(),
                        min: i64::MIN as i128,
                        max: i64::MAX as i128,
                    });
                }
            }
        }
        NumBinOp::Shl => {
            let amount =
                u32::try_from(b).map_err(|_| CoreError::ShiftOutOfRange { amount: b })?;
            if a == 0 {
                0
            } else {
                // Shift back to detect bits falling off the wide word.
                match x.checked_shl(amount).filter(|v| v >> amount == x) {
                    Some(v) => v,
                    None => {
                        return Err(CoreError::OutOfRange {
                            value: if a > 0 { i128::MAX } else { i128::MIN },
                            type_name: "Number".to_string(),
                            min: i64::MIN as i128,
                            max: i64::MAX as i128,
                        });
                    }
                }
            }
        }
        NumBinOp::Shr => {
            let amount =
                u32::try_from(b).map_err(|_| CoreError::ShiftOutOfRange { amount: b })?;
            x >> amount.min(127)
        }
        NumBinOp::BitAnd => return Ok(HostNum::Int(a & b)),
        NumBinOp::BitXor => return Ok(HostNum::Int(a ^ b)),
        NumBinOp::BitOr => return Ok(HostNum::Int(a | b)),
        _ => unreachable!("not an arithmetic op: {op:?}"),
    };
    narrow(n).map(HostNum::Int)
}

fn float_arith(op: NumBinOp, x: f64, y: f64) -> Result<HostNum> {
    let v = match op {
        NumBinOp::Add => x + y,
        NumBinOp::Sub => x - y,
        NumBinOp::Mul => x * y,
        NumBinOp::TrueDiv => x / y,
        NumBinOp::FloorDiv => (x / y).floor(),
        NumBinOp::Mod => x - y * (x / y).floor(),
        NumBinOp::Pow => x.powf(y),
        NumBinOp::Shl
        | NumBinOp::Shr
        | NumBinOp::BitAnd
        | NumBinOp::BitXor
        | NumBinOp::BitOr => {
            return Err(CoreError::UnsupportedOperand {
                op: op.symbol(),
                operand: "a float literal".to_string(),
            });
        }
        _ => unreachable!("not an arithmetic op: {op:?}"),
    };
    Ok(HostNum::Float(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{IntPredicate, IrOp};

    fn num(op: NumBinOp, a: Number, b: Number) -> Result<HostNum> {
        let mut fx = FunctionBuilder::new("k");
        match a.binop(op, StagedValue::Number(b), &mut fx)? {
            StagedValue::Number(n) => Ok(n.value()),
            other => panic!("expected a folded number, got {other:?}"),
        }
    }

    #[test]
    fn test_fold_uses_floored_division() {
        assert_eq!(
            num(NumBinOp::FloorDiv, Number::int(-7), Number::int(2)).unwrap(),
            HostNum::Int(-4)
        );
        assert_eq!(
            num(NumBinOp::FloorDiv, Number::int(7), Number::int(-2)).unwrap(),
            HostNum::Int(-4)
        );
        assert_eq!(
            num(NumBinOp::Mod, Number::int(-7), Number::int(2)).unwrap(),
            HostNum::Int(1)
        );
        assert_eq!(
            num(NumBinOp::Mod, Number::int(7), Number::int(-2)).unwrap(),
            HostNum::Int(-1)
        );
    }

    #[test]
    fn test_fold_division_by_zero() {
        for op in [NumBinOp::TrueDiv, NumBinOp::FloorDiv, NumBinOp::Mod] {
            assert!(matches!(
                num(op, Number::int(1), Number::int(0)).unwrap_err(),
                CoreError::DivisionByZero
            ));
        }
    }

    #[test]
    fn test_fold_truediv_yields_float() {
        assert_eq!(
            num(NumBinOp::TrueDiv, Number::int(1), Number::int(2)).unwrap(),
            HostNum::Float(0.5)
        );
    }

    #[test]
    fn test_fold_pow() {
        assert_eq!(
            num(NumBinOp::Pow, Number::int(2), Number::int(10)).unwrap(),
            HostNum::Int(1024)
        );
        assert_eq!(
            num(NumBinOp::Pow, Number::int(2), Number::int(-1)).unwrap(),
            HostNum::Float(0.5)
        );
    }

    #[test]
    fn test_fold_shifts_and_bits() {
        assert_eq!(
            num(NumBinOp::Shl, Number::int(1), Number::int(3)).unwrap(),
            HostNum::Int(8)
        );
        assert!(matches!(
            num(NumBinOp::Shl, Number::int(1), Number::int(-1)).unwrap_err(),
            CoreError::ShiftOutOfRange { amount: -1 }
        ));
        assert!(matches!(
            num(NumBinOp::Shl, Number::int(1), Number::int(100)).unwrap_err(),
            CoreError::OutOfRange { .. }
        ));
        assert_eq!(
            num(NumBinOp::Shr, Number::int(-1), Number::int(100)).unwrap(),
            HostNum::Int(-1)
        );
        assert_eq!(
            num(NumBinOp::BitXor, Number::int(6), Number::int(3)).unwrap(),
            HostNum::Int(5)
        );
        assert!(matches!(
            num(NumBinOp::BitAnd, Number::float(1.0), Number::int(3)).unwrap_err(),
            CoreError::UnsupportedOperand { .. }
        ));
    }

    #[test]
    fn test_fold_overflow_is_an_error() {
        assert!(matches!(
            num(NumBinOp::Add, Number::int(i64::MAX), Number::int(1)).unwrap_err(),
            CoreError::OutOfRange { .. }
        ));
    }

    #[test]
    fn test_mixed_operands_promote_to_float() {
        assert_eq!(
            num(NumBinOp::Add, Number::int(1), Number::float(0.5)).unwrap(),
            HostNum::Float(1.5)
        );
        assert_eq!(
            num(NumBinOp::FloorDiv, Number::float(7.5), Number::int(2)).unwrap(),
            HostNum::Float(3.0)
        );
    }

    #[test]
    fn test_comparison_folds_to_bool_constant() {
        let mut fx = FunctionBuilder::new("k");
        let v = Number::int(3)
            .binop(
                NumBinOp::Lt,
                StagedValue::Number(Number::int(5)),
                &mut fx,
            )
            .unwrap();
        assert!(matches!(v, StagedValue::Bool(_)));
        assert!(matches!(
            fx.instrs().last().map(|i| &i.op),
            Some(IrOp::ConstInt { value: 1 })
        ));
    }

    #[test]
    fn test_delegation_reaches_mirrored_op() {
        let mut fx = FunctionBuilder::new("k");
        let staged = IntValue::literal(IntType::I32, 3.0, &mut fx).unwrap();
        let out = Number::int(10)
            .binop(NumBinOp::Sub, StagedValue::Int(staged), &mut fx)
            .unwrap();
        let StagedValue::Int(out) = out else {
            panic!("expected an integer result");
        };
        assert_eq!(out.ty(), IntType::I32);
        let Some(IrOp::SubI(lhs, rhs)) = fx.instrs().last().map(|i| i.op.clone()) else {
            panic!("expected subi");
        };
        assert_ne!(lhs, staged.ir_value());
        assert_eq!(rhs, staged.ir_value());
    }

    #[test]
    fn test_delegated_comparison_is_mirrored() {
        let mut fx = FunctionBuilder::new("k");
        let staged = IntValue::literal(IntType::I32, 3.0, &mut fx).unwrap();
        Number::int(10)
            .binop(NumBinOp::Lt, StagedValue::Int(staged), &mut fx)
            .unwrap();
        assert!(matches!(
            fx.instrs().last().map(|i| &i.op),
            Some(IrOp::CmpI {
                pred: IntPredicate::Sgt,
                ..
            })
        ));
    }

    #[test]
    fn test_unary_family() {
        assert_eq!(
            Number::int(5).unop(NumUnOp::Invert).unwrap().value(),
            HostNum::Int(-6)
        );
        assert_eq!(
            Number::float(2.5).unop(NumUnOp::Round).unwrap().value(),
            HostNum::Int(2)
        );
        assert_eq!(
            Number::float(3.5).unop(NumUnOp::Round).unwrap().value(),
            HostNum::Int(4)
        );
        assert_eq!(
            Number::float(-1.5).unop(NumUnOp::Floor).unwrap().value(),
            HostNum::Int(-2)
        );
        assert!(matches!(
            Number::float(1.0).unop(NumUnOp::Invert).unwrap_err(),
            CoreError::UnsupportedOperand { .. }
        ));
        assert!(matches!(
            Number::float(f64::INFINITY).unop(NumUnOp::Trunc).unwrap_err(),
            CoreError::InvalidCast { .. }
        ));
    }

    #[test]
    fn test_number_casts_keep_exact_integers() {
        let mut fx = FunctionBuilder::new("k");
        let big = (1i64 << 60) + 1;
        let v = Number::int(big).into_int(IntType::I64, &mut fx).unwrap();
        assert_eq!(v.ty(), IntType::I64);
        assert!(matches!(
            fx.instrs().last().map(|i| &i.op),
            Some(IrOp::ConstInt { value }) if *value == big as i128
        ));
        assert!(Number::int(-1).into_index(&mut fx).is_err());
    }
}
