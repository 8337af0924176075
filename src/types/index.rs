//! The platform index value
//!
//! Index is the word-width unsigned size type. Its IR type is opaque about
//! width; literals are range-checked against the host word so staging stays
//! conservative, and the width it takes at the call boundary is decided by
//! the target configuration.

use crate::diagnostics::{CoreError, Result};
use crate::ir::{FunctionBuilder, IntPredicate, IrOp, IrType, IrValue};
use crate::types::cast::{IntoIndex, IntoInt};
use crate::types::int::{BoolValue, IntType, IntValue, Sign};
use crate::types::isclose;
use crate::types::number::{NumBinOp, Number};
use crate::types::StagedValue;

/// A staged index value.
#[derive(Debug, Clone, Copy)]
pub struct IndexValue {
    pub(crate) value: IrValue,
}

impl IndexValue {
    /// The range literals are checked against, derived from the host word
    /// width.
    pub fn val_range() -> (i128, i128) {
        IntType::new(usize::BITS, Sign::Unsigned).val_range()
    }

    pub fn ir_value(&self) -> IrValue {
        self.value
    }

    pub fn literal(value: f64, fx: &mut FunctionBuilder) -> Result<Self> {
        let rounded = value.round();
        if !isclose(value, rounded) {
            return Err(CoreError::InvalidCast {
                value: value.to_string(),
                target: "Index".to_string(),
            });
        }
        Self::const_checked(rounded as i128, fx)
    }

    pub(crate) fn const_checked(value: i128, fx: &mut FunctionBuilder) -> Result<Self> {
        let (min, max) = Self::val_range();
        if value < min || value > max {
            return Err(CoreError::OutOfRange {
                value,
                type_name: "Index".to_string(),
                min,
                max,
            });
        }
        let id = fx.emit(IrOp::ConstInt { value }, IrType::Index);
        Ok(Self { value: id })
    }

    /// Adopt an existing IR value of index type.
    pub fn from_ir(value: IrValue, fx: &FunctionBuilder) -> Result<Self> {
        match fx.value_type(value) {
            Some(IrType::Index) => Ok(Self { value }),
            Some(found) => Err(CoreError::InvalidCast {
                value: format!("a value of type {found}"),
                target: "Index".to_string(),
            }),
            None => Err(CoreError::InvalidCast {
                value: "a value from another function".to_string(),
                target: "Index".to_string(),
            }),
        }
    }

    pub fn cast(source: impl IntoIndex, fx: &mut FunctionBuilder) -> Result<Self> {
        source.into_index(fx)
    }

    fn emit_bin(self, op: IrOp, fx: &mut FunctionBuilder) -> IndexValue {
        IndexValue {
            value: fx.emit(op, IrType::Index),
        }
    }

    pub fn add(self, rhs: impl IntoIndex, fx: &mut FunctionBuilder) -> Result<IndexValue> {
        let rhs = rhs.into_index(fx)?;
        Ok(self.emit_bin(IrOp::IndexAdd(self.value, rhs.value), fx))
    }

    pub fn sub(self, rhs: impl IntoIndex, fx: &mut FunctionBuilder) -> Result<IndexValue> {
        let rhs = rhs.into_index(fx)?;
        Ok(self.emit_bin(IrOp::IndexSub(self.value, rhs.value), fx))
    }

    /// Reversed subtraction: `lhs - self`.
    pub fn rsub(self, lhs: impl IntoIndex, fx: &mut FunctionBuilder) -> Result<IndexValue> {
        let lhs = lhs.into_index(fx)?;
        Ok(self.emit_bin(IrOp::IndexSub(lhs.value, self.value), fx))
    }

    pub fn mul(self, rhs: impl IntoIndex, fx: &mut FunctionBuilder) -> Result<IndexValue> {
        let rhs = rhs.into_index(fx)?;
        Ok(self.emit_bin(IrOp::IndexMul(self.value, rhs.value), fx))
    }

    pub fn truediv(self, _rhs: impl IntoIndex, _fx: &mut FunctionBuilder) -> Result<IndexValue> {
        Err(CoreError::Unimplemented {
            what: "division on Index",
        })
    }

    pub fn floordiv(self, _rhs: impl IntoIndex, _fx: &mut FunctionBuilder) -> Result<IndexValue> {
        Err(CoreError::Unimplemented {
            what: "floor division on Index",
        })
    }

    fn compare(
        self,
        pred: IntPredicate,
        rhs: impl IntoIndex,
        fx: &mut FunctionBuilder,
    ) -> Result<BoolValue> {
        let rhs = rhs.into_index(fx)?;
        let value = fx.emit(
            IrOp::CmpI {
                pred,
                lhs: self.value,
                rhs: rhs.value,
            },
            IrType::BOOL,
        );
        Ok(BoolValue::wrap(value))
    }

    pub fn lt(self, rhs: impl IntoIndex, fx: &mut FunctionBuilder) -> Result<BoolValue> {
        self.compare(IntPredicate::Ult, rhs, fx)
    }

    pub fn le(self, rhs: impl IntoIndex, fx: &mut FunctionBuilder) -> Result<BoolValue> {
        self.compare(IntPredicate::Ule, rhs, fx)
    }

    pub fn gt(self, rhs: impl IntoIndex, fx: &mut FunctionBuilder) -> Result<BoolValue> {
        self.compare(IntPredicate::Ugt, rhs, fx)
    }

    pub fn ge(self, rhs: impl IntoIndex, fx: &mut FunctionBuilder) -> Result<BoolValue> {
        self.compare(IntPredicate::Uge, rhs, fx)
    }

    pub fn eq(self, rhs: impl IntoIndex, fx: &mut FunctionBuilder) -> Result<BoolValue> {
        self.compare(IntPredicate::Eq, rhs, fx)
    }

    pub fn ne(self, rhs: impl IntoIndex, fx: &mut FunctionBuilder) -> Result<BoolValue> {
        self.compare(IntPredicate::Ne, rhs, fx)
    }

    /// Mirrored dispatch for `Number <op> IndexValue`.
    pub(crate) fn reflected(
        self,
        op: NumBinOp,
        lhs: Number,
        fx: &mut FunctionBuilder,
    ) -> Result<StagedValue> {
        match op {
            NumBinOp::Add => self.add(lhs, fx).map(StagedValue::Index),
            NumBinOp::Sub => self.rsub(lhs, fx).map(StagedValue::Index),
            NumBinOp::Mul => self.mul(lhs, fx).map(StagedValue::Index),
            NumBinOp::TrueDiv => Err(CoreError::Unimplemented {
                what: "division on Index",
            }),
            NumBinOp::FloorDiv => Err(CoreError::Unimplemented {
                what: "floor division on Index",
            }),
            NumBinOp::Lt => self.gt(lhs, fx).map(StagedValue::Bool),
            NumBinOp::Le => self.ge(lhs, fx).map(StagedValue::Bool),
            NumBinOp::Gt => self.lt(lhs, fx).map(StagedValue::Bool),
            NumBinOp::Ge => self.le(lhs, fx).map(StagedValue::Bool),
            NumBinOp::Eq => self.eq(lhs, fx).map(StagedValue::Bool),
            NumBinOp::Ne => self.ne(lhs, fx).map(StagedValue::Bool),
            _ => Err(CoreError::UnsupportedOperand {
                op: op.symbol(),
                operand: "Index".to_string(),
            }),
        }
    }
}

impl IntoIndex for IndexValue {
    fn into_index(self, _fx: &mut FunctionBuilder) -> Result<IndexValue> {
        Ok(self)
    }
}

impl IntoInt for IndexValue {
    /// Index narrows or widens into unsigned integers only.
    fn into_int(self, target: IntType, fx: &mut FunctionBuilder) -> Result<IntValue> {
        target.check_declared()?;
        if target.sign != Sign::Unsigned {
            return Err(CoreError::SignChangingCast {
                from_type: "Index".to_string(),
                to_type: target.name(),
            });
        }
        let value = fx.emit(IrOp::IndexCastU(self.value), target.ir_type());
        Ok(IntValue { ty: target, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_is_word_ranged() {
        let mut fx = FunctionBuilder::new("k");
        let v = IndexValue::literal(0.0, &mut fx).unwrap();
        assert_eq!(fx.value_type(v.ir_value()), Some(IrType::Index));
        assert!(matches!(
            IndexValue::literal(-1.0, &mut fx).unwrap_err(),
            CoreError::OutOfRange { .. }
        ));
        assert!(matches!(
            IndexValue::literal(2.5, &mut fx).unwrap_err(),
            CoreError::InvalidCast { .. }
        ));
    }

    #[test]
    fn test_arithmetic_uses_index_ops() {
        let mut fx = FunctionBuilder::new("k");
        let a = IndexValue::literal(4.0, &mut fx).unwrap();
        a.add(3i64, &mut fx).unwrap();
        assert!(matches!(
            fx.instrs().last().map(|i| &i.op),
            Some(IrOp::IndexAdd(..))
        ));
        a.mul(2i64, &mut fx).unwrap();
        assert!(matches!(
            fx.instrs().last().map(|i| &i.op),
            Some(IrOp::IndexMul(..))
        ));
    }

    #[test]
    fn test_division_unimplemented_both_ways() {
        let mut fx = FunctionBuilder::new("k");
        let a = IndexValue::literal(4.0, &mut fx).unwrap();
        assert!(matches!(
            a.truediv(2i64, &mut fx).unwrap_err(),
            CoreError::Unimplemented { .. }
        ));
        assert!(matches!(
            a.floordiv(2i64, &mut fx).unwrap_err(),
            CoreError::Unimplemented { .. }
        ));
    }

    #[test]
    fn test_cast_to_unsigned_int_only() {
        let mut fx = FunctionBuilder::new("k");
        let a = IndexValue::literal(4.0, &mut fx).unwrap();
        let u = IntValue::cast(IntType::U32, a, &mut fx).unwrap();
        assert_eq!(u.ty(), IntType::U32);
        assert!(matches!(
            fx.instrs().last().map(|i| &i.op),
            Some(IrOp::IndexCastU(_))
        ));
        assert!(matches!(
            IntValue::cast(IntType::I32, a, &mut fx).unwrap_err(),
            CoreError::SignChangingCast { .. }
        ));
    }

    #[test]
    fn test_comparisons_are_unsigned() {
        let mut fx = FunctionBuilder::new("k");
        let a = IndexValue::literal(4.0, &mut fx).unwrap();
        a.lt(9i64, &mut fx).unwrap();
        assert!(matches!(
            fx.instrs().last().map(|i| &i.op),
            Some(IrOp::CmpI {
                pred: IntPredicate::Ult,
                ..
            })
        ));
    }

    #[test]
    fn test_adoption_requires_index_type() {
        let mut fx = FunctionBuilder::new("k");
        let p = fx.add_param("n", IrType::Index);
        assert!(IndexValue::from_ir(p, &fx).is_ok());
        let q = fx.add_param("m", IrType::int(32));
        assert!(matches!(
            IndexValue::from_ir(q, &fx).unwrap_err(),
            CoreError::InvalidCast { .. }
        ));
    }
}
