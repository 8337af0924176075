//! Fixed-width integers and the boolean value
//!
//! Widths and signedness live in [`IntType`] descriptors; the IR only sees
//! signless integers, so sign decides which op a lowering picks (extension,
//! division, comparison predicates) rather than which type it runs on.
//! [`BoolValue`] is the width-1 unsigned integer with the connectives layered
//! on top.

use crate::diagnostics::{CoreError, Result};
use crate::ir::{FunctionBuilder, IntPredicate, IrOp, IrType, IrValue, Signedness};
use crate::types::cast::{IntoBool, IntoFloat, IntoInt};
use crate::types::float::{FloatType, FloatValue};
use crate::types::isclose;
use crate::types::number::{NumBinOp, Number};
use crate::types::StagedValue;

/// Signedness of a declared integer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    Signed,
    Unsigned,
}

/// Descriptor of a fixed-width integer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntType {
    pub width: u32,
    pub sign: Sign,
}

impl IntType {
    pub const fn new(width: u32, sign: Sign) -> Self {
        Self { width, sign }
    }

    pub const I8: IntType = IntType::new(8, Sign::Signed);
    pub const I16: IntType = IntType::new(16, Sign::Signed);
    pub const I32: IntType = IntType::new(32, Sign::Signed);
    pub const I64: IntType = IntType::new(64, Sign::Signed);
    pub const U8: IntType = IntType::new(8, Sign::Unsigned);
    pub const U16: IntType = IntType::new(16, Sign::Unsigned);
    pub const U32: IntType = IntType::new(32, Sign::Unsigned);
    pub const U64: IntType = IntType::new(64, Sign::Unsigned);
    /// The boolean type is the width-1 unsigned integer.
    pub const BOOL: IntType = IntType::new(1, Sign::Unsigned);

    pub fn name(&self) -> String {
        match (self.sign, self.width) {
            (Sign::Unsigned, 1) => "Bool".to_string(),
            (Sign::Signed, w) => format!("SInt{w}"),
            (Sign::Unsigned, w) => format!("UInt{w}"),
        }
    }

    /// The signless IR integer type of this width.
    pub fn ir_type(&self) -> IrType {
        IrType::int(self.width)
    }

    /// A width of zero means the bare integer family was used where a
    /// concrete declared type is required.
    pub fn check_declared(&self) -> Result<()> {
        if self.width == 0 {
            return Err(CoreError::UndeclaredType {
                type_name: "Int".to_string(),
            });
        }
        Ok(())
    }

    /// Inclusive range a literal of this type accepts. The unsigned upper
    /// bound stops one short of the type's maximum.
    pub fn val_range(&self) -> (i128, i128) {
        // Widths beyond 126 bits saturate; nothing with an ABI mapping gets
        // near them.
        let w = self.width.min(126);
        match self.sign {
            Sign::Signed => {
                let half = 1i128 << w.saturating_sub(1);
                (-half, half - 1)
            }
            Sign::Unsigned => (0, (1i128 << w) - 2),
        }
    }

    /// Native scalar carrying this type across the call boundary.
    pub fn abi_scalar(&self) -> Result<crate::abi::AbiScalar> {
        use crate::abi::AbiScalar;
        self.check_declared()?;
        let scalar = match (self.sign, self.width) {
            (_, 1) => AbiScalar::Bool,
            (Sign::Signed, 8) => AbiScalar::I8,
            (Sign::Signed, 16) => AbiScalar::I16,
            (Sign::Signed, 32) => AbiScalar::I32,
            (Sign::Signed, 64) => AbiScalar::I64,
            (Sign::Unsigned, 8) => AbiScalar::U8,
            (Sign::Unsigned, 16) => AbiScalar::U16,
            (Sign::Unsigned, 32) => AbiScalar::U32,
            (Sign::Unsigned, 64) => AbiScalar::U64,
            _ => {
                return Err(CoreError::NoAbiMapping {
                    type_name: self.name(),
                });
            }
        };
        Ok(scalar)
    }
}

/// A staged integer value of a declared width and sign.
#[derive(Debug, Clone, Copy)]
pub struct IntValue {
    pub(crate) ty: IntType,
    pub(crate) value: IrValue,
}

impl IntValue {
    pub fn ty(&self) -> IntType {
        self.ty
    }

    pub fn ir_value(&self) -> IrValue {
        self.value
    }

    /// Emit a constant from a host real. The value must denote an integer
    /// (up to relative tolerance) and fit the declared range.
    pub fn literal(ty: IntType, value: f64, fx: &mut FunctionBuilder) -> Result<Self> {
        ty.check_declared()?;
        let rounded = value.round();
        if !isclose(value, rounded) {
            return Err(CoreError::InvalidCast {
                value: value.to_string(),
                target: ty.name(),
            });
        }
        Self::const_checked(ty, rounded as i128, fx)
    }

    /// Exact-integer constant path; skips the tolerance gate.
    pub(crate) fn const_checked(ty: IntType, value: i128, fx: &mut FunctionBuilder) -> Result<Self> {
        ty.check_declared()?;
        let (min, max) = ty.val_range();
        if value < min || value > max {
            return Err(CoreError::OutOfRange {
                value,
                type_name: ty.name(),
                min,
                max,
            });
        }
        let id = fx.emit(IrOp::ConstInt { value }, ty.ir_type());
        Ok(Self { ty, value: id })
    }

    /// Adopt an existing IR value, e.g. a function parameter. Only a
    /// signless integer of exactly the declared width qualifies.
    pub fn from_ir(ty: IntType, value: IrValue, fx: &FunctionBuilder) -> Result<Self> {
        ty.check_declared()?;
        let Some(found) = fx.value_type(value) else {
            return Err(CoreError::InvalidCast {
                value: "a value from another function".to_string(),
                target: ty.name(),
            });
        };
        match found {
            IrType::Int { width, .. } if width != ty.width => Err(CoreError::WidthMismatch {
                type_name: ty.name(),
                expected: ty.width,
                found: width,
            }),
            IrType::Int { signedness, .. } if signedness != Signedness::Signless => {
                Err(CoreError::NotSignless {
                    type_name: ty.name(),
                    found: found.to_string(),
                })
            }
            IrType::Int { .. } => Ok(Self { ty, value }),
            other => Err(CoreError::InvalidCast {
                value: format!("a value of type {other}"),
                target: ty.name(),
            }),
        }
    }

    /// Cast entry point: `IntValue::cast(ty, x, fx)` accepts anything that
    /// can become an integer.
    pub fn cast(target: IntType, source: impl IntoInt, fx: &mut FunctionBuilder) -> Result<Self> {
        source.into_int(target, fx)
    }

    fn emit_bin(self, op: IrOp, fx: &mut FunctionBuilder) -> IntValue {
        IntValue {
            ty: self.ty,
            value: fx.emit(op, self.ty.ir_type()),
        }
    }

    pub fn add(self, rhs: impl IntoInt, fx: &mut FunctionBuilder) -> Result<IntValue> {
        let rhs = rhs.into_int(self.ty, fx)?;
        Ok(self.emit_bin(IrOp::AddI(self.value, rhs.value), fx))
    }

    pub fn sub(self, rhs: impl IntoInt, fx: &mut FunctionBuilder) -> Result<IntValue> {
        let rhs = rhs.into_int(self.ty, fx)?;
        Ok(self.emit_bin(IrOp::SubI(self.value, rhs.value), fx))
    }

    /// Reversed subtraction: `lhs - self`.
    pub fn rsub(self, lhs: impl IntoInt, fx: &mut FunctionBuilder) -> Result<IntValue> {
        let lhs = lhs.into_int(self.ty, fx)?;
        Ok(self.emit_bin(IrOp::SubI(lhs.value, self.value), fx))
    }

    pub fn mul(self, rhs: impl IntoInt, fx: &mut FunctionBuilder) -> Result<IntValue> {
        let rhs = rhs.into_int(self.ty, fx)?;
        Ok(self.emit_bin(IrOp::MulI(self.value, rhs.value), fx))
    }

    /// Floor division lowers by sign: signed floor division or plain
    /// unsigned division.
    pub fn floordiv(self, rhs: impl IntoInt, fx: &mut FunctionBuilder) -> Result<IntValue> {
        let rhs = rhs.into_int(self.ty, fx)?;
        let op = match self.ty.sign {
            Sign::Signed => IrOp::FloorDivSI(self.value, rhs.value),
            Sign::Unsigned => IrOp::DivUI(self.value, rhs.value),
        };
        Ok(self.emit_bin(op, fx))
    }

    /// Reversed floor division: `lhs // self`.
    pub fn rfloordiv(self, lhs: impl IntoInt, fx: &mut FunctionBuilder) -> Result<IntValue> {
        let lhs = lhs.into_int(self.ty, fx)?;
        let op = match self.ty.sign {
            Sign::Signed => IrOp::FloorDivSI(lhs.value, self.value),
            Sign::Unsigned => IrOp::DivUI(lhs.value, self.value),
        };
        Ok(self.emit_bin(op, fx))
    }

    pub fn truediv(self, _rhs: impl IntoInt, _fx: &mut FunctionBuilder) -> Result<FloatValue> {
        Err(CoreError::Unimplemented {
            what: "true division on Int",
        })
    }

    pub fn reinterpret(self, _target: IntType) -> Result<IntValue> {
        Err(CoreError::Unimplemented {
            what: "integer sign reinterpretation",
        })
    }

    fn compare(
        self,
        signed: IntPredicate,
        unsigned: IntPredicate,
        rhs: impl IntoInt,
        fx: &mut FunctionBuilder,
    ) -> Result<BoolValue> {
        let rhs = rhs.into_int(self.ty, fx)?;
        let pred = match self.ty.sign {
            Sign::Signed => signed,
            Sign::Unsigned => unsigned,
        };
        let value = fx.emit(
            IrOp::CmpI {
                pred,
                lhs: self.value,
                rhs: rhs.value,
            },
            IrType::BOOL,
        );
        Ok(BoolValue { value })
    }

    pub fn lt(self, rhs: impl IntoInt, fx: &mut FunctionBuilder) -> Result<BoolValue> {
        self.compare(IntPredicate::Slt, IntPredicate::Ult, rhs, fx)
    }

    pub fn le(self, rhs: impl IntoInt, fx: &mut FunctionBuilder) -> Result<BoolValue> {
        self.compare(IntPredicate::Sle, IntPredicate::Ule, rhs, fx)
    }

    pub fn gt(self, rhs: impl IntoInt, fx: &mut FunctionBuilder) -> Result<BoolValue> {
        self.compare(IntPredicate::Sgt, IntPredicate::Ugt, rhs, fx)
    }

    pub fn ge(self, rhs: impl IntoInt, fx: &mut FunctionBuilder) -> Result<BoolValue> {
        self.compare(IntPredicate::Sge, IntPredicate::Uge, rhs, fx)
    }

    pub fn eq(self, rhs: impl IntoInt, fx: &mut FunctionBuilder) -> Result<BoolValue> {
        self.compare(IntPredicate::Eq, IntPredicate::Eq, rhs, fx)
    }

    pub fn ne(self, rhs: impl IntoInt, fx: &mut FunctionBuilder) -> Result<BoolValue> {
        self.compare(IntPredicate::Ne, IntPredicate::Ne, rhs, fx)
    }

    /// Mirrored dispatch for `Number <op> IntValue`: the number lands on the
    /// reversed operation of the concrete side.
    pub(crate) fn reflected(
        self,
        op: NumBinOp,
        lhs: Number,
        fx: &mut FunctionBuilder,
    ) -> Result<StagedValue> {
        match op {
            NumBinOp::Add => self.add(lhs, fx).map(StagedValue::Int),
            NumBinOp::Sub => self.rsub(lhs, fx).map(StagedValue::Int),
            NumBinOp::Mul => self.mul(lhs, fx).map(StagedValue::Int),
            NumBinOp::TrueDiv => Err(CoreError::Unimplemented {
                what: "true division on Int",
            }),
            NumBinOp::FloorDiv => self.rfloordiv(lhs, fx).map(StagedValue::Int),
            NumBinOp::Lt => self.gt(lhs, fx).map(StagedValue::Bool),
            NumBinOp::Le => self.ge(lhs, fx).map(StagedValue::Bool),
            NumBinOp::Gt => self.lt(lhs, fx).map(StagedValue::Bool),
            NumBinOp::Ge => self.le(lhs, fx).map(StagedValue::Bool),
            NumBinOp::Eq => self.eq(lhs, fx).map(StagedValue::Bool),
            NumBinOp::Ne => self.ne(lhs, fx).map(StagedValue::Bool),
            _ => Err(CoreError::UnsupportedOperand {
                op: op.symbol(),
                operand: self.ty.name(),
            }),
        }
    }
}

impl IntoInt for IntValue {
    /// Integer-to-integer casts only widen within one sign. Equal width
    /// adopts the value without emitting anything.
    fn into_int(self, target: IntType, fx: &mut FunctionBuilder) -> Result<IntValue> {
        target.check_declared()?;
        if self.ty.sign != target.sign {
            return Err(CoreError::SignChangingCast {
                from_type: self.ty.name(),
                to_type: target.name(),
            });
        }
        if target.width < self.ty.width {
            return Err(CoreError::NarrowingCast {
                from_type: self.ty.name(),
                to_type: target.name(),
            });
        }
        if target.width == self.ty.width {
            return Ok(IntValue {
                ty: target,
                value: self.value,
            });
        }
        let op = match self.ty.sign {
            Sign::Signed => IrOp::ExtSI(self.value),
            Sign::Unsigned => IrOp::ExtUI(self.value),
        };
        Ok(IntValue {
            ty: target,
            value: fx.emit(op, target.ir_type()),
        })
    }
}

impl IntoFloat for IntValue {
    fn into_float(self, target: FloatType, fx: &mut FunctionBuilder) -> Result<FloatValue> {
        let ty = target.ir_type()?;
        let op = match self.ty.sign {
            Sign::Signed => IrOp::SiToFp(self.value),
            Sign::Unsigned => IrOp::UiToFp(self.value),
        };
        Ok(FloatValue::from_parts(target, fx.emit(op, ty)))
    }
}

/// A staged boolean, i.e. a width-1 unsigned integer.
#[derive(Debug, Clone, Copy)]
pub struct BoolValue {
    pub(crate) value: IrValue,
}

impl BoolValue {
    pub const TYPE: IntType = IntType::BOOL;

    pub(crate) fn wrap(value: IrValue) -> Self {
        Self { value }
    }

    pub fn ir_value(&self) -> IrValue {
        self.value
    }

    pub fn literal(value: bool, fx: &mut FunctionBuilder) -> Self {
        let id = fx.emit(
            IrOp::ConstInt {
                value: value as i128,
            },
            IrType::BOOL,
        );
        Self { value: id }
    }

    pub fn from_ir(value: IrValue, fx: &FunctionBuilder) -> Result<Self> {
        let v = IntValue::from_ir(Self::TYPE, value, fx)?;
        Ok(Self { value: v.value })
    }

    pub fn cast(source: impl IntoBool, fx: &mut FunctionBuilder) -> Result<Self> {
        source.into_bool(fx)
    }

    /// View as the underlying width-1 integer.
    pub fn as_int(self) -> IntValue {
        IntValue {
            ty: Self::TYPE,
            value: self.value,
        }
    }

    pub fn and(self, rhs: impl IntoBool, fx: &mut FunctionBuilder) -> Result<BoolValue> {
        let rhs = rhs.into_bool(fx)?;
        Ok(Self::wrap(fx.emit(
            IrOp::AndI(self.value, rhs.value),
            IrType::BOOL,
        )))
    }

    pub fn or(self, rhs: impl IntoBool, fx: &mut FunctionBuilder) -> Result<BoolValue> {
        let rhs = rhs.into_bool(fx)?;
        Ok(Self::wrap(fx.emit(
            IrOp::OrI(self.value, rhs.value),
            IrType::BOOL,
        )))
    }

    /// Negation has no single IR op; it lowers to select(cond, 0, 1).
    pub fn not(self, fx: &mut FunctionBuilder) -> BoolValue {
        let zero = fx.emit(IrOp::ConstInt { value: 0 }, IrType::BOOL);
        let one = fx.emit(IrOp::ConstInt { value: 1 }, IrType::BOOL);
        Self::wrap(fx.emit(
            IrOp::Select {
                cond: self.value,
                then_value: zero,
                else_value: one,
            },
            IrType::BOOL,
        ))
    }

    pub(crate) fn reflected(
        self,
        op: NumBinOp,
        lhs: Number,
        fx: &mut FunctionBuilder,
    ) -> Result<StagedValue> {
        self.as_int().reflected(op, lhs, fx)
    }
}

impl IntoBool for BoolValue {
    fn into_bool(self, _fx: &mut FunctionBuilder) -> Result<BoolValue> {
        Ok(self)
    }
}

impl IntoInt for BoolValue {
    fn into_int(self, target: IntType, fx: &mut FunctionBuilder) -> Result<IntValue> {
        self.as_int().into_int(target, fx)
    }
}

impl IntoFloat for BoolValue {
    fn into_float(self, target: FloatType, fx: &mut FunctionBuilder) -> Result<FloatValue> {
        self.as_int().into_float(target, fx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsigned_range_stops_one_short() {
        assert_eq!(IntType::U8.val_range(), (0, 254));
        assert_eq!(IntType::I8.val_range(), (-128, 127));
        let mut fx = FunctionBuilder::new("k");
        assert!(IntValue::literal(IntType::U8, 254.0, &mut fx).is_ok());
        let err = IntValue::literal(IntType::U8, 255.0, &mut fx).unwrap_err();
        assert!(matches!(err, CoreError::OutOfRange { max: 254, .. }));
        let err = IntValue::literal(IntType::U8, -1.0, &mut fx).unwrap_err();
        assert!(matches!(err, CoreError::OutOfRange { .. }));
    }

    #[test]
    fn test_literal_requires_integral_real() {
        let mut fx = FunctionBuilder::new("k");
        assert!(IntValue::literal(IntType::I32, 5.0000000001, &mut fx).is_ok());
        let err = IntValue::literal(IntType::I32, 5.5, &mut fx).unwrap_err();
        assert!(matches!(err, CoreError::InvalidCast { .. }));
        assert!(IntValue::literal(IntType::I32, f64::NAN, &mut fx).is_err());
    }

    #[test]
    fn test_undeclared_width_rejected() {
        let mut fx = FunctionBuilder::new("k");
        let bare = IntType::new(0, Sign::Signed);
        let err = IntValue::literal(bare, 1.0, &mut fx).unwrap_err();
        assert!(matches!(err, CoreError::UndeclaredType { .. }));
    }

    #[test]
    fn test_adoption_needs_signless_matching_width() {
        let mut fx = FunctionBuilder::new("k");
        let p32 = fx.add_param("a", IrType::int(32));
        let p64 = fx.add_param("b", IrType::int(64));
        let pu = fx.add_param(
            "c",
            IrType::Int {
                width: 32,
                signedness: Signedness::Unsigned,
            },
        );
        let pf = fx.add_param("d", IrType::F64);

        assert!(IntValue::from_ir(IntType::I32, p32, &fx).is_ok());
        assert!(matches!(
            IntValue::from_ir(IntType::I32, p64, &fx).unwrap_err(),
            CoreError::WidthMismatch {
                expected: 32,
                found: 64,
                ..
            }
        ));
        assert!(matches!(
            IntValue::from_ir(IntType::I32, pu, &fx).unwrap_err(),
            CoreError::NotSignless { .. }
        ));
        assert!(matches!(
            IntValue::from_ir(IntType::I32, pf, &fx).unwrap_err(),
            CoreError::InvalidCast { .. }
        ));
    }

    #[test]
    fn test_int_cast_widens_within_sign() {
        let mut fx = FunctionBuilder::new("k");
        let a = IntValue::literal(IntType::I8, 5.0, &mut fx).unwrap();
        let wide = IntValue::cast(IntType::I32, a, &mut fx).unwrap();
        assert_eq!(wide.ty(), IntType::I32);
        assert!(matches!(
            fx.instrs().last().map(|i| &i.op),
            Some(IrOp::ExtSI(_))
        ));

        let u = IntValue::literal(IntType::U8, 5.0, &mut fx).unwrap();
        IntValue::cast(IntType::U32, u, &mut fx).unwrap();
        assert!(matches!(
            fx.instrs().last().map(|i| &i.op),
            Some(IrOp::ExtUI(_))
        ));

        let before = fx.instrs().len();
        let same = IntValue::cast(IntType::I8, a, &mut fx).unwrap();
        assert_eq!(fx.instrs().len(), before);
        assert_eq!(same.ir_value(), a.ir_value());

        assert!(matches!(
            IntValue::cast(IntType::I8, wide, &mut fx).unwrap_err(),
            CoreError::NarrowingCast { .. }
        ));
        assert!(matches!(
            IntValue::cast(IntType::U8, a, &mut fx).unwrap_err(),
            CoreError::SignChangingCast { .. }
        ));
    }

    #[test]
    fn test_floordiv_lowering_depends_on_sign() {
        let mut fx = FunctionBuilder::new("k");
        let s = IntValue::literal(IntType::I32, 7.0, &mut fx).unwrap();
        s.floordiv(2i64, &mut fx).unwrap();
        assert!(matches!(
            fx.instrs().last().map(|i| &i.op),
            Some(IrOp::FloorDivSI(..))
        ));

        let u = IntValue::literal(IntType::U32, 7.0, &mut fx).unwrap();
        u.floordiv(2i64, &mut fx).unwrap();
        assert!(matches!(
            fx.instrs().last().map(|i| &i.op),
            Some(IrOp::DivUI(..))
        ));
    }

    #[test]
    fn test_comparison_predicates_depend_on_sign() {
        let mut fx = FunctionBuilder::new("k");
        let s = IntValue::literal(IntType::I32, 1.0, &mut fx).unwrap();
        s.lt(2i64, &mut fx).unwrap();
        assert!(matches!(
            fx.instrs().last().map(|i| &i.op),
            Some(IrOp::CmpI {
                pred: IntPredicate::Slt,
                ..
            })
        ));

        let u = IntValue::literal(IntType::U32, 1.0, &mut fx).unwrap();
        u.lt(2i64, &mut fx).unwrap();
        assert!(matches!(
            fx.instrs().last().map(|i| &i.op),
            Some(IrOp::CmpI {
                pred: IntPredicate::Ult,
                ..
            })
        ));
    }

    #[test]
    fn test_int_truediv_unimplemented() {
        let mut fx = FunctionBuilder::new("k");
        let a = IntValue::literal(IntType::I32, 1.0, &mut fx).unwrap();
        assert!(matches!(
            a.truediv(2i64, &mut fx).unwrap_err(),
            CoreError::Unimplemented { .. }
        ));
        assert!(matches!(
            a.reinterpret(IntType::U32).unwrap_err(),
            CoreError::Unimplemented { .. }
        ));
    }

    #[test]
    fn test_int_to_float_by_sign() {
        let mut fx = FunctionBuilder::new("k");
        let s = IntValue::literal(IntType::I32, 3.0, &mut fx).unwrap();
        let f = FloatValue::cast(FloatType::F64, s, &mut fx).unwrap();
        assert_eq!(f.ty(), FloatType::F64);
        assert!(matches!(
            fx.instrs().last().map(|i| &i.op),
            Some(IrOp::SiToFp(_))
        ));

        let u = IntValue::literal(IntType::U32, 3.0, &mut fx).unwrap();
        FloatValue::cast(FloatType::F32, u, &mut fx).unwrap();
        assert!(matches!(
            fx.instrs().last().map(|i| &i.op),
            Some(IrOp::UiToFp(_))
        ));
    }

    #[test]
    fn test_bool_connectives() {
        let mut fx = FunctionBuilder::new("k");
        let t = BoolValue::literal(true, &mut fx);
        let f = BoolValue::literal(false, &mut fx);
        t.and(f, &mut fx).unwrap();
        assert!(matches!(
            fx.instrs().last().map(|i| &i.op),
            Some(IrOp::AndI(..))
        ));
        t.or(f, &mut fx).unwrap();
        assert!(matches!(
            fx.instrs().last().map(|i| &i.op),
            Some(IrOp::OrI(..))
        ));
        t.not(&mut fx);
        assert!(matches!(
            fx.instrs().last().map(|i| &i.op),
            Some(IrOp::Select { .. })
        ));
    }

    #[test]
    fn test_bool_widens_as_unsigned() {
        let mut fx = FunctionBuilder::new("k");
        let b = BoolValue::literal(true, &mut fx);
        let wide = IntValue::cast(IntType::U32, b, &mut fx).unwrap();
        assert_eq!(wide.ty(), IntType::U32);
        assert!(matches!(
            fx.instrs().last().map(|i| &i.op),
            Some(IrOp::ExtUI(_))
        ));
        assert!(matches!(
            IntValue::cast(IntType::I32, b, &mut fx).unwrap_err(),
            CoreError::SignChangingCast { .. }
        ));
    }
}
