//! Floating-point values
//!
//! Three widths exist at the IR level (f16, f32, f64), but only f32 and f64
//! have a native scalar at the call boundary; f16 values can be staged and
//! computed with, never marshalled.

use crate::abi::AbiScalar;
use crate::diagnostics::{CoreError, Result};
use crate::ir::{FloatPredicate, FunctionBuilder, IrOp, IrType, IrValue};
use crate::types::cast::IntoFloat;
use crate::types::int::BoolValue;
use crate::types::number::{NumBinOp, Number};
use crate::types::StagedValue;

/// Descriptor of a floating-point type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FloatType {
    pub width: u32,
}

impl FloatType {
    pub const F16: FloatType = FloatType { width: 16 };
    pub const F32: FloatType = FloatType { width: 32 };
    pub const F64: FloatType = FloatType { width: 64 };

    pub fn name(&self) -> String {
        match self.width {
            16 => "F16".to_string(),
            32 => "F32".to_string(),
            64 => "F64".to_string(),
            w => format!("Float{w}"),
        }
    }

    pub fn ir_type(&self) -> Result<IrType> {
        match self.width {
            16 => Ok(IrType::F16),
            32 => Ok(IrType::F32),
            64 => Ok(IrType::F64),
            _ => Err(CoreError::UndeclaredType {
                type_name: "Float".to_string(),
            }),
        }
    }

    pub fn check_declared(&self) -> Result<()> {
        self.ir_type().map(|_| ())
    }

    /// Native scalar carrying this type across the call boundary. The
    /// half-width float has none.
    pub fn abi_scalar(&self) -> Result<AbiScalar> {
        self.check_declared()?;
        match self.width {
            32 => Ok(AbiScalar::F32),
            64 => Ok(AbiScalar::F64),
            _ => Err(CoreError::NoAbiMapping {
                type_name: self.name(),
            }),
        }
    }
}

/// A staged floating-point value.
#[derive(Debug, Clone, Copy)]
pub struct FloatValue {
    pub(crate) ty: FloatType,
    pub(crate) value: IrValue,
}

impl FloatValue {
    pub(crate) fn from_parts(ty: FloatType, value: IrValue) -> Self {
        Self { ty, value }
    }

    pub fn ty(&self) -> FloatType {
        self.ty
    }

    pub fn ir_value(&self) -> IrValue {
        self.value
    }

    /// Emit a constant. Any host real is admissible; range never applies.
    pub fn literal(ty: FloatType, value: f64, fx: &mut FunctionBuilder) -> Result<Self> {
        let ir_ty = ty.ir_type()?;
        let id = fx.emit(IrOp::ConstFloat { value }, ir_ty);
        Ok(Self { ty, value: id })
    }

    /// Adopt an existing IR value of exactly this float type.
    pub fn from_ir(ty: FloatType, value: IrValue, fx: &FunctionBuilder) -> Result<Self> {
        let ir_ty = ty.ir_type()?;
        match fx.value_type(value) {
            Some(found) if found == ir_ty => Ok(Self { ty, value }),
            Some(found) => Err(CoreError::InvalidCast {
                value: format!("a value of type {found}"),
                target: ty.name(),
            }),
            None => Err(CoreError::InvalidCast {
                value: "a value from another function".to_string(),
                target: ty.name(),
            }),
        }
    }

    pub fn cast(target: FloatType, source: impl IntoFloat, fx: &mut FunctionBuilder) -> Result<Self> {
        source.into_float(target, fx)
    }

    fn emit_bin(self, op: IrOp, fx: &mut FunctionBuilder) -> Result<FloatValue> {
        let ty = self.ty.ir_type()?;
        Ok(FloatValue {
            ty: self.ty,
            value: fx.emit(op, ty),
        })
    }

    pub fn add(self, rhs: impl IntoFloat, fx: &mut FunctionBuilder) -> Result<FloatValue> {
        let rhs = rhs.into_float(self.ty, fx)?;
        self.emit_bin(IrOp::AddF(self.value, rhs.value), fx)
    }

    pub fn sub(self, rhs: impl IntoFloat, fx: &mut FunctionBuilder) -> Result<FloatValue> {
        let rhs = rhs.into_float(self.ty, fx)?;
        self.emit_bin(IrOp::SubF(self.value, rhs.value), fx)
    }

    /// Reversed subtraction: `lhs - self`.
    pub fn rsub(self, lhs: impl IntoFloat, fx: &mut FunctionBuilder) -> Result<FloatValue> {
        let lhs = lhs.into_float(self.ty, fx)?;
        self.emit_bin(IrOp::SubF(lhs.value, self.value), fx)
    }

    pub fn mul(self, rhs: impl IntoFloat, fx: &mut FunctionBuilder) -> Result<FloatValue> {
        let rhs = rhs.into_float(self.ty, fx)?;
        self.emit_bin(IrOp::MulF(self.value, rhs.value), fx)
    }

    pub fn div(self, rhs: impl IntoFloat, fx: &mut FunctionBuilder) -> Result<FloatValue> {
        let rhs = rhs.into_float(self.ty, fx)?;
        self.emit_bin(IrOp::DivF(self.value, rhs.value), fx)
    }

    /// Reversed division: `lhs / self`.
    pub fn rdiv(self, lhs: impl IntoFloat, fx: &mut FunctionBuilder) -> Result<FloatValue> {
        let lhs = lhs.into_float(self.ty, fx)?;
        self.emit_bin(IrOp::DivF(lhs.value, self.value), fx)
    }

    pub fn neg(self, fx: &mut FunctionBuilder) -> Result<FloatValue> {
        self.emit_bin(IrOp::NegF(self.value), fx)
    }

    pub fn powf(self, rhs: impl IntoFloat, fx: &mut FunctionBuilder) -> Result<FloatValue> {
        let rhs = rhs.into_float(self.ty, fx)?;
        self.emit_bin(IrOp::PowF(self.value, rhs.value), fx)
    }

    pub fn floordiv(self, _rhs: impl IntoFloat, _fx: &mut FunctionBuilder) -> Result<FloatValue> {
        Err(CoreError::Unimplemented {
            what: "floor division on Float",
        })
    }

    fn compare(
        self,
        pred: FloatPredicate,
        rhs: impl IntoFloat,
        fx: &mut FunctionBuilder,
    ) -> Result<BoolValue> {
        let rhs = rhs.into_float(self.ty, fx)?;
        let value = fx.emit(
            IrOp::CmpF {
                pred,
                lhs: self.value,
                rhs: rhs.value,
            },
            IrType::BOOL,
        );
        Ok(BoolValue::wrap(value))
    }

    pub fn lt(self, rhs: impl IntoFloat, fx: &mut FunctionBuilder) -> Result<BoolValue> {
        self.compare(FloatPredicate::Olt, rhs, fx)
    }

    pub fn le(self, rhs: impl IntoFloat, fx: &mut FunctionBuilder) -> Result<BoolValue> {
        self.compare(FloatPredicate::Ole, rhs, fx)
    }

    pub fn gt(self, rhs: impl IntoFloat, fx: &mut FunctionBuilder) -> Result<BoolValue> {
        self.compare(FloatPredicate::Ogt, rhs, fx)
    }

    pub fn ge(self, rhs: impl IntoFloat, fx: &mut FunctionBuilder) -> Result<BoolValue> {
        self.compare(FloatPredicate::Oge, rhs, fx)
    }

    pub fn eq(self, rhs: impl IntoFloat, fx: &mut FunctionBuilder) -> Result<BoolValue> {
        self.compare(FloatPredicate::Oeq, rhs, fx)
    }

    pub fn ne(self, rhs: impl IntoFloat, fx: &mut FunctionBuilder) -> Result<BoolValue> {
        self.compare(FloatPredicate::One, rhs, fx)
    }

    /// Mirrored dispatch for `Number <op> FloatValue`.
    pub(crate) fn reflected(
        self,
        op: NumBinOp,
        lhs: Number,
        fx: &mut FunctionBuilder,
    ) -> Result<StagedValue> {
        match op {
            NumBinOp::Add => self.add(lhs, fx).map(StagedValue::Float),
            NumBinOp::Sub => self.rsub(lhs, fx).map(StagedValue::Float),
            NumBinOp::Mul => self.mul(lhs, fx).map(StagedValue::Float),
            NumBinOp::TrueDiv => self.rdiv(lhs, fx).map(StagedValue::Float),
            NumBinOp::FloorDiv => Err(CoreError::Unimplemented {
                what: "floor division on Float",
            }),
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

impl IntoFloat for FloatValue {
    /// Float-to-float casts go in both directions; equal width adopts.
    fn into_float(self, target: FloatType, fx: &mut FunctionBuilder) -> Result<FloatValue> {
        let ty = target.ir_type()?;
        if target.width == self.ty.width {
            return Ok(FloatValue {
                ty: target,
                value: self.value,
            });
        }
        let op = if target.width > self.ty.width {
            IrOp::ExtF(self.value)
        } else {
            IrOp::TruncF(self.value)
        };
        Ok(FloatValue {
            ty: target,
            value: fx.emit(op, ty),
        })
    }
}
