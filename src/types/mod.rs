//! Typed numeric values and the declared-type surface
//!
//! The staged value types (`IntValue`, `FloatValue`, `IndexValue`,
//! `BoolValue`, `Number`) wrap IR value handles and fix their width/sign
//! semantics at declaration. Mixed-type operations go through the cast
//! capability traits in [`cast`]; the declared-type surface ([`KernelType`])
//! is what the signature collaborator hands over per parameter and result,
//! and is the bridge into the ABI trees of [`crate::abi`].

pub mod cast;
pub mod float;
pub mod index;
pub mod int;
pub mod number;

pub use cast::{IntoBool, IntoFloat, IntoIndex, IntoInt};
pub use float::{FloatType, FloatValue};
pub use index::IndexValue;
pub use int::{BoolValue, IntType, IntValue, Sign};
pub use number::{HostNum, NumBinOp, NumUnOp, Number};

use std::fmt;

use crate::abi::{AbiScalar, AbiValue, TypeTree, ValueTree};
use crate::diagnostics::{CoreError, Result};
use crate::ir::IrType;

/// Relative tolerance used when deciding whether a real literal denotes an
/// integer.
pub(crate) fn isclose(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs())
}

/// Any staged value the translation layer can hold.
#[derive(Debug, Clone, Copy)]
pub enum StagedValue {
    Int(IntValue),
    Float(FloatValue),
    Index(IndexValue),
    Bool(BoolValue),
    Number(Number),
}

/// A host-process value crossing the call boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Unit,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Tuple(Vec<HostValue>),
}

impl HostValue {
    /// Exact integer reading, if this value denotes one (fractional floats
    /// do not).
    pub fn as_int_exact(&self) -> Option<i128> {
        match *self {
            HostValue::Int(v) => Some(v as i128),
            HostValue::Uint(v) => Some(v as i128),
            HostValue::Bool(v) => Some(v as i128),
            HostValue::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(v as i128),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            HostValue::Int(v) => Some(v as f64),
            HostValue::Uint(v) => Some(v as f64),
            HostValue::Float(v) => Some(v),
            HostValue::Bool(v) => Some(v as u8 as f64),
            _ => None,
        }
    }

    /// Numeric truthiness, the way the boolean boundary type accepts it.
    pub fn truthy(&self) -> Option<bool> {
        match *self {
            HostValue::Bool(v) => Some(v),
            HostValue::Int(v) => Some(v != 0),
            HostValue::Uint(v) => Some(v != 0),
            HostValue::Float(v) => Some(v != 0.0),
            _ => None,
        }
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Unit => write!(f, "()"),
            HostValue::Bool(v) => write!(f, "{v}"),
            HostValue::Int(v) => write!(f, "{v}"),
            HostValue::Uint(v) => write!(f, "{v}"),
            HostValue::Float(v) => write!(f, "{v}"),
            HostValue::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Declared type of one kernel parameter or result, as handed over by the
/// signature collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelType {
    Int(IntType),
    Float(FloatType),
    Index,
    Bool,
}

impl KernelType {
    pub fn name(&self) -> String {
        match self {
            KernelType::Int(t) => t.name(),
            KernelType::Float(t) => t.name(),
            KernelType::Index => "Index".to_string(),
            KernelType::Bool => "Bool".to_string(),
        }
    }

    /// IR-level type of a parameter of this declared type.
    pub fn ir_type(&self) -> Result<IrType> {
        match self {
            KernelType::Int(t) => {
                t.check_declared()?;
                Ok(t.ir_type())
            }
            KernelType::Float(t) => t.ir_type(),
            KernelType::Index => Ok(IrType::Index),
            KernelType::Bool => Ok(IrType::BOOL),
        }
    }

    fn abi_scalar(&self, index_abi: AbiScalar) -> Result<AbiScalar> {
        match self {
            KernelType::Int(t) => t.abi_scalar(),
            KernelType::Float(t) => t.abi_scalar(),
            KernelType::Index => Ok(index_abi),
            KernelType::Bool => Ok(AbiScalar::Bool),
        }
    }

    /// The native shape of this type: always a single scalar leaf wrapped
    /// in the one-element tuple shell. `index_abi` is the target-configured
    /// scalar for the index type.
    pub fn type_tree(&self, index_abi: AbiScalar) -> Result<TypeTree> {
        let scalar = self.abi_scalar(index_abi)?;
        Ok(TypeTree::Tuple(vec![TypeTree::Scalar(scalar)]))
    }

    /// Convert a host value into this type's ValueTree. Conversions are
    /// checked: a host value that does not fit the native scalar is a range
    /// error, a host value of the wrong kind is a cast error.
    pub fn to_abi(&self, value: &HostValue, index_abi: AbiScalar) -> Result<ValueTree> {
        let leaf = match self {
            KernelType::Int(t) => {
                let n = value.as_int_exact().ok_or_else(|| CoreError::InvalidCast {
                    value: value.to_string(),
                    target: t.name(),
                })?;
                int_leaf(t.abi_scalar()?, n, &t.name())?
            }
            KernelType::Float(t) => {
                let v = value.as_f64().ok_or_else(|| CoreError::InvalidCast {
                    value: value.to_string(),
                    target: t.name(),
                })?;
                match t.abi_scalar()? {
                    AbiScalar::F32 => AbiValue::F32(v as f32),
                    _ => AbiValue::F64(v),
                }
            }
            KernelType::Index => {
                let n = value.as_int_exact().ok_or_else(|| CoreError::InvalidCast {
                    value: value.to_string(),
                    target: "Index".to_string(),
                })?;
                int_leaf(index_abi, n, "Index")?
            }
            KernelType::Bool => {
                let b = value.truthy().ok_or_else(|| CoreError::InvalidCast {
                    value: value.to_string(),
                    target: "Bool".to_string(),
                })?;
                AbiValue::Bool(b)
            }
        };
        Ok(ValueTree::Tuple(vec![ValueTree::Scalar(leaf)]))
    }

    /// Convert this type's ValueTree back into a host value.
    pub fn from_abi(&self, values: &ValueTree) -> Result<HostValue> {
        let ValueTree::Tuple(children) = values else {
            return Err(CoreError::ShapeMismatch {
                path: "the root".to_string(),
            });
        };
        let [ValueTree::Scalar(leaf)] = children.as_slice() else {
            return Err(CoreError::ShapeMismatch {
                path: "the root".to_string(),
            });
        };
        let host = match (self, *leaf) {
            // Width-1 integers come back as 0/1 integers; only the boolean
            // declared type yields a host bool.
            (KernelType::Int(_), AbiValue::Bool(v)) => HostValue::Int(v as i64),
            (KernelType::Int(_), AbiValue::I8(v)) => HostValue::Int(v as i64),
            (KernelType::Int(_), AbiValue::I16(v)) => HostValue::Int(v as i64),
            (KernelType::Int(_), AbiValue::I32(v)) => HostValue::Int(v as i64),
            (KernelType::Int(_), AbiValue::I64(v)) => HostValue::Int(v),
            (KernelType::Int(_), AbiValue::U8(v)) => HostValue::Uint(v as u64),
            (KernelType::Int(_), AbiValue::U16(v)) => HostValue::Uint(v as u64),
            (KernelType::Int(_), AbiValue::U32(v)) => HostValue::Uint(v as u64),
            (KernelType::Int(_), AbiValue::U64(v)) => HostValue::Uint(v),
            (KernelType::Float(_), AbiValue::F32(v)) => HostValue::Float(v as f64),
            (KernelType::Float(_), AbiValue::F64(v)) => HostValue::Float(v),
            // Every scalar `index_scalar` can pick must convert back: Size
            // on the host, U16/U32/U64 under an explicit triple, I32 under
            // the plain variant.
            (KernelType::Index, AbiValue::Size(v)) => HostValue::Uint(v as u64),
            (KernelType::Index, AbiValue::U64(v)) => HostValue::Uint(v),
            (KernelType::Index, AbiValue::U32(v)) => HostValue::Uint(v as u64),
            (KernelType::Index, AbiValue::U16(v)) => HostValue::Uint(v as u64),
            (KernelType::Index, AbiValue::I32(v)) => HostValue::Int(v as i64),
            (KernelType::Bool, AbiValue::Bool(v)) => HostValue::Bool(v),
            (_, leaf) => {
                return Err(CoreError::FieldTypeMismatch {
                    expected: self.name(),
                    found: leaf.scalar().name().to_string(),
                    path: "the root".to_string(),
                });
            }
        };
        Ok(host)
    }
}

/// Checked integer-to-scalar conversion at the marshalling boundary.
fn int_leaf(scalar: AbiScalar, n: i128, type_name: &str) -> Result<AbiValue> {
    fn range_err(n: i128, type_name: &str, min: i128, max: i128) -> CoreError {
        CoreError::OutOfRange {
            value: n,
            type_name: type_name.to_string(),
            min,
            max,
        }
    }
    macro_rules! checked {
        ($variant:ident, $ty:ty) => {
            <$ty>::try_from(n)
                .map(AbiValue::$variant)
                .map_err(|_| range_err(n, type_name, <$ty>::MIN as i128, <$ty>::MAX as i128))
        };
    }
    match scalar {
        AbiScalar::Bool => {
            if n == 0 || n == 1 {
                Ok(AbiValue::Bool(n == 1))
            } else {
                Err(range_err(n, type_name, 0, 1))
            }
        }
        AbiScalar::I8 => checked!(I8, i8),
        AbiScalar::I16 => checked!(I16, i16),
        AbiScalar::I32 => checked!(I32, i32),
        AbiScalar::I64 => checked!(I64, i64),
        AbiScalar::U8 => checked!(U8, u8),
        AbiScalar::U16 => checked!(U16, u16),
        AbiScalar::U32 => checked!(U32, u32),
        AbiScalar::U64 => checked!(U64, u64),
        AbiScalar::Size => checked!(Size, usize),
        AbiScalar::F32 | AbiScalar::F64 => Err(CoreError::InvalidCast {
            value: n.to_string(),
            target: format!("the {} scalar", scalar.name()),
        }),
    }
}
