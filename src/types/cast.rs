//! Cast capability traits
//!
//! Every mixed-type operation funnels through these traits: the left-hand
//! type asks the operand to cast itself into the needed concrete type, and
//! a type advertises a conversion by implementing the matching trait. Host
//! primitives implement them by emitting constants, so `x.add(2, fx)` and
//! `x.add(y, fx)` share one code path.

use crate::diagnostics::Result;
use crate::ir::FunctionBuilder;
use crate::types::float::{FloatType, FloatValue};
use crate::types::index::IndexValue;
use crate::types::int::{BoolValue, IntType, IntValue};

/// Conversion into a fixed-width integer value.
pub trait IntoInt {
    fn into_int(self, target: IntType, fx: &mut FunctionBuilder) -> Result<IntValue>;
}

/// Conversion into a floating-point value.
pub trait IntoFloat {
    fn into_float(self, target: FloatType, fx: &mut FunctionBuilder) -> Result<FloatValue>;
}

/// Conversion into the platform index value.
pub trait IntoIndex {
    fn into_index(self, fx: &mut FunctionBuilder) -> Result<IndexValue>;
}

/// Conversion into a boolean value.
pub trait IntoBool {
    fn into_bool(self, fx: &mut FunctionBuilder) -> Result<BoolValue>;
}

impl IntoInt for i64 {
    fn into_int(self, target: IntType, fx: &mut FunctionBuilder) -> Result<IntValue> {
        IntValue::const_checked(target, self as i128, fx)
    }
}

impl IntoInt for f64 {
    fn into_int(self, target: IntType, fx: &mut FunctionBuilder) -> Result<IntValue> {
        IntValue::literal(target, self, fx)
    }
}

impl IntoFloat for f64 {
    fn into_float(self, target: FloatType, fx: &mut FunctionBuilder) -> Result<FloatValue> {
        FloatValue::literal(target, self, fx)
    }
}

impl IntoFloat for i64 {
    fn into_float(self, target: FloatType, fx: &mut FunctionBuilder) -> Result<FloatValue> {
        FloatValue::literal(target, self as f64, fx)
    }
}

impl IntoIndex for i64 {
    fn into_index(self, fx: &mut FunctionBuilder) -> Result<IndexValue> {
        IndexValue::const_checked(self as i128, fx)
    }
}

impl IntoBool for bool {
    fn into_bool(self, fx: &mut FunctionBuilder) -> Result<BoolValue> {
        Ok(BoolValue::literal(self, fx))
    }
}
