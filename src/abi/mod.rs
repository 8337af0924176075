//! Native-ABI trees: the shape language of the call boundary
//!
//! A [`TypeTree`] describes the native shape of a value independent of its
//! compile-time semantic type: an ordered tuple whose elements are native
//! scalar descriptors or nested trees. A [`ValueTree`] is structurally
//! parallel with scalar values at the leaves. The one structural rule that
//! everything downstream leans on is *collapsing*: a length-1 tuple denotes
//! its single element's shape and never materializes as a composite.
//!
//! Layout synthesis and pack/unpack live in the sibling modules; this module
//! owns the tree data model and the scalar encodings.

mod layout;
mod marshal;

pub use layout::{AbiLayout, Field, StructLayout, layout_of};
pub use marshal::{NativeArg, StructValue, pack, unpack};

use std::mem;

/// Native scalar type descriptor at the call boundary.
///
/// Widths mirror the C types the compiled artifact is built against:
/// width-1 integers are boolean-sized for both signs, `Size` is the
/// pointer-sized unsigned integer. Width-16 floats deliberately have no
/// entry here; they exist only at the IR level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbiScalar {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Size,
}

impl AbiScalar {
    pub fn size(&self) -> usize {
        match self {
            AbiScalar::Bool => mem::size_of::<bool>(),
            AbiScalar::I8 => mem::size_of::<i8>(),
            AbiScalar::I16 => mem::size_of::<i16>(),
            AbiScalar::I32 => mem::size_of::<i32>(),
            AbiScalar::I64 => mem::size_of::<i64>(),
            AbiScalar::U8 => mem::size_of::<u8>(),
            AbiScalar::U16 => mem::size_of::<u16>(),
            AbiScalar::U32 => mem::size_of::<u32>(),
            AbiScalar::U64 => mem::size_of::<u64>(),
            AbiScalar::F32 => mem::size_of::<f32>(),
            AbiScalar::F64 => mem::size_of::<f64>(),
            AbiScalar::Size => mem::size_of::<usize>(),
        }
    }

    pub fn align(&self) -> usize {
        match self {
            AbiScalar::Bool => mem::align_of::<bool>(),
            AbiScalar::I8 => mem::align_of::<i8>(),
            AbiScalar::I16 => mem::align_of::<i16>(),
            AbiScalar::I32 => mem::align_of::<i32>(),
            AbiScalar::I64 => mem::align_of::<i64>(),
            AbiScalar::U8 => mem::align_of::<u8>(),
            AbiScalar::U16 => mem::align_of::<u16>(),
            AbiScalar::U32 => mem::align_of::<u32>(),
            AbiScalar::U64 => mem::align_of::<u64>(),
            AbiScalar::F32 => mem::align_of::<f32>(),
            AbiScalar::F64 => mem::align_of::<f64>(),
            AbiScalar::Size => mem::align_of::<usize>(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AbiScalar::Bool => "bool",
            AbiScalar::I8 => "i8",
            AbiScalar::I16 => "i16",
            AbiScalar::I32 => "i32",
            AbiScalar::I64 => "i64",
            AbiScalar::U8 => "u8",
            AbiScalar::U16 => "u16",
            AbiScalar::U32 => "u32",
            AbiScalar::U64 => "u64",
            AbiScalar::F32 => "f32",
            AbiScalar::F64 => "f64",
            AbiScalar::Size => "size",
        }
    }
}

/// A native scalar value, tagged with its [`AbiScalar`] kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AbiValue {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Size(usize),
}

impl AbiValue {
    pub fn scalar(&self) -> AbiScalar {
        match self {
            AbiValue::Bool(_) => AbiScalar::Bool,
            AbiValue::I8(_) => AbiScalar::I8,
            AbiValue::I16(_) => AbiScalar::I16,
            AbiValue::I32(_) => AbiScalar::I32,
            AbiValue::I64(_) => AbiScalar::I64,
            AbiValue::U8(_) => AbiScalar::U8,
            AbiValue::U16(_) => AbiScalar::U16,
            AbiValue::U32(_) => AbiScalar::U32,
            AbiValue::U64(_) => AbiScalar::U64,
            AbiValue::F32(_) => AbiScalar::F32,
            AbiValue::F64(_) => AbiScalar::F64,
            AbiValue::Size(_) => AbiScalar::Size,
        }
    }

    /// Write this value into `dst` in native byte order. `dst` must be
    /// exactly `self.scalar().size()` bytes.
    pub(crate) fn write_to(&self, dst: &mut [u8]) {
        match *self {
            AbiValue::Bool(v) => dst.copy_from_slice(&[v as u8]),
            AbiValue::I8(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            AbiValue::I16(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            AbiValue::I32(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            AbiValue::I64(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            AbiValue::U8(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            AbiValue::U16(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            AbiValue::U32(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            AbiValue::U64(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            AbiValue::F32(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            AbiValue::F64(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            AbiValue::Size(v) => dst.copy_from_slice(&v.to_ne_bytes()),
        }
    }

    /// Read a value of the given kind from `src` in native byte order.
    /// `src` must be exactly `kind.size()` bytes.
    pub(crate) fn read_from(kind: AbiScalar, src: &[u8]) -> AbiValue {
        fn array<const N: usize>(src: &[u8]) -> [u8; N] {
            let mut out = [0u8; N];
            out.copy_from_slice(src);
            out
        }
        match kind {
            AbiScalar::Bool => AbiValue::Bool(src[0] != 0),
            AbiScalar::I8 => AbiValue::I8(i8::from_ne_bytes(array(src))),
            AbiScalar::I16 => AbiValue::I16(i16::from_ne_bytes(array(src))),
            AbiScalar::I32 => AbiValue::I32(i32::from_ne_bytes(array(src))),
            AbiScalar::I64 => AbiValue::I64(i64::from_ne_bytes(array(src))),
            AbiScalar::U8 => AbiValue::U8(u8::from_ne_bytes(array(src))),
            AbiScalar::U16 => AbiValue::U16(u16::from_ne_bytes(array(src))),
            AbiScalar::U32 => AbiValue::U32(u32::from_ne_bytes(array(src))),
            AbiScalar::U64 => AbiValue::U64(u64::from_ne_bytes(array(src))),
            AbiScalar::F32 => AbiValue::F32(f32::from_ne_bytes(array(src))),
            AbiScalar::F64 => AbiValue::F64(f64::from_ne_bytes(array(src))),
            AbiScalar::Size => AbiValue::Size(usize::from_ne_bytes(array(src))),
        }
    }
}

/// Recursive native type shape. See the module docs for the collapsing rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTree {
    Scalar(AbiScalar),
    Tuple(Vec<TypeTree>),
}

impl TypeTree {
    /// Number of scalar leaves, ignoring nesting. A return tree with none
    /// crosses the call boundary as void.
    pub fn flat_len(&self) -> usize {
        match self {
            TypeTree::Scalar(_) => 1,
            TypeTree::Tuple(children) => children.iter().map(TypeTree::flat_len).sum(),
        }
    }
}

/// Recursive native value shape, structurally parallel to a [`TypeTree`].
#[derive(Debug, Clone, PartialEq)]
pub enum ValueTree {
    Scalar(AbiValue),
    Tuple(Vec<ValueTree>),
}
