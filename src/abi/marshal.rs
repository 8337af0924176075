//! Packing value trees into native structs and back
//!
//! The two converters here, [`pack`] and [`unpack`], are the only place
//! nested composite shapes are handled; arguments and return values both go
//! through them. Mismatches between the type tree and the value side are
//! reported with the tree path at which they were found, because a shape
//! error that slips through here becomes a memory bug at the call boundary.

use std::sync::Arc;

use crate::diagnostics::{CoreError, Result};

use super::{AbiLayout, AbiValue, StructLayout, TypeTree, ValueTree, layout_of};

/// A freshly allocated native struct instance. Lives for a single call.
#[derive(Debug)]
pub struct StructValue {
    layout: Arc<StructLayout>,
    // Backing store in u64 words, which over-aligns every scalar in the ABI
    // set; field offsets are byte offsets into it.
    words: Vec<u64>,
}

impl StructValue {
    /// Allocate a zero-initialized instance of `layout`.
    pub fn zeroed(layout: Arc<StructLayout>) -> Self {
        let words = vec![0u64; layout.size().div_ceil(8)];
        Self { layout, words }
    }

    pub fn layout(&self) -> &Arc<StructLayout> {
        &self.layout
    }

    pub fn bytes(&self) -> &[u8] {
        // The word buffer always covers `layout.size()` bytes.
        unsafe { std::slice::from_raw_parts(self.words.as_ptr().cast(), self.layout.size()) }
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        unsafe {
            std::slice::from_raw_parts_mut(self.words.as_mut_ptr().cast(), self.layout.size())
        }
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.words.as_ptr().cast()
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.words.as_mut_ptr().cast()
    }
}

/// A marshalled value ready for the call boundary: a raw scalar for
/// collapsed shapes, an owned struct instance for composite ones.
#[derive(Debug)]
pub enum NativeArg {
    Scalar(AbiValue),
    Struct(StructValue),
}

impl NativeArg {
    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            NativeArg::Struct(s) => Some(s),
            NativeArg::Scalar(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<AbiValue> {
        match self {
            NativeArg::Scalar(v) => Some(*v),
            NativeArg::Struct(_) => None,
        }
    }
}

fn render_path(path: &[usize]) -> String {
    if path.is_empty() {
        "the root".to_string()
    } else {
        path.iter().map(|i| format!("[{i}]")).collect()
    }
}

/// Marshal a [`ValueTree`] into the native representation dictated by
/// `tree`. Both trees must agree in nesting depth and length at every
/// level; a length-1 level passes through as the raw child, not a struct.
pub fn pack(tree: &TypeTree, values: &ValueTree) -> Result<NativeArg> {
    let mut path = Vec::new();
    pack_at(tree, values, &mut path)
}

fn pack_at(tree: &TypeTree, values: &ValueTree, path: &mut Vec<usize>) -> Result<NativeArg> {
    match (tree, values) {
        (TypeTree::Scalar(expected), ValueTree::Scalar(value)) => {
            if value.scalar() != *expected {
                return Err(CoreError::FieldTypeMismatch {
                    expected: expected.name().to_string(),
                    found: value.scalar().name().to_string(),
                    path: render_path(path),
                });
            }
            Ok(NativeArg::Scalar(*value))
        }
        (TypeTree::Tuple(types), ValueTree::Tuple(children)) => {
            if types.len() != children.len() {
                return Err(CoreError::LengthMismatch {
                    path: render_path(path),
                    expected: types.len(),
                    found: children.len(),
                });
            }
            if types.len() == 1 {
                path.push(0);
                let packed = pack_at(&types[0], &children[0], path);
                path.pop();
                return packed;
            }
            let AbiLayout::Struct(layout) = layout_of(tree) else {
                // Tuples of length != 1 always synthesize a struct.
                unreachable!("non-collapsed tuple must have a struct layout");
            };
            let mut instance = StructValue::zeroed(layout);
            for (i, (child_tree, child_values)) in types.iter().zip(children).enumerate() {
                path.push(i);
                let packed = pack_at(child_tree, child_values, path)?;
                path.pop();
                let start = instance.layout().fields()[i].offset;
                match packed {
                    NativeArg::Scalar(v) => {
                        let end = start + v.scalar().size();
                        v.write_to(&mut instance.bytes_mut()[start..end]);
                    }
                    NativeArg::Struct(nested) => {
                        let end = start + nested.layout().size();
                        instance.bytes_mut()[start..end].copy_from_slice(nested.bytes());
                    }
                }
            }
            Ok(NativeArg::Struct(instance))
        }
        (TypeTree::Scalar(_), ValueTree::Tuple(_)) | (TypeTree::Tuple(_), ValueTree::Scalar(_)) => {
            Err(CoreError::ShapeMismatch {
                path: render_path(path),
            })
        }
    }
}

fn strip_shells(tree: &TypeTree) -> (&TypeTree, usize) {
    let mut current = tree;
    let mut shells = 0;
    while let TypeTree::Tuple(children) = current {
        if children.len() != 1 {
            break;
        }
        current = &children[0];
        shells += 1;
    }
    (current, shells)
}

fn add_shells(value: ValueTree, shells: usize) -> ValueTree {
    let mut wrapped = value;
    for _ in 0..shells {
        wrapped = ValueTree::Tuple(vec![wrapped]);
    }
    wrapped
}

/// Unmarshal a native representation back into a [`ValueTree`] whose shape
/// exactly matches `tree`, re-adding the tuple shells the struct layout
/// dropped when it collapsed length-1 levels.
pub fn unpack(tree: &TypeTree, arg: &NativeArg) -> Result<ValueTree> {
    let mut path = Vec::new();
    let (stripped, shells) = strip_shells(tree);
    let core = match (stripped, arg) {
        (TypeTree::Scalar(expected), NativeArg::Scalar(value)) => {
            if value.scalar() != *expected {
                return Err(CoreError::FieldTypeMismatch {
                    expected: expected.name().to_string(),
                    found: value.scalar().name().to_string(),
                    path: render_path(&path),
                });
            }
            ValueTree::Scalar(*value)
        }
        (TypeTree::Tuple(types), NativeArg::Struct(instance)) => ValueTree::Tuple(read_fields(
            types,
            instance.layout(),
            instance.bytes(),
            &mut path,
        )?),
        (TypeTree::Scalar(_), NativeArg::Struct(_)) | (TypeTree::Tuple(_), NativeArg::Scalar(_)) => {
            return Err(CoreError::ShapeMismatch {
                path: render_path(&path),
            });
        }
    };
    Ok(add_shells(core, shells))
}

fn read_fields(
    types: &[TypeTree],
    layout: &Arc<StructLayout>,
    bytes: &[u8],
    path: &mut Vec<usize>,
) -> Result<Vec<ValueTree>> {
    if types.len() != layout.fields().len() {
        return Err(CoreError::LengthMismatch {
            path: render_path(path),
            expected: types.len(),
            found: layout.fields().len(),
        });
    }
    let mut out = Vec::with_capacity(types.len());
    for (i, (child_tree, field)) in types.iter().zip(layout.fields()).enumerate() {
        path.push(i);
        let (stripped, shells) = strip_shells(child_tree);
        let child = match (stripped, &field.layout) {
            (TypeTree::Scalar(expected), AbiLayout::Scalar(found)) => {
                if expected != found {
                    return Err(CoreError::FieldTypeMismatch {
                        expected: expected.name().to_string(),
                        found: found.name().to_string(),
                        path: render_path(path),
                    });
                }
                let start = field.offset;
                let end = start + found.size();
                ValueTree::Scalar(AbiValue::read_from(*found, &bytes[start..end]))
            }
            (TypeTree::Tuple(nested_types), AbiLayout::Struct(nested_layout)) => {
                let start = field.offset;
                let end = start + nested_layout.size();
                ValueTree::Tuple(read_fields(
                    nested_types,
                    nested_layout,
                    &bytes[start..end],
                    path,
                )?)
            }
            (TypeTree::Scalar(_), AbiLayout::Struct(_))
            | (TypeTree::Tuple(_), AbiLayout::Scalar(_)) => {
                return Err(CoreError::ShapeMismatch {
                    path: render_path(path),
                });
            }
        };
        path.pop();
        out.push(add_shells(child, shells));
    }
    Ok(out)
}
