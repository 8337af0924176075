//! Memoized TypeTree -> native struct layout synthesis
//!
//! Every non-collapsed tuple node gets exactly one [`StructLayout`] per
//! process, cached by structural equality of the tree. Downstream code
//! compares layouts by identity, so the cache must be pure: the same tree
//! always yields the same `Arc`.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use rustc_hash::FxHashMap;

use super::{AbiScalar, TypeTree};

/// The native layout of one TypeTree node: a bare scalar (collapsed shape)
/// or a synthesized struct.
#[derive(Debug, Clone)]
pub enum AbiLayout {
    Scalar(AbiScalar),
    Struct(Arc<StructLayout>),
}

impl AbiLayout {
    pub fn size(&self) -> usize {
        match self {
            AbiLayout::Scalar(s) => s.size(),
            AbiLayout::Struct(s) => s.size(),
        }
    }

    pub fn align(&self) -> usize {
        match self {
            AbiLayout::Scalar(s) => s.align(),
            AbiLayout::Struct(s) => s.align(),
        }
    }

    /// Composite-shaped values are passed by pointer at the call boundary.
    pub fn is_composite(&self) -> bool {
        matches!(self, AbiLayout::Struct(_))
    }
}

/// Scalars compare by kind; structs compare by identity (shared `Arc`).
impl PartialEq for AbiLayout {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AbiLayout::Scalar(a), AbiLayout::Scalar(b)) => a == b,
            (AbiLayout::Struct(a), AbiLayout::Struct(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// One positional field of a synthesized struct.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub offset: usize,
    pub layout: AbiLayout,
}

/// A synthesized nominal struct type: anonymous positional fields laid out
/// by C rules. Never mutated after creation.
#[derive(Debug)]
pub struct StructLayout {
    fields: Vec<Field>,
    size: usize,
    align: usize,
}

impl StructLayout {
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn align(&self) -> usize {
        self.align
    }
}

fn round_up(offset: usize, align: usize) -> usize {
    offset.div_ceil(align) * align
}

fn synthesize(children: Vec<AbiLayout>) -> StructLayout {
    let mut offset = 0;
    let mut align = 1;
    let mut fields = Vec::with_capacity(children.len());
    for child in children {
        let a = child.align();
        offset = round_up(offset, a);
        align = align.max(a);
        let size = child.size();
        fields.push(Field {
            offset,
            layout: child,
        });
        offset += size;
    }
    StructLayout {
        fields,
        size: round_up(offset, align),
        align,
    }
}

fn cache() -> &'static Mutex<FxHashMap<TypeTree, Arc<StructLayout>>> {
    static CACHE: OnceLock<Mutex<FxHashMap<TypeTree, Arc<StructLayout>>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(FxHashMap::default()))
}

/// Derive the native layout of a TypeTree.
///
/// Length-1 tuples collapse to their single child's own layout; every other
/// tuple synthesizes (or fetches from the process-wide cache) a struct whose
/// fields are the children's layouts in order.
pub fn layout_of(tree: &TypeTree) -> AbiLayout {
    match tree {
        TypeTree::Scalar(s) => AbiLayout::Scalar(*s),
        TypeTree::Tuple(children) if children.len() == 1 => layout_of(&children[0]),
        TypeTree::Tuple(children) => {
            {
                let map = cache()
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                if let Some(existing) = map.get(tree) {
                    return AbiLayout::Struct(Arc::clone(existing));
                }
            }
            // Children are derived outside the lock; nested tuples re-enter
            // this function.
            let synthesized = synthesize(children.iter().map(layout_of).collect());
            tracing::trace!(
                fields = synthesized.fields.len(),
                size = synthesized.size,
                "synthesized struct layout"
            );
            let mut map = cache().lock().unwrap_or_else(PoisonError::into_inner);
            let arc = map
                .entry(tree.clone())
                .or_insert_with(|| Arc::new(synthesized));
            AbiLayout::Struct(Arc::clone(arc))
        }
    }
}
