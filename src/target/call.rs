//! Native call planning and dispatch
//!
//! A [`CallPlan`] is built once per kernel: it fixes the symbol, the native
//! shape of every argument, how the results come back, and the libffi call
//! interface, then resolves the entry point. Dispatching a call is then just
//! packing argument trees into native storage and one foreign invocation.
//!
//! Convention rules: composite-shaped arguments are passed by pointer;
//! scalars by value. A composite return becomes a void native call whose
//! first argument is a hidden pointer to caller-owned result storage.

use std::ffi::c_void;
use std::sync::Arc;

use libffi::middle::{Arg, Cif, CodePtr, Type};

use crate::abi::{
    layout_of, pack, unpack, AbiLayout, AbiScalar, AbiValue, NativeArg, StructLayout, StructValue,
    TypeTree, ValueTree,
};
use crate::diagnostics::{CoreError, Result};
use crate::target::library::EntryResolver;
use crate::target::{Signature, TargetConfig};

/// How a kernel hands its results back at the native boundary.
#[derive(Debug, Clone)]
pub enum ReturnKind {
    Void,
    /// Returned directly in a register.
    Scalar(AbiScalar),
    /// Written through a hidden output pointer passed as the first argument.
    Composite(Arc<StructLayout>),
}

/// A planned native call: resolved entry, fixed shapes, prepared call
/// interface.
pub struct CallPlan {
    symbol: String,
    param_trees: Vec<TypeTree>,
    param_layouts: Vec<AbiLayout>,
    ret_tree: Option<TypeTree>,
    ret: ReturnKind,
    cif: Cif,
    entry: CodePtr,
}

/// Where each native argument's storage lives during a call.
enum ArgSource {
    RetPtr,
    Cell(usize),
    StructPtr(usize),
}

impl CallPlan {
    /// Plan a call for a declared kernel signature.
    pub fn new(
        name: &str,
        sig: &Signature,
        config: &TargetConfig,
        resolver: &dyn EntryResolver,
    ) -> Result<Self> {
        let index_abi = config.index_scalar()?;
        let mut param_trees = Vec::with_capacity(sig.params.len());
        for ty in sig.params.values() {
            param_trees.push(ty.type_tree(index_abi)?);
        }
        let ret_tree = match sig.results.len() {
            0 => None,
            1 => Some(sig.results[0].type_tree(index_abi)?),
            _ => {
                let mut children = Vec::with_capacity(sig.results.len());
                for ty in &sig.results {
                    children.push(ty.type_tree(index_abi)?);
                }
                Some(TypeTree::Tuple(children))
            }
        };
        Self::from_trees(name, param_trees, ret_tree, config, resolver)
    }

    /// Plan a call from explicit native shapes. This is the layer kernels
    /// with nested tuple interfaces plan through.
    pub fn from_trees(
        name: &str,
        param_trees: Vec<TypeTree>,
        ret_tree: Option<TypeTree>,
        config: &TargetConfig,
        resolver: &dyn EntryResolver,
    ) -> Result<Self> {
        let param_layouts: Vec<AbiLayout> = param_trees.iter().map(layout_of).collect();

        // Shape, not leaf count, picks the return class: a tree can hold a
        // single flattened leaf beside empty tuples and still lay out as a
        // struct.
        let ret = match &ret_tree {
            None => ReturnKind::Void,
            Some(tree) if tree.flat_len() == 0 => ReturnKind::Void,
            Some(tree) => match layout_of(tree) {
                AbiLayout::Scalar(s) => ReturnKind::Scalar(s),
                AbiLayout::Struct(layout) => {
                    if !config.target_variant.supports_composite_return() {
                        return Err(CoreError::CompositeReturnUnsupported {
                            name: name.to_string(),
                        });
                    }
                    ReturnKind::Composite(layout)
                }
            },
        };

        let mut arg_types = Vec::with_capacity(param_layouts.len() + 1);
        if matches!(ret, ReturnKind::Composite(_)) {
            // Hidden output pointer travels first.
            arg_types.push(Type::pointer());
        }
        for layout in &param_layouts {
            match layout {
                AbiLayout::Scalar(s) => arg_types.push(ffi_type(*s)),
                AbiLayout::Struct(_) => arg_types.push(Type::pointer()),
            }
        }
        let ret_ffi = match &ret {
            ReturnKind::Scalar(s) => ffi_type(*s),
            _ => Type::void(),
        };
        let cif = Cif::new(arg_types, ret_ffi);

        let symbol = format!("{}{}", config.symbol_prefix(), name);
        let entry = resolver.resolve(&symbol)?;
        tracing::debug!(symbol = %symbol, args = param_trees.len(), "planned native call");

        Ok(Self {
            symbol,
            param_trees,
            param_layouts,
            ret_tree,
            ret,
            cif,
            entry: CodePtr::from_ptr(entry as *const c_void),
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn return_kind(&self) -> &ReturnKind {
        &self.ret
    }

    pub fn param_layouts(&self) -> &[AbiLayout] {
        &self.param_layouts
    }

    /// Dispatch with one value tree per parameter. Returns the result tree,
    /// or `None` for a void return.
    pub fn call(&self, values: &[ValueTree]) -> Result<Option<ValueTree>> {
        if values.len() != self.param_trees.len() {
            return Err(CoreError::ShapeMismatch {
                path: "the argument list".to_string(),
            });
        }
        let mut packed = Vec::with_capacity(values.len());
        for (tree, value) in self.param_trees.iter().zip(values) {
            packed.push(pack(tree, value)?);
        }

        let mut ret_struct = match &self.ret {
            ReturnKind::Composite(layout) => Some(StructValue::zeroed(layout.clone())),
            _ => None,
        };

        // Scalars are staged in 8-byte cells with their value bytes at the
        // cell start; composites are referenced in place inside `packed`.
        let mut sources = Vec::with_capacity(packed.len() + 1);
        let mut cells: Vec<u64> = Vec::with_capacity(packed.len());
        if ret_struct.is_some() {
            sources.push(ArgSource::RetPtr);
        }
        for (i, arg) in packed.iter().enumerate() {
            match arg {
                NativeArg::Scalar(v) => {
                    let mut raw = [0u8; 8];
                    v.write_to(&mut raw[..v.scalar().size()]);
                    cells.push(u64::from_ne_bytes(raw));
                    sources.push(ArgSource::Cell(cells.len() - 1));
                }
                NativeArg::Struct(_) => sources.push(ArgSource::StructPtr(i)),
            }
        }

        // Pointer-valued arguments need their own stable cells holding the
        // addresses; both vectors are complete before any Arg records an
        // address.
        let mut ptrs: Vec<*mut c_void> = Vec::with_capacity(sources.len());
        for source in &sources {
            let ptr = match source {
                ArgSource::RetPtr => {
                    let Some(sv) = ret_struct.as_mut() else {
                        unreachable!("return storage allocated above");
                    };
                    sv.as_mut_ptr().cast()
                }
                ArgSource::StructPtr(i) => {
                    let Some(sv) = packed[*i].as_struct() else {
                        unreachable!("struct source points at a struct arg");
                    };
                    sv.as_ptr() as *mut c_void
                }
                ArgSource::Cell(_) => std::ptr::null_mut(),
            };
            ptrs.push(ptr);
        }
        let args: Vec<Arg> = sources
            .iter()
            .enumerate()
            .map(|(k, source)| match source {
                ArgSource::Cell(i) => Arg::new(&cells[*i]),
                _ => Arg::new(&ptrs[k]),
            })
            .collect();

        let code = self.entry;
        let result = match &self.ret {
            ReturnKind::Void => {
                unsafe { self.cif.call::<()>(code, &args) };
                None
            }
            ReturnKind::Scalar(scalar) => {
                let value = unsafe { self.call_scalar(*scalar, code, &args) };
                let Some(tree) = &self.ret_tree else {
                    unreachable!("scalar return implies a return tree");
                };
                Some(unpack(tree, &NativeArg::Scalar(value))?)
            }
            ReturnKind::Composite(_) => {
                unsafe { self.cif.call::<()>(code, &args) };
                let Some(sv) = ret_struct.take() else {
                    unreachable!("return storage allocated above");
                };
                let Some(tree) = &self.ret_tree else {
                    unreachable!("composite return implies a return tree");
                };
                Some(unpack(tree, &NativeArg::Struct(sv))?)
            }
        };
        Ok(result)
    }

    /// Safety: the planned call interface must match the entry's actual
    /// native signature; that is the contract `from_trees` captures.
    unsafe fn call_scalar(&self, scalar: AbiScalar, code: CodePtr, args: &[Arg]) -> AbiValue {
        unsafe {
            match scalar {
                AbiScalar::Bool => AbiValue::Bool(self.cif.call::<u8>(code, args) != 0),
                AbiScalar::I8 => AbiValue::I8(self.cif.call::<i8>(code, args)),
                AbiScalar::I16 => AbiValue::I16(self.cif.call::<i16>(code, args)),
                AbiScalar::I32 => AbiValue::I32(self.cif.call::<i32>(code, args)),
                AbiScalar::I64 => AbiValue::I64(self.cif.call::<i64>(code, args)),
                AbiScalar::U8 => AbiValue::U8(self.cif.call::<u8>(code, args)),
                AbiScalar::U16 => AbiValue::U16(self.cif.call::<u16>(code, args)),
                AbiScalar::U32 => AbiValue::U32(self.cif.call::<u32>(code, args)),
                AbiScalar::U64 => AbiValue::U64(self.cif.call::<u64>(code, args)),
                AbiScalar::F32 => AbiValue::F32(self.cif.call::<f32>(code, args)),
                AbiScalar::F64 => AbiValue::F64(self.cif.call::<f64>(code, args)),
                AbiScalar::Size => AbiValue::Size(self.cif.call::<usize>(code, args)),
            }
        }
    }
}

fn ffi_type(scalar: AbiScalar) -> Type {
    match scalar {
        AbiScalar::Bool => Type::u8(),
        AbiScalar::I8 => Type::i8(),
        AbiScalar::I16 => Type::i16(),
        AbiScalar::I32 => Type::i32(),
        AbiScalar::I64 => Type::i64(),
        AbiScalar::U8 => Type::u8(),
        AbiScalar::U16 => Type::u16(),
        AbiScalar::U32 => Type::u32(),
        AbiScalar::U64 => Type::u64(),
        AbiScalar::F32 => Type::f32(),
        AbiScalar::F64 => Type::f64(),
        AbiScalar::Size => Type::usize(),
    }
}
