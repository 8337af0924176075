//! Target configuration and the compiled-module surface
//!
//! [`TargetConfig`] carries the build and call-boundary options, including
//! which calling-convention variant the lowered artifact exposes.
//! [`KernelModule`] ties together declared kernel signatures, the typed IR,
//! the lowering seam ([`Toolchain`]) and, once built, a resolved entry table
//! it plans and dispatches native calls through.

pub mod call;
pub mod library;

pub use call::{CallPlan, ReturnKind};
pub use library::{EntryResolver, SharedLibrary};

use std::str::FromStr;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use target_lexicon::{PointerWidth, Triple};

use crate::abi::{AbiScalar, ValueTree};
use crate::diagnostics::{CoreError, Result};
use crate::ir::{IrFunction, IrModule};
use crate::types::{HostValue, KernelType};

/// Calling-convention variant of the lowered artifact.
///
/// Spelled `c-iface` / `plain` in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallConv {
    /// C-interface wrapper symbols with a fixed prefix; composite returns
    /// travel through a hidden output pointer.
    #[default]
    CIface,
    /// Bare symbol names, index as a plain C int, scalar returns only.
    Plain,
}

impl CallConv {
    /// Prefix prepended to every kernel name to form its symbol.
    pub fn symbol_prefix(&self) -> &'static str {
        match self {
            CallConv::CIface => "_mlir_ciface_",
            CallConv::Plain => "",
        }
    }

    pub fn supports_composite_return(&self) -> bool {
        matches!(self, CallConv::CIface)
    }
}

/// Build and call-boundary options. Every field has a default, so a TOML
/// fragment only names what it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TargetConfig {
    /// Dump the typed IR before handing it to the lowering toolchain.
    pub emit_intermediate_dump: bool,
    /// Ask the toolchain to trace its pass pipeline.
    pub emit_pass_trace: bool,
    /// Ask the toolchain to dump the final native-level IR.
    pub emit_native_ir_dump: bool,
    /// Build the artifact as soon as the module is finalized.
    pub auto_build: bool,
    /// Keep temporary build artifacts on disk after the build.
    pub keep_temp_artifacts: bool,
    /// Calling-convention variant to lower for.
    pub target_variant: CallConv,
    /// Target triple; the host is assumed when absent.
    pub triple: Option<String>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            emit_intermediate_dump: false,
            emit_pass_trace: false,
            emit_native_ir_dump: false,
            auto_build: true,
            keep_temp_artifacts: true,
            target_variant: CallConv::default(),
            triple: None,
        }
    }
}

impl TargetConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| CoreError::ConfigParse {
            detail: e.to_string(),
        })
    }

    pub fn symbol_prefix(&self) -> &'static str {
        self.target_variant.symbol_prefix()
    }

    /// Native scalar the index type marshals as under this configuration:
    /// the pointer-sized unsigned integer of the target, or a C int under
    /// the plain variant.
    pub fn index_scalar(&self) -> Result<AbiScalar> {
        match self.target_variant {
            CallConv::Plain => Ok(AbiScalar::I32),
            CallConv::CIface => match &self.triple {
                None => Ok(AbiScalar::Size),
                Some(t) => {
                    let triple =
                        Triple::from_str(t).map_err(|e| CoreError::InvalidTriple {
                            triple: t.clone(),
                            detail: e.to_string(),
                        })?;
                    let width =
                        triple
                            .pointer_width()
                            .map_err(|()| CoreError::InvalidTriple {
                                triple: t.clone(),
                                detail: "architecture has no pointer width".to_string(),
                            })?;
                    Ok(match width {
                        PointerWidth::U16 => AbiScalar::U16,
                        PointerWidth::U32 => AbiScalar::U32,
                        PointerWidth::U64 => AbiScalar::U64,
                    })
                }
            },
        }
    }
}

/// Declared interface of one kernel: named parameters in order, plus result
/// types.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    pub params: IndexMap<String, KernelType>,
    pub results: Vec<KernelType>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, name: impl Into<String>, ty: KernelType) -> Self {
        self.params.insert(name.into(), ty);
        self
    }

    pub fn returns(mut self, ty: KernelType) -> Self {
        self.results.push(ty);
        self
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// The lowering seam: turns the typed IR into a loadable native artifact.
///
/// Implementations live outside this crate (a full pass pipeline, a C shim
/// compiler); tests substitute in-process doubles that resolve straight to
/// local functions.
pub trait Toolchain {
    fn lower(&self, module: &IrModule, config: &TargetConfig) -> Result<Box<dyn EntryResolver>>;
}

/// A module of kernels: declared signatures, their IR, and, once compiled,
/// the entry table calls are dispatched through.
pub struct KernelModule {
    name: String,
    config: TargetConfig,
    ir: IrModule,
    signatures: IndexMap<String, Signature>,
    entries: Option<Box<dyn EntryResolver>>,
    plans: FxHashMap<String, CallPlan>,
}

impl KernelModule {
    pub fn new(name: impl Into<String>, config: TargetConfig) -> Self {
        let name = name.into();
        Self {
            ir: IrModule::new(name.clone()),
            name,
            config,
            signatures: IndexMap::new(),
            entries: None,
            plans: FxHashMap::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &TargetConfig {
        &self.config
    }

    pub fn ir(&self) -> &IrModule {
        &self.ir
    }

    /// Declare a kernel's interface. Redeclaring a name replaces it.
    pub fn declare(&mut self, name: impl Into<String>, signature: Signature) {
        self.signatures.insert(name.into(), signature);
    }

    pub fn signature(&self, name: &str) -> Option<&Signature> {
        self.signatures.get(name)
    }

    pub fn push_function(&mut self, func: IrFunction) {
        self.ir.functions.push(func);
    }

    pub fn is_compiled(&self) -> bool {
        self.entries.is_some()
    }

    /// Module close: builds right away when `auto-build` is on, otherwise
    /// leaves the module declared-but-uncompiled.
    pub fn finalize(&mut self, toolchain: &dyn Toolchain) -> Result<()> {
        if self.config.auto_build {
            self.compile(toolchain)?;
        }
        Ok(())
    }

    /// Lower the typed IR and install the resulting entry table.
    pub fn compile(&mut self, toolchain: &dyn Toolchain) -> Result<()> {
        if self.config.emit_intermediate_dump {
            tracing::debug!(module = %self.name, "typed IR before lowering:\n{}", self.ir);
        }
        let entries = toolchain.lower(&self.ir, &self.config)?;
        self.install_entries(entries);
        Ok(())
    }

    /// Install an entry table directly, e.g. a prebuilt shared library.
    /// Existing call plans hold pointers into the old table, so they are
    /// dropped.
    pub fn install_entries(&mut self, entries: Box<dyn EntryResolver>) {
        self.entries = Some(entries);
        self.plans.clear();
    }

    /// Call a kernel with host values and get a host value back.
    pub fn invoke(&mut self, name: &str, args: &[HostValue]) -> Result<HostValue> {
        let Some(sig) = self.signatures.get(name) else {
            return Err(CoreError::UnknownKernel {
                name: name.to_string(),
            });
        };
        let Some(entries) = self.entries.as_deref() else {
            return Err(CoreError::NotCompiled {
                name: name.to_string(),
            });
        };
        if args.len() != sig.arity() {
            return Err(CoreError::ArityMismatch {
                name: name.to_string(),
                expected: sig.arity(),
                found: args.len(),
            });
        }

        let index_abi = self.config.index_scalar()?;
        if !self.plans.contains_key(name) {
            let plan = CallPlan::new(name, sig, &self.config, entries)?;
            self.plans.insert(name.to_string(), plan);
        }
        let Some(plan) = self.plans.get(name) else {
            unreachable!("plan inserted above");
        };

        let mut values = Vec::with_capacity(args.len());
        for (ty, arg) in sig.params.values().zip(args) {
            values.push(ty.to_abi(arg, index_abi)?);
        }
        let ret = plan.call(&values)?;

        match (sig.results.len(), ret) {
            (0, _) => Ok(HostValue::Unit),
            (1, Some(tree)) => sig.results[0].from_abi(&tree),
            (n, Some(ValueTree::Tuple(children))) if children.len() == n => {
                let mut out = Vec::with_capacity(n);
                for (ty, child) in sig.results.iter().zip(&children) {
                    out.push(ty.from_abi(child)?);
                }
                Ok(HostValue::Tuple(out))
            }
            _ => Err(CoreError::ShapeMismatch {
                path: "the return value".to_string(),
            }),
        }
    }
}
