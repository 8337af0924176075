//! Integration tests for planned native calls
//!
//! Tests for:
//! - Real in-process calls through libffi against local extern "C" kernels
//! - Index marshalling driven by the configured target triple
//! - The hidden output pointer protocol for composite returns
//! - Composite arguments passed by pointer
//! - The plain calling-convention variant
//! - Module-level invoke errors and plan reuse

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};

use olivine::abi::{AbiScalar, AbiValue, TypeTree, ValueTree};
use olivine::diagnostics::{CoreError, Result};
use olivine::ir::IrModule;
use olivine::target::{
    CallConv, CallPlan, EntryResolver, KernelModule, Signature, TargetConfig, Toolchain,
};
use olivine::types::{FloatType, HostValue, IntType, KernelType};
use pretty_assertions::assert_eq;

const I16: KernelType = KernelType::Int(IntType::I16);
const I32: KernelType = KernelType::Int(IntType::I32);
const U8: KernelType = KernelType::Int(IntType::U8);
const F64: KernelType = KernelType::Float(FloatType::F64);

// ==================== Test kernels ====================

extern "C" fn id_i16(x: i16) -> i16 {
    x
}

extern "C" fn id_u8(x: u8) -> u8 {
    x
}

extern "C" fn add_i32(a: i32, b: i32) -> i32 {
    a.wrapping_add(b)
}

extern "C" fn fma_f64(a: f64, b: f64) -> f64 {
    a * 2.0 + b
}

extern "C" fn id_size(n: usize) -> usize {
    n
}

extern "C" fn id_u64(n: u64) -> u64 {
    n
}

extern "C" fn not_bool(b: u8) -> u8 {
    (b == 0) as u8
}

extern "C" fn scale3_i32(n: i32) -> i32 {
    n * 3
}

static TICKS: AtomicI32 = AtomicI32::new(0);

extern "C" fn tick() {
    TICKS.fetch_add(1, Ordering::SeqCst);
}

/// Mirror of the struct the marshaller synthesizes for an `(i32, i32)`
/// result tree.
#[repr(C)]
struct PairI32 {
    q: i32,
    r: i32,
}

extern "C" fn divmod_i32(out: *mut PairI32, a: i32, b: i32) {
    unsafe {
        out.write(PairI32 { q: a / b, r: a % b });
    }
}

extern "C" fn sum_pair(p: *const PairI32) -> i32 {
    unsafe { (*p).q + (*p).r }
}

extern "C" fn write_answer(out: *mut i32) {
    unsafe {
        out.write(42);
    }
}

// ==================== Entry tables ====================

/// In-process entry table keyed by full symbol name.
struct TestEntries(HashMap<&'static str, *const ()>);

impl EntryResolver for TestEntries {
    fn resolve(&self, symbol: &str) -> Result<*const ()> {
        self.0
            .get(symbol)
            .copied()
            .ok_or_else(|| CoreError::MissingSymbol {
                symbol: symbol.to_string(),
                detail: "not an in-process test kernel".to_string(),
            })
    }
}

fn ciface_entries() -> TestEntries {
    let mut table: HashMap<&'static str, *const ()> = HashMap::new();
    table.insert("_mlir_ciface_id_i16", id_i16 as *const ());
    table.insert("_mlir_ciface_id_u8", id_u8 as *const ());
    table.insert("_mlir_ciface_add", add_i32 as *const ());
    table.insert("_mlir_ciface_fma", fma_f64 as *const ());
    table.insert("_mlir_ciface_id_index", id_size as *const ());
    table.insert("_mlir_ciface_id_index64", id_u64 as *const ());
    table.insert("_mlir_ciface_not", not_bool as *const ());
    table.insert("_mlir_ciface_tick", tick as *const ());
    table.insert("_mlir_ciface_divmod", divmod_i32 as *const ());
    table.insert("_mlir_ciface_sum_pair", sum_pair as *const ());
    table.insert("_mlir_ciface_write_answer", write_answer as *const ());
    TestEntries(table)
}

fn plain_entries() -> TestEntries {
    let mut table: HashMap<&'static str, *const ()> = HashMap::new();
    table.insert("scale3", scale3_i32 as *const ());
    table.insert("divmod", divmod_i32 as *const ());
    TestEntries(table)
}

/// Toolchain double that "lowers" straight to the in-process entry table.
struct TableToolchain;

impl Toolchain for TableToolchain {
    fn lower(&self, module: &IrModule, _config: &TargetConfig) -> Result<Box<dyn EntryResolver>> {
        assert_eq!(module.name, "kernels");
        Ok(Box::new(ciface_entries()))
    }
}

// ==================== Scalar calls ====================

#[test]
fn test_scalar_kernels_round_trip() {
    let mut module = KernelModule::new("kernels", TargetConfig::default());
    module.declare("id_i16", Signature::new().param("x", I16).returns(I16));
    module.declare(
        "add",
        Signature::new().param("a", I32).param("b", I32).returns(I32),
    );
    module.declare(
        "fma",
        Signature::new().param("a", F64).param("b", F64).returns(F64),
    );
    module.declare(
        "not",
        Signature::new()
            .param("b", KernelType::Bool)
            .returns(KernelType::Bool),
    );
    module.install_entries(Box::new(ciface_entries()));

    assert_eq!(
        module.invoke("id_i16", &[HostValue::Int(-2)]).unwrap(),
        HostValue::Int(-2)
    );
    assert_eq!(
        module
            .invoke("add", &[HostValue::Int(40), HostValue::Int(2)])
            .unwrap(),
        HostValue::Int(42)
    );
    assert_eq!(
        module
            .invoke("fma", &[HostValue::Float(2.5), HostValue::Float(1.0)])
            .unwrap(),
        HostValue::Float(6.0)
    );
    assert_eq!(
        module.invoke("not", &[HostValue::Bool(false)]).unwrap(),
        HostValue::Bool(true)
    );
}

#[test]
fn test_index_marshals_pointer_sized_by_default() {
    let mut module = KernelModule::new("kernels", TargetConfig::default());
    module.declare(
        "id_index",
        Signature::new()
            .param("n", KernelType::Index)
            .returns(KernelType::Index),
    );
    module.install_entries(Box::new(ciface_entries()));

    assert_eq!(
        module.invoke("id_index", &[HostValue::Uint(7)]).unwrap(),
        HostValue::Uint(7)
    );
}

#[test]
fn test_index_follows_the_configured_triple_width() {
    // An explicit 64-bit triple marshals index as u64, argument and result
    // both.
    let mut config = TargetConfig::default();
    config.triple = Some("x86_64-unknown-linux-gnu".to_string());
    let mut module = KernelModule::new("kernels", config);
    module.declare(
        "id_index64",
        Signature::new()
            .param("n", KernelType::Index)
            .returns(KernelType::Index),
    );
    module.install_entries(Box::new(ciface_entries()));

    assert_eq!(
        module.invoke("id_index64", &[HostValue::Uint(7)]).unwrap(),
        HostValue::Uint(7)
    );
}

#[test]
fn test_boundary_range_is_checked_per_argument() {
    let mut module = KernelModule::new("kernels", TargetConfig::default());
    module.declare("id_u8", Signature::new().param("x", U8).returns(U8));
    module.install_entries(Box::new(ciface_entries()));

    // The full native range crosses; one past it does not.
    assert_eq!(
        module.invoke("id_u8", &[HostValue::Int(255)]).unwrap(),
        HostValue::Uint(255)
    );
    assert!(matches!(
        module.invoke("id_u8", &[HostValue::Int(256)]).unwrap_err(),
        CoreError::OutOfRange { .. }
    ));
    assert!(matches!(
        module
            .invoke("id_u8", &[HostValue::Float(2.5)])
            .unwrap_err(),
        CoreError::InvalidCast { .. }
    ));
}

#[test]
fn test_void_kernels_come_back_unit() {
    let mut module = KernelModule::new("kernels", TargetConfig::default());
    module.declare("tick", Signature::new());
    module.install_entries(Box::new(ciface_entries()));

    let before = TICKS.load(Ordering::SeqCst);
    assert_eq!(module.invoke("tick", &[]).unwrap(), HostValue::Unit);
    assert_eq!(TICKS.load(Ordering::SeqCst), before + 1);
}

// ==================== Composite calls ====================

#[test]
fn test_composite_return_through_hidden_pointer() {
    let mut module = KernelModule::new("kernels", TargetConfig::default());
    module.declare(
        "divmod",
        Signature::new()
            .param("a", I32)
            .param("b", I32)
            .returns(I32)
            .returns(I32),
    );
    module.install_entries(Box::new(ciface_entries()));

    assert_eq!(
        module
            .invoke("divmod", &[HostValue::Int(7), HostValue::Int(2)])
            .unwrap(),
        HostValue::Tuple(vec![HostValue::Int(3), HostValue::Int(1)])
    );
}

#[test]
fn test_composite_argument_passes_by_pointer() {
    let config = TargetConfig::default();
    let pair = TypeTree::Tuple(vec![
        TypeTree::Scalar(AbiScalar::I32),
        TypeTree::Scalar(AbiScalar::I32),
    ]);
    let plan = CallPlan::from_trees(
        "sum_pair",
        vec![pair],
        Some(TypeTree::Scalar(AbiScalar::I32)),
        &config,
        &ciface_entries(),
    )
    .expect("should plan");

    let arg = ValueTree::Tuple(vec![
        ValueTree::Scalar(AbiValue::I32(30)),
        ValueTree::Scalar(AbiValue::I32(12)),
    ]);
    let ret = plan.call(&[arg]).expect("should call");
    assert_eq!(ret, Some(ValueTree::Scalar(AbiValue::I32(42))));
}

#[test]
fn test_zero_sized_result_fields_stay_composite() {
    // One flattened leaf beside an empty tuple still lays out as a struct,
    // so the result travels through the hidden pointer, not a register.
    let config = TargetConfig::default();
    let ret_tree = TypeTree::Tuple(vec![
        TypeTree::Tuple(vec![]),
        TypeTree::Scalar(AbiScalar::I32),
    ]);
    let plan = CallPlan::from_trees(
        "write_answer",
        vec![],
        Some(ret_tree),
        &config,
        &ciface_entries(),
    )
    .expect("should plan");

    let ret = plan.call(&[]).expect("should call");
    assert_eq!(
        ret,
        Some(ValueTree::Tuple(vec![
            ValueTree::Tuple(vec![]),
            ValueTree::Scalar(AbiValue::I32(42)),
        ]))
    );
}

// ==================== The plain variant ====================

#[test]
fn test_plain_variant_bare_symbols_and_int_index() {
    let mut config = TargetConfig::default();
    config.target_variant = CallConv::Plain;
    let mut module = KernelModule::new("kernels", config);
    module.declare(
        "scale3",
        Signature::new()
            .param("n", KernelType::Index)
            .returns(KernelType::Index),
    );
    module.declare(
        "divmod",
        Signature::new()
            .param("a", I32)
            .param("b", I32)
            .returns(I32)
            .returns(I32),
    );
    module.install_entries(Box::new(plain_entries()));

    // Index lowers to a plain C int here.
    assert_eq!(
        module.invoke("scale3", &[HostValue::Int(5)]).unwrap(),
        HostValue::Int(15)
    );
    // Composite returns have no lowering under this variant.
    assert!(matches!(
        module
            .invoke("divmod", &[HostValue::Int(7), HostValue::Int(2)])
            .unwrap_err(),
        CoreError::CompositeReturnUnsupported { .. }
    ));
}

// ==================== Module mechanics ====================

#[test]
fn test_invoke_checks_arity_and_reuses_plans() {
    let mut module = KernelModule::new("kernels", TargetConfig::default());
    module.declare(
        "add",
        Signature::new().param("a", I32).param("b", I32).returns(I32),
    );
    module.install_entries(Box::new(ciface_entries()));

    assert!(matches!(
        module.invoke("add", &[HostValue::Int(1)]).unwrap_err(),
        CoreError::ArityMismatch {
            expected: 2,
            found: 1,
            ..
        }
    ));

    // The first call plans the symbol; later calls reuse the plan.
    assert_eq!(
        module
            .invoke("add", &[HostValue::Int(40), HostValue::Int(2)])
            .unwrap(),
        HostValue::Int(42)
    );
    assert_eq!(
        module
            .invoke("add", &[HostValue::Int(1), HostValue::Int(2)])
            .unwrap(),
        HostValue::Int(3)
    );
}

#[test]
fn test_missing_symbol_reported_at_plan_time() {
    let mut module = KernelModule::new("kernels", TargetConfig::default());
    module.declare("ghost", Signature::new().returns(I32));
    module.install_entries(Box::new(ciface_entries()));

    assert!(matches!(
        module.invoke("ghost", &[]).unwrap_err(),
        CoreError::MissingSymbol { symbol, .. } if symbol == "_mlir_ciface_ghost"
    ));
}

#[test]
fn test_finalize_lowers_through_the_toolchain() {
    let mut module = KernelModule::new("kernels", TargetConfig::default());
    module.declare(
        "add",
        Signature::new().param("a", I32).param("b", I32).returns(I32),
    );
    module.finalize(&TableToolchain).expect("should build");
    assert!(module.is_compiled());
    assert_eq!(
        module
            .invoke("add", &[HostValue::Int(1), HostValue::Int(2)])
            .unwrap(),
        HostValue::Int(3)
    );

    // With auto-build off, finalize leaves the module uncompiled.
    let mut config = TargetConfig::default();
    config.auto_build = false;
    let mut lazy = KernelModule::new("kernels", config);
    lazy.declare("add", Signature::new().param("a", I32).param("b", I32).returns(I32));
    lazy.finalize(&TableToolchain).expect("finalize without building");
    assert!(!lazy.is_compiled());
    lazy.compile(&TableToolchain).expect("should build");
    assert!(lazy.is_compiled());
}
